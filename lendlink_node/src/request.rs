// src/request.rs
// Validation of raw create-link bodies into typed transaction requests

use crate::catalog::{find_token, Action, Token};
use crate::error::{LinkError, LinkResult};
use crate::units::parse_units;
use alloy_primitives::Address;
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Amount as requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Amount {
    /// Decimal string exactly as received (used verbatim in the description).
    Exact(String),
    /// "Entire balance" sentinel, withdraw/repay only.
    Max,
}

impl Amount {
    pub fn display(&self) -> &str {
        match self {
            Amount::Exact(s) => s,
            Amount::Max => "max",
        }
    }
}

/// A request that passed validation. Only the builder consumes it.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub action: Action,
    pub token: &'static Token,
    pub amount: Amount,
}

/// Validate `{ "payload": { "action", "tokenAddress", "amount" } }`.
///
/// `transactionType` is accepted as an alias for `action`.
pub fn validate_request(body: &JsonValue) -> LinkResult<TransactionRequest> {
    let payload = body
        .get("payload")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| LinkError::MalformedRequest("payload object is required".into()))?;

    let action = payload
        .get("action")
        .or_else(|| payload.get("transactionType"))
        .and_then(JsonValue::as_str)
        .ok_or(LinkError::InvalidAction)?
        .parse::<Action>()
        .map_err(|_| LinkError::InvalidAction)?;

    let token_raw = payload
        .get("tokenAddress")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| LinkError::UnsupportedToken("tokenAddress is required".into()))?;
    let token = parse_address(token_raw)
        .and_then(|addr| find_token(&addr))
        .ok_or_else(|| LinkError::UnsupportedToken(token_raw.to_string()))?;

    let amount_raw = match payload.get("amount") {
        Some(JsonValue::String(s)) => s.trim().to_string(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => return Err(LinkError::InvalidAmount("amount is required".into())),
    };

    let amount = if amount_raw.eq_ignore_ascii_case("max") {
        if !action.accepts_max() {
            return Err(LinkError::InvalidAmount(format!("'max' is not allowed for {}", action)));
        }
        Amount::Max
    } else {
        let scaled = parse_units(&amount_raw, token.decimals)?;
        if scaled.is_zero() {
            return Err(LinkError::InvalidAmount("amount must be greater than zero".into()));
        }
        Amount::Exact(amount_raw)
    };

    Ok(TransactionRequest { action, token, amount })
}

/// Parse a hex address the way wallets do: single-case strings are taken as-is,
/// mixed-case strings must carry a valid EIP-55 checksum.
pub fn parse_address(raw: &str) -> Option<Address> {
    let hex = raw.strip_prefix("0x").unwrap_or(raw);
    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(raw, None).ok()
    } else {
        Address::from_str(raw).ok()
    }
}
