use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Lending pool action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Supply,
    Withdraw,
    Borrow,
    Repay,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Supply => "supply",
            Action::Withdraw => "withdraw",
            Action::Borrow => "borrow",
            Action::Repay => "repay",
        }
    }

    /// Supply and repay pull tokens from the caller, so the pool needs an allowance.
    pub fn requires_approval(&self) -> bool {
        matches!(self, Action::Supply | Action::Repay)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positional pool-call argument as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallParam {
    Address(Address),
    Uint(U256),
    Small(u64),
}

impl Serialize for CallParam {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CallParam::Address(a) => serializer.serialize_str(&a.to_checksum(None)),
            CallParam::Uint(v) => serializer.serialize_str(&v.to_string()),
            CallParam::Small(n) => serializer.serialize_u64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for CallParam {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = JsonValue::deserialize(deserializer)?;
        match raw {
            JsonValue::Number(n) => n
                .as_u64()
                .map(CallParam::Small)
                .ok_or_else(|| de::Error::custom(format!("not an unsigned integer: {}", n))),
            JsonValue::String(s) if s.starts_with("0x") && s.len() == 42 => {
                Address::from_str(&s).map(CallParam::Address).map_err(de::Error::custom)
            }
            JsonValue::String(s) => U256::from_str_radix(&s, 10)
                .map(CallParam::Uint)
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!("unexpected call parameter: {}", other))),
        }
    }
}

/// Unsigned pool call produced by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub contract_address: Address,
    pub function_name: String,
    pub params: Vec<CallParam>,
    #[serde(rename = "contractABI")]
    pub contract_abi: JsonValue,
    pub value: String,
    pub created_at: i64,
    pub description: String,
    #[serde(alias = "transactionType")]
    pub action: Action,
    pub caller_param_index: usize,
}

impl TransactionPayload {
    pub fn requires_approval(&self) -> bool {
        self.action.requires_approval()
    }

    pub fn asset(&self) -> Option<Address> {
        match self.params.first() {
            Some(CallParam::Address(a)) => Some(*a),
            _ => None,
        }
    }

    pub fn amount(&self) -> Option<U256> {
        match self.params.get(1) {
            Some(CallParam::Uint(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Body of `POST /tx/create`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateLinkRequest {
    pub payload: LinkSpec,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSpec {
    pub action: Action,
    pub token_address: Address,
    /// Human-readable decimal amount, or "max" for withdraw/repay.
    pub amount: String,
}

impl CreateLinkRequest {
    pub fn new(action: Action, token_address: Address, amount: impl Into<String>) -> Self {
        Self {
            payload: LinkSpec {
                action,
                token_address,
                amount: amount.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkResponse {
    pub success: bool,
    pub message: String,
    pub transaction_id: String,
    pub page_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub success: bool,
    pub tx_hash: Option<String>,
    pub approval_tx_hash: Option<String>,
}

/// Response of `GET /tx/data/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkData {
    pub success: bool,
    pub data: TransactionPayload,
    /// Unix milliseconds.
    pub expires_at: i64,
    #[serde(default)]
    pub confirmation: Confirmation,
}

impl LinkData {
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.expires_at).single()
    }
}

/// Body of `POST /tx/confirm/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_tx_hash: Option<String>,
}

impl ConfirmRequest {
    pub fn new(tx_hash: B256, approval_tx_hash: Option<B256>) -> Self {
        Self {
            tx_hash: format!("{:#x}", tx_hash),
            approval_tx_hash: approval_tx_hash.map(|h| format!("{:#x}", h)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_from_service_json() {
        let raw = json!({
            "contractAddress": "0x6Ae43d3271ff6888e7Fc43Fd7321a503ff738951",
            "functionName": "repay",
            "params": [
                "0x94a9D9AC8a22534E3FaCa9F4e7F2E2cf85d5E4C8",
                "5000000",
                2,
                "0x0000000000000000000000000000000000000000"
            ],
            "contractABI": [],
            "value": "0",
            "createdAt": 1_700_000_000_000i64,
            "description": "Repay 5 USDC to Aave V3",
            "transactionType": "repay",
            "callerParamIndex": 3
        });
        let p: TransactionPayload = serde_json::from_value(raw).unwrap();
        assert_eq!(p.action, Action::Repay);
        assert!(p.requires_approval());
        assert_eq!(p.amount(), Some(U256::from(5_000_000u64)));
        assert_eq!(p.params[2], CallParam::Small(2));
        assert_eq!(p.params[3], CallParam::Address(Address::ZERO));
    }

    #[test]
    fn test_create_request_shape() {
        let req = CreateLinkRequest::new(Action::Borrow, Address::ZERO, "1.5");
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["payload"]["action"], "borrow");
        assert_eq!(v["payload"]["amount"], "1.5");
        assert_eq!(
            v["payload"]["tokenAddress"],
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_confirm_request_omits_missing_approval() {
        let v = serde_json::to_value(ConfirmRequest::new(B256::repeat_byte(0xab), None)).unwrap();
        assert_eq!(v["txHash"], format!("0x{}", "ab".repeat(32)));
        assert!(v.get("approvalTxHash").is_none());
    }
}
