// src/builder.rs
// Transaction payload factory: one arm per lending action

use crate::catalog::{
    Action, Token, PLACEHOLDER_ADDRESS, POOL_ABI, POOL_ADDRESS, REFERRAL_CODE, VARIABLE_RATE_MODE,
};
use crate::error::LinkResult;
use crate::request::{Amount, TransactionRequest};
use crate::units::parse_units;
use alloy_primitives::{Address, U256};
use chrono::Utc;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// One positional argument of a pool call.
///
/// JSON form keeps wallets happy: addresses are checksummed strings, uint256
/// values are decimal strings (they do not fit a JS number), small integers
/// are plain numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallParam {
    Address(Address),
    Uint(U256),
    Small(u64),
}

impl Serialize for CallParam {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CallParam::Address(a) => serializer.serialize_str(&a.to_checksum(None)),
            CallParam::Uint(v) => serializer.serialize_str(&v.to_string()),
            CallParam::Small(n) => serializer.serialize_u64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for CallParam {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(CallParam::Small(n)),
            Raw::Str(s) if s.starts_with("0x") && s.len() == 42 => Address::from_str(&s)
                .map(CallParam::Address)
                .map_err(de::Error::custom),
            Raw::Str(s) => U256::from_str_radix(&s, 10)
                .map(CallParam::Uint)
                .map_err(de::Error::custom),
        }
    }
}

/// Everything the client needs to submit the call. Write-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub contract_address: Address,
    pub function_name: String,
    pub params: Vec<CallParam>,
    #[serde(rename = "contractABI")]
    pub contract_abi: JsonValue,
    /// Native value sent with the call, wei as a decimal string.
    pub value: String,
    /// Unix milliseconds.
    pub created_at: i64,
    pub description: String,
    #[serde(alias = "transactionType")]
    pub action: Action,
    /// Slot holding `PLACEHOLDER_ADDRESS`; the executor writes the wallet address here.
    pub caller_param_index: usize,
}

impl TransactionPayload {
    pub fn requires_approval(&self) -> bool {
        self.action.requires_approval()
    }

    /// Asset address (first param of every pool function).
    pub fn asset(&self) -> Option<Address> {
        match self.params.first() {
            Some(CallParam::Address(a)) => Some(*a),
            _ => None,
        }
    }

    /// Amount in base units (second param of every pool function).
    pub fn amount(&self) -> Option<U256> {
        match self.params.get(1) {
            Some(CallParam::Uint(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Build the pool call for a validated request.
pub fn build(request: &TransactionRequest) -> LinkResult<TransactionPayload> {
    let token = request.token;
    let asset = CallParam::Address(token.address);
    let caller = CallParam::Address(PLACEHOLDER_ADDRESS);

    let params = match request.action {
        Action::Supply => vec![
            asset,
            CallParam::Uint(scaled(token, &request.amount)?),
            caller,
            CallParam::Small(REFERRAL_CODE),
        ],
        Action::Withdraw => vec![asset, CallParam::Uint(scaled_or_max(token, &request.amount)?), caller],
        Action::Borrow => vec![
            asset,
            CallParam::Uint(scaled(token, &request.amount)?),
            CallParam::Small(VARIABLE_RATE_MODE),
            CallParam::Small(REFERRAL_CODE),
            caller,
        ],
        Action::Repay => vec![
            asset,
            CallParam::Uint(scaled_or_max(token, &request.amount)?),
            CallParam::Small(VARIABLE_RATE_MODE),
            caller,
        ],
    };

    Ok(TransactionPayload {
        contract_address: POOL_ADDRESS,
        function_name: request.action.function_name().to_string(),
        params,
        contract_abi: POOL_ABI.clone(),
        value: "0".to_string(),
        created_at: Utc::now().timestamp_millis(),
        description: request.action.describe(token.symbol, request.amount.display()),
        action: request.action,
        caller_param_index: request.action.caller_param_index(),
    })
}

fn scaled(token: &Token, amount: &Amount) -> LinkResult<U256> {
    match amount {
        Amount::Exact(raw) => parse_units(raw, token.decimals),
        Amount::Max => Err(crate::error::LinkError::InvalidAmount(
            "'max' is only valid for withdraw and repay".into(),
        )),
    }
}

fn scaled_or_max(token: &Token, amount: &Amount) -> LinkResult<U256> {
    match amount {
        Amount::Max => Ok(U256::MAX),
        exact => scaled(token, exact),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::token_by_symbol;
    use crate::error::LinkError;

    fn req(action: Action, symbol: &str, amount: Amount) -> TransactionRequest {
        TransactionRequest { action, token: token_by_symbol(symbol).unwrap(), amount }
    }

    fn exact(s: &str) -> Amount {
        Amount::Exact(s.to_string())
    }

    #[test]
    fn test_supply_usdc() {
        let p = build(&req(Action::Supply, "USDC", exact("100"))).unwrap();
        let usdc = token_by_symbol("USDC").unwrap();
        assert_eq!(
            p.params,
            vec![
                CallParam::Address(usdc.address),
                CallParam::Uint(U256::from(100_000_000u64)),
                CallParam::Address(Address::ZERO),
                CallParam::Small(0),
            ]
        );
        assert!(p.requires_approval());
        assert_eq!(p.function_name, "supply");
        assert_eq!(p.contract_address, POOL_ADDRESS);
        assert_eq!(p.description, "Supply 100 USDC to Aave V3");
        assert_eq!(p.value, "0");
    }

    #[test]
    fn test_borrow_weth() {
        let p = build(&req(Action::Borrow, "WETH", exact("1"))).unwrap();
        assert_eq!(p.amount(), Some(U256::from(1_000_000_000_000_000_000u128)));
        assert_eq!(p.params[2], CallParam::Small(2));
        assert_eq!(p.params[3], CallParam::Small(0));
        assert_eq!(p.params[4], CallParam::Address(Address::ZERO));
        assert!(!p.requires_approval());
        assert_eq!(p.description, "Borrow 1 WETH from Aave V3");
    }

    #[test]
    fn test_param_shape_per_action() {
        for action in Action::ALL {
            let amount = if action.accepts_max() { Amount::Max } else { exact("3.5") };
            let p = build(&req(action, "DAI", amount)).unwrap();
            assert_eq!(p.params.len(), action.arity(), "{}", action);
            assert_eq!(p.caller_param_index, action.caller_param_index());
            assert_eq!(p.params[p.caller_param_index], CallParam::Address(PLACEHOLDER_ADDRESS));
            assert_eq!(p.asset(), Some(token_by_symbol("DAI").unwrap().address));
        }
    }

    #[test]
    fn test_max_sentinel() {
        let w = build(&req(Action::Withdraw, "USDT", Amount::Max)).unwrap();
        assert_eq!(w.amount(), Some(U256::MAX));
        assert_eq!(w.description, "Withdraw max USDT from Aave V3");

        let r = build(&req(Action::Repay, "GHO", Amount::Max)).unwrap();
        assert_eq!(r.amount(), Some(U256::MAX));
        assert!(r.requires_approval());

        let err = build(&req(Action::Supply, "USDT", Amount::Max)).unwrap_err();
        assert!(matches!(err, LinkError::InvalidAmount(_)));
    }

    #[test]
    fn test_precision_beyond_token_rejected() {
        let err = build(&req(Action::Supply, "EURS", exact("1.005"))).unwrap_err();
        assert!(matches!(err, LinkError::InvalidAmount(_)));
    }

    #[test]
    fn test_json_shape() {
        let p = build(&req(Action::Repay, "WBTC", exact("0.5"))).unwrap();
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["action"], "repay");
        assert_eq!(v["functionName"], "repay");
        assert_eq!(v["params"][0], "0x29f2D40B0605204364af54EC677bD022dA425d03");
        assert_eq!(v["params"][1], "50000000");
        assert_eq!(v["params"][2], 2);
        assert_eq!(v["params"][3], "0x0000000000000000000000000000000000000000");
        assert_eq!(v["callerParamIndex"], 3);
        assert!(v["contractABI"].is_array());

        let back: TransactionPayload = serde_json::from_value(v).unwrap();
        assert_eq!(back, p);
    }
}
