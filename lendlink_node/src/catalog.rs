// src/catalog.rs
// Static Aave V3 (Sepolia) catalog: pool, supported tokens, ABIs and per-action metadata

use crate::error::LinkError;
use alloy_primitives::{address, Address};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

/// Aave V3 Pool proxy on Sepolia.
pub const POOL_ADDRESS: Address = address!("6Ae43d3271ff6888e7Fc43Fd7321a503ff738951");

/// Sepolia chain id.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Zero address written into the on-behalf-of / to slot. The executor replaces it
/// with the connected wallet address before submission.
pub const PLACEHOLDER_ADDRESS: Address = Address::ZERO;

pub const REFERRAL_CODE: u64 = 0;

/// Interest-rate mode 2 = variable. Stable rate is never used.
pub const VARIABLE_RATE_MODE: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub symbol: &'static str,
    pub address: Address,
    pub decimals: u8,
}

pub const TOKENS: &[Token] = &[
    Token { symbol: "USDC", address: address!("94a9D9AC8a22534E3FaCa9F4e7F2E2cf85d5E4C8"), decimals: 6 },
    Token { symbol: "LINK", address: address!("f8Fb3713D459D7C1018BD0A49D19b4C44290EBE5"), decimals: 18 },
    Token { symbol: "USDT", address: address!("aA8E23Fb1079EA71e0a56F48a2aA51851D8433D0"), decimals: 6 },
    Token { symbol: "DAI", address: address!("FF34B3d4Aee8ddCd6F9AFFFB6Fe49bD371b8a357"), decimals: 18 },
    Token { symbol: "WETH", address: address!("C558DBdd856501FCd9aaF1E62eae57A9F0629a3c"), decimals: 18 },
    Token { symbol: "WBTC", address: address!("29f2D40B0605204364af54EC677bD022dA425d03"), decimals: 8 },
    Token { symbol: "AAVE", address: address!("88541670E55cC00bEEFD87eB59EDd1b7C511AC9a"), decimals: 18 },
    Token { symbol: "EURS", address: address!("6d906e526a4e2Ca02097BA9d0caA3c382F52278E"), decimals: 2 },
    Token { symbol: "GHO", address: address!("c4bF5CbDaBE595361438F8c6a187bDc330539c60"), decimals: 18 },
];

/// Look up a supported token. Address comparison is byte-wise, so casing of the
/// original string does not matter once it has been parsed.
pub fn find_token(addr: &Address) -> Option<&'static Token> {
    TOKENS.iter().find(|t| &t.address == addr)
}

pub fn token_by_symbol(symbol: &str) -> Option<&'static Token> {
    TOKENS.iter().find(|t| t.symbol.eq_ignore_ascii_case(symbol))
}

/// Lending pool action. Closed set; dispatch is always a `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Supply,
    Withdraw,
    Borrow,
    Repay,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Supply, Action::Withdraw, Action::Borrow, Action::Repay];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Supply => "supply",
            Action::Withdraw => "withdraw",
            Action::Borrow => "borrow",
            Action::Repay => "repay",
        }
    }

    /// Pool function invoked for this action.
    pub fn function_name(&self) -> &'static str {
        self.as_str()
    }

    /// Supply and repay pull tokens from the caller, so the pool needs an allowance.
    pub fn requires_approval(&self) -> bool {
        matches!(self, Action::Supply | Action::Repay)
    }

    /// Only withdraw and repay understand the "entire balance" sentinel.
    pub fn accepts_max(&self) -> bool {
        matches!(self, Action::Withdraw | Action::Repay)
    }

    /// Index of the placeholder address inside the ordered param list.
    pub fn caller_param_index(&self) -> usize {
        match self {
            Action::Supply => 2,
            Action::Withdraw => 2,
            Action::Borrow => 4,
            Action::Repay => 3,
        }
    }

    /// Number of arguments of the pool function.
    pub fn arity(&self) -> usize {
        match self {
            Action::Supply => 4,
            Action::Withdraw => 3,
            Action::Borrow => 5,
            Action::Repay => 4,
        }
    }

    pub fn describe(&self, symbol: &str, amount: &str) -> String {
        match self {
            Action::Supply => format!("Supply {} {} to Aave V3", amount, symbol),
            Action::Withdraw => format!("Withdraw {} {} from Aave V3", amount, symbol),
            Action::Borrow => format!("Borrow {} {} from Aave V3", amount, symbol),
            Action::Repay => format!("Repay {} {} to Aave V3", amount, symbol),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supply" => Ok(Action::Supply),
            "withdraw" => Ok(Action::Withdraw),
            "borrow" => Ok(Action::Borrow),
            "repay" => Ok(Action::Repay),
            other => Err(LinkError::UnsupportedAction(other.to_string())),
        }
    }
}

/// Aave V3 Pool ABI fragment covering the four lending functions.
pub static POOL_ABI: Lazy<JsonValue> = Lazy::new(|| {
    json!([
        {
            "inputs": [
                {"internalType": "address", "name": "asset", "type": "address"},
                {"internalType": "uint256", "name": "amount", "type": "uint256"},
                {"internalType": "address", "name": "onBehalfOf", "type": "address"},
                {"internalType": "uint16", "name": "referralCode", "type": "uint16"}
            ],
            "name": "supply",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {"internalType": "address", "name": "asset", "type": "address"},
                {"internalType": "uint256", "name": "amount", "type": "uint256"},
                {"internalType": "address", "name": "to", "type": "address"}
            ],
            "name": "withdraw",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {"internalType": "address", "name": "asset", "type": "address"},
                {"internalType": "uint256", "name": "amount", "type": "uint256"},
                {"internalType": "uint256", "name": "interestRateMode", "type": "uint256"},
                {"internalType": "uint16", "name": "referralCode", "type": "uint16"},
                {"internalType": "address", "name": "onBehalfOf", "type": "address"}
            ],
            "name": "borrow",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {"internalType": "address", "name": "asset", "type": "address"},
                {"internalType": "uint256", "name": "amount", "type": "uint256"},
                {"internalType": "uint256", "name": "interestRateMode", "type": "uint256"},
                {"internalType": "address", "name": "onBehalfOf", "type": "address"}
            ],
            "name": "repay",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "nonpayable",
            "type": "function"
        }
    ])
});

/// ERC-20 subset used by the client page (allowance check + approve).
pub static ERC20_ABI: Lazy<JsonValue> = Lazy::new(|| {
    json!([
        {
            "inputs": [
                {"internalType": "address", "name": "spender", "type": "address"},
                {"internalType": "uint256", "name": "amount", "type": "uint256"}
            ],
            "name": "approve",
            "outputs": [{"internalType": "bool", "name": "", "type": "bool"}],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {"internalType": "address", "name": "owner", "type": "address"},
                {"internalType": "address", "name": "spender", "type": "address"}
            ],
            "name": "allowance",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [{"internalType": "address", "name": "account", "type": "address"}],
            "name": "balanceOf",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        }
    ])
});
