use crate::error::Result;
use crate::types::CallParam;
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// A contract call ready for signing: target, ABI and fully resolved arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    pub to: Address,
    pub function_name: String,
    pub args: Vec<CallParam>,
    pub abi: JsonValue,
    /// Native value in wei.
    pub value: U256,
}

/// Signing wallet plus the RPC it talks to.
///
/// Implementations wrap whatever signer the host application has (a browser
/// bridge, a local key, a custodial API). Every method returns once the node
/// accepted the request; `wait_for_confirmation` blocks until it is mined.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Address that signs, and that gets substituted into the caller slot.
    fn address(&self) -> Address;

    async fn chain_id(&self) -> Result<u64>;

    /// ERC-20 `allowance(owner, spender)`.
    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;

    /// ERC-20 `approve(spender, amount)`; returns the transaction hash.
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256>;

    /// Submit an arbitrary contract call; returns the transaction hash.
    async fn send_call(&self, call: &ContractCall) -> Result<B256>;

    /// No timeout: waits as long as the chain takes.
    async fn wait_for_confirmation(&self, tx_hash: B256) -> Result<()>;
}
