//! Approve-then-act execution of a stored payload.
//!
//! State machine: `Idle -> Approving -> Executing -> Success | Error`.
//! `Approving` is entered only for actions that pull tokens from the caller,
//! and the approval itself is only submitted when the live allowance is short.

use crate::client::LendLinkClient;
use crate::error::{Result, SdkError};
use crate::types::{CallParam, TransactionPayload};
use crate::wallet::{ContractCall, WalletProvider};
use alloy_primitives::{Address, B256, U256};

/// Where a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connecting,
    Approving,
    Executing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Approving {
        approval_tx_hash: Option<B256>,
    },
    Executing {
        approval_tx_hash: Option<B256>,
        tx_hash: Option<B256>,
    },
    Success(Receipt),
    Error {
        stage: Stage,
        reason: String,
        /// Kept so the user can still inspect a mined approval.
        approval_tx_hash: Option<B256>,
    },
}

impl ExecutionState {
    pub fn is_busy(&self) -> bool {
        matches!(self, ExecutionState::Approving { .. } | ExecutionState::Executing { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: B256,
    pub approval_tx_hash: Option<B256>,
}

/// Resolve the payload into a signable call for `caller`.
///
/// The builder leaves the zero address in `caller_param_index`; anything else
/// in that slot means the payload was tampered with or built for another flow.
pub fn prepare_call(payload: &TransactionPayload, caller: Address) -> Result<ContractCall> {
    let idx = payload.caller_param_index;
    let mut args = payload.params.clone();
    let len = args.len();
    let slot = args.get_mut(idx).ok_or_else(|| {
        SdkError::InvalidPayload(format!("caller slot {} out of range ({} params)", idx, len))
    })?;
    if *slot != CallParam::Address(Address::ZERO) {
        return Err(SdkError::InvalidPayload(format!(
            "caller slot {} holds {:?}, expected the zero address",
            idx, slot
        )));
    }
    *slot = CallParam::Address(caller);

    let value = U256::from_str_radix(&payload.value, 10)
        .map_err(|e| SdkError::InvalidPayload(format!("bad value '{}': {}", payload.value, e)))?;

    Ok(ContractCall {
        to: payload.contract_address,
        function_name: payload.function_name.clone(),
        args,
        abi: payload.contract_abi.clone(),
        value,
    })
}

/// Drives one payload through the wallet. Reusable: `execute` after an error
/// starts over from `Idle`.
pub struct Executor<'w, W: WalletProvider + ?Sized> {
    wallet: &'w W,
    payload: TransactionPayload,
    expected_chain_id: Option<u64>,
    state: ExecutionState,
    history: Vec<ExecutionState>,
    approval_tx_hash: Option<B256>,
}

impl<'w, W: WalletProvider + ?Sized> Executor<'w, W> {
    pub fn new(wallet: &'w W, payload: TransactionPayload) -> Self {
        Self {
            wallet,
            payload,
            expected_chain_id: None,
            state: ExecutionState::Idle,
            history: Vec::new(),
            approval_tx_hash: None,
        }
    }

    /// Refuse to submit unless the wallet is on this chain.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.expected_chain_id = Some(chain_id);
        self
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Every state entered so far, oldest first.
    pub fn history(&self) -> &[ExecutionState] {
        &self.history
    }

    pub fn payload(&self) -> &TransactionPayload {
        &self.payload
    }

    fn transition(&mut self, next: ExecutionState) {
        self.history.push(next.clone());
        self.state = next;
    }

    fn fail(&mut self, stage: Stage, err: SdkError) -> SdkError {
        self.transition(ExecutionState::Error {
            stage,
            reason: err.to_string(),
            approval_tx_hash: self.approval_tx_hash,
        });
        err
    }

    /// Run approve-then-act. On failure the state is `Error` with the failing stage.
    pub async fn execute(&mut self) -> Result<Receipt> {
        self.transition(ExecutionState::Idle);

        if let Some(expected) = self.expected_chain_id {
            match self.wallet.chain_id().await {
                Ok(actual) if actual == expected => {}
                Ok(actual) => {
                    let err = SdkError::Wallet(format!(
                        "wallet is on chain {}, expected {}",
                        actual, expected
                    ));
                    return Err(self.fail(Stage::Connecting, err));
                }
                Err(e) => return Err(self.fail(Stage::Connecting, e)),
            }
        }

        let call = match prepare_call(&self.payload, self.wallet.address()) {
            Ok(call) => call,
            Err(e) => return Err(self.fail(Stage::Executing, e)),
        };

        if self.payload.requires_approval() {
            self.transition(ExecutionState::Approving {
                approval_tx_hash: self.approval_tx_hash,
            });
            if let Err(e) = self.approve_if_needed().await {
                return Err(self.fail(Stage::Approving, e));
            }
        }

        self.transition(ExecutionState::Executing {
            approval_tx_hash: self.approval_tx_hash,
            tx_hash: None,
        });
        let tx_hash = match self.wallet.send_call(&call).await {
            Ok(h) => h,
            Err(e) => return Err(self.fail(Stage::Executing, e)),
        };
        self.transition(ExecutionState::Executing {
            approval_tx_hash: self.approval_tx_hash,
            tx_hash: Some(tx_hash),
        });
        if let Err(e) = self.wallet.wait_for_confirmation(tx_hash).await {
            return Err(self.fail(Stage::Executing, e));
        }

        let receipt = Receipt {
            tx_hash,
            approval_tx_hash: self.approval_tx_hash,
        };
        self.transition(ExecutionState::Success(receipt.clone()));
        Ok(receipt)
    }

    async fn approve_if_needed(&mut self) -> Result<()> {
        let asset = self
            .payload
            .asset()
            .ok_or_else(|| SdkError::InvalidPayload("first param is not a token address".into()))?;
        let amount = self
            .payload
            .amount()
            .ok_or_else(|| SdkError::InvalidPayload("second param is not an amount".into()))?;
        let spender = self.payload.contract_address;

        let allowance = self
            .wallet
            .allowance(asset, self.wallet.address(), spender)
            .await?;
        if allowance >= amount {
            return Ok(());
        }

        let hash = self.wallet.approve(asset, spender, amount).await?;
        self.approval_tx_hash = Some(hash);
        self.transition(ExecutionState::Approving {
            approval_tx_hash: Some(hash),
        });
        self.wallet.wait_for_confirmation(hash).await
    }

    /// Post the receipt back to the node. Only meaningful after `Success`;
    /// a failed report leaves the state untouched since the chain already has the tx.
    pub async fn report(&self, client: &LendLinkClient, id: &str) -> Result<()> {
        match &self.state {
            ExecutionState::Success(receipt) => {
                client
                    .confirm(id, receipt.tx_hash, receipt.approval_tx_hash)
                    .await
            }
            other => Err(SdkError::Wallet(format!(
                "nothing to report, executor is in state {:?}",
                other
            ))),
        }
    }
}

/// Outcome of `run_link`: the on-chain receipt and whether the node accepted the report.
#[derive(Debug)]
pub struct LinkOutcome {
    pub receipt: Receipt,
    pub report: Result<()>,
}

/// Fetch a link, execute it with `wallet` and report the result.
pub async fn run_link<W: WalletProvider + ?Sized>(
    client: &LendLinkClient,
    wallet: &W,
    id: &str,
    chain_id: Option<u64>,
) -> Result<LinkOutcome> {
    let link = client.fetch_payload(id).await?;
    let mut executor = Executor::new(wallet, link.data);
    if let Some(chain_id) = chain_id {
        executor = executor.with_chain_id(chain_id);
    }
    let receipt = executor.execute().await?;
    let report = executor.report(client, id).await;
    Ok(LinkOutcome { receipt, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Action;
    use alloy_primitives::address;
    use async_trait::async_trait;
    use serde_json::json;
    use std::str::FromStr;
    use std::sync::Mutex;

    const POOL: Address = address!("1111111111111111111111111111111111111111");
    const TOKEN: Address = address!("2222222222222222222222222222222222222222");
    const USER: Address = address!("3333333333333333333333333333333333333333");

    #[derive(Default)]
    struct MockWallet {
        allowance: U256,
        fail_approve: bool,
        calls: Mutex<Vec<String>>,
        sent: Mutex<Vec<ContractCall>>,
    }

    impl MockWallet {
        fn log(&self, entry: impl Into<String>) {
            self.calls.lock().unwrap().push(entry.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WalletProvider for MockWallet {
        fn address(&self) -> Address {
            USER
        }

        async fn chain_id(&self) -> Result<u64> {
            Ok(11_155_111)
        }

        async fn allowance(&self, _token: Address, owner: Address, spender: Address) -> Result<U256> {
            assert_eq!(owner, USER);
            assert_eq!(spender, POOL);
            self.log("allowance");
            Ok(self.allowance)
        }

        async fn approve(&self, _token: Address, _spender: Address, amount: U256) -> Result<B256> {
            self.log(format!("approve {}", amount));
            if self.fail_approve {
                return Err(SdkError::Wallet("user rejected approval".into()));
            }
            Ok(B256::repeat_byte(0xaa))
        }

        async fn send_call(&self, call: &ContractCall) -> Result<B256> {
            self.log(format!("send {}", call.function_name));
            self.sent.lock().unwrap().push(call.clone());
            Ok(B256::repeat_byte(0xbb))
        }

        async fn wait_for_confirmation(&self, tx_hash: B256) -> Result<()> {
            self.log(format!("wait {:#x}", tx_hash));
            Ok(())
        }
    }

    fn payload(action: Action) -> TransactionPayload {
        let (params, slot) = match action {
            Action::Supply => (
                vec![
                    CallParam::Address(TOKEN),
                    CallParam::Uint(U256::from(100u64)),
                    CallParam::Address(Address::ZERO),
                    CallParam::Small(0),
                ],
                2,
            ),
            Action::Borrow => (
                vec![
                    CallParam::Address(TOKEN),
                    CallParam::Uint(U256::from(100u64)),
                    CallParam::Small(2),
                    CallParam::Small(0),
                    CallParam::Address(Address::ZERO),
                ],
                4,
            ),
            other => unimplemented!("{:?}", other),
        };
        TransactionPayload {
            contract_address: POOL,
            function_name: action.as_str().to_string(),
            params,
            contract_abi: json!([]),
            value: "0".into(),
            created_at: 0,
            description: String::new(),
            action,
            caller_param_index: slot,
        }
    }

    #[test]
    fn test_prepare_call_substitutes_caller() {
        let call = prepare_call(&payload(Action::Borrow), USER).unwrap();
        assert_eq!(call.args[4], CallParam::Address(USER));
        assert_eq!(call.args[2], CallParam::Small(2));
        assert_eq!(call.to, POOL);

        let mut tampered = payload(Action::Supply);
        tampered.params[2] = CallParam::Address(Address::from_str("0x000000000000000000000000000000000000dEaD").unwrap());
        assert!(matches!(prepare_call(&tampered, USER), Err(SdkError::InvalidPayload(_))));

        let mut short = payload(Action::Supply);
        short.caller_param_index = 9;
        assert!(prepare_call(&short, USER).is_err());
    }

    #[test]
    fn test_approval_skipped_when_allowance_suffices() {
        let wallet = MockWallet { allowance: U256::from(100u64), ..Default::default() };
        let mut exec = Executor::new(&wallet, payload(Action::Supply));
        let receipt = tokio_test::block_on(exec.execute()).unwrap();

        assert_eq!(receipt.approval_tx_hash, None);
        assert_eq!(receipt.tx_hash, B256::repeat_byte(0xbb));
        assert!(!wallet.calls().iter().any(|c| c.starts_with("approve")));
        assert_eq!(wallet.sent.lock().unwrap()[0].args[2], CallParam::Address(USER));
        assert!(matches!(exec.state(), ExecutionState::Success(_)));
        assert!(!exec.state().is_busy());
    }

    #[test]
    fn test_approval_submitted_and_awaited_first() {
        let wallet = MockWallet { allowance: U256::from(5u64), ..Default::default() };
        let mut exec = Executor::new(&wallet, payload(Action::Supply));
        let receipt = tokio_test::block_on(exec.execute()).unwrap();

        assert_eq!(receipt.approval_tx_hash, Some(B256::repeat_byte(0xaa)));
        let calls = wallet.calls();
        assert_eq!(calls[0], "allowance");
        assert_eq!(calls[1], "approve 100");
        assert!(calls[2].starts_with("wait 0xaaaa"));
        assert_eq!(calls[3], "send supply");
        assert!(calls[4].starts_with("wait 0xbbbb"));

        let stages: Vec<_> = exec
            .history()
            .iter()
            .map(|s| match s {
                ExecutionState::Idle => "idle",
                ExecutionState::Approving { .. } => "approving",
                ExecutionState::Executing { .. } => "executing",
                ExecutionState::Success(_) => "success",
                ExecutionState::Error { .. } => "error",
            })
            .collect();
        assert_eq!(
            stages,
            vec!["idle", "approving", "approving", "executing", "executing", "success"]
        );
    }

    #[test]
    fn test_approval_failure_stops_at_approving() {
        let wallet = MockWallet { fail_approve: true, ..Default::default() };
        let mut exec = Executor::new(&wallet, payload(Action::Supply));
        assert!(tokio_test::block_on(exec.execute()).is_err());

        match exec.state() {
            ExecutionState::Error { stage, reason, .. } => {
                assert_eq!(*stage, Stage::Approving);
                assert!(reason.contains("user rejected approval"));
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(wallet.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_borrow_never_touches_allowance() {
        let wallet = MockWallet::default();
        let mut exec = Executor::new(&wallet, payload(Action::Borrow));
        tokio_test::block_on(exec.execute()).unwrap();
        assert_eq!(wallet.calls()[0], "send borrow");
    }

    #[test]
    fn test_wrong_chain_fails_before_submitting() {
        let wallet = MockWallet::default();
        let mut exec = Executor::new(&wallet, payload(Action::Borrow)).with_chain_id(1);
        assert!(tokio_test::block_on(exec.execute()).is_err());
        assert!(matches!(
            exec.state(),
            ExecutionState::Error { stage: Stage::Connecting, .. }
        ));
        assert!(wallet.calls().is_empty());
    }

    #[test]
    fn test_retry_rederives_approval_from_allowance() {
        let wallet = MockWallet { fail_approve: true, ..Default::default() };
        let mut exec = Executor::new(&wallet, payload(Action::Supply));
        assert!(tokio_test::block_on(exec.execute()).is_err());
        assert!(tokio_test::block_on(exec.execute()).is_err());
        let allowance_checks = wallet.calls().iter().filter(|c| *c == "allowance").count();
        assert_eq!(allowance_checks, 2);
    }
}
