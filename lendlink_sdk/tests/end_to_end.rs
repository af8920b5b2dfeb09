// tests/end_to_end.rs
//! Full flow against a real node on an ephemeral port:
//! create link -> fetch payload -> execute with a scripted wallet -> confirm.

use alloy_primitives::{address, Address, B256, U256};
use async_trait::async_trait;
use chrono::Duration;
use lendlink_node::catalog::token_by_symbol;
use lendlink_node::{AppState, Config, MemoryStore};
use lendlink_sdk::prelude::*;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

const USER: Address = address!("3333333333333333333333333333333333333333");

struct ScriptedWallet {
    allowance: U256,
    sent: Mutex<Vec<ContractCall>>,
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    fn address(&self) -> Address {
        USER
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(11_155_111)
    }

    async fn allowance(&self, _token: Address, _owner: Address, _spender: Address) -> Result<U256> {
        Ok(self.allowance)
    }

    async fn approve(&self, _token: Address, _spender: Address, _amount: U256) -> Result<B256> {
        Ok(B256::repeat_byte(0x0a))
    }

    async fn send_call(&self, call: &ContractCall) -> Result<B256> {
        self.sent.lock().unwrap().push(call.clone());
        Ok(B256::repeat_byte(0x0b))
    }

    async fn wait_for_confirmation(&self, _tx_hash: B256) -> Result<()> {
        Ok(())
    }
}

fn spawn_node() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let base = format!("http://{}", listener.local_addr().unwrap());
    let config = Config {
        public_base_url: base.clone(),
        ..Config::default()
    };
    let state = AppState::new(Arc::new(MemoryStore::new(Duration::seconds(900))), config);
    tokio::spawn(lendlink_node::serve(listener, state));
    base
}

#[tokio::test]
async fn supply_link_round_trip() {
    let base = spawn_node();
    let client = LendLinkClient::new(&base);
    assert!(client.health_check().await.unwrap());

    let usdc = token_by_symbol("USDC").unwrap().address;
    let created = client.create_link(Action::Supply, usdc, "100").await.unwrap();
    assert!(created.success);
    assert_eq!(created.page_url, format!("{}/transaction/{}", base, created.transaction_id));

    let link = client.fetch_payload(&created.transaction_id).await.unwrap();
    assert_eq!(link.data.amount(), Some(U256::from(100_000_000u64)));
    assert!(!link.confirmation.success);
    assert!(link.expires_at_utc().is_some());

    let wallet = ScriptedWallet {
        allowance: U256::ZERO,
        sent: Mutex::new(Vec::new()),
    };
    let outcome = run_link(&client, &wallet, &created.transaction_id, Some(11_155_111))
        .await
        .unwrap();
    assert!(outcome.report.is_ok());
    assert_eq!(outcome.receipt.approval_tx_hash, Some(B256::repeat_byte(0x0a)));

    let sent = wallet.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].function_name, "supply");
    assert_eq!(sent[0].args[2], CallParam::Address(USER));

    let link = client.fetch_payload(&created.transaction_id).await.unwrap();
    assert!(link.confirmation.success);
    assert_eq!(
        link.confirmation.tx_hash.as_deref(),
        Some(format!("{:#x}", B256::repeat_byte(0x0b)).as_str())
    );
    assert_eq!(
        link.confirmation.approval_tx_hash,
        Some(format!("{:#x}", B256::repeat_byte(0x0a)))
    );
}

#[tokio::test]
async fn service_errors_surface_as_api_errors() {
    let base = spawn_node();
    let client = LendLinkClient::new(&base);

    let err = client
        .create_link(Action::Supply, Address::repeat_byte(0x42), "1")
        .await
        .unwrap_err();
    match err {
        SdkError::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("UnsupportedToken"), "{}", message);
        }
        other => panic!("unexpected error {:?}", other),
    }

    let err = client.fetch_payload("zzzzzzzz").await.unwrap_err();
    assert!(err.is_not_found());

    let err = client
        .confirm("zzzzzzzz", B256::repeat_byte(1), None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
