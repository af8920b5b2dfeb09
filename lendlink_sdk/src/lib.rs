pub mod client;
pub mod error;
pub mod executor;
pub mod types;
pub mod wallet;

pub use client::LendLinkClient;
pub use error::{Result, SdkError};
pub use executor::{prepare_call, run_link, ExecutionState, Executor, LinkOutcome, Receipt, Stage};
pub use types::{Action, CallParam, Confirmation, CreateLinkResponse, LinkData, TransactionPayload};
pub use wallet::{ContractCall, WalletProvider};

/// SDK version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::LendLinkClient;
    pub use crate::error::{Result, SdkError};
    pub use crate::executor::{run_link, ExecutionState, Executor, Receipt, Stage};
    pub use crate::types::*;
    pub use crate::wallet::{ContractCall, WalletProvider};
}
