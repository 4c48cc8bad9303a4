//! # Chert SDK
//!
//! A Rust SDK for interacting with Chert blockchain nodes over JSON-RPC.
//!
//! This SDK provides:
//! - A JSON-RPC 2.0 transport with typed result decoding and verbatim node errors
//! - Account management with Ed25519 keys
//! - Transaction signing, submission and confirmation polling
//! - Staking, governance and privacy (stealth address) operations
//!
//! Every network call takes a [`Context`] that carries cancellation and an
//! optional deadline.
//!
//! ## Example
//!
//! ```no_run
//! use chert_sdk::{ChertClient, ClientConfig, Context, TransactionRequest};
//!
//! # async fn example() -> chert_sdk::Result<()> {
//! let client = ChertClient::new(ClientConfig::new("https://api.chert.com"))?;
//! let ctx = Context::background();
//!
//! // Create an account
//! let account = client.wallet().create_account()?;
//!
//! // Send a transfer and wait for it to be confirmed
//! let request = TransactionRequest::new("chert_recipient", "100.0", "0.1");
//! let hash = client.wallet().send_transaction(&ctx, &request, &account).await?;
//! let tx = client.wallet().wait_for_transaction(&ctx, &hash, None).await?;
//! println!("confirmed at height {:?}", tx.block_height);
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod governance;
pub mod privacy;
pub mod rpc;
pub mod signer;
pub mod staking;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::ChertClient;
pub use config::ClientConfig;
pub use context::Context;
pub use error::{Error, Result};
pub use rpc::{RpcClient, RpcError, RpcTransport};
pub use signer::{Ed25519Signer, Signer};
pub use wallet::Account;

/// Re-export commonly used types
pub use types::*;
