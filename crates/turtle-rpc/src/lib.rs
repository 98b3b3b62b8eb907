//! TurtleCoin daemon RPC.
//!
//! HTTP JSON client, the [`Daemon`] capability trait, its two concrete
//! providers, and the wire types for wallet sync batches.
//!
//! # Example
//!
//! ```no_run
//! use turtle_rpc::{Daemon, NodeDaemon};
//!
//! # async fn example() -> Result<(), turtle_rpc::RpcError> {
//! let daemon = NodeDaemon::new("http://localhost:11898");
//! let info = daemon.info().await?;
//! assert!(info.network_height >= info.height);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod daemon;
pub mod error;
pub mod wire;

pub use client::{HttpClient, HttpConfig};
pub use daemon::{CacheDaemon, Daemon, DaemonInfo, FeeInfo, NodeDaemon, TransactionsStatus};
pub use error::RpcError;
pub use wire::{Block, CoinbaseTransaction, RawInput, RawOutput, RawTransaction, StandardTransaction};
