//! TurtleCoin light-wallet core.
//!
//! Maintains deterministic subwallets, keeps them synchronized with a
//! remote daemon, discovers incoming payments with the wallet's view
//! key, tracks spent outputs across chain reorgs, and announces every
//! state change over a typed event bus.

pub mod crypto;
pub mod error;
pub mod events;
pub mod serialization;
pub mod subwallet;
pub mod subwallets;
pub mod sync_status;
pub mod synchronizer;
pub mod types;
pub mod validation;
pub mod wallet;

mod main_loop;

pub use crypto::{CryptoOps, DecodedAddress};
pub use error::WalletError;
pub use events::{EventBus, EventKind, WalletEvent};
pub use subwallet::SubWallet;
pub use subwallets::SubWallets;
pub use sync_status::SynchronizationStatus;
pub use synchronizer::WalletSynchronizer;
pub use types::{SpendKeys, Transaction, TransactionData, TxInput, UnconfirmedInput};
pub use wallet::WalletBackend;
