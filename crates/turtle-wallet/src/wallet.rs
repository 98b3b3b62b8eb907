//! The wallet backend facade.
//!
//! Ties key management, the subwallet aggregate, the synchronizer, and
//! the sync loop into a single high-level API: create or import a
//! wallet, start it against a daemon, watch events, query balances, and
//! save it back to disk.

use crate::crypto::CryptoOps;
use crate::error::WalletError;
use crate::events::{EventKind, WalletEvent};
use crate::main_loop::{self, DaemonState, SyncContext, WalletState};
use crate::serialization;
use crate::subwallet::SubWallet;
use crate::subwallets::SubWallets;
use crate::sync_status::SynchronizationStatus;
use crate::synchronizer::WalletSynchronizer;
use crate::types::{now_seconds, SpendKeys, Transaction, UnconfirmedInput};
use crate::validation;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use turtle_rpc::Daemon;
use turtle_types::keys::{PublicKey, SecretKey};
use turtle_types::WalletConfig;

/// A light wallet bound to a daemon.
pub struct WalletBackend {
    ctx: Arc<SyncContext>,
    crypto: Arc<dyn CryptoOps>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for WalletBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletBackend").finish_non_exhaustive()
    }
}

impl WalletBackend {
    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Create a brand-new wallet with a fresh deterministic key pair.
    ///
    /// The creation timestamp is backdated by the configured drift so a
    /// daemon whose clock lags ours cannot skip our first blocks.
    pub fn new(
        daemon: Arc<dyn Daemon>,
        crypto: Arc<dyn CryptoOps>,
        config: WalletConfig,
    ) -> Result<Self, WalletError> {
        let (public_spend_key, private_spend_key) = crypto.generate_spend_key_pair();
        let private_view_key = crypto.derive_view_key(&private_spend_key);
        let address = encode(&*crypto, &public_spend_key, &private_view_key)?;

        let creation_timestamp = now_seconds().saturating_sub(config.creation_timestamp_drift());
        let primary = SubWallet::new(
            public_spend_key,
            Some(private_spend_key),
            address,
            0,
            creation_timestamp,
        );

        let sub_wallets = SubWallets::new(private_view_key, false, primary);
        let sync_status = SynchronizationStatus::new(0, creation_timestamp, &config);
        Ok(Self::assemble(daemon, crypto, config, sub_wallets, sync_status))
    }

    /// Restore a wallet from its 25-word mnemonic.
    pub fn import_from_seed(
        daemon: Arc<dyn Daemon>,
        crypto: Arc<dyn CryptoOps>,
        config: WalletConfig,
        mnemonic: &str,
        scan_height: u64,
    ) -> Result<Self, WalletError> {
        let private_spend_key = crypto.mnemonic_to_private_spend_key(mnemonic)?;
        let private_view_key = crypto.derive_view_key(&private_spend_key);
        Self::import_from_keys(
            daemon,
            crypto,
            config,
            private_view_key,
            private_spend_key,
            scan_height,
        )
    }

    /// Restore a wallet from raw keys.
    pub fn import_from_keys(
        daemon: Arc<dyn Daemon>,
        crypto: Arc<dyn CryptoOps>,
        config: WalletConfig,
        private_view_key: SecretKey,
        private_spend_key: SecretKey,
        scan_height: u64,
    ) -> Result<Self, WalletError> {
        let public_spend_key = crypto.secret_key_to_public_key(&private_spend_key)?;
        let address = encode(&*crypto, &public_spend_key, &private_view_key)?;

        let primary = SubWallet::new(
            public_spend_key,
            Some(private_spend_key),
            address,
            scan_height,
            0,
        );

        let sub_wallets = SubWallets::new(private_view_key, false, primary);
        let sync_status = SynchronizationStatus::new(scan_height, 0, &config);
        Ok(Self::assemble(daemon, crypto, config, sub_wallets, sync_status))
    }

    /// Import a view-only wallet: a view key plus a public address.
    pub fn import_view_wallet(
        daemon: Arc<dyn Daemon>,
        crypto: Arc<dyn CryptoOps>,
        config: WalletConfig,
        private_view_key: SecretKey,
        address: &str,
        scan_height: u64,
    ) -> Result<Self, WalletError> {
        let decoded = crypto.decode_address(address)?;
        if decoded.is_integrated() {
            return Err(WalletError::AddressIsIntegrated);
        }

        let primary = SubWallet::new(
            decoded.public_spend_key,
            None,
            address.to_string(),
            scan_height,
            0,
        );

        let sub_wallets = SubWallets::new(private_view_key, true, primary);
        let sync_status = SynchronizationStatus::new(scan_height, 0, &config);
        Ok(Self::assemble(daemon, crypto, config, sub_wallets, sync_status))
    }

    /// Rebuild a wallet from its serialized JSON form.
    pub fn from_json(
        daemon: Arc<dyn Daemon>,
        crypto: Arc<dyn CryptoOps>,
        config: WalletConfig,
        json: &str,
    ) -> Result<Self, WalletError> {
        let (sub_wallets, sync_status) = serialization::from_json(json, &config)?;
        Ok(Self::assemble(daemon, crypto, config, sub_wallets, sync_status))
    }

    /// Open a wallet file from disk.
    ///
    /// File encryption is the persistence collaborator's concern; this
    /// reads the documented JSON shape.
    pub fn open_from_file(
        daemon: Arc<dyn Daemon>,
        crypto: Arc<dyn CryptoOps>,
        config: WalletConfig,
        path: impl AsRef<Path>,
    ) -> Result<Self, WalletError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(daemon, crypto, config, &json)
    }

    fn assemble(
        daemon: Arc<dyn Daemon>,
        crypto: Arc<dyn CryptoOps>,
        config: WalletConfig,
        sub_wallets: SubWallets,
        sync_status: SynchronizationStatus,
    ) -> Self {
        let synchronizer = WalletSynchronizer::new(Arc::clone(&crypto), &config);
        let ctx = Arc::new(SyncContext {
            config,
            daemon,
            synchronizer,
            state: Mutex::new(WalletState {
                sub_wallets,
                sync_status,
                blocks_to_process: VecDeque::new(),
            }),
            daemon_state: Mutex::new(DaemonState::default()),
            events: Default::default(),
            synced: AtomicBool::new(false),
            running: AtomicBool::new(false),
        });

        Self {
            ctx,
            crypto,
            handle: Mutex::new(None),
        }
    }

    /// Start the sync loop. A second call while running is a no-op.
    pub fn start(&self) {
        if self.ctx.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let ctx = Arc::clone(&self.ctx);
        let handle = tokio::spawn(main_loop::run(ctx));
        *self.handle.lock().expect("task handle poisoned") = Some(handle);
    }

    /// Stop the sync loop and drop unprocessed blocks. The committed
    /// checkpoints survive, so a later `start()` resumes where we left
    /// off. Fetches still in flight are discarded.
    pub fn stop(&self) {
        self.ctx.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().expect("task handle poisoned").take() {
            handle.abort();
        }
        self.ctx.state().blocks_to_process.clear();
    }

    // ── Events ───────────────────────────────────────────────────────────

    /// Receive every wallet event.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent> {
        self.ctx.events.subscribe()
    }

    /// Receive events of one kind only.
    pub fn subscribe_to(&self, kind: EventKind) -> mpsc::UnboundedReceiver<WalletEvent> {
        self.ctx.events.subscribe_to(kind)
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Serialize the wallet to the documented JSON shape.
    pub fn to_json(&self) -> String {
        let state = self.ctx.state();
        serialization::to_json(&state.sub_wallets, &state.sync_status)
    }

    /// Write the wallet file to disk.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), WalletError> {
        std::fs::write(path, self.to_json())?;
        Ok(())
    }

    // ── Subwallets ───────────────────────────────────────────────────────

    /// Add a fresh subwallet and return its address.
    pub fn add_sub_wallet(&self) -> Result<String, WalletError> {
        let (is_view_wallet, private_view_key) = {
            let state = self.ctx.state();
            (
                state.sub_wallets.is_view_wallet(),
                state.sub_wallets.private_view_key(),
            )
        };
        if is_view_wallet {
            return Err(WalletError::InvalidKey);
        }

        let (public_spend_key, private_spend_key) = self.crypto.generate_spend_key_pair();
        let address = encode(&*self.crypto, &public_spend_key, &private_view_key)?;

        let mut state = self.ctx.state();
        let scan_height = state.sync_status.last_known_block_height();
        state.sub_wallets.add_sub_wallet(SubWallet::new(
            public_spend_key,
            Some(private_spend_key),
            address.clone(),
            scan_height,
            0,
        ));
        Ok(address)
    }

    // ── Local sends ──────────────────────────────────────────────────────

    /// Validate a prospective send against wallet state and config.
    pub fn validate_send(
        &self,
        destinations: &[(&str, u64)],
        payment_id: &str,
        mixin: u64,
        fee: u64,
    ) -> Result<(), WalletError> {
        let current_height = self.ctx.daemon_state().network_block_count;
        let state = self.ctx.state();
        validation::validate_transaction(
            destinations,
            payment_id,
            mixin,
            fee,
            current_height,
            &state.sub_wallets,
            &*self.crypto,
            &self.ctx.config,
        )
    }

    /// Record a send composed and relayed by the transaction layer.
    ///
    /// The transaction sits in the locked list until the sync loop sees
    /// it on-chain (promotion) or the daemon forgets it (cancellation).
    pub fn record_sent_transaction(
        &self,
        transaction: Transaction,
        tx_private_key: SecretKey,
        change: Vec<(PublicKey, UnconfirmedInput)>,
    ) {
        let mut state = self.ctx.state();
        let hash = transaction.hash;
        state.sub_wallets.add_unconfirmed_transaction(transaction);
        state.sub_wallets.store_tx_private_key(hash, tx_private_key);
        for (public_spend_key, input) in change {
            state
                .sub_wallets
                .store_unconfirmed_input(&public_spend_key, input);
        }
    }

    // ── Read surface ─────────────────────────────────────────────────────

    /// `(wallet, local daemon, network)` block heights.
    pub fn get_sync_status(&self) -> (u64, u64, u64) {
        let wallet_height = self.ctx.state().sync_status.last_known_block_height();
        let daemon_state = self.ctx.daemon_state();
        (
            wallet_height,
            daemon_state.local_block_count,
            daemon_state.network_block_count,
        )
    }

    /// `(unlocked, locked)` over the whole wallet or a subset of our
    /// addresses.
    pub fn get_balance(&self, addresses: Option<&[&str]>) -> Result<(u64, u64), WalletError> {
        let current_height = self.ctx.daemon_state().network_block_count;
        let state = self.ctx.state();

        let subset = match addresses {
            Some(addresses) => Some(validation::validate_our_addresses(
                addresses,
                &state.sub_wallets,
                &*self.crypto,
                &self.ctx.config,
            )?),
            None => None,
        };

        Ok(state.sub_wallets.get_balance(
            current_height,
            self.ctx.config.unlock_time_as_block_height_threshold,
            subset.as_deref(),
        ))
    }

    /// The node operator's fee, if it advertises one.
    pub fn get_node_fee(&self) -> (String, u64) {
        let daemon_state = self.ctx.daemon_state();
        (daemon_state.fee_address.clone(), daemon_state.fee_amount)
    }

    pub fn get_primary_address(&self) -> String {
        self.ctx.state().sub_wallets.get_primary_address()
    }

    pub fn get_addresses(&self) -> Vec<String> {
        self.ctx.state().sub_wallets.addresses()
    }

    /// The spend keys behind one of our addresses.
    pub fn get_spend_keys(&self, address: &str) -> Result<SpendKeys, WalletError> {
        let decoded = self.crypto.decode_address(address)?;
        let state = self.ctx.state();
        let wallet = state
            .sub_wallets
            .get(&decoded.public_spend_key)
            .ok_or(WalletError::AddressNotInWallet)?;
        Ok(SpendKeys {
            public_spend_key: wallet.public_spend_key(),
            private_spend_key: wallet.private_spend_key(),
        })
    }

    /// The mnemonic for the primary address (or a specific one).
    ///
    /// Only available when the view key is derived from the spend key;
    /// otherwise the wallet is not representable as 25 words.
    pub fn get_mnemonic_seed(&self, address: Option<&str>) -> Result<String, WalletError> {
        let (private_spend_key, private_view_key) = {
            let state = self.ctx.state();
            let wallet = match address {
                Some(address) => {
                    let decoded = self.crypto.decode_address(address)?;
                    state
                        .sub_wallets
                        .get(&decoded.public_spend_key)
                        .ok_or(WalletError::AddressNotInWallet)?
                }
                None => state.sub_wallets.get_primary_sub_wallet(),
            };
            (
                wallet.private_spend_key().ok_or(WalletError::InvalidKey)?,
                state.sub_wallets.private_view_key(),
            )
        };

        if self.crypto.derive_view_key(&private_spend_key) != private_view_key {
            return Err(WalletError::InvalidKey);
        }
        self.crypto.private_spend_key_to_mnemonic(&private_spend_key)
    }

    pub fn get_private_view_key(&self) -> SecretKey {
        self.ctx.state().sub_wallets.private_view_key()
    }

    /// The private key we stored for a transaction we sent.
    pub fn get_tx_private_key(&self, hash: &turtle_types::TxHash) -> Option<SecretKey> {
        self.ctx.state().sub_wallets.get_tx_private_key(hash)
    }

    /// Run a single pipeline tick without the periodic task. Intended
    /// for deterministic tests and embedders with their own scheduler.
    pub async fn sync_tick(&self) {
        main_loop::tick(&self.ctx).await;
    }

    /// Fetch daemon height and fee immediately.
    pub async fn prime_daemon_info(&self) {
        main_loop::prime_daemon_info(&self.ctx).await;
    }
}

impl Drop for WalletBackend {
    fn drop(&mut self) {
        if let Ok(mut handle) = self.handle.lock() {
            if let Some(handle) = handle.take() {
                handle.abort();
            }
        }
    }
}

fn encode(
    crypto: &dyn CryptoOps,
    public_spend_key: &PublicKey,
    private_view_key: &SecretKey,
) -> Result<String, WalletError> {
    let public_view_key = crypto.secret_key_to_public_key(private_view_key)?;
    crypto.encode_address(public_spend_key, &public_view_key)
}
