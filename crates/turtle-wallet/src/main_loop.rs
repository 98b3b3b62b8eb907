//! The fetch/process pipeline.
//!
//! One cooperative task owns every mutation: each tick refreshes daemon
//! info when stale, tops up the bounded block queue, drains a few blocks
//! through the synchronizer, reconciles locked transactions, and updates
//! the sync/desync edge. Wallet state sits behind a single mutex that is
//! never held across an await.

use crate::events::{EventBus, WalletEvent};
use crate::subwallets::SubWallets;
use crate::sync_status::SynchronizationStatus;
use crate::synchronizer::WalletSynchronizer;
use crate::types::TransactionData;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use turtle_rpc::wire::Block;
use turtle_rpc::Daemon;
use turtle_types::constants::DAEMON_UPDATE_INTERVAL_SECS;
use turtle_types::keys::TxHash;
use turtle_types::WalletConfig;

/// Mutable wallet state, guarded as one unit.
pub(crate) struct WalletState {
    pub sub_wallets: SubWallets,
    pub sync_status: SynchronizationStatus,
    pub blocks_to_process: VecDeque<Block>,
}

/// Last-fetched daemon info.
#[derive(Default)]
pub(crate) struct DaemonState {
    pub local_block_count: u64,
    pub network_block_count: u64,
    pub fee_address: String,
    pub fee_amount: u64,
    pub last_updated: Option<Instant>,
}

/// Everything the sync task and the facade share.
pub(crate) struct SyncContext {
    pub config: WalletConfig,
    pub daemon: Arc<dyn Daemon>,
    pub synchronizer: WalletSynchronizer,
    pub state: Mutex<WalletState>,
    pub daemon_state: Mutex<DaemonState>,
    pub events: EventBus,
    pub synced: AtomicBool,
    pub running: AtomicBool,
}

impl SyncContext {
    pub(crate) fn state(&self) -> std::sync::MutexGuard<'_, WalletState> {
        self.state.lock().expect("wallet state poisoned")
    }

    pub(crate) fn daemon_state(&self) -> std::sync::MutexGuard<'_, DaemonState> {
        self.daemon_state.lock().expect("daemon state poisoned")
    }
}

/// Fetch height and fee once before the first tick.
pub(crate) async fn prime_daemon_info(ctx: &SyncContext) {
    update_daemon_info(ctx, true).await;

    match ctx.daemon.fee().await {
        Ok(fee) if fee.status == "OK" => {
            let mut daemon_state = ctx.daemon_state();
            daemon_state.fee_address = fee.address;
            daemon_state.fee_amount = fee.amount;
        }
        Ok(fee) => {
            tracing::debug!(status = %fee.status, "daemon returned no usable fee info");
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch node fee");
        }
    }
}

/// Run ticks until `stop()` clears the running flag.
pub(crate) async fn run(ctx: Arc<SyncContext>) {
    prime_daemon_info(&ctx).await;

    while ctx.running.load(Ordering::SeqCst) {
        tick(&ctx).await;
        tokio::time::sleep(ctx.config.main_loop_interval).await;
    }
}

/// One pass of the pipeline.
pub(crate) async fn tick(ctx: &SyncContext) {
    update_daemon_info(ctx, false).await;
    fetch_blocks(ctx).await;
    process_blocks(ctx).await;
    check_locked_transactions(ctx).await;
    check_sync_state(ctx);
}

async fn update_daemon_info(ctx: &SyncContext, force: bool) {
    let stale = {
        let daemon_state = ctx.daemon_state();
        match daemon_state.last_updated {
            Some(at) => at.elapsed() >= Duration::from_secs(DAEMON_UPDATE_INTERVAL_SECS),
            None => true,
        }
    };

    if !force && !stale {
        return;
    }

    match ctx.daemon.info().await {
        Ok(info) => {
            let mut daemon_state = ctx.daemon_state();
            daemon_state.local_block_count = info.height;
            daemon_state.network_block_count = info.network_height;
            daemon_state.last_updated = Some(Instant::now());
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to update daemon info");
        }
    }
}

/// Top up the block queue from the daemon, anchored on our checkpoints.
///
/// An empty batch means we are synced for this tick. Transport failures
/// are logged and dropped; the next tick retries naturally.
async fn fetch_blocks(ctx: &SyncContext) {
    let (checkpoints, start_height, start_timestamp) = {
        let state = ctx.state();
        if state.blocks_to_process.len() >= ctx.config.block_queue_high_water {
            return;
        }
        (
            state.sync_status.get_block_checkpoints(),
            state.sync_status.start_height(),
            state.sync_status.start_timestamp(),
        )
    };

    match ctx
        .daemon
        .get_wallet_sync_data(checkpoints, start_height, start_timestamp)
        .await
    {
        Ok(blocks) => {
            if blocks.is_empty() {
                return;
            }
            // A fetch that lands after stop() is discarded.
            if !ctx.running.load(Ordering::SeqCst) {
                return;
            }
            tracing::debug!(count = blocks.len(), "queued sync blocks");
            ctx.state().blocks_to_process.extend(blocks);
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch sync blocks");
        }
    }
}

/// Drain up to `blocks_per_tick` queued blocks through the synchronizer.
async fn process_blocks(ctx: &SyncContext) {
    for _ in 0..ctx.config.blocks_per_tick {
        let Some(block) = ctx.state().blocks_to_process.pop_front() else {
            return;
        };

        // Recognize under the lock; the scan itself never suspends.
        let scanned = {
            let state = ctx.state();
            if let Some(fork_height) = ctx.synchronizer.check_fork(&block, &state.sync_status) {
                drop(state);
                handle_fork(ctx, fork_height);
                return;
            }
            ctx.synchronizer.process_block(&block, &state.sub_wallets)
        };

        let mut data = scanned;

        // Plain nodes omit global indexes; backfill before anything is
        // applied so a failed query leaves no partial block behind.
        if needs_global_indexes(&data) {
            match ctx
                .daemon
                .get_global_indexes_for_range(block.height, block.height + 1)
                .await
            {
                Ok(indexes) => {
                    apply_global_indexes(&mut data, &indexes);
                    if needs_global_indexes(&data) {
                        tracing::warn!(
                            block_height = block.height,
                            "daemon is missing global indexes, retrying next tick",
                        );
                        ctx.state().blocks_to_process.push_front(block);
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to fetch global indexes");
                    ctx.state().blocks_to_process.push_front(block);
                    return;
                }
            }
        }

        let events = {
            let mut state = ctx.state();
            apply_block(&mut state, &block, data)
        };

        for event in events {
            ctx.events.emit(event);
        }
    }
}

/// Apply one scanned block to the aggregate and record the new tip.
/// Returns the events to emit, in mutation order.
fn apply_block(state: &mut WalletState, block: &Block, data: TransactionData) -> Vec<WalletEvent> {
    // A wallet anchored on a creation timestamp learns its height from
    // the first block the daemon resolves that timestamp to.
    if state.sync_status.is_empty() && state.sync_status.start_timestamp() > 0 {
        let timestamp = state.sync_status.start_timestamp();
        state
            .sub_wallets
            .convert_sync_timestamp_to_height(timestamp, block.height);
    }

    // Outputs land before the spends that may consume them.
    for (public_spend_key, input) in data.inputs_to_add {
        state.sub_wallets.store_input(&public_spend_key, input);
    }
    for (public_spend_key, key_image) in &data.key_images_to_mark_spent {
        state
            .sub_wallets
            .mark_input_as_spent(public_spend_key, key_image, block.height);
    }

    let mut events = Vec::new();
    for transaction in data.transactions_to_add {
        state.sub_wallets.add_transaction(transaction.clone());

        let total = transaction.total_amount();
        events.push(WalletEvent::Transaction(transaction.clone()));
        if total > 0 {
            events.push(WalletEvent::IncomingTx(transaction.clone()));
        } else if total < 0 {
            events.push(WalletEvent::OutgoingTx(transaction.clone()));
        }
        if transaction.is_fusion() {
            events.push(WalletEvent::FusionTx(transaction));
        }
    }

    state.sync_status.store_block_hash(block.height, block.hash);
    events
}

/// Unwind a detected fork and flush the queue; the next fetch resumes
/// from the surviving checkpoints.
fn handle_fork(ctx: &SyncContext, fork_height: u64) {
    tracing::warn!(fork_height, "chain fork detected, unwinding");
    let mut state = ctx.state();
    state.sub_wallets.remove_forked_transactions(fork_height);
    state.sync_status.rewind(fork_height.saturating_sub(1));
    state.blocks_to_process.clear();
}

fn needs_global_indexes(data: &TransactionData) -> bool {
    data.inputs_to_add
        .iter()
        .any(|(_, input)| input.global_output_index.is_none())
}

fn apply_global_indexes(data: &mut TransactionData, indexes: &HashMap<TxHash, Vec<u64>>) {
    for (_, input) in &mut data.inputs_to_add {
        if input.global_output_index.is_some() {
            continue;
        }
        input.global_output_index = indexes
            .get(&input.parent_tx_hash)
            .and_then(|tx_indexes| tx_indexes.get(input.transaction_index as usize))
            .copied();
    }
}

/// Ask the daemon about our locked sends; anything it no longer knows
/// was cancelled and is forgotten.
async fn check_locked_transactions(ctx: &SyncContext) {
    let hashes = ctx.state().sub_wallets.locked_transaction_hashes();
    if hashes.is_empty() {
        return;
    }

    match ctx.daemon.get_transactions_status(hashes).await {
        Ok(status) => {
            if status.transactions_unknown.is_empty() {
                return;
            }
            let mut state = ctx.state();
            for hash in &status.transactions_unknown {
                tracing::info!(tx_hash = %hex::encode(hash), "removing cancelled transaction");
                state.sub_wallets.remove_cancelled_transaction(hash);
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "failed to query locked transaction status");
        }
    }
}

/// Fire `sync`/`desync` exactly on the edges.
fn check_sync_state(ctx: &SyncContext) {
    let network_block_count = ctx.daemon_state().network_block_count;
    if network_block_count == 0 {
        // Daemon info has not been primed yet.
        return;
    }

    let wallet_height = ctx.state().sync_status.last_known_block_height();
    let synced = ctx.synced.load(Ordering::SeqCst);

    if !synced && wallet_height + 1 >= network_block_count {
        ctx.synced.store(true, Ordering::SeqCst);
        ctx.events.emit(WalletEvent::Sync {
            wallet_height,
            network_height: network_block_count,
        });
    } else if synced && wallet_height + 1 < network_block_count {
        ctx.synced.store(false, Ordering::SeqCst);
        ctx.events.emit(WalletEvent::Desync {
            wallet_height,
            network_height: network_block_count,
        });
    }
}
