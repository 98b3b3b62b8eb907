//! Typed wallet event bus.
//!
//! One subscription per consumer, optionally filtered to a single event
//! kind. Events are delivered over unbounded channels in the order the
//! mutations they describe were applied.
//!
//! Subscribers must not call `start`/`stop` on the wallet from inside a
//! receive loop that the wallet task is blocked on; treat handlers as
//! passive observers.

use crate::types::Transaction;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Everything the wallet announces to the outside world.
#[derive(Debug, Clone)]
pub enum WalletEvent {
    /// Any synthesized transaction, incoming or outgoing.
    Transaction(Transaction),
    /// A transaction whose net transfer is positive.
    IncomingTx(Transaction),
    /// A transaction whose net transfer is negative.
    OutgoingTx(Transaction),
    /// A zero-fee self-transfer consolidating outputs.
    FusionTx(Transaction),
    /// The wallet caught up with the network.
    Sync {
        wallet_height: u64,
        network_height: u64,
    },
    /// The wallet fell behind the network.
    Desync {
        wallet_height: u64,
        network_height: u64,
    },
}

/// Discriminant for filtered subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Transaction,
    IncomingTx,
    OutgoingTx,
    FusionTx,
    Sync,
    Desync,
}

impl WalletEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WalletEvent::Transaction(_) => EventKind::Transaction,
            WalletEvent::IncomingTx(_) => EventKind::IncomingTx,
            WalletEvent::OutgoingTx(_) => EventKind::OutgoingTx,
            WalletEvent::FusionTx(_) => EventKind::FusionTx,
            WalletEvent::Sync { .. } => EventKind::Sync,
            WalletEvent::Desync { .. } => EventKind::Desync,
        }
    }
}

struct Subscriber {
    filter: Option<EventKind>,
    sender: mpsc::UnboundedSender<WalletEvent>,
}

/// Fan-out of wallet events to any number of subscribers.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent> {
        self.subscribe_inner(None)
    }

    /// Receive only events of one kind.
    pub fn subscribe_to(&self, kind: EventKind) -> mpsc::UnboundedReceiver<WalletEvent> {
        self.subscribe_inner(Some(kind))
    }

    fn subscribe_inner(&self, filter: Option<EventKind>) -> mpsc::UnboundedReceiver<WalletEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("event bus poisoned")
            .push(Subscriber { filter, sender });
        receiver
    }

    /// Deliver an event to every matching live subscriber. Dropped
    /// receivers are pruned as a side effect.
    pub fn emit(&self, event: WalletEvent) {
        let mut subscribers = self.subscribers.lock().expect("event bus poisoned");
        subscribers.retain(|s| {
            if s.filter.is_some() && s.filter != Some(event.kind()) {
                return !s.sender.is_closed();
            }
            s.sender.send(event.clone()).is_ok()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn tx_event() -> WalletEvent {
        WalletEvent::Transaction(Transaction {
            hash: [1; 32],
            transfers: HashMap::new(),
            fee: 10,
            block_height: 5,
            timestamp: 0,
            payment_id: String::new(),
            unlock_time: 0,
            is_coinbase: false,
        })
    }

    #[test]
    fn test_subscribe_receives_all_kinds() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(tx_event());
        bus.emit(WalletEvent::Sync {
            wallet_height: 10,
            network_height: 10,
        });

        assert_eq!(rx.try_recv().unwrap().kind(), EventKind::Transaction);
        assert_eq!(rx.try_recv().unwrap().kind(), EventKind::Sync);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_filtered_subscription() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe_to(EventKind::Sync);

        bus.emit(tx_event());
        bus.emit(WalletEvent::Sync {
            wallet_height: 10,
            network_height: 10,
        });

        assert_eq!(rx.try_recv().unwrap().kind(), EventKind::Sync);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        drop(rx);

        bus.emit(tx_event());
        assert!(bus.subscribers.lock().unwrap().is_empty());
    }

    #[test]
    fn test_events_arrive_in_emission_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        for height in 0..5 {
            bus.emit(WalletEvent::Sync {
                wallet_height: height,
                network_height: 10,
            });
        }

        for expected in 0..5 {
            match rx.try_recv().unwrap() {
                WalletEvent::Sync { wallet_height, .. } => assert_eq!(wallet_height, expected),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }
}
