//! BroadcastHub: the shared rendezvous between the input producer and every
//! connected overlay subscriber.
//!
//! # Design
//!
//! The hub owns one bounded outbound queue per subscriber, keyed by the
//! subscriber's own identity (its peer socket address).  The set lives behind
//! a single `std::sync::Mutex`; registration, removal, and the delivery sweep
//! all go through it, so nothing outside the hub can observe or mutate the set
//! mid-iteration.
//!
//! `deliver` never touches a socket.  It encodes the event once and pushes
//! the shared payload into each queue with `try_send`, which cannot block.  A
//! per-connection writer task (see `infrastructure::ws_server`) drains each
//! queue into its socket with a bounded send timeout.  The lock is therefore
//! held only for a handful of non-blocking queue pushes, and one stalled
//! subscriber cannot delay any other.
//!
//! ```text
//! producer thread ──deliver──► [hub: HashMap<SubscriberId, Sender>]
//!                                   │ try_send (never blocks)
//!                    ┌──────────────┼──────────────┐
//!                    ▼              ▼              ▼
//!                 queue A        queue B        queue C
//!                    │              │              │
//!                 writer A       writer B       writer C  ──► sockets
//! ```
//!
//! # Pruning
//!
//! A closed queue (writer gone) or a full queue (writer stalled for
//! `queue_capacity` events) removes the subscriber in the same sweep.  The
//! failure never reaches the caller of `deliver`.
//!
//! # Ordering
//!
//! Each queue is FIFO and the producer calls `deliver` from one thread, so
//! every subscriber sees events in submission order.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use fretbridge_core::protocol::{encode_message, KeyEvent};

/// Encoded wire message shared by every subscriber queue.
pub type Payload = Arc<str>;

/// Default number of messages buffered per subscriber.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Identity of one subscriber connection.
///
/// Derived from the connection itself (the remote socket address of its TCP
/// stream), which is unique among live connections on one listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(SocketAddr);

impl SubscriberId {
    pub fn peer_addr(&self) -> SocketAddr {
        self.0
    }
}

impl From<SocketAddr> for SubscriberId {
    fn from(addr: SocketAddr) -> Self {
        SubscriberId(addr)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Fan-out point for key events.
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<Payload>>>,
    queue_capacity: usize,
}

impl BroadcastHub {
    /// Creates an empty hub whose subscriber queues hold `queue_capacity`
    /// messages (minimum 1).
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Adds a subscriber and returns the receiving end of its outbound queue.
    ///
    /// If `id` is already registered, its previous queue is replaced; the old
    /// writer sees its queue close and ends.
    pub fn register(&self, id: SubscriberId) -> mpsc::Receiver<Payload> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let (replaced, count) = {
            let mut subscribers = self.lock();
            let replaced = subscribers.insert(id, tx).is_some();
            (replaced, subscribers.len())
        };
        if replaced {
            warn!("subscriber {id} re-registered; previous queue dropped");
        } else {
            info!("subscriber {id} registered ({count} active)");
        }
        rx
    }

    /// Removes a subscriber.  Removing an absent subscriber is a no-op.
    ///
    /// Returns `true` if the subscriber was present.
    pub fn unregister(&self, id: &SubscriberId) -> bool {
        let (removed, count) = {
            let mut subscribers = self.lock();
            let removed = subscribers.remove(id).is_some();
            (removed, subscribers.len())
        };
        if removed {
            info!("subscriber {id} unregistered ({count} active)");
        }
        removed
    }

    /// Sends `event` to every registered subscriber.
    ///
    /// Subscribers whose queue is closed or full are removed as a side
    /// effect.  Returns how many subscribers accepted the event.
    pub fn deliver(&self, event: &KeyEvent) -> usize {
        let payload: Payload = match encode_message(event) {
            Ok(text) => Arc::from(text),
            Err(e) => {
                error!("dropping {event:?}: {e}");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut pruned = 0;
        {
            let mut subscribers = self.lock();
            subscribers.retain(|id, tx| match tx.try_send(Arc::clone(&payload)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("subscriber {id} queue closed; pruning");
                    pruned += 1;
                    false
                }
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "subscriber {id} stalled with {} queued messages; pruning",
                        self.queue_capacity
                    );
                    pruned += 1;
                    false
                }
            });
        }

        debug!("delivered {payload} to {delivered} subscriber(s), pruned {pruned}");
        delivered
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.lock().contains_key(id)
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    // The map is only mutated through insert/remove/retain, none of which can
    // leave it half-updated, so a poisoned lock still guards a valid set.
    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<Payload>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("subscribers", &self.subscriber_count())
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
