/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session event publication.
//!
//! A session publishes `{state, cause}` events to at most one subscriber
//! with demand-pull semantics: the subscriber grants credit with
//! `request(n)` and the publisher delivers at most that many events before
//! waiting for more credit. Slow observers back-pressure the publisher;
//! events are never dropped while a subscriber is attached.

use crate::state::SessionState;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;

/// What caused a session event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCause {
    /// Peer accepted negotiation.
    NegotiationAccepted,
    /// Peer rejected negotiation.
    NegotiationRejected {
        /// Reject code from the peer.
        code: u8,
    },
    /// Peer accepted establishment.
    EstablishmentAccepted,
    /// Peer rejected establishment.
    EstablishmentRejected {
        /// Reject code from the peer.
        code: u8,
    },
    /// Inbound silence exceeded twice the heartbeat interval.
    KeepaliveLapsed,
    /// The transport unbound.
    TransportUnbound,
    /// The peer finalized the session.
    PeerTerminated {
        /// Termination code from the peer.
        code: u8,
    },
    /// The local side finalized the session.
    Finalized,
}

/// A session state-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEvent {
    /// State after the change.
    pub state: SessionState,
    /// What caused the change.
    pub cause: EventCause,
}

#[derive(Debug)]
struct PublisherState {
    tx: Option<Sender<SessionEvent>>,
    credits: u64,
    cancelled: bool,
}

#[derive(Debug)]
struct EventShared {
    state: Mutex<PublisherState>,
    credit_granted: Condvar,
}

/// Publisher half of the event stream.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    shared: Arc<EventShared>,
}

impl EventPublisher {
    /// Creates a publisher with no subscriber attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(EventShared {
                state: Mutex::new(PublisherState {
                    tx: None,
                    credits: 0,
                    cancelled: false,
                }),
                credit_granted: Condvar::new(),
            }),
        }
    }

    /// Attaches a subscriber, replacing any previous one.
    ///
    /// The new subscription starts with zero credit; nothing is delivered
    /// until the subscriber calls [`EventSubscription::request`].
    #[must_use]
    pub fn subscribe(&self) -> EventSubscription {
        let (tx, rx) = unbounded();
        let mut state = self.shared.state.lock();
        state.tx = Some(tx);
        state.credits = 0;
        state.cancelled = false;
        // Unblock a publisher waiting on a replaced subscription.
        self.credit_granted_notify();
        EventSubscription {
            rx,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Publishes an event to the attached subscriber, if any.
    ///
    /// Waits for credit while a subscriber is attached; returns
    /// immediately when there is none.
    pub fn publish(&self, event: SessionEvent) {
        let mut state = self.shared.state.lock();
        loop {
            if state.cancelled || state.tx.is_none() {
                return;
            }
            if state.credits > 0 {
                state.credits -= 1;
                let delivered = state
                    .tx
                    .as_ref()
                    .map(|tx| tx.send(event).is_ok())
                    .unwrap_or(false);
                if !delivered {
                    state.tx = None;
                }
                return;
            }
            self.shared.credit_granted.wait(&mut state);
        }
    }

    fn credit_granted_notify(&self) {
        self.shared.credit_granted.notify_all();
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber half of the event stream.
#[derive(Debug)]
pub struct EventSubscription {
    rx: Receiver<SessionEvent>,
    shared: Arc<EventShared>,
}

impl EventSubscription {
    /// Grants the publisher credit for `n` more events.
    pub fn request(&self, n: u64) {
        let mut state = self.shared.state.lock();
        state.credits = state.credits.saturating_add(n);
        self.shared.credit_granted.notify_all();
    }

    /// Waits up to `timeout` for the next event.
    #[must_use]
    pub fn poll(&self, timeout: Duration) -> Option<SessionEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Returns an already-delivered event without waiting.
    #[must_use]
    pub fn try_poll(&self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }

    /// Detaches from the publisher; later state changes are not observed.
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        state.cancelled = true;
        state.tx = None;
        self.shared.credit_granted.notify_all();
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn event(state: SessionState) -> SessionEvent {
        SessionEvent {
            state,
            cause: EventCause::EstablishmentAccepted,
        }
    }

    #[test]
    fn test_publish_without_subscriber_is_noop() {
        let publisher = EventPublisher::new();
        publisher.publish(event(SessionState::Established));
    }

    #[test]
    fn test_delivery_respects_credit() {
        let publisher = EventPublisher::new();
        let subscription = publisher.subscribe();
        subscription.request(2);

        publisher.publish(event(SessionState::Negotiated));
        publisher.publish(event(SessionState::Established));

        assert_eq!(
            subscription.poll(Duration::from_secs(1)).map(|e| e.state),
            Some(SessionState::Negotiated)
        );
        assert_eq!(
            subscription.poll(Duration::from_secs(1)).map(|e| e.state),
            Some(SessionState::Established)
        );
    }

    #[test]
    fn test_publisher_waits_for_credit() {
        let publisher = EventPublisher::new();
        let subscription = publisher.subscribe();

        let background = publisher.clone();
        let handle = thread::spawn(move || {
            background.publish(event(SessionState::Established));
        });

        // The publisher is parked until credit arrives.
        assert!(subscription.try_poll().is_none());
        subscription.request(1);

        assert_eq!(
            subscription.poll(Duration::from_secs(1)).map(|e| e.state),
            Some(SessionState::Established)
        );
        handle.join().unwrap();
    }

    #[test]
    fn test_cancel_detaches_subscriber() {
        let publisher = EventPublisher::new();
        let subscription = publisher.subscribe();
        subscription.request(10);
        subscription.cancel();

        publisher.publish(event(SessionState::Established));
        assert!(subscription.try_poll().is_none());
    }

    #[test]
    fn test_cancel_unblocks_waiting_publisher() {
        let publisher = EventPublisher::new();
        let subscription = publisher.subscribe();

        let background = publisher.clone();
        let handle = thread::spawn(move || {
            background.publish(event(SessionState::Established));
        });

        thread::sleep(Duration::from_millis(20));
        subscription.cancel();
        handle.join().unwrap();
    }
}
