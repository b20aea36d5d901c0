/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Ring dispatcher for inbound frames.
//!
//! This module provides a bounded queue of `(source, frame)` pairs drained
//! by one dedicated worker thread. Producers block while the ring is full,
//! so no frame is ever dropped, and frames from a given producer reach the
//! sink in FIFO order.

use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, error};

/// Default ring capacity in frames.
pub const DEFAULT_RING_CAPACITY: usize = 1024;

/// Sink invoked by the worker for each dequeued frame.
pub type DispatchSink = Box<dyn FnMut(&str, Bytes) + Send>;

/// Error returned when enqueueing onto a stopped ring.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("ring dispatcher is stopped")]
pub struct RingClosed;

enum Item {
    Frame { source: Arc<str>, frame: Bytes },
    Shutdown,
}

/// Bounded single-consumer frame pump.
///
/// One worker thread drains the ring and invokes the configured sink with
/// each element. `start` and `stop` are explicit; `stop` drains in-flight
/// items before joining the worker.
pub struct RingDispatcher {
    tx: Sender<Item>,
    rx: Mutex<Option<Receiver<Item>>>,
    sink: Mutex<Option<DispatchSink>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RingDispatcher {
    /// Creates a dispatcher with the given ring capacity and sink.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of in-flight frames
    /// * `sink` - Callback invoked for each frame, on the worker thread
    #[must_use]
    pub fn new(capacity: usize, sink: DispatchSink) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            sink: Mutex::new(Some(sink)),
            worker: Mutex::new(None),
        }
    }

    /// Starts the worker thread.
    ///
    /// Calling `start` on a running dispatcher is a no-op.
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return;
        }
        let (Some(rx), Some(mut sink)) = (self.rx.lock().take(), self.sink.lock().take()) else {
            return;
        };

        let handle = std::thread::Builder::new()
            .name("ring-dispatcher".into())
            .spawn(move || {
                debug!("ring dispatcher worker started");
                while let Ok(item) = rx.recv() {
                    match item {
                        Item::Frame { source, frame } => {
                            // A faulty sink must not take the worker down.
                            let outcome =
                                catch_unwind(AssertUnwindSafe(|| sink(&source, frame)));
                            if outcome.is_err() {
                                error!(source = %source, "dispatch sink panicked; frame skipped");
                            }
                        }
                        Item::Shutdown => break,
                    }
                }
                debug!("ring dispatcher worker stopped");
            })
            .expect("failed to spawn ring dispatcher worker");

        *worker = Some(handle);
    }

    /// Stops the worker after draining all in-flight frames.
    pub fn stop(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = self.tx.send(Item::Shutdown);
            let _ = handle.join();
        }
    }

    /// Returns a producer handle for enqueueing frames.
    #[must_use]
    pub fn producer(&self) -> RingProducer {
        RingProducer {
            tx: self.tx.clone(),
        }
    }
}

impl Drop for RingDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Producer half of the ring dispatcher.
///
/// Cloneable; `enqueue` blocks while the ring is full.
#[derive(Debug, Clone)]
pub struct RingProducer {
    tx: Sender<Item>,
}

impl RingProducer {
    /// Enqueues a frame, blocking while the ring is full.
    ///
    /// # Arguments
    /// * `source` - Identifier of the frame origin
    /// * `frame` - The frame bytes
    ///
    /// # Errors
    /// Returns [`RingClosed`] if the dispatcher has been stopped and the
    /// ring torn down.
    pub fn enqueue(&self, source: Arc<str>, frame: Bytes) -> Result<(), RingClosed> {
        self.tx
            .send(Item::Frame { source, frame })
            .map_err(|_| RingClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn collecting_dispatcher(capacity: usize) -> (RingDispatcher, Arc<Mutex<Vec<Bytes>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let dispatcher = RingDispatcher::new(
            capacity,
            Box::new(move |_source, frame| sink_seen.lock().push(frame)),
        );
        (dispatcher, seen)
    }

    #[test]
    fn test_frames_delivered_in_fifo_order() {
        let (dispatcher, seen) = collecting_dispatcher(16);
        dispatcher.start();

        let producer = dispatcher.producer();
        let source: Arc<str> = Arc::from("test");
        for i in 0u8..10 {
            producer.enqueue(Arc::clone(&source), Bytes::from(vec![i])).unwrap();
        }

        dispatcher.stop();

        let seen = seen.lock();
        assert_eq!(seen.len(), 10);
        for (i, frame) in seen.iter().enumerate() {
            assert_eq!(frame[0], i as u8);
        }
    }

    #[test]
    fn test_stop_drains_in_flight_frames() {
        let (dispatcher, seen) = collecting_dispatcher(64);
        let producer = dispatcher.producer();
        let source: Arc<str> = Arc::from("test");

        // Enqueue before the worker even starts.
        for i in 0u8..32 {
            producer.enqueue(Arc::clone(&source), Bytes::from(vec![i])).unwrap();
        }

        dispatcher.start();
        dispatcher.stop();

        assert_eq!(seen.lock().len(), 32);
    }

    #[test]
    fn test_sink_panic_does_not_kill_worker() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let sink_delivered = Arc::clone(&delivered);
        let dispatcher = RingDispatcher::new(
            16,
            Box::new(move |_source, frame| {
                if frame[0] == 0 {
                    panic!("poison frame");
                }
                sink_delivered.fetch_add(1, Ordering::SeqCst);
            }),
        );
        dispatcher.start();

        let producer = dispatcher.producer();
        let source: Arc<str> = Arc::from("test");
        producer.enqueue(Arc::clone(&source), Bytes::from(vec![0u8])).unwrap();
        producer.enqueue(Arc::clone(&source), Bytes::from(vec![1u8])).unwrap();

        dispatcher.stop();
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_enqueue_blocks_until_capacity_frees() {
        let (dispatcher, seen) = collecting_dispatcher(2);
        let producer = dispatcher.producer();
        let source: Arc<str> = Arc::from("test");

        // Fill the ring while the worker is idle, then start it from a
        // second thread; the blocked producer must eventually complete
        // without losing frames.
        producer.enqueue(Arc::clone(&source), Bytes::from_static(b"a")).unwrap();
        producer.enqueue(Arc::clone(&source), Bytes::from_static(b"b")).unwrap();

        let dispatcher = Arc::new(dispatcher);
        let starter = Arc::clone(&dispatcher);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            starter.start();
        });

        producer.enqueue(source, Bytes::from_static(b"c")).unwrap();
        handle.join().unwrap();
        dispatcher.stop();

        assert_eq!(seen.lock().len(), 3);
    }

    #[test]
    fn test_enqueue_after_stop_fails() {
        let (dispatcher, _seen) = collecting_dispatcher(4);
        dispatcher.start();
        let producer = dispatcher.producer();
        dispatcher.stop();
        drop(dispatcher);

        let source: Arc<str> = Arc::from("test");
        assert_eq!(
            producer.enqueue(source, Bytes::from_static(b"x")),
            Err(RingClosed)
        );
    }
}
