//! FIFO buffer of pending allocate requests and their completion callbacks.
//!
//! Producers (`allocate_async`) never block: enqueue is a synchronous send
//! on an unbounded channel. The single consumer is the Heartbeat Worker,
//! which awaits the receiver when empty.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::types::AllocateRequest;

/// A boxed callback invoked once with the CRM's response. Must not block:
/// it runs on the worker task and a slow callback stalls the heartbeat
/// loop for every other queued request.
pub type Callback = Box<dyn FnOnce(crate::types::AllocateResponse) + Send>;

/// One queued item: an allocate request plus the callback that observes
/// its response.
pub struct QueuedRequest {
    pub allocate_request: AllocateRequest,
    pub callback: Callback,
}

/// Producer handle for the request queue. Cheaply cloneable; every clone
/// shares the same depth counter and underlying channel.
#[derive(Clone)]
pub struct RequestQueue {
    sender: mpsc::UnboundedSender<QueuedRequest>,
    depth: Arc<AtomicUsize>,
}

impl RequestQueue {
    /// Creates the queue and its receiver. The receiver is handed to the
    /// Heartbeat Worker when it is spawned; until then, enqueued items
    /// simply accumulate.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<QueuedRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        (Self { sender, depth }, receiver)
    }

    /// A clone of the depth counter, shared with the Heartbeat Worker so it
    /// can decrement on dequeue.
    pub fn depth_handle(&self) -> Arc<AtomicUsize> {
        self.depth.clone()
    }

    /// Enqueue unconditionally; never drops a request while a consumer
    /// exists. If the worker has already stopped and dropped its receiver,
    /// the request is discarded (per the no-restart-after-terminal-call
    /// invariant) and the depth counter is left unchanged.
    pub fn enqueue(&self, allocate_request: AllocateRequest, callback: Callback) {
        self.depth.fetch_add(1, Ordering::SeqCst);
        if self
            .sender
            .send(QueuedRequest {
                allocate_request,
                callback,
            })
            .is_err()
        {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}
