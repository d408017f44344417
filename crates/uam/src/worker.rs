//! Background task draining the request queue, issuing allocate RPCs with
//! re-registration on session loss, and updating the rolling response id
//! and token.
//!
//! Shutdown uses a [`CancellationToken`] plus channel close rather than
//! relying on OS-thread interrupt semantics, matching this codebase's
//! coordinated-shutdown pattern for its reactor tasks.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::principal::TokenHolder;
use crate::queue::QueuedRequest;
use crate::reregister::call_with_reregister;
use crate::rpc::MasterProtocol;
use crate::types::{AttemptId, RegisterRequest};

/// Handle to a running Heartbeat Worker. Stopping it is the sole
/// cancellation mechanism; an in-flight RPC runs to completion.
pub struct HeartbeatWorker {
    cancel: CancellationToken,
}

impl HeartbeatWorker {
    /// Spawns the worker loop and a companion task that logs if it ever
    /// terminates from an unrecoverable error (observability only).
    pub fn spawn(
        mut receiver: mpsc::UnboundedReceiver<QueuedRequest>,
        depth: Arc<AtomicUsize>,
        master_proxy: Arc<dyn MasterProtocol>,
        token_holder: Arc<TokenHolder>,
        register_request: RegisterRequest,
        last_response_id: Arc<AtomicI64>,
        attempt_id: AttemptId,
    ) -> Self {
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();
        let loop_attempt_id = attempt_id.clone();

        let join_handle: JoinHandle<()> = tokio::spawn(async move {
            run_loop(
                &mut receiver,
                &depth,
                &master_proxy,
                &token_holder,
                &register_request,
                &last_response_id,
                &loop_attempt_id,
                &worker_cancel,
            )
            .await;
        });

        tokio::spawn(report_if_unjoinable(join_handle, attempt_id));

        Self { cancel }
    }

    /// Signals the worker to stop. It exits after finishing (or aborting)
    /// the item it is currently processing; anything still in the queue is
    /// dropped.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

async fn report_if_unjoinable(handle: JoinHandle<()>, attempt_id: AttemptId) {
    if let Err(join_error) = handle.await {
        error!(
            task = "uam-heartbeat-worker",
            %attempt_id,
            error = %join_error,
            "heartbeat worker task terminated unexpectedly"
        );
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_loop(
    receiver: &mut mpsc::UnboundedReceiver<QueuedRequest>,
    depth: &Arc<AtomicUsize>,
    master_proxy: &Arc<dyn MasterProtocol>,
    token_holder: &Arc<TokenHolder>,
    register_request: &RegisterRequest,
    last_response_id: &Arc<AtomicI64>,
    attempt_id: &AttemptId,
    cancel: &CancellationToken,
) {
    loop {
        let mut queued = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%attempt_id, "heartbeat worker stopping, draining no further requests");
                return;
            }
            item = receiver.recv() => {
                match item {
                    Some(item) => item,
                    None => return,
                }
            }
        };
        depth.fetch_sub(1, Ordering::SeqCst);

        if cancel.is_cancelled() {
            return;
        }

        queued.allocate_request.response_id = last_response_id.load(Ordering::SeqCst);

        let response = call_with_reregister(master_proxy, register_request, |proxy| {
            let request = queued.allocate_request.clone();
            async move { proxy.allocate(&request).await }
        })
        .await;

        match response {
            Ok(response) => {
                last_response_id.store(response.response_id, Ordering::SeqCst);
                if let Some(new_token) = response.refreshed_token.clone() {
                    token_holder.refresh(new_token);
                }
                (queued.callback)(response);
            }
            Err(error) => {
                warn!(%attempt_id, %error, "allocate RPC failed, not retrying further this cycle");
            }
        }
    }
}
