//! Public API: orchestrates the submit → register → finish lifecycle and
//! owns controller state.

use std::sync::atomic::AtomicI64;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::config::UamConfig;
use crate::error::UamError;
use crate::monitor::AttemptMonitor;
use crate::principal::{Principal, TokenHolder};
use crate::queue::{Callback, RequestQueue};
use crate::reregister::call_with_reregister;
use crate::rpc::{ClientProtocol, MasterProtocol, ProxyFactory};
use crate::types::{
    AllocateRequest, ApplicationId, AttemptId, AttemptState, FinishRequest, FinishResponse,
    KillResponse, RegisterRequest, RegisterResponse, SubmissionContext, UamIdentifier,
};
use crate::worker::HeartbeatWorker;

/// Mutable state set over the course of `create_and_register` and read
/// thereafter. `register_request` is stashed before any RPC proxy is
/// created and never cleared; `master_proxy` transitions `None -> Some`
/// exactly once and never resets.
struct ControllerState {
    register_request: Option<RegisterRequest>,
    attempt_id: Option<AttemptId>,
    master_proxy: Option<Arc<dyn MasterProtocol>>,
    token_holder: Option<Arc<TokenHolder>>,
    worker: Option<HeartbeatWorker>,
    kill_client_proxy: Option<Arc<dyn ClientProtocol>>,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            register_request: None,
            attempt_id: None,
            master_proxy: None,
            token_holder: None,
            worker: None,
            kill_client_proxy: None,
        }
    }
}

/// An unmanaged application master client: submits a placeholder
/// application, waits for the CRM to launch the first attempt, registers
/// as that attempt's master, then drives allocate requests through a
/// background heartbeat loop until `finish` or `force_kill`.
///
/// No restart after a terminal call (`finish` or `force_kill`): construct
/// a new instance for a new application.
pub struct UnmanagedApplicationMaster {
    config: UamConfig,
    application_id: ApplicationId,
    queue_name: Option<String>,
    submitter: Principal,
    app_name_suffix: String,
    proxy_factory: Arc<dyn ProxyFactory>,
    queue: RequestQueue,
    receiver: Mutex<Option<tokio::sync::mpsc::UnboundedReceiver<crate::queue::QueuedRequest>>>,
    last_response_id: Arc<AtomicI64>,
    state: Mutex<ControllerState>,
}

impl UnmanagedApplicationMaster {
    /// Rejects a blank `application_id` or `submitter`; `config` is always
    /// valid because it is a plain value (no nullability to reject).
    pub fn new(
        config: UamConfig,
        application_id: ApplicationId,
        queue_name: Option<String>,
        submitter: Principal,
        app_name_suffix: impl Into<String>,
        proxy_factory: Arc<dyn ProxyFactory>,
    ) -> Result<Self, UamError> {
        if application_id.0.trim().is_empty() {
            return Err(UamError::InvalidArgument("application_id must not be blank"));
        }
        let (queue, receiver) = RequestQueue::new();
        Ok(Self {
            config,
            application_id,
            queue_name,
            submitter,
            app_name_suffix: app_name_suffix.into(),
            proxy_factory,
            queue,
            receiver: Mutex::new(Some(receiver)),
            last_response_id: Arc::new(AtomicI64::new(0)),
            state: Mutex::new(ControllerState::new()),
        })
    }

    /// Blocking (async) end-to-end submit, monitor and register. On
    /// success, starts the Heartbeat Worker and returns the register
    /// response. On failure, the worker is never started and the object is
    /// unusable except to release resources.
    pub async fn create_and_register(
        &self,
        register_request: RegisterRequest,
    ) -> Result<RegisterResponse, UamError> {
        {
            let mut state = self.state.lock().unwrap();
            state.register_request = Some(register_request.clone());
        }

        let client_proxy = self.proxy_factory.create_client_proxy(&self.submitter).await?;

        let queue_name = self
            .queue_name
            .clone()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| self.config.default_queue_name.clone());
        let submission = SubmissionContext::for_unmanaged_am(
            self.application_id.clone(),
            &self.app_name_suffix,
            queue_name,
        );
        client_proxy.submit_application(&submission).await?;

        let monitor = AttemptMonitor::new(
            client_proxy.as_ref(),
            self.config.poll_interval,
            self.config.attempt_launch_timeout,
        );
        let attempt_report = monitor
            .wait_for_launch(&self.application_id, AttemptState::Launched)
            .await?;

        let amrm_token = attempt_report
            .amrm_token
            .ok_or(UamError::CredentialFailure("CRM did not return an AMRM token for the launched attempt"))?;

        let proxy_user = self.submitter.proxy_for_attempt(&attempt_report.attempt_id);
        let token_holder = Arc::new(TokenHolder::new(amrm_token));
        let master_proxy = self
            .proxy_factory
            .create_master_proxy(&proxy_user, token_holder.clone())
            .await?;

        let register_response = master_proxy
            .register_application_master(&register_request)
            .await?;

        let receiver = self
            .receiver
            .lock()
            .unwrap()
            .take()
            .expect("create_and_register must only run once per instance");
        let worker = HeartbeatWorker::spawn(
            receiver,
            self.queue.depth_handle(),
            master_proxy.clone(),
            token_holder.clone(),
            register_request,
            self.last_response_id.clone(),
            attempt_report.attempt_id.clone(),
        );

        let mut state = self.state.lock().unwrap();
        state.attempt_id = Some(attempt_report.attempt_id);
        state.master_proxy = Some(master_proxy);
        state.token_holder = Some(token_holder);
        state.worker = Some(worker);

        Ok(register_response)
    }

    /// Enqueues `request` unconditionally; delivery happens once
    /// registration completes. Fails only if called before
    /// `create_and_register` has even started.
    pub fn allocate_async(&self, request: AllocateRequest, callback: Callback) -> Result<(), UamError> {
        self.queue.enqueue(request, callback);

        let state = self.state.lock().unwrap();
        if state.master_proxy.is_some() || state.register_request.is_some() {
            return Ok(());
        }
        Err(UamError::NotRegistered(
            "allocate_async must not be called before create_and_register",
        ))
    }

    /// Stops the worker, then invokes `finish_application_master` via the
    /// re-register helper. If registration is still in flight on another
    /// task, returns a synthetic `unregistered: false` response instead of
    /// failing.
    pub async fn finish(&self, finish_request: FinishRequest) -> Result<FinishResponse, UamError> {
        let (master_proxy, register_request) = {
            let mut state = self.state.lock().unwrap();
            if let Some(worker) = state.worker.take() {
                worker.stop();
            }
            (state.master_proxy.clone(), state.register_request.clone())
        };

        match master_proxy {
            Some(proxy) => {
                let register_request = register_request
                    .expect("register_request is always set before master_proxy (invariant 1)");
                call_with_reregister(&proxy, &register_request, |p| {
                    let finish_request = finish_request.clone();
                    async move { p.finish_application_master(&finish_request).await }
                })
                .await
            }
            None => {
                if register_request.is_some() {
                    warn!("finish called while registration is still in flight on another task");
                    Ok(FinishResponse { unregistered: false })
                } else {
                    Err(UamError::NotRegistered(
                        "finish must not be called before create_and_register",
                    ))
                }
            }
        }
    }

    /// Stops the worker and force-kills the application via the client
    /// protocol (not the master protocol).
    pub async fn force_kill(&self) -> Result<KillResponse, UamError> {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(worker) = state.worker.take() {
                worker.stop();
            }
        }

        let client_proxy = {
            let existing = self.state.lock().unwrap().kill_client_proxy.clone();
            match existing {
                Some(proxy) => proxy,
                None => {
                    let proxy = self.proxy_factory.create_client_proxy(&self.submitter).await?;
                    self.state.lock().unwrap().kill_client_proxy = Some(proxy.clone());
                    proxy
                }
            }
        };

        client_proxy.force_kill_application(&self.application_id).await
    }

    /// The cached attempt id, possibly `None` before registration.
    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.state.lock().unwrap().attempt_id.clone()
    }

    /// The handle needed to re-instantiate an RPC proxy against this
    /// attempt (e.g. after fail-over to a standby): the attempt id plus the
    /// current AMRM token, or `None` before registration.
    pub fn identifier(&self) -> Option<UamIdentifier> {
        let state = self.state.lock().unwrap();
        let attempt_id = state.attempt_id.clone()?;
        let token = state.token_holder.as_ref().map(|holder| holder.current());
        Some(UamIdentifier { attempt_id, token })
    }

    /// Queue depth, exposed for tests.
    pub fn pending_request_count(&self) -> usize {
        self.queue.depth()
    }
}
