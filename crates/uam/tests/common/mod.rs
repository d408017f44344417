//! In-process mock RPC fixtures driving the scenario tests, in the style of
//! this codebase's mock ROUTER test doubles: plain structs with interior
//! mutability standing in for a real transport, wired through the same
//! trait objects a production proxy factory would return.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use uam::error::UamError;
use uam::principal::{Principal, TokenHolder};
use uam::rpc::{ClientProtocol, MasterProtocol, ProxyFactory};
use uam::types::{
    AllocateRequest, AllocateResponse, AmrmToken, ApplicationId, ApplicationReport,
    ApplicationState, AttemptId, AttemptReport, AttemptState, FinishRequest, FinishResponse,
    KillResponse, RegisterRequest, RegisterResponse, Resource, SubmissionContext,
};

/// A scripted client-protocol fixture: each call to
/// `get_application_report` / `get_application_attempt_report` advances
/// through a fixed sequence of states, clamping to the last entry once
/// exhausted.
pub struct ScriptedClientProtocol {
    pub attempt_id: AttemptId,
    pub amrm_token: AmrmToken,
    app_states: Vec<ApplicationState>,
    attempt_states: Vec<AttemptState>,
    app_poll_count: AtomicUsize,
    attempt_poll_count: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub force_kill_calls: Mutex<Vec<ApplicationId>>,
}

impl ScriptedClientProtocol {
    pub fn new(
        attempt_id: AttemptId,
        amrm_token: AmrmToken,
        app_states: Vec<ApplicationState>,
        attempt_states: Vec<AttemptState>,
    ) -> Self {
        Self {
            attempt_id,
            amrm_token,
            app_states,
            attempt_states,
            app_poll_count: AtomicUsize::new(0),
            attempt_poll_count: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            force_kill_calls: Mutex::new(Vec::new()),
        }
    }

    fn next_app_state(&self) -> ApplicationState {
        let index = self.app_poll_count.fetch_add(1, Ordering::SeqCst);
        self.app_states[index.min(self.app_states.len() - 1)]
    }

    fn next_attempt_state(&self) -> AttemptState {
        let index = self.attempt_poll_count.fetch_add(1, Ordering::SeqCst);
        self.attempt_states[index.min(self.attempt_states.len() - 1)]
    }
}

#[async_trait]
impl ClientProtocol for ScriptedClientProtocol {
    async fn submit_application(&self, _context: &SubmissionContext) -> Result<(), UamError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_application_report(
        &self,
        _application_id: &ApplicationId,
    ) -> Result<ApplicationReport, UamError> {
        let state = self.next_app_state();
        let current_attempt_id = (state == ApplicationState::Accepted).then(|| self.attempt_id.clone());
        Ok(ApplicationReport {
            state,
            current_attempt_id,
        })
    }

    async fn get_application_attempt_report(
        &self,
        attempt_id: &AttemptId,
    ) -> Result<AttemptReport, UamError> {
        let state = self.next_attempt_state();
        let amrm_token = (state == AttemptState::Launched).then(|| self.amrm_token.clone());
        Ok(AttemptReport {
            attempt_id: attempt_id.clone(),
            state,
            amrm_token,
        })
    }

    async fn force_kill_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<KillResponse, UamError> {
        self.force_kill_calls.lock().unwrap().push(application_id.clone());
        Ok(KillResponse { killed: true })
    }
}

/// A scripted master-protocol fixture: records call order and response
/// ids, can be told to fail the next N allocate calls with session-loss,
/// and can inject a refreshed token on a specific call.
pub struct ScriptedMasterProtocol {
    pub register_calls: AtomicUsize,
    pub finish_calls: AtomicUsize,
    observed_response_ids: Mutex<Vec<i64>>,
    fail_next_allocates: Mutex<usize>,
    refresh_token_on_call: Mutex<Option<(usize, AmrmToken)>>,
    allocate_call_count: AtomicUsize,
    attempt_id: AttemptId,
}

impl ScriptedMasterProtocol {
    pub fn new(attempt_id: AttemptId) -> Self {
        Self {
            register_calls: AtomicUsize::new(0),
            finish_calls: AtomicUsize::new(0),
            observed_response_ids: Mutex::new(Vec::new()),
            fail_next_allocates: Mutex::new(0),
            refresh_token_on_call: Mutex::new(None),
            allocate_call_count: AtomicUsize::new(0),
            attempt_id,
        }
    }

    pub fn fail_next_allocates(&self, count: usize) {
        *self.fail_next_allocates.lock().unwrap() = count;
    }

    pub fn refresh_token_on_call(&self, call_index: usize, token: AmrmToken) {
        *self.refresh_token_on_call.lock().unwrap() = Some((call_index, token));
    }

    pub fn observed_response_ids(&self) -> Vec<i64> {
        self.observed_response_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl MasterProtocol for ScriptedMasterProtocol {
    async fn register_application_master(
        &self,
        _request: &RegisterRequest,
    ) -> Result<RegisterResponse, UamError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RegisterResponse {
            max_capability: Resource::UAM_PLACEHOLDER,
            queue: "default".into(),
        })
    }

    async fn allocate(&self, request: &AllocateRequest) -> Result<AllocateResponse, UamError> {
        let call_index = self.allocate_call_count.fetch_add(1, Ordering::SeqCst);

        {
            let mut remaining = self.fail_next_allocates.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(UamError::SessionLost(self.attempt_id.clone()));
            }
        }

        self.observed_response_ids
            .lock()
            .unwrap()
            .push(request.response_id);

        let refreshed_token = {
            let mut slot = self.refresh_token_on_call.lock().unwrap();
            match slot.as_ref() {
                Some((index, token)) if *index == call_index => {
                    let token = token.clone();
                    *slot = None;
                    Some(token)
                }
                _ => None,
            }
        };

        Ok(AllocateResponse {
            response_id: request.response_id + 1,
            allocated_containers: vec![],
            refreshed_token,
        })
    }

    async fn finish_application_master(
        &self,
        _request: &FinishRequest,
    ) -> Result<FinishResponse, UamError> {
        self.finish_calls.fetch_add(1, Ordering::SeqCst);
        Ok(FinishResponse { unregistered: true })
    }
}

pub struct TestProxyFactory {
    pub client: Arc<ScriptedClientProtocol>,
    pub master: Arc<ScriptedMasterProtocol>,
}

#[async_trait]
impl ProxyFactory for TestProxyFactory {
    async fn create_client_proxy(&self, _principal: &Principal) -> Result<Arc<dyn ClientProtocol>, UamError> {
        Ok(self.client.clone())
    }

    async fn create_master_proxy(
        &self,
        _principal: &Principal,
        _token: Arc<TokenHolder>,
    ) -> Result<Arc<dyn MasterProtocol>, UamError> {
        Ok(self.master.clone())
    }
}

pub fn attempt_id(app: &str) -> AttemptId {
    AttemptId {
        application_id: ApplicationId(app.to_string()),
        attempt_number: 1,
    }
}

pub fn amrm_token() -> AmrmToken {
    AmrmToken {
        identifier: "token-1".into(),
        material: vec![0xAB, 0xCD],
    }
}
