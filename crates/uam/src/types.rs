//! Wire-level data model shared by both consumed RPC surfaces.
//!
//! None of these types carry transport logic: constructing, submitting and
//! registering them is the job of [`crate::rpc::ClientProtocol`] and
//! [`crate::rpc::MasterProtocol`] implementations supplied by the host
//! process.

use std::fmt;
use serde::{Deserialize, Serialize};

/// Opaque, globally unique application identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `(ApplicationId, attempt-number)`. Only the first attempt is ever used by
/// a UAM; see [`crate::error::UamError::NotFirstAttempt`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId {
    pub application_id: ApplicationId,
    pub attempt_number: u32,
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:06}", self.application_id, self.attempt_number)
    }
}

/// Bearer credential binding an attempt to a principal. May be rotated by
/// the CRM mid-session (see `AllocateResponse::refreshed_token`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmrmToken {
    pub identifier: String,
    pub material: Vec<u8>,
}

/// `(AttemptId, AMRMToken?)` — the handle needed to re-instantiate an RPC
/// proxy, e.g. after fail-over.
#[derive(Debug, Clone)]
pub struct UamIdentifier {
    pub attempt_id: AttemptId,
    pub token: Option<AmrmToken>,
}

/// Application-level state as reported by the client protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationState {
    New,
    NewSaving,
    Submitted,
    Accepted,
    Running,
    Finished,
    Failed,
    Killed,
}

/// Attempt-level state as reported by the client protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptState {
    New,
    Submitted,
    Scheduled,
    Allocated,
    Launched,
    Running,
    Finishing,
    Finished,
    Failed,
    Killed,
}

/// States the application may sit in before reaching ACCEPTED without that
/// being a contract violation. Anything else (RUNNING, FAILED, FINISHED,
/// KILLED) means a later attempt already exists.
pub const PRE_ACCEPT_STATES: &[ApplicationState] = &[
    ApplicationState::New,
    ApplicationState::NewSaving,
    ApplicationState::Submitted,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationReport {
    pub state: ApplicationState,
    pub current_attempt_id: Option<AttemptId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    pub attempt_id: AttemptId,
    pub state: AttemptState,
    pub amrm_token: Option<AmrmToken>,
}

/// Minimal resource ask the UAM submits on the caller's behalf: 1024 MiB /
/// 1 vCPU, non-negotiated (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub memory_mb: u32,
    pub vcores: u32,
}

impl Resource {
    pub const UAM_PLACEHOLDER: Resource = Resource {
        memory_mb: 1024,
        vcores: 1,
    };
}

/// Submission context built by the controller for `submit_application`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionContext {
    pub application_id: ApplicationId,
    pub application_name: String,
    pub queue: String,
    pub resource: Resource,
    /// The launch context for a real AM container; empty because the UAM
    /// never runs inside a CRM-managed container.
    pub am_container_spec_empty: bool,
    pub unmanaged: bool,
}

impl SubmissionContext {
    pub fn for_unmanaged_am(
        application_id: ApplicationId,
        app_name_suffix: &str,
        queue: String,
    ) -> Self {
        Self {
            application_id,
            application_name: format!("UnmanagedAM-{app_name_suffix}"),
            queue,
            resource: Resource::UAM_PLACEHOLDER,
            am_container_spec_empty: true,
            unmanaged: true,
        }
    }
}

/// Caller-provided registration payload. Opaque beyond what the UAM itself
/// inspects; stashed verbatim so the re-register helper can replay it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub host: String,
    pub rpc_port: u32,
    pub tracking_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub max_capability: Resource,
    pub queue: String,
}

/// One container handed back by the CRM on an allocate response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub resource: Resource,
}

/// `response_id` is stamped by the Heartbeat Worker from `last_response_id`
/// immediately before dispatch (§4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocateRequest {
    pub response_id: i64,
    pub ask: Vec<Resource>,
    pub release: Vec<String>,
}

impl AllocateRequest {
    pub fn new(ask: Vec<Resource>, release: Vec<String>) -> Self {
        Self {
            response_id: 0,
            ask,
            release,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocateResponse {
    pub response_id: i64,
    pub allocated_containers: Vec<Container>,
    pub refreshed_token: Option<AmrmToken>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishRequest {
    pub final_status_succeeded: bool,
    pub diagnostics: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishResponse {
    pub unregistered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillResponse {
    pub killed: bool,
}
