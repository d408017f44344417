//! The two consumed RPC surfaces and the proxy-creation seam.
//!
//! RPC transport implementation is explicitly out of scope (§1): these
//! traits describe what the UAM calls, not how a call reaches the wire.
//! Production crates wire a real transport (gRPC, Thrift, whatever the
//! host CRM speaks) onto [`ClientProtocol`] and [`MasterProtocol`]; tests
//! wire an in-process fixture instead. Proxy construction itself is
//! likewise behind a trait ([`ProxyFactory`]) so it can be swapped the same
//! way this codebase substitutes a mock transport behind its socket-
//! construction seams.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::UamError;
use crate::principal::{Principal, TokenHolder};
use crate::types::{
    AllocateRequest, AllocateResponse, ApplicationId, ApplicationReport, AttemptId, AttemptReport,
    FinishRequest, FinishResponse, KillResponse, RegisterRequest, RegisterResponse,
    SubmissionContext,
};

/// Client protocol, called under the submitter principal.
#[async_trait]
pub trait ClientProtocol: Send + Sync {
    async fn submit_application(&self, context: &SubmissionContext) -> Result<(), UamError>;

    async fn get_application_report(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationReport, UamError>;

    async fn get_application_attempt_report(
        &self,
        attempt_id: &AttemptId,
    ) -> Result<AttemptReport, UamError>;

    async fn force_kill_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<KillResponse, UamError>;
}

/// Master protocol, called under the attempt-proxy principal plus AMRM
/// token.
#[async_trait]
pub trait MasterProtocol: Send + Sync {
    async fn register_application_master(
        &self,
        request: &RegisterRequest,
    ) -> Result<RegisterResponse, UamError>;

    async fn allocate(&self, request: &AllocateRequest) -> Result<AllocateResponse, UamError>;

    async fn finish_application_master(
        &self,
        request: &FinishRequest,
    ) -> Result<FinishResponse, UamError>;
}

/// Extension hook: creates RPC proxies bound to a principal (and, for the
/// master protocol, a shared, refreshable AMRM token). Injected at
/// controller construction so tests substitute a mock transport for the
/// real one.
#[async_trait]
pub trait ProxyFactory: Send + Sync {
    async fn create_client_proxy(
        &self,
        principal: &Principal,
    ) -> Result<Arc<dyn ClientProtocol>, UamError>;

    async fn create_master_proxy(
        &self,
        principal: &Principal,
        token: Arc<TokenHolder>,
    ) -> Result<Arc<dyn MasterProtocol>, UamError>;
}
