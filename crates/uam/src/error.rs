//! Error sum type for the UAM client.
//!
//! One variant per kind in the design doc's error handling section. The
//! re-register helper is the only place that catches [`UamError::SessionLost`]
//! and transforms it into a retry; every other variant propagates untouched.

use crate::types::AttemptId;

#[derive(Debug, thiserror::Error)]
pub enum UamError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("{0}: allocate_async or finish called before create_and_register")]
    NotRegistered(&'static str),

    #[error("application's first visible state is not ACCEPTED: a later attempt is already in play")]
    NotFirstAttempt,

    #[error("attempt did not reach LAUNCHED within the configured timeout")]
    AttemptLaunchTimeout,

    #[error("RPC failure calling the CRM: {0}")]
    RpcFailure(#[from] RpcError),

    /// CRM reported the attempt as unknown (restarted or fenced the
    /// session). Internal: the re-register helper is expected to catch
    /// this, re-register, and retry exactly once before it would ever
    /// reach a caller.
    #[error("attempt {0} is not registered with the CRM")]
    SessionLost(AttemptId),

    #[error("cannot derive the proxy principal: {0}")]
    CredentialFailure(&'static str),
}

/// Opaque transport/server-side failure surfaced by a [`crate::rpc::ClientProtocol`]
/// or [`crate::rpc::MasterProtocol`] implementation. The UAM never inspects
/// the wrapped error beyond logging it; session-loss is a structural variant
/// of [`UamError`], not detected by matching this message.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RpcError(pub String);

impl RpcError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
