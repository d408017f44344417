//! Identity and credential plumbing.
//!
//! The source derives the attempt's proxy principal from an ambient
//! "current user" and mutates a shared credential cache in place when the
//! CRM rotates the AMRM token. Both are re-architected per the design
//! notes: the caller's identity is passed in explicitly rather than looked
//! up, and token refresh is an explicit method on a small holder type
//! rather than ambient mutation.

use std::sync::RwLock;

use crate::error::UamError;
use crate::types::{AmrmToken, AttemptId};

/// A principal the UAM authenticates RPCs as. `submitter` is supplied by
/// the host process; `proxy_for_attempt` derives the attempt-scoped
/// principal used for the master protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Result<Self, UamError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(UamError::InvalidArgument("submitter principal must not be blank"));
        }
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Derive a proxy principal labelled with the attempt id, acting on
    /// behalf of this principal.
    pub fn proxy_for_attempt(&self, attempt_id: &AttemptId) -> Principal {
        Principal {
            name: format!("{}/{}", self.name, attempt_id),
        }
    }
}

/// Holds the current AMRM token for an attempt. Shared between the
/// controller and the Heartbeat Worker so a refreshed token from an
/// allocate response is visible to subsequent RPCs without re-creating the
/// master proxy (invariant: `master_rpc_proxy` transitions null → non-null
/// exactly once).
#[derive(Debug)]
pub struct TokenHolder(RwLock<AmrmToken>);

impl TokenHolder {
    pub fn new(token: AmrmToken) -> Self {
        Self(RwLock::new(token))
    }

    pub fn current(&self) -> AmrmToken {
        self.0.read().expect("token holder lock poisoned").clone()
    }

    /// Apply a refreshed token. Called only by the Heartbeat Worker, before
    /// the triggering callback fires, so callbacks always see a consistent
    /// session.
    pub fn refresh(&self, new_token: AmrmToken) {
        *self.0.write().expect("token holder lock poisoned") = new_token;
    }
}
