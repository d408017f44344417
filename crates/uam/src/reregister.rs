//! Shared re-registration policy used by both `allocate` and
//! `finish_application_master`.
//!
//! Call the underlying RPC; if it fails because the CRM has forgotten the
//! attempt ([`UamError::SessionLost`]), replay the stashed
//! `register_application_master` request and retry the original call
//! exactly once. Any other failure, or a second failure after retry,
//! surfaces to the caller untouched.

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::error::UamError;
use crate::rpc::MasterProtocol;
use crate::types::RegisterRequest;

pub async fn call_with_reregister<T, F, Fut>(
    master_proxy: &Arc<dyn MasterProtocol>,
    register_request: &RegisterRequest,
    op: F,
) -> Result<T, UamError>
where
    F: Fn(Arc<dyn MasterProtocol>) -> Fut,
    Fut: Future<Output = Result<T, UamError>>,
{
    match op(master_proxy.clone()).await {
        Err(UamError::SessionLost(attempt_id)) => {
            warn!(%attempt_id, "CRM reports attempt unregistered, re-registering before retry");
            master_proxy
                .register_application_master(register_request)
                .await?;
            op(master_proxy.clone()).await
        }
        other => other,
    }
}
