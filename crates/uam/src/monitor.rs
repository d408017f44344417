//! Polls the client protocol until an attempt reaches a target state.
//!
//! The CRM publishes application state sooner than attempt state, so this
//! runs in two phases: wait for the application to become ACCEPTED (the
//! only legal state for a first attempt to sit in before an attempt id
//! exists), then poll the attempt itself until it reaches the target
//! state.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::UamError;
use crate::rpc::ClientProtocol;
use crate::types::{ApplicationId, ApplicationState, AttemptId, AttemptReport, AttemptState, PRE_ACCEPT_STATES};

pub struct AttemptMonitor<'a> {
    client_proxy: &'a dyn ClientProtocol,
    poll_interval: Duration,
    timeout: Duration,
}

impl<'a> AttemptMonitor<'a> {
    pub fn new(client_proxy: &'a dyn ClientProtocol, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            client_proxy,
            poll_interval,
            timeout,
        }
    }

    /// Poll until `application_id`'s attempt reaches `target_attempt_state`.
    ///
    /// A sleep that gets cut short by cancellation (not exposed on this
    /// type today, since `create_and_register` has no external cancel
    /// path in this spec) would be logged and would not push `start` back:
    /// cancellation shortens the waiting window, it never extends it.
    pub async fn wait_for_launch(
        &self,
        application_id: &ApplicationId,
        target_attempt_state: AttemptState,
    ) -> Result<AttemptReport, UamError> {
        let start = Instant::now();
        let mut attempt_id: Option<AttemptId> = None;

        loop {
            if start.elapsed() > self.timeout {
                return Err(UamError::AttemptLaunchTimeout);
            }

            match &attempt_id {
                None => {
                    let report = self.client_proxy.get_application_report(application_id).await?;
                    match report.state {
                        ApplicationState::Accepted => {
                            attempt_id = report.current_attempt_id;
                            debug!(%application_id, "application accepted, attempt id now known");
                        }
                        s if PRE_ACCEPT_STATES.contains(&s) => {
                            debug!(%application_id, state = ?s, "still waiting for application to be accepted");
                        }
                        other => {
                            debug!(%application_id, state = ?other, "application already past ACCEPTED: a later attempt exists");
                            return Err(UamError::NotFirstAttempt);
                        }
                    }
                }
                Some(id) => {
                    let attempt_report = self.client_proxy.get_application_attempt_report(id).await?;
                    if attempt_report.state == target_attempt_state {
                        return Ok(attempt_report);
                    }
                    debug!(attempt_id = %id, state = ?attempt_report.state, "attempt not yet launched");
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
