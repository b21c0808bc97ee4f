//! CR application and upgrade progress tracking
//!
//! Applies a generated (or user supplied) CR file to the cluster, then polls
//! the resource status once per second until the operator reports completion
//! or a failed `Succeeded` condition. Progress goes to stderr so the YAML on
//! stdout stays clean when both are produced in one invocation.

use std::path::Path;
use std::time::Duration;

use crate::crd::EntandoAppV2Status;
use crate::{kubectl, Error, Result};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Apply the CR file and follow the upgrade progress until it completes
pub async fn apply_and_watch(file: &Path, force: bool) -> Result<()> {
    kubectl::create_entando_app(file, force).await?;
    eprintln!("Changes applied");
    watch_progress().await
}

/// Poll the resource status until the upgrade completes or fails
pub async fn watch_progress() -> Result<()> {
    let mut last_reported: Option<(u32, u32)> = None;

    loop {
        let app = kubectl::get_entando_app().await?;
        let status = app.status.unwrap_or_default();

        if let Some(message) = status.failure_message() {
            return Err(Error::resource(message.to_string()));
        }

        if report_progress(&status, &mut last_reported) {
            eprintln!("Upgrade successfully completed");
            return Ok(());
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Print a progress line when the counters changed; true when done
///
/// A zero total means the operator has not published its plan yet, so the
/// poll keeps waiting instead of declaring an empty upgrade finished.
fn report_progress(status: &EntandoAppV2Status, last_reported: &mut Option<(u32, u32)>) -> bool {
    if status.total == 0 {
        return false;
    }

    let current = (status.progress, status.total);
    if *last_reported != Some(current) {
        eprintln!(
            "Upgrade in progress... ({}/{})",
            status.progress, status.total
        );
        *last_reported = Some(current);
    }

    status.progress >= status.total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{Condition, ConditionStatus};

    fn status(progress: u32, total: u32) -> EntandoAppV2Status {
        EntandoAppV2Status {
            progress,
            total,
            conditions: Vec::new(),
        }
    }

    #[test]
    fn waits_while_the_operator_has_no_plan() {
        let mut last = None;
        assert!(!report_progress(&status(0, 0), &mut last));
        assert_eq!(last, None);
    }

    #[test]
    fn reports_each_step_once_and_detects_completion() {
        let mut last = None;

        assert!(!report_progress(&status(2, 7), &mut last));
        assert_eq!(last, Some((2, 7)));

        // Same counters again: no state change
        assert!(!report_progress(&status(2, 7), &mut last));

        assert!(report_progress(&status(7, 7), &mut last));
        assert_eq!(last, Some((7, 7)));
    }

    #[test]
    fn failed_condition_message_becomes_the_error() {
        let failed = EntandoAppV2Status {
            progress: 3,
            total: 7,
            conditions: vec![Condition {
                type_: "Succeeded".to_string(),
                status: ConditionStatus::False,
                reason: String::new(),
                message: "de-app rollout timed out".to_string(),
                last_transition_time: None,
            }],
        };
        assert_eq!(failed.failure_message(), Some("de-app rollout timed out"));
    }
}
