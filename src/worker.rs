use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::metrics::{Recorder, RequestOutcome};

/// One virtual user: invokes the scenario back-to-back until the shared
/// deadline passes, recording every outcome as it completes. A request
/// already in flight when the deadline hits finishes (or times out) on
/// its own schedule.
///
/// If the scenario itself fails, the failure is a configuration problem
/// surfacing at call time; the VU records one failed outcome and stops
/// instead of spinning on the same error until the deadline.
pub async fn run_vu<S, Fut>(scenario: S, deadline: Instant, recorder: Arc<Recorder>)
where
    S: Fn() -> Fut,
    Fut: Future<Output = Result<RequestOutcome>>,
{
    while Instant::now() < deadline {
        match scenario().await {
            Ok(outcome) => recorder.record(&outcome),
            Err(e) => {
                tracing::error!("scenario aborted: {e:#}");
                recorder.record(&RequestOutcome::scenario_error(&e));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn records_one_outcome_per_invocation() {
        let recorder = Arc::new(Recorder::new());
        let calls = Arc::new(AtomicU64::new(0));

        let scenario = {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(RequestOutcome {
                        latency: Duration::from_millis(5),
                        status: Some(200),
                        success: true,
                        bytes: 0,
                        error: None,
                    })
                }
            }
        };

        let deadline = Instant::now() + Duration::from_millis(100);
        run_vu(scenario, deadline, Arc::clone(&recorder)).await;

        let snap = recorder.snapshot();
        assert_eq!(snap.requests, calls.load(Ordering::Relaxed));
        assert!(snap.requests > 0);
        assert_eq!(snap.failures, 0);
    }

    #[tokio::test]
    async fn failing_scenario_stops_after_one_outcome() {
        let recorder = Arc::new(Recorder::new());
        let scenario = || async { Err(anyhow::anyhow!("target URL is not set")) };

        let started = Instant::now();
        let deadline = started + Duration::from_secs(30);
        run_vu(scenario, deadline, Arc::clone(&recorder)).await;

        // terminated immediately rather than looping until the deadline
        assert!(started.elapsed() < Duration::from_secs(1));
        let snap = recorder.snapshot();
        assert_eq!(snap.requests, 1);
        assert_eq!(snap.failures, 1);
    }

    #[tokio::test]
    async fn expired_deadline_issues_no_requests() {
        let recorder = Arc::new(Recorder::new());
        let calls = Arc::new(AtomicU64::new(0));

        let scenario = {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Ok(RequestOutcome {
                        latency: Duration::from_millis(1),
                        status: Some(200),
                        success: true,
                        bytes: 0,
                        error: None,
                    })
                }
            }
        };

        let deadline = Instant::now() - Duration::from_millis(1);
        run_vu(scenario, deadline, Arc::clone(&recorder)).await;
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert_eq!(recorder.snapshot().requests, 0);
    }
}
