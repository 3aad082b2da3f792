use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::future::join_all;

use crate::metrics::{Recorder, RequestOutcome};
use crate::worker::run_vu;

/// Constant-VUs executor: spawn exactly `vus` workers at logical time zero,
/// all sharing one deadline computed once up front, then join every worker
/// before declaring the run complete. No ramp-up or ramp-down.
pub async fn run_constant_vus<S, Fut>(
    vus: usize,
    duration: Duration,
    scenario: S,
    recorder: Arc<Recorder>,
) -> Result<()>
where
    S: Fn() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<RequestOutcome>> + Send,
{
    let deadline = Instant::now() + duration;

    let handles: Vec<_> = (0..vus)
        .map(|vu| {
            let scenario = scenario.clone();
            let recorder = Arc::clone(&recorder);
            tokio::spawn(async move {
                tracing::debug!(vu, "worker started");
                run_vu(scenario, deadline, recorder).await;
                tracing::debug!(vu, "worker finished");
            })
        })
        .collect();

    for handle in join_all(handles).await {
        handle.context("worker task panicked")?;
    }
    Ok(())
}
