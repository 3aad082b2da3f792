use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;

/// The result of one scenario invocation. Built once per HTTP call and
/// handed to the [`Recorder`]; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub latency: Duration,
    pub status: Option<u16>,
    pub success: bool,
    pub bytes: u64,
    pub error: Option<String>,
}

impl RequestOutcome {
    /// Outcome for a scenario that failed before a request could be issued,
    /// e.g. configuration trouble surfacing at call time.
    pub fn scenario_error(err: &anyhow::Error) -> Self {
        RequestOutcome {
            latency: Duration::ZERO,
            status: None,
            success: false,
            bytes: 0,
            error: Some(format!("{err:#}")),
        }
    }
}

/// Shared, thread-safe sink for request outcomes. Counters are atomic and
/// monotonic while the run is in progress; the latency histogram sits behind
/// a mutex held only for the single record call.
pub struct Recorder {
    requests: AtomicU64,
    failures: AtomicU64,
    bytes: AtomicU64,
    latency: Mutex<Histogram<u64>>,
    breakdown: Mutex<HashMap<String, u64>>,
    started: Instant,
}

impl Recorder {
    pub fn new() -> Self {
        Recorder {
            requests: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            latency: Mutex::new(
                Histogram::<u64>::new(3).expect("3 significant figures is a valid precision"),
            ),
            breakdown: Mutex::new(HashMap::new()),
            started: Instant::now(),
        }
    }

    pub fn record(&self, outcome: &RequestOutcome) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !outcome.success {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        self.bytes.fetch_add(outcome.bytes, Ordering::Relaxed);

        let micros = outcome.latency.as_micros() as u64;
        {
            let mut hist = self.latency.lock().unwrap_or_else(|e| e.into_inner());
            hist.record(micros).unwrap_or_default();
        }

        // status code when a response arrived, otherwise the error detail
        let key = match outcome.status {
            Some(status) => status.to_string(),
            None => outcome
                .error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        };
        let mut breakdown = self.breakdown.lock().unwrap_or_else(|e| e.into_inner());
        *breakdown.entry(key).or_insert(0) += 1;
    }

    /// A consistent view of the counters and the latency distribution.
    /// Called once after all workers have joined, so the fields cannot
    /// drift apart between reads.
    pub fn snapshot(&self) -> Snapshot {
        let latency = self
            .latency
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let breakdown = self
            .breakdown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        Snapshot {
            requests: self.requests.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
            latency,
            breakdown,
        }
    }
}

/// Read-only aggregate of a finished (or in-progress) run.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub requests: u64,
    pub failures: u64,
    pub bytes: u64,
    pub elapsed: Duration,
    pub breakdown: HashMap<String, u64>,
    latency: Histogram<u64>,
}

impl Snapshot {
    pub fn failure_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.failures as f64 / self.requests as f64
        }
    }

    pub fn requests_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.requests as f64 / secs
        }
    }

    /// Latency at the given quantile, in milliseconds. hdrhistogram's
    /// estimator is deterministic for a fixed sample multiset, independent
    /// of recording order.
    pub fn latency_at_quantile_ms(&self, quantile: f64) -> f64 {
        self.latency.value_at_quantile(quantile) as f64 / 1000.0
    }

    pub fn latency_avg_ms(&self) -> f64 {
        self.latency.mean() / 1000.0
    }

    pub fn latency_min_ms(&self) -> f64 {
        self.latency.min() as f64 / 1000.0
    }

    pub fn latency_max_ms(&self) -> f64 {
        self.latency.max() as f64 / 1000.0
    }
}
