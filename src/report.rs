use crate::config::Config;
use crate::metrics::Snapshot;
use crate::threshold::ThresholdResult;

/// Prints the run summary in the usual wrk-ish layout: counts, rates,
/// latency distribution, then one line per threshold.
pub fn print_summary(config: &Config, snap: &Snapshot) {
    println!("\nSummary:");
    println!("  Target: GET {}", config.url);
    println!("  VUs: {}  Duration: {:?}", config.vus, config.duration);
    println!("  Total Requests: {}", snap.requests);
    println!("  Failed Requests: {}", snap.failures);
    println!("  Failure Rate: {:.2}%", snap.failure_rate() * 100.0);
    println!("  Requests/sec: {:.2}", snap.requests_per_sec());
    println!(
        "  Transfer: {:.2}MB",
        snap.bytes as f64 / 1024.0 / 1024.0
    );

    println!("\nLatency:");
    println!("  Avg: {:.2}ms", snap.latency_avg_ms());
    println!("  Min: {:.2}ms", snap.latency_min_ms());
    println!("  Max: {:.2}ms", snap.latency_max_ms());
    println!("  P90: {:.2}ms", snap.latency_at_quantile_ms(0.90));
    println!("  P95: {:.2}ms", snap.latency_at_quantile_ms(0.95));
    println!("  P99: {:.2}ms", snap.latency_at_quantile_ms(0.99));

    if !snap.breakdown.is_empty() {
        println!("\nResponses:");
        let mut entries: Vec<_> = snap.breakdown.iter().collect();
        entries.sort();
        for (key, count) in entries {
            println!("  {key}: {count}");
        }
    }
}

/// Prints one line per threshold and returns whether the run passed
/// overall (the AND of all thresholds).
pub fn print_thresholds(results: &[ThresholdResult]) -> bool {
    if results.is_empty() {
        return true;
    }

    println!("\nThresholds:");
    let mut all_passed = true;
    for result in results {
        let mark = if result.passed { "PASS" } else { "FAIL" };
        println!(
            "  [{mark}] {}  (observed {:.4})",
            result.expression, result.observed
        );
        all_passed &= result.passed;
    }
    all_passed
}
