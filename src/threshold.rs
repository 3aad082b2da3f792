use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::metrics::Snapshot;

/// A metric a threshold can be declared over. Duration stats are in
/// milliseconds, rates are fractions in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// `http_reqs.count` — total requests issued.
    ReqsCount,
    /// `http_reqs.rate` — requests per second over the run.
    ReqsRate,
    /// `http_req_failed.rate` — failed fraction of all requests.
    FailedRate,
    /// `http_req_duration.<stat>` — latency distribution stats.
    Duration(DurationStat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationStat {
    Avg,
    Min,
    Max,
    Med,
    P90,
    P95,
    P99,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    fn holds(self, observed: f64, bound: f64) -> bool {
        match self {
            Comparator::Lt => observed < bound,
            Comparator::Le => observed <= bound,
            Comparator::Gt => observed > bound,
            Comparator::Ge => observed >= bound,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
        };
        f.write_str(op)
    }
}

/// A declarative pass/fail condition over one aggregated metric,
/// e.g. `http_req_duration.p95<500`.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub metric: Metric,
    pub cmp: Comparator,
    pub bound: f64,
    expr: String,
}

impl Threshold {
    fn observed(&self, snap: &Snapshot) -> f64 {
        match self.metric {
            Metric::ReqsCount => snap.requests as f64,
            Metric::ReqsRate => snap.requests_per_sec(),
            Metric::FailedRate => snap.failure_rate(),
            Metric::Duration(stat) => match stat {
                DurationStat::Avg => snap.latency_avg_ms(),
                DurationStat::Min => snap.latency_min_ms(),
                DurationStat::Max => snap.latency_max_ms(),
                DurationStat::Med => snap.latency_at_quantile_ms(0.50),
                DurationStat::P90 => snap.latency_at_quantile_ms(0.90),
                DurationStat::P95 => snap.latency_at_quantile_ms(0.95),
                DurationStat::P99 => snap.latency_at_quantile_ms(0.99),
            },
        }
    }
}

impl FromStr for Threshold {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = s.trim();
        let malformed = || ConfigError::MalformedThreshold {
            expr: expr.to_string(),
        };

        // two-character operators first so `<=` is not read as `<` + `=0.5`
        let (op_idx, op_len, cmp) = ["<=", ">=", "<", ">"]
            .iter()
            .find_map(|op| expr.find(op).map(|idx| (idx, op.len(), *op)))
            .ok_or_else(malformed)?;
        let cmp = match cmp {
            "<=" => Comparator::Le,
            ">=" => Comparator::Ge,
            "<" => Comparator::Lt,
            ">" => Comparator::Gt,
            _ => unreachable!(),
        };

        let metric_spec = expr[..op_idx].trim();
        let bound: f64 = expr[op_idx + op_len..].trim().parse().map_err(|_| malformed())?;

        let (name, stat) = metric_spec.split_once('.').ok_or_else(malformed)?;
        let unknown = || ConfigError::UnknownMetric {
            name: metric_spec.to_string(),
            expr: expr.to_string(),
        };
        let metric = match (name, stat) {
            ("http_reqs", "count") => Metric::ReqsCount,
            ("http_reqs", "rate") => Metric::ReqsRate,
            ("http_req_failed", "rate") => Metric::FailedRate,
            ("http_req_duration", stat) => Metric::Duration(match stat {
                "avg" => DurationStat::Avg,
                "min" => DurationStat::Min,
                "max" => DurationStat::Max,
                "med" => DurationStat::Med,
                "p90" => DurationStat::P90,
                "p95" => DurationStat::P95,
                "p99" => DurationStat::P99,
                _ => return Err(unknown()),
            }),
            _ => return Err(unknown()),
        };

        Ok(Threshold {
            metric,
            cmp,
            bound,
            expr: expr.to_string(),
        })
    }
}

/// Outcome of checking one threshold against the final snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdResult {
    pub expression: String,
    pub observed: f64,
    pub passed: bool,
}

/// Evaluates every threshold independently. Pure over the snapshot, so
/// repeated evaluation yields identical results.
pub fn evaluate(thresholds: &[Threshold], snap: &Snapshot) -> Vec<ThresholdResult> {
    thresholds
        .iter()
        .map(|t| {
            let observed = t.observed(snap);
            ThresholdResult {
                expression: t.expr.clone(),
                observed,
                passed: t.cmp.holds(observed, t.bound),
            }
        })
        .collect()
}
