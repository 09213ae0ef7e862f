//! Latency summaries and side-by-side comparisons.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Summary statistics over a set of latency samples, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    pub samples: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub p50_ms: f64,
    pub max_ms: f64,
}

impl LatencySummary {
    /// Summarize samples; `None` when there are none.
    #[must_use]
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = samples.iter().map(|d| d.as_secs_f64() * 1_000.0).collect();
        sorted.sort_by(f64::total_cmp);

        #[allow(clippy::cast_precision_loss)]
        let mean_ms = sorted.iter().sum::<f64>() / sorted.len() as f64;

        Some(Self {
            samples: sorted.len(),
            mean_ms,
            min_ms: sorted[0],
            p50_ms: sorted[(sorted.len() - 1) / 2],
            max_ms: sorted[sorted.len() - 1],
        })
    }
}

/// Two measured paths doing the same work
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub name: String,
    pub baseline_label: String,
    pub baseline: LatencySummary,
    pub candidate_label: String,
    pub candidate: LatencySummary,
}

impl Comparison {
    /// How many times faster the candidate is on average.
    ///
    /// `None` if the candidate's mean is zero.
    #[must_use]
    pub fn speedup(&self) -> Option<f64> {
        (self.candidate.mean_ms > 0.0).then(|| self.baseline.mean_ms / self.candidate.mean_ms)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} rounds)", self.name, self.baseline.samples)?;
        for (label, s) in [
            (&self.baseline_label, &self.baseline),
            (&self.candidate_label, &self.candidate),
        ] {
            writeln!(
                f,
                "  {label:<10} mean {:>9.3} ms  p50 {:>9.3} ms  min {:>9.3} ms  max {:>9.3} ms",
                s.mean_ms, s.p50_ms, s.min_ms, s.max_ms
            )?;
        }
        match self.speedup() {
            Some(x) => write!(f, "  speedup    {x:.1}x"),
            None => write!(f, "  speedup    n/a"),
        }
    }
}
