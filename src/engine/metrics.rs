//! Scan metrics.
//!
//! Counters describing what a single scan did:
//!
//! - `Scanner::run` for normal operation.
//! - `Scanner::run_with_metrics` for profiling and for inspecting which rules
//!   actually fired on an input.
//!
//! Only `run_with_metrics` reads the clock.

use crate::ScanResult;
use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanMetrics {
    /// Total elapsed time for [`Scanner::run_with_metrics`](super::Scanner::run_with_metrics).
    pub elapsed: Duration,
    /// Times the scanner rewound to a saved resume point after a dead end.
    pub backtracks: usize,
    /// Replace-token leaves that fired.
    pub replacements: usize,
    /// Leaves whose split markers fired.
    pub splits: usize,
    /// Deferred replacements applied after a later split confirmed the match.
    pub reexpansions: usize,
    /// Boundaries inserted at character-class changes.
    pub boundaries: usize,
}

/// Scan output bundled with its metrics.
#[derive(Debug, Clone)]
pub struct ScanRun {
    pub result: ScanResult,
    pub metrics: ScanMetrics,
}
