//! Construction progress from elapsed wall-clock time.
//!
//! Progress is recomputed from the start time every tick rather than
//! accumulated, so a late or skipped tick catches up on the next one.

pub const COMPLETE: f64 = 100.0;

/// Percentage complete after `elapsed_seconds` of a `duration_seconds` job.
///
/// Clamped to `[0, 100]`. A zero duration completes immediately.
pub fn construction_progress(elapsed_seconds: f64, duration_seconds: f64) -> f64 {
    if duration_seconds <= 0.0 {
        return COMPLETE;
    }
    (elapsed_seconds / duration_seconds * 100.0).clamp(0.0, COMPLETE)
}

/// Result of advancing one job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub progress: f64,
    /// True only on the tick the job crosses 100.
    pub just_completed: bool,
}

/// Advance a job, keeping progress monotone.
pub fn advance(previous: f64, elapsed_seconds: f64, duration_seconds: f64) -> ProgressUpdate {
    let progress = construction_progress(elapsed_seconds, duration_seconds).max(previous);
    ProgressUpdate {
        progress,
        just_completed: previous < COMPLETE && progress >= COMPLETE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_linear() {
        assert!((construction_progress(150.0, 300.0) - 50.0).abs() < 1e-9);
        assert_eq!(construction_progress(0.0, 300.0), 0.0);
    }

    #[test]
    fn test_progress_caps_at_100() {
        assert_eq!(construction_progress(300.0, 300.0), 100.0);
        assert_eq!(construction_progress(9000.0, 300.0), 100.0);
    }

    #[test]
    fn test_negative_elapsed_is_zero() {
        // Clock skew: start time recorded slightly in the future.
        assert_eq!(construction_progress(-5.0, 300.0), 0.0);
    }

    #[test]
    fn test_advance_completes_once() {
        let first = advance(90.0, 300.0, 300.0);
        assert!(first.just_completed);
        let second = advance(first.progress, 310.0, 300.0);
        assert!(!second.just_completed);
        assert_eq!(second.progress, 100.0);
    }

    #[test]
    fn test_advance_never_regresses() {
        let u = advance(60.0, 30.0, 300.0);
        assert_eq!(u.progress, 60.0);
        assert!(!u.just_completed);
    }
}
