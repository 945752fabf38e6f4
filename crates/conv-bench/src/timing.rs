//! Repeated timing with outlier trimming

use crate::error::{BenchError, Result};
use std::time::Instant;
use tracing::debug;

/// Per-repetition wall times with the running extremes discarded.
///
/// After each recorded repetition, once more than three timings are held the
/// current maximum and minimum are removed.
#[derive(Debug, Clone, Default)]
pub struct TrimmedTimings {
    timings: Vec<f64>,
}

impl TrimmedTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one repetition (seconds)
    pub fn record(&mut self, seconds: f64) {
        self.timings.push(seconds);
        if self.timings.len() > 3 {
            self.remove_extreme(f64::max);
            self.remove_extreme(f64::min);
        }
    }

    fn remove_extreme(&mut self, pick: fn(f64, f64) -> f64) {
        let Some(&first) = self.timings.first() else {
            return;
        };
        let extreme = self.timings.iter().copied().fold(first, pick);
        if let Some(pos) = self.timings.iter().position(|&t| t == extreme) {
            self.timings.remove(pos);
        }
    }

    /// Surviving timings
    pub fn samples(&self) -> &[f64] {
        &self.timings
    }

    /// Mean of the surviving timings, `None` before the first record
    pub fn mean(&self) -> Option<f64> {
        if self.timings.is_empty() {
            None
        } else {
            Some(self.timings.iter().sum::<f64>() / self.timings.len() as f64)
        }
    }
}

/// Outcome of [`time_repeated`]
#[derive(Debug, Clone)]
pub struct Timed<T> {
    /// Trimmed mean over repetitions (seconds per repetition)
    pub seconds: f64,
    /// Result of the last execution
    pub last: T,
}

/// Run `statement` `number` times per repetition for `repetitions` repetitions.
pub fn time_repeated<T, F>(
    mut statement: F,
    number: usize,
    repetitions: usize,
) -> Result<Timed<T>>
where
    F: FnMut() -> T,
{
    if number == 0 || repetitions == 0 {
        return Err(BenchError::InvalidSweep(
            "number and repetitions must be at least 1".to_string(),
        ));
    }

    let mut timings = TrimmedTimings::new();
    let mut last = None;
    for _ in 0..repetitions {
        let start = Instant::now();
        for _ in 0..number {
            last = Some(statement());
        }
        timings.record(start.elapsed().as_secs_f64());
    }

    match (timings.mean(), last) {
        (Some(seconds), Some(last)) => {
            debug!(repetitions, kept = timings.samples().len(), seconds, "timed statement");
            Ok(Timed { seconds, last })
        }
        _ => Err(BenchError::InvalidSweep("no repetitions recorded".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_first_three() {
        let mut timings = TrimmedTimings::new();
        for t in [3.0, 1.0, 2.0] {
            timings.record(t);
        }
        assert_eq!(timings.samples(), &[3.0, 1.0, 2.0]);
        assert_eq!(timings.mean(), Some(2.0));
    }

    #[test]
    fn test_trims_running_extremes() {
        let mut timings = TrimmedTimings::new();
        for t in [5.0, 1.0, 3.0, 100.0] {
            timings.record(t);
        }
        // 100 and 1 discarded on the fourth record
        assert_eq!(timings.samples(), &[5.0, 3.0]);

        timings.record(4.0);
        timings.record(0.5);
        // [5, 3, 4] then [5, 3, 4, 0.5] drops 5 and 0.5
        assert_eq!(timings.samples(), &[3.0, 4.0]);
        assert_eq!(timings.mean(), Some(3.5));
    }

    #[test]
    fn test_empty_mean() {
        assert_eq!(TrimmedTimings::new().mean(), None);
    }

    #[test]
    fn test_time_repeated_counts_executions() {
        let mut calls = 0;
        let timed = time_repeated(
            || {
                calls += 1;
                calls
            },
            3,
            4,
        )
        .unwrap();
        assert_eq!(timed.last, 12);
        assert!(timed.seconds >= 0.0);
        assert_eq!(calls, 12);
    }

    #[test]
    fn test_time_repeated_rejects_zero() {
        assert!(time_repeated(|| (), 0, 5).is_err());
        assert!(time_repeated(|| (), 5, 0).is_err());
    }
}
