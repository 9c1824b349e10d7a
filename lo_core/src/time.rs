// ABOUTME: Utilities for working with times and timestamps.
// ABOUTME: Provides microsecond artifact labels and monotonic timers.
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::time::{Duration, Instant};

/// strftime pattern for artifact timestamp labels
pub const LABEL_FORMAT: &str = "%Y%m%d-%H-%M-%S%.6f";

/// Format a point in time as an artifact label with microsecond precision
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use lo_core::timestamp_label;
///
/// let time = Utc.with_ymd_and_hms(2021, 1, 1, 7, 5, 9).unwrap()
///     + chrono::Duration::microseconds(42);
/// assert_eq!(timestamp_label(&time), "20210101-07-05-09.000042");
/// ```
pub fn timestamp_label<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format(LABEL_FORMAT).to_string()
}

/// Label for the current local time
pub fn now_label() -> String {
    timestamp_label(&Local::now())
}

/// Create a monotonic duration measurer
///
/// # Examples
///
/// ```
/// use lo_core::MonotonicTimer;
/// use std::thread;
/// use std::time::Duration;
///
/// let timer = MonotonicTimer::new();
/// thread::sleep(Duration::from_millis(1));
/// let elapsed = timer.elapsed();
/// assert!(elapsed >= Duration::from_millis(1));
/// ```
pub struct MonotonicTimer {
    start: Instant,
}

impl MonotonicTimer {
    /// Create a new timer starting now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time since creation
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for MonotonicTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::thread;

    #[test]
    fn test_timestamp_label_microseconds() {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 1).unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(timestamp_label(&time), "20240309-23-59-01.123456");
    }

    #[test]
    fn test_labels_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(timestamp_label(&earlier) < timestamp_label(&later));
    }

    #[test]
    fn test_now_label_shape() {
        let label = now_label();
        assert_eq!(label.len(), "20240309-23-59-01.123456".len());
        assert_eq!(&label[8..9], "-");
    }

    #[test]
    fn test_monotonic_timer_never_goes_backwards() {
        let timer = MonotonicTimer::default();
        let first = timer.elapsed();
        thread::sleep(Duration::from_millis(1));
        let second = timer.elapsed();
        assert!(second >= first + Duration::from_millis(1));
    }
}
