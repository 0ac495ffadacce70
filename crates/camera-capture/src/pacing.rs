//! Frame-rate pacing

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Longest single sleep; bounds how late a stop signal can be noticed
pub(crate) const PACING_SLICE: Duration = Duration::from_millis(100);

/// Time left in the frame interval after a download took `elapsed`
pub(crate) fn remaining(frame_interval_ms: u64, elapsed: Duration) -> Option<Duration> {
    if frame_interval_ms == 0 {
        return None;
    }
    Duration::from_millis(frame_interval_ms)
        .checked_sub(elapsed)
        .filter(|left| !left.is_zero())
}

/// Sleep off `remaining` in slices, checking `stop` before each one
///
/// Returns the total time handed to `sleep`.
pub(crate) fn pace_with<S>(mut remaining: Duration, stop: &AtomicBool, mut sleep: S) -> Duration
where
    S: FnMut(Duration),
{
    let mut slept = Duration::ZERO;
    while !remaining.is_zero() && !stop.load(Ordering::Acquire) {
        let slice = remaining.min(PACING_SLICE);
        sleep(slice);
        slept += slice;
        remaining -= slice;
    }
    slept
}

/// Apply the configured frame interval after one iteration
pub(crate) fn pace(frame_interval_ms: u64, elapsed: Duration, stop: &AtomicBool) {
    if let Some(left) = remaining(frame_interval_ms, elapsed) {
        pace_with(left, stop, std::thread::sleep);
    }
}
