use crate::Poll;

/// Tracks when the next poll cycle of a device is due.
///
/// The caller owns the clock and passes a monotonic millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period_ms: u32,
    next_ms: Option<u64>,
}

impl Interval {
    pub const fn from_millis(period_ms: u32) -> Self {
        Self {
            period_ms,
            next_ms: None,
        }
    }

    /// Interval with the default cadence of device `P`
    pub const fn for_device<P: Poll>() -> Self {
        Self::from_millis(P::DEFAULT_INTERVAL_MS)
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Returns `true` at most once per period, starting with the first call.
    ///
    /// After a missed window the schedule restarts from `now_ms`, so a late
    /// caller gets one cycle instead of a burst.
    pub fn is_due(&mut self, now_ms: u64) -> bool {
        match self.next_ms {
            Some(next) if now_ms < next => false,
            Some(next) => {
                let period = self.period_ms as u64;
                let following = next + period;
                self.next_ms = Some(if now_ms >= following {
                    now_ms + period
                } else {
                    following
                });
                true
            }
            None => {
                self.next_ms = Some(now_ms + self.period_ms as u64);
                true
            }
        }
    }
}
