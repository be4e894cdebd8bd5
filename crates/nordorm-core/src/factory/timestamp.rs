//! Process-wide monotonic timestamps handed to sessions at open.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

// Low bits left free so several sessions can open within one millisecond.
const SHIFT: u32 = 12;

static PROCESS: Timestamper = Timestamper::new();

/// Next process-wide session timestamp.
pub fn next() -> u64 {
    PROCESS.next()
}

///
/// Timestamper
///
/// Wall-clock milliseconds shifted left by `SHIFT`; when the clock has not
/// advanced (or went backwards) the previous value is bumped by one.
/// Strictly increasing across all threads.
///

#[derive(Debug, Default)]
pub struct Timestamper {
    last: AtomicU64,
}

impl Timestamper {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    pub fn next(&self) -> u64 {
        let now = now_millis() << SHIFT;
        let mut previous = self.last.load(Ordering::Acquire);

        loop {
            let candidate = now.max(previous.saturating_add(1));
            match self.last.compare_exchange_weak(
                previous,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return candidate,
                Err(actual) => previous = actual,
            }
        }
    }
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::{collections::BTreeSet, thread};

    #[test]
    fn timestamps_track_the_wall_clock() {
        let before = now_millis();
        let stamp = Timestamper::new().next();

        assert!(stamp >> SHIFT >= before);
    }

    #[test]
    fn concurrent_callers_never_see_duplicates() {
        let stamper = Timestamper::new();

        let stamps: Vec<Vec<u64>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| (0..500).map(|_| stamper.next()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("worker should not panic"))
                .collect()
        });

        for per_thread in &stamps {
            assert!(
                per_thread.windows(2).all(|pair| pair[0] < pair[1]),
                "each thread must observe strictly increasing timestamps"
            );
        }
        let unique: BTreeSet<u64> = stamps.iter().flatten().copied().collect();
        assert_eq!(unique.len(), 8 * 500);
    }

    proptest! {
        #[test]
        fn sequential_calls_strictly_increase(calls in 2usize..200) {
            let stamper = Timestamper::new();
            let mut previous = stamper.next();
            for _ in 1..calls {
                let next = stamper.next();
                prop_assert!(next > previous);
                previous = next;
            }
        }
    }
}
