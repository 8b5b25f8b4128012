// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shared simulation clock.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
    time::Duration,
};

struct ClockInner {
    tick: AtomicU64,
    period: RwLock<Duration>,
    upstream: RwLock<Option<SimClock>>,
}

/// Global tick and sample period of one simulation instance.
///
/// A clock attached to an upstream clock reads and writes through it, so the
/// objects of a composed tree all observe the tick of their root.
#[derive(Clone)]
pub struct SimClock {
    inner: Arc<ClockInner>,
}

impl SimClock {
    /// Creates a detached clock at tick zero.
    pub fn new(period: Duration) -> Self {
        Self {
            inner: Arc::new(ClockInner {
                tick: AtomicU64::new(0),
                period: RwLock::new(period),
                upstream: RwLock::new(None),
            }),
        }
    }

    fn upstream(&self) -> Option<SimClock> {
        self.inner
            .upstream
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The global tick.
    pub fn tick(&self) -> u64 {
        match self.upstream() {
            Some(up) => up.tick(),
            None => self.inner.tick.load(Ordering::Acquire),
        }
    }

    /// Sets the global tick.
    pub fn set_tick(&self, tick: u64) {
        match self.upstream() {
            Some(up) => up.set_tick(tick),
            None => self.inner.tick.store(tick, Ordering::Release),
        }
    }

    /// Increments the global tick, returning the new value.
    pub fn advance(&self) -> u64 {
        match self.upstream() {
            Some(up) => up.advance(),
            None => self.inner.tick.fetch_add(1, Ordering::AcqRel) + 1,
        }
    }

    /// Sets the global tick back to zero.
    pub fn reset(&self) {
        self.set_tick(0);
    }

    /// Simulated length of one tick.
    pub fn period(&self) -> Duration {
        match self.upstream() {
            Some(up) => up.period(),
            None => *self
                .inner
                .period
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Sets the sample period, upstream when attached.
    pub fn set_period(&self, period: Duration) {
        match self.upstream() {
            Some(up) => up.set_period(period),
            None => {
                *self
                    .inner
                    .period
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = period
            }
        }
    }

    /// Simulated time, `tick * period`.
    pub fn time(&self) -> Duration {
        self.period()
            .saturating_mul(u32::try_from(self.tick()).unwrap_or(u32::MAX))
    }

    /// Simulated time in seconds.
    pub fn time_secs(&self) -> f64 {
        self.tick() as f64 * self.period().as_secs_f64()
    }

    /// Follows `upstream` from now on.
    ///
    /// Returns `false` and leaves the clock unchanged when `upstream` is this
    /// clock or already follows it, directly or through other clocks.
    pub fn attach_to(&self, upstream: &SimClock) -> bool {
        let mut cursor = Some(upstream.clone());
        while let Some(clock) = cursor {
            if clock.same_as(self) {
                log::warn!("SimClock: attachment refused, it would close a loop.");
                return false;
            }
            cursor = clock.upstream();
        }
        *self
            .inner
            .upstream
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(upstream.clone());
        true
    }

    /// Goes back to the clock's own tick and period.
    pub fn detach(&self) {
        *self
            .inner
            .upstream
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns `true` while following an upstream clock.
    pub fn is_attached(&self) -> bool {
        self.upstream().is_some()
    }

    /// Returns `true` if both handles refer to the same clock.
    pub fn same_as(&self, other: &SimClock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl fmt::Debug for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimClock")
            .field("tick", &self.tick())
            .field("period", &self.period())
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn advance_and_time() {
        let clock = SimClock::new(Duration::from_millis(10));
        assert_eq!(clock.advance(), 1);
        assert_eq!(clock.advance(), 2);
        assert_eq!(clock.time(), Duration::from_millis(20));
        assert_relative_eq!(clock.time_secs(), 0.02);
        clock.reset();
        assert_eq!(clock.tick(), 0);
    }

    #[test]
    fn attached_clock_reads_upstream() {
        let root = SimClock::new(Duration::from_millis(50));
        let child = SimClock::default();
        let grandchild = SimClock::default();
        grandchild.attach_to(&child);
        child.attach_to(&root);

        root.set_tick(7);
        assert_eq!(grandchild.tick(), 7);
        assert_eq!(grandchild.period(), Duration::from_millis(50));

        grandchild.advance();
        assert_eq!(root.tick(), 8);

        child.detach();
        assert_eq!(grandchild.tick(), 0);
        assert_eq!(grandchild.period(), Duration::from_secs(1));
    }

    #[test]
    fn self_attachment_ignored() {
        let clock = SimClock::default();
        assert!(!clock.attach_to(&clock.clone()));
        assert!(!clock.is_attached());
    }

    #[test]
    fn attachment_loops_refused() {
        let (a, b, c) = (SimClock::default(), SimClock::default(), SimClock::default());
        assert!(a.attach_to(&b));
        assert!(b.attach_to(&c));

        assert!(!c.attach_to(&a));
        assert!(!b.attach_to(&a));
        assert!(!c.is_attached());

        c.set_tick(4);
        assert_eq!(a.tick(), 4);
    }
}
