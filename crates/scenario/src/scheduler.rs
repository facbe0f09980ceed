//! Decides which action a session runs next and how long it waits between
//! actions. Personas never touch timers or randomness for scheduling
//! directly, so tests can drive them without real delays.

use crate::profile::WaitTime;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::time::Duration;

#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Index of the next action given relative weights. `None` ends the
    /// session's action loop.
    fn pick(&self, weights: &[u32]) -> Option<usize>;

    /// Sleep for a delay drawn from `wait`.
    async fn pause(&self, wait: WaitTime);
}

/// Weighted random choice and real sleeps on the tokio timer.
#[derive(Debug)]
pub struct TokioScheduler {
    rng: Mutex<StdRng>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn next_delay(&self, wait: WaitTime) -> Duration {
        wait.sample(&mut *self.rng.lock())
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    fn pick(&self, weights: &[u32]) -> Option<usize> {
        let distribution = WeightedIndex::new(weights).ok()?;
        Some(distribution.sample(&mut *self.rng.lock()))
    }

    async fn pause(&self, wait: WaitTime) {
        let delay = self.next_delay(wait);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Plays back a fixed list of action indices and never sleeps. Once the
/// script runs out the session stops.
#[derive(Debug, Default)]
pub struct ScriptedScheduler {
    script: Mutex<VecDeque<usize>>,
    pauses: Mutex<Vec<WaitTime>>,
}

impl ScriptedScheduler {
    pub fn new(script: impl IntoIterator<Item = usize>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            pauses: Mutex::new(Vec::new()),
        }
    }

    /// Waits requested so far, in order.
    pub fn pauses(&self) -> Vec<WaitTime> {
        self.pauses.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl Scheduler for ScriptedScheduler {
    fn pick(&self, weights: &[u32]) -> Option<usize> {
        let next = self.script.lock().pop_front()?;
        (next < weights.len()).then_some(next)
    }

    async fn pause(&self, wait: WaitTime) {
        self.pauses.lock().push(wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_pick_respects_zero_weights() {
        let scheduler = TokioScheduler::seeded(1);
        for _ in 0..100 {
            assert_eq!(scheduler.pick(&[0, 4, 0]), Some(1));
        }
    }

    #[test]
    fn weighted_pick_roughly_follows_weights() {
        let scheduler = TokioScheduler::seeded(7);
        let mut counts = [0u32; 3];
        for _ in 0..6_000 {
            counts[scheduler.pick(&[3, 1, 2]).unwrap()] += 1;
        }
        assert!(counts[0] > counts[2] && counts[2] > counts[1], "{counts:?}");
    }

    #[test]
    fn no_weights_means_no_action() {
        let scheduler = TokioScheduler::seeded(1);
        assert_eq!(scheduler.pick(&[]), None);
        assert_eq!(scheduler.pick(&[0, 0]), None);
    }

    #[test]
    fn seeded_schedulers_agree() {
        let a = TokioScheduler::seeded(99);
        let b = TokioScheduler::seeded(99);
        for _ in 0..50 {
            assert_eq!(a.pick(&[5, 2, 1]), b.pick(&[5, 2, 1]));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pause_sleeps_for_constant_wait() {
        let scheduler = TokioScheduler::seeded(1);
        let started = tokio::time::Instant::now();
        scheduler
            .pause(WaitTime::Constant(Duration::from_secs(5)))
            .await;
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn script_plays_back_then_stops() {
        let scheduler = ScriptedScheduler::new([2, 0, 7]);
        assert_eq!(scheduler.pick(&[1, 1, 1]), Some(2));
        assert_eq!(scheduler.pick(&[1, 1, 1]), Some(0));
        // Out-of-range entries end the session rather than panic.
        assert_eq!(scheduler.pick(&[1, 1, 1]), None);
        assert_eq!(scheduler.pick(&[1, 1, 1]), None);
        assert_eq!(scheduler.remaining(), 0);
    }

    #[test]
    fn script_records_pauses() {
        let scheduler = ScriptedScheduler::new([]);
        tokio_test::block_on(scheduler.pause(WaitTime::between_secs(1, 3)));
        assert_eq!(scheduler.pauses(), vec![WaitTime::between_secs(1, 3)]);
    }
}
