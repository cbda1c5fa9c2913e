//! Periodic eviction of players that stopped sending updates.

use crate::registry::ConnectionRegistry;
use crate::utils::timer_period;
use log::info;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy)]
pub struct InactivityReaper {
    timeout: Duration,
    period: Duration,
}

impl InactivityReaper {
    /// A zero `period` is raised to the smallest timer period.
    pub fn new(timeout: Duration, period: Duration) -> Self {
        Self {
            timeout,
            period: timer_period(period),
        }
    }

    /// Sweep timer; the first sweep runs one period after startup.
    pub fn interval(&self) -> Interval {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    }

    /// Removes every player silent for longer than the timeout and returns
    /// their ids. Players that joined but never sent an accepted update are
    /// not tracked and so never evicted.
    pub fn sweep(&self, registry: &mut ConnectionRegistry, now: Instant) -> Vec<String> {
        let evicted: Vec<String> = registry
            .stale_ids(now, self.timeout)
            .into_iter()
            .filter(|id| registry.remove(id))
            .collect();

        if !evicted.is_empty() {
            info!("Evicted {} inactive players: {:?}", evicted.len(), evicted);
        }
        evicted
    }
}
