//! Poll scheduling for tree nodes.
//!
//! A [`Scheduler`] hands every new node a [`PollTimer`]. The timer's first
//! tick always fires immediately so a freshly mounted node fetches right
//! away. Status nodes are pure dispatchers and tick exactly once.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use tokio::sync::broadcast;
use tokio::time::{Interval, MissedTickBehavior};

use crate::domain::models::{NodeScope, PollConfig};

/// Source of poll timers, chosen once per tree.
pub trait Scheduler: Send + Sync + fmt::Debug {
    fn timer(&self, scope: &NodeScope) -> PollTimer;
}

/// Per-node tick source.
#[derive(Debug)]
pub enum PollTimer {
    /// A single immediate tick, then nothing.
    Once { fired: bool },
    /// Periodic ticks; the first completes immediately.
    Periodic(Interval),
    /// An immediate tick, then one per external trigger.
    Manual {
        fired: bool,
        trigger: broadcast::Receiver<()>,
    },
}

impl PollTimer {
    pub fn once() -> Self {
        Self::Once { fired: false }
    }

    pub fn periodic(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self::Periodic(interval)
    }

    /// Wait for the next tick. `None` means the timer will never tick again.
    pub async fn tick(&mut self) -> Option<()> {
        match self {
            Self::Once { fired } => {
                if *fired {
                    None
                } else {
                    *fired = true;
                    Some(())
                }
            }
            Self::Periodic(interval) => {
                interval.tick().await;
                Some(())
            }
            Self::Manual { fired, trigger } => {
                if !*fired {
                    *fired = true;
                    return Some(());
                }
                match trigger.recv().await {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => Some(()),
                    Err(broadcast::error::RecvError::Closed) => None,
                }
            }
        }
    }
}

/// Dispatch-only scopes never poll.
fn fetches_once(scope: &NodeScope) -> bool {
    matches!(scope, NodeScope::Status { .. })
}

/// Production scheduler.
///
/// The root polls at a fixed period. Every other node draws its own period
/// uniformly from `[min, max]` once, at creation, so that siblings spread
/// their requests instead of polling in lockstep.
#[derive(Debug, Clone)]
pub struct JitterScheduler {
    root_period: Duration,
    min: Duration,
    max: Duration,
}

impl JitterScheduler {
    pub fn new(root_period: Duration, min: Duration, max: Duration) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            root_period,
            min,
            max,
        }
    }

    pub fn from_config(poll: &PollConfig) -> Self {
        Self::new(
            poll.root_interval(),
            Duration::from_secs(poll.min_interval_secs),
            Duration::from_secs(poll.max_interval_secs),
        )
    }

    /// Draw a period in `[min, max]`.
    pub fn jittered_period(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let millis = rand::thread_rng().gen_range(self.min.as_millis()..=self.max.as_millis());
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}

impl Scheduler for JitterScheduler {
    fn timer(&self, scope: &NodeScope) -> PollTimer {
        match scope {
            NodeScope::Dashboard => PollTimer::periodic(self.root_period),
            s if fetches_once(s) => PollTimer::once(),
            _ => PollTimer::periodic(self.jittered_period()),
        }
    }
}

/// Scheduler driven by explicit [`ManualScheduler::tick`] calls.
///
/// Every node still fetches once on mount; afterwards each `tick()` makes
/// every live polling node fetch again. Used for one-shot snapshots and
/// deterministic tests.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    trigger: broadcast::Sender<()>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        let (trigger, _) = broadcast::channel(16);
        Self { trigger }
    }

    /// Trigger one poll round on every subscribed node.
    pub fn tick(&self) -> usize {
        self.trigger.send(()).unwrap_or(0)
    }
}

impl Scheduler for ManualScheduler {
    fn timer(&self, scope: &NodeScope) -> PollTimer {
        if fetches_once(scope) {
            return PollTimer::once();
        }
        PollTimer::Manual {
            fired: false,
            trigger: self.trigger.subscribe(),
        }
    }
}
