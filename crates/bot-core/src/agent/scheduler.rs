//! Explicit planning scheduler.
//!
//! Replaces fire-and-forget timers with a start/stop switch and a per-tick
//! outcome, so drop-vs-queue behavior is assertable in tests instead of
//! depending on wall-clock timing. Stopping removes future ticks only; it never
//! interrupts an in-flight plan.

use std::time::Duration;

use super::executor::ExecutionSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick may run a planning pass.
    Ran,
    /// A plan is in flight; this tick is dropped, not queued.
    SkippedBusy,
    /// The scheduler is stopped; no ticks are issued.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    running: bool,
    period: Duration,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            running: false,
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Decides what this tick may do. Ticks lost to a busy session are gone;
    /// the backlog never grows.
    pub fn gate(&self, session: &ExecutionSession) -> TickOutcome {
        if !self.running {
            return TickOutcome::Stopped;
        }
        if session.is_busy() {
            return TickOutcome::SkippedBusy;
        }
        TickOutcome::Ran
    }
}
