use tracing::debug;

use super::Simulation;

pub(in crate::app) const TICK_RATE_HZ: f64 = 60.0;
const MAX_CATCH_UP_TICKS: usize = 4;

/// Fixed-rate tick source driven by frame timestamps. Once released it yields
/// nothing until resumed.
#[derive(Debug)]
pub(in crate::app) struct TickSchedule {
    interval_secs: f64,
    last_tick_secs: Option<f64>,
    accumulator_secs: f64,
    held: bool,
}

impl TickSchedule {
    pub(in crate::app) fn acquire(rate_hz: f64) -> Self {
        Self {
            interval_secs: 1.0 / rate_hz.max(1.0),
            last_tick_secs: None,
            accumulator_secs: 0.0,
            held: true,
        }
    }

    pub(in crate::app) fn is_held(&self) -> bool {
        self.held
    }

    pub(in crate::app) fn release(&mut self) {
        if self.held {
            self.held = false;
            self.last_tick_secs = None;
            self.accumulator_secs = 0.0;
            debug!("tick schedule released");
        }
    }

    pub(in crate::app) fn resume(&mut self) {
        if !self.held {
            self.held = true;
            self.last_tick_secs = None;
            debug!("tick schedule resumed");
        }
    }

    pub(in crate::app) fn due_ticks(&mut self, now_secs: f64) -> usize {
        if !self.held {
            return 0;
        }

        let Some(last) = self.last_tick_secs.replace(now_secs) else {
            return 1;
        };

        self.accumulator_secs += (now_secs - last).max(0.0);
        let due = (self.accumulator_secs / self.interval_secs).floor() as usize;
        if due > MAX_CATCH_UP_TICKS {
            self.accumulator_secs = 0.0;
            return MAX_CATCH_UP_TICKS;
        }
        self.accumulator_secs -= due as f64 * self.interval_secs;
        due
    }
}

/// A simulation together with the schedule that drives it. Dropping the
/// session releases the schedule.
pub(in crate::app) struct LayoutSession {
    pub(in crate::app) simulation: Simulation,
    schedule: TickSchedule,
}

impl LayoutSession {
    pub(in crate::app) fn start(simulation: Simulation) -> Self {
        Self {
            simulation,
            schedule: TickSchedule::acquire(TICK_RATE_HZ),
        }
    }

    pub(in crate::app) fn is_running(&self) -> bool {
        self.schedule.is_held()
    }

    pub(in crate::app) fn release(&mut self) {
        self.schedule.release();
    }

    pub(in crate::app) fn resume(&mut self) {
        self.schedule.resume();
    }

    /// Runs the ticks due at `now_secs`. Returns whether more frames are needed.
    pub(in crate::app) fn advance(&mut self, now_secs: f64) -> bool {
        for _ in 0..self.schedule.due_ticks(now_secs) {
            if !self.simulation.step() {
                break;
            }
        }
        self.schedule.is_held() && !self.simulation.is_settled()
    }
}

impl Drop for LayoutSession {
    fn drop(&mut self) {
        self.schedule.release();
    }
}
