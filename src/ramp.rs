//! Linear voltage ramps.
//!
//! A ramp of `n` steps sets the running voltage, waits one step time and
//! advances, `n` times over. One last set then lands on the end value.

use thiserror::Error;

use crate::pacer::Duration;

/// Ramp parameters rejected before anything was sent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRamp {
    #[error("ramp duration must be > 0 s")]
    Duration,
    #[error("ramp needs at least 1 step")]
    Steps,
}

/// Anything whose output voltage can be stepped over time.
pub trait RampTarget {
    type Error;

    /// Set the output voltage, volts.
    fn set_voltage(&mut self, voltage: f32) -> Result<(), Self::Error>;

    /// Block between two steps.
    fn wait(&mut self, duration: Duration);
}

/// A validated ramp, ready to [run](RampPlan::run).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampPlan {
    // Accumulated in f64 so long ramps still end on the target.
    start: f64,
    step_voltage: f64,
    step_time: Duration,
    steps: u32,
}

impl RampPlan {
    /// Ramp from `v_start` to `v_end` in `steps` steps spread over `duration_s` seconds.
    pub fn new(v_start: f32, v_end: f32, duration_s: f32, steps: u32) -> Result<Self, InvalidRamp> {
        // Also rejects NaN.
        if !(duration_s > 0.0) {
            return Err(InvalidRamp::Duration);
        }
        if steps < 1 {
            return Err(InvalidRamp::Steps);
        }

        let step_us = f64::from(duration_s) / f64::from(steps) * 1_000_000.0;
        Ok(Self {
            start: f64::from(v_start),
            step_voltage: (f64::from(v_end) - f64::from(v_start)) / f64::from(steps),
            step_time: Duration::from_ticks((step_us + 0.5) as u64),
            steps,
        })
    }

    pub fn step_voltage(&self) -> f32 {
        self.step_voltage as f32
    }

    pub fn step_time(&self) -> Duration {
        self.step_time
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Drive `target` through the ramp. The first error aborts it.
    pub fn run<T: RampTarget>(&self, target: &mut T) -> Result<(), T::Error> {
        let mut voltage = self.start;
        for step in 0..self.steps {
            log::debug!("ramp step {}/{}: {:.3}V", step + 1, self.steps, voltage);
            target.set_voltage(voltage as f32)?;
            target.wait(self.step_time);
            voltage += self.step_voltage;
        }
        // Lands on the end value even if the loop accumulated rounding error.
        target.set_voltage(voltage as f32)
    }
}
