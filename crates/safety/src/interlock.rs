use std::time::Duration;

use pedal::{SensorCal, ThrottleMap};

use crate::latch::FaultLatch;
use crate::plausibility::{relative_deviation, FaultReason, PlausibilityConfig};

#[derive(Clone, Copy, Debug)]
pub struct InterlockConfig {
    pub plausibility: PlausibilityConfig,
    /// Minimum continuous duration a fault condition must hold before a
    /// latch engages.
    pub dwell: Duration,
    /// Relative front/rear wheel-speed deviation above which traction
    /// control cuts power. Strict comparison, same rule as the pedals.
    pub wheel_slip_ratio: f64,
}

impl Default for InterlockConfig {
    fn default() -> Self {
        Self {
            plausibility: PlausibilityConfig::default(),
            dwell: Duration::from_millis(100),
            wheel_slip_ratio: 0.10,
        }
    }
}

/// One tick's worth of raw peripheral readings. Accelerator and brake values
/// are normalized ADC samples in [0, 1]; wheel speeds are rpm. `None` means
/// the peripheral missed its tick budget (sensor timeout).
#[derive(Clone, Copy, Debug, Default)]
pub struct RawInputs {
    pub accel_a: Option<f64>,
    pub accel_b: Option<f64>,
    pub brake: Option<f64>,
    pub wheel_front: Option<f64>,
    pub wheel_rear: Option<f64>,
}

/// Throttle command for one tick. `percent` is already zeroed whenever `cut`
/// is set; the reason is carried for the trace.
#[derive(Clone, Copy, Debug)]
pub struct ThrottleCommand {
    pub percent: f64,
    pub cut: Option<FaultReason>,
}

impl ThrottleCommand {
    fn drive(percent: f64) -> Self {
        Self { percent, cut: None }
    }

    fn cut(reason: FaultReason) -> Self {
        Self {
            percent: 0.0,
            cut: Some(reason),
        }
    }
}

/// The plausibility-check and power-cut core. Owns the calibrations, the
/// throttle table and both fault latches; the caller owns the clock and the
/// peripherals and invokes `tick` at the polling cadence.
#[derive(Clone, Debug)]
pub struct Interlock {
    cfg: InterlockConfig,
    cal_a: SensorCal,
    cal_b: SensorCal,
    cal_brake: SensorCal,
    map: ThrottleMap,
    pedal_latch: FaultLatch,
    slip_latch: FaultLatch,
}

impl Interlock {
    pub fn new(
        cfg: InterlockConfig,
        cal_a: SensorCal,
        cal_b: SensorCal,
        cal_brake: SensorCal,
        map: ThrottleMap,
    ) -> Self {
        let dwell = cfg.dwell;
        Self {
            cfg,
            cal_a,
            cal_b,
            cal_brake,
            map,
            pedal_latch: FaultLatch::new(dwell),
            slip_latch: FaultLatch::new(dwell),
        }
    }

    pub fn pedal_latched(&self) -> bool {
        self.pedal_latch.is_latched()
    }

    pub fn slip_latched(&self) -> bool {
        self.slip_latch.is_latched()
    }

    /// Run one evaluation tick: fuse, evaluate, debounce, map. `now` is
    /// monotonic elapsed time from the loop's clock. Every ambiguous or
    /// missing input degrades to a zero command, never to a stale reading.
    pub fn tick(&mut self, raw: &RawInputs, now: Duration) -> ThrottleCommand {
        let p1 = raw.accel_a.map(|v| self.cal_a.calibrate(v));
        let p2 = raw.accel_b.map(|v| self.cal_b.calibrate(v));
        let brake = raw.brake.map(|v| self.cal_brake.calibrate(v));

        let pedal_fault = match (p1, p2) {
            (Some(p1), Some(p2)) => {
                if self.cfg.plausibility.brake_overlap.is_some() && brake.is_none() {
                    Some(FaultReason::SensorTimeout)
                } else {
                    self.cfg.plausibility.pedal_fault(p1, p2, brake)
                }
            }
            _ => Some(FaultReason::SensorTimeout),
        };
        let pedal_latched = self.pedal_latch.update(pedal_fault.is_some(), now);

        let slip_fault = match (raw.wheel_front, raw.wheel_rear) {
            (Some(front), Some(rear)) => {
                if relative_deviation(front, rear) > self.cfg.wheel_slip_ratio {
                    Some(FaultReason::WheelSlip)
                } else {
                    None
                }
            }
            _ => Some(FaultReason::SensorTimeout),
        };
        let slip_latched = self.slip_latch.update(slip_fault.is_some(), now);

        if pedal_latched {
            return ThrottleCommand::cut(pedal_fault.unwrap_or(FaultReason::Disagreement));
        }
        if slip_latched {
            return ThrottleCommand::cut(slip_fault.unwrap_or(FaultReason::WheelSlip));
        }

        // Disagreement and overlap ride through the dwell window with the
        // mapped output intact; the latch decides. A missing or out-of-range
        // reading cannot wait: there is no trustworthy position to map.
        match pedal_fault {
            Some(reason @ (FaultReason::SensorTimeout | FaultReason::RangeViolation)) => {
                return ThrottleCommand::cut(reason);
            }
            _ => {}
        }

        let avg = match (p1, p2) {
            (Some(p1), Some(p2)) => (p1 + p2) / 2.0,
            _ => return ThrottleCommand::cut(FaultReason::SensorTimeout),
        };
        match self.map.lookup(avg) {
            Ok(y) => ThrottleCommand::drive(y * 100.0),
            Err(_) => ThrottleCommand::cut(FaultReason::RangeViolation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn interlock() -> Interlock {
        Interlock::new(
            InterlockConfig::default(),
            SensorCal::identity(),
            SensorCal::identity(),
            SensorCal::identity(),
            ThrottleMap::identity(),
        )
    }

    fn inputs(a: f64, b: f64, brake: f64) -> RawInputs {
        RawInputs {
            accel_a: Some(a),
            accel_b: Some(b),
            brake: Some(brake),
            wheel_front: Some(140.0),
            wheel_rear: Some(140.0),
        }
    }

    #[test]
    fn matched_pedals_drive_through_identity_map() {
        let mut il = interlock();
        let cmd = il.tick(&inputs(0.50, 0.50, 0.0), ms(0));
        assert_eq!(cmd.cut, None);
        assert!((cmd.percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn disagreement_latches_after_dwell_and_cuts() {
        let mut il = interlock();
        // ratio = 0.333 > 0.10, faulting from tick 0; the mapped output
        // keeps flowing through the dwell window.
        for t in (0..100).step_by(10) {
            let cmd = il.tick(&inputs(0.50, 0.70, 0.0), ms(t));
            assert_eq!(cmd.cut, None);
            assert!((cmd.percent - 60.0).abs() < 1e-9);
            assert!(!il.pedal_latched(), "latched early at {t}ms");
        }
        let cmd = il.tick(&inputs(0.50, 0.70, 0.0), ms(100));
        assert!(il.pedal_latched());
        assert_eq!(cmd.cut, Some(FaultReason::Disagreement));
        assert_eq!(cmd.percent, 0.0);
    }

    #[test]
    fn recovery_is_immediate() {
        let mut il = interlock();
        for t in (0..=120).step_by(10) {
            il.tick(&inputs(0.50, 0.70, 0.0), ms(t));
        }
        assert!(il.pedal_latched());
        let cmd = il.tick(&inputs(0.50, 0.50, 0.0), ms(130));
        assert!(!il.pedal_latched());
        assert!((cmd.percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_cuts_on_the_first_tick() {
        let mut il = interlock();
        // Fresh latch state from earlier healthy ticks.
        il.tick(&inputs(0.50, 0.50, 0.0), ms(0));
        let cmd = il.tick(&inputs(1.2, 0.50, 0.0), ms(10));
        assert_eq!(cmd.cut, Some(FaultReason::RangeViolation));
        assert_eq!(cmd.percent, 0.0);
        assert!(!il.pedal_latched());
    }

    #[test]
    fn brake_overlap_faults_and_latches() {
        let mut il = interlock();
        for t in (0..100).step_by(10) {
            let cmd = il.tick(&inputs(0.85, 0.85, 0.95), ms(t));
            assert_eq!(cmd.cut, None);
            assert!(!il.pedal_latched());
        }
        let cmd = il.tick(&inputs(0.85, 0.85, 0.95), ms(100));
        assert!(il.pedal_latched());
        assert_eq!(cmd.cut, Some(FaultReason::BrakeOverlap));
        assert_eq!(cmd.percent, 0.0);
    }

    #[test]
    fn wheel_slip_gates_independently() {
        let mut il = interlock();
        let mut raw = inputs(0.50, 0.50, 0.0);
        raw.wheel_front = Some(100.0);
        raw.wheel_rear = Some(140.0);
        for t in (0..100).step_by(10) {
            let cmd = il.tick(&raw, ms(t));
            // Pedals are healthy; output flows until the slip latch engages.
            assert_eq!(cmd.cut, None);
            assert!((cmd.percent - 50.0).abs() < 1e-9);
        }
        let cmd = il.tick(&raw, ms(100));
        assert!(il.slip_latched());
        assert_eq!(cmd.cut, Some(FaultReason::WheelSlip));
        assert_eq!(cmd.percent, 0.0);
    }

    #[test]
    fn missing_reading_is_a_timeout_fault() {
        let mut il = interlock();
        let mut raw = inputs(0.50, 0.50, 0.0);
        raw.accel_b = None;
        let cmd = il.tick(&raw, ms(0));
        assert_eq!(cmd.cut, Some(FaultReason::SensorTimeout));
        assert_eq!(cmd.percent, 0.0);
        for t in (10..=100).step_by(10) {
            il.tick(&raw, ms(t));
        }
        assert!(il.pedal_latched());
    }
}
