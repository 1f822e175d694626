use pedal::SensorCal;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

#[derive(Clone, Copy, Debug)]
pub enum SensorFault {
    None,
    /// Output frozen at a fixed raw sample.
    Stuck { raw: f64 },
    /// Constant offset on the true pedal fraction.
    Bias { frac: f64 },
    /// Offset growing linearly with time.
    Drift { per_s: f64 },
    /// Every n-th read misses the tick budget entirely.
    DropoutEvery { n: u64 },
}

/// One analog channel of the pedal box: takes the true pedal fraction and
/// produces the raw normalized sample the ADC would report, through the
/// channel's calibration, noise and injected fault. A `None` return models
/// a read that blew its latency budget.
#[derive(Clone, Debug)]
pub struct AnalogSensor {
    pub cal: SensorCal,
    pub noise_std: f64,
    pub fault: SensorFault,
    rng: StdRng,
    step_count: u64,
}

impl AnalogSensor {
    pub fn new(cal: SensorCal, seed: u64) -> Self {
        Self {
            cal,
            noise_std: 0.0,
            fault: SensorFault::None,
            rng: StdRng::seed_from_u64(seed),
            step_count: 0,
        }
    }

    pub fn read(&mut self, true_frac: f64, dt_s: f64) -> Option<f64> {
        self.step_count += 1;

        let frac = match self.fault {
            SensorFault::None => true_frac,
            SensorFault::Stuck { raw } => return Some(raw),
            SensorFault::Bias { frac } => true_frac + frac,
            SensorFault::Drift { per_s } => true_frac + per_s * (self.step_count as f64) * dt_s,
            SensorFault::DropoutEvery { n } => {
                if n > 0 && (self.step_count % n) == 0 {
                    return None;
                }
                true_frac
            }
        };

        let mut raw = self.cal.raw_for(frac);
        if self.noise_std > 0.0 {
            let normal = Normal::new(0.0, self.noise_std)
                .expect("noise_std is positive and finite");
            raw += normal.sample(&mut self.rng);
        }

        // ADC saturation.
        Some(raw.clamp(0.0, 1.0))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RigParams {
    /// Pedal travel slew rate, fraction per second.
    pub pedal_rate: f64,
    pub brake_rate: f64,
    /// Wheel rpm at full throttle.
    pub rpm_full_throttle: f64,
}

impl Default for RigParams {
    fn default() -> Self {
        Self {
            pedal_rate: 2.0,
            brake_rate: 4.0,
            rpm_full_throttle: 1400.0,
        }
    }
}

/// Driver-and-vehicle stand-in: pedal and brake travel slew toward targets,
/// wheel speeds follow pedal travel with an adjustable rear slip factor.
#[derive(Clone, Copy, Debug)]
pub struct RigState {
    pub pedal: f64,
    pub brake: f64,
    pub pedal_target: f64,
    pub brake_target: f64,
    /// Extra rear-wheel speed as a fraction of front (wheelspin).
    pub rear_slip: f64,
    pub wheel_front_rpm: f64,
    pub wheel_rear_rpm: f64,
}

impl Default for RigState {
    fn default() -> Self {
        Self {
            pedal: 0.0,
            brake: 0.0,
            pedal_target: 0.0,
            brake_target: 0.0,
            rear_slip: 0.0,
            wheel_front_rpm: 0.0,
            wheel_rear_rpm: 0.0,
        }
    }
}

fn slew(current: f64, target: f64, rate: f64, dt_s: f64) -> f64 {
    let step = rate * dt_s;
    if target > current {
        (current + step).min(target)
    } else {
        (current - step).max(target)
    }
}

impl RigState {
    pub fn step(&mut self, p: &RigParams, dt_s: f64) {
        self.pedal = slew(self.pedal, self.pedal_target, p.pedal_rate, dt_s).clamp(0.0, 1.0);
        self.brake = slew(self.brake, self.brake_target, p.brake_rate, dt_s).clamp(0.0, 1.0);

        self.wheel_front_rpm = p.rpm_full_throttle * self.pedal;
        self.wheel_rear_rpm = self.wheel_front_rpm * (1.0 + self.rear_slip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pedal_slews_toward_target() {
        let p = RigParams::default();
        let mut x = RigState {
            pedal_target: 1.0,
            ..Default::default()
        };
        x.step(&p, 0.1);
        assert!((x.pedal - 0.2).abs() < 1e-12);
        for _ in 0..20 {
            x.step(&p, 0.1);
        }
        assert_eq!(x.pedal, 1.0);
    }

    #[test]
    fn clean_sensor_round_trips_through_calibration() {
        let cal = SensorCal::new(0.5, -0.25, pedal::VoltageScaling::Reference(3.3));
        let mut s = AnalogSensor::new(cal, 7);
        let raw = s.read(0.42, 0.01).unwrap();
        assert!((cal.calibrate(raw) - 0.42).abs() < 1e-9);
    }

    #[test]
    fn dropout_misses_every_nth_read() {
        let mut s = AnalogSensor::new(SensorCal::identity(), 7);
        s.fault = SensorFault::DropoutEvery { n: 3 };
        let reads: Vec<_> = (0..6).map(|_| s.read(0.5, 0.01)).collect();
        assert_eq!(
            reads.iter().map(Option::is_none).collect::<Vec<_>>(),
            vec![false, false, true, false, false, true]
        );
    }

    #[test]
    fn bias_shifts_the_calibrated_value() {
        let mut s = AnalogSensor::new(SensorCal::identity(), 7);
        s.fault = SensorFault::Bias { frac: 0.2 };
        let raw = s.read(0.5, 0.01).unwrap();
        assert!((raw - 0.7).abs() < 1e-12);
    }

    #[test]
    fn wheels_follow_pedal_with_rear_slip() {
        let p = RigParams::default();
        let mut x = RigState {
            pedal: 0.5,
            pedal_target: 0.5,
            rear_slip: 0.4,
            ..Default::default()
        };
        x.step(&p, 0.01);
        assert!((x.wheel_front_rpm - 700.0).abs() < 1e-9);
        assert!((x.wheel_rear_rpm - 980.0).abs() < 1e-9);
    }
}
