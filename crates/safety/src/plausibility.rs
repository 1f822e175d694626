use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultReason {
    /// Redundant accelerator sensors disagree beyond the ratio threshold.
    Disagreement,
    /// A calibrated pedal percentage fell outside the valid range.
    RangeViolation,
    /// Hard braking while still commanding high throttle (BSE rule).
    BrakeOverlap,
    /// Front/rear wheel speeds disagree beyond the slip threshold.
    WheelSlip,
    /// A sensor failed to produce a reading within the tick budget.
    SensorTimeout,
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaultReason::Disagreement => "apps-disagreement",
            FaultReason::RangeViolation => "range-violation",
            FaultReason::BrakeOverlap => "brake-overlap",
            FaultReason::WheelSlip => "wheel-slip",
            FaultReason::SensorTimeout => "sensor-timeout",
        };
        f.write_str(s)
    }
}

/// Brake/throttle overlap thresholds: fault when brake exceeds `brake_min`
/// while the averaged accelerator exceeds `throttle_min`.
#[derive(Clone, Copy, Debug)]
pub struct BrakeOverlap {
    pub brake_min: f64,
    pub throttle_min: f64,
}

impl Default for BrakeOverlap {
    fn default() -> Self {
        Self {
            brake_min: 0.9,
            throttle_min: 0.8,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PlausibilityConfig {
    /// Relative deviation between the two accelerator channels above which
    /// they are considered to disagree. Strict comparison.
    pub disagree_ratio: f64,
    /// Valid calibrated pedal range; readings outside fault unconditionally.
    pub pedal_range: (f64, f64),
    /// Brake/throttle overlap check; `None` disables it (early revisions of
    /// the pedal box had no brake sensor).
    pub brake_overlap: Option<BrakeOverlap>,
}

impl Default for PlausibilityConfig {
    fn default() -> Self {
        Self {
            disagree_ratio: 0.10,
            pedal_range: (0.0, 1.0),
            brake_overlap: Some(BrakeOverlap::default()),
        }
    }
}

/// `|a - b|` relative to the pair's mean. Both inputs zero means both pedals
/// fully released, defined as zero deviation rather than NaN.
pub fn relative_deviation(a: f64, b: f64) -> f64 {
    let mean = (a + b) / 2.0;
    if mean == 0.0 {
        return 0.0;
    }
    (a - b).abs() / mean
}

impl PlausibilityConfig {
    /// Per-tick fault condition for the accelerator/brake group. Range is
    /// checked first: the ratio test is meaningless on garbage readings.
    pub fn pedal_fault(&self, p1: f64, p2: f64, brake: Option<f64>) -> Option<FaultReason> {
        let (lo, hi) = self.pedal_range;
        let in_range = |p: f64| p.is_finite() && p >= lo && p <= hi;
        if !in_range(p1) || !in_range(p2) {
            return Some(FaultReason::RangeViolation);
        }
        if relative_deviation(p1, p2) > self.disagree_ratio {
            return Some(FaultReason::Disagreement);
        }
        if let (Some(overlap), Some(b)) = (self.brake_overlap, brake) {
            if b > overlap.brake_min && (p1 + p2) / 2.0 > overlap.throttle_min {
                return Some(FaultReason::BrakeOverlap);
            }
        }
        None
    }
}
