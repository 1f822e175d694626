use thiserror::Error;

/// How a raw ADC sample relates to the voltage the calibration constants
/// were derived against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VoltageScaling {
    /// Sample is a fraction of the ADC full-scale reference (e.g. 3.3 V);
    /// multiply by the reference before applying scale/intercept.
    Reference(f64),
    /// Sample is already in the calibrated input domain.
    Normalized,
}

/// Per-sensor linear calibration: `percent = scale * (v + intercept)` where
/// `v` is the raw sample, optionally rescaled by the ADC reference first.
#[derive(Clone, Copy, Debug)]
pub struct SensorCal {
    pub scale: f64,
    pub intercept: f64,
    pub scaling: VoltageScaling,
}

impl SensorCal {
    pub fn new(scale: f64, intercept: f64, scaling: VoltageScaling) -> Self {
        Self {
            scale,
            intercept,
            scaling,
        }
    }

    /// Identity calibration for sensors that already report pedal fraction.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, VoltageScaling::Normalized)
    }

    pub fn calibrate(&self, raw: f64) -> f64 {
        let v = match self.scaling {
            VoltageScaling::Reference(vref) => raw * vref,
            VoltageScaling::Normalized => raw,
        };
        self.scale * (v + self.intercept)
    }

    /// Inverse of `calibrate`: the raw sample a sensor would produce for a
    /// given pedal percentage. Used by the sim rig and tests.
    pub fn raw_for(&self, percent: f64) -> f64 {
        let v = percent / self.scale - self.intercept;
        match self.scaling {
            VoltageScaling::Reference(vref) => v / vref,
            VoltageScaling::Normalized => v,
        }
    }
}

impl Default for SensorCal {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    #[error("throttle table needs at least two control points, got {0}")]
    TooFewPoints(usize),
    #[error("throttle table must span [0.0, 1.0], got [{0}, {1}]")]
    BadEndpoints(f64, f64),
    #[error("throttle table x values must be strictly increasing at index {0}")]
    NonMonotonic(usize),
    #[error("pedal position {0} outside table domain")]
    OutOfRange(f64),
}

/// Piecewise-linear pedal-travel to throttle mapping. Control points are
/// validated once at load time; the table is immutable afterwards.
#[derive(Clone, Debug)]
pub struct ThrottleMap {
    points: Vec<(f64, f64)>,
}

impl ThrottleMap {
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, MapError> {
        if points.len() < 2 {
            return Err(MapError::TooFewPoints(points.len()));
        }
        let first = points[0].0;
        let last = points[points.len() - 1].0;
        if first != 0.0 || last != 1.0 {
            return Err(MapError::BadEndpoints(first, last));
        }
        for (i, pair) in points.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(MapError::NonMonotonic(i + 1));
            }
        }
        Ok(Self { points })
    }

    /// 1:1 mapping, the table the car runs until a tuned curve exists.
    pub fn identity() -> Self {
        Self {
            points: vec![(0.0, 0.0), (1.0, 1.0)],
        }
    }

    /// Interpolated throttle fraction for pedal position `x`, or an explicit
    /// error when `x` falls outside the table. The bracketing pair is found
    /// by bounded search; there is no fallthrough path that leaves it unset.
    pub fn lookup(&self, x: f64) -> Result<f64, MapError> {
        if !x.is_finite() || x < self.points[0].0 || x > self.points[self.points.len() - 1].0 {
            return Err(MapError::OutOfRange(x));
        }
        for pair in self.points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if x == x0 {
                return Ok(y0);
            }
            if x == x1 {
                return Ok(y1);
            }
            if x > x0 && x < x1 {
                return Ok(y0 + (y1 - y0) * ((x - x0) / (x1 - x0)));
            }
        }
        // Unreachable given the bounds check above.
        Err(MapError::OutOfRange(x))
    }
}
