/// Startup interlock: the car arms only after the driver has pressed the
/// brake past a configurable threshold and the cockpit switch is on. Both
/// checks are one-way; nothing un-arms the car within a run.
#[derive(Clone, Debug)]
pub struct StartupGate {
    brake_pass_threshold: f64,
    brake_passed: bool,
    cockpit_passed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateEvent {
    /// Brake check passed; the cockpit buzzer acknowledgment hangs off this.
    BrakePassed,
    /// Cockpit switch asserted after the brake check; the car is live.
    Armed,
}

impl StartupGate {
    /// The observed pedal boxes used 0.8 and 0.5 for the brake threshold in
    /// different revisions; it is a parameter here, not a constant.
    pub fn new(brake_pass_threshold: f64) -> Self {
        Self {
            brake_pass_threshold,
            brake_passed: false,
            cockpit_passed: false,
        }
    }

    pub fn armed(&self) -> bool {
        self.brake_passed && self.cockpit_passed
    }

    /// Advance the gate with this tick's brake percentage and cockpit switch
    /// state. Returns the transition that happened, if any. The brake check
    /// runs first, matching the original startup sequence.
    pub fn update(&mut self, brake_percent: Option<f64>, cockpit_on: bool) -> Option<GateEvent> {
        if self.armed() {
            return None;
        }
        if !self.brake_passed {
            match brake_percent {
                Some(b) if b > self.brake_pass_threshold => {
                    self.brake_passed = true;
                    return Some(GateEvent::BrakePassed);
                }
                _ => return None,
            }
        }
        if !self.cockpit_passed && cockpit_on {
            self.cockpit_passed = true;
            return Some(GateEvent::Armed);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arms_after_brake_then_cockpit() {
        let mut gate = StartupGate::new(0.8);
        assert_eq!(gate.update(Some(0.5), true), None);
        assert!(!gate.armed());
        assert_eq!(gate.update(Some(0.85), false), Some(GateEvent::BrakePassed));
        assert!(!gate.armed());
        assert_eq!(gate.update(Some(0.0), true), Some(GateEvent::Armed));
        assert!(gate.armed());
    }

    #[test]
    fn checks_never_revert() {
        let mut gate = StartupGate::new(0.5);
        gate.update(Some(0.6), false);
        gate.update(Some(0.0), true);
        assert!(gate.armed());
        // Brake released, switch bounced off: still armed.
        assert_eq!(gate.update(Some(0.0), false), None);
        assert!(gate.armed());
    }

    #[test]
    fn missing_brake_reading_does_not_pass() {
        let mut gate = StartupGate::new(0.8);
        assert_eq!(gate.update(None, true), None);
        assert!(!gate.armed());
    }

    #[test]
    fn threshold_is_strict_and_configurable() {
        let mut gate = StartupGate::new(0.5);
        assert_eq!(gate.update(Some(0.5), false), None);
        assert_eq!(gate.update(Some(0.51), false), Some(GateEvent::BrakePassed));
    }
}
