use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;
use pedal::{SensorCal, ThrottleMap, VoltageScaling};
use safety::{
    BrakeOverlap, GateEvent, Interlock, InterlockConfig, PlausibilityConfig, RawInputs,
    StartupGate,
};
use sim::{AnalogSensor, RigParams, RigState, SensorFault};

#[derive(Clone, Debug, ValueEnum)]
enum Scenario {
    /// Clean drive to half pedal.
    Normal,
    /// Bias fault on APPS channel B partway through the run.
    Disagree,
    /// Driver stamps the brake while holding high throttle.
    BrakeOverlap,
    /// Rear wheelspin partway through the run.
    WheelSlip,
    /// APPS channel B stops producing readings.
    Dropout,
    /// Miscalibrated APPS channel A reads past full travel.
    OutOfRange,
}

#[derive(Clone, Debug, ValueEnum)]
enum Lut {
    /// 1:1 pedal-to-throttle.
    Identity,
    /// Soft tip-in, flattened top end.
    Progressive,
}

#[derive(Parser, Debug)]
#[command(
    name = "apps-interlock",
    version,
    about = "APPS/BSE plausibility interlock, hosted scenario runner"
)]
struct Args {
    #[arg(value_enum, long, default_value = "normal")]
    scenario: Scenario,

    /// Total simulated time in seconds
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    /// Fixed tick period in milliseconds
    #[arg(long, default_value_t = 10)]
    dt_ms: u64,

    /// APPS disagreement ratio threshold
    #[arg(long, default_value_t = 0.10)]
    disagree_ratio: f64,

    /// Fault dwell threshold in milliseconds
    #[arg(long, default_value_t = 100)]
    dwell_ms: u64,

    /// Brake percentage above which the BSE overlap check arms
    #[arg(long, default_value_t = 0.9)]
    overlap_brake_min: f64,

    /// Averaged throttle percentage above which the BSE overlap check trips
    #[arg(long, default_value_t = 0.8)]
    overlap_throttle_min: f64,

    /// Front/rear wheel-speed deviation threshold for traction control
    #[arg(long, default_value_t = 0.10)]
    wheel_slip_ratio: f64,

    /// Brake percentage required to pass the startup check
    #[arg(long, default_value_t = 0.8)]
    brake_pass: f64,

    /// Throttle lookup table
    #[arg(value_enum, long, default_value = "identity")]
    lut: Lut,

    /// RNG seed for deterministic runs
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Gaussian noise sigma on the raw samples
    #[arg(long, default_value_t = 0.0)]
    noise_std: f64,
}

#[derive(serde::Serialize)]
struct TraceRow {
    t_s: f64,
    armed: bool,
    pedal_a: Option<f64>,
    pedal_b: Option<f64>,
    brake: Option<f64>,
    wheel_front_rpm: f64,
    wheel_rear_rpm: f64,
    throttle_pct: f64,
    cut: Option<String>,
    pedal_latched: bool,
    slip_latched: bool,
}

fn throttle_map(lut: &Lut) -> Result<ThrottleMap> {
    let map = match lut {
        Lut::Identity => ThrottleMap::identity(),
        Lut::Progressive => ThrottleMap::new(vec![
            (0.0, 0.0),
            (0.1, 0.3),
            (0.5, 0.7),
            (0.9, 0.9),
            (1.0, 0.95),
        ])?,
    };
    Ok(map)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dt_s = (args.dt_ms as f64) / 1000.0;
    let steps = (args.seconds / dt_s).ceil() as u64;

    // Pedal-box calibrations, constants from the bench characterization.
    // `cal_a_true` is the channel's physical transfer function; the
    // out-of-range scenario hands the interlock a scale that overshoots it.
    let vref = VoltageScaling::Reference(3.3);
    let cal_a_true = SensorCal::new(0.5, -0.25, vref);
    let mut cal_a = cal_a_true;
    let cal_b = SensorCal::new(0.5 / 1.2, -0.3, vref);
    let cal_brake = SensorCal::new(0.5, -0.25, vref);
    if matches!(args.scenario, Scenario::OutOfRange) {
        cal_a.scale *= 1.25;
    }

    let cfg = InterlockConfig {
        plausibility: PlausibilityConfig {
            disagree_ratio: args.disagree_ratio,
            pedal_range: (0.0, 1.0),
            brake_overlap: Some(BrakeOverlap {
                brake_min: args.overlap_brake_min,
                throttle_min: args.overlap_throttle_min,
            }),
        },
        dwell: Duration::from_millis(args.dwell_ms),
        wheel_slip_ratio: args.wheel_slip_ratio,
    };
    let mut interlock = Interlock::new(cfg, cal_a, cal_b, cal_brake, throttle_map(&args.lut)?);
    let mut gate = StartupGate::new(args.brake_pass);

    // Rig & sensors
    let p = RigParams::default();
    let mut x = RigState::default();
    let mut apps_a = AnalogSensor::new(cal_a_true, args.seed ^ 0xA1);
    let mut apps_b = AnalogSensor::new(cal_b, args.seed ^ 0xB2);
    let mut bse = AnalogSensor::new(cal_brake, args.seed ^ 0xC3);
    apps_a.noise_std = args.noise_std;
    apps_b.noise_std = args.noise_std;
    bse.noise_std = args.noise_std;

    let pedal_target = match args.scenario {
        Scenario::Normal | Scenario::Disagree | Scenario::Dropout => 0.5,
        Scenario::BrakeOverlap | Scenario::OutOfRange => 0.85,
        Scenario::WheelSlip => 0.6,
    };
    let fault_at_s = args.seconds * 0.4;

    // JSONL trace to stdout, one object per tick.
    for k in 0..steps {
        let t_s = (k as f64) * dt_s;

        if !gate.armed() {
            // Startup script: driver holds the brake, then flips the switch.
            x.brake_target = 1.0;
        } else {
            x.pedal_target = pedal_target;
            x.brake_target = match args.scenario {
                Scenario::BrakeOverlap if t_s > fault_at_s => 1.0,
                _ => 0.0,
            };
        }
        let cockpit_on = t_s > 0.3;

        // Mid-run fault injection, per scenario.
        if t_s > fault_at_s {
            match args.scenario {
                Scenario::Disagree => apps_b.fault = SensorFault::Bias { frac: 0.2 },
                Scenario::Dropout => apps_b.fault = SensorFault::DropoutEvery { n: 1 },
                Scenario::WheelSlip => x.rear_slip = 0.5,
                _ => {}
            }
        }

        x.step(&p, dt_s);

        let raw = RawInputs {
            accel_a: apps_a.read(x.pedal, dt_s),
            accel_b: apps_b.read(x.pedal, dt_s),
            brake: bse.read(x.brake, dt_s),
            wheel_front: Some(x.wheel_front_rpm),
            wheel_rear: Some(x.wheel_rear_rpm),
        };

        if !gate.armed() {
            let brake_pct = raw.brake.map(|v| cal_brake.calibrate(v));
            match gate.update(brake_pct, cockpit_on) {
                Some(GateEvent::BrakePassed) => info!("brake check passed, sounding buzzer"),
                Some(GateEvent::Armed) => info!("cockpit switch on, car armed"),
                None => {}
            }
            continue;
        }

        let now = Duration::from_secs_f64(t_s);
        let cmd = interlock.tick(&raw, now);

        let row = TraceRow {
            t_s,
            armed: true,
            pedal_a: raw.accel_a.map(|v| cal_a.calibrate(v)),
            pedal_b: raw.accel_b.map(|v| cal_b.calibrate(v)),
            brake: raw.brake.map(|v| cal_brake.calibrate(v)),
            wheel_front_rpm: x.wheel_front_rpm,
            wheel_rear_rpm: x.wheel_rear_rpm,
            throttle_pct: cmd.percent,
            cut: cmd.cut.map(|r| r.to_string()),
            pedal_latched: interlock.pedal_latched(),
            slip_latched: interlock.slip_latched(),
        };
        println!("{}", serde_json::to_string(&row)?);

        if interlock.pedal_latched() || interlock.slip_latched() {
            info!("power cut latched: {}", row.cut.as_deref().unwrap_or("?"));
            // stop early for clarity
            break;
        }
    }

    Ok(())
}
