use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use signal_sim::simulation::{
    DelayFormula, GreenTiming, ReportSink, SchedulingPolicy, SimConfig, SimWorld, StoppedRule,
    Telemetry, TextFileReport, VehicleKind, WaitingRule, DEFAULT_MOTION_SUBSTEPS,
    DEFAULT_RANDOM_GREEN, DEFAULT_RED,
};

#[derive(Parser)]
#[command(name = "signal_sim")]
#[command(about = "Four-way signalized intersection simulation")]
struct Cli {
    /// Simulated seconds to run
    #[arg(long, default_value = "300")]
    duration: u32,

    /// Seconds between periodic reports
    #[arg(long, default_value = "30")]
    report_interval: u32,

    /// How the next green approach is chosen
    #[arg(long, value_enum, default_value_t = SchedulingPolicy::SkipEmptyRoundRobin)]
    policy: SchedulingPolicy,

    /// Fixed green seconds for right, down, left and up
    #[arg(long, value_delimiter = ',', default_values_t = vec![10u32, 10, 10, 10])]
    green: Vec<u32>,

    /// Draw each green duration at random instead of using --green
    #[arg(long)]
    random_green: bool,

    /// Shortest random green duration
    #[arg(long, default_value_t = DEFAULT_RANDOM_GREEN.0)]
    green_min: u32,

    /// Longest random green duration
    #[arg(long, default_value_t = DEFAULT_RANDOM_GREEN.1)]
    green_max: u32,

    /// Yellow seconds for every approach
    #[arg(long, default_value = "5")]
    yellow: u32,

    /// Vehicle kinds allowed to arrive
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = VehicleKind::ALL.to_vec())]
    kinds: Vec<VehicleKind>,

    /// Global speed in percent
    #[arg(long, default_value = "100")]
    speed: u32,

    /// Motion steps per simulated second
    #[arg(long, default_value_t = DEFAULT_MOTION_SUBSTEPS)]
    substeps: u32,

    /// Which vehicles make an approach count as waiting
    #[arg(long, value_enum, default_value_t = WaitingRule::NotCrossed)]
    waiting_rule: WaitingRule,

    /// Which vehicles count as stopped for queues and delay
    #[arg(long, value_enum, default_value_t = StoppedRule::AtThreshold)]
    stopped_rule: StoppedRule,

    /// Average delay formula
    #[arg(long, value_enum, default_value_t = DelayFormula::PerVehicleSeen)]
    delay_formula: DelayFormula,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// File the periodic reports are appended to
    #[arg(long, default_value = "simulation_stats.txt")]
    report_file: PathBuf,

    /// Pace the simulation at one tick per wall-clock second
    #[arg(long)]
    realtime: bool,
}

impl Cli {
    fn to_config(&self) -> Result<SimConfig> {
        let green = if self.random_green {
            GreenTiming::Random {
                min: self.green_min,
                max: self.green_max,
            }
        } else {
            let durations: [u32; 4] = match self.green.as_slice().try_into() {
                Ok(durations) => durations,
                Err(_) => bail!(
                    "--green takes exactly four durations, got {}",
                    self.green.len()
                ),
            };
            GreenTiming::Fixed(durations)
        };

        Ok(SimConfig {
            total_duration: self.duration,
            report_interval: self.report_interval,
            policy: self.policy,
            green,
            yellow: self.yellow,
            red: DEFAULT_RED,
            allowed_kinds: self.kinds.clone(),
            speed_percentage: self.speed,
            motion_substeps: self.substeps,
            waiting_rule: self.waiting_rule,
            stopped_rule: self.stopped_rule,
            delay_formula: self.delay_formula,
            seed: self.seed,
            ..SimConfig::default()
        })
    }
}

/// Writes reports to the file and the console, optionally pacing the run
struct ConsoleReport {
    file: TextFileReport,
    realtime: bool,
}

impl ReportSink for ConsoleReport {
    fn report(&mut self, telemetry: &Telemetry) -> Result<()> {
        println!("{}", telemetry);
        println!();
        self.file.report(telemetry)
    }

    fn on_tick(&mut self, _telemetry: &Telemetry) {
        if self.realtime {
            std::thread::sleep(Duration::from_secs(1));
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.to_config()?;
    let mut world = SimWorld::new(config).context("Invalid simulation configuration")?;

    println!("Running intersection simulation in headless mode...");
    println!(
        "Duration: {}s, policy: {:?}, reports to {}",
        cli.duration,
        cli.policy,
        cli.report_file.display()
    );
    println!();

    let mut sink = ConsoleReport {
        file: TextFileReport::open(&cli.report_file)?,
        realtime: cli.realtime,
    };
    world.run(&mut sink);

    println!("=== Final State ===");
    world.print_summary();
    Ok(())
}
