use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dyad_experiment::{
    Participants, Session, SessionConfig, SessionLog, SessionReport, Task, load_titration,
};
use dyad_timing::PrecisionTimer;

use crate::sim::{SimCue, SimFrontend, SimModel};

/// Runs one dyadic decision-making session.
#[derive(Parser, Debug)]
#[command(name = "dyad", version, about)]
pub struct Cli {
    /// Pair number assigned to the two participants
    pub pair_id: u32,

    /// Task variant to run (ignored when --config is given)
    #[arg(long, value_enum, default_value_t = TaskArg::Grating)]
    pub task: TaskArg,

    /// Directory holding the per-pair titration files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory the session data file is written to
    #[arg(long, default_value = "data")]
    pub out_dir: PathBuf,

    /// JSON file overriding the task preset
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fixed seed for schedules and the simulated pair
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the preset block count
    #[arg(long)]
    pub blocks: Option<usize>,

    /// Override the preset trials per block
    #[arg(long)]
    pub trials: Option<usize>,

    /// Override the preset practice trial count
    #[arg(long)]
    pub practice: Option<usize>,

    /// Simulated pair: fraction of answered windows that are correct
    #[arg(long, default_value_t = 0.8)]
    pub sim_accuracy: f64,

    /// Simulated pair: fraction of windows left to lapse
    #[arg(long, default_value_t = 0.05)]
    pub sim_lapse: f64,

    /// Pace flips at the configured refresh rate instead of free-running
    #[arg(long)]
    pub paced: bool,

    /// Measure the effective refresh rate before the first trial
    #[arg(long)]
    pub verify_refresh: bool,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TaskArg {
    Grating,
    Dots,
}

impl TaskArg {
    fn task(self) -> Task {
        match self {
            TaskArg::Grating => Task::Grating,
            TaskArg::Dots => Task::RandomDots,
        }
    }
}

/// Parsed arguments plus the resolved session parameters.
pub struct App {
    cli: Cli,
    config: SessionConfig,
}

impl App {
    pub fn new() -> anyhow::Result<Self> {
        let cli = Cli::parse();
        init_logging(cli.verbose);

        anyhow::ensure!(
            (0.0..=1.0).contains(&cli.sim_accuracy) && (0.0..=1.0).contains(&cli.sim_lapse),
            "--sim-accuracy and --sim-lapse must lie in [0, 1]"
        );

        let mut config = match &cli.config {
            Some(path) => SessionConfig::from_json_file(path)?,
            None => SessionConfig::preset(cli.task.task()),
        };
        if let Some(blocks) = cli.blocks {
            config.blocks = blocks;
        }
        if let Some(trials) = cli.trials {
            config.trials_per_block = trials;
        }
        if let Some(practice) = cli.practice {
            config.practice_trials = practice;
        }
        config.verify_refresh |= cli.verify_refresh;
        config.validate()?;

        Ok(Self { cli, config })
    }

    pub fn run(self) -> anyhow::Result<()> {
        let Self { cli, config } = self;

        let one = load_titration(&cli.data_dir, cli.pair_id, 1)?;
        let two = load_titration(&cli.data_dir, cli.pair_id, 2)?;
        info!(
            pair = cli.pair_id,
            threshold_one = one.threshold,
            threshold_two = two.threshold,
            "titrations loaded"
        );
        let participants =
            Participants::for_session(&config, cli.pair_id, [one.threshold, two.threshold]);

        let log = SessionLog::create(&cli.out_dir, &config.experiment_name, cli.pair_id)?;
        info!(path = %log.path().display(), "data file open");

        let seed = cli.seed.unwrap_or_else(rand::random);
        info!(seed, "schedules seeded");

        let model = SimModel {
            accuracy: cli.sim_accuracy,
            lapse: cli.sim_lapse,
            ..SimModel::default()
        };
        let frontend = SimFrontend::new(
            &participants,
            model,
            cli.paced,
            config.refresh_hz,
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        );

        let session = Session::new(
            config,
            cli.pair_id,
            participants,
            frontend,
            SimCue::default(),
            PrecisionTimer::new(),
            StdRng::seed_from_u64(seed),
            log,
        )?;
        let report = session.run()?;
        print_report(&report);

        Ok(())
    }
}

fn init_logging(verbosity: u8) {
    let directive = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("DYAD_LOG").unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .try_init();
}

fn print_report(report: &SessionReport) {
    println!();
    if let Some(practice) = report.practice {
        println!("practice: {}/{} correct", practice.correct, practice.trials);
    }
    println!("trials logged: {}", report.summary.trials);
    if let Some(accuracy) = report.summary.accuracy() {
        println!("accuracy: {:.1}%", accuracy * 100.0);
    }
    if let Some(rate) = report.summary.response_rate() {
        println!("response rate: {:.1}%", rate * 100.0);
    }
    let outcomes = report.summary.outcomes;
    if outcomes.total() > 0 {
        println!(
            "outcomes: {} hits, {} misses, {} false alarms, {} correct rejects, {} no responses",
            outcomes.hits,
            outcomes.misses,
            outcomes.false_alarms,
            outcomes.correct_rejects,
            outcomes.no_responses
        );
    }
    if let (Some(mean), Some(min), Some(max)) = (
        report.summary.mean_rt_s,
        report.summary.min_rt_s,
        report.summary.max_rt_s,
    ) {
        println!("mean rt: {mean:.3} s (min {min:.3}, max {max:.3})");
    }
    if report.refresh.samples > 0 {
        println!(
            "measured refresh: {:.1} fps over {} frames",
            report.refresh.effective_fps, report.refresh.samples
        );
    }
    if report.terminated_early {
        println!("terminated early after block {}", report.completed_blocks);
    }
    println!("data file: {}", report.log_path.display());
}
