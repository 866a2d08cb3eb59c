#![warn(clippy::pedantic, clippy::style, clippy::nursery)]

use std::{path::PathBuf, sync::atomic::AtomicBool};

use blackjack::{
    control::{
        glie::{GlieConfig, GlieControl},
        importance::{ImportanceConfig, ImportanceControl},
        train,
        Control,
        TrainingReport,
    },
    env::Blackjack,
    parallel::{self, ParallelConfig},
    table,
    value::ActionValues,
};
use clap::{Parser, ValueEnum};
use rand::prelude::*;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Method {
    /// First-visit control with a decaying epsilon-greedy policy
    OnPolicy,
    /// Weighted importance sampling from a fixed epsilon-soft policy
    OffPolicy,
}

#[derive(Parser, Debug)]
struct Args {
    /// Which control method to train with
    #[arg(long, value_enum, default_value_t = Method::OnPolicy)]
    method: Method,
    /// Number of episodes to play
    #[arg(long, default_value_t = 2_000_000)]
    episodes: u64,
    /// Seed for the RNG
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Number of parallel workers
    #[arg(long, default_value_t = 1)]
    workers: usize,
    /// Initial exploration rate for on-policy training (default 1.0) or
    /// fixed exploration rate for off-policy training (default 0.2)
    #[arg(long)]
    epsilon: Option<f64>,
    /// Exploration floor for on-policy training
    #[arg(long, default_value_t = 0.005)]
    epsilon_min: f64,
    /// Fraction of the episodes over which on-policy epsilon decays
    #[arg(long, default_value_t = 0.4)]
    decay_fraction: f64,
    /// Where to write the learned action values
    #[arg(long)]
    output: PathBuf,
}

impl Args {
    fn glie(&self) -> GlieConfig {
        GlieConfig {
            epsilon_start: self.epsilon.unwrap_or(GlieConfig::default().epsilon_start),
            epsilon_min: self.epsilon_min,
            decay_fraction: self.decay_fraction,
        }
    }

    fn importance(&self) -> ImportanceConfig {
        ImportanceConfig {
            epsilon: self.epsilon.unwrap_or(ImportanceConfig::default().epsilon),
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::info!("Begin. {args:?}");

    // Never set; training always runs to completion from the command line.
    let stop = AtomicBool::new(false);
    let (values, report) = if args.workers > 1 {
        let config = ParallelConfig {
            workers: args.workers,
            episodes: args.episodes,
            seed: args.seed,
        };
        match args.method {
            Method::OnPolicy => parallel::train_glie(&config, &args.glie(), &stop),
            Method::OffPolicy => parallel::train_importance(&config, &args.importance(), &stop),
        }
        .expect("parallel training should succeed")
    } else {
        match args.method {
            Method::OnPolicy => {
                let control = GlieControl::from_config(&args.glie(), args.episodes)
                    .expect("on-policy configuration should be valid");
                serial(control, &args, &stop)
            }
            Method::OffPolicy => {
                let control = ImportanceControl::new(&args.importance())
                    .expect("off-policy configuration should be valid");
                serial(control, &args, &stop)
            }
        }
    };

    log::info!(
        "Done. episodes: {} | mean return: {:.4} | states: {}",
        report.episodes,
        report.mean_return(),
        values.len()
    );
    if report.degenerate > 0 {
        log::warn!(
            "{} episodes were cut short by unusable importance ratios",
            report.degenerate
        );
    }
    table::save(&values, &args.output).expect("output path should be writable");
    log::info!("Saved values to {}", args.output.display());
}

fn serial<C: Control>(
    mut control: C,
    args: &Args,
    stop: &AtomicBool,
) -> (ActionValues, TrainingReport) {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut env = Blackjack::seeded(rng.gen());
    let report = train(&mut control, &mut env, args.episodes, stop, &mut rng)
        .expect("the behavior policy should only pick legal actions");
    (control.into_values(), report)
}
