#![warn(clippy::pedantic, clippy::style, clippy::nursery)]

use std::path::PathBuf;

use blackjack::{
    behavior::Threshold,
    env::{hand::ACE, Blackjack, ForcedStart},
    episode::{self, episode_return},
    policy::{self, Recommended, StrategyChart, DEALER_UPCARDS},
    prediction,
    table,
    value::{ActionValues, Estimate},
};
use clap::Parser;
use evaluation::Evaluation;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

mod evaluation;

#[derive(Parser, Debug)]
struct Args {
    /// Path to the learned action values
    #[arg(long)]
    input: PathBuf,
    /// Number of greedy episodes to play
    #[arg(long, default_value_t = 100_000)]
    episodes: u64,
    /// Seed for the RNG
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Deal the player a fixed opening (`5` or `21`) in every episode
    #[arg(long)]
    forced: Option<ForcedStart>,
    /// Episodes per opening for the stick-on-20 comparison, 0 to skip it
    #[arg(long, default_value_t = 100_000)]
    compare: u64,
    /// Episodes of stick-on-20 state-value prediction, 0 to skip it.
    /// Uses the `--forced` opening when given
    #[arg(long, default_value_t = 0)]
    predict: u64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::info!("Begin. {args:?}");

    let values = table::load(&args.input).expect("input should be a valid value table");
    log::info!("Loaded {} states from {}", values.len(), args.input.display());
    let policy = policy::extract(&values);
    log::debug!("extracted a policy for {} states", policy.len());

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut env = Blackjack::new(ChaCha8Rng::seed_from_u64(rng.gen()));

    let evaluation = evaluate(&values, &mut env, args.episodes, args.forced, &mut rng);
    log::info!(
        "{evaluation:?} win rate: {:.1}% | mean return: {:.4}",
        evaluation.win_rate() * 100.0,
        evaluation.mean_return()
    );

    if args.compare > 0 {
        let comparison = prediction::compare_forced_starts(
            &mut env,
            &Threshold::default(),
            args.compare,
            &mut rng,
        )
        .expect("the threshold policy should only pick legal actions");
        for (forced, estimate) in [
            (ForcedStart::TwentyOne, comparison.twenty_one),
            (ForcedStart::Five, comparison.five),
        ] {
            log::info!("Value of {}: {:.4}", forced.total(), estimate.value);
        }
    }

    if args.predict > 0 {
        let state_values = prediction::first_visit(
            &mut env,
            &Threshold::default(),
            args.predict,
            args.forced,
            &mut rng,
        )
        .expect("the threshold policy should only pick legal actions");
        log::info!("Predicted values for {} states", state_values.len());
        if let Some(forced) = args.forced {
            let opening = state_values
                .iter()
                .filter(|(state, _)| state.player_sum == forced.total())
                .fold(Estimate::default(), |sum, (_, estimate)| sum.combine(*estimate));
            log::info!("Value of the {} opening: {:.4}", forced.total(), opening.value);
        }
    }

    let chart = StrategyChart::new(&values);
    let header: String = DEALER_UPCARDS
        .iter()
        .map(|card| if *card == ACE { " A".to_owned() } else { format!("{card:>2}") })
        .collect();
    log::info!("     {header}");
    for row in chart.rows() {
        let actions: String = row
            .actions
            .iter()
            .map(|action| format!("{:>2}", action.symbol()))
            .collect();
        log::info!("{:>5}{actions}", row.label);
    }
}

/// Play the recommended action in every episode.
fn evaluate(
    values: &ActionValues,
    env: &mut Blackjack<ChaCha8Rng>,
    episodes: u64,
    forced: Option<ForcedStart>,
    rng: &mut impl Rng,
) -> Evaluation {
    (0..episodes)
        .map(|_| {
            let trajectory = episode::generate(env, forced, &Recommended, values, rng)
                .expect("recommended actions should always be legal");
            Evaluation::from_return(episode_return(&trajectory))
        })
        .sum()
}
