use std::path::PathBuf;
use anyhow::{bail, Context};
use clap::Parser;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::info;
use coup_engine::{Coup, CsvJournal, GameConfig, NullSink, RandomDecider, StateSink, TurnOutcome};

/// Plays a game of Coup between random bots.
#[derive(Parser)]
#[command(name = "coup-engine")]
struct Args {
    /// JSON config file, overrides COUP_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma separated player names
    #[arg(long, value_delimiter = ',')]
    players: Option<Vec<String>>,

    /// Seed for the deck and the bots
    #[arg(long)]
    seed: Option<u64>,

    /// Write every state change to this CSV file
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Give up after this many turns
    #[arg(long, default_value_t = 1000)]
    max_turns: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::from_file_and_env(path)?,
        None => GameConfig::from_env()?,
    };
    if let Some(players) = args.players {
        config.player_names = players;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    config.validate()?;

    let seed = config.seed.unwrap_or_else(rand::random);
    info!(seed, players = ?config.player_names, "starting");

    let mut rng = Pcg64::seed_from_u64(seed);
    let mut decider = RandomDecider::with_config(Pcg64::seed_from_u64(seed.wrapping_add(1)), &config.bot);
    let mut sink: Box<dyn StateSink> = match &args.journal {
        Some(path) => Box::new(CsvJournal::create(path).with_context(|| format!("failed to create journal {:?}", path))?),
        None => Box::new(NullSink),
    };

    let mut coup = Coup::with_config(&config, &mut rng)?;

    for _ in 0..args.max_turns {
        if let TurnOutcome::Won(winner) = coup.play_turn(&mut decider, &mut sink, &mut rng)? {
            println!("{} wins after {} turns", coup.player(winner).name(), coup.turn());
            return Ok(());
        }
    }

    bail!("no winner after {} turns\n{:?}", args.max_turns, coup)
}
