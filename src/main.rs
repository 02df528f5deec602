//! decksim - statistical deck evaluation by simulated games

use clap::{Parser, Subcommand, ValueEnum};
use decksim::{
    game::{
        GameEndReason, GameLoop, PlayerController, RandomController, VerbosityLevel,
        ZeroController,
    },
    loader::{CardDatabase, DeckLoader, Game},
    tournament::{run_batch, BatchConfig, ControllerKind},
    Result,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ControllerType {
    /// Always takes the first meaningful action (deterministic)
    Zero,
    /// Picks uniformly among legal actions
    Random,
}

impl From<ControllerType> for ControllerKind {
    fn from(t: ControllerType) -> Self {
        match t {
            ControllerType::Zero => ControllerKind::Zero,
            ControllerType::Random => ControllerKind::Random,
        }
    }
}

/// Verbosity accepted by name or number
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

#[derive(Parser)]
#[command(name = "decksim")]
#[command(about = "Two-player game simulator for statistical deck evaluation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single game between two decks
    Sim {
        /// Deck list file for player 1
        deck1: PathBuf,

        /// Deck list file for player 2
        deck2: PathBuf,

        /// Card script directory (built-in demo set when omitted)
        #[arg(long, value_name = "DIR")]
        cards: Option<PathBuf>,

        /// Player 1 controller
        #[arg(long, value_enum, default_value = "random")]
        p1: ControllerType,

        /// Player 2 controller
        #[arg(long, value_enum, default_value = "random")]
        p2: ControllerType,

        /// RNG seed (shuffles and random controllers)
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Turn budget before declaring a draw
        #[arg(long, default_value_t = 100)]
        max_turns: u32,

        #[arg(long, short, default_value = "normal")]
        verbosity: VerbosityArg,
    },

    /// Run many games in parallel and report win rates
    Tourney {
        deck1: PathBuf,
        deck2: PathBuf,

        /// Card script directory (built-in demo set when omitted)
        #[arg(long, value_name = "DIR")]
        cards: Option<PathBuf>,

        /// Number of games to play
        #[arg(long, short, default_value_t = 100)]
        games: u32,

        #[arg(long, value_enum, default_value = "random")]
        p1: ControllerType,

        #[arg(long, value_enum, default_value = "random")]
        p2: ControllerType,

        /// Base seed; game i uses seed + i
        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[arg(long, default_value_t = 100)]
        max_turns: u32,

        /// Emit aggregated stats as JSON instead of the table
        #[arg(long)]
        json: bool,
    },
}

fn load_database(cards: Option<&PathBuf>) -> Result<CardDatabase> {
    match cards {
        Some(dir) => CardDatabase::load_from_dir(dir),
        None => Ok(CardDatabase::demo()),
    }
}

fn run_sim(
    deck1: &PathBuf,
    deck2: &PathBuf,
    cards: Option<&PathBuf>,
    p1: ControllerType,
    p2: ControllerType,
    seed: u64,
    max_turns: u32,
    verbosity: VerbosityLevel,
) -> Result<()> {
    let db = load_database(cards)?;
    let deck1 = DeckLoader::load_from_file(deck1)?;
    let deck2 = DeckLoader::load_from_file(deck2)?;

    let mut builder = Game::new(&db)
        .with_seed(seed)
        .with_max_turns(max_turns)
        .with_verbosity(verbosity);
    builder.add_player(deck1.name.as_str(), deck1.clone())?;
    builder.add_player(deck2.name.as_str(), deck2.clone())?;

    let mut game = builder.build_state()?;
    let ids: Vec<_> = game.players.iter().map(|p| p.id).collect();

    let mut c1: Box<dyn PlayerController> = match p1 {
        ControllerType::Zero => Box::new(ZeroController::new(ids[0])),
        ControllerType::Random => Box::new(RandomController::new(ids[0], seed.wrapping_add(1))),
    };
    let mut c2: Box<dyn PlayerController> = match p2 {
        ControllerType::Zero => Box::new(ZeroController::new(ids[1])),
        ControllerType::Random => Box::new(RandomController::new(ids[1], seed.wrapping_add(2))),
    };
    let mut controllers: Vec<&mut dyn PlayerController> = vec![c1.as_mut(), c2.as_mut()];

    let result = GameLoop::new(&mut game)
        .with_max_turns(max_turns)
        .run_game(&mut controllers)?;

    match result.winner {
        Some(winner) => {
            let name = &game.get_player(winner)?.name;
            let reason = match result.end_reason {
                GameEndReason::Decking => "opponent drew from an empty library",
                _ => "opponent's life reached zero",
            };
            println!(
                "{} wins on turn {} ({})",
                name, result.turns_played, reason
            );
        }
        None => println!(
            "draw: turn budget of {} exhausted",
            result.turns_played
        ),
    }
    Ok(())
}

fn run_tourney(
    deck1: &PathBuf,
    deck2: &PathBuf,
    cards: Option<&PathBuf>,
    games: u32,
    p1: ControllerType,
    p2: ControllerType,
    seed: u64,
    max_turns: u32,
    json: bool,
) -> Result<()> {
    let db = load_database(cards)?;
    let deck1 = DeckLoader::load_from_file(deck1)?;
    let deck2 = DeckLoader::load_from_file(deck2)?;

    let config = BatchConfig {
        games,
        base_seed: seed,
        max_turns,
        starting_life: 20,
        controller1: p1.into(),
        controller2: p2.into(),
    };
    let stats = run_batch(&db, &deck1, &deck2, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("=== {} vs {} ===", deck1.name, deck2.name);
    println!("games:        {}", stats.games);
    println!(
        "{:<12}  {} wins ({:.1}%)",
        deck1.name,
        stats.deck1_wins,
        stats.deck1_win_rate() * 100.0
    );
    println!(
        "{:<12}  {} wins ({:.1}%)",
        deck2.name,
        stats.deck2_wins,
        f64::from(stats.deck2_wins) / f64::from(stats.games.max(1)) * 100.0
    );
    println!("draws:        {}", stats.draws);
    println!("avg turns:    {:.1}", stats.average_turns());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Sim {
            deck1,
            deck2,
            cards,
            p1,
            p2,
            seed,
            max_turns,
            verbosity,
        } => run_sim(
            &deck1,
            &deck2,
            cards.as_ref(),
            p1,
            p2,
            seed,
            max_turns,
            verbosity.0,
        ),
        Commands::Tourney {
            deck1,
            deck2,
            cards,
            games,
            p1,
            p2,
            seed,
            max_turns,
            json,
        } => run_tourney(
            &deck1,
            &deck2,
            cards.as_ref(),
            games,
            p1,
            p2,
            seed,
            max_turns,
            json,
        ),
    }
}
