//! # Delve Headless Driver
//!
//! Builds a simulation from a seed, drives it with a scripted or random stream
//! of commands at a fixed frame time, and prints the explored map and session
//! statistics.

use clap::Parser;
use delve::{
    ascii_view, Command, DelveError, DelveResult, GameState, ItemCatalog, LootBook,
    SimulationConfig, TemplateBook, TickOutcome,
};
use log::{error, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;

/// Command line arguments for the headless driver.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Headless driver for the Delve dungeon simulation core")]
#[command(version)]
struct Args {
    /// Random seed for the floor plan, generation and creature AI
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON simulation config; the seed flag overrides its seed
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON creature and bustable templates
    #[arg(long)]
    templates: Option<PathBuf>,

    /// JSON loot tables
    #[arg(long)]
    loot: Option<PathBuf>,

    /// JSON item metadata catalog
    #[arg(long)]
    items: Option<PathBuf>,

    /// Comma-separated commands, e.g. "right,right,down,wait"
    #[arg(long)]
    script: Option<String>,

    /// Number of random commands when no script is given
    #[arg(long, default_value_t = 200)]
    steps: usize,

    /// Frame time fed to every tick, in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u32,

    /// Half-size of the printed map
    #[arg(long, default_value_t = 15)]
    radius: i32,

    /// Print the map after every command
    #[arg(long)]
    trace: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    info!("Starting Delve v{}", delve::VERSION);
    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        use tracing::Level;

        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .format_timestamp(None)
            .init();
    }
}

fn load_config(args: &Args) -> DelveResult<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
        config.generation.seed = seed;
    }
    Ok(config)
}

fn build_script(args: &Args, seed: u64) -> DelveResult<Vec<Command>> {
    if let Some(script) = &args.script {
        return script
            .split(',')
            .filter(|name| !name.trim().is_empty())
            .map(|name| {
                Command::parse(name)
                    .ok_or_else(|| DelveError::InvalidAction(format!("unknown command '{}'", name)))
            })
            .collect();
    }

    let choices = [
        Command::MoveUp,
        Command::MoveDown,
        Command::MoveLeft,
        Command::MoveRight,
        Command::MoveRight,
        Command::MoveDown,
        Command::Wait,
    ];
    let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
    Ok((0..args.steps)
        .filter_map(|_| choices.choose(&mut rng).copied())
        .collect())
}

fn run(args: &Args) -> DelveResult<()> {
    let config = load_config(args)?;
    let templates = match &args.templates {
        Some(path) => TemplateBook::from_json_str(&std::fs::read_to_string(path)?)?,
        None => TemplateBook::default(),
    };
    let loot = match &args.loot {
        Some(path) => LootBook::from_json_str(&std::fs::read_to_string(path)?)?,
        None => LootBook::default(),
    };
    let catalog = match &args.items {
        Some(path) => ItemCatalog::from_json_str(&std::fs::read_to_string(path)?)?,
        None => ItemCatalog::default(),
    };
    let script = build_script(args, config.seed)?;

    let mut state = GameState::with_tables(config, templates, loot, catalog)?;

    let mut frames: u64 = 0;
    'script: for command in script {
        let mut outcome = state.tick(args.frame_ms, &[command]);
        frames += 1;
        // Play the step out so the next command lands on an idle controller.
        while outcome == TickOutcome::Continue && state.clock().is_animating() {
            outcome = state.tick(args.frame_ms, &[]);
            frames += 1;
        }

        match outcome {
            TickOutcome::Continue => {}
            TickOutcome::Quit => break 'script,
            TickOutcome::Restart => state.reset_for_new_game()?,
        }

        if args.trace {
            println!("{}", ascii_view(&state, args.radius));
        }
        if !state.player_alive() {
            info!("the player has died");
            break;
        }
    }

    println!("{}", ascii_view(&state, args.radius));
    let stats = state.statistics();
    println!("seed:             {}", state.config().seed);
    println!("frames:           {}", frames);
    println!("turns taken:      {}", stats.turns_taken);
    println!("waits:            {}", stats.waits);
    println!("enemies defeated: {}", stats.enemies_defeated);
    println!("objects busted:   {}", stats.objects_busted);
    println!("doors opened:     {}", stats.doors_opened);
    println!("items collected:  {}", stats.items_collected);
    println!("damage taken:     {}", stats.damage_taken);
    println!(
        "chunks generated: {} of {}",
        stats.chunks_generated,
        state.floor().chunk_count()
    );
    for slot in state.inventory().slots() {
        println!("  {} x{}", slot.item, slot.quantity);
    }
    Ok(())
}
