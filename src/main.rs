//! Binary entrypoint for the mudcore CLI.
//!
//! Commands:
//! - `start [--user <id>] [--fresh]` - run the simulation with a stdin console
//! - `init` - write a starter `config.toml`
//! - `status` - print the derived timing constants for the current config
//!
//! See the library crate docs for module-level details: `mudcore::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use mudcore::admin;
use mudcore::config::{Config, SharedConfig};
use mudcore::sim::{start_simulation, Outbound, Simulation};
use mudcore::world::saver::{load_snapshot, JsonFileSaver};
use mudcore::world::seed::starter_world;
use mudcore::world::types::Actor;
use mudcore::world::World;

#[derive(Parser)]
#[command(name = "mudcore")]
#[command(about = "Simulation core for a multi-user text world")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation, reading commands from stdin
    Start {
        /// User id the console speaks as
        #[arg(short, long, default_value_t = 1)]
        user: u32,

        /// Ignore any autosave and start from the starter world
        #[arg(long)]
        fresh: bool,
    },
    /// Write a default configuration file
    Init,
    /// Show derived timing constants
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let tb = config.timebase();
            println!("turn duration:       {} ms", tb.turn_milliseconds);
            println!("round length:        {} s", tb.round_seconds);
            println!("turns per round:     {}", tb.turns_per_round());
            println!("turns per second:    {}", tb.turns_per_second());
            println!("rounds per minute:   {:.2}", tb.rounds_per_minute());
            println!(
                "autosave every:      {} rounds ({} turns)",
                tb.rounds_per_autosave,
                tb.turns_per_autosave()
            );
            println!("autosave file:       {}", config.storage.autosave_path().display());
        }
        Commands::Start { user, fresh } => {
            // Startup config errors are fatal.
            let shared = SharedConfig::load(&cli.config).await?;
            let config = shared.snapshot();
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting mudcore v{}", env!("CARGO_PKG_VERSION"));

            let autosave = config.storage.autosave_path();
            let world = if !fresh && autosave.exists() {
                info!("Loading world from {}", autosave.display());
                load_snapshot(&autosave)?
            } else {
                starter_world()
            };
            for u in world.users.values() {
                if config.is_banned_name(&u.username) {
                    warn!(target: "security", "user {} has a banned name '{}'", u.user_id, u.username);
                }
            }
            run_console(world, shared, &autosave, user).await?;
        }
    }

    Ok(())
}

async fn run_console(
    world: World,
    config: SharedConfig,
    autosave: &std::path::Path,
    user_id: u32,
) -> Result<()> {
    let level = world.user(user_id).map(|u| u.role).unwrap_or(0);
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
    let saver = JsonFileSaver::new(autosave)?;
    let sim = Simulation::new(world, config, out_tx).with_saver(Box::new(saver));
    let (handle, mut done) = start_simulation(sim);

    tokio::spawn(async move {
        while let Some(out) = out_rx.recv().await {
            match out {
                Outbound::ToUser { user_id: to, text } if to == user_id => print!("{}", text),
                Outbound::ToUser { user_id: to, text } => print!("[to {}] {}", to, text),
                Outbound::Broadcast { text } => print!("{}", text),
            }
        }
    });

    let me = Actor::User(user_id);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let report = loop {
        tokio::select! {
            report = &mut done => break report?,
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) if line.trim().starts_with('/') => {
                        match admin::execute(&handle, user_id, level, &line).await {
                            Ok(text) => print!("{}", text),
                            Err(e) => println!("{}", e),
                        }
                    }
                    Some(line) if !line.trim().is_empty() => {
                        handle.queue().queue_command(me, me, line.trim(), 0);
                    }
                    Some(_) => {}
                    None => {
                        info!("console closed; shutting down");
                        stdin_open = false;
                        handle.shutdown(None).await;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received; shutting down now");
                handle.shutdown(Some(0)).await;
            }
        }
    };
    info!(
        "Stopped after {} turns, final save {}",
        report.stats.turn,
        if report.final_save_ok { "ok" } else { "failed" }
    );
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let configured = config
        .as_ref()
        .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    // CLI verbosity raises the configured level.
    let base_level = match verbosity {
        0 => configured,
        1 => configured.max(log::LevelFilter::Debug),
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = config.as_ref().and_then(|c| c.logging.file.clone());
    let security_path = config.as_ref().and_then(|c| c.logging.security_file.clone());
    let mirror = file.and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
            .map(|f| std::sync::Arc::new(std::sync::Mutex::new(f)))
    });
    // With a log file and no terminal, the file is the only sink.
    let is_tty = atty::is(atty::Stream::Stdout);

    builder.format(move |fmt, record| {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let line = format!("{} [{}] {}", ts, record.level(), record.args());

        if let Some(mirror) = &mirror {
            if let Ok(mut guard) = mirror.lock() {
                let _ = writeln!(guard, "{}", line);
            }
        }
        if record.target() == "security" {
            if let Some(sec_path) = &security_path {
                if let Ok(mut sf) = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(sec_path)
                {
                    let _ = writeln!(sf, "{}", line);
                }
            }
        }
        if mirror.is_none() || is_tty {
            writeln!(fmt, "{}", line)
        } else {
            Ok(())
        }
    });
    let _ = builder.try_init();
}
