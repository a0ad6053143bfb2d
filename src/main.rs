use pipsync::adapter::SourceKind;
use pipsync::cli::{Args, Command, PositionsAction};
use pipsync::config::{self, PREFS_FILE, PathConfig, PlayerPrefs};
use pipsync::core::positions::{FileStorage, PositionStore};
use pipsync::paths;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

fn main() -> Result<()> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());

    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    init_logging(&args, &path_config)?;
    debug!("Command-line args: {:?}", args);

    let prefs_path = config::config_file(PREFS_FILE, &path_config);
    let prefs = PlayerPrefs::load(&prefs_path);

    match args.command {
        Command::Probe { url } => probe(&url),
        Command::Positions { action } => positions(action, &prefs, &path_config),
        Command::Prefs { write_defaults } => {
            if write_defaults {
                PlayerPrefs::default().save(&prefs_path)?;
                println!("Wrote {}", prefs_path.display());
            } else {
                println!("# {}", prefs_path.display());
                println!("{}", serde_json::to_string_pretty(&prefs)?);
            }
            Ok(())
        }
    }
}

/// 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::data_file("pipsync.log", path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn probe(url: &str) -> Result<()> {
    match SourceKind::detect(url) {
        SourceKind::Direct { url } => println!("direct\t{}", url),
        SourceKind::Embedded { video_id } => println!("embedded\t{}", video_id),
    }
    Ok(())
}

fn positions(action: PositionsAction, prefs: &PlayerPrefs, path_config: &PathConfig) -> Result<()> {
    let dir = paths::data_dir(path_config);
    info!("Positions directory: {}", dir.display());
    let store = PositionStore::with_key(Box::new(FileStorage::new(dir)), prefs.positions_key.clone());

    match action {
        PositionsAction::List => {
            let entries = store.entries();
            if entries.is_empty() {
                println!("No saved positions");
            }
            for (id, secs) in entries {
                println!("{}\t{:.1}", id, secs);
            }
        }
        PositionsAction::Get { id } => match store.load(&id) {
            Some(secs) => println!("{:.1}", secs),
            None => println!("No saved position for {}", id),
        },
        PositionsAction::Clear { id: Some(id) } => {
            if store.remove(&id) {
                println!("Cleared {}", id);
            } else {
                println!("No saved position for {}", id);
            }
        }
        PositionsAction::Clear { id: None } => {
            store.clear();
            println!("Cleared all positions");
        }
    }
    Ok(())
}
