use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Backends: direct, embedded\n",
    "Target:   ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Inspect and maintain picture-in-picture player state
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging to file (default: pipsync.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE", global = true)]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show which backend a source URL selects
    Probe {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Inspect or clear saved playback positions
    Positions {
        #[command(subcommand)]
        action: PositionsAction,
    },

    /// Print effective preferences
    Prefs {
        /// Write the default preferences file (overwrites)
        #[arg(long = "write-defaults")]
        write_defaults: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum PositionsAction {
    /// List every saved position
    List,
    /// Show the saved position of one video
    Get {
        #[arg(value_name = "VIDEO_ID")]
        id: String,
    },
    /// Forget one video's position, or all of them
    Clear {
        #[arg(value_name = "VIDEO_ID")]
        id: Option<String>,
    },
}
