use std::rc::Rc;

use clap::{Parser, Subcommand, ValueEnum};

use crate::scheduler::{ManualScheduler, Scheduler, TokioScheduler};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-autofill",
    version,
    about = "Detect form fields in a page snapshot and fill them from a value bag"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-autofill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect forms and fields in a page snapshot
    Detect {
        /// Path to a JSON page snapshot
        #[arg(long)]
        page: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,
    },

    /// Detect fields, then fill them from a JSON value bag
    Fill {
        /// Path to a JSON page snapshot
        #[arg(long)]
        page: String,

        /// Path to a JSON object mapping field names to values
        #[arg(long)]
        values: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,

        /// Skip the pauses between fields and retries
        #[arg(long)]
        no_delay: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Console,
    Json,
}

// ============================================================================
// Clock selection
// ============================================================================

/// Clock the engine waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    Real,
    /// Pauses are recorded and skipped.
    Virtual,
}

impl Clock {
    pub fn from_no_delay(no_delay: bool) -> Self {
        if no_delay { Clock::Virtual } else { Clock::Real }
    }

    pub fn scheduler(self) -> Rc<dyn Scheduler> {
        match self {
            Clock::Real => Rc::new(TokioScheduler),
            Clock::Virtual => Rc::new(ManualScheduler::new()),
        }
    }
}
