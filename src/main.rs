//! Toolbucket command-line entry point.
//!
//! Thin wrapper over `BucketEngine`:
//! - `check <tool> <user>`: exit 0 when allowed, 1 when denied, 2 on error
//! - `set-limit <tool> <capacity> <refill_rate>`
//! - `status`: JSON report on stdout
//! - `reset`: drop every bucket
//!
//! Document locations come from `RATE_LIMIT_CONFIG` / `RATE_LIMIT_STATE`.

use clap::{CommandFactory, Parser, Subcommand};
use std::process::ExitCode;

use toolbucket::types::EXIT_ERROR;
use toolbucket::{BucketEngine, Config, Result, ToolId, UserId};

#[derive(Debug, Parser)]
#[command(name = "toolbucket", version, about = "Rate limiting for agent tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check if request is allowed
    Check {
        /// Tool name
        tool: String,
        /// User identifier
        user: String,
    },
    /// Set limit for a tool
    SetLimit {
        /// Tool name
        tool: String,
        /// Bucket capacity
        capacity: u32,
        /// Refill rate (tokens/second)
        #[arg(allow_negative_numbers = true)]
        refill_rate: f64,
    },
    /// Show status of all buckets
    Status,
    /// Reset all buckets
    Reset,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::SUCCESS;
    };

    match run(command) {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            exit(e.exit_code())
        }
    }
}

fn run(command: Command) -> Result<i32> {
    let config = Config::from_env()?;
    toolbucket::observability::init_tracing(&config.observability);
    let mut engine = BucketEngine::from_config(&config)?;

    match command {
        Command::Check { tool, user } => {
            let decision = engine.check(&ToolId::new(&tool)?, &UserId::new(&user)?)?;
            println!("{}: {} for {}", decision, tool, user);
            Ok(decision.exit_code())
        }
        Command::SetLimit {
            tool,
            capacity,
            refill_rate,
        } => {
            engine.set_limit(&ToolId::new(&tool)?, capacity, refill_rate)?;
            println!(
                "Set limit for {}: capacity={}, refill_rate={:?}",
                tool, capacity, refill_rate
            );
            Ok(0)
        }
        Command::Status => {
            let report = engine.status();
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| toolbucket::Error::config(format!("cannot render status: {}", e)))?;
            println!("{}", json);
            Ok(0)
        }
        Command::Reset => {
            engine.reset()?;
            println!("All buckets reset");
            Ok(0)
        }
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(EXIT_ERROR as u8))
}
