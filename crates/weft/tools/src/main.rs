// Weft
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Weft CLI Tool
//!
//! Main entry point for the `weft` command-line interface.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use weft_tools::{JoinPointsArgs, MatchArgs, WeaveArgs, run_join_points, run_match, run_weave};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Weft - aspect weaving toolchain")]
#[command(version = "0.1.0")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weave a batch of units with the configured aspects
    Weave(WeaveArgs),
    /// List the join points of units
    JoinPoints(JoinPointsArgs),
    /// Show which join points a pointcut selects
    Match(MatchArgs),
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match cli.command {
        Commands::Weave(args) => {
            let summary = run_weave(&args)?;
            for diagnostic in &summary.diagnostics {
                eprintln!("{}", diagnostic);
            }
            if let Some(output) = &summary.output {
                println!("{}", output);
            }
            match summary.woven {
                Some(woven) => {
                    eprintln!("woven {} unit(s)", woven);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("weave aborted");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::JoinPoints(args) => {
            for line in run_join_points(&args)? {
                println!("{}", line);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Match(args) => match run_match(&args)? {
            Ok(lines) => {
                for line in lines {
                    println!("{}", line);
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{}", e.user_message());
                Ok(ExitCode::FAILURE)
            }
        },
    }
}
