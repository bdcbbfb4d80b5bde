//!  Weekender Flight Finder
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Interactive Shell
//!
//! Reads one command per line from stdin, as caller `local`, and prints
//! replies to stdout. Logs go to stderr.

use anyhow::{Context, Error, Result};
use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use weekender_flight_finder::config::SettingsArgs;
use weekender_flight_finder::{CallerId, CommandDispatcher, MessageSink, Reply};

const LOCAL_CALLER: &str = "local";

#[derive(Parser, Debug)]
#[command(name = "weekender")]
#[command(author, version, about = "Find Friday-to-Sunday flights, one month at a time")]
struct CliArgs {
    /// Run these commands in order and exit instead of reading stdin
    /// (e.g. -c "login pw" -c "find agosto")
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,

    /// Verbose output
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(flatten)]
    settings: SettingsArgs,
}

struct StdoutSink;

#[async_trait]
impl MessageSink for StdoutSink {
    async fn send(&self, reply: Reply) -> Result<()> {
        println!("{}", reply.text);
        if let Some(keyboard) = &reply.keyboard {
            for row in &keyboard.rows {
                let hints: Vec<String> = row
                    .iter()
                    .map(|b| format!("[{}] `{}`", b.label, b.command))
                    .collect();
                println!("  {}", hints.join("  "));
            }
        }
        println!();
        Ok(())
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.to_string().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    let settings = args.settings.into_settings().context("Invalid configuration")?;
    tracing::debug!("Settings: {:?}", settings);
    let dispatcher =
        CommandDispatcher::from_settings(&settings).context("Failed to set up the dispatcher")?;

    let caller = CallerId::new(LOCAL_CALLER);
    let sink = StdoutSink;

    if !args.commands.is_empty() {
        for line in &args.commands {
            dispatcher.dispatch(&caller, line, &sink).await;
        }
        return Ok(());
    }

    println!("Weekender shell. Type `help` for commands, Ctrl+D to quit.\n");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }
        dispatcher.dispatch(&caller, line, &sink).await;
    }

    Ok(())
}
