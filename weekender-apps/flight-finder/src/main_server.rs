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

//! # HTTP Server Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use weekender_flight_finder::CommandDispatcher;
use weekender_flight_finder::config::{SettingsArgs, check_access_token};
use weekender_flight_finder::server::{AppState, router};

#[derive(Parser, Debug)]
#[command(name = "weekender-server")]
#[command(author, version, about = "Weekend flight finder over HTTP")]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value = "8080")]
    port: u16,

    /// Bearer token front ends must present on /commands
    #[arg(long, env = "WEEKENDER_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Verbose output
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(flatten)]
    settings: SettingsArgs,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.to_string().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .init();

    tracing::debug!("Destinations file: {}", args.settings.destinations_file.display());

    check_access_token(&args.access_token).context("Invalid WEEKENDER_ACCESS_TOKEN")?;
    let settings = args.settings.into_settings().context("Invalid configuration")?;
    tracing::debug!("Settings: {:?}", settings);

    let dispatcher = Arc::new(
        CommandDispatcher::from_settings(&settings).context("Failed to set up the dispatcher")?,
    );
    let app = router(AppState::new(dispatcher, args.access_token));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid host:port")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}
