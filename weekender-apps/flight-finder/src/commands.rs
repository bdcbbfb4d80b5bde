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

//! # Command Dispatcher
//!
//! Front-end agnostic command surface. A front end hands over the caller
//! identity and one line of text (`/find agosto 2026`, `toggle Country:FR`,
//! ...) plus a [`MessageSink`]; every reply goes through the sink.
//!
//! Gated commands start with an explicit login check and do nothing else
//! when it fails.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::auth_gate::{AuthGate, CallerId, LoginOutcome};
use crate::config::Settings;
use crate::destinations_store::{DestinationStore, StoreError};
use crate::flights_query_builder::FlightQueryBuilder;
use crate::flights_search::{FlightSearch, KiwiFlightsClient};
use crate::formatting;
use crate::messaging::{MessageSink, Reply};
use crate::orchestrator::{SearchEvent, SearchOrchestrator, SearchReporter, SearchSummary};

/// Spanish names first, as the bot has always accepted them, then English.
const MONTH_NAMES: &[(&str, u32)] = &[
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

// `/find@some_bot agosto 2026` -> ("find", "agosto 2026")
static COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/?([A-Za-z_]+)(?:@\S+)?(?:\s+(.*))?$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Find(Vec<String>),
    Destinations,
    Toggle(Option<String>),
    SelectAll,
    DeselectAll,
    ResetDefaults,
    Login(Option<String>),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    MissingArgument(&'static str),
    #[error("unknown month: {0}")]
    UnknownMonth(String),
}

impl CommandError {
    pub fn user_message(&self) -> String {
        match self {
            CommandError::Empty | CommandError::UnknownCommand(_) => {
                "❓ Unknown command. Use `/help` to see what I can do.".to_string()
            }
            CommandError::MissingArgument(usage) => format!("ℹ️ Usage: `{}`", usage),
            CommandError::UnknownMonth(_) => {
                let valid: Vec<&str> = MONTH_NAMES.iter().take(12).map(|(name, _)| *name).collect();
                format!(
                    "❌ Unknown month.\n\n*Valid months:* {} (English names work too)",
                    valid.join(", ")
                )
            }
        }
    }
}

pub fn parse_command(text: &str) -> Result<Command, CommandError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CommandError::Empty);
    }
    let caps = COMMAND_RE
        .captures(text)
        .ok_or_else(|| CommandError::UnknownCommand(text.to_string()))?;
    let name = caps[1].to_lowercase();
    let args: Vec<String> = caps
        .get(2)
        .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    let first = args.first().cloned();

    let command = match name.as_str() {
        "start" | "menu" => Command::Start,
        "find" => Command::Find(args),
        "destinations" | "config_destinos" => Command::Destinations,
        "toggle" => match first.as_deref() {
            Some("all_on") => Command::SelectAll,
            Some("all_off") => Command::DeselectAll,
            _ => Command::Toggle(first),
        },
        "all_on" => Command::SelectAll,
        "all_off" => Command::DeselectAll,
        "reset" | "reset_defaults" => Command::ResetDefaults,
        "login" => Command::Login(first),
        "help" => Command::Help,
        _ => return Err(CommandError::UnknownCommand(name)),
    };
    Ok(command)
}

pub fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTH_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, month)| *month)
}

/// Resolve `find` arguments into `(month, year)`.
///
/// Without an all-digit year, a month already past this year means next year.
pub fn resolve_month(args: &[String], today: NaiveDate) -> Result<(u32, i32), CommandError> {
    let name = args
        .first()
        .ok_or(CommandError::MissingArgument("/find august [year]"))?;
    let month = month_from_name(name).ok_or_else(|| CommandError::UnknownMonth(name.clone()))?;

    let explicit_year = args
        .get(1)
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .and_then(|y| y.parse::<i32>().ok());
    let year = explicit_year.unwrap_or_else(|| {
        if month < today.month() {
            today.year() + 1
        } else {
            today.year()
        }
    });
    Ok((month, year))
}

/// What became of one dispatched command.
#[derive(Debug)]
pub enum Outcome {
    Done,
    Unauthorized,
    InvalidInput(CommandError),
    Searched(SearchSummary),
}

struct SinkReporter<'a> {
    sink: &'a dyn MessageSink,
}

#[async_trait]
impl SearchReporter for SinkReporter<'_> {
    async fn report(&self, event: SearchEvent) {
        deliver(self.sink, formatting::render_event(&event)).await;
    }
}

async fn deliver(sink: &dyn MessageSink, reply: Reply) {
    if let Err(e) = sink.send(reply).await {
        tracing::warn!("Failed to deliver reply: {:#}", e);
    }
}

pub struct CommandDispatcher {
    store: Arc<DestinationStore>,
    client: Arc<dyn FlightSearch>,
    query_builder: FlightQueryBuilder,
    gate: Arc<AuthGate>,
}

impl CommandDispatcher {
    pub fn new(
        store: Arc<DestinationStore>,
        client: Arc<dyn FlightSearch>,
        query_builder: FlightQueryBuilder,
        gate: Arc<AuthGate>,
    ) -> Self {
        Self {
            store,
            client,
            query_builder,
            gate,
        }
    }

    /// Wire up the production stack: file store, Kiwi client, gate.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let store = Arc::new(DestinationStore::with_standard_catalog(&settings.destinations_file));
        // Creates or repairs the file up front.
        let config = store.load();
        tracing::info!(
            "Loaded {} destinations ({} active) from {}",
            config.len(),
            config.active_count(),
            store.path().display()
        );

        let client = KiwiFlightsClient::new(
            settings.api_key.clone(),
            settings.timeout_secs,
            settings.queries_per_second,
        )?
        .with_api_host(settings.api_host.clone());
        let gate = AuthGate::new(settings.gate_password.clone())?;

        Ok(Self::new(
            store,
            Arc::new(client),
            FlightQueryBuilder::new(settings.origins.clone()),
            Arc::new(gate),
        ))
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    pub fn store(&self) -> &DestinationStore {
        &self.store
    }

    pub async fn dispatch(&self, caller: &CallerId, text: &str, sink: &dyn MessageSink) -> Outcome {
        let command = match parse_command(text) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!("Unparsable command from {}: {:?}", caller, text);
                deliver(sink, Reply::text(e.user_message())).await;
                return Outcome::InvalidInput(e);
            }
        };
        tracing::info!("Command from {}: {:?}", caller, command);

        match command {
            Command::Login(password) => self.login(caller, password.as_deref(), sink).await,
            Command::Help => self.help(sink).await,
            Command::Start => self.start(caller, sink).await,
            Command::Find(args) => self.find(caller, &args, sink).await,
            Command::Destinations => self.destinations(caller, sink).await,
            Command::Toggle(code) => self.toggle(caller, code.as_deref(), sink).await,
            Command::SelectAll => {
                self.bulk(caller, sink, "✅ All destinations enabled", DestinationStore::select_all)
                    .await
            }
            Command::DeselectAll => {
                self.bulk(caller, sink, "❌ All destinations disabled", DestinationStore::deselect_all)
                    .await
            }
            Command::ResetDefaults => {
                self.bulk(caller, sink, "🔄 Default destinations restored", DestinationStore::reset_to_default)
                    .await
            }
        }
    }

    async fn require_login(&self, caller: &CallerId, sink: &dyn MessageSink) -> bool {
        if self.gate.check(caller).is_ok() {
            return true;
        }
        deliver(
            sink,
            Reply::text("🚫 You need to authenticate with `/login <password>`."),
        )
        .await;
        false
    }

    async fn login(&self, caller: &CallerId, password: Option<&str>, sink: &dyn MessageSink) -> Outcome {
        if self.gate.is_authorized(caller) {
            deliver(sink, Reply::text("✅ You are already authenticated.")).await;
            return Outcome::Done;
        }
        let Some(password) = password else {
            deliver(sink, Reply::text("🔐 Usage: `/login <password>`")).await;
            return Outcome::InvalidInput(CommandError::MissingArgument("/login <password>"));
        };
        match self.gate.authorize(caller, password) {
            LoginOutcome::Denied => {
                deliver(sink, Reply::text("❌ Wrong password. Try again.")).await;
                Outcome::Unauthorized
            }
            LoginOutcome::Granted | LoginOutcome::AlreadyAuthorized => {
                deliver(sink, Reply::text("🔓 Access granted. You can use the bot now.")).await;
                Outcome::Done
            }
        }
    }

    async fn help(&self, sink: &dyn MessageSink) -> Outcome {
        let config = self.store.load();
        let text = formatting::help_text(
            config.active_count(),
            self.store.catalog().len(),
            self.query_builder.origin_codes(),
        );
        deliver(sink, Reply::text(text)).await;
        Outcome::Done
    }

    async fn start(&self, caller: &CallerId, sink: &dyn MessageSink) -> Outcome {
        if !self.require_login(caller, sink).await {
            return Outcome::Unauthorized;
        }
        // Repairs the destinations file before anything is searched.
        self.store.load();
        deliver(sink, formatting::start_menu()).await;
        Outcome::Done
    }

    async fn find(&self, caller: &CallerId, args: &[String], sink: &dyn MessageSink) -> Outcome {
        if !self.require_login(caller, sink).await {
            return Outcome::Unauthorized;
        }
        let today = chrono::Local::now().date_naive();
        let (month, year) = match resolve_month(args, today) {
            Ok(resolved) => resolved,
            Err(e) => {
                deliver(sink, Reply::text(e.user_message())).await;
                return Outcome::InvalidInput(e);
            }
        };

        let orchestrator =
            SearchOrchestrator::new(&self.store, self.client.as_ref(), &self.query_builder);
        let reporter = SinkReporter { sink };
        Outcome::Searched(orchestrator.run(month, year, &reporter).await)
    }

    async fn destinations(&self, caller: &CallerId, sink: &dyn MessageSink) -> Outcome {
        if !self.require_login(caller, sink).await {
            return Outcome::Unauthorized;
        }
        self.send_panel(sink).await;
        Outcome::Done
    }

    async fn toggle(&self, caller: &CallerId, code: Option<&str>, sink: &dyn MessageSink) -> Outcome {
        if !self.require_login(caller, sink).await {
            return Outcome::Unauthorized;
        }
        let Some(code) = code else {
            let e = CommandError::MissingArgument("/toggle Country:FR");
            deliver(sink, Reply::text(e.user_message())).await;
            return Outcome::InvalidInput(e);
        };

        match self.store.toggle(code) {
            Ok(active) => {
                let status = if active { "enabled" } else { "disabled" };
                let name = self.store.catalog().display_name(code);
                deliver(sink, Reply::text(format!("{} {}", name, status))).await;
            }
            Err(StoreError::UnknownDestination(_)) => {
                deliver(sink, Reply::text("❌ Destination not found")).await;
                return Outcome::Done;
            }
            Err(e) => {
                tracing::error!("Failed to toggle {}: {}", code, e);
                deliver(sink, Reply::text("⚠️ Could not save the destinations")).await;
            }
        }
        self.send_panel(sink).await;
        Outcome::Done
    }

    async fn bulk<F, T>(&self, caller: &CallerId, sink: &dyn MessageSink, done: &str, op: F) -> Outcome
    where
        F: FnOnce(&DestinationStore) -> Result<T, StoreError>,
    {
        if !self.require_login(caller, sink).await {
            return Outcome::Unauthorized;
        }
        let result = op(self.store.as_ref()).map(|_| ());
        match result {
            Ok(()) => deliver(sink, Reply::text(done)).await,
            Err(e) => {
                tracing::error!("Failed to update destinations: {}", e);
                deliver(sink, Reply::text("⚠️ Could not save the destinations")).await;
            }
        }
        self.send_panel(sink).await;
        Outcome::Done
    }

    async fn send_panel(&self, sink: &dyn MessageSink) {
        let config = self.store.load();
        deliver(sink, formatting::destinations_panel(&config, self.store.catalog())).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("/start").unwrap(), Command::Start);
        assert_eq!(
            parse_command("/find@weekender_bot Agosto 2026").unwrap(),
            Command::Find(args(&["Agosto", "2026"]))
        );
        assert_eq!(parse_command("toggle all_on").unwrap(), Command::SelectAll);
        assert_eq!(
            parse_command("toggle Country:FR").unwrap(),
            Command::Toggle(Some("Country:FR".into()))
        );
        assert_eq!(parse_command("reset_defaults").unwrap(), Command::ResetDefaults);
        assert_eq!(parse_command("LOGIN hunter2").unwrap(), Command::Login(Some("hunter2".into())));
        assert_eq!(parse_command("   "), Err(CommandError::Empty));
        assert!(matches!(parse_command("/fly"), Err(CommandError::UnknownCommand(_))));
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_from_name("Agosto"), Some(8));
        assert_eq!(month_from_name("august"), Some(8));
        assert_eq!(month_from_name("septiembre"), Some(9));
        assert_eq!(month_from_name("sept"), None);
    }

    #[test]
    fn test_resolve_month_year_rules() {
        let today = date(2026, 10, 16);
        assert_eq!(resolve_month(&args(&["diciembre"]), today).unwrap(), (12, 2026));
        assert_eq!(resolve_month(&args(&["octubre"]), today).unwrap(), (10, 2026));
        assert_eq!(resolve_month(&args(&["marzo"]), today).unwrap(), (3, 2027));
        assert_eq!(resolve_month(&args(&["marzo", "2030"]), today).unwrap(), (3, 2030));
        // A non-numeric year falls back to the default rule.
        assert_eq!(resolve_month(&args(&["marzo", "next"]), today).unwrap(), (3, 2027));
    }

    #[test]
    fn test_resolve_month_errors() {
        let today = date(2026, 1, 1);
        assert!(matches!(
            resolve_month(&[], today),
            Err(CommandError::MissingArgument(_))
        ));
        assert!(matches!(
            resolve_month(&args(&["smarch"]), today),
            Err(CommandError::UnknownMonth(_))
        ));
        assert!(CommandError::UnknownMonth("smarch".into())
            .user_message()
            .contains("enero"));
    }
}
