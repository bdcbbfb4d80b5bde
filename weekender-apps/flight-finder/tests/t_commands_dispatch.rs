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

//! Command surface: parsing, replies and keyboards for everything but search.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;
use weekender_flight_finder::{
    AuthGate, CallerId, CollectingSink, CommandDispatcher, DestinationStore, FlightQueryBuilder,
    FlightSearch, NetworkError, Outcome, Reply, SearchRequest,
};

/// Any call here is a test failure.
struct NoNetwork;

#[async_trait]
impl FlightSearch for NoNetwork {
    async fn execute(&self, request: &SearchRequest) -> Result<Value, NetworkError> {
        panic!("unexpected search for {}", request.weekend);
    }
}

fn setup() -> (TempDir, CommandDispatcher) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(DestinationStore::with_standard_catalog(
        dir.path().join("destinations.json"),
    ));
    let dispatcher = CommandDispatcher::new(
        store,
        Arc::new(NoNetwork),
        FlightQueryBuilder::new(vec!["Airport:VLC".to_string()]),
        Arc::new(AuthGate::new("pw").unwrap()),
    );
    (dir, dispatcher)
}

async fn send(dispatcher: &CommandDispatcher, caller: &CallerId, text: &str) -> (Outcome, Vec<Reply>) {
    let sink = CollectingSink::new();
    let outcome = dispatcher.dispatch(caller, text, &sink).await;
    (outcome, sink.take())
}

async fn login(dispatcher: &CommandDispatcher) -> CallerId {
    let caller = CallerId::new("local");
    send(dispatcher, &caller, "login pw").await;
    caller
}

#[tokio::test]
async fn test_help_is_not_gated() {
    let (_dir, dispatcher) = setup();
    let (outcome, replies) = send(&dispatcher, &CallerId::new("stranger"), "/help").await;

    assert!(matches!(outcome, Outcome::Done));
    let text = &replies[0].text;
    assert!(text.contains("`/find august [year]`"));
    assert!(text.contains("Origins: Airport:VLC"));
    assert!(text.contains("Active destinations: 7/20"));
    assert!(text.contains("Friday 17:00-23:59 → Sunday 11:00-23:59"));
}

#[tokio::test]
async fn test_login_replies() {
    let (_dir, dispatcher) = setup();
    let caller = CallerId::new("42");

    let (outcome, replies) = send(&dispatcher, &caller, "/login").await;
    assert!(matches!(outcome, Outcome::InvalidInput(_)));
    assert!(replies[0].text.contains("Usage"));

    send(&dispatcher, &caller, "/login pw").await;
    let (_, replies) = send(&dispatcher, &caller, "/login pw").await;
    assert_eq!(replies[0].text, "✅ You are already authenticated.");
    assert_eq!(dispatcher.gate().authorized_count(), 1);
}

#[tokio::test]
async fn test_start_menu() {
    let (_dir, dispatcher) = setup();
    let caller = login(&dispatcher).await;

    let (_, replies) = send(&dispatcher, &caller, "/start").await;
    let keyboard = replies[0].keyboard.as_ref().unwrap();
    let commands: Vec<_> = keyboard.buttons().map(|b| b.command.as_str()).collect();
    assert!(commands.contains(&"find august"));
    assert_eq!(commands.last(), Some(&"destinations"));
}

#[tokio::test]
async fn test_start_menu_commands_are_understood() {
    let (_dir, dispatcher) = setup();
    let caller = login(&dispatcher).await;
    dispatcher.store().deselect_all().unwrap();

    let (_, replies) = send(&dispatcher, &caller, "/start").await;
    for button in replies[0].keyboard.as_ref().unwrap().buttons() {
        // With no destinations a search stops before any network call.
        let (outcome, _) = send(&dispatcher, &caller, &button.command).await;
        assert!(
            !matches!(outcome, Outcome::InvalidInput(_) | Outcome::Unauthorized),
            "{} was rejected",
            button.command
        );
    }
}

#[tokio::test]
async fn test_toggle_reports_and_persists() {
    let (_dir, dispatcher) = setup();
    let caller = login(&dispatcher).await;

    let (_, replies) = send(&dispatcher, &caller, "toggle Country:IT").await;
    assert_eq!(replies[0].text, "🇮🇹 Italy disabled");
    assert_eq!(dispatcher.store().load().get("Country:IT"), Some(false));

    let panel = &replies[1];
    assert!(panel.text.contains("*6/20*"));
    let italy = panel
        .keyboard
        .as_ref()
        .unwrap()
        .buttons()
        .find(|b| b.command == "toggle Country:IT")
        .unwrap();
    assert_eq!(italy.label, "❌ 🇮🇹 Italy");

    let (_, replies) = send(&dispatcher, &caller, "toggle Country:IT").await;
    assert_eq!(replies[0].text, "🇮🇹 Italy enabled");
}

#[tokio::test]
async fn test_toggle_unknown_destination() {
    let (_dir, dispatcher) = setup();
    let caller = login(&dispatcher).await;
    let before = dispatcher.store().load();

    let (outcome, replies) = send(&dispatcher, &caller, "toggle Country:US").await;
    assert!(matches!(outcome, Outcome::Done));
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].text, "❌ Destination not found");
    assert_eq!(dispatcher.store().load(), before);

    let (outcome, _) = send(&dispatcher, &caller, "toggle").await;
    assert!(matches!(outcome, Outcome::InvalidInput(_)));
}

#[tokio::test]
async fn test_bulk_commands() {
    let (_dir, dispatcher) = setup();
    let caller = login(&dispatcher).await;

    let (_, replies) = send(&dispatcher, &caller, "toggle all_on").await;
    assert_eq!(replies[0].text, "✅ All destinations enabled");
    assert!(replies[1].text.contains("*20/20*"));

    let (_, replies) = send(&dispatcher, &caller, "all_off").await;
    assert!(replies[1].text.contains("*0/20*"));
    assert!(!replies[1].text.contains("🎯 Active"));

    let (_, replies) = send(&dispatcher, &caller, "/reset").await;
    assert_eq!(replies[0].text, "🔄 Default destinations restored");
    assert_eq!(dispatcher.store().load().active_count(), 7);
}

#[tokio::test]
async fn test_bad_input_never_panics() {
    let (_dir, dispatcher) = setup();
    let caller = login(&dispatcher).await;

    for text in ["", "   ", "/", "/fly to paris", "find", "find smarch", "héllo"] {
        let (outcome, replies) = send(&dispatcher, &caller, text).await;
        assert!(matches!(outcome, Outcome::InvalidInput(_)), "{:?}", text);
        assert_eq!(replies.len(), 1, "{:?}", text);
    }

    let (_, replies) = send(&dispatcher, &caller, "find smarch").await;
    assert!(replies[0].text.contains("Unknown month"));
}
