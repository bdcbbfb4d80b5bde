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

// Library for weekender-flight-finder
// Friday-to-Sunday round-trip search over Kiwi.com (RapidAPI)

pub mod auth_gate;
pub mod commands;
pub mod config;
pub mod destinations_catalog;
pub mod destinations_store;
pub mod flights_query_builder;
pub mod flights_results_parser;
pub mod flights_search;
pub mod formatting;
pub mod messaging;
pub mod orchestrator;
pub mod weekends;

#[cfg(feature = "server")]
pub mod server;

pub use auth_gate::{AuthError, AuthGate, CallerId, LoginOutcome};
pub use commands::{CommandDispatcher, CommandError, Outcome};
pub use config::{ConfigError, Settings};
pub use destinations_catalog::{DestinationCatalog, DestinationEntry};
pub use destinations_store::{DestinationConfig, DestinationStore, StoreError};
pub use flights_query_builder::{FlightQueryBuilder, SearchRequest};
pub use flights_results_parser::{parse_itineraries, Itinerary, Price};
pub use flights_search::{FlightSearch, KiwiFlightsClient, NetworkError, NetworkErrorKind};
pub use messaging::{CollectingSink, MessageSink, Reply};
pub use orchestrator::{SearchEvent, SearchOrchestrator, SearchReporter, SearchSummary, WeekendOutcome};
pub use weekends::{weekends_of, Weekend};
