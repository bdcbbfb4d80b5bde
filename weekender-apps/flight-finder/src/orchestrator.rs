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

//! # Search Orchestrator
//!
//! One search run covers every weekend of a month, strictly in order and one
//! API call at a time:
//!
//! ```text
//! Start → validate inputs ─┬─ no weekends / no destinations → done
//!                          └─ for each weekend: build → progress → execute → parse
//!                                                        (network failure: warn, next)
//!                             → summary → done
//! ```

use async_trait::async_trait;

use crate::destinations_store::DestinationStore;
use crate::flights_query_builder::FlightQueryBuilder;
use crate::flights_results_parser::{parse_itineraries, Itinerary};
use crate::flights_search::{FlightSearch, NetworkError};
use crate::weekends::{weekends_of, Weekend};

/// Everything a search run tells its observer, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    NoWeekends {
        month: u32,
        year: i32,
    },
    NoDestinations,
    Started {
        month: u32,
        year: i32,
        weekend_count: usize,
        destinations: Vec<String>,
        max_price: u32,
    },
    Progress {
        index: usize,
        total: usize,
        weekend: Weekend,
    },
    WeekendFailed {
        weekend: Weekend,
        reason: String,
    },
    WeekendHeader {
        weekend: Weekend,
    },
    ItineraryFound {
        weekend: Weekend,
        itinerary: Itinerary,
    },
    Finished {
        found: usize,
        total: usize,
    },
}

#[async_trait]
pub trait SearchReporter: Send + Sync {
    async fn report(&self, event: SearchEvent);
}

#[derive(Debug, Clone)]
pub enum WeekendOutcome {
    Found(Vec<Itinerary>),
    NoOffers,
    NetworkFailure(NetworkError),
}

#[derive(Debug, Clone)]
pub struct WeekendResult {
    pub weekend: Weekend,
    pub outcome: WeekendOutcome,
}

#[derive(Debug, Clone)]
pub enum SearchSummary {
    NoWeekends,
    NoDestinations,
    Completed { results: Vec<WeekendResult> },
}

impl SearchSummary {
    pub fn results(&self) -> &[WeekendResult] {
        match self {
            SearchSummary::Completed { results } => results,
            _ => &[],
        }
    }

    pub fn total(&self) -> usize {
        self.results().len()
    }

    /// Weekends with at least one itinerary.
    pub fn found_count(&self) -> usize {
        self.results()
            .iter()
            .filter(|r| matches!(r.outcome, WeekendOutcome::Found(_)))
            .count()
    }

    pub fn network_failures(&self) -> usize {
        self.results()
            .iter()
            .filter(|r| matches!(r.outcome, WeekendOutcome::NetworkFailure(_)))
            .count()
    }
}

pub struct SearchOrchestrator<'a> {
    store: &'a DestinationStore,
    client: &'a dyn FlightSearch,
    query_builder: &'a FlightQueryBuilder,
}

impl<'a> SearchOrchestrator<'a> {
    pub fn new(
        store: &'a DestinationStore,
        client: &'a dyn FlightSearch,
        query_builder: &'a FlightQueryBuilder,
    ) -> Self {
        Self {
            store,
            client,
            query_builder,
        }
    }

    pub async fn run(&self, month: u32, year: i32, reporter: &dyn SearchReporter) -> SearchSummary {
        let weekends = weekends_of(month, year);
        if weekends.is_empty() {
            tracing::info!("No complete weekends in {}-{}", year, month);
            reporter.report(SearchEvent::NoWeekends { month, year }).await;
            return SearchSummary::NoWeekends;
        }

        let destinations = self.store.selected_codes();
        if destinations.is_empty() {
            tracing::info!("No active destinations, skipping search");
            reporter.report(SearchEvent::NoDestinations).await;
            return SearchSummary::NoDestinations;
        }

        let catalog = self.store.catalog();
        reporter
            .report(SearchEvent::Started {
                month,
                year,
                weekend_count: weekends.len(),
                destinations: destinations.iter().map(|c| catalog.display_name(c)).collect(),
                max_price: crate::flights_query_builder::MAX_PRICE,
            })
            .await;

        let total = weekends.len();
        let mut results = Vec::with_capacity(total);
        for (i, weekend) in weekends.into_iter().enumerate() {
            let outcome = self
                .search_weekend(i + 1, total, weekend, &destinations, reporter)
                .await;
            results.push(WeekendResult { weekend, outcome });
        }

        let summary = SearchSummary::Completed { results };
        tracing::info!(
            "Search for {}-{} done: {}/{} weekends with flights, {} failed",
            year,
            month,
            summary.found_count(),
            total,
            summary.network_failures()
        );
        reporter
            .report(SearchEvent::Finished {
                found: summary.found_count(),
                total,
            })
            .await;
        summary
    }

    async fn search_weekend(
        &self,
        index: usize,
        total: usize,
        weekend: Weekend,
        destinations: &[String],
        reporter: &dyn SearchReporter,
    ) -> WeekendOutcome {
        let request = self.query_builder.build(&weekend, destinations);

        reporter
            .report(SearchEvent::Progress {
                index,
                total,
                weekend,
            })
            .await;

        let response = match self.client.execute(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("API error for {}: {}", weekend, e);
                reporter
                    .report(SearchEvent::WeekendFailed {
                        weekend,
                        reason: e.kind.to_string(),
                    })
                    .await;
                return WeekendOutcome::NetworkFailure(e);
            }
        };

        let mut itineraries = parse_itineraries(&response);
        itineraries.truncate(request.result_limit as usize);
        if itineraries.is_empty() {
            tracing::info!("No offers for {}", weekend);
            return WeekendOutcome::NoOffers;
        }

        reporter.report(SearchEvent::WeekendHeader { weekend }).await;
        for itinerary in &itineraries {
            reporter
                .report(SearchEvent::ItineraryFound {
                    weekend,
                    itinerary: itinerary.clone(),
                })
                .await;
        }
        WeekendOutcome::Found(itineraries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flights_query_builder::SearchRequest;
    use crate::flights_search::NetworkErrorKind;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn offer(price: f64) -> Value {
        let segment = |from: &str, to: &str, time: &str| {
            json!({
                "source": {"localTime": time, "station": {"name": from}},
                "destination": {"station": {"name": to}},
                "carrier": {"name": "Ryanair"}
            })
        };
        json!({
            "outbound": {"sectorSegments": [{"segment": segment("Alicante", "Paris", "2025-08-01T18:35:00")}]},
            "inbound": {"sectorSegments": [{"segment": segment("Paris", "Alicante", "2025-08-03T20:10:00")}]},
            "price": {"amount": price}
        })
    }

    /// Answers weekend by weekend from a script; an exhausted script means no offers.
    struct ScriptedSearch {
        script: Mutex<Vec<Result<Value, NetworkErrorKind>>>,
        calls: Mutex<Vec<SearchRequest>>,
    }

    impl ScriptedSearch {
        fn new(mut script: Vec<Result<Value, NetworkErrorKind>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl FlightSearch for ScriptedSearch {
        async fn execute(&self, request: &SearchRequest) -> Result<Value, NetworkError> {
            self.calls.lock().unwrap().push(request.clone());
            match self.script.lock().unwrap().pop() {
                Some(Ok(value)) => Ok(value),
                Some(Err(kind)) => Err(NetworkError {
                    weekend: request.weekend,
                    kind,
                }),
                None => Ok(json!({"itineraries": []})),
            }
        }
    }

    #[derive(Default)]
    struct Recorder(Arc<Mutex<Vec<SearchEvent>>>);

    #[async_trait]
    impl SearchReporter for Recorder {
        async fn report(&self, event: SearchEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn store_with(dir: &TempDir, selected: &[&str]) -> DestinationStore {
        let store = DestinationStore::with_standard_catalog(dir.path().join("destinations.json"));
        store.deselect_all().unwrap();
        for code in selected {
            store.toggle(code).unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_the_run() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["Country:FR"]);
        let client = ScriptedSearch::new(vec![
            Ok(json!({"itineraries": [offer(40.0), offer(55.5)]})),
            Err(NetworkErrorKind::Timeout),
        ]);
        let builder = FlightQueryBuilder::default();
        let recorder = Recorder::default();

        let summary = SearchOrchestrator::new(&store, &client, &builder)
            .run(8, 2025, &recorder)
            .await;

        assert_eq!(summary.total(), 5);
        assert_eq!(summary.found_count(), 1);
        assert_eq!(summary.network_failures(), 1);
        assert_eq!(client.call_count(), 5);

        let events = recorder.0.lock().unwrap();
        assert!(matches!(events[0], SearchEvent::Started { weekend_count: 5, .. }));
        let found = events
            .iter()
            .filter(|e| matches!(e, SearchEvent::ItineraryFound { .. }))
            .count();
        assert_eq!(found, 2);
        assert!(matches!(
            events.last(),
            Some(SearchEvent::Finished { found: 1, total: 5 })
        ));
    }

    #[tokio::test]
    async fn test_weekends_in_chronological_order() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["Country:IT"]);
        let client = ScriptedSearch::new(Vec::new());
        let builder = FlightQueryBuilder::default();

        SearchOrchestrator::new(&store, &client, &builder)
            .run(10, 2025, &Recorder::default())
            .await;

        let calls = client.calls.lock().unwrap();
        let fridays: Vec<_> = calls.iter().map(|r| r.weekend.outbound_date).collect();
        let mut sorted = fridays.clone();
        sorted.sort();
        assert_eq!(fridays, sorted);
        assert!(calls.iter().all(|r| r.destination_codes == vec!["Country:IT".to_string()]));
    }

    #[tokio::test]
    async fn test_results_are_capped() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["Country:FR"]);
        let many: Vec<Value> = (0..8).map(|i| offer(20.0 + i as f64)).collect();
        let client = ScriptedSearch::new(vec![Ok(json!({ "itineraries": many }))]);
        let builder = FlightQueryBuilder::default();

        let summary = SearchOrchestrator::new(&store, &client, &builder)
            .run(8, 2025, &Recorder::default())
            .await;

        match &summary.results()[0].outcome {
            WeekendOutcome::Found(list) => {
                assert_eq!(list.len(), crate::flights_query_builder::RESULT_LIMIT as usize)
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_destinations_makes_no_calls() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &[]);
        let client = ScriptedSearch::new(Vec::new());
        let builder = FlightQueryBuilder::default();
        let recorder = Recorder::default();

        let summary = SearchOrchestrator::new(&store, &client, &builder)
            .run(8, 2025, &recorder)
            .await;

        assert!(matches!(summary, SearchSummary::NoDestinations));
        assert_eq!(client.call_count(), 0);
        assert_eq!(*recorder.0.lock().unwrap(), vec![SearchEvent::NoDestinations]);
    }

    #[tokio::test]
    async fn test_invalid_month_has_no_weekends() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, &["Country:FR"]);
        let client = ScriptedSearch::new(Vec::new());
        let builder = FlightQueryBuilder::default();

        let summary = SearchOrchestrator::new(&store, &client, &builder)
            .run(13, 2025, &Recorder::default())
            .await;
        assert!(matches!(summary, SearchSummary::NoWeekends));
        assert_eq!(client.call_count(), 0);
    }
}
