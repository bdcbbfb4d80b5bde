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

//! # Flights Query Builder
//!
//! Side-effect free translation of a weekend and a destination selection
//! into a round-trip search request for the Kiwi.com cheap-flights API.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::weekends::Weekend;

pub const DEFAULT_ORIGINS: &[&str] = &["Airport:ALC", "Airport:RMU"];

/// Search policy shared by every weekend query.
pub const MAX_PRICE: u32 = 150;
pub const RESULT_LIMIT: u32 = 5;
pub const CURRENCY: &str = "eur";
pub const LOCALE: &str = "es";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Friday 17:00 to 23:59, local time.
const OUTBOUND_WINDOW: ((u32, u32), (u32, u32)) = ((17, 0), (23, 59));
/// Sunday 11:00 to 23:59, local time.
const INBOUND_WINDOW: ((u32, u32), (u32, u32)) = ((11, 0), (23, 59));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    PriceAscending,
}

impl SortKey {
    fn params(self) -> (&'static str, &'static str) {
        match self {
            SortKey::PriceAscending => ("PRICE", "ASCENDING"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    fn on(date: NaiveDate, ((h0, m0), (h1, m1)): ((u32, u32), (u32, u32))) -> Self {
        Self {
            start: date.and_time(hm(h0, m0)),
            end: date.and_time(hm(h1, m1)),
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// A fully specified search for one weekend. Built fresh per weekend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub weekend: Weekend,
    pub origin_codes: Vec<String>,
    pub destination_codes: Vec<String>,
    pub outbound_window: TimeWindow,
    pub inbound_window: TimeWindow,
    pub max_price: u32,
    pub result_limit: u32,
    pub sort_key: SortKey,
}

impl SearchRequest {
    /// Query parameters, in the order the API documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let (sort_by, sort_order) = self.sort_key.params();
        let fixed = |v: &str| v.to_string();

        vec![
            ("source", self.origin_codes.join(",")),
            ("destination", self.destination_codes.join(",")),
            ("currency", fixed(CURRENCY)),
            ("locale", fixed(LOCALE)),
            ("adults", fixed("1")),
            ("children", fixed("0")),
            ("infants", fixed("0")),
            ("handbags", fixed("1")),
            ("holdbags", fixed("0")),
            ("cabinClass", fixed("ECONOMY")),
            ("applyMixedClasses", fixed("false")),
            ("enableThrowAwayTicketing", fixed("false")),
            ("allowReturnFromDifferentCity", fixed("false")),
            ("allowChangeInboundDestination", fixed("false")),
            ("allowChangeInboundSource", fixed("false")),
            ("allowOvernightStopover", fixed("false")),
            ("enableTrueHiddenCity", fixed("false")),
            ("enableSelfTransfer", fixed("true")),
            ("allowDifferentStationConnection", fixed("true")),
            ("sortBy", fixed(sort_by)),
            ("sortOrder", fixed(sort_order)),
            (
                "outboundDepartureDateStart",
                self.outbound_window.start.format(TIMESTAMP_FORMAT).to_string(),
            ),
            (
                "outboundDepartureDateEnd",
                self.outbound_window.end.format(TIMESTAMP_FORMAT).to_string(),
            ),
            (
                "inboundDepartureDateStart",
                self.inbound_window.start.format(TIMESTAMP_FORMAT).to_string(),
            ),
            (
                "inboundDepartureDateEnd",
                self.inbound_window.end.format(TIMESTAMP_FORMAT).to_string(),
            ),
            ("transportTypes", fixed("FLIGHT")),
            ("limit", self.result_limit.to_string()),
            ("priceStart", fixed("0")),
            ("priceEnd", self.max_price.to_string()),
        ]
    }

    pub fn get_search_url(&self, endpoint: &str) -> String {
        let query = self
            .query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(&v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", endpoint, query)
    }
}

/// Builds [`SearchRequest`]s for a fixed set of origin airports.
#[derive(Debug, Clone)]
pub struct FlightQueryBuilder {
    origin_codes: Vec<String>,
}

impl Default for FlightQueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect())
    }
}

impl FlightQueryBuilder {
    pub fn new(origin_codes: Vec<String>) -> Self {
        Self { origin_codes }
    }

    pub fn origin_codes(&self) -> &[String] {
        &self.origin_codes
    }

    pub fn build(&self, weekend: &Weekend, destination_codes: &[String]) -> SearchRequest {
        SearchRequest {
            weekend: *weekend,
            origin_codes: self.origin_codes.clone(),
            destination_codes: destination_codes.to_vec(),
            outbound_window: TimeWindow::on(weekend.outbound_date, OUTBOUND_WINDOW),
            inbound_window: TimeWindow::on(weekend.inbound_date, INBOUND_WINDOW),
            max_price: MAX_PRICE,
            result_limit: RESULT_LIMIT,
            sort_key: SortKey::PriceAscending,
        }
    }
}
