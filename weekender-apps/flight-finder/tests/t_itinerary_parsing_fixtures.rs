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

//! Parser tests against recorded Kiwi.com round-trip responses.

use std::path::Path;

use serde_json::Value;
use weekender_flight_finder::flights_results_parser::BOOKING_HOME;
use weekender_flight_finder::parse_itineraries;

fn load_fixture(name: &str) -> Value {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures-itineraries")
        .join(format!("{}.json", name));
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read fixture {}: {}", path.display(), e));
    serde_json::from_str(&raw).expect("fixture is valid JSON")
}

#[test]
fn test_incomplete_offer_is_dropped_rest_kept_in_order() {
    let parsed = parse_itineraries(&load_fixture("alc_to_fr_weekend"));

    // The Lyon offer has no inbound carrier.
    assert_eq!(parsed.len(), 2);
    let destinations: Vec<_> = parsed.iter().map(|i| i.destination_name.as_str()).collect();
    assert_eq!(destinations, vec!["Paris Beauvais–Tillé", "Nantes Atlantique"]);

    let prices: Vec<_> = parsed.iter().map(|i| i.price.cents).collect();
    assert_eq!(prices, vec![6312, 13100]);
}

#[test]
fn test_fields_are_extracted() {
    let parsed = parse_itineraries(&load_fixture("alc_to_fr_weekend"));
    let first = &parsed[0];

    assert_eq!(first.origin_name, "Alicante–Elche Miguel Hernández");
    assert_eq!(first.outbound_carrier, "Ryanair");
    assert_eq!(first.inbound_carrier, "Ryanair");
    assert_eq!(first.outbound_departure.format("%Y-%m-%d %H:%M").to_string(), "2025-08-01 19:05");
    assert_eq!(first.inbound_departure.format("%Y-%m-%d %H:%M").to_string(), "2025-08-03 21:40");
    assert_eq!(first.price.to_string(), "63.12");
    assert_eq!(first.booking_link, "https://www.kiwi.com/en/booking?token=abc");

    // No booking option at all falls back to the home page.
    assert_eq!(parsed[1].booking_link, BOOKING_HOME);
}

#[test]
fn test_empty_and_error_payloads() {
    assert!(parse_itineraries(&load_fixture("empty_results")).is_empty());
    assert!(parse_itineraries(&load_fixture("error_payload")).is_empty());
}
