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

//! # Flights Results Parser
//!
//! Side-effect free extraction of round-trip itineraries from a search API
//! JSON response. Malformed offers are dropped one by one; the parse as a
//! whole never fails.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

pub const BOOKING_HOME: &str = "https://www.kiwi.com";

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Amount in euro cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price {
    pub cents: i64,
}

impl Price {
    /// `None` only for NaN or infinite amounts.
    pub fn from_amount(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        Some(Self {
            cents: (amount * 100.0).round() as i64,
        })
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Itinerary {
    pub origin_name: String,
    pub destination_name: String,
    pub outbound_departure: NaiveDateTime,
    pub inbound_departure: NaiveDateTime,
    pub outbound_carrier: String,
    pub inbound_carrier: String,
    pub price: Price,
    pub booking_link: String,
}

/// Why a single offer was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OfferError {
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("unparsable date {0:?}")]
    BadDate(String),
    #[error("unparsable price {0}")]
    BadPrice(String),
}

/// Parse every offer under `itineraries`, keeping input order.
pub fn parse_itineraries(response: &Value) -> Vec<Itinerary> {
    let Some(offers) = response.get("itineraries").and_then(Value::as_array) else {
        tracing::debug!("Response has no itineraries list");
        return Vec::new();
    };

    let mut itineraries = Vec::with_capacity(offers.len());
    for (idx, offer) in offers.iter().enumerate() {
        match parse_single_itinerary(offer) {
            Ok(itinerary) => itineraries.push(itinerary),
            Err(e) => tracing::warn!("Dropping itinerary #{}: {}", idx, e),
        }
    }

    tracing::debug!("Parsed {} of {} itineraries", itineraries.len(), offers.len());
    itineraries
}

fn parse_single_itinerary(offer: &Value) -> Result<Itinerary, OfferError> {
    let outbound = field(offer, "/outbound/sectorSegments/0/segment")?;
    let inbound = field(offer, "/inbound/sectorSegments/0/segment")?;

    let outbound_departure = parse_local_time(text(outbound, "/source/localTime")?)?;
    let inbound_departure = parse_local_time(text(inbound, "/source/localTime")?)?;

    let origin_name = text(outbound, "/source/station/name")?.to_string();
    let destination_name = text(outbound, "/destination/station/name")?.to_string();
    let price = parse_price(field(offer, "/price/amount")?)?;

    let outbound_carrier = text(outbound, "/carrier/name")?.to_string();
    let inbound_carrier = text(inbound, "/carrier/name")?.to_string();

    Ok(Itinerary {
        origin_name,
        destination_name,
        outbound_departure,
        inbound_departure,
        outbound_carrier,
        inbound_carrier,
        price,
        booking_link: booking_link(offer),
    })
}

fn field<'a>(value: &'a Value, pointer: &'static str) -> Result<&'a Value, OfferError> {
    match value.pointer(pointer) {
        Some(Value::Null) | None => Err(OfferError::MissingField(pointer)),
        Some(v) => Ok(v),
    }
}

fn text<'a>(value: &'a Value, pointer: &'static str) -> Result<&'a str, OfferError> {
    field(value, pointer)?
        .as_str()
        .ok_or(OfferError::MissingField(pointer))
}

/// Accepts `2025-08-01T18:35:00` and longer variants; only minutes matter.
fn parse_local_time(raw: &str) -> Result<NaiveDateTime, OfferError> {
    let prefix = raw.get(..16).ok_or_else(|| OfferError::BadDate(raw.to_string()))?;
    NaiveDateTime::parse_from_str(prefix, LOCAL_TIME_FORMAT)
        .map_err(|_| OfferError::BadDate(raw.to_string()))
}

fn parse_price(amount: &Value) -> Result<Price, OfferError> {
    let parsed = match amount {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .and_then(Price::from_amount)
        .ok_or_else(|| OfferError::BadPrice(amount.to_string()))
}

fn booking_link(offer: &Value) -> String {
    match offer
        .pointer("/bookingOptions/edges/0/node/bookingUrl")
        .and_then(Value::as_str)
    {
        Some(path) => format!("{}{}", BOOKING_HOME, path),
        None => BOOKING_HOME.to_string(),
    }
}
