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

//! User-facing text for search events, menus and panels.

use crate::destinations_catalog::DestinationCatalog;
use crate::destinations_store::DestinationConfig;
use crate::flights_query_builder::{MAX_PRICE, RESULT_LIMIT};
use crate::flights_results_parser::Itinerary;
use crate::messaging::{Button, Keyboard, Reply};
use crate::orchestrator::SearchEvent;

pub const MONTH_TITLES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_title(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_TITLES.get(i as usize))
        .copied()
        .unwrap_or("?")
}

/// `a, b, c and 2 more`
fn summarize_names(names: &[String], shown: usize) -> String {
    let mut text = names.iter().take(shown).cloned().collect::<Vec<_>>().join(", ");
    if names.len() > shown {
        text.push_str(&format!(" and {} more", names.len() - shown));
    }
    text
}

pub fn render_itinerary(itinerary: &Itinerary) -> String {
    format!(
        "✈️ *{} → {}*\n🛫 Out: `{}` ({})\n🛬 Back: `{}` ({})\n💰 Price: *{} €*\n[🔗 Book]({})",
        itinerary.origin_name,
        itinerary.destination_name,
        itinerary.outbound_departure.format("%d/%m %H:%M"),
        itinerary.outbound_carrier,
        itinerary.inbound_departure.format("%d/%m %H:%M"),
        itinerary.inbound_carrier,
        itinerary.price,
        itinerary.booking_link,
    )
}

pub fn render_event(event: &SearchEvent) -> Reply {
    let text = match event {
        SearchEvent::NoWeekends { month, year } => {
            format!("❌ No complete weekends in {} {}", month_title(*month), year)
        }
        SearchEvent::NoDestinations => "⚠️ No active destinations. Use `/destinations` to set them up.\n\n\
             💡 Tip: at least one destination must be active to search for flights."
            .to_string(),
        SearchEvent::Started {
            month,
            year,
            weekend_count,
            destinations,
            max_price,
        } => format!(
            "🔍 Searching *Friday to Sunday* flights for *{} {}* under {}€...\n\
             📊 {} weekends found\n\
             🎯 Destinations: {}",
            month_title(*month),
            year,
            max_price,
            weekend_count,
            summarize_names(destinations, 3)
        ),
        SearchEvent::Progress {
            index,
            total,
            weekend,
        } => format!(
            "⏳ Processing weekend {}/{} ({})...",
            index,
            total,
            weekend.label()
        ),
        SearchEvent::WeekendFailed { weekend, .. } => {
            format!("⚠️ Error searching flights for {}", weekend.label())
        }
        SearchEvent::WeekendHeader { weekend } => {
            format!("🗓️ *Weekend of {}*:", weekend.label())
        }
        SearchEvent::ItineraryFound { itinerary, .. } => render_itinerary(itinerary),
        SearchEvent::Finished { found: 0, .. } => {
            "❌ No valid flights found for any weekend.".to_string()
        }
        SearchEvent::Finished { found, total } => format!(
            "✅ Search complete. Found flights for {}/{} weekends.",
            found, total
        ),
    };
    Reply::text(text)
}

pub fn start_menu() -> Reply {
    let months = MONTH_TITLES
        .iter()
        .map(|m| Button::new(*m, format!("find {}", m.to_lowercase())))
        .collect();
    let mut keyboard = Keyboard::grid(months, 3);
    keyboard.push_row(vec![Button::new("⚙️ Configure destinations", "destinations")]);

    Reply::text(format!(
        "🤖 *Weekend Flights*\n\n\
         ✈️ Finds flights under {}€ for every Friday-to-Sunday weekend of a month\n\n\
         📅 *Pick a month:*",
        MAX_PRICE
    ))
    .with_keyboard(keyboard)
}

pub fn destinations_panel(config: &DestinationConfig, catalog: &DestinationCatalog) -> Reply {
    let ordered = config.display_order(catalog);

    let buttons = ordered
        .iter()
        .map(|(code, active)| {
            let mark = if *active { "✅" } else { "❌" };
            Button::new(
                format!("{} {}", mark, catalog.display_name(code)),
                format!("toggle {}", code),
            )
        })
        .collect();
    let mut keyboard = Keyboard::grid(buttons, 2);
    keyboard.push_row(vec![
        Button::new("✅ Select all", "all_on"),
        Button::new("❌ Deselect all", "all_off"),
    ]);
    keyboard.push_row(vec![Button::new("🔄 Reset defaults", "reset")]);

    let active_names: Vec<String> = ordered
        .iter()
        .filter(|(_, active)| *active)
        .map(|(code, _)| catalog.display_name(code))
        .collect();

    let mut text = String::from("🛩️ *Configure destinations*\n\n");
    text.push_str(&format!(
        "📊 Active destinations: *{}/{}*\n\n",
        active_names.len(),
        config.len()
    ));
    if !active_names.is_empty() {
        let shown = if active_names.len() <= 5 { 5 } else { 3 };
        text.push_str(&format!("🎯 Active: {}\n\n", summarize_names(&active_names, shown)));
    }
    text.push_str("💡 Tap to toggle:");

    Reply::text(text).with_keyboard(keyboard)
}

pub fn help_text(active: usize, total: usize, origins: &[String]) -> String {
    format!(
        "🆘 *Help - Weekend Flights*\n\n\
         *Commands:*\n\
         • `/start` - Main menu\n\
         • `/find august [year]` - Search flights for a month\n\
         • `/destinations` - Configure destinations\n\
         • `/login <password>` - Authenticate\n\
         • `/help` - Show this help\n\n\
         *How it works:*\n\
         1. Pick a month with `/start`\n\
         2. Every Friday-to-Sunday weekend of that month is searched\n\
         3. The cheapest flights under {max}€ are listed\n\n\
         *Current settings:*\n\
         • Active destinations: {active}/{total}\n\
         • Origins: {origins}\n\
         • Flights: Friday 17:00-23:59 → Sunday 11:00-23:59\n\
         • Order: by price (cheapest first), at most {max}€\n\
         • Limit: {limit} flights per weekend\n\n\
         💡 *Tip:* set your preferred destinations with `/destinations`.",
        max = MAX_PRICE,
        active = active,
        total = total,
        origins = origins.join(", "),
        limit = RESULT_LIMIT,
    )
}
