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

//! # Weekends
//!
//! Side-effect free calendar arithmetic: the Friday→Sunday pairs of a month.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// A Friday outbound date and the Sunday two days later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Weekend {
    pub outbound_date: NaiveDate,
    pub inbound_date: NaiveDate,
}

impl Weekend {
    /// Weekend starting on `friday`, if it is a Friday.
    pub fn starting(friday: NaiveDate) -> Option<Self> {
        if friday.weekday() != Weekday::Fri {
            return None;
        }
        let sunday = friday.checked_add_days(Days::new(2))?;
        Some(Self {
            outbound_date: friday,
            inbound_date: sunday,
        })
    }

    /// `dd/mm - dd/mm`
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.outbound_date.format("%d/%m"),
            self.inbound_date.format("%d/%m")
        )
    }
}

impl std::fmt::Display for Weekend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}–{}", self.outbound_date, self.inbound_date)
    }
}

/// All weekends whose Friday and Sunday both fall in `month` of `year`,
/// ascending. An invalid month yields no weekends.
pub fn weekends_of(month: u32, year: i32) -> Vec<Weekend> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        tracing::debug!("No such month: {}-{}", year, month);
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|day| day.month() == month)
        .filter_map(Weekend::starting)
        .filter(|weekend| weekend.inbound_date.month() == month)
        .collect()
}
