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

//! # Destinations Catalog
//!
//! Static registry of the country-level destination filters understood by
//! the search API. The catalog is the universe of valid destination codes.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

const COUNTRY_PREFIX: &str = "Country:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationEntry {
    pub code: String,
    pub display_name: String,
    pub is_default_selected: bool,
}

impl DestinationEntry {
    pub fn new(code: &str, display_name: &str, is_default_selected: bool) -> Self {
        Self {
            code: code.to_string(),
            display_name: display_name.to_string(),
            is_default_selected,
        }
    }
}

/// Ordered, read-only set of destinations.
#[derive(Debug, Clone)]
pub struct DestinationCatalog {
    entries: Vec<DestinationEntry>,
}

static STANDARD_CATALOG: Lazy<DestinationCatalog> = Lazy::new(|| {
    DestinationCatalog::new(vec![
        DestinationEntry::new("Country:FR", "🇫🇷 France", true),
        DestinationEntry::new("Country:IT", "🇮🇹 Italy", true),
        DestinationEntry::new("Country:PT", "🇵🇹 Portugal", true),
        DestinationEntry::new("Country:GB", "🇬🇧 United Kingdom", true),
        DestinationEntry::new("Country:DE", "🇩🇪 Germany", true),
        DestinationEntry::new("Country:NL", "🇳🇱 Netherlands", true),
        DestinationEntry::new("Country:BE", "🇧🇪 Belgium", false),
        DestinationEntry::new("Country:CH", "🇨🇭 Switzerland", false),
        DestinationEntry::new("Country:AT", "🇦🇹 Austria", false),
        DestinationEntry::new("Country:CZ", "🇨🇿 Czechia", false),
        DestinationEntry::new("Country:PL", "🇵🇱 Poland", false),
        DestinationEntry::new("Country:HR", "🇭🇷 Croatia", false),
        DestinationEntry::new("Country:GR", "🇬🇷 Greece", false),
        DestinationEntry::new("Country:HU", "🇭🇺 Hungary", false),
        DestinationEntry::new("Country:DK", "🇩🇰 Denmark", false),
        DestinationEntry::new("Country:NO", "🇳🇴 Norway", false),
        DestinationEntry::new("Country:SE", "🇸🇪 Sweden", false),
        DestinationEntry::new("Country:FI", "🇫🇮 Finland", false),
        DestinationEntry::new("Country:IS", "🇮🇸 Iceland", true),
        DestinationEntry::new("Country:IE", "🇮🇪 Ireland", false),
    ])
});

impl DestinationCatalog {
    /// Build a catalog from entries. Later duplicates of a code are ignored.
    pub fn new(entries: Vec<DestinationEntry>) -> Self {
        let mut unique: Vec<DestinationEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if unique.iter().any(|e| e.code == entry.code) {
                tracing::warn!("Duplicate destination code in catalog: {}", entry.code);
                continue;
            }
            unique.push(entry);
        }
        Self { entries: unique }
    }

    /// The European country catalog the bot ships with.
    pub fn standard() -> &'static DestinationCatalog {
        &STANDARD_CATALOG
    }

    pub fn entries(&self) -> &[DestinationEntry] {
        &self.entries
    }

    pub fn list_codes(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.code.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_valid(&self, code: &str) -> bool {
        self.entries.iter().any(|e| e.code == code)
    }

    /// Friendly name for `code`; unknown codes fall back to the bare ISO code.
    pub fn display_name(&self, code: &str) -> String {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.display_name.clone())
            .unwrap_or_else(|| code.strip_prefix(COUNTRY_PREFIX).unwrap_or(code).to_string())
    }

    pub fn default_value(&self, code: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.is_default_selected)
    }

    pub fn default_selection(&self) -> BTreeMap<String, bool> {
        self.entries
            .iter()
            .map(|e| (e.code.clone(), e.is_default_selected))
            .collect()
    }
}
