//! Report-wide IP aggregation.
//!
//! Collects every valid address from person and file source captures into
//! two pools: the complete pool (always listed) and the queried pool
//! (capped, enriched). Ordering is first-seen and deduplication is on the
//! whole occurrence tuple, so repeated captures of the same event collapse
//! while distinct events on one address all survive.

use crate::enrich::{Enricher, NOT_QUERIED};
use std::collections::HashSet;
use std::net::IpAddr;
use std::str::FromStr;
use tipline_core::report::ReportDocument;
use tipline_core::timefmt;

/// Enrichment cap. Everything beyond it is still listed, just not queried.
pub const QUERY_CAP: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Occurrence {
    pub date_time: Option<String>,
    pub port: Option<u32>,
    pub event: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpEntry {
    pub address: String,
    pub occurrences: Vec<Occurrence>,
}

/// Aggregated addresses in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpPools {
    pub entries: Vec<IpEntry>,
}

impl IpPools {
    /// Walk person captures, then file captures, keeping each distinct
    /// (address, date_time, port, event) tuple once.
    pub fn collect(doc: &ReportDocument) -> Self {
        let mut seen: HashSet<(String, Option<String>, Option<u32>, Option<String>)> =
            HashSet::new();
        let mut entries: Vec<IpEntry> = Vec::new();

        let captures = doc
            .persons()
            .iter()
            .flat_map(|p| p.source_captures())
            .chain(doc.files().iter().flat_map(|f| f.source_captures()));

        for capture in captures {
            let Some(value) = capture.value.as_deref() else {
                continue;
            };
            if IpAddr::from_str(value).is_err() {
                continue;
            }
            let key = (
                value.to_string(),
                capture.date_time.clone(),
                capture.port,
                capture.event_name.clone(),
            );
            if !seen.insert(key) {
                continue;
            }
            let occurrence = Occurrence {
                date_time: capture.date_time.clone(),
                port: capture.port,
                event: capture.event_name.clone(),
            };
            match entries.iter_mut().find(|e| e.address == value) {
                Some(entry) => entry.occurrences.push(occurrence),
                None => entries.push(IpEntry {
                    address: value.to_string(),
                    occurrences: vec![occurrence],
                }),
            }
        }

        IpPools { entries }
    }

    pub fn unique_count(&self) -> usize {
        self.entries.len()
    }

    pub fn exceeds_cap(&self) -> bool {
        self.unique_count() > QUERY_CAP
    }

    /// Queried pool: every address when `query_all` or under the cap,
    /// otherwise the first fifty in first-seen order.
    pub fn queried_addresses(&self, query_all: bool) -> HashSet<String> {
        let take = if query_all || !self.exceeds_cap() {
            self.entries.len()
        } else {
            QUERY_CAP
        };
        self.entries
            .iter()
            .take(take)
            .map(|e| e.address.clone())
            .collect()
    }
}

/// Full aggregate analysis section appended after the narrative report.
pub fn analysis_section(
    pools: &IpPools,
    queried: &HashSet<String>,
    enricher: &Enricher<'_>,
) -> String {
    let mut section = String::from("IP ADDRESS ANALYSIS:\n");
    section.push_str(&format!(
        "Total Unique IP Addresses: {}\n\n",
        pools.unique_count()
    ));

    for entry in &pools.entries {
        section.push_str(&format!("IP Address: {}\n", entry.address));
        section.push_str("Occurrences:\n");
        for occ in &entry.occurrences {
            let date_time = match occ.date_time.as_deref() {
                Some(raw) if !raw.is_empty() && raw != "N/A" => timefmt::display_datetime(raw),
                _ => "N/A".to_string(),
            };
            section.push_str(&format!("      - Date/Time: {date_time}\n"));
            if let Some(port) = occ.port {
                section.push_str(&format!("        Port: {port}\n"));
            }
            let event = occ.event.as_deref().filter(|e| !e.is_empty()).unwrap_or("N/A");
            section.push_str(&format!("        IP Event: {event}\n"));
        }

        if queried.contains(&entry.address) {
            section.push('\n');
            section.push_str(&enricher.geo_block(&entry.address, "        "));
            section.push('\n');
            section.push_str(&enricher.registry_block(&entry.address, "        "));
        } else {
            section.push_str(&format!(
                "\nMaxMind Geolocation Data:\n        {NOT_QUERIED}\n"
            ));
            section.push_str(&format!("\nARIN WHOIS Data:\n        {NOT_QUERIED}\n"));
        }

        section.push_str(&format!("\n{}\n\n", "=".repeat(50)));
    }

    section
}
