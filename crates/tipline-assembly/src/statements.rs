//! Statement registry: boilerplate paragraphs keyed by name, routed into
//! ten insertion slots by a key prefix, optionally gated by a condition.
//!
//! Four built-in defaults ("bingimage", "ip_intro", "meta", "xcorp") are
//! always available, can be overridden but never deleted, and are injected
//! at fixed points of the report rather than through slots.

use crate::condition::Condition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tipline_core::error::PersistError;

// ============================================================================
// Slots
// ============================================================================

/// Insertion point of a custom statement, encoded as a key prefix. Keys
/// without a recognized prefix fall into the end-of-report slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Beginning,
    BeforeIncident,
    AfterIncident,
    BeforeSuspect,
    AfterSuspect,
    BeforeEvidence,
    AfterEvidence,
    BeforeIp,
    AfterIp,
    End,
}

impl Slot {
    pub const ALL: [Slot; 10] = [
        Slot::Beginning,
        Slot::BeforeIncident,
        Slot::AfterIncident,
        Slot::BeforeSuspect,
        Slot::AfterSuspect,
        Slot::BeforeEvidence,
        Slot::AfterEvidence,
        Slot::BeforeIp,
        Slot::AfterIp,
        Slot::End,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            Slot::Beginning => "at_beginning:",
            Slot::BeforeIncident => "before_incident:",
            Slot::AfterIncident => "after_incident:",
            Slot::BeforeSuspect => "before_suspect:",
            Slot::AfterSuspect => "after_suspect:",
            Slot::BeforeEvidence => "before_evidence:",
            Slot::AfterEvidence => "after_evidence:",
            Slot::BeforeIp => "before_ip:",
            Slot::AfterIp => "after_ip:",
            Slot::End => "",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Slot::Beginning => "At Beginning of Report",
            Slot::BeforeIncident => "Before Incident Summary",
            Slot::AfterIncident => "After Incident Summary",
            Slot::BeforeSuspect => "Before Suspect Information",
            Slot::AfterSuspect => "After Suspect Information",
            Slot::BeforeEvidence => "Before Evidence Summary",
            Slot::AfterEvidence => "After Evidence Summary",
            Slot::BeforeIp => "Before IP Address Analysis",
            Slot::AfterIp => "After IP Address Analysis",
            Slot::End => "At End of Report",
        }
    }

    /// Slot a key belongs to, and the remaining sub-key.
    pub fn of_key(key: &str) -> (Slot, &str) {
        for slot in Slot::ALL {
            let prefix = slot.prefix();
            if !prefix.is_empty() {
                if let Some(rest) = key.strip_prefix(prefix) {
                    return (slot, rest.trim());
                }
            }
        }
        (Slot::End, key.trim())
    }
}

// ============================================================================
// Entries
// ============================================================================

/// Stored statement. Older statement files hold a bare string; current
/// files hold text plus condition. The bare form reads as unconditional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatementEntry {
    Full {
        text: String,
        #[serde(default)]
        condition: String,
    },
    Legacy(String),
}

impl StatementEntry {
    pub fn text(&self) -> &str {
        match self {
            StatementEntry::Full { text, .. } => text,
            StatementEntry::Legacy(text) => text,
        }
    }

    pub fn condition(&self) -> &str {
        match self {
            StatementEntry::Full { condition, .. } => condition,
            StatementEntry::Legacy(_) => "",
        }
    }

    fn passes(&self, esp_name: &str) -> bool {
        let cond = self.condition();
        cond.is_empty() || Condition::evaluate(cond, esp_name)
    }
}

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("built-in statement {0:?} cannot be removed")]
    ProtectedDefault(String),
    #[error("no statement named {0:?}")]
    UnknownKey(String),
}

// ============================================================================
// Registry
// ============================================================================

pub const DEFAULT_KEYS: [&str; 4] = ["bingimage", "ip_intro", "meta", "xcorp"];

const DEFAULT_BINGIMAGE: &str = "\"BingImage\" (referred to as Visual Search) is a service of Microsoft's Bing search engine that provides similar images to an image provided by the user. This image can be provided either via upload or as a URL. The date/time provided indicates the time at which the image was received and evaluated by the BingImage service.";

const DEFAULT_IP_INTRO: &str = "These following IP addresses were reported in the Cybertip. Each IP address was queried through the American Registry for Internet Numbers (ARIN) and Maxmind.com. ARIN is responsible for managing and distributing Internet number resources, like IP addresses, in North America. It is one of the five Regional Internet Registries (RIRs) worldwide, working under the global Internet Assigned Numbers Authority (IANA). ARIN maintains a public database (WHOIS) which tracks who holds what IP address. Maxmind is a company that provides a webservice IP geolocation tool. It should be noted that the estimated geographical location obtained from Maxmind\u{2019}s geolocation database are not always accurate, particularly when resolving IP addresses utilized by cellular providers, as a mobile user\u{2019}s location is constantly changing. The exact location of where an IP addresses geographically resolves to, along with the subscriber details, can only be obtained through legal process served to the provider.";

const DEFAULT_META: &str = "When Meta responds \"Yes\" it means the contents of the file were viewed by an employee or contractor at Meta concurrently with or immediately before the file was submitted to NCMEC. When Meta responds \"No\" it means that while the contents of the file were not reviewed concurrently with or immediately before the file was submitted to NCMEC, historically at least one employee or contractor at Meta viewed a file whose hash matched the hash of the reported content and determined it contained apparent child pornography.\n\nFor video files, when Meta responds \u{201c}Yes\u{201d} it means the entire contents of the file were viewed by an employee or contractor at Meta concurrently with or immediately before the file was submitted to NCMEC. When Meta responds \u{201c}No\u{201d} it means that while the contents of the file were not reviewed concurrently with or immediately before the file was submitted to NCMEC, historically at least one employee or contractor at Meta viewed a file and determined it contained apparent child pornography, and that file's hash matched a violating portion or the entirety of the reported content.";

const DEFAULT_XCORP: &str = "X retains different types of information for different time periods. Given X's real-time nature, some information may only be stored for a very brief period of time.\n\nFor accounts reported to NCMEC, X provides a copy of the preserved files, within the CyberTip report in the form of a .zip file which may be uploaded in multiple parts.\n\nAll times reported by X are in UTC.\n\nThe incident date/time is the timestamp from the most recent reported Post; however, if a Post is not reported, then the incident date/time will represent the account creation timestamp.\n\nX logs IPs in connection with user authentications to X (i.e., sessions, which may span multiple days) rather than individual Post postings; as a result, X is unable to provide insight into which IP address a specific Post was posted from. While X does not capture IPs for individual Posts, X provided a log of IPs for the timeframe relevant to the report.\n\nAll IP addresses in this report are associated with log-ins to the specific user account identified in the report.";

fn builtin_text(key: &str) -> Option<&'static str> {
    match key {
        "bingimage" => Some(DEFAULT_BINGIMAGE),
        "ip_intro" => Some(DEFAULT_IP_INTRO),
        "meta" => Some(DEFAULT_META),
        "xcorp" => Some(DEFAULT_XCORP),
        _ => None,
    }
}

pub fn is_default_key(key: &str) -> bool {
    DEFAULT_KEYS.contains(&key)
}

/// All statements known to a session, defaults included. Keys are kept in
/// a BTreeMap so every traversal is in sorted-key order and rendering is
/// deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementRegistry {
    entries: BTreeMap<String, StatementEntry>,
}

impl Default for StatementRegistry {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        for key in DEFAULT_KEYS {
            entries.insert(
                key.to_string(),
                StatementEntry::Full {
                    text: builtin_text(key).unwrap_or("").to_string(),
                    condition: String::new(),
                },
            );
        }
        StatementRegistry { entries }
    }
}

impl StatementRegistry {
    /// Load from a statement file, merging stored entries over the
    /// defaults. A missing file yields the defaults alone.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let mut registry = StatementRegistry::default();
        if !path.exists() {
            return Ok(registry);
        }
        let raw = std::fs::read_to_string(path).map_err(|source| PersistError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let stored: BTreeMap<String, StatementEntry> =
            serde_json::from_str(&raw).map_err(|source| PersistError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        registry.entries.extend(stored);
        Ok(registry)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        let raw = serde_json::to_string_pretty(&self.entries)
            .map_err(|source| PersistError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        std::fs::write(path, raw).map_err(|source| PersistError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entry(&self, key: &str) -> Option<&StatementEntry> {
        self.entries.get(key)
    }

    /// Statement text with built-in fallback, so a default key always
    /// resolves even if its entry was damaged.
    pub fn text_of(&self, key: &str) -> &str {
        self.entries
            .get(key)
            .map(StatementEntry::text)
            .or_else(|| builtin_text(key))
            .unwrap_or("")
    }

    pub fn upsert(&mut self, key: String, text: String, condition: String) {
        self.entries.insert(key, StatementEntry::Full { text, condition });
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StatementError> {
        if is_default_key(key) {
            return Err(StatementError::ProtectedDefault(key.to_string()));
        }
        self.entries
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StatementError::UnknownKey(key.to_string()))
    }

    pub fn select_all(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    fn slot_entries<'a>(
        &'a self,
        slot: Slot,
        selected: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = (&'a str, &'a StatementEntry)> {
        self.entries
            .iter()
            .filter(move |(key, _)| {
                !is_default_key(key)
                    && selected.contains(*key)
                    && Slot::of_key(key).0 == slot
            })
            .map(|(key, entry)| (key.as_str(), entry))
    }

    /// Rendered block for one interior slot: condition-passing statements
    /// in key order, `SUBKEY: text` when a sub-key names the statement,
    /// wrapped in blank lines. Empty slots contribute nothing.
    pub fn render_slot(&self, slot: Slot, selected: &BTreeSet<String>, esp_name: &str) -> String {
        debug_assert!(slot != Slot::End, "end slot has its own heading form");
        let mut parts = Vec::new();
        for (key, entry) in self.slot_entries(slot, selected) {
            if !entry.passes(esp_name) {
                continue;
            }
            let sub_key = Slot::of_key(key).1;
            if sub_key.is_empty() {
                parts.push(entry.text().to_string());
            } else {
                parts.push(format!("{}: {}", sub_key.to_uppercase(), entry.text()));
            }
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("\n\n{}\n\n", parts.join("\n\n"))
        }
    }

    /// End-of-report block under a "CUSTOM STATEMENTS:" heading. Here the
    /// whole key is the display name.
    pub fn render_end(&self, selected: &BTreeSet<String>, esp_name: &str) -> String {
        let mut parts = Vec::new();
        for (key, entry) in self.slot_entries(Slot::End, selected) {
            if !entry.passes(esp_name) {
                continue;
            }
            parts.push(format!("{}: {}", key.to_uppercase(), entry.text()));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("\n\nCUSTOM STATEMENTS:\n{}", parts.join("\n\n"))
        }
    }

    /// Uppercased `SUBKEY:` strings for every selected custom statement,
    /// used by the styled renderer to promote them to headers.
    pub fn custom_header_lines(&self, selected: &BTreeSet<String>) -> Vec<String> {
        let mut headers = Vec::new();
        for key in self.entries.keys() {
            if is_default_key(key) || !selected.contains(key) {
                continue;
            }
            let sub_key = Slot::of_key(key).1;
            if !sub_key.is_empty() {
                headers.push(format!("{}:", sub_key.to_uppercase()));
            }
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(entries: &[(&str, &str, &str)]) -> (StatementRegistry, BTreeSet<String>) {
        let mut registry = StatementRegistry::default();
        for (key, text, condition) in entries {
            registry.upsert(key.to_string(), text.to_string(), condition.to_string());
        }
        let selected = registry.select_all();
        (registry, selected)
    }

    #[test]
    fn key_prefixes_route_to_slots() {
        assert_eq!(Slot::of_key("at_beginning: warrant"), (Slot::Beginning, "warrant"));
        assert_eq!(Slot::of_key("before_ip:note"), (Slot::BeforeIp, "note"));
        assert_eq!(Slot::of_key("closing remarks"), (Slot::End, "closing remarks"));
    }

    #[test]
    fn defaults_are_present_and_protected() {
        let mut registry = StatementRegistry::default();
        for key in DEFAULT_KEYS {
            assert!(!registry.text_of(key).is_empty(), "{key} missing");
        }
        assert!(matches!(
            registry.remove("meta"),
            Err(StatementError::ProtectedDefault(_))
        ));
        assert!(matches!(
            registry.remove("nope"),
            Err(StatementError::UnknownKey(_))
        ));
    }

    #[test]
    fn slot_rendering_sorts_formats_and_wraps() {
        let (registry, selected) = registry_with(&[
            ("at_beginning:zeta", "Second.", ""),
            ("at_beginning:alpha", "First.", ""),
            ("at_beginning:", "Bare text.", ""),
        ]);
        let block = registry.render_slot(Slot::Beginning, &selected, "Facebook");
        assert_eq!(
            block,
            "\n\nBare text.\n\nALPHA: First.\n\nZETA: Second.\n\n"
        );
    }

    #[test]
    fn unselected_and_failing_statements_are_skipped() {
        let (registry, mut selected) = registry_with(&[
            ("before_ip:kept", "Kept.", r#"esp_name == "Facebook""#),
            ("before_ip:gated", "Gated.", r#"esp_name == "Snapchat""#),
            ("before_ip:broken", "Broken.", "esp_name =="),
            ("before_ip:dropped", "Dropped.", ""),
        ]);
        selected.remove("before_ip:dropped");
        let block = registry.render_slot(Slot::BeforeIp, &selected, "Facebook, Inc.");
        assert_eq!(block, "\n\nKEPT: Kept.\n\n");
    }

    #[test]
    fn end_slot_gets_custom_statements_heading() {
        let (registry, selected) = registry_with(&[("legal note", "Text here.", "")]);
        assert_eq!(
            registry.render_end(&selected, ""),
            "\n\nCUSTOM STATEMENTS:\nLEGAL NOTE: Text here."
        );
        let (empty, none) = registry_with(&[]);
        assert_eq!(empty.render_end(&none, ""), "");
    }

    #[test]
    fn legacy_entries_deserialize_as_unconditional() {
        let raw = r#"{"after_ip:old": "Plain string.", "after_ip:new": {"text": "T", "condition": "esp_name == \"Kik\""}}"#;
        let entries: BTreeMap<String, StatementEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(entries["after_ip:old"].text(), "Plain string.");
        assert_eq!(entries["after_ip:old"].condition(), "");
        assert_eq!(entries["after_ip:new"].condition(), r#"esp_name == "Kik""#);
    }

    #[test]
    fn load_merges_over_defaults_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statements.json");

        let missing = StatementRegistry::load(&path).unwrap();
        assert_eq!(missing.keys().count(), DEFAULT_KEYS.len());

        let mut registry = StatementRegistry::default();
        registry.upsert("meta".to_string(), "Overridden.".to_string(), String::new());
        registry.upsert("at_beginning:x".to_string(), "Hi.".to_string(), String::new());
        registry.save(&path).unwrap();

        let reloaded = StatementRegistry::load(&path).unwrap();
        assert_eq!(reloaded.text_of("meta"), "Overridden.");
        assert_eq!(reloaded.text_of("at_beginning:x"), "Hi.");
        assert_eq!(reloaded.text_of("xcorp"), registry.text_of("xcorp"));
    }

    #[test]
    fn custom_header_lines_uppercase_sub_keys() {
        let (registry, selected) = registry_with(&[
            ("before_evidence:chain of custody", "C.", ""),
            ("end note", "E.", ""),
        ]);
        let headers = registry.custom_header_lines(&selected);
        assert!(headers.contains(&"CHAIN OF CUSTODY:".to_string()));
        // End-slot keys have no sub-key prefix form but still get one.
        assert!(headers.contains(&"END NOTE:".to_string()));
    }
}
