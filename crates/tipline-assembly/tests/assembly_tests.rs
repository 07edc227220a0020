//! End-to-end assembly tests over in-memory documents and fake lookups.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use tipline_assembly::assemble::{assemble, AssemblyOptions};
use tipline_assembly::enrich::{
    Enricher, GeoLookup, GeoRecord, LookupError, RegistryLookup, RegistryRecord,
};
use tipline_assembly::ip::{IpPools, QUERY_CAP};
use tipline_assembly::statements::StatementRegistry;
use tipline_core::report::ReportDocument;

#[derive(Default)]
struct FakeLookups {
    geo: HashMap<String, GeoRecord>,
    orgs: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl GeoLookup for FakeLookups {
    fn geolocate(&self, ip: &str) -> Result<GeoRecord, LookupError> {
        self.calls.borrow_mut().push(ip.to_string());
        Ok(self.geo.get(ip).cloned().unwrap_or_default())
    }
}

impl RegistryLookup for FakeLookups {
    fn whois(&self, ip: &str) -> Result<RegistryRecord, LookupError> {
        Ok(RegistryRecord {
            organization: self.orgs.get(ip).cloned(),
        })
    }
}

fn doc(raw: serde_json::Value) -> ReportDocument {
    serde_json::from_value(raw).unwrap()
}

fn options() -> AssemblyOptions {
    AssemblyOptions {
        investigator_name: "J. Smith".to_string(),
        investigator_title: "Detective".to_string(),
        query_all_ips: false,
        execution_date: Some("03-01-2024".to_string()),
    }
}

fn assemble_full(
    document: &ReportDocument,
    registry: &StatementRegistry,
    selected: &BTreeSet<String>,
    lookups: &FakeLookups,
    opts: &AssemblyOptions,
) -> String {
    let pools = IpPools::collect(document);
    let enricher = Enricher::new(lookups, lookups);
    assemble(document, registry, selected, &pools, &enricher, opts).full_text()
}

#[test]
fn empty_document_still_has_all_four_section_headers() {
    let document = doc(serde_json::json!({}));
    let registry = StatementRegistry::default();
    let selected = registry.select_all();
    let lookups = FakeLookups::default();

    let text = assemble_full(&document, &registry, &selected, &lookups, &options());
    for header in [
        "INCIDENT SUMMARY:",
        "SUSPECT INFORMATION:",
        "EVIDENCE SUMMARY:",
        "IP ADDRESS ANALYSIS:",
    ] {
        assert!(text.contains(header), "missing {header}");
    }
    assert!(text.contains("Total Unique IP Addresses: 0"));
    assert!(text.contains("reviewed Cybertip #N/A"));
}

#[test]
fn intro_line_names_investigator_and_dates() {
    let document = doc(serde_json::json!({
        "reportId": "55512345",
        "dateReceived": "2024-02-20T08:00:00Z"
    }));
    let registry = StatementRegistry::default();
    let selected = registry.select_all();
    let lookups = FakeLookups::default();

    let text = assemble_full(&document, &registry, &selected, &lookups, &options());
    assert!(text.starts_with(
        "On 03-01-2024, I, Detective J. Smith, reviewed Cybertip #55512345, which was received \
         by the National Center for Missing and Exploited Children (NCMEC) on 02/20/2024."
    ));
}

#[test]
fn assembly_is_byte_identical_across_runs() {
    let document = doc(serde_json::json!({
        "reportId": "1",
        "reportedInformation": {
            "reportingEsp": { "espName": "Facebook" },
            "reportedPeople": { "reportedPersons": [{
                "firstName": "Pat",
                "sourceInformation": { "sourceCaptures": [
                    { "value": "1.2.3.4", "dateTime": "2024-01-01T00:00:00Z", "port": 80, "eventName": "Login" }
                ] }
            }] },
            "uploadedFiles": { "uploadedFiles": [ { "filename": "a.jpg", "viewedByEsp": true } ] }
        }
    }));
    let mut registry = StatementRegistry::default();
    registry.upsert("after_ip:note".to_string(), "Reviewed.".to_string(), String::new());
    let selected = registry.select_all();
    let lookups = FakeLookups::default();

    let first = assemble_full(&document, &registry, &selected, &lookups, &options());
    let second = assemble_full(&document, &registry, &selected, &lookups, &options());
    assert_eq!(first, second);
}

#[test]
fn seventy_five_addresses_cap_at_fifty_queries_but_list_all() {
    let captures: Vec<serde_json::Value> = (0..75)
        .map(|i| {
            serde_json::json!({
                "value": format!("10.1.{}.{}", i / 250, i % 250),
                "dateTime": "2024-01-01T00:00:00Z",
                "eventName": "Login"
            })
        })
        .collect();
    let document = doc(serde_json::json!({
        "reportedInformation": {
            "reportedPeople": { "reportedPersons": [{
                "sourceInformation": { "sourceCaptures": captures }
            }] }
        }
    }));
    let registry = StatementRegistry::default();
    let selected = registry.select_all();
    let lookups = FakeLookups::default();

    let text = assemble_full(&document, &registry, &selected, &lookups, &options());
    assert!(text.contains("Total Unique IP Addresses: 75"));
    // Every address is listed even past the cap.
    assert!(text.contains("IP Address: 10.1.0.0"));
    assert!(text.contains("IP Address: 10.1.0.74"));
    // Only the first fifty were queried.
    assert_eq!(lookups.calls.borrow().len(), QUERY_CAP);
    assert_eq!(
        text.matches("Not queried (IP limit applied)").count(),
        2 * 25
    );
}

#[test]
fn duplicate_captures_collapse_across_persons_and_files() {
    let capture = serde_json::json!({
        "value": "9.9.9.9", "dateTime": "2024-01-01T00:00:00Z", "port": 443, "eventName": "Login"
    });
    let document = doc(serde_json::json!({
        "reportedInformation": {
            "reportedPeople": { "reportedPersons": [
                { "sourceInformation": { "sourceCaptures": [capture.clone()] } },
                { "sourceInformation": { "sourceCaptures": [capture.clone()] } }
            ] },
            "uploadedFiles": { "uploadedFiles": [
                { "sourceInformation": { "sourceCaptures": [capture] } }
            ] }
        }
    }));
    let pools = IpPools::collect(&document);
    assert_eq!(pools.unique_count(), 1);
    assert_eq!(pools.entries[0].occurrences.len(), 1);
}

#[test]
fn file_numbers_run_sequentially_even_with_missing_names() {
    let document = doc(serde_json::json!({
        "reportedInformation": {
            "uploadedFiles": { "uploadedFiles": [
                { "filename": "a.jpg" },
                { "filename": "" },
                { "filename": "c.jpg" }
            ] }
        }
    }));
    let registry = StatementRegistry::default();
    let selected = registry.select_all();
    let lookups = FakeLookups::default();

    let text = assemble_full(&document, &registry, &selected, &lookups, &options());
    let n1 = text.find("FILE NUMBER 1:").unwrap();
    let n2 = text.find("FILE NUMBER 2:").unwrap();
    let n3 = text.find("FILE NUMBER 3:").unwrap();
    assert!(n1 < n2 && n2 < n3);
    assert!(!text.contains("FILE NUMBER 4:"));
}

#[test]
fn statements_land_in_their_slots_in_order() {
    let document = doc(serde_json::json!({ "reportId": "7" }));
    let mut registry = StatementRegistry::default();
    registry.upsert(
        "at_beginning:preface".to_string(),
        "Opening words.".to_string(),
        String::new(),
    );
    registry.upsert(
        "before_evidence:custody".to_string(),
        "Chain of custody note.".to_string(),
        String::new(),
    );
    registry.upsert(
        "closing".to_string(),
        "Final remark.".to_string(),
        String::new(),
    );
    let selected = registry.select_all();
    let lookups = FakeLookups::default();

    let text = assemble_full(&document, &registry, &selected, &lookups, &options());
    let preface = text.find("PREFACE: Opening words.").unwrap();
    let intro = text.find("reviewed Cybertip #7").unwrap();
    let custody = text.find("CUSTODY: Chain of custody note.").unwrap();
    let evidence = text.find("EVIDENCE SUMMARY:").unwrap();
    let closing = text.find("CUSTOM STATEMENTS:\nCLOSING: Final remark.").unwrap();
    assert!(preface < intro);
    assert!(custody < evidence);
    assert!(closing > evidence);
}

#[test]
fn conditional_statement_only_fires_for_matching_service() {
    let mut registry = StatementRegistry::default();
    registry.upsert(
        "after_incident:meta only".to_string(),
        "Meta-specific words.".to_string(),
        r#"esp_name in ["Facebook", "Instagram, Inc."]"#.to_string(),
    );
    let selected = registry.select_all();
    let lookups = FakeLookups::default();

    let facebook = doc(serde_json::json!({
        "reportedInformation": { "reportingEsp": { "espName": "Facebook" } }
    }));
    let snapchat = doc(serde_json::json!({
        "reportedInformation": { "reportingEsp": { "espName": "Snapchat Inc." } }
    }));

    let hit = assemble_full(&facebook, &registry, &selected, &lookups, &options());
    let miss = assemble_full(&snapchat, &registry, &selected, &lookups, &options());
    assert!(hit.contains("META ONLY: Meta-specific words."));
    assert!(!miss.contains("META ONLY"));
}

#[test]
fn meta_review_note_follows_viewed_files() {
    let document = doc(serde_json::json!({
        "reportedInformation": {
            "reportingEsp": { "espName": "Facebook" },
            "uploadedFiles": { "uploadedFiles": [
                { "filename": "a.jpg", "viewedByEsp": true, "submittalId": "ABC-1" },
                { "filename": "b.jpg" }
            ] }
        }
    }));
    let registry = StatementRegistry::default();
    let mut selected = registry.select_all();
    let lookups = FakeLookups::default();

    let text = assemble_full(&document, &registry, &selected, &lookups, &options());
    assert!(text.contains("NCMEC Identifier: ABC-1"));
    assert!(text.contains("Viewed by ESP: Yes\nWhen Meta responds"));
    assert!(text.contains("Viewed by ESP: Unknown"));

    selected.remove("meta");
    let without = assemble_full(&document, &registry, &selected, &lookups, &options());
    assert!(!without.contains("When Meta responds"));
}

#[test]
fn meetme_login_history_renders_inline_analysis() {
    let document = doc(serde_json::json!({
        "reportedInformation": {
            "reportingEsp": { "espName": "MeetMe" },
            "additionalInformations": [
                { "value": "IP Log for MeetMe UserID: 42\n2024-02-01 08:30:00 203.0.113.9 (Android)" }
            ]
        }
    }));
    let registry = StatementRegistry::default();
    let selected = registry.select_all();
    let mut lookups = FakeLookups::default();
    lookups.geo.insert(
        "203.0.113.9".to_string(),
        GeoRecord {
            country: Some("United States".to_string()),
            city: Some("Springfield".to_string()),
        },
    );
    lookups
        .orgs
        .insert("203.0.113.9".to_string(), "EXAMPLE-ORG".to_string());

    let text = assemble_full(&document, &registry, &selected, &lookups, &options());
    assert!(text.contains("Login Date/Time: 2024-02-01 08:30:00"));
    assert!(text.contains("IP Address: 203.0.113.9"));
    assert!(text.contains("Device: Android"));
    assert!(text.contains("MaxMind Geolocation Data:\n  Country: United States\n  City: Springfield"));
    assert!(text.contains("ARIN WHOIS Data:\n  Organization: EXAMPLE-ORG"));
}

#[test]
fn queried_pool_respects_explicit_query_all() {
    let captures: Vec<serde_json::Value> = (0..60)
        .map(|i| {
            serde_json::json!({
                "value": format!("10.2.0.{}", i),
                "dateTime": "2024-01-01T00:00:00Z",
                "eventName": "Login"
            })
        })
        .collect();
    let document = doc(serde_json::json!({
        "reportedInformation": {
            "reportedPeople": { "reportedPersons": [{
                "sourceInformation": { "sourceCaptures": captures }
            }] }
        }
    }));
    let pools = IpPools::collect(&document);
    let capped: HashSet<String> = pools.queried_addresses(false);
    let all: HashSet<String> = pools.queried_addresses(true);
    assert_eq!(capped.len(), QUERY_CAP);
    assert_eq!(all.len(), 60);
}
