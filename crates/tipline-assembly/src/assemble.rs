//! Top-level report assembly: sections and statement slots concatenated in
//! their fixed order, followed by the aggregate IP analysis.

use crate::enrich::Enricher;
use crate::extract;
use crate::ip::{self, IpPools};
use crate::providers::ProviderRules;
use crate::statements::{Slot, StatementRegistry};
use std::collections::{BTreeSet, HashSet};
use tipline_core::report::ReportDocument;

#[derive(Debug, Clone, Default)]
pub struct AssemblyOptions {
    pub investigator_name: String,
    pub investigator_title: String,
    /// Query every address even when the pool exceeds the cap.
    pub query_all_ips: bool,
    /// Fixed execution date (`MM-DD-YYYY`); None uses today. Pinning it
    /// keeps repeated runs byte-identical.
    pub execution_date: Option<String>,
}

impl AssemblyOptions {
    fn execution_date(&self) -> String {
        self.execution_date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%m-%d-%Y").to_string())
    }
}

/// Finished report: the narrative body and the aggregate IP analysis,
/// consumed together by every renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledReport {
    pub narrative: String,
    pub ip_analysis: String,
}

impl AssembledReport {
    pub fn full_text(&self) -> String {
        format!("{}{}", self.narrative, self.ip_analysis)
    }
}

/// Assemble the whole report. The same document, registry, selection, and
/// lookup results always produce the same bytes.
pub fn assemble(
    doc: &ReportDocument,
    registry: &StatementRegistry,
    selected: &BTreeSet<String>,
    pools: &IpPools,
    enricher: &Enricher<'_>,
    options: &AssemblyOptions,
) -> AssembledReport {
    let esp_name = doc.esp_name();
    let rules = ProviderRules::for_esp(esp_name);
    let slot = |s: Slot| registry.render_slot(s, selected, esp_name);

    let mut narrative = String::new();
    narrative.push_str(&slot(Slot::Beginning));
    narrative.push_str(&extract::intro_line(
        doc,
        &options.execution_date(),
        &options.investigator_title,
        &options.investigator_name,
    ));
    narrative.push_str(&slot(Slot::BeforeIncident));
    narrative.push_str(&extract::incident_section(doc, rules, registry, selected));
    narrative.push_str(&slot(Slot::AfterIncident));
    narrative.push('\n');

    narrative.push_str(&slot(Slot::BeforeSuspect));
    narrative.push_str(&extract::suspect_section(doc, rules));
    narrative.push_str(&slot(Slot::AfterSuspect));
    narrative.push('\n');

    narrative.push_str(&slot(Slot::BeforeEvidence));
    narrative.push_str(&extract::evidence_section(doc, rules, registry, selected));
    narrative.push_str(&slot(Slot::AfterEvidence));

    narrative.push_str(&slot(Slot::BeforeIp));
    narrative.push_str(&extract::provider_ip_section(doc, rules, enricher));
    narrative.push_str(&slot(Slot::AfterIp));
    narrative.push_str(&registry.render_end(selected, esp_name));

    let queried: HashSet<String> = pools.queried_addresses(options.query_all_ips);
    let ip_analysis = ip::analysis_section(pools, &queried, enricher);

    AssembledReport {
        narrative,
        ip_analysis,
    }
}
