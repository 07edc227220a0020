//! CyberTipline report analyzer CLI.
//!
//! Loads a tipline JSON export, assembles the investigator narrative and
//! IP analysis, prints the plain-text report to stdout, and optionally
//! writes text/PDF/spreadsheet artifacts.

mod config;
mod logging;
mod runner;

use clap::Parser;
use dialoguer::Confirm;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;
use tipline_assembly::assemble::{assemble, AssemblyOptions};
use tipline_assembly::enrich::{ArinClient, Enricher, MaxMindClient};
use tipline_assembly::ip::{IpPools, QUERY_CAP};
use tipline_assembly::render::{self, sheet, styled::StyledRenderer};
use tipline_assembly::statements::StatementRegistry;
use tipline_core::report::ReportDocument;

#[derive(Debug, Parser)]
#[command(name = "tipline", version, about = "CyberTipline incident report analyzer")]
struct Args {
    /// CyberTipline report JSON file
    report: PathBuf,

    /// Write the plain-text report to this path
    #[arg(long)]
    text: Option<PathBuf>,

    /// Write the styled PDF report to this path
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Write the IP analysis spreadsheet to this path
    #[arg(long = "ip-sheet")]
    ip_sheet: Option<PathBuf>,

    /// Write the evidence summary spreadsheet to this path
    #[arg(long = "evidence-sheet")]
    evidence_sheet: Option<PathBuf>,

    /// Statement file to use instead of the stored one
    #[arg(long)]
    statements: Option<PathBuf>,

    /// Statement keys to leave out of this run (repeatable)
    #[arg(long = "skip", value_name = "KEY")]
    skip: Vec<String>,

    /// Query every address even past the enrichment cap
    #[arg(long)]
    query_all_ips: bool,

    /// Cap enrichment at the first 50 addresses without prompting
    #[arg(long = "first-50", conflicts_with = "query_all_ips")]
    first_50: bool,

    /// Investigator name override (persisted for later runs)
    #[arg(long)]
    investigator_name: Option<String>,

    /// Investigator title override (persisted for later runs)
    #[arg(long)]
    investigator_title: Option<String>,

    /// MaxMind account id override (persisted for later runs)
    #[arg(long)]
    maxmind_account: Option<String>,

    /// MaxMind license key override (persisted for later runs)
    #[arg(long)]
    maxmind_key: Option<String>,

    /// ARIN api key override (persisted for later runs)
    #[arg(long)]
    arin_key: Option<String>,

    /// Pin the execution date (MM-DD-YYYY) instead of using today
    #[arg(long)]
    execution_date: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _guard = logging::init_logging();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!(%message, "analysis failed");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let cfg_dir = config::config_dir();

    let mut maxmind: config::MaxMindCredentials = load_or_default(&cfg_dir.join(config::MAXMIND_FILE));
    let mut arin: config::ArinCredentials = load_or_default(&cfg_dir.join(config::ARIN_FILE));
    let mut investigator: config::InvestigatorInfo =
        load_or_default(&cfg_dir.join(config::INVESTIGATOR_FILE));
    let mut recent: config::RecentFiles = load_or_default(&cfg_dir.join(config::RECENT_FILES_FILE));

    apply_override(&mut maxmind.account_id, args.maxmind_account.as_deref());
    apply_override(&mut maxmind.license_key, args.maxmind_key.as_deref());
    apply_override(&mut arin.api_key, args.arin_key.as_deref());
    let investigator_changed =
        args.investigator_name.is_some() || args.investigator_title.is_some();
    apply_override(&mut investigator.name, args.investigator_name.as_deref());
    apply_override(&mut investigator.title, args.investigator_title.as_deref());

    if args.maxmind_account.is_some() || args.maxmind_key.is_some() {
        warn_on_persist(config::save_json(&cfg_dir.join(config::MAXMIND_FILE), &maxmind));
    }
    if args.arin_key.is_some() {
        warn_on_persist(config::save_json(&cfg_dir.join(config::ARIN_FILE), &arin));
    }
    if investigator_changed {
        warn_on_persist(config::save_json(
            &cfg_dir.join(config::INVESTIGATOR_FILE),
            &investigator,
        ));
    }
    if !investigator.is_complete() {
        tracing::warn!("investigator name/title not configured; intro line will have blanks");
    }

    let statements_path = args
        .statements
        .clone()
        .unwrap_or_else(|| cfg_dir.join(config::STATEMENTS_FILE));
    let registry = match StatementRegistry::load(&statements_path) {
        Ok(registry) => registry,
        Err(err) => {
            tracing::warn!(%err, "falling back to built-in statements");
            StatementRegistry::default()
        }
    };
    let mut selected: BTreeSet<String> = registry.select_all();
    for key in &args.skip {
        if !selected.remove(key) {
            tracing::warn!(%key, "--skip names an unknown statement");
        }
    }

    // The only fatal failure: a report that cannot be read or parsed.
    let doc = ReportDocument::from_path(&args.report).map_err(|e| e.to_string())?;
    recent.record(&args.report.to_string_lossy());
    warn_on_persist(config::save_json(&cfg_dir.join(config::RECENT_FILES_FILE), &recent));

    let pools = IpPools::collect(&doc);
    tracing::info!(
        unique = pools.unique_count(),
        esp = doc.esp_name(),
        "collected report addresses"
    );
    let query_all = decide_query_all(&args, &pools)?;

    let options = AssemblyOptions {
        investigator_name: investigator.name.clone(),
        investigator_title: investigator.title.clone(),
        query_all_ips: query_all,
        execution_date: args.execution_date.clone(),
    };

    let job = {
        let doc = doc.clone();
        let registry = registry.clone();
        let selected = selected.clone();
        let pools = pools.clone();
        let maxmind = maxmind.clone();
        let arin = arin.clone();
        let options = options.clone();
        move || {
            let geo = MaxMindClient::new(maxmind.account_id, maxmind.license_key);
            let whois = ArinClient::new(arin.api_key);
            let enricher = Enricher::new(&geo, &whois);
            Ok(assemble(&doc, &registry, &selected, &pools, &enricher, &options))
        }
    };

    eprint!("Analyzing report");
    let mut ticks = 0u32;
    let outcome = runner::run(job, || {
        ticks += 1;
        if ticks % 10 == 0 {
            eprint!(".");
        }
    });
    eprintln!();

    let report = match outcome {
        runner::RunOutcome::Finished(report) => report,
        runner::RunOutcome::Failed(message) => return Err(message),
    };

    println!("{}", report.full_text());

    if let Some(path) = &args.text {
        match render::write_plain_text(&report.full_text(), path) {
            Ok(()) => tracing::info!(path = %path.display(), "wrote text report"),
            Err(err) => warn_artifact("text report", &err.to_string()),
        }
    }
    if let Some(path) = &args.pdf {
        let renderer = StyledRenderer::new(&registry, &selected);
        match renderer
            .render(&report)
            .and_then(|bytes| std::fs::write(path, bytes).map_err(|e| e.to_string()))
        {
            Ok(()) => tracing::info!(path = %path.display(), "wrote styled report"),
            Err(err) => warn_artifact("styled report", &err),
        }
    }
    if let Some(path) = &args.ip_sheet {
        let geo = MaxMindClient::new(maxmind.account_id.clone(), maxmind.license_key.clone());
        let whois = ArinClient::new(arin.api_key.clone());
        let enricher = Enricher::new(&geo, &whois);
        let queried = pools.queried_addresses(query_all);
        match sheet::write_ip_sheet(path, &pools, &queried, &enricher) {
            Ok(()) => tracing::info!(path = %path.display(), "wrote IP spreadsheet"),
            Err(err) => warn_artifact("IP spreadsheet", &err),
        }
    }
    if let Some(path) = &args.evidence_sheet {
        match sheet::write_evidence_sheet(path, &doc) {
            Ok(()) => tracing::info!(path = %path.display(), "wrote evidence spreadsheet"),
            Err(err) => warn_artifact("evidence spreadsheet", &err),
        }
    }

    Ok(())
}

fn decide_query_all(args: &Args, pools: &IpPools) -> Result<bool, String> {
    if !pools.exceeds_cap() {
        return Ok(true);
    }
    if args.query_all_ips {
        return Ok(true);
    }
    if args.first_50 {
        return Ok(false);
    }
    let prompt = format!(
        "{} unique IPs found (more than {}). Query all IPs for geolocation/WHOIS? \
         (yes: all, may be slow; no: first {} only; all IPs are listed regardless)",
        pools.unique_count(),
        QUERY_CAP,
        QUERY_CAP
    );
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| format!("prompt failed: {e}"))
}

fn load_or_default<T: serde::de::DeserializeOwned + Default>(path: &std::path::Path) -> T {
    match config::load_json(path) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(%err, "using defaults");
            T::default()
        }
    }
}

fn apply_override(slot: &mut String, value: Option<&str>) {
    if let Some(value) = value {
        *slot = value.to_string();
    }
}

fn warn_on_persist(result: Result<(), tipline_core::error::PersistError>) {
    if let Err(err) = result {
        tracing::warn!(%err, "state not saved");
    }
}

fn warn_artifact(what: &str, err: &str) {
    tracing::warn!(what, err, "artifact not written");
    eprintln!("warning: failed to write {what}: {err}");
}
