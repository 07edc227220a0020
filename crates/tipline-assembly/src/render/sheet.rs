//! Spreadsheet exports: the IP analysis grid and the evidence summary.
//!
//! Row building is pure so the cell values are testable without touching
//! the filesystem; writing goes through `rust_xlsxwriter` with bold
//! centered headers and content-sized columns.

use crate::enrich::{Enricher, EnrichmentCells, NOT_QUERIED};
use crate::extract;
use crate::ip::IpPools;
use crate::narratives::{
    self, filter_generic_description, filter_meta_description, filter_whatsapp_description,
    WebpageInfo,
};
use crate::providers::ProviderRules;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};
use std::collections::HashSet;
use std::path::Path;
use tipline_core::report::{present, ReportDocument};
use tipline_core::timefmt;

pub const IP_SHEET_NAME: &str = "IP Address Analysis";
pub const IP_SHEET_HEADERS: [&str; 7] = [
    "IP Address",
    "Date/Time",
    "Port",
    "IP Event",
    "MaxMind Country",
    "MaxMind City",
    "ARIN Organization",
];

pub const EVIDENCE_SHEET_NAME: &str = "Evidence Summary";
pub const EVIDENCE_SHEET_HEADERS: [&str; 17] = [
    "File Number",
    "File Name",
    "NCMEC Identifier",
    "MD5 Hash",
    "Sent Date",
    "Emailed From",
    "Emailed To",
    "Original Filename",
    "Additional Information",
    "Viewed by ESP",
    "Upload Date/Time",
    "NCMEC Tags",
    "Upload IP Address",
    "Webpage Number",
    "URL",
    "Type",
    "Text",
];

fn or_na(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("N/A").to_string()
}

/// One spreadsheet row per occurrence of each address. Each queried
/// address is looked up once and its cells reused across its rows.
pub fn ip_rows(
    pools: &IpPools,
    queried: &HashSet<String>,
    enricher: &Enricher<'_>,
) -> Vec<[String; 7]> {
    let mut rows = Vec::new();
    for entry in &pools.entries {
        let cells: EnrichmentCells = if queried.contains(&entry.address) {
            enricher.cells(&entry.address)
        } else {
            EnrichmentCells {
                country: NOT_QUERIED.to_string(),
                city: NOT_QUERIED.to_string(),
                organization: NOT_QUERIED.to_string(),
            }
        };
        for occ in &entry.occurrences {
            let date_time = match occ.date_time.as_deref() {
                Some(raw) if !raw.is_empty() && raw != "N/A" => timefmt::display_datetime(raw),
                _ => "N/A".to_string(),
            };
            rows.push([
                entry.address.clone(),
                date_time,
                occ.port.map(|p| p.to_string()).unwrap_or_else(|| "N/A".to_string()),
                or_na(occ.event.as_deref()),
                cells.country.clone(),
                cells.city.clone(),
                cells.organization.clone(),
            ]);
        }
    }
    rows
}

/// Webpage rows (X Corp URL metadata, Reddit chat text) followed by one
/// row per evidence file. Columns unused by a row kind stay empty.
pub fn evidence_rows(doc: &ReportDocument) -> Vec<[String; 17]> {
    let rules = ProviderRules::for_esp(doc.esp_name());
    let mut rows: Vec<[String; 17]> = Vec::new();
    let webpages = doc.webpage_incidents();

    if rules.xcorp {
        for (i, webpage) in webpages.iter().enumerate() {
            let url = webpage
                .source_captures()
                .iter()
                .find(|c| c.capture_type.as_deref() == Some("URL"))
                .and_then(|c| present(&c.value));
            let info = webpage
                .additional_informations
                .first()
                .and_then(|info| info.value.as_deref())
                .map(WebpageInfo::parse)
                .unwrap_or_default();
            let mut row: [String; 17] = Default::default();
            row[13] = format!("Webpage {}", i + 1);
            row[14] = or_na(url);
            row[15] = or_na(info.kind.as_deref());
            row[16] = or_na(info.text.as_deref());
            rows.push(row);
        }
    }

    if rules.reddit {
        for (i, webpage) in webpages.iter().enumerate() {
            let mut row: [String; 17] = Default::default();
            row[13] = format!("Webpage {}", i + 1);
            row[8] = or_na(
                webpage
                    .additional_informations
                    .first()
                    .and_then(|info| present(&info.value)),
            );
            rows.push(row);
        }
    }

    let email_index = narratives::index_email_incidents(doc.email_incidents());
    for (index, file) in doc.files().iter().enumerate() {
        let mut row: [String; 17] = Default::default();
        row[0] = (index + 1).to_string();
        row[1] = or_na(present(&file.filename));
        row[2] = if rules.show_submittal_id {
            or_na(present(&file.submittal_id))
        } else {
            "N/A".to_string()
        };
        row[3] = or_na(present(&file.verification_hash));

        let headers = narratives::find_message_id(&file.additional_informations)
            .and_then(|id| email_index.get(&id).cloned())
            .unwrap_or_default();
        row[4] = or_na(headers.sent_date.as_deref());
        row[5] = or_na(headers.from.as_deref());
        row[6] = or_na(headers.to.as_deref());
        row[7] = or_na(present(&file.original_filename));

        let description = file
            .additional_informations
            .first()
            .and_then(|info| present(&info.value))
            .and_then(|raw| {
                if rules.strip_meta_boilerplate {
                    filter_meta_description(raw)
                } else if rules.whatsapp_paragraphs {
                    filter_whatsapp_description(raw)
                } else {
                    filter_generic_description(raw)
                }
            });
        row[8] = or_na(description.as_deref());

        row[9] = match file.viewed_by_esp {
            Some(true) => "Yes".to_string(),
            Some(false) => "No".to_string(),
            None => "Unknown".to_string(),
        };

        row[10] = extract::upload_time_raw(file, rules)
            .map(|raw| timefmt::display_datetime(&raw))
            .unwrap_or_else(|| "N/A".to_string());

        let tags = file.tag_values();
        row[11] = if tags.is_empty() {
            "N/A".to_string()
        } else {
            tags.join(", ")
        };

        let captures = file.source_captures();
        let addresses: Vec<String> = if captures.is_empty() {
            Vec::new()
        } else if rules.xcorp {
            vec!["X does not capture IPs for individual Posts".to_string()]
        } else {
            captures
                .iter()
                .filter(|c| c.capture_type.as_deref() == Some("IP Address"))
                .filter_map(|c| present(&c.value))
                .map(str::to_string)
                .collect()
        };
        row[12] = if addresses.is_empty() {
            "N/A".to_string()
        } else {
            addresses.join("; ")
        };

        rows.push(row);
    }

    rows
}

// ============================================================================
// Workbook writing
// ============================================================================

fn write_grid<const N: usize>(
    sheet: &mut Worksheet,
    name: &str,
    headers: &[&str; N],
    rows: &[[String; N]],
    width_cap: Option<f64>,
) -> Result<(), String> {
    sheet
        .set_name(name)
        .map_err(|e| format!("worksheet name failed: {e}"))?;
    let header_format = Format::new().set_bold().set_align(FormatAlign::Center);
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| format!("header write failed: {e}"))?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            sheet
                .write_string((r + 1) as u32, col as u16, value)
                .map_err(|e| format!("cell write failed: {e}"))?;
        }
    }
    for (col, header) in headers.iter().enumerate() {
        let longest = rows
            .iter()
            .map(|row| row[col].len())
            .max()
            .unwrap_or(0)
            .max(header.len());
        let mut width = (longest + 2) as f64;
        if let Some(cap) = width_cap {
            width = width.min(cap);
        }
        sheet
            .set_column_width(col as u16, width)
            .map_err(|e| format!("column width failed: {e}"))?;
    }
    Ok(())
}

pub fn write_ip_sheet(
    path: &Path,
    pools: &IpPools,
    queried: &HashSet<String>,
    enricher: &Enricher<'_>,
) -> Result<(), String> {
    let rows = ip_rows(pools, queried, enricher);
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    write_grid(sheet, IP_SHEET_NAME, &IP_SHEET_HEADERS, &rows, None)?;
    workbook
        .save(path)
        .map_err(|e| format!("workbook save failed: {e}"))
}

pub fn write_evidence_sheet(path: &Path, doc: &ReportDocument) -> Result<(), String> {
    let rows = evidence_rows(doc);
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    // Long description cells would otherwise blow the layout out.
    write_grid(
        sheet,
        EVIDENCE_SHEET_NAME,
        &EVIDENCE_SHEET_HEADERS,
        &rows,
        Some(50.0),
    )?;
    workbook
        .save(path)
        .map_err(|e| format!("workbook save failed: {e}"))
}
