//! Styled document renderer.
//!
//! Walks the assembled text line by line, promoting section and custom
//! statement headers, emphasizing known field labels, and demoting the
//! boilerplate blocks, then renders the result to PDF bytes with `genpdf`.

use crate::assemble::AssembledReport;
use crate::render::{paragraph_blocks, FIELD_LABELS, SECTION_HEADERS};
use crate::statements::StatementRegistry;
use genpdf::elements::{Break, Paragraph};
use genpdf::fonts;
use genpdf::style::{Color, Style};
use genpdf::{Document, Element, SimplePageDecorator};
use std::collections::BTreeSet;

const FONT_DIRS: &[&str] = &[
    "./fonts",
    "/usr/share/fonts/liberation",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/dejavu",
    "/System/Library/Fonts",
    "/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
];

fn get_crate_fonts_dir() -> Option<std::path::PathBuf> {
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let fonts_dir = std::path::PathBuf::from(manifest_dir).join("fonts");
        if fonts_dir.exists() {
            return Some(fonts_dir);
        }
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(target_dir) = exe_path.ancestors().nth(4) {
            let fonts_dir = target_dir.join("crates/tipline-assembly/fonts");
            if fonts_dir.exists() {
                return Some(fonts_dir);
            }
        }
    }
    None
}

/// Classification of one line of assembled text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    SectionHeader(String),
    CustomHeader(String),
    Labeled {
        label: &'static str,
        value: String,
        leading: String,
    },
    InvestigatorViewed(String),
    Body(String),
}

/// Decide how a line is styled. Headers are matched on the trimmed line;
/// labels are matched as prefixes of the content after leading indent, in
/// list order.
pub fn classify_line(line: &str, custom_headers: &[String]) -> LineKind {
    let stripped = line.trim();
    if SECTION_HEADERS.contains(&stripped) {
        return LineKind::SectionHeader(stripped.to_string());
    }
    if custom_headers.iter().any(|h| h == stripped) {
        return LineKind::CustomHeader(stripped.to_string());
    }

    let content = line.trim_start();
    let leading = &line[..line.len() - content.len()];
    if content == "This file was viewed by the reporting Investigator" {
        return LineKind::InvestigatorViewed(line.to_string());
    }
    for label in FIELD_LABELS {
        if let Some(rest) = content.strip_prefix(label) {
            return LineKind::Labeled {
                label,
                value: rest.trim().to_string(),
                leading: leading.to_string(),
            };
        }
    }
    LineKind::Body(line.to_string())
}

/// Renderer state derived from the statement selection: which lines are
/// custom headers, which blocks are the indented review note, and the text
/// inserted under the IP analysis header.
pub struct StyledRenderer {
    custom_headers: Vec<String>,
    meta_blocks: Vec<String>,
    ip_intro: String,
}

impl StyledRenderer {
    pub fn new(registry: &StatementRegistry, selected: &BTreeSet<String>) -> Self {
        let meta_blocks = if selected.contains("meta") {
            registry
                .text_of("meta")
                .split("\n\n")
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect()
        } else {
            Vec::new()
        };
        let ip_intro = if selected.contains("ip_intro") {
            registry.text_of("ip_intro").to_string()
        } else {
            String::new()
        };
        StyledRenderer {
            custom_headers: registry.custom_header_lines(selected),
            meta_blocks,
            ip_intro,
        }
    }

    /// Render the whole report (narrative plus IP analysis) to PDF bytes.
    pub fn render(&self, report: &AssembledReport) -> Result<Vec<u8>, String> {
        let mut font_dirs: Vec<std::path::PathBuf> =
            FONT_DIRS.iter().map(std::path::PathBuf::from).collect();
        if let Some(crate_fonts) = get_crate_fonts_dir() {
            font_dirs.insert(0, crate_fonts);
        }
        // Fonts must be embedded (no builtin) for unicode support.
        let font_family = font_dirs
            .iter()
            .filter(|path| path.exists())
            .find_map(|dir| {
                let dir_str = dir.to_str().unwrap_or(".");
                fonts::from_files(dir_str, "LiberationSans", None).ok()
            })
            .ok_or_else(|| {
                format!(
                    "No suitable fonts found. Searched: {:?}. Please install Liberation fonts.",
                    font_dirs
                )
            })?;

        let mut doc = Document::new(font_family);
        doc.set_title("CyberTipline Analysis Report");
        doc.set_minimal_conformance();
        doc.set_line_spacing(1.0);
        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(15);
        doc.set_page_decorator(decorator);

        let full_text = report.full_text();
        for block in paragraph_blocks(&full_text) {
            if let Some((prefix, meta)) = self.split_meta_block(block) {
                for line in prefix.lines() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.push_line(&mut doc, line);
                }
                doc.push(
                    Paragraph::new(meta)
                        .styled(Style::new().with_font_size(10))
                        .padded(genpdf::Margins::trbl(0, 0, 0, 12)),
                );
                doc.push(Break::new(1.0));
                continue;
            }
            for line in block.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                self.push_line(&mut doc, line);
            }
            doc.push(Break::new(1.0));
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| format!("PDF render failed: {}", e))?;
        Ok(buffer)
    }

    /// Split a paragraph block into (preceding lines, review-note text)
    /// when it ends with one of the note's paragraphs. The note's first
    /// paragraph follows the `Viewed by ESP:` line without a blank line in
    /// between, so it arrives glued to that line's block; matching by
    /// suffix styles it all the same.
    fn split_meta_block<'a>(&self, block: &'a str) -> Option<(&'a str, &'a str)> {
        let trimmed = block.trim();
        let meta = self
            .meta_blocks
            .iter()
            .find(|m| trimmed.ends_with(m.as_str()))?;
        let prefix = trimmed[..trimmed.len() - meta.len()].trim_end();
        Some((prefix, &trimmed[trimmed.len() - meta.len()..]))
    }

    fn push_line(&self, doc: &mut Document, line: &str) {
        match classify_line(line, &self.custom_headers) {
            LineKind::SectionHeader(header) | LineKind::CustomHeader(header) => {
                let is_ip_header = header == "IP ADDRESS ANALYSIS:";
                doc.push(Paragraph::new(&header).styled(Style::new().bold().with_font_size(13)));
                if is_ip_header && !self.ip_intro.is_empty() {
                    doc.push(Break::new(1.0));
                    doc.push(
                        Paragraph::new(self.ip_intro.as_str())
                            .styled(Style::new().with_font_size(12)),
                    );
                }
            }
            LineKind::Labeled {
                label,
                value,
                leading,
            } => {
                let mut para = Paragraph::default();
                if !leading.is_empty() {
                    para.push_styled(leading, Style::new().with_font_size(12));
                }
                let mut label_style = Style::new().bold().with_font_size(12);
                if label == "Investigator's Description:" {
                    label_style = label_style.with_color(Color::Rgb(255, 0, 0));
                }
                para.push_styled(label, label_style);
                para.push_styled("  ", Style::new().with_font_size(12));
                para.push_styled(value, Style::new().with_font_size(12));
                doc.push(para);
            }
            LineKind::InvestigatorViewed(text) => {
                doc.push(Paragraph::new(text).styled(Style::new().italic().with_font_size(10)));
            }
            LineKind::Body(text) => {
                doc.push(Paragraph::new(text).styled(Style::new().with_font_size(12)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_headers_win_over_labels() {
        assert_eq!(
            classify_line("IP ADDRESS ANALYSIS:", &[]),
            LineKind::SectionHeader("IP ADDRESS ANALYSIS:".to_string())
        );
    }

    #[test]
    fn custom_headers_match_on_trimmed_line() {
        let customs = vec!["CHAIN OF CUSTODY:".to_string()];
        assert_eq!(
            classify_line("  CHAIN OF CUSTODY:", &customs),
            LineKind::CustomHeader("CHAIN OF CUSTODY:".to_string())
        );
    }

    #[test]
    fn first_matching_label_wins_and_keeps_indent() {
        match classify_line("      - Date/Time: 01/01/2024", &[]) {
            LineKind::Body(_) => {}
            other => panic!("dash lines are body text, got {other:?}"),
        }
        match classify_line("        Port: 443", &[]) {
            LineKind::Body(_) => {}
            other => panic!("Port is not a known label, got {other:?}"),
        }
        match classify_line("  IP Address: 1.2.3.4", &[]) {
            LineKind::Labeled {
                label,
                value,
                leading,
            } => {
                assert_eq!(label, "IP Address:");
                assert_eq!(value, "1.2.3.4");
                assert_eq!(leading, "  ");
            }
            other => panic!("expected labeled line, got {other:?}"),
        }
    }

    #[test]
    fn longer_label_beats_shared_stem() {
        match classify_line("Incident Date/Time: 01/01/2024 00:00:00 UTC", &[]) {
            LineKind::Labeled { label, .. } => assert_eq!(label, "Incident Date/Time:"),
            other => panic!("expected labeled line, got {other:?}"),
        }
        match classify_line("IP Address (Login): 1.2.3.4", &[]) {
            // "IP Address:" does not prefix-match because of the "(Login)"
            // infix, so the dedicated label applies.
            LineKind::Labeled { label, .. } => assert_eq!(label, "IP Address (Login):"),
            other => panic!("expected labeled line, got {other:?}"),
        }
    }

    #[test]
    fn meta_paragraphs_match_standalone_and_glued_blocks() {
        let registry = StatementRegistry::default();
        let selected = registry.select_all();
        let renderer = StyledRenderer::new(&registry, &selected);
        let paragraphs: Vec<&str> = registry.text_of("meta").split("\n\n").collect();
        assert!(paragraphs.len() > 1, "note is expected to span paragraphs");

        // Second paragraph arrives as its own block.
        let (prefix, meta) = renderer
            .split_meta_block(paragraphs[1])
            .unwrap_or_else(|| panic!("standalone paragraph not matched"));
        assert!(prefix.is_empty());
        assert_eq!(meta, paragraphs[1].trim());

        // First paragraph arrives glued to the Viewed-by-ESP line.
        let glued = format!("Viewed by ESP: Yes\n{}", paragraphs[0]);
        let (prefix, meta) = renderer
            .split_meta_block(&glued)
            .unwrap_or_else(|| panic!("glued paragraph not matched"));
        assert_eq!(prefix, "Viewed by ESP: Yes");
        assert_eq!(meta, paragraphs[0].trim());

        assert!(renderer.split_meta_block("Viewed by ESP: Yes").is_none());
    }

    #[test]
    fn meta_blocks_empty_without_selection() {
        let registry = StatementRegistry::default();
        let mut selected = registry.select_all();
        selected.remove("meta");
        let renderer = StyledRenderer::new(&registry, &selected);
        let first = registry.text_of("meta").split("\n\n").next().unwrap_or("");
        assert!(renderer.split_meta_block(first).is_none());
    }

    #[test]
    fn investigator_trailer_is_special_cased() {
        assert_eq!(
            classify_line("This file was viewed by the reporting Investigator", &[]),
            LineKind::InvestigatorViewed(
                "This file was viewed by the reporting Investigator".to_string()
            )
        );
    }
}
