//! Output renderers: plain text, styled PDF document, and spreadsheets.
//!
//! All three consume the same assembled text; the styled and spreadsheet
//! forms never re-derive content, only shape and emphasis.

pub mod sheet;
pub mod styled;

use std::path::Path;
use tipline_core::error::PersistError;

pub const SECTION_HEADERS: [&str; 4] = [
    "INCIDENT SUMMARY:",
    "SUSPECT INFORMATION:",
    "EVIDENCE SUMMARY:",
    "IP ADDRESS ANALYSIS:",
];

/// Known field labels, checked in order; the first match wins, so longer
/// variants of a shared stem must come before the stem.
pub const FIELD_LABELS: [&str; 58] = [
    "Report Date:",
    "Report ID:",
    "Date Received:",
    "Incident Type:",
    "Incident Date/Time:",
    "Reported By:",
    "Incident Date/Time Description:",
    "Chat Service or Client:",
    "Chat Room Name:",
    "Screen Name:",
    "User ID:",
    "Email:",
    "Service:",
    "File Number",
    "File Name:",
    "Additional Information from ESP:",
    "Viewed by ESP:",
    "Upload Date/Time:",
    "NCMEC Tags:",
    "Total Unique IP Addresses:",
    "IP Address:",
    "Upload Information:",
    "Investigator's Description:",
    "First Name:",
    "Middle Name:",
    "Last Name:",
    "Date of Birth:",
    "Approximate Age:",
    "Address:",
    "Phone:",
    "Verified Email:",
    "ESP Service:",
    "ESP User ID:",
    "Email Verification Date:",
    "Gender:",
    "Upload IP Address:",
    "Emailed From:",
    "Emailed To:",
    "Sent Date:",
    "Original Filename:",
    "Full Name:",
    "Location:",
    "Description:",
    "Profile URL:",
    "Webpage/URL Information:",
    "Private Message Correspondence:",
    "IP Address (Login):",
    "MeetMe Profile Name:",
    "MeetMe UserID:",
    "Date Joined MeetMe:",
    "Registration IP:",
    "Recent GPS Data:",
    "IP Log for MeetMe UserID:",
    "Additional Information:",
    "Login Date/Time:",
    "Event:",
    "NCMEC Identifier:",
    "MD5 Hash:",
];

/// Blank-line-delimited blocks of the assembled text, skipping blocks that
/// are only whitespace.
pub fn paragraph_blocks(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n").filter(|block| !block.trim().is_empty())
}

/// The plain-text export is the assembled text verbatim.
pub fn write_plain_text(text: &str, path: &Path) -> Result<(), PersistError> {
    std::fs::write(path, text).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_labels_are_distinct_and_well_formed() {
        let unique: std::collections::HashSet<&str> = FIELD_LABELS.into_iter().collect();
        assert_eq!(unique.len(), FIELD_LABELS.len());
        for label in FIELD_LABELS {
            assert!(!label.trim().is_empty());
        }
    }

    #[test]
    fn paragraph_blocks_skip_whitespace_only() {
        let blocks: Vec<&str> = paragraph_blocks("first\nline\n\n   \n\nsecond").collect();
        assert_eq!(blocks, vec!["first\nline", "second"]);
    }

    #[test]
    fn plain_text_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        write_plain_text("INCIDENT SUMMARY:\nIncident Type: CP\n", &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "INCIDENT SUMMARY:\nIncident Type: CP\n"
        );
    }
}
