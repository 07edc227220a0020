//! Line-prefix parsers for provider narrative blobs.
//!
//! Several services stuff structured data into free-text fields: email
//! headers, profile summaries, registration details, private message
//! transcripts, login histories. Everything here is a pure function from
//! raw text to a small struct; rendering happens in the section builders.

use regex::Regex;
use std::collections::HashMap;
use tipline_core::report::{AdditionalInformation, EmailIncident};

/// Value after a `Prefix:` line marker, trimmed.
pub fn field_after<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix).map(str::trim)
}

fn keep(value: Option<&str>) -> Option<String> {
    match value {
        None | Some("") | Some("N/A") => None,
        Some(v) => Some(v.to_string()),
    }
}

/// Leading date stamp of a transcript line, e.g. `2024-03-01 ...`.
fn is_date_stamped(line: &str) -> bool {
    Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap().is_match(line)
}

// ============================================================================
// Email incidents
// ============================================================================

/// Headers recovered from one email incident body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailHeaders {
    pub sent_date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Index email incidents by their `X-Ymail-Msg-Id` header so evidence
/// files can join against them via a `Message ID:` marker.
pub fn index_email_incidents(incidents: &[EmailIncident]) -> HashMap<String, EmailHeaders> {
    let mut index = HashMap::new();
    for incident in incidents {
        let Some(body) = incident.contents.first().and_then(|c| c.value.as_deref()) else {
            continue;
        };
        let mut headers = EmailHeaders::default();
        let mut msg_id = None;
        for line in body.lines() {
            if let Some(v) = field_after(line, "Sent Date:") {
                headers.sent_date = keep(Some(v));
            } else if let Some(v) = field_after(line, "From:") {
                headers.from = keep(Some(v));
            } else if let Some(v) = field_after(line, "To:") {
                headers.to = keep(Some(v));
            } else if let Some(v) = field_after(line, "X-Ymail-Msg-Id:") {
                msg_id = Some(v.to_string());
            }
        }
        if let Some(id) = msg_id {
            index.insert(id, headers);
        }
    }
    index
}

/// First `Message ID:` marker among a file's additional-information values.
pub fn find_message_id(infos: &[AdditionalInformation]) -> Option<String> {
    infos
        .iter()
        .filter_map(|info| info.value.as_deref())
        .find_map(|value| field_after(value, "Message ID:").map(str::to_string))
}

// ============================================================================
// X Corp profile
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSummary {
    pub full_name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl ProfileSummary {
    pub fn parse(text: &str) -> Self {
        let mut profile = ProfileSummary::default();
        for line in text.lines() {
            if let Some(v) = field_after(line, "Full Name:") {
                profile.full_name = keep(Some(v));
            } else if let Some(v) = field_after(line, "Location:") {
                profile.location = keep(Some(v));
            } else if let Some(v) = field_after(line, "Description:") {
                profile.description = keep(Some(v));
            }
        }
        profile
    }
}

// ============================================================================
// MeetMe registration profile
// ============================================================================

pub const REGISTRATION_MARKER: &str = "Registration details from Suspect\u{2019}s MeetMe profile";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationProfile {
    pub profile_name: Option<String>,
    pub user_id: Option<String>,
    pub date_of_birth: Option<String>,
    pub age: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub email: Option<String>,
    pub date_joined: Option<String>,
    pub registration_ip: Option<String>,
    pub phone: Option<String>,
    pub gps: Option<String>,
}

impl RegistrationProfile {
    /// Parse a registration block. Returns None unless the marker line is
    /// present in the text.
    pub fn parse(text: &str) -> Option<Self> {
        if !text.contains(REGISTRATION_MARKER) {
            return None;
        }
        let mut profile = RegistrationProfile::default();
        for line in text.lines() {
            if let Some(v) = field_after(line, "MeetMe Profile Name:") {
                profile.profile_name = keep(Some(v));
            } else if let Some(v) = field_after(line, "MeetMe UserID:") {
                profile.user_id = keep(Some(v));
            } else if let Some(v) = field_after(line, "DOB:") {
                profile.date_of_birth = keep(Some(v));
            } else if let Some(v) = field_after(line, "Age:") {
                profile.age = keep(Some(v));
            } else if let Some(v) = field_after(line, "Zip:") {
                profile.zip = keep(Some(v));
            } else if let Some(v) = field_after(line, "City:") {
                profile.city = keep(Some(v));
            } else if let Some(v) = field_after(line, "State:") {
                profile.state = keep(Some(v));
            } else if let Some(v) = field_after(line, "Email:") {
                profile.email = keep(Some(v));
            } else if let Some(v) = field_after(line, "Date Joined meetme.com:") {
                profile.date_joined = keep(Some(v));
            } else if let Some(v) = field_after(line, "Registration IP:") {
                profile.registration_ip = keep(Some(v));
            } else if let Some(v) = field_after(line, "Phone number used to verify account:") {
                profile.phone = keep(Some(v));
            } else if let Some(v) = field_after(line, "Recent GPS Data:") {
                // The coordinate value may carry its own "Lat./Long.:" tag.
                let v = v.strip_prefix("Lat./Long.:").map(str::trim).unwrap_or(v);
                profile.gps = keep(Some(v));
            }
        }
        Some(profile)
    }
}

// ============================================================================
// MeetMe private messages
// ============================================================================

pub const PRIVATE_MESSAGE_MARKER: &str = "Complete private message correspondence";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivateMessage {
    pub to: Option<String>,
    pub from: Option<String>,
    pub sent: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// Transcript between the marker line and the first date-stamped line.
/// A `To:` line opens a new message; other prefixes fill the current one.
pub fn parse_private_messages(text: &str) -> Vec<PrivateMessage> {
    let mut messages = Vec::new();
    let mut current: Option<PrivateMessage> = None;
    let mut capturing = false;

    for line in text.lines() {
        if line.contains(PRIVATE_MESSAGE_MARKER) {
            capturing = true;
            continue;
        }
        if !capturing {
            continue;
        }
        let trimmed = line.trim();
        if is_date_stamped(trimmed) {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }
        if let Some(v) = field_after(line, "To:") {
            if let Some(done) = current.take() {
                messages.push(done);
            }
            current = Some(PrivateMessage {
                to: keep(Some(v)),
                ..PrivateMessage::default()
            });
        } else if let Some(msg) = current.as_mut() {
            if let Some(v) = field_after(line, "From:") {
                msg.from = keep(Some(v));
            } else if let Some(v) = field_after(line, "Sent:") {
                msg.sent = keep(Some(v));
            } else if let Some(v) = field_after(line, "Subject:") {
                msg.subject = keep(Some(v));
            } else if let Some(v) = field_after(line, "Message:") {
                msg.message = keep(Some(v));
            }
        }
    }
    if let Some(done) = current.take() {
        messages.push(done);
    }
    messages
}

// ============================================================================
// MeetMe login history
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRecord {
    pub timestamp: String,
    pub ip: String,
    pub device: Option<String>,
}

/// Date-stamped `date time ip (device)` lines anywhere in the text.
pub fn parse_login_history(text: &str) -> Vec<LoginRecord> {
    let mut records = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || !is_date_stamped(line) {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }
        let device = parts
            .get(3)
            .filter(|p| p.starts_with('('))
            .map(|p| p.trim_matches(|c| c == '(' || c == ')').to_string());
        records.push(LoginRecord {
            timestamp: format!("{} {}", parts[0], parts[1]),
            ip: parts[2].to_string(),
            device,
        });
    }
    records
}

// ============================================================================
// Webpage narrative
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebpageInfo {
    pub kind: Option<String>,
    pub text: Option<String>,
}

impl WebpageInfo {
    pub fn parse(text: &str) -> Self {
        let mut info = WebpageInfo::default();
        for line in text.lines() {
            if let Some(v) = field_after(line, "Type:") {
                info.kind = keep(Some(v));
            } else if let Some(v) = field_after(line, "Text:") {
                info.text = keep(Some(v));
            }
        }
        info
    }
}

// ============================================================================
// Description filters
// ============================================================================

const META_BOILERPLATE: [&str; 6] = [
    "With respect to the section \"Was File Reviewed by Company?",
    "When Meta responds \"Yes\"",
    "When Meta responds \"No\"",
    "File's unique ESP Identifier:",
    "Messenger Thread ID:",
    "Uploaded ",
];

/// Meta file descriptions: drop boilerplate lines and the inline pointer
/// sentence, keeping everything else line by line.
pub fn filter_meta_description(raw: &str) -> Option<String> {
    let mut kept = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if META_BOILERPLATE.iter().any(|phrase| line.contains(phrase)) {
            continue;
        }
        if !line.is_empty() && line != "The content can be found in this report." {
            kept.push(line);
        }
    }
    let joined = kept.join("\n").trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// WhatsApp descriptions: paragraphs with embedded report-surface JSON are
/// dropped whole; survivors get inner newlines flattened to spaces.
pub fn filter_whatsapp_description(raw: &str) -> Option<String> {
    let kept: Vec<String> = raw
        .split("\n\n")
        .filter(|p| !p.contains("{\"report_surface\":"))
        .map(|p| p.replace('\n', " "))
        .collect();
    let joined = kept.join("\n\n").trim().to_string();
    if joined.is_empty() || joined == "N/A" {
        None
    } else {
        Some(joined)
    }
}

/// Default description filter: drop pointer lines only.
pub fn filter_generic_description(raw: &str) -> Option<String> {
    let kept: Vec<&str> = raw
        .lines()
        .filter(|line| !line.contains("The content can be found in this report"))
        .collect();
    let joined = kept.join("\n").trim().to_string();
    if joined.is_empty() || joined == "N/A" {
        None
    } else {
        Some(joined)
    }
}
