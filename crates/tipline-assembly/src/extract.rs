//! Narrative section builders.
//!
//! Each function turns one region of the report document into labeled
//! lines. Absent values and `N/A` placeholders are never rendered, and all
//! four section headers are emitted even when their bodies are empty so a
//! sparse report still has its full skeleton.

use crate::enrich::Enricher;
use crate::narratives::{
    self, filter_generic_description, filter_meta_description, filter_whatsapp_description,
    ProfileSummary, RegistrationProfile,
};
use crate::providers::ProviderRules;
use crate::statements::StatementRegistry;
use std::collections::BTreeSet;
use tipline_core::report::{present, ReportDocument, UploadedFile};
use tipline_core::timefmt;

const MEETME_EMAIL_NOTE: &str =
    "(Note: This email was voluntarily provided by the user and may not be verified by MeetMe)";
const GPS_NOTE: &str = "Note: This GPS data is used for business purposes and may or may not be indicative of a user\u{2019}s true geographic location.";
const XCORP_UPLOAD_IP_NOTE: &str = "X does not capture IPs for individual Posts, but information from the log of IPs provided by X for the timeframe relevant to the upload date/time will be documented below.";
const INVESTIGATOR_TRAILER: &str = "This file was viewed by the reporting Investigator";

fn push_field(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.push_str(&format!("{label}: {value}\n"));
    }
}

fn display_or_raw(raw: &str) -> String {
    timefmt::display_datetime(raw)
}

// ============================================================================
// Intro
// ============================================================================

pub fn intro_line(
    doc: &ReportDocument,
    execution_date: &str,
    investigator_title: &str,
    investigator_name: &str,
) -> String {
    let cybertip_number = present(&doc.report_id).unwrap_or("N/A");
    let date_received = present(&doc.date_received)
        .map(timefmt::display_date)
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "On {execution_date}, I, {investigator_title} {investigator_name}, reviewed Cybertip \
         #{cybertip_number}, which was received by the National Center for Missing and Exploited \
         Children (NCMEC) on {date_received}. I observed the following information regarding this \
         CyberTip:\n\n"
    )
}

// ============================================================================
// Incident summary
// ============================================================================

pub fn incident_section(
    doc: &ReportDocument,
    rules: ProviderRules,
    registry: &StatementRegistry,
    selected: &BTreeSet<String>,
) -> String {
    let mut section = String::from("INCIDENT SUMMARY:\n");
    let summary = doc.reported_information.incident_summary.as_ref();

    if let Some(summary) = summary {
        push_field(&mut section, "Incident Type", present(&summary.incident_type));
        if let Some(raw) = present(&summary.incident_date_time) {
            push_field(&mut section, "Incident Date/Time", Some(&display_or_raw(raw)));
        }
    }

    let esp_name = doc.esp_name();
    if !esp_name.is_empty() {
        let mut reported_by = esp_name.to_string();
        if rules.bing_visual_search_candidate
            && doc.reporter_last_name() == Some("Microsoft BingImage")
        {
            reported_by.push_str(", BingImage");
        }
        push_field(&mut section, "Reported By", Some(&reported_by));
    }

    if let Some(summary) = summary {
        push_field(
            &mut section,
            "Incident Date/Time Description",
            present(&summary.incident_date_time_description),
        );
    }

    if rules.reddit {
        for value in doc.additional_information_values() {
            push_field(&mut section, "Additional Information", Some(value));
        }
    }

    if rules.bing_visual_search_candidate
        && doc
            .reporter_last_name()
            .is_some_and(|n| n.contains("BingImage"))
        && selected.contains("bingimage")
    {
        section.push_str(registry.text_of("bingimage"));
        section.push_str("\n\n");
    }

    if rules.xcorp && selected.contains("xcorp") {
        section.push_str(registry.text_of("xcorp"));
        section.push('\n');
    }

    section
}

// ============================================================================
// Suspect information
// ============================================================================

pub fn suspect_section(doc: &ReportDocument, rules: ProviderRules) -> String {
    let mut section = String::from("SUSPECT INFORMATION:\n");

    for person in doc.persons() {
        let scalar_fields: [(&str, &Option<String>); 23] = [
            ("First Name", &person.first_name),
            ("Middle Name", &person.middle_name),
            ("Last Name", &person.last_name),
            ("Preferred Name", &person.preferred_name),
            ("Gender", &person.gender),
            ("Preferred Pronouns", &person.preferred_pronouns),
            ("Date of Birth", &person.date_of_birth),
            ("Approximate Age", &person.approximate_age),
            ("Physical Description", &person.physical_description),
            ("Vehicle Description", &person.vehicle_description),
            ("Vehicle Tag Number", &person.vehicle_tag_number),
            ("Occupation", &person.occupation),
            ("ESP Service", &person.esp_service),
            ("ESP User ID", &person.esp_user_id),
            ("IP Address", &person.ip_address),
            ("Relationship to Reporter", &person.relationship_to_reporter),
            ("Relationship to Child Victim", &person.relationship_to_child_victim),
            ("Access to Child Victim", &person.access_to_child_victim),
            ("Access to Children", &person.access_to_children),
            ("Access to Firearms", &person.access_to_firearms),
            ("Convicted Sex Offender", &person.convicted_sex_offender),
            ("Aware of Report", &person.aware_of_report),
            ("Gang Affiliation", &person.gang_affiliation),
        ];
        for (label, value) in scalar_fields {
            push_field(&mut section, label, present(value));
        }

        if let Some(screen_name) = person.screen_name.as_ref() {
            push_field(&mut section, "Screen Name", present(&screen_name.value));
        }

        for email in person.email_entries() {
            if let Some(value) = present(&email.value) {
                section.push_str(&format!("Email: {value} "));
                if rules.meetme {
                    section.push_str(MEETME_EMAIL_NOTE);
                    section.push('\n');
                } else if let Some(verified) = present(&email.verified) {
                    section.push_str(&format!("(Verified: {verified})\n"));
                } else {
                    section.push('\n');
                }
            }
        }

        for addr in person.address_entries() {
            let mut parts = String::new();
            if let Some(v) = present(&addr.street1) {
                parts.push_str(&format!("{v} "));
            }
            if let Some(v) = present(&addr.street2) {
                parts.push_str(&format!("{v} "));
            }
            if let Some(v) = present(&addr.city) {
                parts.push_str(&format!("{v}, "));
            }
            if let Some(v) = present(&addr.state) {
                parts.push_str(&format!("{v} "));
            }
            if let Some(v) = present(&addr.postal_code) {
                parts.push_str(&format!("{v} "));
            }
            if let Some(v) = present(&addr.country) {
                parts.push_str(v);
            }
            let parts = parts.trim();
            if !parts.is_empty() {
                section.push_str(&format!("Address: {parts}\n"));
            }
        }

        for phone in person.phone_entries() {
            if let Some(value) = present(&phone.value) {
                section.push_str(&format!("Phone: {value} "));
                if let Some(verified) = present(&phone.verified) {
                    section.push_str(&format!("(Verified: {verified})\n"));
                } else {
                    section.push('\n');
                }
            }
        }

        push_field(
            &mut section,
            "Additional Contact Information",
            present(&person.additional_contact_information),
        );
        if let Some(languages) = person.languages.as_ref().filter(|l| !l.is_empty()) {
            push_field(&mut section, "Languages", Some(&languages.join(", ")));
        }
        if let Some(races) = person.races.as_ref().filter(|r| !r.is_empty()) {
            push_field(&mut section, "Races", Some(&races.join(", ")));
        }
        if let Some(disabilities) = person.disabilities.as_ref().filter(|d| !d.is_empty()) {
            push_field(&mut section, "Disabilities", Some(&disabilities.join(", ")));
        }
        push_field(
            &mut section,
            "Additional Disability Information",
            present(&person.additional_disability_information),
        );

        if rules.tiktok_login_captures {
            for capture in person.source_captures() {
                if capture.capture_type.as_deref() != Some("IP Address") {
                    continue;
                }
                if let Some(ip) = present(&capture.value) {
                    section.push_str(&format!("IP Address (Login): {ip}\n"));
                    let date_time = present(&capture.date_time).unwrap_or("N/A");
                    section.push_str(&format!("Login Date/Time: {date_time}\n"));
                    let event = present(&capture.event_name).unwrap_or("N/A");
                    section.push_str(&format!("Event: {event}\n"));
                }
            }
        }

        if rules.imgur {
            for value in doc.additional_information_values() {
                section.push_str(&format!("Additional Information from ESP:\n{value}\n"));
            }
        }

        if rules.xcorp {
            let profile = person
                .additional_informations
                .first()
                .and_then(|info| info.value.as_deref())
                .map(ProfileSummary::parse)
                .unwrap_or_default();
            let profile_url = person
                .source_captures()
                .iter()
                .find(|c| c.capture_type.as_deref() == Some("Profile URL"))
                .and_then(|c| present(&c.value));

            push_field(&mut section, "Full Name", profile.full_name.as_deref());
            push_field(&mut section, "Location", profile.location.as_deref());
            push_field(&mut section, "Description", profile.description.as_deref());
            push_field(&mut section, "Profile URL", profile_url);
        }

        if rules.meetme {
            for value in doc.additional_information_values() {
                let Some(profile) = RegistrationProfile::parse(value) else {
                    continue;
                };
                section.push_str(&format!(
                    "{} (provided by visitor, and is NOT verified):\n",
                    narratives::REGISTRATION_MARKER
                ));
                push_field(&mut section, "MeetMe Profile Name", profile.profile_name.as_deref());
                push_field(&mut section, "MeetMe UserID", profile.user_id.as_deref());
                push_field(&mut section, "Date of Birth", profile.date_of_birth.as_deref());
                push_field(&mut section, "Approximate Age", profile.age.as_deref());
                if profile.city.is_some() || profile.state.is_some() || profile.zip.is_some() {
                    let mut addr = String::new();
                    if let Some(city) = &profile.city {
                        addr.push_str(&format!("{city}, "));
                    }
                    if let Some(state) = &profile.state {
                        addr.push_str(&format!("{state} "));
                    }
                    if let Some(zip) = &profile.zip {
                        addr.push_str(zip);
                    }
                    section.push_str(&format!("Address: {}\n", addr.trim()));
                }
                if let Some(email) = &profile.email {
                    section.push_str(&format!("Email: {email} {MEETME_EMAIL_NOTE}\n"));
                }
                push_field(&mut section, "Date Joined MeetMe", profile.date_joined.as_deref());
                push_field(&mut section, "Registration IP", profile.registration_ip.as_deref());
                push_field(&mut section, "Phone", profile.phone.as_deref());
                if let Some(gps) = &profile.gps {
                    section.push_str(&format!("Recent GPS Data: Lat./Long.: {gps}\n"));
                    section.push_str(GPS_NOTE);
                    section.push('\n');
                }
            }

            for capture in person.source_captures() {
                if capture.capture_type.as_deref() == Some("IP Address") {
                    if let Some(ip) = present(&capture.value) {
                        section.push_str(&format!("IP Address (Login): {ip}\n"));
                    }
                }
            }
        }

        section.push('\n');
    }

    section
}

// ============================================================================
// Evidence summary
// ============================================================================

pub fn evidence_section(
    doc: &ReportDocument,
    rules: ProviderRules,
    registry: &StatementRegistry,
    selected: &BTreeSet<String>,
) -> String {
    let mut section = String::from("EVIDENCE SUMMARY:\n");
    let webpages = doc.webpage_incidents();

    if rules.xcorp && !webpages.is_empty() {
        section.push_str("Webpage/URL Information:\n");
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
                .map(narratives::WebpageInfo::parse)
                .unwrap_or_default();

            section.push_str(&format!("  Webpage {}:\n", i + 1));
            if let Some(url) = url {
                section.push_str(&format!("    URL: {url}\n"));
            }
            if let Some(kind) = &info.kind {
                section.push_str(&format!("    Type: {kind}\n"));
            }
            if let Some(text) = &info.text {
                section.push_str(&format!("    Text: {text}\n"));
            }
        }
        section.push('\n');
    }

    if rules.reddit && !webpages.is_empty() {
        section.push_str("Reddit Chat Information:\n");
        for webpage in webpages {
            for info in &webpage.additional_informations {
                if let Some(value) = present(&info.value) {
                    section.push_str(&format!("Additional Information: {value}\n"));
                }
            }
        }
        section.push('\n');
    }

    let email_index = narratives::index_email_incidents(doc.email_incidents());
    let files = doc.files();
    let meta_statement = if selected.contains("meta") {
        registry.text_of("meta")
    } else {
        ""
    };

    for (index, file) in files.iter().enumerate() {
        section.push_str(&format!("FILE NUMBER {}:\n\n", index + 1));
        push_field(&mut section, "File Name", present(&file.filename));
        if rules.show_submittal_id {
            push_field(&mut section, "NCMEC Identifier", present(&file.submittal_id));
        }
        push_field(&mut section, "MD5 Hash", present(&file.verification_hash));

        if let Some(headers) = narratives::find_message_id(&file.additional_informations)
            .and_then(|id| email_index.get(&id))
        {
            push_field(&mut section, "Sent Date", headers.sent_date.as_deref());
            push_field(&mut section, "Emailed From", headers.from.as_deref());
            push_field(&mut section, "Emailed To", headers.to.as_deref());
        }
        push_field(&mut section, "Original Filename", present(&file.original_filename));

        push_description(&mut section, doc, file, rules);
        push_viewed_by_esp(&mut section, file, rules, meta_statement);
        push_upload_time(&mut section, file, rules);

        let tags = file.tag_values();
        if !tags.is_empty() {
            push_field(&mut section, "NCMEC Tags", Some(&tags.join(", ")));
        }

        let captures = file.source_captures();
        if !captures.is_empty() {
            section.push_str("Upload IP Address:\n");
            if rules.xcorp {
                section.push_str(XCORP_UPLOAD_IP_NOTE);
                section.push('\n');
            } else {
                for capture in captures {
                    if capture.capture_type.as_deref() == Some("IP Address") {
                        if let Some(value) = present(&capture.value) {
                            section.push_str(&format!("{value}\n"));
                        }
                    }
                }
            }
        }

        section.push_str(&format!("\n{INVESTIGATOR_TRAILER}\n\n"));
        section.push_str("Investigator's Description:\n");
        section.push('\n');

        if index < files.len() - 1 {
            section.push_str(&format!("{}\n\n", "=".repeat(50)));
        }
    }

    section
}

fn push_description(
    section: &mut String,
    doc: &ReportDocument,
    file: &UploadedFile,
    rules: ProviderRules,
) {
    let first_info = file
        .additional_informations
        .first()
        .and_then(|info| present(&info.value));

    if rules.strip_meta_boilerplate {
        if let Some(description) = first_info.and_then(filter_meta_description) {
            section.push_str(&format!("Additional Information from ESP:\n{description}\n"));
        }
    } else if rules.meetme {
        for value in doc.additional_information_values() {
            let messages = narratives::parse_private_messages(value);
            if messages.is_empty() {
                continue;
            }
            section.push_str("Private Message Correspondence:\n");
            let mut previous_subject: Option<&str> = None;
            for msg in &messages {
                if let Some(to) = &msg.to {
                    section.push_str(&format!("- To: {to}\n"));
                }
                if let Some(from) = &msg.from {
                    section.push_str(&format!("- From: {from}\n"));
                }
                if let Some(sent) = &msg.sent {
                    section.push_str(&format!("- Sent: {sent}\n"));
                }
                if let Some(subject) = msg.subject.as_deref() {
                    if previous_subject != Some(subject) {
                        section.push_str(&format!("- Subject: {subject}\n"));
                        previous_subject = Some(subject);
                    }
                }
                if let Some(message) = &msg.message {
                    section.push_str(&format!("- Message: {message}\n"));
                }
                section.push('\n');
            }
        }
    } else if let Some(raw) = first_info {
        let filtered = if rules.whatsapp_paragraphs {
            filter_whatsapp_description(raw)
        } else {
            filter_generic_description(raw)
        };
        if let Some(description) = filtered {
            section.push_str(&format!("Additional Information from ESP:\n{description}\n"));
        }
    }
}

fn push_viewed_by_esp(
    section: &mut String,
    file: &UploadedFile,
    rules: ProviderRules,
    meta_statement: &str,
) {
    match file.viewed_by_esp {
        Some(viewed) => {
            let answer = if viewed { "Yes" } else { "No" };
            section.push_str(&format!("Viewed by ESP: {answer}\n"));
            if rules.meta_review_note && !meta_statement.is_empty() {
                section.push_str(meta_statement);
                section.push_str("\n\n");
            }
        }
        None => section.push_str("Viewed by ESP: Unknown\n\n"),
    }
}

fn push_upload_time(section: &mut String, file: &UploadedFile, rules: ProviderRules) {
    if let Some(raw) = upload_time_raw(file, rules) {
        push_field(section, "Upload Date/Time", Some(&display_or_raw(&raw)));
    }
}

/// Raw upload timestamp for a file under the provider's sourcing rule:
/// Dropbox metadata, the Imgur UPLOAD capture, or the first capture.
pub fn upload_time_raw(file: &UploadedFile, rules: ProviderRules) -> Option<String> {
    if rules.dropbox_upload_metadata {
        file.metadata_value("Upload Date and Time").map(str::to_string)
    } else if rules.imgur {
        file.source_captures()
            .iter()
            .find(|c| {
                c.capture_type.as_deref() == Some("IP Address")
                    && c.event_name.as_deref() == Some("UPLOAD")
            })
            .and_then(|c| present(&c.date_time))
            .map(str::to_string)
    } else {
        file.source_captures()
            .first()
            .and_then(|c| present(&c.date_time))
            .map(str::to_string)
    }
}

// ============================================================================
// Provider IP section (inline, before the aggregate analysis)
// ============================================================================

/// MeetMe login-history section rendered inline within the narrative. Other
/// providers contribute nothing here.
pub fn provider_ip_section(
    doc: &ReportDocument,
    rules: ProviderRules,
    enricher: &Enricher<'_>,
) -> String {
    if !rules.meetme {
        return String::new();
    }

    let mut section = String::from("IP ADDRESS ANALYSIS:\n");
    let records: Vec<_> = doc
        .additional_information_values()
        .flat_map(narratives::parse_login_history)
        .collect();

    if records.is_empty() {
        section.push_str("No IP address login history found in the provided data.\n");
    } else {
        section.push_str(
            "The following IP addresses and login timestamps were extracted from the MeetMe \
             login history, with geolocation and ownership details:\n\n",
        );
        for record in &records {
            section.push_str(&format!("Login Date/Time: {}\n", record.timestamp));
            section.push_str(&format!("IP Address: {}\n", record.ip));
            if let Some(device) = &record.device {
                section.push_str(&format!("Device: {device}\n"));
            }
            section.push_str(&enricher.geo_block(&record.ip, "  "));
            section.push_str(&enricher.registry_block(&record.ip, "  "));
            section.push('\n');
        }
    }

    section.push('\n');
    section
}
