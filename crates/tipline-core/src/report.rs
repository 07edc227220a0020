//! Input data model for a CyberTipline JSON report.
//!
//! Every field below the root is optional: providers populate wildly
//! different subsets, and several nest optional containers inside optional
//! containers. The model mirrors the wire shape (camelCase) and the
//! accessors flatten the double-nested collection wrappers so callers never
//! have to care which level was absent.

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Treat `None` and the `"N/A"` placeholder as absent. Nothing that fails
/// this check is ever rendered.
pub fn present(value: &Option<String>) -> Option<&str> {
    match value.as_deref() {
        None | Some("N/A") => None,
        Some(v) => Some(v),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub report_id: Option<String>,
    pub date_received: Option<String>,
    #[serde(default)]
    pub reported_information: ReportedInformation,
}

impl ReportDocument {
    /// Load and parse a report file. This is the only fatal failure path
    /// of an analysis run.
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Reporting-service identity string, empty when absent.
    pub fn esp_name(&self) -> &str {
        self.reported_information
            .reporting_esp
            .as_ref()
            .and_then(|esp| present(&esp.esp_name))
            .unwrap_or("")
    }

    pub fn reporter_last_name(&self) -> Option<&str> {
        self.reported_information
            .reporting_esp
            .as_ref()
            .and_then(|esp| present(&esp.last_name))
    }

    pub fn persons(&self) -> &[Person] {
        self.reported_information
            .reported_people
            .as_ref()
            .map(|p| p.reported_persons.as_slice())
            .unwrap_or(&[])
    }

    pub fn files(&self) -> &[UploadedFile] {
        self.reported_information
            .uploaded_files
            .as_ref()
            .map(|f| f.uploaded_files.as_slice())
            .unwrap_or(&[])
    }

    pub fn webpage_incidents(&self) -> &[WebpageIncident] {
        self.reported_information
            .incident_details
            .as_ref()
            .map(|d| d.webpage_incident.as_slice())
            .unwrap_or(&[])
    }

    pub fn email_incidents(&self) -> &[EmailIncident] {
        self.reported_information
            .incident_details
            .as_ref()
            .map(|d| d.email_incident.as_slice())
            .unwrap_or(&[])
    }

    /// Report-level free-form "additional information" values.
    pub fn additional_information_values(&self) -> impl Iterator<Item = &str> {
        self.reported_information
            .additional_informations
            .iter()
            .filter_map(|info| present(&info.value))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedInformation {
    pub incident_summary: Option<IncidentSummary>,
    pub reporting_esp: Option<ReportingEsp>,
    pub reported_people: Option<ReportedPeople>,
    pub uploaded_files: Option<UploadedFiles>,
    pub incident_details: Option<IncidentDetails>,
    #[serde(default)]
    pub additional_informations: Vec<AdditionalInformation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentSummary {
    pub incident_type: Option<String>,
    pub incident_date_time: Option<String>,
    pub incident_date_time_description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingEsp {
    pub esp_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedPeople {
    #[serde(default)]
    pub reported_persons: Vec<Person>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFiles {
    #[serde(default)]
    pub uploaded_files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDetails {
    #[serde(default)]
    pub webpage_incident: Vec<WebpageIncident>,
    #[serde(default)]
    pub email_incident: Vec<EmailIncident>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalInformation {
    pub value: Option<String>,
}

/// Suspect/witness record. Every field is optional and may also carry the
/// `"N/A"` placeholder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub preferred_name: Option<String>,
    pub gender: Option<String>,
    pub preferred_pronouns: Option<String>,
    pub date_of_birth: Option<String>,
    pub approximate_age: Option<String>,
    pub physical_description: Option<String>,
    pub vehicle_description: Option<String>,
    pub vehicle_tag_number: Option<String>,
    pub occupation: Option<String>,
    pub esp_service: Option<String>,
    pub esp_user_id: Option<String>,
    pub ip_address: Option<String>,
    pub relationship_to_reporter: Option<String>,
    pub relationship_to_child_victim: Option<String>,
    pub access_to_child_victim: Option<String>,
    pub access_to_children: Option<String>,
    pub access_to_firearms: Option<String>,
    pub convicted_sex_offender: Option<String>,
    pub aware_of_report: Option<String>,
    pub gang_affiliation: Option<String>,
    pub screen_name: Option<ScreenName>,
    pub emails: Option<Emails>,
    pub phones: Option<Phones>,
    pub addresses: Option<Addresses>,
    pub additional_contact_information: Option<String>,
    pub languages: Option<Vec<String>>,
    pub races: Option<Vec<String>>,
    pub disabilities: Option<Vec<String>>,
    pub additional_disability_information: Option<String>,
    #[serde(default)]
    pub additional_informations: Vec<AdditionalInformation>,
    pub source_information: Option<SourceInformation>,
}

impl Person {
    pub fn source_captures(&self) -> &[SourceCapture] {
        self.source_information
            .as_ref()
            .map(|s| s.source_captures.as_slice())
            .unwrap_or(&[])
    }

    pub fn email_entries(&self) -> &[VerifiedValue] {
        self.emails.as_ref().map(|e| e.emails.as_slice()).unwrap_or(&[])
    }

    pub fn phone_entries(&self) -> &[VerifiedValue] {
        self.phones.as_ref().map(|p| p.phones.as_slice()).unwrap_or(&[])
    }

    pub fn address_entries(&self) -> &[Address] {
        self.addresses
            .as_ref()
            .map(|a| a.addresses.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenName {
    pub value: Option<String>,
}

/// Contact value (email or phone) with an optional provider verification
/// marker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedValue {
    pub value: Option<String>,
    pub verified: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emails {
    #[serde(default)]
    pub emails: Vec<VerifiedValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phones {
    #[serde(default)]
    pub phones: Vec<VerifiedValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addresses {
    #[serde(default)]
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Evidence item uploaded to the tipline, in received order. Display
/// numbers are assigned downstream and are independent of these fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub original_filename: Option<String>,
    pub submittal_id: Option<String>,
    pub verification_hash: Option<String>,
    /// Tri-state: confirmed viewed / confirmed not viewed / unknown.
    pub viewed_by_esp: Option<bool>,
    #[serde(default)]
    pub additional_informations: Vec<AdditionalInformation>,
    pub esp_metadata: Option<EspMetadata>,
    pub ncmec_tags: Option<NcmecTags>,
    pub source_information: Option<SourceInformation>,
}

impl UploadedFile {
    pub fn source_captures(&self) -> &[SourceCapture] {
        self.source_information
            .as_ref()
            .map(|s| s.source_captures.as_slice())
            .unwrap_or(&[])
    }

    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.esp_metadata
            .as_ref()?
            .metadatas
            .iter()
            .find(|m| m.name.as_deref() == Some(name))
            .and_then(|m| present(&m.value))
    }

    /// Tag values from the first tag group, joined downstream.
    pub fn tag_values(&self) -> Vec<&str> {
        self.ncmec_tags
            .as_ref()
            .and_then(|t| t.groups.first())
            .map(|g| {
                g.tags
                    .iter()
                    .filter_map(|tag| present(&tag.value))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EspMetadata {
    #[serde(default)]
    pub metadatas: Vec<Metadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NcmecTags {
    #[serde(default)]
    pub groups: Vec<TagGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagGroup {
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub value: Option<String>,
}

/// Secondary evidence record with provider-specific narrative text that is
/// decomposed by the line-prefix parsers in the assembly crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebpageIncident {
    #[serde(default)]
    pub additional_informations: Vec<AdditionalInformation>,
    pub source_information: Option<SourceInformation>,
}

impl WebpageIncident {
    pub fn source_captures(&self) -> &[SourceCapture] {
        self.source_information
            .as_ref()
            .map(|s| s.source_captures.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailIncident {
    #[serde(default)]
    pub contents: Vec<AdditionalInformation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInformation {
    #[serde(default)]
    pub source_captures: Vec<SourceCapture>,
}

/// One observed event tied to a person, file, or webpage. The tuple
/// (value, date_time, port, event_name) is the unit of deduplication for
/// the IP aggregator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCapture {
    pub capture_type: Option<String>,
    pub value: Option<String>,
    pub date_time: Option<String>,
    pub port: Option<u32>,
    pub event_name: Option<String>,
}
