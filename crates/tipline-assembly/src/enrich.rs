//! IP enrichment: MaxMind geolocation and ARIN WHOIS lookups.
//!
//! Lookups sit behind traits so report assembly can run against fakes in
//! tests. Failures never abort a run; they become in-band marker lines in
//! the rendered output.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Not-queried marker shared by the text report and the spreadsheet.
pub const NOT_QUERIED: &str = "Not queried (IP limit applied)";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("{0} credentials not provided")]
    NotConfigured(&'static str),
    #[error("{0} query timed out after 10 seconds")]
    Timeout(&'static str),
    #[error("{0} request failed with status {1}")]
    Status(&'static str, u16),
    #[error("{0} request failed: {1}")]
    Transport(&'static str, String),
    #[error("{0} returned an unreadable response: {1}")]
    Malformed(&'static str, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoRecord {
    pub country: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryRecord {
    pub organization: Option<String>,
}

pub trait GeoLookup {
    fn geolocate(&self, ip: &str) -> Result<GeoRecord, LookupError>;
}

pub trait RegistryLookup {
    fn whois(&self, ip: &str) -> Result<RegistryRecord, LookupError>;
}

// ============================================================================
// MaxMind
// ============================================================================

#[derive(Debug, Deserialize)]
struct MaxMindResponse {
    country: Option<NamedEntity>,
    city: Option<NamedEntity>,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    names: Option<NameMap>,
}

#[derive(Debug, Deserialize)]
struct NameMap {
    en: Option<String>,
}

/// GeoLite2 web service client keyed by account id and license key.
pub struct MaxMindClient {
    account_id: String,
    license_key: String,
    client: reqwest::blocking::Client,
}

impl MaxMindClient {
    pub fn new(account_id: String, license_key: String) -> Self {
        MaxMindClient {
            account_id,
            license_key,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl GeoLookup for MaxMindClient {
    fn geolocate(&self, ip: &str) -> Result<GeoRecord, LookupError> {
        if self.account_id.is_empty() || self.license_key.is_empty() {
            return Err(LookupError::NotConfigured("MaxMind"));
        }
        let url = format!("https://geolite.info/geoip/v2.1/city/{ip}");
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.account_id, Some(&self.license_key))
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout("MaxMind")
                } else {
                    LookupError::Transport("MaxMind", e.to_string())
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status("MaxMind", status.as_u16()));
        }
        let body: MaxMindResponse = response
            .json()
            .map_err(|e| LookupError::Malformed("MaxMind", e.to_string()))?;
        Ok(GeoRecord {
            country: body.country.and_then(|c| c.names).and_then(|n| n.en),
            city: body.city.and_then(|c| c.names).and_then(|n| n.en),
        })
    }
}

// ============================================================================
// ARIN
// ============================================================================

#[derive(Debug, Deserialize)]
struct ArinResponse {
    net: Option<ArinNet>,
}

#[derive(Debug, Deserialize)]
struct ArinNet {
    #[serde(rename = "orgRef")]
    org_ref: Option<ArinOrgRef>,
}

#[derive(Debug, Deserialize)]
struct ArinOrgRef {
    #[serde(rename = "@name")]
    name: Option<String>,
}

/// ARIN RWS client. The api key is optional; unauthenticated queries are
/// rate limited but valid.
pub struct ArinClient {
    api_key: String,
    client: reqwest::blocking::Client,
}

impl ArinClient {
    pub fn new(api_key: String) -> Self {
        ArinClient {
            api_key,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl RegistryLookup for ArinClient {
    fn whois(&self, ip: &str) -> Result<RegistryRecord, LookupError> {
        let mut url = format!("https://whois.arin.net/rest/ip/{ip}.json");
        if !self.api_key.is_empty() {
            url = format!("{url}?apikey={}", self.api_key);
        }
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout("ARIN")
                } else {
                    LookupError::Transport("ARIN", e.to_string())
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status("ARIN", status.as_u16()));
        }
        let body: ArinResponse = response
            .json()
            .map_err(|e| LookupError::Malformed("ARIN", e.to_string()))?;
        Ok(RegistryRecord {
            organization: body.net.and_then(|n| n.org_ref).and_then(|o| o.name),
        })
    }
}

// ============================================================================
// Rendering helpers
// ============================================================================

/// One row of enrichment values for the spreadsheet export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentCells {
    pub country: String,
    pub city: String,
    pub organization: String,
}

/// Pairs the two lookups and renders their results in the report's
/// indent-sensitive block form.
pub struct Enricher<'a> {
    pub geo: &'a dyn GeoLookup,
    pub registry: &'a dyn RegistryLookup,
}

impl<'a> Enricher<'a> {
    pub fn new(geo: &'a dyn GeoLookup, registry: &'a dyn RegistryLookup) -> Self {
        Enricher { geo, registry }
    }

    /// `MaxMind Geolocation Data:` block with values (or the error) on
    /// lines indented by `indent`.
    pub fn geo_block(&self, ip: &str, indent: &str) -> String {
        let mut block = String::from("MaxMind Geolocation Data:\n");
        match self.geo.geolocate(ip) {
            Ok(geo) => {
                let country = geo.country.as_deref().unwrap_or("N/A");
                let city = geo.city.as_deref().unwrap_or("N/A");
                block.push_str(&format!("{indent}Country: {country}\n"));
                block.push_str(&format!("{indent}City: {city}\n"));
            }
            Err(err) => block.push_str(&format!("{indent}Error: {err}\n")),
        }
        block
    }

    /// `ARIN WHOIS Data:` block in the same shape.
    pub fn registry_block(&self, ip: &str, indent: &str) -> String {
        let mut block = String::from("ARIN WHOIS Data:\n");
        match self.registry.whois(ip) {
            Ok(record) => {
                let org = record.organization.as_deref().unwrap_or("N/A");
                block.push_str(&format!("{indent}Organization: {org}\n"));
            }
            Err(err) => block.push_str(&format!("{indent}Error: {err}\n")),
        }
        block
    }

    /// Spreadsheet cells for one queried address. Lookup errors land in
    /// the affected cells as `Error: ...` text.
    pub fn cells(&self, ip: &str) -> EnrichmentCells {
        let (country, city) = match self.geo.geolocate(ip) {
            Ok(geo) => (
                geo.country.unwrap_or_else(|| "N/A".to_string()),
                geo.city.unwrap_or_else(|| "N/A".to_string()),
            ),
            Err(err) => (format!("Error: {err}"), "N/A".to_string()),
        };
        let organization = match self.registry.whois(ip) {
            Ok(record) => record.organization.unwrap_or_else(|| "N/A".to_string()),
            Err(err) => format!("Error: {err}"),
        };
        EnrichmentCells {
            country,
            city,
            organization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGeo(Result<GeoRecord, LookupError>);
    impl GeoLookup for FixedGeo {
        fn geolocate(&self, _ip: &str) -> Result<GeoRecord, LookupError> {
            self.0.clone()
        }
    }

    struct FixedRegistry(Result<RegistryRecord, LookupError>);
    impl RegistryLookup for FixedRegistry {
        fn whois(&self, _ip: &str) -> Result<RegistryRecord, LookupError> {
            self.0.clone()
        }
    }

    #[test]
    fn lookup_errors_render_expected_messages() {
        assert_eq!(
            LookupError::NotConfigured("MaxMind").to_string(),
            "MaxMind credentials not provided"
        );
        assert_eq!(
            LookupError::Timeout("ARIN").to_string(),
            "ARIN query timed out after 10 seconds"
        );
        assert_eq!(
            LookupError::Status("MaxMind", 401).to_string(),
            "MaxMind request failed with status 401"
        );
    }

    #[test]
    fn blocks_carry_indent_and_fallbacks() {
        let geo = FixedGeo(Ok(GeoRecord {
            country: Some("United States".to_string()),
            city: None,
        }));
        let registry = FixedRegistry(Err(LookupError::Timeout("ARIN")));
        let enricher = Enricher::new(&geo, &registry);

        assert_eq!(
            enricher.geo_block("1.2.3.4", "        "),
            "MaxMind Geolocation Data:\n        Country: United States\n        City: N/A\n"
        );
        assert_eq!(
            enricher.registry_block("1.2.3.4", "  "),
            "ARIN WHOIS Data:\n  Error: ARIN query timed out after 10 seconds\n"
        );
    }

    #[test]
    fn cells_embed_errors_in_band() {
        let geo = FixedGeo(Err(LookupError::NotConfigured("MaxMind")));
        let registry = FixedRegistry(Ok(RegistryRecord {
            organization: Some("EXAMPLE-ORG".to_string()),
        }));
        let enricher = Enricher::new(&geo, &registry);
        let cells = enricher.cells("1.2.3.4");
        assert_eq!(cells.country, "Error: MaxMind credentials not provided");
        assert_eq!(cells.city, "N/A");
        assert_eq!(cells.organization, "EXAMPLE-ORG");
    }

    #[test]
    fn wire_shapes_deserialize() {
        let geo: MaxMindResponse = serde_json::from_str(
            r#"{"country":{"names":{"en":"Canada"}},"city":{"names":{"en":"Toronto"}}}"#,
        )
        .unwrap();
        assert_eq!(geo.country.unwrap().names.unwrap().en.as_deref(), Some("Canada"));

        let arin: ArinResponse =
            serde_json::from_str(r#"{"net":{"orgRef":{"@name":"EXAMPLE-ORG"}}}"#).unwrap();
        assert_eq!(
            arin.net.unwrap().org_ref.unwrap().name.as_deref(),
            Some("EXAMPLE-ORG")
        );
    }
}
