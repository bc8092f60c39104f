//! DOI metadata schema and DataCite payload shaping.
//!
//! Mirrors the attribute document the DataCite REST API expects:
//! `{"data": {"type": "dois", "attributes": {...}}}` with camelCase keys.
//! The content hash over the attributes is what the reconciler compares to
//! decide whether an update is needed.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use beamdoi_core::MetadataHash;

/// A dataset title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub title: String,
}

impl Title {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Name identifier attached to a creator (ORCID in practice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameIdentifier {
    pub name_identifier: String,
    pub name_identifier_scheme: String,
    pub scheme_uri: String,
}

/// A dataset creator, typically the beamtime spokesperson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub name: String,
    pub name_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name_identifiers: Vec<NameIdentifier>,
}

impl Creator {
    /// Build a personal creator with DataCite's `Family, Given` name form.
    #[must_use]
    pub fn person(given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        let given = given_name.into();
        let family = family_name.into();
        Self {
            name: format!("{family}, {given}"),
            name_type: "Personal".to_string(),
            given_name: Some(given),
            family_name: Some(family),
            name_identifiers: Vec::new(),
        }
    }

    /// Attach an ORCID identifier.
    #[must_use]
    pub fn with_orcid(mut self, orcid: impl Into<String>) -> Self {
        self.name_identifiers.push(NameIdentifier {
            name_identifier: orcid.into(),
            name_identifier_scheme: "ORCID".to_string(),
            scheme_uri: "https://orcid.org".to_string(),
        });
        self
    }
}

/// Resource type classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceType {
    pub resource_type: String,
    pub resource_type_general: String,
}

impl ResourceType {
    /// The classification used for all beamtime datasets.
    #[must_use]
    pub fn dataset() -> Self {
        Self {
            resource_type: "Dataset".to_string(),
            resource_type_general: "Dataset".to_string(),
        }
    }
}

/// A dated event attached to the DOI (issued date in practice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateEntry {
    pub date: String,
    pub date_type: String,
}

impl DateEntry {
    #[must_use]
    pub fn issued(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            date_type: "Issued".to_string(),
        }
    }
}

/// A rights/license entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightsEntry {
    pub rights: String,
    pub rights_uri: String,
    pub rights_identifier: String,
    pub rights_identifier_scheme: String,
    pub scheme_uri: String,
}

impl RightsEntry {
    /// The CC-BY-4.0 license applied to published beamtime data.
    #[must_use]
    pub fn cc_by_4() -> Self {
        Self {
            rights: "Creative Commons Attribution 4.0 International".to_string(),
            rights_uri: "https://creativecommons.org/licenses/by/4.0/legalcode".to_string(),
            rights_identifier: "CC-BY-4.0".to_string(),
            rights_identifier_scheme: "SPDX".to_string(),
            scheme_uri: "https://spdx.org/licenses/".to_string(),
        }
    }
}

/// A related identifier entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedIdentifier {
    pub related_identifier: String,
    pub related_identifier_type: String,
    pub relation_type: String,
}

/// An alternate identifier entry, e.g. the local beamtime number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateIdentifier {
    pub alternate_identifier: String,
    pub alternate_identifier_type: String,
}

/// The DOI attribute document for one beamtime dataset.
///
/// Field order is fixed by the struct declaration, so the JSON encoding is
/// deterministic and suitable for content hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoiMetadata {
    pub titles: Vec<Title>,
    pub creators: Vec<Creator>,
    pub publisher: String,
    pub publication_year: i32,
    pub types: ResourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<DateEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rights_list: Vec<RightsEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_identifiers: Vec<RelatedIdentifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_identifiers: Vec<AlternateIdentifier>,
    /// Landing page for the public dataset folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl DoiMetadata {
    /// Minimal valid metadata for a dataset.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        creators: Vec<Creator>,
        publisher: impl Into<String>,
        publication_year: i32,
    ) -> Self {
        Self {
            titles: vec![Title::new(title)],
            creators,
            publisher: publisher.into(),
            publication_year,
            types: ResourceType::dataset(),
            language: Some("en".to_string()),
            version: None,
            dates: Vec::new(),
            rights_list: Vec::new(),
            related_identifiers: Vec::new(),
            alternate_identifiers: Vec::new(),
            url: None,
        }
    }

    /// Content hash of the attribute document.
    #[must_use]
    pub fn content_hash(&self) -> MetadataHash {
        let encoded = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&encoded);
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        MetadataHash::from_hex(hex)
    }

    /// The DOI suffix convention for a beamtime dataset: `{prefix}/data_{id}`.
    #[must_use]
    pub fn conventional_doi(prefix: &str, beamtime_id: &str) -> String {
        format!("{prefix}/data_{beamtime_id}")
    }

    /// Build the DataCite API payload.
    ///
    /// `doi` requests a specific identifier (creates) or names the existing
    /// one (updates). `event` is `"draft"` for draft registration.
    #[must_use]
    pub fn to_payload(&self, prefix: &str, event: &str, doi: Option<&str>) -> serde_json::Value {
        let mut attributes = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        attributes.insert("event".to_string(), event.into());
        attributes.insert("prefix".to_string(), prefix.into());
        if let Some(doi) = doi {
            attributes.insert("doi".to_string(), doi.into());
        }

        let mut data = serde_json::Map::new();
        if let Some(doi) = doi {
            data.insert("id".to_string(), doi.into());
        }
        data.insert("type".to_string(), "dois".into());
        data.insert("attributes".to_string(), serde_json::Value::Object(attributes));

        serde_json::json!({ "data": data })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn sample() -> DoiMetadata {
        let creator = Creator::person("Ada", "Lovelace").with_orcid("0000-0001-2345-6789");
        let mut metadata =
            DoiMetadata::new("Sample beamtime", vec![creator], "University of Chicago", 2025);
        metadata.rights_list = vec![RightsEntry::cc_by_4()];
        metadata.dates = vec![DateEntry::issued("2025-03-01")];
        metadata.url = Some("https://public.example.org/data/2025/bt-1".to_string());
        metadata
    }

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(sample().content_hash(), sample().content_hash());
    }

    #[test]
    fn content_hash_changes_with_metadata() {
        let mut changed = sample();
        changed.titles = vec![Title::new("Renamed beamtime")];
        assert_ne!(sample().content_hash(), changed.content_hash());
    }

    #[test]
    fn payload_has_datacite_shape() {
        let payload = sample().to_payload("10.12345", "draft", Some("10.12345/data_bt-1"));
        assert_eq!(payload["data"]["type"], "dois");
        assert_eq!(payload["data"]["attributes"]["event"], "draft");
        assert_eq!(payload["data"]["attributes"]["prefix"], "10.12345");
        assert_eq!(payload["data"]["attributes"]["doi"], "10.12345/data_bt-1");
        assert_eq!(
            payload["data"]["attributes"]["publicationYear"],
            serde_json::json!(2025)
        );
        assert_eq!(
            payload["data"]["attributes"]["creators"][0]["name"],
            "Lovelace, Ada"
        );
    }

    #[test]
    fn payload_omits_doi_when_unset() {
        let payload = sample().to_payload("10.12345", "draft", None);
        assert!(payload["data"]["attributes"].get("doi").is_none());
        assert!(payload["data"].get("id").is_none());
    }

    #[test]
    fn conventional_doi_format() {
        assert_eq!(
            DoiMetadata::conventional_doi("10.12345", "bt-7"),
            "10.12345/data_bt-7"
        );
    }

    #[test]
    fn attributes_round_trip() {
        let metadata = sample();
        let json = serde_json::to_string(&metadata).unwrap();
        let back: DoiMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(metadata, back);
    }
}
