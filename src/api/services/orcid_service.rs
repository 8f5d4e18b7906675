//! ORCID public API client for researcher lookup.
//!
//! API docs: https://info.orcid.org/documentation/api-tutorials/
//! No retries: a failed call surfaces as an upstream error.

use super::error::ServiceError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, error};
use url::Url;
use utoipa::ToSchema;

pub const DEFAULT_ORCID_API_URL: &str = "https://pub.orcid.org";
pub const DEFAULT_SEARCH_ROWS: u32 = 10;
pub const MAX_SEARCH_ROWS: u32 = 50;

static ORCID_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^\d{4}-\d{4}-\d{4}-\d{3}[\dX]$").expect("valid ORCID pattern")
});

/// A researcher as returned to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrcidProfile {
    pub orcid_id: String,
    pub given_names: Option<String>,
    pub family_name: Option<String>,
    pub credit_name: Option<String>,
    pub institutions: Vec<String>,
    pub emails: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpandedSearchResponse {
    #[serde(rename = "expanded-result")]
    expanded_result: Option<Vec<ExpandedResult>>,
}

#[derive(Debug, Deserialize)]
struct ExpandedResult {
    #[serde(rename = "orcid-id")]
    orcid_id: String,
    #[serde(rename = "given-names")]
    given_names: Option<String>,
    #[serde(rename = "family-names")]
    family_names: Option<String>,
    #[serde(rename = "credit-name")]
    credit_name: Option<String>,
    #[serde(rename = "institution-name", default)]
    institution_name: Vec<String>,
    #[serde(default)]
    email: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PersonResponse {
    name: Option<PersonName>,
    biography: Option<Biography>,
    emails: Option<PersonEmails>,
}

#[derive(Debug, Deserialize)]
struct PersonName {
    #[serde(rename = "given-names")]
    given_names: Option<ValueField>,
    #[serde(rename = "family-name")]
    family_name: Option<ValueField>,
    #[serde(rename = "credit-name")]
    credit_name: Option<ValueField>,
}

#[derive(Debug, Deserialize)]
struct ValueField {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Biography {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PersonEmails {
    #[serde(default)]
    email: Vec<PersonEmail>,
}

#[derive(Debug, Deserialize)]
struct PersonEmail {
    email: Option<String>,
}

fn value_of(field: Option<ValueField>) -> Option<String> {
    field.and_then(|f| f.value).filter(|v| !v.trim().is_empty())
}

/// Strip an `https://orcid.org/` prefix and upper-case the check character.
pub fn normalize_orcid(raw: &str) -> String {
    let trimmed = raw.trim();
    let bare = trimmed
        .strip_prefix("https://orcid.org/")
        .or_else(|| trimmed.strip_prefix("http://orcid.org/"))
        .unwrap_or(trimmed);
    bare.to_ascii_uppercase()
}

/// Whether `orcid_id` is `dddd-dddd-dddd-dddX` with a valid ISO 7064 MOD 11-2 check digit.
pub fn is_valid_orcid(orcid_id: &str) -> bool {
    if !ORCID_RE.is_match(orcid_id) {
        return false;
    }
    let digits: Vec<char> = orcid_id.chars().filter(|c| *c != '-').collect();
    let (body, check) = digits.split_at(15);

    let mut total: u32 = 0;
    for c in body {
        let Some(d) = c.to_digit(10) else {
            return false;
        };
        total = (total + d) * 2;
    }
    let result = (12 - total % 11) % 11;
    let expected = if result == 10 {
        'X'
    } else {
        char::from_digit(result, 10).unwrap_or('?')
    };
    check[0] == expected
}

/// Parse an expanded-search response into profiles.
pub fn parse_search_response(json: &str) -> Result<Vec<OrcidProfile>, ServiceError> {
    let response: ExpandedSearchResponse = serde_json::from_str(json)
        .map_err(|e| ServiceError::Upstream(format!("Invalid ORCID search JSON: {}", e)))?;

    Ok(response
        .expanded_result
        .unwrap_or_default()
        .into_iter()
        .map(|r| OrcidProfile {
            orcid_id: r.orcid_id,
            given_names: r.given_names,
            family_name: r.family_names,
            credit_name: r.credit_name,
            institutions: r.institution_name,
            emails: r.email,
            biography: None,
        })
        .collect())
}

/// Parse a `/person` record into a profile.
pub fn parse_person_response(orcid_id: &str, json: &str) -> Result<OrcidProfile, ServiceError> {
    let person: PersonResponse = serde_json::from_str(json)
        .map_err(|e| ServiceError::Upstream(format!("Invalid ORCID person JSON: {}", e)))?;

    let (given_names, family_name, credit_name) = match person.name {
        Some(name) => (
            value_of(name.given_names),
            value_of(name.family_name),
            value_of(name.credit_name),
        ),
        None => (None, None, None),
    };
    let emails = person
        .emails
        .map(|e| e.email.into_iter().filter_map(|e| e.email).collect())
        .unwrap_or_default();

    Ok(OrcidProfile {
        orcid_id: orcid_id.to_string(),
        given_names,
        family_name,
        credit_name,
        institutions: Vec::new(),
        emails,
        biography: person.biography.and_then(|b| b.content),
    })
}

#[derive(Clone)]
pub struct OrcidClient {
    http: reqwest::Client,
    base_url: Url,
}

impl OrcidClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v3.0/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Free-text researcher search. `rows` is clamped to 1..=50.
    pub async fn search(
        &self,
        query: &str,
        rows: Option<u32>,
    ) -> Result<Vec<OrcidProfile>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::Validation(
                "Search query is required".to_string(),
            ));
        }
        let rows = rows.unwrap_or(DEFAULT_SEARCH_ROWS).clamp(1, MAX_SEARCH_ROWS);
        let url = format!(
            "{}?q={}&rows={}",
            self.endpoint("expanded-search/"),
            urlencoding::encode(query),
            rows
        );

        let body = self.fetch(&url).await?;
        let profiles = parse_search_response(&body)?;
        debug!(query = %query, results = profiles.len(), "ORCID search completed");
        Ok(profiles)
    }

    pub async fn profile(&self, orcid_id: &str) -> Result<OrcidProfile, ServiceError> {
        let orcid_id = normalize_orcid(orcid_id);
        if !is_valid_orcid(&orcid_id) {
            return Err(ServiceError::Validation(format!(
                "Invalid ORCID iD: {}",
                orcid_id
            )));
        }

        let url = self.endpoint(&format!("{}/person", orcid_id));
        let body = self.fetch(&url).await?;
        parse_person_response(&orcid_id, &body)
    }

    async fn fetch(&self, url: &str) -> Result<String, ServiceError> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, "ORCID request failed: {}", e);
                ServiceError::Upstream(format!("ORCID request failed: {}", e))
            })?;

        match response.status() {
            status if status.is_success() => response.text().await.map_err(|e| {
                ServiceError::Upstream(format!("Failed to read ORCID response: {}", e))
            }),
            StatusCode::NOT_FOUND => Err(ServiceError::NotFound(
                "ORCID record not found".to_string(),
            )),
            status => {
                error!(url = %url, status = %status, "ORCID returned an error status");
                Err(ServiceError::Upstream(format!(
                    "ORCID returned status {}",
                    status
                )))
            }
        }
    }
}
