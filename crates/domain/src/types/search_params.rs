//! Search parameters, tagged by job kind
//!
//! Parameters are normalized and validated entirely locally; nothing reaches
//! the network until [`SearchParameters::validated`] succeeds.

use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use super::list::NewList;
use super::search_job::JobKind;
use crate::constants::{industry_label, DEFAULT_MAX_RESULTS, MAX_MAX_RESULTS, MIN_MAX_RESULTS};
use crate::errors::{ClientError, Result};

/// Body of `POST /api/search/keyword`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct KeywordParameters {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl KeywordParameters {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            exclude_keywords: Vec::new(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    #[must_use]
    pub fn excluding<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

/// Body of `POST /api/search/industry-location`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct IndustryLocationParameters {
    pub industry_codes: Vec<String>,
    pub prefectures: Vec<String>,
    /// Narrows the prefectures; meaningless without them
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl IndustryLocationParameters {
    pub fn new<I, P, S, T>(industry_codes: I, prefectures: P) -> Self
    where
        I: IntoIterator<Item = S>,
        P: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            industry_codes: industry_codes.into_iter().map(Into::into).collect(),
            prefectures: prefectures.into_iter().map(Into::into).collect(),
            cities: Vec::new(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    #[must_use]
    pub fn in_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cities = cities.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

/// Search parameters keyed by job kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
#[serde(tag = "job_type", rename_all = "snake_case")]
pub enum SearchParameters {
    Keyword(KeywordParameters),
    IndustryLocation(IndustryLocationParameters),
}

impl From<KeywordParameters> for SearchParameters {
    fn from(params: KeywordParameters) -> Self {
        Self::Keyword(params)
    }
}

impl From<IndustryLocationParameters> for SearchParameters {
    fn from(params: IndustryLocationParameters) -> Self {
        Self::IndustryLocation(params)
    }
}

impl SearchParameters {
    pub fn kind(&self) -> JobKind {
        match self {
            Self::Keyword(_) => JobKind::Keyword,
            Self::IndustryLocation(_) => JobKind::IndustryLocation,
        }
    }

    pub fn max_results(&self) -> u32 {
        match self {
            Self::Keyword(p) => p.max_results,
            Self::IndustryLocation(p) => p.max_results,
        }
    }

    /// Trim and de-duplicate every set, then check the kind-specific schema.
    ///
    /// # Errors
    /// `ClientError::Validation` naming the first offending field.
    pub fn validated(self) -> Result<Self> {
        match self {
            Self::Keyword(p) => {
                let keywords = normalize_set("keywords", p.keywords)?;
                require_non_empty("keywords", &keywords)?;
                let exclude_keywords = normalize_set("exclude_keywords", p.exclude_keywords)?;
                check_max_results(p.max_results)?;

                Ok(Self::Keyword(KeywordParameters {
                    keywords,
                    exclude_keywords,
                    max_results: p.max_results,
                }))
            }
            Self::IndustryLocation(p) => {
                let industry_codes = normalize_set("industry_codes", p.industry_codes)?;
                require_non_empty("industry_codes", &industry_codes)?;
                let prefectures = normalize_set("prefectures", p.prefectures)?;
                require_non_empty("prefectures", &prefectures)?;
                let cities = normalize_set("cities", p.cities)?;
                check_max_results(p.max_results)?;

                Ok(Self::IndustryLocation(IndustryLocationParameters {
                    industry_codes,
                    prefectures,
                    cities,
                    max_results: p.max_results,
                }))
            }
        }
    }

    /// Human-readable summary used as a list description when the caller
    /// supplies none.
    pub fn summary(&self) -> String {
        match self {
            Self::Keyword(p) => format!("Keyword search: {}", p.keywords.join(", ")),
            Self::IndustryLocation(p) => {
                let industries: Vec<&str> =
                    p.industry_codes.iter().map(|code| industry_label(code)).collect();
                format!(
                    "Industry/location search: {} / {}",
                    industries.join(", "),
                    p.prefectures.join(", ")
                )
            }
        }
    }

    /// JSON body for the job-create endpoint (without the kind tag)
    pub fn to_request_body(&self) -> serde_json::Value {
        let body = match self {
            Self::Keyword(p) => serde_json::to_value(p),
            Self::IndustryLocation(p) => serde_json::to_value(p),
        };
        // Both parameter structs contain only strings and integers.
        body.unwrap_or(serde_json::Value::Null)
    }
}

/// Caller-supplied metadata for the list that will own the results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct ListMeta {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ListMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Trimmed name; blank names are rejected. A blank description counts
    /// as absent.
    ///
    /// # Errors
    /// `ClientError::Validation` on field `name`.
    pub fn validated(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ClientError::validation("name", "list name is required"));
        }
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self { name, description })
    }

    /// List-create body; a missing description is replaced by the
    /// parameter summary.
    pub fn into_new_list(self, params: &SearchParameters) -> NewList {
        NewList {
            name: self.name,
            description: Some(self.description.unwrap_or_else(|| params.summary())),
        }
    }
}

fn normalize_set(field: &str, values: Vec<String>) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ClientError::validation(field, "entries must not be blank"));
        }
        if !normalized.iter().any(|existing| existing == trimmed) {
            normalized.push(trimmed.to_string());
        }
    }
    Ok(normalized)
}

fn require_non_empty(field: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(ClientError::validation(field, "at least one entry is required"));
    }
    Ok(())
}

fn check_max_results(max_results: u32) -> Result<()> {
    if !(MIN_MAX_RESULTS..=MAX_MAX_RESULTS).contains(&max_results) {
        return Err(ClientError::validation(
            "max_results",
            format!("must be between {MIN_MAX_RESULTS} and {MAX_MAX_RESULTS}"),
        ));
    }
    Ok(())
}
