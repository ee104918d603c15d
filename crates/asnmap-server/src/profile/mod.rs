//! Composite ASN profiles
//!
//! A profile joins the organization mapping, delegation record, category
//! labels and relationship edge stored for one ASN. Related ASNs (siblings,
//! customers, providers) can be expanded into nested profiles up to an
//! explicit [`ExpansionDepth`]; an ASN already on the current expansion path
//! is reported as a cycle instead of being visited again.

mod assembler;

use asnmap_common::types::{is_numeric_asn, normalize_asn, EntityKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

pub use assembler::ProfileAssembler;

/// Upper bound for every expansion depth
pub const MAX_EXPANSION_DEPTH: u8 = 3;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Sources that must all hold an ASN for a complete profile
pub const REQUIRED_SOURCES: [EntityKind; 3] = [
    EntityKind::Organization,
    EntityKind::Delegation,
    EntityKind::Category,
];

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("ASN {asn} not found")]
    NotFound { asn: String },

    #[error("ASN {asn} is missing from: {}", format_kinds(.missing_sources))]
    PartialData {
        asn: String,
        missing_sources: Vec<EntityKind>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn format_kinds(kinds: &[EntityKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ProfileError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

/// How many hops to follow per relation
///
/// Each child gets a reduced budget: a sibling child expands nothing, a
/// customer child only its own customers, and a provider child both its
/// providers and customers, one hop less each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionDepth {
    pub siblings: u8,
    pub customers: u8,
    pub providers: u8,
}

impl Default for ExpansionDepth {
    fn default() -> Self {
        Self {
            siblings: 1,
            customers: 1,
            providers: 2,
        }
    }
}

impl ExpansionDepth {
    pub const NONE: ExpansionDepth = ExpansionDepth {
        siblings: 0,
        customers: 0,
        providers: 0,
    };

    pub fn clamped(self) -> Self {
        Self {
            siblings: self.siblings.min(MAX_EXPANSION_DEPTH),
            customers: self.customers.min(MAX_EXPANSION_DEPTH),
            providers: self.providers.min(MAX_EXPANSION_DEPTH),
        }
    }

    fn for_sibling(self) -> Self {
        Self {
            siblings: self.siblings.saturating_sub(1),
            ..Self::NONE
        }
    }

    fn for_customer(self) -> Self {
        Self {
            customers: self.customers.saturating_sub(1),
            ..Self::NONE
        }
    }

    fn for_provider(self) -> Self {
        let next = self.providers.saturating_sub(1);
        Self {
            siblings: 0,
            customers: next,
            providers: next,
        }
    }
}

/// Merged view of one ASN across all sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeProfile {
    pub asn: String,
    pub name: String,
    pub website: String,
    pub sibling_asns: Vec<String>,
    pub category_1: String,
    pub category_2: String,
    pub country_code: String,
    pub customers: Vec<String>,
    pub providers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sibling_profiles: Vec<ProfileEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customer_profiles: Vec<ProfileEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_profiles: Vec<ProfileEntry>,
}

/// A related ASN inside an expansion or a list result
///
/// Nested lookups never fail the parent: incomplete ASNs are reported as
/// unresolved and revisits as cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProfileEntry {
    Resolved(Box<CompositeProfile>),
    Unresolved {
        asn: String,
        missing_sources: Vec<EntityKind>,
    },
    Cycle {
        asn: String,
    },
}

impl ProfileEntry {
    pub fn asn(&self) -> &str {
        match self {
            ProfileEntry::Resolved(profile) => &profile.asn,
            ProfileEntry::Unresolved { asn, .. } | ProfileEntry::Cycle { asn } => asn,
        }
    }

    pub fn as_resolved(&self) -> Option<&CompositeProfile> {
        match self {
            ProfileEntry::Resolved(profile) => Some(profile),
            _ => None,
        }
    }
}

/// 1-based page selection for list lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileListing {
    pub entries: Vec<ProfileEntry>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

/// Normalize an ASN parameter; it must be digits once the `AS` prefix is gone.
pub fn validate_asn(raw: &str) -> Result<String, ProfileError> {
    let asn = normalize_asn(raw);
    if asn.is_empty() {
        return Err(ProfileError::validation("asn", "must not be empty"));
    }
    if !is_numeric_asn(&asn) {
        return Err(ProfileError::validation(
            "asn",
            format!("'{raw}' is not a numeric ASN"),
        ));
    }
    Ok(asn)
}

/// Upper-case a country code; it must be exactly two ASCII letters.
pub fn validate_country(raw: &str) -> Result<String, ProfileError> {
    let cc = raw.trim().to_ascii_uppercase();
    if cc.len() != 2 || !cc.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ProfileError::validation(
            "country",
            format!("'{raw}' must be exactly 2 letters"),
        ));
    }
    Ok(cc)
}

pub fn validate_category(raw: &str) -> Result<String, ProfileError> {
    let label = raw.trim();
    if label.is_empty() {
        return Err(ProfileError::validation("category", "must not be empty"));
    }
    Ok(label.to_string())
}
