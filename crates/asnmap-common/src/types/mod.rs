//! Domain types shared across asnmap
//!
//! Every stored entity is keyed by a natural identifier (an ASN, a registry
//! allocation value or an organization id). There are no surrogate keys and
//! no enforced foreign keys: cross references are plain ASN strings that are
//! resolved lazily by lookup.

use serde::{Deserialize, Serialize};

use crate::error::AsnMapError;

// ============================================================================
// Entity kinds
// ============================================================================

/// The five source datasets, one stored entity kind each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// ASN to organization mapping (JSON)
    Organization,
    /// Regional registry delegation records (pipe-delimited text)
    Delegation,
    /// AS category labels (CSV)
    Category,
    /// AS business relationships (pipe-delimited text)
    Relationship,
    /// Organization info records from as-org2info (pipe-delimited text)
    OrgInfo,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Organization,
        EntityKind::Delegation,
        EntityKind::Category,
        EntityKind::Relationship,
        EntityKind::OrgInfo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Organization => "organization",
            EntityKind::Delegation => "delegation",
            EntityKind::Category => "category",
            EntityKind::Relationship => "relationship",
            EntityKind::OrgInfo => "org-info",
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = AsnMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "organization" | "organizations" => Ok(EntityKind::Organization),
            "delegation" | "delegations" => Ok(EntityKind::Delegation),
            "category" | "categories" => Ok(EntityKind::Category),
            "relationship" | "relationships" => Ok(EntityKind::Relationship),
            "org-info" | "orginfo" => Ok(EntityKind::OrgInfo),
            other => Err(AsnMapError::UnknownKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a raw ASN token into its natural-key form.
///
/// Surrounding whitespace and a leading `AS` prefix (any case) are removed:
/// `"AS64500"`, `"as64500"` and `" 64500 "` all become `"64500"`.
pub fn normalize_asn(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = match trimmed.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("AS") => &trimmed[2..],
        _ => trimmed,
    };
    stripped.trim().to_string()
}

/// True for a normalized ASN: one or more ASCII digits.
///
/// Ingestion and lookups share this rule so every stored key can be queried.
pub fn is_numeric_asn(asn: &str) -> bool {
    !asn.is_empty() && asn.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// Entities
// ============================================================================

/// ASN to organization mapping. Natural key: `asn`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMapping {
    pub asn: String,
    pub status: String,
    pub reference_orgs: Vec<String>,
    pub sibling_asns: Vec<String>,
    pub name: String,
    pub descr: String,
    pub website: String,
    pub comparison_ca2o: String,
    pub comparison_pdb: String,
    pub pdb_org_id: String,
    pub pdb_org: String,
}

/// Registry delegation line. Natural key: `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRecord {
    pub value: String,
    pub registry: String,
    pub cc: String,
    pub allocation_type: String,
    pub start: String,
    pub date: String,
    pub status: String,
    pub opaque_id: String,
    pub extensions: String,
}

/// Category labels for one ASN. Natural key: `asn` with the `AS` prefix removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub asn: String,
    pub category_1: String,
    pub category_2: String,
}

impl CategoryLabel {
    /// True when either layer carries `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.category_1 == label || self.category_2 == label
    }
}

/// Customer/provider edge for one ASN. Natural key: `asn`.
///
/// Empty strings mean "no reference". Both directions are filled in
/// incrementally as the relationship file is scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub asn: String,
    pub customer: String,
    pub provider: String,
}

impl RelationshipEdge {
    pub fn new(
        asn: impl Into<String>,
        customer: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            asn: asn.into(),
            customer: customer.into(),
            provider: provider.into(),
        }
    }

    pub fn customers(&self) -> Vec<String> {
        non_empty(&self.customer)
    }

    pub fn providers(&self) -> Vec<String> {
        non_empty(&self.provider)
    }
}

fn non_empty(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}

/// Organization record from the as-org2info dataset. Natural key: `org_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationInfo {
    pub org_id: String,
    pub changed: String,
    pub org_name: String,
    pub country: String,
    pub source: String,
}

// ============================================================================
// Records
// ============================================================================

/// A candidate or stored record of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "kebab-case")]
pub enum Record {
    Organization(OrganizationMapping),
    Delegation(DelegationRecord),
    Category(CategoryLabel),
    Relationship(RelationshipEdge),
    OrgInfo(OrganizationInfo),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Organization(_) => EntityKind::Organization,
            Record::Delegation(_) => EntityKind::Delegation,
            Record::Category(_) => EntityKind::Category,
            Record::Relationship(_) => EntityKind::Relationship,
            Record::OrgInfo(_) => EntityKind::OrgInfo,
        }
    }

    /// The natural key this record is reconciled on.
    pub fn key(&self) -> &str {
        match self {
            Record::Organization(r) => &r.asn,
            Record::Delegation(r) => &r.value,
            Record::Category(r) => &r.asn,
            Record::Relationship(r) => &r.asn,
            Record::OrgInfo(r) => &r.org_id,
        }
    }
}

// ============================================================================
// Relationship merge
// ============================================================================

/// One directional observation from a relationship line.
///
/// Applying an update sets one direction and keeps the other direction of
/// whatever edge is already stored for the ASN. A repeated update in the same
/// direction replaces the earlier reference; it never accumulates a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "lowercase")]
pub enum RelationshipUpdate {
    /// `asn` has customer `customer` (relation code `0`)
    Customer { asn: String, customer: String },
    /// `asn` has provider `provider` (relation code `-1`)
    Provider { asn: String, provider: String },
}

impl RelationshipUpdate {
    pub fn customer(asn: impl Into<String>, customer: impl Into<String>) -> Self {
        RelationshipUpdate::Customer {
            asn: asn.into(),
            customer: customer.into(),
        }
    }

    pub fn provider(asn: impl Into<String>, provider: impl Into<String>) -> Self {
        RelationshipUpdate::Provider {
            asn: asn.into(),
            provider: provider.into(),
        }
    }

    pub fn asn(&self) -> &str {
        match self {
            RelationshipUpdate::Customer { asn, .. } | RelationshipUpdate::Provider { asn, .. } => {
                asn
            },
        }
    }

    /// Merge this update into the currently stored edge, if any.
    pub fn apply_to(&self, existing: Option<RelationshipEdge>) -> RelationshipEdge {
        let mut edge = existing.unwrap_or_else(|| RelationshipEdge {
            asn: self.asn().to_string(),
            ..RelationshipEdge::default()
        });
        match self {
            RelationshipUpdate::Customer { customer, .. } => edge.customer = customer.clone(),
            RelationshipUpdate::Provider { provider, .. } => edge.provider = provider.clone(),
        }
        edge
    }
}
