//! Composite profile assembly
//!
//! A profile joins the organization, delegation and category rows that share
//! an ASN, then expands sibling, customer and provider lists into nested
//! profiles up to the requested depth. Expansion tracks the current path so a
//! cycle is reported as [`ProfileEntry::Cycle`] instead of recursing.

use std::sync::Arc;

use asnmap_common::types::{
    CategoryLabel, DelegationRecord, EntityKind, OrganizationMapping, RelationshipEdge,
};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

use super::{
    validate_asn, validate_category, validate_country, CompositeProfile, ExpansionDepth,
    PageRequest, ProfileEntry, ProfileError, ProfileListing,
};
use crate::store::{RecordStore, StoreResult};

/// Concurrent flat lookups per list page
const LIST_CONCURRENCY: usize = 8;

/// Rows found for one ASN, one per source table
#[derive(Debug, Default)]
struct Sources {
    organization: Option<OrganizationMapping>,
    delegation: Option<DelegationRecord>,
    category: Option<CategoryLabel>,
    relationship: Option<RelationshipEdge>,
}

impl Sources {
    fn is_unknown(&self) -> bool {
        self.organization.is_none()
            && self.delegation.is_none()
            && self.category.is_none()
            && self.relationship.is_none()
    }

    fn missing(&self) -> Vec<EntityKind> {
        let mut missing = Vec::new();
        if self.organization.is_none() {
            missing.push(EntityKind::Organization);
        }
        if self.delegation.is_none() {
            missing.push(EntityKind::Delegation);
        }
        if self.category.is_none() {
            missing.push(EntityKind::Category);
        }
        missing
    }

    /// Join the rows into a flat profile, or list the required sources that
    /// lack the ASN. A missing relationship edge means no customers or
    /// providers.
    fn into_profile(self, asn: &str) -> Result<CompositeProfile, Vec<EntityKind>> {
        let missing = self.missing();
        let (Some(org), Some(delegation), Some(category)) =
            (self.organization, self.delegation, self.category)
        else {
            return Err(missing);
        };
        let edge = self.relationship.unwrap_or_default();

        Ok(CompositeProfile {
            asn: asn.to_string(),
            name: org.name,
            website: org.website,
            sibling_asns: org.sibling_asns,
            category_1: category.category_1,
            category_2: category.category_2,
            country_code: delegation.cc,
            customers: edge.customers(),
            providers: edge.providers(),
            ..CompositeProfile::default()
        })
    }
}

/// Builds composite profiles from the record store
#[derive(Clone)]
pub struct ProfileAssembler {
    store: Arc<dyn RecordStore>,
    default_depth: ExpansionDepth,
}

impl ProfileAssembler {
    pub fn new(store: Arc<dyn RecordStore>, default_depth: ExpansionDepth) -> Self {
        Self {
            store,
            default_depth: default_depth.clamped(),
        }
    }

    pub fn default_depth(&self) -> ExpansionDepth {
        self.default_depth
    }

    /// Join all sources for one ASN without expanding related ASNs.
    pub async fn assemble(&self, raw_asn: &str) -> Result<CompositeProfile, ProfileError> {
        let asn = validate_asn(raw_asn)?;
        let sources = self.fetch(&asn).await?;
        complete(&asn, sources)
    }

    /// Profile expanded with the configured default depth
    pub async fn lookup_profile(&self, raw_asn: &str) -> Result<CompositeProfile, ProfileError> {
        self.lookup_profile_with_depth(raw_asn, self.default_depth).await
    }

    #[instrument(skip(self))]
    pub async fn lookup_profile_with_depth(
        &self,
        raw_asn: &str,
        depth: ExpansionDepth,
    ) -> Result<CompositeProfile, ProfileError> {
        let asn = validate_asn(raw_asn)?;
        let sources = self.fetch(&asn).await?;
        let mut profile = complete(&asn, sources)?;

        let mut path = vec![asn];
        self.expand_children(&mut profile, depth.clamped(), &mut path)
            .await?;
        Ok(profile)
    }

    /// Flat profiles for every ASN delegated to `country`
    #[instrument(skip(self))]
    pub async fn lookup_by_country(
        &self,
        country: &str,
        page: PageRequest,
    ) -> Result<ProfileListing, ProfileError> {
        let cc = validate_country(country)?;
        let asns = self
            .store
            .find_delegations_by_country(&cc)
            .await?
            .into_iter()
            .map(|d| d.value)
            .collect();
        self.listing(asns, page).await
    }

    /// Flat profiles for every ASN labelled `category` in either layer
    #[instrument(skip(self))]
    pub async fn lookup_by_category(
        &self,
        category: &str,
        page: PageRequest,
    ) -> Result<ProfileListing, ProfileError> {
        let label = validate_category(category)?;
        let asns = self
            .store
            .find_categories(&label)
            .await?
            .into_iter()
            .map(|c| c.asn)
            .collect();
        self.listing(asns, page).await
    }

    async fn fetch(&self, asn: &str) -> StoreResult<Sources> {
        let store = self.store.as_ref();
        let (organization, delegation, category, relationship) = tokio::try_join!(
            store.organization(asn),
            store.delegation(asn),
            store.category(asn),
            store.relationship(asn),
        )?;
        Ok(Sources {
            organization,
            delegation,
            category,
            relationship,
        })
    }

    async fn flat_entry(&self, asn: String) -> StoreResult<ProfileEntry> {
        let sources = self.fetch(&asn).await?;
        Ok(match sources.into_profile(&asn) {
            Ok(profile) => ProfileEntry::Resolved(Box::new(profile)),
            Err(missing_sources) => ProfileEntry::Unresolved {
                asn,
                missing_sources,
            },
        })
    }

    async fn listing(
        &self,
        mut asns: Vec<String>,
        page: PageRequest,
    ) -> Result<ProfileListing, ProfileError> {
        asns.sort_by_key(|asn| (asn.parse::<u64>().map_or((1, 0), |n| (0, n)), asn.clone()));
        asns.dedup();
        let total = asns.len();

        let entries: Vec<ProfileEntry> = futures::stream::iter(
            asns.into_iter()
                .skip(page.offset())
                .take(page.per_page as usize),
        )
        .map(|asn| self.flat_entry(asn))
        .buffered(LIST_CONCURRENCY)
        .try_collect()
        .await?;

        Ok(ProfileListing {
            entries,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    /// Expand one related ASN. `path` holds the ASNs being expanded above
    /// this one.
    fn expand_entry<'a>(
        &'a self,
        asn: &'a str,
        depth: ExpansionDepth,
        path: &'a mut Vec<String>,
    ) -> BoxFuture<'a, StoreResult<ProfileEntry>> {
        async move {
            if path.iter().any(|seen| seen == asn) {
                debug!(asn, "Cycle detected, not expanding");
                return Ok(ProfileEntry::Cycle {
                    asn: asn.to_string(),
                });
            }

            let sources = self.fetch(asn).await?;
            let mut profile = match sources.into_profile(asn) {
                Ok(profile) => profile,
                Err(missing_sources) => {
                    return Ok(ProfileEntry::Unresolved {
                        asn: asn.to_string(),
                        missing_sources,
                    })
                },
            };

            path.push(asn.to_string());
            let expanded = self.expand_children(&mut profile, depth, path).await;
            path.pop();
            expanded?;

            Ok(ProfileEntry::Resolved(Box::new(profile)))
        }
        .boxed()
    }

    async fn expand_children(
        &self,
        profile: &mut CompositeProfile,
        depth: ExpansionDepth,
        path: &mut Vec<String>,
    ) -> StoreResult<()> {
        if depth.siblings > 0 {
            for sibling in profile.sibling_asns.clone() {
                let entry = self.expand_entry(&sibling, depth.for_sibling(), path).await?;
                profile.sibling_profiles.push(entry);
            }
        }
        if depth.customers > 0 {
            for customer in profile.customers.clone() {
                let entry = self.expand_entry(&customer, depth.for_customer(), path).await?;
                profile.customer_profiles.push(entry);
            }
        }
        if depth.providers > 0 {
            for provider in profile.providers.clone() {
                let entry = self.expand_entry(&provider, depth.for_provider(), path).await?;
                profile.provider_profiles.push(entry);
            }
        }
        Ok(())
    }
}

fn complete(asn: &str, sources: Sources) -> Result<CompositeProfile, ProfileError> {
    if sources.is_unknown() {
        return Err(ProfileError::NotFound {
            asn: asn.to_string(),
        });
    }
    sources
        .into_profile(asn)
        .map_err(|missing_sources| ProfileError::PartialData {
            asn: asn.to_string(),
            missing_sources,
        })
}
