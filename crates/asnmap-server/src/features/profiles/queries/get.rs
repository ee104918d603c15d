use serde::Deserialize;

use crate::profile::{CompositeProfile, ExpansionDepth, ProfileAssembler, ProfileError};

/// Profile lookup with optional per-request expansion overrides
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetProfileQuery {
    #[serde(skip)]
    pub asn: String,
    pub sibling_depth: Option<u8>,
    pub customer_depth: Option<u8>,
    pub provider_depth: Option<u8>,
}

impl GetProfileQuery {
    /// Overrides on top of `defaults`, clamped to the maximum depth
    pub fn depth(&self, defaults: ExpansionDepth) -> ExpansionDepth {
        ExpansionDepth {
            siblings: self.sibling_depth.unwrap_or(defaults.siblings),
            customers: self.customer_depth.unwrap_or(defaults.customers),
            providers: self.provider_depth.unwrap_or(defaults.providers),
        }
        .clamped()
    }
}

#[tracing::instrument(skip(assembler))]
pub async fn handle(
    assembler: &ProfileAssembler,
    query: GetProfileQuery,
) -> Result<CompositeProfile, ProfileError> {
    let depth = query.depth(assembler.default_depth());
    assembler.lookup_profile_with_depth(&query.asn, depth).await
}
