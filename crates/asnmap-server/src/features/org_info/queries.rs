use asnmap_common::types::OrganizationInfo;

use crate::error::AppError;
use crate::store::RecordStore;

#[tracing::instrument(skip(store))]
pub async fn handle(store: &dyn RecordStore, org_id: &str) -> Result<OrganizationInfo, AppError> {
    let org_id = org_id.trim();
    if org_id.is_empty() {
        return Err(AppError::validation("org_id", "must not be empty"));
    }

    store
        .org_info(org_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Organization {org_id} not found")))
}
