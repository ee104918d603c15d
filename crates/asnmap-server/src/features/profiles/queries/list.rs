use serde::Deserialize;

use crate::error::AppError;
use crate::profile::{PageRequest, ProfileAssembler, ProfileListing};

/// `GET /asn?country=..|category=..&page=..&per_page=..`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProfilesQuery {
    pub country: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    Country(String),
    Category(String),
}

impl ListProfilesQuery {
    /// Exactly one of `country` and `category` must be given.
    pub fn filter(&self) -> Result<ListFilter, AppError> {
        match (&self.country, &self.category) {
            (Some(country), None) => Ok(ListFilter::Country(country.clone())),
            (None, Some(category)) => Ok(ListFilter::Category(category.clone())),
            (Some(_), Some(_)) => Err(AppError::validation(
                "filter",
                "use either country or category, not both",
            )),
            (None, None) => Err(AppError::validation(
                "filter",
                "one of country or category is required",
            )),
        }
    }

    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

#[tracing::instrument(skip(assembler))]
pub async fn handle(
    assembler: &ProfileAssembler,
    query: ListProfilesQuery,
) -> Result<ProfileListing, AppError> {
    let page = query.page();
    let listing = match query.filter()? {
        ListFilter::Country(country) => assembler.lookup_by_country(&country, page).await?,
        ListFilter::Category(category) => assembler.lookup_by_category(&category, page).await?,
    };
    Ok(listing)
}
