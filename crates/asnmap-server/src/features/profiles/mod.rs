//! Composite profile lookups over HTTP

pub mod queries;
pub mod routes;

pub use queries::{GetProfileQuery, ListFilter, ListProfilesQuery};
pub use routes::profiles_routes;
