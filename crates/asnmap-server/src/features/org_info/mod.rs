//! Organization info lookups (as-org2info records)

pub mod queries;
pub mod routes;

pub use routes::org_info_routes;
