//! Record counts per entity kind

pub mod queries;
pub mod routes;

pub use queries::StatsResponse;
pub use routes::stats_routes;
