pub mod get;
pub mod list;

pub use get::GetProfileQuery;
pub use list::{ListFilter, ListProfilesQuery};
