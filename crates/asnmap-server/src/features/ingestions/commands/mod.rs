pub mod start;

pub use start::{StartIngestionCommand, StartIngestionError};
