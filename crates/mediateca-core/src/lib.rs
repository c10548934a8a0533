pub mod catalog;
pub mod config;
pub mod error;
mod fsops;
pub mod models;
pub mod record_store;
pub mod sidecar;

pub use catalog::Catalog;
pub use error::MediatecaError;
pub use models::{KindFilter, MediaKind, MediaRecord, SortKey};
