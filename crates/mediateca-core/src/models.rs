mod media;
mod query;

pub use media::{MediaKind, MediaRecord};
pub use query::{KindFilter, SortKey};
