use serde::{Deserialize, Serialize};

use super::media::{MediaKind, MediaRecord};

/// Kind filter for catalog queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KindFilter {
    #[default]
    All,
    Only(MediaKind),
}

impl KindFilter {
    /// Accepts "all", a kind label ("movie") or a store tag ("Filme"), any case.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        MediaKind::ALL
            .iter()
            .find(|k| s.eq_ignore_ascii_case(k.label()) || s.eq_ignore_ascii_case(k.as_tag()))
            .map(|k| Self::Only(*k))
    }

    pub fn matches(&self, kind: MediaKind) -> bool {
        match self {
            Self::All => true,
            Self::Only(k) => *k == kind,
        }
    }
}

impl From<MediaKind> for KindFilter {
    fn from(kind: MediaKind) -> Self {
        Self::Only(kind)
    }
}

/// Ascending sort order for catalog queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Title,
    Duration,
}

impl SortKey {
    /// Unrecognized keys yield `None`, which leaves query results unsorted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" | "title-ascending" | "alphabetical" => Some(Self::Title),
            "duration" | "duration-ascending" => Some(Self::Duration),
            _ => None,
        }
    }

    /// Stable sort, so equal keys keep catalog order.
    pub fn sort(&self, records: &mut [MediaRecord]) {
        match self {
            Self::Title => records.sort_by(|a, b| a.title.cmp(&b.title)),
            Self::Duration => records.sort_by_key(|r| r.duration),
        }
    }
}
