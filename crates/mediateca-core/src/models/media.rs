use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MediatecaError;

/// The closed set of media variants a catalog entry can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Movie,
    Song,
    Book,
}

impl MediaKind {
    pub const ALL: &[MediaKind] = &[Self::Movie, Self::Song, Self::Book];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Song => "Song",
            Self::Book => "Book",
        }
    }

    /// Tag written in the first column of the record store.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Movie => "Filme",
            Self::Song => "Musica",
            Self::Book => "Livro",
        }
    }

    pub fn from_tag(s: &str) -> Option<Self> {
        match s {
            "Filme" => Some(Self::Movie),
            "Musica" => Some(Self::Song),
            "Livro" => Some(Self::Book),
            _ => None,
        }
    }

    /// What the kind-specific `extra` field holds.
    pub fn extra_label(&self) -> &'static str {
        match self {
            Self::Movie => "Language",
            Self::Song => "Artist",
            Self::Book => "Authors",
        }
    }

    /// Unit of the `duration` field.
    pub fn duration_unit(&self) -> &'static str {
        match self {
            Self::Movie => "min",
            Self::Song => "sec",
            Self::Book => "pages",
        }
    }

    /// Infer the kind from a file extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" | "mkv" => Some(Self::Movie),
            "mp3" | "wav" => Some(Self::Song),
            "pdf" | "epub" => Some(Self::Book),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, MediatecaError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| MediatecaError::UnsupportedFormat(format!(".{ext}")))
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One catalog entry, backed by a real file at `location`.
///
/// `kind` is fixed at construction. Every other field is replaced wholesale
/// by catalog operations; no validation happens here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    kind: MediaKind,
    /// Absolute path of the media file. Unique across the catalog.
    pub location: String,
    pub title: String,
    /// Minutes, seconds or pages depending on `kind`.
    pub duration: u32,
    pub category: String,
    /// File size as text. Only updated on explicit refresh.
    pub disk_size: String,
    /// Language, artist or authors depending on `kind`.
    pub extra: String,
}

impl MediaRecord {
    pub fn new(kind: MediaKind, location: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
            title: title.into(),
            duration: 0,
            category: String::new(),
            disk_size: "0".into(),
            extra: String::new(),
        }
    }

    /// Build a record for an existing media file: the location is made
    /// absolute, the size is read from disk, and the kind is inferred from
    /// the extension unless given.
    pub fn from_file(
        path: &Path,
        title: impl Into<String>,
        kind: Option<MediaKind>,
    ) -> Result<Self, MediatecaError> {
        if !path.is_file() {
            return Err(MediatecaError::FileSystem(format!(
                "media file not found: {}",
                path.display()
            )));
        }
        let kind = match kind {
            Some(kind) => kind,
            None => MediaKind::from_path(path)?,
        };
        let location = std::path::absolute(path)
            .map_err(|e| MediatecaError::FileSystem(format!("{}: {e}", path.display())))?;

        let mut record = Self::new(kind, location.to_string_lossy(), title);
        record.refresh_disk_size();
        Ok(record)
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    pub fn with_disk_size(mut self, disk_size: impl Into<String>) -> Self {
        self.disk_size = disk_size.into();
        self
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.location)
    }

    /// Extension of the media file including the leading dot, or empty.
    pub fn extension(&self) -> String {
        self.path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default()
    }

    /// Re-read the file length into `disk_size`. Returns false (and leaves
    /// the field alone) when the file can't be stat'ed.
    pub fn refresh_disk_size(&mut self) -> bool {
        match std::fs::metadata(self.path()) {
            Ok(meta) if meta.is_file() => {
                self.disk_size = meta.len().to_string();
                true
            }
            _ => false,
        }
    }

    /// Human-readable multi-line summary.
    pub fn details(&self) -> String {
        format!(
            "{}: {}\n{}: {}\nCategory: {}\nDuration ({}): {}\nSize: {}\n",
            self.kind.label(),
            self.title,
            self.kind.extra_label(),
            self.extra,
            self.category,
            self.kind.duration_unit(),
            self.duration,
            self.disk_size,
        )
    }
}
