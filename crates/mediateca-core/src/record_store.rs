//! Flat delimited-text mirror of the catalog.
//!
//! One header line, then one record per line with seven `;`-separated
//! columns: kind, title, category, duration, extra, location, disk size.
//! Values are written as-is; a value containing `;` shifts the columns.
//! On the next load the row is dropped if the shift breaks the duration
//! column, and otherwise comes back with the wrong values in later fields.
//! Lines that are not valid UTF-8 are read as Latin-1.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::error::MediatecaError;
use crate::fsops::parent_or_cwd;
use crate::models::{MediaKind, MediaRecord};

const DELIMITER: char = ';';
const FIELD_COUNT: usize = 7;
const HEADER: &str = "TIPO;TITULO;CATEGORIA;DURACAO;EXTRA;LOCAL;TAMANHO";

/// Why a store line was dropped. Never leaves this module.
#[derive(Debug, Error)]
enum RecordParseError {
    #[error("expected 7 fields, found {0}")]
    MissingFields(usize),

    #[error("unknown kind tag {0:?}")]
    UnknownKind(String),

    #[error("invalid duration {0:?}")]
    InvalidDuration(String),
}

/// Outcome of a load: the surviving records plus how many lines were dropped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<MediaRecord>,
    pub dropped: usize,
}

/// Reads and rewrites the record-store file. Holds no catalog state.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every well-formed record. Malformed lines are dropped; a missing
    /// file is created empty; any other read failure yields an empty list.
    pub fn load(&self) -> Vec<MediaRecord> {
        self.load_report().records
    }

    /// Same as [`load`](Self::load) but also reports the dropped-line count,
    /// so callers can tell an empty store from a corrupted one.
    pub fn load_report(&self) -> LoadReport {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Err(e) = self.create_empty() {
                    warn!(path = %self.path.display(), error = %e, "Failed to create record store");
                }
                return LoadReport::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read record store");
                return LoadReport::default();
            }
        };

        let report = parse_store(&content);
        info!(
            path = %self.path.display(),
            loaded = report.records.len(),
            dropped = report.dropped,
            "Record store loaded"
        );
        report
    }

    /// Rewrite the whole file: header, then one line per record.
    ///
    /// The rows go to a temporary file next to the store which then replaces
    /// it, so a failed write leaves the previous snapshot intact.
    pub fn save(&self, records: &[MediaRecord]) -> Result<(), MediatecaError> {
        let persist_err =
            |e: std::io::Error| MediatecaError::Persistence(format!("{}: {e}", self.path.display()));

        let dir = parent_or_cwd(&self.path);
        fs::create_dir_all(dir).map_err(persist_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(persist_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            writeln!(writer, "{HEADER}").map_err(persist_err)?;
            for record in records {
                writeln!(writer, "{}", format_line(record)).map_err(persist_err)?;
            }
            writer.flush().map_err(persist_err)?;
        }
        tmp.as_file().sync_all().map_err(persist_err)?;
        // Keep the existing store's mode instead of the temp file's 0600.
        if let Ok(meta) = fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(persist_err)?;
        }
        tmp.persist(&self.path).map_err(|e| persist_err(e.error))?;

        debug!(path = %self.path.display(), records = records.len(), "Record store saved");
        Ok(())
    }

    fn create_empty(&self) -> std::io::Result<()> {
        fs::create_dir_all(parent_or_cwd(&self.path))?;
        File::create(&self.path)?;
        Ok(())
    }
}

fn parse_store(content: &[u8]) -> LoadReport {
    let mut report = LoadReport::default();

    // First line is the header, whatever it says.
    for (idx, raw) in content.split(|&b| b == b'\n').enumerate().skip(1) {
        let raw = raw.strip_suffix(&b"\r"[..]).unwrap_or(raw);
        if raw.is_empty() {
            continue;
        }
        let line = decode_line(raw);
        if let Cow::Owned(_) = line {
            trace!(line = idx + 1, "Store line is not UTF-8, read as Latin-1");
        }
        match parse_line(&line) {
            Ok(record) => report.records.push(record),
            Err(e) => {
                debug!(line = idx + 1, reason = %e, "Dropping malformed store line");
                report.dropped += 1;
            }
        }
    }

    report
}

fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(raw) {
        Ok(line) => Cow::Borrowed(line),
        Err(_) => Cow::Owned(raw.iter().map(|&b| char::from(b)).collect()),
    }
}

fn parse_line(line: &str) -> Result<MediaRecord, RecordParseError> {
    let fields: Vec<&str> = line.split(DELIMITER).collect();
    if fields.len() < FIELD_COUNT {
        return Err(RecordParseError::MissingFields(fields.len()));
    }

    let kind = MediaKind::from_tag(fields[0])
        .ok_or_else(|| RecordParseError::UnknownKind(fields[0].to_string()))?;
    let duration = fields[3]
        .parse::<u32>()
        .map_err(|_| RecordParseError::InvalidDuration(fields[3].to_string()))?;

    Ok(MediaRecord::new(kind, fields[5], fields[1])
        .with_category(fields[2])
        .with_duration(duration)
        .with_extra(fields[4])
        .with_disk_size(fields[6]))
}

fn format_line(record: &MediaRecord) -> String {
    let duration = record.duration.to_string();
    let fields = [
        record.kind().as_tag(),
        record.title.as_str(),
        record.category.as_str(),
        duration.as_str(),
        record.extra.as_str(),
        record.location.as_str(),
        record.disk_size.as_str(),
    ];
    if fields.iter().any(|f| f.contains(DELIMITER)) {
        warn!(location = %record.location, "Field contains the store delimiter, row will not reload intact");
    }
    fields.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> RecordStore {
        RecordStore::new(dir.path().join("database.csv"))
    }

    fn sample_records() -> Vec<MediaRecord> {
        vec![
            MediaRecord::new(MediaKind::Movie, "/films/matrix.mkv", "Matrix")
                .with_category("Action")
                .with_duration(136)
                .with_extra("English")
                .with_disk_size("700"),
            MediaRecord::new(MediaKind::Song, "/music/track.mp3", "Track")
                .with_category("Rock")
                .with_duration(215)
                .with_extra("Some Band"),
            MediaRecord::new(MediaKind::Book, "/books/dune.epub", "Dune")
                .with_category("Sci-Fi")
                .with_duration(612)
                .with_extra("Frank Herbert")
                .with_disk_size("2048"),
        ]
    }

    #[test]
    fn test_load_missing_file_creates_it() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("nested").join("database.csv"));

        assert!(store.load().is_empty());
        assert!(store.path().exists());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "");
    }

    #[test]
    fn test_save_writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&sample_records()).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "Filme;Matrix;Action;136;English;/films/matrix.mkv;700");
        assert_eq!(lines[2], "Musica;Track;Rock;215;Some Band;/music/track.mp3;0");
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let records = sample_records();
        store.save(&records).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, records);

        store.save(&loaded).unwrap();
        assert_eq!(store.load(), records);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&sample_records()).unwrap();
        store.save(&sample_records()[..1]).unwrap();

        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_short_line_is_dropped() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            format!("{HEADER}\nFilme;Matrix;Action;136;English;/films/matrix.mkv;700\nLivro;Dune;Sci-Fi;612\n"),
        )
        .unwrap();

        let report = store.load_report();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.records[0].title, "Matrix");
    }

    #[test]
    fn test_bad_duration_and_unknown_kind_are_dropped() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            format!(
                "{HEADER}\n\
                 Filme;Matrix;Action;long;English;/films/matrix.mkv;700\n\
                 Filme;Heat;Crime;-5;English;/films/heat.mkv;700\n\
                 Podcast;Ep 1;Talk;30;Host;/pods/ep1.mp3;10\n\
                 Livro;Dune;Sci-Fi;612;Frank Herbert;/books/dune.epub;2048\n"
            ),
        )
        .unwrap();

        let report = store.load_report();
        assert_eq!(report.dropped, 3);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].kind(), MediaKind::Book);
    }

    #[test]
    fn test_header_is_skipped_even_if_it_parses() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            "Filme;First;Action;1;English;/a.mkv;1\nFilme;Second;Action;2;English;/b.mkv;2\n",
        )
        .unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "Second");
    }

    #[test]
    fn test_delimiter_in_value_breaks_reload() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let record = MediaRecord::new(MediaKind::Song, "/music/rr.mp3", "Rock;Roll")
            .with_category("Pop")
            .with_duration(180);
        store.save(&[record]).unwrap();

        let report = store.load_report();
        assert!(report.records.is_empty());
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn test_delimiter_in_location_shifts_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let record = MediaRecord::new(MediaKind::Movie, "/films/a;b.mkv", "AB")
            .with_duration(90)
            .with_disk_size("700");
        store.save(&[record]).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].location, "/films/a");
        assert_eq!(loaded[0].disk_size, "b.mkv");
    }

    #[test]
    fn test_latin1_line_is_kept_next_to_utf8_lines() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut content = format!("{HEADER}\r\nFilme;Heat;Crime;170;English;/films/heat.mkv;1024\r\n").into_bytes();
        content.extend_from_slice(b"Filme;Rambo;A\xe7\xe3o;93;English;/films/rambo.mkv;700\r\n");
        content.extend_from_slice("Livro;Dune;Ficção;612;Frank Herbert;/books/dune.epub;2048\n".as_bytes());
        std::fs::write(store.path(), content).unwrap();

        let report = store.load_report();
        assert_eq!(report.dropped, 0);
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.records[0].disk_size, "1024");
        assert_eq!(report.records[1].category, "Ação");
        assert_eq!(report.records[2].category, "Ficção");
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "").unwrap();
        std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&sample_records()).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_empty_trailing_size_is_kept() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), format!("{HEADER}\nMusica;Track;Rock;215;Band;/music/t.mp3;\n")).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].disk_size, "");
    }

    #[test]
    fn test_save_to_directory_path_fails() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path());

        let err = store.save(&sample_records()).unwrap_err();
        assert!(matches!(err, MediatecaError::Persistence(_)));
    }
}
