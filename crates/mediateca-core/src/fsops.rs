use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

/// Move a file, replacing anything already at `to`.
///
/// Tries a rename first; when that fails (e.g. across volumes) falls back to
/// copy + remove.
pub(crate) fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !from.is_file() {
                return Err(rename_err);
            }
            debug!(
                from = %from.display(),
                to = %to.display(),
                error = %rename_err,
                "Rename failed, falling back to copy"
            );
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

/// Directory holding `path`, with `.` standing in for a bare file name.
pub(crate) fn parent_or_cwd(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_file_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.mp3");
        let to = dir.path().join("b.mp3");
        fs::write(&from, "new").unwrap();
        fs::write(&to, "old").unwrap();

        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "new");
    }

    #[test]
    fn test_move_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = move_file(&dir.path().join("nope.mp3"), &dir.path().join("b.mp3")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_parent_or_cwd() {
        assert_eq!(parent_or_cwd(Path::new("/films/a.mkv")), Path::new("/films"));
        assert_eq!(parent_or_cwd(Path::new("a.mkv")), Path::new("."));
    }
}
