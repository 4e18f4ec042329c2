use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes `text` beside `path` and renames it into place, so a reader never
/// observes a half-written blob.
pub(crate) fn replace_text(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path(path);
    if let Err(error) = fs::write(&staging, text.as_bytes()) {
        let _ = fs::remove_file(&staging);
        return Err(error);
    }
    if let Err(error) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(error);
    }
    Ok(())
}

/// Removing a blob that does not exist succeeds.
pub(crate) fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "blob".into());
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_overwrites_and_leaves_no_staging_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("slot.json");

        replace_text(&path, "first").expect("first write");
        replace_text(&path, "second").expect("second write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "second");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn removing_missing_file_is_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        remove_if_present(&dir.path().join("absent.json")).expect("remove");
    }
}
