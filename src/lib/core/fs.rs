use crate::core::error::Result;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Create parent directories for a path when missing.
pub fn make_parent_dirs<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Detect whether a path uses a BGZF-compatible extension.
pub fn is_bgzipped<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().unwrap_or_else(|| OsStr::new("")),
        ext if ext == "gz" || ext == "gzip" || ext == "bgzf"
    )
}

/// Append `.gz` to a file name unless it already carries a BGZF-compatible extension.
pub fn with_gz_extension(path: &Path) -> PathBuf {
    if is_bgzipped(path) {
        return path.to_path_buf();
    }

    let mut adjusted = path.to_path_buf();
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        adjusted.set_file_name(format!("{}.gz", name));
    } else {
        adjusted.set_extension("gz");
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_compressed_extensions() {
        assert!(is_bgzipped("windows.tsv.gz"));
        assert!(is_bgzipped("windows.bgzf"));
        assert!(!is_bgzipped("windows.tsv"));
    }

    #[test]
    fn gz_extension_is_appended_once() {
        assert_eq!(
            with_gz_extension(Path::new("out/windows.tsv")),
            PathBuf::from("out/windows.tsv.gz")
        );
        assert_eq!(
            with_gz_extension(Path::new("out/windows.tsv.gz")),
            PathBuf::from("out/windows.tsv.gz")
        );
    }

    #[test]
    fn creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("chrX").join("windows.tsv");
        make_parent_dirs(&target).unwrap();
        assert!(dir.path().join("chrX").is_dir());
    }
}
