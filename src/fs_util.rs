use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::DataError;

/// Where the contents of nested archives land inside the nested output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NestedLayout {
    /// Every nested archive is unpacked into the same directory. Entries with the
    /// same name in later archives overwrite earlier ones.
    #[default]
    Shared,
    /// Each nested archive gets its own `<stem>/` directory.
    PerArchive,
}

/// Unpacks a zip archive into `target_dir`, creating it if needed.
///
/// Returns the paths of the regular files written.
pub fn extract_zip(zip_path: &Path, target_dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    let file = fs::File::open(zip_path)
        .map_err(|err| DataError::Extraction(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|err| DataError::Extraction(format!("{}: {err}", zip_path.display())))?;

    fs::create_dir_all(target_dir).map_err(|err| DataError::Filesystem(err.to_string()))?;

    let mut written = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| DataError::Extraction(err.to_string()))?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                return Err(DataError::Extraction(format!(
                    "zip entry path traversal detected: {}",
                    entry.name()
                )));
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&entry_path)
                .map_err(|err| DataError::Filesystem(err.to_string()))?;
            continue;
        }

        if let Some(parent) = entry_path.parent() {
            fs::create_dir_all(parent).map_err(|err| DataError::Filesystem(err.to_string()))?;
        }
        let mut outfile =
            fs::File::create(&entry_path).map_err(|err| DataError::Filesystem(err.to_string()))?;
        io::copy(&mut entry, &mut outfile)
            .map_err(|err| DataError::Extraction(format!("{}: {err}", entry.name())))?;
        debug!(entry = %entry_path.display(), "extracted");
        written.push(entry_path);
    }
    Ok(written)
}

/// Extracts every `*.zip` file found directly inside `root_dir` into `nested_dir`.
///
/// Only immediate children are inspected; the extension match ignores case.
/// Returns the nested archives that were extracted, in name order.
pub fn extract_nested_archives(
    root_dir: &Path,
    nested_dir: &Path,
    layout: NestedLayout,
) -> Result<Vec<PathBuf>, DataError> {
    let entries = fs::read_dir(root_dir).map_err(|err| {
        DataError::Filesystem(format!("read dir {}: {err}", root_dir.display()))
    })?;

    let mut archives = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| DataError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if path.is_file() && is_zip_archive(&path) {
            archives.push(path);
        }
    }
    archives.sort();

    for archive in &archives {
        let target = match layout {
            NestedLayout::Shared => nested_dir.to_path_buf(),
            NestedLayout::PerArchive => nested_dir.join(archive_stem(archive)),
        };
        info!(
            archive = %archive.display(),
            target = %target.display(),
            "extracting nested archive"
        );
        extract_zip(archive, &target)?;
    }
    Ok(archives)
}

pub fn is_zip_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// File name of `path` without its final extension.
pub fn archive_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string())
}
