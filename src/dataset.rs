use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::DataError;
use crate::sample::{Sample, SampleLayout, load_sample};

/// Indexable view over the sample files of one directory.
///
/// The file list is captured once in [`SampleStore::open`] and sorted by name;
/// files added or removed afterwards are not seen. Each [`SampleStore::get`]
/// opens and closes its own file, so a shared store can serve several threads.
#[derive(Debug, Clone)]
pub struct SampleStore {
    root: PathBuf,
    files: Vec<String>,
    layout: SampleLayout,
}

impl SampleStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, DataError> {
        Self::with_layout(root, SampleLayout::default())
    }

    pub fn with_layout(root: impl AsRef<Path>, layout: SampleLayout) -> Result<Self, DataError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(DataError::DirectoryNotFound(root));
        }

        let entries = fs::read_dir(&root)
            .map_err(|err| DataError::Filesystem(format!("read dir {}: {err}", root.display())))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| DataError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if !path.is_file() || !has_extension(&path, &layout.extension) {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => files.push(name),
                Err(name) => debug!(?name, "skipping non UTF-8 file name"),
            }
        }
        files.sort();
        info!(root = %root.display(), samples = files.len(), "sample store opened");

        Ok(Self {
            root,
            files,
            layout,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &SampleLayout {
        &self.layout
    }

    pub fn file_names(&self) -> &[String] {
        &self.files
    }

    pub fn path(&self, index: usize) -> Result<PathBuf, DataError> {
        self.files
            .get(index)
            .map(|name| self.root.join(name))
            .ok_or(DataError::IndexOutOfRange {
                index,
                len: self.files.len(),
            })
    }

    pub fn get(&self, index: usize) -> Result<Sample, DataError> {
        let path = self.path(index)?;
        load_sample(&path, &self.layout)
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Sample, DataError>> + '_ {
        (0..self.len()).map(|index| self.get(index))
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == extension)
        .unwrap_or(false)
}
