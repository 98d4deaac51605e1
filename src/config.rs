use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::fs_util::NestedLayout;

pub const DEFAULT_CONFIG_FILE: &str = "mri-data.json";
pub const DEFAULT_URL: &str = "https://ndownloader.figshare.com/articles/1512427/versions/5";
pub const DEFAULT_ARCHIVE: &str = "mri_example.zip";
pub const DEFAULT_NESTED_DIR: &str = "data";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub archive: Option<Utf8PathBuf>,
    #[serde(default)]
    pub nested_dir: Option<String>,
    #[serde(default)]
    pub skip_download: Option<bool>,
    #[serde(default)]
    pub namespace_nested: Option<bool>,
}

/// Command-line values that win over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub archive: Option<Utf8PathBuf>,
    pub skip_download: bool,
    pub namespace_nested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub url: String,
    pub archive: Utf8PathBuf,
    pub nested_dir: String,
    pub skip_download: bool,
    pub nested_layout: NestedLayout,
}

impl ResolvedConfig {
    /// Directory the top-level archive is unpacked into: the archive path minus its extension.
    pub fn extraction_dir(&self) -> Utf8PathBuf {
        extraction_dir_for(&self.archive)
    }

    pub fn nested_output_dir(&self) -> Utf8PathBuf {
        self.extraction_dir().join(&self.nested_dir)
    }

    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.archive.with_extension("fetch.json")
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.url {
            self.url = url;
        }
        if let Some(archive) = overrides.archive {
            self.archive = archive;
        }
        if overrides.skip_download {
            self.skip_download = true;
        }
        if overrides.namespace_nested {
            self.nested_layout = NestedLayout::PerArchive;
        }
        self
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `mri-data.json` from the working directory when no path is given.
    ///
    /// A missing default file yields the built-in defaults; a missing explicit file is an error.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, DataError> {
        let config_path = match path {
            Some(path) => Utf8PathBuf::from(path),
            None => Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| DataError::ConfigRead(config_path.clone().into_std_path_buf()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| DataError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let nested_layout = if config.namespace_nested.unwrap_or(false) {
            NestedLayout::PerArchive
        } else {
            NestedLayout::Shared
        };
        ResolvedConfig {
            url: config.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            archive: config
                .archive
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_ARCHIVE)),
            nested_dir: config
                .nested_dir
                .unwrap_or_else(|| DEFAULT_NESTED_DIR.to_string()),
            skip_download: config.skip_download.unwrap_or(false),
            nested_layout,
        }
    }
}

fn extraction_dir_for(archive: &Utf8Path) -> Utf8PathBuf {
    match archive.extension() {
        Some(_) => archive.with_extension(""),
        None => {
            let name = archive.file_name().unwrap_or("archive");
            archive.with_file_name(format!("{name}_extracted"))
        }
    }
}
