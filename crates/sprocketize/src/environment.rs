// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! The asset environment consumed by the compiler, and a filesystem backed
//! implementation of it.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest as ShaDigest, Sha256};

use crate::{Compressor, Error, Result};

#[cfg(test)]
#[path = "./environment_test.rs"]
mod environment_test;

/// A compiled asset as handed out by an [`AssetEnvironment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    logical_path: String,
    pathname: PathBuf,
    digest: String,
    source: Vec<u8>,
}

impl Asset {
    /// Create an asset from its compiled bytes; the digest is derived from them.
    pub fn new<L, P>(logical_path: L, pathname: P, source: Vec<u8>) -> Self
    where
        L: Into<String>,
        P: Into<PathBuf>,
    {
        let digest = format!("{:x}", Sha256::digest(&source));
        Self {
            logical_path: logical_path.into(),
            pathname: pathname.into(),
            digest,
            source,
        }
    }

    /// Environment relative name, always `/` separated.
    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    /// Absolute path of the file the asset was built from.
    pub fn pathname(&self) -> &Path {
        &self.pathname
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// The logical path with the digest inserted before the extension,
    /// `js/app.js` becoming `js/app-<digest>.js`.
    pub fn digest_path(&self) -> String {
        let (dir, file) = match self.logical_path.rsplit_once('/') {
            Some((dir, file)) => (Some(dir), file),
            None => (None, self.logical_path.as_str()),
        };
        let file = match file.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{}.{ext}", self.digest),
            _ => format!("{file}-{}", self.digest),
        };
        match dir {
            Some(dir) => format!("{dir}/{file}"),
            None => file,
        }
    }

    /// Write the compiled bytes to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.source).map_err(|e| Error::filesystem(path, e))
    }

    /// Write a gzip encoded copy of the compiled bytes to `path`.
    pub fn write_gzip_to(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| Error::filesystem(path, e))?;
        let mut encoder = GzEncoder::new(file, Compression::best());
        encoder
            .write_all(&self.source)
            .map_err(|e| Error::filesystem(path, e))?;
        encoder.finish().map_err(|e| Error::filesystem(path, e))?;
        Ok(())
    }
}

/// The capability the compiler needs from an asset environment.
pub trait AssetEnvironment {
    /// Add a directory to the end of the search path.
    fn append_search_path(&mut self, path: &Path);

    /// Every logical path the environment knows about.
    fn logical_paths(&self) -> Result<Vec<String>>;

    /// Resolve a logical path, `Ok(None)` when the environment has no such asset.
    fn find_asset(&self, logical_path: &str) -> Result<Option<Asset>>;

    /// Post-process an asset chosen for output, such as compressing it.
    fn process_asset(&self, asset: Asset) -> Result<Asset> {
        Ok(asset)
    }
}

/// Serves the files found below an ordered list of search paths.
///
/// A logical path is the `/` separated location of a file relative to the
/// search path holding it; earlier search paths shadow later ones.
#[derive(Debug, Default)]
pub struct FileSystemEnvironment {
    root: PathBuf,
    search_paths: Vec<PathBuf>,
    js_compressor: Option<Box<dyn Compressor>>,
    css_compressor: Option<Box<dyn Compressor>>,
}

impl FileSystemEnvironment {
    /// Create an environment resolving relative search paths against `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn set_js_compressor(&mut self, compressor: Box<dyn Compressor>) {
        self.js_compressor = Some(compressor);
    }

    pub fn set_css_compressor(&mut self, compressor: Box<dyn Compressor>) {
        self.css_compressor = Some(compressor);
    }

    fn compressor_for(&self, logical_path: &str) -> Option<&dyn Compressor> {
        match Path::new(logical_path).extension().and_then(|e| e.to_str()) {
            Some("js") => self.js_compressor.as_deref(),
            Some("css") => self.css_compressor.as_deref(),
            _ => None,
        }
    }

}

impl AssetEnvironment for FileSystemEnvironment {
    fn append_search_path(&mut self, path: &Path) {
        let path = self.root.join(path);
        if !self.search_paths.contains(&path) {
            tracing::debug!(path = %path.display(), "appending search path");
            self.search_paths.push(path);
        }
    }

    fn logical_paths(&self) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut logical_paths = Vec::new();

        for search_path in &self.search_paths {
            if !search_path.is_dir() {
                continue;
            }
            let walker = walkdir::WalkDir::new(search_path)
                .follow_links(true)
                .sort_by_file_name();
            for entry in walker {
                let entry = entry.map_err(|e| {
                    let path = e.path().unwrap_or(search_path.as_path()).to_path_buf();
                    Error::filesystem(path, e.into())
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(search_path) else {
                    continue;
                };
                let logical_path = to_logical_path(relative);
                if seen.insert(logical_path.clone()) {
                    logical_paths.push(logical_path);
                }
            }
        }

        Ok(logical_paths)
    }

    fn find_asset(&self, logical_path: &str) -> Result<Option<Asset>> {
        let relative = Path::new(logical_path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Ok(None);
        }

        for search_path in &self.search_paths {
            let candidate = search_path.join(relative);
            if !candidate.is_file() {
                continue;
            }
            let pathname =
                dunce::canonicalize(&candidate).map_err(|error| Error::AssetResolution {
                    logical_path: logical_path.to_string(),
                    error,
                })?;
            let source = std::fs::read(&pathname).map_err(|error| Error::AssetResolution {
                logical_path: logical_path.to_string(),
                error,
            })?;
            return Ok(Some(Asset::new(logical_path, pathname, source)));
        }

        Ok(None)
    }

    fn process_asset(&self, asset: Asset) -> Result<Asset> {
        let Some(compressor) = self.compressor_for(asset.logical_path()) else {
            return Ok(asset);
        };

        let Asset {
            logical_path,
            pathname,
            source,
            ..
        } = asset;
        let text = match String::from_utf8(source) {
            Ok(text) => text,
            Err(e) => {
                return Err(Error::AssetResolution {
                    logical_path,
                    error: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                });
            }
        };
        tracing::debug!(logical_path = %logical_path, compressor = compressor.name(), "compressing");
        let compressed = compressor.compress(&text)?;
        Ok(Asset::new(logical_path, pathname, compressed.into_bytes()))
    }
}

fn to_logical_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
