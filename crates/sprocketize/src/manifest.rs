// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! The mapping from logical asset paths to the files a compile run wrote.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, MANIFEST_FILENAME, Result};

#[cfg(test)]
#[path = "./manifest_test.rs"]
mod manifest_test;

/// Logical path to output path, relative to the target directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an output path, replacing an earlier entry for the same asset.
    pub fn insert<L, O>(&mut self, logical_path: L, output_path: O)
    where
        L: Into<String>,
        O: Into<String>,
    {
        self.entries.insert(logical_path.into(), output_path.into());
    }

    pub fn get(&self, logical_path: &str) -> Option<&str> {
        self.entries.get(logical_path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Write `manifest.yml` into `directory`, creating it if needed and
    /// replacing any manifest from an earlier run.
    pub fn write<P: AsRef<Path>>(&self, directory: P) -> Result<PathBuf> {
        let directory = directory.as_ref();
        std::fs::create_dir_all(directory).map_err(|e| Error::filesystem(directory, e))?;

        let path = directory.join(MANIFEST_FILENAME);
        let yaml = serde_yaml::to_string(self).map_err(|error| Error::Serialize {
            what: "manifest",
            error,
        })?;
        std::fs::write(&path, yaml).map_err(|e| Error::filesystem(&path, e))?;

        tracing::info!(path = %path.display(), entries = self.len(), "wrote manifest");
        Ok(path)
    }

    /// Read a manifest written by [`Manifest::write`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| Error::filesystem(path, e))?;
        serde_yaml::from_str(&yaml).map_err(|error| Error::ManifestParse {
            path: path.to_path_buf(),
            error,
        })
    }
}
