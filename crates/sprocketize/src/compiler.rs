// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Compilation of the selected assets of an environment into a target directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::selector::matches;
use crate::{Asset, AssetEnvironment, Error, MANIFEST_FILENAME, Manifest, Result, Selector};

#[cfg(test)]
#[path = "./compiler_test.rs"]
mod compiler_test;

/// Extensions that get a gzip sibling when gzip output is enabled.
const GZIP_EXTENSIONS: &[&str] = &["css", "js"];

/// Output policy for a compile run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Embed the content digest in output filenames.
    pub digest: bool,

    /// Write `.gz` copies of stylesheets and javascripts.
    pub gzip: bool,

    /// Write a manifest after compiling.
    pub manifest: bool,

    /// Directory for the manifest (default: the target directory).
    pub manifest_path: Option<PathBuf>,
}

/// Writes every selected asset of an environment below a target directory.
pub struct Compiler<'env> {
    env: &'env dyn AssetEnvironment,
    target: PathBuf,
    selectors: Vec<Selector>,
    options: CompileOptions,
}

impl<'env> Compiler<'env> {
    /// Create a compiler, creating the target directory if it is missing.
    pub fn new<P: Into<PathBuf>>(
        env: &'env dyn AssetEnvironment,
        target: P,
        selectors: Vec<Selector>,
        options: CompileOptions,
    ) -> Result<Self> {
        let target = target.into();
        std::fs::create_dir_all(&target).map_err(|e| Error::filesystem(&target, e))?;
        let target = dunce::canonicalize(&target).map_err(|e| Error::filesystem(&target, e))?;
        Ok(Self {
            env,
            target,
            selectors,
            options,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Compile all selected assets and return what was written.
    ///
    /// The first error aborts the run. Files written before it stay in place.
    pub fn compile(&self) -> Result<Manifest> {
        let mut manifest = Manifest::new();
        let previous = self.previous_outputs();

        for logical_path in self.env.logical_paths()? {
            let Some(asset) = self.env.find_asset(&logical_path)? else {
                tracing::debug!(logical_path = %logical_path, "no asset, skipping");
                continue;
            };
            if !self.should_compile(&asset, &previous) {
                tracing::trace!(logical_path = %logical_path, "not selected");
                continue;
            }
            let asset = self.env.process_asset(asset)?;
            let output_path = self.write_asset(&asset)?;
            manifest.insert(logical_path, output_path);
        }

        if self.options.manifest {
            manifest.write(self.manifest_directory())?;
        }

        Ok(manifest)
    }

    /// The output path of `asset`, relative to the target directory.
    pub fn path_for(&self, asset: &Asset) -> String {
        if self.options.digest {
            asset.digest_path()
        } else {
            asset.logical_path().to_string()
        }
    }

    fn manifest_directory(&self) -> &Path {
        self.options.manifest_path.as_deref().unwrap_or(&self.target)
    }

    /// Files recorded by the manifest of an earlier run, with their gzip
    /// siblings. These are never compiled again.
    fn previous_outputs(&self) -> HashSet<PathBuf> {
        let mut outputs = HashSet::new();
        let path = self.manifest_directory().join(MANIFEST_FILENAME);
        if !path.is_file() {
            return outputs;
        }
        let previous = match Manifest::load(&path) {
            Ok(previous) => previous,
            Err(err) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable manifest: {err}");
                return outputs;
            }
        };
        for (_, output_path) in previous.iter() {
            let filename = self.output_filename(output_path);
            let mut gz = filename.clone().into_os_string();
            gz.push(".gz");
            outputs.insert(PathBuf::from(gz));
            outputs.insert(filename);
        }
        outputs
    }

    fn should_compile(&self, asset: &Asset, previous: &HashSet<PathBuf>) -> bool {
        if previous.contains(asset.pathname()) {
            return false;
        }
        matches(asset, &self.selectors)
    }

    fn output_filename(&self, output_path: &str) -> PathBuf {
        output_path
            .split('/')
            .fold(self.target.clone(), |path, segment| path.join(segment))
    }

    fn write_asset(&self, asset: &Asset) -> Result<String> {
        let output_path = self.path_for(asset);
        let filename = self.output_filename(&output_path);

        if let Some(parent) = filename.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::filesystem(parent, e))?;
        }
        asset.write_to(&filename)?;
        tracing::info!(logical_path = asset.logical_path(), output = %output_path, "compiled");

        if self.options.gzip && has_gzip_extension(&output_path) {
            let mut gz = filename.into_os_string();
            gz.push(".gz");
            asset.write_gzip_to(Path::new(&gz))?;
        }

        Ok(output_path)
    }
}

fn has_gzip_extension(output_path: &str) -> bool {
    Path::new(output_path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| GZIP_EXTENSIONS.contains(&e))
}
