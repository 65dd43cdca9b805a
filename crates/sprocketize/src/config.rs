// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Cascading configuration layers and their resolution into a [`Config`].

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::compiler::CompileOptions;
use crate::{Error, Result, SPROCKETS_FILENAME};

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

/// Javascript compressors understood by sprocketize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsCompressor {
    Closure,
    Yui,
    Uglifier,
}

impl JsCompressor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closure => "closure",
            Self::Yui => "yui",
            Self::Uglifier => "uglifier",
        }
    }
}

impl fmt::Display for JsCompressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JsCompressor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "closure" => Ok(Self::Closure),
            "yui" => Ok(Self::Yui),
            "uglifier" => Ok(Self::Uglifier),
            other => Err(Error::Validation(format!(
                "unsupported javascript processor {other}"
            ))),
        }
    }
}

/// One partial layer of configuration, as found in a `.sprocksrc` file or
/// built from command line flags.
///
/// Fields that a layer does not mention stay `None` so that lower layers can
/// still supply them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigLayer {
    /// Output directory, relative to the asset root.
    #[serde(default)]
    pub target: Option<PathBuf>,

    /// Extra directories for the asset search path.
    #[serde(default, deserialize_with = "one_or_many")]
    pub paths: Option<BTreeSet<PathBuf>>,

    /// Asset files, directories or glob patterns to publish.
    #[serde(default, deserialize_with = "one_or_many")]
    pub assets: Option<BTreeSet<String>>,

    #[serde(default)]
    pub manifest: Option<bool>,

    #[serde(default)]
    pub manifest_path: Option<PathBuf>,

    #[serde(default)]
    pub digest: Option<bool>,

    #[serde(default)]
    pub gzip: Option<bool>,

    /// Raw compressor name; checked during validation.
    #[serde(default)]
    pub js_compressor: Option<String>,

    #[serde(default)]
    pub compress_css: Option<bool>,
}

/// Accept either a single scalar or a sequence for collection fields.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Option<BTreeSet<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Ord,
{
    let value: Option<OneOrMany<T>> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        OneOrMany::One(item) => BTreeSet::from([item]),
        OneOrMany::Many(items) => items.into_iter().collect(),
    }))
}

impl ConfigLayer {
    /// The built-in default layer, lowest in precedence.
    pub fn defaults() -> Self {
        Self {
            target: None,
            paths: Some(BTreeSet::new()),
            assets: Some(BTreeSet::new()),
            manifest: Some(false),
            manifest_path: None,
            digest: Some(false),
            gzip: Some(false),
            js_compressor: None,
            compress_css: Some(false),
        }
    }

    /// Parse a layer from YAML. An empty document is an empty layer.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value)
    }

    /// Layer `other` on top of this one.
    fn apply(&mut self, other: &ConfigLayer) {
        override_with(&mut self.target, &other.target);
        override_with(&mut self.manifest, &other.manifest);
        override_with(&mut self.manifest_path, &other.manifest_path);
        override_with(&mut self.digest, &other.digest);
        override_with(&mut self.gzip, &other.gzip);
        override_with(&mut self.js_compressor, &other.js_compressor);
        override_with(&mut self.compress_css, &other.compress_css);

        if let Some(paths) = &other.paths {
            self.paths
                .get_or_insert_with(BTreeSet::new)
                .extend(paths.iter().map(|p| normalize_path(p)));
        }
        if let Some(assets) = &other.assets {
            self.assets
                .get_or_insert_with(BTreeSet::new)
                .extend(assets.iter().map(|a| normalize_selector(a)));
        }
    }
}

fn override_with<T: Clone>(field: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        field.clone_from(value);
    }
}

/// Drop trailing separators and `.` components so `vendor/` and `vendor`
/// are the same set member. Case is significant.
fn normalize_path(path: &Path) -> PathBuf {
    let normalized: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

fn normalize_selector(selector: &str) -> String {
    let trimmed = selector.trim_end_matches('/');
    if trimmed.is_empty() {
        selector.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Load a layer from `path`. A missing file is an empty layer.
pub fn load_layer<P: AsRef<Path>>(path: P) -> Result<ConfigLayer> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config layer");
        return Ok(ConfigLayer::default());
    }

    let yaml = std::fs::read_to_string(path).map_err(|error| Error::ReadFailed {
        path: path.to_path_buf(),
        error,
    })?;

    let layer = ConfigLayer::from_yaml(&yaml).map_err(|error| Error::ConfigParse {
        path: path.to_path_buf(),
        error,
    })?;
    tracing::debug!(path = %path.display(), "loaded config layer");
    Ok(layer)
}

/// Merge layers given from lowest to highest precedence.
///
/// Scalars take the value of the highest layer that sets them and the
/// `paths` and `assets` collections are the union across all layers.
pub fn merge_layers<'a, I>(layers: I) -> ConfigLayer
where
    I: IntoIterator<Item = &'a ConfigLayer>,
{
    let mut merged = ConfigLayer::default();
    for layer in layers {
        merged.apply(layer);
    }
    merged
}

/// The effective configuration of one invocation.
///
/// Only constructed from a merged layer through validation, and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    target: PathBuf,
    include_paths: BTreeSet<PathBuf>,
    asset_selectors: BTreeSet<String>,
    digest: bool,
    manifest: bool,
    manifest_path: Option<PathBuf>,
    gzip: bool,
    js_compressor: Option<JsCompressor>,
    compress_css: bool,
}

impl TryFrom<ConfigLayer> for Config {
    type Error = Error;

    fn try_from(layer: ConfigLayer) -> Result<Self> {
        let target = layer
            .target
            .filter(|t| !t.as_os_str().is_empty())
            .ok_or_else(|| Error::Validation("no output directory provided".to_string()))?;

        let asset_selectors = layer.assets.unwrap_or_default();
        if asset_selectors.is_empty() {
            return Err(Error::Validation("no assets provided".to_string()));
        }

        let js_compressor = layer
            .js_compressor
            .as_deref()
            .map(JsCompressor::from_str)
            .transpose()?;

        Ok(Self {
            target,
            include_paths: layer.paths.unwrap_or_default(),
            asset_selectors,
            digest: layer.digest.unwrap_or(false),
            manifest: layer.manifest.unwrap_or(false),
            manifest_path: layer.manifest_path,
            gzip: layer.gzip.unwrap_or(false),
            js_compressor,
            compress_css: layer.compress_css.unwrap_or(false),
        })
    }
}

impl Config {
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn include_paths(&self) -> &BTreeSet<PathBuf> {
        &self.include_paths
    }

    pub fn asset_selectors(&self) -> &BTreeSet<String> {
        &self.asset_selectors
    }

    pub fn digest(&self) -> bool {
        self.digest
    }

    pub fn manifest(&self) -> bool {
        self.manifest
    }

    pub fn manifest_path(&self) -> Option<&Path> {
        self.manifest_path.as_deref()
    }

    pub fn gzip(&self) -> bool {
        self.gzip
    }

    pub fn js_compressor(&self) -> Option<JsCompressor> {
        self.js_compressor
    }

    pub fn compress_css(&self) -> bool {
        self.compress_css
    }

    /// A fully populated layer describing this config, as it is persisted.
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            target: Some(self.target.clone()),
            paths: Some(self.include_paths.clone()),
            assets: Some(self.asset_selectors.clone()),
            manifest: Some(self.manifest),
            manifest_path: self.manifest_path.clone(),
            digest: Some(self.digest),
            gzip: Some(self.gzip),
            js_compressor: self.js_compressor.map(|c| c.to_string()),
            compress_css: Some(self.compress_css),
        }
    }

    /// Compiler options, with a relative manifest path taken from `root`.
    pub fn compile_options(&self, root: &Path) -> CompileOptions {
        CompileOptions {
            digest: self.digest,
            gzip: self.gzip,
            manifest: self.manifest,
            manifest_path: self.manifest_path.as_ref().map(|p| root.join(p)),
        }
    }
}

/// Write the effective `config` to `path`, replacing any existing file.
pub fn persist<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let path = path.as_ref();
    let yaml = serde_yaml::to_string(&config.to_layer()).map_err(|error| Error::Serialize {
        what: "config",
        error,
    })?;
    std::fs::write(path, yaml).map_err(|error| Error::filesystem(path, error))?;
    tracing::debug!(path = %path.display(), "saved config");
    Ok(())
}

/// Locates and merges the config layers for one asset root.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    root: PathBuf,
    home: Option<PathBuf>,
}

impl ConfigResolver {
    /// Resolver for `root`, reading the global layer from the user's home.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            home: dirs::home_dir(),
        }
    }

    /// Replace the directory searched for the global layer.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn global_path(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join(SPROCKETS_FILENAME))
    }

    pub fn local_path(&self) -> PathBuf {
        self.root.join(SPROCKETS_FILENAME)
    }

    pub fn load_global(&self) -> Result<ConfigLayer> {
        match self.global_path() {
            Some(path) => load_layer(path),
            None => Ok(ConfigLayer::default()),
        }
    }

    pub fn load_local(&self) -> Result<ConfigLayer> {
        load_layer(self.local_path())
    }

    /// Merge defaults, global, local and `invocation`, then validate.
    pub fn resolve(&self, invocation: &ConfigLayer) -> Result<Config> {
        let layers = [
            ConfigLayer::defaults(),
            self.load_global()?,
            self.load_local()?,
            invocation.clone(),
        ];
        Config::try_from(merge_layers(&layers))
    }

    /// Persist `config` as the local layer.
    pub fn save(&self, config: &Config) -> Result<PathBuf> {
        let path = self.local_path();
        persist(config, &path)?;
        Ok(path)
    }
}
