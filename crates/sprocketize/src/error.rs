// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for sprocketize operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with sprocketize Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving configuration or compiling assets.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// A config layer exists but is not valid YAML for the config schema
    #[error("Invalid config file {path:?}: {error}")]
    #[diagnostic(
        code(sprocketize::config_parse),
        help("Check the YAML syntax of the .sprocksrc file or remove it")
    )]
    ConfigParse {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    /// A config layer exists but could not be read
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(sprocketize::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Validation error
    #[error("{0}")]
    #[diagnostic(code(sprocketize::validation_failed))]
    Validation(String),

    /// A compressor was requested but its program is not installed
    #[error("required compressor {name} is not available")]
    #[diagnostic(
        code(sprocketize::missing_compressor),
        help("{dependency} not installed. Please install {dependency} and make sure it is on your PATH.")
    )]
    MissingCompressor { name: String, dependency: String },

    /// A compressor ran but did not produce output
    #[error("{name} compressor failed: {message}")]
    #[diagnostic(code(sprocketize::compression_failed))]
    Compression { name: String, message: String },

    /// An asset named on the command line does not exist
    #[error("couldn't find file '{}'", .0.display())]
    #[diagnostic(
        code(sprocketize::asset_not_found),
        help("Asset arguments are resolved relative to the asset root (-a)")
    )]
    AssetNotFound(PathBuf),

    /// The asset environment failed to resolve a logical path
    #[error("Failed to resolve asset '{logical_path}'")]
    #[diagnostic(code(sprocketize::asset_resolution))]
    AssetResolution {
        logical_path: String,
        #[source]
        error: std::io::Error,
    },

    /// Writing output or creating a directory failed
    #[error("Filesystem error at {path:?}")]
    #[diagnostic(code(sprocketize::filesystem))]
    Filesystem {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A manifest from an earlier run is not a valid manifest
    #[error("Invalid manifest {path:?}: {error}")]
    #[diagnostic(code(sprocketize::manifest_parse))]
    ManifestParse {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    /// A document could not be serialized
    #[error("Failed to serialize {what}: {error}")]
    #[diagnostic(code(sprocketize::serialize_failed))]
    Serialize {
        what: &'static str,
        #[source]
        error: serde_yaml::Error,
    },
}

impl Error {
    /// True for errors that should be reported together with the usage text.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. } | Self::ReadFailed { .. } | Self::Validation(_)
        )
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            error,
        }
    }
}
