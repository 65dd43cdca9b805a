// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! sprocketize - Selective Asset Compilation
//!
//! This crate provides the core library for publishing a selected subset of an
//! asset environment into a static output directory, driven by cascading
//! configuration files (`.sprocksrc`).
//!
//! # Overview
//!
//! Configuration is merged from four layers, lowest precedence first: built-in
//! defaults, the user's global `~/.sprocksrc`, the project's local
//! `.sprocksrc`, and the explicit invocation. Scalar fields take the value of
//! the highest layer that sets them, while `paths` and `assets` are unioned.
//!
//! The [`Compiler`] then walks every logical path of an [`AssetEnvironment`],
//! writes the assets matched by its [`Selector`]s, optionally fingerprinting
//! names and emitting gzip siblings, and records a [`Manifest`].
//!
//! # Example
//!
//! ```yaml
//! # .sprocksrc
//! target: public/assets
//! paths:
//!   - vendor/assets
//! assets:
//!   - app/application.js
//!   - app/stylesheets
//! digest: true
//! gzip: true
//! manifest: true
//! manifest_path: null
//! js_compressor: uglifier
//! compress_css: false
//! ```

pub mod compiler;
pub mod compressor;
pub mod config;
pub mod environment;
pub mod error;
pub mod manifest;
pub mod roots;
pub mod selector;

pub use compiler::{CompileOptions, Compiler};
pub use compressor::{CommandCompressor, Compressor, CompressorKind, CompressorRegistry};
pub use config::{
    Config, ConfigLayer, ConfigResolver, JsCompressor, load_layer, merge_layers, persist,
};
pub use environment::{Asset, AssetEnvironment, FileSystemEnvironment};
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use roots::{asset_selectors, derive_include_roots, resolve_target};
pub use selector::Selector;

/// Well-known filename for the global and local config layers.
pub const SPROCKETS_FILENAME: &str = ".sprocksrc";

/// Well-known filename for the compile manifest.
pub const MANIFEST_FILENAME: &str = "manifest.yml";
