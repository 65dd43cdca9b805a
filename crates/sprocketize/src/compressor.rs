// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Pluggable javascript and stylesheet compressors.

use std::collections::BTreeMap;
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::{Error, Result};

#[cfg(test)]
#[path = "./compressor_test.rs"]
mod compressor_test;

/// Turns source text into compressed source text.
pub trait Compressor: std::fmt::Debug {
    fn name(&self) -> &str;

    fn compress(&self, source: &str) -> Result<String>;
}

/// A compressor backed by an external program reading the source on stdin
/// and printing the result on stdout.
#[derive(Debug, Clone)]
pub struct CommandCompressor {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl CommandCompressor {
    pub fn new<N, P>(name: N, program: P, args: &[&str]) -> Self
    where
        N: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Find `program` on the PATH, failing with [`Error::MissingCompressor`]
    /// when it is not installed.
    pub fn locate(name: &str, program: &str, args: &[&str]) -> Result<Self> {
        let path = which::which(program).map_err(|_| Error::MissingCompressor {
            name: name.to_string(),
            dependency: program.to_string(),
        })?;
        Ok(Self::new(name, path, args))
    }
}

impl Compressor for CommandCompressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn compress(&self, source: &str) -> Result<String> {
        let failed = |message: String| Error::Compression {
            name: self.name.clone(),
            message,
        };

        // Feed stdin from a file so a large output can't block on a full pipe.
        let mut input = tempfile::tempfile().map_err(|e| failed(e.to_string()))?;
        input
            .write_all(source.as_bytes())
            .map_err(|e| failed(e.to_string()))?;
        input
            .seek(SeekFrom::Start(0))
            .map_err(|e| failed(e.to_string()))?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::from(input))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| failed(format!("could not run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("{} ({})", stderr.trim(), output.status)));
        }

        String::from_utf8(output.stdout).map_err(|e| failed(e.to_string()))
    }
}

/// Which kind of source a compressor handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompressorKind {
    Javascript,
    Stylesheet,
}

type Factory = Box<dyn Fn() -> Result<Box<dyn Compressor>>>;

/// Named compressor implementations, instantiated on demand.
#[derive(Default)]
pub struct CompressorRegistry {
    factories: BTreeMap<(CompressorKind, String), Factory>,
}

impl CompressorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry knowing the closure, yui and uglifier command line tools.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_command(CompressorKind::Javascript, "closure", "closure-compiler", &[]);
        registry.register_command(
            CompressorKind::Javascript,
            "yui",
            "yuicompressor",
            &["--type", "js"],
        );
        registry.register_command(
            CompressorKind::Javascript,
            "uglifier",
            "uglifyjs",
            &["--compress", "--mangle"],
        );
        registry.register_command(
            CompressorKind::Stylesheet,
            "yui",
            "yuicompressor",
            &["--type", "css"],
        );
        registry
    }

    pub fn register<F>(&mut self, kind: CompressorKind, name: &str, factory: F)
    where
        F: Fn() -> Result<Box<dyn Compressor>> + 'static,
    {
        self.factories
            .insert((kind, name.to_string()), Box::new(factory));
    }

    /// Register a compressor that runs `program`, located when first requested.
    pub fn register_command(
        &mut self,
        kind: CompressorKind,
        name: &str,
        program: &'static str,
        args: &'static [&'static str],
    ) {
        let owned_name = name.to_string();
        self.register(kind, name, move || {
            CommandCompressor::locate(&owned_name, program, args)
                .map(|c| Box::new(c) as Box<dyn Compressor>)
        });
    }

    pub fn contains(&self, kind: CompressorKind, name: &str) -> bool {
        self.factories.contains_key(&(kind, name.to_string()))
    }

    /// Instantiate the compressor registered under `name`.
    pub fn get(&self, kind: CompressorKind, name: &str) -> Result<Box<dyn Compressor>> {
        let factory = self
            .factories
            .get(&(kind, name.to_string()))
            .ok_or_else(|| Error::MissingCompressor {
                name: name.to_string(),
                dependency: name.to_string(),
            })?;
        factory()
    }

    pub fn javascript(&self, name: &str) -> Result<Box<dyn Compressor>> {
        self.get(CompressorKind::Javascript, name)
    }

    pub fn stylesheet(&self, name: &str) -> Result<Box<dyn Compressor>> {
        self.get(CompressorKind::Stylesheet, name)
    }
}
