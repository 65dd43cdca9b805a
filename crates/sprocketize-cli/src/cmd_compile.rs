// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the compile run behind the `sprocketize` command.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;
use sprocketize::{
    AssetEnvironment, Compiler, CompressorRegistry, ConfigLayer, ConfigResolver, Error,
    FileSystemEnvironment, Manifest, Result,
};

#[cfg(test)]
#[path = "./cmd_compile_test.rs"]
mod cmd_compile_test;

/// Compile the named assets into an output directory
#[derive(Debug, Args)]
pub struct CmdCompile {
    /// Assets root path (default: the current directory)
    #[clap(short = 'a', long = "asset-root", value_name = "DIR")]
    asset_root: Option<PathBuf>,

    /// Add a directory to the asset search path, relative to the asset root
    #[clap(short = 'I', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Embed content digests in output filenames
    #[clap(short, long)]
    digest: bool,

    /// Write a manifest.yml, into DIR when given
    #[clap(
        short,
        long,
        value_name = "DIR",
        num_args = 0..=1,
        require_equals = true
    )]
    manifest: Option<Option<PathBuf>>,

    /// Also write gzipped stylesheets and javascripts
    #[clap(short, long)]
    gzip: bool,

    /// Save the effective options to .sprocksrc in the asset root
    #[clap(short, long)]
    save: bool,

    /// Compress javascripts with closure, yui or uglifier
    #[clap(
        short = 'j',
        long = "compress-javascripts",
        value_name = "PROCESSOR",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "closure"
    )]
    compress_javascripts: Option<String>,

    /// Compress stylesheets with yui
    #[clap(short = 'c', long = "compress-stylesheets")]
    compress_stylesheets: bool,

    /// The output directory followed by the assets to publish
    #[clap(value_name = "ARGS")]
    args: Vec<String>,
}

/// What a compile run produced.
#[derive(Debug)]
pub struct Compiled {
    pub target: PathBuf,
    pub manifest: Manifest,
    pub saved: Option<PathBuf>,
}

impl CmdCompile {
    pub fn run(&mut self) -> Result<i32> {
        let root = match &self.asset_root {
            Some(dir) => dunce::canonicalize(dir).map_err(|_| no_such_path(dir))?,
            None => std::env::current_dir().map_err(|error| Error::Filesystem {
                path: PathBuf::from("."),
                error,
            })?,
        };

        let compiled = self.compile_in(&root, ConfigResolver::new(&root))?;

        println!(
            "{} {} asset(s) into {}",
            "Compiled".green(),
            compiled.manifest.len(),
            compiled.target.display()
        );
        if let Some(path) = compiled.saved {
            println!("{} options to {}", "Saved".green(), path.display());
        }
        Ok(0)
    }

    /// The options given on the command line, as the topmost config layer.
    ///
    /// Include directories are resolved against `root`, like the include
    /// paths of the config files.
    pub fn invocation_layer(&self, root: &Path) -> Result<ConfigLayer> {
        let paths = self
            .include_dirs
            .iter()
            .map(|dir| dunce::canonicalize(root.join(dir)).map_err(|_| no_such_path(dir)))
            .collect::<Result<BTreeSet<_>>>()?;

        let mut args = self.args.iter();
        let target = args.next().map(PathBuf::from);
        let assets: BTreeSet<String> = args.cloned().collect();

        Ok(ConfigLayer {
            target,
            paths: (!paths.is_empty()).then_some(paths),
            assets: (!assets.is_empty()).then_some(assets),
            manifest: self.manifest.is_some().then_some(true),
            manifest_path: self.manifest.clone().flatten(),
            digest: self.digest.then_some(true),
            gzip: self.gzip.then_some(true),
            js_compressor: self.compress_javascripts.clone(),
            compress_css: self.compress_stylesheets.then_some(true),
        })
    }

    /// Resolve the configuration for `root` and compile it.
    pub fn compile_in(&self, root: &Path, resolver: ConfigResolver) -> Result<Compiled> {
        let config = resolver.resolve(&self.invocation_layer(root)?)?;
        tracing::debug!(?config, "resolved config");

        let include_roots = sprocketize::derive_include_roots(&config, root)?;
        let selectors = sprocketize::asset_selectors(&config, root)?;

        let registry = CompressorRegistry::with_defaults();
        let mut env = FileSystemEnvironment::new(root);
        if let Some(compressor) = config.js_compressor() {
            env.set_js_compressor(registry.javascript(compressor.as_str())?);
        }
        if config.compress_css() {
            env.set_css_compressor(registry.stylesheet("yui")?);
        }
        for path in &include_roots {
            env.append_search_path(path);
        }

        let target = sprocketize::resolve_target(root, config.target())?;
        let compiler = Compiler::new(&env, target, selectors, config.compile_options(root))?;
        let manifest = compiler.compile()?;

        let saved = if self.save {
            Some(resolver.save(&config)?)
        } else {
            None
        };

        Ok(Compiled {
            target: compiler.target().to_path_buf(),
            manifest,
            saved,
        })
    }
}

fn no_such_path(path: &Path) -> Error {
    Error::Validation(format!("No such file or directory {}", path.display()))
}
