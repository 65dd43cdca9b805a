// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Turning the configured asset arguments into search path roots and
//! selectors.
//!
//! An asset argument is either a path (a file or a directory, relative to
//! the asset root) or a glob pattern. Paths contribute their directory to
//! the search path and select everything at or below themselves. Globs
//! contribute their longest literal directory prefix and select the files
//! matching the pattern.

use std::path::{Component, Path, PathBuf};

use crate::{Config, Error, Result, Selector};

#[cfg(test)]
#[path = "./roots_test.rs"]
mod roots_test;

const GLOB_CHARS: &[char] = &['*', '?', '['];

fn is_glob(argument: &str) -> bool {
    argument.contains(GLOB_CHARS)
}

fn canonicalize_in(root: &Path, path: &Path) -> std::io::Result<PathBuf> {
    dunce::canonicalize(root.join(path))
}

fn resolve_asset(root: &Path, argument: &str) -> Result<PathBuf> {
    canonicalize_in(root, Path::new(argument)).map_err(|_| Error::AssetNotFound(root.join(argument)))
}

/// Split a glob argument into its canonical literal directory and the
/// remaining pattern components.
fn split_glob(root: &Path, argument: &str) -> Result<(PathBuf, PathBuf)> {
    let mut literal = PathBuf::new();
    let mut pattern = PathBuf::new();
    for component in Path::new(argument).components() {
        let is_pattern = !pattern.as_os_str().is_empty()
            || matches!(component, Component::Normal(c) if is_glob(&c.to_string_lossy()));
        if is_pattern {
            pattern.push(component);
        } else {
            literal.push(component);
        }
    }

    let base = canonicalize_in(root, &literal).map_err(|_| Error::AssetNotFound(root.join(&literal)))?;
    Ok((base, pattern))
}

fn glob_selector(root: &Path, argument: &str) -> Result<Selector> {
    let (base, pattern) = split_glob(root, argument)?;
    let base = glob::Pattern::escape(&base.to_string_lossy());
    let absolute = Path::new(&base).join(pattern);
    Selector::glob(&absolute.to_string_lossy())
}

/// Directories to put on the asset search path, in search order.
///
/// Each asset argument that is a file adds its directory, a directory adds
/// itself. The configured include paths follow, so they never shadow an
/// asset named by an argument. All entries are absolute, symlink resolved
/// and listed once.
pub fn derive_include_roots(config: &Config, root: &Path) -> Result<Vec<PathBuf>> {
    let mut roots = Vec::new();
    let mut push = |path: PathBuf| {
        if !roots.contains(&path) {
            roots.push(path);
        }
    };

    for argument in config.asset_selectors() {
        if is_glob(argument) {
            push(split_glob(root, argument)?.0);
            continue;
        }
        let path = resolve_asset(root, argument)?;
        match path.parent() {
            Some(parent) if path.is_file() => push(parent.to_path_buf()),
            _ => push(path),
        }
    }

    for include in config.include_paths() {
        let path = canonicalize_in(root, include).map_err(|_| {
            Error::Validation(format!("No such file or directory {}", include.display()))
        })?;
        push(path);
    }

    tracing::debug!(?roots, "include roots");
    Ok(roots)
}

/// Selectors admitting only the assets named by the asset arguments.
///
/// Path arguments are combined into a single predicate over their resolved
/// locations; every glob argument becomes a glob selector.
pub fn asset_selectors(config: &Config, root: &Path) -> Result<Vec<Selector>> {
    let mut asset_roots = Vec::new();
    let mut selectors = Vec::new();

    for argument in config.asset_selectors() {
        if is_glob(argument) {
            selectors.push(glob_selector(root, argument)?);
        } else {
            asset_roots.push(resolve_asset(root, argument)?);
        }
    }

    if !asset_roots.is_empty() {
        let filter = Selector::predicate(move |asset| {
            asset_roots.iter().any(|r| asset.pathname().starts_with(r))
        });
        selectors.insert(0, filter);
    }

    Ok(selectors)
}

/// The absolute output directory, created if it does not exist yet.
pub fn resolve_target(root: &Path, target: &Path) -> Result<PathBuf> {
    let path = root.join(target);
    std::fs::create_dir_all(&path).map_err(|e| Error::filesystem(&path, e))?;
    dunce::canonicalize(&path).map_err(|e| Error::filesystem(&path, e))
}
