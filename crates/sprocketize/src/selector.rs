// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Path based criteria deciding which assets get compiled.

use std::fmt;
use std::path::PathBuf;

use crate::{Asset, Error, Result};

#[cfg(test)]
#[path = "./selector_test.rs"]
mod selector_test;

/// A criterion evaluated against an asset's absolute source pathname.
///
/// Selectors never look at asset content.
pub enum Selector {
    /// Matches assets located at or below this path.
    PathPrefix(PathBuf),
    /// Shell glob over the whole pathname; `*` also crosses separators.
    Glob(glob::Pattern),
    /// Matches when the expression is found anywhere in the pathname.
    Regex(regex::Regex),
    Predicate(Box<dyn Fn(&Asset) -> bool>),
}

impl Selector {
    pub fn path_prefix<P: Into<PathBuf>>(path: P) -> Self {
        Self::PathPrefix(path.into())
    }

    pub fn glob(pattern: &str) -> Result<Self> {
        glob::Pattern::new(pattern)
            .map(Self::Glob)
            .map_err(|e| Error::Validation(format!("invalid glob pattern '{pattern}': {e}")))
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        regex::Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| Error::Validation(format!("invalid regular expression '{pattern}': {e}")))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Asset) -> bool + 'static,
    {
        Self::Predicate(Box::new(f))
    }

    /// Check a single asset against this selector.
    pub fn matches(&self, asset: &Asset) -> bool {
        match self {
            Self::PathPrefix(prefix) => asset.pathname().starts_with(prefix),
            Self::Glob(pattern) => pattern.matches_path(asset.pathname()),
            Self::Regex(regex) => regex.is_match(&asset.pathname().to_string_lossy()),
            Self::Predicate(f) => f(asset),
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathPrefix(prefix) => f.debug_tuple("PathPrefix").field(prefix).finish(),
            Self::Glob(pattern) => f.debug_tuple("Glob").field(&pattern.as_str()).finish(),
            Self::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// True if any of `selectors` matches `asset`.
pub fn matches(asset: &Asset, selectors: &[Selector]) -> bool {
    selectors.iter().any(|s| s.matches(asset))
}
