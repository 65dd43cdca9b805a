// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

fn asset(pathname: &str) -> Asset {
    let logical_path = pathname.rsplit('/').next().unwrap_or(pathname);
    Asset::new(logical_path, pathname, b"content".to_vec())
}

#[rstest]
#[case("/project/assets", "/project/assets/app.js", true)]
#[case("/project/assets/app.js", "/project/assets/app.js", true)]
#[case("/project/assets/app", "/project/assets/app.js", false)]
#[case("/project/other", "/project/assets/app.js", false)]
fn test_path_prefix(#[case] prefix: &str, #[case] pathname: &str, #[case] expected: bool) {
    let selector = Selector::path_prefix(prefix);
    assert_eq!(selector.matches(&asset(pathname)), expected);
}

#[rstest]
#[case("/project/*.js", "/project/app.js", true)]
#[case("/project/*.js", "/project/nested/app.js", true)]
#[case("/project/file?.js", "/project/file3.js", true)]
#[case("/project/file[12].js", "/project/file3.js", false)]
#[case("*.css", "/project/app.js", false)]
fn test_glob(#[case] pattern: &str, #[case] pathname: &str, #[case] expected: bool) {
    let selector = Selector::glob(pattern).expect("Should compile glob");
    assert_eq!(selector.matches(&asset(pathname)), expected);
}

#[rstest]
#[case(r"file1\.js", "/compiler/file1.js", true)]
#[case(r"file1\.js", "/compiler/file10.js", false)]
#[case(r"^/compiler/", "/compiler/file1.js", true)]
fn test_regex(#[case] pattern: &str, #[case] pathname: &str, #[case] expected: bool) {
    let selector = Selector::regex(pattern).expect("Should compile regex");
    assert_eq!(selector.matches(&asset(pathname)), expected);
}

#[rstest]
fn test_predicate() {
    let selector = Selector::predicate(|a| a.pathname().ends_with("file2.js"));
    assert!(selector.matches(&asset("/compiler/file2.js")));
    assert!(!selector.matches(&asset("/compiler/file1.js")));
}

#[rstest]
fn test_invalid_patterns_are_validation_errors() {
    assert!(matches!(Selector::glob("[unclosed"), Err(Error::Validation(_))));
    assert!(matches!(Selector::regex("(unclosed"), Err(Error::Validation(_))));
}

#[rstest]
fn test_any_selector_matches() {
    let selectors = vec![
        Selector::regex(r"file1\.js").unwrap(),
        Selector::predicate(|a| a.pathname().ends_with("file2.js")),
        Selector::glob("/compiler/file3.js").unwrap(),
    ];

    for name in ["file1.js", "file2.js", "file3.js"] {
        assert!(matches(&asset(&format!("/compiler/{name}")), &selectors), "{name}");
    }
    assert!(!matches(&asset("/compiler/file4.js"), &selectors));
    assert!(!matches(&asset("/compiler/file1.js"), &[]));
}

#[rstest]
fn test_debug_output() {
    let selector = Selector::predicate(|_| true);
    assert_eq!(format!("{selector:?}"), "Predicate(..)");
    let selector = Selector::glob("*.js").unwrap();
    assert_eq!(format!("{selector:?}"), "Glob(\"*.js\")");
}
