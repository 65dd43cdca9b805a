// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn layer_with_target(target: Option<&str>) -> ConfigLayer {
    ConfigLayer {
        target: target.map(PathBuf::from),
        ..Default::default()
    }
}

fn valid_layer() -> ConfigLayer {
    ConfigLayer {
        target: Some(PathBuf::from("compiled")),
        assets: Some(BTreeSet::from(["app.js".to_string()])),
        ..Default::default()
    }
}

#[rstest]
fn test_parse_full_layer() {
    let yaml = r#"
target: ../compiled
paths:
  - vendor/assets
  - lib/assets
assets:
  - application.js
manifest: true
manifest_path: public
digest: true
gzip: false
js_compressor: uglifier
compress_css: true
"#;
    let layer = ConfigLayer::from_yaml(yaml).expect("Should parse full layer");
    assert_eq!(layer.target, Some(PathBuf::from("../compiled")));
    assert_eq!(layer.paths.as_ref().map(BTreeSet::len), Some(2));
    assert_eq!(
        layer.assets,
        Some(BTreeSet::from(["application.js".to_string()]))
    );
    assert_eq!(layer.manifest, Some(true));
    assert_eq!(layer.manifest_path, Some(PathBuf::from("public")));
    assert_eq!(layer.digest, Some(true));
    assert_eq!(layer.gzip, Some(false));
    assert_eq!(layer.js_compressor.as_deref(), Some("uglifier"));
    assert_eq!(layer.compress_css, Some(true));
}

#[rstest]
fn test_parse_leaves_absent_fields_unset() {
    let layer = ConfigLayer::from_yaml("digest: true\n").expect("Should parse");
    assert_eq!(layer.digest, Some(true));
    assert!(layer.target.is_none());
    assert!(layer.paths.is_none());
    assert!(layer.gzip.is_none());
}

#[rstest]
fn test_parse_single_string_paths() {
    let layer = ConfigLayer::from_yaml("paths: /global/path\n").expect("Should parse");
    assert_eq!(
        layer.paths,
        Some(BTreeSet::from([PathBuf::from("/global/path")]))
    );
}

#[rstest]
#[case("")]
#[case("# only a comment\n")]
#[case("~\n")]
fn test_parse_empty_document(#[case] yaml: &str) {
    let layer = ConfigLayer::from_yaml(yaml).expect("Should parse empty document");
    assert_eq!(layer, ConfigLayer::default());
}

#[rstest]
fn test_load_missing_layer_is_empty() {
    let tmp = TempDir::new().unwrap();
    let layer = load_layer(tmp.path().join(SPROCKETS_FILENAME)).expect("Should load");
    assert_eq!(layer, ConfigLayer::default());
}

#[rstest]
#[case("assets: [\n  unclosed bracket\n")]
#[case("digest: maybe\n")]
#[case("target: [a, b]\n")]
fn test_load_malformed_layer(#[case] yaml: &str) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(SPROCKETS_FILENAME);
    std::fs::write(&path, yaml).unwrap();

    match load_layer(&path) {
        Err(Error::ConfigParse { path: p, .. }) => assert_eq!(p, path),
        other => panic!("Expected ConfigParse, got: {:?}", other),
    }
}

#[rstest]
#[case(Some("invocation"), Some("local"), Some("global"), Some("invocation"))]
#[case(None, Some("local"), Some("global"), Some("local"))]
#[case(None, None, Some("global"), Some("global"))]
#[case(None, None, None, None)]
fn test_scalar_precedence(
    #[case] invocation: Option<&str>,
    #[case] local: Option<&str>,
    #[case] global: Option<&str>,
    #[case] expected: Option<&str>,
) {
    let layers = [
        ConfigLayer::defaults(),
        layer_with_target(global),
        layer_with_target(local),
        layer_with_target(invocation),
    ];
    let merged = merge_layers(&layers);
    assert_eq!(merged.target, expected.map(PathBuf::from));
}

#[rstest]
fn test_boolean_precedence_and_default() {
    let global = ConfigLayer {
        digest: Some(true),
        gzip: Some(true),
        ..Default::default()
    };
    let local = ConfigLayer {
        digest: Some(false),
        ..Default::default()
    };
    let merged = merge_layers(&[ConfigLayer::defaults(), global, local, ConfigLayer::default()]);

    assert_eq!(merged.digest, Some(false), "local beats global");
    assert_eq!(merged.gzip, Some(true), "global beats the default");
    assert_eq!(merged.manifest, Some(false), "default applies when unset");
}

#[rstest]
fn test_collections_are_unioned() {
    let global = ConfigLayer {
        paths: Some(BTreeSet::from([PathBuf::from("/global")])),
        assets: Some(BTreeSet::from(["a.js".to_string()])),
        ..Default::default()
    };
    let local = ConfigLayer {
        paths: Some(BTreeSet::from([PathBuf::from("local")])),
        ..Default::default()
    };
    let invocation = ConfigLayer {
        paths: Some(BTreeSet::from([PathBuf::from("/global")])),
        assets: Some(BTreeSet::from(["b.js".to_string()])),
        ..Default::default()
    };
    let merged = merge_layers(&[ConfigLayer::defaults(), global, local, invocation]);

    assert_eq!(
        merged.paths,
        Some(BTreeSet::from([
            PathBuf::from("/global"),
            PathBuf::from("local")
        ]))
    );
    assert_eq!(
        merged.assets,
        Some(BTreeSet::from(["a.js".to_string(), "b.js".to_string()]))
    );
}

#[rstest]
fn test_trailing_slashes_are_deduplicated_but_case_is_kept() {
    let first = ConfigLayer {
        paths: Some(BTreeSet::from([PathBuf::from("vendor/")])),
        assets: Some(BTreeSet::from(["app/".to_string(), "App".to_string()])),
        ..Default::default()
    };
    let second = ConfigLayer {
        paths: Some(BTreeSet::from([PathBuf::from("./vendor")])),
        assets: Some(BTreeSet::from(["app".to_string()])),
        ..Default::default()
    };
    let merged = merge_layers(&[first, second]);

    assert_eq!(merged.paths.map(|p| p.len()), Some(1));
    assert_eq!(
        merged.assets,
        Some(BTreeSet::from(["App".to_string(), "app".to_string()]))
    );
}

#[rstest]
fn test_validate_requires_target() {
    let layer = ConfigLayer {
        target: Some(PathBuf::new()),
        ..valid_layer()
    };
    match Config::try_from(layer) {
        Err(Error::Validation(msg)) => assert_eq!(msg, "no output directory provided"),
        other => panic!("Expected Validation, got: {:?}", other),
    }
}

#[rstest]
fn test_validate_requires_assets() {
    let layer = ConfigLayer {
        assets: Some(BTreeSet::new()),
        ..valid_layer()
    };
    match Config::try_from(layer) {
        Err(Error::Validation(msg)) => assert_eq!(msg, "no assets provided"),
        other => panic!("Expected Validation, got: {:?}", other),
    }
}

#[rstest]
#[case("closure", Some(JsCompressor::Closure))]
#[case("yui", Some(JsCompressor::Yui))]
#[case("uglifier", Some(JsCompressor::Uglifier))]
#[case("jsmin", None)]
fn test_validate_js_compressor(#[case] name: &str, #[case] expected: Option<JsCompressor>) {
    let layer = ConfigLayer {
        js_compressor: Some(name.to_string()),
        ..valid_layer()
    };
    match (Config::try_from(layer), expected) {
        (Ok(config), Some(compressor)) => assert_eq!(config.js_compressor(), Some(compressor)),
        (Err(err), None) => {
            assert!(err.is_usage_error());
            assert_eq!(err.to_string(), format!("unsupported javascript processor {name}"));
        }
        (other, _) => panic!("Unexpected result for {name}: {:?}", other),
    }
}

#[rstest]
fn test_persist_round_trip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(SPROCKETS_FILENAME);

    let invocation = ConfigLayer {
        target: Some(PathBuf::from("compiled")),
        paths: Some(BTreeSet::from([PathBuf::from("/include")])),
        assets: Some(BTreeSet::from(["cli1.js".to_string(), "cli2.js".to_string()])),
        digest: Some(true),
        js_compressor: Some("closure".to_string()),
        ..Default::default()
    };
    let config = Config::try_from(merge_layers(&[ConfigLayer::defaults(), invocation])).unwrap();

    persist(&config, &path).expect("Should persist");
    let reloaded = load_layer(&path).expect("Should reload");

    assert_eq!(reloaded.gzip, Some(false), "unset booleans are written as false");
    assert_eq!(reloaded.manifest_path, None);
    let reloaded = Config::try_from(merge_layers(&[ConfigLayer::defaults(), reloaded])).unwrap();
    assert_eq!(reloaded, config);
}

#[rstest]
fn test_persist_overwrites_existing_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(SPROCKETS_FILENAME);
    std::fs::write(&path, "assets: [stale.js]\nunknown_key: 1\n").unwrap();

    let config = Config::try_from(valid_layer()).unwrap();
    persist(&config, &path).unwrap();

    let reloaded = load_layer(&path).unwrap();
    assert_eq!(reloaded.assets, Some(BTreeSet::from(["app.js".to_string()])));
}

#[rstest]
fn test_resolver_reads_global_and_local_layers() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    std::fs::write(
        home.path().join(SPROCKETS_FILENAME),
        "paths: /global/path\ngzip: true\ndigest: true\n",
    )
    .unwrap();
    std::fs::write(
        project.path().join(SPROCKETS_FILENAME),
        "target: ../compiled\nassets:\n  - local.js\ndigest: false\n",
    )
    .unwrap();

    let resolver =
        ConfigResolver::new(project.path()).with_home(Some(home.path().to_path_buf()));
    let invocation = ConfigLayer {
        assets: Some(BTreeSet::from(["cli.js".to_string()])),
        ..Default::default()
    };
    let config = resolver.resolve(&invocation).expect("Should resolve");

    assert_eq!(config.target(), Path::new("../compiled"));
    assert!(config.include_paths().contains(Path::new("/global/path")));
    assert_eq!(config.asset_selectors().len(), 2);
    assert!(config.gzip());
    assert!(!config.digest());
}

#[rstest]
fn test_resolver_without_home_uses_local_only() {
    let project = TempDir::new().unwrap();
    let resolver = ConfigResolver::new(project.path()).with_home(None);

    assert!(resolver.global_path().is_none());
    assert_eq!(resolver.load_global().unwrap(), ConfigLayer::default());
    assert!(matches!(
        resolver.resolve(&ConfigLayer::default()),
        Err(Error::Validation(_))
    ));
}

#[rstest]
fn test_resolver_save_writes_local_layer() {
    let project = TempDir::new().unwrap();
    let resolver = ConfigResolver::new(project.path()).with_home(None);
    let config = resolver.resolve(&valid_layer()).unwrap();

    let path = resolver.save(&config).expect("Should save");
    assert_eq!(path, project.path().join(SPROCKETS_FILENAME));
    assert_eq!(resolver.resolve(&ConfigLayer::default()).unwrap(), config);
}

#[rstest]
fn test_compile_options_resolve_manifest_path() {
    let layer = ConfigLayer {
        manifest: Some(true),
        manifest_path: Some(PathBuf::from("public")),
        ..valid_layer()
    };
    let config = Config::try_from(layer).unwrap();
    let options = config.compile_options(Path::new("/project"));

    assert!(options.manifest);
    assert_eq!(options.manifest_path, Some(PathBuf::from("/project/public")));
}
