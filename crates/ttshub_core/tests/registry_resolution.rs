use std::path::Path;
use ttshub_core::{ExtensionKind, ExtensionResolver, RegistryPaths, SourceName};

fn write_source(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("source parent dir");
    }
    std::fs::write(path, contents).expect("write source fixture");
}

fn resolver_in(dir: &Path) -> ExtensionResolver {
    ExtensionResolver::new(RegistryPaths::with_root(dir))
}

const BASE_JSON: &str = r#"{
    "tabs": [
        {
            "package_name": "extension_base1",
            "name": "Base Extension 1",
            "extension_type": "interface",
            "extension_class": "text-to-speech"
        },
        {
            "package_name": "extension_base2",
            "name": "Base Extension 2",
            "extension_type": "interface",
            "extension_class": "audio-music-generation"
        }
    ],
    "decorators": [
        {
            "package_name": "decorator_base1",
            "name": "Decorator Base 1",
            "extension_type": "decorator",
            "extension_class": "outer"
        }
    ],
    "example_extension": {
        "package_name": "example_extension",
        "name": "Example Extension"
    }
}"#;

const EXTERNAL_JSON: &str = r#"{
    "tabs": [
        {
            "package_name": "extension_external1",
            "name": "External Extension 1",
            "extension_type": "interface",
            "extension_class": "text-to-speech"
        },
        {
            "package_name": "extension_base1",
            "name": "Base Extension 1 (External)",
            "extension_type": "interface",
            "extension_class": "text-to-speech"
        }
    ],
    "tabsInGroups": {
        "groupA": [
            {
                "package_name": "extension_group_a1",
                "name": "Group A 1",
                "extension_type": "interface",
                "extension_class": "audio-music-generation"
            }
        ],
        "groupB": [
            {
                "package_name": "extension_group_b1",
                "name": "Group B 1",
                "extension_type": "interface",
                "extension_class": "text-to-speech"
            }
        ]
    },
    "decorators": [
        {
            "package_name": "decorator_external1",
            "name": "Decorator External 1",
            "extension_type": "decorator",
            "extension_class": "inner"
        }
    ]
}"#;

#[test]
fn base_only_resolution_returns_flattened_base() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_source(dir.path(), "extensions.json", BASE_JSON);

    let interfaces = resolver_in(dir.path()).interface_extensions();
    let names: Vec<&str> = interfaces.iter().map(|m| m.package_name.as_str()).collect();
    assert_eq!(names, vec!["extension_base1", "extension_base2"]);
}

#[test]
fn external_entries_mask_same_named_base_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_source(dir.path(), "extensions.json", BASE_JSON);
    write_source(dir.path(), "extensions.external.json", EXTERNAL_JSON);

    let resolver = resolver_in(dir.path());
    let interfaces = resolver.interface_extensions();
    let names: Vec<&str> = interfaces.iter().map(|m| m.package_name.as_str()).collect();

    // External first (its tabs then its groups), then novel base entries.
    assert_eq!(
        names,
        vec![
            "extension_external1",
            "extension_base1",
            "extension_group_a1",
            "extension_group_b1",
            "extension_base2",
        ]
    );
    let masked = interfaces
        .iter()
        .find(|m| m.package_name == "extension_base1")
        .expect("base1 present once");
    assert_eq!(masked.name, "Base Extension 1 (External)");

    // Decorators from both sources survive: distinct package names.
    let decorators = resolver.decorator_extensions();
    let decorator_names: Vec<&str> =
        decorators.iter().map(|m| m.package_name.as_str()).collect();
    assert_eq!(decorator_names, vec!["decorator_external1", "decorator_base1"]);
}

#[test]
fn catalog_sits_between_external_and_base() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_source(dir.path(), "extensions.json", BASE_JSON);
    write_source(
        dir.path(),
        "data/extensions-catalog/lib/extensions.json",
        r#"{
            "tabs": [
                {"package_name": "extension_base1", "name": "Base 1 (Catalog)"},
                {"package_name": "extension_catalog1", "name": "Catalog 1"}
            ]
        }"#,
    );
    write_source(
        dir.path(),
        "extensions.external.json",
        r#"{"tabs": [{"package_name": "extension_base1", "name": "Base 1 (External)"}]}"#,
    );

    let interfaces = resolver_in(dir.path()).interface_extensions();
    let winner = interfaces
        .iter()
        .find(|m| m.package_name == "extension_base1")
        .expect("base1 resolved");
    assert_eq!(winner.name, "Base 1 (External)");
    assert!(interfaces
        .iter()
        .any(|m| m.package_name == "extension_catalog1"));
}

#[test]
fn resolution_is_idempotent_for_unchanged_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_source(dir.path(), "extensions.json", BASE_JSON);
    write_source(dir.path(), "extensions.external.json", EXTERNAL_JSON);

    let resolver = resolver_in(dir.path());
    assert_eq!(resolver.interface_extensions(), resolver.interface_extensions());
    assert_eq!(resolver.decorator_extensions(), resolver.decorator_extensions());
}

#[test]
fn broken_optional_source_degrades_to_base_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_source(dir.path(), "extensions.json", BASE_JSON);
    write_source(dir.path(), "extensions.external.json", "{this is not json");

    let interfaces = resolver_in(dir.path()).interface_extensions();
    let names: Vec<&str> = interfaces.iter().map(|m| m.package_name.as_str()).collect();
    assert_eq!(names, vec!["extension_base1", "extension_base2"]);
}

#[test]
fn all_sources_absent_resolves_to_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = resolver_in(dir.path());
    assert!(resolver.interface_extensions().is_empty());
    assert!(resolver.decorator_extensions().is_empty());
    assert!(resolver.extension_example().is_none());
    assert!(resolver
        .load_collection(SourceName::Base)
        .is_empty());
}

#[test]
fn by_class_views_filter_kind_and_class() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_source(dir.path(), "extensions.json", BASE_JSON);
    write_source(dir.path(), "extensions.external.json", EXTERNAL_JSON);

    let resolver = resolver_in(dir.path());
    let tts = resolver.interface_extensions_by_class("text-to-speech");
    assert!(tts
        .iter()
        .all(|m| m.extension_type == ExtensionKind::Interface.as_str()
            && m.extension_class == "text-to-speech"));
    let names: Vec<&str> = tts.iter().map(|m| m.package_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["extension_external1", "extension_base1", "extension_group_b1"]
    );

    let inner = resolver.decorator_extensions_by_class("inner");
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].package_name, "decorator_external1");
}

#[test]
fn example_entry_comes_from_base_precedence_view() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_source(dir.path(), "extensions.json", BASE_JSON);
    write_source(
        dir.path(),
        "extensions.external.json",
        r#"{"example_extension": {"package_name": "external_example"}}"#,
    );

    let example = resolver_in(dir.path())
        .extension_example()
        .expect("example resolved");
    // Base holds the key, so base wins the gap-fill.
    assert_eq!(example.package_name, "example_extension");
}

#[test]
fn entries_without_package_name_are_never_deduplicated() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_source(
        dir.path(),
        "extensions.json",
        r#"{"tabs": [{"name": "anon"}, {"name": "anon"}, {"package_name": "a"}]}"#,
    );
    write_source(
        dir.path(),
        "extensions.external.json",
        r#"{"tabs": [{"name": "anon"}]}"#,
    );

    let interfaces = resolver_in(dir.path()).interface_extensions();
    assert_eq!(interfaces.len(), 4);
}
