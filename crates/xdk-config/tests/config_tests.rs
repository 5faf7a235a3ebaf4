//! Configuration loading and precedence tests

use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use xdk_config::{ConfigError, ConfigLoader};

const MANIFEST: &str = r#"
[output]
root = "out/xdk"
resources = "src/main/resources/xdk"

[compiler]
command = "java"
args = ["-Xms1024m", "-Xmx1024m", "-ea", "-cp", "javatools.jar", "org.xvm.tool.Compiler"]
artifact = "javatools/build/libs/javatools.jar"

[core]
name = "Ecstasy"
source = "ecstasy/src/main"

[bridge]
name = "Bridge"
source = "javatools_bridge/src/main"
produces = "_native.xtc"
artifact = "javatools_bridge.xtc"

[[module]]
name = "Json"
source = "lib_json/src/main"

[[module]]
name = "Web"
source = "lib_web/src/main"
depends = ["Json"]

[[launcher]]
platform = "macos"
path = "javatools_launcher/build/exe/macos_launcher"

[[launcher]]
platform = "windows"
path = "javatools_launcher/build/exe/windows_launcher.exe"
"#;

fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_path = dir.join("xdk.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

/// Loader that never reads the real ~/.xdk/config.toml
fn isolated_loader(dir: &Path) -> ConfigLoader {
    ConfigLoader::new().with_global_config_path(dir.join("no-such-global.toml"))
}

fn clear_env() {
    env::remove_var("XDK_OUTPUT_DIR");
    env::remove_var("XDK_COMPILER");
    env::remove_var("XDK_VERBOSE");
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
#[serial]
fn test_load_full_manifest() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), MANIFEST);

    let config = isolated_loader(temp_dir.path())
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert_eq!(config.project_root(), temp_dir.path());
    assert_eq!(config.output_root(), temp_dir.path().join("out/xdk"));
    assert_eq!(config.compiler_command(), "java");
    assert_eq!(config.compiler_args().len(), 6);
    assert!(config.compiler_verbose());
    assert_eq!(
        config.compiler_artifact(),
        Some(temp_dir.path().join("javatools/build/libs/javatools.jar"))
    );
    assert_eq!(
        config.resources(),
        Some(temp_dir.path().join("src/main/resources/xdk"))
    );
    assert_eq!(config.project.core.name, "Ecstasy");
    assert_eq!(config.project.bridge.name, "Bridge");
    let names: Vec<_> = config.project.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Json", "Web"]);
    assert_eq!(config.project.modules[1].depends, vec!["Json"]);
    assert_eq!(config.project.launchers.len(), 2);
}

#[test]
#[serial]
fn test_load_from_subdirectory_finds_parent() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), MANIFEST);

    let sub = temp_dir.path().join("lib_json").join("src");
    fs::create_dir_all(&sub).unwrap();

    let config = isolated_loader(temp_dir.path())
        .load_from_directory(&sub)
        .unwrap();

    assert_eq!(config.project_root(), temp_dir.path());
}

#[test]
#[serial]
fn test_load_when_no_manifest_exists() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    let result = isolated_loader(temp_dir.path()).load_from_directory(temp_dir.path());

    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
#[serial]
fn test_load_from_file() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), MANIFEST);

    let config = isolated_loader(temp_dir.path()).load_from_file(&path).unwrap();
    assert_eq!(config.project_root(), temp_dir.path());
}

#[rstest]
#[case::unknown_section("[formatting]\nindent = 2\n")]
#[case::missing_core("[bridge]\nname = \"B\"\nsource = \"b\"\n")]
#[case::bad_toml("[core\nname = ")]
#[serial]
fn test_invalid_manifest_rejected(#[case] content: &str) {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), content);

    let result = isolated_loader(temp_dir.path()).load_from_directory(temp_dir.path());
    assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
}

// ============================================================================
// Precedence Tests
// ============================================================================

#[test]
#[serial]
fn test_global_config_supplies_compiler_defaults() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let manifest = MANIFEST.replace(
        "command = \"java\"\nargs = [\"-Xms1024m\", \"-Xmx1024m\", \"-ea\", \"-cp\", \"javatools.jar\", \"org.xvm.tool.Compiler\"]\n",
        "",
    );
    create_config_file(temp_dir.path(), &manifest);

    let global_path = temp_dir.path().join("global.toml");
    fs::write(
        &global_path,
        "[compiler]\ncommand = \"/opt/xvm/bin/xcc\"\nargs = [\"--fast\"]\nverbose = false\n",
    )
    .unwrap();

    let config = ConfigLoader::new()
        .with_global_config_path(&global_path)
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert_eq!(config.compiler_command(), "/opt/xvm/bin/xcc");
    assert_eq!(config.compiler_args(), ["--fast".to_string()]);
    assert!(!config.compiler_verbose());
}

#[test]
#[serial]
fn test_env_overrides_project() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), MANIFEST);

    env::set_var("XDK_OUTPUT_DIR", "/tmp/xdk-out");
    env::set_var("XDK_COMPILER", "xcc");
    env::set_var("XDK_VERBOSE", "0");

    let config = isolated_loader(temp_dir.path())
        .load_from_directory(temp_dir.path())
        .unwrap();
    clear_env();

    assert_eq!(config.output_root(), PathBuf::from("/tmp/xdk-out"));
    assert_eq!(config.compiler_command(), "xcc");
    assert!(!config.compiler_verbose());
}

#[test]
#[serial]
fn test_empty_env_output_dir_rejected() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), MANIFEST);

    env::set_var("XDK_OUTPUT_DIR", "");
    let result = isolated_loader(temp_dir.path()).load_from_directory(temp_dir.path());
    clear_env();

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}
