//! Common test utilities

#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Stands in for the platform CLI. Composing concatenates source and stub, a stub whose
/// contents say `unused` answers with the "no dependencies" error.
pub const FAKE_CLI: &str = r#"
case "$1 $2" in
  "stubgen compose")
    if grep -q unused "$6"; then
      echo "Error: no dependencies of component \`$4\` were found" >&2
      exit 1
    fi
    cat "$4" "$6" > "$8"
    ;;
  "stubgen build")
    mkdir -p "$8"
    cp -R "$4"/. "$8"/
    cat "$4"/*.wit > "$6"
    ;;
  "stubgen add-stub-dependency")
    dep=$(basename "$(dirname "$5")")
    mkdir -p "$7/deps/pack-ns_$dep" "$7/deps/pack-ns_$dep-stub"
    cp -R "$5"/. "$7/deps/pack-ns_$dep-stub"/
    cp -R "$5"/. "$7/deps/pack-ns_$dep"/
    ;;
  "component add")
    echo "$5" >> "$(dirname "$0")/deployed.log"
    ;;
  *)
    echo "unexpected: $*" >&2
    exit 9
    ;;
esac
"#;

/// Creates a project directory with a `stubsmith.toml`, the fake CLI script and one
/// directory per component holding `main.src` and `wit/<name>.wit`.
pub fn create_project(config: &str, components: &[&str]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("fake-cli.sh");
    fs::write(&script, FAKE_CLI).unwrap();

    let config = config.replace("@FAKE_CLI@", &script.to_string_lossy());
    let config_path = dir.path().join("stubsmith.toml");
    fs::write(&config_path, config).unwrap();

    for name in components {
        let component_dir = dir.path().join("components").join(name);
        fs::create_dir_all(component_dir.join("wit")).unwrap();
        fs::write(component_dir.join("main.src"), format!("[{}]", name)).unwrap();
        fs::write(
            component_dir.join("wit").join(format!("{}.wit", name)),
            format!("package pack-ns:{};", name),
        )
        .unwrap();
    }

    (dir, config_path)
}

pub fn write_with_mtime(path: &Path, contents: &str, mtime: SystemTime) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

pub fn in_the_future() -> SystemTime {
    SystemTime::now() + Duration::from_secs(3600)
}
