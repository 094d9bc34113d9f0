//! End-to-end tests for the build pipeline, driving shell steps and a fake platform CLI

#![cfg(unix)]

mod common;

use common::{create_project, in_the_future, write_with_mtime};
use std::fs;
use stubsmith::{BuildError, Pipeline, TaskOutcome, load_project};

const PROJECT: &str = r#"
[project]
cli = "sh"
cli_args = ["@FAKE_CLI@"]
output = "group"

[dependencies]
alpha = ["beta", "gamma"]
beta = ["gamma"]

[[step]]
name = "compile"
skip_message = "compile"
targets = ["${component_wasm}"]
sources = ["${component_dir}"]
command = ["sh", "-c", "cat ${component_dir}/main.src > ${component_wasm}"]
"#;

#[tokio::test]
async fn build_compiles_composes_and_skips_when_up_to_date() {
    let (dir, config_path) = create_project(PROJECT, &["alpha", "beta", "gamma"]);
    let project = load_project(&config_path.to_string_lossy()).unwrap();
    let stub_dir = dir.path().join("out/stub");
    fs::create_dir_all(stub_dir.join("beta")).unwrap();
    fs::create_dir_all(stub_dir.join("gamma")).unwrap();
    fs::write(stub_dir.join("beta/stub.wasm"), "<beta-stub>").unwrap();
    fs::write(stub_dir.join("gamma/stub.wasm"), "unused").unwrap();

    let pipeline = Pipeline::new(&project);
    pipeline.build_all().await.unwrap();

    let components = dir.path().join("out/components");
    assert_eq!(
        fs::read_to_string(components.join("alpha.wasm")).unwrap(),
        "[alpha]<beta-stub>"
    );
    assert_eq!(
        fs::read_to_string(components.join("beta.wasm")).unwrap(),
        "[beta]"
    );
    assert_eq!(
        fs::read_to_string(components.join("gamma.wasm")).unwrap(),
        "[gamma]"
    );

    fs::write(components.join("alpha.wasm"), "sentinel").unwrap();
    let alpha = project.component("alpha");
    assert_eq!(
        pipeline.compose_component(&alpha).await.unwrap(),
        TaskOutcome::Skipped
    );
    pipeline.build_component("alpha").await.unwrap();
    assert_eq!(
        fs::read_to_string(components.join("alpha.wasm")).unwrap(),
        "sentinel"
    );
}

#[tokio::test]
async fn touching_a_source_rebuilds_the_component() {
    let (dir, config_path) = create_project(PROJECT, &["gamma"]);
    let project = load_project(&config_path.to_string_lossy()).unwrap();
    let pipeline = Pipeline::new(&project);

    pipeline.build_component("gamma").await.unwrap();

    write_with_mtime(
        &dir.path().join("components/gamma/main.src"),
        "[gamma v2]",
        in_the_future(),
    );
    pipeline.build_component("gamma").await.unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("out/components/gamma.wasm")).unwrap(),
        "[gamma v2]"
    );
}

#[tokio::test]
async fn missing_stub_is_reported_as_missing_source() {
    let (dir, config_path) = create_project(PROJECT, &["alpha", "beta", "gamma"]);
    let project = load_project(&config_path.to_string_lossy()).unwrap();
    write_with_mtime(
        &dir.path().join("out/components/alpha.wasm"),
        "old",
        in_the_future(),
    );

    let err = Pipeline::new(&project)
        .build_component("alpha")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::MissingSource(path) if path.ends_with("stub/beta/stub.wasm")
    ));
}

#[tokio::test]
async fn failing_step_aborts_with_command_line() {
    let config = r#"
[[step]]
name = "explode"
targets = ["${component_wasm}"]
command = ["sh", "-c", "exit 4"]
"#;
    let (_dir, config_path) = create_project(config, &["alpha"]);
    let project = load_project(&config_path.to_string_lossy()).unwrap();

    let err = Pipeline::new(&project)
        .build_component("alpha")
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Command error: Command [sh -c exit 4] failed with exit code 4"
    );
}

#[tokio::test]
async fn step_timeout_kills_the_tool() {
    let config = r#"
[[step]]
name = "hang"
targets = ["${component_wasm}"]
command = ["sh", "-c", "exec sleep 5"]
timeout = "200ms"
"#;
    let (dir, config_path) = create_project(config, &["alpha"]);
    let project = load_project(&config_path.to_string_lossy()).unwrap();

    let err = Pipeline::new(&project)
        .build_component("alpha")
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Command error: Command [sh -c exec sleep 5] timed out"
    );
    assert!(!dir.path().join("out/components/alpha.wasm").exists());
}

#[tokio::test]
async fn update_rpc_stubs_builds_each_stub_once_and_wires_dependents() {
    let (dir, config_path) = create_project(PROJECT, &["alpha", "beta", "gamma"]);
    let project = load_project(&config_path.to_string_lossy()).unwrap();
    let pipeline = Pipeline::new(&project);

    pipeline.update_rpc_stubs().await.unwrap();

    let out = dir.path().join("out/stub");
    assert_eq!(
        fs::read_to_string(out.join("beta/stub.wasm")).unwrap(),
        "package pack-ns:beta;"
    );
    assert!(out.join("gamma/wit/gamma.wit").is_file());
    assert!(!out.join("alpha").exists());

    let alpha_deps = dir.path().join("components/alpha/wit/deps");
    assert!(alpha_deps.join("pack-ns_beta-stub/beta.wit").is_file());
    assert!(alpha_deps.join("pack-ns_gamma-stub/gamma.wit").is_file());
    assert!(
        dir.path()
            .join("components/beta/wit/deps/pack-ns_gamma/gamma.wit")
            .is_file()
    );

    assert_eq!(
        pipeline.build_stub_component("gamma").await.unwrap(),
        TaskOutcome::Skipped
    );
    assert_eq!(
        pipeline.add_stub_dependency("alpha", "gamma").await.unwrap(),
        TaskOutcome::Skipped
    );
}

#[tokio::test]
async fn deploy_invokes_the_cli_per_component() {
    let (dir, config_path) = create_project(PROJECT, &["alpha", "beta"]);
    let project = load_project(&config_path.to_string_lossy()).unwrap();

    Pipeline::new(&project).deploy_all().await.unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("deployed.log")).unwrap(),
        "alpha\nbeta\n"
    );
}

#[tokio::test]
async fn clean_removes_outputs_and_bindings() {
    let (dir, config_path) = create_project(PROJECT, &["alpha"]);
    let project = load_project(&config_path.to_string_lossy()).unwrap();
    fs::create_dir_all(dir.path().join("out/build/alpha")).unwrap();
    fs::create_dir_all(dir.path().join("components/alpha/binding")).unwrap();
    fs::write(dir.path().join("components/alpha/binding/alpha.go"), "x").unwrap();

    Pipeline::new(&project).clean().unwrap();

    assert!(!dir.path().join("out").exists());
    assert!(!dir.path().join("components/alpha/binding").exists());
    assert!(dir.path().join("components/alpha/main.src").exists());
}

#[tokio::test]
async fn dry_run_leaves_the_filesystem_alone() {
    let (dir, config_path) = create_project(PROJECT, &["gamma"]);
    let mut project = load_project(&config_path.to_string_lossy()).unwrap();
    project.dry_run = true;

    Pipeline::new(&project).build_all().await.unwrap();

    assert!(!dir.path().join("out").exists());
}

#[tokio::test]
async fn test_command_must_be_configured() {
    let (_dir, config_path) = create_project(PROJECT, &[]);
    let project = load_project(&config_path.to_string_lossy()).unwrap();

    let err = Pipeline::new(&project).test().await.unwrap_err();

    assert_eq!(err.to_string(), "Config error: no [test] command configured");
}
