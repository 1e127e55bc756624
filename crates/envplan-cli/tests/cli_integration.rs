//! CLI subprocess integration tests.
//!
//! These tests invoke the `envplan` binary as a subprocess and verify
//! exit codes, stdout content, and JSON output stability.

use std::path::{Path, PathBuf};
use std::process::Command;

fn envplan_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_envplan"));
    // Keep the per-user config out of the picture.
    cmd.env("HOME", home);
    cmd.env_remove("ENVPLAN_LOG");
    cmd
}

fn write_manifest(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("envplan.toml");
    std::fs::write(&path, body).unwrap();
    path
}

fn write_curl_numpy_manifest(dir: &Path) -> PathBuf {
    write_manifest(
        dir,
        r#"manifest_version = 1

[system]
packages = ["curl"]

[python]
packages = ["numpy"]
"#,
    )
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn cli_version_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = envplan_bin(home.path()).arg("--version").output().unwrap();
    assert!(output.status.success(), "envplan --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("envplan"), "version output: {stdout}");
}

#[test]
fn cli_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    let output = envplan_bin(home.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["compile", "new", "presets", "show", "completions"] {
        assert!(stdout.contains(cmd), "help must list '{cmd}'");
    }
}

#[test]
fn cli_compile_prints_definition_json() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let manifest = write_curl_numpy_manifest(project.path());

    let output = envplan_bin(home.path())
        .args(["--json", "compile", &manifest.to_string_lossy()])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "compile must exit 0. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let def = stdout_json(&output);
    assert_eq!(def["version"], 1);
    assert_eq!(def["platform"]["os"], "linux");
    assert_eq!(def["platform"]["architecture"], "amd64");
    let ops = def["ops"].as_array().unwrap();
    let terminal = def["terminal"].as_str().unwrap();
    assert_eq!(ops.last().unwrap()["digest"], terminal);
    let execs = ops.iter().filter(|o| o["op"]["kind"] == "exec").count();
    assert_eq!(execs, 2);
}

#[test]
fn cli_compile_is_deterministic() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let manifest = write_curl_numpy_manifest(project.path());

    let run = |parallel: bool| {
        let mut cmd = envplan_bin(home.path());
        cmd.args(["compile", &manifest.to_string_lossy()]);
        if parallel {
            cmd.arg("--parallel");
        }
        let output = cmd.output().unwrap();
        assert!(output.status.success());
        output.stdout
    };
    assert_eq!(run(false), run(false));
    assert_eq!(run(false), run(true));
}

#[test]
fn cli_compile_text_format() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let manifest = write_curl_numpy_manifest(project.path());

    let output = envplan_bin(home.path())
        .args(["compile", &manifest.to_string_lossy(), "--format", "text"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("platform linux/amd64"));
    assert!(stdout.contains("docker-image://docker.io/library/python:3.8"));
    assert!(stdout.contains("apt-get install -y --no-install-recommends curl"));
    assert!(stdout.contains("https://mirror.sjtu.edu.cn/pypi/web/simple"));
    assert!(stdout.contains("type=cache,target=/root/.cache/pip"));
}

#[test]
fn cli_compile_writes_output_file_and_summary() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let manifest = write_curl_numpy_manifest(project.path());
    let out = project.path().join("plan.json");

    let output = envplan_bin(home.path())
        .args([
            "--json",
            "compile",
            &manifest.to_string_lossy(),
            "--output",
            &out.to_string_lossy(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let payload = stdout_json(&output);
    assert_eq!(payload["status"], "compiled");
    assert_eq!(payload["summary"]["exec_steps"].as_array().unwrap().len(), 2);
    assert_eq!(payload["summary"]["cache_mounts"].as_array().unwrap().len(), 3);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["terminal"], payload["summary"]["digest"]);
}

#[test]
fn cli_compile_unsupported_platform_fails() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let manifest = write_curl_numpy_manifest(project.path());

    let output = envplan_bin(home.path())
        .args([
            "compile",
            &manifest.to_string_lossy(),
            "--platform",
            "linux/arm64",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty(), "no definition on failure");
}

#[test]
fn cli_compile_bad_manifest_exits_2() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let manifest = write_manifest(project.path(), "manifest_version = 1\n[runtime]\nx = 1\n");

    let output = envplan_bin(home.path())
        .args(["compile", &manifest.to_string_lossy()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("manifest error"), "stderr: {stderr}");
}

#[test]
fn cli_compile_missing_manifest_exits_2() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let output = envplan_bin(home.path())
        .args([
            "compile",
            &project.path().join("nope.toml").to_string_lossy(),
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_compile_zero_timeout_is_cancelled() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let manifest = write_curl_numpy_manifest(project.path());

    let output = envplan_bin(home.path())
        .args([
            "compile",
            &manifest.to_string_lossy(),
            "--timeout-secs",
            "0",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(output.stdout.is_empty());
}

#[test]
fn cli_compile_huge_timeout_runs_unbounded() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let manifest = write_curl_numpy_manifest(project.path());

    let output = envplan_bin(home.path())
        .args([
            "compile",
            &manifest.to_string_lossy(),
            "--timeout-secs",
            &u64::MAX.to_string(),
        ])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "status={:?} stderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    let def = stdout_json(&output);
    assert_eq!(def["version"], 1);
}

#[test]
fn cli_config_file_changes_mirror() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let manifest = write_curl_numpy_manifest(project.path());
    let config = project.path().join("config.json");
    std::fs::write(&config, r#"{"python_index_url": "https://pypi.org/simple"}"#).unwrap();

    let output = envplan_bin(home.path())
        .args([
            "--config",
            &config.to_string_lossy(),
            "compile",
            &manifest.to_string_lossy(),
            "--format",
            "text",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pip install -i https://pypi.org/simple numpy"));
}

#[test]
fn cli_new_then_compile() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    let output = envplan_bin(home.path())
        .current_dir(project.path())
        .args(["new", "demo", "--template", "python-data"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let manifest = project.path().join("demo").join("envplan.toml");
    assert!(manifest.exists());

    let again = envplan_bin(home.path())
        .current_dir(project.path())
        .args(["new", "demo", "--template", "python-data"])
        .output()
        .unwrap();
    assert!(!again.status.success(), "overwrite requires --force");

    let compiled = envplan_bin(home.path())
        .args(["compile", &manifest.to_string_lossy()])
        .output()
        .unwrap();
    assert!(compiled.status.success());
}

#[test]
fn cli_new_unknown_template_fails() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let output = envplan_bin(home.path())
        .current_dir(project.path())
        .args(["new", "demo", "--template", "does-not-exist"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!project.path().join("demo").exists());
}

#[test]
fn cli_presets_json() {
    let home = tempfile::tempdir().unwrap();
    let output = envplan_bin(home.path())
        .args(["--json", "presets"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let presets = stdout_json(&output);
    let names: Vec<&str> = presets
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"minimal"));
    assert!(names.contains(&"python-data"));
}

#[test]
fn cli_show_json_keeps_package_order() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let manifest = write_manifest(
        project.path(),
        r#"manifest_version = 1

[system]
packages = ["zlib1g-dev", " curl ", "", "curl"]
"#,
    );

    let output = envplan_bin(home.path())
        .args(["--json", "show", &manifest.to_string_lossy()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let payload = stdout_json(&output);
    assert_eq!(
        payload["manifest"]["environment"]["system_packages"],
        serde_json::json!(["zlib1g-dev", "curl", "curl"])
    );
    assert_eq!(payload["config"]["base_image"], "docker.io/library/python:3.8");
}

#[test]
fn cli_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    let output = envplan_bin(home.path())
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("envplan"));
}
