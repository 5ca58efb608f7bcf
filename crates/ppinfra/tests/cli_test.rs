#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// 設定ファイル付きの一時プロジェクト
fn project_with(config: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("site.kdl"), config).unwrap();
    dir
}

/// プロジェクトディレクトリで ppinfra を実行するコマンド
fn ppinfra_in(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ppinfra").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("PPINFRA_CONFIG_PATH")
        .env_remove("PPINFRA_STACK");
    cmd
}

fn render_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

fn resource<'a>(graph: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    graph["resources"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == name)
        .unwrap()
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("ppinfra").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pulumi"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("outputs"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("ppinfra").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ppinfra"));
}

/// upコマンドのヘルプに位置引数と --yes が出ることを確認
#[test]
fn test_up_help() {
    let mut cmd = Command::cargo_bin("ppinfra").unwrap();
    cmd.arg("up")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[STACK]"))
        .stdout(predicate::str::contains("--yes"))
        .stdout(predicate::str::contains("--config"));
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("ppinfra").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

/// 位置引数と-sフラグの同時指定はエラーになることを確認
#[test]
fn test_stack_conflict_positional_and_flag() {
    let mut cmd = Command::cargo_bin("ppinfra").unwrap();
    cmd.arg("render")
        .arg("prod")
        .arg("-s")
        .arg("dev")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

/// 設定ファイルなしでもデフォルト値で描画できることを確認
#[test]
fn test_render_defaults_without_config() {
    let dir = tempfile::tempdir().unwrap();
    let graph = render_json(ppinfra_in(&dir).arg("render"));

    assert_eq!(graph["project"], "ppinfra");
    assert_eq!(graph["provider"]["region"], "us-east-1");
    assert_eq!(
        resource(&graph, "bucketFolder")["properties"]["path"]["value"],
        "./www"
    );
    assert_eq!(
        resource(&graph, "bucketWebsite")["properties"]["indexDocument"]["value"]["suffix"]["value"],
        "index.html"
    );
}

/// site.kdl のスタック設定が反映されることを確認
#[test]
fn test_render_uses_stack_file() {
    let dir = project_with(
        r#"
project "docs-site"
stack "prod" {
    path "./dist"
    index-document "home.html"
    error-document "404.html"
}
"#,
    );
    let graph = render_json(ppinfra_in(&dir).arg("render").arg("prod"));

    assert_eq!(graph["project"], "docs-site");
    assert_eq!(
        resource(&graph, "bucketFolder")["properties"]["path"]["value"],
        "./dist"
    );
    assert_eq!(
        resource(&graph, "bucketWebsite")["properties"]["errorDocument"]["value"]["key"]["value"],
        "404.html"
    );
    let error_response = &resource(&graph, "cdn")["properties"]["customErrorResponses"]["value"][0]["value"];
    assert_eq!(error_response["responsePagePath"]["value"], "/404.html");

    let deps = resource(&graph, "bucketFolder")["depends_on"].as_array().unwrap();
    assert_eq!(deps.len(), 2);
}

/// -c による上書きがファイルの値より優先されることを確認
#[test]
fn test_render_config_override() {
    let dir = project_with(
        r#"
stack "dev" {
    error-document "oops.html"
}
"#,
    );
    let graph = render_json(
        ppinfra_in(&dir)
            .arg("render")
            .arg("-c")
            .arg("errorDocument=custom404.html"),
    );

    let error_response = &resource(&graph, "cdn")["properties"]["customErrorResponses"]["value"][0]["value"];
    assert_eq!(error_response["responsePagePath"]["value"], "/custom404.html");
}

/// 同じ入力から同じバイト列が得られることを確認
#[test]
fn test_render_is_deterministic() {
    let dir = project_with("stack \"dev\" {\n    path \"./public\"\n}\n");

    let first = ppinfra_in(&dir).arg("render").output().unwrap();
    let second = ppinfra_in(&dir).arg("render").output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

/// Pulumi YAML として描画できることを確認
#[test]
fn test_render_yaml() {
    let dir = tempfile::tempdir().unwrap();
    ppinfra_in(&dir)
        .arg("render")
        .arg("--format")
        .arg("yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains("runtime: yaml"))
        .stdout(predicate::str::contains("pulumi:providers:aws"))
        .stdout(predicate::str::contains("${bucketWebsite.websiteEndpoint}"))
        .stdout(predicate::str::contains("${ownershipControls}"));
}

/// -o でファイルに書き出せることを確認
#[test]
fn test_render_to_file() {
    let dir = tempfile::tempdir().unwrap();
    ppinfra_in(&dir)
        .arg("render")
        .arg("-o")
        .arg("graph.json")
        .assert()
        .success();

    let content = fs::read_to_string(dir.path().join("graph.json")).unwrap();
    let graph: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(graph["resources"].as_array().unwrap().len(), 6);
}

/// KEY=VALUE 形式でない上書きはエラー
#[test]
fn test_malformed_override() {
    let dir = tempfile::tempdir().unwrap();
    ppinfra_in(&dir)
        .arg("render")
        .arg("-c")
        .arg("errorDocument")
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

/// 不正なKDLはエラーになることを確認
#[test]
fn test_invalid_stack_file() {
    let dir = project_with("stack \"dev\" {");
    ppinfra_in(&dir).arg("validate").assert().failure();
}

/// validate がリソース一覧を表示することを確認
#[test]
fn test_validate_summary() {
    let dir = project_with("stack \"dev\" {\n    path \"./site\"\n}\n");
    ppinfra_in(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("./site"))
        .stdout(predicate::str::contains("bucketFolder"))
        .stdout(predicate::str::contains("ownershipControls, publicAccessBlock"))
        .stdout(predicate::str::contains("cdnURL"));
}

/// --yes なしの up は何も適用せずに終了することを確認（pulumi不要）
#[test]
fn test_up_without_yes_is_dry() {
    let dir = tempfile::tempdir().unwrap();
    ppinfra_in(&dir)
        .arg("up")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));

    assert!(!dir.path().join(".ppinfra").exists());
}

/// ディレクトリを抜けるスタック名は拒否される
#[test]
fn test_traversing_stack_name_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    fs::create_dir(&project).unwrap();

    let mut cmd = Command::cargo_bin("ppinfra").unwrap();
    cmd.current_dir(&project)
        .env_remove("PPINFRA_CONFIG_PATH")
        .env_remove("PPINFRA_STACK")
        .arg("up")
        .arg("../../x")
        .arg("--yes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("無効なスタック名"));

    assert!(!dir.path().join("x").exists());
    assert!(!project.join(".ppinfra").exists());
}

/// 未適用のスタックの outputs はエラーになることを確認
#[test]
fn test_outputs_before_up() {
    let dir = tempfile::tempdir().unwrap();
    ppinfra_in(&dir)
        .arg("outputs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ppinfra up"));
}
