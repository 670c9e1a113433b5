use assert_cmd::Command;
use assert_cmd::cargo;
use flate2::Compression;
use flate2::write::GzEncoder;
use predicates::prelude::*;
use std::fs;
use std::io::prelude::*;
use std::path::Path;
use tar::Builder;
use tempfile::tempdir;

fn create_tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let mut tar_builder = Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_path(name).unwrap();
        header.set_mode(0o644);
        header.set_cksum();
        tar_builder.append(&header, content.as_bytes()).unwrap();
    }
    let tar = tar_builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

fn write_config(path: &Path, workspace: &Path) {
    fs::write(
        path,
        format!(
            r#"{{"dir": {:?}, "initialized": true, "preferredPackageManager": "npm"}}"#,
            workspace.to_string_lossy()
        ),
    )
    .unwrap();
}

fn localpkg() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("localpkg"));
    cmd.env_remove("LOCALPKG_CONFIG");
    cmd
}

#[test]
fn test_get_config_without_config_fails() {
    let home = tempdir().unwrap();
    localpkg()
        .arg("--config")
        .arg(home.path().join(".localpkg-config.json"))
        .arg("get-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no config found"));
}

#[test]
fn test_init_then_get_config() {
    let home = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let config = home.path().join(".localpkg-config.json");

    localpkg()
        .arg("--config")
        .arg(&config)
        .arg("init")
        .arg(workspace.path())
        .arg("--custom-script")
        .arg("make assets")
        .current_dir(workspace.path())
        .assert()
        .success();

    localpkg()
        .arg("--config")
        .arg(&config)
        .arg("get-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"initialized\": true"))
        .stdout(predicate::str::contains("\"customScript\": \"make assets\""))
        .stdout(predicate::str::contains("run compile"));
}

#[test]
fn test_copy_requires_init() {
    let home = tempdir().unwrap();
    let project = tempdir().unwrap();

    localpkg()
        .env("LOCALPKG_CONFIG", home.path().join(".localpkg-config.json"))
        .arg("copy")
        .current_dir(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("hasn't been initialized"));
}

#[test]
fn test_copy_with_unconfigured_script_does_nothing() {
    let home = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let config = home.path().join(".localpkg-config.json");
    write_config(&config, workspace.path());

    let project = workspace.path().join("foo");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("package.json"), r#"{"name": "foo"}"#).unwrap();

    localpkg()
        .arg("--config")
        .arg(&config)
        .args(["copy", "--custom"])
        .current_dir(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("customScript"));

    assert!(!project.join("package").exists());
}

#[test]
fn test_install_missing_package_leaves_project_untouched() {
    let home = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let config = home.path().join(".localpkg-config.json");
    write_config(&config, workspace.path());

    let app = workspace.path().join("app");
    fs::create_dir_all(&app).unwrap();
    let manifest = "{\n  \"name\": \"app\"\n}\n";
    fs::write(app.join("package.json"), manifest).unwrap();

    localpkg()
        .arg("--config")
        .arg(&config)
        .args(["install", "does-not-exist"])
        .current_dir(&app)
        .assert()
        .failure()
        .stderr(predicate::str::contains("package does-not-exist not found"));

    assert_eq!(fs::read_to_string(app.join("package.json")).unwrap(), manifest);
    assert!(!app.join("package-lock.json").exists());
}

/// Runs `copy` against a fake `npm` on PATH that drops a prepared tarball.
#[cfg(unix)]
#[test]
fn test_end_to_end_copy() {
    use std::os::unix::fs::PermissionsExt;

    let home = tempdir().unwrap();
    let workspace = tempdir().unwrap();
    let bin = tempdir().unwrap();
    let config = home.path().join(".localpkg-config.json");
    write_config(&config, workspace.path());

    let project = workspace.path().join("foo");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("package.json"), r#"{"name": "foo", "version": "1.0.0"}"#).unwrap();

    let consumer = workspace.path().join("app");
    fs::create_dir_all(&consumer).unwrap();
    fs::write(
        consumer.join("package.json"),
        r#"{"name": "app", "dependencies": {"foo": "^1.0.0"}}"#,
    )
    .unwrap();

    let fixture = bin.path().join("fixture.tgz");
    fs::write(
        &fixture,
        create_tar_gz(&[
            ("package/package.json", r#"{"name": "foo", "version": "1.0.0"}"#),
            ("package/index.js", "module.exports = 42;"),
        ]),
    )
    .unwrap();
    let npm = bin.path().join("npm");
    fs::write(
        &npm,
        format!(
            "#!/bin/sh\ncp '{}' foo-1.0.0.tgz\necho foo-1.0.0.tgz\n",
            fixture.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&npm, fs::Permissions::from_mode(0o755)).unwrap();

    let path = format!(
        "{}:{}",
        bin.path().display(),
        std::env::var("PATH").unwrap_or_default()
    );
    localpkg()
        .env("PATH", path)
        .arg("--config")
        .arg(&config)
        .arg("copy")
        .current_dir(&project)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(consumer.join("node_modules/foo/index.js")).unwrap(),
        "module.exports = 42;"
    );
    assert!(!project.join("foo-1.0.0.tgz").exists());
    assert!(!project.join("package").exists());
}
