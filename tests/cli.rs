use assert_cmd::prelude::*;
use once_cell::sync::Lazy;
use predicates::str::contains;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// A scene directory with one valid OBJ, one missing path and light overrides.
static SCENE_DIR: Lazy<TempDir> = Lazy::new(|| {
    let dir = tempfile::tempdir().expect("temp scene dir");
    fs::write(
        dir.path().join("ship.obj"),
        "v -1 0 -1\nv 1 0 -1\nv 1 0 1\nv -1 0 1\nvn 0 1 0\nf 1//1 4//1 3//1 2//1\n",
    )
    .expect("write obj");
    fs::write(
        dir.path().join("scene.xml"),
        r#"<scene>
  <mesh role="ship">
    <path>ship.obj</path>
    <color>255 0 0</color>
  </mesh>
  <mesh role="terrain">
    <path>missing.obj</path>
  </mesh>
  <point-light>
    <position>1 2 0</position>
  </point-light>
</scene>
"#,
    )
    .expect("write scene");
    dir
});

fn scene_path() -> PathBuf {
    SCENE_DIR.path().join("scene.xml")
}

fn viewer() -> Command {
    Command::cargo_bin("shadow-viewer").expect("binary exists")
}

#[test]
fn headless_ride_moves_ship_and_camera_together() {
    let mut cmd = viewer();
    cmd.arg("--scene")
        .arg(scene_path())
        .args(["--headless", "--ride", "--ticks", "30", "--hold", "W"]);
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene with 4 meshes (1 from file)"))
        .stdout(contains(" - ship (2 triangles)"))
        .stdout(contains("Frames: 30 (depth 30, shaded 30, depth debug 0)"))
        .stdout(contains("Mode: ride"))
        .stdout(contains("Ship pos=(0.00, 1.00, 3.00)"))
        .stdout(contains("lift=0.030"))
        .stdout(contains("Point light pos=(1.00, 2.00, 0.00)"))
        .stdout(contains("Camera pos=(0.00, 1.00, 1.00)"));
}

#[test]
fn headless_edit_run_keeps_ship_still() {
    let mut cmd = viewer();
    cmd.args(["--headless", "--ticks", "10", "--hold", "WM"]);
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene with 4 meshes (0 from file)"))
        .stdout(contains("Frames: 10 (depth 10, shaded 0, depth debug 10)"))
        .stdout(contains("Mode: edit (render depth-debug)"))
        .stdout(contains("Ship pos=(0.00, 1.00, 0.00)"))
        .stdout(contains("lift=0.000"));
}

#[test]
fn escape_stops_the_headless_run() {
    let mut cmd = viewer();
    cmd.args(["--headless", "--ticks", "50", "--hold", "Escape"]);
    cmd.assert()
        .success()
        .stdout(contains("Frames: 1 (depth 1, shaded 1, depth debug 0)"));
}

#[test]
fn rejects_bad_arguments_with_usage() {
    viewer()
        .args(["--ticks", "abc"])
        .assert()
        .failure()
        .stderr(contains("--ticks expects a number"))
        .stderr(contains("Usage"));
    viewer()
        .arg("--bogus")
        .assert()
        .failure()
        .stderr(contains("Unknown argument: --bogus"));
}

#[test]
fn missing_scene_file_is_an_error() {
    viewer()
        .args(["--headless", "--scene"])
        .arg(SCENE_DIR.path().join("nope.xml"))
        .assert()
        .failure()
        .stderr(contains("failed to read scene"));
}

#[test]
fn window_failure_without_headless_is_fatal() {
    viewer()
        .env_remove("DISPLAY")
        .env_remove("WAYLAND_DISPLAY")
        .args(["--ticks", "3"])
        .assert()
        .failure()
        .stderr(contains("window initialisation failed"))
        .stdout(contains("Frames:").not());
}
