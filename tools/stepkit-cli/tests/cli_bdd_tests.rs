use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use cucumber::{given, then, when, World};
use tempfile::TempDir;

#[derive(Debug, World)]
#[world(init = Self::new)]
struct CliWorld {
    dir: TempDir,
    output: Option<Output>,
}

impl CliWorld {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create tempdir"),
            output: None,
        }
    }

    fn output(&self) -> &Output {
        self.output.as_ref().expect("command was run")
    }
}

fn stepkit_binary() -> &'static Path {
    Path::new(env!("CARGO_BIN_EXE_stepkit"))
}

#[given(expr = "a feature file {string} with scenarios {string} and {string}")]
async fn given_feature_file(world: &mut CliWorld, file: String, first: String, second: String) {
    let source = format!(
        "Feature: {file}\n  Scenario: {first}\n    Given a step\n\n  Scenario: {second}\n    Given a step\n"
    );
    fs::write(world.dir.path().join(file), source).expect("write feature");
}

#[when(expr = "I run partition as worker {int} of {int}")]
async fn when_partition(world: &mut CliWorld, worker: usize, total: usize) {
    let output = Command::new(stepkit_binary())
        .arg("partition")
        .arg("--worker")
        .arg(worker.to_string())
        .arg("--total-workers")
        .arg(total.to_string())
        .arg(world.dir.path())
        .output()
        .expect("run stepkit");
    world.output = Some(output);
}

#[then(expr = "the output should list {string}")]
async fn then_output_lists(world: &mut CliWorld, expected: String) {
    let output = world.output();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.rsplit_once(": ").map(|(_, name)| name))
        .collect();
    assert_eq!(names.join(", "), expected);
}

#[then(expr = "the command should fail mentioning {string}")]
async fn then_fails(world: &mut CliWorld, fragment: String) {
    let output = world.output();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(&fragment), "stderr: {stderr}");
}

#[tokio::main]
async fn main() {
    CliWorld::run("tests/features").await;
}
