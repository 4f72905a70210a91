//! Execution Tests
//!
//! Drive the execution controller with an in-process runner standing in
//! for meshlabserver.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;

use meshscript::config::EngineConfig;
use meshscript::engine::{
    EngineRunner, ExecutionController, ExecutionOptions, FailureContext, Outcome, OutputTarget,
    ProcessInvocation, RecoveryChoice, ScriptedRecovery,
};
use meshscript::filters::{compute, create, layers};
use meshscript::script::{EngineVersion, Script};
use meshscript::MeshScriptError;
use tempfile::TempDir;

type Seen = Rc<RefCell<Vec<ProcessInvocation>>>;

fn config_in(dir: &TempDir) -> EngineConfig {
    EngineConfig {
        temp_dir: dir.path().to_path_buf(),
        ..EngineConfig::default()
    }
}

/// Replays `codes`, then exits 0; records every invocation
fn replaying(codes: Vec<Option<i32>>) -> (impl EngineRunner, Seen) {
    let seen: Seen = Rc::new(RefCell::new(Vec::new()));
    let handle = Rc::clone(&seen);
    let mut codes = codes.into_iter();
    let runner = move |invocation: &ProcessInvocation, _: &OutputTarget| -> io::Result<Option<i32>> {
        seen.borrow_mut().push(invocation.clone());
        Ok(codes.next().unwrap_or(Some(0)))
    };
    (runner, handle)
}

fn temp_files(dir: &Path, prefix: &str) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(prefix))
        .collect()
}

// === Retries ===

#[test]
fn test_retries_repeat_the_same_command_line() {
    let dir = TempDir::new().unwrap();
    let (runner, seen) = replaying(vec![Some(1), Some(2), None]);
    let policy = ScriptedRecovery::new([RecoveryChoice::Retry; 3]);
    let mut controller = ExecutionController::new(config_in(&dir), runner, policy);

    let mut script = Script::builder().mesh("part.ply").output("part.obj").build().unwrap();
    layers::duplicate(&mut script).unwrap();

    let report = controller
        .execute(&mut script, &ExecutionOptions::default().quiet())
        .unwrap();

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.attempts, 4);
    assert_eq!(report.exit_code, Some(0));

    let seen = seen.borrow();
    assert_eq!(seen.len(), 4);
    assert!(seen.iter().all(|inv| inv == &seen[0]));
    assert_eq!(seen[0].command_line(), report.command_line);
}

#[test]
fn test_continue_after_failure() {
    let dir = TempDir::new().unwrap();
    let (runner, seen) = replaying(vec![Some(3)]);
    let policy = ScriptedRecovery::new([RecoveryChoice::Continue]);
    let mut controller = ExecutionController::new(config_in(&dir), runner, policy);
    let mut script = Script::builder().mesh("part.ply").build().unwrap();

    let report = controller.execute(&mut script, &ExecutionOptions::default()).unwrap();

    assert_eq!(report.outcome, Outcome::Continued);
    assert_eq!(report.exit_code, Some(3));
    assert_eq!(seen.borrow().len(), 1);
    assert!(script.is_executed());
    assert!(temp_files(dir.path(), "TEMP3D_").is_empty());
}

#[test]
fn test_spawn_error_reaches_policy() {
    let dir = TempDir::new().unwrap();
    let runner = |_: &ProcessInvocation, _: &OutputTarget| -> io::Result<Option<i32>> {
        Err(io::Error::new(io::ErrorKind::NotFound, "meshlabserver not found"))
    };
    let failures: Rc<RefCell<Vec<FailureContext>>> = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&failures);
    let policy = move |failure: &FailureContext| {
        recorded.borrow_mut().push(failure.clone());
        RecoveryChoice::Continue
    };
    let mut controller = ExecutionController::new(config_in(&dir), runner, policy);
    let mut script = Script::builder().mesh("part.ply").build().unwrap();

    let report = controller.execute(&mut script, &ExecutionOptions::default()).unwrap();
    assert_eq!(report.outcome, Outcome::Continued);
    assert_eq!(report.exit_code, None);

    let failures = failures.borrow();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].attempt, 1);
    assert_eq!(failures[0].exit_code, None);
    assert!(failures[0]
        .spawn_error
        .as_deref()
        .unwrap()
        .contains("not found"));
}

// === Placeholder input ===

#[test]
fn test_generated_geometry_gets_placeholder_input() {
    let dir = TempDir::new().unwrap();
    // Artifacts only exist while the engine runs, so read them from the runner.
    let read: Rc<RefCell<Vec<(String, String)>>> = Rc::new(RefCell::new(Vec::new()));
    let handle = Rc::clone(&read);
    let runner = move |invocation: &ProcessInvocation, _: &OutputTarget| -> io::Result<Option<i32>> {
        let inputs: Vec<&str> = invocation.values_of("-i").collect();
        let scripts: Vec<&str> = invocation.values_of("-s").collect();
        assert_eq!(inputs.len(), 1);
        assert_eq!(scripts.len(), 1);
        assert!(inputs[0].ends_with(".xyz"));
        handle
            .borrow_mut()
            .push((fs::read_to_string(inputs[0])?, fs::read_to_string(scripts[0])?));
        Ok(Some(0))
    };
    let mut controller =
        ExecutionController::new(config_in(&dir), runner, ScriptedRecovery::default());
    let mut script = Script::new(EngineVersion::default());

    let report = controller.execute(&mut script, &ExecutionOptions::default()).unwrap();
    assert_eq!(report.outcome, Outcome::Success);

    let read = read.borrow();
    assert_eq!(read.len(), 1);
    let (placeholder, script_text) = &read[0];
    assert_eq!(placeholder, "0 0 0");
    // The placeholder's layer is deleted before anything else runs.
    assert_eq!(
        script_text,
        "<!DOCTYPE FilterScript>\n<FilterScript>\n  <filter name=\"Delete Current Mesh\"/>\n</FilterScript>\n"
    );
    assert!(script.records().is_empty());

    assert!(temp_files(dir.path(), "TEMP3D_").is_empty());
}

// === Aborts ===

#[test]
fn test_abort_keep_retains_files() {
    let dir = TempDir::new().unwrap();
    let (runner, _) = replaying(vec![Some(1)]);
    let mut controller = ExecutionController::new(
        config_in(&dir),
        runner,
        ScriptedRecovery::new([RecoveryChoice::AbortKeep]),
    );
    let mut script = Script::new(EngineVersion::default());
    create::cube(&mut script, [2.0, 2.0, 2.0], false, None).unwrap();

    let err = controller
        .execute(&mut script, &ExecutionOptions::default())
        .unwrap_err();
    match err {
        MeshScriptError::EngineAborted {
            retained,
            command_line,
            ..
        } => {
            assert!(retained);
            assert!(command_line.starts_with("meshlabserver -i "));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Placeholder mesh and script stay behind for inspection.
    let kept = temp_files(dir.path(), "TEMP3D_");
    assert_eq!(kept.len(), 2);
    assert!(kept.iter().any(|name| name.ends_with(".xyz")));
    assert!(kept.iter().any(|name| name.ends_with(".mlx")));

    // The script cannot be reused after an abort.
    assert!(script.is_executed());
}

#[test]
fn test_abort_delete_removes_files_and_log() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("run.log");
    fs::write(dir.path().join("TEMP3D_stale.mlx"), "old").unwrap();
    fs::write(dir.path().join("keep.ply"), "ply").unwrap();

    let (runner, _) = replaying(vec![Some(1)]);
    let mut controller = ExecutionController::new(
        config_in(&dir),
        runner,
        ScriptedRecovery::new([RecoveryChoice::AbortDelete]),
    );
    let mut script = Script::new(EngineVersion::default());
    create::cube(&mut script, [1.0, 1.0, 1.0], true, None).unwrap();

    let err = controller
        .execute(&mut script, &ExecutionOptions::default().with_wrapper_log(&log))
        .unwrap_err();
    assert!(matches!(
        err,
        MeshScriptError::EngineAborted {
            retained: false,
            ..
        }
    ));

    assert!(temp_files(dir.path(), "TEMP3D_").is_empty());
    assert!(!log.exists());
    assert!(dir.path().join("keep.ply").exists());
}

// === Measurements ===

const TOPOLOGY_LOG: &str = "\
V:     8 E:    18 F:    12
Unreferenced Vertices 0
Boundary Edges 0
Mesh is composed by 1 connected component(s)
Mesh is two-manifold
Mesh has 0 holes
Genus is 0
";

#[test]
fn test_measurements_read_from_engine_log() {
    let dir = TempDir::new().unwrap();
    let runner = |invocation: &ProcessInvocation, _: &OutputTarget| -> io::Result<Option<i32>> {
        if let Some(log) = invocation.values_of("-l").next() {
            fs::write(log, TOPOLOGY_LOG)?;
        }
        Ok(Some(0))
    };
    let mut controller =
        ExecutionController::new(config_in(&dir), runner, ScriptedRecovery::default());
    let mut script = Script::builder().mesh("cube.ply").build().unwrap();
    compute::measure_topology(&mut script).unwrap();

    let report = controller.execute(&mut script, &ExecutionOptions::default()).unwrap();

    let topology = script.results().topology.as_ref().unwrap();
    assert_eq!(topology.vert_num, Some(8));
    assert_eq!(topology.face_num, Some(12));
    assert!(topology.manifold);
    assert!(script.results().geometry.is_none());
    assert_eq!(report.results, *script.results());

    // The transient engine log is gone.
    assert!(temp_files(dir.path(), "TEMP3D_").is_empty());
}

#[test]
fn test_user_engine_log_is_kept() {
    let dir = TempDir::new().unwrap();
    let engine_log = dir.path().join("engine.txt");
    fs::write(&engine_log, "left over from an earlier run\n").unwrap();

    let runner = |invocation: &ProcessInvocation, _: &OutputTarget| -> io::Result<Option<i32>> {
        let log = invocation.values_of("-l").next().unwrap_or_default();
        let previous = fs::read_to_string(log)?;
        assert!(previous.is_empty());
        fs::write(log, TOPOLOGY_LOG)?;
        Ok(Some(0))
    };
    let mut controller =
        ExecutionController::new(config_in(&dir), runner, ScriptedRecovery::default());
    let mut script = Script::builder().mesh("cube.ply").build().unwrap();
    compute::measure_topology(&mut script).unwrap();

    controller
        .execute(&mut script, &ExecutionOptions::default().with_engine_log(&engine_log))
        .unwrap();

    assert!(engine_log.exists());
    assert_eq!(script.results().topology.as_ref().unwrap().edge_num, Some(18));
}

#[test]
fn test_persistent_script_path() {
    let dir = TempDir::new().unwrap();
    let script_path = dir.path().join("kept.mlx");
    let (runner, seen) = replaying(vec![]);
    let mut controller =
        ExecutionController::new(config_in(&dir), runner, ScriptedRecovery::default());
    let mut script = Script::builder().mesh("part.ply").build().unwrap();
    layers::duplicate(&mut script).unwrap();

    controller
        .execute(
            &mut script,
            &ExecutionOptions::default().with_script_path(&script_path),
        )
        .unwrap();

    let text = fs::read_to_string(&script_path).unwrap();
    assert!(text.contains("Duplicate Current layer"));
    let seen = seen.borrow();
    assert_eq!(
        seen[0].values_of("-s").next(),
        Some(script_path.to_str().unwrap())
    );
}
