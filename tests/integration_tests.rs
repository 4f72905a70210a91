//! Integration Tests
//!
//! Script building end to end: inputs, emitters, assembly and project files.

use std::fs;

use meshscript::filters::{clean, compute, create, layers, normals, transform};
use meshscript::layers::LayerEffect;
use meshscript::script::project::{read_project, write_project, ProjectMesh};
use meshscript::script::{
    EngineVersion, FilterRecord, FilterSink, Script, ScriptAssembler, ScriptFile, CLOSING_MARKER,
    OPENING_MARKER,
};
use meshscript::MeshScriptError;
use tempfile::TempDir;

// === Assembly ===

#[test]
fn test_empty_script_is_markers_only() {
    let script = Script::new(EngineVersion::default());
    let text = script.to_script_text().unwrap();
    assert_eq!(text, format!("{}{}", OPENING_MARKER, CLOSING_MARKER));
}

#[test]
fn test_fragments_in_append_order() {
    let mut script = Script::builder().mesh("bunny.ply").build().unwrap();
    clean::merge_vert(&mut script, 0.0).unwrap();
    normals::reorient(&mut script).unwrap();
    clean::merge_vert(&mut script, 0.0).unwrap();
    compute::measure_geometry(&mut script).unwrap();

    let body: String = script.records().iter().map(FilterRecord::fragment).collect();
    let text = script.to_script_text().unwrap();
    assert_eq!(text, format!("{}{}{}", OPENING_MARKER, body, CLOSING_MARKER));

    // Repeated filters are kept.
    assert_eq!(text.matches("Merge Close Vertices").count(), 2);
    let merge = text.find("Merge Close Vertices").unwrap();
    let measure = text.find("Compute Geometric Measures").unwrap();
    assert!(merge < measure);
    assert!(script.requested_measurements().geometry);
}

#[test]
fn test_strict_assembler_rejects_empty_script() {
    let script = Script::new(EngineVersion::default());
    let err = ScriptAssembler::new()
        .require_records(true)
        .serialize(&script)
        .unwrap_err();
    assert!(matches!(err, MeshScriptError::EmptyScript));
}

// === Layer tracking through emitters ===

#[test]
fn test_cube_then_delete_restores_stack() {
    let mut script = Script::builder().mesh("mesh.ply").build().unwrap();
    create::cube(&mut script, [1.0, 1.0, 1.0], true, None).unwrap();
    assert_eq!(script.layers().entries(), &["mesh", "Cube"]);
    assert_eq!(script.layers().current_label().unwrap(), "Cube");

    layers::delete(&mut script).unwrap();
    assert_eq!(script.layers().entries(), &["mesh"]);
    assert_eq!(script.layers().current_index(), Some(0));
}

#[test]
fn test_failed_effect_records_nothing() {
    let mut script = Script::builder().mesh("mesh.ply").build().unwrap();
    let before = script.records().len();

    let err = layers::change(&mut script, 4).unwrap_err();
    assert!(err.is_layer_invariant_violation());
    assert_eq!(script.records().len(), before);
    assert_eq!(script.layers().current_index(), Some(0));
}

#[test]
fn test_stl_inputs_are_merged() {
    let script = Script::builder()
        .mesh("a.stl")
        .mesh("b.ply")
        .build()
        .unwrap();
    assert_eq!(script.layers().entries(), &["a", "b"]);
    assert_eq!(script.layers().current_index(), Some(1));

    let text = script.to_script_text().unwrap();
    assert_eq!(text.matches("Merge Close Vertices").count(), 1);
    assert_eq!(text.matches("Change the current layer").count(), 2);

    let unmerged = Script::builder()
        .mesh("a.stl")
        .merge_stl_vertices(false)
        .build()
        .unwrap();
    assert!(unmerged.records().is_empty());
}

#[test]
fn test_version_dependent_filter_names() {
    let mut old = Script::new(EngineVersion::V1_3_3);
    create::cube(&mut old, [1.0, 1.0, 1.0], true, None).unwrap();
    assert!(old.to_script_text().unwrap().contains("<filter name=\"Box\">"));

    let mut new = Script::new(EngineVersion::V2016_12);
    create::cube(&mut new, [1.0, 1.0, 1.0], true, None).unwrap();
    assert!(new.to_script_text().unwrap().contains("<filter name=\"Box/Cube\">"));
}

#[test]
fn test_executed_script_rejects_records() {
    let mut script = Script::builder().mesh("mesh.ply").build().unwrap();
    let record = FilterRecord::new("  <filter name=\"Invert Faces Orientation\"/>\n", LayerEffect::None);

    let dir = TempDir::new().unwrap();
    let config = meshscript::config::EngineConfig {
        temp_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let runner = |_: &meshscript::engine::ProcessInvocation,
                  _: &meshscript::engine::OutputTarget|
     -> std::io::Result<Option<i32>> { Ok(Some(0)) };
    let mut controller =
        meshscript::engine::ExecutionController::new(config, runner, meshscript::engine::AbortOnFailure);
    script
        .run(&mut controller, &meshscript::engine::ExecutionOptions::default())
        .unwrap();

    assert!(matches!(
        script.append(record),
        Err(MeshScriptError::ScriptFinalized)
    ));
}

// === Direct file sink ===

#[test]
fn test_script_file_sink() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("direct.mlx");

    let mut file = ScriptFile::create(&path, EngineVersion::default()).unwrap();
    assert!(file.layers().is_none());
    create::cube(&mut file, [2.0, 2.0, 2.0], true, None).unwrap();
    transform::translate(&mut file, [1.0, 0.0, 0.0]).unwrap();
    layers::duplicate(&mut file).unwrap();
    let count = file.filter_count();
    let written = file.finish().unwrap();

    let text = fs::read_to_string(written).unwrap();
    assert!(text.starts_with(OPENING_MARKER));
    assert!(text.ends_with(CLOSING_MARKER));
    assert_eq!(text.matches("<filter name=").count(), count);
    assert!(text.contains("Duplicate Current layer"));
}

#[test]
fn test_script_save_matches_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saved.mlx");
    let mut script = Script::new(EngineVersion::default());
    create::cube(&mut script, [1.0, 2.0, 3.0], false, None).unwrap();

    script.save(&path).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        script.to_script_text().unwrap()
    );
}

// === Project files ===

#[test]
fn test_project_round_trip_seeds_layers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scene.mlp");
    let mut shifted = meshscript::script::project::IDENTITY;
    shifted[0][3] = 5.0;
    let meshes = vec![
        ProjectMesh::new("base.ply").with_label("base"),
        ProjectMesh::new("lid.stl").with_label("lid").with_matrix(shifted),
    ];
    write_project(&path, &meshes, &[]).unwrap();

    let read = read_project(&path).unwrap();
    assert_eq!(read, meshes);

    let script = Script::builder()
        .project(&path)
        .mesh("extra.obj")
        .build()
        .unwrap();
    assert_eq!(script.layers().entries(), &["base", "lid", "extra"]);
    assert_eq!(script.layers().current_label().unwrap(), "extra");
    // The STL mesh from the project is merged.
    assert_eq!(
        script
            .to_script_text()
            .unwrap()
            .matches("Merge Close Vertices")
            .count(),
        1
    );
}

#[test]
fn test_missing_project_is_invalid() {
    let dir = TempDir::new().unwrap();
    let err = Script::builder()
        .project(dir.path().join("missing.mlp"))
        .build()
        .unwrap_err();
    assert!(matches!(err, MeshScriptError::InvalidProjectFile { .. }));
}

#[test]
fn test_project_without_root_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.mlp");
    fs::write(&path, "<NotAProject/>").unwrap();
    assert!(matches!(
        read_project(&path),
        Err(MeshScriptError::InvalidProjectFile { .. })
    ));
}
