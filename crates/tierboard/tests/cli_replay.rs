use std::fs;
use std::path::PathBuf;

use tierboard::inspect::{InspectArgs, inspect};
use tierboard::replay::{ReplayArgs, replay};
use tierboard::BoardCliError;

const CELL: u32 = 63;

/// Pixel center of a grid cell at the default cell size.
fn click(row: u32, column: u32) -> String {
    format!(
        r#"{{"op": "click", "x": {}, "y": {}}}"#,
        column * CELL + CELL / 2,
        row * CELL + CELL / 2
    )
}

fn write_script(dir: &tempfile::TempDir, steps: &[String]) -> PathBuf {
    let path = dir.path().join("script.json");
    let body = format!(r#"{{"steps": [{}]}}"#, steps.join(", "));
    fs::write(&path, body).expect("write script");
    path
}

fn replay_args(script: PathBuf, items: &[&str], save: Option<PathBuf>) -> ReplayArgs {
    ReplayArgs {
        template: "Classique".to_string(),
        catalog: None,
        items: items.iter().map(ToString::to_string).collect(),
        script,
        save,
        cell_size: CELL,
        json: false,
    }
}

#[test]
fn replay_places_items_and_inspect_reads_the_save() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Classique: S A B C D plus staging; one row per tier, control row 5.
    let steps = vec![
        r#"{"op": "intake"}"#.to_string(),
        click(5, 2),
        click(0, 4),
        r#"{"op": "intake"}"#.to_string(),
        click(5, 2),
        click(2, 7),
        r#"{"op": "intake"}"#.to_string(),
        click(5, 2),
        click(5, 19),
    ];
    let script = write_script(&dir, &steps);
    let save = dir.path().join("board.json");

    let report = replay(&replay_args(
        script,
        &["First", "Second", "Third"],
        Some(save.clone()),
    ))
    .expect("replay succeeds");

    assert_eq!(report.counters.steps, 9);
    assert_eq!(report.counters.staged, 3);
    assert_eq!(report.counters.selections, 3);
    assert_eq!(report.counters.moves, 2);
    assert_eq!(report.counters.discards, 1);
    assert_eq!(report.counters.noops, 0);
    assert_eq!(report.board.item_count, 2);
    assert_eq!(report.board.remaining, 0);
    assert!(save.exists());

    let summary = inspect(&InspectArgs {
        file: save,
        catalog: None,
        json: false,
    })
    .expect("inspect succeeds");
    assert_eq!(summary, report.board);
    assert_eq!(summary.tiers[0].items, vec!["First".to_string()]);
    assert_eq!(summary.tiers[2].items, vec!["Second".to_string()]);
    assert!(summary.tiers[5].items.is_empty());
}

#[test]
fn intake_is_refused_while_staging_is_occupied() {
    let dir = tempfile::tempdir().expect("tempdir");
    let steps = vec![
        r#"{"op": "intake"}"#.to_string(),
        r#"{"op": "intake"}"#.to_string(),
    ];
    let script = write_script(&dir, &steps);

    let report = replay(&replay_args(script, &["A", "B"], None)).expect("replay succeeds");
    assert_eq!(report.counters.staged, 1);
    assert_eq!(report.counters.refused_intake, 1);
    assert_eq!(report.board.remaining, 1);
    assert!(report.saved_to.is_none());
}

#[test]
fn unknown_template_fails_before_any_step() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = write_script(&dir, &[r#"{"op": "intake"}"#.to_string()]);
    let mut args = replay_args(script, &["A"], None);
    args.template = "Nope".to_string();

    let err = replay(&args).unwrap_err();
    assert!(matches!(err, BoardCliError::Session(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn corrupt_save_is_a_data_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("board.json");
    fs::write(&path, "{not json").expect("write");

    let err = inspect(&InspectArgs {
        file: path,
        catalog: None,
        json: true,
    })
    .unwrap_err();
    assert!(matches!(err, BoardCliError::Snapshot(_)));
    assert_eq!(err.exit_code(), 3);
}
