//! CLI tests running the real pptx-concat binary

use assert_cmd::Command;
use predicates::prelude::*;
use pptx_concat::Presentation;
use std::path::Path;
use tempfile::TempDir;

#[allow(deprecated)]
fn pptx_concat_cmd() -> Command {
    Command::cargo_bin("pptx-concat").unwrap()
}

fn write_deck(path: &Path, titles: &[&str]) {
    let mut prs = Presentation::new().unwrap();
    for title in titles {
        prs.add_slide(0, title, None).unwrap();
    }
    prs.save(path).unwrap();
}

fn slide_titles(path: &Path) -> Vec<String> {
    Presentation::open(path)
        .unwrap()
        .slides()
        .unwrap()
        .into_iter()
        .map(|slide| slide.title.unwrap_or_default())
        .collect()
}

#[test]
fn test_help_output() {
    pptx_concat_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("EXAMPLES"));
}

#[test]
fn test_output_is_required() {
    pptx_concat_cmd()
        .args(["source.pptx", "target.pptx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn test_concat_two_files() {
    let temp = TempDir::new().unwrap();
    write_deck(&temp.path().join("source.pptx"), &["S1", "S2"]);
    write_deck(&temp.path().join("target.pptx"), &["T1"]);

    pptx_concat_cmd()
        .current_dir(temp.path())
        .args(["source.pptx", "target.pptx", "-o", "output.pptx"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Concatenating source.pptx + target.pptx...",
        ))
        .stdout(predicate::str::contains("Successfully created: output.pptx"));

    assert_eq!(
        slide_titles(&temp.path().join("output.pptx")),
        vec!["S1", "S2", "T1"]
    );
}

#[test]
fn test_concat_several_files() {
    let temp = TempDir::new().unwrap();
    write_deck(&temp.path().join("source.pptx"), &["S1"]);
    write_deck(&temp.path().join("a.pptx"), &["A1", "A2"]);
    write_deck(&temp.path().join("b.pptx"), &["B1"]);

    pptx_concat_cmd()
        .current_dir(temp.path())
        .args(["source.pptx", "b.pptx", "a.pptx", "--output", "output.pptx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Concatenating source.pptx + 2 files..."));

    assert_eq!(
        slide_titles(&temp.path().join("output.pptx")),
        vec!["S1", "B1", "A1", "A2"]
    );
}

#[test]
fn test_glob_matches_are_sorted() {
    let temp = TempDir::new().unwrap();
    write_deck(&temp.path().join("intro.pptx"), &["Intro"]);
    write_deck(&temp.path().join("part2.pptx"), &["Second"]);
    write_deck(&temp.path().join("part1.pptx"), &["First"]);

    pptx_concat_cmd()
        .current_dir(temp.path())
        .args(["intro.pptx", "part*.pptx", "-o", "course.pptx"])
        .assert()
        .success();

    assert_eq!(
        slide_titles(&temp.path().join("course.pptx")),
        vec!["Intro", "First", "Second"]
    );
}

#[test]
fn test_glob_without_matches_fails() {
    let temp = TempDir::new().unwrap();
    write_deck(&temp.path().join("intro.pptx"), &["Intro"]);

    pptx_concat_cmd()
        .current_dir(temp.path())
        .args(["intro.pptx", "missing*.pptx", "-o", "out.pptx"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No files matched pattern"));
}

#[test]
fn test_missing_source_file() {
    let temp = TempDir::new().unwrap();
    write_deck(&temp.path().join("target.pptx"), &["T1"]);

    pptx_concat_cmd()
        .current_dir(temp.path())
        .args(["nope.pptx", "target.pptx", "-o", "output.pptx"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: Source file 'nope.pptx' not found",
        ));

    assert!(!temp.path().join("output.pptx").exists());
}

#[test]
fn test_missing_target_file() {
    let temp = TempDir::new().unwrap();
    write_deck(&temp.path().join("source.pptx"), &["S1"]);
    write_deck(&temp.path().join("a.pptx"), &["A1"]);

    pptx_concat_cmd()
        .current_dir(temp.path())
        .args(["source.pptx", "a.pptx", "gone.pptx", "-o", "output.pptx"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: Target file 'gone.pptx' not found",
        ));

    assert!(!temp.path().join("output.pptx").exists());
}

#[test]
fn test_corrupt_target_reports_error() {
    let temp = TempDir::new().unwrap();
    write_deck(&temp.path().join("source.pptx"), &["S1"]);
    std::fs::write(temp.path().join("broken.pptx"), b"not a presentation").unwrap();

    pptx_concat_cmd()
        .current_dir(temp.path())
        .args(["source.pptx", "broken.pptx", "-o", "output.pptx"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: "));
}

#[test]
fn test_existing_file_with_brackets_is_taken_literally() {
    let temp = TempDir::new().unwrap();
    write_deck(&temp.path().join("src.pptx"), &["S"]);
    write_deck(&temp.path().join("deck[1].pptx"), &["Bracketed"]);
    write_deck(&temp.path().join("deck1.pptx"), &["Other"]);

    pptx_concat_cmd()
        .current_dir(temp.path())
        .args(["src.pptx", "deck[1].pptx", "-o", "out.pptx"])
        .assert()
        .success();

    assert_eq!(
        slide_titles(&temp.path().join("out.pptx")),
        vec!["S", "Bracketed"]
    );
}

#[test]
fn test_existing_file_with_unbalanced_bracket() {
    let temp = TempDir::new().unwrap();
    write_deck(&temp.path().join("src.pptx"), &["S"]);
    write_deck(&temp.path().join("notes[draft.pptx"), &["Draft"]);

    pptx_concat_cmd()
        .current_dir(temp.path())
        .args(["src.pptx", "notes[draft.pptx", "-o", "out.pptx"])
        .assert()
        .success();

    assert_eq!(
        slide_titles(&temp.path().join("out.pptx")),
        vec!["S", "Draft"]
    );
}

#[test]
fn test_missing_file_with_invalid_pattern() {
    let temp = TempDir::new().unwrap();
    write_deck(&temp.path().join("src.pptx"), &["S"]);

    pptx_concat_cmd()
        .current_dir(temp.path())
        .args(["src.pptx", "notes[draft.pptx", "-o", "out.pptx"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: Target file 'notes[draft.pptx' not found",
        ));
}

#[test]
fn test_missing_source_is_reported_before_globbing() {
    let temp = TempDir::new().unwrap();

    pptx_concat_cmd()
        .current_dir(temp.path())
        .args(["nope.pptx", "missing*.pptx", "-o", "out.pptx"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: Source file 'nope.pptx' not found",
        ));
}
