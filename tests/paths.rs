use std::fs;
use std::path::{Path, PathBuf};

use pascal_voc_fetch::paths::{locate_repo_root, resolve_data_dir, target_dir};

#[test]
fn locate_finds_nearest_ancestor_with_processed_dir() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("project");
    fs::create_dir_all(root.join("data").join("processed")).unwrap();
    let nested = root.join("main_code").join("notebooks");
    fs::create_dir_all(&nested).unwrap();

    let found = locate_repo_root(Some(&nested)).unwrap();

    assert_eq!(found, root.canonicalize().unwrap());
    assert_eq!(
        target_dir(&found, Path::new("data/processed")),
        found.join("data").join("processed")
    );
}

#[test]
fn locate_accepts_the_start_itself() {
    let temp = tempfile::tempdir().unwrap();
    fs::create_dir_all(temp.path().join("data").join("processed")).unwrap();

    let found = locate_repo_root(Some(temp.path())).unwrap();
    assert_eq!(found, temp.path().canonicalize().unwrap());
}

#[test]
fn locate_falls_back_to_working_directory() {
    let temp = tempfile::tempdir().unwrap();
    let start = temp.path().join("lonely");
    fs::create_dir_all(&start).unwrap();

    let found = locate_repo_root(Some(&start)).unwrap();
    let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
    assert_eq!(found, cwd);
}

#[test]
fn data_dir_for_script_directory() {
    let script = Path::new("/x/y/main_code/script");
    let data_dir = resolve_data_dir(script.parent()).unwrap();
    assert_eq!(data_dir, PathBuf::from("/x/y/data/raw/archive"));
}

#[test]
fn data_dir_tolerates_trailing_separator() {
    let data_dir = resolve_data_dir(Some(Path::new("/x/y/scripts/"))).unwrap();
    assert_eq!(data_dir, PathBuf::from("/x/y/data/raw/archive"));
}

#[test]
fn data_dir_defaults_to_working_directory() {
    let cwd = std::env::current_dir().unwrap();
    let data_dir = resolve_data_dir(None).unwrap();

    assert!(data_dir.is_absolute());
    let expected = cwd
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(cwd.clone())
        .join("data")
        .join("raw")
        .join("archive");
    assert_eq!(data_dir, expected);
}
