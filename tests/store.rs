use std::fs;
use std::path::Path;

use pascal_voc_fetch::store::merge_into;

fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut items = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(path) = stack.pop() {
        for entry in fs::read_dir(&path).unwrap() {
            let path = entry.unwrap().path();
            let relative = path
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .into_owned();
            if path.is_dir() {
                items.push((format!("{relative}/"), Vec::new()));
                stack.push(path);
            } else {
                items.push((relative, fs::read(&path).unwrap()));
            }
        }
    }
    items.sort();
    items
}

fn fixture_source(root: &Path) {
    fs::create_dir_all(root.join("extra").join("nested")).unwrap();
    fs::write(root.join("pascal_train2007.json"), b"train").unwrap();
    fs::write(root.join("extra").join("img1.jpg"), b"img1").unwrap();
    fs::write(root.join("extra").join("nested").join("img2.jpg"), b"img2").unwrap();
}

#[test]
fn merge_creates_destination_and_copies_tree() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("source");
    fixture_source(&source);
    let dest = temp.path().join("a").join("b").join("dest");

    merge_into(&source, &dest).unwrap();

    assert_eq!(snapshot(&source), snapshot(&dest));
}

#[test]
fn merge_is_idempotent() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("source");
    fixture_source(&source);
    let dest = temp.path().join("dest");

    merge_into(&source, &dest).unwrap();
    let once = snapshot(&dest);
    merge_into(&source, &dest).unwrap();

    assert_eq!(once, snapshot(&dest));
}

#[test]
fn merge_never_overwrites_existing_entries() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("source");
    fixture_source(&source);
    let dest = temp.path().join("dest");
    fs::create_dir_all(dest.join("extra")).unwrap();
    fs::write(dest.join("pascal_train2007.json"), b"local edits").unwrap();

    merge_into(&source, &dest).unwrap();

    assert_eq!(
        fs::read(dest.join("pascal_train2007.json")).unwrap(),
        b"local edits"
    );
    // existing directories are skipped as a whole
    assert!(!dest.join("extra").join("img1.jpg").exists());
    assert!(!dest.join("extra").join("nested").exists());
}

#[test]
fn merge_preserves_modification_time() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("source");
    fs::create_dir_all(&source).unwrap();
    let file = source.join("pascal_test2007.json");
    fs::write(&file, b"test").unwrap();
    let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
    fs::File::options()
        .write(true)
        .open(&file)
        .unwrap()
        .set_modified(past)
        .unwrap();
    let dest = temp.path().join("dest");

    merge_into(&source, &dest).unwrap();

    let copied = fs::metadata(dest.join("pascal_test2007.json")).unwrap();
    assert_eq!(copied.modified().unwrap(), past);
}
