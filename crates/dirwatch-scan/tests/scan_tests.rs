use dirwatch_scan::{
    DirectoryScanner, FileKind, FileMetadata, ImageInfo, MonitorConfig, WarningKind,
};
use std::fs;
use tempfile::TempDir;

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
    bytes
}

#[test]
fn test_classifies_every_kind() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("a.txt"), "alpha beta\ngamma\n").unwrap();
    fs::write(root.join("b.png"), png(3, 7)).unwrap();
    fs::write(root.join("c.java"), "class C {\n  void run() {\n  }\n}\n").unwrap();
    fs::write(root.join("d.bin"), [1u8, 2, 3]).unwrap();

    let snapshot = DirectoryScanner::new().scan(&MonitorConfig::new(root)).unwrap();

    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.get("a.txt").unwrap().kind(), FileKind::Text);
    assert_eq!(
        snapshot.get("b.png").unwrap().metadata,
        FileMetadata::Image(ImageInfo::new(3, 7))
    );
    match snapshot.get("c.java").unwrap().metadata {
        FileMetadata::Program(stats) => {
            assert_eq!(stats.line_count, 4);
            assert_eq!(stats.class_count, 1);
            assert_eq!(stats.method_count, 1);
        }
        other => panic!("expected program metadata, got {other:?}"),
    }
    assert!(snapshot.get("d.bin").is_none());
    assert_eq!(snapshot.stats.recorded(), 3);
    assert_eq!(snapshot.stats.unclassified, 1);
}

#[test]
fn test_broken_image_is_skipped_with_warning() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("broken.jpg"), b"definitely not a jpeg").unwrap();
    fs::write(temp.path().join("fine.txt"), "ok").unwrap();

    let snapshot = DirectoryScanner::new()
        .scan(&MonitorConfig::new(temp.path()))
        .unwrap();

    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.get("broken.jpg").is_none());
    assert_eq!(snapshot.warnings.len(), 1);
    assert_eq!(snapshot.warnings[0].kind, WarningKind::ExtractionFailed);
}

#[test]
fn test_hidden_files_and_depth() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("one/two")).unwrap();
    fs::write(root.join(".hidden.txt"), "secret").unwrap();
    fs::write(root.join("top.txt"), "top").unwrap();
    fs::write(root.join("one/mid.txt"), "mid").unwrap();
    fs::write(root.join("one/two/deep.txt"), "deep").unwrap();

    let all = DirectoryScanner::new().scan(&MonitorConfig::new(root)).unwrap();
    assert_eq!(all.len(), 4);

    let config = MonitorConfig::builder()
        .root(root)
        .include_hidden(false)
        .max_depth(Some(2))
        .build()
        .unwrap();
    let limited = DirectoryScanner::new().scan(&config).unwrap();

    assert!(limited.get(".hidden.txt").is_none());
    assert!(limited.get("one/two/deep.txt").is_none());
    assert!(limited.get("top.txt").is_some());
    assert!(limited.get("one/mid.txt").is_some());
}

#[test]
fn test_custom_extensions() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("README.md"), "# title\n").unwrap();
    fs::write(temp.path().join("notes.txt"), "plain").unwrap();

    let config = MonitorConfig::builder()
        .root(temp.path())
        .text_extensions(vec!["md".to_string()])
        .build()
        .unwrap();
    let snapshot = DirectoryScanner::new().scan(&config).unwrap();

    assert!(snapshot.get("README.md").is_some());
    assert!(snapshot.get("notes.txt").is_none());
}

#[cfg(unix)]
#[test]
fn test_unreadable_subtree_is_partial() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let locked = root.join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("inside.txt"), "hidden").unwrap();
    fs::write(root.join("visible.txt"), "visible").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read the directory anyway; nothing to test then.
    let readable = fs::read_dir(&locked).is_ok();

    let result = DirectoryScanner::new().scan(&MonitorConfig::new(root));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if readable {
        return;
    }
    let snapshot = result.unwrap();
    assert!(snapshot.get("visible.txt").is_some());
    assert!(snapshot.get("locked/inside.txt").is_none());
    assert!(snapshot.has_warnings());
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_is_partial() {
    let temp = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let root = temp.path();
    let target = elsewhere.path().join("target");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("inside.txt"), "moved").unwrap();
    fs::write(root.join("visible.txt"), "visible").unwrap();
    std::os::unix::fs::symlink(&target, root.join("link")).unwrap();
    fs::remove_dir_all(&target).unwrap();

    let config = MonitorConfig::builder()
        .root(root)
        .follow_symlinks(true)
        .build()
        .unwrap();
    let snapshot = DirectoryScanner::new().scan(&config).unwrap();

    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.get("visible.txt").is_some());
    assert!(snapshot.has_warnings());
    assert!(snapshot.warnings.iter().any(|w| w.path.ends_with("link")));
}
