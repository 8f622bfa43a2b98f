//! File store behavior across a real on-disk backend and process restarts.

mod common;

use aussie_core::ErrorKind;
use aussie_events::{EventBus, topics};
use aussie_test::{EventRecorder, test_dir};
use aussie_vfs::{FsError, NodeKind};
use common::open_disk_store;

#[tokio::test]
async fn test_mixed_mutations_survive_restart() {
    let dir = test_dir();
    let bus = EventBus::new();
    let fs = open_disk_store(dir.path(), &bus).await;

    fs.mkdir("/projects/site/assets").unwrap();
    fs.write_file("/projects/site/index.html", "<h1>hi</h1>", false)
        .unwrap();
    fs.write_file("/projects/site/assets/app.js", "let a = 1;", false)
        .unwrap();
    fs.write_file("/projects/site/assets/app.js", "\nlet b = 2;", true)
        .unwrap();
    fs.write_file("/scratch.txt", "tmp", false).unwrap();
    fs.delete("/scratch.txt").unwrap();
    fs.move_path("/projects/site", "/workspace/site").unwrap();
    fs.flush().await.unwrap();
    let before = fs.snapshot();
    drop(fs);

    let reopened = open_disk_store(dir.path(), &EventBus::new()).await;
    assert_eq!(reopened.snapshot(), before);
    assert_eq!(
        reopened.read_file("/workspace/site/assets/app.js").unwrap(),
        "let a = 1;\nlet b = 2;"
    );
    assert!(!reopened.exists("/scratch.txt"));
    assert!(!reopened.exists("/projects/site"));
}

#[tokio::test]
async fn test_fresh_store_is_bootstrapped_once() {
    let dir = test_dir();
    let fs = open_disk_store(dir.path(), &EventBus::new()).await;
    fs.delete("/home/guest/Desktop/Chat.shortcut").unwrap();
    fs.flush().await.unwrap();
    drop(fs);

    // The persisted tree wins over the bootstrap tree on the next open.
    let fs = open_disk_store(dir.path(), &EventBus::new()).await;
    assert!(!fs.exists("/home/guest/Desktop/Chat.shortcut"));
    assert!(fs.exists("/home/guest/Desktop/Terminal.shortcut"));
}

#[tokio::test]
async fn test_move_relocates_subtree() {
    let dir = test_dir();
    let fs = open_disk_store(dir.path(), &EventBus::new()).await;
    fs.write_file("/a/deep/file.txt", "x", false).unwrap();

    fs.move_path("/a", "/b").unwrap();
    assert!(!fs.exists("/a"));
    assert!(fs.exists("/b"));
    assert_eq!(fs.read_file("/b/deep/file.txt").unwrap(), "x");
}

#[tokio::test]
async fn test_move_onto_existing_changes_nothing() {
    let dir = test_dir();
    let bus = EventBus::new();
    let fs = open_disk_store(dir.path(), &bus).await;
    fs.write_file("/src.txt", "source", false).unwrap();
    fs.write_file("/dst.txt", "destination", false).unwrap();
    let recorder = EventRecorder::attach(&bus);

    let err = fs.move_path("/src.txt", "/dst.txt").unwrap_err();
    assert!(matches!(err, FsError::DestinationExists(_)));
    assert_eq!(err.kind(), ErrorKind::DestinationExists);
    assert_eq!(fs.read_file("/src.txt").unwrap(), "source");
    assert_eq!(fs.read_file("/dst.txt").unwrap(), "destination");
    assert!(recorder.payloads(topics::FILE_CHANGE).is_empty());
}

#[tokio::test]
async fn test_mkdir_write_read_list() {
    let dir = test_dir();
    let fs = open_disk_store(dir.path(), &EventBus::new()).await;
    fs.mkdir("/a").unwrap();
    fs.write_file("/a/b.txt", "hi", false).unwrap();

    assert_eq!(fs.read_file("/a/b.txt").unwrap(), "hi");
    let entries = fs.read_dir("/a").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "b.txt");
    assert_eq!(entries[0].kind, NodeKind::File);
    assert_eq!(entries[0].size, 2);
}

#[tokio::test]
async fn test_every_mutation_announces_its_path() {
    let dir = test_dir();
    let bus = EventBus::new();
    let fs = open_disk_store(dir.path(), &bus).await;
    let recorder = EventRecorder::attach(&bus);

    fs.mkdir("/m").unwrap();
    fs.write_file("/m/f", "1", false).unwrap();
    fs.move_path("/m/f", "/m/g").unwrap();
    fs.delete("/m/g").unwrap();

    let paths: Vec<String> = recorder
        .payloads(topics::FILE_CHANGE)
        .iter()
        .map(|p| p["path"].as_str().unwrap().to_owned())
        .collect();
    assert!(paths.contains(&"/m".to_owned()));
    assert!(paths.contains(&"/m/f".to_owned()));
    assert!(paths.contains(&"/m/g".to_owned()));
}
