// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use rheo_storage::ops;
use rheo_storage::{CancellationToken, OperationOptions, StorageDirectory, StorageError, StorageProgress};
use std::fs;
use std::sync::Arc;

fn seed_tree(root: &std::path::Path) {
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("a.txt"), b"alpha").unwrap();
    fs::write(root.join("sub/b.txt"), b"beta").unwrap();
}

#[test]
fn directory_handles_copy_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("source");
    seed_tree(&src_path);

    let src = StorageDirectory::new(&src_path);
    let copy = src
        .copy_to(&dir.path().join("copy"), &OperationOptions::default())
        .unwrap();
    assert_eq!(fs::read(copy.path().join("a.txt")).unwrap(), b"alpha");
    assert_eq!(fs::read(copy.path().join("sub/b.txt")).unwrap(), b"beta");

    copy.delete().unwrap();
    assert!(!dir.path().join("copy").exists());
    assert!(src_path.exists());
}

#[test]
fn directory_handles_move_and_rename() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("movable");
    seed_tree(&src_path);

    let moved = StorageDirectory::new(&src_path)
        .move_to(&dir.path().join("moved"), &OperationOptions::default())
        .unwrap();
    assert!(!src_path.exists());
    assert_eq!(fs::read(moved.path().join("a.txt")).unwrap(), b"alpha");

    let renamed = moved.rename("renamed").unwrap();
    assert_eq!(renamed.display_name(), "renamed");
    assert!(dir.path().join("renamed").exists());
    assert!(!dir.path().join("moved").exists());
}

#[test]
fn directory_copy_into_an_occupied_name_takes_a_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("tree");
    seed_tree(&src_path);
    fs::create_dir(dir.path().join("target")).unwrap();

    let copied = ops::copy_dir(
        &src_path,
        &dir.path().join("target"),
        &OperationOptions::default(),
    )
    .unwrap();
    assert_eq!(copied, dir.path().join("target (1)"));
    assert!(copied.join("sub/b.txt").exists());
}

#[test]
fn cancelled_merge_copy_unwinds_only_created_entries() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("incoming");
    fs::create_dir_all(&src_path).unwrap();
    for i in 0..4 {
        fs::write(src_path.join(format!("f{i}.bin")), vec![i as u8; 128 * 1024]).unwrap();
    }

    // Pre-existing destination with unrelated content: overwrite merges
    // into it, so rollback must not take the bystander with it.
    let dest = dir.path().join("existing");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("bystander.txt"), b"stays").unwrap();

    let token = CancellationToken::new();
    let sink = {
        let token = token.clone();
        move |_: &StorageProgress| token.cancel()
    };
    let options = OperationOptions {
        overwrite: true,
        progress: Some(Arc::new(sink)),
        cancel: Some(token),
    };

    let err = ops::copy_dir(&src_path, &dest, &options).unwrap_err();
    assert!(matches!(err, StorageError::Cancelled));
    assert!(dest.exists());
    assert_eq!(fs::read(dest.join("bystander.txt")).unwrap(), b"stays");
    // Nothing from the cancelled copy survives.
    for i in 0..4 {
        assert!(!dest.join(format!("f{i}.bin")).exists());
    }
}

#[test]
fn create_dir_and_file_handles_compose() {
    let dir = tempfile::tempdir().unwrap();
    let root = StorageDirectory::new(dir.path());

    let nested = root.create_dir("nested").unwrap();
    let file = nested
        .create_file("data.txt", b"payload", &OperationOptions::default())
        .unwrap();
    assert!(file.exists());
    assert_eq!(fs::read(file.path()).unwrap(), b"payload");

    let handle = nested.file("data.txt");
    assert!(handle.exists());
    let ghost = nested.file("ghost.txt");
    assert!(!ghost.exists());

    assert!(matches!(
        root.create_dir("bad/name"),
        Err(StorageError::InvalidArgument(_))
    ));
}

#[test]
fn write_stream_pulls_from_any_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streamed.bin");
    let payload = vec![0x3Cu8; 20 * 1024];

    ops::write_stream(
        &path,
        std::io::Cursor::new(payload.clone()),
        &OperationOptions::default(),
    )
    .unwrap();
    assert_eq!(fs::read(&path).unwrap(), payload);
}

#[tokio::test]
async fn directory_copy_async_matches_the_sync_path() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("async-src");
    seed_tree(&src_path);

    let src = StorageDirectory::new(&src_path);
    let copy = src
        .copy_to_async(&dir.path().join("async-copy"), &OperationOptions::default())
        .await
        .unwrap();
    assert_eq!(fs::read(copy.path().join("sub/b.txt")).unwrap(), b"beta");

    copy.delete_async().await.unwrap();
    assert!(!dir.path().join("async-copy").exists());
}
