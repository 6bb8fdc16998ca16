// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use rheo_storage::ops;
use rheo_storage::{
    CancellationToken, OperationOptions, StorageError, StorageFile, StorageProgress,
};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn write(path: &Path, bytes: &[u8]) {
    fs::write(path, bytes).unwrap();
}

#[test]
fn copied_files_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.bin");
    let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    write(&src, &payload);

    let dest = dir.path().join("dest.bin");
    let final_dest = ops::copy_file(&src, &dest, &OperationOptions::default()).unwrap();

    assert_eq!(final_dest, dest);
    assert_eq!(fs::read(&dest).unwrap(), payload);
    assert!(src.exists());
}

#[test]
fn copying_into_a_directory_twice_yields_numbered_suffixes() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("original.txt");
    write(&src, b"content");

    let options = OperationOptions::default();
    let first = ops::copy_file(&src, dir.path(), &options).unwrap();
    let second = ops::copy_file(&src, dir.path(), &options).unwrap();

    assert_eq!(first, dir.path().join("original (1).txt"));
    assert_eq!(second, dir.path().join("original (2).txt"));
    assert_eq!(fs::read(&second).unwrap(), b"content");
}

#[test]
fn overwrite_replaces_the_destination() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    let dest = dir.path().join("dest.txt");
    write(&src, b"new content");
    write(&dest, b"old content that is longer");

    let final_dest = ops::copy_file(&src, &dest, &OperationOptions::overwriting()).unwrap();
    assert_eq!(final_dest, dest);
    assert_eq!(fs::read(&dest).unwrap(), b"new content");
}

#[test]
fn missing_source_raises_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = ops::copy_file(
        &dir.path().join("missing.bin"),
        &dir.path().join("dest.bin"),
        &OperationOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[test]
fn missing_destination_parents_are_created() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    write(&src, b"x");

    let dest = dir.path().join("a/b/c/dest.txt");
    ops::copy_file(&src, &dest, &OperationOptions::default()).unwrap();
    assert!(dest.exists());
}

#[test]
fn zero_byte_files_copy_to_zero_byte_destinations() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("empty.bin");
    write(&src, b"");

    let dest = dir.path().join("copy.bin");
    ops::copy_file(&src, &dest, &OperationOptions::default()).unwrap();
    assert_eq!(fs::metadata(&dest).unwrap().len(), 0);
}

#[test]
fn progress_reports_are_monotonic_and_complete() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.bin");
    let payload = vec![0xA5u8; 96 * 1024];
    write(&src, &payload);

    let reports: Arc<Mutex<Vec<StorageProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let reports = reports.clone();
        move |progress: &StorageProgress| reports.lock().unwrap().push(*progress)
    };
    let options = OperationOptions::default().with_progress(Arc::new(sink));
    ops::copy_file(&src, &dir.path().join("dest.bin"), &options).unwrap();

    let reports = reports.lock().unwrap();
    assert!(reports.len() > 1);
    assert!(reports
        .windows(2)
        .all(|w| w[0].bytes_transferred <= w[1].bytes_transferred));
    let last = reports.last().unwrap();
    assert_eq!(last.total_bytes, payload.len() as u64);
    assert_eq!(last.bytes_transferred, payload.len() as u64);
    assert!((last.progress_percentage - 100.0).abs() < 0.01);
}

#[test]
fn directory_copy_mirrors_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("tree");
    fs::create_dir_all(src.join("sub/inner")).unwrap();
    write(&src.join("top.txt"), b"top");
    write(&src.join("sub/mid.txt"), b"mid");
    write(&src.join("sub/inner/leaf.txt"), b"leaf");

    let dest = dir.path().join("mirror");
    let final_dest = ops::copy_dir(&src, &dest, &OperationOptions::default()).unwrap();

    assert_eq!(final_dest, dest);
    assert_eq!(fs::read(dest.join("top.txt")).unwrap(), b"top");
    assert_eq!(fs::read(dest.join("sub/mid.txt")).unwrap(), b"mid");
    assert_eq!(fs::read(dest.join("sub/inner/leaf.txt")).unwrap(), b"leaf");
}

#[test]
fn cancelled_directory_copy_rolls_back_the_destination() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("bulk");
    fs::create_dir_all(&src).unwrap();
    // Five multi-chunk files so cancellation lands mid-stream.
    for i in 0..5 {
        write(&src.join(format!("f{i}.bin")), &vec![i as u8; 256 * 1024]);
    }

    let token = CancellationToken::new();
    let sink = {
        let token = token.clone();
        move |_: &StorageProgress| token.cancel()
    };
    let options = OperationOptions::default()
        .with_progress(Arc::new(sink))
        .with_cancel(token.clone());

    let dest = dir.path().join("bulk-copy");
    let err = ops::copy_dir(&src, &dest, &options).unwrap_err();
    assert!(matches!(err, StorageError::Cancelled));
    assert!(!dest.exists());
    // The source is untouched.
    assert_eq!(fs::read_dir(&src).unwrap().count(), 5);
}

#[test]
fn cancelled_file_copy_removes_the_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("big.bin");
    write(&src, &vec![0x42u8; 512 * 1024]);

    let token = CancellationToken::new();
    let sink = {
        let token = token.clone();
        move |_: &StorageProgress| token.cancel()
    };
    let options = OperationOptions::default()
        .with_progress(Arc::new(sink))
        .with_cancel(token);

    let dest = dir.path().join("big-copy.bin");
    let err = ops::copy_file(&src, &dest, &options).unwrap_err();
    assert!(matches!(err, StorageError::Cancelled));
    assert!(!dest.exists());
}

#[test]
fn no_progress_reports_arrive_after_cancellation() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("big.bin");
    write(&src, &vec![0x17u8; 512 * 1024]);

    let token = CancellationToken::new();
    let count = Arc::new(AtomicUsize::new(0));
    let sink = {
        let token = token.clone();
        let count = count.clone();
        move |_: &StorageProgress| {
            count.fetch_add(1, Ordering::SeqCst);
            token.cancel();
        }
    };
    let options = OperationOptions::default()
        .with_progress(Arc::new(sink))
        .with_cancel(token);

    let _ = ops::copy_file(&src, &dir.path().join("copy.bin"), &options);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn move_renames_within_a_volume() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    write(&src, b"payload");

    let dest = dir.path().join("moved.txt");
    let final_dest = ops::move_file(&src, &dest, &OperationOptions::default()).unwrap();

    assert_eq!(final_dest, dest);
    assert!(!src.exists());
    assert_eq!(fs::read(&dest).unwrap(), b"payload");
}

#[test]
fn move_into_an_occupied_name_resolves_a_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    let dest = dir.path().join("dest.txt");
    write(&src, b"a");
    write(&dest, b"b");

    let final_dest = ops::move_file(&src, &dest, &OperationOptions::default()).unwrap();
    assert_eq!(final_dest, dir.path().join("dest (1).txt"));
    assert_eq!(fs::read(&dest).unwrap(), b"b");
}

#[test]
fn rename_swaps_the_name_and_keeps_the_content() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("before.txt");
    write(&src, b"kept");

    let renamed = ops::rename(&src, "after.txt").unwrap();
    assert_eq!(renamed, dir.path().join("after.txt"));
    assert!(renamed.exists());
    assert!(!src.exists());
    assert_eq!(fs::read(&renamed).unwrap(), b"kept");
}

#[test]
fn rename_failure_preserves_the_source() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("still-here.txt");
    write(&src, b"x");

    let err = ops::rename(&src, "bad/name").unwrap_err();
    assert!(matches!(err, StorageError::InvalidArgument(_)));
    assert!(src.exists());

    let err = ops::rename(&dir.path().join("ghost.txt"), "name.txt").unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[test]
fn rename_collisions_use_the_suffix_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.txt");
    write(&src, b"a");
    write(&dir.path().join("b.txt"), b"b");

    let renamed = ops::rename(&src, "b.txt").unwrap();
    assert_eq!(renamed, dir.path().join("b (1).txt"));
}

#[test]
fn write_streams_bytes_with_progress() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.bin");
    let payload = vec![0x5Au8; 48 * 1024];

    let reports: Arc<Mutex<Vec<StorageProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let reports = reports.clone();
        move |progress: &StorageProgress| reports.lock().unwrap().push(*progress)
    };
    let options = OperationOptions::default().with_progress(Arc::new(sink));
    ops::write_file(&path, &payload, &options).unwrap();

    assert_eq!(fs::read(&path).unwrap(), payload);
    let reports = reports.lock().unwrap();
    assert_eq!(reports.last().unwrap().bytes_transferred, payload.len() as u64);
}

#[test]
fn cancelled_write_rolls_back_a_fresh_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.bin");

    let token = CancellationToken::new();
    let sink = {
        let token = token.clone();
        move |_: &StorageProgress| token.cancel()
    };
    let options = OperationOptions::default()
        .with_progress(Arc::new(sink))
        .with_cancel(token);

    let err = ops::write_file(&path, &vec![1u8; 256 * 1024], &options).unwrap_err();
    assert!(matches!(err, StorageError::Cancelled));
    assert!(!path.exists());
}

#[test]
fn delete_removes_files_and_missing_targets_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.txt");
    write(&path, b"x");

    ops::delete_file(&path).unwrap();
    assert!(!path.exists());
    assert!(matches!(
        ops::delete_file(&path),
        Err(StorageError::NotFound(_))
    ));
}

#[test]
fn file_handles_run_operations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("handle.txt");
    write(&path, b"via handle");

    let file = StorageFile::new(&path);
    assert!(file.exists());
    assert_eq!(file.display_name(), "handle.txt");
    assert_eq!(file.extension().as_deref(), Some("txt"));

    let info = file.information().unwrap();
    assert_eq!(info.record.size, 10);

    let copy = file
        .copy_to(&dir.path().join("copy.txt"), &OperationOptions::default())
        .unwrap();
    assert!(copy.exists());

    let renamed = copy.rename("renamed.txt").unwrap();
    assert_eq!(renamed.display_name(), "renamed.txt");
    renamed.delete().unwrap();
    assert!(!dir.path().join("renamed.txt").exists());
}

#[tokio::test]
async fn async_variants_run_on_the_blocking_pool() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.bin");
    write(&src, &vec![7u8; 32 * 1024]);

    let file = StorageFile::new(&src);
    let copy = file
        .copy_to_async(&dir.path().join("b.bin"), &OperationOptions::default())
        .await
        .unwrap();
    assert_eq!(fs::read(copy.path()).unwrap(), fs::read(&src).unwrap());

    copy.delete_async().await.unwrap();
    assert!(!dir.path().join("b.bin").exists());
}
