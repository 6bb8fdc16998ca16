// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use rheo_storage::{StorageError, TempScope};
use std::fs;

#[test]
fn scope_roots_are_unique_and_live_under_the_temp_root() {
    let a = TempScope::new().unwrap();
    let b = TempScope::new().unwrap();

    assert_ne!(a.root(), b.root());
    assert!(a.root().exists());
    assert!(a.root().starts_with(std::env::temp_dir()));
    let name = a.root().file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Rheo_"));

    a.close().unwrap();
    b.close().unwrap();
}

#[test]
fn close_removes_children_and_the_root() {
    let scope = TempScope::new().unwrap();
    let file = scope.create_file("work.bin").unwrap();
    let dir = scope.create_dir("workspace").unwrap();
    fs::write(dir.path().join("inner.txt"), b"x").unwrap();
    assert!(file.exists());
    assert!(dir.exists());

    let root = scope.root().to_path_buf();
    scope.close().unwrap();
    assert!(!root.exists());
}

#[test]
fn double_close_is_a_no_op() {
    let scope = TempScope::new().unwrap();
    scope.close().unwrap();
    scope.close().unwrap();
    assert!(scope.is_closed());
}

#[test]
fn creation_after_close_is_rejected() {
    let scope = TempScope::new().unwrap();
    scope.close().unwrap();
    assert!(matches!(
        scope.create_file("late.txt"),
        Err(StorageError::InvalidState(_))
    ));
    assert!(matches!(
        scope.create_dir("late"),
        Err(StorageError::InvalidState(_))
    ));
}

#[test]
fn dropping_the_scope_cleans_up() {
    let root = {
        let scope = TempScope::new().unwrap();
        scope.create_file("dropped.bin").unwrap();
        scope.root().to_path_buf()
    };
    assert!(!root.exists());
}

#[test]
fn invalid_child_names_are_rejected() {
    let scope = TempScope::new().unwrap();
    assert!(matches!(
        scope.create_file("a/b.txt"),
        Err(StorageError::InvalidArgument(_))
    ));
    assert!(matches!(
        scope.create_file(""),
        Err(StorageError::InvalidArgument(_))
    ));
    scope.close().unwrap();
}
