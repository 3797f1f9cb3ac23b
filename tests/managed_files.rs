//! Integration tests for managed handles over real tokio file I/O.
//!
//! These tests check that composed handles leave nothing behind on disk,
//! whether the use succeeds or fails.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use managed_effect::prelude::*;

/// Unique path under the system temp dir
fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "managed_effect_{}_{}",
        std::process::id(),
        name
    ))
}

fn temp_dir(name: &str) -> Managed<PathBuf, io::Error> {
    let path = temp_path(name);
    Managed::new(
        move || {
            let path = path.clone();
            from_async(move |_: &()| async move {
                tokio::fs::create_dir_all(&path).await?;
                Ok::<_, io::Error>(path)
            })
        },
        // remove_dir fails on a non-empty directory
        |path: PathBuf| async move { tokio::fs::remove_dir(&path).await },
    )
}

fn temp_file(path: PathBuf, contents: &str) -> Managed<PathBuf, io::Error> {
    let contents = contents.to_string();
    Managed::new(
        move || {
            let path = path.clone();
            let contents = contents.clone();
            from_async(move |_: &()| async move {
                tokio::fs::write(&path, contents).await?;
                Ok::<_, io::Error>(path)
            })
        },
        |path: PathBuf| async move { tokio::fs::remove_file(&path).await },
    )
}

fn read(path: &PathBuf) -> impl Effect<Output = String, Error = io::Error, Env = ()> {
    let path = path.clone();
    from_async(move |_: &()| async move { tokio::fs::read_to_string(&path).await })
}

#[tokio::test]
async fn temp_file_is_removed_after_use() {
    let path = temp_path("success.txt");
    let file = temp_file(path.clone(), "test content");

    let result = file.with(read).run(&()).await;

    assert_eq!(result.unwrap(), "test content");
    assert!(!path.exists(), "temp file should be deleted");
}

#[tokio::test]
async fn temp_file_is_removed_after_use_failure() {
    let path = temp_path("use_failure.txt");
    let file = temp_file(path.clone(), "test content");

    let result = file
        .with(|_| fail::<String, _, ()>(io::Error::other("use failed")))
        .run(&())
        .await;

    assert_eq!(result.unwrap_err().to_string(), "use failed");
    assert!(!path.exists(), "temp file should be deleted despite failure");
}

#[tokio::test]
async fn file_inside_directory_is_removed_before_directory() {
    let dir_name = "nested_dir";
    let handle = temp_dir(dir_name).and_then(|dir| temp_file(dir.join("inner.txt"), "nested"));

    let result = handle.with(read).run(&()).await;

    assert_eq!(result.unwrap(), "nested");
    assert!(!temp_path(dir_name).exists(), "directory should be deleted");
}

#[tokio::test]
async fn traverse_creates_and_removes_every_file() {
    let names = ["a.txt", "b.txt", "c.txt"];
    let paths: Vec<PathBuf> = names.iter().map(|name| temp_path(name)).collect();
    let files = Managed::traverse(paths.clone(), |path| temp_file(path, "xy"));

    let total = files
        .with(|paths| {
            let paths = paths.clone();
            from_async(move |_: &()| async move {
                let mut total = 0;
                for path in &paths {
                    total += tokio::fs::read(path).await?.len();
                }
                Ok::<_, io::Error>(total)
            })
        })
        .run(&())
        .await;

    assert_eq!(total.unwrap(), 6);
    assert!(paths.iter().all(|path| !path.exists()));
}

#[tokio::test]
async fn failed_release_replaces_result_and_is_observed() {
    let path = temp_path("removed_during_use.txt");
    let file = temp_file(path.clone(), "gone");
    let shadowed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&shadowed);

    let result = file
        .with(|path| {
            let path = path.clone();
            from_async(move |_: &()| async move {
                tokio::fs::remove_file(&path).await?;
                Ok::<_, io::Error>("removed early")
            })
        })
        .observe(move |event: Shadowed<'_, io::Error>| {
            assert!(event.discarded().is_none());
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .run(&())
        .await;

    assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    assert_eq!(shadowed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_file_failure_removes_first_file() {
    let first = temp_path("first_of_pair.txt");
    let missing_dir = temp_path("does_not_exist").join("second.txt");
    let pair = temp_file(first.clone(), "one").zip(&temp_file(missing_dir, "two"));

    let result = pair.with(|_| pure::<_, io::Error, ()>(())).run(&()).await;

    assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    assert!(!first.exists(), "first file should be rolled back");
}
