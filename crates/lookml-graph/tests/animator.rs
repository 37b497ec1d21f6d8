use std::fs;
use std::path::Path;

use git2::{Repository, Signature};
use lookml_core::GrapherConfig;
use lookml_graph::{GraphAnimator, GraphError};

fn write_file<P: AsRef<Path>>(path: P, content: &str) {
    fs::create_dir_all(path.as_ref().parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn commit_all(repo: &Repository, message: &str) {
    let sig = repo
        .signature()
        .or_else(|_| Signature::now("Tester", "tester@example.com"))
        .unwrap();
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parent = repo
        .head()
        .ok()
        .and_then(|h| h.target())
        .and_then(|oid| repo.find_commit(oid).ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

fn animator() -> GraphAnimator {
    GraphAnimator::new(GrapherConfig {
        render_engine: "none".to_string(),
        ..GrapherConfig::default()
    })
}

#[test]
fn one_frame_per_commit_oldest_first() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    write_file(dir.path().join("orders.view.lkml"), "view: orders {}\n");
    write_file(
        dir.path().join("shop.model.lkml"),
        "explore: orders {}\n",
    );
    commit_all(&repo, "add orders");

    write_file(dir.path().join("users.view.lkml"), "view: users {}\n");
    write_file(
        dir.path().join("shop.model.lkml"),
        "explore: orders {\n  join: users {\n    sql_on: ${orders.user_id} = ${users.id} ;;\n  }\n}\n",
    );
    commit_all(&repo, "join users");

    let branch = repo.head().unwrap().shorthand().unwrap().to_string();
    let frames = animator().collect_frames(dir.path(), &branch).unwrap();

    assert_eq!(frames.len(), 2);
    assert!(frames[0].timestamp <= frames[1].timestamp);
    assert_eq!(frames[0].summary, "add orders");
    assert!(frames[0].dot.contains("\"orders\" -> \"orders\";") || frames[0].dot.contains("\"shop\" -> \"orders\";"));
    // the second frame picks up the join edge
    assert!(frames[1].dot.contains("\"orders\" -> \"users\";"));
}

#[test]
fn commits_without_lookml_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    write_file(dir.path().join("README.md"), "no lookml yet\n");
    commit_all(&repo, "docs");

    write_file(dir.path().join("orders.view.lkml"), "view: orders {}\n");
    commit_all(&repo, "add orders");

    let branch = repo.head().unwrap().shorthand().unwrap().to_string();
    let frames = animator().collect_frames(dir.path(), &branch).unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].summary, "add orders");
}

#[test]
fn unknown_branch_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    Repository::init(dir.path()).unwrap();

    let err = animator()
        .collect_frames(dir.path(), "no-such-branch")
        .unwrap_err();
    assert!(matches!(err, GraphError::BranchNotFound(_)));
}

#[test]
fn create_gif_with_engine_none_writes_dot_frames() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    write_file(dir.path().join("orders.view.lkml"), "view: orders {}\n");
    write_file(dir.path().join("shop.model.lkml"), "explore: orders {}\n");
    commit_all(&repo, "init");

    let branch = repo.head().unwrap().shorthand().unwrap().to_string();
    let image_dir = dir.path().join("frames");
    let gif = dir.path().join("graph.gif");
    animator()
        .create_gif(dir.path(), &branch, &image_dir, &gif)
        .unwrap();

    assert!(image_dir.join("frame_0000.dot").exists());
    assert!(!gif.exists());
}
