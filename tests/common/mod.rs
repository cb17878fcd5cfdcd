//! Shared fixtures: trees declared as txtar archives
//!
//! Files named `left/...` and `right/...` land in the matching side of a
//! fresh temp directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub struct Fixture {
    pub dir: tempfile::TempDir,
}

impl Fixture {
    pub fn left(&self) -> PathBuf {
        self.dir.path().join("left")
    }

    pub fn right(&self) -> PathBuf {
        self.dir.path().join("right")
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }
}

/// Extract every archive member below a new temp dir.
pub fn materialize(txtar: &str) -> Fixture {
    let dir = tempfile::Builder::new()
        .prefix("esdlcmd-test-")
        .tempdir()
        .unwrap();
    extract(txtar, dir.path());
    Fixture { dir }
}

pub fn extract(txtar: &str, root: &Path) {
    let archive = emx_txtar::Decoder::new()
        .decode(txtar)
        .unwrap_or_else(|e| panic!("bad fixture archive: {}", e));
    for file in &archive.files {
        let path = root.join(&file.name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, &file.data).unwrap();
    }
}
