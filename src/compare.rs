//! Tree equivalence checker
//!
//! Decides whether a generated output tree matches its recorded key. Both
//! sides may be a single file or a directory. Directories are walked depth
//! first; at every level the entries are partitioned into left-only,
//! right-only and common names, common files are compared byte for byte and
//! common subdirectories are descended into. Every discrepancy is collected
//! with its path relative to the compared roots.
//!
//! The checker is read-only and never fails: unreadable entries, special
//! files and kind mismatches are reported as incomparable so that sibling
//! entries (and the caller's other cases) are still evaluated.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Chunk size for content comparison.
const BUFSIZE: usize = 8 * 1024;

/// Relative path used for discrepancies found on the roots themselves.
const ROOT: &str = ".";

/// Classification of a filesystem entry, observed without following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, fifos, devices
    Special,
}

impl EntryKind {
    fn of(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Special
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
            EntryKind::Special => "special file",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two compared trees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Why a common entry could not be compared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incomparable {
    /// The entry has a different kind on each side
    KindMismatch { left: EntryKind, right: EntryKind },
    /// Symlinks and special files are never compared, even when both sides agree
    Unsupported(EntryKind),
    /// Opening, reading or listing the entry failed on one side
    Unreadable { side: Side, message: String },
}

impl fmt::Display for Incomparable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Incomparable::KindMismatch { left, right } => {
                write!(f, "{} on left, {} on right", left, right)
            }
            Incomparable::Unsupported(kind) => write!(f, "{} is not compared", kind),
            Incomparable::Unreadable { side, message } => {
                write!(f, "unreadable on {}: {}", side, message)
            }
        }
    }
}

/// Everything that differs between two trees, keyed by relative path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discrepancies {
    pub left_only: BTreeSet<PathBuf>,
    pub right_only: BTreeSet<PathBuf>,
    /// Files present on both sides with different content
    pub differing: BTreeSet<PathBuf>,
    pub incomparable: BTreeMap<PathBuf, Incomparable>,
}

impl Discrepancies {
    pub fn is_empty(&self) -> bool {
        self.left_only.is_empty()
            && self.right_only.is_empty()
            && self.differing.is_empty()
            && self.incomparable.is_empty()
    }

    /// Total number of reported entries
    pub fn len(&self) -> usize {
        self.left_only.len() + self.right_only.len() + self.differing.len() + self.incomparable.len()
    }
}

impl fmt::Display for Discrepancies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::with_capacity(self.len());
        for path in &self.left_only {
            lines.push(format!("only in left: {}", path.display()));
        }
        for path in &self.right_only {
            lines.push(format!("only in right: {}", path.display()));
        }
        for path in &self.differing {
            lines.push(format!("differs: {}", path.display()));
        }
        for (path, why) in &self.incomparable {
            lines.push(format!("incomparable: {} ({})", path.display(), why));
        }
        f.write_str(&lines.join("\n"))
    }
}

/// Outcome of comparing two paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    Unequal(Discrepancies),
    /// At least one top-level path does not exist; `true` marks the absent side
    Missing { left: bool, right: bool },
}

impl Comparison {
    pub fn is_equal(&self) -> bool {
        matches!(self, Comparison::Equal)
    }

    pub fn discrepancies(&self) -> Option<&Discrepancies> {
        match self {
            Comparison::Unequal(found) => Some(found),
            _ => None,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Equal => f.write_str("equal"),
            Comparison::Unequal(found) => write!(f, "{}", found),
            Comparison::Missing { left, right } => match (left, right) {
                (true, true) => f.write_str("missing: left, right"),
                (true, false) => f.write_str("missing: left"),
                _ => f.write_str("missing: right"),
            },
        }
    }
}

/// Compare two paths with the default settings.
pub fn compare(left: impl AsRef<Path>, right: impl AsRef<Path>) -> Comparison {
    Comparator::new().compare(left, right)
}

/// Compare the full content of two files.
///
/// A length difference is decisive; otherwise both files are read in
/// chunks until the first differing chunk or the end.
pub fn files_equal(left: impl AsRef<Path>, right: impl AsRef<Path>) -> io::Result<bool> {
    compare_contents(left.as_ref(), right.as_ref()).map_err(|(_, e)| e)
}

/// Comparison settings, reusable across any number of path pairs
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    ignore: BTreeSet<OsString>,
    stop_at_first_difference: bool,
}

type Listing = BTreeMap<OsString, Result<EntryKind, String>>;

impl Comparator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip entries with this name at every level, on both sides
    pub fn ignore(mut self, name: impl Into<OsString>) -> Self {
        self.ignore.insert(name.into());
        self
    }

    /// Stop descending into subdirectories once any difference is known.
    /// The verdict is unchanged; only the report gets shorter.
    pub fn stop_at_first_difference(mut self, stop: bool) -> Self {
        self.stop_at_first_difference = stop;
        self
    }

    pub fn compare(&self, left: impl AsRef<Path>, right: impl AsRef<Path>) -> Comparison {
        let (left, right) = (left.as_ref(), right.as_ref());
        let mut found = Discrepancies::default();

        // Roots are what the caller named, so links are followed here.
        let left_kind = probe(left);
        let right_kind = probe(right);
        let (left_kind, right_kind) = match (left_kind, right_kind) {
            (Ok(Some(l)), Ok(Some(r))) => (l, r),
            (Ok(None), Ok(None)) => return Comparison::Missing { left: true, right: true },
            (Ok(None), _) => return Comparison::Missing { left: true, right: false },
            (_, Ok(None)) => return Comparison::Missing { left: false, right: true },
            (Err(e), _) => {
                found.incomparable.insert(PathBuf::from(ROOT), unreadable(Side::Left, &e));
                return Comparison::Unequal(found);
            }
            (_, Err(e)) => {
                found.incomparable.insert(PathBuf::from(ROOT), unreadable(Side::Right, &e));
                return Comparison::Unequal(found);
            }
        };

        self.compare_entry(left, right, Path::new(""), left_kind, right_kind, &mut found);

        if found.is_empty() {
            Comparison::Equal
        } else {
            Comparison::Unequal(found)
        }
    }

    fn compare_entry(
        &self,
        left: &Path,
        right: &Path,
        rel: &Path,
        left_kind: EntryKind,
        right_kind: EntryKind,
        found: &mut Discrepancies,
    ) {
        match (left_kind, right_kind) {
            (EntryKind::File, EntryKind::File) => match compare_contents(left, right) {
                Ok(true) => {}
                Ok(false) => {
                    found.differing.insert(display_path(rel));
                }
                Err((side, e)) => {
                    found.incomparable.insert(display_path(rel), unreadable(side, &e));
                }
            },
            (EntryKind::Directory, EntryKind::Directory) => self.walk(left, right, rel, found),
            (l, r) if l != r => {
                found
                    .incomparable
                    .insert(display_path(rel), Incomparable::KindMismatch { left: l, right: r });
            }
            (kind, _) => {
                found.incomparable.insert(display_path(rel), Incomparable::Unsupported(kind));
            }
        }
    }

    fn walk(&self, left: &Path, right: &Path, rel: &Path, found: &mut Discrepancies) {
        let left_entries = match self.list(left) {
            Ok(entries) => entries,
            Err(e) => {
                found.incomparable.insert(display_path(rel), unreadable(Side::Left, &e));
                return;
            }
        };
        let right_entries = match self.list(right) {
            Ok(entries) => entries,
            Err(e) => {
                found.incomparable.insert(display_path(rel), unreadable(Side::Right, &e));
                return;
            }
        };

        for name in right_entries.keys() {
            if !left_entries.contains_key(name) {
                found.right_only.insert(rel.join(name));
            }
        }

        let mut subdirs = Vec::new();
        for (name, left_kind) in &left_entries {
            let Some(right_kind) = right_entries.get(name) else {
                found.left_only.insert(rel.join(name));
                continue;
            };
            let child = rel.join(name);
            let (left_kind, right_kind) = match (left_kind, right_kind) {
                (Ok(l), Ok(r)) => (*l, *r),
                (Err(message), _) => {
                    found.incomparable.insert(
                        child,
                        Incomparable::Unreadable { side: Side::Left, message: message.clone() },
                    );
                    continue;
                }
                (_, Err(message)) => {
                    found.incomparable.insert(
                        child,
                        Incomparable::Unreadable { side: Side::Right, message: message.clone() },
                    );
                    continue;
                }
            };

            // Files and mismatches first; every sibling is settled before descending.
            if left_kind == EntryKind::Directory && right_kind == EntryKind::Directory {
                subdirs.push(name);
            } else {
                self.compare_entry(&left.join(name), &right.join(name), &child, left_kind, right_kind, found);
            }
        }

        for name in subdirs {
            if self.stop_at_first_difference && !found.is_empty() {
                break;
            }
            self.walk(&left.join(name), &right.join(name), &rel.join(name), found);
        }
    }

    fn list(&self, dir: &Path) -> io::Result<Listing> {
        let mut entries = Listing::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if self.ignore.contains(&name) {
                continue;
            }
            // DirEntry::file_type does not traverse symlinks.
            let kind = entry
                .file_type()
                .map(EntryKind::of)
                .map_err(|e| e.to_string());
            entries.insert(name, kind);
        }
        Ok(entries)
    }
}

fn probe(path: &Path) -> io::Result<Option<EntryKind>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(EntryKind::of(meta.file_type()))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn unreadable(side: Side, err: &io::Error) -> Incomparable {
    Incomparable::Unreadable { side, message: err.to_string() }
}

fn display_path(rel: &Path) -> PathBuf {
    if rel.as_os_str().is_empty() {
        PathBuf::from(ROOT)
    } else {
        rel.to_path_buf()
    }
}

fn compare_contents(left: &Path, right: &Path) -> Result<bool, (Side, io::Error)> {
    let mut l = File::open(left).map_err(|e| (Side::Left, e))?;
    let mut r = File::open(right).map_err(|e| (Side::Right, e))?;

    let left_len = l.metadata().map_err(|e| (Side::Left, e))?.len();
    let right_len = r.metadata().map_err(|e| (Side::Right, e))?.len();
    if left_len != right_len {
        return Ok(false);
    }

    let mut left_buf = [0u8; BUFSIZE];
    let mut right_buf = [0u8; BUFSIZE];
    loop {
        let ln = fill(&mut l, &mut left_buf).map_err(|e| (Side::Left, e))?;
        let rn = fill(&mut r, &mut right_buf).map_err(|e| (Side::Right, e))?;
        if ln != rn || left_buf[..ln] != right_buf[..rn] {
            return Ok(false);
        }
        if ln == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
