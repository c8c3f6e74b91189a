use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::session::GeneratedFile;
use crate::util::sha256_hex;

/// Where generated files will land. Backends only ask it whether a file already exists.
#[derive(Debug, Clone, Default)]
pub struct OutputRoot {
    root: Option<PathBuf>,
}

impl OutputRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// No backing directory: nothing exists yet.
    pub fn in_memory() -> Self {
        Self { root: None }
    }

    pub fn exists(&self, rel: &Path) -> bool {
        match &self.root {
            Some(root) => root.join(rel).is_file(),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Write,
    /// Fail if any output differs; do not write.
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Written,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedFile {
    pub path: String,
    pub sha256: String,
    pub status: FileStatus,
}

pub fn commit(
    files: &[GeneratedFile],
    root: &Path,
    mode: OutputMode,
) -> Result<Vec<CommittedFile>> {
    let mut out = Vec::with_capacity(files.len());
    for file in files {
        let path = root.join(&file.rel_path);
        let current = std::fs::read(&path).ok();
        let unchanged = current.as_deref() == Some(file.contents.as_bytes());

        let status = match mode {
            OutputMode::Check => {
                if !unchanged {
                    anyhow::bail!("generated output differs: {}", path.display());
                }
                FileStatus::Unchanged
            }
            OutputMode::Write if unchanged => FileStatus::Unchanged,
            OutputMode::Write => {
                write_atomically(&path, file.contents.as_bytes())?;
                FileStatus::Written
            }
        };

        out.push(CommittedFile {
            path: file.rel_path.to_string_lossy().replace('\\', "/"),
            sha256: sha256_hex(file.contents.as_bytes()),
            status,
        });
    }
    Ok(out)
}

/// Writes next to the destination and renames, so readers never see a partial file.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".ivglue-tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes).with_context(|| format!("write output: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{commit, FileStatus, OutputMode, OutputRoot};
    use crate::session::{DestinationKind, GeneratedFile};

    fn file(contents: &str) -> GeneratedFile {
        GeneratedFile {
            function: "Foo".to_string(),
            kind: DestinationKind::SkeletonDecl,
            rel_path: PathBuf::from("Foo").join("Foo.ads"),
            contents: contents.to_string(),
        }
    }

    #[test]
    fn write_then_rewrite_reports_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = commit(&[file("package Foo is\n")], dir.path(), OutputMode::Write)
            .expect("first commit");
        assert_eq!(first[0].status, FileStatus::Written);
        assert_eq!(first[0].path, "Foo/Foo.ads");
        assert_eq!(first[0].sha256.len(), 64);

        let second = commit(&[file("package Foo is\n")], dir.path(), OutputMode::Write)
            .expect("second commit");
        assert_eq!(second[0].status, FileStatus::Unchanged);
        assert!(OutputRoot::new(dir.path()).exists(&PathBuf::from("Foo/Foo.ads")));
        assert!(!dir.path().join("Foo/Foo.ads.ivglue-tmp").exists());
    }

    #[test]
    fn check_mode_fails_on_difference_and_never_writes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = commit(&[file("x\n")], dir.path(), OutputMode::Check).unwrap_err();
        assert!(err.to_string().contains("generated output differs"));
        assert!(!dir.path().join("Foo").exists());
    }

    #[test]
    fn in_memory_root_has_no_files() {
        assert!(!OutputRoot::in_memory().exists(&PathBuf::from("Foo/Foo.adb")));
    }
}
