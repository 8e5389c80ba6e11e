//! Path-sandboxed file access rooted at the project directory.
//!
//! Every path handed to a [`Workspace`] is interpreted relative to the
//! project root. Paths that are absolute, carry a root or drive prefix, or
//! contain a `..` segment are rejected before any I/O happens, as are paths
//! whose existing prefix is a symlink resolving outside the root.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// File access confined to one project root.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a relative path inside the root, rejecting escapes.
    pub fn resolve(&self, relative: &str) -> CoreResult<PathBuf> {
        let trimmed = relative.trim();
        if trimmed.is_empty() || trimmed.starts_with('/') || trimmed.starts_with('\\') {
            return Err(CoreError::PathRejected(relative.to_string()));
        }

        let path = Path::new(trimmed);
        if path.is_absolute() {
            return Err(CoreError::PathRejected(relative.to_string()));
        }

        for component in path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(CoreError::PathRejected(relative.to_string()));
                }
            }
        }

        let candidate = self.root.join(path);
        if !self.stays_inside(&candidate) {
            return Err(CoreError::PathRejected(relative.to_string()));
        }

        Ok(candidate)
    }

    /// Check that the deepest existing part of `candidate` resolves inside
    /// the root, so a symlinked file or directory cannot redirect I/O.
    fn stays_inside(&self, candidate: &Path) -> bool {
        let Ok(root) = self.root.canonicalize() else {
            // Nothing under a missing root can be a link yet
            return true;
        };

        // symlink_metadata does not follow links, so dangling ones stop the walk
        let mut ancestor = candidate.to_path_buf();
        while fs::symlink_metadata(&ancestor).is_err() {
            if !ancestor.pop() {
                return true;
            }
        }

        match ancestor.canonicalize() {
            Ok(resolved) => resolved.starts_with(&root),
            Err(_) => false,
        }
    }

    /// Read a file as UTF-8 text.
    pub fn read(&self, relative: &str) -> CoreResult<String> {
        let path = self.resolve(relative)?;
        debug!("Reading {}", path.display());
        Ok(fs::read_to_string(path)?)
    }

    /// Read a file, treating a missing file as `None`.
    pub fn read_optional(&self, relative: &str) -> CoreResult<Option<String>> {
        let path = self.resolve(relative)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a file, creating parent directories and replacing any content.
    pub fn write(&self, relative: &str, content: &str) -> CoreResult<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("Writing {} ({} bytes)", path.display(), content.len());
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Append to a file, creating it and its parent directories if needed.
    pub fn append(&self, relative: &str, content: &str) -> CoreResult<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("Appending {} bytes to {}", content.len(), path.display());
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(content.as_bytes())?;
        Ok(path)
    }

    /// Check whether a file exists. Rejected paths report an error.
    pub fn exists(&self, relative: &str) -> CoreResult<bool> {
        Ok(self.resolve(relative)?.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, Workspace) {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        (dir, ws)
    }

    #[test]
    fn test_write_creates_parents_and_reads_back() {
        let (_dir, ws) = workspace();

        ws.write("apps/api/src/routes/x.ts", "export {}").unwrap();

        assert!(ws.exists("apps/api/src/routes/x.ts").unwrap());
        assert_eq!(ws.read("apps/api/src/routes/x.ts").unwrap(), "export {}");
    }

    #[test]
    fn test_write_replaces_content() {
        let (_dir, ws) = workspace();

        ws.write("a.txt", "first").unwrap();
        ws.write("a.txt", "second").unwrap();

        assert_eq!(ws.read("a.txt").unwrap(), "second");
    }

    #[test]
    fn test_append_accumulates() {
        let (_dir, ws) = workspace();

        ws.append("prisma/schema.prisma", "model A {}\n").unwrap();
        ws.append("prisma/schema.prisma", "model B {}\n").unwrap();

        assert_eq!(
            ws.read("prisma/schema.prisma").unwrap(),
            "model A {}\nmodel B {}\n"
        );
    }

    #[test]
    fn test_read_optional_missing() {
        let (_dir, ws) = workspace();
        assert_eq!(ws.read_optional("missing.md").unwrap(), None);
    }

    #[test]
    fn test_rejects_parent_traversal() {
        let (_dir, ws) = workspace();

        assert!(matches!(
            ws.read("../secrets"),
            Err(CoreError::PathRejected(_))
        ));
        assert!(matches!(
            ws.write("../secrets", "x"),
            Err(CoreError::PathRejected(_))
        ));
        assert!(matches!(
            ws.write("a/../../secrets", "x"),
            Err(CoreError::PathRejected(_))
        ));
    }

    #[test]
    fn test_rejects_absolute_paths() {
        let (_dir, ws) = workspace();

        assert!(matches!(
            ws.read("/etc/passwd"),
            Err(CoreError::PathRejected(_))
        ));
        assert!(matches!(
            ws.write("/etc/passwd", "x"),
            Err(CoreError::PathRejected(_))
        ));
        assert!(matches!(
            ws.append("/etc/passwd", "x"),
            Err(CoreError::PathRejected(_))
        ));
        assert!(matches!(ws.exists(""), Err(CoreError::PathRejected(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_writes_through_symlinked_directory() {
        let (dir, ws) = workspace();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        assert!(matches!(
            ws.write("link/escaped.txt", "x"),
            Err(CoreError::PathRejected(_))
        ));
        assert!(matches!(
            ws.append("link/nested/escaped.txt", "x"),
            Err(CoreError::PathRejected(_))
        ));
        assert!(!outside.path().join("escaped.txt").exists());
        assert!(!outside.path().join("nested").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_dangling_symlink() {
        let (dir, ws) = workspace();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("created.txt");
        std::os::unix::fs::symlink(&target, dir.path().join("dangling")).unwrap();

        assert!(matches!(
            ws.write("dangling", "x"),
            Err(CoreError::PathRejected(_))
        ));
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_allowed() {
        let (dir, ws) = workspace();
        std::fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias")).unwrap();

        ws.write("alias/a.txt", "ok").unwrap();
        assert_eq!(ws.read("real/a.txt").unwrap(), "ok");
    }

    #[test]
    fn test_write_under_new_directories_allowed() {
        let (_dir, ws) = workspace();
        ws.write("deep/new/dir/file.txt", "ok").unwrap();
        assert_eq!(ws.read("deep/new/dir/file.txt").unwrap(), "ok");
    }

    #[test]
    fn test_current_dir_segments_allowed() {
        let (_dir, ws) = workspace();

        ws.write("./types/x.ts", "type X = {}").unwrap();
        assert_eq!(ws.read("types/x.ts").unwrap(), "type X = {}");
    }
}
