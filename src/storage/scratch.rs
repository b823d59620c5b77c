//! Request-scoped scratch files
//!
//! Every upload is written under a freshly generated name, so concurrent
//! requests never share a path. The returned [`ScratchFile`] removes the file
//! when dropped, which covers success, error and panic paths alike.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// Directory holding in-flight uploads
#[derive(Debug, Clone)]
pub struct ScratchStore {
    dir: PathBuf,
}

impl ScratchStore {
    /// Open the scratch directory, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write upload bytes to a new uniquely named file
    pub async fn persist(&self, data: &[u8], filename: Option<&str>) -> io::Result<ScratchFile> {
        let name = match filename.and_then(safe_extension) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        // Guard first so a partial write is removed as well
        let file = ScratchFile {
            path: self.dir.join(name),
        };
        tokio::fs::write(&file.path, data).await?;
        debug!("Scratch file written: {}", file.path.display());

        Ok(file)
    }
}

/// A scratch file that is deleted on drop
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Scratch file removed: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove scratch file {}: {}", self.path.display(), e),
        }
    }
}

/// Extension of the client filename, if it is short and alphanumeric
fn safe_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_open_creates_directory() {
        let root = tempdir().unwrap();
        let dir = root.path().join("nested/uploads");
        let store = ScratchStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
    }

    #[tokio::test]
    async fn test_persist_and_remove_on_drop() {
        let root = tempdir().unwrap();
        let store = ScratchStore::open(root.path()).unwrap();

        let file = store.persist(b"hello", Some("apple.JPG")).await.unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        assert_eq!(path.extension().unwrap(), "jpg");

        drop(file);
        assert!(!path.exists());
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_same_filename_gets_distinct_paths() {
        let root = tempdir().unwrap();
        let store = ScratchStore::open(root.path()).unwrap();

        let a = store.persist(b"a", Some("photo.png")).await.unwrap();
        let b = store.persist(b"b", Some("photo.png")).await.unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(std::fs::read(a.path()).unwrap(), b"a");
        assert_eq!(std::fs::read(b.path()).unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_client_filename_never_used_as_path() {
        let root = tempdir().unwrap();
        let store = ScratchStore::open(root.path().join("uploads")).unwrap();

        let file = store.persist(b"x", Some("../../etc/passwd")).await.unwrap();
        assert_eq!(file.path().parent().unwrap(), store.dir());
        assert!(file.path().extension().is_none());
    }

    #[test]
    fn test_drop_of_already_removed_file_is_quiet() {
        let root = tempdir().unwrap();
        let path = root.path().join("gone");
        drop(ScratchFile { path });
    }

    #[test]
    fn test_safe_extension() {
        assert_eq!(safe_extension("a.png"), Some("png".to_string()));
        assert_eq!(safe_extension("a.tar.GZ"), Some("gz".to_string()));
        assert_eq!(safe_extension("noext"), None);
        assert_eq!(safe_extension("a.p n g"), None);
        assert_eq!(safe_extension("a.verylongext"), None);
        assert_eq!(safe_extension(""), None);
    }
}
