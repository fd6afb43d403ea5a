//! Source files and where their bytes live.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Location of a source file's bytes.
#[derive(Debug, Clone)]
pub enum ContentHandle {
    /// Bytes already held in memory, e.g. from a multipart upload.
    Inline(Arc<[u8]>),
    /// A file on the server's local filesystem, read when the job runs.
    Path(PathBuf),
}

impl ContentHandle {
    /// Reads the full content.
    ///
    /// Inline content is shared, not copied.
    pub async fn read(&self) -> std::io::Result<Arc<[u8]>> {
        match self {
            ContentHandle::Inline(bytes) => Ok(Arc::clone(bytes)),
            ContentHandle::Path(path) => {
                let bytes = tokio::fs::read(path).await?;
                Ok(Arc::from(bytes))
            }
        }
    }
}

/// One file of a conversion batch.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Original file name including extension.
    pub name: String,
    pub size_bytes: u64,
    pub content: ContentHandle,
}

impl SourceFile {
    /// Creates a source file backed by in-memory bytes.
    pub fn inline(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            content: ContentHandle::Inline(Arc::from(bytes)),
        }
    }

    /// Creates a source file backed by a local path with a known size.
    pub fn from_path(name: impl Into<String>, path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            content: ContentHandle::Path(path.into()),
        }
    }

    /// Stats a local file and uses its file name unless `name` is given.
    pub async fn open(path: &Path, name: Option<String>) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }

        let name = name.unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        });

        Ok(Self::from_path(name, path, metadata.len()))
    }
}

/// Why a server-local source was refused.
///
/// Both variants render the same message so callers cannot tell a missing
/// file from one outside the source root.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source file not found")]
    NotFound,
    #[error("Source file not found")]
    OutsideRoot,
}

/// Directory that server-local sources must live under.
#[derive(Debug, Clone)]
pub struct SourceRoot {
    root: PathBuf,
}

impl SourceRoot {
    /// Resolves `dir` to its canonical form. Fails unless it is an existing
    /// directory.
    pub fn new(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = std::fs::canonicalize(dir.as_ref())?;
        if !root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a directory: {}", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Opens a regular file under the root.
    ///
    /// Relative paths are taken from the root. Symlinks and `..` are
    /// resolved before the containment check.
    pub async fn open(
        &self,
        path: &Path,
        name: Option<String>,
    ) -> Result<SourceFile, SourceError> {
        let requested = self.root.join(path);
        let resolved = tokio::fs::canonicalize(&requested)
            .await
            .map_err(|_| SourceError::NotFound)?;
        if !resolved.starts_with(&self.root) {
            return Err(SourceError::OutsideRoot);
        }

        let name = name.or_else(|| {
            requested
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        });
        SourceFile::open(&resolved, name)
            .await
            .map_err(|_| SourceError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_inline_read_shares_bytes() {
        let file = SourceFile::inline("a.mp3", b"hello".to_vec());
        assert_eq!(file.size_bytes, 5);

        let first = file.content.read().await.unwrap();
        let second = file.content.read().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*first, b"hello");
    }

    #[tokio::test]
    async fn test_open_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("track.flac");
        tokio::fs::write(&path, b"fLaC").await.unwrap();

        let file = SourceFile::open(&path, None).await.unwrap();
        assert_eq!(file.name, "track.flac");
        assert_eq!(file.size_bytes, 4);
        assert_eq!(&*file.content.read().await.unwrap(), b"fLaC");

        let renamed = SourceFile::open(&path, Some("other.flac".into()))
            .await
            .unwrap();
        assert_eq!(renamed.name, "other.flac");
    }

    #[tokio::test]
    async fn test_open_rejects_directories_and_missing_files() {
        let dir = TempDir::new().unwrap();
        assert!(SourceFile::open(dir.path(), None).await.is_err());
        assert!(SourceFile::open(&dir.path().join("missing.wav"), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_path_read_error_surfaces() {
        let file = SourceFile::from_path("gone.wav", "/nonexistent/convertino/gone.wav", 10);
        assert!(file.content.read().await.is_err());
    }

    #[tokio::test]
    async fn test_source_root_opens_files_inside() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("music")).unwrap();
        std::fs::write(dir.path().join("music/song.mp3"), b"ID3").unwrap();
        let root = SourceRoot::new(dir.path()).unwrap();

        let absolute = root
            .open(&dir.path().join("music/song.mp3"), None)
            .await
            .unwrap();
        assert_eq!(absolute.name, "song.mp3");
        assert_eq!(absolute.size_bytes, 3);

        let relative = root
            .open(Path::new("music/song.mp3"), Some("renamed.mp3".into()))
            .await
            .unwrap();
        assert_eq!(relative.name, "renamed.mp3");
    }

    #[tokio::test]
    async fn test_source_root_refuses_paths_outside() {
        let outside = TempDir::new().unwrap();
        let secret = outside.path().join("private.png");
        std::fs::write(&secret, b"HOST-SECRET-BYTES").unwrap();

        let dir = TempDir::new().unwrap();
        let root = SourceRoot::new(dir.path()).unwrap();

        let err = root.open(&secret, None).await.unwrap_err();
        assert!(matches!(err, SourceError::OutsideRoot));

        let escape = Path::new("..")
            .join(outside.path().file_name().unwrap())
            .join("private.png");
        let err = root.open(&escape, None).await.unwrap_err();
        assert!(matches!(err, SourceError::OutsideRoot));

        let err = root.open(Path::new("missing.png"), None).await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound));
        // Same message either way
        assert_eq!(
            SourceError::OutsideRoot.to_string(),
            SourceError::NotFound.to_string()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_source_root_refuses_symlink_escape() {
        let outside = TempDir::new().unwrap();
        let secret = outside.path().join("private.wav");
        std::fs::write(&secret, b"RIFF").unwrap();

        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(&secret, dir.path().join("link.wav")).unwrap();
        let root = SourceRoot::new(dir.path()).unwrap();

        let err = root.open(Path::new("link.wav"), None).await.unwrap_err();
        assert!(matches!(err, SourceError::OutsideRoot));
    }

    #[test]
    fn test_source_root_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(SourceRoot::new(&file).is_err());
        assert!(SourceRoot::new(dir.path().join("missing")).is_err());
    }
}
