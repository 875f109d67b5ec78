//! 工件存储 - 基础设施层
//!
//! 按文章 ID 读取扫描图片的原始字节

use async_trait::async_trait;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use crate::error::ArtifactError;
use crate::models::ArticleId;

/// 工件存储
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// 读取文章对应的图片字节，文件不存在时返回 `ArtifactError::NotFound`
    async fn read(&self, id: &ArticleId) -> Result<Vec<u8>, ArtifactError>;
}

const ARTIFACT_SUBDIR: &str = "tiff";
const ARTIFACT_EXTENSION: &str = "tiff";

/// 文件系统工件存储：`<root>/tiff/<id>.tiff`
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 计算文章对应的图片路径
    ///
    /// ID 只能是单个文件名片段，不允许路径分隔符或 `..`
    pub fn path_for(&self, id: &ArticleId) -> Result<PathBuf, ArtifactError> {
        let raw = id.as_str();
        if raw.is_empty() || raw == "." || raw.contains("..") || raw.contains(['/', '\\', '\0']) {
            return Err(ArtifactError::InvalidId { id: raw.to_string() });
        }

        Ok(self
            .root
            .join(ARTIFACT_SUBDIR)
            .join(format!("{}.{}", raw, ARTIFACT_EXTENSION)))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn read(&self, id: &ArticleId) -> Result<Vec<u8>, ArtifactError> {
        let path = self.path_for(id)?;
        debug!("读取工件: {}", path.display());

        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == IoErrorKind::NotFound => Err(ArtifactError::NotFound { path }),
            Err(source) => Err(ArtifactError::ReadFailed { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("tiff")).unwrap();
        std::fs::write(dir.path().join("tiff").join("42.tiff"), b"II*\0data").unwrap();

        let store = FsArtifactStore::new(dir.path());
        let bytes = store.read(&ArticleId::new("42")).await.unwrap();
        assert_eq!(bytes, b"II*\0data");
    }

    #[tokio::test]
    async fn test_missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());

        let err = store.read(&ArticleId::new("missing-id")).await.unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { .. }));
        assert_eq!(err.kind(), crate::models::ErrorKind::ArtifactNotFound);
    }

    #[test]
    fn test_path_traversal_rejected() {
        let store = FsArtifactStore::new("/data");
        assert!(store.path_for(&ArticleId::new("../etc/passwd")).is_err());
        assert!(store.path_for(&ArticleId::new("a/b")).is_err());
        assert!(store.path_for(&ArticleId::new("")).is_err());
        assert_eq!(
            store.path_for(&ArticleId::new("2024-001")).unwrap(),
            PathBuf::from("/data/tiff/2024-001.tiff")
        );
    }

    #[test]
    fn test_layout_is_tiff_under_root() {
        let store = FsArtifactStore::new("/srv/articles");
        assert_eq!(
            store.path_for(&ArticleId::new("7")).unwrap(),
            PathBuf::from("/srv/articles/tiff/7.tiff")
        );
    }
}
