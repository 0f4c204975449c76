//! Evidence images attached to return/refund requests, kept on local disk.

use std::path::{Path, PathBuf};

use crate::{GroceryError, Result};

const SUBDIR: &str = "return-refund";
const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone)]
pub struct EvidenceStore {
    root: PathBuf,
}

impl EvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Relative path (as stored on the request) for an upload of `file_name`.
    pub fn path_for(&self, order_id: &str, millis: i64, file_name: &str) -> Result<String> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| GroceryError::validation("Only image files are allowed"))?;
        Ok(format!("{SUBDIR}/return-{order_id}-{millis}.{ext}"))
    }

    pub async fn write(&self, relative: &str, bytes: &[u8]) -> Result<()> {
        let full = self.root.join(relative);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(storage)?;
        }
        tokio::fs::write(&full, bytes).await.map_err(storage)
    }

    /// Best-effort cleanup; failures are only logged.
    pub async fn remove(&self, relative: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
            tracing::warn!(path = relative, error = %e, "could not remove evidence file");
        }
    }
}

fn storage(e: std::io::Error) -> GroceryError {
    GroceryError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_keeps_image_extension() {
        let store = EvidenceStore::new("uploads");
        assert_eq!(
            store.path_for("ORD-20240502-0001", 1714640000000, "Photo.JPG").unwrap(),
            "return-refund/return-ORD-20240502-0001-1714640000000.jpg"
        );
        assert!(store.path_for("ORD-20240502-0001", 1, "notes.pdf").is_err());
        assert!(store.path_for("ORD-20240502-0001", 1, "noext").is_err());
    }

    #[tokio::test]
    async fn test_write_and_remove() {
        let root = std::env::temp_dir().join(format!("eazzymart-evidence-{}", uuid::Uuid::now_v7()));
        let store = EvidenceStore::new(&root);
        store.write("return-refund/x.png", b"png").await.unwrap();
        assert!(root.join("return-refund/x.png").exists());
        store.remove("return-refund/x.png").await;
        assert!(!root.join("return-refund/x.png").exists());
        let _ = std::fs::remove_dir_all(&root);
    }
}
