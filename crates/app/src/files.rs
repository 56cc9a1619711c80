//! Reading attachments from disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shared::session::FileAttachment;

/// MIME type guessed from the file extension
pub fn mime_for_path(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

/// Expand a leading `~/` to the home directory
pub fn expand_user_path(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(stripped);
        }
    }
    path.to_path_buf()
}

pub async fn load_attachment(path: &Path) -> Result<FileAttachment> {
    let path = expand_user_path(path);
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(FileAttachment {
        name,
        mime_type: mime_for_path(&path),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_by_extension() {
        assert_eq!(mime_for_path(Path::new("a/B.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("notes.md")), "text/markdown");
        assert_eq!(mime_for_path(Path::new("todo.txt")), "text/plain");
        assert_eq!(mime_for_path(Path::new("chart.svg")), "image/svg+xml");
        assert_eq!(mime_for_path(Path::new("scan.bmp")), "image/bmp");
        assert_eq!(mime_for_path(Path::new("photo.tiff")), "image/tiff");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_load_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        std::fs::write(&path, "milk\neggs").unwrap();

        let file = load_attachment(&path).await.unwrap();
        assert_eq!(file.name, "list.txt");
        assert_eq!(file.mime_type, "text/plain");
        assert!(file.is_text_document());
        assert_eq!(file.bytes, b"milk\neggs");

        assert!(load_attachment(&dir.path().join("missing.png")).await.is_err());
    }
}
