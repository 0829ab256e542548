//! Zip archive construction.

use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::PackagingError;

/// Bundle files into a zip archive at `dest`.
///
/// Each entry is (name inside the archive, path on disk). Runs on the
/// blocking pool since the zip writer is synchronous.
pub async fn write_archive(
    entries: Vec<(String, PathBuf)>,
    dest: PathBuf,
) -> Result<(), PackagingError> {
    tokio::task::spawn_blocking(move || write_archive_blocking(&entries, &dest))
        .await
        .map_err(|e| PackagingError::Archive(e.to_string()))?
}

fn write_archive_blocking(entries: &[(String, PathBuf)], dest: &Path) -> Result<(), PackagingError> {
    let file = std::fs::File::create(dest)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in entries {
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| PackagingError::Archive(e.to_string()))?;
        let mut src = std::fs::File::open(path)?;
        std::io::copy(&mut src, &mut writer)?;
    }

    writer
        .finish()
        .map_err(|e| PackagingError::Archive(e.to_string()))?
        .flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[tokio::test]
    async fn test_write_archive_bundles_files() {
        let temp = tempfile::tempdir().unwrap();
        tokio::fs::write(temp.path().join("vocals.mp3"), b"vocal bytes")
            .await
            .unwrap();
        tokio::fs::write(temp.path().join("drums.mp3"), b"drum bytes")
            .await
            .unwrap();

        let dest = temp.path().join("Stems_s1.zip");
        write_archive(
            vec![
                ("vocals.mp3".to_string(), temp.path().join("vocals.mp3")),
                ("drums.mp3".to_string(), temp.path().join("drums.mp3")),
            ],
            dest.clone(),
        )
        .await
        .unwrap();

        let file = std::fs::File::open(&dest).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        assert_eq!(zip.len(), 2);

        let mut entry = zip.by_name("vocals.mp3").unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"vocal bytes");
    }

    #[tokio::test]
    async fn test_write_archive_empty_entries() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("empty.zip");

        write_archive(Vec::new(), dest.clone()).await.unwrap();

        let file = std::fs::File::open(&dest).unwrap();
        let zip = zip::ZipArchive::new(file).unwrap();
        assert_eq!(zip.len(), 0);
    }

    #[tokio::test]
    async fn test_write_archive_missing_source_fails() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("bad.zip");

        let result = write_archive(
            vec![("ghost.mp3".to_string(), temp.path().join("ghost.mp3"))],
            dest,
        )
        .await;

        assert!(result.is_err());
    }
}
