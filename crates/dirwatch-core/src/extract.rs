//! Pluggable metadata extraction.

use std::path::Path;
use std::time::SystemTime;

use crate::error::ExtractionError;
use crate::record::{FileKind, FileMetadata};

/// Produces kind-specific metadata for a classified file.
///
/// Scanners call this once per file and treat an error as "skip this file".
/// Implementations run on scan worker threads and must be shareable.
pub trait MetadataExtractor: Send + Sync {
    /// Extract metadata for `path`, which was classified as `kind`.
    ///
    /// `created_time` is the modification time the scanner observed.
    fn extract(
        &self,
        kind: FileKind,
        path: &Path,
        created_time: SystemTime,
    ) -> Result<FileMetadata, ExtractionError>;
}

impl<F> MetadataExtractor for F
where
    F: Fn(FileKind, &Path, SystemTime) -> Result<FileMetadata, ExtractionError> + Send + Sync,
{
    fn extract(
        &self,
        kind: FileKind,
        path: &Path,
        created_time: SystemTime,
    ) -> Result<FileMetadata, ExtractionError> {
        self(kind, path, created_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ImageInfo;

    #[test]
    fn test_closure_extractor() {
        let extractor = |kind: FileKind, _path: &Path, _created: SystemTime| match kind {
            FileKind::Image => Ok(FileMetadata::Image(ImageInfo::new(1, 1))),
            other => Err(ExtractionError::Unsupported { kind: other }),
        };

        let meta = extractor
            .extract(FileKind::Image, Path::new("a.png"), SystemTime::now())
            .unwrap();
        assert_eq!(meta.kind(), FileKind::Image);
        assert!(
            extractor
                .extract(FileKind::Text, Path::new("a.txt"), SystemTime::now())
                .is_err()
        );
    }
}
