//! File validation against the MIME allow-list.
//!
//! Accepted: any `image/*`, `application/pdf`, and `.xlsx` workbooks.
//! Everything else is rejected before it can reach the pipeline.

use crate::document::{DocumentKind, SelectedDocument, PDF_MIME, SPREADSHEET_MIME};
use crate::error::DocPromptError;

/// Classify a declared MIME type, or `None` when it is not accepted.
///
/// Matching is exact (no case folding, no parameter stripping), mirroring the
/// browser `File.type` values the allow-list was written against.
pub fn classify(mime_type: &str) -> Option<DocumentKind> {
    if mime_type.starts_with("image/") {
        Some(DocumentKind::Image)
    } else if mime_type == PDF_MIME {
        Some(DocumentKind::Pdf)
    } else if mime_type == SPREADSHEET_MIME {
        Some(DocumentKind::Spreadsheet)
    } else {
        None
    }
}

/// Validate a document's declared MIME type.
pub fn validate(doc: &SelectedDocument) -> Result<DocumentKind, DocPromptError> {
    classify(doc.mime_type()).ok_or_else(|| DocPromptError::UnsupportedFileType {
        name: doc.name().to_string(),
        mime_type: doc.mime_type().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allow_list() {
        assert_eq!(classify("application/pdf"), Some(DocumentKind::Pdf));
        assert_eq!(classify("image/png"), Some(DocumentKind::Image));
        assert_eq!(classify("image/jpeg"), Some(DocumentKind::Image));
        assert_eq!(classify("image/webp"), Some(DocumentKind::Image));
        assert_eq!(classify(SPREADSHEET_MIME), Some(DocumentKind::Spreadsheet));
    }

    #[test]
    fn rejects_everything_else() {
        for mime in [
            "",
            "text/plain",
            "text/csv",
            "application/msword",
            "application/vnd.ms-excel",
            "application/octet-stream",
            "application/pdf; charset=binary",
            "Application/PDF",
            "video/mp4",
            "imagex/png",
        ] {
            assert_eq!(classify(mime), None, "{mime} should be rejected");
        }
    }

    #[test]
    fn validate_reports_name_and_type() {
        let doc = SelectedDocument::from_bytes("notes.txt", "text/plain", Vec::new());
        match validate(&doc) {
            Err(DocPromptError::UnsupportedFileType { name, mime_type }) => {
                assert_eq!(name, "notes.txt");
                assert_eq!(mime_type, "text/plain");
            }
            other => panic!("expected UnsupportedFileType, got {other:?}"),
        }
    }
}
