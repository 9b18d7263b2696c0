//! Input resolution: turn a user-supplied path or URL into a [`SelectedDocument`].
//!
//! Local files are checked for existence and read permission up front but
//! read lazily at encode time. URLs are downloaded into memory, up to the
//! document size limit; their MIME type comes from the `Content-Type` header,
//! falling back to the URL's file extension when the server only says
//! `application/octet-stream`.

use crate::document::SelectedDocument;
use crate::error::DocPromptError;
use reqwest::header::CONTENT_TYPE;
use std::path::PathBuf;
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a selectable document.
///
/// Downloads larger than `max_bytes` are abandoned as soon as the declared
/// `Content-Length` or the received body passes the limit.
pub async fn resolve_input(
    input: &str,
    download_timeout_secs: u64,
    max_bytes: u64,
) -> Result<SelectedDocument, DocPromptError> {
    if is_url(input) {
        download_url(input, download_timeout_secs, max_bytes).await
    } else {
        resolve_local(input)
    }
}

/// Resolve a local file path, validating existence and read permission.
fn resolve_local(path_str: &str) -> Result<SelectedDocument, DocPromptError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(DocPromptError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DocPromptError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(DocPromptError::FileNotFound { path });
        }
    }

    let doc = SelectedDocument::from_path(&path);
    debug!("Resolved local document: {} ({})", path.display(), doc.mime_type());
    Ok(doc)
}

/// Download a URL into memory.
async fn download_url(
    url: &str,
    timeout_secs: u64,
    max_bytes: u64,
) -> Result<SelectedDocument, DocPromptError> {
    info!("Downloading document from: {}", url);

    let transport_error = |e: reqwest::Error| {
        if e.is_timeout() {
            DocPromptError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocPromptError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocPromptError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let mut response = client.get(url).send().await.map_err(transport_error)?;

    if !response.status().is_success() {
        return Err(DocPromptError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);
    let declared = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(mime_essence);

    check_download_size(&filename, response.content_length(), max_bytes)?;

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
        check_download_size(&filename, Some((bytes.len() + chunk.len()) as u64), max_bytes)?;
        bytes.extend_from_slice(&chunk);
    }

    let mime_type = pick_mime(declared.as_deref(), &filename);
    info!("Downloaded {} bytes ({})", bytes.len(), mime_type);

    Ok(SelectedDocument::from_bytes(filename, mime_type, bytes))
}

/// Reject a download whose declared or received length passes `max_bytes`.
fn check_download_size(name: &str, len: Option<u64>, max_bytes: u64) -> Result<(), DocPromptError> {
    match len {
        Some(len) if len > max_bytes => Err(DocPromptError::Read {
            name: name.to_string(),
            detail: format!("{len} bytes exceeds the {max_bytes}-byte limit"),
        }),
        _ => Ok(()),
    }
}

/// Strip parameters from a `Content-Type` value: `"image/png; q=1"` → `"image/png"`.
fn mime_essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Prefer the server's declared type unless it is missing or generic.
fn pick_mime(declared: Option<&str>, filename: &str) -> String {
    match declared {
        Some(m) if !m.is_empty() && m != "application/octet-stream" => m.to_string(),
        _ => mime_guess::from_path(filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{PDF_MIME, SPREADSHEET_MIME};

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url() {
        assert_eq!(extract_filename("https://x.test/a/b/report.xlsx?dl=1"), "report.xlsx");
        assert_eq!(extract_filename("https://x.test/a/b/"), "downloaded");
        assert_eq!(extract_filename("https://x.test/pdf/1706"), "downloaded");
    }

    #[test]
    fn declared_mime_wins_unless_generic() {
        assert_eq!(pick_mime(Some("application/pdf"), "x.bin"), PDF_MIME);
        assert_eq!(
            pick_mime(Some("application/octet-stream"), "book.xlsx"),
            SPREADSHEET_MIME
        );
        assert_eq!(pick_mime(None, "photo.jpg"), "image/jpeg");
        assert_eq!(pick_mime(Some(""), "downloaded"), "application/octet-stream");
    }

    #[test]
    fn content_type_parameters_are_dropped() {
        assert_eq!(mime_essence("Application/PDF; charset=binary"), "application/pdf");
    }

    #[test]
    fn download_size_limit() {
        assert!(check_download_size("a.pdf", None, 10).is_ok());
        assert!(check_download_size("a.pdf", Some(10), 10).is_ok());
        let err = check_download_size("a.pdf", Some(11), 10).unwrap_err();
        assert!(matches!(err, DocPromptError::Read { ref name, .. } if name == "a.pdf"));
    }

    /// Serve one canned HTTP response on a loopback port; returns the URL.
    async fn serve_once(head: &'static str, body: &'static [u8]) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/files/report.pdf")
    }

    #[tokio::test]
    async fn declared_length_over_limit_is_rejected_before_the_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: 1048576\r\nConnection: close\r\n\r\n",
            b"%PDF-",
        )
        .await;

        let err = resolve_input(&url, 5, 1024).await.unwrap_err();
        assert!(
            matches!(err, DocPromptError::Read { ref name, ref detail }
                if name == "report.pdf" && detail.contains("1048576")),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn undeclared_length_is_capped_while_streaming() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nConnection: close\r\n\r\n",
            b"%PDF-1.7 this body is longer than sixteen bytes",
        )
        .await;

        let err = resolve_input(&url, 5, 16).await.unwrap_err();
        assert!(matches!(err, DocPromptError::Read { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn download_within_limit_keeps_bytes_and_type() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: 8\r\nConnection: close\r\n\r\n",
            b"%PDF-1.7",
        )
        .await;

        let doc = resolve_input(&url, 5, 1024).await.unwrap();
        assert_eq!(doc.name(), "report.pdf");
        assert_eq!(doc.mime_type(), PDF_MIME);
        assert_eq!(&*doc.read_bytes(1024).await.unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn missing_local_file() {
        let err = resolve_local("/definitely/not/a/real/file.pdf").unwrap_err();
        assert!(matches!(err, DocPromptError::FileNotFound { .. }));
    }

    #[test]
    fn existing_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let doc = resolve_local(path.to_str().unwrap()).unwrap();
        assert_eq!(doc.name(), "scan.png");
        assert_eq!(doc.mime_type(), "image/png");
    }
}
