//! Content sniffing
//!
//! Classifies a file by its leading bytes rather than its name, then checks
//! the result against the extension whitelist.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use mime_guess::Mime;

/// Bytes read from the start of a file for classification
const SNIFF_LEN: usize = 8192;

/// Application subtypes that are plain text on disk
const TEXTUAL_APPLICATION_SUBTYPES: &[&str] = &[
    "javascript",
    "ecmascript",
    "json",
    "xml",
    "x-sh",
    "x-shellscript",
    "x-python",
    "x-httpd-php",
    "sql",
    "toml",
    "x-yaml",
    "yaml",
];

/// Content type determined from file bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffedType {
    mime: String,
    textual: bool,
}

impl SniffedType {
    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn is_textual(&self) -> bool {
        self.textual
    }

    /// Whether `ext` is a conventional extension for this content.
    ///
    /// Binary formats map to the extensions registered for their MIME type.
    /// Text content is compatible with any extension registered as a text
    /// format, and with extensions no registry knows about.
    pub fn has_extension(&self, ext: &str) -> bool {
        if self.textual {
            let guess = mime_guess::from_ext(ext);
            guess.is_empty() || guess.iter().any(|mime| is_textual_mime(&mime))
        } else {
            mime_guess::get_mime_extensions_str(&self.mime)
                .is_some_and(|exts| exts.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        }
    }

    /// Whether any whitelisted extension is conventional for this content
    pub fn matches_whitelist(&self, allowed: &[String]) -> bool {
        allowed.iter().any(|ext| self.has_extension(ext))
    }
}

fn is_textual_mime(mime: &Mime) -> bool {
    match mime.type_().as_str() {
        "text" => true,
        "application" => {
            TEXTUAL_APPLICATION_SUBTYPES.contains(&mime.subtype().as_str())
                || mime
                    .suffix()
                    .is_some_and(|suffix| matches!(suffix.as_str(), "xml" | "json"))
        }
        _ => false,
    }
}

fn looks_like_text(bytes: &[u8]) -> bool {
    if bytes.contains(&0) {
        return false;
    }
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        // A multi-byte character cut off by the read window is still text
        Err(e) => e.error_len().is_none(),
    }
}

/// Classify the bytes of a file
pub fn sniff_bytes(bytes: &[u8]) -> SniffedType {
    if let Some(kind) = infer::get(bytes) {
        let mime = kind.mime_type().to_string();
        let textual = mime
            .parse::<Mime>()
            .map(|parsed| is_textual_mime(&parsed))
            .unwrap_or(false);
        return SniffedType { mime, textual };
    }

    if looks_like_text(bytes) {
        SniffedType {
            mime: "text/plain".to_string(),
            textual: true,
        }
    } else {
        SniffedType {
            mime: "application/octet-stream".to_string(),
            textual: false,
        }
    }
}

/// Read the head of the file at `path` and classify it
pub fn sniff(path: &Path) -> io::Result<SniffedType> {
    let mut buffer = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut buffer)?;
    Ok(sniff_bytes(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    const EXE_HEADER: &[u8] = &[b'M', b'Z', 0x90, 0x00, 0x03, 0x00, 0x00, 0x00];

    fn allow(exts: &[&str]) -> Vec<String> {
        exts.iter().map(|ext| ext.to_string()).collect()
    }

    #[test]
    fn test_png_is_detected_from_bytes() {
        let sniffed = sniff_bytes(PNG_HEADER);
        assert_eq!(sniffed.mime(), "image/png");
        assert!(!sniffed.is_textual());
        assert!(sniffed.matches_whitelist(&allow(&["png", "py"])));
        assert!(!sniffed.matches_whitelist(&allow(&["py", "txt"])));
    }

    #[test]
    fn test_executable_renamed_to_allowed_extension_is_caught() {
        let sniffed = sniff_bytes(EXE_HEADER);
        assert!(!sniffed.is_textual());
        assert!(!sniffed.matches_whitelist(&allow(&["py", "png", "txt"])));
    }

    #[test]
    fn test_source_text_matches_text_extensions() {
        let sniffed = sniff_bytes(b"print('hello')\n");
        assert_eq!(sniffed.mime(), "text/plain");
        assert!(sniffed.is_textual());
        assert!(sniffed.matches_whitelist(&allow(&["py"])));
        assert!(sniffed.matches_whitelist(&allow(&["txt", "png"])));
        assert!(!sniffed.matches_whitelist(&allow(&["png", "zip"])));
    }

    #[test]
    fn test_binary_noise_is_octet_stream() {
        let sniffed = sniff_bytes(&[0x00, 0xFF, 0x13, 0x37, 0x00]);
        assert_eq!(sniffed.mime(), "application/octet-stream");
        assert!(!sniffed.matches_whitelist(&allow(&["txt"])));
    }

    #[test]
    fn test_truncated_utf8_is_still_text() {
        assert!(looks_like_text("caf\u{e9}".as_bytes()));
        assert!(looks_like_text(&"caf\u{e9}".as_bytes()[..4]));
        assert!(!looks_like_text(&[0xFF, 0xFE, 0x41]));
    }

    #[test]
    fn test_sniff_reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.txt");
        std::fs::write(&path, PNG_HEADER).unwrap();
        assert_eq!(sniff(&path).unwrap().mime(), "image/png");
    }
}
