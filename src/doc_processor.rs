use std::fs;
use std::path::Path;
use thiserror::Error;

/// Largest PDF accepted for extraction.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// A PDF after text extraction. Replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub page_count: usize,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Please upload a PDF file (got .{0})")]
    UnsupportedType(String),
    #[error("File is too large ({}). Please upload a PDF smaller than 10MB", format_file_size(*.0))]
    TooLarge(u64),
    #[error("PDF parse error: {0}")]
    Pdf(String),
}

/// Validate and extract a PDF into a fresh [`Document`].
pub fn load_pdf(path: &Path) -> Result<Document, ExtractionError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext != "pdf" {
        return Err(ExtractionError::UnsupportedType(ext));
    }

    let size = fs::metadata(path)?.len();
    if size > MAX_FILE_SIZE {
        return Err(ExtractionError::TooLarge(size));
    }

    let bytes = fs::read(path)?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let document = Document {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        size,
        page_count: pages.len(),
        text: join_pages(&pages),
    };
    tracing::info!(
        id = %document.id,
        name = %document.name,
        pages = document.page_count,
        chars = document.text.len(),
        "extracted PDF text"
    );
    Ok(document)
}

/// Pages separated by a blank line, surrounding whitespace trimmed.
fn join_pages(pages: &[String]) -> String {
    let mut text = String::new();
    for page in pages {
        text.push_str(page);
        text.push_str("\n\n");
    }
    text.trim().to_string()
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_join_pages_trims() {
        let pages = vec!["  first page".to_string(), "second page \n".to_string()];
        assert_eq!(join_pages(&pages), "first page\n\nsecond page");
        assert_eq!(join_pages(&[]), "");
    }

    #[test]
    fn test_rejects_non_pdf() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "plain text").unwrap();
        let err = load_pdf(file.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(ext) if ext == "txt"));
    }

    #[test]
    fn test_rejects_oversized_pdf() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.as_file().set_len(MAX_FILE_SIZE + 1).unwrap();
        let err = load_pdf(file.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::TooLarge(size) if size == MAX_FILE_SIZE + 1));
    }

    #[test]
    fn test_garbage_pdf_is_a_parse_error() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"definitely not a pdf").unwrap();
        let err = load_pdf(file.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_pdf(Path::new("/nonexistent/report.pdf")).unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }
}
