use crate::classifier::{matched_keywords, KEYWORDS_VERSION, MEDICAL_KEYWORD_THRESHOLD};
use crate::doc_processor::{self, format_file_size, Document};
use crate::session::ChatSession;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub name: String,
    pub pages: usize,
    pub size: String,
    pub is_medical: bool,
    pub matched: Vec<&'static str>,
    pub threshold: usize,
    pub keywords_version: u32,
}

/// Extract `path` and make it the session's active document.
///
/// Returns the user-facing notice for the load.
pub fn load_document(session: &mut ChatSession, path: &Path) -> Result<String, String> {
    let document = doc_processor::load_pdf(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to process PDF");
        e.to_string()
    })?;
    let summary = describe(&document);
    tracing::debug!(matched = ?matched_keywords(&document.text), "classifier keyword hits");
    let is_medical = session.load_document(document.clone());

    Ok(if is_medical {
        format!(
            "Medical report \"{}\" processed successfully ({} • Medical Report). \
             Ask questions about your blood test results!",
            document.name, summary
        )
    } else {
        format!("\"{}\" processed successfully ({})", document.name, summary)
    })
}

pub fn clear_document(session: &mut ChatSession) -> String {
    match session.document().map(|d| d.name.clone()) {
        Some(name) => {
            session.clear_document();
            format!("Cleared \"{}\"", name)
        }
        None => "No document loaded".to_string(),
    }
}

pub fn classify_file(path: &Path) -> Result<ClassifyReport, String> {
    let document = doc_processor::load_pdf(path).map_err(|e| e.to_string())?;
    let matched = matched_keywords(&document.text);
    Ok(ClassifyReport {
        is_medical: matched.len() >= MEDICAL_KEYWORD_THRESHOLD,
        name: document.name,
        pages: document.page_count,
        size: format_file_size(document.size),
        matched,
        threshold: MEDICAL_KEYWORD_THRESHOLD,
        keywords_version: KEYWORDS_VERSION,
    })
}

fn describe(document: &Document) -> String {
    let pages = if document.page_count == 1 { "page" } else { "pages" };
    format!(
        "{} • {} {}",
        format_file_size(document.size),
        document.page_count,
        pages
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_pluralizes_pages() {
        let mut doc = Document {
            id: "1".into(),
            name: "a.pdf".into(),
            size: 2048,
            page_count: 1,
            text: String::new(),
        };
        assert_eq!(describe(&doc), "2.0 KB • 1 page");
        doc.page_count = 3;
        assert_eq!(describe(&doc), "2.0 KB • 3 pages");
    }

    #[test]
    fn test_load_failure_leaves_session_untouched() {
        let mut session = ChatSession::new();
        let err = load_document(&mut session, Path::new("notes.docx")).unwrap_err();
        assert!(err.contains("Please upload a PDF file"));
        assert!(session.document().is_none());
    }

    #[test]
    fn test_clear_without_document() {
        let mut session = ChatSession::new();
        assert_eq!(clear_document(&mut session), "No document loaded");
    }
}
