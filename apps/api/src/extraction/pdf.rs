use super::{DocumentFormat, ExtractError};

/// Concatenates the text of every page in page order. Pages without extractable
/// text (scanned images, blank pages) contribute an empty string.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
        ExtractError::Failed {
            format: DocumentFormat::Pdf,
            message: e.to_string(),
        }
    })?;

    Ok(join_pages(pages))
}

fn join_pages(pages: Vec<String>) -> String {
    pages.concat()
}
