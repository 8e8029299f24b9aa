use docx_rs::{DocumentChild, ParagraphChild, RunChild};

use crate::extraction::{ExtractError, ResumeFormat, TextExtractor};

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn format(&self) -> ResumeFormat {
        ResumeFormat::Pdf
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Corrupt {
            format: ResumeFormat::Pdf,
            message: e.to_string(),
        })
    }
}

/// Reads body paragraphs of a Word document, one line per paragraph.
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn format(&self) -> ResumeFormat {
        ResumeFormat::Docx
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Corrupt {
            format: ResumeFormat::Docx,
            message: e.to_string(),
        })?;

        let mut text = String::new();
        for child in &docx.document.children {
            if let DocumentChild::Paragraph(paragraph) = child {
                for part in &paragraph.children {
                    if let ParagraphChild::Run(run) = part {
                        for piece in &run.children {
                            if let RunChild::Text(t) = piece {
                                text.push_str(&t.text);
                            }
                        }
                    }
                }
                text.push('\n');
            }
        }
        Ok(text)
    }
}
