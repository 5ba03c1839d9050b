//! PDF and Word document extraction.

use crate::error::{PratError, Result};
use docx_rs::{DocumentChild, ParagraphChild, RunChild, TableCellContent, TableChild, TableRowChild};
use std::path::Path;
use tracing::debug;

/// Extract the text content of a PDF file.
pub fn extract_pdf(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "Extracting PDF");

    pdf_extract::extract_text(path)
        .map_err(|e| PratError::Extraction(format!("Cannot read PDF {}: {}", path.display(), e)))
}

/// Extract the text content of a Word document.
///
/// Paragraphs and table rows are collected in document order; empty
/// paragraphs are dropped.
pub fn extract_docx(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "Extracting Word document");

    let bytes = std::fs::read(path)
        .map_err(|e| PratError::Extraction(format!("Cannot read {}: {}", path.display(), e)))?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| {
        PratError::Extraction(format!("Not a readable .docx file {}: {}", path.display(), e))
    })?;

    let mut blocks: Vec<String> = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => {
                let text = paragraph_text(paragraph);
                if !text.trim().is_empty() {
                    blocks.push(text.trim().to_string());
                }
            }
            DocumentChild::Table(table) => collect_table(table, &mut blocks),
            _ => {}
        }
    }

    Ok(blocks.join("\n"))
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut out = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(text) = run_child {
                    out.push_str(&text.text);
                }
            }
        }
    }
    out
}

/// Flatten a table into one block per row, cells joined with spaces.
fn collect_table(table: &docx_rs::Table, blocks: &mut Vec<String>) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        let mut cells: Vec<String> = Vec::new();
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell;
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(paragraph) => {
                        let text = paragraph_text(paragraph);
                        if !text.trim().is_empty() {
                            cells.push(text.trim().to_string());
                        }
                    }
                    TableCellContent::Table(nested) => collect_table(nested, blocks),
                    _ => {}
                }
            }
        }
        if !cells.is_empty() {
            blocks.push(cells.join(" "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};

    #[test]
    fn test_docx_paragraphs_and_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");
        let file = std::fs::File::create(&path).unwrap();

        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Linux began in 1991.")))
            .add_paragraph(Paragraph::new())
            .add_table(Table::new(vec![TableRow::new(vec![TableCell::new()
                .add_paragraph(
                    Paragraph::new().add_run(Run::new().add_text("Kernel release history")),
                )])]))
            .build()
            .pack(file)
            .unwrap();

        let text = extract_docx(&path).unwrap();
        assert!(text.contains("Linux began in 1991."));
        assert!(text.contains("Kernel release history"));
    }

    #[test]
    fn test_docx_rejects_non_docx_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, "not a zip archive").unwrap();

        assert!(extract_docx(&path).is_err());
    }

    #[test]
    fn test_pdf_missing_file_is_extraction_error() {
        let err = extract_pdf(Path::new("/nonexistent/paper.pdf")).unwrap_err();
        assert!(matches!(err, PratError::Extraction(_)));
    }
}
