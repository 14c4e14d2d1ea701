//! Multi-format text extraction
//!
//! Dispatch is by the extension of the declared filename. Each extractor
//! decodes one binary format into plain text plus a source stamp; per-file
//! failures surface as [`Error`] values so a batch upload can continue past
//! a broken file.

use calamine::Reader;
use std::io::Read;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{SourceInfo, SourceKind};

/// Text emitted when a PPTX cannot be decoded. Presentation extraction is
/// best-effort and never fails the ingest.
pub const PPTX_FALLBACK_TEXT: &str = "Unable to extract";

/// Extracted plain text plus the source stamp for its chunks
#[derive(Debug, Clone)]
pub struct Extraction {
    pub text: String,
    pub info: SourceInfo,
}

/// Extract plain text from an uploaded file based on its extension
pub fn extract(name: &str, data: &[u8]) -> Result<Extraction> {
    let extension = name.rsplit('.').next().unwrap_or("").to_lowercase();
    let kind = SourceKind::from_extension(&extension)
        .ok_or_else(|| Error::UnsupportedFormat(extension.clone()))?;

    let text = match kind {
        SourceKind::Pdf => extract_pdf(name, data)?,
        SourceKind::Docx => extract_docx(name, data)?,
        SourceKind::Pptx => extract_pptx(data),
        SourceKind::Spreadsheet => extract_sheets(name, data)?,
        SourceKind::Text | SourceKind::Markdown | SourceKind::Csv => {
            String::from_utf8_lossy(data).into_owned()
        }
        // URLs enter through ingestion::web, never through file dispatch
        SourceKind::Webpage => return Err(Error::UnsupportedFormat(extension)),
    };

    Ok(Extraction {
        text,
        info: SourceInfo::file(name, kind),
    })
}

/// Extract PDF text on a helper thread with a receive timeout, so a
/// pathological font table cannot hang the ingest path.
fn extract_pdf(name: &str, data: &[u8]) -> Result<String> {
    let data = data.to_vec();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let _ = tx.send(pdf_extract::extract_text_from_mem(&data));
    });

    let content = match rx.recv_timeout(Duration::from_secs(60)) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Err(Error::extract(name, e.to_string())),
        Err(_) => {
            tracing::error!("PDF extraction timed out after 60s for '{}'", name);
            return Err(Error::extract(name, "extraction timed out"));
        }
    };

    // Drop null bytes and blank lines left behind by the extractor
    let content = content
        .replace('\0', "")
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if content.is_empty() {
        return Err(Error::extract(name, "no text content could be extracted"));
    }

    Ok(content)
}

/// Extract concatenated paragraph text from a DOCX document
fn extract_docx(name: &str, data: &[u8]) -> Result<String> {
    let doc = docx_rs::read_docx(data).map_err(|e| Error::extract(name, e.to_string()))?;

    let mut content = String::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(text) = child {
                            content.push_str(&text.text);
                        }
                    }
                }
            }
            content.push('\n');
        }
    }

    Ok(content)
}

/// Extract slide text from a PPTX archive. Best effort: any structural
/// error yields [`PPTX_FALLBACK_TEXT`] instead of failing the ingest.
fn extract_pptx(data: &[u8]) -> String {
    match try_extract_pptx(data) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("PPTX extraction failed: {}", e);
            PPTX_FALLBACK_TEXT.to_string()
        }
    }
}

fn try_extract_pptx(data: &[u8]) -> Result<String> {
    let cursor = std::io::Cursor::new(data);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| Error::extract("presentation.pptx", e.to_string()))?;

    // Slides live at ppt/slides/slideN.xml; sort them by slide number
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();

    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(0)
    });

    let mut content = String::new();
    for (slide_number, slide_name) in slide_names.iter().enumerate() {
        let mut file = archive
            .by_name(slide_name)
            .map_err(|e| Error::extract(slide_name, e.to_string()))?;
        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| Error::extract(slide_name, e.to_string()))?;

        let slide_text = slide_text_from_xml(&xml);
        if !slide_text.is_empty() {
            content.push_str(&format!("Slide {}:\n{}\n\n", slide_number + 1, slide_text));
        }
    }

    Ok(content.trim_end().to_string())
}

/// Pull text runs (`<a:t>` elements) out of slide XML
fn slide_text_from_xml(xml: &str) -> String {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parts = Vec::new();
    let mut in_text_element = false;
    let mut current = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_element = true;
                    current.clear();
                }
            }
            Ok(Event::Text(e)) => {
                if in_text_element {
                    if let Ok(text) = e.unescape() {
                        current.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"t" && in_text_element {
                    if !current.trim().is_empty() {
                        parts.push(current.trim().to_string());
                    }
                    in_text_element = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    parts.join(" ")
}

/// Extract spreadsheet text: a header per sheet followed by CSV rows
fn extract_sheets(name: &str, data: &[u8]) -> Result<String> {
    let cursor = std::io::Cursor::new(data);
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| Error::extract(name, e.to_string()))?;

    let mut content = String::new();

    for sheet_name in workbook.sheet_names().to_vec() {
        let range = match workbook.worksheet_range(&sheet_name) {
            Ok(range) => range,
            Err(e) => {
                tracing::warn!("skipping sheet '{}' in '{}': {}", sheet_name, name, e);
                continue;
            }
        };

        content.push_str(&format!("\n=== Sheet: {} ===\n", sheet_name));

        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        for row in range.rows() {
            let record: Vec<String> = row.iter().map(cell_to_string).collect();
            writer
                .write_record(&record)
                .map_err(|e| Error::extract(name, e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::extract(name, e.to_string()))?;
        content.push_str(&String::from_utf8_lossy(&bytes));
    }

    Ok(content)
}

fn cell_to_string(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::Empty => String::new(),
        calamine::Data::String(s) => s.clone(),
        calamine::Data::Float(f) => f.to_string(),
        calamine::Data::Int(i) => i.to_string(),
        calamine::Data::Bool(b) => b.to_string(),
        calamine::Data::DateTime(dt) => dt.to_string(),
        other => other.to_string(),
    }
}
