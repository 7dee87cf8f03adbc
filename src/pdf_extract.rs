// src/pdf_extract.rs

use crate::error::AcquisitionError;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Result of assessing a PDF's native text layer.
#[derive(Debug, PartialEq)]
pub enum PdfContent {
    /// The PDF carries a usable text layer.
    Text(String),
    /// Too little text came out: a scanned or image-only document. The short
    /// transcript is kept so it can still be reported if OCR fails.
    ScannedImage(String),
}

/// Count of non-whitespace characters in a transcript.
pub fn meaningful_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Decide whether a native transcript is real text or a scanned page.
pub fn assess_native_text(text: String, min_text_chars: usize) -> PdfContent {
    let meaningful = meaningful_chars(&text);
    if meaningful < min_text_chars {
        info!(
            chars = meaningful,
            threshold = min_text_chars,
            "Extracted text too short, treating as scanned"
        );
        PdfContent::ScannedImage(text)
    } else {
        info!(chars = meaningful, "Text extracted successfully");
        PdfContent::Text(text)
    }
}

/// Native PDF access used by the acquisition engine.
pub trait PdfTextSource: Send + Sync {
    /// Pull the embedded text layer out of the document.
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, AcquisitionError>;

    /// Raster images of the document's pages, in page order, encoded so an
    /// OCR engine can read them (JPEG or PNG).
    fn page_images(&self, pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>, AcquisitionError>;
}

/// `pdf-extract` for text, `lopdf` for the page structure.
pub struct NativePdf;

impl PdfTextSource for NativePdf {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, AcquisitionError> {
        // pdf-extract panics on some malformed font programs.
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| ::pdf_extract::extract_text_from_mem(pdf_bytes)));
        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(AcquisitionError::PdfParsing(e.to_string())),
            Err(_) => Err(AcquisitionError::PdfParsing(
                "pdf-extract panicked while reading the text layer".to_string(),
            )),
        }
    }

    fn page_images(&self, pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>, AcquisitionError> {
        let doc = Document::load_mem(pdf_bytes)
            .map_err(|e| AcquisitionError::PdfParsing(format!("Failed to parse PDF: {e}")))?;

        let pages = doc.get_pages();
        let mut images = Vec::new();
        let mut last_error = None;

        for (page_num, object_id) in &pages {
            let Ok(page_dict) = doc.get_dictionary(*object_id) else {
                continue;
            };
            let Some(xobjects) = page_xobjects(&doc, page_dict) else {
                debug!(page = page_num, "Page has no XObject resources");
                continue;
            };

            for (name, obj) in xobjects.iter() {
                let Ok((_, resolved)) = doc.dereference(obj) else {
                    continue;
                };
                let Ok(stream) = resolved.as_stream() else {
                    continue;
                };
                if !is_image(stream) {
                    continue;
                }
                match encode_image_stream(&doc, stream) {
                    Ok(Some(bytes)) => images.push(bytes),
                    Ok(None) => debug!(
                        page = page_num,
                        xobject = %String::from_utf8_lossy(name),
                        "Skipping image with unsupported encoding"
                    ),
                    Err(e) => {
                        warn!(
                            page = page_num,
                            xobject = %String::from_utf8_lossy(name),
                            error = %e,
                            "Skipping unreadable page image"
                        );
                        last_error = Some(e);
                    }
                }
            }
        }

        info!(
            total_pages = pages.len(),
            images = images.len(),
            "Collected page images for OCR"
        );

        if images.is_empty() {
            return Err(last_error.unwrap_or(AcquisitionError::NoPageImages));
        }
        Ok(images)
    }
}

/// The page's `Resources/XObject` dictionary, following indirect references.
fn page_xobjects<'a>(doc: &'a Document, page_dict: &'a Dictionary) -> Option<&'a Dictionary> {
    page_dict
        .get(b"Resources")
        .ok()
        .and_then(|r| doc.dereference(r).ok())
        .and_then(|(_, resolved)| resolved.as_dict().ok())
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|x| doc.dereference(x).ok())
        .and_then(|(_, resolved)| resolved.as_dict().ok())
}

fn is_image(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|s| s.as_name().ok())
        .is_some_and(|name| name == b"Image")
}

fn stream_filters(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().ok().map(|n| n.to_vec()))
            .collect(),
        _ => Vec::new(),
    }
}

fn dict_int(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key)
        .ok()
        .and_then(|o| doc.dereference(o).ok())
        .and_then(|(_, resolved)| resolved.as_i64().ok())
}

/// Turn an image XObject into bytes an OCR engine accepts.
///
/// JPEG streams pass through untouched. Raw or Flate-compressed 8-bit
/// gray/RGB samples are re-encoded as PNG. Other encodings yield `Ok(None)`;
/// a supported encoding whose data is broken is an `ImageProcessing` error.
fn encode_image_stream(
    doc: &Document,
    stream: &Stream,
) -> Result<Option<Vec<u8>>, AcquisitionError> {
    let filters = stream_filters(stream);

    if filters.len() == 1 && filters[0] == b"DCTDecode" {
        return Ok(Some(stream.content.clone()));
    }

    let samples = match filters.as_slice() {
        [] => stream.content.clone(),
        [f] if f == b"FlateDecode" => stream.decompressed_content().map_err(|e| {
            AcquisitionError::ImageProcessing(format!("Failed to inflate image samples: {e}"))
        })?,
        _ => return Ok(None),
    };

    let dimension =
        |key: &[u8]| dict_int(doc, &stream.dict, key).and_then(|v| u32::try_from(v).ok());
    let (Some(width), Some(height)) = (dimension(b"Width"), dimension(b"Height")) else {
        return Ok(None);
    };
    if dict_int(doc, &stream.dict, b"BitsPerComponent") != Some(8) {
        return Ok(None);
    }

    let color_space = stream
        .dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| doc.dereference(o).ok())
        .and_then(|(_, resolved)| resolved.as_name().ok());

    let short_samples = |len: usize| {
        AcquisitionError::ImageProcessing(format!(
            "{len} sample bytes do not fill a {width}x{height} image"
        ))
    };
    let len = samples.len();
    let image = match color_space {
        Some(b"DeviceGray") => DynamicImage::ImageLuma8(
            GrayImage::from_raw(width, height, samples).ok_or_else(|| short_samples(len))?,
        ),
        Some(b"DeviceRGB") => DynamicImage::ImageRgb8(
            RgbImage::from_raw(width, height, samples).ok_or_else(|| short_samples(len))?,
        ),
        _ => return Ok(None),
    };

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| AcquisitionError::ImageProcessing(format!("PNG re-encoding failed: {e}")))?;
    Ok(Some(png.into_inner()))
}
