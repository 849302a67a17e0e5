//! Document-to-image conversion
//!
//! Vision models take JPEG pages, not PDFs. Scanned statements are PDFs
//! whose pages each carry one large image XObject (the scan itself), so
//! instead of rasterizing through a native PDF renderer we pull the
//! embedded scan out of each page with lopdf and re-encode it as JPEG.
//! Plain image uploads pass through a decode/re-encode for validation.

use std::io::Write;
use std::path::Path;

use image::ImageOutputFormat;
use lopdf::{Document, Object, ObjectId};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};

/// JPEG quality for model input; statements are text-heavy scans where
/// moderate compression does not hurt legibility
const JPEG_QUALITY: u8 = 85;

/// Letter-size page height in inches, used to turn a dpi setting into a
/// pixel cap for oversized scans
const PAGE_INCHES: f64 = 11.69;

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Write downloaded bytes to a scoped temp file
///
/// The file is removed on drop, on every exit path.
pub fn save_temp(bytes: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

/// Convert a downloaded document into one JPEG per page
///
/// PDFs go through a scoped temp file and yield one image per page;
/// anything else is treated as a single image and re-encoded. `dpi` caps
/// the longest image edge; pages already below the cap are kept at their
/// native resolution.
pub fn to_page_images(bytes: &[u8], dpi: u32) -> Result<Vec<Vec<u8>>> {
    if is_pdf(bytes) {
        let temp = save_temp(bytes)?;
        pdf_to_page_images(temp.path(), dpi)
    } else {
        Ok(vec![reencode_jpeg(bytes, dpi)?])
    }
}

/// Extract the scan image from every page of a PDF
pub fn pdf_to_page_images(path: &Path, dpi: u32) -> Result<Vec<Vec<u8>>> {
    let doc = Document::load(path)
        .map_err(|e| Error::Pdf(format!("Failed to parse PDF: {}", e)))?;

    let page_ids: Vec<ObjectId> = doc.page_iter().collect();
    if page_ids.is_empty() {
        return Err(Error::Pdf("PDF has no pages".into()));
    }

    let mut pages = Vec::with_capacity(page_ids.len());
    for (index, &page_id) in page_ids.iter().enumerate() {
        let raw = largest_page_image(&doc, page_id).map_err(|e| {
            Error::Pdf(format!("Page {}: {}", index + 1, e))
        })?;
        let jpeg = reencode_jpeg(&raw, dpi)?;
        debug!(
            page = index + 1,
            raw_size = raw.len(),
            jpeg_size = jpeg.len(),
            "Extracted page image"
        );
        pages.push(jpeg);
    }
    Ok(pages)
}

/// Decode an image, downscale it to the dpi cap when oversized, and
/// re-encode as JPEG
fn reencode_jpeg(bytes: &[u8], dpi: u32) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::Pdf(format!("Failed to decode image: {}", e)))?;

    let max_edge = (dpi as f64 * PAGE_INCHES) as u32;
    let img = if img.width().max(img.height()) > max_edge {
        img.resize(max_edge, max_edge, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| Error::Pdf(format!("Failed to encode JPEG: {}", e)))?;
    Ok(buf.into_inner())
}

/// Find the largest image XObject on a page
///
/// Walks page dict -> /Resources -> /XObject and keeps the biggest
/// /Subtype /Image stream. Scanned statements put the full-page scan
/// there; logos and stamps are smaller and lose.
fn largest_page_image(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc
        .get_object(page_id)
        .map_err(|e| Error::Pdf(format!("Page object error: {}", e)))?
        .as_dict()
        .map_err(|_| Error::Pdf("Page is not a dictionary".into()))?;

    let resources = resolve_dict_entry(doc, page_dict, b"Resources")?;
    let xobjects = resolve_dict_entry(doc, resources, b"XObject")?;

    let mut largest: Option<Vec<u8>> = None;

    for (_name, obj_ref) in xobjects.iter() {
        let xobj = match obj_ref {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(obj) => obj,
                Err(_) => continue,
            },
            other => other,
        };
        let stream = match xobj {
            Object::Stream(ref s) => s,
            _ => continue,
        };
        if !is_image_subtype(&stream.dict) {
            continue;
        }

        let bytes = image_stream_bytes(doc, stream)?;
        if largest.as_ref().map_or(true, |prev| bytes.len() > prev.len()) {
            largest = Some(bytes);
        }
    }

    largest.ok_or_else(|| Error::Pdf("No scan image found on page".into()))
}

fn is_image_subtype(dict: &lopdf::Dictionary) -> bool {
    dict.get(b"Subtype")
        .map(|obj| matches!(obj, Object::Name(ref n) if n == b"Image"))
        .unwrap_or(false)
}

/// Pull decodable image bytes out of a PDF image stream
///
/// DCTDecode streams are JPEG files as-is. Other filters decompress to
/// either a full image file or raw pixels that need reconstructing from
/// the stream dictionary.
fn image_stream_bytes(doc: &Document, stream: &lopdf::Stream) -> Result<Vec<u8>> {
    let is_dct = stream
        .dict
        .get(b"Filter")
        .map(|f| match f {
            Object::Name(n) => n == b"DCTDecode",
            Object::Array(arr) => arr
                .iter()
                .any(|o| matches!(o, Object::Name(ref n) if n == b"DCTDecode")),
            _ => false,
        })
        .unwrap_or(false);

    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    if is_dct || image::load_from_memory(&content).is_ok() {
        return Ok(content);
    }

    raw_pixels_to_png(doc, &stream.dict, &content)
}

/// Rebuild an image file from raw pixel data using /Width, /Height,
/// /BitsPerComponent, and /ColorSpace
fn raw_pixels_to_png(
    doc: &Document,
    dict: &lopdf::Dictionary,
    raw_pixels: &[u8],
) -> Result<Vec<u8>> {
    let width = get_int(dict, b"Width")? as u32;
    let height = get_int(dict, b"Height")? as u32;
    let bpc = get_int(dict, b"BitsPerComponent").unwrap_or(8) as u32;

    let channels = color_channels(doc, dict);
    let expected = (width * height * channels * bpc / 8) as usize;
    if raw_pixels.len() < expected {
        return Err(Error::Pdf(format!(
            "Pixel buffer too small: {} bytes, expected {} for {}x{}",
            raw_pixels.len(),
            expected,
            width,
            height
        )));
    }

    let img = match channels {
        1 => image::GrayImage::from_raw(width, height, raw_pixels.to_vec())
            .map(image::DynamicImage::ImageLuma8),
        3 => image::RgbImage::from_raw(width, height, raw_pixels.to_vec())
            .map(image::DynamicImage::ImageRgb8),
        4 => image::RgbaImage::from_raw(width, height, raw_pixels.to_vec())
            .map(image::DynamicImage::ImageRgba8),
        n => return Err(Error::Pdf(format!("Unsupported channel count: {}", n))),
    }
    .ok_or_else(|| Error::Pdf("Pixel buffer did not match dimensions".into()))?;

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Png)
        .map_err(|e| Error::Pdf(format!("PNG encode failed: {}", e)))?;
    Ok(buf.into_inner())
}

fn color_channels(doc: &Document, dict: &lopdf::Dictionary) -> u32 {
    let cs = match dict.get(b"ColorSpace") {
        Ok(obj) => resolve_object(doc, obj),
        Err(_) => return 3,
    };
    match cs {
        Object::Name(ref n) => match n.as_slice() {
            b"DeviceGray" => 1,
            b"DeviceRGB" => 3,
            b"DeviceCMYK" => 4,
            _ => 3,
        },
        Object::Array(ref arr) if !arr.is_empty() => match &arr[0] {
            Object::Name(ref n) if n == b"ICCBased" => {
                if let Some(Object::Reference(id)) = arr.get(1) {
                    if let Ok(Object::Stream(ref s)) = doc.get_object(*id) {
                        return get_int(&s.dict, b"N").unwrap_or(3) as u32;
                    }
                }
                3
            }
            Object::Name(ref n) if n == b"Indexed" => 1,
            _ => 3,
        },
        _ => 3,
    }
}

fn resolve_object<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn resolve_dict_entry<'a>(
    doc: &'a Document,
    dict: &'a lopdf::Dictionary,
    key: &[u8],
) -> Result<&'a lopdf::Dictionary> {
    let obj = dict.get(key).map_err(|_| {
        Error::Pdf(format!("Missing /{}", String::from_utf8_lossy(key)))
    })?;
    resolve_object(doc, obj).as_dict().map_err(|_| {
        Error::Pdf(format!("/{} is not a dictionary", String::from_utf8_lossy(key)))
    })
}

fn get_int(dict: &lopdf::Dictionary, key: &[u8]) -> Result<i64> {
    dict.get(key)
        .map_err(|_| Error::Pdf(format!("Missing /{}", String::from_utf8_lossy(key))))?
        .as_i64()
        .map_err(|_| Error::Pdf(format!("/{} is not an integer", String::from_utf8_lossy(key))))
}
