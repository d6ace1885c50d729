//! Decoding and encoding of image buffers.
//!
//! HEIC/HEIF files are decoded through libheif (feature `heif`); every other
//! input goes through the `image` crate with content-based format detection,
//! so a PNG saved with a `.jpg` extension still decodes.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageReader};
use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::error::{ConversionError, Result};
use super::ConversionOptions;
use crate::cli::OutputFormat;
use crate::utils::get_file_extension;

/// Decode any supported input file into a pixel buffer
pub fn decode(path: &Path) -> Result<DynamicImage> {
    if is_heic_file(path) {
        return decode_heic(path);
    }

    let reader = ImageReader::open(path)
        .map_err(|e| ConversionError::Decode(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| ConversionError::Decode(e.to_string()))?;

    reader
        .decode()
        .map_err(|e| ConversionError::Decode(e.to_string()))
}

/// Drop the alpha channel of any transparent buffer.
///
/// RGBA, LA and palette images with a transparency entry (which the decoders
/// expand to RGBA) become plain RGB. Alpha is discarded, not composited
/// against a background. Opaque modes are returned unchanged.
pub fn normalize_color(img: DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    }
}

/// Encode a buffer as JPEG or PNG bytes
pub fn encode(img: &DynamicImage, options: &ConversionOptions) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    match options.output_format {
        OutputFormat::Jpg => {
            let img = jpeg_compatible(img);
            let encoder = JpegEncoder::new_with_quality(&mut buffer, options.jpeg_quality);
            img.write_with_encoder(encoder)
                .map_err(|e| ConversionError::Encode(e.to_string()))?;
        }
        OutputFormat::Png => {
            let compression = if options.optimize {
                CompressionType::Best
            } else {
                CompressionType::Default
            };
            let img = png_compatible(img);
            let encoder =
                PngEncoder::new_with_quality(&mut buffer, compression, FilterType::Adaptive);
            img.write_with_encoder(encoder)
                .map_err(|e| ConversionError::Encode(e.to_string()))?;
        }
    }

    Ok(buffer)
}

/// The JPEG encoder only takes 8-bit samples
fn jpeg_compatible(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    match img {
        DynamicImage::ImageLuma16(_) => Cow::Owned(DynamicImage::ImageLuma8(img.to_luma8())),
        DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_) => {
            Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8()))
        }
        _ => Cow::Borrowed(img),
    }
}

/// The PNG encoder takes 8 or 16-bit samples, not float
fn png_compatible(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    match img {
        DynamicImage::ImageRgb32F(_) => Cow::Owned(DynamicImage::ImageRgb16(img.to_rgb16())),
        DynamicImage::ImageRgba32F(_) => Cow::Owned(DynamicImage::ImageRgba16(img.to_rgba16())),
        _ => Cow::Borrowed(img),
    }
}

/// Check for a HEIC/HEIF file by extension, then by `ftyp` brand
pub fn is_heic_file(path: &Path) -> bool {
    if let Some(ext) = get_file_extension(path) {
        if matches!(ext.as_str(), "heic" | "heif" | "hif") {
            return true;
        }
    }

    if let Ok(mut file) = File::open(path) {
        let mut buffer = [0u8; 12];
        if file.read_exact(&mut buffer).is_ok() && &buffer[4..8] == b"ftyp" {
            return matches!(
                &buffer[8..12],
                b"heic" | b"heix" | b"heim" | b"heis" | b"mif1" | b"msf1"
            );
        }
    }

    false
}

/// Whether this build can decode HEIC files
pub fn heic_supported() -> bool {
    cfg!(feature = "heif")
}

#[cfg(feature = "heif")]
fn decode_heic(path: &Path) -> Result<DynamicImage> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();

    let ctx = HeifContext::read_from_file(path.to_string_lossy().as_ref())
        .map_err(|e| ConversionError::Decode(e.to_string()))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| ConversionError::Decode(e.to_string()))?;

    let width = handle.width();
    let height = handle.height();
    let has_alpha = handle.has_alpha_channel();
    let (chroma, channels) = if has_alpha {
        (RgbChroma::Rgba, 4)
    } else {
        (RgbChroma::Rgb, 3)
    };

    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(chroma), None)
        .map_err(|e| ConversionError::Decode(e.to_string()))?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| ConversionError::Decode("No interleaved RGB plane found".to_string()))?;

    // Rows may be padded, copy only the pixel bytes of each one
    let row_bytes = width as usize * channels;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in plane.data.chunks(plane.stride).take(height as usize) {
        let row = row
            .get(..row_bytes)
            .ok_or_else(|| ConversionError::Decode("Truncated HEIC plane".to_string()))?;
        pixels.extend_from_slice(row);
    }

    let img = if has_alpha {
        image::RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8)
    } else {
        image::RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
    };

    img.ok_or_else(|| ConversionError::Decode("Failed to create image buffer".to_string()))
}

#[cfg(not(feature = "heif"))]
fn decode_heic(_path: &Path) -> Result<DynamicImage> {
    Err(ConversionError::UnsupportedFormat(
        "HEIC decoding is not available in this build (rebuild with --features heif)".to_string(),
    ))
}
