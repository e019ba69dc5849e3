use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use image::{imageops::FilterType, ImageFormat};
use uuid::Uuid;

use super::error::AccountResult;

pub const PROFILE_PREFIX: &str = "accounts/profile/";
pub const THUMBNAIL_PREFIX: &str = "accounts/thumb/";
pub const ID_PROOF_PREFIX: &str = "accounts/id-proof/";

pub const PNG_CONTENT_TYPE: &str = "image/png";

pub(crate) fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Extension for id-proof documents; these may be any file type.
pub(crate) fn document_ext(ct: &str) -> &'static str {
    match ct {
        "application/pdf" => "pdf",
        other => ext_from_mime(other).unwrap_or("bin"),
    }
}

/// Fresh object key under `prefix`.
pub(crate) fn object_key(prefix: &str, ext: &str) -> String {
    format!("{}{}.{}", prefix, Uuid::new_v4(), ext)
}

/// Resize `source` to exactly `size` and encode it as PNG.
///
/// Returns the new file name (derived from `source_name`) and the payload.
pub fn resize_image(
    source: &[u8],
    source_name: &str,
    size: (u32, u32),
) -> AccountResult<(String, Bytes)> {
    let (width, height) = size;
    let img = image::load_from_memory(source)?;
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);

    let mut buf = Cursor::new(Vec::new());
    resized.write_to(&mut buf, ImageFormat::Png)?;

    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let name = format!("{}_{}x{}.png", stem, width, height);
    Ok((name, Bytes::from(buf.into_inner())))
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32, shade: u8) -> Bytes {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([shade, 128, 255 - shade]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode png");
    Bytes::from(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
        assert_eq!(document_ext("application/pdf"), "pdf");
        assert_eq!(document_ext("whatever/else"), "bin");
    }

    #[test]
    fn object_keys_are_unique_and_prefixed() {
        let a = object_key(PROFILE_PREFIX, "png");
        let b = object_key(PROFILE_PREFIX, "png");
        assert!(a.starts_with("accounts/profile/"));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }

    #[test]
    fn resize_produces_exact_size_png() {
        let source = sample_png(120, 80, 10);
        let (name, payload) = resize_image(&source, "accounts/profile/abc.png", (30, 30)).unwrap();
        assert_eq!(name, "abc_30x30.png");

        let thumb = image::load_from_memory(&payload).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (30, 30));
        assert_eq!(image::guess_format(&payload).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn resize_rejects_non_image() {
        let err = resize_image(b"definitely not an image", "x.png", (30, 30)).unwrap_err();
        assert!(matches!(err, crate::accounts::AccountError::Image(_)));
    }
}
