// Still-image decoding into RGB frames for the pose estimator

use crate::models::capture::{DecodeError, DecodeResult, DecodedFrame};

/// Decode an encoded image (JPEG, PNG, WebP, ...) into a packed RGB8 frame.
/// Alpha is dropped; grayscale and 16-bit inputs are converted.
pub fn decode_image(bytes: &[u8]) -> DecodeResult<DecodedFrame> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let image = image::load_from_memory(bytes)?;
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    DecodedFrame::new(width, height, rgb.into_raw())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    pub(crate) fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png() {
        let frame = decode_image(&encode_png(4, 3)).unwrap();
        assert_eq!(frame.width, 4);
        assert_eq!(frame.height, 3);
        assert_eq!(frame.data.len(), 4 * 3 * 3);
        assert_eq!(&frame.data[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_decode_drops_alpha() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 128]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let frame = decode_image(&bytes).unwrap();
        assert_eq!(frame.data, vec![1, 2, 3, 1, 2, 3, 1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(DecodeError::Image(_))
        ));
        assert!(matches!(decode_image(&[]), Err(DecodeError::EmptyInput)));
    }
}
