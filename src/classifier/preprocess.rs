//! Image decoding and tensor preparation.
//!
//! Uploads are decoded by sniffing their content, converted to RGB, resized
//! to a square of `size` pixels and scaled to [0, 1]. The resulting tensor is
//! NHWC with a batch dimension of one: `[1, size, size, 3]`.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader};
use tract_onnx::prelude::tract_ndarray::Array4;

use super::ClassifierError;

pub fn decode_file(path: &Path) -> Result<DynamicImage, ClassifierError> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image)
}

pub fn to_input_tensor(image: &DynamicImage, size: u32) -> Array4<f32> {
    let rgb = imageops::resize(&image.to_rgb8(), size, size, FilterType::CatmullRom);
    let side = size as usize;

    Array4::from_shape_fn((1, side, side, 3), |(_, y, x, channel)| {
        rgb.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 200])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn encoded(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), format)
            .expect("encode test image");
        buf
    }

    #[test]
    fn every_supported_format_becomes_a_normalized_tensor() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let cases = [
            ("note.png", ImageFormat::Png, (300, 300)),
            ("note.jpg", ImageFormat::Jpeg, (640, 480)),
            ("note.jpeg", ImageFormat::Jpeg, (17, 403)),
            ("note.gif", ImageFormat::Gif, (50, 20)),
        ];

        for (name, format, (w, h)) in cases {
            let path = dir.path().join(name);
            std::fs::write(&path, encoded(&gradient(w, h), format)).unwrap();

            let decoded = decode_file(&path).unwrap();
            let tensor = to_input_tensor(&decoded, 224);

            assert_eq!(tensor.shape(), &[1, 224, 224, 3], "{}", name);
            assert!(
                tensor.iter().all(|v| (0.0..=1.0).contains(v)),
                "{} produced values outside [0, 1]",
                name
            );
        }
    }

    #[test]
    fn format_is_sniffed_from_content() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("actually_png.jpg");
        std::fs::write(&path, encoded(&gradient(8, 8), ImageFormat::Png)).unwrap();

        assert!(decode_file(&path).is_ok());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert!(matches!(
            decode_file(&path),
            Err(ClassifierError::Decode(_))
        ));
    }

    #[test]
    fn pixel_values_are_scaled_per_channel() {
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 0, 51])));
        let tensor = to_input_tensor(&white, 4);

        assert_eq!(tensor[[0, 2, 3, 0]], 1.0);
        assert_eq!(tensor[[0, 2, 3, 1]], 0.0);
        assert!((tensor[[0, 2, 3, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn grayscale_input_is_expanded_to_three_channels() {
        let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(5, 7, image::Luma([128])));
        let tensor = to_input_tensor(&gray, 3);

        assert_eq!(tensor.shape(), &[1, 3, 3, 3]);
        assert!(tensor.iter().all(|v| (*v - 128.0 / 255.0).abs() < 1e-6));
    }
}
