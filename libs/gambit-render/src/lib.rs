pub extern crate glam;
pub extern crate image;
pub extern crate shakmaty;
#[macro_use]
extern crate log;
#[macro_use]
extern crate thiserror;

mod assets;
mod geometry;
mod render;

pub use crate::assets::{Assets, AssetsError, sprite_file_name};
pub use crate::geometry::Geometry;
pub use crate::render::{BoardView, Floating, render_board};

use image::{DynamicImage, ImageResult, RgbImage};

use std::io::prelude::*;



pub fn encode_image_rgb<W: Write>(img: &RgbImage, writer: W) -> ImageResult<()> {
  use image::{ExtendedColorType, ImageEncoder};
  use image::codecs::png::{CompressionType, FilterType, PngEncoder};
  PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive)
    .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
}

pub fn decode_image<R: BufRead + Seek>(reader: R) -> ImageResult<DynamicImage> {
  image::codecs::png::PngDecoder::new(reader).and_then(DynamicImage::from_decoder)
}

#[cfg(test)]
mod tests {
  use image::{Rgb, RgbImage};

  use std::io::Cursor;

  #[test]
  fn test_png_codec() {
    let img = RgbImage::from_fn(16, 8, |x, y| Rgb([x as u8 * 10, y as u8 * 20, 0x7f]));
    let mut buf = Vec::new();
    super::encode_image_rgb(&img, &mut buf).unwrap();
    assert!(buf.starts_with(b"\x89PNG"));

    let decoded = super::decode_image(Cursor::new(buf)).unwrap().into_rgb8();
    assert_eq!(decoded, img);
  }
}
