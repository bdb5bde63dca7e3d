use crate::assets::Assets;
use crate::geometry::Geometry;

use fontdue::Font;
use fontdue::layout::{CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, VerticalAlign};
use glam::{IVec2, UVec2, Vec2};
use image::{GenericImageView, Pixel, Rgb, Rgba, RgbImage};
use shakmaty::{Color, File, Piece, Position, Rank, Role, Square};



const LIGHT: Rgb<u8> = Rgb([0xf0, 0xf0, 0xf0]);
const DARK: Rgb<u8> = Rgb([0x22, 0x96, 0x22]);
const LIGHT_HIGHLIGHT: Rgb<u8> = Rgb([0xf6, 0xf6, 0x82]);
const DARK_HIGHLIGHT: Rgb<u8> = Rgb([0x96, 0xbe, 0x3c]);

/// Everything needed to draw one frame of the board.
#[derive(Debug, Clone, Copy)]
pub struct BoardView<'a, P> {
  pub position: &'a P,
  /// The side drawn at the bottom of the board.
  pub side: Color,
  /// Squares tinted as part of the last move.
  pub highlighted: &'a [Square],
  pub selected: Option<Square>,
  /// Squares marked as legal destinations of the selected piece.
  pub destinations: &'a [Square],
  pub floating: Option<Floating>
}

impl<'a, P: Position> BoardView<'a, P> {
  pub fn new(position: &'a P, side: Color) -> Self {
    BoardView {
      position,
      side,
      highlighted: &[],
      selected: None,
      destinations: &[],
      floating: None
    }
  }
}

/// A piece drawn at an arbitrary pixel position, with its origin square left empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Floating {
  pub piece: Piece,
  pub origin: Square,
  /// Top-left corner of the sprite, in pixels.
  pub pos: Vec2
}

/// Returns true if the given position has a king that is in check
fn should_show_check(position: &impl Position, square: Square) -> bool {
  position.board().piece_at(square).map_or(false, |king| {
    king.role == Role::King &&
    position.king_attackers(
      square, king.color.other(),
      position.board().occupied()
    ).any()
  })
}

/// Renders the given view to an image buffer of `8 * tile_size` pixels square.
pub fn render_board<P: Position>(view: &BoardView<'_, P>, assets: &Assets) -> RgbImage {
  let geometry = Geometry::new(assets.tile_size(), view.side);
  let size = geometry.board_size();
  let mut img = RgbImage::new(size, size);

  for bx in 0u32..8u32 {
    for by in 0u32..8u32 {
      let square = Square::from_coords(File::new(bx), Rank::new(by));
      let cell = geometry.grid(bx, by);
      let pos = geometry.square_origin(square);
      // the chess board always has dark squares in the bottom left and top right
      let is_dark = bx % 2 == by % 2;
      let is_highlighted = view.highlighted.contains(&square);
      fill_square(&mut img, get_color(is_dark, is_highlighted), pos, geometry.tile_size);

      if let Some(font) = assets.font() {
        let label_color = get_color(!is_dark, false);
        // file letters along the bottom row, rank numbers along the left column
        if cell.y == 7 {
          let text = ((b'a' + bx as u8) as char).to_string();
          fill_label(&mut img, label_color, &text, font, pos, geometry.tile_size, true);
        };

        if cell.x == 0 {
          let text = ((b'1' + by as u8) as char).to_string();
          fill_label(&mut img, label_color, &text, font, pos, geometry.tile_size, false);
        };
      };

      if should_show_check(view.position, square) {
        copy(&mut img, &assets.check, pos.as_ivec2());
      };

      let is_floating_origin = view.floating.map_or(false, |floating| floating.origin == square);
      if let Some(piece) = view.position.board().piece_at(square).filter(|_| !is_floating_origin) {
        copy(&mut img, &*assets.get_piece(piece), pos.as_ivec2());
      };
    };
  };

  if let Some(selected) = view.selected {
    copy(&mut img, &assets.selected, geometry.square_origin(selected).as_ivec2());
  };

  for &destination in view.destinations {
    copy(&mut img, &assets.destination, geometry.square_origin(destination).as_ivec2());
  };

  if let Some(floating) = view.floating {
    copy(&mut img, &*assets.get_piece(floating.piece), floating.pos.round().as_ivec2());
  };

  img
}

fn get_color(is_dark: bool, is_highlighted: bool) -> Rgb<u8> {
  if is_dark {
    if is_highlighted { DARK_HIGHLIGHT } else { DARK }
  } else {
    if is_highlighted { LIGHT_HIGHLIGHT } else { LIGHT }
  }
}

fn fill_square(destination: &mut RgbImage, pixel: Rgb<u8>, pos: UVec2, size: u32) {
  debug_assert!(destination.width() >= pos.x + size);
  debug_assert!(destination.height() >= pos.y + size);
  for sx in pos.x..(pos.x + size) {
    for sy in pos.y..(pos.y + size) {
      destination.put_pixel(sx, sy, pixel);
    };
  };
}

/// Draws a small coordinate label inside the tile at `origin`,
/// in its bottom-right corner when `bottom_right` is set and its top-left corner otherwise.
fn fill_label(
  destination: &mut RgbImage,
  pixel: Rgb<u8>,
  text: &str,
  font: &Font,
  origin: UVec2,
  tile_size: u32,
  bottom_right: bool
) {
  let size = (tile_size as f32 * 0.2).max(8.0);
  let padding = (tile_size / 32).max(1) as f32;
  let tile = tile_size as f32;

  let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
  layout.reset(&LayoutSettings {
    x: origin.x as f32 + padding,
    y: origin.y as f32 + padding,
    max_width: Some(tile - padding * 2.0),
    max_height: Some(tile - padding * 2.0),
    horizontal_align: if bottom_right { HorizontalAlign::Right } else { HorizontalAlign::Left },
    vertical_align: if bottom_right { VerticalAlign::Bottom } else { VerticalAlign::Top },
    ..LayoutSettings::default()
  });

  layout.append(&[font], &TextStyle::new(text, size, 0));
  for glyph in layout.glyphs() {
    let glyph_offset = Vec2::new(glyph.x, glyph.y).round().as_ivec2();
    let (metrics, bitmap) = font.rasterize_config(glyph.key);
    for sx in 0..metrics.width {
      for sy in 0..metrics.height {
        let alpha = bitmap[sx + sy * metrics.width];
        if alpha == 0x00 { continue };

        let source_pixel = Rgba([pixel[0], pixel[1], pixel[2], alpha]);
        blend_at(destination, glyph_offset + IVec2::new(sx as i32, sy as i32), source_pixel);
      };
    };
  };
}

/// Alpha-blends `source` onto `destination` with its top-left corner at `pos`, clipping to the destination.
fn copy<P, S>(destination: &mut RgbImage, source: &S, pos: IVec2)
where P: Pixel<Subpixel = u8>, S: GenericImageView<Pixel = P> {
  for sx in 0..source.width() {
    for sy in 0..source.height() {
      let source_pixel = source.get_pixel(sx, sy).to_rgba();
      // don't do anything if the source pixel is transparent
      if source_pixel[3] != 0x00 {
        blend_at(destination, pos + UVec2::new(sx, sy).as_ivec2(), source_pixel);
      };
    };
  };
}

fn blend_at(destination: &mut RgbImage, pos: IVec2, source_pixel: Rgba<u8>) {
  let in_bounds = pos.x >= 0 && pos.y >= 0 &&
    (pos.x as u32) < destination.width() && (pos.y as u32) < destination.height();
  if in_bounds {
    let destination_pixel = destination.get_pixel_mut(pos.x as u32, pos.y as u32);
    *destination_pixel = blend(*destination_pixel, source_pixel);
  };
}

fn blend(p1: Rgb<u8>, p2: Rgba<u8>) -> Rgb<u8> {
  let mut p1 = p1.to_rgba();
  p1.blend(&p2);
  p1.to_rgb()
}
