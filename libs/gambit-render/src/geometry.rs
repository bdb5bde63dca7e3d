use glam::{UVec2, Vec2};
use shakmaty::{Color, File, Rank, Square};



/// Maps squares to pixels and back for a board drawn from the perspective of `side`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
  pub tile_size: u32,
  pub side: Color
}

impl Geometry {
  pub const fn new(tile_size: u32, side: Color) -> Self {
    Geometry { tile_size, side }
  }

  pub const fn board_size(&self) -> u32 {
    self.tile_size * 8
  }

  /// Converts file/rank indices to column/row indices counted from the top-left tile.
  /// The mapping is its own inverse.
  pub fn grid(&self, x: u32, y: u32) -> UVec2 {
    // the board is flipped vertically, to put the player on the bottom
    // if the player is black, it is flipped vertically (again), and horizontally
    match self.side {
      Color::Black => UVec2::new(7 - x, y),
      Color::White => UVec2::new(x, 7 - y)
    }
  }

  /// The pixel position of the top-left corner of `square`.
  pub fn square_origin(&self, square: Square) -> UVec2 {
    self.grid(square.file() as u32, square.rank() as u32) * self.tile_size
  }

  pub fn square_center(&self, square: Square) -> Vec2 {
    self.square_origin(square).as_vec2() + Vec2::splat(self.tile_size as f32 / 2.0)
  }

  /// The square under the given pixel, if the pixel lies on the board.
  pub fn square_at(&self, pos: Vec2) -> Option<Square> {
    if !pos.is_finite() || pos.x < 0.0 || pos.y < 0.0 { return None };
    let cell = (pos / self.tile_size as f32).floor().as_uvec2();
    if cell.x >= 8 || cell.y >= 8 { return None };
    let coords = self.grid(cell.x, cell.y);
    Some(Square::from_coords(File::new(coords.x), Rank::new(coords.y)))
  }
}

#[cfg(test)]
mod tests {
  use super::Geometry;

  use glam::{UVec2, Vec2};
  use shakmaty::{Color, Square};

  #[test]
  fn test_corners() {
    let white = Geometry::new(80, Color::White);
    assert_eq!(white.square_origin(Square::A8), UVec2::new(0, 0));
    assert_eq!(white.square_origin(Square::A1), UVec2::new(0, 560));
    assert_eq!(white.square_origin(Square::H1), UVec2::new(560, 560));

    let black = Geometry::new(80, Color::Black);
    assert_eq!(black.square_origin(Square::H1), UVec2::new(0, 0));
    assert_eq!(black.square_origin(Square::A1), UVec2::new(560, 0));
    assert_eq!(black.square_origin(Square::A8), UVec2::new(560, 560));
  }

  #[test]
  fn test_square_at_inverts_origin() {
    for side in [Color::White, Color::Black] {
      let geometry = Geometry::new(64, side);
      for square in Square::ALL {
        let center = geometry.square_center(square);
        assert_eq!(geometry.square_at(center), Some(square), "{side:?} {square}");
        let corner = geometry.square_origin(square).as_vec2();
        assert_eq!(geometry.square_at(corner), Some(square), "{side:?} {square}");
      };
    };
  }

  #[test]
  fn test_square_at_outside() {
    let geometry = Geometry::new(80, Color::White);
    assert_eq!(geometry.square_at(Vec2::new(-1.0, 10.0)), None);
    assert_eq!(geometry.square_at(Vec2::new(10.0, 640.0)), None);
    assert_eq!(geometry.square_at(Vec2::new(640.0, 0.0)), None);
    assert_eq!(geometry.square_at(Vec2::new(639.9, 639.9)), Some(Square::H1));
    assert_eq!(geometry.square_at(Vec2::NAN), None);
  }
}
