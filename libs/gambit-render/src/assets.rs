use fontdue::{Font, FontSettings};
use glam::{UVec2, Vec2};
use image::{GenericImageView, ImageError, Rgba, RgbaImage};
use image::imageops::{self, FilterType};
use shakmaty::{Color, Piece, Role};

use std::io::BufReader;
use std::path::{Path, PathBuf};

pub(crate) type RgbaSubImage<'a> = image::SubImage<&'a RgbaImage>;

const ROLES: [Role; 6] = [Role::Queen, Role::King, Role::Rook, Role::Bishop, Role::Knight, Role::Pawn];
const COLORS: [Color; 2] = [Color::White, Color::Black];

const SELECTED: [u8; 4] = [0x00, 0x00, 0xff, 0x80];
const DESTINATION: [u8; 4] = [0xff, 0xd7, 0x00, 0x80];

#[derive(Debug, Error)]
pub enum AssetsError {
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error("failed to decode image {}: {error}", .path.display())]
  Image { path: PathBuf, #[source] error: ImageError },
  #[error("failed to load font {}: {message}", .path.display())]
  Font { path: PathBuf, message: &'static str }
}

/// Returns the file name of the sprite for the given piece, e.g. `wK.png` or `bN.png`.
pub fn sprite_file_name(piece: Piece) -> String {
  let color = match piece.color {
    Color::White => 'w',
    Color::Black => 'b'
  };

  format!("{color}{}.png", piece.role.upper_char())
}

#[derive(Debug)]
pub struct Assets {
  tile_size: u32,
  font: Option<Font>,
  /// Sprite sheet, one row per color and one column per role.
  pieces: RgbaImage,
  pub(crate) check: RgbaImage,
  pub(crate) destination: RgbaImage,
  pub(crate) selected: RgbaImage
}

impl Assets {
  /// Loads all twelve piece sprites from `dir`, scaling each one to `tile_size`.
  pub fn load(dir: impl AsRef<Path>, tile_size: u32, font_path: Option<&Path>) -> Result<Self, AssetsError> {
    let dir = dir.as_ref();
    let mut sprites = Vec::with_capacity(12);
    for color in COLORS {
      for role in ROLES {
        let path = dir.join(sprite_file_name(Piece { color, role }));
        sprites.push(load_sprite(&path)?);
        trace!("Loaded sprite {}", path.display());
      };
    };

    let mut assets = Assets::from_sprites(tile_size, sprites);
    if let Some(font_path) = font_path {
      assets.font = Some(load_font(font_path)?);
      debug!("Loaded font {}", font_path.display());
    };

    Ok(assets)
  }

  /// Builds assets from already decoded sprites, ordered white before black and
  /// queen, king, rook, bishop, knight, pawn within each color.
  pub fn from_sprites(tile_size: u32, sprites: impl IntoIterator<Item = RgbaImage>) -> Self {
    let mut pieces = RgbaImage::new(tile_size * 6, tile_size * 2);
    for (i, sprite) in sprites.into_iter().take(12).enumerate() {
      let (column, row) = (i as u32 % 6, i as u32 / 6);
      let sprite = imageops::resize(&sprite, tile_size, tile_size, FilterType::CatmullRom);
      imageops::replace(&mut pieces, &sprite, (column * tile_size) as i64, (row * tile_size) as i64);
    };

    Assets {
      tile_size,
      font: None,
      pieces,
      check: generate_image_check(tile_size),
      destination: generate_image_destination(tile_size),
      selected: generate_image_selected(tile_size)
    }
  }

  pub fn tile_size(&self) -> u32 {
    self.tile_size
  }

  pub(crate) fn font(&self) -> Option<&Font> {
    self.font.as_ref()
  }

  pub(crate) fn get_piece(&self, piece: Piece) -> RgbaSubImage<'_> {
    let column = match piece.role {
      Role::Queen => 0,
      Role::King => 1,
      Role::Rook => 2,
      Role::Bishop => 3,
      Role::Knight => 4,
      Role::Pawn => 5
    };

    let row = match piece.color {
      Color::White => 0,
      Color::Black => 1
    };

    let tile = self.tile_size;
    self.pieces.view(column * tile, row * tile, tile, tile)
  }
}

fn load_sprite(path: &Path) -> Result<RgbaImage, AssetsError> {
  let reader = BufReader::new(fs_err::File::open(path)?);
  crate::decode_image(reader)
    .map(|image| image.into_rgba8())
    .map_err(|error| AssetsError::Image { path: path.to_owned(), error })
}

fn load_font(path: &Path) -> Result<Font, AssetsError> {
  let data = fs_err::read(path)?;
  Font::from_bytes(data, FontSettings::default())
    .map_err(|message| AssetsError::Font { path: path.to_owned(), message })
}

fn generate_image_check(tile_size: u32) -> RgbaImage {
  let center = Vec2::splat((tile_size as f32 - 1.0) / 2.0);
  let radius = tile_size as f32 / 2.0;
  RgbaImage::from_fn(tile_size, tile_size, |x, y| {
    let dist = UVec2::new(x, y).as_vec2().distance(center);
    let alpha = (1.0 - (dist / radius).powi(2)).clamp(0.0, 1.0);
    Rgba([0xff, 0x00, 0x00, (alpha * 255.0) as u8])
  })
}

fn generate_image_destination(tile_size: u32) -> RgbaImage {
  let center = Vec2::splat((tile_size as f32 - 1.0) / 2.0);
  // 15px for an 80px tile
  let radius = tile_size as f32 * 15.0 / 80.0;
  RgbaImage::from_fn(tile_size, tile_size, |x, y| {
    let dist = UVec2::new(x, y).as_vec2().distance(center);
    if dist <= radius { Rgba(DESTINATION) } else { Rgba([0x00; 4]) }
  })
}

fn generate_image_selected(tile_size: u32) -> RgbaImage {
  const THICKNESS: u32 = 3;
  RgbaImage::from_fn(tile_size, tile_size, |x, y| {
    let edge = x < THICKNESS || y < THICKNESS || x >= tile_size - THICKNESS || y >= tile_size - THICKNESS;
    if edge { Rgba(SELECTED) } else { Rgba([0x00; 4]) }
  })
}
