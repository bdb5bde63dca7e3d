use crate::prelude::*;

use gambit_render::shakmaty::Color;
use serde::de::{Deserialize, Deserializer};
use serde::ser::Serializer;

use std::collections::BTreeMap;
use std::io;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The UCI option controlling engine strength.
pub const SKILL_LEVEL_OPTION: &str = "Skill Level";
pub const SKILL_LEVEL_MAX: u8 = 20;
pub const SQUARE_SIZE_RANGE: RangeInclusive<u32> = 16..=256;
pub const ANIMATION_FRAMES_MAX: u32 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
  /// Path to the UCI engine executable.
  #[serde(default = "default_engine_path")]
  pub engine_path: PathBuf,
  /// Extra command line arguments passed to the engine.
  #[serde(default)]
  pub engine_args: Vec<String>,
  /// How long the engine may think about each move, in seconds.
  #[serde(default = "default_move_time", deserialize_with = "deserialize_duration", serialize_with = "serialize_duration")]
  pub move_time: Duration,
  /// Engine skill level, from 0 to 20. The player is asked at startup when this is not set.
  #[serde(default, deserialize_with = "deserialize_skill_level", skip_serializing_if = "Option::is_none")]
  pub skill_level: Option<u8>,
  /// The side played by the human.
  #[serde(default)]
  pub human_side: Side,
  /// Directory containing the twelve piece sprites (`wK.png` through `bP.png`).
  #[serde(default = "default_assets_dir")]
  pub assets_dir: PathBuf,
  /// TrueType font used to draw board coordinates (optional).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub font_path: Option<PathBuf>,
  /// Edge length of one board square in pixels, from 16 to 256.
  #[serde(default = "default_square_size", deserialize_with = "deserialize_square_size")]
  pub square_size: u32,
  /// Steps in a move animation, at most 120. Zero disables the animation.
  #[serde(default = "default_animation_frames", deserialize_with = "deserialize_animation_frames")]
  pub animation_frames: u32,
  /// Delay between animation frames, in seconds.
  #[serde(default = "default_animation_frame_delay", deserialize_with = "deserialize_duration", serialize_with = "serialize_duration")]
  pub animation_frame_delay: Duration,
  /// Extra `setoption` commands sent to the engine after it starts.
  #[serde(default)]
  pub engine_options: BTreeMap<String, toml::Value>
}

impl Config {
  #[inline]
  pub fn create() -> GambitResult<Config> {
    Config::load_or_create("./config.toml")
  }

  /// Reads the config at `path`, writing out the default config if it doesn't exist.
  pub fn load_or_create(path: impl AsRef<Path>) -> GambitResult<Config> {
    let path = path.as_ref();
    match fs_err::read_to_string(path) {
      Ok(text) => {
        let config = toml::from_str::<Config>(&text)
          .context(format!("failed to parse {}", path.display()))?;
        trace!("Loaded {}", path.display());
        Ok(config)
      },
      Err(error) if error.kind() == io::ErrorKind::NotFound => {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).context("failed to serialize default config")?;
        fs_err::write(path, text).context(format!("failed to create {}", path.display()))?;
        info!("Created default config at {}", path.display());
        Ok(config)
      },
      Err(error) => Err(error).context(format!("failed to read {}", path.display()))
    }
  }

  /// Engine options as name/value pairs, with values rendered the way UCI expects them.
  pub fn engine_options(&self) -> impl Iterator<Item = (&str, String)> + '_ {
    self.engine_options.iter().map(|(name, value)| {
      let value = match value {
        toml::Value::String(value) => value.clone(),
        value => value.to_string()
      };

      (name.as_str(), value)
    })
  }
}

impl Default for Config {
  fn default() -> Self {
    Config {
      engine_path: default_engine_path(),
      engine_args: Vec::new(),
      move_time: default_move_time(),
      skill_level: None,
      human_side: Side::default(),
      assets_dir: default_assets_dir(),
      font_path: None,
      square_size: default_square_size(),
      animation_frames: default_animation_frames(),
      animation_frame_delay: default_animation_frame_delay(),
      engine_options: BTreeMap::new()
    }
  }
}

fn default_engine_path() -> PathBuf {
  PathBuf::from("./chess_engine/stockfish")
}

fn default_move_time() -> Duration {
  Duration::from_secs_f64(1.0)
}

fn default_assets_dir() -> PathBuf {
  PathBuf::from("./images")
}

fn default_square_size() -> u32 {
  80
}

fn default_animation_frames() -> u32 {
  10
}

fn default_animation_frame_delay() -> Duration {
  Duration::from_secs_f64(0.01)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
  #[default]
  White,
  Black
}

impl Side {
  pub fn color(self) -> Color {
    match self {
      Side::White => Color::White,
      Side::Black => Color::Black
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkillLevelError {
  #[error("0-20 only")]
  OutOfRange,
  #[error("Invalid input")]
  Invalid
}

/// Parses a skill level typed by the player.
pub fn parse_skill_level(text: &str) -> Result<u8, SkillLevelError> {
  let value = text.trim().parse::<i64>().map_err(|_| SkillLevelError::Invalid)?;
  u8::try_from(value).ok()
    .filter(|&value| value <= SKILL_LEVEL_MAX)
    .ok_or(SkillLevelError::OutOfRange)
}



fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
  let secs = f64::deserialize(deserializer)?;
  Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

fn serialize_duration<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_f64(duration.as_secs_f64())
}

fn deserialize_skill_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
  <Option<i64>>::deserialize(deserializer)?
    .map(|value| match u8::try_from(value) {
      Ok(value) if value <= SKILL_LEVEL_MAX => Ok(value),
      _ => Err(serde::de::Error::invalid_value(
        serde::de::Unexpected::Signed(value),
        &"a skill level between 0 and 20"
      ))
    })
    .transpose()
}

fn deserialize_square_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
  let value = u32::deserialize(deserializer)?;
  if SQUARE_SIZE_RANGE.contains(&value) {
    Ok(value)
  } else {
    Err(serde::de::Error::invalid_value(
      serde::de::Unexpected::Unsigned(value as u64),
      &"a square size between 16 and 256"
    ))
  }
}

fn deserialize_animation_frames<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
  let value = u32::deserialize(deserializer)?;
  if value <= ANIMATION_FRAMES_MAX {
    Ok(value)
  } else {
    Err(serde::de::Error::invalid_value(
      serde::de::Unexpected::Unsigned(value as u64),
      &"at most 120 animation frames"
    ))
  }
}
