#![warn(missing_debug_implementations)]
#[macro_use] extern crate log;
#[macro_use] extern crate serde;
#[macro_use] extern crate thiserror;
extern crate chrono;
extern crate eframe;
extern crate fern;
extern crate fs_err;
extern crate gambit_render;
extern crate gambit_uci;
extern crate itertools;
extern crate toml;

pub(crate) mod animation;
pub(crate) mod app;
pub(crate) mod config;
pub(crate) mod game;
pub(crate) mod handler;
pub(crate) mod logger;
pub(crate) mod prelude;
pub(crate) mod utils;

fn main() {
  if let Err(error) = logger::setup() {
    eprintln!("failed to set up logger: {error}");
    std::process::exit(1);
  };

  if let Err(error) = crate::handler::launch() {
    error!("{error}");
    std::process::exit(1);
  };
}

pub type GambitResult<T = ()> = Result<T, GambitError>;

#[derive(Debug, Error)]
pub enum GambitError {
  #[error("File Error: {1} ({0})")]
  FileError(GambitFileError, String),
  #[error("Asset Error: {1} ({0})")]
  AssetError(gambit_render::AssetsError, String),
  #[error("Engine Error: {1} ({0})")]
  EngineError(gambit_uci::UciError, String),
  #[error("Window Error: {0}")]
  WindowError(eframe::Error),
  #[error("Engine played an illegal move: {0}")]
  IllegalEngineMove(String)
}

#[derive(Debug, Error)]
pub enum GambitFileError {
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),
  #[error(transparent)]
  Image(#[from] gambit_render::image::ImageError)
}
