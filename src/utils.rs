use crate::{GambitError, GambitFileError, GambitResult};

use gambit_render::AssetsError;
use gambit_render::image::ImageError;
use gambit_uci::UciError;

use std::error::Error;



pub trait Contextualize {
  type Output;

  fn context(self, context: impl Into<String>) -> Self::Output;

  fn context_log(self, context: impl Into<String>)
  where Self: Sized, Self::Output: Loggable {
    self.context(context).log()
  }
}

macro_rules! impl_contextualize_file {
  ($($Error:ty),* $(,)?) => {$(
    impl<T> Contextualize for Result<T, $Error> {
      type Output = GambitResult<T>;

      fn context(self, context: impl Into<String>) -> Self::Output {
        self.map_err(|error| GambitError::FileError(GambitFileError::from(error), context.into()))
      }
    }
  )*};
}

impl_contextualize_file!(std::io::Error, toml::de::Error, toml::ser::Error, ImageError);

impl<T> Contextualize for Result<T, AssetsError> {
  type Output = GambitResult<T>;

  fn context(self, context: impl Into<String>) -> Self::Output {
    self.map_err(|error| GambitError::AssetError(error, context.into()))
  }
}

impl<T> Contextualize for Result<T, UciError> {
  type Output = GambitResult<T>;

  fn context(self, context: impl Into<String>) -> Self::Output {
    self.map_err(|error| GambitError::EngineError(error, context.into()))
  }
}

pub trait Loggable {
  type Ok;
  type Err: Error;

  fn log(self);
  fn log_some(self) -> Option<Self::Ok>;
}

impl<T, E: Error> Loggable for Result<T, E> {
  type Ok = T;
  type Err = E;

  fn log(self) {
    if let Err(error) = self {
      error!("{error}");
    };
  }

  fn log_some(self) -> Option<T> {
    match self {
      Ok(value) => Some(value),
      Err(error) => {
        error!("{error}");
        None
      }
    }
  }
}
