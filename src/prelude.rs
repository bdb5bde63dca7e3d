#![allow(unused)]

pub use crate::utils::{Contextualize, Loggable};
pub use crate::{GambitResult, GambitError, GambitFileError};
