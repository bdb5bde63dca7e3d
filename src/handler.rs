//! Items and functions associated with launching the game window
use crate::app;
use crate::config::{Config, SKILL_LEVEL_OPTION};
use crate::prelude::*;

use gambit_render::Assets;
use gambit_uci::Engine;



/// Loads the config, the piece sprites and the engine, then runs the window until it is closed.
pub fn launch() -> GambitResult {
  let config = Config::create()?;

  let assets = Assets::load(&config.assets_dir, config.square_size, config.font_path.as_deref())
    .context("failed to load piece images")?;
  info!("Loaded piece images from {}", config.assets_dir.display());

  let mut engine = Engine::spawn(&config.engine_path, &config.engine_args)
    .context("failed to start engine, check engine_path in config.toml")?;
  info!("Engine connected: {}", engine.id());

  for (name, value) in config.engine_options() {
    engine.set_option(name, &value).context(format!("failed to set engine option {name}"))?;
    debug!("Set engine option {name} = {value}");
  };

  if let Some(skill_level) = config.skill_level {
    engine.set_option(SKILL_LEVEL_OPTION, skill_level).context("failed to set skill level")?;
    info!("Skill level set to {skill_level} from config");
  };

  app::run(config, assets, engine)?;
  info!("Window closed, shutting down");
  Ok(())
}
