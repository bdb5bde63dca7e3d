use chrono::Local;
use fern::{Dispatch, InitError};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;



const LOG_DIR: &str = "./data/";
const LOG_FILE: &str = "./data/latest.log";

/// Logs colored lines to stdout and plain lines to `./data/latest.log`.
pub fn setup() -> Result<(), InitError> {
  let me = env!("CARGO_PKG_NAME").replace('-', "_");

  let colors = ColoredLevelConfig::new()
    .error(Color::Red)
    .warn(Color::Yellow)
    .info(Color::White)
    .debug(Color::BrightBlue)
    .trace(Color::BrightBlack);

  let stdout = Dispatch::new()
    .format(move |out, message, record| {
      out.finish(format_args!(
        "{time}[{level}]({target}) {message}",
        time = Local::now().format("[%H:%M:%S]"),
        level = colors.color(record.level()),
        target = record.target(),
        message = message
      ))
    })
    .chain(std::io::stdout());

  let file = Dispatch::new()
    .format(move |out, message, record| {
      out.finish(format_args!(
        "{time}[{level}]({target}) {message}",
        time = Local::now().format("[%Y-%m-%d %H:%M:%S]"),
        level = record.level(),
        target = record.target(),
        message = message
      ))
    })
    .chain({
      fs_err::create_dir_all(LOG_DIR)?;
      fern::log_file(LOG_FILE)?
    });

  Dispatch::new()
    .level(LevelFilter::Warn)
    .level_for(me, LevelFilter::Trace)
    .level_for("gambit_render", LevelFilter::Debug)
    .level_for("gambit_uci", LevelFilter::Debug)
    .chain(stdout)
    .chain(file)
    .apply()?;
  Ok(())
}
