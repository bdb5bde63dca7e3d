#[macro_use]
extern crate log;
#[macro_use]
extern crate thiserror;

use itertools::Itertools;

use std::ffi::OsStr;
use std::fmt;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};



/// How long an engine may take to exit after `quit` before it is killed.
const QUIT_GRACE_PERIOD: Duration = Duration::from_secs(2);

pub type UciResult<T = ()> = Result<T, UciError>;

#[derive(Debug, Error)]
pub enum UciError {
  #[error("engine executable not found: {}", .0.display())]
  NotFound(PathBuf),
  #[error(transparent)]
  Io(#[from] io::Error),
  #[error("engine closed its output")]
  Disconnected,
  #[error("engine has no move to play")]
  NoMove
}

/// Identification reported by the engine during the `uci` handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineId {
  pub name: Option<String>,
  pub author: Option<String>
}

/// The engine's answer to a `go` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
  pub best: String,
  pub ponder: Option<String>
}

/// A blocking connection to a UCI engine subprocess.
#[derive(Debug)]
pub struct Engine {
  child: Child,
  stdin: BufWriter<ChildStdin>,
  stdout: BufReader<ChildStdout>,
  id: EngineId,
  quit: bool
}

impl Engine {
  /// Starts the engine and completes the `uci` and `isready` handshakes.
  pub fn spawn<I, S>(path: impl AsRef<Path>, args: I) -> UciResult<Self>
  where I: IntoIterator<Item = S>, S: AsRef<OsStr> {
    let path = path.as_ref();
    let mut child = Command::new(path)
      .args(args)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::null())
      .spawn()
      .map_err(|error| match error.kind() {
        io::ErrorKind::NotFound => UciError::NotFound(path.to_owned()),
        _ => UciError::Io(error)
      })?;

    let stdin = child.stdin.take().map(BufWriter::new)
      .ok_or_else(|| io::Error::other("engine stdin was not captured"))?;
    let stdout = child.stdout.take().map(BufReader::new)
      .ok_or_else(|| io::Error::other("engine stdout was not captured"))?;

    let mut engine = Engine { child, stdin, stdout, id: EngineId::default(), quit: false };
    engine.handshake()?;
    debug!("Engine ready: {}", engine.id);
    Ok(engine)
  }

  pub fn id(&self) -> &EngineId {
    &self.id
  }

  fn handshake(&mut self) -> UciResult {
    self.send("uci")?;
    loop {
      let line = self.read_line()?;
      if line == "uciok" { break };
      // options are not needed, banners and anything else are skipped
      if let Some(("id", rest)) = line.split_once(char::is_whitespace) {
        self.id.parse_line(rest);
      };
    };

    self.sync()
  }

  /// Sends `isready` and waits for `readyok`.
  pub fn sync(&mut self) -> UciResult {
    self.send("isready")?;
    while self.read_line()? != "readyok" {};
    Ok(())
  }

  pub fn set_option(&mut self, name: &str, value: impl fmt::Display) -> UciResult {
    self.send(&format!("setoption name {name} value {value}"))?;
    self.sync()
  }

  pub fn new_game(&mut self) -> UciResult {
    self.send("ucinewgame")?;
    self.sync()
  }

  /// Asks for the best move after playing `moves` from the standard starting position,
  /// searching for `movetime`. Blocks until the engine answers.
  pub fn best_move<I>(&mut self, moves: I, movetime: Duration) -> UciResult<BestMove>
  where I: IntoIterator, I::Item: fmt::Display {
    self.send(&position_command(moves))?;
    self.send(&format!("go movetime {}", movetime.as_millis().max(1)))?;
    loop {
      let line = self.read_line()?;
      if let Some(best_move) = parse_best_move(&line) {
        return best_move;
      };
    };
  }

  /// Sends `quit` and waits for the process to exit.
  pub fn quit(mut self) -> UciResult {
    self.shutdown()
  }

  fn shutdown(&mut self) -> UciResult {
    if self.quit { return Ok(()) };
    self.quit = true;
    if let Err(error) = self.send("quit") {
      warn!("Failed to deliver quit command, killing engine: {error}");
      self.child.kill()?;
    } else if !self.wait_for_exit(QUIT_GRACE_PERIOD)? {
      warn!("Engine ignored quit command, killing engine");
      self.child.kill()?;
    };

    let status = self.child.wait()?;
    debug!("Engine exited with {status}");
    Ok(())
  }

  /// Polls the process until it exits, returning false if it is still running after `timeout`.
  fn wait_for_exit(&mut self, timeout: Duration) -> UciResult<bool> {
    let deadline = Instant::now() + timeout;
    loop {
      if self.child.try_wait()?.is_some() { return Ok(true) };
      if Instant::now() >= deadline { return Ok(false) };
      std::thread::sleep(Duration::from_millis(10));
    };
  }

  fn send(&mut self, command: &str) -> UciResult {
    trace!("> {command}");
    writeln!(self.stdin, "{command}")?;
    self.stdin.flush()?;
    Ok(())
  }

  fn read_line(&mut self) -> UciResult<String> {
    let mut line = String::new();
    if self.stdout.read_line(&mut line)? == 0 {
      return Err(UciError::Disconnected);
    };

    let line = line.trim().to_owned();
    trace!("< {line}");
    Ok(line)
  }
}

impl Drop for Engine {
  fn drop(&mut self) {
    if let Err(error) = self.shutdown() {
      error!("Failed to shut down engine: {error}");
    };
  }
}

impl EngineId {
  fn parse_line(&mut self, rest: &str) {
    match rest.trim().split_once(char::is_whitespace) {
      Some(("name", name)) => self.name = Some(name.trim().to_owned()),
      Some(("author", author)) => self.author = Some(author.trim().to_owned()),
      _ => ()
    };
  }
}

impl fmt::Display for EngineId {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name.as_deref().unwrap_or("unknown engine"))?;
    if let Some(author) = &self.author {
      write!(f, " by {author}")?;
    };

    Ok(())
  }
}

fn position_command<I>(moves: I) -> String
where I: IntoIterator, I::Item: fmt::Display {
  let mut moves = moves.into_iter().peekable();
  match moves.peek() {
    Some(..) => format!("position startpos moves {}", moves.join(" ")),
    None => "position startpos".to_owned()
  }
}

/// Parses a `bestmove` line, returning `None` for any other line.
fn parse_best_move(line: &str) -> Option<UciResult<BestMove>> {
  let mut tokens = line.split_whitespace();
  if tokens.next() != Some("bestmove") { return None };
  let best = match tokens.next() {
    None | Some("(none)") | Some("0000") => return Some(Err(UciError::NoMove)),
    Some(best) => best.to_owned()
  };

  let ponder = match (tokens.next(), tokens.next()) {
    (Some("ponder"), Some(ponder)) => Some(ponder.to_owned()),
    _ => None
  };

  Some(Ok(BestMove { best, ponder }))
}
