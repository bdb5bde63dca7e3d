//! The game window: board rendering, input handling and the turn loop
use crate::animation::Animation;
use crate::config::{Config, SKILL_LEVEL_OPTION, SkillLevelError, parse_skill_level};
use crate::game::{Click, Game, destination};
use crate::prelude::*;

use chrono::Local;
use eframe::egui::{self, Color32, TextureHandle, TextureId, TextureOptions};
use eframe::egui::load::SizedTexture;
use gambit_render::glam::Vec2;
use gambit_render::image::RgbImage;
use gambit_render::shakmaty::{Color, Move, Position, Square};
use gambit_render::{Assets, BoardView, Geometry, encode_image_rgb, render_board};
use gambit_uci::Engine;

use std::io::BufWriter;
use std::path::PathBuf;

const WINDOW_TITLE: &str = "Chess Game";
const TOOLBAR_HEIGHT: f32 = 36.0;
const SNAPSHOT_DIR: &str = "./data/";

const UNDO_COLOR: Color32 = Color32::from_rgb(0xc0, 0x30, 0x30);
const UNDO_HOVER_COLOR: Color32 = Color32::from_rgb(0xe0, 0x50, 0x50);



/// Opens the window and blocks until it is closed. The engine quits when the window is dropped.
pub fn run(config: Config, assets: Assets, engine: Engine) -> GambitResult {
  let board_size = assets.tile_size() as f32 * 8.0;
  let options = eframe::NativeOptions {
    viewport: egui::ViewportBuilder::default()
      .with_title(WINDOW_TITLE)
      .with_inner_size([board_size, board_size + TOOLBAR_HEIGHT])
      .with_resizable(false),
    ..Default::default()
  };

  let app = ChessApp::new(config, assets, engine);
  eframe::run_native(WINDOW_TITLE, options, Box::new(move |_cc| Ok(Box::new(app))))
    .map_err(GambitError::WindowError)
}

enum Phase {
  /// Waiting for the player to pick a skill level.
  Difficulty,
  Human,
  Animating(Animation),
  /// `presented` is set once a frame showing the position has been drawn,
  /// the engine is only asked for a move after that.
  EngineTurn { presented: bool },
  GameOver
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
  Undo,
  NewGame,
  SaveImage
}

#[derive(Debug, Default)]
struct DifficultyPrompt {
  text: String,
  error: Option<SkillLevelError>
}

struct ChessApp {
  config: Config,
  assets: Assets,
  engine: Engine,
  game: Game,
  side: Color,
  phase: Phase,
  texture: Option<TextureHandle>,
  dirty: bool,
  difficulty: DifficultyPrompt,
  dialog: Option<String>
}

impl ChessApp {
  fn new(config: Config, assets: Assets, engine: Engine) -> Self {
    let side = config.human_side.color();
    let ask_difficulty = config.skill_level.is_none();
    let mut app = ChessApp {
      config,
      assets,
      engine,
      game: Game::new(),
      side,
      phase: Phase::Difficulty,
      texture: None,
      dirty: true,
      difficulty: DifficultyPrompt::default(),
      dialog: None
    };

    if !ask_difficulty {
      app.phase = app.turn_phase();
    };

    app
  }

  fn geometry(&self) -> Geometry {
    Geometry::new(self.assets.tile_size(), self.side)
  }

  /// The phase to enter once nothing is in motion.
  fn turn_phase(&self) -> Phase {
    if self.game.status().is_over() {
      Phase::GameOver
    } else if self.game.turn() == self.side {
      Phase::Human
    } else {
      Phase::EngineTurn { presented: false }
    }
  }

  fn advance(&mut self, ctx: &egui::Context) {
    let phase = std::mem::replace(&mut self.phase, Phase::GameOver);
    self.phase = match phase {
      Phase::Animating(animation) => {
        let (frames, delay) = (self.config.animation_frames, self.config.animation_frame_delay);
        self.dirty = true;
        if animation.is_finished(frames, delay) {
          self.finish_move(animation.played)
        } else {
          ctx.request_repaint_after(animation.next_frame_in(delay));
          Phase::Animating(animation)
        }
      },
      Phase::EngineTurn { presented: false } => {
        ctx.request_repaint();
        Phase::EngineTurn { presented: true }
      },
      Phase::EngineTurn { presented: true } => {
        let phase = self.engine_move();
        ctx.request_repaint();
        phase
      },
      phase => phase
    };
  }

  /// Slides the moving piece to its destination, or plays the move outright if there is nothing to slide.
  fn animate(&mut self, m: Move) -> Phase {
    let from = m.from();
    let piece = from.and_then(|square| self.game.position().board().piece_at(square));
    match (from, piece) {
      (Some(from), Some(piece)) => Phase::Animating(Animation::new(piece, from, destination(&m), m)),
      _ => self.finish_move(m)
    }
  }

  fn finish_move(&mut self, m: Move) -> Phase {
    self.dirty = true;
    if let Err(error) = self.game.play(m) {
      error!("{error}");
      return self.turn_phase();
    };

    let status = self.game.status();
    if status.is_over() {
      info!("{status}");
      self.dialog = Some(status.to_string());
    };

    self.turn_phase()
  }

  fn engine_move(&mut self) -> Phase {
    match self.request_engine_move() {
      Ok(m) => self.animate(m),
      Err(error) => {
        self.engine_failed(error);
        Phase::GameOver
      }
    }
  }

  fn request_engine_move(&mut self) -> GambitResult<Move> {
    let best_move = self.engine.best_move(self.game.uci_moves(), self.config.move_time)
      .context("engine failed to choose a move")?;
    debug!("Engine plays {}", best_move.best);
    self.game.parse_uci(&best_move.best)
      .map_err(|_| GambitError::IllegalEngineMove(best_move.best))
  }

  fn engine_failed(&mut self, error: GambitError) {
    error!("{error}");
    self.dialog = Some(error.to_string());
    self.phase = Phase::GameOver;
  }

  fn on_click(&mut self, square: Square) {
    match self.game.click(square) {
      Click::Move(m) => self.phase = self.animate(m),
      Click::Selected => trace!("Selected {square}"),
      Click::Deselected | Click::Ignored => ()
    };

    self.dirty = true;
  }

  fn submit_difficulty(&mut self) {
    match parse_skill_level(&self.difficulty.text) {
      Ok(level) => {
        let result = self.engine.set_option(SKILL_LEVEL_OPTION, level)
          .context("failed to set skill level");
        match result {
          Ok(()) => {
            info!("Skill level set to {level}");
            self.difficulty = DifficultyPrompt::default();
            self.phase = self.turn_phase();
          },
          Err(error) => self.engine_failed(error)
        };
      },
      Err(error) => {
        self.difficulty.error = Some(error);
        self.difficulty.text.clear();
      }
    };
  }

  fn perform(&mut self, action: Action) {
    match action {
      Action::Undo => {
        let undone = self.game.undo();
        info!("Took back {undone} move(s)");
        self.dialog = None;
        self.phase = self.turn_phase();
      },
      Action::NewGame => {
        self.game = Game::new();
        self.dialog = None;
        match self.engine.new_game().context("failed to start a new engine game") {
          Ok(()) => {
            info!("Started a new game");
            self.phase = self.turn_phase();
          },
          Err(error) => self.engine_failed(error)
        };
      },
      Action::SaveImage => {
        if let Some(path) = self.save_image().log_some() {
          info!("Saved board image to {}", path.display());
        };
      }
    };

    self.dirty = true;
  }

  fn save_image(&self) -> GambitResult<PathBuf> {
    let path = PathBuf::from(format!("{SNAPSHOT_DIR}board-{}.png", Local::now().format("%Y-%m-%d_%H-%M-%S")));
    fs_err::create_dir_all(SNAPSHOT_DIR).context("failed to create data directory")?;
    let file = fs_err::File::create(&path).context(format!("failed to create {}", path.display()))?;
    encode_image_rgb(&self.render(), BufWriter::new(file))
      .context(format!("failed to write {}", path.display()))?;
    Ok(path)
  }

  fn render(&self) -> RgbImage {
    let highlighted = self.game.last_move();
    let destinations = self.game.destinations();
    let mut view = BoardView::new(self.game.position(), self.side);
    view.highlighted = &highlighted;
    view.selected = self.game.selection().map(|selection| selection.square);
    view.destinations = &destinations;
    if let Phase::Animating(animation) = &self.phase {
      let progress = animation.progress(self.config.animation_frames, self.config.animation_frame_delay);
      view.floating = Some(animation.floating(&self.geometry(), progress));
    };

    render_board(&view, &self.assets)
  }

  fn board_image(&self) -> egui::ColorImage {
    let img = self.render();
    egui::ColorImage::from_rgb([img.width() as usize, img.height() as usize], img.as_raw())
  }

  /// Re-uploads the board texture if anything changed since the last frame.
  fn board_texture(&mut self, ctx: &egui::Context) -> TextureId {
    let texture = match self.texture.take() {
      Some(texture) if !self.dirty => texture,
      Some(mut texture) => {
        texture.set(self.board_image(), TextureOptions::NEAREST);
        texture
      },
      None => ctx.load_texture("board", self.board_image(), TextureOptions::NEAREST)
    };

    self.dirty = false;
    let id = texture.id();
    self.texture = Some(texture);
    id
  }

  fn status_text(&self) -> String {
    match self.phase {
      Phase::Difficulty => "Choose a difficulty".to_owned(),
      Phase::Human => "Your move".to_owned(),
      Phase::Animating(..) => "Moving...".to_owned(),
      Phase::EngineTurn { .. } => "Engine is thinking...".to_owned(),
      Phase::GameOver => match self.game.status() {
        status if status.is_over() => status.to_string(),
        _ => "Game over".to_owned()
      }
    }
  }

  fn show_toolbar(&self, ctx: &egui::Context) -> Option<Action> {
    let idle = matches!(self.phase, Phase::Human | Phase::GameOver);
    let can_undo = idle && self.game.moves_played() > 0;
    egui::TopBottomPanel::bottom("toolbar").exact_height(TOOLBAR_HEIGHT).show(ctx, |ui| {
      ui.horizontal_centered(|ui| {
        let undo = ui.scope(|ui| {
          let widgets = &mut ui.style_mut().visuals.widgets;
          widgets.inactive.weak_bg_fill = UNDO_COLOR;
          widgets.hovered.weak_bg_fill = UNDO_HOVER_COLOR;
          widgets.active.weak_bg_fill = UNDO_HOVER_COLOR;
          ui.add_enabled(can_undo, egui::Button::new(egui::RichText::new("Undo").color(Color32::WHITE)))
        }).inner;

        let new_game = ui.add_enabled(idle, egui::Button::new("New game"));
        let save_image = ui.button("Save image");
        ui.separator();
        ui.label(self.status_text());

        if undo.clicked() {
          Some(Action::Undo)
        } else if new_game.clicked() {
          Some(Action::NewGame)
        } else if save_image.clicked() {
          Some(Action::SaveImage)
        } else {
          None
        }
      }).inner
    }).inner
  }

  /// Draws the board and returns the square the player clicked, if any.
  fn show_board(&mut self, ctx: &egui::Context) -> Option<Square> {
    let texture = self.board_texture(ctx);
    let geometry = self.geometry();
    let board_size = geometry.board_size() as f32;
    egui::CentralPanel::default().frame(egui::Frame::none()).show(ctx, |ui| {
      let image = egui::Image::new(SizedTexture::new(texture, egui::Vec2::splat(board_size)))
        .sense(egui::Sense::click());
      let response = ui.add(image);
      if !response.clicked() { return None };
      let pointer = response.interact_pointer_pos()?;
      let local = pointer - response.rect.min;
      geometry.square_at(board_pixel(Vec2::new(local.x, local.y), response.rect.width(), board_size))
    }).inner
  }

  fn show_dialogs(&mut self, ctx: &egui::Context) {
    if let Phase::Difficulty = self.phase {
      let submitted = egui::Window::new("Difficulty")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
          ui.label("Enter engine skill level (0-20):");
          let response = ui.text_edit_singleline(&mut self.difficulty.text);
          let entered = response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
          response.request_focus();
          if let Some(error) = self.difficulty.error {
            ui.colored_label(Color32::RED, error.to_string());
          };

          ui.button("Start").clicked() || entered
        })
        .and_then(|response| response.inner)
        .unwrap_or(false);
      if submitted {
        self.submit_difficulty();
      };
    };

    if let Some(message) = &self.dialog {
      let dismissed = egui::Window::new("Game Over")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
          ui.label(message);
          ui.button("OK").clicked()
        })
        .and_then(|response| response.inner)
        .unwrap_or(false);
      if dismissed {
        self.dialog = None;
      };
    };
  }
}

impl eframe::App for ChessApp {
  fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
    self.advance(ctx);

    let action = self.show_toolbar(ctx);
    let clicked = self.show_board(ctx);
    self.show_dialogs(ctx);

    if let Some(action) = action {
      self.perform(action);
    };

    if let (Some(square), Phase::Human) = (clicked, &self.phase) {
      self.on_click(square);
    };

    if self.dirty {
      ctx.request_repaint();
    };
  }
}

/// Converts a position within the displayed board to a pixel of the rendered image.
fn board_pixel(local: Vec2, displayed_width: f32, board_size: f32) -> Vec2 {
  if displayed_width <= 0.0 { return Vec2::NAN };
  local * (board_size / displayed_width)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Side;

  use std::path::Path;

  /// An engine that replies to every `go` with `bestmove <reply>`, recording what it receives to `log`.
  #[cfg(unix)]
  fn scripted_engine(log: &Path, reply: &str) -> Engine {
    let _ = std::fs::remove_file(log);
    let script = format!(
      r#"
      while read -r line; do
        echo "$line" >> '{log}'
        case "$line" in
          uci) echo "id name Scripted Engine"; echo "uciok";;
          isready) echo "readyok";;
          go*) echo "bestmove {reply}";;
          quit) exit 0;;
        esac
      done
      "#,
      log = log.display()
    );

    Engine::spawn("sh", ["-c", &script]).unwrap()
  }

  #[cfg(unix)]
  fn test_app(name: &str, config: Config, reply: &str) -> (ChessApp, PathBuf) {
    let log = std::env::temp_dir().join(format!("gambit-app-{name}-{}.log", std::process::id()));
    let sprites = std::iter::repeat_with(|| gambit_render::image::RgbaImage::new(8, 8)).take(12);
    let assets = Assets::from_sprites(16, sprites);
    let engine = scripted_engine(&log, reply);
    (ChessApp::new(config, assets, engine), log)
  }

  fn config(human_side: Side, skill_level: Option<u8>) -> Config {
    Config { human_side, skill_level, ..Config::default() }
  }

  fn play_all(app: &mut ChessApp, moves: &[&str]) {
    for text in moves {
      let m = app.game.parse_uci(text).unwrap();
      app.game.play(m).unwrap();
    };
  }

  #[cfg(unix)]
  #[test]
  fn test_engine_moves_first_for_black() {
    let (mut app, _) = test_app("black-start", config(Side::Black, Some(5)), "e2e4");
    assert!(matches!(app.phase, Phase::EngineTurn { presented: false }));

    let Phase::Animating(animation) = app.engine_move() else { panic!("expected the engine move to animate") };
    assert_eq!((animation.from, animation.to), (Square::E2, Square::E4));
    assert!(matches!(app.finish_move(animation.played), Phase::Human));
    assert_eq!(app.game.moves_played(), 1);
    assert_eq!(app.game.turn(), Color::Black);
  }

  #[cfg(unix)]
  #[test]
  fn test_undo_hands_the_turn_back_to_the_engine() {
    let (mut app, log) = test_app("undo", config(Side::Black, Some(5)), "e2e4");
    play_all(&mut app, &["e2e4"]);
    app.phase = Phase::Human;
    app.perform(Action::Undo);
    assert_eq!(app.game.moves_played(), 0);
    assert!(matches!(app.phase, Phase::EngineTurn { presented: false }));

    play_all(&mut app, &["e2e4", "e7e5"]);
    app.phase = Phase::Human;
    app.perform(Action::NewGame);
    assert_eq!(app.game.moves_played(), 0);
    assert!(matches!(app.phase, Phase::EngineTurn { .. }));
    assert!(std::fs::read_to_string(&log).unwrap().lines().any(|line| line == "ucinewgame"));
  }

  #[cfg(unix)]
  #[test]
  fn test_game_end_opens_dialog() {
    let (mut app, _) = test_app("checkmate", config(Side::White, Some(5)), "e2e4");
    play_all(&mut app, &["f2f3", "e7e5", "g2g4"]);
    let mate = app.game.parse_uci("d8h4").unwrap();
    assert!(matches!(app.finish_move(mate), Phase::GameOver));
    assert_eq!(app.dialog.as_deref(), Some("Checkmate! Black wins!"));

    app.perform(Action::NewGame);
    assert!(app.dialog.is_none());
    play_all(&mut app, &[
      "e2e3", "a7a5", "d1h5", "a8a6", "h5a5", "h7h5", "h2h4", "a6h6", "a5c7", "f7f6",
      "c7d7", "e8f7", "d7b7", "d8d3", "b7b8", "d3h7", "b8c8", "f7g6"
    ]);
    let stalemate = app.game.parse_uci("c8e6").unwrap();
    assert!(matches!(app.finish_move(stalemate), Phase::GameOver));
    assert_eq!(app.dialog.as_deref(), Some("Stalemate! The game is a draw."));
  }

  #[cfg(unix)]
  #[test]
  fn test_engine_failures_end_the_game() {
    let (mut app, _) = test_app("no-move", config(Side::Black, Some(5)), "(none)");
    assert!(matches!(app.engine_move(), Phase::GameOver));
    assert!(matches!(app.phase, Phase::GameOver));
    let dialog = app.dialog.clone().unwrap_or_default();
    assert!(dialog.starts_with("Engine Error"), "{dialog}");

    let (mut app, _) = test_app("illegal", config(Side::Black, Some(5)), "e2e5");
    assert!(matches!(app.engine_move(), Phase::GameOver));
    assert_eq!(app.dialog.as_deref(), Some("Engine played an illegal move: e2e5"));
    assert_eq!(app.game.moves_played(), 0);
  }

  #[cfg(unix)]
  #[test]
  fn test_difficulty_prompt() {
    let (mut app, log) = test_app("difficulty", config(Side::White, None), "e2e4");
    assert!(matches!(app.phase, Phase::Difficulty));

    app.difficulty.text = "25".to_owned();
    app.submit_difficulty();
    assert!(matches!(app.phase, Phase::Difficulty));
    assert_eq!(app.difficulty.error, Some(SkillLevelError::OutOfRange));
    assert!(app.difficulty.text.is_empty());

    app.difficulty.text = "hard".to_owned();
    app.submit_difficulty();
    assert_eq!(app.difficulty.error, Some(SkillLevelError::Invalid));

    app.difficulty.text = " 7 ".to_owned();
    app.submit_difficulty();
    assert!(matches!(app.phase, Phase::Human));
    assert!(app.difficulty.error.is_none());
    let received = std::fs::read_to_string(&log).unwrap();
    assert!(received.lines().any(|line| line == "setoption name Skill Level value 7"), "{received}");
  }

  #[test]
  fn test_board_pixel_scaling() {
    assert_eq!(board_pixel(Vec2::new(10.0, 20.0), 640.0, 640.0), Vec2::new(10.0, 20.0));
    assert_eq!(board_pixel(Vec2::new(10.0, 20.0), 320.0, 640.0), Vec2::new(20.0, 40.0));
    assert!(board_pixel(Vec2::new(10.0, 20.0), 0.0, 640.0).is_nan());
  }

  #[test]
  fn test_clicks_map_to_squares() {
    let geometry = Geometry::new(80, Color::Black);
    let pixel = board_pixel(Vec2::new(5.0, 5.0), 320.0, 640.0);
    assert_eq!(geometry.square_at(pixel), Some(Square::H1));
    let outside = board_pixel(Vec2::new(330.0, 5.0), 320.0, 640.0);
    assert_eq!(geometry.square_at(outside), None);
    assert_eq!(geometry.square_at(board_pixel(Vec2::ZERO, 0.0, 640.0)), None);
  }
}
