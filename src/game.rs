use gambit_render::shakmaty::uci::UciMove;
use gambit_render::shakmaty::{CastlingMode, Chess, Color, Move, Position, Role, Square};
use itertools::Itertools;

use std::fmt;



#[derive(Debug, Clone)]
struct Ply {
  before: Chess,
  played: Move
}

/// The piece the player currently has picked up, with every legal move starting from it.
#[derive(Debug, Clone)]
pub struct Selection {
  pub square: Square,
  pub moves: Vec<Move>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Click {
  Selected,
  Deselected,
  Move(Move),
  Ignored
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
  Ongoing,
  Checkmate { winner: Color },
  Stalemate,
  InsufficientMaterial
}

impl GameStatus {
  pub fn is_over(self) -> bool {
    self != GameStatus::Ongoing
  }
}

impl fmt::Display for GameStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GameStatus::Ongoing => f.write_str("Game in progress"),
      GameStatus::Checkmate { winner: Color::White } => f.write_str("Checkmate! White wins!"),
      GameStatus::Checkmate { winner: Color::Black } => f.write_str("Checkmate! Black wins!"),
      GameStatus::Stalemate => f.write_str("Stalemate! The game is a draw."),
      GameStatus::InsufficientMaterial => f.write_str("Insufficient material! The game is a draw.")
    }
  }
}

#[derive(Debug, Error)]
#[error("illegal move: {0}")]
pub struct IllegalMove(pub String);

#[derive(Debug, Clone, Default)]
pub struct Game {
  position: Chess,
  history: Vec<Ply>,
  selection: Option<Selection>
}

impl Game {
  pub fn new() -> Self {
    Game::default()
  }

  pub fn position(&self) -> &Chess {
    &self.position
  }

  pub fn turn(&self) -> Color {
    self.position.turn()
  }

  pub fn selection(&self) -> Option<&Selection> {
    self.selection.as_ref()
  }

  pub fn moves_played(&self) -> usize {
    self.history.len()
  }

  /// Squares the selected piece can be moved to.
  pub fn destinations(&self) -> Vec<Square> {
    self.selection.iter()
      .flat_map(|selection| selection.moves.iter().map(destination))
      .unique()
      .collect()
  }

  pub fn click(&mut self, square: Square) -> Click {
    match self.selection.take() {
      None => {
        let own_piece = self.position.board().piece_at(square)
          .is_some_and(|piece| piece.color == self.position.turn());
        if !own_piece { return Click::Ignored };

        let moves = self.position.legal_moves().into_iter()
          .filter(|m| m.from() == Some(square))
          .collect::<Vec<Move>>();
        self.selection = Some(Selection { square, moves });
        Click::Selected
      },
      Some(selection) if selection.square == square => Click::Deselected,
      Some(selection) => {
        // several moves share a destination only when promoting
        selection.moves.into_iter()
          .filter(|m| destination(m) == square)
          .max_by_key(|m| m.promotion() == Some(Role::Queen))
          .map_or(Click::Deselected, Click::Move)
      }
    }
  }

  /// Plays `m` if it is legal in the current position.
  pub fn play(&mut self, m: Move) -> Result<(), IllegalMove> {
    let before = self.position.clone();
    let after = before.clone().play(m.clone())
      .map_err(|_| IllegalMove(m.to_uci(CastlingMode::Standard).to_string()))?;
    self.position = after;
    self.history.push(Ply { before, played: m });
    self.selection = None;
    Ok(())
  }

  /// Reads a move in UCI notation, as an engine reports it.
  pub fn parse_uci(&self, text: &str) -> Result<Move, IllegalMove> {
    text.parse::<UciMove>().ok()
      .and_then(|uci| uci.to_move(&self.position).ok())
      .ok_or_else(|| IllegalMove(text.to_owned()))
  }

  /// Takes back the last two plies, or one if only one has been played.
  pub fn undo(&mut self) -> usize {
    self.selection = None;
    let mut undone = 0;
    while undone < 2 {
      let Some(ply) = self.history.pop() else { break };
      self.position = ply.before;
      undone += 1;
    };

    undone
  }

  pub fn status(&self) -> GameStatus {
    if self.position.is_checkmate() {
      GameStatus::Checkmate { winner: !self.position.turn() }
    } else if self.position.is_stalemate() {
      GameStatus::Stalemate
    } else if self.position.is_insufficient_material() {
      GameStatus::InsufficientMaterial
    } else {
      GameStatus::Ongoing
    }
  }

  pub fn uci_moves(&self) -> Vec<UciMove> {
    self.history.iter()
      .map(|ply| ply.played.to_uci(CastlingMode::Standard))
      .collect()
  }

  /// The squares a piece left and arrived on in the last ply.
  pub fn last_move(&self) -> Vec<Square> {
    let Some(ply) = self.history.last() else { return Vec::new() };
    ply.played.from().into_iter()
      .chain(std::iter::once(destination(&ply.played)))
      .collect()
  }
}

/// The square a move is made by clicking, which for castling is the king's target square.
pub fn destination(m: &Move) -> Square {
  match m.to_uci(CastlingMode::Standard) {
    UciMove::Normal { to, .. } => to,
    _ => m.to()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn play_all(game: &mut Game, moves: &[&str]) {
    for text in moves {
      let m = game.parse_uci(text).unwrap();
      game.play(m).unwrap();
    };
  }

  #[test]
  fn test_select_and_deselect() {
    let mut game = Game::new();
    assert_eq!(game.click(Square::E2), Click::Selected);
    assert_eq!(game.selection().map(|s| s.square), Some(Square::E2));
    let mut destinations = game.destinations();
    destinations.sort();
    assert_eq!(destinations, [Square::E3, Square::E4]);

    assert_eq!(game.click(Square::E2), Click::Deselected);
    assert!(game.selection().is_none());

    game.click(Square::G1);
    assert_eq!(game.click(Square::G4), Click::Deselected);
    assert!(game.selection().is_none());
    assert!(game.destinations().is_empty());
  }

  #[test]
  fn test_ignored_clicks() {
    let mut game = Game::new();
    assert_eq!(game.click(Square::E4), Click::Ignored);
    assert_eq!(game.click(Square::E7), Click::Ignored);
    assert!(game.selection().is_none());
  }

  #[test]
  fn test_another_piece_deselects() {
    let mut game = Game::new();
    game.click(Square::E2);
    assert_eq!(game.click(Square::D2), Click::Deselected);
    assert!(game.selection().is_none());
  }

  #[test]
  fn test_click_move() {
    let mut game = Game::new();
    game.click(Square::E2);
    let Click::Move(m) = game.click(Square::E4) else { panic!("expected a move") };
    assert!(game.selection().is_none());
    game.play(m).unwrap();

    assert_eq!(game.turn(), Color::Black);
    assert_eq!(game.moves_played(), 1);
    assert_eq!(game.last_move(), [Square::E2, Square::E4]);
    assert_eq!(game.uci_moves().iter().map(ToString::to_string).collect::<Vec<_>>(), ["e2e4"]);
  }

  #[test]
  fn test_castling_by_king_destination() {
    let mut game = Game::new();
    play_all(&mut game, &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6"]);
    game.click(Square::E1);
    assert!(game.destinations().contains(&Square::G1));
    assert!(!game.destinations().contains(&Square::H1));

    let Click::Move(m) = game.click(Square::G1) else { panic!("expected castling") };
    assert!(m.is_castle());
    game.play(m).unwrap();
    assert_eq!(game.uci_moves().last().map(ToString::to_string).as_deref(), Some("e1g1"));
    assert_eq!(game.last_move(), [Square::E1, Square::G1]);
  }

  #[test]
  fn test_promotion_prefers_queen() {
    let mut game = Game::new();
    play_all(&mut game, &["a2a4", "b7b5", "a4b5", "a7a6", "b5a6", "c8b7", "a6b7", "b8c6"]);
    game.click(Square::B7);
    let Click::Move(m) = game.click(Square::B8) else { panic!("expected a promotion") };
    assert_eq!(m.promotion(), Some(Role::Queen));
  }

  #[test]
  fn test_illegal_moves_are_rejected() {
    let mut game = Game::new();
    assert!(game.parse_uci("e2e5").is_err());
    assert!(game.parse_uci("nonsense").is_err());

    let m = game.parse_uci("e2e4").unwrap();
    game.play(m.clone()).unwrap();
    assert!(game.play(m).is_err());
    assert_eq!(game.moves_played(), 1);
  }

  #[test]
  fn test_undo() {
    let mut game = Game::new();
    assert_eq!(game.undo(), 0);

    play_all(&mut game, &["e2e4"]);
    assert_eq!(game.undo(), 1);
    assert_eq!(game.moves_played(), 0);
    assert_eq!(game.turn(), Color::White);

    play_all(&mut game, &["e2e4", "e7e5", "g1f3"]);
    game.click(Square::B8);
    assert_eq!(game.undo(), 2);
    assert!(game.selection().is_none());
    assert_eq!(game.moves_played(), 1);
    assert_eq!(game.turn(), Color::Black);
    assert_eq!(game.last_move(), [Square::E2, Square::E4]);
  }

  #[test]
  fn test_checkmate() {
    let mut game = Game::new();
    play_all(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
    let status = game.status();
    assert_eq!(status, GameStatus::Checkmate { winner: Color::Black });
    assert!(status.is_over());
    assert_eq!(status.to_string(), "Checkmate! Black wins!");
  }

  #[test]
  fn test_stalemate() {
    let mut game = Game::new();
    play_all(&mut game, &[
      "e2e3", "a7a5", "d1h5", "a8a6", "h5a5", "h7h5", "h2h4", "a6h6", "a5c7", "f7f6",
      "c7d7", "e8f7", "d7b7", "d8d3", "b7b8", "d3h7", "b8c8", "f7g6", "c8e6"
    ]);
    assert_eq!(game.status(), GameStatus::Stalemate);
    assert_eq!(Game::new().status(), GameStatus::Ongoing);
  }
}
