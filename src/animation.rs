use gambit_render::{Floating, Geometry};
use gambit_render::shakmaty::{Move, Piece, Square};

use std::time::{Duration, Instant};



/// A piece sliding from one square to another before its move is played.
#[derive(Debug, Clone)]
pub struct Animation {
  pub piece: Piece,
  pub from: Square,
  pub to: Square,
  pub played: Move,
  pub started: Instant
}

impl Animation {
  pub fn new(piece: Piece, from: Square, to: Square, played: Move) -> Self {
    Animation { piece, from, to, played, started: Instant::now() }
  }

  /// How far along the animation is, from `0.0` to `1.0`, advancing in `frames` whole steps.
  pub fn progress(&self, frames: u32, delay: Duration) -> f32 {
    if frames == 0 || delay.is_zero() { return 1.0 };
    let steps = (self.started.elapsed().as_secs_f64() / delay.as_secs_f64()).floor();
    steps.min(frames as f64) as f32 / frames as f32
  }

  pub fn is_finished(&self, frames: u32, delay: Duration) -> bool {
    self.progress(frames, delay) >= 1.0
  }

  /// Time left until the next step is due.
  pub fn next_frame_in(&self, delay: Duration) -> Duration {
    let elapsed = self.started.elapsed().as_nanos();
    let delay_nanos = delay.as_nanos().max(1);
    let remaining = delay_nanos - elapsed % delay_nanos;
    Duration::from_nanos(u64::try_from(remaining).unwrap_or(u64::MAX))
  }

  pub fn floating(&self, geometry: &Geometry, progress: f32) -> Floating {
    let start = geometry.square_origin(self.from).as_vec2();
    let end = geometry.square_origin(self.to).as_vec2();
    Floating { piece: self.piece, origin: self.from, pos: start.lerp(end, progress.clamp(0.0, 1.0)) }
  }
}
