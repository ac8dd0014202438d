//! Progress bar over the targets of a Pack stage
//!
//! Uses `linya` for allocation-free progress bars on stderr

use linya::{Bar, Progress};

pub struct TargetProgress {
  progress: Progress,
  bar: Bar,
}

impl TargetProgress {
  /// Create a bar for packing `total` targets of one service
  pub fn new(total: usize, service: &str) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, format!("pack {}", service));
    Self { progress, bar }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
