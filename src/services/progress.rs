use indicatif::{ProgressBar, ProgressStyle};

use crate::core::error::{Stage, StoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    pub words: usize,
    pub target: usize,
}

/// Receives a notification after every completed stage.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &Progress);

    fn on_finish(&self, _words: usize) {}

    fn on_fail(&self, _error: &StoryError) {}
}

pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _progress: &Progress) {}
}

/// Terminal progress bar measured in words.
pub struct ConsoleProgress {
    pb: ProgressBar,
}

impl ConsoleProgress {
    pub fn new(target_words: usize) -> anyhow::Result<Self> {
        let pb = ProgressBar::new(target_words as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} words {msg}")?
                .progress_chars("#>-"),
        );
        Ok(Self { pb })
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&self, progress: &Progress) {
        self.pb.set_message(progress.stage.to_string());
        self.pb
            .set_position(progress.words.min(progress.target) as u64);
    }

    fn on_finish(&self, words: usize) {
        self.pb.finish_with_message(format!("story complete ({} words)", words));
    }

    fn on_fail(&self, error: &StoryError) {
        let stage = error
            .stage()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "request".to_string());
        self.pb.abandon_with_message(format!("failed at {}", stage));
    }
}
