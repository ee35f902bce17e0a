use crate::utils::text::{word_count, SENTINEL};

pub const SEGMENT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PremiseGenerated,
    OutlineGenerated,
    Drafting,
}

/// Per-request generation state. Lives only for one `StoryWorkflow::write` call.
#[derive(Debug, Clone)]
pub struct GenerationState {
    pub phase: Phase,
    pub premise: String,
    pub outline: String,
    draft: String,
    word_count: usize,
    segments: usize,
    complete: bool,
}

impl Default for GenerationState {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            premise: String::new(),
            outline: String::new(),
            draft: String::new(),
            word_count: 0,
            segments: 0,
            complete: false,
        }
    }

    /// Appends a segment and recounts the whole draft.
    pub fn push_segment(&mut self, segment: &str) {
        if self.segments > 0 {
            self.draft.push_str(SEGMENT_SEPARATOR);
        }
        self.draft.push_str(segment);
        self.segments += 1;
        self.word_count = word_count(&self.draft);
        self.complete = segment.contains(SENTINEL);
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Whether the latest segment carried the sentinel.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn reached(&self, target_words: usize) -> bool {
        self.complete || self.word_count >= target_words
    }
}
