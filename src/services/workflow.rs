use anyhow::Context;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::config::StoryConfig;
use crate::core::error::{Stage, StoryError};
use crate::core::request::StoryRequest;
use crate::core::state::{GenerationState, Phase};
use crate::services::progress::{Progress, ProgressObserver};
use crate::services::prompts::PromptSet;
use crate::services::retry::Submitter;
use crate::utils::text::{finalize, word_count};

/// A finished story together with the intermediate artifacts that shaped it.
#[derive(Debug, Clone)]
pub struct Story {
    pub premise: String,
    pub outline: String,
    pub text: String,
    pub word_count: usize,
    pub target_words: usize,
    pub continuations: usize,
}

impl Story {
    pub fn to_markdown(&self) -> String {
        format!(
            "## Premise\n\n{}\n\n## Outline\n\n{}\n\n## Story\n\n{}\n",
            self.premise, self.outline, self.text
        )
    }

    /// Writes `story_<unix-seconds>.md` into `folder` and returns its path.
    pub fn save(&self, folder: &str) -> anyhow::Result<PathBuf> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = Path::new(folder).join(format!("story_{}.md", stamp));
        fs::create_dir_all(folder)?;
        fs::write(&path, self.to_markdown())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Drives premise → outline → opening → continuations → post-processing.
///
/// `write` keeps all mutable state local to the call, so one workflow can serve
/// several requests at the same time.
pub struct StoryWorkflow {
    submitter: Submitter,
    config: StoryConfig,
}

impl StoryWorkflow {
    pub fn new(submitter: Submitter, config: StoryConfig) -> Self {
        Self { submitter, config }
    }

    pub async fn write(
        &self,
        request: &StoryRequest,
        progress: &dyn ProgressObserver,
    ) -> Result<Story, StoryError> {
        let result = self.write_story(request, progress).await;
        if let Err(e) = &result {
            progress.on_fail(e);
        }
        result
    }

    async fn write_story(
        &self,
        request: &StoryRequest,
        progress: &dyn ProgressObserver,
    ) -> Result<Story, StoryError> {
        request.validate()?;
        let target_words = request.target_words(self.config.words_per_page)?;

        let opening_words = self.config.opening_word_cap.min(target_words);
        let prompts = PromptSet::build(request, opening_words, target_words);
        info!("Writing story: target {} words", target_words);

        let mut state = GenerationState::new();
        if let Err(e) = self
            .generate(&prompts, target_words, &mut state, progress)
            .await
        {
            warn!(
                "Story generation failed in phase {:?} after {} segments: {}",
                state.phase,
                state.segments(),
                e
            );
            return Err(e);
        }

        let text = finalize(
            state.draft(),
            target_words,
            self.config.sentences_per_paragraph,
        );
        let words = word_count(&text);
        progress.on_finish(words);
        info!(
            "Story complete: {} words (draft {}, target {})",
            words,
            state.word_count(),
            target_words
        );

        Ok(Story {
            continuations: state.segments().saturating_sub(1),
            premise: state.premise,
            outline: state.outline,
            text,
            word_count: words,
            target_words,
        })
    }

    async fn generate(
        &self,
        prompts: &PromptSet,
        target_words: usize,
        state: &mut GenerationState,
        progress: &dyn ProgressObserver,
    ) -> Result<(), StoryError> {
        let notify = |stage: Stage, words: usize| {
            progress.on_progress(&Progress {
                stage,
                words,
                target: target_words,
            })
        };

        state.premise = self
            .run_stage(Stage::Premise, &prompts.premise_prompt())
            .await?;
        state.phase = Phase::PremiseGenerated;
        info!("Premise: {}", state.premise);
        notify(Stage::Premise, 0);

        let prompt = prompts.outline_prompt(&state.premise);
        state.outline = self.run_stage(Stage::Outline, &prompt).await?;
        state.phase = Phase::OutlineGenerated;
        info!("Outline:\n{}", state.outline);
        notify(Stage::Outline, 0);

        let prompt = prompts.opening_prompt(&state.premise, &state.outline);
        let opening = self.run_stage(Stage::Opening, &prompt).await?;
        state.push_segment(&opening);
        state.phase = Phase::Drafting;
        notify(Stage::Opening, state.word_count());

        let mut continuations = 0;
        // Checked before every continuation: an opening that already meets the target needs none.
        while !state.reached(target_words) {
            if continuations >= self.config.max_continuations {
                warn!(
                    "Stopping after {} continuations at {}/{} words without completion marker",
                    continuations,
                    state.word_count(),
                    target_words
                );
                break;
            }
            continuations += 1;
            let stage = Stage::Continuation(continuations);

            let prompt =
                prompts.continuation_prompt(&state.premise, &state.outline, state.draft());
            let segment = self.run_stage(stage, &prompt).await?;
            state.push_segment(&segment);
            debug!(
                "{}: {}/{} words, complete: {}",
                stage,
                state.word_count(),
                target_words,
                state.is_complete()
            );
            notify(stage, state.word_count());
        }

        Ok(())
    }

    async fn run_stage(&self, stage: Stage, prompt: &str) -> Result<String, StoryError> {
        let text = self
            .submitter
            .submit(prompt)
            .await
            .map_err(|source| StoryError::Stage { stage, source })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(StoryError::EmptyResult { stage });
        }
        Ok(text.to_string())
    }
}
