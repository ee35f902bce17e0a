use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::StoryError;

/// Everything the writer needs to know about the story the user wants.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoryRequest {
    pub persona: String,
    pub setting: String,
    pub characters: String,
    #[serde(default)]
    pub plot_elements: String,
    #[serde(default)]
    pub writing_style: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub point_of_view: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub content_rating: String,
    #[serde(default)]
    pub ending: String,
    #[serde(default = "default_page_length")]
    pub page_length: usize,
}

pub const MIN_PAGES: usize = 1;
pub const MAX_PAGES: usize = 10;
pub const DEFAULT_PAGES: usize = 3;

fn default_page_length() -> usize {
    DEFAULT_PAGES
}

impl StoryRequest {
    /// `page_length × words_per_page`. Fails on a zero page size or on overflow.
    pub fn target_words(&self, words_per_page: usize) -> Result<usize, StoryError> {
        if words_per_page == 0 {
            return Err(StoryError::InvalidRequest(
                "words per page must be at least 1".to_string(),
            ));
        }
        self.page_length
            .checked_mul(words_per_page)
            .ok_or_else(|| StoryError::InvalidRequest("story length overflows".to_string()))
    }

    pub fn validate(&self) -> Result<(), StoryError> {
        if !(MIN_PAGES..=MAX_PAGES).contains(&self.page_length) {
            return Err(StoryError::InvalidRequest(format!(
                "page length must be between {} and {}, got {}",
                MIN_PAGES, MAX_PAGES, self.page_length
            )));
        }
        if self.setting.trim().is_empty() {
            return Err(StoryError::InvalidRequest("setting is empty".to_string()));
        }
        if self.characters.trim().is_empty() {
            return Err(StoryError::InvalidRequest("characters are empty".to_string()));
        }
        Ok(())
    }

    pub fn summary(&self, words_per_page: usize) -> String {
        format!(
            "A story set in {} featuring {}. Plot: {}. Written in a {} style with a {} tone, \
             from a {} perspective, for a {} audience rated {}, with a {} ending. \
             Length: {} pages (about {} words).",
            self.setting,
            self.characters,
            self.plot_elements,
            self.writing_style,
            self.tone,
            self.point_of_view,
            self.audience,
            self.content_rating,
            self.ending,
            self.page_length,
            self.page_length.saturating_mul(words_per_page)
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let request: StoryRequest = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(request)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_request(page_length: usize) -> StoryRequest {
    StoryRequest {
        persona: "You are a mystery novelist.".to_string(),
        setting: "a lighthouse on a foggy coast".to_string(),
        characters: "a retired keeper and a runaway girl".to_string(),
        plot_elements: "a ship that vanished decades ago".to_string(),
        writing_style: "Formal".to_string(),
        tone: "Suspenseful".to_string(),
        point_of_view: "Third Person Limited".to_string(),
        audience: "Young Adults".to_string(),
        content_rating: "PG".to_string(),
        ending: "Twist".to_string(),
        page_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_words() -> Result<()> {
        assert_eq!(sample_request(1).target_words(300)?, 300);
        assert_eq!(sample_request(3).target_words(300)?, 900);
        Ok(())
    }

    #[test]
    fn test_target_words_rejects_zero_page_size() {
        assert!(matches!(
            sample_request(3).target_words(0),
            Err(StoryError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_target_words_overflow_is_an_error() {
        let huge = sample_request(usize::MAX / 2);
        assert!(matches!(
            huge.target_words(300),
            Err(StoryError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(sample_request(1).validate().is_ok());
        assert!(matches!(
            sample_request(0).validate(),
            Err(StoryError::InvalidRequest(_))
        ));

        assert!(sample_request(MAX_PAGES).validate().is_ok());
        assert!(matches!(
            sample_request(MAX_PAGES + 1).validate(),
            Err(StoryError::InvalidRequest(_))
        ));
        assert!(sample_request(usize::MAX / 2).validate().is_err());

        let mut blank = sample_request(2);
        blank.setting = "  ".to_string();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_gets_default_length() -> Result<()> {
        let yaml = "persona: poet\nsetting: Venice\ncharacters: two gondoliers\n";
        let request: StoryRequest = serde_yaml_ng::from_str(yaml)?;
        assert_eq!(request.page_length, DEFAULT_PAGES);
        assert!(request.tone.is_empty());
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("story.yml");
        let request = sample_request(4);
        request.save(&path)?;
        assert_eq!(StoryRequest::load(&path)?, request);
        Ok(())
    }

    #[test]
    fn test_summary_mentions_target() {
        let summary = sample_request(2).summary(300);
        assert!(summary.contains("a lighthouse on a foggy coast"));
        assert!(summary.contains("about 600 words"));
    }
}
