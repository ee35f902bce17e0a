use anyhow::{bail, Result};
use inquire::error::CustomUserError;
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, Text};
use std::path::Path;

use crate::core::config::Config;
use crate::core::request::{StoryRequest, DEFAULT_PAGES, MAX_PAGES, MIN_PAGES};

/// Loads the saved story request, or asks for one interactively and offers to save it.
pub fn run_setup(config: &Config) -> Result<StoryRequest> {
    if let Some(request) = load_saved_request(config)? {
        return Ok(request);
    }

    let request = prompt_request()?;
    let path = Path::new(&config.request_file);
    if Confirm::new(&format!("Save these answers to {}?", path.display()))
        .with_default(true)
        .prompt()?
    {
        request.save(path)?;
        println!("Story request saved.");
    }
    Ok(request)
}

fn load_saved_request(config: &Config) -> Result<Option<StoryRequest>> {
    let path = Path::new(&config.request_file);
    if path.exists() {
        println!("Loading story request from {}", path.display());
        return Ok(Some(StoryRequest::load(path)?));
    }
    if config.unattended {
        bail!(
            "{} not found and unattended mode is enabled. Please create one.",
            path.display()
        );
    }
    Ok(None)
}

fn required(input: &str) -> Result<Validation, CustomUserError> {
    if input.trim().is_empty() {
        Ok(Validation::Invalid("This field is required.".into()))
    } else {
        Ok(Validation::Valid)
    }
}

fn page_range(pages: &usize) -> Result<Validation, CustomUserError> {
    if (MIN_PAGES..=MAX_PAGES).contains(pages) {
        Ok(Validation::Valid)
    } else {
        Ok(Validation::Invalid(
            format!("Choose between {} and {} pages.", MIN_PAGES, MAX_PAGES).into(),
        ))
    }
}

fn prompt_request() -> Result<StoryRequest> {
    let persona = Text::new("Author persona:")
        .with_default("You are an award-winning author of gripping short fiction.")
        .prompt()?;
    let setting = Text::new("Story setting:")
        .with_placeholder("a medieval kingdom, a distant planet, ...")
        .with_validator(required)
        .prompt()?;
    let characters = Text::new("Main characters:")
        .with_placeholder("names, roles, a few traits")
        .with_validator(required)
        .prompt()?;
    let plot_elements = Text::new("Plot elements:")
        .with_placeholder("themes, conflicts, key events")
        .prompt()?;
    let writing_style = Text::new("Writing style:").with_default("Formal").prompt()?;
    let tone = Text::new("Tone:").with_default("Suspenseful").prompt()?;
    let point_of_view = Text::new("Point of view:")
        .with_default("Third Person Limited")
        .prompt()?;
    let audience = Text::new("Audience:").with_default("Adults").prompt()?;
    let content_rating = Text::new("Content rating:").with_default("PG-13").prompt()?;
    let ending = Text::new("Ending:").with_default("Twist").prompt()?;
    let page_length = CustomType::<usize>::new("Length in pages:")
        .with_default(DEFAULT_PAGES)
        .with_error_message("Please type a whole number.")
        .with_validator(page_range)
        .prompt()?;

    Ok(StoryRequest {
        persona,
        setting,
        characters,
        plot_elements,
        writing_style,
        tone,
        point_of_view,
        audience,
        content_rating,
        ending,
        page_length,
    })
}
