use anyhow::Result;
use story_writer::core::config::Config;
use story_writer::services::llm::create_submitter;
use story_writer::services::progress::ConsoleProgress;
use story_writer::services::setup;
use story_writer::services::workflow::StoryWorkflow;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load Config
    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with an llm provider section.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    // 2. Story request (saved file or interactive)
    let request = setup::run_setup(&config)?;
    let target_words = request.target_words(config.story.words_per_page)?;
    println!("{}", request.summary(config.story.words_per_page));

    // 3. Initialize completion client; credentials are checked before any call
    let submitter = create_submitter(&config)?;

    // 4. Write the story
    let workflow = StoryWorkflow::new(submitter, config.story.clone());
    let progress = ConsoleProgress::new(target_words)?;
    let story = match workflow.write(&request, &progress).await {
        Ok(story) => story,
        Err(e) => {
            eprintln!("Story generation failed: {}", e);
            eprintln!("Nothing was saved. Please run again.");
            return Err(e.into());
        }
    };

    let path = story.save(&config.output_folder)?;
    println!("\n{}\n", story.text);
    println!(
        "Story saved to {} ({} words).",
        path.display(),
        story.word_count
    );

    Ok(())
}
