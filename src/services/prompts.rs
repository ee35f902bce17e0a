use crate::core::request::StoryRequest;
use crate::utils::text::SENTINEL;

pub const PREMISE: &str = "premise";
pub const OUTLINE: &str = "outline";
pub const STORY_TEXT: &str = "story_text";
const BRIEF: &str = "brief";
const SETTING: &str = "setting";
const CHARACTERS: &str = "characters";

const GUIDELINES: &str = "\
Writing guidelines:
- Go deep. Paint every scene with vivid, sensory description.
- Let the characters' motives, fears and contradictions surface on their own.
- Follow the outline, but let the story surprise you.
- Plant small details that can grow into subplots or shifts in a character's arc later.
- Keep tension alive; do not resolve everything at once.
- Expand, never summarize. Rushing through the story is a failure.";

/// The four stage templates for one request. User text and stage outputs are only
/// ever render values, so braces typed by the user stay literal.
#[derive(Debug, Clone)]
pub struct PromptSet {
    brief: String,
    setting: String,
    characters: String,
    premise: String,
    outline: String,
    opening: String,
    continuation: String,
}

impl PromptSet {
    pub fn build(request: &StoryRequest, opening_words: usize, target_words: usize) -> Self {
        let premise = format!(
            "{{{BRIEF}}}\n\nWrite a single-sentence premise for a story set in {{{SETTING}}} \
             featuring {{{CHARACTERS}}}."
        );

        let outline = format!(
            "{{{BRIEF}}}\n\nYou have this premise in mind:\n\n{{{PREMISE}}}\n\n\
             Write an outline of the plot of your story."
        );

        let opening = format!(
            "{{{BRIEF}}}\n\nYou have this premise in mind:\n\n{{{PREMISE}}}\n\n\
             You have planned this outline:\n\n{{{OUTLINE}}}\n\n\
             Review the premise and the outline, then write the very beginning of the story. \
             Do not try to finish it now: only scratch the surface of the first point of \
             the outline. Write AT LEAST {opening_words} WORDS. The entire story must not \
             exceed {target_words} words.\n\n{GUIDELINES}"
        );

        let continuation = format!(
            "{{{BRIEF}}}\n\nYou have this premise in mind:\n\n{{{PREMISE}}}\n\n\
             You have planned this outline:\n\n{{{OUTLINE}}}\n\n\
             This is what you have written so far:\n\n{{{STORY_TEXT}}}\n\n=====\n\n\
             Review the outline and the story so far, pick the next part of the outline \
             and continue exactly where you left off. Do not write a whole chapter at once. \
             Write AT LEAST 1000 WORDS. The complete story must be at most {target_words} \
             words; when you get close to that length, wrap the story up. Only once the \
             story is COMPLETELY finished, write {SENTINEL}.\n\n{GUIDELINES}"
        );

        Self {
            brief: author_brief(request),
            setting: request.setting.clone(),
            characters: request.characters.clone(),
            premise,
            outline,
            opening,
            continuation,
        }
    }

    pub fn premise_prompt(&self) -> String {
        render(
            &self.premise,
            &[
                (BRIEF, self.brief.as_str()),
                (SETTING, self.setting.as_str()),
                (CHARACTERS, self.characters.as_str()),
            ],
        )
    }

    pub fn outline_prompt(&self, premise: &str) -> String {
        render(&self.outline, &[(BRIEF, self.brief.as_str()), (PREMISE, premise)])
    }

    pub fn opening_prompt(&self, premise: &str, outline: &str) -> String {
        render(
            &self.opening,
            &[(BRIEF, self.brief.as_str()), (PREMISE, premise), (OUTLINE, outline)],
        )
    }

    pub fn continuation_prompt(&self, premise: &str, outline: &str, draft: &str) -> String {
        render(
            &self.continuation,
            &[
                (BRIEF, self.brief.as_str()),
                (PREMISE, premise),
                (OUTLINE, outline),
                (STORY_TEXT, draft),
            ],
        )
    }
}

/// Substitutes `{name}` placeholders in one pass. Substituted text is never
/// re-scanned and unknown placeholders are left as they are.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::request::sample_request;

    #[test]
    fn test_render_fills_placeholders() {
        let rendered = render(
            "P: {premise} / O: {outline}",
            &[(PREMISE, "a storm"), (OUTLINE, "1. wind")],
        );
        assert_eq!(rendered, "P: a storm / O: 1. wind");
    }

    #[test]
    fn test_render_is_single_pass() {
        let rendered = render(
            "{premise} | {outline}",
            &[(PREMISE, "mentions {outline}"), (OUTLINE, "X")],
        );
        assert_eq!(rendered, "mentions {outline} | X");
    }

    #[test]
    fn test_render_leaves_unknown_braces() {
        assert_eq!(render("{a} {b", &[("c", "z")]), "{a} {b");
        assert_eq!(render("}{premise}{", &[(PREMISE, "p")]), "}p{");
    }

    #[test]
    fn test_user_braces_stay_literal() {
        let mut request = sample_request(1);
        request.plot_elements = "a riddle about {outline} and {story_text}".to_string();
        request.setting = "{premise} island".to_string();
        let prompts = PromptSet::build(&request, 300, 300);

        let premise = prompts.premise_prompt();
        assert!(premise.contains("story set in {premise} island"));

        let opening = prompts.opening_prompt("THE PREMISE", "THE OUTLINE");
        assert!(opening.contains("a riddle about {outline} and {story_text}"));
        assert_eq!(opening.matches("THE OUTLINE").count(), 1);

        let continuation = prompts.continuation_prompt("THE PREMISE", "THE OUTLINE", "DRAFT");
        assert!(continuation.contains("Plot elements: a riddle about {outline} and {story_text}"));
        assert_eq!(continuation.matches("DRAFT").count(), 1);
    }

    #[test]
    fn test_stage_prompts() {
        let prompts = PromptSet::build(&sample_request(1), 300, 300);

        let premise = prompts.premise_prompt();
        assert!(premise.contains("story set in a lighthouse on a foggy coast featuring"));
        assert!(!premise.contains("{brief}"));

        let outline = prompts.outline_prompt("A storm.");
        assert!(outline.contains("premise in mind:\n\nA storm."));

        let opening = prompts.opening_prompt("A storm.", "1. Wind");
        assert!(opening.contains("1. Wind"));
        assert!(opening.contains("AT LEAST 300 WORDS"));

        let continuation = prompts.continuation_prompt("A storm.", "1. Wind", "So far.");
        assert!(continuation.contains("written so far:\n\nSo far.\n\n====="));
        assert!(continuation.contains(SENTINEL));
    }

    #[test]
    fn test_persona_leads_every_prompt() {
        let prompts = PromptSet::build(&sample_request(2), 600, 600);
        for prompt in [
            prompts.premise_prompt(),
            prompts.outline_prompt("p"),
            prompts.opening_prompt("p", "o"),
            prompts.continuation_prompt("p", "o", "d"),
        ] {
            assert!(prompt.starts_with("You are a mystery novelist."));
        }
    }
}
