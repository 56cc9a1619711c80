//! Fixed texts for capability modes: labels, activation prompts, system
//! instructions, input hints and the status messages the orchestrator puts
//! into the conversation log.

use providers::ASSISTANT_INSTRUCTION;

/// Appended when any dispatch path fails
pub const FAILURE_TEXT: &str = "Sorry, I ran into an error.";

/// Transient turn shown while a video is rendering
pub const VIDEO_WORKING_TEXT: &str = "Processing your video request...";

/// Transient turn shown while an illustrated story is produced
pub const STORY_WORKING_TEXT: &str =
    "Writing and illustrating your story, this may take a moment...";

/// Transient turn shown while a turn is shortened or summarized
pub const MODIFY_LOADING_TEXT: &str = "Processing...";

pub const STORY_READY_TEXT: &str = "Your story is ready!";

pub const DESCRIBE_WITHOUT_IMAGE_TEXT: &str = "Please upload an image so I can describe it.";

/// Instruction paired with the image for `describe_image`
pub const DESCRIBE_IMAGE_REQUEST: &str = "Describe this image in detail.";

pub const CLASSIFICATION_APOLOGY_TEXT: &str = "Sorry, I had trouble understanding your request.";

pub const NO_RESPONSE_TEXT: &str = "I couldn't process your request.";

/// Submission text of the "surprise me" story button
pub const SURPRISE_ME_TEXT: &str = "Surprise me";

pub const DEFAULT_INPUT_HINT: &str = "Type your message...";

pub const AWAITING_IMAGE_HINT: &str = "Please upload an image...";

pub fn activation_banner(label: &str) -> String {
    format!("Activating mode: {}", label)
}

pub fn model_switched(name: &str) -> String {
    format!("Model switched to {}", name)
}

/// Confirmation for the first persona-mode turn
pub fn persona_adopted(persona: &str) -> String {
    format!(
        "Great! From now on I'll speak as {}. What would you like to ask?",
        persona
    )
}

/// Default instruction, optionally wrapped in an adopted persona.
pub fn assistant_instruction(persona: Option<&str>) -> String {
    match persona {
        Some(persona) => format!(
            "You are acting as {}. In addition: {}",
            persona, ASSISTANT_INSTRUCTION
        ),
        None => ASSISTANT_INSTRUCTION.to_string(),
    }
}

pub mod labels {
    pub const VISUAL_STORY: &str = "Visual Story";
    pub const CREATE_IMAGE: &str = "Create Image";
    pub const CREATE_VIDEO: &str = "Create Video";
    pub const EDIT_IMAGE: &str = "Edit Image";
    pub const DESCRIBE_IMAGE: &str = "Describe Image";
    pub const WEB_SEARCH: &str = "Web Search";
    pub const PROGRAMMING_ASSISTANT: &str = "Programming Assistant";
    pub const RECIPE_GENERATOR: &str = "Recipe Generator";
    pub const WORKOUT_PLANNER: &str = "Workout Planner";
    pub const TRIP_PLANNER: &str = "Trip Planner";
    pub const SPEECH_WRITER: &str = "Speech Writer";
    pub const RESUME_ASSISTANT: &str = "Resume Assistant";
    pub const LANGUAGE_TUTOR: &str = "Language Tutor";
    pub const COLOR_PALETTE: &str = "Color Palette";
    pub const DREAM_INTERPRETER: &str = "Dream Interpreter";
    pub const CREATE_CHART: &str = "Create Chart";
    pub const ANALYZE_DOCUMENT: &str = "Analyze Document";
    pub const INTERACTIVE_STORY: &str = "Interactive Story";
    pub const PERSONALITY_MODE: &str = "Personality Mode";
}

/// Model turn appended right after the activation banner
pub mod activation {
    pub const CREATE_IMAGE: &str = "Sure, what image would you like me to create?";
    pub const EDIT_IMAGE: &str = "Okay, upload an image and describe what you'd like to change.";
    pub const CREATE_VIDEO: &str =
        "Great! Describe the video you want me to create. (Note: this may take a few minutes)";
    pub const WEB_SEARCH: &str = "I'm ready to search. What would you like to know?";
    pub const CREATE_CHART: &str = "Excellent. Describe the chart and its data (for example: 'pie chart: apples 50, bananas 30').";
    pub const INTERACTIVE_STORY: &str =
        "An adventure is about to begin! What should the story be about?";
    pub const PERSONALITY_MODE: &str =
        "Which personality should I speak as? (for example: 'a pirate', 'Albert Einstein').";
    pub const ANALYZE_DOCUMENT: &str =
        "I'm ready to analyze. Upload a text document (.txt, .md) and ask me anything about it.";
    pub const VISUAL_STORY: &str =
        "Great idea! What topic should I write and illustrate a story about?";
    pub const DESCRIBE_IMAGE: &str = "Sure, upload an image and I'll describe what I see.";
    pub const COLOR_PALETTE: &str =
        "Great, describe a mood, theme or object and I'll create a color palette for you.";
    pub const DREAM_INTERPRETER: &str =
        "Interesting... tell me about your dream and I'll offer an interpretation.";
    pub const PROGRAMMING_ASSISTANT: &str =
        "Ready to help. Paste your code, ask a question, or describe the problem.";
    pub const RECIPE_GENERATOR: &str = "I'm hungry for knowledge! What ingredients do you have?";
    pub const WORKOUT_PLANNER: &str = "Let's get started! What is your goal, how much time do you have, and what equipment is available?";
    pub const TRIP_PLANNER: &str =
        "Where are we going? Tell me the destination, trip length and your interests.";
    pub const SPEECH_WRITER: &str =
        "I'm listening. What is the topic of the speech, who is the audience, and what is the goal?";
    pub const RESUME_ASSISTANT: &str =
        "Let's upgrade your resume. Upload the file or tell me about your experience.";
    pub const LANGUAGE_TUTOR: &str = "Hello! Which language would you like to practice today?";
}

/// Fixed system instructions that replace the default assistant one
pub mod instructions {
    pub const COLOR_PALETTE: &str = "You are a color palette generator. The user will describe a theme or mood. Respond with 5-6 appropriate colors, each with its HEX code and a descriptive name. Format the response clearly. Your name is AIVAN.";
    pub const DREAM_INTERPRETER: &str = "You are a dream interpreter. The user will describe a dream. Provide a thoughtful and creative interpretation based on common dream symbols and psychology, but preface it by saying this is for entertainment. Your name is AIVAN.";
    pub const PROGRAMMING_ASSISTANT: &str = "You are an expert programming assistant named AIVAN. Provide clear, concise, and accurate code snippets, explanations, and debugging help. Identify the language if possible or ask for clarification.";
    pub const RECIPE_GENERATOR: &str = "You are a creative chef named AIVAN. The user will provide a list of ingredients. Generate a recipe using some or all of these ingredients. Provide a name for the dish, a list of ingredients (including quantities), and step-by-step instructions.";
    pub const WORKOUT_PLANNER: &str = "You are a certified personal trainer named AIVAN. The user will provide their goal, available time, and equipment. Create a structured workout plan, including exercises, sets, reps, and rest times. Add a warm-up and cool-down.";
    pub const TRIP_PLANNER: &str = "You are an expert travel agent named AIVAN. The user will provide a destination, duration, and interests. Create a detailed, day-by-day itinerary with suggestions for activities, sights, and food.";
    pub const SPEECH_WRITER: &str = "You are a professional speechwriter named AIVAN. The user will provide a topic, audience, and goal. Help them structure and write a compelling speech with an introduction, main points, and a conclusion.";
    pub const RESUME_ASSISTANT: &str = "You are a career coach and resume expert named AIVAN. The user will ask for help with their resume or cover letter. Provide specific, actionable advice, suggest better phrasing, and point out areas for improvement.";
    pub const LANGUAGE_TUTOR: &str = "You are a friendly language tutor named AIVAN. The user will specify a language. Engage in a simple conversation in that language, correct their mistakes gently, and help them practice.";
}

/// Input field placeholder while a capability is active
pub mod hints {
    pub const CREATE_IMAGE: &str = "Describe the image you want to create...";
    pub const EDIT_IMAGE: &str = "Upload an image and describe what to change...";
    pub const CREATE_VIDEO: &str = "Describe the video you want to create...";
    pub const WEB_SEARCH: &str = "Ask anything... I'll search the web.";
    pub const CREATE_CHART: &str = "Describe the chart and its data...";
    pub const PERSONALITY_MODE: &str = "Describe the personality I should adopt...";
    pub const INTERACTIVE_STORY: &str = "Write a story topic, or ask for a surprise...";
    pub const ANALYZE_DOCUMENT: &str = "Upload a document and ask me about it...";
    pub const VISUAL_STORY: &str = "What topic would you like a visual story about?";
    pub const DESCRIBE_IMAGE: &str = "Upload an image so I can describe it...";
    pub const COLOR_PALETTE: &str = "Describe a mood or theme for a color palette...";
    pub const DREAM_INTERPRETER: &str = "Tell me about your dream...";
    pub const PROGRAMMING_ASSISTANT: &str = "Paste code or ask a programming question...";
    pub const RECIPE_GENERATOR: &str = "List the ingredients you have...";
    pub const WORKOUT_PLANNER: &str = "What is your workout goal?";
    pub const TRIP_PLANNER: &str = "Where and when would you like to travel?";
    pub const SPEECH_WRITER: &str = "What is the speech about and who is it for?";
    pub const RESUME_ASSISTANT: &str = "Paste your resume or ask for help...";
    pub const LANGUAGE_TUTOR: &str = "Which language shall we practice today?";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_wraps_default_instruction() {
        assert_eq!(assistant_instruction(None), ASSISTANT_INSTRUCTION);
        let wrapped = assistant_instruction(Some("a pirate"));
        assert!(wrapped.starts_with("You are acting as a pirate. In addition: "));
        assert!(wrapped.ends_with(ASSISTANT_INSTRUCTION));
    }

    #[test]
    fn test_banner_texts() {
        assert_eq!(activation_banner("Create Image"), "Activating mode: Create Image");
        assert_eq!(model_switched("AIVAN Pro"), "Model switched to AIVAN Pro");
    }
}
