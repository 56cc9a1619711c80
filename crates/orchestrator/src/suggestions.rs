//! Starter prompts offered on an empty session.

use rand::seq::SliceRandom;

const STARTER_PROMPTS: &[&str] = &[
    "Tell me a fun fact about space",
    "What's the weather like in Tel Aviv?",
    "Explain generative AI in simple terms",
    "Suggest a healthy recipe for a quick dinner",
    "Write me a short poem about friendship",
    "What are the three most recommended movies this year?",
    "Plan a one-day trip in the north for me",
    "Translate 'Hello, how are you?' into Spanish",
    "Give me an original birthday gift idea",
    "What's the difference between JavaScript and TypeScript?",
    "Write Python code that sorts a list of numbers",
    "Summarize the main points of an article about climate change",
    "What are the benefits of meditation?",
    "Give me an idea for a fun programming side project",
    "Write a short paragraph in the style of a famous science fiction author",
    "What is the capital of Australia?",
    "Explain to me what an NFT is",
    "Who wrote 'The Catcher in the Rye'?",
    "Suggest 3 interesting podcasts",
    "How do you say 'I love you' in Japanese?",
];

/// `count` distinct prompts in random order (fewer if the list is shorter).
pub fn starter_suggestions(count: usize) -> Vec<&'static str> {
    let mut rng = rand::thread_rng();
    STARTER_PROMPTS
        .choose_multiple(&mut rng, count)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_suggestions_are_distinct() {
        let picked = starter_suggestions(4);
        assert_eq!(picked.len(), 4);
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 4);
        assert!(picked.iter().all(|p| STARTER_PROMPTS.contains(p)));
    }

    #[test]
    fn test_count_is_capped() {
        assert_eq!(starter_suggestions(100).len(), STARTER_PROMPTS.len());
        assert!(starter_suggestions(0).is_empty());
    }
}
