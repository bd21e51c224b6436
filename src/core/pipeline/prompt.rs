//! Prompt templates for the language model.
//!
//! The generation prompt pins the reply format that
//! [`parse_cards`](crate::core::cards::parse_cards) expects: one card per
//! line, `;` between front and back, `<br><br>` between word and sentence.

const EXAMPLE_CARD: &str = "Sneezing.<br><br>She was sneezing so much the dog thought it was a game.;Espirrando.<br><br>Ela estava espirrando tanto que o cachorro achou que era brincadeira.";

/// Split user input into words: one per line, trimmed, blanks dropped.
pub fn normalize_words(input: &str) -> Vec<String> {
    input
        .split('\n')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prompt asking for one flashcard line per word.
pub fn generation_prompt(source_language: &str, target_language: &str, words: &[String]) -> String {
    format!(
        "You are a language tutor creating flashcards for language learners.

Follow this setup:
- Source Language: {source_language}
- Target Language: {target_language}

Instructions:
1. For each word provided, translate it into the target language, respecting the form given (infinitive, conjugated, etc.). If ambiguous, default to the infinitive form.
2. If the word has multiple meanings, use the most common meaning unless specific context is provided.
3. On the front of the card, show:
   - The word (in its original source language)
   - An example sentence in the source language using the word naturally
4. On the back of the card, show:
   - The translation of the word into the target language
   - The translation of the example sentence into the target language

Formatting Rules (for Anki import):
- Use <br><br> to separate the word from the sentence within each field.
- Use a single ; character to separate front and back fields.
- Each flashcard must be on a single line.
- No extra blank lines between cards.
- Do not add any explanations or notes outside of the card format.

Example Output Format:
{EXAMPLE_CARD}

Here are the words to process:
{words}

Return only the generated cards in this format.",
        words = words.join("\n"),
    )
}

/// Prompt asking the model to check raw input lines before generation.
///
/// The reply is free text and is handed back to the user unparsed.
pub fn review_prompt(source_language: &str, target_language: &str, lines: &[String]) -> String {
    let numbered = lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a language tutor reviewing a learner's word list before it is turned into flashcards.

Setup:
- Source Language: {source_language}
- Target Language: {target_language}

Each line below should be ONE of the following supported shapes:
- A single word in the source language (e.g. \"run\")
- A short phrase or expression in the source language (e.g. \"give up\")
- A word with a short context hint in parentheses (e.g. \"bank (river)\")

These shapes are NOT supported:
- Full paragraphs or several sentences on one line
- Lines written in the target language instead of the source language
- Several unrelated words on the same line separated by commas or slashes
- Lines containing the ; character, which is reserved as the card field separator

Instructions:
1. Go through the lines in order and flag every line that does not match a supported shape, quoting its number.
2. For each flagged line, explain the problem in one sentence and suggest a corrected version.
3. Point out obvious spelling mistakes.
4. If every line is fine, say so in one short sentence.
5. Keep the feedback concise and write it in {source_language}.

Lines to review:
{numbered}"
    )
}
