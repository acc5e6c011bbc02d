use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::error::TextError;

static WORDS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/words");

/// Used when every other source comes back empty
pub const PANGRAM: &str = "the quick brown fox jumps over the lazy dog";

/// Collapses tabs, newlines and repeated spaces into single spaces so
/// every character of the target can be typed.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Supplies practice text
pub trait TextSource: Send {
    fn next_text(&mut self) -> String;
}

/// Always hands back the same text
#[derive(Clone, Debug)]
pub struct FixedText(pub String);

impl TextSource for FixedText {
    fn next_text(&mut self) -> String {
        self.0.clone()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl WordList {
    /// Load an embedded list by name, e.g. `english`
    pub fn embedded(name: &str) -> Result<Self, TextError> {
        let file_name = format!("{name}.json");
        let file = WORDS_DIR
            .get_file(&file_name)
            .ok_or_else(|| TextError::UnknownWordList(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| TextError::UnknownWordList(name.to_string()))?;
        Ok(serde_json::from_str(contents)?)
    }

    pub fn random_words(&self, count: usize) -> Vec<String> {
        let mut rng = rand::thread_rng();
        (0..count)
            .filter_map(|_| self.words.choose(&mut rng).cloned())
            .collect()
    }
}

/// Random words joined by single spaces
#[derive(Clone, Debug)]
pub struct WordListSource {
    list: WordList,
    word_count: usize,
}

impl WordListSource {
    pub fn new(list: WordList, word_count: usize) -> Self {
        Self { list, word_count }
    }

    /// The embedded English list
    pub fn english(word_count: usize) -> Self {
        let list = WordList::embedded("english").unwrap_or_else(|err| {
            tracing::warn!(%err, "embedded word list unavailable");
            WordList {
                name: "pangram".to_string(),
                size: 0,
                words: PANGRAM.split(' ').map(str::to_string).collect(),
            }
        });
        Self::new(list, word_count)
    }
}

impl TextSource for WordListSource {
    fn next_text(&mut self) -> String {
        self.list.random_words(self.word_count.max(1)).join(" ")
    }
}
