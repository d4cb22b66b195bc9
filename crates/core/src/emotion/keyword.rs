use crate::emotion::{ClassifyError, EmotionProbabilities, TextClassifier};
use futures::future::BoxFuture;
use futures::FutureExt;

const LEXICON: &[(&str, &[&str])] = &[
    (
        "happy",
        &[
            "happy", "joy", "glad", "excited", "delighted", "grateful", "love", "wonderful",
            "great", "fun", "smile",
        ],
    ),
    (
        "sad",
        &[
            "sad", "depressed", "unhappy", "lonely", "cry", "tears", "miss", "tired", "hopeless",
            "lost",
        ],
    ),
    (
        "angry",
        &["angry", "mad", "furious", "annoyed", "hate", "irritated", "rage", "unfair"],
    ),
    (
        "fear",
        &["scared", "afraid", "fear", "anxious", "worried", "nervous", "panic", "terrified"],
    ),
    (
        "surprise",
        &["surprise", "surprised", "amazing", "wow", "unexpected", "shocked", "suddenly"],
    ),
];

/// Offline text classifier counting lexicon hits per emotion.
///
/// Hits are normalized into a distribution; text with no hits is fully
/// neutral.
#[derive(Clone, Debug, Default)]
pub struct KeywordTextClassifier;

impl KeywordTextClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> EmotionProbabilities {
        if text.trim().is_empty() {
            return EmotionProbabilities::new();
        }

        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();

        let hits: Vec<(&str, usize)> = LEXICON
            .iter()
            .map(|(label, keywords)| {
                let n = words.iter().filter(|w| keywords.contains(*w)).count();
                (*label, n)
            })
            .filter(|(_, n)| *n > 0)
            .collect();

        let total: usize = hits.iter().map(|(_, n)| n).sum();
        if total == 0 {
            return EmotionProbabilities::new().with("neutral", 1.0);
        }

        hits.into_iter()
            .map(|(label, n)| (label, n as f32 / total as f32))
            .collect()
    }
}

impl TextClassifier for KeywordTextClassifier {
    fn classify_text(
        &self,
        text: String,
    ) -> BoxFuture<'_, Result<EmotionProbabilities, ClassifyError>> {
        async move { Ok(self.classify(&text)) }.boxed()
    }
}
