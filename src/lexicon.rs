use std::collections::HashMap;

use crate::Tree;

/// `Lexicon`
///
/// Word/tag co-occurrence model estimated from training trees. Scores word,
/// tag pairs with a smoothed estimate of `P(tag|word) / P(tag) * P(word)`,
/// used as a ranking score for tag selection rather than a normalized
/// probability.
///
/// All counts are accumulated in a single pass over the training trees and
/// are read-only afterwards.
#[derive(Debug, Default)]
pub struct Lexicon {
    // tags in first-observation order, so downstream argmax ties are
    // deterministic
    tag_order: Vec<String>,
    tag_counts: HashMap<String, u64>,
    word_counts: HashMap<String, u64>,
    word_tag_counts: HashMap<String, HashMap<String, u64>>,
    // per tag, how many distinct word types were first seen with that tag
    type_tag_counts: HashMap<String, u64>,
    total_tokens: u64,
    total_word_types: u64,
}

impl Lexicon {
    /// Build a lexicon from the word/tag pairs observed in `trees`.
    ///
    /// Each tree contributes its word yield zipped with its preterminal
    /// yield. Trees are expected to carry one preterminal per word, the
    /// treebank reader guarantees this.
    pub fn train(trees: &[Tree]) -> Self {
        let mut lexicon = Lexicon::default();
        for tree in trees {
            let words = tree.words();
            let tags = tree.preterminal_yield();
            for (word, tag) in words.into_iter().zip(tags) {
                lexicon.tally_tagging(word, tag);
            }
        }
        lexicon
    }

    fn tally_tagging(&mut self, word: &str, tag: &str) {
        if !self.is_known(word) {
            self.total_word_types += 1;
            *self.type_tag_counts.entry(tag.to_owned()).or_insert(0) += 1;
        }
        self.total_tokens += 1;
        if !self.tag_counts.contains_key(tag) {
            self.tag_order.push(tag.to_owned());
        }
        *self.tag_counts.entry(tag.to_owned()).or_insert(0) += 1;
        *self.word_counts.entry(word.to_owned()).or_insert(0) += 1;
        *self
            .word_tag_counts
            .entry(word.to_owned())
            .or_insert_with(HashMap::new)
            .entry(tag.to_owned())
            .or_insert(0) += 1;
    }

    /// Get the tags observed during training, in first-observation order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tag_order.iter().map(String::as_str)
    }

    /// Returns whether `word` was observed during training.
    pub fn is_known(&self, word: &str) -> bool {
        self.word_counts.contains_key(word)
    }

    /// Get the number of times `word` was observed.
    pub fn word_count(&self, word: &str) -> u64 {
        self.word_counts.get(word).cloned().unwrap_or(0)
    }

    /// Get the number of times `tag` was observed.
    pub fn tag_count(&self, tag: &str) -> u64 {
        self.tag_counts.get(tag).cloned().unwrap_or(0)
    }

    /// Score tagging `word` with `tag`.
    ///
    /// Words observed fewer than ten times fall into the rare-word regime:
    /// their counts are backed off towards how often any new word type was
    /// first seen with `tag`, which keeps the score well-defined for unknown
    /// words.
    ///
    /// A tag that was never observed has probability zero under this model
    /// and scores `0.0`, the division by `P(tag)` is guarded rather than
    /// propagated as a numerical fault.
    pub fn score_tagging(&self, word: &str, tag: &str) -> f64 {
        let tag_count = self.tag_count(tag);
        if tag_count == 0 || self.total_tokens == 0 {
            return 0.0;
        }
        let p_tag = tag_count as f64 / self.total_tokens as f64;
        let mut c_word = self.word_count(word) as f64;
        let mut c_tag_and_word = self
            .word_tag_counts
            .get(word)
            .and_then(|tag_counts| tag_counts.get(tag))
            .cloned()
            .unwrap_or(0) as f64;
        if c_word < 10.0 {
            c_word += 1.0;
            c_tag_and_word += self.type_tag_counts.get(tag).cloned().unwrap_or(0) as f64
                / self.total_word_types as f64;
        }
        let p_word = (1.0 + c_word) / (self.total_tokens as f64 + self.total_word_types as f64);
        let p_tag_given_word = c_tag_and_word / c_word;
        p_tag_given_word / p_tag * p_word
    }
}
