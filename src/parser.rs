use std::collections::{BTreeMap, HashMap};

use failure::Error;

use crate::{Lexicon, Tree};

/// Trait for constituency parsers.
///
/// Parsers are trained once on a set of gold trees and afterwards produce a
/// parse for any sequence of words. The variant is chosen at construction
/// time, callers program against this trait.
pub trait Parser {
    /// Train the parser on gold trees.
    ///
    /// Training is one-way, a parser cannot be trained twice.
    fn train(&mut self, trees: &[Tree]) -> Result<(), Error>;

    /// Parse a sentence into a tree rooted at `ROOT`.
    ///
    /// Calling this on an untrained parser is a usage error.
    fn best_parse(&self, sentence: &[&str]) -> Result<Tree, Error>;
}

/// `BaselineParser`
///
/// Memorization-based baseline. Training records every tree under its
/// preterminal-tag sequence and tallies how often each constituent label
/// covers each span length. Parsing tags the sentence with the lexicon's
/// best tag per word and returns the most frequent memorized tree for that
/// exact tag sequence, with the input words substituted into the leaves.
/// Sentences whose tag skeleton was never seen get a right-branching tree
/// whose merge nodes take the most frequent label for their span length.
///
/// The only generalization signal in the fallback is span-length-conditioned
/// label frequency, word identity plays no role beyond tagging.
#[derive(Default)]
pub struct BaselineParser {
    model: Option<BaselineModel>,
}

struct BaselineModel {
    lexicon: Lexicon,
    // tag sequence -> (tree, count), insertion-ordered so frequency ties
    // resolve to the earliest-seen tree
    known_parses: HashMap<Vec<String>, Vec<(Tree, u64)>>,
    // span length -> (label, count), insertion-ordered per span
    span_categories: BTreeMap<usize, Vec<(String, u64)>>,
}

impl BaselineParser {
    pub fn new() -> Self {
        BaselineParser::default()
    }
}

impl Parser for BaselineParser {
    fn train(&mut self, trees: &[Tree]) -> Result<(), Error> {
        if self.model.is_some() {
            bail!("Parser is already trained.");
        }
        let lexicon = Lexicon::train(trees);
        let mut known_parses: HashMap<Vec<String>, Vec<(Tree, u64)>> = HashMap::new();
        let mut span_categories = BTreeMap::new();
        for tree in trees {
            let tags = tree
                .preterminal_yield()
                .into_iter()
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            let parses = known_parses.entry(tags).or_insert_with(Vec::new);
            match parses.iter_mut().find(|(known, _)| known == tree) {
                Some((_, count)) => *count += 1,
                None => parses.push((tree.clone(), 1)),
            }
            tally_spans(tree, &mut span_categories);
        }
        self.model = Some(BaselineModel {
            lexicon,
            known_parses,
            span_categories,
        });
        Ok(())
    }

    fn best_parse(&self, sentence: &[&str]) -> Result<Tree, Error> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| format_err!("best_parse called on an untrained parser"))?;
        if sentence.is_empty() {
            bail!("Can't parse an empty sentence.");
        }
        let tags = model.tag_sentence(sentence)?;
        match model.known_parses.get(&tags) {
            Some(parses) => instantiate_known_parse(parses, sentence),
            None => model.right_branching_parse(sentence, &tags),
        }
    }
}

impl BaselineModel {
    // Tags every word independently with the argmax of the lexicon score.
    // Strict comparison, so among equally scored tags the first-observed
    // one wins.
    fn tag_sentence(&self, sentence: &[&str]) -> Result<Vec<String>, Error> {
        sentence
            .iter()
            .map(|word| {
                let mut best: Option<(&str, f64)> = None;
                for tag in self.lexicon.tags() {
                    let score = self.lexicon.score_tagging(word, tag);
                    match best {
                        Some((_, best_score)) if score <= best_score => {}
                        _ => best = Some((tag, score)),
                    }
                }
                best.map(|(tag, _)| tag.to_owned())
                    .ok_or_else(|| format_err!("Lexicon has no tags, was training data empty?"))
            })
            .collect()
    }

    // Folds the sentence right-to-left into a right-branching tree, labeling
    // each merge node with the most frequent category for the merged span.
    fn right_branching_parse(&self, words: &[&str], tags: &[String]) -> Result<Tree, Error> {
        let mut position = words.len() - 1;
        let mut tree = tag_tree(words[position], &tags[position]);
        while position > 0 {
            position -= 1;
            tree = self.merge(tag_tree(words[position], &tags[position]), tree)?;
        }
        Ok(Tree::new("ROOT", vec![tree]))
    }

    fn merge(&self, left: Tree, right: Tree) -> Result<Tree, Error> {
        let span = left.leaf_count() + right.leaf_count();
        let label = self.best_category(span)?.to_owned();
        Ok(Tree::new(label, vec![left, right]))
    }

    // Most frequent category for a span length, ties resolved to the
    // first-recorded label. Span lengths never observed in training fall
    // back to the most frequent category over all span lengths.
    fn best_category(&self, span: usize) -> Result<&str, Error> {
        if let Some(label) = self
            .span_categories
            .get(&span)
            .and_then(|categories| most_frequent(categories))
        {
            return Ok(label);
        }
        self.span_categories
            .values()
            .flatten()
            .fold(None, |best: Option<(&str, u64)>, (label, count)| match best {
                Some((_, best_count)) if *count <= best_count => best,
                _ => Some((label.as_str(), *count)),
            })
            .map(|(label, _)| label)
            .ok_or_else(|| format_err!("No constituent categories were observed in training."))
    }
}

fn tag_tree(word: &str, tag: &str) -> Tree {
    Tree::new(tag, vec![Tree::leaf(word)])
}

fn most_frequent(categories: &[(String, u64)]) -> Option<&str> {
    categories
        .iter()
        .fold(None, |best: Option<(&str, u64)>, (label, count)| match best {
            Some((_, best_count)) if *count <= best_count => best,
            _ => Some((label.as_str(), *count)),
        })
        .map(|(label, _)| label)
}

// Deep-copies the most frequent memorized tree and rewrites its leaves with
// the input sentence's words. The template stays untouched.
fn instantiate_known_parse(parses: &[(Tree, u64)], sentence: &[&str]) -> Result<Tree, Error> {
    let template = parses
        .iter()
        .fold(None, |best: Option<(&Tree, u64)>, (tree, count)| match best {
            Some((_, best_count)) if *count <= best_count => best,
            _ => Some((tree, *count)),
        })
        .map(|(tree, _)| tree)
        .ok_or_else(|| format_err!("Empty parse table entry."))?;
    let mut parse = template.clone();
    parse.set_words(sentence.iter().cloned())?;
    Ok(parse)
}

// Records (span length, label) counts for every node that is not a leaf,
// not a preterminal and not the ROOT wrapper. Returns the node's leaf count.
fn tally_spans(tree: &Tree, spans: &mut BTreeMap<usize, Vec<(String, u64)>>) -> usize {
    if tree.is_leaf() || tree.is_preterminal() {
        return 1;
    }
    let span = tree
        .children()
        .iter()
        .map(|child| tally_spans(child, spans))
        .sum();
    if tree.label() != "ROOT" {
        let categories = spans.entry(span).or_insert_with(Vec::new);
        match categories
            .iter_mut()
            .find(|(label, _)| label == tree.label())
        {
            Some((_, count)) => *count += 1,
            None => categories.push((tree.label().to_owned(), 1)),
        }
    }
    span
}
