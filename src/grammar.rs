use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use failure::Error;

use crate::Tree;

/// Unary grammar rule `parent -> child`.
///
/// `score` is the rule's relative-frequency probability estimate. Equality
/// and hashing consider the symbols only, the score is metadata.
#[derive(Clone, Debug)]
pub struct UnaryRule {
    parent: String,
    child: String,
    score: f64,
}

impl UnaryRule {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        UnaryRule {
            parent: parent.into(),
            child: child.into(),
            score: 0.0,
        }
    }

    pub fn parent(&self) -> &str {
        self.parent.as_str()
    }

    pub fn child(&self) -> &str {
        self.child.as_str()
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

impl PartialEq for UnaryRule {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.child == other.child
    }
}

impl Eq for UnaryRule {}

impl Hash for UnaryRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.child.hash(state);
    }
}

impl fmt::Display for UnaryRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {} [{}]", self.parent, self.child, self.score)
    }
}

/// Binary grammar rule `parent -> left_child right_child`.
///
/// Equality and hashing consider the symbols only, the score is metadata.
#[derive(Clone, Debug)]
pub struct BinaryRule {
    parent: String,
    left_child: String,
    right_child: String,
    score: f64,
}

impl BinaryRule {
    pub fn new(
        parent: impl Into<String>,
        left_child: impl Into<String>,
        right_child: impl Into<String>,
    ) -> Self {
        BinaryRule {
            parent: parent.into(),
            left_child: left_child.into(),
            right_child: right_child.into(),
            score: 0.0,
        }
    }

    pub fn parent(&self) -> &str {
        self.parent.as_str()
    }

    pub fn left_child(&self) -> &str {
        self.left_child.as_str()
    }

    pub fn right_child(&self) -> &str {
        self.right_child.as_str()
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

impl PartialEq for BinaryRule {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent
            && self.left_child == other.left_child
            && self.right_child == other.right_child
    }
}

impl Eq for BinaryRule {}

impl Hash for BinaryRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.left_child.hash(state);
        self.right_child.hash(state);
    }
}

impl fmt::Display for BinaryRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} -> {} {} [{}]",
            self.parent, self.left_child, self.right_child, self.score
        )
    }
}

/// `Grammar`
///
/// Context-free rule set induced from binarized training trees. Rule scores
/// are relative-frequency estimates, for each parent symbol the scores of
/// its rules sum to one. Rules are indexed by their child symbols to support
/// lookups of which rules could have produced a given child.
///
/// The preterminal layer is not part of the grammar, tagging probabilities
/// belong to the [`Lexicon`](crate::Lexicon).
#[derive(Debug, Default)]
pub struct Grammar {
    unary_by_child: HashMap<String, Vec<UnaryRule>>,
    binary_by_left_child: HashMap<String, Vec<BinaryRule>>,
    binary_by_right_child: HashMap<String, Vec<BinaryRule>>,
}

impl Grammar {
    /// Induce a grammar from binarized training trees.
    ///
    /// Returns an error when a node with more than two children is
    /// encountered, which means the caller passed trees that were not
    /// binarized. Nothing is recovered in that case, the whole induction
    /// aborts.
    pub fn induce(trees: &[Tree]) -> Result<Self, Error> {
        let mut symbol_counts = HashMap::new();
        let mut unary_counts = HashMap::new();
        let mut binary_counts = HashMap::new();
        for tree in trees {
            tally_tree(
                tree,
                &mut symbol_counts,
                &mut unary_counts,
                &mut binary_counts,
            )?;
        }

        let mut grammar = Grammar::default();
        for (mut rule, count) in unary_counts {
            rule.score = count as f64 / symbol_counts[&rule.parent] as f64;
            grammar
                .unary_by_child
                .entry(rule.child.clone())
                .or_insert_with(Vec::new)
                .push(rule);
        }
        for (mut rule, count) in binary_counts {
            rule.score = count as f64 / symbol_counts[&rule.parent] as f64;
            grammar
                .binary_by_right_child
                .entry(rule.right_child.clone())
                .or_insert_with(Vec::new)
                .push(rule.clone());
            grammar
                .binary_by_left_child
                .entry(rule.left_child.clone())
                .or_insert_with(Vec::new)
                .push(rule);
        }
        Ok(grammar)
    }

    /// Get the unary rules whose child is `child`.
    ///
    /// Returns an empty slice for unseen symbols.
    pub fn unary_rules_by_child(&self, child: &str) -> &[UnaryRule] {
        self.unary_by_child
            .get(child)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Get the binary rules whose left child is `left_child`.
    ///
    /// Returns an empty slice for unseen symbols.
    pub fn binary_rules_by_left_child(&self, left_child: &str) -> &[BinaryRule] {
        self.binary_by_left_child
            .get(left_child)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Get the binary rules whose right child is `right_child`.
    ///
    /// Returns an empty slice for unseen symbols.
    pub fn binary_rules_by_right_child(&self, right_child: &str) -> &[BinaryRule] {
        self.binary_by_right_child
            .get(right_child)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate over all unary rules.
    pub fn unary_rules(&self) -> impl Iterator<Item = &UnaryRule> {
        self.unary_by_child.values().flatten()
    }

    /// Iterate over all binary rules.
    ///
    /// Each rule is yielded once, from the left-child index.
    pub fn binary_rules(&self) -> impl Iterator<Item = &BinaryRule> {
        self.binary_by_left_child.values().flatten()
    }
}

fn tally_tree(
    tree: &Tree,
    symbol_counts: &mut HashMap<String, u64>,
    unary_counts: &mut HashMap<UnaryRule, u64>,
    binary_counts: &mut HashMap<BinaryRule, u64>,
) -> Result<(), Error> {
    // rules below preterminals belong to the lexicon
    if tree.is_leaf() || tree.is_preterminal() {
        return Ok(());
    }
    match tree.children() {
        [child] => {
            *symbol_counts.entry(tree.label().to_owned()).or_insert(0) += 1;
            let rule = UnaryRule::new(tree.label(), child.label());
            *unary_counts.entry(rule).or_insert(0) += 1;
        }
        [left, right] => {
            *symbol_counts.entry(tree.label().to_owned()).or_insert(0) += 1;
            let rule = BinaryRule::new(tree.label(), left.label(), right.label());
            *binary_counts.entry(rule).or_insert(0) += 1;
        }
        children => bail!(
            "Grammar induction requires binarized trees, node {} has {} children",
            tree.label(),
            children.len()
        ),
    }
    for child in tree.children() {
        tally_tree(child, symbol_counts, unary_counts, binary_counts)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{BinaryRule, Grammar, UnaryRule};
    use crate::annotation::binarize_tree;
    use crate::io::{PTBFormat, ReadTree};
    use crate::Tree;

    fn binarized_corpus() -> Vec<Tree> {
        [
            "(ROOT (S (NP (DT the) (JJ quick) (NN dog)) (VP (VBD ran))))",
            "(ROOT (S (NP (DT a) (NN cat)) (VP (VBD slept) (ADVP (RB soundly)))))",
        ]
        .iter()
        .map(|s| binarize_tree(&PTBFormat::Simple.string_to_tree(s).unwrap()))
        .collect()
    }

    #[test]
    fn rule_identity_ignores_score() {
        let mut a = UnaryRule::new("ROOT", "S");
        a.score = 0.5;
        let b = UnaryRule::new("ROOT", "S");
        assert_eq!(a, b);
        let mut c = BinaryRule::new("S", "NP", "VP");
        c.score = 0.25;
        assert_eq!(c, BinaryRule::new("S", "NP", "VP"));
        assert_ne!(c, BinaryRule::new("S", "NP", "PP"));
    }

    #[test]
    fn induced_rules() {
        let grammar = Grammar::induce(&binarized_corpus()).unwrap();
        let root_rules = grammar.unary_rules_by_child("S");
        assert_eq!(root_rules.len(), 1);
        assert_eq!(root_rules[0].parent(), "ROOT");
        assert!((root_rules[0].score() - 1.0).abs() < 1e-10);

        // binarization right-factors S into NP plus a synthetic tail that
        // rewrites to VP
        let s_rules = grammar.binary_rules_by_left_child("NP");
        assert_eq!(s_rules.len(), 1);
        assert_eq!(s_rules[0].parent(), "S");
        assert_eq!(s_rules[0].right_child(), "@S->_NP");
        assert!((s_rules[0].score() - 1.0).abs() < 1e-10);

        let tail_rules = grammar.unary_rules_by_child("VP");
        assert_eq!(tail_rules.len(), 1);
        assert_eq!(tail_rules[0].parent(), "@S->_NP");

        // same binary rule reachable through the right-child index
        assert_eq!(grammar.binary_rules_by_right_child("@S->_NP"), s_rules);
    }

    #[test]
    fn preterminals_are_not_rules() {
        let grammar = Grammar::induce(&binarized_corpus()).unwrap();
        assert!(grammar.unary_rules_by_child("the").is_empty());
        assert!(grammar.unary_rules_by_child("DT").is_empty());
        assert!(grammar.binary_rules_by_left_child("dog").is_empty());
    }

    #[test]
    fn lookup_unseen_symbol_is_empty() {
        let grammar = Grammar::induce(&binarized_corpus()).unwrap();
        assert!(grammar.unary_rules_by_child("XYZ").is_empty());
        assert!(grammar.binary_rules_by_left_child("XYZ").is_empty());
        assert!(grammar.binary_rules_by_right_child("XYZ").is_empty());
    }

    #[test]
    fn scores_normalize_per_parent() {
        let grammar = Grammar::induce(&binarized_corpus()).unwrap();
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for rule in grammar.unary_rules() {
            *totals.entry(rule.parent()).or_insert(0.0) += rule.score();
        }
        for rule in grammar.binary_rules() {
            *totals.entry(rule.parent()).or_insert(0.0) += rule.score();
        }
        assert!(!totals.is_empty());
        for (parent, total) in totals {
            assert!(
                (total - 1.0).abs() < 1e-10,
                "scores for parent {} sum to {}",
                parent,
                total
            );
        }
    }

    #[test]
    fn rejects_unbinarized_tree() {
        let tree = PTBFormat::Simple
            .string_to_tree("(S (NP (DT the) (JJ quick) (NN dog)))")
            .unwrap();
        assert!(Grammar::induce(&[tree]).is_err());
    }
}
