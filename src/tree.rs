use std::fmt;

use failure::Error;

/// `Tree`
///
/// Recursive constituency tree node. A node carries a label and an ordered
/// sequence of children. Nodes without children are leaves and their label is
/// a surface word. A node whose single child is a leaf is a preterminal, its
/// label is the part-of-speech tag of the word below it.
///
/// Every subtree is exclusively owned by its parent, `clone` returns a deep,
/// independent copy.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Tree {
    label: String,
    children: Vec<Tree>,
    synthetic: bool,
}

impl Tree {
    /// Construct a new inner node.
    pub fn new(label: impl Into<String>, children: Vec<Tree>) -> Self {
        Tree {
            label: label.into(),
            children,
            synthetic: false,
        }
    }

    /// Construct a leaf node holding a word.
    pub fn leaf(word: impl Into<String>) -> Self {
        Tree {
            label: word.into(),
            children: Vec::new(),
            synthetic: false,
        }
    }

    /// Construct a synthetic node introduced by binarization.
    ///
    /// Synthetic nodes are spliced out again when a tree is unannotated. At
    /// the serialization boundary they are distinguished by an `@` prefix on
    /// the label.
    pub(crate) fn synthetic(label: impl Into<String>, children: Vec<Tree>) -> Self {
        Tree {
            label: label.into(),
            children,
            synthetic: true,
        }
    }

    /// Consume the node and return its children.
    pub(crate) fn into_children(self) -> Vec<Tree> {
        self.children
    }

    /// Get the node's label.
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Get the node's children.
    pub fn children(&self) -> &[Tree] {
        &self.children
    }

    /// Returns whether this node was introduced by binarization.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Returns whether this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns whether this node is a preterminal, i.e. a part-of-speech tag
    /// directly above a single word leaf.
    pub fn is_preterminal(&self) -> bool {
        self.children.len() == 1 && self.children[0].is_leaf()
    }

    /// Get the number of leaves below this node.
    ///
    /// This is the length of the span the node covers.
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(Tree::leaf_count).sum()
        }
    }

    /// Get the left-to-right sequence of words below this node.
    pub fn words(&self) -> Vec<&str> {
        let mut words = Vec::new();
        self.append_words(&mut words);
        words
    }

    fn append_words<'a>(&'a self, words: &mut Vec<&'a str>) {
        if self.is_leaf() {
            words.push(self.label.as_str());
        } else {
            for child in &self.children {
                child.append_words(words);
            }
        }
    }

    /// Get the left-to-right sequence of preterminal labels below this node.
    ///
    /// This is the part-of-speech tagging of the sentence the tree covers.
    pub fn preterminal_yield(&self) -> Vec<&str> {
        let mut tags = Vec::new();
        self.append_preterminals(&mut tags);
        tags
    }

    fn append_preterminals<'a>(&'a self, tags: &mut Vec<&'a str>) {
        if self.is_preterminal() {
            tags.push(self.label.as_str());
        } else {
            for child in &self.children {
                child.append_preterminals(tags);
            }
        }
    }

    /// Overwrite the leaf words positionally.
    ///
    /// Used to instantiate a memorized parse template on a new sentence.
    /// Structure and tags are preserved, only the surface words change.
    ///
    /// Returns:
    /// * `Error` if the number of words doesn't match the number of leaves.
    /// * `Ok` otherwise.
    pub fn set_words<S>(&mut self, words: impl IntoIterator<Item = S>) -> Result<(), Error>
    where
        S: Into<String>,
    {
        let mut words = words.into_iter();
        self.set_words_inner(&mut words)?;
        if words.next().is_some() {
            bail!("Number of words is greater than number of leaves.");
        }
        Ok(())
    }

    fn set_words_inner<I>(&mut self, words: &mut I) -> Result<(), Error>
    where
        I: Iterator,
        I::Item: Into<String>,
    {
        if self.is_leaf() {
            match words.next() {
                Some(word) => {
                    self.label = word.into();
                    Ok(())
                }
                None => bail!("Not enough words for the tree's leaves."),
            }
        } else {
            for child in &mut self.children {
                child.set_words_inner(words)?;
            }
            Ok(())
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_leaf() {
            write!(f, "{}", self.label)
        } else {
            write!(f, "({}", self.label)?;
            for child in &self.children {
                write!(f, " {}", child)?;
            }
            write!(f, ")")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Tree;

    fn fixture() -> Tree {
        Tree::new(
            "S",
            vec![
                Tree::new(
                    "NP",
                    vec![
                        Tree::new("DT", vec![Tree::leaf("the")]),
                        Tree::new("NN", vec![Tree::leaf("dog")]),
                    ],
                ),
                Tree::new("VP", vec![Tree::new("VBD", vec![Tree::leaf("ran")])]),
            ],
        )
    }

    #[test]
    fn yields() {
        let tree = fixture();
        assert_eq!(tree.words(), vec!["the", "dog", "ran"]);
        assert_eq!(tree.preterminal_yield(), vec!["DT", "NN", "VBD"]);
        assert_eq!(tree.leaf_count(), 3);
    }

    #[test]
    fn preterminal() {
        let tree = fixture();
        assert!(!tree.is_preterminal());
        assert!(tree.children()[0].children()[0].is_preterminal());
        assert!(tree.children()[0].children()[0].children()[0].is_leaf());
    }

    #[test]
    fn set_words() {
        let mut tree = fixture();
        tree.set_words(vec!["a", "cat", "slept"]).unwrap();
        assert_eq!(tree.words(), vec!["a", "cat", "slept"]);
        // tags untouched
        assert_eq!(tree.preterminal_yield(), vec!["DT", "NN", "VBD"]);

        assert!(tree.set_words(vec!["a", "cat"]).is_err());
        assert!(tree.set_words(vec!["a", "cat", "slept", "twice"]).is_err());
    }

    #[test]
    fn clone_is_deep() {
        let tree = fixture();
        let mut copy = tree.clone();
        copy.set_words(vec!["a", "cat", "slept"]).unwrap();
        assert_eq!(tree.words(), vec!["the", "dog", "ran"]);
    }

    #[test]
    fn display() {
        let tree = fixture();
        assert_eq!(
            tree.to_string(),
            "(S (NP (DT the) (NN dog)) (VP (VBD ran)))"
        );
    }
}
