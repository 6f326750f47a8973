use std::io::{BufRead, Lines};

use failure::Error;
use pest::iterators::Pair;
use pest::Parser;

use crate::annotation::truncate_label;
use crate::io::{ReadTree, WriteTree};
use crate::Tree;

/// `PTBFormat`
pub enum PTBFormat {
    /// Penn Treebank V2 format.
    ///
    /// Functional annotation on node labels is discarded while reading:
    /// labels are truncated at the first `-`, `^` or `:`, e.g. `NP-SBJ` is
    /// read as `NP`, while marker-initial labels like `-NONE-` stay whole.
    /// Labels of binarization-introduced nodes (prefixed with `@`) are kept
    /// verbatim.
    PTB,
    /// Simple format.
    ///
    /// Labels are taken verbatim.
    Simple,
}

// dummy struct required by pest
#[derive(Parser)]
#[grammar = "io/ptb.pest"]
struct PTBParser;

impl ReadTree for PTBFormat {
    fn string_to_tree(&self, string: &str) -> Result<Tree, Error> {
        let mut parsed = PTBParser::parse(Rule::tree, string)?;
        self.parse_value(parsed.next().unwrap())
    }
}

impl WriteTree for PTBFormat {
    fn tree_to_string(&self, tree: &Tree) -> Result<String, Error> {
        if tree.is_leaf() {
            bail!("Can't serialize a bare leaf as a tree.");
        }
        Ok(format_sub_tree(tree))
    }
}

impl PTBFormat {
    pub fn try_from_str(s: &str) -> Result<PTBFormat, Error> {
        let s = s.to_lowercase();
        match s.as_str() {
            "ptb" => Ok(PTBFormat::PTB),
            "simple" => Ok(PTBFormat::Simple),
            _ => Err(format_err!("Unknown format: {}", s)),
        }
    }

    fn parse_value(&self, pair: Pair<Rule>) -> Result<Tree, Error> {
        match pair.as_rule() {
            Rule::nonterminal => {
                let mut pairs = pair.into_inner();
                // first pair is always the label of the inner node
                let label = self.process_label(pairs.next().unwrap().as_str());
                let mut children = Vec::new();
                for inner_pair in pairs {
                    children.push(self.parse_value(inner_pair)?);
                }
                Ok(make_node(label, children))
            }
            Rule::preterminal => {
                let mut pairs = pair.into_inner();
                let tag = self.process_label(pairs.next().unwrap().as_str());
                let form = pairs.next().unwrap();
                if let Rule::terminal = form.as_rule() {
                    Ok(make_node(tag, vec![Tree::leaf(form.as_str())]))
                } else {
                    Err(format_err!(
                        "Preterminal without terminal child: {}",
                        form.as_str()
                    ))
                }
            }
            _ => Err(format_err!("Unexpected rule: {}", pair.as_str())),
        }
    }

    fn process_label<'a>(&self, label: &'a str) -> &'a str {
        match self {
            PTBFormat::Simple => label,
            PTBFormat::PTB => {
                if label.starts_with('@') {
                    label
                } else {
                    truncate_label(label)
                }
            }
        }
    }
}

// labels beginning with "@" mark nodes introduced by binarization, restore
// the structural flag so unannotation can splice them out again
fn make_node(label: &str, children: Vec<Tree>) -> Tree {
    if label.starts_with('@') {
        Tree::synthetic(label, children)
    } else {
        Tree::new(label, children)
    }
}

fn format_sub_tree(tree: &Tree) -> String {
    if tree.is_leaf() {
        return tree.label().replace("(", "LBR").replace(")", "RBR");
    }
    let mut parts = Vec::with_capacity(tree.children().len() + 1);
    parts.push(tree.label().replace("(", "LBR").replace(")", "RBR"));
    parts.extend(tree.children().iter().map(format_sub_tree));
    format!("({})", parts.join(" "))
}

/// `PTBLineFormat`.
///
/// This enum specifies whether the trees are encoded in single-line or
/// multi-line format.
pub enum PTBLineFormat {
    SingleLine,
    MultiLine,
}

/// Iterator over trees in a PTB format file.
///
/// Lines starting with `%` are treated as comments. Each tree is yielded as
/// its own `Result`, a malformed tree doesn't end the iteration and can be
/// skipped by the caller.
pub struct PTBTreeIter<R> {
    inner: Lines<R>,
    line_format: PTBLineFormat,
    format: PTBFormat,
}

impl<R> Iterator for PTBTreeIter<R>
where
    R: BufRead,
{
    type Item = Result<Tree, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let PTBLineFormat::SingleLine = self.line_format {
            while let Some(line) = self.inner.next() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => return Some(Err(err.into())),
                };
                if line.starts_with('%') || line.trim().is_empty() {
                    continue;
                }
                return Some(self.format.string_to_tree(&line));
            }
            return None;
        }
        let mut buffer = String::new();
        let mut open = 0;
        while let Some(line) = self.inner.next() {
            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            if (line.starts_with('%') && buffer.is_empty()) || line.trim().is_empty() {
                continue;
            }
            let (line_open, line_closed) = count_pars(&line);
            open += line_open;
            open -= line_closed;
            buffer.push_str(line.as_str());
            buffer.push(' ');
            if open == 0 {
                return Some(self.format.string_to_tree(&buffer));
            }
        }
        None
    }
}

impl<R> PTBTreeIter<R>
where
    R: BufRead,
{
    /// Constructs a new tree iterator.
    pub fn new(read: R, format: PTBFormat, line_format: PTBLineFormat) -> Self {
        PTBTreeIter {
            inner: read.lines(),
            format,
            line_format,
        }
    }
}

fn count_pars(line: &str) -> (isize, isize) {
    let mut open = 0;
    let mut closed = 0;
    for c in line.chars() {
        if c == '(' {
            open += 1
        }
        if c == ')' {
            closed += 1
        }
    }
    (open, closed)
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::{BufReader, Cursor};

    use super::{PTBFormat, PTBLineFormat, PTBTreeIter};
    use crate::io::{ReadTree, WriteTree};
    use crate::Tree;

    #[test]
    fn read_simple() {
        let input = "(ROOT (S (NP (DT the) (NN dog)) (VP (VBD ran))))";
        let tree = PTBFormat::Simple.string_to_tree(input).unwrap();
        assert_eq!(tree.words(), vec!["the", "dog", "ran"]);
        assert_eq!(tree.preterminal_yield(), vec!["DT", "NN", "VBD"]);
        assert_eq!(PTBFormat::Simple.tree_to_string(&tree).unwrap(), input);
    }

    #[test]
    fn read_strips_functional_labels() {
        let input = "(ROOT (S (NP-SBJ (DT the) (NN dog)) (VP^S (VBD ran))))";
        let tree = PTBFormat::PTB.string_to_tree(input).unwrap();
        let target = PTBFormat::Simple
            .string_to_tree("(ROOT (S (NP (DT the) (NN dog)) (VP (VBD ran))))")
            .unwrap();
        assert_eq!(tree, target);
    }

    #[test]
    fn simple_keeps_functional_labels() {
        let input = "(S (NP-SBJ (NN dog)))";
        let tree = PTBFormat::Simple.string_to_tree(input).unwrap();
        assert_eq!(tree.children()[0].label(), "NP-SBJ");
    }

    #[test]
    fn synthetic_labels_round_trip() {
        let input = "(X (A a) (@X->_A (B b) (@X->_A_B (C c))))";
        let tree = PTBFormat::Simple.string_to_tree(input).unwrap();
        assert!(tree.children()[1].is_synthetic());
        assert!(!tree.children()[0].is_synthetic());
        assert_eq!(PTBFormat::Simple.tree_to_string(&tree).unwrap(), input);
    }

    #[test]
    fn single_preterminal() {
        let input = "(T t)";
        let tree = PTBFormat::Simple.string_to_tree(input).unwrap();
        assert!(tree.is_preterminal());
        assert_eq!(input, PTBFormat::Simple.tree_to_string(&tree).unwrap());
    }

    #[test]
    fn writer_escapes_parens() {
        let tree = Tree::new("LST", vec![Tree::new("-LRB-", vec![Tree::leaf("(")])]);
        assert_eq!(
            PTBFormat::Simple.tree_to_string(&tree).unwrap(),
            "(LST (-LRB- LBR))"
        );
    }

    #[test]
    fn bare_leaf_is_not_a_tree() {
        assert!(PTBFormat::Simple.tree_to_string(&Tree::leaf("word")).is_err());
    }

    #[test]
    fn empty_line() {
        assert!(PTBFormat::Simple.string_to_tree("").is_err());
    }

    #[test]
    fn closed_too_early() {
        let l = "(ROOT (FIRST (TERM1 t1) (TERM2 t2)) (SEC (TERM1 t1)))) (TERM t))";
        assert!(PTBFormat::Simple.string_to_tree(l).is_err());
    }

    #[test]
    fn missing_par() {
        let l = "(ROOT (FIRST (TERM1 t1) (TERM2 t2)) (SEC (TERM1 t1)) (TERM t)";
        assert!(PTBFormat::Simple.string_to_tree(l).is_err());
    }

    #[test]
    fn second_tree_on_line() {
        let l = "(ROOT (TERM t)) (ROOT (TERM t))";
        assert!(PTBFormat::Simple.string_to_tree(l).is_err());
    }

    #[test]
    fn iter_single_line() {
        let input = "% comment\n\
                     (ROOT (S (NP (DT the) (NN dog)) (VP (VBD ran))))\n\
                     \n\
                     (ROOT (S (NP (DT a) (NN cat)) (VP (VBD slept))))\n";
        let trees = PTBTreeIter::new(
            Cursor::new(input),
            PTBFormat::Simple,
            PTBLineFormat::SingleLine,
        )
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].words(), vec!["the", "dog", "ran"]);
        assert_eq!(trees[1].words(), vec!["a", "cat", "slept"]);
    }

    #[test]
    fn iter_isolates_malformed_trees() {
        let input = "(ROOT (S (NP (DT the) (NN dog)) (VP (VBD ran))))\n\
                     (ROOT (S (NP (DT the)\n\
                     (ROOT (S (NP (DT a) (NN cat)) (VP (VBD slept))))\n";
        let results = PTBTreeIter::new(
            Cursor::new(input),
            PTBFormat::Simple,
            PTBLineFormat::SingleLine,
        )
        .collect::<Vec<_>>();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn iter_multiline() {
        let input = File::open("testdata/multiline.ptb").unwrap();
        let trees = PTBTreeIter::new(
            BufReader::new(input),
            PTBFormat::PTB,
            PTBLineFormat::MultiLine,
        )
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].words(), vec!["the", "dog", "ran"]);
        assert_eq!(trees[0].children()[0].children()[0].label(), "NP");
        assert_eq!(trees[1].leaf_count(), 3);
    }

    #[test]
    fn corpus_file() {
        let input = File::open("testdata/corpus.ptb").unwrap();
        let trees = PTBTreeIter::new(
            BufReader::new(input),
            PTBFormat::Simple,
            PTBLineFormat::SingleLine,
        )
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
        assert_eq!(trees.len(), 2);
    }

    #[test]
    fn format_from_str() {
        assert!(PTBFormat::try_from_str("ptb").is_ok());
        assert!(PTBFormat::try_from_str("Simple").is_ok());
        assert!(PTBFormat::try_from_str("negra").is_err());
    }
}
