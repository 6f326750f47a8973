use failure::Error;

use crate::Tree;

/// Binarize a tree by right-factoring nodes with more than two children.
///
/// Nodes with a single child keep their label and recurse, leaves are copied
/// as-is. Nodes with two or more children are rewritten into a left-to-right
/// chain of synthetic binary nodes. Synthetic labels take the form
/// `@PARENT->_LEFT1_LEFT2`, recording the labels of the siblings already
/// consumed by the chain, which makes the transform lossless: the original
/// arity can be reconstructed by [`unannotate_tree`].
///
/// Every internal node of the result has exactly one or two children.
pub fn binarize_tree(tree: &Tree) -> Tree {
    if tree.is_leaf() {
        return tree.clone();
    }
    if tree.children().len() == 1 {
        return Tree::new(tree.label(), vec![binarize_tree(&tree.children()[0])]);
    }
    let intermediate_label = format!("@{}->", tree.label());
    let chain = binarize_children(tree, 0, intermediate_label);
    Tree::new(tree.label(), chain.into_children())
}

// Builds the synthetic chain covering tree's children starting at `consumed`.
fn binarize_children(tree: &Tree, consumed: usize, intermediate_label: String) -> Tree {
    let left = &tree.children()[consumed];
    let mut children = vec![binarize_tree(left)];
    if consumed < tree.children().len() - 1 {
        let next_label = format!("{}_{}", intermediate_label, left.label());
        children.push(binarize_children(tree, consumed + 1, next_label));
    }
    Tree::synthetic(intermediate_label, children)
}

/// Undo binarization and remove functional annotation from labels.
///
/// Two passes: first every synthetic node is spliced out, its children
/// replacing it in its parent with order preserved, restoring the original
/// arity. Then every remaining non-leaf label is truncated at the first `-`,
/// `^` or `:`, e.g. `NP-SUBJ` becomes `NP` and `PP^S` becomes `PP`;
/// marker-initial labels like `-NONE-` are left alone. The truncation is
/// lossy: functional tags are discarded, only the base nonterminal symbol
/// is kept.
///
/// Returns an error if splicing does not leave a unique root, which happens
/// when the root itself is a synthetic node with several children.
pub fn unannotate_tree(tree: &Tree) -> Result<Tree, Error> {
    let mut roots = splice_synthetic(tree);
    if roots.len() != 1 {
        bail!(
            "No unique root after splicing synthetic nodes: {} roots",
            roots.len()
        );
    }
    Ok(strip_function_labels(&roots.remove(0)))
}

// Bottom-up splice: a synthetic node dissolves into the child list of its
// parent, everything else is rebuilt with the spliced children.
fn splice_synthetic(tree: &Tree) -> Vec<Tree> {
    let mut children = Vec::new();
    for child in tree.children() {
        children.extend(splice_synthetic(child));
    }
    if tree.is_synthetic() {
        children
    } else {
        vec![Tree::new(tree.label(), children)]
    }
}

/// Truncate functional annotation on every non-leaf label.
///
/// Labels are cut at the first `-`, `^` or `:`; marker-initial labels stay
/// whole. Leaf labels are surface words and are never touched. Synthetic
/// labels contain `->` by construction and are skipped as well, splice them
/// out with [`unannotate_tree`] first.
pub fn strip_function_labels(tree: &Tree) -> Tree {
    if tree.is_leaf() {
        return tree.clone();
    }
    let children = tree.children().iter().map(strip_function_labels).collect();
    if tree.is_synthetic() {
        Tree::synthetic(tree.label(), children)
    } else {
        Tree::new(truncate_label(tree.label()), children)
    }
}

// Cut at the first functional marker. Marker-initial labels like -NONE- or
// -LRB- are base symbols and stay whole.
pub(crate) fn truncate_label(label: &str) -> &str {
    match label.find(|ch| ch == '-' || ch == '^' || ch == ':') {
        Some(idx) if idx > 0 => &label[..idx],
        _ => label,
    }
}
