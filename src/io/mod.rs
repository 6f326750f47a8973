mod ptb;
pub use crate::io::ptb::{PTBFormat, PTBLineFormat, PTBTreeIter};

use failure::Error;

use crate::tree::Tree;

/// Trait to read a `Tree` from its bracketed string form.
pub trait ReadTree {
    fn string_to_tree(&self, string: &str) -> Result<Tree, Error>;
}

/// Trait to write a `Tree` to its bracketed string form.
pub trait WriteTree {
    fn tree_to_string(&self, tree: &Tree) -> Result<String, Error>;
}
