#[macro_use]
extern crate failure;

#[macro_use]
extern crate pest_derive;

pub mod io;
pub use crate::io::{PTBFormat, PTBLineFormat, PTBTreeIter, ReadTree, WriteTree};

mod tree;
pub use crate::tree::Tree;

mod annotation;
pub use crate::annotation::{binarize_tree, strip_function_labels, unannotate_tree};

mod lexicon;
pub use crate::lexicon::Lexicon;

mod grammar;
pub use crate::grammar::{BinaryRule, Grammar, UnaryRule};

mod parser;
pub use crate::parser::{BaselineParser, Parser};
