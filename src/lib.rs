pub mod token;
pub mod tokenizer;
pub mod ast;
pub mod entry;
pub mod error;
pub mod parser;
pub mod tree_builder;
pub mod render;

pub use error::{Error, Result};
pub use parser::{parse, parse_entries};
pub use render::render;
pub use tree_builder::serialize_tree;
