//! XML parser module

pub mod model;
pub mod parser;

pub use model::{Document, Element};
pub use parser::{Config, Parser};
