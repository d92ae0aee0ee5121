//! aptx - JWST APT proposal downloader and XML-to-JSON converter
//!
//! # Quick Start
//!
//! ```
//! use aptx::{from_xml_str, Node};
//! # fn main() -> Result<(), aptx::Error> {
//! let doc = from_xml_str("<obs><item>a</item><item>b</item></obs>")?;
//! let node = aptx::convert_document(&doc);
//! assert_eq!(node, Node::List(vec![Node::from("a"), Node::from("b")]));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod lexer;

pub mod node;
pub use node::{Node, NodeKind, Record};

pub mod xml;
pub use xml::{
    Config as XmlConfig, Document as XmlDocument, Element as XmlElement, Parser as XmlParser,
};

pub mod convert;
pub use convert::{convert, convert_document, ConvertOptions, Converter, MergeStrategy};

pub mod archive;
pub mod batch;
pub mod config;
pub mod fetch;
pub mod runlog;

pub use archive::{extract, extract_into};
pub use batch::BatchReport;
pub use config::{BatchConfig, FetchConfig};
pub use fetch::{FetchOutcome, Fetcher};
pub use runlog::RunLog;

/// Parse XML from string
pub fn from_xml_str(s: &str) -> Result<XmlDocument> {
    let mut parser = XmlParser::new(s.as_bytes());
    parser.parse()
}

/// Parse XML from bytes
pub fn from_xml_bytes(bytes: &[u8]) -> Result<XmlDocument> {
    let mut parser = XmlParser::new(bytes);
    parser.parse()
}

/// Parse XML and convert it to indented JSON
#[cfg(feature = "serde")]
pub fn xml_to_json(s: &str) -> Result<String> {
    xml_to_json_with_options(s, ConvertOptions::default())
}

/// Parse XML and convert it to indented JSON with custom options
#[cfg(feature = "serde")]
pub fn xml_to_json_with_options(s: &str, options: ConvertOptions) -> Result<String> {
    let doc = from_xml_str(s)?;
    let node = Converter::with_options(options).convert_document(&doc)?;
    convert::to_json_pretty(&node)
}
