//! Parse XML into a read-only tree and query it with namespace-aware XPath.
//!
//! ```rust
//! use xmlquery::Document;
//!
//! let doc = Document::parse_str(
//!     r#"<o:doc xmlns:o="urn:office"><o:Author>me</o:Author></o:doc>"#,
//! )?;
//! let author = doc.at_xpath("//o:Author", &[("o", "urn:office")])?;
//! assert_eq!(author.map(|author| author.text()), Some("me".to_string()));
//! # Ok::<(), xmlquery::Error>(())
//! ```
#![forbid(unsafe_code)]

mod access;
mod document;
mod encoding;
mod entity;
mod error;
pub mod events;
mod idmap;
mod loader;
mod name;
mod nameaccess;
mod namespace;
mod noderef;
mod parse;
mod prefix;
mod scope;
mod xmlvalue;
mod xpath;

pub use access::NodeEdge;
pub use document::{Document, NamespaceDeclaration, Node};
pub use error::{Error, ParseError, XPathError};
pub use events::{Event, Events, RawAttribute, RawNamespace};
pub use loader::{FileLoader, Loader};
pub use name::NameId;
pub use namespace::NamespaceId;
pub use noderef::NodeRef;
pub use parse::ParseOptions;
pub use prefix::PrefixId;
pub use xmlvalue::{
    Attribute, Comment, Element, Prefixes, ProcessingInstruction, Text, Value, ValueType,
};
pub use xpath::XPath;
