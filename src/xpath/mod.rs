//! XPath queries over a [`Document`].
//!
//! The supported language is the location path subset of XPath 1.0:
//!
//! * absolute and relative paths, `//`, `.`, `..` and `@`; an attribute
//!   step may only be followed by `..`, `parent::`, `ancestor::` or
//!   `self::node()`;
//! * the axes `child`, `descendant`, `descendant-or-self`, `self`,
//!   `parent`, `ancestor`, `ancestor-or-self`, `following-sibling`,
//!   `preceding-sibling` and `attribute`;
//! * name tests (`name`, `p:name`, `*`, `p:*`) and the node type tests
//!   `node()`, `text()`, `comment()` and `processing-instruction()`;
//! * predicates with comparisons, `and`, `or`, numbers, strings and the
//!   functions `position`, `last`, `count`, `not`, `true`, `false`,
//!   `contains`, `starts-with`, `string`, `normalize-space`, `local-name`
//!   and `name`.
//!
//! Namespace prefixes in an expression are bound when it is evaluated. A
//! prefix is looked up in the bindings passed by the caller first, then in
//! the declarations on the document element, where the default namespace is
//! available under the prefix `xmlns`. An unprefixed name test only matches
//! names that are in no namespace.
mod ast;
mod eval;
mod lexer;
mod parser;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::document::{Document, Node};
use crate::error::XPathError;
use crate::noderef::NodeRef;

use ast::LocationPath;
use eval::{item_string, Evaluator, Item};

/// A compiled XPath expression.
///
/// Compiling checks the syntax once; the result can be evaluated against
/// any number of documents with [`Document::evaluate`]. Prefixes are not
/// resolved until then.
///
/// ```rust
/// use xmlquery::{Document, XPath};
///
/// let xpath = XPath::compile("//item[@id = '2']")?;
/// let doc = Document::parse_str(r#"<list><item id="1"/><item id="2"/></list>"#)?;
/// let found = doc.evaluate(&xpath, doc.root(), &[])?.collect::<Vec<_>>();
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].get("id"), Some("2"));
/// # Ok::<(), xmlquery::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct XPath {
    expression: String,
    path: Arc<LocationPath>,
    prefixes: Vec<String>,
}

impl XPath {
    /// Compile an expression.
    pub fn compile(expression: &str) -> Result<XPath, XPathError> {
        let path = parser::parse_path(expression)?;
        let mut prefixes = Vec::new();
        path.collect_prefixes(&mut prefixes);
        tracing::trace!(expression, ?prefixes, "compiled xpath");
        Ok(XPath {
            expression: expression.to_string(),
            path: Arc::new(path),
            prefixes,
        })
    }

    /// The source text of the expression.
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// The namespace prefixes the expression uses, in order of appearance.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// False if the last step selects attributes.
    pub fn selects_nodes(&self) -> bool {
        !self.path.selects_attributes()
    }
}

impl FromStr for XPath {
    type Err = XPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        XPath::compile(s)
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// ## XPath queries
impl Document {
    /// Select nodes with an XPath expression, starting at the document root.
    ///
    /// `namespaces` binds prefixes to namespace URIs. Results come in
    /// document order without duplicates and are produced lazily.
    ///
    /// ```rust
    /// use xmlquery::Document;
    ///
    /// let doc = Document::parse_str(
    ///     r#"<Relationships xmlns="urn:rels"><Relationship Id="rId1"/></Relationships>"#,
    /// )?;
    /// // unprefixed names are not in a namespace
    /// assert_eq!(doc.xpath("//Relationship", &[])?.count(), 0);
    /// // the document element's default namespace is bound to `xmlns`
    /// assert_eq!(doc.xpath("//xmlns:Relationship", &[])?.count(), 1);
    /// assert_eq!(doc.xpath("//r:Relationship", &[("r", "urn:rels")])?.count(), 1);
    /// # Ok::<(), xmlquery::Error>(())
    /// ```
    pub fn xpath(
        &self,
        expression: &str,
        namespaces: &[(&str, &str)],
    ) -> Result<impl Iterator<Item = NodeRef<'_>> + '_, XPathError> {
        self.xpath_from(self.root, expression, namespaces)
    }

    /// The first node [`Document::xpath`] selects, if any.
    pub fn at_xpath(
        &self,
        expression: &str,
        namespaces: &[(&str, &str)],
    ) -> Result<Option<NodeRef<'_>>, XPathError> {
        Ok(self.xpath(expression, namespaces)?.next())
    }

    /// Evaluate a compiled expression with `context` as the context node.
    ///
    /// Fails with [`XPathError::NotANodePath`] if the expression selects
    /// attributes; use [`Document::xpath_values`] for those.
    pub fn evaluate<'a>(
        &'a self,
        xpath: &XPath,
        context: Node,
        namespaces: &[(&str, &str)],
    ) -> Result<impl Iterator<Item = NodeRef<'a>> + 'a, XPathError> {
        if !xpath.selects_nodes() {
            return Err(XPathError::NotANodePath);
        }
        let items = self.select_items(xpath, context, namespaces)?;
        Ok(items.filter_map(move |item| match item {
            Item::Node(node) => Some(self.node_ref(node)),
            Item::Attribute(..) => None,
        }))
    }

    /// The string values of everything an expression selects.
    ///
    /// Unlike [`Document::xpath`] this accepts paths ending in an attribute
    /// step.
    ///
    /// ```rust
    /// let doc = xmlquery::Document::parse_str(r#"<a><b id="1">x</b><b id="2">y</b></a>"#)?;
    /// let ids = doc.xpath_values("//b/@id", &[])?.collect::<Vec<_>>();
    /// assert_eq!(ids, vec!["1", "2"]);
    /// let texts = doc.xpath_values("//b", &[])?.collect::<Vec<_>>();
    /// assert_eq!(texts, vec!["x", "y"]);
    /// # Ok::<(), xmlquery::Error>(())
    /// ```
    pub fn xpath_values(
        &self,
        expression: &str,
        namespaces: &[(&str, &str)],
    ) -> Result<impl Iterator<Item = String> + '_, XPathError> {
        let xpath = XPath::compile(expression)?;
        let items = self.select_items(&xpath, self.root, namespaces)?;
        Ok(items.map(move |item| item_string(self, item)))
    }

    pub(crate) fn xpath_from(
        &self,
        context: Node,
        expression: &str,
        namespaces: &[(&str, &str)],
    ) -> Result<impl Iterator<Item = NodeRef<'_>> + '_, XPathError> {
        let xpath = XPath::compile(expression)?;
        self.evaluate(&xpath, context, namespaces)
    }

    fn select_items<'a>(
        &'a self,
        xpath: &XPath,
        context: Node,
        namespaces: &[(&str, &str)],
    ) -> Result<impl Iterator<Item = Item> + 'a, XPathError> {
        let evaluator = Evaluator::new(self, &xpath.prefixes, namespaces)?;
        tracing::trace!(expression = xpath.as_str(), "evaluating xpath");
        Ok(evaluator.select_owned(Arc::clone(&xpath.path), context))
    }
}
