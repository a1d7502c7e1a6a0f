use std::path::Path;

use indextree::{Arena, NodeId};
use url::Url;

use crate::encoding::decode;
use crate::error::{Error, ParseError};
use crate::loader::{FileLoader, Loader};
use crate::name::NameLookup;
use crate::namespace::{NamespaceId, NamespaceLookup, XML_NAMESPACE};
use crate::parse::{build, ParseOptions};
use crate::prefix::{PrefixId, PrefixLookup};
use crate::xmlvalue::Value;

pub(crate) type XmlArena = Arena<Value>;

/// A node in the XML tree.
///
/// This is a lightweight value and can be copied. It is only meaningful
/// together with the [`Document`] it came from. Nodes are created in document
/// order and never move, so comparing two nodes of the same document compares
/// their position in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node(NodeId);

impl Node {
    #[inline]
    pub(crate) fn new(node_id: NodeId) -> Self {
        Node(node_id)
    }

    #[inline]
    pub(crate) fn get(&self) -> NodeId {
        self.0
    }
}

/// A namespace declaration occurrence in a document.
///
/// Every `xmlns` or `xmlns:p` attribute in the source produces one of these,
/// so a URI declared on several elements is listed several times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDeclaration<'a> {
    prefix: &'a str,
    uri: &'a str,
    node: Node,
}

impl<'a> NamespaceDeclaration<'a> {
    /// The declared prefix; empty for a default namespace declaration.
    pub fn prefix(&self) -> &'a str {
        self.prefix
    }

    /// The namespace URI.
    pub fn uri(&self) -> &'a str {
        self.uri
    }

    /// The element carrying the declaration.
    pub fn node(&self) -> Node {
        self.node
    }
}

/// A parsed XML document.
///
/// A document is created by one of the `parse` functions and is read-only
/// afterwards, so it can be shared freely between threads.
///
/// ```rust
/// use xmlquery::Document;
///
/// let doc = Document::parse_str(r#"<o:a xmlns:o="urn:o"><o:b>hi</o:b></o:a>"#)?;
/// let b = doc.at_xpath("//o:b", &[("o", "urn:o")])?.unwrap();
/// assert_eq!(b.tag_name(), Some("b"));
/// assert_eq!(b.text(), "hi");
/// # Ok::<(), xmlquery::Error>(())
/// ```
#[derive(Debug)]
pub struct Document {
    pub(crate) arena: XmlArena,
    pub(crate) root: Node,
    pub(crate) namespace_lookup: NamespaceLookup,
    pub(crate) prefix_lookup: PrefixLookup,
    pub(crate) name_lookup: NameLookup,
    pub(crate) no_namespace_id: NamespaceId,
    pub(crate) empty_prefix_id: PrefixId,
    pub(crate) xml_namespace_id: NamespaceId,
    pub(crate) xml_prefix_id: PrefixId,
    pub(crate) declarations: Vec<(Node, PrefixId, NamespaceId)>,
}

impl Document {
    pub(crate) fn empty() -> Self {
        let mut arena = XmlArena::new();
        let root = Node::new(arena.new_node(Value::Root));
        let mut namespace_lookup = NamespaceLookup::new();
        let no_namespace_id = namespace_lookup.get_id_mut(String::new());
        let xml_namespace_id = namespace_lookup.get_id_mut(XML_NAMESPACE.to_string());
        let mut prefix_lookup = PrefixLookup::new();
        let empty_prefix_id = prefix_lookup.get_id_mut(String::new());
        let xml_prefix_id = prefix_lookup.get_id_mut("xml".to_string());
        Document {
            arena,
            root,
            namespace_lookup,
            prefix_lookup,
            name_lookup: NameLookup::new(),
            no_namespace_id,
            empty_prefix_id,
            xml_namespace_id,
            xml_prefix_id,
            declarations: Vec::new(),
        }
    }

    /// Parse bytes in the given encoding.
    ///
    /// `encoding` is an encoding label such as `"utf-8"` or `"iso-8859-1"`;
    /// with `None` the encoding is taken from a byte-order mark or the XML
    /// declaration, defaulting to UTF-8.
    ///
    /// Empty or whitespace-only input fails with [`ParseError::Empty`].
    ///
    /// ```rust
    /// use xmlquery::{Document, ParseError};
    ///
    /// assert_eq!(Document::parse(b" ", Some("utf-8")).unwrap_err(), ParseError::Empty);
    /// ```
    pub fn parse(xml: &[u8], encoding: Option<&str>) -> Result<Self, ParseError> {
        let options = match encoding {
            Some(label) => ParseOptions::default().encoding(label),
            None => ParseOptions::default(),
        };
        Self::parse_with_options(xml, &options)
    }

    /// Parse bytes with explicit [`ParseOptions`].
    pub fn parse_with_options(xml: &[u8], options: &ParseOptions) -> Result<Self, ParseError> {
        let text = decode(xml, options.encoding.as_deref())?;
        Self::parse_text(&text, options)
    }

    /// Parse text that is already decoded.
    pub fn parse_str(xml: &str) -> Result<Self, ParseError> {
        Self::parse_text(xml, &ParseOptions::default())
    }

    fn parse_text(xml: &str, options: &ParseOptions) -> Result<Self, ParseError> {
        if xml.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        build(xml, options)
    }

    /// Read and parse a file.
    pub fn parse_file<P: AsRef<Path>>(path: P, encoding: Option<&str>) -> Result<Self, Error> {
        let bytes = std::fs::read(path)?;
        Ok(Self::parse(&bytes, encoding)?)
    }

    /// Load and parse a document from a URL.
    ///
    /// Only `file:` URLs are loaded; a string that isn't a URL is taken
    /// to be a file path. Use [`Document::parse_url_with`] to plug in another
    /// [`Loader`].
    pub fn parse_url(url: &str, encoding: Option<&str>) -> Result<Self, Error> {
        let url = match Url::parse(url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let path = std::env::current_dir()?.join(url);
                Url::from_file_path(&path)
                    .map_err(|_| Error::UnsupportedScheme(path.display().to_string()))?
            }
            Err(e) => return Err(e.into()),
        };
        let options = match encoding {
            Some(label) => ParseOptions::default().encoding(label),
            None => ParseOptions::default(),
        };
        Self::parse_url_with(&url, &FileLoader, &options)
    }

    /// Load bytes for `url` through `loader` and parse them.
    pub fn parse_url_with(
        url: &Url,
        loader: &dyn Loader,
        options: &ParseOptions,
    ) -> Result<Self, Error> {
        let bytes = loader.load(url)?;
        tracing::debug!(%url, bytes = bytes.len(), "loaded document");
        Ok(Self::parse_with_options(&bytes, options)?)
    }

    /// The document root.
    ///
    /// This is not the document element but the node that holds it, along
    /// with any top-level comments and processing instructions.
    pub fn root(&self) -> Node {
        self.root
    }

    /// Every namespace declaration in the document, in document order.
    ///
    /// ```rust
    /// use xmlquery::Document;
    ///
    /// let doc = Document::parse_str(r#"<a xmlns="urn:x"><b xmlns:x="urn:x"/></a>"#)?;
    /// let uris = doc.namespaces().iter().map(|ns| ns.uri()).collect::<Vec<_>>();
    /// assert_eq!(uris, vec!["urn:x", "urn:x"]);
    /// # Ok::<(), xmlquery::ParseError>(())
    /// ```
    pub fn namespaces(&self) -> Vec<NamespaceDeclaration<'_>> {
        self.declarations
            .iter()
            .map(|(node, prefix_id, namespace_id)| self.declaration(*node, *prefix_id, *namespace_id))
            .collect()
    }

    /// The namespace declarations made on the document element.
    pub fn root_namespaces(&self) -> Vec<NamespaceDeclaration<'_>> {
        let document_element = self.document_element();
        self.namespaces()
            .into_iter()
            .filter(|declaration| declaration.node == document_element)
            .collect()
    }

    fn declaration(
        &self,
        node: Node,
        prefix_id: PrefixId,
        namespace_id: NamespaceId,
    ) -> NamespaceDeclaration<'_> {
        NamespaceDeclaration {
            prefix: self.prefix_str(prefix_id),
            uri: self.namespace_str(namespace_id),
            node,
        }
    }

    /// Resolve a prefix in the scope of `node`.
    ///
    /// Walks from `node` outward through its ancestors to the nearest
    /// declaration. The empty prefix resolves the default namespace.
    pub fn resolve_prefix(&self, node: Node, prefix: &str) -> Option<&str> {
        let prefix_id = self.prefix_lookup.get_id(prefix)?;
        let namespace_id = self.namespace_by_prefix(node, prefix_id)?;
        if namespace_id == self.no_namespace_id {
            None
        } else {
            Some(self.namespace_str(namespace_id))
        }
    }

    pub(crate) fn namespace_by_prefix(&self, node: Node, prefix_id: PrefixId) -> Option<NamespaceId> {
        if prefix_id == self.xml_prefix_id {
            return Some(self.xml_namespace_id);
        }
        self.ancestors(node)
            .filter_map(|ancestor| self.element(ancestor))
            .find_map(|element| element.get_namespace(prefix_id))
    }

    #[inline]
    pub(crate) fn namespace_str(&self, namespace_id: NamespaceId) -> &str {
        self.namespace_lookup.get_value(namespace_id)
    }

    #[inline]
    pub(crate) fn prefix_str(&self, prefix_id: PrefixId) -> &str {
        self.prefix_lookup.get_value(prefix_id)
    }

    /// The number of nodes in the tree, including the document root.
    pub fn node_count(&self) -> usize {
        self.arena.count()
    }
}
