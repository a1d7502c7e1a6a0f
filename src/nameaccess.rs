use crate::document::{Document, Node};
use crate::name::{Name, NameId};
use crate::prefix::PrefixId;
use crate::xmlvalue::Attribute;

/// Names, namespaces and attributes of nodes as strings.
impl Document {
    pub(crate) fn name_value(&self, name_id: NameId) -> &Name {
        self.name_lookup.get_value(name_id)
    }

    /// The local name of a name id.
    pub fn local_name_str(&self, name_id: NameId) -> &str {
        &self.name_value(name_id).local
    }

    /// The namespace URI of a name id; `None` if not in a namespace.
    pub fn namespace_uri_str(&self, name_id: NameId) -> Option<&str> {
        let namespace_id = self.name_value(name_id).namespace_id;
        if namespace_id == self.no_namespace_id {
            None
        } else {
            Some(self.namespace_str(namespace_id))
        }
    }

    pub(crate) fn qualified_str(&self, prefix_id: PrefixId, name_id: NameId) -> String {
        let local = self.local_name_str(name_id);
        if prefix_id == self.empty_prefix_id {
            local.to_string()
        } else {
            format!("{}:{}", self.prefix_str(prefix_id), local)
        }
    }

    /// The local name of an element, without prefix.
    ///
    /// Returns [`None`] if the node is not an element.
    pub fn tag_name(&self, node: Node) -> Option<&str> {
        self.element(node)
            .map(|element| self.local_name_str(element.name()))
    }

    /// The element name with its prefix as written in the source.
    pub fn qualified_name(&self, node: Node) -> Option<String> {
        self.element(node)
            .map(|element| self.qualified_str(element.prefix(), element.name()))
    }

    /// The namespace URI of an element.
    pub fn namespace_uri(&self, node: Node) -> Option<&str> {
        self.element(node)
            .and_then(|element| self.namespace_uri_str(element.name()))
    }

    /// The prefix of an element as written in the source.
    ///
    /// Returns [`None`] for unprefixed elements and non-elements.
    pub fn prefix(&self, node: Node) -> Option<&str> {
        let element = self.element(node)?;
        if element.prefix() == self.empty_prefix_id {
            None
        } else {
            Some(self.prefix_str(element.prefix()))
        }
    }

    /// Look up an attribute by its name as written in the source.
    ///
    /// Use `"r:id"` for a prefixed attribute and `"id"` for an unprefixed
    /// one. A missing attribute, or a node that isn't an element, gives
    /// [`None`].
    ///
    /// ```rust
    /// let doc = xmlquery::Document::parse_str(
    ///     r#"<a xmlns:r="urn:r" id="1" r:id="rId2"/>"#,
    /// ).unwrap();
    /// let a = doc.document_element();
    /// assert_eq!(doc.attribute(a, "id"), Some("1"));
    /// assert_eq!(doc.attribute(a, "r:id"), Some("rId2"));
    /// assert_eq!(doc.attribute(a, "missing"), None);
    /// ```
    pub fn attribute(&self, node: Node, name: &str) -> Option<&str> {
        let (prefix, local) = match name.split_once(':') {
            Some((prefix, local)) => (prefix, local),
            None => ("", name),
        };
        let prefix_id = self.prefix_lookup.get_id(prefix)?;
        self.element(node)?
            .attributes()
            .iter()
            .find(|attribute| {
                attribute.prefix_id == prefix_id && self.local_name_str(attribute.name_id) == local
            })
            .map(Attribute::value)
    }

    /// Look up an attribute by local name and namespace URI.
    ///
    /// A `None` namespace looks for an attribute without a namespace.
    pub fn attribute_ns(&self, node: Node, local: &str, namespace: Option<&str>) -> Option<&str> {
        self.element(node)?
            .attributes()
            .iter()
            .find(|attribute| {
                self.local_name_str(attribute.name_id) == local
                    && self.namespace_uri_str(attribute.name_id) == namespace
            })
            .map(Attribute::value)
    }

    /// All attributes of an element as (qualified name, value), in source
    /// order.
    pub fn attribute_pairs(&self, node: Node) -> Vec<(String, &str)> {
        match self.element(node) {
            Some(element) => element
                .attributes()
                .iter()
                .map(|attribute| {
                    (
                        self.qualified_str(attribute.prefix_id, attribute.name_id),
                        attribute.value(),
                    )
                })
                .collect(),
            None => Vec::new(),
        }
    }
}
