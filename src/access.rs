use indextree::NodeEdge as IndexTreeNodeEdge;

use crate::document::{Document, Node};
use crate::xmlvalue::{Element, Value, ValueType};

/// Node edges.
///
/// Used by [`Document::traverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEdge {
    /// The start edge of a node. In case of an element
    /// this is the start tag. In case of root
    /// the start of the document.
    Start(Node),
    /// The end edge of a node. In case of an element
    /// this is the end tag. In case of root the end
    /// of the document. For any other values, the
    /// end edge occurs immediately after the start
    /// edge.
    End(Node),
}

/// ## Read-only access
impl Document {
    /// Obtain the document element: the single top-level element.
    ///
    /// ```rust
    /// let doc = xmlquery::Document::parse_str("<!--c--><p>Example</p>").unwrap();
    /// let p = doc.document_element();
    /// assert_eq!(doc.node_ref(p).tag_name(), Some("p"));
    /// ```
    pub fn document_element(&self) -> Node {
        self.children(self.root)
            .find(|child| self.is_element(*child))
            .unwrap_or(self.root)
    }

    /// Access to the XML value for this node.
    #[inline]
    pub fn value(&self, node: Node) -> &Value {
        self.arena[node.get()].get()
    }

    /// Get the [`ValueType`] of a node.
    pub fn value_type(&self, node: Node) -> ValueType {
        self.value(node).value_type()
    }

    /// Return true if node is the document root.
    pub fn is_root(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Root
    }

    /// Return true if node is an element.
    pub fn is_element(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Element
    }

    /// Return true if node is text.
    pub fn is_text(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Text
    }

    /// If this node is an element, return a reference to it.
    pub fn element(&self, node: Node) -> Option<&Element> {
        match self.value(node) {
            Value::Element(element) => Some(element),
            _ => None,
        }
    }

    /// If this node is text, return its string.
    pub fn text_str(&self, node: Node) -> Option<&str> {
        match self.value(node) {
            Value::Text(text) => Some(text.get()),
            _ => None,
        }
    }

    /// Get parent node.
    ///
    /// Returns [`None`] for the document root.
    ///
    /// ```rust
    /// let doc = xmlquery::Document::parse_str("<p>Example</p>").unwrap();
    /// let p = doc.document_element();
    /// let text = doc.first_child(p).unwrap();
    /// assert_eq!(doc.parent(text), Some(p));
    /// assert_eq!(doc.parent(p), Some(doc.root()));
    /// assert_eq!(doc.parent(doc.root()), None);
    /// ```
    pub fn parent(&self, node: Node) -> Option<Node> {
        self.arena[node.get()].parent().map(Node::new)
    }

    /// Get first child.
    pub fn first_child(&self, node: Node) -> Option<Node> {
        self.arena[node.get()].first_child().map(Node::new)
    }

    /// Get last child.
    pub fn last_child(&self, node: Node) -> Option<Node> {
        self.arena[node.get()].last_child().map(Node::new)
    }

    /// Get next sibling.
    pub fn next_sibling(&self, node: Node) -> Option<Node> {
        self.arena[node.get()].next_sibling().map(Node::new)
    }

    /// Get previous sibling.
    pub fn previous_sibling(&self, node: Node) -> Option<Node> {
        self.arena[node.get()].previous_sibling().map(Node::new)
    }

    /// Iterator over the child nodes of this node.
    ///
    /// ```rust
    /// let doc = xmlquery::Document::parse_str("<p><a/><b/></p>").unwrap();
    /// let p = doc.document_element();
    /// let a = doc.first_child(p).unwrap();
    /// let b = doc.next_sibling(a).unwrap();
    /// assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![a, b]);
    /// ```
    pub fn children(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().children(&self.arena).map(Node::new)
    }

    /// Iterator over ancestor nodes, including this one.
    ///
    /// ```rust
    /// let doc = xmlquery::Document::parse_str("<a><b><c/></b></a>").unwrap();
    /// let a = doc.document_element();
    /// let b = doc.first_child(a).unwrap();
    /// let c = doc.first_child(b).unwrap();
    ///
    /// let ancestors = doc.ancestors(c).collect::<Vec<_>>();
    /// assert_eq!(ancestors, vec![c, b, a, doc.root()]);
    /// ```
    pub fn ancestors(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().ancestors(&self.arena).map(Node::new)
    }

    /// Iterator over of the descendants of this node,
    /// including this one. In document order (pre-order depth-first).
    ///
    /// ```rust
    /// let doc = xmlquery::Document::parse_str("<a><b><c/></b></a>").unwrap();
    /// let a = doc.document_element();
    /// let b = doc.first_child(a).unwrap();
    /// let c = doc.first_child(b).unwrap();
    ///
    /// let descendants = doc.descendants(a).collect::<Vec<_>>();
    /// assert_eq!(descendants, vec![a, b, c]);
    /// ```
    pub fn descendants(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().descendants(&self.arena).map(Node::new)
    }

    /// Iterator over the following siblings of this node, including this one.
    pub fn following_siblings(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().following_siblings(&self.arena).map(Node::new)
    }

    /// Iterator over the preceding siblings of this node, including this one.
    ///
    /// Nearest sibling first.
    pub fn preceding_siblings(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().preceding_siblings(&self.arena).map(Node::new)
    }

    /// Traverse over node edges.
    ///
    /// For the tree `<a><b/></a>` this generates a [`NodeEdge::Start`] for
    /// `<a>`, then a [`NodeEdge::Start`] for `<b>`, immediately followed by a
    /// [`NodeEdge::End`] for `<b>`, and finally a [`NodeEdge::End`] for `<a>`.
    pub fn traverse(&self, node: Node) -> impl Iterator<Item = NodeEdge> + '_ {
        node.get().traverse(&self.arena).map(|edge| match edge {
            IndexTreeNodeEdge::Start(node_id) => NodeEdge::Start(Node::new(node_id)),
            IndexTreeNodeEdge::End(node_id) => NodeEdge::End(Node::new(node_id)),
        })
    }

    /// The text of this node and its descendants, concatenated in document
    /// order.
    ///
    /// ```rust
    /// let doc = xmlquery::Document::parse_str("<a>one <b>two</b> three<!--no--></a>").unwrap();
    /// assert_eq!(doc.text_content(doc.document_element()), "one two three");
    /// ```
    pub fn text_content(&self, node: Node) -> String {
        let mut result = String::new();
        for descendant in self.descendants(node) {
            if let Some(text) = self.text_str(descendant) {
                result.push_str(text);
            }
        }
        result
    }

    /// The string value of a node in the XPath sense.
    ///
    /// Text content for the root and elements, the payload for the other
    /// node types.
    pub(crate) fn string_value(&self, node: Node) -> String {
        match self.value(node) {
            Value::Root | Value::Element(_) => self.text_content(node),
            Value::Text(text) => text.get().to_string(),
            Value::Comment(comment) => comment.get().to_string(),
            Value::ProcessingInstruction(pi) => pi.data().unwrap_or_default().to_string(),
        }
    }
}
