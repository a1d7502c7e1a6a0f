use crate::name::NameId;
use crate::namespace::NamespaceId;
use crate::prefix::PrefixId;

/// The type of the XML node.
///
/// The `ValueType` can be used if you are interested in
/// the type of the value without needing to match on it.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ValueType {
    /// Document root that holds everything.
    /// Note that this not the same as the document
    /// element.
    Root,
    /// Element; it has a name, attributes and namespace information.
    Element,
    /// Text.
    Text,
    /// Processing instruction
    ProcessingInstruction,
    /// Comment.
    Comment,
}

/// An XML value.
///
/// Access it using [`Document::value`](crate::Document::value).
#[derive(Debug, Clone)]
pub enum Value {
    /// Document root that holds everything. Note that this not the same as the document
    /// element.
    Root,
    /// Element; it has a name, attributes and namespace information.
    Element(Element),
    /// Text, with CDATA sections merged in.
    Text(Text),
    /// Processing instruction.
    ProcessingInstruction(ProcessingInstruction),
    /// Comment.
    Comment(Comment),
}

impl Value {
    /// Returns the type of the XML value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Root => ValueType::Root,
            Value::Element(_) => ValueType::Element,
            Value::Text(_) => ValueType::Text,
            Value::Comment(_) => ValueType::Comment,
            Value::ProcessingInstruction(_) => ValueType::ProcessingInstruction,
        }
    }
}

/// A namespace declaration made on an element: prefix to namespace.
///
/// The empty prefix is the default namespace declaration. A default
/// declaration to the empty namespace (`xmlns=""`) undeclares it.
pub type Prefixes = Vec<(PrefixId, NamespaceId)>;

/// An attribute as it appears on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub(crate) name_id: NameId,
    pub(crate) prefix_id: PrefixId,
    pub(crate) value: String,
}

impl Attribute {
    /// The name of the attribute, including its resolved namespace.
    pub fn name(&self) -> NameId {
        self.name_id
    }

    /// The prefix as written in the source. Empty if unprefixed.
    pub fn prefix(&self) -> PrefixId {
        self.prefix_id
    }

    /// The attribute value, with entities expanded.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// XML element value.
///
/// Example: `<foo/>` or `<foo bar="baz"/>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub(crate) name_id: NameId,
    pub(crate) prefix_id: PrefixId,
    pub(crate) prefixes: Prefixes,
    pub(crate) attributes: Vec<Attribute>,
}

impl Element {
    pub(crate) fn new(name_id: NameId, prefix_id: PrefixId) -> Self {
        Element {
            name_id,
            prefix_id,
            prefixes: Prefixes::new(),
            attributes: Vec::new(),
        }
    }

    /// The name of the element, resolved against the namespace scope it
    /// was parsed in.
    pub fn name(&self) -> NameId {
        self.name_id
    }

    /// The prefix as written in the source. Empty if unprefixed.
    pub fn prefix(&self) -> PrefixId {
        self.prefix_id
    }

    /// The attributes of the element in source order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Get an attribute by name.
    pub fn get_attribute(&self, name_id: NameId) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name_id == name_id)
            .map(|attribute| attribute.value.as_str())
    }

    /// Get the namespace for a prefix, if declared on this element.
    ///
    /// This does not check for ancestor namespace declarations.
    pub fn get_namespace(&self, prefix_id: PrefixId) -> Option<NamespaceId> {
        self.prefixes
            .iter()
            .find(|(declared, _)| *declared == prefix_id)
            .map(|(_, namespace_id)| *namespace_id)
    }

    /// The namespace declarations made on this element, in source order.
    pub fn prefixes(&self) -> &Prefixes {
        &self.prefixes
    }
}

/// XML text value.
///
/// Example: `Bar` in `<foo>Bar</foo>`, or `hello` and `world` in `<greeting>hello<sep/>world</greeting>`.
#[derive(Debug, Clone)]
pub struct Text {
    pub(crate) text: String,
}

impl Text {
    pub(crate) fn new(text: String) -> Self {
        Text { text }
    }

    /// Get the text value.
    pub fn get(&self) -> &str {
        &self.text
    }
}

/// XML comment.
///
/// Example: `<!-- foo -->`.
#[derive(Debug, Clone)]
pub struct Comment {
    pub(crate) text: String,
}

impl Comment {
    pub(crate) fn new(text: String) -> Self {
        Comment { text }
    }

    /// Get the comment text.
    pub fn get(&self) -> &str {
        &self.text
    }
}

/// XML processing instruction value.
///
/// Example: `<?foo?>` or `<?foo bar?>`.
#[derive(Debug, Clone)]
pub struct ProcessingInstruction {
    pub(crate) target: String,
    pub(crate) data: Option<String>,
}

impl ProcessingInstruction {
    pub(crate) fn new(target: String, data: Option<String>) -> Self {
        ProcessingInstruction { target, data }
    }

    /// Get processing instruction target.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Get processing instruction data.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}
