use crate::document::{Document, Node};
use crate::error::ParseError;
use crate::events::{Event, Events, RawAttribute, RawNamespace};
use crate::name::Name;
use crate::namespace::NamespaceId;
use crate::prefix::PrefixId;
use crate::scope::ScopeStack;
use crate::xmlvalue::{Attribute, Comment, Element, Prefixes, ProcessingInstruction, Text, Value};

/// Options controlling how bytes become a [`Document`].
///
/// ```rust
/// use xmlquery::{Document, ParseOptions};
///
/// let options = ParseOptions::default().encoding("utf-8").strip_whitespace(true);
/// let doc = Document::parse_with_options(b"<a>\n  <b/>\n</a>", &options)?;
/// assert_eq!(doc.children(doc.document_element()).count(), 1);
/// # Ok::<(), xmlquery::ParseError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub(crate) encoding: Option<String>,
    pub(crate) strip_whitespace: bool,
}

impl ParseOptions {
    /// Declare the encoding of the input bytes by label.
    pub fn encoding<S: Into<String>>(mut self, label: S) -> Self {
        self.encoding = Some(label.into());
        self
    }

    /// Drop text nodes that consist of whitespace only.
    pub fn strip_whitespace(mut self, strip: bool) -> Self {
        self.strip_whitespace = strip;
        self
    }
}

struct OpenElement {
    node: Node,
    qualified_name: String,
}

struct DocumentBuilder {
    document: Document,
    scopes: ScopeStack,
    open: Vec<OpenElement>,
    has_document_element: bool,
    strip_whitespace: bool,
}

fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

impl DocumentBuilder {
    fn new(options: &ParseOptions) -> Self {
        let document = Document::empty();
        let scopes = ScopeStack::new(vec![(document.xml_prefix_id, document.xml_namespace_id)]);
        DocumentBuilder {
            document,
            scopes,
            open: Vec::new(),
            has_document_element: false,
            strip_whitespace: options.strip_whitespace,
        }
    }

    fn current(&self) -> Node {
        self.open
            .last()
            .map(|open| open.node)
            .unwrap_or(self.document.root)
    }

    fn append(&mut self, value: Value) -> Node {
        let node_id = self.document.arena.new_node(value);
        let parent = self.current();
        parent.get().append(node_id, &mut self.document.arena);
        Node::new(node_id)
    }

    fn event(&mut self, event: Event) -> Result<(), ParseError> {
        match event {
            Event::StartElement {
                prefix,
                local,
                attributes,
                namespaces,
                ..
            } => self.start_element(prefix, local, attributes, namespaces),
            Event::EndElement {
                prefix,
                local,
                position,
            } => self.end_element(prefix, local, position),
            Event::Text(text) => self.text(&text),
            Event::Comment(text) => {
                self.append(Value::Comment(Comment::new(text.to_string())));
                Ok(())
            }
            Event::ProcessingInstruction { target, data } => {
                self.append(Value::ProcessingInstruction(ProcessingInstruction::new(
                    target.to_string(),
                    data.map(|s| s.to_string()),
                )));
                Ok(())
            }
        }
    }

    fn start_element(
        &mut self,
        prefix: &str,
        local: &str,
        attributes: Vec<RawAttribute>,
        namespaces: Vec<RawNamespace>,
    ) -> Result<(), ParseError> {
        if self.open.is_empty() {
            if self.has_document_element {
                return Err(ParseError::MultipleElementsAtTopLevel(qualified(prefix, local)));
            }
            self.has_document_element = true;
        }

        let prefixes: Prefixes = namespaces
            .iter()
            .map(|namespace| {
                (
                    self.document
                        .prefix_lookup
                        .get_id_mut(namespace.prefix.to_string()),
                    self.document
                        .namespace_lookup
                        .get_id_mut(namespace.uri.to_string()),
                )
            })
            .collect();
        self.scopes.push(prefixes.clone());

        let (prefix_id, namespace_id) = self.resolve(prefix, true);
        let name_id = self
            .document
            .name_lookup
            .get_id_mut(Name::new(local, namespace_id));
        let mut element = Element::new(name_id, prefix_id);
        element.prefixes = prefixes;

        for attribute in attributes {
            let (prefix_id, namespace_id) = self.resolve(attribute.prefix, false);
            let name_id = self
                .document
                .name_lookup
                .get_id_mut(Name::new(attribute.local, namespace_id));
            let duplicate = element.attributes.iter().any(|existing| {
                existing.name_id == name_id
                    && (existing.prefix_id == prefix_id || namespace_id != self.document.no_namespace_id)
            });
            if duplicate {
                return Err(ParseError::DuplicateAttribute(qualified(
                    attribute.prefix,
                    attribute.local,
                )));
            }
            element.attributes.push(Attribute {
                name_id,
                prefix_id,
                value: attribute.value.into_owned(),
            });
        }

        let declarations = element.prefixes.clone();
        let node = self.append(Value::Element(element));
        for (prefix_id, namespace_id) in declarations {
            self.document.declarations.push((node, prefix_id, namespace_id));
        }
        self.open.push(OpenElement {
            node,
            qualified_name: qualified(prefix, local),
        });
        Ok(())
    }

    // Unprefixed element names take the default namespace, unprefixed
    // attributes never do. Undeclared prefixes are kept without a namespace.
    fn resolve(&mut self, prefix: &str, is_element: bool) -> (PrefixId, NamespaceId) {
        let prefix_id = self.document.prefix_lookup.get_id_mut(prefix.to_string());
        if prefix.is_empty() && !is_element {
            return (prefix_id, self.document.no_namespace_id);
        }
        match self.scopes.resolve(prefix_id) {
            Some(namespace_id) => (prefix_id, namespace_id),
            None => {
                if !prefix.is_empty() {
                    tracing::debug!(prefix, "undeclared namespace prefix");
                }
                (prefix_id, self.document.no_namespace_id)
            }
        }
    }

    fn end_element(&mut self, prefix: &str, local: &str, position: usize) -> Result<(), ParseError> {
        let found = qualified(prefix, local);
        let open = self.open.pop().ok_or_else(|| ParseError::InvalidCloseTag {
            expected: String::new(),
            found: found.clone(),
            position,
        })?;
        if open.qualified_name != found {
            return Err(ParseError::InvalidCloseTag {
                expected: open.qualified_name,
                found,
                position,
            });
        }
        self.scopes.pop();
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), ParseError> {
        let is_whitespace = text.chars().all(char::is_whitespace);
        if self.open.is_empty() {
            if is_whitespace {
                return Ok(());
            }
            return Err(ParseError::TextAtTopLevel);
        }
        if is_whitespace && self.strip_whitespace {
            return Ok(());
        }
        let current = self.current();
        // adjacent text (say text followed by CDATA) becomes one node
        if let Some(last) = self.document.arena[current.get()].last_child() {
            if let Value::Text(existing) = self.document.arena[last].get_mut() {
                existing.text.push_str(text);
                return Ok(());
            }
        }
        self.append(Value::Text(Text::new(text.to_string())));
        Ok(())
    }

    fn finish(self) -> Result<Document, ParseError> {
        if let Some(open) = self.open.last() {
            return Err(ParseError::UnclosedTag(open.qualified_name.clone()));
        }
        if !self.has_document_element {
            return Err(ParseError::NoElementAtTopLevel);
        }
        tracing::debug!(
            nodes = self.document.node_count(),
            namespaces = self.document.declarations.len(),
            "parsed document"
        );
        Ok(self.document)
    }
}

pub(crate) fn build(xml: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    let mut builder = DocumentBuilder::new(options);
    for event in Events::new(xml) {
        builder.event(event?)?;
    }
    builder.finish()
}
