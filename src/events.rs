//! Structural events over decoded XML text.
//!
//! This is a thin layer over the [`xmlparser`] tokenizer: attribute tokens are
//! gathered onto their start tag, namespace declarations are split from
//! regular attributes, entities are expanded and empty element tags produce a
//! matching end event.
use std::borrow::Cow;

use xmlparser::{ElementEnd, TextPos, Token, Tokenizer};

use crate::entity::{normalize_attribute, parse_entities};
use crate::error::ParseError;

/// An attribute of a start tag, before namespace resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute<'a> {
    /// Prefix as written; empty if none.
    pub prefix: &'a str,
    /// Local name.
    pub local: &'a str,
    /// Normalized value with entities expanded.
    pub value: Cow<'a, str>,
    /// Byte offset of the attribute name.
    pub position: usize,
}

/// A namespace declaration (`xmlns="..."` or `xmlns:p="..."`) of a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNamespace<'a> {
    /// Declared prefix; empty for the default namespace.
    pub prefix: &'a str,
    /// The namespace URI; empty undeclares the default namespace.
    pub uri: Cow<'a, str>,
}

/// A structural event, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    /// A start tag, or the start half of an empty element tag.
    StartElement {
        prefix: &'a str,
        local: &'a str,
        attributes: Vec<RawAttribute<'a>>,
        namespaces: Vec<RawNamespace<'a>>,
        position: usize,
    },
    /// An end tag, or the end half of an empty element tag.
    EndElement {
        prefix: &'a str,
        local: &'a str,
        position: usize,
    },
    /// Character data; CDATA sections are reported as text too.
    Text(Cow<'a, str>),
    /// A comment, without the delimiters.
    Comment(&'a str),
    /// A processing instruction.
    ProcessingInstruction {
        target: &'a str,
        data: Option<&'a str>,
    },
}

struct StartTag<'a> {
    prefix: &'a str,
    local: &'a str,
    attributes: Vec<RawAttribute<'a>>,
    namespaces: Vec<RawNamespace<'a>>,
    position: usize,
}

impl<'a> StartTag<'a> {
    fn into_event(self) -> Event<'a> {
        Event::StartElement {
            prefix: self.prefix,
            local: self.local,
            attributes: self.attributes,
            namespaces: self.namespaces,
            position: self.position,
        }
    }
}

/// Iterator of [`Event`]s over XML text.
///
/// Iteration stops after the first error.
///
/// ```rust
/// use xmlquery::{Event, Events};
///
/// let events = Events::new("<a>hi</a>").collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(events.len(), 3);
/// assert!(matches!(events[1], Event::Text(ref t) if t == "hi"));
/// # Ok::<(), xmlquery::ParseError>(())
/// ```
pub struct Events<'a> {
    text: &'a str,
    tokenizer: Tokenizer<'a>,
    start: Option<StartTag<'a>>,
    pending: Option<Event<'a>>,
    failed: bool,
}

impl<'a> Events<'a> {
    /// Create an event iterator over already decoded text.
    pub fn new(text: &'a str) -> Self {
        Events {
            text,
            tokenizer: Tokenizer::from(text),
            start: None,
            pending: None,
            failed: false,
        }
    }

    fn handle(&mut self, token: Token<'a>) -> Result<Option<Event<'a>>, ParseError> {
        match token {
            Token::Declaration { .. }
            | Token::DtdStart { .. }
            | Token::EmptyDtd { .. }
            | Token::EntityDeclaration { .. }
            | Token::DtdEnd { .. } => Ok(None),
            Token::ProcessingInstruction {
                target, content, ..
            } => Ok(Some(Event::ProcessingInstruction {
                target: target.as_str(),
                data: content.map(|c| c.as_str()).filter(|c| !c.is_empty()),
            })),
            Token::Comment { text, .. } => Ok(Some(Event::Comment(text.as_str()))),
            Token::ElementStart { prefix, local, .. } => {
                self.start = Some(StartTag {
                    prefix: prefix.as_str(),
                    local: local.as_str(),
                    attributes: Vec::new(),
                    namespaces: Vec::new(),
                    position: local.start(),
                });
                Ok(None)
            }
            Token::Attribute {
                prefix,
                local,
                value,
                span,
            } => {
                let value = attribute_value(value.as_str())?;
                if let Some(start) = self.start.as_mut() {
                    match (prefix.as_str(), local.as_str()) {
                        ("", "xmlns") => start.namespaces.push(RawNamespace { prefix: "", uri: value }),
                        ("xmlns", declared) => start.namespaces.push(RawNamespace {
                            prefix: declared,
                            uri: value,
                        }),
                        (prefix, local) => start.attributes.push(RawAttribute {
                            prefix,
                            local,
                            value,
                            position: span.start(),
                        }),
                    }
                }
                Ok(None)
            }
            Token::ElementEnd { end, span } => {
                match end {
                    ElementEnd::Open => Ok(self.start.take().map(StartTag::into_event)),
                    ElementEnd::Empty => {
                        let start = self.start.take();
                        if let Some(start) = &start {
                            self.pending = Some(Event::EndElement {
                                prefix: start.prefix,
                                local: start.local,
                                position: span.start(),
                            });
                        }
                        Ok(start.map(StartTag::into_event))
                    }
                    ElementEnd::Close(prefix, local) => Ok(Some(Event::EndElement {
                        prefix: prefix.as_str(),
                        local: local.as_str(),
                        position: if prefix.as_str().is_empty() {
                            local.start()
                        } else {
                            prefix.start()
                        },
                    })),
                }
            }
            Token::Text { text } => Ok(Some(Event::Text(parse_entities(text.as_str())?))),
            Token::Cdata { text, .. } => Ok(Some(Event::Text(Cow::Borrowed(text.as_str())))),
        }
    }
}

fn attribute_value(raw: &str) -> Result<Cow<str>, ParseError> {
    match normalize_attribute(raw) {
        Cow::Borrowed(value) => parse_entities(value),
        Cow::Owned(value) => Ok(Cow::Owned(parse_entities(&value)?.into_owned())),
    }
}

// Tokenizer positions are 1-based rows and columns counted in characters.
fn byte_offset(text: &str, pos: TextPos) -> usize {
    let line_start = text
        .split_inclusive('\n')
        .take(pos.row.saturating_sub(1) as usize)
        .map(str::len)
        .sum::<usize>();
    let line = &text[line_start..];
    let column = line
        .char_indices()
        .nth(pos.col.saturating_sub(1) as usize)
        .map_or(line.len(), |(index, _)| index);
    line_start + column
}

impl<'a> Iterator for Events<'a> {
    type Item = Result<Event<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.take() {
            return Some(Ok(event));
        }
        if self.failed {
            return None;
        }
        loop {
            let token = match self.tokenizer.next()? {
                Ok(token) => token,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(ParseError::Syntax {
                        message: e.to_string(),
                        position: byte_offset(self.text, e.pos()),
                    }));
                }
            };
            match self.handle(token) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(xml: &str) -> Vec<Event<'_>> {
        Events::new(xml).collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_empty_element_has_end_event() {
        let events = events("<a/>");
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::StartElement { local: "a", .. }));
        assert!(matches!(events[1], Event::EndElement { local: "a", .. }));
    }

    #[test]
    fn test_namespaces_split_from_attributes() {
        let events = events(r#"<p:a xmlns="urn:d" xmlns:p="urn:p" p:x="1" y="2"/>"#);
        let Event::StartElement {
            prefix,
            local,
            attributes,
            namespaces,
            ..
        } = &events[0]
        else {
            unreachable!()
        };
        assert_eq!((*prefix, *local), ("p", "a"));
        assert_eq!(
            namespaces,
            &vec![
                RawNamespace {
                    prefix: "",
                    uri: "urn:d".into()
                },
                RawNamespace {
                    prefix: "p",
                    uri: "urn:p".into()
                },
            ]
        );
        let names = attributes
            .iter()
            .map(|a| (a.prefix, a.local, a.value.as_ref()))
            .collect::<Vec<_>>();
        assert_eq!(names, vec![("p", "x", "1"), ("", "y", "2")]);
    }

    #[test]
    fn test_text_entities_and_cdata() {
        let events = events("<a>x &amp; y<![CDATA[<b>]]></a>");
        assert_eq!(events[1], Event::Text("x & y".into()));
        assert_eq!(events[2], Event::Text("<b>".into()));
    }

    #[test]
    fn test_comment_and_pi() {
        let events = events("<?go fast?><!--note--><a/>");
        assert_eq!(
            events[0],
            Event::ProcessingInstruction {
                target: "go",
                data: Some("fast")
            }
        );
        assert_eq!(events[1], Event::Comment("note"));
    }

    #[test]
    fn test_attribute_entities() {
        let events = events(r#"<a v="1&lt;2&#10;"/>"#);
        let Event::StartElement { attributes, .. } = &events[0] else {
            unreachable!()
        };
        assert_eq!(attributes[0].value, "1<2\n");
    }

    #[test]
    fn test_invalid_entity_stops_iteration() {
        let mut iter = Events::new("<a>&nope;</a>");
        assert!(matches!(iter.next(), Some(Ok(Event::StartElement { .. }))));
        assert_eq!(
            iter.next(),
            Some(Err(ParseError::InvalidEntity("nope".to_string())))
        );
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_tokenizer_error() {
        let result = Events::new("<a><").collect::<Result<Vec<_>, _>>();
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_byte_offset() {
        let text = "<a>\n  <é b>\n</a>";
        assert_eq!(byte_offset(text, TextPos::new(1, 1)), 0);
        assert_eq!(byte_offset(text, TextPos::new(2, 3)), 6);
        // `é` is two bytes
        assert_eq!(byte_offset(text, TextPos::new(2, 5)), 9);
        assert_eq!(byte_offset(text, TextPos::new(3, 1)), 13);
        assert_eq!(byte_offset(text, TextPos::new(9, 9)), text.len());
    }

    #[test]
    fn test_tokenizer_error_position_is_on_faulty_line() {
        let text = "<a>\n  <b/>\n  <c d></c>\n</a>";
        let Some(Err(ParseError::Syntax { position, .. })) =
            Events::new(text).find(|event| event.is_err())
        else {
            unreachable!()
        };
        assert_eq!(text[..position].matches('\n').count(), 2);
    }
}
