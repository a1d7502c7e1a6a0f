//! Evaluation of compiled paths against a [`Document`].
//!
//! Paths are not evaluated step by step. Instead every node that could be
//! in the result is visited once, in document order, and kept if it can be
//! reached from the origin along the path. That check runs the steps
//! backwards: a node matches step `k` if it passes the node test and one of
//! the nodes it could have been reached from matches step `k - 1`. Results
//! therefore come out lazily, in document order and without duplicates.
//! Matches are memoised per step and node for the length of one selection.
use std::cmp::Ordering;
use std::sync::Arc;

use ahash::{HashMap, HashSet};
use genawaiter::rc::gen;
use genawaiter::yield_;

use crate::document::{Document, Node};
use crate::error::XPathError;
use crate::name::NameId;
use crate::namespace::{NamespaceId, XML_NAMESPACE};
use crate::prefix::PrefixId;
use crate::xmlvalue::{Attribute, Value};

use super::ast::{Axis, BinaryOp, Expr, Function, LocationPath, NodeTest, Step};

/// Something a path can select: a node, or an attribute of an element by
/// index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Item {
    Node(Node),
    Attribute(Node, usize),
}

impl Item {
    fn order_key(&self) -> (Node, usize) {
        match self {
            Item::Node(node) => (*node, 0),
            Item::Attribute(node, index) => (*node, index + 1),
        }
    }
}

// attributes come after their element and before its children
impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
enum XValue {
    Items(Vec<Item>),
    String(String),
    Number(f64),
    Boolean(bool),
}

type Bindings = HashMap<String, Option<NamespaceId>>;

// Per-selection memo. Step indexes are positions in the selected path, so
// a memo is never shared between paths or origins.
#[derive(Default)]
struct Scratch {
    matched: HashMap<(usize, Node), bool>,
    positional: HashMap<(usize, Node), HashSet<Item>>,
}

// A prefix not passed by the caller may still be declared on the document
// element; its default namespace is available as `xmlns`.
fn document_binding<'d>(document: &'d Document, prefix: &str) -> Option<&'d str> {
    if prefix == "xml" {
        return Some(XML_NAMESPACE);
    }
    let declared = if prefix == "xmlns" { "" } else { prefix };
    document
        .root_namespaces()
        .into_iter()
        .find(|declaration| declaration.prefix() == declared && !declaration.uri().is_empty())
        .map(|declaration| declaration.uri())
}

fn bind(
    document: &Document,
    prefixes: &[String],
    namespaces: &[(&str, &str)],
) -> Result<Bindings, XPathError> {
    let mut bindings = Bindings::default();
    for prefix in prefixes {
        let uri = match namespaces.iter().find(|(declared, _)| declared == prefix) {
            Some((_, uri)) => *uri,
            None => document_binding(document, prefix)
                .ok_or_else(|| XPathError::UnknownPrefix(prefix.clone()))?,
        };
        // a URI the document never mentions can't match anything
        let namespace_id = document.namespace_lookup.get_id(uri);
        tracing::trace!(prefix = prefix.as_str(), uri, "bound namespace prefix");
        bindings.insert(prefix.clone(), namespace_id);
    }
    Ok(bindings)
}

pub(crate) struct Evaluator<'a> {
    document: &'a Document,
    bindings: Bindings,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        document: &'a Document,
        prefixes: &[String],
        namespaces: &[(&str, &str)],
    ) -> Result<Self, XPathError> {
        Ok(Evaluator {
            document,
            bindings: bind(document, prefixes, namespaces)?,
        })
    }

    /// Lazily select the items of `path` evaluated from `context`.
    pub(crate) fn select_owned(
        self,
        path: Arc<LocationPath>,
        context: Node,
    ) -> impl Iterator<Item = Item> + 'a {
        let evaluator = self;
        gen!({
            let origin = if path.absolute {
                evaluator.document.root()
            } else {
                context
            };
            for item in evaluator.select(&path, origin) {
                yield_!(item);
            }
        })
        .into_iter()
    }

    fn select<'e>(
        &'e self,
        path: &'e LocationPath,
        origin: Node,
    ) -> Box<dyn Iterator<Item = Item> + 'e> {
        let evaluator = self;
        let items = gen!({
            let mut scratch = Scratch::default();
            match path.steps.split_last() {
                None => {
                    yield_!(Item::Node(origin));
                }
                Some((last, rest)) if last.axis == Axis::Attribute => {
                    for node in evaluator.candidates(path, origin) {
                        if evaluator.document.is_element(node)
                            && evaluator.in_result(rest, origin, node, &mut scratch)
                        {
                            let index = rest.len();
                            for item in evaluator.forward_axis(last, node) {
                                if evaluator.predicates_hold(last, index, node, item, &mut scratch) {
                                    yield_!(item);
                                }
                            }
                        }
                    }
                }
                Some(_) => {
                    for node in evaluator.candidates(path, origin) {
                        if evaluator.in_result(&path.steps, origin, node, &mut scratch) {
                            yield_!(Item::Node(node));
                        }
                    }
                }
            }
        });
        Box::new(items.into_iter())
    }

    // Nodes that may be in the result. A path that only goes down can't
    // leave the subtree of its origin.
    fn candidates(&self, path: &LocationPath, origin: Node) -> impl Iterator<Item = Node> + 'a {
        let start = if path.is_downward() {
            origin
        } else {
            self.document.root()
        };
        self.document.descendants(start)
    }

    // Can `node` be reached from `origin` by following `steps`? `steps` is
    // always a prefix of the selected path.
    fn in_result(&self, steps: &[Step], origin: Node, node: Node, scratch: &mut Scratch) -> bool {
        let Some((step, rest)) = steps.split_last() else {
            return node == origin;
        };
        let key = (rest.len(), node);
        if let Some(matched) = scratch.matched.get(&key) {
            return *matched;
        }
        let matched = self.test_node(&step.test, node)
            && self.reverse_axis(step.axis, node).any(|context| {
                self.in_result(rest, origin, context, scratch)
                    && self.predicates_hold(step, rest.len(), context, Item::Node(node), scratch)
            });
        scratch.matched.insert(key, matched);
        matched
    }

    // The nodes from which `axis` reaches `node`.
    fn reverse_axis(&self, axis: Axis, node: Node) -> Box<dyn Iterator<Item = Node> + 'a> {
        let document = self.document;
        match axis {
            Axis::Child => Box::new(document.parent(node).into_iter()),
            Axis::Descendant => Box::new(document.ancestors(node).skip(1)),
            Axis::DescendantOrSelf => Box::new(document.ancestors(node)),
            Axis::SelfAxis => Box::new(std::iter::once(node)),
            Axis::Parent => Box::new(document.children(node)),
            Axis::Ancestor => Box::new(document.descendants(node).skip(1)),
            Axis::AncestorOrSelf => Box::new(document.descendants(node)),
            Axis::FollowingSibling => Box::new(document.preceding_siblings(node).skip(1)),
            Axis::PrecedingSibling => Box::new(document.following_siblings(node).skip(1)),
            Axis::Attribute => Box::new(std::iter::empty()),
        }
    }

    // The items `step` selects from `context`, in axis order: reverse axes
    // list the nearest node first.
    fn forward_axis(&self, step: &Step, context: Node) -> Vec<Item> {
        let document = self.document;
        let nodes: Box<dyn Iterator<Item = Node> + 'a> = match step.axis {
            Axis::Attribute => {
                return match document.element(context) {
                    Some(element) => element
                        .attributes()
                        .iter()
                        .enumerate()
                        .filter(|(_, attribute)| self.test_attribute(&step.test, attribute))
                        .map(|(index, _)| Item::Attribute(context, index))
                        .collect(),
                    None => Vec::new(),
                };
            }
            Axis::Child => Box::new(document.children(context)),
            Axis::Descendant => Box::new(document.descendants(context).skip(1)),
            Axis::DescendantOrSelf => Box::new(document.descendants(context)),
            Axis::SelfAxis => Box::new(std::iter::once(context)),
            Axis::Parent => Box::new(document.parent(context).into_iter()),
            Axis::Ancestor => Box::new(document.ancestors(context).skip(1)),
            Axis::AncestorOrSelf => Box::new(document.ancestors(context)),
            Axis::FollowingSibling => Box::new(document.following_siblings(context).skip(1)),
            Axis::PrecedingSibling => Box::new(document.preceding_siblings(context).skip(1)),
        };
        nodes
            .filter(|node| self.test_node(&step.test, *node))
            .map(Item::Node)
            .collect()
    }

    fn bound(&self, prefix: &str) -> Option<NamespaceId> {
        self.bindings.get(prefix).copied().flatten()
    }

    fn name_matches(&self, test: &NodeTest, name_id: NameId, prefix_id: PrefixId) -> bool {
        let name = self.document.name_value(name_id);
        match test {
            NodeTest::Wildcard => true,
            NodeTest::NamespaceWildcard(prefix) => self.bound(prefix) == Some(name.namespace_id),
            NodeTest::Name(qname) => {
                name.local == qname.local
                    && match &qname.prefix {
                        // unprefixed tests never match a namespaced name
                        None => {
                            name.namespace_id == self.document.no_namespace_id
                                && prefix_id == self.document.empty_prefix_id
                        }
                        Some(prefix) => self.bound(prefix) == Some(name.namespace_id),
                    }
            }
            _ => false,
        }
    }

    fn test_node(&self, test: &NodeTest, node: Node) -> bool {
        match (test, self.document.value(node)) {
            (NodeTest::Node, _) => true,
            (NodeTest::Text, Value::Text(_)) => true,
            (NodeTest::Comment, Value::Comment(_)) => true,
            (NodeTest::ProcessingInstruction(target), Value::ProcessingInstruction(pi)) => {
                target.as_deref().map_or(true, |target| target == pi.target())
            }
            (
                NodeTest::Name(_) | NodeTest::Wildcard | NodeTest::NamespaceWildcard(_),
                Value::Element(element),
            ) => self.name_matches(test, element.name(), element.prefix()),
            _ => false,
        }
    }

    fn test_attribute(&self, test: &NodeTest, attribute: &Attribute) -> bool {
        match test {
            NodeTest::Node => true,
            NodeTest::Name(_) | NodeTest::Wildcard | NodeTest::NamespaceWildcard(_) => {
                self.name_matches(test, attribute.name(), attribute.prefix())
            }
            _ => false,
        }
    }

    // Does `item`, reached from `context`, survive the predicates of the
    // step at `index`?
    fn predicates_hold(
        &self,
        step: &Step,
        index: usize,
        context: Node,
        item: Item,
        scratch: &mut Scratch,
    ) -> bool {
        if step.predicates.is_empty() {
            return true;
        }
        if !step.positional {
            return step
                .predicates
                .iter()
                .all(|predicate| self.predicate_true(predicate, item, 1, 1));
        }
        scratch
            .positional
            .entry((index, context))
            .or_insert_with(|| self.positional_selection(step, context))
            .contains(&item)
    }

    // Everything `step` selects from `context` once positions are applied.
    fn positional_selection(&self, step: &Step, context: Node) -> HashSet<Item> {
        let mut selected = self.forward_axis(step, context);
        for predicate in &step.predicates {
            let size = selected.len();
            selected = selected
                .into_iter()
                .enumerate()
                .filter(|(index, candidate)| {
                    self.predicate_true(predicate, *candidate, index + 1, size)
                })
                .map(|(_, candidate)| candidate)
                .collect();
        }
        selected.into_iter().collect()
    }

    fn predicate_true(&self, predicate: &Expr, item: Item, position: usize, size: usize) -> bool {
        match self.eval(predicate, item, position, size) {
            XValue::Number(number) => number == position as f64,
            value => self.boolean(&value),
        }
    }

    fn eval(&self, expr: &Expr, item: Item, position: usize, size: usize) -> XValue {
        match expr {
            Expr::Literal(literal) => XValue::String(literal.clone()),
            Expr::Number(number) => XValue::Number(*number),
            Expr::Path(path) => XValue::Items(self.select_from(path, item)),
            Expr::Binary(BinaryOp::Or, left, right) => XValue::Boolean(
                self.boolean(&self.eval(left, item, position, size))
                    || self.boolean(&self.eval(right, item, position, size)),
            ),
            Expr::Binary(BinaryOp::And, left, right) => XValue::Boolean(
                self.boolean(&self.eval(left, item, position, size))
                    && self.boolean(&self.eval(right, item, position, size)),
            ),
            Expr::Binary(op, left, right) => {
                let left = self.eval(left, item, position, size);
                let right = self.eval(right, item, position, size);
                XValue::Boolean(self.compare(*op, &left, &right))
            }
            Expr::Call(function, arguments) => {
                self.call(*function, arguments, item, position, size)
            }
        }
    }

    fn select_from(&self, path: &LocationPath, item: Item) -> Vec<Item> {
        if path.absolute {
            return self.select(path, self.document.root()).collect();
        }
        match item {
            Item::Node(node) => self.select(path, node).collect(),
            Item::Attribute(owner, _) => self.select_from_attribute(path, owner, item),
        }
    }

    // An attribute has no children; from it only `self::node()` and
    // `parent::` steps lead anywhere.
    fn select_from_attribute(&self, path: &LocationPath, owner: Node, item: Item) -> Vec<Item> {
        let Some((first, rest)) = path.steps.split_first() else {
            return vec![item];
        };
        let selected = match first.axis {
            Axis::SelfAxis if first.test == NodeTest::Node => item,
            Axis::Parent if self.test_node(&first.test, owner) => Item::Node(owner),
            _ => return Vec::new(),
        };
        // either axis selects a single item
        if !first
            .predicates
            .iter()
            .all(|predicate| self.predicate_true(predicate, selected, 1, 1))
        {
            return Vec::new();
        }
        if rest.is_empty() {
            return vec![selected];
        }
        let rest = LocationPath {
            absolute: false,
            steps: rest.to_vec(),
        };
        match selected {
            Item::Node(node) => self.select(&rest, node).collect(),
            Item::Attribute(..) => self.select_from_attribute(&rest, owner, selected),
        }
    }

    fn call(
        &self,
        function: Function,
        arguments: &[Expr],
        item: Item,
        position: usize,
        size: usize,
    ) -> XValue {
        let argument = |index: usize| match arguments.get(index) {
            Some(argument) => self.eval(argument, item, position, size),
            None => XValue::Items(vec![item]),
        };
        match function {
            Function::Position => XValue::Number(position as f64),
            Function::Last => XValue::Number(size as f64),
            Function::Count => match argument(0) {
                XValue::Items(items) => XValue::Number(items.len() as f64),
                _ => XValue::Number(f64::NAN),
            },
            Function::Not => XValue::Boolean(!self.boolean(&argument(0))),
            Function::True => XValue::Boolean(true),
            Function::False => XValue::Boolean(false),
            Function::Contains => {
                let haystack = self.string(&argument(0));
                XValue::Boolean(haystack.contains(&self.string(&argument(1))))
            }
            Function::StartsWith => {
                let haystack = self.string(&argument(0));
                XValue::Boolean(haystack.starts_with(&self.string(&argument(1))))
            }
            Function::String => XValue::String(self.string(&argument(0))),
            Function::NormalizeSpace => XValue::String(
                self.string(&argument(0))
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Function::LocalName => XValue::String(self.first_name(&argument(0), false)),
            Function::Name => XValue::String(self.first_name(&argument(0), true)),
        }
    }

    fn first_name(&self, value: &XValue, qualified: bool) -> String {
        match value {
            XValue::Items(items) => items
                .first()
                .map(|item| item_name(self.document, *item, qualified))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn boolean(&self, value: &XValue) -> bool {
        match value {
            XValue::Items(items) => !items.is_empty(),
            XValue::String(string) => !string.is_empty(),
            XValue::Number(number) => *number != 0.0 && !number.is_nan(),
            XValue::Boolean(boolean) => *boolean,
        }
    }

    fn string(&self, value: &XValue) -> String {
        match value {
            XValue::Items(items) => items
                .first()
                .map(|item| item_string(self.document, *item))
                .unwrap_or_default(),
            XValue::String(string) => string.clone(),
            XValue::Number(number) => format_number(*number),
            XValue::Boolean(boolean) => boolean.to_string(),
        }
    }

    fn number(&self, value: &XValue) -> f64 {
        match value {
            XValue::Number(number) => *number,
            XValue::Boolean(boolean) => {
                if *boolean {
                    1.0
                } else {
                    0.0
                }
            }
            _ => parse_number(&self.string(value)),
        }
    }

    fn compare(&self, op: BinaryOp, left: &XValue, right: &XValue) -> bool {
        match (left, right) {
            (XValue::Items(left), XValue::Items(right)) => {
                let right = right
                    .iter()
                    .map(|item| XValue::String(item_string(self.document, *item)))
                    .collect::<Vec<_>>();
                left.iter().any(|item| {
                    let left = XValue::String(item_string(self.document, *item));
                    right.iter().any(|right| self.compare_atomic(op, &left, right))
                })
            }
            (XValue::Items(items), XValue::Boolean(_)) => {
                self.compare_atomic(op, &XValue::Boolean(!items.is_empty()), right)
            }
            (XValue::Boolean(_), XValue::Items(items)) => {
                self.compare_atomic(op, left, &XValue::Boolean(!items.is_empty()))
            }
            (XValue::Items(items), _) => items.iter().any(|item| {
                self.compare_atomic(op, &XValue::String(item_string(self.document, *item)), right)
            }),
            (_, XValue::Items(items)) => items.iter().any(|item| {
                self.compare_atomic(op, left, &XValue::String(item_string(self.document, *item)))
            }),
            _ => self.compare_atomic(op, left, right),
        }
    }

    fn compare_atomic(&self, op: BinaryOp, left: &XValue, right: &XValue) -> bool {
        match op {
            BinaryOp::Equal | BinaryOp::NotEqual => {
                let equal = if matches!(left, XValue::Boolean(_))
                    || matches!(right, XValue::Boolean(_))
                {
                    self.boolean(left) == self.boolean(right)
                } else if matches!(left, XValue::Number(_)) || matches!(right, XValue::Number(_)) {
                    self.number(left) == self.number(right)
                } else {
                    self.string(left) == self.string(right)
                };
                equal == (op == BinaryOp::Equal)
            }
            BinaryOp::Less => self.number(left) < self.number(right),
            BinaryOp::LessEqual => self.number(left) <= self.number(right),
            BinaryOp::Greater => self.number(left) > self.number(right),
            BinaryOp::GreaterEqual => self.number(left) >= self.number(right),
            BinaryOp::Or => self.boolean(left) || self.boolean(right),
            BinaryOp::And => self.boolean(left) && self.boolean(right),
        }
    }
}

/// The string value of an item.
pub(crate) fn item_string(document: &Document, item: Item) -> String {
    match item {
        Item::Node(node) => document.string_value(node),
        Item::Attribute(node, index) => document
            .element(node)
            .and_then(|element| element.attributes().get(index))
            .map(|attribute| attribute.value().to_string())
            .unwrap_or_default(),
    }
}

fn item_name(document: &Document, item: Item, qualified: bool) -> String {
    let (name_id, prefix_id) = match item {
        Item::Node(node) => match document.value(node) {
            Value::Element(element) => (element.name(), element.prefix()),
            Value::ProcessingInstruction(pi) => return pi.target().to_string(),
            _ => return String::new(),
        },
        Item::Attribute(node, index) => {
            match document
                .element(node)
                .and_then(|element| element.attributes().get(index))
            {
                Some(attribute) => (attribute.name(), attribute.prefix()),
                None => return String::new(),
            }
        }
    };
    if qualified {
        document.qualified_str(prefix_id, name_id)
    } else {
        document.local_name_str(name_id).to_string()
    }
}

fn parse_number(s: &str) -> f64 {
    let s = s.trim();
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

fn format_number(number: f64) -> String {
    if number.is_nan() {
        "NaN".to_string()
    } else if number.is_infinite() {
        let infinity = if number > 0.0 { "Infinity" } else { "-Infinity" };
        infinity.to_string()
    } else if number == number.trunc() && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{}", number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_order_puts_attributes_before_children() {
        let doc = Document::parse_str(r#"<a x="1" y="2"><b/></a>"#).unwrap();
        let a = doc.document_element();
        let b = doc.first_child(a).unwrap();
        let mut items = vec![
            Item::Node(b),
            Item::Attribute(a, 1),
            Item::Node(a),
            Item::Attribute(a, 0),
        ];
        items.sort();
        assert_eq!(
            items,
            vec![
                Item::Node(a),
                Item::Attribute(a, 0),
                Item::Attribute(a, 1),
                Item::Node(b)
            ]
        );
    }

    #[test]
    fn test_number_conversions() {
        assert_eq!(parse_number(" 12 "), 12.0);
        assert_eq!(parse_number("-1.5"), -1.5);
        assert!(parse_number("1e3").is_nan());
        assert!(parse_number("").is_nan());
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_bind_falls_back_to_document_element() {
        let doc = Document::parse_str(r#"<a xmlns="urn:d" xmlns:p="urn:p"><b xmlns:q="urn:q"/></a>"#)
            .unwrap();
        let prefixes = ["p", "xmlns", "xml"].map(String::from);
        let bindings = bind(&doc, &prefixes, &[]).unwrap();
        assert_eq!(bindings["p"], doc.namespace_lookup.get_id("urn:p"));
        assert_eq!(bindings["xmlns"], doc.namespace_lookup.get_id("urn:d"));
        assert_eq!(bindings["xml"], Some(doc.xml_namespace_id));
        // only the document element's declarations are used
        assert_eq!(
            bind(&doc, &["q".to_string()], &[]).unwrap_err(),
            XPathError::UnknownPrefix("q".to_string())
        );
    }

    #[test]
    fn test_caller_binding_wins() {
        let doc = Document::parse_str(r#"<a xmlns:p="urn:p"/>"#).unwrap();
        let bindings = bind(&doc, &["p".to_string()], &[("p", "urn:elsewhere")]).unwrap();
        assert_eq!(bindings["p"], None);
    }
}
