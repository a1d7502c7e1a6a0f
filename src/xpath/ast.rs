#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Attribute,
}

impl Axis {
    pub(crate) fn from_name(name: &str) -> Option<Axis> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "self" => Axis::SelfAxis,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "attribute" => Axis::Attribute,
            _ => return None,
        })
    }

    /// Axes that never leave the subtree of their context node.
    pub(crate) fn is_downward(self) -> bool {
        matches!(
            self,
            Axis::Child | Axis::Descendant | Axis::DescendantOrSelf | Axis::SelfAxis | Axis::Attribute
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QName {
    pub(crate) prefix: Option<String>,
    pub(crate) local: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeTest {
    Name(QName),
    /// `*`
    Wildcard,
    /// `p:*`
    NamespaceWildcard(String),
    Node,
    Text,
    Comment,
    ProcessingInstruction(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    pub(crate) axis: Axis,
    pub(crate) test: NodeTest,
    pub(crate) predicates: Vec<Expr>,
    /// Some predicate depends on the context position or size.
    pub(crate) positional: bool,
}

impl Step {
    pub(crate) fn new(axis: Axis, test: NodeTest) -> Self {
        Step {
            axis,
            test,
            predicates: Vec::new(),
            positional: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocationPath {
    pub(crate) absolute: bool,
    pub(crate) steps: Vec<Step>,
}

impl LocationPath {
    pub(crate) fn is_downward(&self) -> bool {
        self.steps.iter().all(|step| step.axis.is_downward())
    }

    pub(crate) fn selects_attributes(&self) -> bool {
        self.steps
            .last()
            .is_some_and(|step| step.axis == Axis::Attribute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Position,
    Last,
    Count,
    Not,
    True,
    False,
    Contains,
    StartsWith,
    String,
    NormalizeSpace,
    LocalName,
    Name,
}

impl Function {
    pub(crate) fn from_name(name: &str) -> Option<Function> {
        Some(match name {
            "position" => Function::Position,
            "last" => Function::Last,
            "count" => Function::Count,
            "not" => Function::Not,
            "true" => Function::True,
            "false" => Function::False,
            "contains" => Function::Contains,
            "starts-with" => Function::StartsWith,
            "string" => Function::String,
            "normalize-space" => Function::NormalizeSpace,
            "local-name" => Function::LocalName,
            "name" => Function::Name,
            _ => return None,
        })
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Function::Position => "position",
            Function::Last => "last",
            Function::Count => "count",
            Function::Not => "not",
            Function::True => "true",
            Function::False => "false",
            Function::Contains => "contains",
            Function::StartsWith => "starts-with",
            Function::String => "string",
            Function::NormalizeSpace => "normalize-space",
            Function::LocalName => "local-name",
            Function::Name => "name",
        }
    }

    /// Accepted argument counts, and how to describe them in an error.
    pub(crate) fn arity(self) -> (usize, usize, &'static str) {
        match self {
            Function::Position | Function::Last | Function::True | Function::False => (0, 0, "0"),
            Function::Count | Function::Not => (1, 1, "1"),
            Function::Contains | Function::StartsWith => (2, 2, "2"),
            Function::String | Function::NormalizeSpace | Function::LocalName | Function::Name => {
                (0, 1, "0 or 1")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Path(LocationPath),
    Literal(String),
    Number(f64),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    /// True if used as a predicate this needs to know the context position
    /// or size: a number selects by position, `position()` and `last()`
    /// read them.
    pub(crate) fn is_positional(&self) -> bool {
        match self {
            Expr::Number(_) => true,
            Expr::Call(Function::Count, _) => true,
            _ => self.mentions_position(),
        }
    }

    fn mentions_position(&self) -> bool {
        match self {
            Expr::Call(Function::Position | Function::Last, _) => true,
            Expr::Call(_, arguments) => arguments.iter().any(Expr::mentions_position),
            Expr::Binary(_, left, right) => left.mentions_position() || right.mentions_position(),
            // nested paths have their own context
            Expr::Path(_) | Expr::Literal(_) | Expr::Number(_) => false,
        }
    }

    /// Collect every namespace prefix used in a name test.
    pub(crate) fn collect_prefixes(&self, prefixes: &mut Vec<String>) {
        match self {
            Expr::Path(path) => path.collect_prefixes(prefixes),
            Expr::Binary(_, left, right) => {
                left.collect_prefixes(prefixes);
                right.collect_prefixes(prefixes);
            }
            Expr::Call(_, arguments) => {
                for argument in arguments {
                    argument.collect_prefixes(prefixes);
                }
            }
            Expr::Literal(_) | Expr::Number(_) => {}
        }
    }
}

impl LocationPath {
    pub(crate) fn collect_prefixes(&self, prefixes: &mut Vec<String>) {
        for step in &self.steps {
            let prefix = match &step.test {
                NodeTest::Name(QName {
                    prefix: Some(prefix),
                    ..
                }) => Some(prefix),
                NodeTest::NamespaceWildcard(prefix) => Some(prefix),
                _ => None,
            };
            if let Some(prefix) = prefix {
                if !prefixes.contains(prefix) {
                    prefixes.push(prefix.clone());
                }
            }
            for predicate in &step.predicates {
                predicate.collect_prefixes(prefixes);
            }
        }
    }
}
