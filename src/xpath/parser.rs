use crate::error::XPathError;

use super::ast::{Axis, BinaryOp, Expr, Function, LocationPath, NodeTest, QName, Step};
use super::lexer::{tokenize, Spanned, Token};

struct Parser {
    tokens: Vec<Spanned>,
    index: usize,
    end: usize,
}

fn syntax(message: impl Into<String>, position: usize) -> XPathError {
    XPathError::Syntax {
        message: message.into(),
        position,
    }
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(token, _)| token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.index + offset).map(|(token, _)| token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.index)
            .map(|(_, position)| *position)
            .unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).map(|(token, _)| token.clone());
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), XPathError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(syntax(format!("expected {}", what), self.position()))
        }
    }

    fn expr(&mut self) -> Result<Expr, XPathError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.and_expr()?;
        while self.eat(&Token::Or) {
            let right = self.and_expr()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.equality_expr()?;
        while self.eat(&Token::And) {
            let right = self.equality_expr()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.relational_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Equal) => BinaryOp::Equal,
                Some(Token::NotEqual) => BinaryOp::NotEqual,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.relational_expr()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn relational_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.primary_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Less) => BinaryOp::Less,
                Some(Token::LessEqual) => BinaryOp::LessEqual,
                Some(Token::Greater) => BinaryOp::Greater,
                Some(Token::GreaterEqual) => BinaryOp::GreaterEqual,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.primary_expr()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn primary_expr(&mut self) -> Result<Expr, XPathError> {
        match self.peek() {
            Some(Token::Literal(literal)) => {
                let literal = literal.clone();
                self.advance();
                Ok(Expr::Literal(literal))
            }
            Some(Token::Number(number)) => {
                let number = *number;
                self.advance();
                Ok(Expr::Number(number))
            }
            Some(Token::LeftParen) => {
                self.advance();
                let expr = self.expr()?;
                self.expect(&Token::RightParen, "')'")?;
                Ok(expr)
            }
            Some(Token::Name {
                prefix: None,
                local,
            }) if self.peek_at(1) == Some(&Token::LeftParen) && !is_node_type(local) => {
                self.function_call()
            }
            _ => Ok(Expr::Path(self.location_path()?)),
        }
    }

    fn function_call(&mut self) -> Result<Expr, XPathError> {
        let position = self.position();
        let name = match self.advance() {
            Some(Token::Name { local, .. }) => local,
            _ => return Err(syntax("expected function name", position)),
        };
        let function =
            Function::from_name(&name).ok_or_else(|| XPathError::UnknownFunction(name.clone()))?;
        self.expect(&Token::LeftParen, "'('")?;
        let mut arguments = Vec::new();
        if !self.eat(&Token::RightParen) {
            loop {
                arguments.push(self.expr()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RightParen, "')' or ','")?;
                break;
            }
        }
        let (min, max, expected) = function.arity();
        if arguments.len() < min || arguments.len() > max {
            return Err(XPathError::WrongArgumentCount {
                function: function.name(),
                expected,
            });
        }
        Ok(Expr::Call(function, arguments))
    }

    fn location_path(&mut self) -> Result<LocationPath, XPathError> {
        let mut path = LocationPath {
            absolute: false,
            steps: Vec::new(),
        };
        match self.peek() {
            Some(Token::Slash) => {
                self.advance();
                path.absolute = true;
                // a lone `/` selects the root
                if !self.starts_step() {
                    return Ok(path);
                }
            }
            Some(Token::DoubleSlash) => {
                self.advance();
                path.absolute = true;
                path.steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
            }
            _ => {}
        }
        loop {
            let position = self.position();
            let step = self.step()?;
            push_step(&mut path.steps, step, position)?;
            let separator = self.position();
            match self.peek() {
                Some(Token::Slash) => {
                    self.advance();
                }
                Some(Token::DoubleSlash) => {
                    self.advance();
                    let step = Step::new(Axis::DescendantOrSelf, NodeTest::Node);
                    push_step(&mut path.steps, step, separator)?;
                }
                _ => return Ok(path),
            }
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Dot
                    | Token::DotDot
                    | Token::At
                    | Token::Star
                    | Token::PrefixStar(_)
                    | Token::Name { .. }
            )
        )
    }

    fn step(&mut self) -> Result<Step, XPathError> {
        if self.eat(&Token::Dot) {
            return Ok(Step::new(Axis::SelfAxis, NodeTest::Node));
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step::new(Axis::Parent, NodeTest::Node));
        }
        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else {
            match (self.peek(), self.peek_at(1)) {
                (Some(Token::Name { prefix: None, local }), Some(Token::ColonColon)) => {
                    let position = self.position();
                    let axis = Axis::from_name(local)
                        .ok_or_else(|| syntax(format!("unknown axis '{}'", local), position))?;
                    self.advance();
                    self.advance();
                    axis
                }
                _ => Axis::Child,
            }
        };
        let test = self.node_test()?;
        let mut step = Step::new(axis, test);
        while self.eat(&Token::LeftBracket) {
            let predicate = self.expr()?;
            self.expect(&Token::RightBracket, "']'")?;
            step.positional |= predicate.is_positional();
            step.predicates.push(predicate);
        }
        Ok(step)
    }

    fn node_test(&mut self) -> Result<NodeTest, XPathError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Star) => Ok(NodeTest::Wildcard),
            Some(Token::PrefixStar(prefix)) => Ok(NodeTest::NamespaceWildcard(prefix)),
            Some(Token::Name {
                prefix: None,
                local,
            }) if is_node_type(&local) && self.peek() == Some(&Token::LeftParen) => {
                self.advance();
                let test = match local.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => {
                        let target = match self.peek() {
                            Some(Token::Literal(target)) => Some(target.clone()),
                            _ => None,
                        };
                        if target.is_some() {
                            self.advance();
                        }
                        NodeTest::ProcessingInstruction(target)
                    }
                };
                self.expect(&Token::RightParen, "')'")?;
                Ok(test)
            }
            Some(Token::Name { prefix, local }) => Ok(NodeTest::Name(QName { prefix, local })),
            Some(_) => Err(syntax("expected node test", position)),
            None => Err(syntax("unexpected end of expression", position)),
        }
    }
}

// Steps after an attribute step are rewritten so that only the last step
// can select attributes: `X/@a/..` becomes `X/self::node()[@a]/self::node()`
// and `X/@a/self::node()[p]` becomes `X/@a[self::node()[p]]`.
fn push_step(steps: &mut Vec<Step>, step: Step, position: usize) -> Result<(), XPathError> {
    let attribute = match steps.pop() {
        Some(previous) if previous.axis == Axis::Attribute => previous,
        Some(previous) => {
            steps.push(previous);
            steps.push(step);
            return Ok(());
        }
        None => {
            steps.push(step);
            return Ok(());
        }
    };
    match step.axis {
        Axis::SelfAxis if step.test == NodeTest::Node => {
            let mut attribute = attribute;
            if !step.predicates.is_empty() {
                attribute.predicates.push(Expr::Path(LocationPath {
                    absolute: false,
                    steps: vec![step],
                }));
            }
            steps.push(attribute);
        }
        Axis::Parent | Axis::Ancestor => {
            let mut owner = Step::new(Axis::SelfAxis, NodeTest::Node);
            owner.predicates.push(Expr::Path(LocationPath {
                absolute: false,
                steps: vec![attribute],
            }));
            steps.push(owner);
            // the owner element is the first node either axis reaches
            let axis = if step.axis == Axis::Parent {
                Axis::SelfAxis
            } else {
                Axis::AncestorOrSelf
            };
            steps.push(Step { axis, ..step });
        }
        _ => {
            return Err(syntax(
                "only parent, ancestor or self::node() steps may follow an attribute step",
                position,
            ))
        }
    }
    Ok(())
}

fn is_node_type(name: &str) -> bool {
    matches!(name, "node" | "text" | "comment" | "processing-instruction")
}

/// Parse a whole expression.
pub(crate) fn parse_expr(input: &str) -> Result<Expr, XPathError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(syntax("empty expression", 0));
    }
    let mut parser = Parser {
        tokens,
        index: 0,
        end: input.len(),
    };
    let expr = parser.expr()?;
    if parser.index < parser.tokens.len() {
        return Err(syntax("unexpected token", parser.position()));
    }
    Ok(expr)
}

/// Parse an expression that must be a location path.
pub(crate) fn parse_path(input: &str) -> Result<LocationPath, XPathError> {
    match parse_expr(input)? {
        Expr::Path(path) => Ok(path),
        _ => Err(syntax("expected a location path", 0)),
    }
}
