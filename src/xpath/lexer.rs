//! Tokenizer for XPath expressions.
//!
//! `and` and `or` are only operators after something that can end an
//! operand; elsewhere they are plain names. `*` is always a name test as
//! arithmetic isn't supported.
use crate::error::XPathError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    At,
    Dot,
    DotDot,
    Comma,
    ColonColon,
    Star,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    /// `prefix:*`
    PrefixStar(String),
    /// A name, possibly prefixed.
    Name {
        prefix: Option<String>,
        local: String,
    },
    Literal(String),
    Number(f64),
}

impl Token {
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::RightBracket
                | Token::RightParen
                | Token::Dot
                | Token::DotDot
                | Token::Star
                | Token::PrefixStar(_)
                | Token::Name { .. }
                | Token::Literal(_)
                | Token::Number(_)
        )
    }
}

pub(crate) type Spanned = (Token, usize);

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\u{B7}')
}

fn syntax(message: impl Into<String>, position: usize) -> XPathError {
    XPathError::Syntax {
        message: message.into(),
        position,
    }
}

struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.input[self.position..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn ncname(&mut self) -> &'a str {
        let start = self.position;
        while let Some(c) = self.peek() {
            if !is_name_char(c) {
                break;
            }
            self.bump();
        }
        &self.input[start..self.position]
    }

    fn number(&mut self) -> Result<f64, XPathError> {
        let start = self.position;
        while let Some(c) = self.peek() {
            if !(c.is_ascii_digit() || c == '.') {
                break;
            }
            self.bump();
        }
        self.input[start..self.position]
            .parse::<f64>()
            .map_err(|_| syntax("invalid number", start))
    }

    fn literal(&mut self, quote: char) -> Result<String, XPathError> {
        let start = self.position;
        self.bump();
        let content_start = self.position;
        while let Some(c) = self.bump() {
            if c == quote {
                return Ok(self.input[content_start..self.position - 1].to_string());
            }
        }
        Err(syntax("unterminated string literal", start))
    }

    fn name(&mut self) -> Result<Token, XPathError> {
        let first = self.ncname().to_string();
        // a single colon makes this a prefix; `::` belongs to the axis
        if self.peek() == Some(':') && self.peek_second() != Some(':') {
            let colon = self.position;
            self.bump();
            if self.peek() == Some('*') {
                self.bump();
                return Ok(Token::PrefixStar(first));
            }
            match self.peek() {
                Some(c) if is_name_start(c) => {
                    let local = self.ncname().to_string();
                    Ok(Token::Name {
                        prefix: Some(first),
                        local,
                    })
                }
                _ => Err(syntax("expected local name after prefix", colon + 1)),
            }
        } else {
            Ok(Token::Name {
                prefix: None,
                local: first,
            })
        }
    }
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, XPathError> {
    let mut lexer = Lexer { input, position: 0 };
    let mut tokens: Vec<Spanned> = Vec::new();
    while let Some(c) = lexer.peek() {
        let start = lexer.position;
        if c.is_whitespace() {
            lexer.bump();
            continue;
        }
        let token = match c {
            '/' => {
                lexer.bump();
                if lexer.peek() == Some('/') {
                    lexer.bump();
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '[' => {
                lexer.bump();
                Token::LeftBracket
            }
            ']' => {
                lexer.bump();
                Token::RightBracket
            }
            '(' => {
                lexer.bump();
                Token::LeftParen
            }
            ')' => {
                lexer.bump();
                Token::RightParen
            }
            '@' => {
                lexer.bump();
                Token::At
            }
            ',' => {
                lexer.bump();
                Token::Comma
            }
            '*' => {
                lexer.bump();
                Token::Star
            }
            '=' => {
                lexer.bump();
                Token::Equal
            }
            '!' => {
                lexer.bump();
                if lexer.peek() != Some('=') {
                    return Err(syntax("expected '=' after '!'", start));
                }
                lexer.bump();
                Token::NotEqual
            }
            '<' => {
                lexer.bump();
                if lexer.peek() == Some('=') {
                    lexer.bump();
                    Token::LessEqual
                } else {
                    Token::Less
                }
            }
            '>' => {
                lexer.bump();
                if lexer.peek() == Some('=') {
                    lexer.bump();
                    Token::GreaterEqual
                } else {
                    Token::Greater
                }
            }
            ':' => {
                lexer.bump();
                if lexer.peek() != Some(':') {
                    return Err(syntax("unexpected ':'", start));
                }
                lexer.bump();
                Token::ColonColon
            }
            '.' => match lexer.peek_second() {
                Some('.') => {
                    lexer.bump();
                    lexer.bump();
                    Token::DotDot
                }
                Some(d) if d.is_ascii_digit() => Token::Number(lexer.number()?),
                _ => {
                    lexer.bump();
                    Token::Dot
                }
            },
            '"' | '\'' => Token::Literal(lexer.literal(c)?),
            c if c.is_ascii_digit() => Token::Number(lexer.number()?),
            c if is_name_start(c) => {
                let token = lexer.name()?;
                let after_operand = tokens.last().is_some_and(|(t, _)| t.ends_operand());
                match token {
                    Token::Name { prefix: None, ref local } if after_operand && local == "and" => {
                        Token::And
                    }
                    Token::Name { prefix: None, ref local } if after_operand && local == "or" => {
                        Token::Or
                    }
                    token => token,
                }
            }
            _ => return Err(syntax(format!("unexpected character '{}'", c), start)),
        };
        tokens.push((token, start));
    }
    Ok(tokens)
}
