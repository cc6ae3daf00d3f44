//! Profile expression parser.
//!
//! Parses expressions such as `prod`, `!dev`, `prod & cloud` or
//! `(eu | us) & !staging` into a small tree that can be matched against
//! the set of active profiles.
//!
//! Grammar:
//!
//! ```text
//! expr    := unary ( ('&' unary)* | ('|' unary)* )
//! unary   := '!' unary | primary
//! primary := '(' expr ')' | NAME
//! ```
//!
//! `&` and `|` may not be mixed at the same nesting level; `a & b | c`
//! must be written `(a & b) | c`.

/// Parsed profile expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileExpr {
    /// A single profile name.
    Profile(String),
    /// Negation.
    Not(Box<ProfileExpr>),
    /// All operands must hold.
    And(Vec<ProfileExpr>),
    /// At least one operand must hold.
    Or(Vec<ProfileExpr>),
}

/// Errors produced while parsing a profile expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("empty profile expression")]
    Empty,

    #[error("unexpected '{token}' at offset {offset} in profile expression '{expression}'")]
    UnexpectedToken {
        expression: String,
        token: String,
        offset: usize,
    },

    #[error("unexpected end of profile expression '{0}'")]
    UnexpectedEnd(String),

    #[error("malformed profile expression '{0}': mixing '&' and '|' requires parentheses")]
    MixedOperators(String),

    #[error("unbalanced parentheses in profile expression '{0}'")]
    Unbalanced(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Name(n) => n.clone(),
            Token::Not => "!".to_string(),
            Token::And => "&".to_string(),
            Token::Or => "|".to_string(),
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
        }
    }
}

fn is_operator(c: char) -> bool {
    matches!(c, '!' | '&' | '|' | '(' | ')')
}

fn tokenize(input: &str) -> Vec<(usize, Token)> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '!' => Token::Not,
            '&' => Token::And,
            '|' => Token::Or,
            '(' => Token::Open,
            ')' => Token::Close,
            _ => {
                let mut name = String::from(c);
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_whitespace() || is_operator(next) {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                Token::Name(name)
            }
        };
        tokens.push((offset, token));
    }

    tokens
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.pos)
    }

    fn unexpected(&self, offset: usize, token: &Token) -> ExprError {
        ExprError::UnexpectedToken {
            expression: self.source.to_string(),
            token: token.text(),
            offset,
        }
    }

    fn parse_expr(&mut self) -> Result<ProfileExpr, ExprError> {
        let mut operands = vec![self.parse_unary()?];
        let mut operator: Option<Token> = None;

        while let Some((offset, token)) = self.peek().cloned() {
            match token {
                Token::And | Token::Or => {
                    if let Some(ref op) = operator {
                        if *op != token {
                            return Err(ExprError::MixedOperators(self.source.to_string()));
                        }
                    }
                    operator = Some(token);
                    self.pos += 1;
                    operands.push(self.parse_unary()?);
                }
                Token::Close => break,
                other => return Err(self.unexpected(offset, &other)),
            }
        }

        Ok(match operator {
            None => operands.remove(0),
            Some(Token::And) => ProfileExpr::And(operands),
            Some(_) => ProfileExpr::Or(operands),
        })
    }

    fn parse_unary(&mut self) -> Result<ProfileExpr, ExprError> {
        if let Some((_, Token::Not)) = self.peek() {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(ProfileExpr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<ProfileExpr, ExprError> {
        let Some((offset, token)) = self.peek().cloned() else {
            return Err(ExprError::UnexpectedEnd(self.source.to_string()));
        };

        match token {
            Token::Name(name) => {
                self.pos += 1;
                Ok(ProfileExpr::Profile(name))
            }
            Token::Open => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                match self.peek() {
                    Some((_, Token::Close)) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(ExprError::Unbalanced(self.source.to_string())),
                }
            }
            other => Err(self.unexpected(offset, &other)),
        }
    }
}

impl ProfileExpr {
    /// Parse a profile expression.
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(source);
        if tokens.is_empty() {
            return Err(ExprError::Empty);
        }

        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
        };
        let expr = parser.parse_expr()?;

        // A stray ')' is the only token parse_expr stops on without consuming
        if parser.pos < parser.tokens.len() {
            return Err(ExprError::Unbalanced(source.to_string()));
        }

        Ok(expr)
    }

    /// Evaluate the expression against a profile membership test.
    pub fn matches<F>(&self, is_active: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match self {
            ProfileExpr::Profile(name) => is_active(name),
            ProfileExpr::Not(inner) => !inner.matches(is_active),
            ProfileExpr::And(operands) => operands.iter().all(|e| e.matches(is_active)),
            ProfileExpr::Or(operands) => operands.iter().any(|e| e.matches(is_active)),
        }
    }
}
