//! Access rules: per-operation predicates over the request identity.
//!
//! Rules use a small subset of the filter grammar:
//!
//! ```text
//! expr    := and ("||" and)*
//! and     := cmp ("&&" cmp)*
//! cmp     := "(" expr ")" | operand ("=" | "!=") operand
//! operand := @request.auth.<field> | 'literal' | "literal"
//! ```
//!
//! `None` locks the operation, `Some("")` makes it public.

use cf_domain::auth::AuthContext;

const AUTH_PREFIX: &str = "@request.auth.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    #[error("unexpected character `{0}` at {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unexpected end of rule")]
    UnexpectedEnd,
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("unsupported operand `{0}`")]
    UnsupportedOperand(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `@request.auth.<field>`
    AuthField(String),
    Literal(String),
}

impl Operand {
    fn resolve<'a>(&'a self, auth: &'a AuthContext) -> &'a str {
        match self {
            Self::AuthField(name) => auth.field(name).unwrap_or(""),
            Self::Literal(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleExpr {
    Cmp {
        lhs: Operand,
        op: CmpOp,
        rhs: Operand,
    },
    And(Box<RuleExpr>, Box<RuleExpr>),
    Or(Box<RuleExpr>, Box<RuleExpr>),
}

impl RuleExpr {
    pub fn eval(&self, auth: &AuthContext) -> bool {
        match self {
            Self::Cmp { lhs, op, rhs } => {
                let equal = lhs.resolve(auth) == rhs.resolve(auth);
                match op {
                    CmpOp::Eq => equal,
                    CmpOp::Ne => !equal,
                }
            }
            Self::And(a, b) => a.eval(auth) && b.eval(auth),
            Self::Or(a, b) => a.eval(auth) || b.eval(auth),
        }
    }
}

/// A parsed access rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// No rule: the operation is denied through the API.
    Locked,
    /// Empty rule: anyone may perform the operation.
    Public,
    Expr(RuleExpr),
}

impl AccessRule {
    pub fn parse(rule: Option<&str>) -> Result<Self, RuleParseError> {
        let Some(rule) = rule else {
            return Ok(Self::Locked);
        };
        if rule.trim().is_empty() {
            return Ok(Self::Public);
        }
        let tokens = tokenize(rule)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        match parser.peek() {
            None => Ok(Self::Expr(expr)),
            Some(tok) => Err(RuleParseError::UnexpectedToken(tok.to_string())),
        }
    }

    pub fn allows(&self, auth: &AuthContext) -> bool {
        match self {
            Self::Locked => false,
            Self::Public => true,
            Self::Expr(expr) => expr.eval(auth),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Eq,
    Ne,
    Ident(String),
    Str(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::And => f.write_str("&&"),
            Self::Or => f.write_str("||"),
            Self::Eq => f.write_str("="),
            Self::Ne => f.write_str("!="),
            Self::Ident(s) => f.write_str(s),
            Self::Str(s) => write!(f, "'{s}'"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, RuleParseError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (pos, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let mut value = String::new();
                i += 1;
                loop {
                    let Some(&(_, ch)) = chars.get(i) else {
                        return Err(RuleParseError::UnterminatedString);
                    };
                    i += 1;
                    match ch {
                        '\\' => {
                            let Some(&(_, escaped)) = chars.get(i) else {
                                return Err(RuleParseError::UnterminatedString);
                            };
                            value.push(escaped);
                            i += 1;
                        }
                        ch if ch == quote => break,
                        ch => value.push(ch),
                    }
                }
                tokens.push(Token::Str(value));
            }
            c if c == '@' || c == '_' || c.is_ascii_alphanumeric() => {
                let start = i;
                while i < chars.len() {
                    let ch = chars[i].1;
                    if ch == '@' || ch == '_' || ch == '.' || ch.is_ascii_alphanumeric() {
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(chars[start..i].iter().map(|&(_, c)| c).collect()));
            }
            other => return Err(RuleParseError::UnexpectedChar(other, pos)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, RuleParseError> {
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(RuleParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(tok)
    }

    fn parse_or(&mut self) -> Result<RuleExpr, RuleParseError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = RuleExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<RuleExpr, RuleParseError> {
        let mut lhs = self.parse_cmp()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.parse_cmp()?;
            lhs = RuleExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<RuleExpr, RuleParseError> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.parse_or()?;
            return match self.next()? {
                Token::RParen => Ok(inner),
                tok => Err(RuleParseError::UnexpectedToken(tok.to_string())),
            };
        }
        let lhs = self.parse_operand()?;
        let op = match self.next()? {
            Token::Eq => CmpOp::Eq,
            Token::Ne => CmpOp::Ne,
            tok => return Err(RuleParseError::UnexpectedToken(tok.to_string())),
        };
        let rhs = self.parse_operand()?;
        Ok(RuleExpr::Cmp { lhs, op, rhs })
    }

    fn parse_operand(&mut self) -> Result<Operand, RuleParseError> {
        match self.next()? {
            Token::Str(value) => Ok(Operand::Literal(value)),
            Token::Ident(ident) => match ident.strip_prefix(AUTH_PREFIX) {
                Some(field) if !field.is_empty() && !field.contains('.') => {
                    Ok(Operand::AuthField(field.to_owned()))
                }
                _ => Err(RuleParseError::UnsupportedOperand(ident)),
            },
            tok => Err(RuleParseError::UnexpectedToken(tok.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHENTICATED_ONLY: &str = "@request.auth.id != ''";

    #[test]
    fn should_deny_anonymous_for_authenticated_only_rule() {
        let rule = AccessRule::parse(Some(AUTHENTICATED_ONLY)).unwrap();
        assert!(!rule.allows(&AuthContext::anonymous()));
        assert!(rule.allows(&AuthContext::authenticated("u1")));
    }

    #[test]
    fn should_treat_none_as_locked_and_empty_as_public() {
        let locked = AccessRule::parse(None).unwrap();
        assert_eq!(locked, AccessRule::Locked);
        assert!(!locked.allows(&AuthContext::authenticated("u1")));

        let public = AccessRule::parse(Some("  ")).unwrap();
        assert_eq!(public, AccessRule::Public);
        assert!(public.allows(&AuthContext::anonymous()));
    }

    #[test]
    fn should_bind_and_tighter_than_or() {
        let rule = AccessRule::parse(Some(
            "@request.auth.role = 'super_admin' || @request.auth.id != '' && @request.auth.tenant_id = \"t1\"",
        ))
        .unwrap();

        let admin = AuthContext::anonymous().with_claim("role", "super_admin");
        let tenant_user = AuthContext::authenticated("u1").with_claim("tenant_id", "t1");
        let other_tenant = AuthContext::authenticated("u2").with_claim("tenant_id", "t2");

        assert!(rule.allows(&admin));
        assert!(rule.allows(&tenant_user));
        assert!(!rule.allows(&other_tenant));
    }

    #[test]
    fn should_honor_parentheses() {
        let rule = AccessRule::parse(Some(
            "(@request.auth.id = 'a' || @request.auth.id = 'b') && @request.auth.tier = 'pro'",
        ))
        .unwrap();
        assert!(rule.allows(&AuthContext::authenticated("b").with_claim("tier", "pro")));
        assert!(!rule.allows(&AuthContext::authenticated("b")));
        assert!(!rule.allows(&AuthContext::authenticated("c").with_claim("tier", "pro")));
    }

    #[test]
    fn should_unescape_string_literals() {
        let rule = AccessRule::parse(Some(r"@request.auth.name = 'o\'brien'")).unwrap();
        assert!(rule.allows(&AuthContext::anonymous().with_claim("name", "o'brien")));
    }

    #[test]
    fn should_reject_malformed_rules() {
        assert_eq!(
            AccessRule::parse(Some("@request.auth.id != 'x")),
            Err(RuleParseError::UnterminatedString)
        );
        assert_eq!(
            AccessRule::parse(Some("@request.auth.id !=")),
            Err(RuleParseError::UnexpectedEnd)
        );
        assert_eq!(
            AccessRule::parse(Some("owner = 'x'")),
            Err(RuleParseError::UnsupportedOperand("owner".into()))
        );
        assert_eq!(
            AccessRule::parse(Some("@request.auth.id ~ 'x'")),
            Err(RuleParseError::UnexpectedChar('~', 17))
        );
        assert!(matches!(
            AccessRule::parse(Some("@request.auth.id = 'x' 'y'")),
            Err(RuleParseError::UnexpectedToken(_))
        ));
    }
}
