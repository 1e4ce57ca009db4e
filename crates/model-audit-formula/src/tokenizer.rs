//! Formula tokenizer
//!
//! Splits formula text into operands, functions, parentheses, separators and
//! operators without building an expression tree. The dependency builder
//! only needs the reference operands, and a flat token stream is enough to
//! rewrite references when a shared formula is copied to another cell.
//!
//! Concatenating the `value` of every token reproduces the formula body
//! (everything after the leading `=`).

use crate::error::{FormulaError, FormulaResult};
use model_audit_core::CellError;
use std::fmt;

/// Characters that end an accumulated operand
const TOKEN_ENDERS: &[u8] = b",;}) +-*/^&=><%\n\r";

fn is_token_ender(b: u8) -> bool {
    TOKEN_ENDERS.contains(&b)
}

/// The kind of an operand token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// Double-quoted string literal
    Text,
    /// Numeric literal
    Number,
    /// TRUE / FALSE
    Logical,
    /// Error literal such as `#REF!`
    Error,
    /// Anything else: cell, range, external, name or structured reference
    Reference,
}

/// The kind of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Operand(OperandKind),
    /// Function name including the opening parenthesis, e.g. `SUM(`
    FunctionOpen,
    FunctionClose,
    ParenOpen,
    ParenClose,
    ArrayOpen,
    ArrayClose,
    /// `,` between function or array arguments
    ArgumentSeparator,
    /// `;` between array rows
    RowSeparator,
    PrefixOperator,
    InfixOperator,
    PostfixOperator,
    Whitespace,
}

impl TokenKind {
    fn is_opener(self) -> bool {
        matches!(
            self,
            TokenKind::FunctionOpen | TokenKind::ParenOpen | TokenKind::ArrayOpen
        )
    }

    fn is_closer(self) -> bool {
        matches!(
            self,
            TokenKind::FunctionClose | TokenKind::ParenClose | TokenKind::ArrayClose
        )
    }

    fn closer(self) -> Option<TokenKind> {
        match self {
            TokenKind::FunctionOpen => Some(TokenKind::FunctionClose),
            TokenKind::ParenOpen => Some(TokenKind::ParenClose),
            TokenKind::ArrayOpen => Some(TokenKind::ArrayClose),
            _ => None,
        }
    }
}

/// A single token with its byte span in the original formula
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    fn from_slice(source: &str, kind: TokenKind, start: usize, end: usize) -> Self {
        Token {
            value: source[start..end].to_string(),
            kind,
            start,
            end,
        }
    }

    fn operand_from_slice(source: &str, start: usize, end: usize) -> Self {
        let kind = TokenKind::Operand(classify_operand(&source[start..end]));
        Self::from_slice(source, kind, start, end)
    }

    /// Whether this token is an operand that may name cells
    pub fn is_reference(&self) -> bool {
        self.kind == TokenKind::Operand(OperandKind::Reference)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{:?} {}>", self.kind, self.value)
    }
}

fn classify_operand(value: &str) -> OperandKind {
    if value.starts_with('"') {
        return OperandKind::Text;
    }
    if value.starts_with('#') {
        return OperandKind::Error;
    }
    // Sheet1!#REF! is what is left of a reference to a deleted range
    if let Some((_, tail)) = value.rsplit_once('!') {
        if CellError::parse(tail).is_some() {
            return OperandKind::Error;
        }
    }
    if value.eq_ignore_ascii_case("TRUE") || value.eq_ignore_ascii_case("FALSE") {
        return OperandKind::Logical;
    }
    let starts_numeric = value
        .as_bytes()
        .first()
        .map_or(false, |b| b.is_ascii_digit() || *b == b'.');
    if starts_numeric && value.parse::<f64>().is_ok() {
        return OperandKind::Number;
    }
    OperandKind::Reference
}

/// Tokenize a formula.
///
/// The formula must start with `=`.
///
/// # Example
/// ```rust
/// use model_audit_formula::tokenizer::{tokenize, OperandKind, TokenKind};
///
/// let tokens = tokenize("=SUM(A1:A5)+'My Sheet'!B2").unwrap();
/// let refs: Vec<_> = tokens
///     .iter()
///     .filter(|t| t.kind == TokenKind::Operand(OperandKind::Reference))
///     .map(|t| t.value.as_str())
///     .collect();
/// assert_eq!(refs, vec!["A1:A5", "'My Sheet'!B2"]);
/// ```
pub fn tokenize(formula: &str) -> FormulaResult<Vec<Token>> {
    if !formula.starts_with('=') {
        return Err(FormulaError::Tokenize {
            message: "formula must start with '='".into(),
            position: 0,
        });
    }

    let mut tokenizer = Tokenizer::new(formula);
    tokenizer.run()?;
    Ok(tokenizer.items)
}

/// Rebuild formula text from tokens
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::from("=");
    for token in tokens {
        out.push_str(&token.value);
    }
    out
}

struct Tokenizer<'a> {
    formula: &'a str,
    items: Vec<Token>,
    stack: Vec<TokenKind>,
    offset: usize,
    token_start: usize,
    token_end: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(formula: &'a str) -> Self {
        Self {
            formula,
            items: Vec::with_capacity(formula.len() / 2),
            stack: Vec::new(),
            offset: 1,
            token_start: 1,
            token_end: 1,
        }
    }

    // === Scanner helpers ===

    fn bytes(&self) -> &'a [u8] {
        self.formula.as_bytes()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes().get(self.offset).copied()
    }

    fn peek_byte_at(&self, ahead: usize) -> Option<u8> {
        self.bytes().get(self.offset + ahead).copied()
    }

    fn has_token(&self) -> bool {
        self.token_end > self.token_start
    }

    fn start_token(&mut self) {
        self.token_start = self.offset;
        self.token_end = self.offset;
    }

    fn save_token(&mut self) {
        if self.has_token() {
            self.items.push(Token::operand_from_slice(
                self.formula,
                self.token_start,
                self.token_end,
            ));
        }
        self.start_token();
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.items
            .push(Token::from_slice(self.formula, kind, start, end));
    }

    fn error(&self, message: impl Into<String>) -> FormulaError {
        FormulaError::Tokenize {
            message: message.into(),
            position: self.offset,
        }
    }

    // === Main loop ===

    fn run(&mut self) -> FormulaResult<()> {
        while let Some(b) = self.peek_byte() {
            if self.consume_exponent_sign() {
                continue;
            }

            if is_token_ender(b) && self.has_token() {
                self.save_token();
            }

            match b {
                b'"' | b'\'' => self.scan_quoted(b)?,
                b'[' => self.scan_brackets()?,
                b'#' => self.scan_error()?,
                b' ' | b'\n' | b'\r' => self.scan_whitespace(),
                b'+' | b'-' | b'*' | b'/' | b'^' | b'&' | b'=' | b'>' | b'<' | b'%' => {
                    self.scan_operator()
                }
                b'{' | b'(' => self.scan_opener(b),
                b')' | b'}' => self.scan_closer(b)?,
                b';' | b',' => self.scan_separator(b),
                _ => {
                    if !self.has_token() {
                        self.start_token();
                    }
                    self.offset += 1;
                    self.token_end = self.offset;
                }
            }
        }

        if self.has_token() {
            self.save_token();
        }

        if !self.stack.is_empty() {
            return Err(self.error("unmatched opening parenthesis or brace"));
        }

        Ok(())
    }

    /// `1.5E+3`: the sign belongs to the number, not an operator
    fn consume_exponent_sign(&mut self) -> bool {
        match self.peek_byte() {
            Some(b'+') | Some(b'-') if self.is_exponent_base() => {
                self.offset += 1;
                self.token_end = self.offset;
                true
            }
            _ => false,
        }
    }

    fn is_exponent_base(&self) -> bool {
        if !self.has_token() {
            return false;
        }
        let token = &self.bytes()[self.token_start..self.token_end];
        if token.len() < 2 || !token[0].is_ascii_digit() {
            return false;
        }
        if !matches!(token[token.len() - 1], b'E' | b'e') {
            return false;
        }
        let mut dot_seen = false;
        for &b in &token[1..token.len() - 1] {
            match b {
                b'0'..=b'9' => {}
                b'.' if !dot_seen => dot_seen = true,
                _ => return false,
            }
        }
        true
    }

    /// Double quotes delimit a text literal. Single quotes delimit a sheet
    /// name and stay part of the reference operand being accumulated.
    fn scan_quoted(&mut self, delim: u8) -> FormulaResult<()> {
        if delim == b'"' {
            self.save_token();
        } else if self.has_token() {
            let token = &self.bytes()[self.token_start..self.token_end];
            let continues = token.ends_with(b":") || token == b"$";
            if !continues {
                self.save_token();
            }
        } else {
            self.start_token();
        }

        let literal_start = self.offset;
        self.offset += 1;

        while let Some(b) = self.peek_byte() {
            self.offset += 1;
            if b != delim {
                continue;
            }
            if self.peek_byte() == Some(delim) {
                // Doubled delimiter is an escaped quote
                self.offset += 1;
                continue;
            }
            if delim == b'"' {
                self.push(
                    TokenKind::Operand(OperandKind::Text),
                    literal_start,
                    self.offset,
                );
                self.start_token();
            } else {
                self.token_end = self.offset;
            }
            return Ok(());
        }

        Err(self.error("reached end of formula while parsing string"))
    }

    /// `[...]` segments (workbook qualifiers, structured references) are
    /// consumed whole, including nested brackets.
    fn scan_brackets(&mut self) -> FormulaResult<()> {
        if !self.has_token() {
            self.start_token();
        }

        let mut depth = 0usize;
        while let Some(b) = self.peek_byte() {
            self.offset += 1;
            match b {
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        self.token_end = self.offset;
                        return Ok(());
                    }
                }
                _ => {}
            }
        }

        Err(self.error("encountered unmatched '['"))
    }

    fn scan_error(&mut self) -> FormulaResult<()> {
        // A pending `Sheet1!` prefix is kept with the error literal
        let keeps_prefix = self.has_token() && self.bytes()[self.token_end - 1] == b'!';
        if !keeps_prefix {
            self.save_token();
        }
        let error_start = if keeps_prefix {
            self.token_start
        } else {
            self.offset
        };

        let rest = &self.formula[self.offset..];
        for err in CellError::ALL {
            let code = err.as_str();
            let matches = rest.len() >= code.len()
                && rest.as_bytes()[..code.len()].eq_ignore_ascii_case(code.as_bytes());
            if matches {
                let end = self.offset + code.len();
                self.push(TokenKind::Operand(OperandKind::Error), error_start, end);
                self.offset = end;
                self.start_token();
                return Ok(());
            }
        }

        Err(self.error("invalid error code"))
    }

    fn scan_whitespace(&mut self) {
        self.save_token();
        let start = self.offset;
        while matches!(self.peek_byte(), Some(b' ' | b'\n' | b'\r')) {
            self.offset += 1;
        }
        self.push(TokenKind::Whitespace, start, self.offset);
        self.start_token();
    }

    fn scan_operator(&mut self) {
        self.save_token();
        let start = self.offset;

        if let (Some(a), Some(b)) = (self.peek_byte(), self.peek_byte_at(1)) {
            if matches!((a, b), (b'>', b'=') | (b'<', b'=') | (b'<', b'>')) {
                self.offset += 2;
                self.push(TokenKind::InfixOperator, start, self.offset);
                self.start_token();
                return;
            }
        }

        let kind = match self.peek_byte() {
            Some(b'%') => TokenKind::PostfixOperator,
            Some(b'+') | Some(b'-') => {
                let prev = self
                    .items
                    .iter()
                    .rev()
                    .find(|t| t.kind != TokenKind::Whitespace);
                match prev {
                    Some(t)
                        if t.kind.is_closer()
                            || t.kind == TokenKind::PostfixOperator
                            || matches!(t.kind, TokenKind::Operand(_)) =>
                    {
                        TokenKind::InfixOperator
                    }
                    _ => TokenKind::PrefixOperator,
                }
            }
            _ => TokenKind::InfixOperator,
        };

        self.offset += 1;
        self.push(kind, start, self.offset);
        self.start_token();
    }

    fn scan_opener(&mut self, b: u8) {
        let kind = if b == b'{' {
            self.save_token();
            TokenKind::ArrayOpen
        } else if self.has_token() {
            TokenKind::FunctionOpen
        } else {
            TokenKind::ParenOpen
        };

        let start = if kind == TokenKind::FunctionOpen {
            self.token_start
        } else {
            self.offset
        };
        self.offset += 1;
        self.push(kind, start, self.offset);
        self.stack.push(kind);
        self.start_token();
    }

    fn scan_closer(&mut self, b: u8) -> FormulaResult<()> {
        self.save_token();

        let opener = self
            .stack
            .pop()
            .ok_or_else(|| self.error("no matching opener for closer"))?;
        debug_assert!(opener.is_opener());
        let closer = opener
            .closer()
            .ok_or_else(|| self.error("no matching opener for closer"))?;

        let is_brace = b == b'}';
        if is_brace != (closer == TokenKind::ArrayClose) {
            return Err(self.error("mismatched ( and { pair"));
        }

        let start = self.offset;
        self.offset += 1;
        self.push(closer, start, self.offset);
        self.start_token();
        Ok(())
    }

    fn scan_separator(&mut self, b: u8) {
        self.save_token();

        let kind = if b == b';' {
            TokenKind::RowSeparator
        } else {
            match self.stack.last() {
                Some(TokenKind::FunctionOpen) | Some(TokenKind::ArrayOpen) => {
                    TokenKind::ArgumentSeparator
                }
                // Union operator: =SUM((A1,B1))
                _ => TokenKind::InfixOperator,
            }
        };

        let start = self.offset;
        self.offset += 1;
        self.push(kind, start, self.offset);
        self.start_token();
    }
}
