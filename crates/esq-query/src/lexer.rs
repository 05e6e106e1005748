//! Query tokenizer.
//!
//! Converts a query string into a flat stream of tokens for the tree builder.
//! Whitespace separates words, parentheses are always structural, and a word
//! containing an unquoted `:` is a `field:value` term even when its value looks
//! like an operator (`item:OR`).

use std::{fmt, iter::Peekable, str::Chars};

use tracing::trace;

use crate::error::TokenizeError;

/// A leaf `field:value` condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    /// Field name, possibly dotted (`relation.subfield`).
    pub field: String,
    /// Value with surrounding quotes removed.
    pub value: String,
}

impl Term {
    /// Creates a term.
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_bare_value(&self.value) {
            write!(f, "{}:{}", self.field, self.value)
        } else {
            write!(f, "{}:\"{}\"", self.field, self.value)
        }
    }
}

/// Whether `value` reads back unchanged when written without surrounding quotes.
///
/// The lexer strips one pair of quotes wrapping a whole value, so a value that
/// itself starts and ends with `"` has to be wrapped again.
fn is_bare_value(value: &str) -> bool {
    if value.is_empty() || (value.len() >= 2 && value.starts_with('"') && value.ends_with('"')) {
        return false;
    }
    let mut quoted = false;
    for ch in value.chars() {
        match ch {
            '"' => quoted = !quoted,
            c if !quoted && (c.is_whitespace() || c == '(' || c == ')') => return false,
            _ => {}
        }
    }
    !quoted
}

/// A binary boolean operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `AND NOT`
    AndNot,
    /// `OR NOT`
    OrNot,
}

impl Operator {
    /// Returns true for the OR family, which binds looser than the AND family.
    pub fn is_disjunctive(self) -> bool {
        matches!(self, Self::Or | Self::OrNot)
    }

    /// Returns true for `AND NOT` and `OR NOT`.
    pub fn is_negated(self) -> bool {
        matches!(self, Self::AndNot | Self::OrNot)
    }

    /// The keyword text as written in a query.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::AndNot => "AND NOT",
            Self::OrNot => "OR NOT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token in the query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A `field:value` condition.
    Term(Term),

    /// A boolean operator, with `NOT` already merged into it.
    Op(Operator),

    /// Left parenthesis.
    GroupOpen,

    /// Right parenthesis.
    GroupClose,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(term) => term.fmt(f),
            Self::Op(op) => op.fmt(f),
            Self::GroupOpen => f.write_str("("),
            Self::GroupClose => f.write_str(")"),
        }
    }
}

/// A whitespace-delimited word read from the input.
struct Word {
    /// Raw text, quotes included.
    text: String,
    /// Byte offset of the first unquoted colon within `text`.
    colon: Option<usize>,
    /// Byte position of the word in the input.
    start: usize,
}

/// Tokenizes a query string.
#[derive(Clone)]
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Creates an error at a specific position.
    fn error_at(&self, message: impl Into<String>, position: usize) -> TokenizeError {
        TokenizeError::new(message, position, self.input)
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens: Vec<Token> = Vec::new();

        while let Some((token, start)) = self.next_token()? {
            if let Token::Op(op) = &token {
                match tokens.last() {
                    None | Some(Token::GroupOpen) => {
                        return Err(self.error_at(
                            format!("unexpected operator {op} (expected a term or group)"),
                            start,
                        ));
                    }
                    Some(Token::Op(prev)) => {
                        return Err(self.error_at(
                            format!("unexpected operator {op} after {prev}"),
                            start,
                        ));
                    }
                    _ => {}
                }
            }
            tokens.push(token);
        }

        trace!(count = tokens.len(), "tokenized query");
        Ok(tokens)
    }

    /// Returns the next token and its byte position, or None at end of input.
    fn next_token(&mut self) -> Result<Option<(Token, usize)>, TokenizeError> {
        self.skip_whitespace();

        let start = self.position;
        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match ch {
            '(' => {
                self.advance();
                Token::GroupOpen
            }
            ')' => {
                self.advance();
                Token::GroupClose
            }
            _ => {
                let word = self.read_word()?;
                self.classify(word)?
            }
        };

        Ok(Some((token, start)))
    }

    /// Turns a word into a term or an operator.
    fn classify(&mut self, word: Word) -> Result<Token, TokenizeError> {
        if let Some(colon) = word.colon {
            return self.read_term(&word, colon).map(Token::Term);
        }

        match word.text.as_str() {
            "AND" => Ok(Token::Op(self.merge_not(Operator::And, Operator::AndNot))),
            "OR" => Ok(Token::Op(self.merge_not(Operator::Or, Operator::OrNot))),
            "NOT" => Err(self.error_at("NOT must follow AND or OR", word.start)),
            other => Err(self.error_at(
                format!("expected field:value, found '{other}'"),
                word.start,
            )),
        }
    }

    /// Consumes a following `NOT` keyword, if present, to form a negated operator.
    fn merge_not(&mut self, plain: Operator, negated: Operator) -> Operator {
        let mut ahead = self.clone();
        ahead.skip_whitespace();
        match ahead.read_word() {
            Ok(word) if word.colon.is_none() && word.text == "NOT" => {
                *self = ahead;
                negated
            }
            _ => plain,
        }
    }

    /// Splits a word at its first unquoted colon.
    fn read_term(&self, word: &Word, colon: usize) -> Result<Term, TokenizeError> {
        let field = &word.text[..colon];
        let raw_value = &word.text[colon + 1..];

        if field.is_empty() {
            return Err(self.error_at("empty field name", word.start));
        }
        if field.contains('"') {
            return Err(self.error_at(
                format!("field name '{field}' cannot be quoted"),
                word.start,
            ));
        }

        let value = if raw_value.len() >= 2 && raw_value.starts_with('"') && raw_value.ends_with('"')
        {
            &raw_value[1..raw_value.len() - 1]
        } else if raw_value.is_empty() {
            return Err(self.error_at(
                format!("missing value after '{field}:'"),
                word.start + colon + 1,
            ));
        } else {
            raw_value
        };

        Ok(Term::new(field, value))
    }

    /// Reads a word up to unquoted whitespace or a parenthesis.
    fn read_word(&mut self) -> Result<Word, TokenizeError> {
        let start = self.position;
        let mut text = String::new();
        let mut colon = None;
        let mut quote_start: Option<usize> = None;

        while let Some(&ch) = self.chars.peek() {
            let quoted = quote_start.is_some();
            if !quoted && (ch.is_whitespace() || ch == '(' || ch == ')') {
                break;
            }

            match ch {
                '"' if quoted => quote_start = None,
                '"' => quote_start = Some(self.position),
                ':' if !quoted && colon.is_none() => colon = Some(text.len()),
                _ => {}
            }

            text.push(ch);
            self.advance();
        }

        if let Some(pos) = quote_start {
            return Err(self.error_at("unterminated quote", pos));
        }

        Ok(Word { text, colon, start })
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Tokenizes a query string.
pub fn tokenize(input: &str) -> Result<Vec<Token>, TokenizeError> {
    Lexer::new(input).tokenize()
}

/// Reassembles tokens into a query string separated by single spaces.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for token in tokens {
        let tight = matches!(prev, None | Some(Token::GroupOpen))
            || matches!(token, Token::GroupClose);
        if !tight {
            out.push(' ');
        }
        out.push_str(&token.to_string());
        prev = Some(token);
    }
    out
}
