//! Recursive-descent parser for PQL text.

use crate::ast::{
    is_no_nesting, Boolean, BooleanOp, Comparator, ComparatorOp, Generic, Limit, Node, Scalar,
    Sort, SortDirection, SortField, Value,
};
use crate::error::ParseError;

/// Nesting limit used by [`parse_pql`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Upper bound for [`Parser::max_depth`]; deeper input would risk the stack.
pub const MAX_DEPTH_LIMIT: usize = 256;

/// Parse PQL text into its list of top-level operations.
///
/// Comma-separated top-level operations are an implicit AND; a single
/// operation yields a one-element list and blank input yields an empty one.
pub fn parse_pql(input: &str) -> Result<Vec<Node>, ParseError> {
    Parser::new(input).parse()
}

/// A parsed argument before the owning operator decides what it means.
#[derive(Debug)]
enum Arg<'a> {
    Node(Node),
    Scalar(Scalar),
    Bare(&'a str),
}

impl Arg<'_> {
    fn into_value(self) -> Value {
        match self {
            Arg::Node(n) => Value::Node(n),
            Arg::Scalar(s) => Value::Scalar(s),
            Arg::Bare(word) => Value::Scalar(Scalar::Str(word.to_string())),
        }
    }
}

/// Parser over a single input string.
pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the maximum number of nested operations accepted, capped at
    /// [`MAX_DEPTH_LIMIT`].
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_DEPTH_LIMIT);
        self
    }

    pub fn parse(mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();

        self.skip_ws();
        if self.at_end() {
            return Ok(nodes);
        }

        loop {
            nodes.push(self.parse_operation(1)?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => {
                    self.bump();
                    self.skip_ws();
                }
                Some(c) => {
                    return Err(self.error(format!("unexpected '{}' after operation", c)));
                }
            }
        }

        Ok(nodes)
    }

    fn parse_operation(&mut self, depth: usize) -> Result<Node, ParseError> {
        if depth > self.max_depth {
            return Err(self.error(format!(
                "maximum nesting depth of {} exceeded",
                self.max_depth
            )));
        }

        let start = self.pos;
        let name = self.identifier();
        if name.is_empty() {
            return Err(self.error("expected operator name"));
        }
        self.skip_ws();
        if self.peek() != Some('(') {
            return Err(self.error(format!("expected '(' after '{}'", name)));
        }
        self.bump();

        if is_no_nesting(name) || name == "sort" {
            let tokens = self.raw_tokens()?;
            return self.build_raw(name, tokens, start);
        }

        let args = self.arg_list(depth)?;
        self.build(name, args, start)
    }

    /// Parse `arg (',' arg)* ')'`, consuming the closing paren.
    fn arg_list(&mut self, depth: usize) -> Result<Vec<Arg<'a>>, ParseError> {
        let mut args = Vec::new();

        self.skip_ws();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(args);
        }

        loop {
            args.push(self.arg(depth)?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.bump(),
                Some(')') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("unterminated argument list, expected ')'")),
                Some(c) => {
                    return Err(self.error(format!("expected ',' or ')', found '{}'", c)));
                }
            }
        }

        Ok(args)
    }

    fn arg(&mut self, depth: usize) -> Result<Arg<'a>, ParseError> {
        self.skip_ws();
        let c = match self.peek() {
            None => return Err(self.error("unterminated argument list, expected ')'")),
            Some(c) => c,
        };

        if c == '"' || c == '\'' {
            return self.quoted(c).map(|s| Arg::Scalar(Scalar::Str(s)));
        }
        if self.starts_number() {
            return self.number().map(Arg::Scalar);
        }
        if is_bare_char(c) {
            let start = self.pos;
            let word = self.bareword();
            self.skip_ws();
            if self.peek() == Some('(') {
                if !is_identifier(word) {
                    return Err(ParseError::new(
                        self.input,
                        start,
                        format!("invalid operator name '{}'", word),
                    ));
                }
                self.pos = start;
                return self.parse_operation(depth + 1).map(Arg::Node);
            }
            return Ok(Arg::Bare(word));
        }

        Err(self.error(format!("invalid token '{}'", c)))
    }

    /// Collect raw comma-separated tokens up to the matching ')'.
    fn raw_tokens(&mut self) -> Result<Vec<&'a str>, ParseError> {
        let mut pieces = Vec::new();
        let mut nested = 0usize;
        let mut start = self.pos;

        loop {
            match self.peek() {
                None => return Err(self.error("unterminated argument list, expected ')'")),
                Some('(') => {
                    nested += 1;
                    self.bump();
                }
                Some(')') if nested > 0 => {
                    nested -= 1;
                    self.bump();
                }
                Some(')') => {
                    pieces.push((start, self.input[start..self.pos].trim()));
                    self.bump();
                    break;
                }
                Some(',') if nested == 0 => {
                    pieces.push((start, self.input[start..self.pos].trim()));
                    self.bump();
                    start = self.pos;
                }
                Some(_) => self.bump(),
            }
        }

        if pieces.len() == 1 && pieces[0].1.is_empty() {
            return Ok(Vec::new());
        }
        if let Some((at, _)) = pieces.iter().find(|(_, token)| token.is_empty()) {
            return Err(ParseError::new(self.input, *at, "empty argument"));
        }
        Ok(pieces.into_iter().map(|(_, token)| token).collect())
    }

    fn build_raw(&self, name: &str, tokens: Vec<&str>, start: usize) -> Result<Node, ParseError> {
        if name == "sort" {
            let mut values = Vec::with_capacity(tokens.len());
            for token in tokens {
                let mut chars = token.chars();
                let direction = chars.next().and_then(SortDirection::from_char).ok_or_else(|| {
                    ParseError::new(
                        self.input,
                        start,
                        format!("sort key '{}' must start with '+' or '-'", token),
                    )
                })?;
                let field = chars.as_str().trim();
                if field.is_empty() {
                    return Err(ParseError::new(self.input, start, "missing sort field"));
                }
                values.push(SortField::new(field, direction));
            }
            return Ok(Node::Sort(Sort { values }));
        }

        let values = tokens
            .into_iter()
            .map(|t| Value::Scalar(Scalar::Str(t.to_string())))
            .collect();

        Ok(match ComparatorOp::from_name(name) {
            Some(op) => Node::Comparator(Comparator {
                op,
                field: None,
                values,
            }),
            None => Node::Generic(Generic {
                op: name.to_string(),
                field: None,
                values,
            }),
        })
    }

    fn build(&self, name: &str, mut args: Vec<Arg<'a>>, start: usize) -> Result<Node, ParseError> {
        if let Some(op) = BooleanOp::from_name(name) {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                match arg {
                    Arg::Node(node) => values.push(node),
                    _ => {
                        return Err(ParseError::new(
                            self.input,
                            start,
                            format!("'{}' accepts only nested operations", name),
                        ))
                    }
                }
            }
            return Ok(Node::Boolean(Boolean { op, values }));
        }

        if name == "limit" {
            return self.build_limit(args, start);
        }

        // count carries its field after the values
        let field = if name == "count" {
            match args.last() {
                Some(Arg::Bare(word)) => {
                    let word = word.to_string();
                    args.pop();
                    Some(word)
                }
                _ => None,
            }
        } else {
            match args.first() {
                Some(Arg::Bare(word)) => {
                    let word = word.to_string();
                    args.remove(0);
                    Some(word)
                }
                _ => None,
            }
        };
        let values = args.into_iter().map(Arg::into_value).collect();

        Ok(match ComparatorOp::from_name(name) {
            Some(op) => Node::Comparator(Comparator { op, field, values }),
            None => Node::Generic(Generic {
                op: name.to_string(),
                field,
                values,
            }),
        })
    }

    fn build_limit(&self, args: Vec<Arg<'a>>, start: usize) -> Result<Node, ParseError> {
        if args.len() > 2 {
            return Err(ParseError::new(
                self.input,
                start,
                format!("limit takes at most 2 arguments, got {}", args.len()),
            ));
        }

        let mut numbers = Vec::with_capacity(2);
        for arg in args {
            match arg {
                Arg::Scalar(Scalar::Int(i)) if i >= 0 => numbers.push(i as u64),
                _ => {
                    return Err(ParseError::new(
                        self.input,
                        start,
                        "limit expects non-negative integers",
                    ))
                }
            }
        }

        Ok(Node::Limit(Limit {
            from: numbers.first().copied().unwrap_or(0),
            size: numbers.get(1).copied(),
        }))
    }

    fn quoted(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();

        loop {
            match self.peek() {
                None => return Err(ParseError::new(self.input, start, "unterminated string")),
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        None => {
                            return Err(ParseError::new(self.input, start, "unterminated string"))
                        }
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some(c) => out.push(c),
                    }
                    self.bump();
                }
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(out);
                }
                Some(c) => {
                    out.push(c);
                    self.bump();
                }
            }
        }
    }

    fn starts_number(&self) -> bool {
        let mut chars = self.input[self.pos..].chars();
        match chars.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('-') | Some('+') | Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn number(&mut self) -> Result<Scalar, ParseError> {
        let start = self.pos;
        let mut is_float = false;

        if matches!(self.peek(), Some('-') | Some('+')) {
            self.bump();
        }
        self.digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            self.digits();
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('-') | Some('+')) {
                self.bump();
            }
            if self.digits() == 0 {
                return Err(self.invalid_number(start));
            }
        }
        if self.peek().is_some_and(is_bare_char) {
            return Err(self.invalid_number(start));
        }

        let text = &self.input[start..self.pos];
        if !is_float {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Scalar::Int(i));
            }
        }
        match text.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Scalar::Float(f)),
            Ok(_) => Err(ParseError::new(
                self.input,
                start,
                format!("number out of range '{}'", text),
            )),
            Err(_) => Err(self.invalid_number(start)),
        }
    }

    fn invalid_number(&mut self, start: usize) -> ParseError {
        while self.peek().is_some_and(is_bare_char) {
            self.bump();
        }
        ParseError::new(
            self.input,
            start,
            format!("invalid number '{}'", &self.input[start..self.pos]),
        )
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        self.pos - start
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                self.bump();
            }
        }
        &self.input[start..self.pos]
    }

    fn bareword(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_bare_char) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.input, self.pos, message)
    }
}

/// Characters allowed in field names and other unquoted tokens.
fn is_bare_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '*' | ':' | '@' | '$')
}

/// Whether `word` reads back as a single unquoted token in field position.
pub(crate) fn is_bareword(word: &str) -> bool {
    let mut chars = word.chars();
    chars
        .next()
        .is_some_and(|c| is_bare_char(c) && !c.is_ascii_digit() && !matches!(c, '-' | '.'))
        && chars.all(is_bare_char)
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
