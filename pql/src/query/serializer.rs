//! Canonical text rendering of PQL nodes.

use std::fmt::{self, Write};

use log::warn;
use serde_json::Value as Json;

use crate::ast::{is_no_nesting, Boolean, Limit, Node, Scalar, Sort, Value};
use crate::Result;

/// Serialize top-level nodes as an implicit AND (comma-joined, no `and(...)`).
pub fn to_pql(nodes: &[Node]) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        // Writing into a String cannot fail
        let _ = write_node(&mut out, node);
    }
    out
}

/// Serialize a JSON-form AST: either a list of nodes or a single node.
///
/// Anything else yields an empty string and a warning.
pub fn to_pql_json(value: &Json) -> String {
    let rendered: Result<String> = match value {
        Json::Array(items) => items
            .iter()
            .map(Node::from_json)
            .collect::<Result<Vec<_>>>()
            .map(|nodes| to_pql(&nodes)),
        Json::Object(_) => Node::from_json(value).map(|node| node.to_pql()),
        other => {
            warn!(
                "Cannot serialize {} to PQL: expected a node or a list of nodes",
                json_kind(other)
            );
            return String::new();
        }
    };

    rendered.unwrap_or_else(|e| {
        warn!("Cannot serialize value to PQL: {}", e);
        String::new()
    })
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

impl Node {
    pub fn to_pql(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Str(s) => {
                f.write_char('"')?;
                for c in s.chars() {
                    match c {
                        '"' | '\\' => {
                            f.write_char('\\')?;
                            f.write_char(c)?;
                        }
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        _ => f.write_char(c)?,
                    }
                }
                f.write_char('"')
            }
        }
    }
}

fn write_node<W: Write>(out: &mut W, node: &Node) -> fmt::Result {
    match node {
        Node::Comparator(c) if is_no_nesting(c.op.as_str()) => {
            write_raw(out, c.op.as_str(), c.field.as_deref(), &c.values)
        }
        Node::Comparator(c) => write_default(out, c.op.as_str(), c.field.as_deref(), &c.values),
        Node::Generic(g) if g.op == "count" => write_count(out, g.field.as_deref(), &g.values),
        Node::Generic(g) if is_no_nesting(&g.op) => {
            write_raw(out, &g.op, g.field.as_deref(), &g.values)
        }
        Node::Generic(g) => write_default(out, &g.op, g.field.as_deref(), &g.values),
        Node::Boolean(b) => write_boolean(out, b),
        Node::Limit(limit) => write_limit(out, limit),
        Node::Sort(sort) => write_sort(out, sort),
    }
}

/// `op(field,v1,v2,...)` or `op(v1,v2,...)`.
fn write_default<W: Write>(
    out: &mut W,
    op: &str,
    field: Option<&str>,
    values: &[Value],
) -> fmt::Result {
    write!(out, "{}(", op)?;
    let mut first = true;
    if let Some(field) = field {
        out.write_str(field)?;
        first = false;
    }
    for value in values {
        if !first {
            out.write_char(',')?;
        }
        write_value(out, value)?;
        first = false;
    }
    out.write_char(')')
}

/// `count(v1,v2,...,field)`: the only operator with the field last.
fn write_count<W: Write>(out: &mut W, field: Option<&str>, values: &[Value]) -> fmt::Result {
    out.write_str("count(")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.write_char(',')?;
        }
        write_value(out, value)?;
    }
    if let Some(field) = field {
        if !values.is_empty() {
            out.write_char(',')?;
        }
        out.write_str(field)?;
    }
    out.write_char(')')
}

/// No-nesting operators: tokens are written verbatim.
fn write_raw<W: Write>(
    out: &mut W,
    op: &str,
    field: Option<&str>,
    values: &[Value],
) -> fmt::Result {
    write!(out, "{}(", op)?;
    let values = values.iter().map(|v| match v {
        Value::Scalar(Scalar::Str(s)) => s.clone(),
        Value::Scalar(other) => other.to_string(),
        Value::Node(node) => node.to_string(),
    });
    let tokens = field.into_iter().map(str::to_string).chain(values);
    for (i, token) in tokens.enumerate() {
        if i > 0 {
            out.write_char(',')?;
        }
        out.write_str(&token)?;
    }
    out.write_char(')')
}

fn write_boolean<W: Write>(out: &mut W, b: &Boolean) -> fmt::Result {
    write!(out, "{}(", b.op.as_str())?;
    for (i, node) in b.values.iter().enumerate() {
        if i > 0 {
            out.write_char(',')?;
        }
        write_node(out, node)?;
    }
    out.write_char(')')
}

fn write_limit<W: Write>(out: &mut W, limit: &Limit) -> fmt::Result {
    match limit.size {
        Some(size) => write!(out, "limit({},{})", limit.from, size),
        None => write!(out, "limit({})", limit.from),
    }
}

fn write_sort<W: Write>(out: &mut W, sort: &Sort) -> fmt::Result {
    out.write_str("sort(")?;
    for (i, key) in sort.values.iter().enumerate() {
        if i > 0 {
            out.write_char(',')?;
        }
        out.write_char(key.direction.as_char())?;
        out.write_str(&key.field)?;
    }
    out.write_char(')')
}

fn write_value<W: Write>(out: &mut W, value: &Value) -> fmt::Result {
    match value {
        Value::Scalar(s) => write!(out, "{}", s),
        Value::Node(node) => write_node(out, node),
    }
}
