//! AST node types shared by the parser, serializer and query-object converter.
//!
//! Fields are kept as opaque strings here. Only the converter splits them into
//! `<category>.<facet>`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as Json};

use crate::{Error, Result};

/// Operators whose arguments are raw field-name tokens rather than nested operations.
pub const NO_NESTING_OPERATORS: &[&str] = &["exists", "missing", "select", "facets"];

/// Check whether an operator takes raw tokens instead of parsed arguments.
pub fn is_no_nesting(op: &str) -> bool {
    NO_NESTING_OPERATORS.contains(&op)
}

/// A leaf value: string or number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Numbers compare by value, so `22` and `22.0` are the same term.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a == b,
            (Scalar::Int(a), Scalar::Float(b)) | (Scalar::Float(b), Scalar::Int(a)) => {
                int_eq_float(*a, *b)
            }
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            _ => false,
        }
    }
}

/// Exact comparison; `i64 as f64` rounds above 2^53.
fn int_eq_float(i: i64, f: f64) -> bool {
    // 2^63 is the first float past i64::MAX
    const I64_END: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < I64_END && f as i64 == i
}

impl Scalar {
    /// Convert a JSON leaf into a scalar. Arrays, objects, booleans and null are rejected.
    pub fn from_json(value: &Json) -> Option<Self> {
        match value {
            Json::String(s) => Some(Scalar::Str(s.clone())),
            Json::Number(n) => n
                .as_i64()
                .map(Scalar::Int)
                .or_else(|| n.as_f64().map(Scalar::Float)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Scalar::Int(i) => Json::from(*i),
            Scalar::Float(f) => Json::from(*f),
            Scalar::Str(s) => Json::String(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Scalar::Int(i64::from(i))
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

/// Comparison operators that act on a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparatorOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    Exists,
    Missing,
}

impl ComparatorOp {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "eq" => ComparatorOp::Eq,
            "ne" => ComparatorOp::Ne,
            "gt" => ComparatorOp::Gt,
            "ge" => ComparatorOp::Ge,
            "lt" => ComparatorOp::Lt,
            "le" => ComparatorOp::Le,
            "in" => ComparatorOp::In,
            "exists" => ComparatorOp::Exists,
            "missing" => ComparatorOp::Missing,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparatorOp::Eq => "eq",
            ComparatorOp::Ne => "ne",
            ComparatorOp::Gt => "gt",
            ComparatorOp::Ge => "ge",
            ComparatorOp::Lt => "lt",
            ComparatorOp::Le => "le",
            ComparatorOp::In => "in",
            ComparatorOp::Exists => "exists",
            ComparatorOp::Missing => "missing",
        }
    }
}

/// Logical combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    And,
    Or,
    Not,
}

impl BooleanOp {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "and" => Some(BooleanOp::And),
            "or" => Some(BooleanOp::Or),
            "not" => Some(BooleanOp::Not),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOp::And => "and",
            BooleanOp::Or => "or",
            BooleanOp::Not => "not",
        }
    }
}

/// An argument of a comparator or generic operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Node(Node),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Node(_) => None,
        }
    }

    fn from_json(value: &Json) -> Result<Self> {
        if value.is_object() {
            return Node::from_json(value).map(Value::Node);
        }
        Scalar::from_json(value)
            .map(Value::Scalar)
            .ok_or_else(|| Error::InvalidNode(format!("unsupported value: {}", value)))
    }

    fn to_json(&self) -> Json {
        match self {
            Value::Scalar(s) => s.to_json(),
            Value::Node(n) => n.to_json(),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<Node> for Value {
    fn from(n: Node) -> Self {
        Value::Node(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s.into())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(i.into())
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Scalar(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Scalar(f.into())
    }
}

/// `op(field, v1, v2, ...)` for one of the comparison operators.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparator {
    pub op: ComparatorOp,
    pub field: Option<String>,
    pub values: Vec<Value>,
}

impl Comparator {
    pub fn new(op: ComparatorOp, field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            op,
            field: Some(field.into()),
            values,
        }
    }
}

/// `and(...)`, `or(...)`, `not(...)` over nested operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Boolean {
    pub op: BooleanOp,
    pub values: Vec<Node>,
}

/// Pagination window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    #[serde(default)]
    pub from: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Limit {
    pub fn new(from: u64, size: Option<u64>) -> Self {
        Self { from, size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "+")]
    Asc,
    #[serde(rename = "-")]
    Desc,
}

impl SortDirection {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(SortDirection::Asc),
            '-' => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            SortDirection::Asc => '+',
            SortDirection::Desc => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

impl SortField {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub values: Vec<SortField>,
}

impl Sort {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<SortField> for Sort {
    fn from(field: SortField) -> Self {
        Sort {
            values: vec![field],
        }
    }
}

/// Any operator without special handling (`select`, `facets`, `count`, unknown names).
#[derive(Debug, Clone, PartialEq)]
pub struct Generic {
    pub op: String,
    pub field: Option<String>,
    pub values: Vec<Value>,
}

/// A PQL operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Comparator(Comparator),
    Boolean(Boolean),
    Limit(Limit),
    Sort(Sort),
    Generic(Generic),
}

impl Node {
    /// Operator name as written in PQL text.
    pub fn op_name(&self) -> &str {
        match self {
            Node::Comparator(c) => c.op.as_str(),
            Node::Boolean(b) => b.op.as_str(),
            Node::Limit(_) => "limit",
            Node::Sort(_) => "sort",
            Node::Generic(g) => &g.op,
        }
    }

    /// Build a node from its JSON form (`{"op": ..., "field": ..., "values": [...]}`).
    pub fn from_json(value: &Json) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidNode(format!("expected an object, got {}", value)))?;
        let op = obj
            .get("op")
            .and_then(Json::as_str)
            .ok_or_else(|| Error::InvalidNode("missing \"op\"".to_string()))?;

        match op {
            "limit" => {
                let limit: Limit = serde_json::from_value(value.clone())?;
                Ok(Node::Limit(limit))
            }
            "sort" => {
                let values = match obj.get("values") {
                    Some(v) => serde_json::from_value(v.clone())?,
                    None => Vec::new(),
                };
                Ok(Node::Sort(Sort { values }))
            }
            _ => {
                let raw_values = json_values(obj)?;
                if let Some(bool_op) = BooleanOp::from_name(op) {
                    let values = raw_values
                        .iter()
                        .map(Node::from_json)
                        .collect::<Result<Vec<_>>>()?;
                    return Ok(Node::Boolean(Boolean {
                        op: bool_op,
                        values,
                    }));
                }

                let field = match obj.get("field") {
                    None | Some(Json::Null) => None,
                    Some(Json::String(s)) => Some(s.clone()),
                    Some(other) => {
                        return Err(Error::InvalidNode(format!(
                            "field must be a string, got {}",
                            other
                        )))
                    }
                };
                let values = raw_values
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>>>()?;

                Ok(match ComparatorOp::from_name(op) {
                    Some(cmp) => Node::Comparator(Comparator {
                        op: cmp,
                        field,
                        values,
                    }),
                    None => Node::Generic(Generic {
                        op: op.to_string(),
                        field,
                        values,
                    }),
                })
            }
        }
    }

    /// JSON form of this node.
    pub fn to_json(&self) -> Json {
        let mut obj = Map::new();
        obj.insert("op".to_string(), Json::String(self.op_name().to_string()));
        match self {
            Node::Comparator(Comparator { field, values, .. })
            | Node::Generic(Generic { field, values, .. }) => {
                if let Some(field) = field {
                    obj.insert("field".to_string(), Json::String(field.clone()));
                }
                obj.insert(
                    "values".to_string(),
                    Json::Array(values.iter().map(Value::to_json).collect()),
                );
            }
            Node::Boolean(b) => {
                obj.insert(
                    "values".to_string(),
                    Json::Array(b.values.iter().map(Node::to_json).collect()),
                );
            }
            Node::Limit(limit) => {
                obj.insert("from".to_string(), Json::from(limit.from));
                if let Some(size) = limit.size {
                    obj.insert("size".to_string(), Json::from(size));
                }
            }
            Node::Sort(sort) => {
                let values = sort
                    .values
                    .iter()
                    .map(|s| {
                        let mut entry = Map::new();
                        entry.insert("field".to_string(), Json::String(s.field.clone()));
                        entry.insert(
                            "direction".to_string(),
                            Json::String(s.direction.as_char().to_string()),
                        );
                        Json::Object(entry)
                    })
                    .collect();
                obj.insert("values".to_string(), Json::Array(values));
            }
        }
        Json::Object(obj)
    }
}

fn json_values(obj: &Map<String, Json>) -> Result<&[Json]> {
    match obj.get("values") {
        None | Some(Json::Null) => Ok(&[]),
        Some(Json::Array(items)) => Ok(items),
        Some(other) => Err(Error::InvalidNode(format!(
            "values must be an array, got {}",
            other
        ))),
    }
}

impl From<Comparator> for Node {
    fn from(c: Comparator) -> Self {
        Node::Comparator(c)
    }
}

impl From<Boolean> for Node {
    fn from(b: Boolean) -> Self {
        Node::Boolean(b)
    }
}

impl From<Limit> for Node {
    fn from(l: Limit) -> Self {
        Node::Limit(l)
    }
}

impl From<Sort> for Node {
    fn from(s: Sort) -> Self {
        Node::Sort(s)
    }
}

impl From<Generic> for Node {
    fn from(g: Generic) -> Self {
        Node::Generic(g)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Json::deserialize(deserializer)?;
        Node::from_json(&value).map_err(serde::de::Error::custom)
    }
}
