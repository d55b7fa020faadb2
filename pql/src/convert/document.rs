//! Full view of a PQL text: filters plus everything a query object cannot hold.

use log::debug;

use crate::ast::{
    Boolean, BooleanOp, Comparator, ComparatorOp, Generic, Limit, Node, Scalar, Sort, Value,
};
use crate::convert::query_object::{
    check_bareword, check_field, check_term, split_field, QueryObject,
};
use crate::query::{to_pql, Parser, DEFAULT_MAX_DEPTH};
use crate::Result;

/// Token written into the `facets(...)` term by [`PqlDocument::includes_facets`].
pub const ALL_FACETS: &str = "*";

/// A parsed PQL text split into its parts.
///
/// Rendered back in the order: filters, extras, sort, limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PqlDocument {
    /// `eq`/`in` terms on `<category>.<facet>` fields, including those inside `and(...)`.
    pub filters: QueryObject,
    /// Every other top-level operation, in encounter order.
    pub extras: Vec<Node>,
    pub limit: Option<Limit>,
    pub sort: Option<Sort>,
}

impl PqlDocument {
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, DEFAULT_MAX_DEPTH)
    }

    /// Parse with a custom nesting limit.
    pub fn parse_with(text: &str, max_depth: usize) -> Result<Self> {
        let nodes = Parser::new(text).max_depth(max_depth).parse()?;
        Ok(Self::from_nodes(nodes))
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut doc = Self::default();
        for node in nodes {
            doc.absorb(node);
        }
        doc
    }

    fn absorb(&mut self, node: Node) {
        match node {
            Node::Limit(limit) => self.limit = Some(limit),
            Node::Sort(sort) => self.sort = Some(sort),
            // The top level is already an AND, so nested ands flatten into it
            Node::Boolean(Boolean {
                op: BooleanOp::And,
                values,
            }) => {
                for child in values {
                    self.absorb(child);
                }
            }
            Node::Comparator(c) => {
                if let Some((category, facet, terms)) = filter_terms(&c) {
                    self.filters.add_terms(&category, &facet, terms);
                } else {
                    debug!("Keeping {} as a non-filter term", c.op.as_str());
                    self.extras.push(Node::Comparator(c));
                }
            }
            other => self.extras.push(other),
        }
    }

    /// Whether an extra term with this operator name is present.
    pub fn has_extra(&self, op: &str) -> bool {
        self.extras.iter().any(|n| n.op_name() == op)
    }

    /// Add an extra term unless an identical one is already present.
    pub fn push_extra(&mut self, node: Node) {
        if !self.extras.contains(&node) {
            self.extras.push(node);
        }
    }

    pub fn add_term(&mut self, category: &str, facet: &str, term: Scalar) -> Result<()> {
        check_field(category, facet)?;
        check_term(&term)?;
        self.filters.add_term(category, facet, term);
        Ok(())
    }

    pub fn remove_term(&mut self, category: &str, facet: &str, term: &Scalar) {
        self.filters.remove_term(category, facet, term);
    }

    pub fn remove_facet(&mut self, category: &str, facet: &str) {
        self.filters.remove_facet(category, facet);
    }

    /// Replace a facet's terms; no terms removes the facet.
    pub fn overwrite(&mut self, category: &str, facet: &str, terms: Vec<Scalar>) -> Result<()> {
        check_field(category, facet)?;
        terms.iter().try_for_each(check_term)?;
        self.filters.set_terms(category, facet, terms);
        Ok(())
    }

    /// Add `facets(*)` unless some `facets` term is already present.
    pub fn includes_facets(&mut self) {
        if !self.has_extra("facets") {
            self.extras.push(Node::Generic(Generic {
                op: "facets".to_string(),
                field: None,
                values: vec![Value::from(ALL_FACETS)],
            }));
        }
    }

    pub fn set_limit(&mut self, limit: Limit) {
        self.limit = Some(limit);
    }

    /// Replace the sort term; an empty sort removes it.
    pub fn set_sort(&mut self, sort: Sort) -> Result<()> {
        for key in &sort.values {
            check_bareword(&key.field)?;
        }
        self.sort = if sort.is_empty() { None } else { Some(sort) };
        Ok(())
    }

    /// Union in another document. Its limit and sort win when present.
    pub fn merge(&mut self, other: PqlDocument) {
        self.filters = self.filters.merge(&other.filters);
        for node in other.extras {
            self.push_extra(node);
        }
        if other.limit.is_some() {
            self.limit = other.limit;
        }
        if other.sort.is_some() {
            self.sort = other.sort;
        }
    }

    pub fn to_nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::with_capacity(self.extras.len() + 3);
        nodes.extend(self.filters.to_node());
        nodes.extend(self.extras.iter().cloned());
        if let Some(sort) = &self.sort {
            nodes.push(Node::Sort(sort.clone()));
        }
        if let Some(limit) = self.limit {
            nodes.push(Node::Limit(limit));
        }
        nodes
    }

    pub fn to_pql(&self) -> String {
        to_pql(&self.to_nodes())
    }
}

/// `eq(c.f, v)` and `in(c.f, v...)` with scalar values map onto a query object.
fn filter_terms(c: &Comparator) -> Option<(String, String, Vec<Scalar>)> {
    let valid_arity = match c.op {
        ComparatorOp::Eq => c.values.len() == 1,
        ComparatorOp::In => !c.values.is_empty(),
        _ => false,
    };
    if !valid_arity {
        return None;
    }

    let (category, facet) = split_field(c.field.as_deref()?)?;
    let terms = c
        .values
        .iter()
        .map(|v| match v {
            Value::Scalar(s) => Some(s.clone()),
            Value::Node(_) => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some((category.to_string(), facet.to_string(), terms))
}
