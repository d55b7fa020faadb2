//! Structured category -> facet -> terms form of a filter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ast::{Boolean, BooleanOp, Comparator, ComparatorOp, Node, Scalar, Value};
use crate::query::is_bareword;
use crate::{Error, Result};

/// Terms selected for one facet. Serialized as `{"in": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetTerms {
    #[serde(rename = "in", default)]
    pub terms: Vec<Scalar>,
}

impl FacetTerms {
    /// Append unless an equal term is already present.
    pub fn push_unique(&mut self, term: Scalar) -> bool {
        if self.terms.contains(&term) {
            return false;
        }
        self.terms.push(term);
        true
    }
}

/// `{ "<category>": { "<facet>": { "in": [ ... ] } } }`
///
/// Equality ignores the order of categories and facets but not the order of
/// terms within a facet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryObject(IndexMap<String, IndexMap<String, FacetTerms>>);

impl QueryObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(category, facet, terms)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[Scalar])> {
        self.0.iter().flat_map(|(category, facets)| {
            facets
                .iter()
                .map(move |(facet, f)| (category.as_str(), facet.as_str(), f.terms.as_slice()))
        })
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn terms(&self, category: &str, facet: &str) -> Option<&[Scalar]> {
        self.0
            .get(category)
            .and_then(|facets| facets.get(facet))
            .map(|f| f.terms.as_slice())
    }

    /// Number of category/facet pairs.
    pub fn facet_count(&self) -> usize {
        self.0.values().map(IndexMap::len).sum()
    }

    /// Add a term, deduplicating by value. Returns false if it was already present.
    pub fn add_term(&mut self, category: &str, facet: &str, term: Scalar) -> bool {
        self.0
            .entry(category.to_string())
            .or_default()
            .entry(facet.to_string())
            .or_default()
            .push_unique(term)
    }

    pub fn add_terms(
        &mut self,
        category: &str,
        facet: &str,
        terms: impl IntoIterator<Item = Scalar>,
    ) {
        let bucket = self
            .0
            .entry(category.to_string())
            .or_default()
            .entry(facet.to_string())
            .or_default();
        for term in terms {
            bucket.push_unique(term);
        }
    }

    /// Remove a term, dropping the facet and category once they are empty.
    pub fn remove_term(&mut self, category: &str, facet: &str, term: &Scalar) -> bool {
        let Some(facets) = self.0.get_mut(category) else {
            return false;
        };
        let Some(bucket) = facets.get_mut(facet) else {
            return false;
        };

        let before = bucket.terms.len();
        bucket.terms.retain(|t| t != term);
        let removed = bucket.terms.len() != before;

        if bucket.terms.is_empty() {
            facets.shift_remove(facet);
        }
        if facets.is_empty() {
            self.0.shift_remove(category);
        }
        removed
    }

    /// Drop a facet regardless of how many terms it holds.
    pub fn remove_facet(&mut self, category: &str, facet: &str) -> bool {
        let Some(facets) = self.0.get_mut(category) else {
            return false;
        };
        let removed = facets.shift_remove(facet).is_some();
        if facets.is_empty() {
            self.0.shift_remove(category);
        }
        removed
    }

    /// Replace a facet's terms. An empty list removes the facet.
    pub fn set_terms(&mut self, category: &str, facet: &str, terms: Vec<Scalar>) {
        self.remove_facet(category, facet);
        if !terms.is_empty() {
            self.add_terms(category, facet, terms);
        }
    }

    /// Union of both objects; shared facets keep `self`'s terms first.
    pub fn merge(&self, other: &QueryObject) -> QueryObject {
        let mut merged = self.clone();
        for (category, facet, terms) in other.iter() {
            merged.add_terms(category, facet, terms.iter().cloned());
        }
        merged
    }

    /// One comparator per facet: `eq` for a single term, `in` for several.
    pub fn to_comparators(&self) -> Vec<Node> {
        self.iter()
            .filter(|(_, _, terms)| !terms.is_empty())
            .map(|(category, facet, terms)| {
                let op = if terms.len() == 1 {
                    ComparatorOp::Eq
                } else {
                    ComparatorOp::In
                };
                Node::Comparator(Comparator::new(
                    op,
                    format!("{}.{}", category, facet),
                    terms.iter().cloned().map(Value::Scalar).collect(),
                ))
            })
            .collect()
    }

    /// Filter node for this object: nothing, a bare comparator, or one `and(...)`.
    pub fn to_node(&self) -> Option<Node> {
        let mut comparators = self.to_comparators();
        match comparators.len() {
            0 => None,
            1 => comparators.pop(),
            _ => Some(Node::Boolean(Boolean {
                op: BooleanOp::And,
                values: comparators,
            })),
        }
    }

    pub fn to_pql(&self) -> String {
        self.to_node().map(|node| node.to_pql()).unwrap_or_default()
    }
}

/// Split `<category>.<facet>` on the first dot.
pub fn split_field(field: &str) -> Option<(&str, &str)> {
    let (category, facet) = field.split_once('.')?;
    if category.is_empty() || facet.is_empty() {
        return None;
    }
    Some((category, facet))
}

/// Reject names that would not survive a split on the first dot, or whose
/// `<category>.<facet>` field would not read back as one unquoted token.
pub(crate) fn check_field(category: &str, facet: &str) -> Result<()> {
    if category.is_empty() || facet.is_empty() {
        return Err(Error::InvalidField(format!(
            "category and facet must be non-empty (got {:?}.{:?})",
            category, facet
        )));
    }
    if category.contains('.') {
        return Err(Error::InvalidField(format!(
            "category must not contain '.': {}",
            category
        )));
    }
    check_bareword(&format!("{}.{}", category, facet))
}

/// Reject field names the parser would not read back unchanged.
pub(crate) fn check_bareword(field: &str) -> Result<()> {
    if !is_bareword(field) {
        return Err(Error::InvalidField(format!(
            "field {:?} is not a valid unquoted name",
            field
        )));
    }
    Ok(())
}

/// Non-finite floats have no PQL spelling.
pub(crate) fn check_term(term: &Scalar) -> Result<()> {
    match term {
        Scalar::Float(f) if !f.is_finite() => Err(Error::InvalidNode(format!(
            "term {} is not a finite number",
            f
        ))),
        _ => Ok(()),
    }
}
