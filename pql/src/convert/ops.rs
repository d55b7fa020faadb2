//! Text-in, text-out transformations over PQL.
//!
//! Each operation parses its input, edits a fresh [`PqlDocument`] and renders
//! it again. Limit, sort and other non-filter terms always survive an edit.

use crate::ast::{Limit, Scalar, Sort};
use crate::convert::document::PqlDocument;
use crate::convert::query_object::QueryObject;
use crate::Result;

/// One or more terms for [`overwrite`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Terms(pub Vec<Scalar>);

impl From<Scalar> for Terms {
    fn from(s: Scalar) -> Self {
        Terms(vec![s])
    }
}

impl From<Vec<Scalar>> for Terms {
    fn from(terms: Vec<Scalar>) -> Self {
        Terms(terms)
    }
}

impl From<&str> for Terms {
    fn from(s: &str) -> Self {
        Terms(vec![s.into()])
    }
}

impl From<String> for Terms {
    fn from(s: String) -> Self {
        Terms(vec![s.into()])
    }
}

impl From<i64> for Terms {
    fn from(i: i64) -> Self {
        Terms(vec![i.into()])
    }
}

impl From<i32> for Terms {
    fn from(i: i32) -> Self {
        Terms(vec![i.into()])
    }
}

impl From<f64> for Terms {
    fn from(f: f64) -> Self {
        Terms(vec![f.into()])
    }
}

fn edit(text: &str, f: impl FnOnce(&mut PqlDocument) -> Result<()>) -> Result<String> {
    let mut doc = PqlDocument::parse(text)?;
    f(&mut doc)?;
    Ok(doc.to_pql())
}

/// Parse text and keep only the `eq`/`in` filter terms.
pub fn to_query_object(text: &str) -> Result<QueryObject> {
    Ok(PqlDocument::parse(text)?.filters)
}

/// Render a query object: bare comparator for one facet, `and(...)` for more.
pub fn to_text(query: &QueryObject) -> String {
    query.to_pql()
}

pub fn add_term(
    text: &str,
    category: &str,
    facet: &str,
    term: impl Into<Scalar>,
) -> Result<String> {
    let term = term.into();
    edit(text, |doc| doc.add_term(category, facet, term))
}

pub fn remove_term(
    text: &str,
    category: &str,
    facet: &str,
    term: impl Into<Scalar>,
) -> Result<String> {
    let term = term.into();
    edit(text, |doc| {
        doc.remove_term(category, facet, &term);
        Ok(())
    })
}

pub fn remove_facet(text: &str, category: &str, facet: &str) -> Result<String> {
    edit(text, |doc| {
        doc.remove_facet(category, facet);
        Ok(())
    })
}

/// Replace all terms of a facet.
pub fn overwrite(
    text: &str,
    category: &str,
    facet: &str,
    terms: impl Into<Terms>,
) -> Result<String> {
    let Terms(terms) = terms.into();
    edit(text, |doc| doc.overwrite(category, facet, terms))
}

/// Ensure a `facets(*)` term is present. Idempotent.
pub fn includes_facets(text: &str) -> Result<String> {
    edit(text, |doc| {
        doc.includes_facets();
        Ok(())
    })
}

pub fn set_limit(text: &str, limit: Limit) -> Result<String> {
    edit(text, |doc| {
        doc.set_limit(limit);
        Ok(())
    })
}

/// Replace the sort term. An empty sort removes it.
pub fn set_sort(text: &str, sort: impl Into<Sort>) -> Result<String> {
    let sort = sort.into();
    edit(text, |doc| doc.set_sort(sort))
}

/// Current limit, or `limit(0)` when absent.
pub fn get_limit(text: &str) -> Result<Limit> {
    Ok(PqlDocument::parse(text)?.limit.unwrap_or_default())
}

/// Current sort, or an empty sort when absent.
pub fn get_sort(text: &str) -> Result<Sort> {
    Ok(PqlDocument::parse(text)?.sort.unwrap_or_default())
}

/// Filter terms only; limit, sort, facets and select are excluded.
pub fn get_filters(text: &str) -> Result<QueryObject> {
    to_query_object(text)
}

/// Union of two query objects. Shared facets keep the first operand's terms first.
pub fn merge_queries(first: &QueryObject, second: &QueryObject) -> QueryObject {
    first.merge(second)
}

/// Merge two PQL texts.
///
/// Filters are unioned. The second text's limit and sort win when present.
/// Other terms are unioned by equality.
pub fn merge_pqls(first: &str, second: &str) -> Result<String> {
    let mut merged = PqlDocument::parse(first)?;
    merged.merge(PqlDocument::parse(second)?);
    Ok(merged.to_pql())
}
