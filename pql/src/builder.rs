//! Fluent construction of PQL text from a list of edits.

use serde::{Deserialize, Serialize};

use crate::ast::{Limit, Scalar, Sort};
use crate::convert::{PqlDocument, Terms};
use crate::query::DEFAULT_MAX_DEPTH;
use crate::Result;

/// A single text-to-text edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    AddTerm {
        category: String,
        facet: String,
        term: Scalar,
    },
    RemoveTerm {
        category: String,
        facet: String,
        term: Scalar,
    },
    RemoveFacet {
        category: String,
        facet: String,
    },
    Overwrite {
        category: String,
        facet: String,
        terms: Vec<Scalar>,
    },
    IncludesFacets,
    SetLimit(Limit),
    SetSort(Sort),
}

impl Mutation {
    pub fn apply(&self, text: &str) -> Result<String> {
        let mut doc = PqlDocument::parse(text)?;
        self.apply_to(&mut doc)?;
        Ok(doc.to_pql())
    }

    /// Apply this edit to an already parsed document.
    pub fn apply_to(&self, doc: &mut PqlDocument) -> Result<()> {
        match self {
            Mutation::AddTerm {
                category,
                facet,
                term,
            } => doc.add_term(category, facet, term.clone())?,
            Mutation::RemoveTerm {
                category,
                facet,
                term,
            } => doc.remove_term(category, facet, term),
            Mutation::RemoveFacet { category, facet } => doc.remove_facet(category, facet),
            Mutation::Overwrite {
                category,
                facet,
                terms,
            } => doc.overwrite(category, facet, terms.clone())?,
            Mutation::IncludesFacets => doc.includes_facets(),
            Mutation::SetLimit(limit) => doc.set_limit(*limit),
            Mutation::SetSort(sort) => doc.set_sort(sort.clone())?,
        }
        Ok(())
    }
}

/// Fold a list of edits over some starting text.
pub fn apply_all<'a>(
    text: &str,
    mutations: impl IntoIterator<Item = &'a Mutation>,
) -> Result<String> {
    apply_all_with(text, mutations, DEFAULT_MAX_DEPTH)
}

/// [`apply_all`] with a custom parser nesting limit.
///
/// The text is parsed once and rendered once. With no edits it is returned
/// unchanged.
pub fn apply_all_with<'a>(
    text: &str,
    mutations: impl IntoIterator<Item = &'a Mutation>,
    max_depth: usize,
) -> Result<String> {
    let mut mutations = mutations.into_iter().peekable();
    if mutations.peek().is_none() {
        return Ok(text.to_string());
    }

    let mut doc = PqlDocument::parse_with(text, max_depth)?;
    for mutation in mutations {
        mutation.apply_to(&mut doc)?;
    }
    Ok(doc.to_pql())
}

/// Records edits and applies them in order on [`build`](PqlBuilder::build).
///
/// ```ignore
/// let pql = PqlBuilder::new()
///     .add_term("donor", "gender", "male")
///     .add_term("donor", "gender", "female")
///     .build()?;
/// assert_eq!(pql, r#"in(donor.gender,"male","female")"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PqlBuilder {
    initial: String,
    mutations: Vec<Mutation>,
    max_depth: Option<usize>,
}

impl PqlBuilder {
    /// Start from the empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing PQL text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            initial: text.into(),
            mutations: Vec::new(),
            max_depth: None,
        }
    }

    /// Nesting limit for parsing the starting text.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn then(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    pub fn add_term(self, category: &str, facet: &str, term: impl Into<Scalar>) -> Self {
        self.then(Mutation::AddTerm {
            category: category.to_string(),
            facet: facet.to_string(),
            term: term.into(),
        })
    }

    pub fn remove_term(self, category: &str, facet: &str, term: impl Into<Scalar>) -> Self {
        self.then(Mutation::RemoveTerm {
            category: category.to_string(),
            facet: facet.to_string(),
            term: term.into(),
        })
    }

    pub fn remove_facet(self, category: &str, facet: &str) -> Self {
        self.then(Mutation::RemoveFacet {
            category: category.to_string(),
            facet: facet.to_string(),
        })
    }

    pub fn overwrite(self, category: &str, facet: &str, terms: impl Into<Terms>) -> Self {
        let Terms(terms) = terms.into();
        self.then(Mutation::Overwrite {
            category: category.to_string(),
            facet: facet.to_string(),
            terms,
        })
    }

    pub fn includes_facets(self) -> Self {
        self.then(Mutation::IncludesFacets)
    }

    pub fn set_limit(self, limit: Limit) -> Self {
        self.then(Mutation::SetLimit(limit))
    }

    pub fn set_sort(self, sort: impl Into<Sort>) -> Self {
        self.then(Mutation::SetSort(sort.into()))
    }

    /// Apply every recorded edit to the starting text.
    pub fn build(&self) -> Result<String> {
        let max_depth = self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        apply_all_with(&self.initial, &self.mutations, max_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SortDirection, SortField};
    use crate::Error;

    #[test]
    fn test_builder_add_terms() {
        let pql = PqlBuilder::new()
            .add_term("donor", "gender", "male")
            .add_term("donor", "gender", "female")
            .build()
            .unwrap();
        assert_eq!(pql, r#"in(donor.gender,"male","female")"#);
    }

    #[test]
    fn test_empty_builder() {
        assert_eq!(PqlBuilder::new().build().unwrap(), "");
        assert_eq!(
            PqlBuilder::from_text("eq(donor.age, 22)").build().unwrap(),
            "eq(donor.age, 22)"
        );
    }

    #[test]
    fn test_builder_full_chain() {
        let pql = PqlBuilder::from_text(r#"eq(donor.age,22)"#)
            .add_term("donor", "gender", "male")
            .overwrite("donor", "age", vec![Scalar::Int(30), Scalar::Int(40)])
            .remove_term("donor", "gender", "male")
            .includes_facets()
            .set_sort(SortField::new("donor.age", SortDirection::Asc))
            .set_limit(Limit::new(0, Some(10)))
            .remove_facet("gene", "symbol")
            .build()
            .unwrap();
        assert_eq!(
            pql,
            "in(donor.age,30,40),facets(*),sort(+donor.age),limit(0,10)"
        );
    }

    #[test]
    fn test_build_is_repeatable() {
        let builder = PqlBuilder::new().add_term("donor", "gender", "male");
        assert_eq!(builder.build().unwrap(), builder.build().unwrap());
        assert_eq!(builder.mutations().len(), 1);
    }

    #[test]
    fn test_builder_propagates_errors() {
        let result = PqlBuilder::from_text("eq(donor.age,")
            .add_term("a", "b", 1)
            .build();
        assert!(matches!(result, Err(Error::Parse(_))));

        let result = PqlBuilder::new()
            .add_term("donor", "age", 1)
            .add_term("donor", "age group", 2)
            .build();
        assert!(matches!(result, Err(Error::InvalidField(_))));
    }

    #[test]
    fn test_builder_max_depth() {
        let deep = format!("{}eq(a.b,1){}", "not(".repeat(69), ")".repeat(69));
        let builder = PqlBuilder::from_text(deep.as_str()).add_term("donor", "age", 1);
        assert!(matches!(builder.build(), Err(Error::Parse(_))));

        let text = builder.max_depth(100).build().unwrap();
        assert!(text.ends_with("eq(a.b,1)))"));
        assert!(text.starts_with("eq(donor.age,1),not("));
    }

    #[test]
    fn test_mutation_json() {
        let mutation: Mutation = serde_json::from_str(
            r#"{"type": "add_term", "category": "donor", "facet": "age", "term": 22}"#,
        )
        .unwrap();
        assert_eq!(
            mutation,
            Mutation::AddTerm {
                category: "donor".to_string(),
                facet: "age".to_string(),
                term: Scalar::Int(22),
            }
        );
        assert_eq!(mutation.apply("").unwrap(), "eq(donor.age,22)");
    }

    #[test]
    fn test_apply_all() {
        let steps = [
            Mutation::IncludesFacets,
            Mutation::SetLimit(Limit::new(5, None)),
        ];
        assert_eq!(apply_all("", &steps).unwrap(), "facets(*),limit(5)");
        assert_eq!(apply_all("eq( a.b ,1)", &[] as &[Mutation]).unwrap(), "eq( a.b ,1)");
    }

    #[test]
    fn test_apply_all_matches_stepwise_apply() {
        let steps = [
            Mutation::AddTerm {
                category: "donor".to_string(),
                facet: "gender".to_string(),
                term: "male".into(),
            },
            Mutation::IncludesFacets,
            Mutation::SetSort(SortField::new("donor.age", SortDirection::Desc).into()),
            Mutation::RemoveFacet {
                category: "donor".to_string(),
                facet: "age".to_string(),
            },
        ];
        let start = r#"eq(donor.age,22),ne(x.y,1),limit(0,5)"#;
        let stepwise = steps
            .iter()
            .try_fold(start.to_string(), |text, step| step.apply(&text))
            .unwrap();
        assert_eq!(apply_all(start, &steps).unwrap(), stepwise);
    }
}
