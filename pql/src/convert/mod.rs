//! Conversion between PQL text and the structured query object, plus the
//! filter editing operations built on it.

mod document;
mod ops;
mod query_object;

pub use document::{PqlDocument, ALL_FACETS};
pub use ops::{
    add_term, get_filters, get_limit, get_sort, includes_facets, merge_pqls, merge_queries,
    overwrite, remove_facet, remove_term, set_limit, set_sort, to_query_object, to_text, Terms,
};
pub use query_object::{split_field, FacetTerms, QueryObject};

#[cfg(test)]
mod tests;
