//! PQL: a compact filter query language.
//!
//! Parses PQL text into an AST, renders it back canonically, and edits
//! filters through a structured category/facet/terms query object.

pub mod ast;
pub mod builder;
pub mod config;
pub mod convert;
pub mod error;
pub mod query;
pub mod store;

pub use ast::{
    Boolean, BooleanOp, Comparator, ComparatorOp, Generic, Limit, Node, Scalar, Sort,
    SortDirection, SortField, Value,
};
pub use builder::{apply_all, apply_all_with, Mutation, PqlBuilder};
pub use config::Config;
pub use convert::{
    add_term, get_filters, get_limit, get_sort, includes_facets, merge_pqls, merge_queries,
    overwrite, remove_facet, remove_term, set_limit, set_sort, to_query_object, to_text,
    FacetTerms, PqlDocument, QueryObject, Terms,
};
pub use error::{Error, ParseError, Result};
pub use query::{parse_pql, to_pql, to_pql_json, Parser, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
pub use store::{apply_to_slot, apply_to_slot_with, FileSlot, FnSlot, MemorySlot, QuerySlot};
