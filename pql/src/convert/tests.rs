//! Tests for the query-object conversion and editing operations.

use serde_json::json;

use super::*;
use crate::ast::{Limit, Scalar, Sort, SortDirection, SortField};
use crate::Error;

const SAMPLE: &str =
    r#"and(in(donor.gender,"male","female"),eq(donor.age,22),eq(mutation.foo,"bar"))"#;

fn query(value: serde_json::Value) -> QueryObject {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_to_query_object() {
    assert_eq!(
        to_query_object(SAMPLE).unwrap(),
        query(json!({
            "donor": {"gender": {"in": ["male", "female"]}, "age": {"in": [22]}},
            "mutation": {"foo": {"in": ["bar"]}}
        }))
    );
}

#[test]
fn test_to_query_object_empty() {
    assert!(to_query_object("").unwrap().is_empty());
}

#[test]
fn test_to_query_object_parse_error() {
    let err = to_query_object("and(eq(donor.age,22)").unwrap_err();
    assert!(matches!(err, Error::Parse(ref e) if e.input == "and(eq(donor.age,22)"));
}

#[test]
fn test_to_text_single_and_many() {
    let single = query(json!({"donor": {"gender": {"in": ["male"]}}}));
    assert_eq!(to_text(&single), r#"eq(donor.gender,"male")"#);

    let many = query(json!({"donor": {"gender": {"in": ["male", "female"]}}}));
    assert_eq!(to_text(&many), r#"in(donor.gender,"male","female")"#);

    assert_eq!(to_text(&to_query_object(SAMPLE).unwrap()), SAMPLE);
}

#[test]
fn test_roundtrip_preserves_terms() {
    let texts = [
        SAMPLE,
        r#"eq(donor.gender,"male"),in(donor.age,1,2,3)"#,
        r#"and(eq(a.b,1),and(in(c.d,"x","y")))"#,
    ];
    for text in texts {
        let q = to_query_object(text).unwrap();
        assert_eq!(to_query_object(&to_text(&q)).unwrap(), q, "roundtrip of {}", text);
    }
}

#[test]
fn test_add_term_from_empty() {
    let text = add_term("", "donor", "gender", "male").unwrap();
    assert_eq!(text, r#"eq(donor.gender,"male")"#);

    let text = add_term(&text, "donor", "gender", "female").unwrap();
    assert_eq!(text, r#"in(donor.gender,"male","female")"#);
}

#[test]
fn test_add_term_is_idempotent() {
    let once = add_term(SAMPLE, "donor", "age", 30).unwrap();
    let twice = add_term(&once, "donor", "age", 30).unwrap();
    assert_eq!(once, twice);

    // Already present
    assert_eq!(add_term(SAMPLE, "donor", "age", 22).unwrap(), SAMPLE);
}

#[test]
fn test_add_term_new_category() {
    let text = add_term(r#"eq(donor.gender,"male")"#, "gene", "symbol", "TP53").unwrap();
    assert_eq!(text, r#"and(eq(donor.gender,"male"),eq(gene.symbol,"TP53"))"#);
}

#[test]
fn test_add_term_rejects_bad_names() {
    assert!(matches!(
        add_term("", "", "gender", "male"),
        Err(Error::InvalidField(_))
    ));
    assert!(matches!(
        add_term("", "do.nor", "gender", "male"),
        Err(Error::InvalidField(_))
    ));
    assert!(matches!(
        add_term("", "donor", "gender identity", "x"),
        Err(Error::InvalidField(_))
    ));
    assert!(matches!(
        add_term("", "2020", "x", 1),
        Err(Error::InvalidField(_))
    ));
    assert!(matches!(
        overwrite("", "donor", "a,b", "x"),
        Err(Error::InvalidField(_))
    ));
}

#[test]
fn test_written_text_parses_again() {
    let text = add_term("", "donor", "gene_id:v2", "x").unwrap();
    let text = add_term(&text, "donor", "gene_id:v2", "y").unwrap();
    let text = overwrite(&text, "gene", "go.term", "GO:0001").unwrap();
    let text = set_sort(&text, SortField::new("donor.age", SortDirection::Desc)).unwrap();

    let q = to_query_object(&text).unwrap();
    assert_eq!(
        q.terms("donor", "gene_id:v2"),
        Some(&[Scalar::from("x"), Scalar::from("y")][..])
    );
    assert_eq!(to_query_object(&to_text(&q)).unwrap(), q);
}

#[test]
fn test_set_sort_rejects_bad_fields() {
    let bad = SortField::new("donor.age,donor.id", SortDirection::Asc);
    assert!(matches!(set_sort("", bad), Err(Error::InvalidField(_))));
    assert!(matches!(
        set_sort("", SortField::new("a b", SortDirection::Desc)),
        Err(Error::InvalidField(_))
    ));
}

#[test]
fn test_out_of_range_number_is_rejected() {
    assert!(matches!(
        to_query_object("eq(donor.age,1e400)"),
        Err(Error::Parse(_))
    ));
}

#[test]
fn test_remove_terms_until_facet_gone() {
    let text = remove_term(SAMPLE, "donor", "gender", "female").unwrap();
    let text = remove_term(&text, "donor", "gender", "male").unwrap();
    assert_eq!(
        to_query_object(&text).unwrap(),
        query(json!({
            "donor": {"age": {"in": [22]}},
            "mutation": {"foo": {"in": ["bar"]}}
        }))
    );
}

#[test]
fn test_remove_term_drops_empty_category() {
    let text = remove_term(SAMPLE, "mutation", "foo", "bar").unwrap();
    assert_eq!(text, r#"and(in(donor.gender,"male","female"),eq(donor.age,22))"#);
}

#[test]
fn test_remove_term_missing_is_noop() {
    assert_eq!(remove_term(SAMPLE, "donor", "gender", "other").unwrap(), SAMPLE);
    assert_eq!(remove_term(SAMPLE, "gene", "symbol", "x").unwrap(), SAMPLE);
    assert_eq!(remove_term("", "gene", "symbol", "x").unwrap(), "");
}

#[test]
fn test_add_then_remove_is_inverse() {
    let start = r#"eq(donor.gender,"male")"#;
    let cases: [(&str, &str, Scalar); 3] = [
        ("donor", "age", Scalar::Int(40)),
        ("gene", "symbol", Scalar::from("TP53")),
        ("donor", "gender", Scalar::from("female")),
    ];
    for (category, facet, term) in cases {
        let added = add_term(start, category, facet, term.clone()).unwrap();
        let removed = remove_term(&added, category, facet, term).unwrap();
        assert_eq!(
            to_query_object(&removed).unwrap(),
            to_query_object(start).unwrap()
        );
    }
}

#[test]
fn test_remove_facet() {
    let text = remove_facet(SAMPLE, "donor", "age").unwrap();
    assert_eq!(
        to_query_object(&text).unwrap(),
        query(json!({
            "donor": {"gender": {"in": ["male", "female"]}},
            "mutation": {"foo": {"in": ["bar"]}}
        }))
    );

    let text = remove_facet(&text, "donor", "gender").unwrap();
    assert_eq!(text, r#"eq(mutation.foo,"bar")"#);
}

#[test]
fn test_overwrite() {
    let text = overwrite(SAMPLE, "donor", "gender", "unknown").unwrap();
    assert_eq!(
        to_query_object(&text).unwrap().terms("donor", "gender"),
        Some(&[Scalar::from("unknown")][..])
    );

    let text = overwrite(
        &text,
        "donor",
        "age",
        vec![Scalar::Int(30), Scalar::Int(31), Scalar::Int(30)],
    )
    .unwrap();
    assert_eq!(
        to_query_object(&text).unwrap().terms("donor", "age"),
        Some(&[Scalar::Int(30), Scalar::Int(31)][..])
    );

    let text = overwrite(&text, "donor", "age", Vec::<Scalar>::new()).unwrap();
    assert_eq!(to_query_object(&text).unwrap().terms("donor", "age"), None);
}

#[test]
fn test_overwrite_creates_facet() {
    let text = overwrite("", "gene", "symbol", "TP53").unwrap();
    assert_eq!(text, r#"eq(gene.symbol,"TP53")"#);
}

#[test]
fn test_includes_facets_is_idempotent() {
    let once = includes_facets(r#"eq(donor.gender,"male")"#).unwrap();
    assert_eq!(once, r#"eq(donor.gender,"male"),facets(*)"#);
    assert_eq!(includes_facets(&once).unwrap(), once);

    // An existing facets term is kept as-is
    let listed = includes_facets("facets(donor.gender)").unwrap();
    assert_eq!(listed, "facets(donor.gender)");
}

#[test]
fn test_limit_last_write_wins() {
    let text = set_limit(SAMPLE, Limit::new(0, Some(10))).unwrap();
    let text = set_limit(&text, Limit::new(20, Some(10))).unwrap();
    assert_eq!(get_limit(&text).unwrap(), Limit::new(20, Some(10)));
    assert_eq!(text.matches("limit(").count(), 1);
    assert!(text.ends_with("limit(20,10)"));
}

#[test]
fn test_get_limit_default() {
    assert_eq!(get_limit(SAMPLE).unwrap(), Limit { from: 0, size: None });
    assert_eq!(get_limit("").unwrap(), Limit::default());
}

#[test]
fn test_sort_last_write_wins() {
    let text = set_sort(SAMPLE, SortField::new("donor.age", SortDirection::Asc)).unwrap();
    let text = set_sort(&text, SortField::new("donor.id", SortDirection::Desc)).unwrap();
    assert_eq!(
        get_sort(&text).unwrap(),
        Sort::from(SortField::new("donor.id", SortDirection::Desc))
    );
    assert!(text.ends_with("sort(-donor.id)"));

    let cleared = set_sort(&text, Sort::default()).unwrap();
    assert_eq!(cleared, SAMPLE);
}

#[test]
fn test_get_sort_default() {
    assert!(get_sort(SAMPLE).unwrap().is_empty());
}

#[test]
fn test_edits_keep_meta_terms() {
    let text = set_limit("", Limit::new(0, Some(25))).unwrap();
    let text = set_sort(&text, SortField::new("donor.age", SortDirection::Desc)).unwrap();
    let text = includes_facets(&text).unwrap();
    let text = add_term(&text, "donor", "gender", "male").unwrap();
    let text = remove_facet(&text, "gene", "symbol").unwrap();
    assert_eq!(
        text,
        r#"eq(donor.gender,"male"),facets(*),sort(-donor.age),limit(0,25)"#
    );
}

#[test]
fn test_edits_keep_other_filters() {
    let text = r#"ne(donor.gender,"male"),or(eq(a.b,1),eq(c.d,2))"#;
    let edited = add_term(text, "donor", "age", 22).unwrap();
    assert_eq!(
        edited,
        r#"eq(donor.age,22),ne(donor.gender,"male"),or(eq(a.b,1),eq(c.d,2))"#
    );
}

#[test]
fn test_get_filters_excludes_meta_terms() {
    let text = r#"select(*),facets(*),eq(donor.age,22),sort(+donor.age),limit(0,10)"#;
    assert_eq!(
        get_filters(text).unwrap(),
        query(json!({"donor": {"age": {"in": [22]}}}))
    );
}

#[test]
fn test_merge_queries_union() {
    let a = query(json!({
        "donor": {"gender": {"in": ["male"]}, "age": {"in": [22]}}
    }));
    let b = query(json!({
        "donor": {"gender": {"in": ["female", "male"]}},
        "gene": {"symbol": {"in": ["TP53"]}}
    }));
    assert_eq!(
        merge_queries(&a, &b),
        query(json!({
            "donor": {"gender": {"in": ["male", "female"]}, "age": {"in": [22]}},
            "gene": {"symbol": {"in": ["TP53"]}}
        }))
    );
    assert_eq!(merge_queries(&a, &QueryObject::new()), a);
}

#[test]
fn test_merge_pqls() {
    let merged = merge_pqls(
        r#"eq(donor.gender,"male"),limit(0,10)"#,
        r#"in(donor.gender,"female","male"),eq(gene.symbol,"TP53"),facets(*),limit(10,10)"#,
    )
    .unwrap();
    assert_eq!(
        merged,
        r#"and(in(donor.gender,"male","female"),eq(gene.symbol,"TP53")),facets(*),limit(10,10)"#
    );
}

#[test]
fn test_merge_pqls_keeps_first_meta_when_second_has_none() {
    let merged = merge_pqls("sort(+donor.age),facets(*)", r#"eq(donor.age,22),facets(*)"#).unwrap();
    assert_eq!(merged, "eq(donor.age,22),facets(*),sort(+donor.age)");
}
