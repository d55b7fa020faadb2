//! CLI command implementations.

use log::debug;
use pql::config::is_valid_slot_name;
use pql::{
    apply_to_slot_with, to_pql, Config, Error, FileSlot, Limit, Mutation, PqlDocument, QuerySlot,
    Scalar, Sort, SortDirection, SortField,
};

/// Config plus the file slot selected by `--slot` or config.toml.
fn open(slot: Option<&str>) -> pql::Result<(Config, FileSlot)> {
    let config = Config::load()?;
    let name = slot.unwrap_or(&config.slot);
    if !is_valid_slot_name(name) {
        return Err(Error::Config(format!("Invalid slot name: {:?}", name)));
    }
    let file = FileSlot::named(&config, name);
    debug!("Using query slot {}", file.path().display());
    Ok((config, file))
}

/// Parse with the configured nesting limit.
fn parse_checked(config: &Config, text: &str) -> pql::Result<Vec<pql::Node>> {
    Ok(pql::Parser::new(text).max_depth(config.max_depth).parse()?)
}

/// Interpret a command-line term: integers and finite floats become numbers.
pub fn parse_term(raw: &str) -> Scalar {
    if let Ok(i) = raw.parse::<i64>() {
        return Scalar::Int(i);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Scalar::Float(f),
        _ => Scalar::Str(raw.to_string()),
    }
}

/// Interpret `+field` / `-field`.
pub fn parse_sort_key(raw: &str) -> pql::Result<SortField> {
    let mut chars = raw.chars();
    let direction = chars
        .next()
        .and_then(SortDirection::from_char)
        .ok_or_else(|| {
            Error::InvalidField(format!("sort key must start with '+' or '-': {}", raw))
        })?;
    let field = chars.as_str();
    if field.is_empty() {
        return Err(Error::InvalidField(format!("missing sort field in {:?}", raw)));
    }
    Ok(SortField::new(field, direction))
}

/// Apply edits to the current slot and print the result.
fn edit(slot: Option<&str>, mutations: &[Mutation]) -> pql::Result<()> {
    let (config, mut file) = open(slot)?;
    let text = apply_to_slot_with(&mut file, mutations, config.max_depth)?;
    println!("{}", text);
    Ok(())
}

pub fn parse(text: &str) -> pql::Result<()> {
    let config = Config::load()?;
    let nodes = parse_checked(&config, text)?;
    println!("{}", serde_json::to_string_pretty(&nodes)?);
    Ok(())
}

pub fn format(text: &str) -> pql::Result<()> {
    let config = Config::load()?;
    let nodes = parse_checked(&config, text)?;
    println!("{}", to_pql(&nodes));
    Ok(())
}

pub fn show(slot: Option<&str>) -> pql::Result<()> {
    let (_, file) = open(slot)?;
    println!("{}", file.load_current()?);
    Ok(())
}

pub fn filters(slot: Option<&str>, text: Option<&str>) -> pql::Result<()> {
    let (config, file) = open(slot)?;
    let text = match text {
        Some(t) => t.to_string(),
        None => file.load_current()?,
    };
    let doc = PqlDocument::parse_with(&text, config.max_depth)?;
    println!("{}", serde_json::to_string_pretty(&doc.filters)?);
    Ok(())
}

pub fn add(
    slot: Option<&str>,
    category: &str,
    facet: &str,
    terms: &[String],
) -> pql::Result<()> {
    let mutations: Vec<_> = terms
        .iter()
        .map(|t| Mutation::AddTerm {
            category: category.to_string(),
            facet: facet.to_string(),
            term: parse_term(t),
        })
        .collect();
    edit(slot, &mutations)
}

pub fn remove(
    slot: Option<&str>,
    category: &str,
    facet: &str,
    terms: &[String],
) -> pql::Result<()> {
    let mutations: Vec<_> = terms
        .iter()
        .map(|t| Mutation::RemoveTerm {
            category: category.to_string(),
            facet: facet.to_string(),
            term: parse_term(t),
        })
        .collect();
    edit(slot, &mutations)
}

pub fn remove_facet(slot: Option<&str>, category: &str, facet: &str) -> pql::Result<()> {
    edit(
        slot,
        &[Mutation::RemoveFacet {
            category: category.to_string(),
            facet: facet.to_string(),
        }],
    )
}

pub fn overwrite(
    slot: Option<&str>,
    category: &str,
    facet: &str,
    terms: &[String],
) -> pql::Result<()> {
    edit(
        slot,
        &[Mutation::Overwrite {
            category: category.to_string(),
            facet: facet.to_string(),
            terms: terms.iter().map(|t| parse_term(t)).collect(),
        }],
    )
}

pub fn facets(slot: Option<&str>) -> pql::Result<()> {
    edit(slot, &[Mutation::IncludesFacets])
}

pub fn limit(slot: Option<&str>, from: u64, size: Option<u64>) -> pql::Result<()> {
    edit(slot, &[Mutation::SetLimit(Limit::new(from, size))])
}

pub fn sort(slot: Option<&str>, keys: &[String]) -> pql::Result<()> {
    let values = keys
        .iter()
        .map(|k| parse_sort_key(k))
        .collect::<pql::Result<Vec<_>>>()?;
    edit(slot, &[Mutation::SetSort(Sort { values })])
}

pub fn merge(slot: Option<&str>, text: &str) -> pql::Result<()> {
    let (config, mut file) = open(slot)?;
    let mut doc = PqlDocument::parse_with(&file.load_current()?, config.max_depth)?;
    doc.merge(PqlDocument::parse_with(text, config.max_depth)?);
    let merged = doc.to_pql();
    file.save_current(&merged)?;
    println!("{}", merged);
    Ok(())
}

pub fn clear(slot: Option<&str>) -> pql::Result<()> {
    let (_, mut file) = open(slot)?;
    file.clear()
}

pub fn config() -> pql::Result<()> {
    let config = Config::load()?;
    println!("root = {}", config.root.display());
    println!("slot = {}", config.slot);
    println!("max_depth = {}", config.max_depth);
    Ok(())
}
