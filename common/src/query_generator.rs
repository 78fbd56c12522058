//! Compiles facet selections into the boolean query grammar understood by
//! the search server: `field:value`, `field:"quoted value"`, `AND`, `OR`,
//! `NOT` and parentheses. Precedence is always made explicit with
//! parentheses, never left to the parser.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Words to include (`+`) and exclude (`-`) for one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QueryTerms {
    #[serde(rename = "+", default)]
    pub include: Vec<String>,
    #[serde(rename = "-", default)]
    pub exclude: Vec<String>,
}

impl QueryTerms {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// Area name (facet name or search field id) -> terms.
pub type QueryData = BTreeMap<String, QueryTerms>;

/// Parses query data from JSON.
///
/// `+`/`-` must be arrays of strings; anything else is a caller bug and is
/// reported as an error instead of being coerced.
pub fn parse_query_data(json: &str) -> serde_json::Result<QueryData> {
    serde_json::from_str(json)
}

/// Wraps a value in double quotes when it contains a space and is not
/// quoted already.
fn quote_value(value: &str) -> String {
    let already_quoted = value.len() >= 2 && value.starts_with('"') && value.ends_with('"');
    if value.contains(' ') && !already_quoted {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

fn join_terms(area: &str, values: &[String]) -> String {
    values
        .iter()
        .map(|value| format!("{area}:{}", quote_value(value)))
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn parenthesize(expr: String) -> String {
    format!("({expr})")
}

/// Generates the query string for `query_data`.
///
/// With `add_parentheses_if_necessary` the result is wrapped in one more pair
/// of parentheses when more than one area contributed, so it can be
/// concatenated with another fragment safely.
pub fn generate_query(query_data: &QueryData, add_parentheses_if_necessary: bool) -> String {
    let many_areas = query_data.len() > 1;
    let mut area_queries = Vec::new();

    for (area, terms) in query_data {
        let has_include = !terms.include.is_empty();
        let has_exclude = !terms.exclude.is_empty();
        if !has_include && !has_exclude {
            continue;
        }

        let mut parts = Vec::with_capacity(2);
        if has_include {
            let mut include = join_terms(area, &terms.include);
            if terms.include.len() > 1 && (many_areas || has_exclude) {
                include = parenthesize(include);
            }
            parts.push(include);
        }
        if has_exclude {
            let mut exclude = join_terms(area, &terms.exclude);
            if terms.exclude.len() > 1 {
                exclude = parenthesize(exclude);
            }
            parts.push(format!("NOT {exclude}"));
        }

        let mut area_query = parts.join(" AND ");
        if has_include && has_exclude && many_areas {
            area_query = parenthesize(area_query);
        }
        area_queries.push(area_query);
    }

    let query = area_queries.join(" AND ");
    if add_parentheses_if_necessary && area_queries.len() > 1 {
        parenthesize(query)
    } else {
        query
    }
}

/// Whether `query` has an `OR` outside of any parentheses or quotes.
fn has_top_level_or(query: &str) -> bool {
    let mut depth = 0usize;
    let mut quoted = false;
    let mut word = String::new();
    for c in query.chars().chain(std::iter::once(' ')) {
        match c {
            '"' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            c if c.is_whitespace() => {
                if depth == 0 && !quoted && (word.eq_ignore_ascii_case("or") || word == "|") {
                    return true;
                }
                word.clear();
                continue;
            }
            _ => {}
        }
        if depth == 0 && !quoted && c != '"' && c != ')' {
            word.push(c);
        } else {
            word.clear();
        }
    }
    false
}

fn guard_disjunction(query: &str) -> String {
    if has_top_level_or(query) {
        parenthesize(query.to_string())
    } else {
        query.to_string()
    }
}

/// Joins the user's free-text query and a compiled facets fragment with `AND`.
/// Empty sides are dropped; a side with a top level `OR` is parenthesized.
pub fn merge_queries(user_query: &str, fragment: &str) -> String {
    let user_query = user_query.trim();
    let fragment = fragment.trim();
    match (user_query.is_empty(), fragment.is_empty()) {
        (true, _) => fragment.to_string(),
        (false, true) => user_query.to_string(),
        (false, false) => format!("{} AND {}", guard_disjunction(user_query), guard_disjunction(fragment)),
    }
}
