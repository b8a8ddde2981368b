//! Pull the SPARQL text out of a free-form model response.

use lazy_static::lazy_static;
use regex::Regex;

use super::vocabulary::Namespace;

lazy_static! {
    static ref SPARQL_FENCE: Regex = Regex::new(r"(?is)```[ \t]*sparql[ \t]*\r?\n(.*?)```").unwrap();
    static ref BARE_FENCE: Regex = Regex::new(r"(?s)```[ \t]*\r?\n(.*?)```").unwrap();
}

/// Content of the first ```` ```sparql ```` block, or of the first untagged
/// fence when no tagged one exists. Blank blocks count as missing.
pub fn extract_query(response: &str) -> Option<String> {
    [&*SPARQL_FENCE, &*BARE_FENCE]
        .iter()
        .filter_map(|re| re.captures(response))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .find(|q| !q.is_empty())
}

/// Prepend PREFIX declarations for dbr/dbo/dbp names the query uses but does not declare
pub fn with_prefixes(query: &str) -> String {
    let lower = query.to_lowercase();
    let missing: Vec<String> = Namespace::ALL
        .iter()
        .filter(|ns| query.contains(&format!("{}:", ns.prefix())))
        .filter(|ns| !lower.contains(&format!("prefix {}:", ns.prefix())))
        .map(|ns| ns.declaration())
        .collect();

    if missing.is_empty() {
        query.to_string()
    } else {
        format!("{}\n{}", missing.join("\n"), query)
    }
}
