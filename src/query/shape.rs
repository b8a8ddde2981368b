//! Query Shape Classifier
//!
//! Looks at the surface form of a question (leading auxiliary or
//! interrogative, counting phrases, collection cues) and picks the SPARQL form
//! the answer needs. The list/single split is a best-effort heuristic: the
//! shape is handed to the generator as a hint, never enforced on its output.

use serde::{Deserialize, Serialize};
use std::fmt;

const AUXILIARIES: &[&str] = &[
    "is", "are", "was", "were", "am", "do", "does", "did", "has", "have", "had",
    "can", "could", "will", "would", "should",
];

const INTERROGATIVES: &[&str] = &["who", "what", "when", "where", "why", "which", "how"];

const LISTING_VERBS: &[&str] = &["list", "name", "give", "show"];

const QUANTITY_PHRASES: &[[&str; 2]] = &[["how", "many"], ["how", "much"]];

const COLLECTION_NOUNS: &[&str] = &[
    "cities", "universities", "districts", "countries", "people", "members",
];

/// Structural category of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryShape {
    Boolean,
    SelectSingle,
    SelectCount,
    SelectList,
}

impl QueryShape {
    /// Guidance line handed to the generator for this shape
    pub fn instruction(&self) -> &'static str {
        match self {
            QueryShape::Boolean => "Use an ASK WHERE { ... } query; no variable is needed.",
            QueryShape::SelectSingle => "Use a SELECT query that returns a single answer variable, placed last in the SELECT clause.",
            QueryShape::SelectCount => "Use SELECT (COUNT(?x) AS ?count) WHERE { ... } so the count is one variable.",
            QueryShape::SelectList => "Use a SELECT query whose first variable lists every matching value.",
        }
    }
}

impl fmt::Display for QueryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryShape::Boolean => write!(f, "BOOLEAN"),
            QueryShape::SelectSingle => write!(f, "SELECT_SINGLE"),
            QueryShape::SelectCount => write!(f, "SELECT_COUNT"),
            QueryShape::SelectList => write!(f, "SELECT_LIST"),
        }
    }
}

/// What in the question decided the shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeBasis {
    Auxiliary(String),
    Quantity(String),
    Interrogative(String),
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub shape: QueryShape,
    pub basis: ShapeBasis,
}

impl Classification {
    fn new(shape: QueryShape, basis: ShapeBasis) -> Self {
        Self { shape, basis }
    }

    pub fn is_fallback(&self) -> bool {
        self.basis == ShapeBasis::Fallback
    }
}

/// Lowercased word tokens, punctuation dropped. Typographic apostrophes are
/// folded to `'` so contractions stay one token.
pub(crate) fn tokenize(question: &str) -> Vec<String> {
    question
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}' || c == '-'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase().replace('\u{2019}', "'"))
        .collect()
}

/// The auxiliary a leading token stands for, contractions included
/// ("isn't" is "is", "won't" is "will", "cannot" is "can")
fn auxiliary(token: &str) -> Option<&'static str> {
    let base = match token {
        "won't" => "will",
        "can't" | "cannot" => "can",
        other => other.strip_suffix("n't").unwrap_or(other),
    };
    AUXILIARIES.iter().copied().find(|aux| *aux == base)
}

/// Pick exactly one shape for a question. Ambiguous input falls back to `SelectSingle`.
pub fn classify(question: &str) -> Classification {
    let tokens = tokenize(question);

    let quantity = tokens.windows(2).find(|pair| {
        QUANTITY_PHRASES.iter().any(|phrase| pair[0] == phrase[0] && pair[1] == phrase[1])
    });
    if let Some(pair) = quantity {
        return Classification::new(QueryShape::SelectCount, ShapeBasis::Quantity(pair.join(" ")));
    }

    let Some(lead) = tokens.first() else {
        return Classification::new(QueryShape::SelectSingle, ShapeBasis::Fallback);
    };

    if let Some(aux) = auxiliary(lead) {
        return Classification::new(QueryShape::Boolean, ShapeBasis::Auxiliary(aux.to_string()));
    }

    if INTERROGATIVES.contains(&lead.as_str()) || LISTING_VERBS.contains(&lead.as_str()) {
        let shape = if implies_collection(&tokens) {
            QueryShape::SelectList
        } else {
            QueryShape::SelectSingle
        };
        return Classification::new(shape, ShapeBasis::Interrogative(lead.clone()));
    }

    Classification::new(QueryShape::SelectSingle, ShapeBasis::Fallback)
}

fn implies_collection(tokens: &[String]) -> bool {
    let is_plural_verb = |t: Option<&String>| matches!(t.map(String::as_str), Some("are" | "were"));

    if LISTING_VERBS.contains(&tokens[0].as_str()) {
        return true;
    }
    if tokens.iter().any(|t| t == "all") {
        return true;
    }
    if tokens
        .windows(2)
        .any(|w| w[0] == "same" && (w[1] == "district" || w[1] == "city"))
    {
        return true;
    }
    // "who are ...", "which universities are ..."
    if is_plural_verb(tokens.get(1)) {
        return true;
    }
    if is_plural_verb(tokens.get(2)) && tokens.get(1).is_some_and(|t| t.ends_with('s')) {
        return true;
    }
    tokens.iter().any(|t| COLLECTION_NOUNS.contains(&t.as_str()))
}
