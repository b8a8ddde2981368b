//! Instruction block for the query generator
//!
//! The classifier rules and the mapping table are rendered from their typed
//! definitions, so the guidance the model sees never drifts from what the
//! deterministic path does.

use std::fmt::Write as _;

use super::shape::Classification;
use super::vocabulary::{EntityRef, Namespace, Resolution, RuleContext, Target, TermMatch, VocabularyTable};

const GENERAL_GUIDELINES: &str = "\
You are a helpful assistant that generates precise SPARQL queries for the DBpedia endpoint based on user questions.

**General Guidelines:**
- For Yes/No questions that start with \"Is\" or \"Are\", use an ASK WHERE query to return a boolean result.
- For questions requesting counts or totals (\"How many\", \"How much\"), use SELECT (COUNT(?x) AS ?count) WHERE { ... }.
- For questions starting with \"Who\", \"What\", \"When\", \"Where\", \"Why\", \"Which\" or \"How\", use a SELECT query to retrieve the specific information.
- For questions asking about the number of cities in a country (e.g. \"How many cities are there in Taiwan?\"), always use:
  SELECT (COUNT(?city) AS ?count) WHERE { dbr:[Country] dbp:city ?city . }";

const PREFIX_RULES: &str = "\
**Prefix Usage Rules:**
- Use \"dbr:\" for all specific names or entities (countries, cities, universities, people); join words with underscores.
- Use \"dbo:\" for standardized properties and types such as population, capital, area, official language, and classes like City or University.
- Use \"dbp:\" for non-standard attributes taken from Wikipedia infoboxes, such as leader or mayor.
- For \"city\", use dbp:city for lists or collections (counting cities within a country) and dbo:city for location relationships (an entity physically located within a city).";

const VARIABLE_RULES: &str = "\
**Query Structure and Variable Placement Rules:**
- Place the answer variable (e.g. ?ans, ?count) at the end of the SELECT clause.
- For COUNT queries use \"SELECT (COUNT(?x) AS ?count) WHERE { ... }\" so the count is a single variable.
- ASK queries need no variable.
- Reply with exactly one query inside a ```sparql fenced block.";

/// System instruction shared by every question
pub fn system_instruction(table: &VocabularyTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", GENERAL_GUIDELINES);
    let _ = writeln!(out, "{}\n", PREFIX_RULES);

    for (title, namespace) in [
        ("Entity Names", Namespace::Entity),
        ("Standardized Properties", Namespace::Ontology),
        ("Infobox Properties", Namespace::Property),
    ] {
        let _ = writeln!(out, "**{} ({}:):**", title, namespace.prefix());
        for rule in table
            .rules()
            .filter(|r| r.namespace() == Some(namespace) && r.context == RuleContext::Any && !r.is_class())
        {
            let _ = writeln!(out, "- {}", rule.describe());
        }
        out.push('\n');
    }

    let _ = writeln!(out, "**Classes ({}:):**", Namespace::Ontology.prefix());
    for rule in table.rules().filter(|r| r.is_class()) {
        let _ = writeln!(out, "- {}", rule.describe());
    }
    out.push('\n');

    let _ = writeln!(out, "**Context-Dependent Terms:**");
    for rule in table.rules().filter(|r| r.context != RuleContext::Any) {
        let _ = writeln!(out, "- {}", rule.describe());
    }
    out.push('\n');

    let _ = writeln!(out, "**Composite Concepts:**");
    for rule in table.rules().filter(|r| matches!(r.target, Target::Fragment(_))) {
        let _ = writeln!(out, "- {}", rule.describe());
    }
    out.push('\n');

    out.push_str(VARIABLE_RULES);
    out
}

/// User turn: the verbatim question followed by what the table already resolved
pub fn user_prompt(
    question: &str,
    classification: &Classification,
    terms: &[TermMatch],
    entities: &[EntityRef],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", question.trim());
    let _ = writeln!(out);
    let _ = writeln!(out, "Hints:");
    let _ = writeln!(out, "- Query shape: {}. {}", classification.shape, classification.shape.instruction());

    for term in terms {
        match term.rule.target {
            Target::Identifier(Namespace::Entity, _) | Target::Class(_) => {}
            Target::Identifier(..) => {
                if let Some(id) = term.rule.identifier() {
                    let _ = writeln!(out, "- \"{}\" -> {}", term.surface, id.prefixed());
                }
            }
            Target::Fragment(pattern) => {
                let _ = writeln!(out, "- \"{}\": {}", term.surface, pattern.description());
            }
        }
    }

    for entity in entities {
        let note = match entity.resolution {
            Resolution::Explicit => "",
            Resolution::Derived => " (derived from the name)",
        };
        let _ = writeln!(out, "- \"{}\" -> {}{}", entity.surface, entity.identifier.prefixed(), note);
    }

    out
}
