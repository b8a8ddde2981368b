//! Deterministic query templates
//!
//! Question forms that the mapping table fully covers are answered without
//! the model. Each template only fires when its property phrase resolves to a
//! table rule and its entity phrases resolve to identifiers; anything else is
//! left to the generator.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::shape::QueryShape;
use super::vocabulary::{CityIntent, EntityRef, StructuralPattern, Target, VocabularyTable};

lazy_static! {
    static ref ROLE_CHECK: Regex =
        Regex::new(r"(?i)^(?:is|was)\s+(?P<a>.+?)\s+the\s+(?P<prop>.+?)\s+of\s+(?P<b>.+?)\s*\??$").unwrap();
    static ref CITY_COUNT: Regex =
        Regex::new(r"(?i)^how\s+many\s+cities\s+(?:are\s+there\s+|are\s+)?in\s+(?P<x>.+?)\s*\??$").unwrap();
    static ref STUDENT_TOTAL: Regex = Regex::new(
        r"(?i)^(?:how\s+many\s+students\s+(?:are\s+there\s+)?(?:at|in)|what\s+is\s+the\s+(?:total\s+)?number\s+of\s+students\s+(?:at|in|of))\s+(?P<x>.+?)\s*\??$"
    ).unwrap();
    static ref STUDENT_HAVE: Regex =
        Regex::new(r"(?i)^how\s+many\s+students\s+does\s+(?P<x>.+?)\s+have\s*\??$").unwrap();
    static ref SAME_DISTRICT: Regex = Regex::new(
        r"(?i)^which\s+universities\s+are\s+(?:located\s+)?in\s+the\s+same\s+district\s+as\s+(?P<x>.+?)\s*\??$"
    ).unwrap();
    static ref ATTRIBUTE: Regex =
        Regex::new(r"(?i)^(?:what|who)\s+(?:is|was)\s+the\s+(?P<prop>.+?)\s+of\s+(?P<x>.+?)\s*\??$").unwrap();
}

/// A query produced without the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateQuery {
    pub shape: QueryShape,
    pub text: String,
}

impl TemplateQuery {
    fn new(shape: QueryShape, text: String) -> Self {
        Self { shape, text }
    }
}

/// Try every template in turn; the first that fully resolves wins
pub fn render(question: &str, table: &VocabularyTable) -> Option<TemplateQuery> {
    let question = question.trim();
    role_check(question, table)
        .or_else(|| city_count(question, table))
        .or_else(|| student_total(question, table))
        .or_else(|| same_district(question, table))
        .or_else(|| attribute(question, table))
}

fn entity(caps: &Captures, name: &str, table: &VocabularyTable) -> Option<EntityRef> {
    table.resolve_entity(caps.name(name)?.as_str())
}

fn property_term(caps: &Captures, table: &VocabularyTable, intent: CityIntent) -> Option<String> {
    let rule = table.resolve_property(caps.name("prop")?.as_str(), intent)?;
    match rule.target {
        Target::Identifier(..) => rule.identifier().map(|id| id.sparql_term()),
        Target::Class(_) | Target::Fragment(_) => None,
    }
}

/// "Is Taipei the capital of Taiwan?"
fn role_check(question: &str, table: &VocabularyTable) -> Option<TemplateQuery> {
    let caps = ROLE_CHECK.captures(question)?;
    let value = entity(&caps, "a", table)?;
    let subject = entity(&caps, "b", table)?;
    let property = property_term(&caps, table, CityIntent::detect(question))?;

    Some(TemplateQuery::new(
        QueryShape::Boolean,
        format!(
            "ASK WHERE {{\n  {} {} {} .\n}}",
            subject.identifier.sparql_term(),
            property,
            value.identifier.sparql_term()
        ),
    ))
}

/// "How many cities are there in Taiwan?"
fn city_count(question: &str, table: &VocabularyTable) -> Option<TemplateQuery> {
    let caps = CITY_COUNT.captures(question)?;
    let place = entity(&caps, "x", table)?;
    let city = table.lookup("cities", CityIntent::Collection)?.identifier()?;

    Some(TemplateQuery::new(
        QueryShape::SelectCount,
        format!(
            "SELECT (COUNT(?city) AS ?count) WHERE {{\n  {} {} ?city .\n}}",
            place.identifier.sparql_term(),
            city.sparql_term()
        ),
    ))
}

/// "How many students are there at National Chung Hsing University?"
fn student_total(question: &str, table: &VocabularyTable) -> Option<TemplateQuery> {
    let caps = STUDENT_TOTAL
        .captures(question)
        .or_else(|| STUDENT_HAVE.captures(question))?;
    let institution = entity(&caps, "x", table)?;
    let subject = institution.identifier.sparql_term();

    Some(TemplateQuery::new(
        QueryShape::SelectCount,
        format!(
            "SELECT ((?postgrad + ?undergrad) AS ?students) WHERE {{\n  {}\n}}",
            StructuralPattern::StudentTotal.fragment(&subject)
        ),
    ))
}

/// "Which universities are in the same district as National Chung Hsing University?"
fn same_district(question: &str, table: &VocabularyTable) -> Option<TemplateQuery> {
    let caps = SAME_DISTRICT.captures(question)?;
    let anchor = entity(&caps, "x", table)?;
    let subject = anchor.identifier.sparql_term();

    Some(TemplateQuery::new(
        QueryShape::SelectList,
        format!(
            "SELECT DISTINCT ?university WHERE {{\n  {}\n}}",
            StructuralPattern::SameDistrict.fragment(&subject)
        ),
    ))
}

/// "What is the population of Taiwan?", "Who is the president of ...?"
fn attribute(question: &str, table: &VocabularyTable) -> Option<TemplateQuery> {
    let caps = ATTRIBUTE.captures(question)?;
    let subject = entity(&caps, "x", table)?;
    let property = property_term(&caps, table, CityIntent::detect(question))?;

    Some(TemplateQuery::new(
        QueryShape::SelectSingle,
        format!(
            "SELECT ?ans WHERE {{\n  {} {} ?ans .\n}}",
            subject.identifier.sparql_term(),
            property
        ),
    ))
}
