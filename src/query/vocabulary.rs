//! Vocabulary Mapping Table
//!
//! Hand-authored substitutions from natural-language terms to DBpedia
//! identifiers and structural query fragments. The table is declarative and
//! read-only: rules are scanned in declaration order and the first rule that
//! matches a span of the question claims it.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::shape::tokenize;
use crate::error::{QaError, QaResult};

/// Identifier namespaces of the knowledge base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Canonical entities (`dbr:`)
    Entity,
    /// Curated, standardized properties and types (`dbo:`)
    Ontology,
    /// Properties scraped from article infoboxes (`dbp:`)
    Property,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Namespace::Entity, Namespace::Ontology, Namespace::Property];

    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Entity => "dbr",
            Namespace::Ontology => "dbo",
            Namespace::Property => "dbp",
        }
    }

    pub fn base_iri(&self) -> &'static str {
        match self {
            Namespace::Entity => "http://dbpedia.org/resource/",
            Namespace::Ontology => "http://dbpedia.org/ontology/",
            Namespace::Property => "http://dbpedia.org/property/",
        }
    }

    /// `PREFIX dbr: <http://dbpedia.org/resource/>`
    pub fn declaration(&self) -> String {
        format!("PREFIX {}: <{}>", self.prefix(), self.base_iri())
    }
}

/// A namespace-qualified identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    pub namespace: Namespace,
    pub local: String,
}

impl Identifier {
    pub fn new(namespace: Namespace, local: impl Into<String>) -> Self {
        Self { namespace, local: local.into() }
    }

    pub fn prefixed(&self) -> String {
        format!("{}:{}", self.namespace.prefix(), self.local)
    }

    pub fn iri(&self) -> String {
        format!("{}{}", self.namespace.base_iri(), self.local)
    }

    /// Term usable inside a query. Local names that a prefixed name cannot
    /// carry unescaped (parentheses, commas, ...) fall back to the full IRI.
    pub fn sparql_term(&self) -> String {
        let plain = !self.local.is_empty()
            && !self.local.ends_with('.')
            && self
                .local
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.');
        if plain {
            self.prefixed()
        } else {
            format!("<{}>", self.iri())
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefixed())
    }
}

pub const DISTRICT_TYPE_IRI: &str = "http://dbpedia.org/resource/District_(Taiwan)";

/// Composite concepts that expand to more than one triple pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralPattern {
    /// Physical location: `?entity dbo:city ?place`
    LocatedIn,
    /// Entities sharing a district with the subject
    SameDistrict,
    /// Postgraduate plus undergraduate head count
    StudentTotal,
}

impl StructuralPattern {
    pub fn description(&self) -> &'static str {
        match self {
            StructuralPattern::LocatedIn =>
                "physical location: relate the entity to its place with dbo:city",
            StructuralPattern::SameDistrict =>
                "same district: bind the subject's dbo:city to ?x, match ?university dbo:city ?x, \
                 and require ?x dbo:type <http://dbpedia.org/resource/District_(Taiwan)>; \
                 do not add owl:sameAs FILTER clauses",
            StructuralPattern::StudentTotal =>
                "student count: read dbo:numberOfPostgraduateStudents and \
                 dbo:numberOfUndergraduateStudents and sum the two values",
        }
    }

    /// Triple patterns for this concept anchored on `subject`
    pub fn fragment(&self, subject: &str) -> String {
        match self {
            StructuralPattern::LocatedIn => format!("{} dbo:city ?place .", subject),
            StructuralPattern::SameDistrict => format!(
                "{} dbo:city ?x .\n  ?university dbo:city ?x .\n  ?x dbo:type <{}> .\n  FILTER (?university != {})",
                subject, DISTRICT_TYPE_IRI, subject
            ),
            StructuralPattern::StudentTotal => format!(
                "{s} dbo:numberOfPostgraduateStudents ?postgrad .\n  {s} dbo:numberOfUndergraduateStudents ?undergrad .",
                s = subject
            ),
        }
    }

    /// Identifiers the fragment relies on
    pub fn identifiers(&self) -> Vec<Identifier> {
        match self {
            StructuralPattern::LocatedIn => vec![Identifier::new(Namespace::Ontology, "city")],
            StructuralPattern::SameDistrict => vec![
                Identifier::new(Namespace::Ontology, "city"),
                Identifier::new(Namespace::Ontology, "type"),
            ],
            StructuralPattern::StudentTotal => vec![
                Identifier::new(Namespace::Ontology, "numberOfPostgraduateStudents"),
                Identifier::new(Namespace::Ontology, "numberOfUndergraduateStudents"),
            ],
        }
    }
}

/// When a rule applies, for terms whose meaning depends on the question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleContext {
    Any,
    Collection,
    Location,
}

impl RuleContext {
    fn admits(&self, intent: CityIntent) -> bool {
        match self {
            RuleContext::Any => true,
            RuleContext::Collection => intent == CityIntent::Collection,
            RuleContext::Location => intent == CityIntent::Location,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Target {
    Identifier(Namespace, &'static str),
    /// Ontology class, used as `?x a dbo:Class`
    Class(&'static str),
    Fragment(StructuralPattern),
}

/// One declarative substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MappingRule {
    pub term: &'static str,
    pub target: Target,
    pub context: RuleContext,
}

impl MappingRule {
    pub const fn entity(term: &'static str, local: &'static str) -> Self {
        Self { term, target: Target::Identifier(Namespace::Entity, local), context: RuleContext::Any }
    }

    pub const fn ontology(term: &'static str, local: &'static str) -> Self {
        Self { term, target: Target::Identifier(Namespace::Ontology, local), context: RuleContext::Any }
    }

    pub const fn property(term: &'static str, local: &'static str) -> Self {
        Self { term, target: Target::Identifier(Namespace::Property, local), context: RuleContext::Any }
    }

    pub const fn class(term: &'static str, local: &'static str) -> Self {
        Self { term, target: Target::Class(local), context: RuleContext::Any }
    }

    pub const fn pattern(term: &'static str, pattern: StructuralPattern) -> Self {
        Self { term, target: Target::Fragment(pattern), context: RuleContext::Any }
    }

    pub const fn when(mut self, context: RuleContext) -> Self {
        self.context = context;
        self
    }

    pub fn namespace(&self) -> Option<Namespace> {
        match self.target {
            Target::Identifier(ns, _) => Some(ns),
            Target::Class(_) => Some(Namespace::Ontology),
            Target::Fragment(_) => None,
        }
    }

    pub fn identifier(&self) -> Option<Identifier> {
        match self.target {
            Target::Identifier(ns, local) => Some(Identifier::new(ns, local)),
            Target::Class(local) => Some(Identifier::new(Namespace::Ontology, local)),
            Target::Fragment(_) => None,
        }
    }

    /// Class rules type a variable; they are never substituted for words
    pub fn is_class(&self) -> bool {
        matches!(self.target, Target::Class(_))
    }

    pub fn pattern_target(&self) -> Option<StructuralPattern> {
        match self.target {
            Target::Fragment(p) => Some(p),
            Target::Identifier(..) | Target::Class(_) => None,
        }
    }

    /// Rendered as a guideline line, e.g. `"capital" -> dbo:capital`
    pub fn describe(&self) -> String {
        let target = match self.target {
            Target::Identifier(ns, local) => Identifier::new(ns, local).prefixed(),
            Target::Class(local) => {
                let class = Identifier::new(Namespace::Ontology, local).prefixed();
                format!("{} (class: ?x a {})", class, class)
            }
            Target::Fragment(p) => p.description().to_string(),
        };
        match self.context {
            RuleContext::Any => format!("\"{}\" -> {}", self.term, target),
            RuleContext::Collection => format!("\"{}\" -> {} (a list or collection, e.g. counting cities within a country)", self.term, target),
            RuleContext::Location => format!("\"{}\" -> {} (an entity physically located within a city)", self.term, target),
        }
    }
}

/// Rules in priority order. Longer phrases precede the words they contain.
pub const STANDARD_RULES: &[MappingRule] = &[
    // Composite concepts
    MappingRule::pattern("same district as", StructuralPattern::SameDistrict),
    MappingRule::pattern("located in", StructuralPattern::LocatedIn),
    MappingRule::pattern("number of students", StructuralPattern::StudentTotal),
    MappingRule::pattern("students", StructuralPattern::StudentTotal),
    // Entities
    MappingRule::entity("National Chung Hsing University", "National_Chung_Hsing_University"),
    MappingRule::entity("Taiwan Comprehensive University System", "Taiwan_Comprehensive_University_System"),
    MappingRule::entity("台灣綜合大學系統", "Taiwan_Comprehensive_University_System"),
    MappingRule::entity("卓榮泰", "Cho_Jung-tai"),
    MappingRule::entity("Cho Jung-tai", "Cho_Jung-tai"),
    MappingRule::entity("Taiwan", "Taiwan"),
    MappingRule::entity("Taipei", "Taipei"),
    MappingRule::entity("Chinese", "Standard_Chinese"),
    // Standardized properties
    MappingRule::ontology("official language", "officialLanguage"),
    MappingRule::ontology("population", "populationTotal"),
    MappingRule::ontology("capital", "capital"),
    MappingRule::ontology("area", "areaTotal"),
    MappingRule::ontology("part of", "affiliation"),
    // Infobox-derived properties
    MappingRule::property("mayor", "mayor"),
    MappingRule::property("leader", "leaderName"),
    MappingRule::property("president", "president"),
    // "city" depends on what the question asks for
    MappingRule::property("cities", "city").when(RuleContext::Collection),
    MappingRule::ontology("cities", "city").when(RuleContext::Location),
    MappingRule::property("city", "city").when(RuleContext::Collection),
    MappingRule::ontology("city", "city").when(RuleContext::Location),
    // Ontology classes
    MappingRule::class("university", "University"),
    MappingRule::class("city", "City"),
    MappingRule::class("country", "Country"),
];

/// Which relation a question means by "city"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityIntent {
    /// Membership in a country's list of cities (`dbp:city`)
    Collection,
    /// Where an entity physically is (`dbo:city`)
    Location,
}

impl CityIntent {
    /// Plural "cities", or a "how many ... in <place>" question, asks for the
    /// collection; everything else is a location relation.
    pub fn detect(question: &str) -> Self {
        let tokens = tokenize(question);
        if tokens.iter().any(|t| t == "cities") {
            return CityIntent::Collection;
        }
        let counting = tokens.windows(2).any(|w| w[0] == "how" && w[1] == "many");
        if counting && tokens.iter().any(|t| t == "in") {
            return CityIntent::Collection;
        }
        CityIntent::Location
    }
}

/// How an entity identifier was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// An entity rule in the table
    Explicit,
    /// Proper name with spaces replaced by underscores
    Derived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub surface: String,
    pub identifier: Identifier,
    pub resolution: Resolution,
}

/// A rule hit inside a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermMatch {
    pub surface: String,
    pub start: usize,
    pub end: usize,
    pub rule: MappingRule,
}

struct CompiledRule {
    rule: MappingRule,
    matcher: Regex,
}

impl CompiledRule {
    fn new(rule: MappingRule) -> Self {
        let escaped = regex::escape(rule.term);
        let source = if rule.term.is_ascii() {
            format!(r"(?i)\b{}\b", escaped)
        } else {
            escaped
        };
        // Escaped literals always compile
        let matcher = Regex::new(&source).unwrap_or_else(|_| unreachable!("escaped rule term"));
        Self { rule, matcher }
    }
}

lazy_static! {
    static ref STANDARD_TABLE: VocabularyTable = VocabularyTable::new(STANDARD_RULES.to_vec());
    static ref PROPER_NAME: Regex =
        Regex::new(r"[A-Z][\w'\-]*(?:\s+(?:of\s+|de\s+|the\s+)?[A-Z][\w'\-]*)*").unwrap();
    static ref QUERY_IDENTIFIER: Regex =
        Regex::new(r"\b(dbo|dbp):([A-Za-z_][\w\-]*)|<http://dbpedia\.org/(ontology|property)/([^>\s]+)>").unwrap();
}

const LEADING_QUESTION_WORDS: &[&str] = &[
    "Is", "Are", "Was", "Were", "Do", "Does", "Did", "Has", "Have", "Can", "Who", "What",
    "When", "Where", "Why", "Which", "How", "List", "Name", "Give", "Show", "The",
    "Isn't", "Aren't", "Wasn't", "Weren't", "Doesn't", "Don't", "Didn't", "Can't",
];

pub struct VocabularyTable {
    rules: Vec<CompiledRule>,
}

impl VocabularyTable {
    pub fn new(rules: Vec<MappingRule>) -> Self {
        Self {
            rules: rules.into_iter().map(CompiledRule::new).collect(),
        }
    }

    /// The built-in DBpedia table, compiled once
    pub fn standard() -> &'static VocabularyTable {
        &STANDARD_TABLE
    }

    pub fn rules(&self) -> impl Iterator<Item = &MappingRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    /// Exact (case-insensitive) term lookup; first admissible rule wins
    pub fn lookup(&self, term: &str, intent: CityIntent) -> Option<&MappingRule> {
        let term = term.trim();
        self.rules()
            .filter(|r| !r.is_class())
            .find(|r| r.term.eq_ignore_ascii_case(term) && r.context.admits(intent))
    }

    /// Every rule occurrence in the question, ordered by position.
    /// A span claimed by an earlier rule is not matched again.
    pub fn scan(&self, question: &str) -> Vec<TermMatch> {
        let intent = CityIntent::detect(question);
        let mut matches: Vec<TermMatch> = Vec::new();

        for compiled in self
            .rules
            .iter()
            .filter(|c| !c.rule.is_class() && c.rule.context.admits(intent))
        {
            for m in compiled.matcher.find_iter(question) {
                let overlaps = matches.iter().any(|t| m.start() < t.end && t.start < m.end());
                if !overlaps {
                    matches.push(TermMatch {
                        surface: m.as_str().to_string(),
                        start: m.start(),
                        end: m.end(),
                        rule: compiled.rule,
                    });
                }
            }
        }

        matches.sort_by_key(|t| t.start);
        matches
    }

    /// Resolve an entity phrase: table rule first, then a derived name for proper nouns
    pub fn resolve_entity(&self, phrase: &str) -> Option<EntityRef> {
        let phrase = strip_article(strip_sentence_end(phrase));
        if phrase.is_empty() || phrase.contains(IRI_EXCLUDED) {
            return None;
        }

        if let Some(rule) = self
            .rules()
            .find(|r| r.namespace() == Some(Namespace::Entity) && r.term.eq_ignore_ascii_case(phrase))
        {
            return rule.identifier().map(|identifier| EntityRef {
                surface: phrase.to_string(),
                identifier,
                resolution: Resolution::Explicit,
            });
        }

        let first = phrase.chars().next()?;
        if !(first.is_uppercase() || (!first.is_ascii() && first.is_alphabetic())) {
            return None;
        }

        let local = phrase.split_whitespace().collect::<Vec<_>>().join("_");
        Some(EntityRef {
            surface: phrase.to_string(),
            identifier: Identifier::new(Namespace::Entity, local),
            resolution: Resolution::Derived,
        })
    }

    /// Resolve a property phrase ("capital", "the population") to a non-entity rule
    pub fn resolve_property(&self, phrase: &str, intent: CityIntent) -> Option<&MappingRule> {
        let phrase = strip_article(phrase.trim());
        self.lookup(phrase, intent)
            .filter(|r| r.namespace() != Some(Namespace::Entity))
    }

    /// Entities mentioned in the question: table hits plus capitalized names
    /// the table does not cover
    pub fn entities(&self, question: &str) -> Vec<EntityRef> {
        let matches = self.scan(question);
        let mut entities: Vec<(usize, EntityRef)> = matches
            .iter()
            .filter(|t| t.rule.namespace() == Some(Namespace::Entity))
            .filter_map(|t| {
                t.rule.identifier().map(|identifier| {
                    (t.start, EntityRef {
                        surface: t.surface.clone(),
                        identifier,
                        resolution: Resolution::Explicit,
                    })
                })
            })
            .collect();

        for m in PROPER_NAME.find_iter(question) {
            let mut start = m.start();
            let mut text = m.as_str();
            if let Some(first) = text.split_whitespace().next() {
                if LEADING_QUESTION_WORDS.contains(&first) {
                    let rest = text[first.len()..].trim_start();
                    start = m.end() - rest.len();
                    text = rest;
                }
            }
            if text.is_empty() {
                continue;
            }
            let end = start + text.len();
            if matches.iter().any(|t| start < t.end && t.start < end) {
                continue;
            }
            if let Some(entity) = self.resolve_entity(text) {
                entities.push((start, entity));
            }
        }

        entities.sort_by_key(|(start, _)| *start);
        entities.into_iter().map(|(_, e)| e).collect()
    }

    /// `dbo:`/`dbp:` identifiers the table can vouch for
    pub fn known_identifiers(&self) -> BTreeSet<Identifier> {
        let mut known = BTreeSet::new();
        known.insert(Identifier::new(Namespace::Ontology, "type"));
        for rule in self.rules() {
            match rule.target {
                Target::Identifier(Namespace::Entity, _) => {}
                Target::Identifier(ns, local) => {
                    known.insert(Identifier::new(ns, local));
                }
                Target::Class(local) => {
                    known.insert(Identifier::new(Namespace::Ontology, local));
                }
                Target::Fragment(p) => known.extend(p.identifiers()),
            }
        }
        known
    }

    /// Fail with every property identifier in `query` that no rule produces
    pub fn check_grounding(&self, query: &str) -> QaResult<()> {
        let known = self.known_identifiers();
        let mut unknown = BTreeSet::new();

        for caps in QUERY_IDENTIFIER.captures_iter(query) {
            let (ns, local) = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
                (Some(p), Some(l), _, _) => (p.as_str(), l.as_str()),
                (_, _, Some(p), Some(l)) => (if p.as_str() == "ontology" { "dbo" } else { "dbp" }, l.as_str()),
                _ => continue,
            };
            let namespace = if ns == "dbo" { Namespace::Ontology } else { Namespace::Property };
            let identifier = Identifier::new(namespace, local);
            if !known.contains(&identifier) {
                unknown.insert(identifier.prefixed());
            }
        }

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(QaError::Ungrounded(unknown.into_iter().collect()))
        }
    }
}

/// Characters an IRI reference cannot carry unescaped
const IRI_EXCLUDED: [char; 9] = ['{', '}', '"', '<', '>', '\\', '|', '^', '`'];

/// Drop one closing `?` or `!`, and a closing `.` unless it ends an
/// abbreviation such as "D.C."
fn strip_sentence_end(phrase: &str) -> &str {
    let phrase = phrase.trim();
    let phrase = phrase.strip_suffix(['?', '!']).unwrap_or(phrase).trim_end();
    match phrase.strip_suffix('.') {
        Some(rest) => {
            let last_word = rest.rsplit(char::is_whitespace).next().unwrap_or(rest);
            if last_word.contains('.') {
                phrase
            } else {
                rest.trim_end()
            }
        }
        None => phrase,
    }
}

fn strip_article(phrase: &str) -> &str {
    match phrase.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("the ") => phrase[4..].trim_start(),
        _ => phrase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> &'static VocabularyTable {
        VocabularyTable::standard()
    }

    #[test]
    fn test_namespaces_render_prefixes() {
        assert_eq!(Namespace::Entity.declaration(), "PREFIX dbr: <http://dbpedia.org/resource/>");
        let id = Identifier::new(Namespace::Ontology, "populationTotal");
        assert_eq!(id.prefixed(), "dbo:populationTotal");
        assert_eq!(id.iri(), "http://dbpedia.org/ontology/populationTotal");
    }

    #[test]
    fn test_sparql_term_falls_back_to_iri() {
        assert_eq!(Identifier::new(Namespace::Entity, "Cho_Jung-tai").sparql_term(), "dbr:Cho_Jung-tai");
        assert_eq!(
            Identifier::new(Namespace::Entity, "District_(Taiwan)").sparql_term(),
            "<http://dbpedia.org/resource/District_(Taiwan)>"
        );
    }

    #[test]
    fn test_lookup_by_namespace() {
        let rule = table().lookup("Population", CityIntent::Location).unwrap();
        assert_eq!(rule.identifier().unwrap().prefixed(), "dbo:populationTotal");
        let rule = table().lookup("mayor", CityIntent::Location).unwrap();
        assert_eq!(rule.namespace(), Some(Namespace::Property));
        let rule = table().lookup("leader", CityIntent::Location).unwrap();
        assert_eq!(rule.identifier().unwrap().prefixed(), "dbp:leaderName");
        assert!(table().lookup("governor", CityIntent::Location).is_none());
    }

    #[test]
    fn test_city_branches_on_intent() {
        let collection = table().lookup("city", CityIntent::Collection).unwrap();
        assert_eq!(collection.identifier().unwrap().prefixed(), "dbp:city");
        let location = table().lookup("city", CityIntent::Location).unwrap();
        assert_eq!(location.identifier().unwrap().prefixed(), "dbo:city");
    }

    #[test]
    fn test_city_intent_detection() {
        assert_eq!(CityIntent::detect("How many cities are there in Taiwan?"), CityIntent::Collection);
        assert_eq!(CityIntent::detect("How many universities are in Taichung?"), CityIntent::Collection);
        assert_eq!(CityIntent::detect("Which city is National Chung Hsing University located in?"), CityIntent::Location);
    }

    #[test]
    fn test_scan_prefers_longer_phrases() {
        let hits = table().scan("Is National Chung Hsing University part of Taiwan Comprehensive University System?");
        let targets: Vec<String> = hits
            .iter()
            .filter_map(|t| t.rule.identifier())
            .map(|i| i.prefixed())
            .collect();
        assert_eq!(
            targets,
            vec![
                "dbr:National_Chung_Hsing_University",
                "dbo:affiliation",
                "dbr:Taiwan_Comprehensive_University_System",
            ]
        );
    }

    #[test]
    fn test_scan_resolves_cities_in_count_question() {
        let hits = table().scan("How many cities are there in Taiwan?");
        let city = hits.iter().find(|t| t.surface == "cities").unwrap();
        assert_eq!(city.rule.identifier().unwrap().prefixed(), "dbp:city");
    }

    #[test]
    fn test_scan_structural_rules() {
        let hits = table().scan("What is the number of students at National Chung Hsing University?");
        assert_eq!(hits[0].rule.pattern_target(), Some(StructuralPattern::StudentTotal));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_scan_non_ascii_terms() {
        let hits = table().scan("卓榮泰是誰?");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].rule.identifier().unwrap().prefixed(), "dbr:Cho_Jung-tai");
    }

    #[test]
    fn test_resolve_entity_explicit_and_derived() {
        let e = table().resolve_entity("Chinese").unwrap();
        assert_eq!(e.identifier.prefixed(), "dbr:Standard_Chinese");
        assert_eq!(e.resolution, Resolution::Explicit);

        let e = table().resolve_entity("the University of Taipei").unwrap();
        assert_eq!(e.identifier.prefixed(), "dbr:University_of_Taipei");
        assert_eq!(e.resolution, Resolution::Derived);

        assert!(table().resolve_entity("something vague").is_none());
    }

    #[test]
    fn test_resolve_entity_keeps_abbreviation_dots() {
        let e = table().resolve_entity("Washington, D.C.?").unwrap();
        assert_eq!(e.identifier.local, "Washington,_D.C.");
        assert_eq!(e.identifier.sparql_term(), "<http://dbpedia.org/resource/Washington,_D.C.>");

        assert_eq!(table().resolve_entity("Taiwan.").unwrap().identifier.prefixed(), "dbr:Taiwan");
        assert_eq!(table().resolve_entity("Kaohsiung!").unwrap().identifier.prefixed(), "dbr:Kaohsiung");
    }

    #[test]
    fn test_resolve_entity_rejects_iri_excluded_characters() {
        assert!(table().resolve_entity("Foo {Bar}?").is_none());
        assert!(table().resolve_entity("Taipei <script>").is_none());
        assert!(table().resolve_entity("A|B").is_none());
    }

    #[test]
    fn test_class_rules_ground_but_never_substitute() {
        let query = "SELECT ?u WHERE { ?u a dbo:University ; dbo:city dbr:Taichung . }";
        tokio_test::assert_ok!(table().check_grounding(query));
        tokio_test::assert_ok!(table().check_grounding("ASK { dbr:Taipei a dbo:City . dbr:Taiwan a dbo:Country . }"));

        let hits = table().scan("Which university is in Taichung?");
        assert!(hits.iter().all(|t| !t.rule.is_class()));
        assert!(table().lookup("university", CityIntent::Location).is_none());
        let city = table().lookup("city", CityIntent::Location).unwrap();
        assert_eq!(city.identifier().unwrap().prefixed(), "dbo:city");
    }

    #[test]
    fn test_entities_in_question() {
        let entities = table().entities("Is Kaohsiung the capital of Taiwan?");
        let ids: Vec<String> = entities.iter().map(|e| e.identifier.prefixed()).collect();
        assert_eq!(ids, vec!["dbr:Kaohsiung", "dbr:Taiwan"]);
        assert_eq!(entities[0].resolution, Resolution::Derived);

        let entities = table().entities("Isn't Kaohsiung the capital of Taiwan?");
        assert_eq!(entities[0].identifier.prefixed(), "dbr:Kaohsiung");
    }

    #[test]
    fn test_grounding_accepts_table_identifiers() {
        let query = "SELECT ?u WHERE { dbr:X dbo:city ?x . ?u dbo:city ?x . ?x dbo:type <http://dbpedia.org/resource/District_(Taiwan)> . }";
        tokio_test::assert_ok!(table().check_grounding(query));
        tokio_test::assert_ok!(table().check_grounding("SELECT (COUNT(?c) AS ?count) WHERE { dbr:Taiwan dbp:city ?c . }"));
    }

    #[test]
    fn test_grounding_rejects_unknown_identifiers() {
        let query = "SELECT ?g WHERE { dbr:Taiwan dbp:governor ?g . dbr:Taiwan <http://dbpedia.org/ontology/anthem> ?a . }";
        match table().check_grounding(query) {
            Err(QaError::Ungrounded(ids)) => assert_eq!(ids, vec!["dbo:anthem", "dbp:governor"]),
            other => panic!("expected ungrounded, got {:?}", other),
        }
    }

    #[test]
    fn test_rule_description() {
        let rule = table().lookup("cities", CityIntent::Collection).unwrap();
        assert!(rule.describe().starts_with("\"cities\" -> dbp:city"));
    }
}
