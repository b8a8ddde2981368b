use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use graph_qa::agent::LLMProvider;
use graph_qa::query::QuerySource;
use graph_qa::sparql::{Answer, GraphEndpoint, GENERATION_FAILED, NO_RESULT};
use graph_qa::{QaConfig, QaPipeline, QueryShape};

/// Answers like a model that followed the instruction block
struct SmartMockProvider {
    prompts: Mutex<Vec<(String, Option<String>)>>,
}

impl SmartMockProvider {
    fn new() -> Self {
        Self { prompts: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl LLMProvider for SmartMockProvider {
    async fn generate(&self, _model: &str, prompt: String, system: Option<String>) -> Result<String> {
        let p = prompt.to_lowercase();
        self.prompts.lock().await.push((prompt.clone(), system));

        if p.contains("capital of taiwan") {
            return Ok("```sparql\nASK WHERE { dbr:Taiwan dbo:capital dbr:Taipei . }\n```".to_string());
        }
        if p.contains("cities") && p.contains("select_count") {
            return Ok("Sure!\n```sparql\nSELECT (COUNT(?city) AS ?count) WHERE { dbr:Taiwan dbp:city ?city . }\n```".to_string());
        }
        if p.contains("universities") {
            return Ok("```sparql\nSELECT ?university WHERE { ?university a dbo:University ; dbo:city dbr:Taichung . }\n```".to_string());
        }

        Ok("I am not sure how to write that query.".to_string())
    }
}

/// A completion service that is down
struct UnavailableProvider;

#[async_trait]
impl LLMProvider for UnavailableProvider {
    async fn generate(&self, _model: &str, _prompt: String, _system: Option<String>) -> Result<String> {
        Err(anyhow::anyhow!("429 Too Many Requests"))
    }
}

/// Replays canned endpoint replies and records every query
struct ScriptedEndpoint {
    replies: Mutex<VecDeque<Result<Value>>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedEndpoint {
    fn new(replies: Vec<Result<Value>>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from(replies)),
            queries: Mutex::new(Vec::new()),
        }
    }

    async fn queries(&self) -> Vec<String> {
        self.queries.lock().await.clone()
    }
}

#[async_trait]
impl GraphEndpoint for ScriptedEndpoint {
    async fn query(&self, sparql: &str) -> Result<Value> {
        self.queries.lock().await.push(sparql.to_string());
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted reply")))
    }
}

fn build(config: QaConfig, replies: Vec<Result<Value>>) -> (QaPipeline, Arc<SmartMockProvider>, Arc<ScriptedEndpoint>) {
    let provider = Arc::new(SmartMockProvider::new());
    let endpoint = Arc::new(ScriptedEndpoint::new(replies));
    let pipeline = QaPipeline::new(config, provider.clone(), endpoint.clone());
    (pipeline, provider, endpoint)
}

#[tokio::test]
async fn test_e2e_capital_check_is_true() {
    let (pipeline, provider, endpoint) = build(QaConfig::default(), vec![Ok(json!({ "head": {}, "boolean": true }))]);

    let cycle = pipeline.ask("Is Taipei the capital of Taiwan?").await;

    assert_eq!(cycle.classification.shape, QueryShape::Boolean);
    let query = cycle.query.unwrap();
    assert_eq!(query.source, QuerySource::Template);
    assert!(query.text.contains("ASK WHERE"));
    assert!(query.text.contains("dbr:Taiwan dbo:capital dbr:Taipei"));
    assert_eq!(cycle.answer.lines(), vec!["TRUE"]);
    assert!(provider.prompts.lock().await.is_empty());
    assert_eq!(endpoint.queries().await.len(), 1);
}

#[tokio::test]
async fn test_e2e_capital_check_through_model() {
    let config = QaConfig::default().with_templates(false);
    let (pipeline, provider, endpoint) = build(config, vec![Ok(json!({ "boolean": true }))]);

    let cycle = pipeline.ask("Is Taipei the capital of Taiwan?").await;

    assert_eq!(cycle.answer, Answer::Boolean(true));
    let prompts = provider.prompts.lock().await;
    assert_eq!(prompts.len(), 1);
    let (user, system) = &prompts[0];
    assert!(user.contains("Query shape: BOOLEAN"));
    assert!(user.contains("\"capital\" -> dbo:capital"));
    assert!(user.contains("\"Taipei\" -> dbr:Taipei"));
    assert!(user.contains("\"Taiwan\" -> dbr:Taiwan"));
    assert!(system.as_deref().unwrap().contains("ASK WHERE"));

    let sent = endpoint.queries().await;
    assert!(sent[0].contains("PREFIX dbr: <http://dbpedia.org/resource/>"));
    assert!(sent[0].ends_with("ASK WHERE { dbr:Taiwan dbo:capital dbr:Taipei . }"));
}

#[tokio::test]
async fn test_e2e_city_count_uses_infobox_property() {
    let reply = json!({
        "head": { "vars": ["count"] },
        "results": { "bindings": [
            { "count": { "type": "typed-literal", "datatype": "http://www.w3.org/2001/XMLSchema#integer", "value": "22" } }
        ] }
    });

    for use_templates in [true, false] {
        let config = QaConfig::default().with_templates(use_templates);
        let (pipeline, _, endpoint) = build(config, vec![Ok(reply.clone())]);

        let cycle = pipeline.ask("How many cities are there in Taiwan?").await;

        assert_eq!(cycle.classification.shape, QueryShape::SelectCount);
        let sent = endpoint.queries().await;
        assert!(sent[0].contains("dbr:Taiwan dbp:city ?city"));
        assert!(!sent[0].contains("dbo:city"));
        assert_eq!(cycle.answer.lines(), vec!["22"]);
    }
}

#[tokio::test]
async fn test_list_answers_keep_row_order() {
    let reply = json!({
        "results": { "bindings": [
            { "university": { "type": "uri", "value": "http://dbpedia.org/resource/Feng_Chia_University" } },
            { "university": { "type": "uri", "value": "http://dbpedia.org/resource/Tunghai_University" } },
            { "university": { "type": "uri", "value": "http://dbpedia.org/resource/China_Medical_University_(Taiwan)" } }
        ] }
    });
    let (pipeline, _, _) = build(QaConfig::default(), vec![Ok(reply)]);

    let cycle = pipeline.ask("Which universities are located in Taichung?").await;

    assert_eq!(cycle.classification.shape, QueryShape::SelectList);
    assert_eq!(
        cycle.answer.lines(),
        vec![
            "http://dbpedia.org/resource/Feng_Chia_University",
            "http://dbpedia.org/resource/Tunghai_University",
            "http://dbpedia.org/resource/China_Medical_University_(Taiwan)",
        ]
    );
}

#[tokio::test]
async fn test_missing_fence_never_reaches_endpoint() {
    let (pipeline, _, endpoint) = build(QaConfig::default(), vec![Ok(json!({ "boolean": true }))]);

    let cycle = pipeline.ask("When was Taipei founded?").await;

    assert!(cycle.query.is_none());
    assert_eq!(cycle.answer.lines(), vec![GENERATION_FAILED]);
    assert!(endpoint.queries().await.is_empty());
}

#[tokio::test]
async fn test_empty_result_is_not_an_error() {
    let (pipeline, _, _) = build(QaConfig::default(), vec![Ok(json!({ "results": { "bindings": [] } }))]);

    let cycle = pipeline.ask("What is the area of Taipei?").await;

    assert_eq!(cycle.answer, Answer::NoResult);
    assert_eq!(cycle.answer.lines(), vec![NO_RESULT]);
}

#[tokio::test]
async fn test_transport_failure_is_reported_and_loop_continues() {
    let replies = vec![
        Err(anyhow::anyhow!("503 Service Unavailable")),
        Ok(json!({ "boolean": false })),
    ];
    let (pipeline, _, endpoint) = build(QaConfig::default(), replies);

    let first = pipeline.ask("What is the population of Taiwan?").await;
    assert!(matches!(first.answer, Answer::QueryFailed(ref r) if r.contains("503")));

    let second = pipeline.ask("Is Taichung the capital of Taiwan?").await;
    assert_eq!(second.answer.lines(), vec!["FALSE"]);
    assert_eq!(endpoint.queries().await.len(), 2);
}

#[tokio::test]
async fn test_strict_grounding_runs_class_typed_query() {
    let reply = json!({
        "results": { "bindings": [
            { "university": { "type": "uri", "value": "http://dbpedia.org/resource/Tunghai_University" } }
        ] }
    });
    let config = QaConfig::default().with_strict_grounding(true);
    let (pipeline, _, endpoint) = build(config, vec![Ok(reply)]);

    let cycle = pipeline.ask("Which universities are located in Taichung?").await;

    let sent = endpoint.queries().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("?university a dbo:University"));
    assert_eq!(cycle.answer.lines(), vec!["http://dbpedia.org/resource/Tunghai_University"]);
}

#[tokio::test]
async fn test_provider_error_fails_generation_without_query() {
    let endpoint = Arc::new(ScriptedEndpoint::new(vec![Ok(json!({ "boolean": true }))]));
    let pipeline = QaPipeline::new(QaConfig::default(), Arc::new(UnavailableProvider), endpoint.clone());

    let cycle = pipeline.ask("When was Taipei founded?").await;

    assert!(cycle.query.is_none());
    assert!(matches!(cycle.answer, Answer::GenerationFailed(ref r) if r.contains("429")));
    assert_eq!(cycle.answer.lines(), vec![GENERATION_FAILED]);
    assert!(endpoint.queries().await.is_empty());

    // The pipeline stays usable after the failure
    let next = pipeline.ask("Is Taipei the capital of Taiwan?").await;
    assert_eq!(next.answer, Answer::Boolean(true));
}
