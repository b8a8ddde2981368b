//! Knowledge-Graph Question Answering
//!
//! Interactive loop: read a question, translate it into SPARQL, run it
//! against DBpedia, print the answer. One question at a time.

use anyhow::Result;
use std::io::{self, Write};
use tracing::info;

use graph_qa::utils::init_logging;
use graph_qa::{QaConfig, QaPipeline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    init_logging()?;

    let config = QaConfig::from_env()?;
    info!(
        "Endpoint {} | provider {:?} ({}) | templates {} | strict grounding {}",
        config.endpoint, config.provider, config.model, config.use_templates, config.strict_grounding
    );

    let pipeline = QaPipeline::from_config(config)?;

    println!("Welcome! Ask me a question (e.g., 'What is the population of Taiwan?')");
    println!("Type 'quit' to leave.\n");

    loop {
        print!("Q: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let question = input.trim();

        if question.is_empty() {
            continue;
        }

        if matches!(question.to_lowercase().as_str(), "quit" | "exit" | "q") {
            println!("Goodbye!");
            break;
        }

        let cycle = pipeline.ask(question).await;

        if let Some(query) = &cycle.query {
            println!("Generated SPARQL Query:\n{}", query.text);
        }
        for line in cycle.answer.lines() {
            if cycle.answer.has_data() {
                println!("Answer: {}", line);
            } else {
                println!("{}", line);
            }
        }
        println!();
    }

    Ok(())
}
