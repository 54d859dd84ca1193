use anyhow::Result;
use memory_core::facts::FactsStore;
use memory_core::storage::FactQuery;
use memory_core::types::FactType;
use serde::Serialize;

use crate::cli::FactCommand;
use crate::output::{Output, OutputFormat};
use crate::runtime::Runtime;

#[derive(Serialize)]
struct FactView {
    id: uuid::Uuid,
    fact_type: String,
    content: String,
    importance: f32,
    access_count: u64,
}

#[derive(Serialize)]
struct SearchResult {
    facts: Vec<FactView>,
}

impl Output for SearchResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        if self.facts.is_empty() {
            writeln!(writer, "no matching facts")?;
            return Ok(());
        }
        for fact in &self.facts {
            writeln!(
                writer,
                "[{:>5.2}] {:<14} {} ({})",
                fact.importance, fact.fact_type, fact.content, fact.id
            )?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct StatsResult {
    total: u64,
    average_importance: f32,
    by_type: Vec<(String, u64)>,
}

impl Output for StatsResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "total facts: {}", self.total)?;
        writeln!(writer, "average importance: {:.2}", self.average_importance)?;
        for (fact_type, count) in &self.by_type {
            if *count > 0 {
                writeln!(writer, "  {fact_type:<14} {count}")?;
            }
        }
        Ok(())
    }
}

pub async fn run(command: FactCommand, runtime: Runtime, format: OutputFormat) -> Result<()> {
    let facts = FactsStore::new(runtime.persistence.clone());
    match command {
        FactCommand::Search { text, fact_type, min_importance, limit } => {
            let fact_type = fact_type
                .map(|s| {
                    FactType::parse(&s).ok_or_else(|| anyhow::anyhow!("unknown fact type '{s}'"))
                })
                .transpose()?;
            let query = FactQuery {
                text,
                fact_type,
                session_id: None,
                min_importance,
                limit,
            };
            let results = facts.search(&query).await?;
            let facts = results
                .into_iter()
                .map(|f| FactView {
                    id: f.id,
                    fact_type: f.fact_type.as_str().to_string(),
                    content: f.content,
                    importance: f.importance,
                    access_count: f.access_count,
                })
                .collect();
            format.print(&SearchResult { facts })?;
        }
        FactCommand::Stats => {
            let stats = facts.stats().await?;
            let by_type = stats
                .by_type
                .into_iter()
                .map(|(t, count)| (t.as_str().to_string(), count))
                .collect();
            format.print(&StatsResult {
                total: stats.total,
                average_importance: stats.average_importance,
                by_type,
            })?;
        }
    }
    Ok(())
}
