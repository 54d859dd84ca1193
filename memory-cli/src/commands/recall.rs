use anyhow::Result;
use memory_core::router::RouteResult;
use serde::Serialize;

use crate::output::{Output, OutputFormat};
use crate::runtime::Runtime;

#[derive(Serialize)]
struct RecallResult {
    source: &'static str,
    count: usize,
    results: Vec<String>,
}

impl Output for RecallResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "source: {} ({} results)", self.source, self.count)?;
        for line in &self.results {
            writeln!(writer, "- {line}")?;
        }
        Ok(())
    }
}

pub async fn run(query: &str, limit: usize, runtime: Runtime, format: OutputFormat) -> Result<()> {
    let manager = runtime.manager().await?;
    let routed = manager.recall(query, Some(limit)).await?;
    let result = match routed {
        RouteResult::Facts { results, .. } => RecallResult {
            source: "facts",
            count: results.len(),
            results: results.into_iter().map(|f| f.content).collect(),
        },
        RouteResult::Semantic { results } => RecallResult {
            source: "semantic",
            count: results.len(),
            results: results.into_iter().map(|r| r.record.content).collect(),
        },
    };
    format.print(&result)?;
    Ok(())
}
