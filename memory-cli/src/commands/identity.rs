use anyhow::{anyhow, Result};
use memory_core::identity::IdentityStore;
use memory_core::types::IdentityDocKind;
use serde::Serialize;

use crate::cli::IdentityCommand;
use crate::output::{Output, OutputFormat};
use crate::runtime::Runtime;

#[derive(Serialize)]
struct DocView {
    kind: String,
    body: String,
}

impl Output for DocView {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "[{}]", self.kind)?;
        writeln!(writer, "{}", self.body)?;
        Ok(())
    }
}

fn parse_kind(s: &str) -> Result<IdentityDocKind> {
    match s.to_lowercase().replace(['-', '_'], "").as_str() {
        "identity" => Ok(IdentityDocKind::Identity),
        "userprofile" => Ok(IdentityDocKind::UserProfile),
        "preferences" => Ok(IdentityDocKind::Preferences),
        other => Err(anyhow!(
            "unknown identity document '{other}' (expected identity, user-profile, or preferences)"
        )),
    }
}

pub async fn run(command: IdentityCommand, runtime: Runtime, format: OutputFormat) -> Result<()> {
    let IdentityCommand::Show { kind } = command;
    let kind = parse_kind(&kind)?;
    let identity = IdentityStore::new(
        runtime.config.workspace_path.clone(),
        runtime.config.conversation_memory_archive_max,
    );
    let doc = identity.load(kind).await?;
    format.print(&DocView {
        kind: kind.file_name().to_string(),
        body: doc.body,
    })?;
    Ok(())
}
