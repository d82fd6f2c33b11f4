//! Terminal prompts backing interactive selection and overwrite confirmation.

use std::io::IsTerminal;
use std::path::Path;

use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use shelf_core::{Candidate, StoreError};
use shelf_store::{Chooser, Prompter};

/// Prompts on the controlling terminal.
///
/// Without a terminal on stdin, selection fails and overwrites are declined.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn interactive() -> bool {
        std::io::stdin().is_terminal()
    }
}

impl Chooser for TerminalPrompter {
    fn choose(&self, candidates: &[Candidate]) -> Result<String, StoreError> {
        if !Self::interactive() {
            return Err(StoreError::Input(
                "interactive selection needs a terminal; use --version instead".to_string(),
            ));
        }
        let labels: Vec<String> = candidates.iter().map(candidate_label).collect();
        let index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select an entry")
            .items(&labels)
            .default(labels.len().saturating_sub(1))
            .interact()
            .map_err(|e| StoreError::Input(format!("selection aborted: {e}")))?;
        Ok(index.to_string())
    }
}

impl Prompter for TerminalPrompter {
    fn confirm_overwrite(&self, path: &Path) -> Result<bool, StoreError> {
        if !Self::interactive() {
            tracing::warn!(path = %path.display(), "no terminal to confirm overwrite; keeping file");
            return Ok(false);
        }
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} exists. Overwrite?", path.display()))
            .default(false)
            .interact()
            .map_err(|e| StoreError::Input(format!("confirmation aborted: {e}")))
    }
}

fn candidate_label(candidate: &Candidate) -> String {
    let when = candidate
        .timestamp
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    match &candidate.tag {
        Some(tag) => format!("[{}] {}  {}  {}", candidate.index, candidate.name, when, tag),
        None => format!("[{}] {}  {}", candidate.index, candidate.name, when),
    }
}
