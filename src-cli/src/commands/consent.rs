//! Consent decision commands

use serde::Serialize;

use cookiegate_core::{ConsentMap, EnforcementReport, SaveReport, StoredConsentRecord};

use super::{emit, Render};
use crate::cli::{partial_consents, CategoryArg};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusInfo {
    pub needs_prompt: bool,
    pub record: Option<StoredConsentRecord>,
    pub consents: ConsentMap,
}

impl Render for StatusInfo {
    fn render(&self) -> String {
        let mut lines = Vec::new();
        match &self.record {
            None => lines.push("No consent decision stored, prompt required".to_string()),
            Some(record) => {
                let updated = record
                    .updated_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string());
                lines.push(format!("Decision: {} (updated {})", record.decision, updated));
            }
        }
        lines.push(render_consents(&self.consents));
        lines.join("\n")
    }
}

impl Render for SaveReport {
    fn render(&self) -> String {
        let mut lines = vec![format!("Saved decision: {}", self.record.decision)];
        if !self.persisted {
            lines.push("warning: decision could not be persisted".to_string());
        }
        lines.push(render_consents(&self.record.consents));
        lines.push(self.enforcement.render());
        lines.join("\n")
    }
}

impl Render for EnforcementReport {
    fn render(&self) -> String {
        if self.deleted.is_empty() {
            return "Nothing to delete".to_string();
        }
        let mut out = format!(
            "Deleted {} cookie(s): {}",
            self.deleted.len(),
            self.deleted.join(", ")
        );
        if self.failures > 0 {
            out.push_str(&format!(" ({} deletion write(s) failed)", self.failures));
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub struct ResetInfo {
    pub cleared: bool,
}

impl Render for ResetInfo {
    fn render(&self) -> String {
        "Consent decision cleared".to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub decision: String,
    pub consents: serde_json::Value,
    pub recorded_at: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryInfo {
    pub entries: Vec<HistoryEntry>,
}

impl Render for HistoryInfo {
    fn render(&self) -> String {
        if self.entries.is_empty() {
            return "No decisions recorded".to_string();
        }
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "#{} {} {} {}",
                    entry.id, entry.recorded_at, entry.decision, entry.consents
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_consents(consents: &ConsentMap) -> String {
    consents
        .iter()
        .map(|(category, allowed)| {
            format!(
                "  {:<10} {}",
                category.as_str(),
                if allowed { "allowed" } else { "denied" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn status(state: &AppState, json: bool) -> anyhow::Result<()> {
    let engine = state.engine();
    let info = StatusInfo {
        needs_prompt: state.needed_prompt(),
        record: engine.current(),
        consents: engine.consents(),
    };
    emit(state, json, info)
}

pub fn enforce(state: &AppState, json: bool) -> anyhow::Result<()> {
    // Set-Cookie output also covers the pass run at startup
    let report = state.engine().enforce();
    emit(state, json, report)
}

pub fn accept_all(state: &AppState, json: bool) -> anyhow::Result<()> {
    let report = state.engine().accept_all();
    emit(state, json, report)
}

pub fn reject_all(state: &AppState, json: bool) -> anyhow::Result<()> {
    let report = state.engine().reject_all();
    emit(state, json, report)
}

pub fn custom(
    state: &AppState,
    json: bool,
    allow: &[CategoryArg],
    deny: &[CategoryArg],
) -> anyhow::Result<()> {
    if allow.is_empty() && deny.is_empty() {
        anyhow::bail!("custom needs at least one --allow or --deny");
    }

    let report = state.engine().save_custom(&partial_consents(allow, deny));
    emit(state, json, report)
}

pub fn reset(state: &AppState, json: bool) -> anyhow::Result<()> {
    state.engine().reset()?;
    emit(state, json, ResetInfo { cleared: true })
}

pub fn history(state: &AppState, json: bool, limit: usize) -> anyhow::Result<()> {
    let entries = state
        .engine()
        .history(limit)?
        .into_iter()
        .map(|row| HistoryEntry {
            id: row.id,
            decision: row.decision,
            consents: serde_json::from_str(&row.consents)
                .unwrap_or(serde_json::Value::String(row.consents)),
            recorded_at: row.recorded_at.to_rfc3339(),
        })
        .collect();

    emit(state, json, HistoryInfo { entries })
}
