//! Cookie inventory commands

use serde::Serialize;

use cookiegate_core::{ConsentCategory, CookieInventory, CookieStats};

use super::{emit, Render};
use crate::state::AppState;

impl Render for CookieInventory {
    fn render(&self) -> String {
        ConsentCategory::ALL
            .into_iter()
            .map(|category| {
                let names = self.get(category);
                if names.is_empty() {
                    format!("{}: -", category)
                } else {
                    let names: Vec<&str> = names.iter().map(String::as_str).collect();
                    format!("{}: {}", category, names.join(", "))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct StatsInfo {
    pub total: usize,
    pub categories: CookieStats,
}

impl Render for StatsInfo {
    fn render(&self) -> String {
        let mut lines: Vec<String> = self
            .categories
            .iter()
            .map(|(category, count)| format!("  {:<10} {}", category.as_str(), count))
            .collect();
        lines.push(format!("  {:<10} {}", "total", self.total));
        lines.join("\n")
    }
}

pub fn scan(state: &AppState, json: bool) -> anyhow::Result<()> {
    emit(state, json, state.engine().scan())
}

pub fn stats(state: &AppState, json: bool) -> anyhow::Result<()> {
    let categories = state.engine().cookie_stats();
    let total = categories.values().sum();
    emit(state, json, StatsInfo { total, categories })
}
