use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use cookiegate_core::{Config, ConsentCategory, PartialConsents};

#[derive(Parser, Debug)]
#[command(
    name = "cookiegate",
    version,
    about = "Consent-driven cookie governance for a request's cookies"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "COOKIEGATE_CONFIG",
        help = "JSON configuration file"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "COOKIEGATE_DATABASE",
        help = "SQLite database holding the consent record"
    )]
    pub database: Option<PathBuf>,
    #[arg(long, global = true, help = "URL of the page the cookies belong to")]
    pub page_url: Option<String>,
    #[arg(
        long,
        global = true,
        help = "Parent domain cookies may be set on, e.g. example.com"
    )]
    pub cookie_domain: Option<String>,
    #[arg(long, global = true, help = "Analytics measurement id")]
    pub measurement_id: Option<String>,
    #[arg(
        long,
        global = true,
        default_value = "",
        help = "Request Cookie header, e.g. \"_ga=GA1.2; theme=dark\""
    )]
    pub cookies: String,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stored decision and whether the consent prompt is needed
    Status,
    /// Categorize the request's cookies
    Scan,
    /// Cookie count per category
    Stats,
    /// Re-apply the stored decision
    Enforce,
    /// Allow every category
    AcceptAll,
    /// Deny every non-essential category and delete its cookies
    RejectAll,
    /// Save a custom decision on top of the current one
    Custom {
        #[arg(long, value_enum)]
        allow: Vec<CategoryArg>,
        #[arg(long, value_enum)]
        deny: Vec<CategoryArg>,
    },
    /// Forget the stored decision
    Reset,
    /// Previously saved decisions, newest first
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CategoryArg {
    Essential,
    Marketing,
    Analytics,
    Functional,
}

impl From<CategoryArg> for ConsentCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Essential => ConsentCategory::Essential,
            CategoryArg::Marketing => ConsentCategory::Marketing,
            CategoryArg::Analytics => ConsentCategory::Analytics,
            CategoryArg::Functional => ConsentCategory::Functional,
        }
    }
}

/// Deny wins when a category is named on both sides
pub fn partial_consents(allow: &[CategoryArg], deny: &[CategoryArg]) -> PartialConsents {
    let mut partial = PartialConsents::new();
    for category in allow {
        partial.insert((*category).into(), true);
    }
    for category in deny {
        partial.insert((*category).into(), false);
    }
    partial
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(database) = &self.database {
            config.database_path = database.clone();
        }
        if let Some(page_url) = &self.page_url {
            config.page_url = page_url.clone();
        }
        if let Some(domain) = &self.cookie_domain {
            config.cookie_domain = Some(domain.clone());
        }
        if let Some(id) = &self.measurement_id {
            config.measurement_id = Some(id.clone());
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deny_wins() {
        let partial = partial_consents(
            &[CategoryArg::Analytics, CategoryArg::Marketing],
            &[CategoryArg::Marketing],
        );
        assert_eq!(partial.get(&ConsentCategory::Analytics), Some(&true));
        assert_eq!(partial.get(&ConsentCategory::Marketing), Some(&false));
        assert_eq!(partial.get(&ConsentCategory::Functional), None);
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "cookiegate",
            "--database",
            "/tmp/cg.db",
            "--page-url",
            "https://example.com/",
            "status",
        ]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/cg.db"));
        assert_eq!(config.page_url, "https://example.com/");
    }
}
