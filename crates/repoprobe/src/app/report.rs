//! Snapshot report rendering.

use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::model::GitSnapshot;
use crate::infra::config::Config;

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable status report.
    Text,
    /// Machine-readable JSON document.
    Json,
}

impl OutputFormat {
    /// Return a stable identifier for configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = OutputFormatParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(OutputFormatParseError::UnknownFormat(other.to_string())),
        }
    }
}

/// Error returned when parsing an [`OutputFormat`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum OutputFormatParseError {
    #[error("unknown output format '{0}'")]
    UnknownFormat(String),
}

/// Runtime options controlling report rendering.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub format: OutputFormat,
    /// Branch names that trigger a warning line. Policy belongs to the
    /// renderer, not the prober.
    pub warn_branches: Vec<String>,
}

impl ReportOptions {
    /// Build options from configuration defaults.
    pub fn from_config(config: &Config) -> Self {
        let format = <OutputFormat as FromStr>::from_str(&config.report.format())
            .unwrap_or(OutputFormat::Text);
        Self {
            format,
            warn_branches: config.report.warn_branches(),
        }
    }
}

/// Renders snapshots into reports for terminal or machine consumption.
pub struct Reporter {
    env: Environment<'static>,
}

impl Reporter {
    /// Create a new reporter with the built-in template loaded.
    pub fn new() -> Result<Self> {
        Ok(Self {
            env: default_environment()?,
        })
    }

    /// Render the snapshot using the supplied options.
    pub fn render(&self, snapshot: &GitSnapshot, options: &ReportOptions) -> Result<String> {
        match options.format {
            OutputFormat::Json => serde_json::to_string_pretty(snapshot)
                .context("failed to serialize snapshot to JSON"),
            OutputFormat::Text => {
                let context = build_template_context(snapshot, options)?;
                self.env
                    .get_template(STATUS_TEMPLATE_NAME)
                    .context("status template not registered")?
                    .render(&context)
                    .map_err(|err| anyhow!("failed to render status report: {err}"))
            }
        }
    }
}

fn default_environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template(STATUS_TEMPLATE_NAME, STATUS_TEMPLATE)
        .map_err(|err| anyhow!("failed to register status template: {err}"))?;
    Ok(env)
}

fn build_template_context(
    snapshot: &GitSnapshot,
    options: &ReportOptions,
) -> Result<TemplateContext> {
    let captured_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format capture timestamp")?;

    // The current branch is starred within the heads list; rows for absent
    // fields are omitted by the template.
    let heads = snapshot.heads.as_ref().map(|heads| {
        heads
            .iter()
            .map(|head| {
                if *head == snapshot.branch_name {
                    format!("*{head}")
                } else {
                    head.clone()
                }
            })
            .collect()
    });

    let warn = options
        .warn_branches
        .iter()
        .any(|branch| *branch == snapshot.branch_name);

    Ok(TemplateContext {
        captured_at,
        versioned: snapshot.versioned,
        branch: snapshot.branch_name.clone(),
        warn,
        last_commit: snapshot
            .last_commit_message
            .as_ref()
            .map(|message| message.trim_end().to_owned()),
        heads,
        remotes: snapshot.remotes.clone(),
        tags: snapshot.tags.clone(),
    })
}

#[derive(Serialize)]
struct TemplateContext {
    captured_at: String,
    versioned: bool,
    branch: String,
    warn: bool,
    last_commit: Option<String>,
    heads: Option<Vec<String>>,
    remotes: Option<Vec<String>>,
    tags: Option<Vec<String>>,
}

const STATUS_TEMPLATE_NAME: &str = "status";

const STATUS_TEMPLATE: &str = r#"Repository state captured at {{ captured_at }}

{% if versioned %}
Branch: {{ branch }}
{% if warn %}
Warning: you are working in the {{ branch }} branch
{% endif %}
{% if last_commit %}
Last commit: {{ last_commit }}
{% endif %}
{% if heads %}
Branches: {{ heads | join(" ") }}
{% endif %}
{% if remotes %}
Remotes: {{ remotes | join(" ") }}
{% endif %}
{% if tags %}
Tags: {{ tags | join(" ") }}
{% endif %}
{% else %}
{{ branch }}
{% endif %}
"#;
