//! Doctor - Dependency and configuration checking

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::backends::rg::is_rg_available;
use crate::core::config::Config;
use crate::core::render::{OutputFormat, RenderConfig};

static RG_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ripgrep (\d+\.\d+\.\d+)").expect("Invalid RG_VERSION regex"));

/// Dependency status
#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatus {
    pub name: String,
    pub available: bool,
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DependencyStatus {
    fn summary_line(&self) -> String {
        let status = if self.available { "✓" } else { "✗" };
        let required = if self.required {
            "required"
        } else {
            "optional"
        };

        let mut line = format!(
            "{} {} ({}) - {}",
            status,
            self.name,
            required,
            self.command
                .as_ref()
                .map(|c| format!("found: {}", c))
                .unwrap_or_else(|| "not found".to_string())
        );
        if let Some(version) = &self.version {
            line.push_str(&format!(" [{}]", version));
        }
        if let Some(notes) = &self.notes {
            line.push_str(&format!("\n  Note: {}", notes));
        }
        line
    }
}

/// Extract the version number from `rg --version` output
pub fn parse_version(output: &str) -> Option<String> {
    RG_VERSION
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn query_version(program: &Path) -> Option<String> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    parse_version(&String::from_utf8_lossy(&output.stdout))
}

/// Check the configured search executable
pub fn check_search_tool(program: &Path) -> DependencyStatus {
    let available = is_rg_available(program);
    DependencyStatus {
        name: "ripgrep".to_string(),
        available,
        command: available.then(|| program.display().to_string()),
        version: if available {
            query_version(program)
        } else {
            None
        },
        required: true,
        notes: (!available)
            .then(|| "Install: brew install ripgrep / cargo install ripgrep".to_string()),
    }
}

/// Check that the search root is configured and usable
pub fn check_root(config: &Config) -> DependencyStatus {
    let checked = config.require_root();
    DependencyStatus {
        name: "root".to_string(),
        available: checked.is_ok(),
        command: config.root.as_ref().map(|r| r.display().to_string()),
        version: None,
        required: true,
        notes: checked.err().map(|e| e.to_string()),
    }
}

/// Check all dependencies
pub fn check_dependencies(config: &Config) -> Vec<DependencyStatus> {
    vec![check_search_tool(&config.rg_program), check_root(config)]
}

pub fn render_statuses(statuses: &[DependencyStatus], config: RenderConfig) -> String {
    match config.format {
        OutputFormat::Jsonl => statuses
            .iter()
            .map(|s| to_json(s, config.pretty))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => to_json(&statuses, config.pretty),
        OutputFormat::Markdown => {
            let mut output = String::from("## Doctor\n\n");
            for status in statuses {
                output.push_str(&format!("- {}\n", status.summary_line().replace('\n', "\n  ")));
            }
            output
        }
        OutputFormat::Raw => statuses
            .iter()
            .map(DependencyStatus::summary_line)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> String {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    encoded.unwrap_or_else(|_| "{}".to_string())
}

/// Run the doctor command
pub fn run_doctor(config: &Config, render_config: RenderConfig) -> Result<()> {
    let statuses = check_dependencies(config);
    println!("{}", render_statuses(&statuses, render_config));

    if statuses.iter().any(|s| s.required && !s.available) {
        eprintln!("\n⚠️  Some required dependencies are missing!");
    }

    Ok(())
}
