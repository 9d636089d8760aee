use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::grid::collector::FetchPolicy;
use crate::grid::RateWindow;
use crate::hotels::HotelSet;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub hotels: HotelSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Days after today of the first stay date. The API refuses same-day
    /// lookups, so this starts at tomorrow.
    #[serde(default = "default_start_offset_days")]
    pub start_offset_days: u32,
    #[serde(default = "default_end_offset_days")]
    pub end_offset_days: u32,
    #[serde(default = "default_true")]
    pub end_inclusive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default)]
    pub policy: FetchPolicy,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// Blank column after the date, filled in by hand.
    #[serde(default = "default_true")]
    pub availability_column: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_dir: Option<String>,
    pub top_k: Option<usize>,
    pub days: Option<u32>,
    pub fail_fast: bool,
    pub concurrency: Option<usize>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/hotel-rate-sheet/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<()> {
        if let Some(dir) = overrides.output_dir {
            self.output.dir = dir;
        }
        if let Some(top_k) = overrides.top_k {
            self.highlight.top_k = top_k;
        }
        if let Some(days) = overrides.days {
            let Some(extra) = days.checked_sub(1) else {
                bail!("window must cover at least one day");
            };
            self.window.end_inclusive = true;
            self.window.end_offset_days = self.window.start_offset_days.saturating_add(extra);
        }
        if overrides.fail_fast {
            self.fetch.policy = FetchPolicy::FailFast;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.fetch.concurrency = concurrency;
        }
        Ok(())
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolve_window(&self, today: NaiveDate) -> Result<RateWindow> {
        RateWindow::from_offsets(
            today,
            self.window.start_offset_days,
            self.window.end_offset_days,
            self.window.end_inclusive,
        )
        .context("invalid rate window")
    }

    pub fn output_path(&self, today: NaiveDate) -> PathBuf {
        expand_tilde(&self.output.dir).join(format!(
            "{}-{}.xlsx",
            self.output.file_prefix,
            today.format("%Y-%m-%d")
        ))
    }

    pub fn default_template() -> String {
        let template = r#"[api]
base_url = "https://data.xotelo.com/api/rates"
currency = "USD"
timeout_secs = 20
connect_timeout_secs = 6

[window]
start_offset_days = 1
end_offset_days = 30
end_inclusive = true

[highlight]
top_k = 3

[fetch]
policy = "degrade"
concurrency = 1

[output]
dir = "."
file_prefix = "rates"
availability_column = true

[hotels.baseline]
display_name = "Quality Inn Richfield"
provider_id = "g50892-d95503"

[[hotels.competitors]]
display_name = "Comfort Inn Richfield"
provider_id = "g50892-d256944"

[[hotels.competitors]]
display_name = "Holiday Inn Richfield"
provider_id = "g50892-d631380"

[[hotels.competitors]]
display_name = "La Quinta Macedonia"
provider_id = "g50587-d226031"

[[hotels.competitors]]
display_name = "Comfort Inn Independence"
provider_id = "g50470-d95403"
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            currency: default_currency(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start_offset_days: default_start_offset_days(),
            end_offset_days: default_end_offset_days(),
            end_inclusive: true,
        }
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            policy: FetchPolicy::default(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            file_prefix: default_file_prefix(),
            availability_column: true,
        }
    }
}

fn default_base_url() -> String {
    "https://data.xotelo.com/api/rates".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_connect_timeout_secs() -> u64 {
    6
}

fn default_start_offset_days() -> u32 {
    1
}

fn default_end_offset_days() -> u32 {
    30
}

fn default_top_k() -> usize {
    3
}

fn default_concurrency() -> usize {
    1
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_file_prefix() -> String {
    "rates".to_string()
}

fn default_true() -> bool {
    true
}
