//! Application configuration module
//!
//! Settings come from a YAML file, then `SCHEMADOC_*` environment variables,
//! then command-line overrides. `${NAME}` references in data sources and the
//! output path are expanded from an explicit environment mapping.

mod interpolate;

pub use interpolate::interpolate;

use crate::error::{io_error, Result, SchemaError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = ".schemadoc.yml";

pub const DEFAULT_DOC_PATH: &str = "dbdoc";
pub const DEFAULT_ER_FORMAT: &str = "png";

const ENV_DSN: &str = "SCHEMADOC_DSN";
const ENV_DOC_PATH: &str = "SCHEMADOC_DOC_PATH";

/// Output formatting flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    /// Pad Markdown table cells to a uniform width
    pub adjust: bool,
    /// Sort tables, columns and relations by name
    pub sort: bool,
}

/// ER diagram settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErSettings {
    pub skip: bool,
    pub format: String,
    pub comment: bool,
}

impl Default for ErSettings {
    fn default() -> Self {
        Self {
            skip: false,
            format: DEFAULT_ER_FORMAT.to_string(),
            comment: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleToggle {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleLimit {
    pub enabled: bool,
    pub max: usize,
}

/// Lint rule toggles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LintSettings {
    pub require_table_comment: RuleToggle,
    pub require_column_comment: RuleToggle,
    pub no_relation_tables: RuleLimit,
    pub column_count: RuleLimit,
}

/// A relation declared in configuration rather than by a constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalRelation {
    pub table: String,
    pub columns: Vec<String>,
    pub parent_table: String,
    pub parent_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def: Option<String>,
}

/// Comment overrides for one table and its columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalComment {
    pub table: String,
    #[serde(default)]
    pub table_comment: String,
    #[serde(default)]
    pub column_comments: BTreeMap<String, String>,
}

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(deserialize_with = "one_or_many")]
    pub dsn: Vec<String>,
    pub doc_path: String,
    pub format: Format,
    pub er: ErSettings,
    pub exclude: Vec<String>,
    pub lint: LintSettings,
    pub lint_exclude: Vec<String>,
    pub relations: Vec<AdditionalRelation>,
    pub comments: Vec<AdditionalComment>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dsn: Vec::new(),
            doc_path: DEFAULT_DOC_PATH.to_string(),
            format: Format::default(),
            er: ErSettings::default(),
            exclude: Vec::new(),
            lint: LintSettings::default(),
            lint_exclude: Vec::new(),
            relations: Vec::new(),
            comments: Vec::new(),
        }
    }
}

/// Command-line values that take precedence over file and environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dsn: Option<String>,
    pub doc_path: Option<String>,
    pub adjust: bool,
    pub sort: bool,
    pub er_format: Option<String>,
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(dsn)) => vec![dsn],
        Some(OneOrMany::Many(dsns)) => dsns,
    })
}

impl Settings {
    /// Parse settings from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load settings.
    ///
    /// `path` names the config file; when absent, [`DEFAULT_CONFIG_FILE`] is
    /// used if it exists. `env` is the environment snapshot used both for the
    /// `SCHEMADOC_*` overlay and for `${NAME}` interpolation. Only values read
    /// from the file are interpolated.
    pub fn load(
        path: Option<&Path>,
        env: &HashMap<String, String>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            }
        };

        let mut settings = match &path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
                let mut settings = Self::from_yaml(&text)?;
                settings.expand(env);
                settings
            }
            None => Self::default(),
        };

        settings.apply_env(env);
        settings.apply_overrides(overrides);
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env(&mut self, env: &HashMap<String, String>) {
        if let Some(dsn) = env.get(ENV_DSN).filter(|v| !v.is_empty()) {
            self.dsn = dsn
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(doc_path) = env.get(ENV_DOC_PATH).filter(|v| !v.is_empty()) {
            self.doc_path = doc_path.clone();
        }
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(dsn) = &overrides.dsn {
            self.dsn = vec![dsn.clone()];
        }
        if let Some(doc_path) = &overrides.doc_path {
            self.doc_path = doc_path.clone();
        }
        if overrides.adjust {
            self.format.adjust = true;
        }
        if overrides.sort {
            self.format.sort = true;
        }
        if let Some(format) = &overrides.er_format {
            self.er.format = format.clone();
        }
    }

    fn expand(&mut self, env: &HashMap<String, String>) {
        for dsn in &mut self.dsn {
            *dsn = interpolate(dsn, env);
        }
        self.doc_path = interpolate(&self.doc_path, env);
    }

    fn validate(&mut self) -> Result<()> {
        if self.doc_path.is_empty() {
            self.doc_path = DEFAULT_DOC_PATH.to_string();
        }
        if self.er.format.is_empty() {
            self.er.format = DEFAULT_ER_FORMAT.to_string();
        }
        if let Some(r) = self
            .relations
            .iter()
            .find(|r| r.columns.is_empty() || r.columns.len() != r.parent_columns.len())
        {
            return Err(SchemaError::Config(format!(
                "relation '{}' -> '{}' must list the same non-zero number of columns on both sides",
                r.table, r.parent_table
            )));
        }
        Ok(())
    }

    /// First data source with its password masked, for display
    pub fn masked_dsn(&self) -> String {
        self.dsn.first().map(|d| masked_dsn(d)).unwrap_or_default()
    }
}

/// Replace the password of a URL-style data source with `*****`.
///
/// Sources without a password, or that are not URLs, are returned unchanged.
pub fn masked_dsn(dsn: &str) -> String {
    let mut url = match url::Url::parse(dsn) {
        Ok(url) => url,
        Err(_) => return dsn.to_string(),
    };
    if url.password().is_none() || url.set_password(Some("*****")).is_err() {
        return dsn.to_string();
    }
    url.to_string()
}
