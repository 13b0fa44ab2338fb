//! Translator configuration.
//!
//! ```toml
//! connection_variables = ["pdo", "db"]
//! connection_properties = ["db"]
//! fuzzy_detection = false
//!
//! [builder_access]
//! property = "this.queryBuilder"
//!
//! [render]
//! member_access = "->"
//! variable_prefix = "$"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ast::Expr;
use crate::error::{ShiftError, ShiftResult};

/// Name fragments that mark an identifier as a connection when fuzzy detection is on.
const FUZZY_FRAGMENTS: &[&str] = &["pdo", "conn", "db", "database"];

/// How the query-builder source is reached from a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderAccess {
    /// `connection.<name>()`
    Method(String),
    /// A fixed property path such as `this.queryBuilder`.
    Property(String),
}

impl Default for BuilderAccess {
    fn default() -> Self {
        BuilderAccess::Method("createQueryBuilder".to_string())
    }
}

impl BuilderAccess {
    /// The expression every translated chain hangs off.
    pub fn source(&self, connection: &Expr) -> Expr {
        match self {
            BuilderAccess::Method(name) => Expr::call(connection.clone(), name, vec![]),
            BuilderAccess::Property(path) => Expr::prop(path),
        }
    }
}

/// Concrete-syntax options for rendering replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Token between receiver and member.
    pub member_access: String,
    /// Prefix written before variable names and property-path roots.
    pub variable_prefix: String,
    /// Operator joining concatenated parts.
    pub concat_operator: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            member_access: ".".to_string(),
            variable_prefix: String::new(),
            concat_operator: "+".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Variable names that hold a connection.
    pub connection_variables: Vec<String>,

    /// Property names (last path segment) that hold a connection.
    pub connection_properties: Vec<String>,

    /// Also accept names containing `pdo`, `conn`, `db` or `database`.
    pub fuzzy_detection: bool,

    pub builder_access: BuilderAccess,

    pub render: RenderConfig,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            connection_variables: strings(&["pdo", "db", "dbh", "conn", "connection"]),
            connection_properties: strings(&["pdo", "db", "conn", "connection"]),
            fuzzy_detection: true,
            builder_access: BuilderAccess::default(),
            render: RenderConfig::default(),
        }
    }
}

impl TranslatorConfig {
    /// Create a new configuration builder
    pub fn builder() -> TranslatorConfigBuilder {
        TranslatorConfigBuilder::default()
    }

    pub fn from_toml_str(s: &str) -> ShiftResult<Self> {
        toml::from_str(s).map_err(|e| ShiftError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ShiftResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Default location: `<config dir>/sqlshift/config.toml`.
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sqlshift").join("config.toml"))
    }

    /// Load from the default location, or fall back to defaults when absent.
    pub fn discover() -> ShiftResult<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Whether an identifier names a connection handle.
    ///
    /// Variables are checked against `connection_variables`, property paths
    /// by their last segment against `connection_properties`.
    pub fn is_connection(&self, expr: &Expr) -> bool {
        let (name, allowlist) = match expr {
            Expr::Var(name) => (name.as_str(), &self.connection_variables),
            Expr::Prop(path) => match path.last() {
                Some(last) => (last.as_str(), &self.connection_properties),
                None => return false,
            },
            _ => return false,
        };

        if allowlist.iter().any(|allowed| allowed == name) {
            return true;
        }
        if self.fuzzy_detection {
            let lower = name.to_ascii_lowercase();
            return FUZZY_FRAGMENTS.iter().any(|f| lower.contains(f));
        }
        false
    }
}

/// Builder for TranslatorConfig
#[derive(Debug, Default)]
pub struct TranslatorConfigBuilder {
    config: TranslatorConfig,
}

impl TranslatorConfigBuilder {
    /// Replace the connection variable allowlist
    pub fn connection_variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.connection_variables = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the connection property allowlist
    pub fn connection_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.connection_properties = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn fuzzy_detection(mut self, enabled: bool) -> Self {
        self.config.fuzzy_detection = enabled;
        self
    }

    /// Reach the builder through `connection.<name>()`
    pub fn builder_method(mut self, name: impl Into<String>) -> Self {
        self.config.builder_access = BuilderAccess::Method(name.into());
        self
    }

    /// Reach the builder through a fixed property path
    pub fn builder_property(mut self, path: impl Into<String>) -> Self {
        self.config.builder_access = BuilderAccess::Property(path.into());
        self
    }

    pub fn render(mut self, render: RenderConfig) -> Self {
        self.config.render = render;
        self
    }

    /// Build the configuration
    pub fn build(self) -> TranslatorConfig {
        self.config
    }
}
