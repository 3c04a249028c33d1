//! Naming strategies for product components
//!
//! A product component name is made of a version-independent *kind-id* and a
//! *version id*, joined by a separator: `Product 2024-01` has kind-id
//! `Product` and version id `2024-01` under the default
//! [`DateBasedNamingStrategy`].

use crate::object::DomainObject;
use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display, Formatter};

/// Severity of a validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    Info,
    /// Does not block the copy
    Warning,
    /// Blocks the copy
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Message produced by name validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingMessage {
    /// Message severity
    pub severity: Severity,
    /// Human-readable text
    pub text: String,
}

impl NamingMessage {
    /// Create error message
    #[inline]
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }

    /// Create warning message
    #[inline]
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }

    /// Check if this message blocks the operation
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for NamingMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Check whether any message in `messages` is an error
#[must_use]
pub fn contains_errors(messages: &[NamingMessage]) -> bool {
    messages.iter().any(NamingMessage::is_error)
}

/// Splits product component names into kind-id and version id
///
/// Implementations must be deterministic: the same name always yields the
/// same kind-id.
pub trait NamingStrategy: Send + Sync + Debug {
    /// Whether names carry a version id
    fn supports_version_id(&self) -> bool;

    /// Version-independent part of `name`
    ///
    /// # Errors
    /// Returns error if `name` does not follow the strategy's format
    fn kind_id(&self, name: &str) -> Result<String, NamingError>;

    /// Combine a kind-id and a version id into a name
    fn product_cmpt_name(&self, kind_id: &str, version_id: &str) -> String;

    /// Validate a complete name
    fn validate(&self, name: &str) -> Vec<NamingMessage>;

    /// Validate a version id on its own
    fn validate_version_id(&self, version_id: &str) -> Vec<NamingMessage>;

    /// Suggested version id for a copy of `root` made on `date`
    fn next_version_id(&self, root: &DomainObject, date: NaiveDate) -> String;

    /// Strategy name (for logging)
    fn name(&self) -> &'static str;
}

/// Names of the form `<kind-id><separator><date>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateBasedNamingStrategy {
    /// Text between kind-id and version id
    pub separator: String,
    /// chrono format string of the version id
    pub date_format: String,
}

impl DateBasedNamingStrategy {
    /// Create strategy with custom separator and date format
    #[inline]
    #[must_use]
    pub fn new(separator: impl Into<String>, date_format: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            date_format: date_format.into(),
        }
    }

    /// Set separator
    #[inline]
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set date format
    #[inline]
    #[must_use]
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    fn split<'a>(&self, name: &'a str) -> Option<(&'a str, &'a str)> {
        if self.separator.is_empty() {
            return None;
        }
        name.rfind(&self.separator)
            .map(|idx| (&name[..idx], &name[idx + self.separator.len()..]))
    }
}

impl Default for DateBasedNamingStrategy {
    fn default() -> Self {
        Self::new(" ", "%Y-%m")
    }
}

impl NamingStrategy for DateBasedNamingStrategy {
    fn supports_version_id(&self) -> bool {
        true
    }

    fn kind_id(&self, name: &str) -> Result<String, NamingError> {
        match self.split(name) {
            Some((kind_id, _)) if !kind_id.is_empty() => Ok(kind_id.to_string()),
            _ => Err(NamingError::missing_version_id(name, &self.separator)),
        }
    }

    fn product_cmpt_name(&self, kind_id: &str, version_id: &str) -> String {
        if version_id.is_empty() {
            kind_id.to_string()
        } else {
            format!("{kind_id}{}{version_id}", self.separator)
        }
    }

    fn validate(&self, name: &str) -> Vec<NamingMessage> {
        if name.trim().is_empty() {
            return vec![NamingMessage::error("name must not be empty")];
        }
        match self.split(name) {
            None => vec![NamingMessage::error(format!(
                "'{name}' has no version id (expected '<kind-id>{}<version id>')",
                self.separator
            ))],
            Some(("", _)) => vec![NamingMessage::error(format!("'{name}' has an empty kind-id"))],
            Some((_, version_id)) => self.validate_version_id(version_id),
        }
    }

    fn validate_version_id(&self, version_id: &str) -> Vec<NamingMessage> {
        let mut parsed = Parsed::new();
        match parse(&mut parsed, version_id, StrftimeItems::new(&self.date_format)) {
            Ok(()) => Vec::new(),
            Err(err) => vec![NamingMessage::error(format!(
                "version id '{version_id}' does not match format '{}': {err}",
                self.date_format
            ))],
        }
    }

    fn next_version_id(&self, _root: &DomainObject, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }

    fn name(&self) -> &'static str {
        "date-based"
    }
}

/// Names without a version id; the kind-id is the whole name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoVersionIdNamingStrategy;

impl NamingStrategy for NoVersionIdNamingStrategy {
    fn supports_version_id(&self) -> bool {
        false
    }

    fn kind_id(&self, name: &str) -> Result<String, NamingError> {
        if name.is_empty() {
            Err(NamingError::EmptyName)
        } else {
            Ok(name.to_string())
        }
    }

    fn product_cmpt_name(&self, kind_id: &str, _version_id: &str) -> String {
        kind_id.to_string()
    }

    fn validate(&self, name: &str) -> Vec<NamingMessage> {
        if name.trim().is_empty() {
            vec![NamingMessage::error("name must not be empty")]
        } else {
            Vec::new()
        }
    }

    fn validate_version_id(&self, _version_id: &str) -> Vec<NamingMessage> {
        vec![NamingMessage::error("version ids are not supported")]
    }

    fn next_version_id(&self, _root: &DomainObject, _date: NaiveDate) -> String {
        String::new()
    }

    fn name(&self) -> &'static str {
        "no-version-id"
    }
}

/// Serializable selection of a naming strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum NamingConfig {
    /// [`DateBasedNamingStrategy`]
    DateBased(DateBasedNamingStrategy),
    /// [`NoVersionIdNamingStrategy`]
    NoVersionId,
}

impl NamingConfig {
    /// Instantiate the configured strategy
    #[must_use]
    pub fn build(&self) -> Box<dyn NamingStrategy> {
        match self {
            Self::DateBased(strategy) => Box::new(strategy.clone()),
            Self::NoVersionId => Box::new(NoVersionIdNamingStrategy),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self::DateBased(DateBasedNamingStrategy::default())
    }
}

/// Errors splitting names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    /// Name has no version id part
    #[error("'{name}' has no version id after separator '{separator}'")]
    MissingVersionId {
        /// Full name
        name: String,
        /// Separator that was not found
        separator: String,
    },

    /// Name is empty
    #[error("name must not be empty")]
    EmptyName,
}

impl NamingError {
    /// Create missing version id error
    pub fn missing_version_id(name: impl Into<String>, separator: impl Into<String>) -> Self {
        Self::MissingVersionId {
            name: name.into(),
            separator: separator.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{DomainModel, ObjectKind};
    use crate::path::PackagePath;

    #[test]
    fn kind_id_is_text_before_last_separator() {
        let strategy = DateBasedNamingStrategy::default();
        assert_eq!(strategy.kind_id("Home Insurance 2024-01").unwrap(), "Home Insurance");
        assert_eq!(strategy.kind_id("ProductV1 2024-01").unwrap(), "ProductV1");
    }

    #[test]
    fn kind_id_without_separator_fails() {
        let strategy = DateBasedNamingStrategy::default();
        assert!(matches!(
            strategy.kind_id("Product"),
            Err(NamingError::MissingVersionId { .. })
        ));
        assert!(strategy.kind_id(" 2024-01").is_err());
    }

    #[test]
    fn product_cmpt_name_joins_with_separator() {
        let strategy = DateBasedNamingStrategy::default();
        assert_eq!(strategy.product_cmpt_name("Product", "2025-02"), "Product 2025-02");
        assert_eq!(strategy.product_cmpt_name("Product", ""), "Product");

        let dashed = DateBasedNamingStrategy::default().with_separator("_");
        assert_eq!(dashed.product_cmpt_name("Product", "2025-02"), "Product_2025-02");
    }

    #[test]
    fn validate_checks_version_format() {
        let strategy = DateBasedNamingStrategy::default();
        assert!(strategy.validate("Product 2024-01").is_empty());
        assert!(contains_errors(&strategy.validate("Product")));
        assert!(contains_errors(&strategy.validate("Product V1")));
        assert!(contains_errors(&strategy.validate("")));
    }

    #[test]
    fn validate_version_id_uses_date_format() {
        let strategy = DateBasedNamingStrategy::default();
        assert!(strategy.validate_version_id("2024-12").is_empty());
        assert!(contains_errors(&strategy.validate_version_id("2024-13")));
        assert!(contains_errors(&strategy.validate_version_id("next")));
    }

    #[test]
    fn next_version_id_formats_date() {
        let strategy = DateBasedNamingStrategy::default();
        let mut model = DomainModel::new();
        let id = model
            .add_object(ObjectKind::ProductCmpt, PackagePath::default_package(), "Product 2024-01", "src")
            .unwrap();
        let root = model.object(id).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(strategy.next_version_id(root, date), "2025-03");
        assert_eq!(NoVersionIdNamingStrategy.next_version_id(root, date), "");
    }

    #[test]
    fn no_version_id_strategy_uses_whole_name() {
        let strategy = NoVersionIdNamingStrategy;
        assert!(!strategy.supports_version_id());
        assert_eq!(strategy.kind_id("Product").unwrap(), "Product");
        assert_eq!(strategy.product_cmpt_name("Product", "2024-01"), "Product");
        assert!(strategy.validate("Product").is_empty());
    }

    #[test]
    fn naming_config_from_toml_style_json() {
        let config: NamingConfig =
            serde_json::from_str(r#"{"strategy":"date-based","separator":"_"}"#).unwrap();
        let strategy = config.build();
        assert_eq!(strategy.name(), "date-based");
        assert_eq!(strategy.product_cmpt_name("A", "2024-01"), "A_2024-01");

        let config: NamingConfig = serde_json::from_str(r#"{"strategy":"no-version-id"}"#).unwrap();
        assert!(!config.build().supports_version_id());
    }

    #[test]
    fn severity_orders_error_highest() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
