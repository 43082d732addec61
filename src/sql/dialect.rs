//! Target SQL engine capabilities.

use serde::{Deserialize, Serialize};

/// Which engine a dialect describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    Postgres,
    Sqlite,
    Generic,
}

/// How bound parameters are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `?`
    Question,
    /// `$1`, `$2`, ...
    Numbered,
}

/// Syntax capability set of the target engine.
///
/// `array_aggregation` gates `ARRAY[...]` and `||` path ordering. It is never
/// derived from `kind`; the presets just set it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    pub kind: DialectKind,
    pub array_aggregation: bool,
    pub placeholder: PlaceholderStyle,
}

impl Dialect {
    pub fn postgres() -> Self {
        Self {
            kind: DialectKind::Postgres,
            array_aggregation: true,
            placeholder: PlaceholderStyle::Numbered,
        }
    }

    pub fn sqlite() -> Self {
        Self {
            kind: DialectKind::Sqlite,
            array_aggregation: false,
            placeholder: PlaceholderStyle::Question,
        }
    }

    pub fn generic() -> Self {
        Self {
            kind: DialectKind::Generic,
            array_aggregation: false,
            placeholder: PlaceholderStyle::Question,
        }
    }

    pub fn with_array_aggregation(mut self, enabled: bool) -> Self {
        self.array_aggregation = enabled;
        self
    }

    pub fn with_placeholder(mut self, placeholder: PlaceholderStyle) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Quote an identifier, doubling embedded quotes
    pub fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    /// Placeholder for the parameter at 1-based `position`
    pub fn placeholder(&self, position: usize) -> String {
        match self.placeholder {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::Numbered => format!("${}", position),
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::generic()
    }
}
