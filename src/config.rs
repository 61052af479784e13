// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Template and literal-format configuration
//!
//! Both structs can be filled from an option string of the form
//! `key=value&key=value`, so one string can configure a whole ingestion
//! session:
//!
//! ```
//! use literal_template::{FormatOptions, TemplateConfig};
//!
//! let options = "cache_size=128&null_spelling=\\N&deduce_templates=on";
//! let config = TemplateConfig::from_options(options).unwrap();
//! let format = FormatOptions::from_options(options).unwrap();
//! assert_eq!(config.cache_size, 128);
//! assert_eq!(format.null_spelling, "\\N");
//! ```

use crate::core::{Error, Result};

/// Default number of template structures kept by a cache
pub const DEFAULT_CACHE_SIZE: usize = 4096;

/// Lexical conventions for literals in row text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Spelling of the NULL value, matched case-insensitively
    /// Default: "NULL"
    pub null_spelling: String,

    /// Whether `\n`, `\t`, `\\`, `\'` are escapes inside quoted strings
    /// Default: true
    pub backslash_escapes: bool,

    /// Whether keyword tokens of a template match in any ASCII case
    /// Default: false
    pub case_insensitive_keywords: bool,

    /// Whether signed-number literals may start with `+`
    /// Default: true
    pub allow_leading_plus: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            null_spelling: "NULL".to_string(),
            backslash_escapes: true,
            case_insensitive_keywords: false,
            allow_leading_plus: true,
        }
    }
}

impl FormatOptions {
    /// Creates FormatOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the NULL spelling
    pub fn with_null_spelling(mut self, spelling: impl Into<String>) -> Self {
        self.null_spelling = spelling.into();
        self
    }

    /// Builder method to enable/disable backslash escapes
    pub fn with_backslash_escapes(mut self, enabled: bool) -> Self {
        self.backslash_escapes = enabled;
        self
    }

    /// Builder method to enable/disable case-insensitive keyword matching
    pub fn with_case_insensitive_keywords(mut self, enabled: bool) -> Self {
        self.case_insensitive_keywords = enabled;
        self
    }

    /// Builder method to allow/reject a leading `+` on numbers
    pub fn with_leading_plus(mut self, allowed: bool) -> Self {
        self.allow_leading_plus = allowed;
        self
    }

    /// Parse `key=value&key=value`, ignoring keys this struct does not own
    pub fn from_options(options: &str) -> Result<Self> {
        let mut format = Self::default();
        for (key, value) in option_pairs(options) {
            match key {
                "null_spelling" | "null" => {
                    if value.is_empty() {
                        return Err(Error::invalid_config(key, value));
                    }
                    format.null_spelling = value.to_string();
                }
                "backslash_escapes" => format.backslash_escapes = parse_flag(key, value)?,
                "case_insensitive_keywords" => {
                    format.case_insensitive_keywords = parse_flag(key, value)?
                }
                "allow_leading_plus" => format.allow_leading_plus = parse_flag(key, value)?,
                _ => {}
            }
        }
        Ok(format)
    }
}

/// Template deduction and caching settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    /// Maximum number of cached template structures, 0 disables caching
    /// Default: 4096
    pub cache_size: usize,

    /// Whether rows are parsed through templates at all
    /// Default: true
    pub deduce_templates: bool,

    /// Type a whole-expression literal with the desired result type when
    /// its syntax allows it
    /// Default: false
    pub accurate_types_of_literals: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            deduce_templates: true,
            accurate_types_of_literals: false,
        }
    }
}

impl TemplateConfig {
    /// Creates a TemplateConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the cache size
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    /// Builder method to enable/disable template deduction
    pub fn with_deduce_templates(mut self, enabled: bool) -> Self {
        self.deduce_templates = enabled;
        self
    }

    /// Builder method to enable/disable accurate literal typing
    pub fn with_accurate_types_of_literals(mut self, enabled: bool) -> Self {
        self.accurate_types_of_literals = enabled;
        self
    }

    /// Parse `key=value&key=value`, ignoring keys this struct does not own
    pub fn from_options(options: &str) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in option_pairs(options) {
            match key {
                // Cache capacity: cache_size=4096
                "cache_size" => {
                    config.cache_size = value
                        .parse::<usize>()
                        .map_err(|_| Error::invalid_config(key, value))?;
                }
                // deduce_templates=on|off
                "deduce_templates" => config.deduce_templates = parse_flag(key, value)?,
                // accurate_types_of_literals=on|off
                "accurate_types_of_literals" => {
                    config.accurate_types_of_literals = parse_flag(key, value)?
                }
                _ => {}
            }
        }
        Ok(config)
    }
}

fn option_pairs(options: &str) -> impl Iterator<Item = (&str, &str)> {
    options
        .split('&')
        .filter(|param| !param.is_empty())
        .map(|param| {
            let mut parts = param.splitn(2, '=');
            let key = parts.next().unwrap_or("").trim();
            let value = parts.next().unwrap_or("").trim();
            (key, value)
        })
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(Error::invalid_config(key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let format = FormatOptions::default();
        assert_eq!(format.null_spelling, "NULL");
        assert!(format.backslash_escapes);
        assert!(!format.case_insensitive_keywords);
        assert!(format.allow_leading_plus);

        let config = TemplateConfig::default();
        assert_eq!(config.cache_size, DEFAULT_CACHE_SIZE);
        assert!(config.deduce_templates);
        assert!(!config.accurate_types_of_literals);
    }

    #[test]
    fn test_from_options() {
        let config =
            TemplateConfig::from_options("cache_size=0&deduce_templates=off&unknown=1").unwrap();
        assert_eq!(config.cache_size, 0);
        assert!(!config.deduce_templates);

        let format =
            FormatOptions::from_options("backslash_escapes=false&case_insensitive_keywords=yes")
                .unwrap();
        assert!(!format.backslash_escapes);
        assert!(format.case_insensitive_keywords);
    }

    #[test]
    fn test_bad_values_rejected() {
        assert_eq!(
            TemplateConfig::from_options("cache_size=lots"),
            Err(Error::invalid_config("cache_size", "lots"))
        );
        assert!(TemplateConfig::from_options("deduce_templates=maybe").is_err());
        assert!(FormatOptions::from_options("null_spelling=").is_err());
    }

    #[test]
    fn test_empty_options() {
        assert_eq!(TemplateConfig::from_options("").unwrap(), TemplateConfig::default());
        assert_eq!(FormatOptions::from_options("&&").unwrap(), FormatOptions::default());
    }

    #[test]
    fn test_builders() {
        let format = FormatOptions::new()
            .with_null_spelling("nil")
            .with_leading_plus(false);
        assert_eq!(format.null_spelling, "nil");
        assert!(!format.allow_leading_plus);

        let config = TemplateConfig::new()
            .with_cache_size(8)
            .with_accurate_types_of_literals(true);
        assert_eq!(config.cache_size, 8);
        assert!(config.accurate_types_of_literals);
    }
}
