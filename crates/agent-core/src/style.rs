//! Style Catalog
//!
//! Named style profiles: a system instruction, a prompt template with a
//! `{text}` placeholder, and tone constraints. The catalog is built once at
//! startup and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RewriteError};

/// Placeholder substituted with the (filtered) input text
pub const TEXT_PLACEHOLDER: &str = "{text}";

const DEFAULT_TEMPLATE: &str =
    "Rewrite the following text. Output only the rewritten text, no explanations.\n\nText: {text}";

/// Supported target tones
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Casual,
    Professional,
    Concise,
    Friendly,
}

impl Style {
    pub const ALL: [Self; 4] = [Self::Casual, Self::Professional, Self::Concise, Self::Friendly];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Professional => "professional",
            Self::Concise => "concise",
            Self::Friendly => "friendly",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = RewriteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == name)
            .ok_or_else(|| RewriteError::UnknownStyle(s.trim().to_string()))
    }
}

/// Prompt template and tone rules for one style
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    #[serde(rename = "name")]
    pub style: Style,

    /// Appended to the base system prompt
    pub instruction: String,

    /// User prompt; must contain `{text}`
    #[serde(default = "default_template")]
    pub prompt_template: String,

    #[serde(default)]
    pub tone_constraints: Vec<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.into()
}

const fn default_temperature() -> f32 {
    0.2
}

impl StyleProfile {
    fn builtin(style: Style, instruction: &str, constraints: &[&str]) -> Self {
        Self {
            style,
            instruction: instruction.into(),
            prompt_template: default_template(),
            tone_constraints: constraints.iter().map(|c| (*c).to_string()).collect(),
            temperature: default_temperature(),
        }
    }

    /// Substitute the text into the template
    pub fn render(&self, text: &str) -> String {
        self.prompt_template.replace(TEXT_PLACEHOLDER, text)
    }
}

/// Immutable lookup table from style to profile
#[derive(Clone, Debug)]
pub struct StyleCatalog {
    profiles: BTreeMap<Style, StyleProfile>,
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StyleCatalog {
    /// The four built-in styles
    pub fn builtin() -> Self {
        let profiles = [
            StyleProfile::builtin(
                Style::Professional,
                "Use a polished, formal tone. Be clear and concise.",
                &["no slang", "preserve the original meaning", "do not add new information"],
            ),
            StyleProfile::builtin(
                Style::Casual,
                "Use a friendly, conversational tone without slang.",
                &["no slang", "keep it conversational", "preserve the original meaning"],
            ),
            StyleProfile::builtin(
                Style::Concise,
                "Be brief and to the point. Remove unnecessary words.",
                &["max two sentences", "preserve the original meaning"],
            ),
            StyleProfile::builtin(
                Style::Friendly,
                "Be warm and encouraging while remaining professional.",
                &["warm but not overly familiar", "preserve the original meaning"],
            ),
        ];

        Self {
            profiles: profiles.into_iter().map(|p| (p.style, p)).collect(),
        }
    }

    /// Build from explicit profiles, validating templates and uniqueness
    pub fn from_profiles(profiles: Vec<StyleProfile>) -> Result<Self, ConfigError> {
        let mut table = BTreeMap::new();

        for profile in profiles {
            if !profile.prompt_template.contains(TEXT_PLACEHOLDER) {
                return Err(ConfigError::InvalidStyle(format!(
                    "template for '{}' has no {TEXT_PLACEHOLDER} placeholder",
                    profile.style
                )));
            }
            let style = profile.style;
            if table.insert(style, profile).is_some() {
                return Err(ConfigError::InvalidStyle(format!("duplicate style '{style}'")));
            }
        }

        if table.is_empty() {
            return Err(ConfigError::InvalidStyle("catalog has no profiles".into()));
        }

        Ok(Self { profiles: table })
    }

    /// Load a JSON array of profiles
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let profiles: Vec<StyleProfile> = serde_json::from_str(json)?;
        Self::from_profiles(profiles)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Look up a profile by (case-insensitive) name
    pub fn resolve(&self, name: &str) -> Result<&StyleProfile, RewriteError> {
        let style: Style = name.parse()?;
        self.profiles
            .get(&style)
            .ok_or_else(|| RewriteError::UnknownStyle(name.trim().to_string()))
    }

    /// Known style names in declaration order (casual, professional, concise, friendly)
    pub fn names(&self) -> Vec<&'static str> {
        self.profiles.keys().map(|s| s.as_str()).collect()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &StyleProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
