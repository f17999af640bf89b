use crate::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output style requested from the rewrite feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteStyle {
    #[default]
    Rephrase,
    Shorten,
    Elaborate,
    Friendly,
    Professional,
}

impl RewriteStyle {
    pub const ALL: [RewriteStyle; 5] = [
        Self::Rephrase,
        Self::Shorten,
        Self::Elaborate,
        Self::Friendly,
        Self::Professional,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rephrase => "rephrase",
            Self::Shorten => "shorten",
            Self::Elaborate => "elaborate",
            Self::Friendly => "friendly",
            Self::Professional => "professional",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Rephrase => "Rephrase",
            Self::Shorten => "Shorten",
            Self::Elaborate => "Elaborate",
            Self::Friendly => "Friendly",
            Self::Professional => "Professional",
        }
    }
}

impl fmt::Display for RewriteStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for RewriteStyle {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.name() == lower)
            .ok_or_else(|| ModelError::UnknownRewriteStyle(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Friendly".parse::<RewriteStyle>().unwrap(), RewriteStyle::Friendly);
        assert_eq!("SHORTEN".parse::<RewriteStyle>().unwrap(), RewriteStyle::Shorten);
        assert!("sarcastic".parse::<RewriteStyle>().is_err());
    }

    #[test]
    fn test_default_is_rephrase() {
        assert_eq!(RewriteStyle::default(), RewriteStyle::Rephrase);
    }
}
