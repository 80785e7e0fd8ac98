use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error as ThisError;

///
/// PatternError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PatternError {
    #[error("wildcard pattern ends with a dangling escape: `{source_text}`")]
    DanglingEscape { source_text: String },

    #[error("wildcard pattern `{source_text}` failed to compile: {message}")]
    Compile { source_text: String, message: String },
}

///
/// LikePattern
///
/// Wildcard pattern consumed opaquely by the `Like` predicate kind.
/// `*` matches any run of characters, `?` matches exactly one, and `\`
/// escapes the next character. The pattern is compiled once, at
/// construction; identity (Eq/Hash/serde/Display) is the source text.
///

#[derive(Clone, Debug)]
pub struct LikePattern {
    source: String,
    compiled: Regex,
}

impl LikePattern {
    pub fn new(source: impl Into<String>) -> Result<Self, PatternError> {
        let source = source.into();
        let compiled = compile(&source)?;

        Ok(Self { source, compiled })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Match the full candidate text against the pattern.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }
}

// Translate the wildcard source into an anchored regex.
fn compile(source: &str) -> Result<Regex, PatternError> {
    let mut expr = String::with_capacity(source.len() + 8);
    expr.push('^');

    let mut chars = source.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => expr.push_str(&regex::escape(&escaped.to_string())),
                None => {
                    return Err(PatternError::DanglingEscape {
                        source_text: source.to_string(),
                    });
                }
            },
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');

    Regex::new(&expr).map_err(|err| PatternError::Compile {
        source_text: source.to_string(),
        message: err.to_string(),
    })
}

impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for LikePattern {}

impl Hash for LikePattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl fmt::Display for LikePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl Serialize for LikePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for LikePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(source).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_any_run() {
        let pattern = LikePattern::new("ab*yz").expect("pattern should compile");
        assert!(pattern.matches("abyz"));
        assert!(pattern.matches("ab---yz"));
        assert!(!pattern.matches("ab---y"));
    }

    #[test]
    fn question_matches_exactly_one() {
        let pattern = LikePattern::new("a?c").expect("pattern should compile");
        assert!(pattern.matches("abc"));
        assert!(!pattern.matches("ac"));
        assert!(!pattern.matches("abbc"));
    }

    #[test]
    fn metacharacters_are_literal() {
        let pattern = LikePattern::new("a.c+d").expect("pattern should compile");
        assert!(pattern.matches("a.c+d"));
        assert!(!pattern.matches("axc+d"));
    }

    #[test]
    fn escape_makes_wildcards_literal() {
        let pattern = LikePattern::new("100\\*").expect("pattern should compile");
        assert!(pattern.matches("100*"));
        assert!(!pattern.matches("100%"));
    }

    #[test]
    fn dangling_escape_is_rejected() {
        assert!(matches!(
            LikePattern::new("abc\\"),
            Err(PatternError::DanglingEscape { .. })
        ));
    }
}
