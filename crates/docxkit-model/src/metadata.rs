//! Document properties for `docProps/core.xml` and `docProps/app.xml`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptive document properties
///
/// Replaced as a whole through `Document::set_metadata`. Unset timestamps are
/// filled in at packaging time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: Option<String>,
    pub subject: Option<String>,
    /// `dc:creator`
    pub creator: Option<String>,
    pub keywords: Vec<String>,
    pub description: Option<String>,
    pub last_modified_by: Option<String>,
    pub revision: Option<u32>,
    pub category: Option<String>,
    /// Extended property, written to `app.xml`
    pub company: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Keywords joined the way `cp:keywords` stores them
    pub fn keywords_joined(&self) -> Option<String> {
        (!self.keywords.is_empty()).then(|| self.keywords.join(", "))
    }

    /// Split a `cp:keywords` value
    pub fn parse_keywords(value: &str) -> Vec<String> {
        value
            .split([',', ';'])
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_round_trip() {
        let meta = Metadata::new().with_keywords(["docx", "rust"]);
        let joined = meta.keywords_joined().unwrap();
        assert_eq!(joined, "docx, rust");
        assert_eq!(Metadata::parse_keywords(&joined), meta.keywords);
        assert_eq!(Metadata::parse_keywords(" a;b ,, "), vec!["a", "b"]);
        assert!(Metadata::new().keywords_joined().is_none());
    }
}
