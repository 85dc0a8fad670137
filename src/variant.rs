//! Annotation subtypes and the tool variant keys built from them.
//!
//! A tool is identified by its subtype plus an optional variant name, so a
//! plain line and an arrow line are distinct tools even though both produce
//! `Line` annotations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// PDF annotation subtypes the viewer knows how to create or select.
///
/// The discriminants are the numeric subtype codes used by the PDF engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationSubtype {
    Text = 1,
    Link = 2,
    FreeText = 3,
    Line = 4,
    Square = 5,
    Circle = 6,
    Polygon = 7,
    Polyline = 8,
    Highlight = 9,
    Underline = 10,
    Squiggly = 11,
    Strikeout = 12,
    Stamp = 13,
    Caret = 14,
    Ink = 15,
    Popup = 16,
    FileAttachment = 17,
    Widget = 20,
    Redact = 28,
}

impl AnnotationSubtype {
    pub const ALL: [AnnotationSubtype; 19] = [
        AnnotationSubtype::Text,
        AnnotationSubtype::Link,
        AnnotationSubtype::FreeText,
        AnnotationSubtype::Line,
        AnnotationSubtype::Square,
        AnnotationSubtype::Circle,
        AnnotationSubtype::Polygon,
        AnnotationSubtype::Polyline,
        AnnotationSubtype::Highlight,
        AnnotationSubtype::Underline,
        AnnotationSubtype::Squiggly,
        AnnotationSubtype::Strikeout,
        AnnotationSubtype::Stamp,
        AnnotationSubtype::Caret,
        AnnotationSubtype::Ink,
        AnnotationSubtype::Popup,
        AnnotationSubtype::FileAttachment,
        AnnotationSubtype::Widget,
        AnnotationSubtype::Redact,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            AnnotationSubtype::Text => "text",
            AnnotationSubtype::Link => "link",
            AnnotationSubtype::FreeText => "freeText",
            AnnotationSubtype::Line => "line",
            AnnotationSubtype::Square => "square",
            AnnotationSubtype::Circle => "circle",
            AnnotationSubtype::Polygon => "polygon",
            AnnotationSubtype::Polyline => "polyline",
            AnnotationSubtype::Highlight => "highlight",
            AnnotationSubtype::Underline => "underline",
            AnnotationSubtype::Squiggly => "squiggly",
            AnnotationSubtype::Strikeout => "strikeout",
            AnnotationSubtype::Stamp => "stamp",
            AnnotationSubtype::Caret => "caret",
            AnnotationSubtype::Ink => "ink",
            AnnotationSubtype::Popup => "popup",
            AnnotationSubtype::FileAttachment => "fileAttachment",
            AnnotationSubtype::Widget => "widget",
            AnnotationSubtype::Redact => "redact",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }

    /// Text markup subtypes are created from a text selection rather than drawn.
    pub fn is_text_markup(self) -> bool {
        matches!(
            self,
            AnnotationSubtype::Highlight
                | AnnotationSubtype::Underline
                | AnnotationSubtype::Squiggly
                | AnnotationSubtype::Strikeout
        )
    }
}

impl fmt::Display for AnnotationSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariantKeyError {
    #[error("unknown annotation subtype '{0}'")]
    UnknownSubtype(String),
    #[error("empty variant name in '{0}'")]
    EmptyVariant(String),
}

impl FromStr for AnnotationSubtype {
    type Err = VariantKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| VariantKeyError::UnknownSubtype(s.to_string()))
    }
}

/// Identity of an annotation tool: a subtype plus an optional variant name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    subtype: AnnotationSubtype,
    variant: Option<String>,
}

impl VariantKey {
    pub fn new(subtype: AnnotationSubtype) -> Self {
        Self {
            subtype,
            variant: None,
        }
    }

    pub fn with_variant(subtype: AnnotationSubtype, variant: impl Into<String>) -> Self {
        Self {
            subtype,
            variant: Some(variant.into()),
        }
    }

    pub fn subtype(&self) -> AnnotationSubtype {
        self.subtype
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }
}

/// Builds the key for `subtype`, with `variant` appended when present.
pub fn variant_key(subtype: AnnotationSubtype, variant: Option<&str>) -> VariantKey {
    match variant {
        Some(name) => VariantKey::with_variant(subtype, name),
        None => VariantKey::new(subtype),
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}+{}", self.subtype, variant),
            None => write!(f, "{}", self.subtype),
        }
    }
}

impl FromStr for VariantKey {
    type Err = VariantKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('+') {
            Some((_, "")) => Err(VariantKeyError::EmptyVariant(s.to_string())),
            Some((subtype, variant)) => Ok(VariantKey::with_variant(subtype.parse()?, variant)),
            None => Ok(VariantKey::new(s.parse()?)),
        }
    }
}

impl Serialize for VariantKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VariantKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn plain_and_arrow_lines_are_distinct_tools() {
        let line = variant_key(AnnotationSubtype::Line, None);
        let arrow = variant_key(AnnotationSubtype::Line, Some("LineArrow"));

        assert_ne!(line, arrow);
        assert_eq!(line.to_string(), "line");
        assert_eq!(arrow.to_string(), "line+LineArrow");

        let set: HashSet<_> = [line.clone(), arrow.clone(), line.clone()]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn equal_inputs_give_equal_keys() {
        assert_eq!(
            variant_key(AnnotationSubtype::Stamp, Some("signature")),
            VariantKey::with_variant(AnnotationSubtype::Stamp, "signature")
        );
        assert_eq!(
            variant_key(AnnotationSubtype::Ink, None),
            VariantKey::new(AnnotationSubtype::Ink)
        );
    }

    #[test]
    fn keys_parse_from_their_display_form() {
        let key: VariantKey = "line+LineArrow".parse().unwrap();
        assert_eq!(key.subtype(), AnnotationSubtype::Line);
        assert_eq!(key.variant(), Some("LineArrow"));

        let key: VariantKey = "freeText".parse().unwrap();
        assert_eq!(key, VariantKey::new(AnnotationSubtype::FreeText));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert_eq!(
            "marker".parse::<VariantKey>(),
            Err(VariantKeyError::UnknownSubtype("marker".to_string()))
        );
        assert_eq!(
            "line+".parse::<VariantKey>(),
            Err(VariantKeyError::EmptyVariant("line+".to_string()))
        );
    }

    #[test]
    fn subtype_codes_match_pdf_numbering() {
        assert_eq!(AnnotationSubtype::Highlight.code(), 9);
        assert_eq!(AnnotationSubtype::Ink.code(), 15);
        assert!(AnnotationSubtype::Squiggly.is_text_markup());
        assert!(!AnnotationSubtype::Circle.is_text_markup());
    }

    #[test]
    fn subtypes_serialize_by_name() {
        for subtype in AnnotationSubtype::ALL {
            let json = serde_json::to_string(&subtype).unwrap();
            assert_eq!(json, format!("\"{}\"", subtype.name()));
            let back: AnnotationSubtype = serde_json::from_str(&json).unwrap();
            assert_eq!(back, subtype);
        }
    }

    #[test]
    fn keys_serialize_as_strings() {
        let key = VariantKey::with_variant(AnnotationSubtype::Line, "LineArrow");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"line+LineArrow\"");
        let back: VariantKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
