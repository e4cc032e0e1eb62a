//! Splitting one model reply into the three method sections.
//!
//! The scan is lenient. It looks for the literal `2. MethodB:` and
//! `3. MethodC:` markers left to right and never fails: when the model
//! ignores the requested format the missing sections come back as
//! [`MethodText::NotGenerated`].
//!
//! The split happens at the *first* occurrence of each marker. A marker that
//! appears inside method A's own prose therefore truncates method A.

use triad_types::{MethodIndex, NonEmptyString, first_line};

pub const METHOD_A_MARKER: &str = "1. MethodA:";
pub const METHOD_B_MARKER: &str = "2. MethodB:";
pub const METHOD_C_MARKER: &str = "3. MethodC:";

/// Shown wherever an empty section would otherwise render as blank.
pub const NOT_GENERATED_PLACEHOLDER: &str = "(not generated)";

/// One section of a [`MethodSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodText {
    Generated(NonEmptyString),
    NotGenerated,
}

impl MethodText {
    fn from_segment(segment: &str) -> Self {
        NonEmptyString::trimmed(segment).map_or(MethodText::NotGenerated, MethodText::Generated)
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            MethodText::Generated(text) => Some(text.as_str()),
            MethodText::NotGenerated => None,
        }
    }

    #[must_use]
    pub fn is_generated(&self) -> bool {
        matches!(self, MethodText::Generated(_))
    }

    /// Full text, or the placeholder.
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.text().unwrap_or(NOT_GENERATED_PLACEHOLDER)
    }

    /// Heading line used in method lists.
    #[must_use]
    pub fn preview(&self) -> &str {
        self.text().map_or(NOT_GENERATED_PLACEHOLDER, first_line)
    }
}

/// Exactly three sections, in A, B, C order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSet([MethodText; 3]);

impl MethodSet {
    #[must_use]
    pub fn new(entries: [MethodText; 3]) -> Self {
        Self(entries)
    }

    #[must_use]
    pub fn get(&self, index: MethodIndex) -> &MethodText {
        &self.0[index.position()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (MethodIndex, &MethodText)> {
        MethodIndex::ALL.into_iter().zip(self.0.iter())
    }

    /// How many sections the model actually produced.
    #[must_use]
    pub fn generated_count(&self) -> usize {
        self.0.iter().filter(|m| m.is_generated()).count()
    }

    /// Section texts with `""` standing in for missing sections.
    #[must_use]
    pub fn as_strs(&self) -> [&str; 3] {
        [
            self.0[0].text().unwrap_or(""),
            self.0[1].text().unwrap_or(""),
            self.0[2].text().unwrap_or(""),
        ]
    }
}

/// Marker-substring splitter for method replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseSegmenter {
    second_marker: &'static str,
    third_marker: &'static str,
}

impl Default for ResponseSegmenter {
    fn default() -> Self {
        Self::new(METHOD_B_MARKER, METHOD_C_MARKER)
    }
}

impl ResponseSegmenter {
    #[must_use]
    pub const fn new(second_marker: &'static str, third_marker: &'static str) -> Self {
        Self {
            second_marker,
            third_marker,
        }
    }

    #[must_use]
    pub fn segment(&self, reply: &str) -> MethodSet {
        let [a, b, c] = self.split(reply);
        let set = MethodSet::new([
            MethodText::from_segment(a),
            MethodText::from_segment(b),
            MethodText::from_segment(c),
        ]);
        if set.generated_count() < 3 {
            tracing::warn!(
                generated = set.generated_count(),
                "Method reply did not contain all three sections"
            );
        }
        set
    }

    fn split<'a>(&self, reply: &'a str) -> [&'a str; 3] {
        let (first, remainder) = match reply.find(self.second_marker) {
            Some(at) => (reply[..at].trim(), reply[at..].trim()),
            None => (reply.trim(), ""),
        };
        let (second, third) = match remainder.find(self.third_marker) {
            Some(at) => (remainder[..at].trim(), remainder[at..].trim()),
            None => (remainder, ""),
        };
        [first, second, third]
    }
}
