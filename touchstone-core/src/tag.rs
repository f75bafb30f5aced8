//! The declarative tag vocabulary attached to bundle fields.

use std::fmt::{self, Display, Formatter};

/// Value of [`Tag::Ignore`] that causes a field to be skipped.
pub const IGNORE: &str = "-";

/// Value of [`Tag::Type`] selecting a histogram for an observer field.
pub const TYPE_HISTOGRAM: &str = "histogram";

/// Value of [`Tag::Type`] selecting a summary for an observer field.
pub const TYPE_SUMMARY: &str = "summary";

/// A recognized field tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    /// Set to [`IGNORE`] to leave the field unpopulated.
    Ignore,
    /// Metric namespace. Falls back to the factory default.
    Namespace,
    /// Metric subsystem. Falls back to the factory default.
    Subsystem,
    /// Metric name. The first `*` is replaced by the snake case field name.
    Name,
    Help,
    /// Comma separated histogram buckets, e.g. `"0.1, 0.5, 1.0"`.
    Buckets,
    /// Comma separated `quantile:error` summary objectives, e.g. `"0.5:0.05, 0.9:0.01"`.
    Objectives,
    /// Summary max age, e.g. `"10m"`.
    MaxAge,
    AgeBuckets,
    BufCap,
    /// Comma separated label names. Required for vectors and forbidden otherwise.
    LabelNames,
    /// Either [`TYPE_HISTOGRAM`] or [`TYPE_SUMMARY`]. Only valid on observer fields.
    Type,
}

/// Tags that only apply to histograms.
pub const HISTOGRAM_TAGS: &[Tag] = &[Tag::Buckets];

/// Tags that only apply to summaries.
pub const SUMMARY_TAGS: &[Tag] = &[Tag::Objectives, Tag::MaxAge, Tag::AgeBuckets, Tag::BufCap];

/// Tags that only apply to histograms or summaries.
pub const OBSERVER_TAGS: &[Tag] = &[
    Tag::Buckets,
    Tag::Objectives,
    Tag::MaxAge,
    Tag::AgeBuckets,
    Tag::BufCap,
];

impl Tag {
    pub const ALL: &'static [Tag] = &[
        Tag::Ignore,
        Tag::Namespace,
        Tag::Subsystem,
        Tag::Name,
        Tag::Help,
        Tag::Buckets,
        Tag::Objectives,
        Tag::MaxAge,
        Tag::AgeBuckets,
        Tag::BufCap,
        Tag::LabelNames,
        Tag::Type,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Tag::Ignore => "ignore",
            Tag::Namespace => "namespace",
            Tag::Subsystem => "subsystem",
            Tag::Name => "name",
            Tag::Help => "help",
            Tag::Buckets => "buckets",
            Tag::Objectives => "objectives",
            Tag::MaxAge => "max_age",
            Tag::AgeBuckets => "age_buckets",
            Tag::BufCap => "buf_cap",
            Tag::LabelNames => "label_names",
            Tag::Type => "type",
        }
    }

    pub fn from_key(key: &str) -> Option<Tag> {
        Tag::ALL.iter().copied().find(|tag| tag.key() == key)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The tags declared on one field, in declaration order.
///
/// Presence and value are distinct: a tag declared with an empty value is present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tags(Vec<(Tag, String)>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a tag, replacing any earlier value.
    pub fn insert(&mut self, tag: Tag, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(t, _)| *t == tag) {
            Some(entry) => entry.1 = value,
            None => self.0.push((tag, value)),
        }
    }

    pub fn with(mut self, tag: Tag, value: impl Into<String>) -> Self {
        self.insert(tag, value);
        self
    }

    pub fn lookup(&self, tag: Tag) -> Option<&str> {
        self.0
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the tag value, or the empty string when the tag is absent.
    pub fn get(&self, tag: Tag) -> &str {
        self.lookup(tag).unwrap_or_default()
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.lookup(tag).is_some()
    }

    pub fn contains_any(&self, tags: &[Tag]) -> bool {
        tags.iter().any(|tag| self.contains(*tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tag, &str)> {
        self.0.iter().map(|(t, v)| (*t, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(Tag, S)> for Tags {
    fn from_iter<I: IntoIterator<Item = (Tag, S)>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for (tag, value) in iter {
            tags.insert(tag, value);
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        for tag in Tag::ALL {
            assert_eq!(Tag::from_key(tag.key()), Some(*tag));
        }
        assert_eq!(Tag::from_key("labelNames"), None);
    }

    #[test]
    fn test_presence_is_not_value() {
        let tags = Tags::new().with(Tag::LabelNames, "");

        assert!(tags.contains(Tag::LabelNames));
        assert_eq!(tags.lookup(Tag::LabelNames), Some(""));
        assert!(!tags.contains(Tag::Help));
        assert_eq!(tags.get(Tag::Help), "");
    }

    #[test]
    fn test_insert_replaces() {
        let tags: Tags = [(Tag::Name, "first"), (Tag::Help, "help"), (Tag::Name, "second")]
            .into_iter()
            .collect();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get(Tag::Name), "second");
        assert_eq!(
            tags.iter().map(|(t, _)| t).collect::<Vec<_>>(),
            vec![Tag::Name, Tag::Help]
        );
    }

    #[test]
    fn test_contains_any() {
        let tags = Tags::new().with(Tag::MaxAge, "1m");
        assert!(tags.contains_any(SUMMARY_TAGS));
        assert!(!tags.contains_any(HISTOGRAM_TAGS));
    }
}
