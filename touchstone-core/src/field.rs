//! Bundle fields and the parsing of their tags.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use crate::error::{Errors, FieldError};
use crate::name::metric_name;
use crate::tag::{IGNORE, Tag, Tags};

/// The static type of a bundle field, as far as metrics are concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Counter,
    CounterVec,
    Gauge,
    GaugeVec,
    Histogram,
    HistogramVec,
    Summary,
    SummaryVec,
    /// A histogram or a summary, decided by the field's tags.
    Observer,
    /// A histogram vector or a summary vector, decided by the field's tags.
    ObserverVec,
    /// Anything that is not a metric handle. Such fields are left alone.
    Other,
}

impl FieldKind {
    pub const METRICS: &'static [FieldKind] = &[
        FieldKind::Counter,
        FieldKind::CounterVec,
        FieldKind::Gauge,
        FieldKind::GaugeVec,
        FieldKind::Histogram,
        FieldKind::HistogramVec,
        FieldKind::Summary,
        FieldKind::SummaryVec,
        FieldKind::Observer,
        FieldKind::ObserverVec,
    ];

    pub const fn type_name(self) -> &'static str {
        match self {
            FieldKind::Counter => "Counter",
            FieldKind::CounterVec => "CounterVec",
            FieldKind::Gauge => "Gauge",
            FieldKind::GaugeVec => "GaugeVec",
            FieldKind::Histogram => "Histogram",
            FieldKind::HistogramVec => "HistogramVec",
            FieldKind::Summary => "Summary",
            FieldKind::SummaryVec => "SummaryVec",
            FieldKind::Observer => "Observer",
            FieldKind::ObserverVec => "ObserverVec",
            FieldKind::Other => "_",
        }
    }

    /// Maps the last path segment of a type, e.g. `CounterVec` for
    /// `prometheus::CounterVec`, to its kind.
    pub fn from_type_name(name: &str) -> FieldKind {
        FieldKind::METRICS
            .iter()
            .copied()
            .find(|kind| kind.type_name() == name)
            .unwrap_or(FieldKind::Other)
    }

    pub const fn is_vec(self) -> bool {
        matches!(
            self,
            FieldKind::CounterVec
                | FieldKind::GaugeVec
                | FieldKind::HistogramVec
                | FieldKind::SummaryVec
                | FieldKind::ObserverVec
        )
    }

    pub const fn is_metric(self) -> bool {
        !matches!(self, FieldKind::Other)
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One field of a bundle: its identifier, static type and tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    ident: String,
    type_name: String,
    kind: FieldKind,
    exported: bool,
    embedded: bool,
    tags: Tags,
}

impl Field {
    pub fn new(ident: impl Into<String>, type_name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            ident: ident.into(),
            type_name: type_name.into(),
            kind,
            exported: true,
            embedded: false,
            tags: Tags::new(),
        }
    }

    /// A field whose type name is the kind's own name.
    pub fn of_kind(ident: impl Into<String>, kind: FieldKind) -> Self {
        Self::new(ident, kind.type_name(), kind)
    }

    pub fn tag(mut self, tag: Tag, value: impl Into<String>) -> Self {
        self.tags.insert(tag, value);
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Marks the field as not visible to the bundle's user. Such fields are skipped.
    pub fn unexported(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Marks the field as an embedded, anonymous field. Such fields are skipped.
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Tests if this field should not be populated.
    pub fn skip(&self) -> bool {
        !self.exported || self.embedded || self.tags.get(Tag::Ignore) == IGNORE
    }

    /// The metric name for this field. See [`metric_name`].
    pub fn name(&self) -> String {
        metric_name(&self.ident, self.tags.lookup(Tag::Name))
    }

    pub fn help(&self) -> &str {
        self.tags.get(Tag::Help)
    }

    pub fn namespace(&self) -> &str {
        self.tags.get(Tag::Namespace)
    }

    pub fn subsystem(&self) -> &str {
        self.tags.get(Tag::Subsystem)
    }

    /// Parses the comma separated buckets. No tag means no buckets.
    pub fn buckets(&self, errors: &mut Errors) -> Vec<f64> {
        let value = self.tags.get(Tag::Buckets);
        if value.is_empty() {
            return Vec::new();
        }

        value
            .split(',')
            .filter_map(|b| self.parse(errors, b.trim().parse::<f64>()))
            .collect()
    }

    /// Parses the comma separated `quantile:error` objectives. Every malformed entry
    /// is reported.
    pub fn objectives(&self, errors: &mut Errors) -> Vec<(f64, f64)> {
        let value = self.tags.get(Tag::Objectives);
        if value.is_empty() {
            return Vec::new();
        }

        let mut objectives: Vec<(f64, f64)> = Vec::new();
        for entry in value.split(',') {
            let pair: Vec<&str> = entry.split(':').collect();
            let [quantile, error] = pair[..] else {
                errors.push(self.error(format!("Invalid objective entry '{entry}'")));
                continue;
            };

            let quantile = self.parse(errors, quantile.trim().parse::<f64>());
            let error = self.parse(errors, error.trim().parse::<f64>());
            if let (Some(quantile), Some(error)) = (quantile, error) {
                match objectives.iter_mut().find(|(q, _)| *q == quantile) {
                    Some(existing) => existing.1 = error,
                    None => objectives.push((quantile, error)),
                }
            }
        }

        objectives
    }

    /// Parses the max age, e.g. `10m` or `1h 30m`. No tag means zero.
    pub fn max_age(&self, errors: &mut Errors) -> Duration {
        let value = self.tags.get(Tag::MaxAge);
        if value.is_empty() {
            return Duration::ZERO;
        }

        self.parse(errors, humantime::parse_duration(value))
            .unwrap_or_default()
    }

    pub fn age_buckets(&self, errors: &mut Errors) -> u32 {
        self.parse_u32(Tag::AgeBuckets, errors)
    }

    pub fn buf_cap(&self, errors: &mut Errors) -> u32 {
        self.parse_u32(Tag::BufCap, errors)
    }

    fn parse_u32(&self, tag: Tag, errors: &mut Errors) -> u32 {
        let value = self.tags.get(tag);
        if value.is_empty() {
            return 0;
        }

        self.parse(errors, value.parse::<u32>()).unwrap_or_default()
    }

    /// Parses the comma separated label names. Vector metrics need at least one, so
    /// an absent or empty tag is an error.
    pub fn label_names(&self, errors: &mut Errors) -> Vec<String> {
        let names: Vec<String> = self
            .tags
            .get(Tag::LabelNames)
            .split(',')
            .map(|n| n.trim().to_string())
            .collect();

        if let [only] = names.as_slice() {
            if only.is_empty() {
                errors.push(self.error(format!(
                    "tag '{}' is required and cannot be empty for vector metrics",
                    Tag::LabelNames
                )));
            }
        }

        names
    }

    pub fn has_any(&self, tags: &[Tag]) -> bool {
        self.tags.contains_any(tags)
    }

    /// Reports each of the given tags that is present on this field as not allowed.
    pub fn check_not_allowed(&self, errors: &mut Errors, tags: &[Tag]) {
        self.check_invalid(errors, tags, "not allowed");
    }

    /// Reports each of the given tags that is present on this field as ambiguous.
    pub fn check_ambiguous(&self, errors: &mut Errors, tags: &[Tag]) {
        self.check_invalid(errors, tags, "ambiguous");
    }

    fn check_invalid(&self, errors: &mut Errors, tags: &[Tag], rule: &str) {
        for tag in tags.iter().filter(|t| self.tags.contains(**t)) {
            errors.push(self.error(format!("tag '{tag}' is {rule}")));
        }
    }

    pub fn error(&self, message: impl Into<String>) -> FieldError {
        FieldError {
            field: self.ident.clone(),
            field_type: self.type_name.clone(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn wrap_error<E>(&self, cause: E) -> FieldError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FieldError {
            field: self.ident.clone(),
            field_type: self.type_name.clone(),
            message: cause.to_string(),
            cause: Some(Box::new(cause)),
        }
    }

    fn parse<T, E>(&self, errors: &mut Errors, result: Result<T, E>) -> Option<T>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        errors.check(result.map_err(|e| self.wrap_error(e)))
    }
}
