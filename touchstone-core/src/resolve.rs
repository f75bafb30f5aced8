//! Maps a field's kind and tags onto metric construction options.

use prometheus::{DEFAULT_BUCKETS, HistogramOpts, Opts};

use crate::error::Errors;
use crate::field::{Field, FieldKind};
use crate::opts::MetricOpts;
use crate::summary::SummaryOpts;
use crate::tag::{HISTOGRAM_TAGS, OBSERVER_TAGS, SUMMARY_TAGS, TYPE_HISTOGRAM, TYPE_SUMMARY, Tag};

/// The outcome of resolving one field.
///
/// `opts` is `None` for fields that are not metrics, and for observers whose type
/// could not be decided. `errors` may be non-empty even when `opts` is set.
#[derive(Debug, Default)]
pub struct Resolved {
    pub opts: Option<MetricOpts>,
    pub label_names: Vec<String>,
    pub errors: Errors,
}

impl Resolved {
    /// Tests if the factory should be asked to create this metric.
    pub fn is_usable(&self) -> bool {
        self.opts.is_some() && self.errors.is_empty()
    }
}

impl Field {
    /// Resolves the options and label names for this field, checking which tags are
    /// legal for its kind.
    pub fn new_opts(&self) -> Resolved {
        let mut errors = Errors::new();
        let mut label_names = Vec::new();

        let opts = match self.kind() {
            FieldKind::Counter => {
                let opts = self.plain_opts(&mut errors);
                self.check_not_allowed(&mut errors, &[Tag::Type, Tag::LabelNames]);
                Some(MetricOpts::Counter(opts))
            }
            FieldKind::CounterVec => {
                let opts = self.plain_opts(&mut errors);
                self.check_not_allowed(&mut errors, &[Tag::Type]);
                label_names = self.label_names(&mut errors);
                Some(MetricOpts::Counter(opts))
            }
            FieldKind::Gauge => {
                let opts = self.plain_opts(&mut errors);
                self.check_not_allowed(&mut errors, &[Tag::Type, Tag::LabelNames]);
                Some(MetricOpts::Gauge(opts))
            }
            FieldKind::GaugeVec => {
                let opts = self.plain_opts(&mut errors);
                self.check_not_allowed(&mut errors, &[Tag::Type]);
                label_names = self.label_names(&mut errors);
                Some(MetricOpts::Gauge(opts))
            }
            FieldKind::Histogram => {
                let opts = self.histogram_opts(&mut errors);
                self.check_not_allowed(&mut errors, &[Tag::Type, Tag::LabelNames]);
                self.check_not_allowed(&mut errors, SUMMARY_TAGS);
                Some(MetricOpts::Histogram(opts))
            }
            FieldKind::HistogramVec => {
                let opts = self.histogram_opts(&mut errors);
                self.check_not_allowed(&mut errors, &[Tag::Type]);
                self.check_not_allowed(&mut errors, SUMMARY_TAGS);
                label_names = self.label_names(&mut errors);
                Some(MetricOpts::Histogram(opts))
            }
            FieldKind::Summary => {
                let opts = self.summary_opts(&mut errors);
                self.check_not_allowed(&mut errors, &[Tag::Type, Tag::LabelNames]);
                self.check_not_allowed(&mut errors, HISTOGRAM_TAGS);
                Some(MetricOpts::Summary(opts))
            }
            FieldKind::SummaryVec => {
                let opts = self.summary_opts(&mut errors);
                self.check_not_allowed(&mut errors, &[Tag::Type]);
                self.check_not_allowed(&mut errors, HISTOGRAM_TAGS);
                label_names = self.label_names(&mut errors);
                Some(MetricOpts::Summary(opts))
            }
            FieldKind::Observer => {
                let opts = self.observer_opts(&mut errors);
                self.check_not_allowed(&mut errors, &[Tag::LabelNames]);
                opts
            }
            FieldKind::ObserverVec => {
                let opts = self.observer_opts(&mut errors);
                label_names = self.label_names(&mut errors);
                opts
            }
            FieldKind::Other => None,
        };

        Resolved {
            opts,
            label_names,
            errors,
        }
    }

    /// Options for counters and gauges, neither of which takes observer tags.
    fn plain_opts(&self, errors: &mut Errors) -> Opts {
        self.check_not_allowed(errors, OBSERVER_TAGS);
        self.common_opts()
    }

    fn histogram_opts(&self, errors: &mut Errors) -> HistogramOpts {
        let mut buckets = self.buckets(errors);
        if buckets.is_empty() {
            buckets = DEFAULT_BUCKETS.to_vec();
        }

        HistogramOpts {
            common_opts: self.common_opts(),
            buckets,
        }
    }

    fn summary_opts(&self, errors: &mut Errors) -> SummaryOpts {
        let mut opts = SummaryOpts::from(self.common_opts());
        for (quantile, error) in self.objectives(errors) {
            opts = opts.objective(quantile, error);
        }

        opts.max_age(self.max_age(errors))
            .age_buckets(self.age_buckets(errors))
            .buf_cap(self.buf_cap(errors))
    }

    /// Decides between a histogram and a summary. An explicit type tag wins, then
    /// the presence of any summary tag, then the histogram default. Tags exclusive
    /// to the kind not chosen are ambiguous.
    fn observer_opts(&self, errors: &mut Errors) -> Option<MetricOpts> {
        let (opts, ambiguous) = match self.tags().lookup(Tag::Type).unwrap_or_default() {
            TYPE_HISTOGRAM => (MetricOpts::Histogram(self.histogram_opts(errors)), SUMMARY_TAGS),
            TYPE_SUMMARY => (MetricOpts::Summary(self.summary_opts(errors)), HISTOGRAM_TAGS),
            "" if self.has_any(SUMMARY_TAGS) => {
                (MetricOpts::Summary(self.summary_opts(errors)), HISTOGRAM_TAGS)
            }
            "" => (MetricOpts::Histogram(self.histogram_opts(errors)), SUMMARY_TAGS),
            other => {
                errors.push(self.error(format!("'{other}' is not a valid observer metric type")));
                return None;
            }
        };

        self.check_ambiguous(errors, ambiguous);
        Some(opts)
    }

    fn common_opts(&self) -> Opts {
        Opts::new(self.name(), self.help())
            .namespace(self.namespace())
            .subsystem(self.subsystem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(kind: FieldKind, tags: &[(Tag, &str)]) -> Resolved {
        Field::of_kind("Metric", kind)
            .with_tags(tags.iter().copied().collect())
            .new_opts()
    }

    fn messages(resolved: &Resolved) -> Vec<String> {
        resolved.errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_scalar_kinds() {
        let cases = [
            (FieldKind::Counter, "counter"),
            (FieldKind::Gauge, "gauge"),
            (FieldKind::Histogram, "histogram"),
            (FieldKind::Summary, "summary"),
            (FieldKind::Observer, "histogram"),
        ];

        for (kind, expected) in cases {
            let resolved = resolve(kind, &[(Tag::Help, "some help")]);
            assert!(resolved.is_usable(), "{kind}: {:?}", resolved.errors);
            assert!(resolved.label_names.is_empty());

            let opts = resolved.opts.unwrap();
            assert_eq!(opts.kind(), expected, "{kind}");
            assert_eq!(opts.name(), "metric");
            assert_eq!(opts.help(), "some help");
        }
    }

    #[test]
    fn test_vector_kinds() {
        let cases = [
            (FieldKind::CounterVec, "counter"),
            (FieldKind::GaugeVec, "gauge"),
            (FieldKind::HistogramVec, "histogram"),
            (FieldKind::SummaryVec, "summary"),
            (FieldKind::ObserverVec, "histogram"),
        ];

        for (kind, expected) in cases {
            let resolved = resolve(kind, &[(Tag::LabelNames, "code, method")]);
            assert!(resolved.is_usable(), "{kind}: {:?}", resolved.errors);
            assert_eq!(resolved.label_names, vec!["code", "method"]);
            assert_eq!(resolved.opts.unwrap().kind(), expected, "{kind}");
        }
    }

    #[test]
    fn test_vector_kinds_require_label_names() {
        for kind in FieldKind::METRICS.iter().copied().filter(|k| k.is_vec()) {
            let resolved = resolve(kind, &[]);
            assert!(resolved.opts.is_some());
            assert!(!resolved.is_usable());
            assert_eq!(resolved.errors.len(), 1, "{kind}");
        }
    }

    #[test]
    fn test_scalar_kinds_reject_label_names() {
        for kind in FieldKind::METRICS.iter().copied().filter(|k| !k.is_vec()) {
            let resolved = resolve(kind, &[(Tag::LabelNames, "code")]);
            assert_eq!(
                messages(&resolved),
                vec![format!("'Metric {kind}': tag 'label_names' is not allowed")]
            );
        }
    }

    #[test]
    fn test_type_not_allowed_on_concrete_kinds() {
        for kind in [
            FieldKind::Counter,
            FieldKind::Gauge,
            FieldKind::Histogram,
            FieldKind::Summary,
        ] {
            let resolved = resolve(kind, &[(Tag::Type, TYPE_HISTOGRAM)]);
            assert_eq!(resolved.errors.len(), 1, "{kind}");
            assert!(messages(&resolved)[0].ends_with("tag 'type' is not allowed"));
        }
    }

    #[test]
    fn test_counter_rejects_every_observer_tag() {
        let resolved = resolve(
            FieldKind::Counter,
            &[
                (Tag::Buckets, "1"),
                (Tag::Objectives, "0.5:0.1"),
                (Tag::MaxAge, "1m"),
                (Tag::AgeBuckets, "2"),
                (Tag::BufCap, "10"),
            ],
        );

        assert_eq!(resolved.errors.len(), 5);
        assert!(resolved.opts.is_some());
    }

    #[test]
    fn test_histogram_buckets() {
        let resolved = resolve(FieldKind::Histogram, &[(Tag::Buckets, "0.5, 1, 2.5")]);
        let Some(MetricOpts::Histogram(opts)) = resolved.opts else {
            panic!("expected histogram opts");
        };
        assert_eq!(opts.buckets, vec![0.5, 1.0, 2.5]);

        let resolved = resolve(FieldKind::Histogram, &[]);
        let Some(MetricOpts::Histogram(opts)) = resolved.opts else {
            panic!("expected histogram opts");
        };
        assert_eq!(opts.buckets, DEFAULT_BUCKETS.to_vec());
    }

    #[test]
    fn test_histogram_rejects_summary_tags() {
        let resolved = resolve(
            FieldKind::Histogram,
            &[(Tag::Objectives, "0.5:0.1"), (Tag::BufCap, "4")],
        );
        assert_eq!(
            messages(&resolved),
            vec![
                "'Metric Histogram': tag 'objectives' is not allowed",
                "'Metric Histogram': tag 'buf_cap' is not allowed",
            ]
        );
    }

    #[test]
    fn test_summary_opts() {
        let resolved = resolve(
            FieldKind::Summary,
            &[
                (Tag::Objectives, "0.9:0.01, 0.5:0.05"),
                (Tag::MaxAge, "2m"),
                (Tag::AgeBuckets, "3"),
                (Tag::BufCap, "100"),
            ],
        );
        assert!(resolved.is_usable());

        let Some(MetricOpts::Summary(opts)) = resolved.opts else {
            panic!("expected summary opts");
        };
        assert_eq!(opts.objectives, vec![(0.5, 0.05), (0.9, 0.01)]);
        assert_eq!(opts.max_age, std::time::Duration::from_secs(120));
        assert_eq!(opts.age_buckets, 3);
        assert_eq!(opts.buf_cap, 100);
    }

    #[test]
    fn test_summary_rejects_buckets() {
        let resolved = resolve(
            FieldKind::SummaryVec,
            &[(Tag::LabelNames, "a"), (Tag::Buckets, "1")],
        );
        assert_eq!(
            messages(&resolved),
            vec!["'Metric SummaryVec': tag 'buckets' is not allowed"]
        );
    }

    #[test]
    fn test_observer_explicit_type() {
        let resolved = resolve(FieldKind::Observer, &[(Tag::Type, TYPE_SUMMARY)]);
        assert!(matches!(resolved.opts, Some(MetricOpts::Summary(_))));

        let resolved = resolve(FieldKind::Observer, &[(Tag::Type, TYPE_HISTOGRAM)]);
        assert!(matches!(resolved.opts, Some(MetricOpts::Histogram(_))));
    }

    #[test]
    fn test_observer_detects_summary_tags() {
        for tag in SUMMARY_TAGS {
            let value = match tag {
                Tag::Objectives => "0.5:0.05",
                Tag::MaxAge => "1m",
                _ => "3",
            };
            let resolved = resolve(FieldKind::Observer, &[(*tag, value)]);
            assert!(resolved.is_usable(), "{tag}: {:?}", resolved.errors);
            assert!(matches!(resolved.opts, Some(MetricOpts::Summary(_))), "{tag}");
        }
    }

    #[test]
    fn test_observer_ambiguous_tags() {
        let resolved = resolve(FieldKind::Observer, &[(Tag::Buckets, "1"), (Tag::MaxAge, "1m")]);
        assert!(matches!(resolved.opts, Some(MetricOpts::Summary(_))));
        assert_eq!(
            messages(&resolved),
            vec!["'Metric Observer': tag 'buckets' is ambiguous"]
        );

        let resolved = resolve(
            FieldKind::Observer,
            &[(Tag::Type, TYPE_HISTOGRAM), (Tag::BufCap, "1")],
        );
        assert!(matches!(resolved.opts, Some(MetricOpts::Histogram(_))));
        assert_eq!(
            messages(&resolved),
            vec!["'Metric Observer': tag 'buf_cap' is ambiguous"]
        );
    }

    #[test]
    fn test_observer_invalid_type() {
        let resolved = resolve(
            FieldKind::ObserverVec,
            &[(Tag::Type, "gauge"), (Tag::LabelNames, "a")],
        );
        assert!(resolved.opts.is_none());
        assert_eq!(
            messages(&resolved),
            vec!["'Metric ObserverVec': 'gauge' is not a valid observer metric type"]
        );
    }

    #[test]
    fn test_other_is_silently_skipped() {
        let resolved = Field::new("count", "u64", FieldKind::Other)
            .tag(Tag::Buckets, "nope")
            .new_opts();
        assert!(resolved.opts.is_none());
        assert!(resolved.errors.is_empty());
    }

    #[test]
    fn test_namespace_and_name_tags() {
        let resolved = resolve(
            FieldKind::Counter,
            &[(Tag::Namespace, "ns"), (Tag::Subsystem, "sub"), (Tag::Name, "total_*")],
        );
        assert_eq!(resolved.opts.unwrap().fq_name(), "ns_sub_total_metric");
    }
}
