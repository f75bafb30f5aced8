use prometheus::{HistogramOpts, Opts};

use crate::summary::SummaryOpts;

/// Construction options for one metric, one variant per kind of metric.
#[derive(Clone, Debug)]
pub enum MetricOpts {
    Counter(Opts),
    Gauge(Opts),
    Histogram(HistogramOpts),
    Summary(SummaryOpts),
}

impl MetricOpts {
    pub fn common_opts(&self) -> &Opts {
        match self {
            MetricOpts::Counter(o) | MetricOpts::Gauge(o) => o,
            MetricOpts::Histogram(o) => &o.common_opts,
            MetricOpts::Summary(o) => &o.common_opts,
        }
    }

    pub fn common_opts_mut(&mut self) -> &mut Opts {
        match self {
            MetricOpts::Counter(o) | MetricOpts::Gauge(o) => o,
            MetricOpts::Histogram(o) => &mut o.common_opts,
            MetricOpts::Summary(o) => &mut o.common_opts,
        }
    }

    pub fn name(&self) -> &str {
        &self.common_opts().name
    }

    pub fn help(&self) -> &str {
        &self.common_opts().help
    }

    /// The name joined with any namespace and subsystem.
    pub fn fq_name(&self) -> String {
        self.common_opts().fq_name()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MetricOpts::Counter(_) => "counter",
            MetricOpts::Gauge(_) => "gauge",
            MetricOpts::Histogram(_) => "histogram",
            MetricOpts::Summary(_) => "summary",
        }
    }

    /// Fills an empty namespace or subsystem from the given defaults.
    pub fn apply_defaults(&mut self, namespace: &str, subsystem: &str) {
        apply_defaults(self.common_opts_mut(), namespace, subsystem);
    }
}

/// Fills an empty namespace or subsystem from the given defaults. Values already
/// set on `opts` are kept.
pub fn apply_defaults(opts: &mut Opts, namespace: &str, subsystem: &str) {
    if opts.namespace.is_empty() {
        opts.namespace = namespace.to_string();
    }

    if opts.subsystem.is_empty() {
        opts.subsystem = subsystem.to_string();
    }
}

impl From<Opts> for MetricOpts {
    fn from(opts: Opts) -> Self {
        MetricOpts::Counter(opts)
    }
}

impl From<HistogramOpts> for MetricOpts {
    fn from(opts: HistogramOpts) -> Self {
        MetricOpts::Histogram(opts)
    }
}

impl From<SummaryOpts> for MetricOpts {
    fn from(opts: SummaryOpts) -> Self {
        MetricOpts::Summary(opts)
    }
}
