//! Creates metrics and registers them with a [`Registry`].

use std::fmt;

use prometheus::core::Collector;
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
};

use crate::config::Config;
use crate::error::Error;
use crate::func::{CounterFunc, GaugeFunc, Sample, UntypedFunc};
use crate::metric::Metric;
use crate::observer::{Observer, ObserverVec};
use crate::opts::{MetricOpts, apply_defaults};
use crate::summary::{Summary, SummaryOpts, SummaryVec};

/// Creates and registers metrics on behalf of bundles.
///
/// Implementations decide where metrics are registered. The errors they return are
/// aggregated as-is by [`populate`](crate::populate).
pub trait MetricFactory {
    /// Creates a metric of the kind selected by the variant of `opts`.
    fn new_metric(&self, opts: MetricOpts) -> Result<Metric, Error>;

    /// Creates a vector metric of the kind selected by the variant of `opts`.
    fn new_vec(&self, opts: MetricOpts, label_names: &[String]) -> Result<Metric, Error>;
}

/// A [`MetricFactory`] that registers everything it creates with one registry.
///
/// Options that leave the namespace or subsystem empty get the defaults from the
/// [`Config`]. A metric without help text is registered with its name as help.
#[derive(Clone)]
pub struct Factory {
    namespace: String,
    subsystem: String,
    registry: Registry,
}

impl Factory {
    pub fn new(config: &Config, registry: Registry) -> Self {
        Self {
            namespace: config.default_namespace.clone(),
            subsystem: config.default_subsystem.clone(),
            registry,
        }
    }

    pub fn default_namespace(&self) -> &str {
        &self.namespace
    }

    pub fn default_subsystem(&self) -> &str {
        &self.subsystem
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn new_counter(&self, mut opts: Opts) -> Result<Counter, Error> {
        self.prepare(&mut opts)?;
        self.register(Counter::with_opts(opts)?)
    }

    pub fn new_counter_vec(
        &self,
        mut opts: Opts,
        label_names: &[&str],
    ) -> Result<CounterVec, Error> {
        self.prepare(&mut opts)?;
        self.register(CounterVec::new(opts, label_names)?)
    }

    pub fn new_gauge(&self, mut opts: Opts) -> Result<Gauge, Error> {
        self.prepare(&mut opts)?;
        self.register(Gauge::with_opts(opts)?)
    }

    pub fn new_gauge_vec(&self, mut opts: Opts, label_names: &[&str]) -> Result<GaugeVec, Error> {
        self.prepare(&mut opts)?;
        self.register(GaugeVec::new(opts, label_names)?)
    }

    pub fn new_histogram(&self, mut opts: HistogramOpts) -> Result<Histogram, Error> {
        self.prepare(&mut opts.common_opts)?;
        self.register(Histogram::with_opts(opts)?)
    }

    pub fn new_histogram_vec(
        &self,
        mut opts: HistogramOpts,
        label_names: &[&str],
    ) -> Result<HistogramVec, Error> {
        self.prepare(&mut opts.common_opts)?;
        self.register(HistogramVec::new(opts, label_names)?)
    }

    pub fn new_summary(&self, mut opts: SummaryOpts) -> Result<Summary, Error> {
        self.prepare(&mut opts.common_opts)?;
        self.register(Summary::with_opts(opts)?)
    }

    pub fn new_summary_vec(
        &self,
        mut opts: SummaryOpts,
        label_names: &[&str],
    ) -> Result<SummaryVec, Error> {
        self.prepare(&mut opts.common_opts)?;
        self.register(SummaryVec::new(opts, label_names)?)
    }

    /// Creates a counter that reports the value returned by `f`.
    pub fn new_counter_fn<F, N>(&self, mut opts: Opts, f: F) -> Result<CounterFunc, Error>
    where
        F: Fn() -> N + Send + Sync + 'static,
        N: Sample,
    {
        self.prepare(&mut opts)?;
        self.register(CounterFunc::new(opts, f)?)
    }

    /// Creates a gauge that reports the value returned by `f`.
    pub fn new_gauge_fn<F, N>(&self, mut opts: Opts, f: F) -> Result<GaugeFunc, Error>
    where
        F: Fn() -> N + Send + Sync + 'static,
        N: Sample,
    {
        self.prepare(&mut opts)?;
        self.register(GaugeFunc::new(opts, f)?)
    }

    /// Creates an untyped metric that reports the value returned by `f`, which may be
    /// any primitive number, e.g. `|| queue.len()`.
    pub fn new_untyped_fn<F, N>(&self, mut opts: Opts, f: F) -> Result<UntypedFunc, Error>
    where
        F: Fn() -> N + Send + Sync + 'static,
        N: Sample,
    {
        self.prepare(&mut opts)?;
        self.register(UntypedFunc::new(opts, f)?)
    }

    /// Creates a histogram or a summary depending on the options.
    pub fn new_observer(&self, opts: MetricOpts) -> Result<Observer, Error> {
        match opts {
            MetricOpts::Histogram(opts) => self.new_histogram(opts).map(Observer::Histogram),
            MetricOpts::Summary(opts) => self.new_summary(opts).map(Observer::Summary),
            other => Err(Error::NotAnObserver { kind: other.kind() }),
        }
    }

    /// Creates a histogram vector or a summary vector depending on the options.
    pub fn new_observer_vec(
        &self,
        opts: MetricOpts,
        label_names: &[&str],
    ) -> Result<ObserverVec, Error> {
        match opts {
            MetricOpts::Histogram(opts) => self
                .new_histogram_vec(opts, label_names)
                .map(ObserverVec::Histogram),
            MetricOpts::Summary(opts) => self
                .new_summary_vec(opts, label_names)
                .map(ObserverVec::Summary),
            other => Err(Error::NotAnObserver { kind: other.kind() }),
        }
    }

    fn prepare(&self, opts: &mut Opts) -> Result<(), Error> {
        if opts.name.is_empty() {
            return Err(Error::NoMetricName);
        }

        apply_defaults(opts, &self.namespace, &self.subsystem);
        if opts.help.is_empty() {
            tracing::warn!(name = %opts.fq_name(), "no help set for metric");
            opts.help = opts.name.clone();
        }

        Ok(())
    }

    fn register<C>(&self, collector: C) -> Result<C, Error>
    where
        C: Collector + Clone + 'static,
    {
        self.registry.register(Box::new(collector.clone()))?;

        if let Some(desc) = collector.desc().first() {
            tracing::debug!(name = %desc.fq_name, "registered metric");
        }

        Ok(collector)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("namespace", &self.namespace)
            .field("subsystem", &self.subsystem)
            .finish_non_exhaustive()
    }
}

impl MetricFactory for Factory {
    fn new_metric(&self, opts: MetricOpts) -> Result<Metric, Error> {
        Ok(match opts {
            MetricOpts::Counter(opts) => self.new_counter(opts)?.into(),
            MetricOpts::Gauge(opts) => self.new_gauge(opts)?.into(),
            MetricOpts::Histogram(opts) => self.new_histogram(opts)?.into(),
            MetricOpts::Summary(opts) => self.new_summary(opts)?.into(),
        })
    }

    fn new_vec(&self, opts: MetricOpts, label_names: &[String]) -> Result<Metric, Error> {
        let label_names: Vec<&str> = label_names.iter().map(String::as_str).collect();

        Ok(match opts {
            MetricOpts::Counter(opts) => self.new_counter_vec(opts, &label_names)?.into(),
            MetricOpts::Gauge(opts) => self.new_gauge_vec(opts, &label_names)?.into(),
            MetricOpts::Histogram(opts) => self.new_histogram_vec(opts, &label_names)?.into(),
            MetricOpts::Summary(opts) => self.new_summary_vec(opts, &label_names)?.into(),
        })
    }
}
