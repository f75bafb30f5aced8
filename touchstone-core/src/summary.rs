//! A summary metric for the prometheus crate, which only ships histograms.
//!
//! Quantiles are computed over a sliding time window. The window is split into
//! `age_buckets` streams that all receive every observation; the oldest stream is
//! reset every `max_age / age_buckets` and reported from, so it covers roughly the
//! last `max_age`. Each stream keeps at most `buf_cap` samples.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, LabelPair, MetricFamily, MetricType, Quantile};
use prometheus::{Error, Opts, Result};

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_AGE_BUCKETS: u32 = 5;
pub const DEFAULT_BUF_CAP: u32 = 500;

/// The most streams a summary window may be split into.
pub const MAX_AGE_BUCKETS: u32 = 1024;

/// The label name reserved for reporting quantiles.
pub const QUANTILE_LABEL: &str = "quantile";

/// Options for a [`Summary`] or [`SummaryVec`].
///
/// Zero values for `max_age`, `age_buckets` and `buf_cap` select the defaults.
#[derive(Clone, Debug)]
pub struct SummaryOpts {
    pub common_opts: Opts,
    /// Quantile to allowed error, ordered by quantile.
    pub objectives: Vec<(f64, f64)>,
    pub max_age: Duration,
    pub age_buckets: u32,
    pub buf_cap: u32,
}

impl SummaryOpts {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, help: S2) -> Self {
        Self::from(Opts::new(name, help))
    }

    pub fn namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.common_opts.namespace = namespace.into();
        self
    }

    pub fn subsystem<S: Into<String>>(mut self, subsystem: S) -> Self {
        self.common_opts.subsystem = subsystem.into();
        self
    }

    /// Adds an objective, replacing any existing one for the same quantile.
    pub fn objective(mut self, quantile: f64, error: f64) -> Self {
        self.insert_objective(quantile, error);
        self
    }

    pub fn insert_objective(&mut self, quantile: f64, error: f64) {
        match self
            .objectives
            .binary_search_by(|(q, _)| q.total_cmp(&quantile))
        {
            Ok(i) => self.objectives[i].1 = error,
            Err(i) => self.objectives.insert(i, (quantile, error)),
        }
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn age_buckets(mut self, age_buckets: u32) -> Self {
        self.age_buckets = age_buckets;
        self
    }

    pub fn buf_cap(mut self, buf_cap: u32) -> Self {
        self.buf_cap = buf_cap;
        self
    }

    pub fn fq_name(&self) -> String {
        self.common_opts.fq_name()
    }

    fn describe(&self, label_names: &[&str]) -> Result<Desc> {
        if let Some((q, _)) = self
            .objectives
            .iter()
            .find(|(q, _)| !(0.0..=1.0).contains(q))
        {
            return Err(Error::Msg(format!(
                "summary objective quantile {q} is not within [0, 1]"
            )));
        }

        let window = self.window();
        if window.age_buckets > MAX_AGE_BUCKETS as usize {
            return Err(Error::Msg(format!(
                "summary age_buckets {} exceeds the maximum of {MAX_AGE_BUCKETS}",
                window.age_buckets
            )));
        }

        if window.max_age.as_nanos() < window.age_buckets as u128 {
            return Err(Error::Msg(format!(
                "summary max_age {:?} is too short for {} age buckets",
                window.max_age, window.age_buckets
            )));
        }

        if label_names.contains(&QUANTILE_LABEL)
            || self.common_opts.const_labels.contains_key(QUANTILE_LABEL)
        {
            return Err(Error::Msg(format!(
                "'{QUANTILE_LABEL}' is reserved and cannot be a summary label"
            )));
        }

        let mut variable_labels = self.common_opts.variable_labels.clone();
        variable_labels.extend(label_names.iter().map(|l| l.to_string()));

        Desc::new(
            self.fq_name(),
            self.common_opts.help.clone(),
            variable_labels,
            self.common_opts.const_labels.clone(),
        )
    }

    fn window(&self) -> Window {
        let max_age = if self.max_age.is_zero() {
            DEFAULT_MAX_AGE
        } else {
            self.max_age
        };
        let age_buckets = if self.age_buckets == 0 {
            DEFAULT_AGE_BUCKETS
        } else {
            self.age_buckets
        };
        let buf_cap = if self.buf_cap == 0 {
            DEFAULT_BUF_CAP
        } else {
            self.buf_cap
        };

        Window {
            max_age,
            age_buckets: age_buckets as usize,
            buf_cap: buf_cap as usize,
        }
    }
}

impl From<Opts> for SummaryOpts {
    fn from(common_opts: Opts) -> Self {
        Self {
            common_opts,
            objectives: Vec::new(),
            max_age: Duration::ZERO,
            age_buckets: 0,
            buf_cap: 0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Window {
    max_age: Duration,
    age_buckets: usize,
    buf_cap: usize,
}

impl Window {
    /// Never zero, so rotation always advances.
    fn stream_duration(&self) -> Duration {
        (self.max_age / self.age_buckets as u32).max(Duration::from_nanos(1))
    }
}

#[derive(Debug)]
struct Streams {
    window: Window,
    streams: Vec<VecDeque<f64>>,
    head: usize,
    head_expires: Instant,
    sum: f64,
    count: u64,
}

impl Streams {
    fn new(window: Window, now: Instant) -> Self {
        Self {
            window,
            streams: vec![VecDeque::new(); window.age_buckets],
            head: 0,
            head_expires: now + window.stream_duration(),
            sum: 0.0,
            count: 0,
        }
    }

    fn rotate(&mut self, now: Instant) {
        if now < self.head_expires {
            return;
        }

        let span = self.window.stream_duration();
        if now.duration_since(self.head_expires) >= self.window.max_age {
            // idle for longer than the whole window
            for stream in &mut self.streams {
                stream.clear();
            }
            self.head_expires = now + span;
            return;
        }

        while now >= self.head_expires {
            self.streams[self.head].clear();
            self.head = (self.head + 1) % self.streams.len();
            self.head_expires += span;
        }
    }

    fn observe(&mut self, value: f64, now: Instant) {
        self.rotate(now);

        let cap = self.window.buf_cap;
        for stream in &mut self.streams {
            if stream.len() == cap {
                stream.pop_front();
            }
            stream.push_back(value);
        }

        self.sum += value;
        self.count += 1;
    }

    fn quantiles(&mut self, objectives: &[(f64, f64)], now: Instant) -> Vec<(f64, f64)> {
        self.rotate(now);

        let mut samples: Vec<f64> = self.streams[self.head].iter().copied().collect();
        samples.sort_by(f64::total_cmp);

        objectives
            .iter()
            .map(|(q, _)| (*q, rank(&samples, *q)))
            .collect()
    }
}

/// Nearest-rank quantile of sorted samples. NaN when there are no samples.
fn rank(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let n = sorted.len();
    let index = ((quantile * n as f64).ceil() as usize)
        .saturating_sub(1)
        .min(n - 1);
    sorted[index]
}

struct SummaryCore {
    objectives: Vec<(f64, f64)>,
    label_pairs: Vec<LabelPair>,
    streams: Mutex<Streams>,
}

impl SummaryCore {
    fn new(opts: &SummaryOpts, desc: &Desc, label_values: &[&str], now: Instant) -> Self {
        let mut label_pairs: Vec<LabelPair> = desc.const_label_pairs.clone();
        for (name, value) in desc.variable_labels.iter().zip(label_values) {
            let mut pair = LabelPair::default();
            pair.set_name(name.clone());
            pair.set_value(value.to_string());
            label_pairs.push(pair);
        }
        label_pairs.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        Self {
            objectives: opts.objectives.clone(),
            label_pairs,
            streams: Mutex::new(Streams::new(opts.window(), now)),
        }
    }

    fn observe(&self, value: f64, now: Instant) {
        self.streams.lock().observe(value, now);
    }

    fn metric(&self, now: Instant) -> proto::Metric {
        let (sum, count, quantiles) = {
            let mut streams = self.streams.lock();
            let quantiles = streams.quantiles(&self.objectives, now);
            (streams.sum, streams.count, quantiles)
        };

        let mut summary = proto::Summary::default();
        summary.set_sample_sum(sum);
        summary.set_sample_count(count);
        for (q, v) in quantiles {
            let mut quantile = Quantile::default();
            quantile.set_quantile(q);
            quantile.set_value(v);
            summary.mut_quantile().push(quantile);
        }

        let mut metric = proto::Metric::default();
        for pair in &self.label_pairs {
            metric.mut_label().push(pair.clone());
        }
        metric.set_summary(summary);
        metric
    }
}

fn family(desc: &Desc, metrics: impl IntoIterator<Item = proto::Metric>) -> MetricFamily {
    let mut mf = MetricFamily::default();
    mf.set_name(desc.fq_name.clone());
    mf.set_help(desc.help.clone());
    mf.set_field_type(MetricType::SUMMARY);
    for metric in metrics {
        mf.mut_metric().push(metric);
    }
    mf
}

/// A summary without labels. Clones share the same underlying data.
#[derive(Clone)]
pub struct Summary {
    desc: Arc<Desc>,
    core: Arc<SummaryCore>,
}

impl Summary {
    pub fn with_opts(opts: SummaryOpts) -> Result<Self> {
        let desc = opts.describe(&[])?;
        if !desc.variable_labels.is_empty() {
            return Err(Error::InconsistentCardinality {
                expect: 0,
                got: desc.variable_labels.len(),
            });
        }

        let core = SummaryCore::new(&opts, &desc, &[], Instant::now());
        Ok(Self {
            desc: Arc::new(desc),
            core: Arc::new(core),
        })
    }

    pub fn observe(&self, value: f64) {
        self.core.observe(value, Instant::now());
    }

    pub fn get_sample_sum(&self) -> f64 {
        self.core.streams.lock().sum
    }

    pub fn get_sample_count(&self) -> u64 {
        self.core.streams.lock().count
    }
}

impl Collector for Summary {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        vec![family(&self.desc, [self.core.metric(Instant::now())])]
    }
}

impl fmt::Debug for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Summary")
            .field("name", &self.desc.fq_name)
            .finish_non_exhaustive()
    }
}

struct SummaryVecCore {
    desc: Desc,
    opts: SummaryOpts,
    children: RwLock<HashMap<Vec<String>, Summary>>,
}

/// A summary partitioned by label values.
#[derive(Clone)]
pub struct SummaryVec {
    core: Arc<SummaryVecCore>,
}

impl SummaryVec {
    pub fn new(opts: SummaryOpts, label_names: &[&str]) -> Result<Self> {
        let desc = opts.describe(label_names)?;
        Ok(Self {
            core: Arc::new(SummaryVecCore {
                desc,
                opts,
                children: RwLock::new(HashMap::new()),
            }),
        })
    }

    /// Returns the summary for the given label values, creating it on first use.
    pub fn get_metric_with_label_values(&self, values: &[&str]) -> Result<Summary> {
        let expect = self.core.desc.variable_labels.len();
        if values.len() != expect {
            return Err(Error::InconsistentCardinality {
                expect,
                got: values.len(),
            });
        }

        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        if let Some(summary) = self.core.children.read().get(&key) {
            return Ok(summary.clone());
        }

        let mut children = self.core.children.write();
        let summary = children.entry(key).or_insert_with(|| Summary {
            desc: Arc::new(self.core.desc.clone()),
            core: Arc::new(SummaryCore::new(
                &self.core.opts,
                &self.core.desc,
                values,
                Instant::now(),
            )),
        });
        Ok(summary.clone())
    }

    /// Like [`SummaryVec::get_metric_with_label_values`], but panics on a label count mismatch.
    pub fn with_label_values(&self, values: &[&str]) -> Summary {
        self.get_metric_with_label_values(values)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn remove_label_values(&self, values: &[&str]) -> Result<()> {
        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        match self.core.children.write().remove(&key) {
            Some(_) => Ok(()),
            None => Err(Error::Msg(format!("missing label values {values:?}"))),
        }
    }

    pub fn reset(&self) {
        self.core.children.write().clear();
    }
}

impl Collector for SummaryVec {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.core.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let now = Instant::now();
        let children = self.core.children.read();

        let mut keys: Vec<&Vec<String>> = children.keys().collect();
        keys.sort();
        let metrics = keys.into_iter().map(|k| children[k].core.metric(now));

        vec![family(&self.core.desc, metrics)]
    }
}

impl fmt::Debug for SummaryVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryVec")
            .field("name", &self.core.desc.fq_name)
            .field("label_names", &self.core.desc.variable_labels)
            .finish_non_exhaustive()
    }
}
