//! Metrics whose value is read from a callback at collection time.

use std::fmt;
use std::sync::Arc;

use prometheus::core::{Collector, Desc, Describer};
use prometheus::proto::{self, LabelPair, MetricFamily, MetricType};
use prometheus::{Error, Opts, Result};

/// A numeric value a metric callback may return.
pub trait Sample {
    fn into_f64(self) -> f64;
}

macro_rules! impl_sample {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Sample for $ty {
                fn into_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_sample!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

type ValueFn = Box<dyn Fn() -> f64 + Send + Sync>;

struct FuncCore {
    desc: Desc,
    label_pairs: Vec<LabelPair>,
    value_type: MetricType,
    value: ValueFn,
}

impl FuncCore {
    fn new<F, N>(opts: Opts, value_type: MetricType, f: F) -> Result<Self>
    where
        F: Fn() -> N + Send + Sync + 'static,
        N: Sample,
    {
        let desc = opts.describe()?;
        if !desc.variable_labels.is_empty() {
            return Err(Error::InconsistentCardinality {
                expect: 0,
                got: desc.variable_labels.len(),
            });
        }

        Ok(Self {
            label_pairs: desc.const_label_pairs.clone(),
            desc,
            value_type,
            value: Box::new(move || f().into_f64()),
        })
    }

    fn get(&self) -> f64 {
        (self.value)()
    }

    fn family(&self) -> MetricFamily {
        let value = self.get();

        let mut metric = proto::Metric::default();
        for pair in &self.label_pairs {
            metric.mut_label().push(pair.clone());
        }
        if self.value_type == MetricType::COUNTER {
            let mut counter = proto::Counter::default();
            counter.set_value(value);
            metric.set_counter(counter);
        } else {
            let mut gauge = proto::Gauge::default();
            gauge.set_value(value);
            metric.set_gauge(gauge);
        }

        let mut mf = MetricFamily::default();
        mf.set_name(self.desc.fq_name.clone());
        mf.set_help(self.desc.help.clone());
        mf.set_field_type(self.value_type);
        mf.mut_metric().push(metric);
        mf
    }
}

macro_rules! func_metric {
    ($(#[$doc:meta])* $name:ident, $value_type:expr) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $name {
            core: Arc<FuncCore>,
        }

        impl $name {
            pub fn new<F, N>(opts: Opts, f: F) -> Result<Self>
            where
                F: Fn() -> N + Send + Sync + 'static,
                N: Sample,
            {
                Ok(Self {
                    core: Arc::new(FuncCore::new(opts, $value_type, f)?),
                })
            }

            /// Calls the callback and returns its current value.
            pub fn get(&self) -> f64 {
                self.core.get()
            }
        }

        impl Collector for $name {
            fn desc(&self) -> Vec<&Desc> {
                vec![&self.core.desc]
            }

            fn collect(&self) -> Vec<MetricFamily> {
                vec![self.core.family()]
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("name", &self.core.desc.fq_name)
                    .finish_non_exhaustive()
            }
        }
    };
}

func_metric!(
    /// A counter whose value comes from a callback. The callback must never
    /// report a smaller value than before.
    CounterFunc,
    MetricType::COUNTER
);

func_metric!(
    /// A gauge whose value comes from a callback.
    GaugeFunc,
    MetricType::GAUGE
);

func_metric!(
    /// A metric of unknown type whose value comes from a callback, e.g. the length
    /// of a queue. Exposed as a gauge, since the prometheus text encoder cannot
    /// render untyped samples.
    UntypedFunc,
    MetricType::GAUGE
);
