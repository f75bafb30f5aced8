use std::fmt;

use prometheus::core::Collector;
use prometheus::{Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramVec};

use crate::observer::{Observer, ObserverVec};
use crate::summary::{Summary, SummaryVec};

/// A metric handle created by a [`MetricFactory`](crate::MetricFactory).
#[derive(Clone)]
pub enum Metric {
    Counter(Counter),
    CounterVec(CounterVec),
    Gauge(Gauge),
    GaugeVec(GaugeVec),
    Histogram(Histogram),
    HistogramVec(HistogramVec),
    Summary(Summary),
    SummaryVec(SummaryVec),
}

impl Metric {
    pub fn kind(&self) -> &'static str {
        match self {
            Metric::Counter(_) => "Counter",
            Metric::CounterVec(_) => "CounterVec",
            Metric::Gauge(_) => "Gauge",
            Metric::GaugeVec(_) => "GaugeVec",
            Metric::Histogram(_) => "Histogram",
            Metric::HistogramVec(_) => "HistogramVec",
            Metric::Summary(_) => "Summary",
            Metric::SummaryVec(_) => "SummaryVec",
        }
    }

    pub fn as_collector(&self) -> &dyn Collector {
        match self {
            Metric::Counter(m) => m,
            Metric::CounterVec(m) => m,
            Metric::Gauge(m) => m,
            Metric::GaugeVec(m) => m,
            Metric::Histogram(m) => m,
            Metric::HistogramVec(m) => m,
            Metric::Summary(m) => m,
            Metric::SummaryVec(m) => m,
        }
    }

    /// The fully qualified name the metric was registered under.
    pub fn fq_name(&self) -> String {
        collector_name(self.as_collector())
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(self.kind()).field(&self.fq_name()).finish()
    }
}

pub(crate) fn collector_name(c: &dyn Collector) -> String {
    c.desc()
        .first()
        .map(|d| d.fq_name.clone())
        .unwrap_or_default()
}

/// Conversion from a created [`Metric`] into the static type of a bundle field.
pub trait FromMetric: Sized {
    /// Converts the metric, handing it back when it is not of this type.
    fn from_metric(metric: Metric) -> Result<Self, Metric>;

    /// The value of a field whose metric was never created, if the type allows one.
    fn missing() -> Option<Self> {
        None
    }
}

macro_rules! impl_from_metric {
    ($($ty:ident),* $(,)?) => {
        $(
            impl FromMetric for $ty {
                fn from_metric(metric: Metric) -> Result<Self, Metric> {
                    match metric {
                        Metric::$ty(m) => Ok(m),
                        other => Err(other),
                    }
                }
            }

            impl From<$ty> for Metric {
                fn from(m: $ty) -> Self {
                    Metric::$ty(m)
                }
            }
        )*
    };
}

impl_from_metric!(
    Counter,
    CounterVec,
    Gauge,
    GaugeVec,
    Histogram,
    HistogramVec,
    Summary,
    SummaryVec,
);

impl FromMetric for Metric {
    fn from_metric(metric: Metric) -> Result<Self, Metric> {
        Ok(metric)
    }
}

impl FromMetric for Observer {
    fn from_metric(metric: Metric) -> Result<Self, Metric> {
        match metric {
            Metric::Histogram(h) => Ok(Observer::Histogram(h)),
            Metric::Summary(s) => Ok(Observer::Summary(s)),
            other => Err(other),
        }
    }
}

impl FromMetric for ObserverVec {
    fn from_metric(metric: Metric) -> Result<Self, Metric> {
        match metric {
            Metric::HistogramVec(h) => Ok(ObserverVec::Histogram(h)),
            Metric::SummaryVec(s) => Ok(ObserverVec::Summary(s)),
            other => Err(other),
        }
    }
}

impl<T: FromMetric> FromMetric for Option<T> {
    fn from_metric(metric: Metric) -> Result<Self, Metric> {
        T::from_metric(metric).map(Some)
    }

    fn missing() -> Option<Self> {
        Some(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{HistogramOpts, Opts};

    fn counter() -> Metric {
        Metric::Counter(Counter::with_opts(Opts::new("c", "help")).unwrap())
    }

    #[test]
    fn test_from_metric_matching_type() {
        assert!(Counter::from_metric(counter()).is_ok());
        assert!(Option::<Counter>::from_metric(counter()).unwrap().is_some());
    }

    #[test]
    fn test_from_metric_mismatch_hands_back() {
        let back = Gauge::from_metric(counter()).unwrap_err();
        assert_eq!(back.kind(), "Counter");
        assert!(Observer::from_metric(counter()).is_err());
    }

    #[test]
    fn test_observer_from_histogram() {
        let h = Histogram::with_opts(HistogramOpts::new("h", "help")).unwrap();
        let observer = Observer::from_metric(Metric::Histogram(h)).unwrap();
        assert!(observer.is_histogram());
    }

    #[test]
    fn test_missing() {
        assert!(Counter::missing().is_none());
        assert!(matches!(Option::<Counter>::missing(), Some(None)));
    }

    #[test]
    fn test_fq_name() {
        let m = Metric::Counter(
            Counter::with_opts(Opts::new("requests", "help").namespace("app")).unwrap(),
        );
        assert_eq!(m.fq_name(), "app_requests");
        assert_eq!(format!("{m:?}"), r#"Counter("app_requests")"#);
    }
}
