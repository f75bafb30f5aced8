//! Observers: metrics that record individual values, backed by either a histogram
//! or a summary.

use std::fmt;

use prometheus::{Histogram, HistogramVec};

use crate::metric::collector_name;
use crate::summary::{Summary, SummaryVec};

#[derive(Clone)]
pub enum Observer {
    Histogram(Histogram),
    Summary(Summary),
}

impl Observer {
    pub fn observe(&self, value: f64) {
        match self {
            Observer::Histogram(h) => h.observe(value),
            Observer::Summary(s) => s.observe(value),
        }
    }

    pub fn get_sample_count(&self) -> u64 {
        match self {
            Observer::Histogram(h) => h.get_sample_count(),
            Observer::Summary(s) => s.get_sample_count(),
        }
    }

    pub fn get_sample_sum(&self) -> f64 {
        match self {
            Observer::Histogram(h) => h.get_sample_sum(),
            Observer::Summary(s) => s.get_sample_sum(),
        }
    }

    pub fn is_histogram(&self) -> bool {
        matches!(self, Observer::Histogram(_))
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, Observer::Summary(_))
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observer::Histogram(h) => f.debug_tuple("Histogram").field(&collector_name(h)).finish(),
            Observer::Summary(s) => f.debug_tuple("Summary").field(s).finish(),
        }
    }
}

#[derive(Clone)]
pub enum ObserverVec {
    Histogram(HistogramVec),
    Summary(SummaryVec),
}

impl ObserverVec {
    pub fn get_metric_with_label_values(&self, values: &[&str]) -> prometheus::Result<Observer> {
        match self {
            ObserverVec::Histogram(h) => h
                .get_metric_with_label_values(values)
                .map(Observer::Histogram),
            ObserverVec::Summary(s) => s
                .get_metric_with_label_values(values)
                .map(Observer::Summary),
        }
    }

    /// Returns the observer for the given label values. Panics on a label count mismatch.
    pub fn with_label_values(&self, values: &[&str]) -> Observer {
        match self {
            ObserverVec::Histogram(h) => Observer::Histogram(h.with_label_values(values)),
            ObserverVec::Summary(s) => Observer::Summary(s.with_label_values(values)),
        }
    }

    pub fn is_histogram(&self) -> bool {
        matches!(self, ObserverVec::Histogram(_))
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, ObserverVec::Summary(_))
    }
}

impl fmt::Debug for ObserverVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObserverVec::Histogram(h) => f
                .debug_tuple("HistogramVec")
                .field(&collector_name(h))
                .finish(),
            ObserverVec::Summary(s) => f.debug_tuple("SummaryVec").field(s).finish(),
        }
    }
}
