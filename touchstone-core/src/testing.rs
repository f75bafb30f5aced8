//! Assertions over gathered metrics, for tests.
//!
//! ```
//! use prometheus::{Counter, Opts, Registry};
//! use touchstone_core::testing::Snapshot;
//!
//! let registry = Registry::new();
//! let counter = Counter::with_opts(Opts::new("requests", "help")).unwrap();
//! registry.register(Box::new(counter.clone())).unwrap();
//! counter.inc();
//!
//! let snapshot = Snapshot::gather(&registry);
//! assert!(snapshot.registered(&["requests"]).is_ok());
//! assert!(snapshot.not_registered(&["errors"]).is_ok());
//! ```

use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Registry, TextEncoder};

use crate::error::Error;

/// The metric families of a registry or collector at one point in time.
///
/// Families without any metric are left out, as a registry does when gathering.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    families: Vec<MetricFamily>,
}

impl Snapshot {
    pub fn gather(registry: &Registry) -> Self {
        Self {
            families: registry.gather(),
        }
    }

    pub fn collect(collector: &dyn Collector) -> Self {
        let mut families: Vec<MetricFamily> = collector
            .collect()
            .into_iter()
            .filter(|mf| !mf.get_metric().is_empty())
            .collect();
        families.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        Self { families }
    }

    pub fn families(&self) -> &[MetricFamily] {
        &self.families
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(|mf| mf.get_name())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Checks that every name is present, reporting each one that is not.
    pub fn registered(&self, names: &[&str]) -> Result<(), Vec<String>> {
        self.check(names, true, "metric should be registered")
    }

    /// Checks that no name is present, reporting each one that is.
    pub fn not_registered(&self, names: &[&str]) -> Result<(), Vec<String>> {
        self.check(names, false, "metric should not be registered")
    }

    fn check(&self, names: &[&str], expected: bool, message: &str) -> Result<(), Vec<String>> {
        let failures: Vec<String> = names
            .iter()
            .filter(|n| self.is_registered(n) != expected)
            .map(|n| format!("{message}: {n}"))
            .collect();

        if failures.is_empty() { Ok(()) } else { Err(failures) }
    }

    /// The text exposition of the families with the given names, or of all
    /// families when `names` is empty.
    pub fn text(&self, names: &[&str]) -> Result<String, Error> {
        let families: Vec<MetricFamily> = self
            .families
            .iter()
            .filter(|mf| names.is_empty() || names.contains(&mf.get_name()))
            .cloned()
            .collect();

        let mut buf = Vec::new();
        TextEncoder::new().encode(&families, &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()).into())
    }

    /// Compares the text exposition of both snapshots, restricted to `names` unless
    /// it is empty. The error holds both renderings when they differ.
    pub fn compare(&self, actual: &Snapshot, names: &[&str]) -> Result<(), String> {
        let render = |s: &Snapshot| s.text(names).unwrap_or_else(|e| e.to_string());
        let (expected, actual) = (render(self), render(actual));

        if expected == actual {
            Ok(())
        } else {
            Err(format!("expected:\n{expected}\nactual:\n{actual}"))
        }
    }
}
