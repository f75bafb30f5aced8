//! # Touchstone
//!
//! Declare the prometheus metrics a component needs as a struct, and have every one
//! of them created and registered in a single call.
//!
//! ## Quick Start
//!
//! ```
//! use touchstone::prometheus::{Counter, CounterVec, Registry};
//! use touchstone::testing::Snapshot;
//! use touchstone::{Bundle, Config, Factory, Observer};
//!
//! #[derive(Bundle)]
//! struct ServerMetrics {
//!     // Named after the field: app_http_request_count
//!     #[metric(help = "Total requests")]
//!     request_count: Counter,
//!
//!     // Vectors need label names
//!     #[metric(help = "Errors by status code", label_names = "code")]
//!     errors: CounterVec,
//!
//!     // Summary tags turn an observer into a summary
//!     #[metric(help = "Request latency", objectives = "0.5:0.05, 0.99:0.001")]
//!     latency: Observer,
//!
//!     // Skipped metrics must be optional
//!     #[metric(skip)]
//!     legacy: Option<Counter>,
//!
//!     // Anything else is left at its default
//!     port: u16,
//! }
//!
//! let registry = Registry::new();
//! let factory = Factory::new(&Config::new("app", "http"), registry.clone());
//! let metrics = ServerMetrics::populate(&factory).unwrap();
//!
//! metrics.request_count.inc();
//! metrics.errors.with_label_values(&["503"]).inc();
//! metrics.latency.observe(0.25);
//! assert!(metrics.latency.is_summary());
//! assert!(metrics.legacy.is_none());
//! assert_eq!(metrics.port, 0);
//!
//! let snapshot = Snapshot::gather(&registry);
//! assert!(snapshot.registered(&["app_http_request_count", "app_http_errors"]).is_ok());
//! ```
//!
//! ## Tags
//!
//! | key | meaning |
//! |---|---|
//! | `skip` | leave the field unpopulated |
//! | `namespace`, `subsystem` | override the factory defaults |
//! | `name` | metric name; a `*` is replaced by the snake case field name |
//! | `help` | help text |
//! | `buckets` | comma separated histogram buckets |
//! | `objectives` | comma separated `quantile:error` summary objectives |
//! | `max_age` | summary max age, e.g. `"10m"` |
//! | `age_buckets`, `buf_cap` | summary window settings |
//! | `label_names` | comma separated label names, required for vectors |
//! | `type` | `"histogram"` or `"summary"`, for observers only |
//!
//! ## Errors
//!
//! Populating reports every broken field at once:
//!
//! ```
//! use touchstone::prometheus::{Counter, GaugeVec, Histogram, Registry};
//! use touchstone::{Bundle, Config, Error, Factory};
//!
//! #[derive(Bundle)]
//! struct Broken {
//!     // label names are only allowed on vectors
//!     #[metric(label_names = "code")]
//!     requests: Counter,
//!
//!     // and required on them
//!     depth: GaugeVec,
//!
//!     // every bad bucket is reported
//!     #[metric(buckets = "0.1, fast, slow")]
//!     latency: Histogram,
//! }
//!
//! let factory = Factory::new(&Config::default(), Registry::new());
//! let Err(Error::Bundle(errors)) = Broken::populate(&factory) else {
//!     panic!("expected field errors");
//! };
//! assert_eq!(errors.len(), 4);
//! ```
//!
//! ## Providers
//!
//! [`provide`] checks a bundle type once, up front, and returns a constructor for
//! the rest of the application to call:
//!
//! ```
//! use std::sync::Arc;
//! use touchstone::prometheus::{Gauge, Registry};
//! use touchstone::{Bundle, Config, Factory, provide_arc};
//!
//! #[derive(Bundle)]
//! struct Pool {
//!     #[metric(help = "Open connections")]
//!     connections: Gauge,
//! }
//!
//! let provider = provide_arc::<Pool>().unwrap();
//! let factory = Factory::new(&Config::new("db", ""), Registry::new());
//! let pool: Arc<Pool> = provider.construct(&factory).unwrap();
//! pool.connections.set(4.0);
//! ```
//!
//! ## Structural errors
//!
//! Only structs with named fields are bundles:
//!
//! ```compile_fail
//! use touchstone::Bundle;
//!
//! #[derive(Bundle)]
//! enum Metrics {
//!     Requests,
//! }
//! ```
//!
//! ```compile_fail
//! use touchstone::Bundle;
//! use touchstone::prometheus::Counter;
//!
//! #[derive(Bundle)]
//! struct Metrics(Counter);
//! ```
//!
//! A skipped metric handle has no value to fall back on:
//!
//! ```compile_fail
//! use touchstone::Bundle;
//! use touchstone::prometheus::Counter;
//!
//! #[derive(Bundle)]
//! struct Metrics {
//!     #[metric(skip)]
//!     requests: Counter,
//! }
//! ```
//!
//! Unknown attribute keys are rejected:
//!
//! ```compile_fail
//! use touchstone::Bundle;
//! use touchstone::prometheus::CounterVec;
//!
//! #[derive(Bundle)]
//! struct Metrics {
//!     #[metric(labels = "code")]
//!     requests: CounterVec,
//! }
//! ```

pub use touchstone_macro::Bundle;

#[doc(hidden)]
pub use touchstone_core as core;

pub use touchstone_core::{
    Bundle, Config, CounterFunc, Error, Errors, Factory, FieldError, GaugeFunc, MetricFactory,
    Observer, ObserverVec, Provider, Summary, SummaryOpts, SummaryVec, UntypedFunc, new_registry,
    prometheus, provide, provide_arc, provide_boxed, testing,
};
