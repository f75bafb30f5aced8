//! Runtime support for metric bundles: structs whose fields are metric handles,
//! created and registered in one pass from declarative field tags.
//!
//! Most users go through the `touchstone` crate and `#[derive(Bundle)]`. The types
//! here can also describe a bundle by hand:
//!
//! ```
//! use prometheus::Registry;
//! use touchstone_core::{Config, Factory, Field, FieldKind, Schema, Tag, populate_schema};
//!
//! let schema = Schema::new("Server")
//!     .field(Field::of_kind("RequestCount", FieldKind::Counter).tag(Tag::Help, "requests"))
//!     .field(
//!         Field::of_kind("Latency", FieldKind::HistogramVec)
//!             .tag(Tag::LabelNames, "method")
//!             .tag(Tag::Buckets, "0.1, 0.5, 1"),
//!     );
//!
//! let factory = Factory::new(&Config::new("app", ""), Registry::new());
//! let populated = populate_schema(&factory, &schema).unwrap();
//!
//! assert_eq!(populated.get("RequestCount").unwrap().fq_name(), "app_request_count");
//! assert_eq!(populated.get("Latency").unwrap().kind(), "HistogramVec");
//! ```

mod bundle;
mod config;
mod error;
mod factory;
mod field;
mod func;
mod metric;
mod name;
mod observer;
mod opts;
mod provide;
mod resolve;
mod summary;
mod tag;

pub mod testing;

pub use bundle::{Bundle, Populated, Schema, populate, populate_schema};
pub use config::{Config, new_registry};
pub use error::{Cause, Error, Errors, FieldError};
pub use factory::{Factory, MetricFactory};
pub use field::{Field, FieldKind};
pub use func::{CounterFunc, GaugeFunc, Sample, UntypedFunc};
pub use metric::{FromMetric, Metric};
pub use name::{NAME_WILDCARD, SNAKE_CASE_SEPARATOR, metric_name, to_snake_case};
pub use observer::{Observer, ObserverVec};
pub use opts::{MetricOpts, apply_defaults};
pub use provide::{Provider, provide, provide_arc, provide_boxed};
pub use resolve::Resolved;
pub use summary::{
    DEFAULT_AGE_BUCKETS, DEFAULT_BUF_CAP, DEFAULT_MAX_AGE, MAX_AGE_BUCKETS, QUANTILE_LABEL, Summary,
    SummaryOpts, SummaryVec,
};
pub use tag::{
    HISTOGRAM_TAGS, IGNORE, OBSERVER_TAGS, SUMMARY_TAGS, TYPE_HISTOGRAM, TYPE_SUMMARY, Tag, Tags,
};

pub use prometheus;
