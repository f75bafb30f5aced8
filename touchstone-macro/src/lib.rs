//! Procedural macros for the touchstone metrics library.
//!
//! This crate provides `#[derive(Bundle)]`. Each named field whose type is a metric
//! handle (`Counter`, `CounterVec`, `Gauge`, `GaugeVec`, `Histogram`,
//! `HistogramVec`, `Summary`, `SummaryVec`, `Observer`, `ObserverVec`, or an
//! `Option` of one) becomes a metric. Fields of other types are left alone and take
//! their default value.
//!
//! Fields are configured with `#[metric(...)]`:
//!
//! ```text
//! #[metric(help = "request latency", buckets = "0.1, 0.5, 1", label_names = "method")]
//! latency: HistogramVec,
//!
//! #[metric(skip)]
//! unused: Option<Counter>,
//! ```
//!
//! Attribute keys are checked when the macro expands. Their values, and whether
//! they are legal for the field's type, are checked when the bundle is populated,
//! so every problem in a bundle is reported at once.
//!
//! See the main `touchstone` crate documentation for usage examples.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod bundle_derive;

#[proc_macro_derive(Bundle, attributes(metric))]
pub fn derive_bundle(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    bundle_derive::expand_bundle_derive(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
