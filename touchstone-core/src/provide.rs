//! Constructors that build bundles on demand, for wiring into an application's
//! component graph.

use std::fmt;
use std::sync::Arc;

use crate::bundle::Bundle;
use crate::error::Error;
use crate::factory::MetricFactory;

/// Builds a fresh `T` from a [`MetricFactory`] each time it is asked to.
pub struct Provider<T> {
    type_name: String,
    construct: fn(&dyn MetricFactory) -> Result<T, Error>,
}

impl<T> Provider<T> {
    /// The name of the bundle type this provider populates.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Allocates and populates a new bundle.
    pub fn construct(&self, factory: &dyn MetricFactory) -> Result<T, Error> {
        (self.construct)(factory)
    }
}

impl<T> Clone for Provider<T> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name.clone(),
            construct: self.construct,
        }
    }
}

impl<T> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

fn validated<B: Bundle, T>(
    construct: fn(&dyn MetricFactory) -> Result<T, Error>,
) -> Result<Provider<T>, Error> {
    let schema = B::schema();
    schema.validate()?;

    Ok(Provider {
        type_name: schema.type_name().to_string(),
        construct,
    })
}

/// A provider of `B` by value. The schema is checked here rather than at construction.
pub fn provide<B: Bundle>() -> Result<Provider<B>, Error> {
    validated::<B, _>(|factory| B::populate(factory))
}

/// A provider of boxed `B`s.
pub fn provide_boxed<B: Bundle>() -> Result<Provider<Box<B>>, Error> {
    validated::<B, _>(|factory| B::populate(factory).map(Box::new))
}

/// A provider of shared `B`s.
pub fn provide_arc<B: Bundle>() -> Result<Provider<Arc<B>>, Error> {
    validated::<B, _>(|factory| B::populate(factory).map(Arc::new))
}
