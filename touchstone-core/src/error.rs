use std::fmt::{self, Display, Formatter};

/// Boxed cause of a [`FieldError`], e.g. a float that failed to parse.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a metric name is required")]
    NoMetricName,

    #[error("{kind} options cannot create an observer")]
    NotAnObserver { kind: &'static str },

    #[error("'{type_name}' is not a valid bundle: {reason}")]
    InvalidBundle { type_name: String, reason: String },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Prometheus(#[from] prometheus::Error),

    #[error(transparent)]
    Bundle(#[from] Errors),
}

impl Error {
    /// Tests if this error came from registering a metric that was already registered.
    pub fn is_already_registered(&self) -> bool {
        match self {
            Error::Prometheus(prometheus::Error::AlreadyReg) => true,
            Error::Bundle(errors) => errors.iter().any(Error::is_already_registered),
            _ => false,
        }
    }
}

/// An error tied to one bundle field.
#[derive(Debug, thiserror::Error)]
#[error("'{field} {field_type}': {message}")]
pub struct FieldError {
    pub field: String,
    pub field_type: String,
    pub message: String,
    #[source]
    pub cause: Option<Cause>,
}

/// An ordered collection of independent errors.
///
/// Empty means success. Pushing an [`Error::Bundle`] flattens it, so iterating always
/// yields the individual failures.
#[derive(Debug, Default)]
pub struct Errors(Vec<Error>);

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: impl Into<Error>) {
        match err.into() {
            Error::Bundle(nested) => self.0.extend(nested.0),
            err => self.0.push(err),
        }
    }

    pub fn append(&mut self, other: Errors) {
        self.0.extend(other.0);
    }

    /// Records the error of a fallible step and hands back its value, if any.
    pub fn check<T, E: Into<Error>>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    pub fn into_result(self) -> Result<(), Errors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Display for Errors {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

impl<E: Into<Error>> Extend<E> for Errors {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        for err in iter {
            self.push(err);
        }
    }
}

impl<E: Into<Error>> FromIterator<E> for Errors {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut errors = Errors::new();
        errors.extend(iter);
        errors
    }
}

impl IntoIterator for Errors {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
