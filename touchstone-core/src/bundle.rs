//! Bundles: structs of metric handles populated in one pass.

use std::collections::HashSet;

use crate::error::{Error, Errors};
use crate::factory::MetricFactory;
use crate::field::Field;
use crate::metric::{FromMetric, Metric};
use crate::resolve::Resolved;

/// The fields of a bundle type, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    type_name: String,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.push(field);
        self
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Checks that every field has a distinct, non-empty identifier.
    pub fn validate(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            if field.ident().is_empty() {
                return Err(self.invalid(format!("field {index} has no identifier")));
            }

            if !seen.insert(field.ident()) {
                return Err(self.invalid(format!(
                    "field '{}' is declared more than once",
                    field.ident()
                )));
            }
        }

        Ok(())
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidBundle {
            type_name: self.type_name.clone(),
            reason,
        }
    }
}

/// The metrics created for a [`Schema`], one slot per field.
#[derive(Debug)]
pub struct Populated {
    type_name: String,
    fields: Vec<Field>,
    slots: Vec<Option<Metric>>,
}

impl Populated {
    pub fn new(schema: &Schema) -> Self {
        Self {
            type_name: schema.type_name.clone(),
            fields: schema.fields.clone(),
            slots: vec![None; schema.fields.len()],
        }
    }

    /// Stores the metric for the field at `index`.
    pub fn set(&mut self, index: usize, metric: Metric) -> Result<(), Error> {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(metric);
                Ok(())
            }
            None => Err(self.no_field(index)),
        }
    }

    /// The metric created for the field with the given identifier.
    pub fn get(&self, ident: &str) -> Option<&Metric> {
        self.fields
            .iter()
            .position(|f| f.ident() == ident)
            .and_then(|i| self.slots[i].as_ref())
    }

    /// Iterates over the populated fields and their metrics.
    pub fn iter(&self) -> impl Iterator<Item = (&Field, &Metric)> {
        self.fields
            .iter()
            .zip(&self.slots)
            .filter_map(|(field, slot)| slot.as_ref().map(|m| (field, m)))
    }

    /// The number of populated fields.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves the metric for the field at `index` out, converted to the field's type.
    ///
    /// A field without a metric is only acceptable for types that allow absence,
    /// such as `Option`.
    pub fn take<T: FromMetric>(&mut self, index: usize) -> Result<T, Error> {
        let Some(field) = self.fields.get(index) else {
            return Err(self.no_field(index));
        };

        match self.slots[index].take() {
            Some(metric) => T::from_metric(metric).map_err(|metric| {
                field
                    .error(format!("metric type mismatch: got {}", metric.kind()))
                    .into()
            }),
            None => T::missing().ok_or_else(|| field.error("metric was not populated").into()),
        }
    }

    /// Tests if these slots were laid out for `schema`.
    fn matches(&self, schema: &Schema) -> bool {
        self.type_name == schema.type_name && self.fields == schema.fields
    }

    fn no_field(&self, index: usize) -> Error {
        Error::InvalidBundle {
            type_name: self.type_name.clone(),
            reason: format!("no field at index {index}"),
        }
    }
}

/// A struct whose fields are metric handles, usually derived with `#[derive(Bundle)]`.
pub trait Bundle: Sized {
    /// Describes the fields of this bundle.
    fn schema() -> Schema;

    /// Assembles the bundle from the metrics created for its schema.
    fn from_populated(populated: Populated) -> Result<Self, Error>;

    /// Creates every metric of this bundle with the given factory.
    ///
    /// All field problems are reported together as [`Error::Bundle`].
    fn populate<F: MetricFactory + ?Sized>(factory: &F) -> Result<Self, Error> {
        Self::from_populated(populate_schema(factory, &Self::schema())?)
    }
}

/// Creates the metric for every field of `schema` and stores it in `target`.
///
/// A failing field never stops the others. Fields with resolution errors are not
/// passed to the factory. The returned errors cover every failed field.
///
/// `target` must have been created from `schema`; otherwise nothing is created.
pub fn populate<F>(factory: &F, schema: &Schema, target: &mut Populated) -> Result<(), Errors>
where
    F: MetricFactory + ?Sized,
{
    let mut errors = Errors::new();
    if !target.matches(schema) {
        errors.push(Error::InvalidBundle {
            type_name: schema.type_name.clone(),
            reason: format!("slots were created for '{}'", target.type_name),
        });
        return Err(errors);
    }
    for (index, field) in schema.fields().iter().enumerate() {
        if field.skip() {
            continue;
        }

        let Resolved {
            opts,
            label_names,
            errors: field_errors,
        } = field.new_opts();

        let resolved = field_errors.is_empty();
        errors.append(field_errors);

        let Some(opts) = opts.filter(|_| resolved) else {
            continue;
        };

        let metric = if label_names.is_empty() {
            factory.new_metric(opts)
        } else {
            factory.new_vec(opts, &label_names)
        };

        if let Some(metric) = errors.check(metric) {
            errors.check(target.set(index, metric));
        }
    }

    errors.into_result()
}

/// Validates `schema` and populates a fresh set of slots for it.
pub fn populate_schema<F>(factory: &F, schema: &Schema) -> Result<Populated, Error>
where
    F: MetricFactory + ?Sized,
{
    schema.validate()?;

    let mut populated = Populated::new(schema);
    populate(factory, schema, &mut populated)?;
    Ok(populated)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use prometheus::{Counter, CounterVec, Registry};

    use super::*;
    use crate::config::Config;
    use crate::factory::Factory;
    use crate::field::FieldKind;
    use crate::opts::MetricOpts;
    use crate::tag::Tag;

    /// Delegates to a real factory, recording each call.
    struct Recording {
        inner: Factory,
        calls: RefCell<Vec<String>>,
    }

    impl Recording {
        fn new() -> Self {
            Self {
                inner: Factory::new(&Config::new("test", ""), Registry::new()),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl MetricFactory for Recording {
        fn new_metric(&self, opts: MetricOpts) -> Result<Metric, Error> {
            self.calls.borrow_mut().push(opts.name().to_string());
            self.inner.new_metric(opts)
        }

        fn new_vec(&self, opts: MetricOpts, label_names: &[String]) -> Result<Metric, Error> {
            self.calls
                .borrow_mut()
                .push(format!("{}{label_names:?}", opts.name()));
            self.inner.new_vec(opts, label_names)
        }
    }

    fn schema() -> Schema {
        Schema::new("Server")
            .field(Field::of_kind("Requests", FieldKind::Counter).tag(Tag::Help, "requests"))
            .field(
                Field::of_kind("Errors", FieldKind::CounterVec)
                    .tag(Tag::LabelNames, "code")
                    .tag(Tag::Help, "errors"),
            )
            .field(Field::new("port", "u16", FieldKind::Other))
            .field(Field::of_kind("Skipped", FieldKind::Gauge).tag(Tag::Ignore, "-"))
    }

    #[test]
    fn test_populate_schema() {
        let factory = Recording::new();
        let populated = populate_schema(&factory, &schema()).unwrap();

        assert_eq!(factory.calls(), vec!["requests", r#"errors["code"]"#]);
        assert_eq!(populated.len(), 2);
        assert_eq!(populated.get("Requests").unwrap().kind(), "Counter");
        assert_eq!(populated.get("Errors").unwrap().fq_name(), "test_errors");
        assert!(populated.get("port").is_none());
        assert!(populated.get("Skipped").is_none());
    }

    #[test]
    fn test_populate_is_fail_soft() {
        let schema = Schema::new("Broken")
            .field(Field::of_kind("First", FieldKind::CounterVec))
            .field(Field::of_kind("Second", FieldKind::Counter).tag(Tag::Help, "ok"))
            .field(Field::of_kind("Third", FieldKind::Histogram).tag(Tag::Buckets, "x, y"))
            .field(Field::of_kind("Fourth", FieldKind::Observer).tag(Tag::Type, "gauge"));

        let factory = Recording::new();
        let mut populated = Populated::new(&schema);
        let errors = populate(&factory, &schema, &mut populated).unwrap_err();

        assert_eq!(errors.len(), 4);
        assert_eq!(factory.calls(), vec!["second"]);
        assert_eq!(populated.len(), 1);
    }

    #[test]
    fn test_factory_errors_are_collected() {
        let schema = Schema::new("Twice")
            .field(Field::of_kind("Requests", FieldKind::Counter))
            .field(Field::of_kind("Other", FieldKind::Counter).tag(Tag::Name, "requests"));

        let factory = Recording::new();
        let err = populate_schema(&factory, &schema).unwrap_err();

        assert!(err.is_already_registered());
        assert_eq!(factory.calls().len(), 2);
    }

    #[test]
    fn test_invalid_schema_is_rejected_before_any_call() {
        let factory = Recording::new();

        let duplicated = schema().field(Field::of_kind("Requests", FieldKind::Gauge));
        let err = populate_schema(&factory, &duplicated).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'Server' is not a valid bundle: field 'Requests' is declared more than once"
        );

        let unnamed = Schema::new("Unnamed").field(Field::of_kind("", FieldKind::Counter));
        assert!(matches!(
            populate_schema(&factory, &unnamed),
            Err(Error::InvalidBundle { .. })
        ));

        assert!(factory.calls().is_empty());
    }

    #[test]
    fn test_take() {
        let factory = Recording::new();
        let mut populated = populate_schema(&factory, &schema()).unwrap();

        let requests: Counter = populated.take(0).unwrap();
        requests.inc();

        let errors = populated.take::<Counter>(1).unwrap_err();
        assert_eq!(
            errors.to_string(),
            "'Errors CounterVec': metric type mismatch: got CounterVec"
        );

        // taking moves the metric out
        assert!(populated.take::<Counter>(0).is_err());
        assert!(populated.take::<Option<CounterVec>>(1).unwrap().is_none());
        assert!(matches!(
            populated.take::<Counter>(3).unwrap_err(),
            Error::Field(fe) if fe.message == "metric was not populated"
        ));
        assert!(matches!(
            populated.take::<Counter>(9),
            Err(Error::InvalidBundle { .. })
        ));
    }

    #[test]
    fn test_set_out_of_range() {
        let mut populated = Populated::new(&schema());
        let counter = Counter::new("requests", "help").unwrap();

        assert!(populated.set(0, counter.clone().into()).is_ok());
        assert!(matches!(
            populated.set(4, counter.into()),
            Err(Error::InvalidBundle { .. })
        ));
        assert_eq!(populated.len(), 1);
    }

    #[test]
    fn test_populate_into_foreign_slots() {
        let factory = Recording::new();
        let other = Schema::new("Other").field(Field::of_kind("Jobs", FieldKind::Counter));
        let mut populated = Populated::new(&other);

        let errors = populate(&factory, &schema(), &mut populated).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.to_string(),
            "'Server' is not a valid bundle: slots were created for 'Other'"
        );
        assert!(factory.calls().is_empty());
        assert!(populated.is_empty());
    }
}
