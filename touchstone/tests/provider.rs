use std::sync::Arc;

use touchstone::prometheus::{Counter, GaugeVec, Registry};
use touchstone::{Bundle, Config, Factory, MetricFactory, provide, provide_arc, provide_boxed};

#[derive(Bundle, Debug)]
struct Queue {
    #[metric(help = "Enqueued items")]
    enqueued: Counter,
    #[metric(help = "Depth by queue", label_names = "queue")]
    depth: GaugeVec,
}

fn factory(namespace: &str) -> Factory {
    Factory::new(&Config::new(namespace, ""), Registry::new())
}

#[test]
fn test_value_provider() {
    let provider = provide::<Queue>().unwrap();
    assert_eq!(provider.type_name(), "Queue");

    let queue: Queue = provider.construct(&factory("a")).unwrap();
    queue.enqueued.inc();
    queue.depth.with_label_values(&["jobs"]).set(3.0);
    assert_eq!(queue.depth.with_label_values(&["jobs"]).get(), 3.0);
}

#[test]
fn test_pointer_providers() {
    let boxed: Box<Queue> = provide_boxed::<Queue>().unwrap().construct(&factory("b")).unwrap();
    let shared: Arc<Queue> = provide_arc::<Queue>().unwrap().construct(&factory("c")).unwrap();

    boxed.enqueued.inc();
    let clone = Arc::clone(&shared);
    clone.enqueued.inc_by(2.0);
    assert_eq!(shared.enqueued.get(), 2.0);
    assert_eq!(boxed.enqueued.get(), 1.0);
}

#[test]
fn test_construct_through_trait_object() {
    let factory = factory("d");
    let dynamic: &dyn MetricFactory = &factory;

    let queue = provide::<Queue>().unwrap().construct(dynamic).unwrap();
    queue.enqueued.inc();

    let families = factory.registry().gather();
    assert_eq!(families.len(), 1);
    assert_eq!(families[0].get_name(), "d_enqueued");
}

#[test]
fn test_every_construct_registers_a_new_bundle() {
    let provider = provide::<Queue>().unwrap();
    let factory = factory("e");

    assert!(provider.construct(&factory).is_ok());
    let err = provider.construct(&factory).unwrap_err();
    assert!(err.is_already_registered());
}
