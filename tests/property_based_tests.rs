//! Property suites over paths, validators, the dependency graph, and the
//! service state machine.

use cachegrid_core::catalog::validation::Validator;
use cachegrid_core::catalog::AttributeValue;
use cachegrid_core::model::{PathSegment, ResourceKind, ResourcePath};
use cachegrid_core::services::{determine_target_state, DependencyGraph, ServiceEvent, ServiceName, ServiceState};
use proptest::prelude::*;

fn resource_kind_strategy() -> impl Strategy<Value = ResourceKind> {
    prop::sample::select(vec![
        ResourceKind::CacheContainer,
        ResourceKind::Transport,
        ResourceKind::LocalCache,
        ResourceKind::ReplicatedCache,
        ResourceKind::DistributedCache,
        ResourceKind::InvalidationCache,
        ResourceKind::Locking,
        ResourceKind::Transaction,
        ResourceKind::Expiration,
        ResourceKind::Memory,
        ResourceKind::FileStore,
        ResourceKind::JdbcStore,
        ResourceKind::RemoteStore,
        ResourceKind::RocksdbStore,
        ResourceKind::CustomStore,
        ResourceKind::Authorization,
    ])
}

fn segment_strategy() -> impl Strategy<Value = PathSegment> {
    (resource_kind_strategy(), "[a-z][a-z0-9-]{0,10}")
        .prop_map(|(kind, name)| PathSegment::new(kind, name))
}

fn path_strategy() -> impl Strategy<Value = ResourcePath> {
    prop::collection::vec(segment_strategy(), 1..5).prop_map(ResourcePath::new)
}

proptest! {
    /// Property: paths survive a display/parse round trip.
    #[test]
    fn paths_round_trip_through_display(path in path_strategy()) {
        let rendered = path.to_string();
        let parsed: ResourcePath = rendered.parse().unwrap();
        prop_assert_eq!(parsed, path);
    }

    /// Property: every strict prefix of a path contains the path.
    #[test]
    fn prefixes_contain_their_extensions(path in path_strategy()) {
        let mut prefix = ResourcePath::root();
        for segment in path.segments() {
            prefix = prefix.child(segment.clone());
            prop_assert!(prefix.contains(&path));
        }
    }

    /// Property: the range validator accepts exactly the values in range.
    #[test]
    fn long_range_validator_matches_the_range(
        bounds in (any::<i32>(), any::<i32>()),
        value in any::<i32>(),
    ) {
        let (a, b) = bounds;
        let (min, max) = (i64::from(a.min(b)), i64::from(a.max(b)));
        let validator = Validator::LongRange { min, max };
        let value = i64::from(value);
        let accepted = validator.validate("slot", &AttributeValue::Long(value)).is_ok();
        prop_assert_eq!(accepted, value >= min && value <= max);
    }

    /// Property: stop order is exactly reversed start order and covers every
    /// dependent exactly once.
    #[test]
    fn dependency_orders_are_consistent(cache_count in 1usize..12) {
        let container = ServiceName::container("web");
        let mut graph = DependencyGraph::new();
        graph.add_service(container.clone());

        let caches: Vec<ServiceName> = (0..cache_count)
            .map(|i| ServiceName::cache("web", format!("cache-{i}")))
            .collect();
        for cache in &caches {
            graph.add_service(cache.clone());
            graph.add_dependency(cache, &container).unwrap();
        }
        // Chain a second-level dependent under the first cache.
        let backup = ServiceName::cache("web", "backup");
        graph.add_service(backup.clone());
        graph.add_dependency(&backup, &caches[0]).unwrap();

        let start = graph.start_order(&container);
        let mut stop = graph.stop_order(&container);
        stop.reverse();
        prop_assert_eq!(&start, &stop);
        prop_assert_eq!(start.len(), cache_count + 1);

        let first = start.iter().position(|s| s == &caches[0]).unwrap();
        let second = start.iter().position(|s| s == &backup).unwrap();
        prop_assert!(first < second);
    }

    /// Property: the state machine never reaches running without passing
    /// through installing.
    #[test]
    fn running_is_only_reachable_from_installing(
        events in prop::collection::vec(
            prop::sample::select(vec![
                ServiceEvent::Install,
                ServiceEvent::Started,
                ServiceEvent::Stop,
                ServiceEvent::Stopped,
                ServiceEvent::Recreate,
                ServiceEvent::Fail,
            ]),
            0..32,
        ),
    ) {
        let mut state = ServiceState::Uninstalled;
        for event in events {
            let previous = state;
            if let Ok(next) = determine_target_state("svc", state, event) {
                if next == ServiceState::Running {
                    prop_assert_eq!(previous, ServiceState::Installing);
                }
                state = next;
            }
        }
    }
}
