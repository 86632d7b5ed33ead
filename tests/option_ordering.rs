//! Property-based tests for ordering and naming rules.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use async_trait::async_trait;
use proptest::prelude::*;

use cmdhost::core::naming::option_name;
use cmdhost::core::types::FilterKey;
use cmdhost::engine::{
    compose, CommandContext, CommandError, CommandFilter, FilterRegistry, FinalAction, Next,
};
use cmdhost::metadata::FilterDescriptor;

struct Slot<const N: usize>;

#[async_trait]
impl<const N: usize> CommandFilter for Slot<N> {
    async fn invoke(&self, ctx: &mut CommandContext, next: Next) -> Result<(), CommandError> {
        next.run(ctx).await
    }
}

struct Noop;

#[async_trait]
impl FinalAction for Noop {
    async fn run(&self, _ctx: &mut CommandContext) -> Result<(), CommandError> {
        Ok(())
    }
}

/// Slot 5 is never registered.
const SLOTS: usize = 6;

fn descriptor(slot: usize, order: i32) -> FilterDescriptor {
    match slot {
        0 => FilterDescriptor::of::<Slot<0>>(order),
        1 => FilterDescriptor::of::<Slot<1>>(order),
        2 => FilterDescriptor::of::<Slot<2>>(order),
        3 => FilterDescriptor::of::<Slot<3>>(order),
        4 => FilterDescriptor::of::<Slot<4>>(order),
        _ => FilterDescriptor::of::<Slot<5>>(order),
    }
}

fn registry() -> FilterRegistry {
    let mut registry = FilterRegistry::new();
    registry
        .register(Slot::<0>)
        .register(Slot::<1>)
        .register(Slot::<2>)
        .register(Slot::<3>)
        .register(Slot::<4>);
    registry
}

/// Strategy for a list of (slot, order) filter attachments.
fn attachments() -> impl Strategy<Value = Vec<FilterDescriptor>> {
    prop::collection::vec((0..SLOTS, -3i32..3), 0..8).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(slot, order)| descriptor(slot, order))
            .collect()
    })
}

/// Reference ordering: global then local, stable by order, registered only.
fn expected(
    registry: &FilterRegistry,
    global: &[FilterDescriptor],
    local: &[FilterDescriptor],
) -> Vec<FilterKey> {
    let mut all: Vec<(usize, FilterDescriptor)> =
        global.iter().chain(local).copied().enumerate().collect();
    all.sort_by(|(ia, a), (ib, b)| a.order.cmp(&b.order).then(ia.cmp(ib)));
    all.into_iter()
        .map(|(_, d)| d.key)
        .filter(|key| registry.contains(key))
        .collect()
}

proptest! {
    #[test]
    fn pipeline_follows_stable_order(global in attachments(), local in attachments()) {
        let registry = registry();
        let next = compose(&registry, &global, &local, Box::new(Noop));
        prop_assert_eq!(next.keys(), expected(&registry, &global, &local));
    }

    #[test]
    fn outermost_filter_has_lowest_order(global in attachments(), local in attachments()) {
        let registry = registry();
        let next = compose(&registry, &global, &local, Box::new(Noop));

        let registered: Vec<&FilterDescriptor> = global
            .iter()
            .chain(&local)
            .filter(|d| registry.contains(&d.key))
            .collect();
        prop_assert_eq!(next.depth(), registered.len());
        prop_assert_eq!(next.is_terminal(), registered.is_empty());

        if let Some(lowest) = registered.iter().map(|d| d.order).min() {
            let first = registered
                .iter()
                .find(|d| d.order == lowest)
                .map(|d| d.key);
            prop_assert_eq!(next.keys().first().copied(), first);
        }
    }

    #[test]
    fn option_name_is_idempotent(raw in "[-_ a-zA-Z0-9]{0,24}") {
        let once = option_name(&raw);
        prop_assert_eq!(option_name(&once), once.clone());
        prop_assert!(!once.starts_with('-'));
        prop_assert!(!once.ends_with('-'));
        prop_assert!(!once.contains("--"));
        prop_assert!(!once.chars().any(|c| c.is_ascii_uppercase() || c == '_' || c == ' '));
    }
}
