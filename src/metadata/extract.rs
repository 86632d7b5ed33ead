//! metadata::extract
//!
//! Option metadata extraction and the per-type model cache.
//!
//! # Ordering
//!
//! Options are sorted by:
//!
//! 1. Explicit order, ascending (options without one come after all others)
//! 2. Hierarchy rank, ascending: base groups (-1, -2, ...) before the command (0)
//! 3. Declaration index within the level
//!
//! The sort is stable, so equal explicit orders fall back to (2) and (3).
//!
//! # Caching
//!
//! Extraction is pure. [`model`] memoizes the result per type in process-wide
//! state that is only ever added to; models are shared by every invocation.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::declare::{Declaration, Options};
use super::descriptor::{display_name, DefaultValue, FilterDescriptor, OptionDescriptor};
use super::Problem;
use crate::core::naming::Alias;
use crate::core::types::CommandTypeId;

/// Everything extracted from one type's declaration.
pub struct CommandModel<T> {
    command_type: CommandTypeId,
    options: Vec<OptionDescriptor<T>>,
    filters: Vec<FilterDescriptor>,
    problems: Vec<Problem>,
}

impl<T> CommandModel<T> {
    /// Type the model was extracted from.
    pub fn command_type(&self) -> CommandTypeId {
        self.command_type
    }

    /// Options in registration order.
    pub fn options(&self) -> &[OptionDescriptor<T>] {
        &self.options
    }

    /// Filters in declaration order, base levels first.
    pub fn filters(&self) -> &[FilterDescriptor] {
        &self.filters
    }

    /// Problems found in the declaration itself.
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }
}

/// Extract the model of `T` without touching the cache.
pub fn extract<T: Options>() -> CommandModel<T> {
    let mut decl = Declaration::<T>::new();
    T::declare(&mut decl);
    let (levels, problems) = decl.into_levels();

    let filters = levels
        .iter()
        .rev()
        .flat_map(|level| level.filters.iter().copied())
        .collect();

    let mut options = Vec::new();
    for (depth, level) in levels.into_iter().enumerate() {
        let rank = -(depth as i32);
        for (index, decl) in level.options.into_iter().enumerate() {
            let default = DefaultValue::resolve(decl.default, decl.required, decl.zero);
            options.push(OptionDescriptor {
                name: display_name(decl.property.name, decl.name.as_deref()),
                aliases: decl.aliases.iter().map(|a| Alias::parse(a)).collect(),
                property: decl.property,
                value_type: decl.value_type,
                order: decl.order,
                rank,
                index,
                description: decl.description,
                required: decl.required,
                default,
                completions: decl.completions,
                setter: decl.setter,
            });
        }
    }
    options.sort_by_key(|o| o.sort_key());

    CommandModel {
        command_type: CommandTypeId::of::<T>(),
        options,
        filters,
        problems,
    }
}

type ModelCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static MODELS: OnceLock<ModelCache> = OnceLock::new();

/// The cached model of `T`, extracting it on first use.
pub fn model<T: Options>() -> Arc<CommandModel<T>> {
    let cache = MODELS.get_or_init(ModelCache::default);

    let cached = cache.read().get(&TypeId::of::<T>()).cloned();
    if let Some(model) = cached.and_then(|m| m.downcast::<CommandModel<T>>().ok()) {
        return model;
    }

    let extracted: Arc<dyn Any + Send + Sync> = Arc::new(extract::<T>());
    let stored = Arc::clone(
        cache
            .write()
            .entry(TypeId::of::<T>())
            .or_insert(extracted),
    );
    match stored.downcast::<CommandModel<T>>() {
        Ok(model) => model,
        // Keyed by TypeId, so the stored model always has this type.
        Err(_) => Arc::new(extract::<T>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::OptionValue;

    #[derive(Default)]
    struct Base {
        a: bool,
        b: bool,
    }

    impl Options for Base {
        fn declare(decl: &mut Declaration<Self>) {
            decl.option("a", |s: &mut Base, v: bool| s.a = v);
            decl.option("b", |s: &mut Base, v: bool| s.b = v);
            decl.filter_ordered::<BaseFilter>(3);
        }
    }

    struct BaseFilter;
    struct OwnFilter;

    #[derive(Default)]
    struct Derived {
        base: Base,
        c: i32,
        d: Option<String>,
        e: String,
    }

    impl Options for Derived {
        fn declare(decl: &mut Declaration<Self>) {
            decl.option("c", |s: &mut Derived, v: i32| s.c = v);
            decl.option("d", |s: &mut Derived, v: Option<String>| s.d = v);
            decl.option("e", |s: &mut Derived, v: String| s.e = v).required();
            decl.extends(|s: &mut Derived| &mut s.base);
            decl.filter::<OwnFilter>();
        }
    }

    fn names<T>(model: &CommandModel<T>) -> Vec<&str> {
        model.options().iter().map(|o| o.name()).collect()
    }

    mod ordering {
        use super::*;

        #[test]
        fn base_before_derived_without_explicit_order() {
            let model = extract::<Derived>();
            assert_eq!(names(&model), vec!["a", "b", "c", "d", "e"]);
        }

        #[test]
        fn ranks_and_indices() {
            let model = extract::<Derived>();
            let ranks: Vec<_> = model.options().iter().map(|o| (o.rank(), o.index())).collect();
            assert_eq!(ranks, vec![(-1, 0), (-1, 1), (0, 0), (0, 1), (0, 2)]);
        }

        #[derive(Default)]
        struct Explicit {
            base: Base,
            x: i32,
            y: i32,
            z: i32,
        }

        impl Options for Explicit {
            fn declare(decl: &mut Declaration<Self>) {
                decl.extends(|s: &mut Explicit| &mut s.base);
                decl.option("x", |s: &mut Explicit, v: i32| s.x = v).order(2);
                decl.option("y", |s: &mut Explicit, v: i32| s.y = v);
                decl.option("z", |s: &mut Explicit, v: i32| s.z = v).order(1);
            }
        }

        #[test]
        fn explicit_orders_come_first() {
            let model = extract::<Explicit>();
            assert_eq!(names(&model), vec!["z", "x", "a", "b", "y"]);
        }

        #[derive(Default)]
        struct Ties {
            base: TieBase,
            p: i32,
            q: i32,
        }

        #[derive(Default)]
        struct TieBase {
            r: i32,
        }

        impl Options for TieBase {
            fn declare(decl: &mut Declaration<Self>) {
                decl.option("r", |s: &mut TieBase, v: i32| s.r = v).order(5);
            }
        }

        impl Options for Ties {
            fn declare(decl: &mut Declaration<Self>) {
                decl.option("q", |s: &mut Ties, v: i32| s.q = v).order(5);
                decl.option("p", |s: &mut Ties, v: i32| s.p = v).order(5);
                decl.extends(|s: &mut Ties| &mut s.base);
            }
        }

        #[test]
        fn duplicate_orders_break_ties_by_rank_then_index() {
            let model = extract::<Ties>();
            assert_eq!(names(&model), vec!["r", "q", "p"]);
        }
    }

    mod defaults {
        use super::*;

        #[test]
        fn resolution_per_option() {
            let model = extract::<Derived>();
            let by_name = |n: &str| {
                model
                    .options()
                    .iter()
                    .find(|o| o.name() == n)
                    .map(|o| o.default_value().clone())
            };
            assert_eq!(by_name("c"), Some(DefaultValue::ZeroValue(OptionValue::Int(0))));
            assert_eq!(by_name("d"), Some(DefaultValue::ZeroValue(OptionValue::Absent)));
            assert_eq!(by_name("e"), Some(DefaultValue::NoDefault));
        }
    }

    mod filters {
        use super::*;
        use crate::core::types::FilterKey;

        #[test]
        fn base_filters_listed_first() {
            let model = extract::<Derived>();
            assert_eq!(
                model.filters(),
                &[
                    FilterDescriptor {
                        order: 3,
                        key: FilterKey::of::<BaseFilter>()
                    },
                    FilterDescriptor {
                        order: 0,
                        key: FilterKey::of::<OwnFilter>()
                    },
                ]
            );
        }
    }

    mod cache {
        use super::*;

        #[test]
        fn model_is_shared() {
            let first = model::<Derived>();
            let second = model::<Derived>();
            assert!(Arc::ptr_eq(&first, &second));
            assert_eq!(first.command_type(), CommandTypeId::of::<Derived>());
        }
    }
}
