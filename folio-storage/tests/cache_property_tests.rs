//! Property-Based Tests for the categorized-site cache
//!
//! Property: for any interleaving of reads, invalidations and store writes,
//! a read returns the count derived at the most recent invalidation point,
//! and the store is queried exactly once per invalidation that is followed
//! by a read.

use folio_core::{Category, PostStatus, RenderMode, SaveKind};
use folio_storage::InMemoryContentStore;
use folio_test_utils::{
    make_post, render_mode_strategy, save_kind_strategy, unpublished_status_strategy,
    wired_memory_site, write_event_strategy,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    /// New category with one published post, saved with the given kind.
    PublishInNewCategory(SaveKind),
    /// New category whose only post is not published.
    DraftInNewCategory(PostStatus, SaveKind),
    /// Edit an existing category (or a new one when there is none).
    EditCategory,
    Read(RenderMode),
    Invalidate,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        save_kind_strategy().prop_map(Op::PublishInNewCategory),
        (unpublished_status_strategy(), save_kind_strategy())
            .prop_map(|(status, save)| Op::DraftInNewCategory(status, save)),
        Just(Op::EditCategory),
        render_mode_strategy().prop_map(Op::Read),
        Just(Op::Invalidate),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_reads_match_model(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let store = InMemoryContentStore::new();
        let (site, _backend) = wired_memory_site(&store);
        let mut categories: Vec<Category> = Vec::new();

        // Count the cache should be holding, None when it must recompute.
        let mut cached: Option<usize> = None;
        let mut published = 0usize;
        let mut expected_derivations = 0u64;

        for op in ops {
            match op {
                Op::PublishInNewCategory(save) => {
                    let category = Category::new(format!("Cat {}", categories.len()));
                    store.insert_category(category.clone()).unwrap();
                    store
                        .save_post(make_post(PostStatus::Publish, &[category.category_id]), save)
                        .unwrap();
                    published += 1;
                    if save == SaveKind::Manual {
                        cached = None;
                    }
                    categories.push(category);
                }
                Op::DraftInNewCategory(status, save) => {
                    let category = Category::new(format!("Cat {}", categories.len()));
                    store.insert_category(category.clone()).unwrap();
                    store
                        .save_post(make_post(status, &[category.category_id]), save)
                        .unwrap();
                    if save == SaveKind::Manual {
                        cached = None;
                    }
                    categories.push(category);
                }
                Op::EditCategory => {
                    let category = categories
                        .last()
                        .cloned()
                        .unwrap_or_else(|| Category::new("Edited"));
                    store.edit_category(category).unwrap();
                    cached = None;
                }
                Op::Read(mode) => {
                    let count = match cached {
                        Some(count) => count,
                        None => {
                            expected_derivations += 1;
                            let count = published.min(2);
                            cached = Some(count);
                            count
                        }
                    };
                    let read = site.category_count(&store);
                    prop_assert_eq!(*read.value(), count);
                    prop_assert_eq!(
                        site.is_categorized(&store, mode),
                        count > 1 || mode.is_preview()
                    );
                }
                Op::Invalidate => {
                    site.invalidate();
                    cached = None;
                }
            }
        }

        prop_assert_eq!(site.cache().stats().derivations, expected_derivations);
        prop_assert_eq!(store.query_count(), expected_derivations);
    }

    /// Only autosaves are filtered; every other write event invalidates.
    #[test]
    fn prop_only_autosaves_are_ignored(event in write_event_strategy()) {
        let store = InMemoryContentStore::new();
        let (site, _backend) = wired_memory_site(&store);
        site.category_count(&store);

        let invalidated = site.cache().on_upstream_write(&event);
        prop_assert_eq!(invalidated, !event.is_autosave);
        prop_assert_eq!(site.cache().peek().unwrap().is_absent(), invalidated);
    }
}

