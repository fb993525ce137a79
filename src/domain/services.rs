//! Catalog query engine.
//!
//! Computes the visible subset of a deal collection for a pair of filter
//! criteria. [`visible_deals`] is the pure rule; [`CatalogView`] memoizes it so
//! a redraw with unchanged inputs hands back the very same result.

use std::sync::Arc;

use tracing::debug;

use super::models::{Deal, FilterCriteria};

/// True when the deal passes the category predicate.
pub fn matches_category(deal: &Deal, criteria: &FilterCriteria) -> bool {
    criteria.selected_category.accepts(deal.category)
}

/// True when the search text is blank, or appears case-insensitively in the
/// title, description or location.
pub fn matches_text(deal: &Deal, criteria: &FilterCriteria) -> bool {
    if !criteria.has_search() {
        return true;
    }
    let needle = criteria.search_query.to_lowercase();
    [&deal.title, &deal.description, &deal.location]
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// The deals visible under `criteria`, in their original order.
///
/// # Examples
///
/// ```
/// use dealspot::domain::{visible_deals, FilterCriteria};
///
/// assert!(visible_deals(&[], &FilterCriteria::default()).is_empty());
/// ```
pub fn visible_deals(all_deals: &[Deal], criteria: &FilterCriteria) -> Vec<Deal> {
    all_deals
        .iter()
        .filter(|deal| matches_category(deal, criteria) && matches_text(deal, criteria))
        .cloned()
        .collect()
}

/// Memoized view over a shared deal collection.
///
/// The cache key is the identity of the source `Arc` plus both criteria, so
/// replacing the catalog (even with equal contents) forces a rescan while an
/// unrelated redraw does not.
#[derive(Debug, Default)]
pub struct CatalogView {
    cached: Option<CachedView>,
    recomputations: usize,
}

#[derive(Debug)]
struct CachedView {
    source: Arc<[Deal]>,
    criteria: FilterCriteria,
    result: Arc<[Deal]>,
}

impl CatalogView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&mut self, deals: &Arc<[Deal]>, criteria: &FilterCriteria) -> Arc<[Deal]> {
        if let Some(cached) = &self.cached {
            if Arc::ptr_eq(&cached.source, deals) && cached.criteria == *criteria {
                return Arc::clone(&cached.result);
            }
        }

        let result: Arc<[Deal]> = visible_deals(deals, criteria).into();
        self.recomputations += 1;
        debug!(
            category = criteria.selected_category.label(),
            query = %criteria.search_query,
            total = deals.len(),
            visible = result.len(),
            "recomputed catalog view"
        );
        self.cached = Some(CachedView {
            source: Arc::clone(deals),
            criteria: criteria.clone(),
            result: Arc::clone(&result),
        });
        result
    }

    /// Number of full rescans performed so far.
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }
}
