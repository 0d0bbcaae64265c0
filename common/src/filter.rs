//! Two-axis (type × year) filter state.
//!
//! Each axis is either in all-mode or holds a non-empty explicit subset.
//! Removing the last member of a subset falls back to all-mode, so no
//! mutation can ever leave an axis selecting nothing.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::payload::Payload;

// ─── Selection ───────────────────────────────────────────────────────────────

/// One filter axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection<T: Ord> {
    /// `None` is all-mode; `Some` is never empty.
    subset: Option<BTreeSet<T>>,
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Selection { subset: None }
    }
}

impl<T: Ord + Clone> Selection<T> {
    pub fn all() -> Self {
        Selection { subset: None }
    }

    /// Explicit subset; an empty iterator yields all-mode.
    pub fn only(ids: impl IntoIterator<Item = T>) -> Self {
        let set: BTreeSet<T> = ids.into_iter().collect();
        Selection {
            subset: (!set.is_empty()).then_some(set),
        }
    }

    pub fn is_all(&self) -> bool {
        self.subset.is_none()
    }

    pub fn subset(&self) -> Option<&BTreeSet<T>> {
        self.subset.as_ref()
    }

    /// Whether `id` is selected. All-mode selects everything.
    pub fn contains(&self, id: &T) -> bool {
        self.subset.as_ref().map_or(true, |s| s.contains(id))
    }

    pub fn select_all(&mut self) {
        self.subset = None;
    }

    /// Toggle one id.
    ///
    /// In all-mode this starts a fresh single-element subset rather than
    /// removing `id` from the full domain.
    pub fn toggle(&mut self, id: T) {
        match &mut self.subset {
            None => {
                self.subset = Some(BTreeSet::from([id]));
            }
            Some(set) => {
                if !set.remove(&id) {
                    set.insert(id);
                }
                if set.is_empty() {
                    debug!("Selection emptied, reverting to all-mode");
                    self.subset = None;
                }
            }
        }
    }

    /// Drop subset members failing `keep`; falls back to all-mode when
    /// nothing survives.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        if let Some(set) = &mut self.subset {
            set.retain(|id| keep(id));
            if set.is_empty() {
                debug!("Selection no longer matches the domain, reverting to all-mode");
                self.subset = None;
            }
        }
    }

    /// Selected members of `domain`, in domain order. Never empty unless the
    /// domain itself is.
    pub fn resolve(&self, domain: &[T]) -> Vec<T> {
        let picked: Vec<T> = domain.iter().filter(|id| self.contains(id)).cloned().collect();
        if picked.is_empty() {
            domain.to_vec()
        } else {
            picked
        }
    }
}

// ─── Visible years ───────────────────────────────────────────────────────────

/// Years worth rendering for `types`, newest first.
///
/// With `show_all` every payload year is returned. Otherwise years older
/// than the first year with any activity are dropped; empty years after it
/// are kept. When nothing has activity the single oldest year is returned.
pub fn visible_years(payload: &Payload, types: &[String], show_all: bool) -> Vec<i32> {
    let mut years = payload.years.clone();
    years.sort_unstable();

    if !show_all {
        match years.iter().position(|&y| payload.year_count(y, types) > 0) {
            Some(first_active) => {
                years.drain(..first_active);
            }
            None => years.truncate(1),
        }
    }

    years.reverse();
    years
}

// ─── FilterState ─────────────────────────────────────────────────────────────

/// The whole interactive selection: one [`Selection`] per axis plus the
/// "show all years" switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub types: Selection<String>,
    pub years: Selection<i32>,
    pub show_all_years: bool,
}

impl FilterState {
    pub fn new(show_all_years: bool) -> Self {
        FilterState {
            show_all_years,
            ..Self::default()
        }
    }

    /// Selected types in payload order.
    pub fn resolved_types(&self, payload: &Payload) -> Vec<String> {
        self.types.resolve(&payload.types)
    }

    /// Year domain offered for the current type selection.
    pub fn visible_years(&self, payload: &Payload) -> Vec<i32> {
        visible_years(payload, &self.resolved_types(payload), self.show_all_years)
    }

    /// Selected years within the visible domain, newest first.
    pub fn resolved_years(&self, payload: &Payload) -> Vec<i32> {
        self.years.resolve(&self.visible_years(payload))
    }

    pub fn toggle_type(&mut self, payload: &Payload, type_id: &str) {
        self.types.toggle(type_id.to_string());
        self.sync_years(payload);
    }

    pub fn select_all_types(&mut self, payload: &Payload) {
        self.types.select_all();
        self.sync_years(payload);
    }

    pub fn toggle_year(&mut self, year: i32) {
        self.years.toggle(year);
    }

    pub fn select_all_years(&mut self) {
        self.years.select_all();
    }

    pub fn set_show_all_years(&mut self, payload: &Payload, show_all: bool) {
        self.show_all_years = show_all;
        self.sync_years(payload);
    }

    /// Drop selected years that left the visible domain.
    fn sync_years(&mut self, payload: &Payload) {
        let visible = self.visible_years(payload);
        self.years.retain(|y| visible.contains(y));
    }
}

// ─── tests ───────────────────────────────────────────────────────────────
