//! Pagination view-model planning
//!
//! A pure function from the endpoint's authoritative `(current_page,
//! last_page)` metadata to the buttons a render surface should draw. The
//! planner never touches the query; it is re-run after every accepted fetch.

use serde::{Deserialize, Serialize};

/// How many pages to show on each side of the current page in detailed mode
const WINDOW: u64 = 2;

/// One entry in the page-button strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageItem {
    /// A numbered page button
    Page(u64),
    /// A gap between the window and a boundary page
    Ellipsis,
}

/// Pagination view-model for the render surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationPlan {
    /// Page buttons in display order (empty in simple mode)
    pub items: Vec<PageItem>,
    /// Current page, clamped into `1..=last`
    pub current: u64,
    /// Last available page
    pub last: u64,
    /// Whether the previous-page affordance is enabled
    pub prev_enabled: bool,
    /// Whether the next-page affordance is enabled
    pub next_enabled: bool,
}

impl PaginationPlan {
    /// Detailed mode: first and last page always shown, a window of
    /// ±2 pages around the current page, and an ellipsis wherever the
    /// window does not abut a boundary page.
    pub fn detailed(current: u64, last: u64) -> Self {
        let last = last.max(1);
        let current = current.clamp(1, last);

        let window_start = current.saturating_sub(WINDOW).max(1);
        let window_end = (current + WINDOW).min(last);

        let mut items = Vec::new();
        items.push(PageItem::Page(1));
        if window_start > 2 {
            items.push(PageItem::Ellipsis);
        }
        for page in window_start..=window_end {
            if page != 1 && page != last {
                items.push(PageItem::Page(page));
            }
        }
        if window_end + 1 < last {
            items.push(PageItem::Ellipsis);
        }
        if last > 1 {
            items.push(PageItem::Page(last));
        }

        Self {
            items,
            current,
            last,
            prev_enabled: current > 1,
            next_enabled: current < last,
        }
    }

    /// Simple mode: previous/next affordances only, no page buttons.
    pub fn simple(current: u64, last: u64) -> Self {
        let last = last.max(1);
        let current = current.clamp(1, last);
        Self {
            items: Vec::new(),
            current,
            last,
            prev_enabled: current > 1,
            next_enabled: current < last,
        }
    }
}

impl Default for PaginationPlan {
    fn default() -> Self {
        Self::simple(1, 1)
    }
}
