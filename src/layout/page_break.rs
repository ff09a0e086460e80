//! # Page Break Decisions
//!
//! Pure decisions about whether content fits the space left on a page.
//! The paginator acts on them; nothing here touches page state.

/// What to do with a block or a run of table rows.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Everything fits on the current page.
    Place,
    /// Nothing fits here; continue on a fresh page.
    MoveToNextPage,
    /// Place the first `items_on_current_page` items, continue with the rest.
    Split { items_on_current_page: usize },
    /// Larger than an entire empty page. Draw it anyway, clipped.
    Overflow,
}

/// Decide where an unbreakable block of `required` height goes.
///
/// `page_is_empty` is true when nothing has been placed on the current page
/// yet. A block that does not fit an empty page can never fit anywhere, so it
/// is drawn there rather than breaking forever.
pub fn decide_block(remaining: f64, required: f64, page_is_empty: bool) -> BreakDecision {
    if required <= remaining {
        BreakDecision::Place
    } else if page_is_empty {
        BreakDecision::Overflow
    } else {
        BreakDecision::MoveToNextPage
    }
}

/// Decide how many of a run of items (table rows) fit in `remaining`.
pub fn decide_split(remaining: f64, item_heights: &[f64]) -> BreakDecision {
    let total: f64 = item_heights.iter().sum();
    if total <= remaining {
        return BreakDecision::Place;
    }

    let mut running = 0.0;
    let mut fit_count = 0;
    for &h in item_heights {
        if running + h > remaining {
            break;
        }
        running += h;
        fit_count += 1;
    }

    if fit_count == 0 {
        BreakDecision::MoveToNextPage
    } else {
        BreakDecision::Split {
            items_on_current_page: fit_count,
        }
    }
}
