use crate::context::MapContext;
use crate::outcome::MapResult;
use crate::try_outcome;
use tracing::{debug, warn};

/// Upper bound on page fetches for one pagination loop.
pub const DEFAULT_PAGE_CEILING: usize = 1000;

/// One fetched page. `next` is the cursor for the following page; `None`
/// marks the last page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T, C> {
    pub items: Vec<T>,
    pub next: Option<C>,
}

impl<T, C> Page<T, C> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    pub fn more(items: Vec<T>, next: C) -> Self {
        Self {
            items,
            next: Some(next),
        }
    }
}

/// Fetches pages through the `fetch` sub-map until one reports the last page
/// or `ceiling` fetches were made, concatenating items in page order.
///
/// An error outcome from any page ends the loop; items gathered so far are
/// dropped and the error becomes the result. Hitting the ceiling is logged
/// and the items gathered so far are returned.
pub fn paginate<'a, T, C, F>(
    ctx: &MapContext<'a>,
    name: &str,
    start: C,
    ceiling: usize,
    mut fetch: F,
) -> MapResult<Vec<T>>
where
    F: FnMut(&MapContext<'a>, C) -> MapResult<Page<T, C>>,
{
    let mut items = Vec::new();
    let mut next = Some(start);
    let mut fetched = 0usize;

    while let Some(cursor) = next.take() {
        if fetched == ceiling {
            warn!(
                submap = name,
                ceiling,
                items = items.len(),
                "pagination ceiling reached before last page, returning partial result"
            );
            break;
        }
        let page = try_outcome!(ctx.invoke(name, cursor, &mut fetch)?);
        fetched += 1;
        items.extend(page.items);
        next = page.next;
    }

    debug!(submap = name, pages = fetched, items = items.len(), "pagination finished");
    Ok(Ok(items))
}
