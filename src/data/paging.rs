// ---------------------------------------------------------------------------
// Page arithmetic: (page, column, row) → event id
// ---------------------------------------------------------------------------

/// Current position in a dataset shown `cols × rows` tiles at a time.
///
/// Pages are numbered from 1. The last page may be partially filled; its
/// trailing tiles map to ids `>= n_events` and are treated as padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    n_events: usize,
    cols: usize,
    rows: usize,
    current: usize,
}

impl Pager {
    /// Start at page 1. Zero-sized grids are bumped to 1×1.
    pub fn new(n_events: usize, cols: usize, rows: usize) -> Self {
        Self {
            n_events,
            cols: cols.max(1),
            rows: rows.max(1),
            current: 1,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn page_size(&self) -> usize {
        self.cols * self.rows
    }

    /// At least one page, even for an empty dataset.
    pub fn n_pages(&self) -> usize {
        self.n_events.div_ceil(self.page_size()).max(1)
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Event id under tile `(x, y)`, padding included.
    pub fn index(&self, x: usize, y: usize) -> usize {
        (self.current - 1) * self.page_size() + x + self.cols * y
    }

    /// Event id under tile `(x, y)`, `None` for padding tiles.
    pub fn event_at(&self, x: usize, y: usize) -> Option<usize> {
        let id = self.index(x, y);
        (x < self.cols && y < self.rows && id < self.n_events).then_some(id)
    }

    /// Real event ids on the current page, row-major.
    pub fn visible_ids(&self) -> std::ops::Range<usize> {
        let start = (self.current - 1) * self.page_size();
        let end = (start + self.page_size()).min(self.n_events);
        start..end.max(start)
    }

    /// Advance one page; `false` if already on the last one.
    pub fn next(&mut self) -> bool {
        if self.current < self.n_pages() {
            self.current += 1;
            log::info!("Page: {}", self.current);
            true
        } else {
            log::warn!("This is the last page!");
            false
        }
    }

    /// Go back one page; `false` if already on the first one.
    pub fn prev(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            log::info!("Page: {}", self.current);
            true
        } else {
            log::warn!("This is the first page!");
            false
        }
    }

    /// Change the grid shape, keeping the first visible event on screen.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let first = (self.current - 1) * self.page_size();
        self.cols = cols.max(1);
        self.rows = rows.max(1);
        self.current = (first / self.page_size() + 1).min(self.n_pages());
    }
}
