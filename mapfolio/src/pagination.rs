//! Incremental reveal of the filtered result set.
//!
//! One page counter drives two window sizes: the list shows
//! `page * items_per_page` entities and the map draws markers from the first
//! `page * markers_per_page`. The windows grow together on every
//! [`PaginationWindow::load_more`].

/// Default number of list cards revealed per page.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 8;

/// Default number of map markers revealed per page.
pub const DEFAULT_MARKERS_PER_PAGE: usize = 10;

/// Page counter with independent list and marker page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    page: usize,
    items_per_page: usize,
    markers_per_page: usize,
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE, DEFAULT_MARKERS_PER_PAGE)
    }
}

impl PaginationWindow {
    /// Create a window on page 1. Zero page sizes are raised to 1.
    pub fn new(items_per_page: usize, markers_per_page: usize) -> Self {
        Self {
            page: 1,
            items_per_page: items_per_page.max(1),
            markers_per_page: markers_per_page.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn markers_per_page(&self) -> usize {
        self.markers_per_page
    }

    /// Back to page 1.
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Number of list entries revealed for a filtered set of `total`.
    pub fn list_len(&self, total: usize) -> usize {
        self.page.saturating_mul(self.items_per_page).min(total)
    }

    /// Number of entries considered for markers for a filtered set of `total`.
    pub fn marker_len(&self, total: usize) -> usize {
        self.page.saturating_mul(self.markers_per_page).min(total)
    }

    /// `filtered[0 : page * items_per_page]`
    pub fn list_slice<'a, T>(&self, filtered: &'a [T]) -> &'a [T] {
        &filtered[..self.list_len(filtered.len())]
    }

    /// `filtered[0 : page * markers_per_page]`, before viewport filtering.
    pub fn marker_window<'a, T>(&self, filtered: &'a [T]) -> &'a [T] {
        &filtered[..self.marker_len(filtered.len())]
    }

    /// True when the list window does not yet cover the whole filtered set.
    pub fn has_more(&self, total: usize) -> bool {
        total > self.list_len(total)
    }

    /// Advance one page. Returns false (and changes nothing) when the list
    /// already shows everything.
    pub fn load_more(&mut self, total: usize) -> bool {
        if !self.has_more(total) {
            return false;
        }
        self.page += 1;
        true
    }
}
