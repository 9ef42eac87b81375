//! "Load more" trigger for lists that grow when their bottom sentinel scrolls into view.

/// Turns sentinel visibility changes into `on_load_more` calls.
///
/// Each hidden-to-visible transition fires at most once. A transition that
/// happens while a page is being fetched (or when there is no next page) is
/// held until the fetch settles, as long as the sentinel is still visible.
pub struct InfiniteScroll<F: FnMut()> {
    on_load_more: F,
    visible: bool,
    /// A visibility transition that has not produced a call yet.
    armed: bool,
    has_next_page: bool,
    is_fetching_next_page: bool,
}

impl<F: FnMut()> InfiniteScroll<F> {
    pub fn new(on_load_more: F) -> Self {
        Self {
            on_load_more,
            visible: false,
            armed: false,
            has_next_page: false,
            is_fetching_next_page: false,
        }
    }

    /// Feed an intersection observation of the sentinel.
    pub fn set_visible(&mut self, visible: bool) {
        if visible && !self.visible {
            self.armed = true;
        } else if !visible {
            self.armed = false;
        }
        self.visible = visible;
        self.try_fire();
    }

    /// Feed the current paging state of the list query.
    pub fn set_query_state(&mut self, has_next_page: bool, is_fetching_next_page: bool) {
        self.has_next_page = has_next_page;
        self.is_fetching_next_page = is_fetching_next_page;
        self.try_fire();
    }

    fn try_fire(&mut self) {
        if self.visible && self.armed && self.has_next_page && !self.is_fetching_next_page {
            self.armed = false;
            (self.on_load_more)();
        }
    }
}
