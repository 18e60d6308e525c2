//! Pagination over filtered records

/// Rows shown per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of a filtered result.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<T> {
    /// Items on this page, in order.
    pub items: Vec<T>,
    /// 1-based page number after clamping.
    pub page: usize,
    /// Number of pages, zero when nothing matched.
    pub total_pages: usize,
    /// Number of items across all pages.
    pub total: usize,
    /// Page size used for slicing.
    pub page_size: usize,
}

impl<T> PageView<T> {
    /// 1-based position of the first item on this page, zero when empty.
    pub fn start(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.page - 1) * self.page_size + 1
        }
    }

    /// 1-based position of the last item on this page, zero when empty.
    pub fn end(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.start() + self.items.len() - 1
        }
    }

    /// Returns `true` if an earlier page exists.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Returns `true` if a later page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Footer text, e.g. "Showing 11 to 20 of 42 results".
    pub fn summary(&self) -> String {
        format!(
            "Showing {} to {} of {} results",
            self.start(),
            self.end(),
            self.total
        )
    }
}

/// Number of pages needed for `count` items.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

/// Clamps a requested page into `[1, total_pages]`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Slices `items` into the requested page.
///
/// Out-of-range pages clamp silently. A zero page size is treated as one.
///
/// # Example
///
/// ```
/// use cms_lib::table::paginate;
///
/// let items: Vec<u32> = (1..=25).collect();
/// let page = paginate(&items, 9, 10);
///
/// assert_eq!(page.page, 3);
/// assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
/// assert_eq!(page.summary(), "Showing 21 to 25 of 25 results");
/// ```
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> PageView<T> {
    let page_size = page_size.max(1);
    let total = items.len();
    let total_pages = total_pages(total, page_size);
    let page = clamp_page(page, total_pages);

    let start = ((page - 1) * page_size).min(total);
    let end = (start + page_size).min(total);

    PageView {
        items: items[start..end].to_vec(),
        page,
        total_pages,
        total,
        page_size,
    }
}
