use serde::{Deserialize, Serialize};

/// A 1-indexed page request. Page `0` is read as page `1`; pages past the
/// largest representable offset are read as that last page, which is empty
/// for any real listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        // Offsets are bound as signed 64-bit integers by the database.
        let last = (i64::MAX as u64) / per_page;
        Self {
            page: page.clamp(1, last.max(1)),
            per_page,
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of items preceding this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

/// One page of an ordered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page(),
            per_page: request.per_page(),
            total,
        }
    }

    /// Slice an already ordered collection.
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.per_page() as usize)
            .collect();
        Self::new(items, request, total)
    }

    pub fn pages(&self) -> u64 {
        self.total.div_ceil(self.per_page)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    pub fn prev_num(&self) -> Option<u64> {
        self.has_prev().then(|| self.page - 1)
    }

    pub fn next_num(&self) -> Option<u64> {
        self.has_next().then(|| self.page + 1)
    }

    /// Page numbers for navigation links with the usual edges (1, 1, 2, 1).
    /// `None` marks a gap.
    pub fn iter_pages(&self) -> Vec<Option<u64>> {
        self.iter_pages_with(1, 1, 2, 1)
    }

    pub fn iter_pages_with(
        &self,
        left_edge: u64,
        left_current: u64,
        right_current: u64,
        right_edge: u64,
    ) -> Vec<Option<u64>> {
        let pages = self.pages();
        let mut out = Vec::new();
        let mut last = 0;

        for num in 1..=pages {
            let near_current = num + left_current + 1 > self.page && num < self.page + right_current;
            if num <= left_edge || near_current || num + right_edge > pages {
                if last + 1 != num {
                    out.push(None);
                }
                out.push(Some(num));
                last = num;
            }
        }

        out
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}
