use serde::{Deserialize, Serialize};

pub const PER_PAGE: i64 = 20;

/// `?page=` as sent by the client. Kept as a string so junk falls back to page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub total_pages: i64,
    pub limit: i64,
    pub offset: i64,
}

impl PageQuery {
    /// Non-numeric or non-positive pages go to the first page,
    /// pages past the end go to the last one.
    pub fn window(&self, total: i64) -> PageWindow {
        let total_pages = ((total + PER_PAGE - 1) / PER_PAGE).max(1);
        let requested = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let page = requested.min(total_pages);
        PageWindow {
            page,
            total_pages,
            limit: PER_PAGE,
            offset: (page - 1) * PER_PAGE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total: i64) -> Self {
        Self {
            items,
            page: window.page,
            total_pages: window.total_pages,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(page: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
        }
    }

    #[test]
    fn defaults_to_first_page() {
        let w = q(None).window(45);
        assert_eq!(w, PageWindow { page: 1, total_pages: 3, limit: 20, offset: 0 });
    }

    #[test]
    fn garbage_page_falls_back_to_first() {
        assert_eq!(q(Some("abc")).window(45).page, 1);
        assert_eq!(q(Some("-2")).window(45).page, 1);
        assert_eq!(q(Some("0")).window(45).page, 1);
    }

    #[test]
    fn page_past_the_end_is_clamped() {
        let w = q(Some("9")).window(45);
        assert_eq!(w.page, 3);
        assert_eq!(w.offset, 40);
    }

    #[test]
    fn empty_history_still_has_one_page() {
        let w = q(Some("2")).window(0);
        assert_eq!(w.page, 1);
        assert_eq!(w.total_pages, 1);
    }
}
