//! Paging parameters for user listings.

/// 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn new(page: u32, per_page: u32) -> Self { Self { page, per_page } }

    /// Zero-based page index and page size, clamped to `1..=MAX_PER_PAGE`.
    pub fn normalize(self) -> (u64, u64) {
        let page = self.page.max(1);
        let per_page = self.per_page.clamp(1, Self::MAX_PER_PAGE);
        (u64::from(page - 1), u64::from(per_page))
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}

#[cfg(test)]
mod tests {
    use super::Pagination;

    #[test]
    fn zero_inputs_fall_back_to_first_page_of_one() {
        assert_eq!(Pagination::new(0, 0).normalize(), (0, 1));
    }

    #[test]
    fn page_size_is_capped() {
        assert_eq!(Pagination::new(5, 1000).normalize(), (4, 100));
    }

    #[test]
    fn default_is_first_page_of_twenty() {
        assert_eq!(Pagination::default().normalize(), (0, 20));
    }
}
