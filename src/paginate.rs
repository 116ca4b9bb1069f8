// 📄 Paginator - fixed-size pages over the sorted view

use std::num::NonZeroUsize;

/// Page sizes offered by the dashboards
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

/// ceil(total / size); zero when there is nothing to show
pub fn total_pages(total_items: usize, page_size: NonZeroUsize) -> usize {
    total_items.div_ceil(page_size.get())
}

/// Slice for a 1-based page. Page 0 is read as page 1; a page past the
/// end is simply empty.
pub fn paginate<T>(items: &[T], current_page: usize, page_size: NonZeroUsize) -> &[T] {
    let page = current_page.max(1);
    let size = page_size.get();
    let start = (page - 1).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

/// Next entry in PAGE_SIZES after `current`, wrapping around
pub fn next_page_size(current: NonZeroUsize) -> NonZeroUsize {
    let idx = PAGE_SIZES.iter().position(|s| *s == current.get());
    let next = match idx {
        Some(i) => PAGE_SIZES[(i + 1) % PAGE_SIZES.len()],
        None => PAGE_SIZES[0],
    };
    NonZeroUsize::new(next).unwrap_or(DEFAULT_PAGE_SIZE)
}

pub fn previous_page_size(current: NonZeroUsize) -> NonZeroUsize {
    let idx = PAGE_SIZES.iter().position(|s| *s == current.get());
    let previous = match idx {
        Some(i) => PAGE_SIZES[(i + PAGE_SIZES.len() - 1) % PAGE_SIZES.len()],
        None => PAGE_SIZES[0],
    };
    NonZeroUsize::new(previous).unwrap_or(DEFAULT_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_total_pages_boundaries() {
        assert_eq!(total_pages(0, size(10)), 0);
        assert_eq!(total_pages(1, size(10)), 1);
        assert_eq!(total_pages(10, size(10)), 1);
        assert_eq!(total_pages(11, size(10)), 2);
        assert_eq!(total_pages(25, size(10)), 3);
    }

    #[test]
    fn test_twenty_five_items_by_ten() {
        let items: Vec<usize> = (0..25).collect();

        assert_eq!(paginate(&items, 1, size(10)), &items[0..10]);
        assert_eq!(paginate(&items, 3, size(10)).len(), 5);
        assert_eq!(paginate(&items, 3, size(10)), &items[20..25]);
        assert!(paginate(&items, 4, size(10)).is_empty());
        assert!(paginate(&items, usize::MAX, size(10)).is_empty());
    }

    #[test]
    fn test_page_zero_reads_as_first_page() {
        let items: Vec<usize> = (0..5).collect();
        assert_eq!(paginate(&items, 0, size(2)), &[0, 1]);
    }

    #[test]
    fn test_pages_cover_everything_once() {
        for total in [0usize, 1, 9, 10, 11, 37] {
            for page_size in [1usize, 3, 10, 50] {
                let items: Vec<usize> = (0..total).collect();
                let pages = total_pages(total, size(page_size));

                let rebuilt: Vec<usize> = (1..=pages)
                    .flat_map(|p| paginate(&items, p, size(page_size)).to_vec())
                    .collect();

                assert_eq!(rebuilt, items, "total {} size {}", total, page_size);
            }
        }
    }

    #[test]
    fn test_page_size_cycle() {
        assert_eq!(next_page_size(size(10)).get(), 25);
        assert_eq!(next_page_size(size(100)).get(), 10);
        assert_eq!(previous_page_size(size(10)).get(), 100);
        assert_eq!(next_page_size(size(7)).get(), 10);
    }
}
