use movielist_models::Record;
use tracing::trace;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 50;

/// One page of a sorted record list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    pub total_pages: usize,
    /// Requested page clamped to `1..=total_pages`
    pub validated_page: usize,
    pub total_records: usize,
}

/// Number of pages, never less than one.
pub fn total_pages(count: usize, items_per_page: usize) -> usize {
    count.div_ceil(items_per_page.max(1)).max(1)
}

/// Slice out `page` (1-based). Out-of-range pages clamp instead of failing.
pub fn paginate(records: &[Record], page: usize, items_per_page: usize) -> Page {
    let items_per_page = items_per_page.max(1);
    let total_pages = total_pages(records.len(), items_per_page);
    let validated_page = page.clamp(1, total_pages);

    let start = (validated_page - 1) * items_per_page;
    let end = records.len().min(start + items_per_page);

    Page {
        records: records[start.min(end)..end].to_vec(),
        total_pages,
        validated_page,
        total_records: records.len(),
    }
}

/// Remembers the last computed page, keyed by the validated page number and
/// the record count.
///
/// The key does not see content changes that keep the count, so callers
/// must [`invalidate`](Paginator::invalidate) when upstream data changes.
#[derive(Debug, Clone)]
pub struct Paginator {
    items_per_page: usize,
    cached: Option<((usize, usize), Page)>,
    computations: usize,
}

impl Paginator {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            items_per_page: items_per_page.max(1),
            cached: None,
            computations: 0,
        }
    }

    pub fn page(&mut self, records: &[Record], page: usize) -> Page {
        let validated = page.clamp(1, total_pages(records.len(), self.items_per_page));
        let key = (validated, records.len());

        if let Some((cached_key, cached)) = &self.cached {
            if *cached_key == key {
                trace!("Page {} served from cache", validated);
                return cached.clone();
            }
        }

        let computed = paginate(records, validated, self.items_per_page);
        self.computations += 1;
        self.cached = Some((key, computed.clone()));
        computed
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// How many times a page was actually sliced
    pub fn computations(&self) -> usize {
        self.computations
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE)
    }
}
