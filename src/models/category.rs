pub(crate) const CATEGORY_NAME_MAX_LENGTH: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Category {
    pub(crate) id: Option<i64>,
    pub(crate) name: String,
    pub(crate) usage_count: i64,
}

impl Category {
    pub(crate) fn new(name: String) -> Self {
        Self {
            id: None,
            name,
            usage_count: 0,
        }
    }

    /// Find a category by name (case-insensitive) in a slice.
    pub(crate) fn find_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
        let lower = name.trim().to_lowercase();
        categories.iter().find(|c| c.name.to_lowercase() == lower)
    }

    /// Find a category by ID in a slice.
    pub(crate) fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
        categories.iter().find(|c| c.id == Some(id))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Display ordering for category lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum CategoryOrder {
    #[default]
    Name,
    /// Quick-entry ordering: highest usage first, ties broken by name.
    MostUsed,
}

pub(crate) fn sort_categories(categories: &mut [Category], order: CategoryOrder) {
    match order {
        CategoryOrder::Name => {
            categories.sort_by_cached_key(|c| (c.name.to_lowercase(), c.name.clone()));
        }
        CategoryOrder::MostUsed => categories.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        }),
    }
}

/// Per-category totals shown by the category manager.
#[derive(Debug, Clone)]
pub(crate) struct CategoryStats {
    pub(crate) category: Category,
    pub(crate) expense_count: i64,
    pub(crate) total_spent: rust_decimal::Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatsSort {
    Name,
    Usage,
    TotalSpent,
}

impl StatsSort {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "usage" | "count" => Some(Self::Usage),
            "amount" | "spent" | "total" => Some(Self::TotalSpent),
            _ => None,
        }
    }
}

/// Filter by a case-insensitive name fragment, then sort.
pub(crate) fn arrange_stats(
    mut stats: Vec<CategoryStats>,
    query: &str,
    sort: StatsSort,
    ascending: bool,
) -> Vec<CategoryStats> {
    let query = query.trim().to_lowercase();
    if !query.is_empty() {
        stats.retain(|s| s.category.name.to_lowercase().contains(&query));
    }
    match sort {
        StatsSort::Name => stats.sort_by_cached_key(|s| s.category.name.to_lowercase()),
        StatsSort::Usage => stats.sort_by_key(|s| s.expense_count),
        StatsSort::TotalSpent => stats.sort_by_key(|s| s.total_spent),
    }
    if !ascending {
        stats.reverse();
    }
    stats
}
