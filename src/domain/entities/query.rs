#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// The single active sort for a query. The wire form follows the backend's
/// convention: `field` ascending, `-field` descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    pub fn to_param(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.field.clone(),
            SortDirection::Desc => format!("-{}", self.field),
        }
    }

    pub fn parse(param: &str) -> Option<Self> {
        let param = param.trim();
        if param.is_empty() {
            return None;
        }
        Some(match param.strip_prefix('-') {
            Some(field) => SortSpec::desc(field),
            None => SortSpec::asc(param),
        })
    }
}

/// Column-header toggle: unsorted -> ascending -> descending -> ascending.
/// The cycle never clears; only one field sorts at a time.
pub fn toggle_sort(current: Option<&SortSpec>, field: &str) -> SortSpec {
    match current {
        Some(spec) if spec.field == field && spec.direction == SortDirection::Asc => {
            SortSpec::desc(field)
        }
        _ => SortSpec::asc(field),
    }
}

/// Join non-empty structured filter fields into `field = "value"` clauses
/// combined with `&&`, in the order the fields were supplied.
pub fn structured_expression<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(field, value)| format!("{field} = \"{value}\""))
        .collect::<Vec<_>>()
        .join(" && ")
}

/// Combine the free-text search expression with the structured filter
/// expression. Either side alone passes through verbatim; when both are
/// present they are parenthesized and AND-combined.
pub fn effective_filter(search: &str, structured: &str) -> String {
    match (search.is_empty(), structured.is_empty()) {
        (true, true) => String::new(),
        (false, true) => search.to_string(),
        (true, false) => structured.to_string(),
        (false, false) => format!("({search}) && ({structured})"),
    }
}

/// A handle for one debounced free-text edit. Only the ticket from the most
/// recent edit commits; earlier tickets become no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket {
    pub(crate) epoch: u64,
}

/// Free-text search and structured filters are tracked on two channels, as
/// the toolbar emits them, and merged only when the query is issued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    /// Raw search input, stored immediately so a controlled input can echo it.
    pub search_input: String,
    /// The search expression the fetch path actually uses, updated only once
    /// the debounce window elapses.
    committed_search: String,
    /// Structured filter expression, applied without debounce.
    structured: String,
    epoch: u64,
}

impl FilterState {
    pub fn edit_search(&mut self, raw: impl Into<String>) -> DebounceTicket {
        self.search_input = raw.into();
        self.epoch += 1;
        DebounceTicket { epoch: self.epoch }
    }

    /// Returns true when the ticket is still current and the edit committed.
    pub fn commit_search(&mut self, ticket: DebounceTicket) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        self.committed_search = self.search_input.clone();
        true
    }

    pub fn set_structured(&mut self, expression: impl Into<String>) {
        self.structured = expression.into();
    }

    pub fn effective(&self) -> String {
        effective_filter(&self.committed_search, &self.structured)
    }
}

/// Pagination, sort, and filter state for one remote collection.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub page: u32,
    pub per_page: u32,
    pub sort: Option<SortSpec>,
    pub filter: FilterState,
}

impl QueryState {
    pub fn new(per_page: u32, sort: Option<SortSpec>) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
            sort,
            filter: FilterState::default(),
        }
    }

    pub fn sort_param(&self) -> String {
        self.sort
            .as_ref()
            .map(SortSpec::to_param)
            .unwrap_or_default()
    }
}
