use dioxus::prelude::*;

use crate::domain::entities::query::SortDirection;
use crate::domain::entities::record::Record;
use crate::ui::hooks::use_collection_query::UseCollectionQuery;
use crate::usecase::services::query_controller::PageData;

const SKELETON_ROWS: usize = 5;

const TABLE_STYLE: &str = "border-collapse: collapse; width: 100%; border: 1px solid #bbb;";
const CELL_STYLE: &str = "border: 1px solid #bbb; padding: 6px;";
const ERROR_BOX_STYLE: &str =
    "border: 1px solid #d66; background: #fee; color: #900; padding: 12px; border-radius: 4px;";
const SKELETON_CELL_STYLE: &str = "background: #eee; border-radius: 3px; height: 14px; width: 75%;";

fn header_cell_style(sortable: bool) -> String {
    let cursor = if sortable { "pointer" } else { "default" };
    format!("border: 1px solid #bbb; padding: 6px; background: #f2f2f2; text-align: left; cursor: {cursor};")
}

/// How a cell gets its value: straight from a named field, or computed from
/// the whole record. Resolved explicitly at render time.
#[derive(Clone, PartialEq)]
pub enum Accessor {
    Field(&'static str),
    Compute(fn(&Record) -> Element),
}

#[derive(Clone, PartialEq)]
pub struct Column {
    pub header: &'static str,
    pub accessor: Accessor,
    pub sortable: bool,
    /// Required for sorting when the accessor is computed.
    pub sort_key: Option<&'static str>,
}

impl Column {
    pub fn field(header: &'static str, field: &'static str) -> Self {
        Self {
            header,
            accessor: Accessor::Field(field),
            sortable: false,
            sort_key: None,
        }
    }

    pub fn computed(header: &'static str, compute: fn(&Record) -> Element) -> Self {
        Self {
            header,
            accessor: Accessor::Compute(compute),
            sortable: false,
            sort_key: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn sort_by(mut self, key: &'static str) -> Self {
        self.sort_key = Some(key);
        self.sortable = true;
        self
    }

    pub fn effective_sort_key(&self) -> Option<&'static str> {
        self.sort_key.or(match self.accessor {
            Accessor::Field(field) => Some(field),
            Accessor::Compute(_) => None,
        })
    }
}

/// The mutually exclusive rendering states, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableState {
    Loading,
    Error(String),
    Empty,
    Rows,
}

pub fn table_state(data: &PageData) -> TableState {
    if data.loading {
        TableState::Loading
    } else if let Some(message) = &data.error {
        TableState::Error(message.clone())
    } else if data.items.is_empty() {
        TableState::Empty
    } else {
        TableState::Rows
    }
}

/// Page-number buttons: at most 5, centered on the current page and clamped
/// at both ends.
pub fn page_window(page: u32, total_pages: u32) -> Vec<u32> {
    if total_pages <= 5 {
        return (1..=total_pages).collect();
    }
    let start = if page <= 3 {
        1
    } else if page >= total_pages - 2 {
        total_pages - 4
    } else {
        page - 2
    };
    (start..start + 5).collect()
}

#[component]
pub fn DataTable(
    query: UseCollectionQuery,
    columns: Vec<Column>,
    on_row_click: Option<EventHandler<Record>>,
    empty_message: Option<String>,
) -> Element {
    let controller = query.controller;
    let data = controller.read().data().clone();
    let state = controller.read().state().clone();

    let empty_message = empty_message.unwrap_or_else(|| "No data found".to_string());
    let col_count = columns.len().max(1);
    let table_state = table_state(&data);

    if let TableState::Error(message) = &table_state {
        return rsx! {
            div { style: ERROR_BOX_STYLE, "Error loading data: {message}" }
        };
    }

    let sort = state.sort.clone();
    let headers: Vec<(Column, &'static str)> = columns
        .iter()
        .map(|col| {
            let indicator = match (&sort, col.effective_sort_key()) {
                (Some(active), Some(key)) if active.field == key => match active.direction {
                    SortDirection::Asc => " ▲",
                    SortDirection::Desc => " ▼",
                },
                _ => "",
            };
            (col.clone(), indicator)
        })
        .collect();

    let page = state.page;
    let per_page = state.per_page;
    let total_items = data.total_items;
    let total_pages = data.total_pages;
    let showing_from = if total_items == 0 {
        0
    } else {
        u64::from(page - 1) * u64::from(per_page) + 1
    };
    let showing_to = (u64::from(page) * u64::from(per_page)).min(total_items);

    rsx! {
        div {
            table { style: TABLE_STYLE,
                thead {
                    tr {
                        for (col, indicator) in headers {
                            th {
                                style: header_cell_style(col.sortable),
                                onclick: {
                                    let query = query.clone();
                                    let col = col.clone();
                                    move |_| {
                                        if !col.sortable {
                                            return;
                                        }
                                        if let Some(key) = col.effective_sort_key() {
                                            query.toggle_sort(key);
                                        }
                                    }
                                },
                                "{col.header}{indicator}"
                            }
                        }
                    }
                }
                tbody {
                    {match table_state {
                        TableState::Loading => rsx! {
                            for row in 0..SKELETON_ROWS {
                                tr { key: "skeleton-{row}",
                                    for _ in 0..col_count {
                                        td { style: CELL_STYLE,
                                            div { style: SKELETON_CELL_STYLE }
                                        }
                                    }
                                }
                            }
                        },
                        TableState::Empty => rsx! {
                            tr {
                                td {
                                    style: "{CELL_STYLE} text-align: center; color: #777;",
                                    colspan: col_count,
                                    "{empty_message}"
                                }
                            }
                        },
                        _ => rsx! {
                            for item in data.items.clone() {
                                tr {
                                    key: "{item.id()}",
                                    style: if on_row_click.is_some() { "cursor: pointer;" } else { "" },
                                    onclick: {
                                        let item = item.clone();
                                        move |_| {
                                            if let Some(handler) = on_row_click {
                                                handler.call(item.clone());
                                            }
                                        }
                                    },
                                    for col in columns.clone() {
                                        td { style: CELL_STYLE,
                                            {match col.accessor {
                                                Accessor::Field(field) => rsx! { "{item.display(field)}" },
                                                Accessor::Compute(compute) => compute(&item),
                                            }}
                                        }
                                    }
                                }
                            }
                        },
                    }}
                }
            }

            if !data.loading && total_pages > 1 {
                div { style: "display: flex; gap: 8px; align-items: center; margin-top: 8px;",
                    span { style: "color: #555;",
                        "Showing {showing_from} to {showing_to} of {total_items} results"
                    }
                    button {
                        disabled: page <= 1,
                        onclick: {
                            let query = query.clone();
                            move |_| query.set_page(page.saturating_sub(1).max(1))
                        },
                        "Prev"
                    }
                    for p in page_window(page, total_pages) {
                        button {
                            style: if p == page { "font-weight: bold;" } else { "" },
                            onclick: {
                                let query = query.clone();
                                move |_| query.set_page(p)
                            },
                            "{p}"
                        }
                    }
                    button {
                        disabled: page >= total_pages,
                        onclick: {
                            let query = query.clone();
                            move |_| query.set_page(page + 1)
                        },
                        "Next"
                    }
                    select {
                        value: "{per_page}",
                        onchange: {
                            let query = query.clone();
                            move |event: Event<FormData>| {
                                if let Ok(per_page) = event.value().parse::<u32>() {
                                    query.set_per_page(per_page);
                                }
                            }
                        },
                        option { value: "10", "10 / page" }
                        option { value: "20", "20 / page" }
                        option { value: "50", "50 / page" }
                    }
                }
            }
        }
    }
}
