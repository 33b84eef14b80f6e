use dioxus::prelude::*;

use crate::domain::entities::query::structured_expression;
use crate::domain::entities::view::SavedView;
use crate::usecase::services::view_service::ViewService;

const PANEL_STYLE: &str =
    "border: 1px solid #bbb; border-radius: 4px; padding: 8px; background: #fafafa; margin: 4px 0;";

#[derive(Clone, PartialEq)]
pub enum FilterKind {
    Text,
    Date,
    /// (label, value) pairs for a fixed choice list.
    Select(Vec<(&'static str, &'static str)>),
}

/// A structured filter field descriptor supplied by the calling screen.
#[derive(Clone, PartialEq)]
pub struct FilterOption {
    pub field: &'static str,
    pub label: &'static str,
    pub kind: FilterKind,
}

impl FilterOption {
    pub fn text(field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            label,
            kind: FilterKind::Text,
        }
    }

    pub fn date(field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            label,
            kind: FilterKind::Date,
        }
    }

    pub fn select(
        field: &'static str,
        label: &'static str,
        choices: Vec<(&'static str, &'static str)>,
    ) -> Self {
        Self {
            field,
            label,
            kind: FilterKind::Select(choices),
        }
    }
}

fn structured_from(options: &[FilterOption], values: &[(String, String)]) -> String {
    structured_expression(options.iter().filter_map(|option| {
        values
            .iter()
            .find(|(field, _)| field == option.field)
            .map(|(_, value)| (option.field, value.as_str()))
    }))
}

/// Search box, structured filter fields, saved views, refresh and export.
/// The free-text term and the structured expression are emitted on separate
/// callbacks; merging them is the query controller's job upstream.
#[component]
pub fn DataToolbar(
    view_service: ViewService,
    on_search: EventHandler<String>,
    on_filter_change: Option<EventHandler<String>>,
    on_load_view: Option<EventHandler<SavedView>>,
    on_refresh: EventHandler<()>,
    on_export: EventHandler<()>,
    loading: bool,
    placeholder: Option<String>,
    filter_options: Option<Vec<FilterOption>>,
) -> Element {
    let filter_options = filter_options.unwrap_or_default();
    let placeholder = placeholder.unwrap_or_else(|| "Search...".to_string());

    let mut search_term = use_signal(String::new);
    let mut active_filters = use_signal(Vec::<(String, String)>::new);
    let view_loader = view_service.clone();
    let mut saved_views = use_signal(move || view_loader.load());
    let mut show_filters_menu = use_signal(|| false);
    let mut show_views_menu = use_signal(|| false);
    let mut new_view_name = use_signal(String::new);

    let active_count = active_filters.read().len();

    let emit_structured = {
        let filter_options = filter_options.clone();
        move || {
            if let Some(handler) = on_filter_change {
                handler.call(structured_from(&filter_options, &active_filters.read()));
            }
        }
    };

    let filter_fields: Vec<Element> = filter_options
        .iter()
        .cloned()
        .map(|option| {
            let current = active_filters
                .read()
                .iter()
                .find(|(field, _)| field == option.field)
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            let mut on_value = {
                let emit_structured = emit_structured.clone();
                let field = option.field.to_string();
                move |value: String| {
                    let mut filters = active_filters.write();
                    filters.retain(|(existing, _)| *existing != field);
                    if !value.is_empty() {
                        filters.push((field.clone(), value));
                    }
                    drop(filters);
                    emit_structured();
                }
            };
            let editor = match option.kind.clone() {
                FilterKind::Select(choices) => rsx! {
                    select {
                        value: "{current}",
                        onchange: move |event| on_value(event.value()),
                        option { value: "", "All" }
                        for (label, value) in choices {
                            option { value: "{value}", "{label}" }
                        }
                    }
                },
                FilterKind::Date => rsx! {
                    input {
                        r#type: "date",
                        value: "{current}",
                        onchange: move |event| on_value(event.value()),
                    }
                },
                FilterKind::Text => rsx! {
                    input {
                        value: "{current}",
                        onchange: move |event| on_value(event.value()),
                    }
                },
            };
            rsx! {
                div { style: "display: flex; gap: 8px; align-items: center; margin: 4px 0;",
                    label { style: "min-width: 120px;", "{option.label}" }
                    {editor}
                }
            }
        })
        .collect();

    rsx! {
        div { style: "display: flex; gap: 8px; align-items: center; flex-wrap: wrap; margin: 8px 0;",
            input {
                style: "flex: 1; min-width: 200px; padding: 6px;",
                value: search_term(),
                placeholder: "{placeholder}",
                oninput: move |event| {
                    let term = event.value();
                    *search_term.write() = term.clone();
                    on_search.call(term);
                },
            }

            if !filter_options.is_empty() {
                button {
                    onclick: move |_| {
                        let open = show_filters_menu();
                        *show_filters_menu.write() = !open;
                    },
                    if active_count > 0 {
                        "Filters ({active_count})"
                    } else {
                        "Filters"
                    }
                }
            }

            button {
                onclick: move |_| {
                    let open = show_views_menu();
                    *show_views_menu.write() = !open;
                },
                "Views"
            }

            button {
                disabled: loading,
                onclick: move |_| on_refresh.call(()),
                "Refresh"
            }

            button {
                onclick: move |_| on_export.call(()),
                "Export"
            }
        }

        if show_filters_menu() {
            div { style: PANEL_STYLE,
                {filter_fields.into_iter()}
                div { style: "display: flex; gap: 8px; justify-content: flex-end;",
                    button {
                        onclick: {
                            let emit_structured = emit_structured.clone();
                            move |_| {
                                active_filters.write().clear();
                                emit_structured();
                                *show_filters_menu.write() = false;
                            }
                        },
                        "Clear All"
                    }
                    button {
                        onclick: move |_| {
                            *show_filters_menu.write() = false;
                        },
                        "Done"
                    }
                }
            }
        }

        if show_views_menu() {
            div { style: PANEL_STYLE,
                if saved_views.read().is_empty() {
                    p { style: "color: #777; font-style: italic;", "No saved views" }
                } else {
                    for view in saved_views() {
                        div { style: "display: flex; gap: 8px; align-items: center; margin: 2px 0;",
                            button {
                                style: "flex: 1; text-align: left;",
                                onclick: {
                                    let view = view.clone();
                                    move |_| {
                                        // A loaded view replays through the
                                        // structured channel so the stored
                                        // expression round-trips verbatim.
                                        match on_filter_change {
                                            Some(handler) => handler.call(view.filter.clone()),
                                            None => on_search.call(view.filter.clone()),
                                        }
                                        if let Some(handler) = on_load_view {
                                            handler.call(view.clone());
                                        }
                                        active_filters.write().clear();
                                        *show_views_menu.write() = false;
                                    }
                                },
                                "{view.name}"
                            }
                            button {
                                onclick: {
                                    let view_service = view_service.clone();
                                    let id = view.id.clone();
                                    move |_| {
                                        let mut views = saved_views.write();
                                        if let Err(err) = view_service.delete(&mut views, &id) {
                                            tracing::warn!(error = %err, "failed to delete saved view");
                                        }
                                    }
                                },
                                "×"
                            }
                        }
                    }
                }
                div { style: "display: flex; gap: 8px; border-top: 1px solid #ddd; padding-top: 6px; margin-top: 6px;",
                    input {
                        style: "flex: 1;",
                        placeholder: "View name",
                        value: new_view_name(),
                        oninput: move |event| {
                            *new_view_name.write() = event.value();
                        },
                    }
                    button {
                        disabled: new_view_name.read().trim().is_empty(),
                        onclick: {
                            let view_service = view_service.clone();
                            let filter_options = filter_options.clone();
                            move |_| {
                                let name = new_view_name.read().trim().to_string();
                                if name.is_empty() {
                                    return;
                                }
                                // Views snapshot the structured filter, not
                                // the free-text term.
                                let filter =
                                    structured_from(&filter_options, &active_filters.read());
                                let mut views = saved_views.write();
                                if let Err(err) = view_service.save(&mut views, &name, &filter, "")
                                {
                                    tracing::warn!(error = %err, "failed to save view");
                                }
                                drop(views);
                                *new_view_name.write() = String::new();
                            }
                        },
                        "Save"
                    }
                }
            }
        }
    }
}
