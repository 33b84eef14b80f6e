use dioxus::prelude::*;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::app::AppServices;
use crate::domain::entities::query::SortSpec;
use crate::domain::entities::record::{fields_from, Record};
use crate::domain::entities::view::SavedView;
use crate::ui::components::data_table::{Column, DataTable};
use crate::ui::components::toolbar::{DataToolbar, FilterOption};
use crate::ui::hooks::use_collection_query::use_collection_query;
use crate::usecase::services::export_service::export_collection;
use crate::usecase::services::view_service::ViewService;

const COLLECTION: &str = "invoices";

fn status_cell(record: &Record) -> Element {
    let status = record.display("status");
    let color = match status.as_str() {
        "Paid" => "#27632a",
        "Overdue" => "#a03030",
        _ => "#8a6d1a",
    };
    rsx! {
        span { style: "color: {color}; font-weight: bold;", "{status}" }
    }
}

fn amount_cell(record: &Record) -> Element {
    let amount = record.display("amount");
    rsx! {
        span { style: "font-variant-numeric: tabular-nums;", "$ {amount}" }
    }
}

fn issued_cell(record: &Record) -> Element {
    let created = record.display("created");
    let date = created.get(..10).unwrap_or(&created).to_string();
    rsx! { "{date}" }
}

/// Fee invoices for the finance module. Row click settles a pending
/// invoice; everything else is the shared toolbar/table/export layer.
#[component]
pub fn InvoiceList() -> Element {
    let services = use_context::<AppServices>();
    let query = use_collection_query(
        services.client.clone(),
        COLLECTION,
        Some(SortSpec::desc("created")),
    );
    let view_service = ViewService::new(services.views.clone(), COLLECTION);

    let mut status_line = use_signal(String::new);
    let loading = query.controller.read().data().loading;

    let columns = vec![
        Column::field("Invoice #", "number").sortable(),
        Column::field("Student", "student_name").sortable(),
        Column::computed("Amount", amount_cell).sort_by("amount"),
        Column::computed("Status", status_cell).sort_by("status"),
        Column::field("Due date", "due_date").sortable(),
        Column::computed("Issued", issued_cell).sort_by("created"),
    ];

    let filter_options = vec![
        FilterOption::select(
            "status",
            "Status",
            vec![
                ("Paid", "Paid"),
                ("Pending", "Pending"),
                ("Overdue", "Overdue"),
            ],
        ),
        FilterOption::date("due_date", "Due date"),
    ];

    let search_query = query.clone();
    let filter_query = query.clone();
    let view_query = query.clone();
    let refresh_query = query.clone();
    let export_handle = query.clone();
    let export_client = services.client.clone();
    let settle_query = query.clone();
    let settle_client = services.client.clone();

    rsx! {
        div {
            h2 { "Invoices" }

            DataToolbar {
                view_service: view_service.clone(),
                on_search: move |term: String| {
                    if term.is_empty() {
                        search_query.set_filter(String::new());
                    } else {
                        search_query
                            .set_filter(format!("number ~ \"{term}\" || student_name ~ \"{term}\""));
                    }
                },
                on_filter_change: move |expression: String| {
                    filter_query.set_structured_filter(expression);
                },
                on_load_view: move |view: SavedView| {
                    if let Some(sort) = SortSpec::parse(&view.sort) {
                        view_query.set_sort(Some(sort));
                    }
                },
                on_refresh: move |_| refresh_query.refresh(),
                on_export: move |_| {
                    let default_name =
                        format!("invoices-{}.csv", chrono::Local::now().format("%Y-%m-%d"));
                    let Some(path) = FileDialog::new().set_file_name(default_name).save_file()
                    else {
                        return;
                    };
                    let list_query = export_handle.export_query();
                    let client = export_client.clone();
                    let mut status_line = status_line;
                    spawn(async move {
                        match export_collection(client, COLLECTION, &list_query, &path).await {
                            Ok(rows) => {
                                *status_line.write() =
                                    format!("Exported {rows} rows to {}", path.display());
                            }
                            Err(err) => {
                                tracing::error!(error = %err, "invoice export failed");
                                MessageDialog::new()
                                    .set_level(MessageLevel::Error)
                                    .set_title("Export failed")
                                    .set_description(err.to_string())
                                    .show();
                            }
                        }
                    });
                },
                loading: loading,
                placeholder: "Search by invoice number or student...".to_string(),
                filter_options: filter_options,
            }

            if !status_line.read().is_empty() {
                p { style: "color: #555;", "{status_line}" }
            }

            DataTable {
                query: query.clone(),
                columns: columns,
                on_row_click: move |record: Record| {
                    if record.display("status") == "Paid" {
                        return;
                    }
                    let confirmed = MessageDialog::new()
                        .set_level(MessageLevel::Info)
                        .set_title("Mark as paid")
                        .set_description(format!(
                            "Mark invoice {} as paid?",
                            record.display("number")
                        ))
                        .set_buttons(MessageButtons::YesNo)
                        .show();
                    if confirmed != MessageDialogResult::Yes {
                        return;
                    }
                    let client = settle_client.clone();
                    let query = settle_query.clone();
                    let id = record.id().to_string();
                    let mut status_line = status_line;
                    spawn(async move {
                        let data = fields_from([("status", "Paid")]);
                        match client.update(COLLECTION, &id, &data).await {
                            Ok(_) => {
                                *status_line.write() = "Invoice marked as paid".to_string();
                                query.refresh();
                            }
                            Err(err) => {
                                tracing::error!(error = %err, "failed to update invoice");
                                *status_line.write() =
                                    format!("Failed to update invoice: {err}");
                            }
                        }
                    });
                },
                empty_message: "No invoices found".to_string(),
            }
        }
    }
}
