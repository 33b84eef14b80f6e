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

const COLLECTION: &str = "students";

fn status_cell(record: &Record) -> Element {
    let status = record.display("status");
    let color = match status.as_str() {
        "Active" => "#27632a",
        "Graduated" => "#1a4d8f",
        _ => "#8a6d1a",
    };
    rsx! {
        span { style: "color: {color}; font-weight: bold;", "{status}" }
    }
}

fn enrolled_cell(record: &Record) -> Element {
    let created = record.display("created");
    let date = created.get(..10).unwrap_or(&created).to_string();
    rsx! { "{date}" }
}

#[component]
pub fn StudentDirectory() -> Element {
    let services = use_context::<AppServices>();
    let query = use_collection_query(
        services.client.clone(),
        COLLECTION,
        Some(SortSpec::desc("created")),
    );
    let view_service = ViewService::new(services.views.clone(), COLLECTION);

    let mut show_form = use_signal(|| false);
    let mut editing_id = use_signal(|| None::<String>);
    let mut form_name = use_signal(String::new);
    let mut form_email = use_signal(String::new);
    let mut form_grade = use_signal(String::new);
    let mut form_guardian = use_signal(String::new);
    let mut form_status = use_signal(|| "Active".to_string());
    let mut status_line = use_signal(String::new);

    let loading = query.controller.read().data().loading;

    let columns = vec![
        Column::field("Name", "name").sortable(),
        Column::field("Email", "email").sortable(),
        Column::field("Grade", "grade").sortable(),
        Column::field("Guardian phone", "guardian_phone"),
        Column::computed("Status", status_cell).sort_by("status"),
        Column::computed("Enrolled", enrolled_cell).sort_by("created"),
    ];

    let filter_options = vec![
        FilterOption::select(
            "status",
            "Status",
            vec![
                ("Active", "Active"),
                ("Inactive", "Inactive"),
                ("Graduated", "Graduated"),
            ],
        ),
        FilterOption::text("grade", "Grade"),
    ];

    let search_query = query.clone();
    let filter_query = query.clone();
    let view_query = query.clone();
    let refresh_query = query.clone();
    let export_handle = query.clone();
    let export_client = services.client.clone();
    let save_query = query.clone();
    let save_client = services.client.clone();
    let delete_query = query.clone();
    let delete_client = services.client.clone();

    rsx! {
        div {
            div { style: "display: flex; justify-content: space-between; align-items: center;",
                h2 { "Student Directory" }
                button {
                    onclick: move |_| {
                        *editing_id.write() = None;
                        *form_name.write() = String::new();
                        *form_email.write() = String::new();
                        *form_grade.write() = String::new();
                        *form_guardian.write() = String::new();
                        *form_status.write() = "Active".to_string();
                        *show_form.write() = true;
                    },
                    "New Student"
                }
            }

            DataToolbar {
                view_service: view_service.clone(),
                on_search: move |term: String| {
                    if term.is_empty() {
                        search_query.set_filter(String::new());
                    } else {
                        search_query.set_filter(format!("name ~ \"{term}\" || email ~ \"{term}\""));
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
                        format!("students-{}.csv", chrono::Local::now().format("%Y-%m-%d"));
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
                                tracing::error!(error = %err, "student export failed");
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
                placeholder: "Search students by name or email...".to_string(),
                filter_options: filter_options,
            }

            if !status_line.read().is_empty() {
                p { style: "color: #555;", "{status_line}" }
            }

            DataTable {
                query: query.clone(),
                columns: columns,
                on_row_click: move |record: Record| {
                    *editing_id.write() = Some(record.id().to_string());
                    *form_name.write() = record.display("name");
                    *form_email.write() = record.display("email");
                    *form_grade.write() = record.display("grade");
                    *form_guardian.write() = record.display("guardian_phone");
                    *form_status.write() = record.display("status");
                    *show_form.write() = true;
                },
                empty_message: "No students found".to_string(),
            }

            if show_form() {
                div { style: "border: 1px solid #bbb; border-radius: 4px; padding: 12px; margin-top: 12px;",
                    h3 {
                        if editing_id().is_some() { "Edit Student" } else { "New Student" }
                    }
                    div { style: "display: grid; grid-template-columns: 140px 1fr; gap: 8px; max-width: 480px;",
                        label { "Name" }
                        input {
                            value: form_name(),
                            oninput: move |event| *form_name.write() = event.value(),
                        }
                        label { "Email" }
                        input {
                            value: form_email(),
                            oninput: move |event| *form_email.write() = event.value(),
                        }
                        label { "Grade" }
                        input {
                            value: form_grade(),
                            oninput: move |event| *form_grade.write() = event.value(),
                        }
                        label { "Guardian phone" }
                        input {
                            value: form_guardian(),
                            oninput: move |event| *form_guardian.write() = event.value(),
                        }
                        label { "Status" }
                        select {
                            value: form_status(),
                            onchange: move |event| *form_status.write() = event.value(),
                            option { value: "Active", "Active" }
                            option { value: "Inactive", "Inactive" }
                            option { value: "Graduated", "Graduated" }
                        }
                    }
                    div { style: "display: flex; gap: 8px; margin-top: 12px;",
                        button {
                            onclick: move |_| {
                                let data = fields_from([
                                    ("name", form_name()),
                                    ("email", form_email()),
                                    ("grade", form_grade()),
                                    ("guardian_phone", form_guardian()),
                                    ("status", form_status()),
                                ]);
                                let client = save_client.clone();
                                let query = save_query.clone();
                                let editing = editing_id();
                                let mut status_line = status_line;
                                let mut show_form = show_form;
                                spawn(async move {
                                    let result = match editing {
                                        Some(id) => client.update(COLLECTION, &id, &data).await,
                                        None => client.create(COLLECTION, &data).await,
                                    };
                                    match result {
                                        Ok(_) => {
                                            *show_form.write() = false;
                                            *status_line.write() = "Saved student".to_string();
                                            query.refresh();
                                        }
                                        Err(err) => {
                                            tracing::error!(error = %err, "failed to save student");
                                            *status_line.write() =
                                                format!("Failed to save student: {err}");
                                        }
                                    }
                                });
                            },
                            "Save"
                        }
                        button {
                            onclick: move |_| *show_form.write() = false,
                            "Cancel"
                        }
                        if let Some(id) = editing_id() {
                            button {
                                style: "color: #900; margin-left: auto;",
                                onclick: move |_| {
                                    let confirmed = MessageDialog::new()
                                        .set_level(MessageLevel::Warning)
                                        .set_title("Delete student")
                                        .set_description("Delete this student record? This cannot be undone.")
                                        .set_buttons(MessageButtons::YesNo)
                                        .show();
                                    if confirmed != MessageDialogResult::Yes {
                                        return;
                                    }
                                    let client = delete_client.clone();
                                    let query = delete_query.clone();
                                    let id = id.clone();
                                    let mut status_line = status_line;
                                    let mut show_form = show_form;
                                    spawn(async move {
                                        match client.delete(COLLECTION, &id).await {
                                            Ok(()) => {
                                                *show_form.write() = false;
                                                *status_line.write() =
                                                    "Deleted student".to_string();
                                                query.refresh();
                                            }
                                            Err(err) => {
                                                tracing::error!(error = %err, "failed to delete student");
                                                *status_line.write() =
                                                    format!("Failed to delete student: {err}");
                                            }
                                        }
                                    });
                                },
                                "Delete"
                            }
                        }
                    }
                }
            }
        }
    }
}
