use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::json;

use crate::domain::entities::page::RecordPage;
use crate::domain::entities::query::{
    effective_filter, structured_expression, SortDirection, SortSpec,
};
use crate::domain::entities::record::{fields_from, Record};
use crate::domain::entities::view::SavedView;
use crate::infra::export::csv::csv_bytes;
use crate::infra::http::pocketbase::list_params;
use crate::infra::store::sqlite::SqliteViewStore;
use crate::ui::components::data_table::{page_window, table_state, TableState};
use crate::usecase::ports::collection::{ClientError, CollectionClient, ListQuery};
use crate::usecase::ports::view_store::ViewStore;
use crate::usecase::services::export_service::{export_collection, ExportError};
use crate::usecase::services::query_controller::{FetchApplied, PageData, QueryController};
use crate::usecase::services::view_service::ViewService;

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("classdesk-{prefix}-{nanos}"))
}

fn student_record(index: usize) -> Record {
    let status = if index % 2 == 0 { "Active" } else { "Inactive" };
    Record::new(fields_from([
        ("id", json!(format!("s{index:03}"))),
        ("name", json!(format!("Student {index}"))),
        ("email", json!(format!("student{index}@school.test"))),
        ("status", json!(status)),
    ]))
}

/// In-memory collection backend with a naive evaluator for the
/// `field = "value"` / `field ~ "sub"` / `&&` / `||` grammar subset the
/// real backend dictates.
struct MemoryClient {
    records: Mutex<Vec<Record>>,
    list_calls: AtomicU64,
    last_query: Mutex<Option<ListQuery>>,
    fail: AtomicBool,
}

impl MemoryClient {
    fn new(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            list_calls: AtomicU64::new(0),
            last_query: Mutex::new(None),
            fail: AtomicBool::new(false),
        }
    }

    fn with_students(count: usize) -> Self {
        Self::new((0..count).map(student_record).collect())
    }

    fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn last_query(&self) -> ListQuery {
        self.last_query
            .lock()
            .expect("last query lock should not be poisoned")
            .clone()
            .expect("a query should have been issued")
    }

    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

fn unquote(text: &str) -> &str {
    text.trim().trim_matches('"')
}

fn clause_matches(record: &Record, clause: &str) -> bool {
    if let Some((field, value)) = clause.split_once(" = ") {
        record.display(field.trim()) == unquote(value)
    } else if let Some((field, value)) = clause.split_once(" ~ ") {
        record.display(field.trim()).contains(unquote(value))
    } else {
        false
    }
}

fn record_matches(record: &Record, filter: &str) -> bool {
    if filter.trim().is_empty() {
        return true;
    }
    filter.split(" && ").all(|part| {
        let part = part.trim().trim_start_matches('(').trim_end_matches(')');
        part.split(" || ")
            .any(|clause| clause_matches(record, clause.trim()))
    })
}

#[async_trait]
impl CollectionClient for MemoryClient {
    async fn list(&self, _collection: &str, query: &ListQuery) -> Result<RecordPage, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_query
            .lock()
            .expect("last query lock should not be poisoned") = Some(query.clone());

        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("connection refused".to_string()));
        }

        let records = self
            .records
            .lock()
            .expect("records lock should not be poisoned");
        let matching: Vec<Record> = records
            .iter()
            .filter(|record| record_matches(record, &query.filter))
            .cloned()
            .collect();

        let per_page = query.per_page.max(1);
        let total_items = matching.len() as u64;
        let total_pages = total_items.div_ceil(u64::from(per_page)) as u32;
        let start = (query.page.max(1) - 1) as usize * per_page as usize;
        let items: Vec<Record> = matching
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Ok(RecordPage {
            items,
            total_items,
            total_pages,
        })
    }

    async fn get_full_list(
        &self,
        _collection: &str,
        query: &ListQuery,
    ) -> Result<Vec<Record>, ClientError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("connection refused".to_string()));
        }
        let records = self
            .records
            .lock()
            .expect("records lock should not be poisoned");
        Ok(records
            .iter()
            .filter(|record| record_matches(record, &query.filter))
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        _collection: &str,
        data: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Record, ClientError> {
        let mut records = self
            .records
            .lock()
            .expect("records lock should not be poisoned");
        let mut fields = data.clone();
        fields.insert("id".to_string(), json!(format!("mem{}", records.len())));
        let record = Record::new(fields);
        records.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        _collection: &str,
        id: &str,
        data: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Record, ClientError> {
        let mut records = self
            .records
            .lock()
            .expect("records lock should not be poisoned");
        let record = records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| ClientError::Http {
                status: 404,
                body: "not found".to_string(),
            })?;
        for (key, value) in data {
            record.fields.insert(key.clone(), value.clone());
        }
        Ok(record.clone())
    }

    async fn delete(&self, _collection: &str, id: &str) -> Result<(), ClientError> {
        let mut records = self
            .records
            .lock()
            .expect("records lock should not be poisoned");
        records.retain(|record| record.id() != id);
        Ok(())
    }
}

/// Drive the controller the way the UI hook does: fetch, apply under the
/// fence, and follow up once when the page was clamped.
async fn settle(controller: &mut QueryController, client: &MemoryClient) {
    loop {
        let ticket = controller.begin_fetch();
        let outcome = client.list(controller.collection(), &ticket.query).await;
        match controller.apply_fetch(&ticket, outcome) {
            FetchApplied::Applied {
                needs_refetch: true,
            } => continue,
            _ => break,
        }
    }
}

async fn settle_shared(controller: &Arc<Mutex<QueryController>>, client: &Arc<MemoryClient>) {
    loop {
        let ticket = controller
            .lock()
            .expect("controller lock should not be poisoned")
            .begin_fetch();
        let outcome = client.list("students", &ticket.query).await;
        let applied = controller
            .lock()
            .expect("controller lock should not be poisoned")
            .apply_fetch(&ticket, outcome);
        match applied {
            FetchApplied::Applied {
                needs_refetch: true,
            } => continue,
            _ => break,
        }
    }
}

#[test]
fn sort_toggle_cycles_without_clearing() {
    let mut controller = QueryController::new("students", None);

    controller.toggle_sort("name");
    assert_eq!(controller.state().sort, Some(SortSpec::asc("name")));

    controller.toggle_sort("name");
    assert_eq!(controller.state().sort, Some(SortSpec::desc("name")));

    controller.toggle_sort("name");
    assert_eq!(
        controller.state().sort,
        Some(SortSpec::asc("name")),
        "descending should cycle back to ascending, not clear"
    );

    controller.toggle_sort("email");
    assert_eq!(
        controller.state().sort,
        Some(SortSpec::asc("email")),
        "a different column should start ascending"
    );
}

#[test]
fn set_sort_feeds_wire_param_into_queries() {
    let mut controller = QueryController::new("students", Some(SortSpec::desc("created")));
    assert_eq!(controller.list_query().sort, "-created");

    controller.set_sort(SortSpec::parse("name"));
    assert_eq!(controller.list_query().sort, "name");
    assert_eq!(controller.export_query().sort, "name");
    assert_eq!(
        controller.export_query().page,
        0,
        "export ignores page bounds"
    );

    controller.set_sort(None);
    assert_eq!(controller.list_query().sort, "");
}

#[test]
fn sort_spec_round_trips_wire_form() {
    assert_eq!(SortSpec::asc("name").to_param(), "name");
    assert_eq!(SortSpec::desc("created").to_param(), "-created");
    assert_eq!(SortSpec::parse("-created"), Some(SortSpec::desc("created")));
    assert_eq!(SortSpec::parse("name"), Some(SortSpec::asc("name")));
    assert_eq!(SortSpec::parse("  "), None);
}

#[tokio::test]
async fn set_page_clamps_against_known_page_count() {
    let client = MemoryClient::with_students(45);
    let mut controller = QueryController::new("students", None);
    settle(&mut controller, &client).await;

    assert_eq!(controller.data().total_pages, 3);
    assert_eq!(controller.data().total_items, 45);

    controller.set_page(4);
    assert_eq!(controller.state().page, 3, "page 4 should clamp to page 3");

    settle(&mut controller, &client).await;
    assert_eq!(
        client.last_query().page,
        3,
        "no out-of-range page should reach the backend"
    );

    controller.set_page(0);
    assert_eq!(controller.state().page, 1);
}

#[tokio::test]
async fn per_page_change_resets_to_first_page() {
    let client = MemoryClient::with_students(45);
    let mut controller = QueryController::new("students", None);
    settle(&mut controller, &client).await;

    controller.set_page(2);
    settle(&mut controller, &client).await;
    assert_eq!(controller.state().page, 2);

    controller.set_per_page(10);
    assert_eq!(controller.state().page, 1);
    assert_eq!(controller.state().per_page, 10);

    settle(&mut controller, &client).await;
    assert_eq!(controller.data().total_pages, 5);
}

#[tokio::test]
async fn shrinking_result_set_clamps_and_refetches() {
    let client = MemoryClient::with_students(45);
    let mut controller = QueryController::new("students", None);
    settle(&mut controller, &client).await;

    controller.set_page(3);
    settle(&mut controller, &client).await;
    assert_eq!(controller.state().page, 3);

    controller.set_structured_filter("status = \"Active\"".to_string());
    assert_eq!(controller.state().page, 1);

    controller.set_page(2);
    settle(&mut controller, &client).await;
    assert_eq!(controller.data().total_items, 23);
    assert_eq!(controller.data().total_pages, 2);
    assert_eq!(controller.state().page, 2);
}

#[test]
fn stale_debounce_ticket_does_not_commit() {
    let mut controller = QueryController::new("students", None);

    let first = controller.set_filter("a");
    let second = controller.set_filter("ab");

    assert!(
        !controller.commit_filter(first),
        "a superseded ticket should be a no-op"
    );
    assert_eq!(controller.effective_filter(), "");

    assert!(controller.commit_filter(second));
    assert_eq!(controller.effective_filter(), "ab");
    assert_eq!(controller.state().page, 1);
}

#[tokio::test]
async fn rapid_filter_edits_fire_exactly_one_fetch() {
    let client = Arc::new(MemoryClient::with_students(5));
    let controller = Arc::new(Mutex::new(QueryController::new("students", None)));
    settle_shared(&controller, &client).await;
    let baseline = client.list_calls();

    let mut tasks = Vec::new();
    for term in ["a", "ab", "abc"] {
        let ticket = controller
            .lock()
            .expect("controller lock should not be poisoned")
            .set_filter(format!("name ~ \"{term}\""));
        let controller = controller.clone();
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            // Stand-in for the debounce window; all three sleeps overlap.
            tokio::time::sleep(Duration::from_millis(50)).await;
            let committed = controller
                .lock()
                .expect("controller lock should not be poisoned")
                .commit_filter(ticket);
            if committed {
                settle_shared(&controller, &client).await;
            }
        }));
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    for task in tasks {
        task.await.expect("debounce task should not panic");
    }

    assert_eq!(
        client.list_calls(),
        baseline + 1,
        "only the newest edit should reach the backend"
    );
    assert_eq!(client.last_query().filter, "name ~ \"abc\"");
}

#[tokio::test]
async fn stale_fetch_outcome_is_discarded() {
    let client = MemoryClient::with_students(3);
    let mut controller = QueryController::new("students", None);

    let stale = controller.begin_fetch();
    let fresh = controller.begin_fetch();

    let stale_outcome = client.list("students", &stale.query).await;
    assert_eq!(
        controller.apply_fetch(&stale, stale_outcome),
        FetchApplied::Stale
    );
    assert!(
        controller.data().loading,
        "a discarded outcome should leave the newer fetch in flight"
    );
    assert!(controller.data().items.is_empty());

    let fresh_outcome = client.list("students", &fresh.query).await;
    assert_eq!(
        controller.apply_fetch(&fresh, fresh_outcome),
        FetchApplied::Applied {
            needs_refetch: false
        }
    );
    assert_eq!(controller.data().items.len(), 3);
    assert!(!controller.data().loading);
}

#[tokio::test]
async fn fetch_error_clears_items_and_reports_message() {
    let client = MemoryClient::with_students(3);
    let mut controller = QueryController::new("students", None);
    settle(&mut controller, &client).await;
    assert_eq!(controller.data().items.len(), 3);

    client.set_failing(true);
    settle(&mut controller, &client).await;

    assert!(
        controller.data().items.is_empty(),
        "stale rows must not survive a failed fetch"
    );
    assert_eq!(controller.data().total_items, 0);
    let message = controller
        .data()
        .error
        .clone()
        .expect("the error should be surfaced on the result");
    assert!(message.contains("connection refused"), "got: {message}");
}

#[test]
fn effective_filter_merges_search_and_structured_channels() {
    assert_eq!(effective_filter("", ""), "");
    assert_eq!(effective_filter("name ~ \"ada\"", ""), "name ~ \"ada\"");
    assert_eq!(
        effective_filter("", "status = \"Active\""),
        "status = \"Active\""
    );
    assert_eq!(
        effective_filter("name ~ \"ada\" || email ~ \"ada\"", "status = \"Active\""),
        "(name ~ \"ada\" || email ~ \"ada\") && (status = \"Active\")"
    );
}

#[test]
fn structured_expression_joins_non_empty_clauses() {
    assert_eq!(structured_expression(Vec::<(&str, &str)>::new()), "");
    assert_eq!(
        structured_expression([("status", "Active"), ("grade", "")]),
        "status = \"Active\""
    );
    assert_eq!(
        structured_expression([("status", "Active"), ("grade", "5")]),
        "status = \"Active\" && grade = \"5\""
    );
}

#[test]
fn csv_export_writes_header_plus_row_per_record() {
    let records: Vec<Record> = (0..3).map(student_record).collect();

    let bytes = csv_bytes(&records).expect("csv serialization should succeed");
    let text = String::from_utf8(bytes).expect("csv should be valid utf-8");
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4, "header plus one line per record");
    assert_eq!(
        lines[0], "id,name,email,status",
        "column order should follow the first record's key order"
    );
    assert_eq!(lines[1], "s000,Student 0,student0@school.test,Active");
}

#[test]
fn csv_escapes_commas_quotes_and_newlines() {
    let record = Record::new(fields_from([
        ("id", json!("r1")),
        ("name", json!("Last, First")),
        ("note", json!("said \"hello\"\nthen left")),
    ]));

    let bytes = csv_bytes(&[record]).expect("csv serialization should succeed");
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let row = reader
        .records()
        .next()
        .expect("one data row should exist")
        .expect("row should parse back");

    assert_eq!(row.get(1), Some("Last, First"));
    assert_eq!(row.get(2), Some("said \"hello\"\nthen left"));
}

#[test]
fn csv_inlines_nested_values_as_json() {
    let record = Record::new(fields_from([
        ("id", json!("r1")),
        ("guardian", json!({"name": "Ada", "phone": "555-0100"})),
        ("tags", json!(["stem", "scholarship"])),
    ]));

    let bytes = csv_bytes(&[record]).expect("csv serialization should succeed");
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let row = reader
        .records()
        .next()
        .expect("one data row should exist")
        .expect("row should parse back");

    assert_eq!(
        row.get(1),
        Some("{\"name\":\"Ada\",\"phone\":\"555-0100\"}")
    );
    assert_eq!(row.get(2), Some("[\"stem\",\"scholarship\"]"));
}

#[tokio::test]
async fn empty_export_produces_no_file() {
    let temp_dir = unique_test_dir("empty-export");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let path = temp_dir.join("students.csv");

    let client: Arc<dyn CollectionClient> = Arc::new(MemoryClient::new(Vec::new()));
    let result = export_collection(client, "students", &ListQuery::default(), &path).await;

    assert!(
        matches!(result, Err(ExportError::Empty)),
        "an empty result set should refuse to export"
    );
    assert!(!path.exists(), "no file should be written");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[tokio::test]
async fn export_writes_matching_records() {
    let temp_dir = unique_test_dir("export");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let path = temp_dir.join("students.csv");

    let client: Arc<dyn CollectionClient> = Arc::new(MemoryClient::with_students(4));
    let query = ListQuery {
        filter: "status = \"Active\"".to_string(),
        ..ListQuery::default()
    };
    let rows = export_collection(client, "students", &query, &path)
        .await
        .expect("export should succeed");

    assert_eq!(rows, 2);
    let text = fs::read_to_string(&path).expect("exported file should be readable");
    assert_eq!(text.lines().count(), 3, "header plus two rows");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn saved_views_round_trip_per_collection() {
    let temp_dir = unique_test_dir("views");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let store = SqliteViewStore::new(temp_dir.join("views.sqlite"));

    let view = SavedView::new("Active only", "status = \"Active\"", "");
    store
        .save("students", &[view.clone()])
        .expect("should store views");

    let loaded = store.load("students").expect("should load views");
    assert_eq!(loaded.len(), 1);
    assert_eq!(
        loaded[0].filter, "status = \"Active\"",
        "the filter expression should round-trip verbatim"
    );
    assert_eq!(loaded[0].name, "Active only");

    let other = store.load("invoices").expect("should load other collection");
    assert!(other.is_empty(), "collections should be namespaced");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn view_service_save_and_delete_persist() {
    let temp_dir = unique_test_dir("view-service");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let store: Arc<dyn ViewStore> = Arc::new(SqliteViewStore::new(temp_dir.join("views.sqlite")));
    let service = ViewService::new(store, "students");

    let mut views = service.load();
    assert!(views.is_empty());

    service
        .save(&mut views, "Active only", "status = \"Active\"", "")
        .expect("should save view");
    let id = views[0].id.clone();

    let reloaded = service.load();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].filter, "status = \"Active\"");

    let mut views = reloaded;
    service.delete(&mut views, &id).expect("should delete view");
    assert!(service.load().is_empty(), "deletion should persist");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn page_window_centers_and_clamps() {
    assert_eq!(page_window(1, 1), vec![1]);
    assert_eq!(page_window(2, 3), vec![1, 2, 3]);
    assert_eq!(page_window(1, 10), vec![1, 2, 3, 4, 5]);
    assert_eq!(page_window(3, 10), vec![1, 2, 3, 4, 5]);
    assert_eq!(page_window(5, 10), vec![3, 4, 5, 6, 7]);
    assert_eq!(page_window(8, 10), vec![6, 7, 8, 9, 10]);
    assert_eq!(page_window(10, 10), vec![6, 7, 8, 9, 10]);
}

#[test]
fn table_states_are_mutually_exclusive_in_precedence_order() {
    let mut data = PageData {
        loading: true,
        error: Some("boom".to_string()),
        ..PageData::default()
    };
    assert_eq!(table_state(&data), TableState::Loading);

    data.loading = false;
    assert_eq!(table_state(&data), TableState::Error("boom".to_string()));

    data.error = None;
    assert_eq!(
        table_state(&data),
        TableState::Empty,
        "zero items without an error should render the empty state"
    );

    data.items = vec![student_record(0)];
    assert_eq!(table_state(&data), TableState::Rows);
}

#[test]
fn list_params_skip_unset_options() {
    let query = ListQuery {
        page: 2,
        per_page: 20,
        sort: "-created".to_string(),
        filter: "status = \"Active\"".to_string(),
        ..ListQuery::default()
    };
    let params = list_params(&query);
    assert_eq!(
        params,
        vec![
            ("page", "2".to_string()),
            ("perPage", "20".to_string()),
            ("sort", "-created".to_string()),
            ("filter", "status = \"Active\"".to_string()),
        ]
    );

    let unpaginated = ListQuery::default();
    assert!(list_params(&unpaginated).is_empty());
}

#[test]
fn record_display_renders_scalars_and_inline_json() {
    let record = Record::new(fields_from([
        ("id", json!("r1")),
        ("name", json!("Ada")),
        ("age", json!(12)),
        ("enrolled", json!(true)),
        ("note", json!(null)),
        ("guardian", json!({"name": "Grace"})),
    ]));

    assert_eq!(record.id(), "r1");
    assert_eq!(record.display("name"), "Ada");
    assert_eq!(record.display("age"), "12");
    assert_eq!(record.display("enrolled"), "true");
    assert_eq!(record.display("note"), "");
    assert_eq!(record.display("missing"), "");
    assert_eq!(record.display("guardian"), "{\"name\":\"Grace\"}");
}

#[test]
fn sort_direction_toggle_helper_cycles() {
    use crate::domain::entities::query::toggle_sort;

    let first = toggle_sort(None, "name");
    assert_eq!(first.direction, SortDirection::Asc);

    let second = toggle_sort(Some(&first), "name");
    assert_eq!(second.direction, SortDirection::Desc);

    let third = toggle_sort(Some(&second), "name");
    assert_eq!(third.direction, SortDirection::Asc);
}
