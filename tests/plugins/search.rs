use azfind::core::config::ColumnWidths;
use azfind::core::error::AzfError;
use azfind::core::resource::Resource;
use azfind::core::store::ResourceStore;
use azfind::plugins::completion;
use azfind::plugins::picker::{Picker, PickerOutput};
use azfind::plugins::search::{
    EMPTY_CACHE_HINT, SearchContext, SearchOutcome, UrlOpener, list_cache, run_search,
};
use std::cell::RefCell;
use tempfile::tempdir;

const PORTAL: &str = "https://portal.azure.com";

fn res(id: &str, name: &str) -> Resource {
    Resource {
        id: id.to_string(),
        name: name.to_string(),
        resource_type: "Microsoft.Web/sites".to_string(),
        subscription_id: "s1".to_string(),
        resource_group: "rg-web".to_string(),
        location: "westeurope".to_string(),
        tenant_id: "tenant-1".to_string(),
        updated_at: None,
    }
}

#[derive(Default)]
struct RecordingOpener {
    opened: RefCell<Vec<String>>,
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), AzfError> {
        self.opened.borrow_mut().push(url.to_string());
        Ok(())
    }
}

/// Picks the payload line whose id column equals `want_id`, or aborts.
struct ScriptedPicker {
    want_id: Option<String>,
    launches: RefCell<Vec<String>>,
}

impl ScriptedPicker {
    fn choosing(id: &str) -> Self {
        Self {
            want_id: Some(id.to_string()),
            launches: RefCell::new(Vec::new()),
        }
    }

    fn aborting() -> Self {
        Self {
            want_id: None,
            launches: RefCell::new(Vec::new()),
        }
    }
}

impl Picker for ScriptedPicker {
    fn pick(&self, payload: &str, initial_query: &str) -> Result<PickerOutput, AzfError> {
        self.launches.borrow_mut().push(initial_query.to_string());
        let Some(want) = &self.want_id else {
            return Ok(PickerOutput::Aborted(Some(130)));
        };
        let line = payload
            .lines()
            .find(|l| l.rsplit('\t').next() == Some(want.as_str()))
            .unwrap_or_default();
        Ok(PickerOutput::Chosen(format!("{line}\n")))
    }
}

fn ctx<'a>(picker: &'a dyn Picker, opener: &'a dyn UrlOpener) -> SearchContext<'a> {
    SearchContext {
        picker,
        opener,
        widths: ColumnWidths::default(),
        portal_url: PORTAL,
    }
}

fn seeded(resources: &[Resource]) -> (tempfile::TempDir, ResourceStore) {
    let tmp = tempdir().expect("tempdir");
    let mut store = ResourceStore::open(tmp.path()).expect("open");
    store.insert_resources(resources).expect("seed");
    (tmp, store)
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn exact_name_opens_without_picker() {
    let (_tmp, store) = seeded(&[res("/r/api", "api"), res("/r/web", "web")]);
    let picker = ScriptedPicker::aborting();
    let opener = RecordingOpener::default();

    let outcome = run_search(&store, &ctx(&picker, &opener), &args(&["API"])).expect("search");

    assert!(matches!(outcome, SearchOutcome::Opened(ref r) if r.id == "/r/api"));
    assert!(picker.launches.borrow().is_empty());
    assert_eq!(
        *opener.opened.borrow(),
        vec![format!("{PORTAL}/#@tenant-1/resource/r/api")]
    );
}

#[test]
fn non_exact_query_seeds_picker() {
    let (_tmp, store) = seeded(&[res("/r/api", "api"), res("/r/web", "web")]);
    let picker = ScriptedPicker::choosing("/r/web");
    let opener = RecordingOpener::default();

    let outcome =
        run_search(&store, &ctx(&picker, &opener), &args(&["we", "prod"])).expect("search");

    assert!(matches!(outcome, SearchOutcome::Opened(ref r) if r.name == "web"));
    assert_eq!(*picker.launches.borrow(), vec!["we prod".to_string()]);
    assert_eq!(opener.opened.borrow().len(), 1);
}

#[test]
fn single_cached_resource_opens_directly() {
    let (_tmp, store) = seeded(&[res("/r/only", "only")]);
    let picker = ScriptedPicker::aborting();
    let opener = RecordingOpener::default();

    let outcome = run_search(&store, &ctx(&picker, &opener), &[]).expect("search");

    assert!(matches!(outcome, SearchOutcome::Opened(_)));
    assert!(picker.launches.borrow().is_empty());
}

#[test]
fn empty_cache_reports_hint_outcome() {
    let (_tmp, store) = seeded(&[]);
    let picker = ScriptedPicker::aborting();
    let opener = RecordingOpener::default();

    let outcome = run_search(&store, &ctx(&picker, &opener), &args(&["x"])).expect("search");

    assert_eq!(outcome, SearchOutcome::EmptyCache);
    assert!(opener.opened.borrow().is_empty());
}

#[test]
fn aborted_picker_opens_nothing() {
    let (_tmp, store) = seeded(&[res("/r/a", "a"), res("/r/b", "b")]);
    let picker = ScriptedPicker::aborting();
    let opener = RecordingOpener::default();

    let outcome = run_search(&store, &ctx(&picker, &opener), &[]).expect("search");

    assert_eq!(outcome, SearchOutcome::Cancelled);
    assert_eq!(picker.launches.borrow().len(), 1);
    assert!(opener.opened.borrow().is_empty());
}

#[test]
fn list_cache_prints_table() {
    let (_tmp, store) = seeded(&[res("/r/b", "beta"), res("/r/a", "alpha")]);
    let mut out = Vec::new();

    let count = list_cache(&store, &mut out).expect("list");
    let text = String::from_utf8(out).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(count, 2);
    assert_eq!(lines[0], "Cached 2 resources:");
    assert!(lines[2].starts_with("Name"));
    assert!(lines[2].ends_with("Resource Group"));
    assert!(lines[3].starts_with("alpha"));
    assert!(lines[4].starts_with("beta"));
    assert!(lines[4].ends_with("rg-web"));
}

#[test]
fn list_cache_on_empty_cache_prints_hint() {
    let (_tmp, store) = seeded(&[]);
    let mut out = Vec::new();

    assert_eq!(list_cache(&store, &mut out).expect("list"), 0);
    assert!(String::from_utf8(out).expect("utf8").contains(EMPTY_CACHE_HINT));
}

#[test]
fn completion_dedupes_and_filters_by_prefix() {
    let mut other_sub = res("/r/api-2", "api");
    other_sub.subscription_id = "s2".into();
    let (_tmp, store) = seeded(&[
        res("/r/api", "api"),
        other_sub,
        res("/r/apim", "apim"),
        res("/r/web", "web"),
        res("/r/blank", "  "),
    ]);

    let names = completion::generate(&store, "ap");
    assert_eq!(names, vec!["api", "apim"]);
    assert!(names.iter().all(|n| n.to_lowercase().starts_with("ap")));

    let all = completion::generate(&store, "");
    assert!(!all.iter().any(|n| n.trim().is_empty()));
    assert!(all.contains(&"web".to_string()));
}

#[test]
fn completion_at_reads_from_cache_root() {
    let (tmp, store) = seeded(&[res("/r/vm", "vm-prod"), res("/r/db", "db-prod")]);
    store.close().expect("close");

    assert_eq!(completion::generate_at(tmp.path(), "vm"), vec!["vm-prod"]);
    assert!(completion::generate_at(tmp.path(), "zzz").is_empty());
}
