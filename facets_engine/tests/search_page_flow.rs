use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use async_trait::async_trait;
use common::data_source::{FacetOptionSource, ResultsRequest, ResultsSource};
use common::facet_state::Sign;
use common::facet_value::{FacetConfig, FacetValue};
use common::facets_filter::FacetsFilter;
use common::history_state::{FilterState, HistoryState};
use facets_engine::{
    FetchRequest, InitialPage, LoadStatus, MemoryHost, NoopTheme, OptionId, PageEffect, PopState, ResultsView, SearchPage,
    SearchPageConfig, run_effects,
};
use pretty_assertions::assert_eq;

/// Option lists keyed by `(url, parent)`. Unknown keys fail.
#[derive(Default)]
struct FixtureOptions {
    lists: HashMap<(String, Option<String>), Vec<FacetValue>>,
    calls: RefCell<Vec<(String, Option<String>)>>,
}

impl FixtureOptions {
    fn with(mut self, url: &str, parent: Option<&str>, values: Vec<FacetValue>) -> Self {
        self.lists.insert((url.to_string(), parent.map(str::to_string)), values);
        self
    }

    fn calls_for(&self, parent: &str) -> usize {
        self.calls.borrow().iter().filter(|(_, p)| p.as_deref() == Some(parent)).count()
    }
}

#[async_trait(?Send)]
impl FacetOptionSource for FixtureOptions {
    async fn fetch_options(&self, url: &str, parent: Option<&str>) -> anyhow::Result<Vec<FacetValue>> {
        let key = (url.to_string(), parent.map(str::to_string));
        self.calls.borrow_mut().push(key.clone());
        self.lists.get(&key).cloned().ok_or_else(|| anyhow::anyhow!("503 for {url}"))
    }
}

#[derive(Default)]
struct EchoResults {
    requests: RefCell<Vec<ResultsRequest>>,
}

#[async_trait(?Send)]
impl ResultsSource for EchoResults {
    async fn fetch_results(&self, request: &ResultsRequest) -> anyhow::Result<String> {
        self.requests.borrow_mut().push(request.clone());
        Ok(format!("<div>{} | {}</div>", request.user_query, request.facets_query))
    }
}

const YEAR_URL: &str = "/facet/year/1";
const COLLECTION_URL: &str = "/facet/collection/1";

fn facets() -> Vec<FacetConfig> {
    vec![
        FacetConfig::new("collection", "Collection", COLLECTION_URL),
        FacetConfig::new("year", "Year", YEAR_URL),
    ]
}

fn fixtures() -> FixtureOptions {
    FixtureOptions::default()
        .with(
            YEAR_URL,
            None,
            vec![FacetValue::new("2002", "2002", 12), FacetValue::new("2001", "2001", 7), FacetValue::new("2000", "2000", 3)],
        )
        .with(
            COLLECTION_URL,
            None,
            vec![FacetValue::expandable("Books", "Books", 40), FacetValue::new("Articles & Preprints", "Articles & Preprints", 90)],
        )
        .with(
            COLLECTION_URL,
            Some("Books"),
            vec![FacetValue::new("Theses", "Theses", 10), FacetValue::new("Reports", "Reports", 30)],
        )
}

fn page(initial: InitialPage) -> (SearchPage, Vec<PageEffect>) {
    let initial = InitialPage { has_results_container: true, ..initial };
    SearchPage::init(SearchPageConfig::default(), facets(), Rc::new(NoopTheme), initial)
}

fn find(page: &SearchPage, facet: &str, path: &[&str]) -> OptionId {
    let tree = page.engine().filter(facet).unwrap().tree();
    let mut level = None;
    for value in path {
        level = Some(tree.find(level, value).unwrap());
    }
    level.unwrap()
}

struct Harness {
    page: SearchPage,
    host: MemoryHost,
    options: FixtureOptions,
    results: EchoResults,
}

impl Harness {
    async fn start(initial: InitialPage) -> Self {
        let (page, effects) = page(initial);
        let mut harness = Harness { page, host: MemoryHost::default(), options: fixtures(), results: EchoResults::default() };
        harness.run(effects).await;
        harness
    }

    async fn run(&mut self, effects: Vec<PageEffect>) {
        run_effects(&mut self.page, &mut self.host, &self.options, &self.results, effects).await;
    }
}

#[tokio::test]
async fn test_year_include_then_exclude() {
    let mut h = Harness::start(InitialPage::default()).await;
    assert!(h.results.requests.borrow().is_empty());

    let y2002 = find(&h.page, "year", &["2002"]);
    let effects = h.page.activate_option("year", y2002, Sign::Include).unwrap();
    h.run(effects).await;
    let y2000 = find(&h.page, "year", &["2000"]);
    let effects = h.page.activate_option("year", y2000, Sign::Exclude).unwrap();
    h.run(effects).await;

    assert_eq!(h.host.facets_query, "year:2002 AND NOT year:2000");
    assert_eq!(h.host.history.len(), 2);
    assert_eq!(h.host.history[1].0, "/search?p=&post_filter=year%3A2002+AND+NOT+year%3A2000");
    assert_eq!(h.host.results, ResultsView::Loaded("<div> | year:2002 AND NOT year:2000</div>".into()));

    let expected = BTreeMap::from([(
        "year".to_string(),
        BTreeMap::from([("year".to_string(), FilterState::new(vec!["2002".into()], vec!["2000".into()]))]),
    )]);
    assert_eq!(h.page.engine().get_state(), expected);
    let record = h.page.facets_filter().get("year").unwrap();
    assert_eq!((record.inc.clone(), record.exc.clone()), (vec!["2002".to_string()], vec!["2000".to_string()]));
}

#[tokio::test]
async fn test_quoted_values_across_areas() {
    let mut h = Harness::start(InitialPage::default()).await;
    let articles = find(&h.page, "collection", &["Articles & Preprints"]);
    let effects = h.page.activate_option("collection", articles, Sign::Include).unwrap();
    h.run(effects).await;
    let y2001 = find(&h.page, "year", &["2001"]);
    let effects = h.page.toggle_option("year", y2001, false).unwrap();
    h.run(effects).await;

    assert_eq!(h.host.facets_query, "(collection:\"Articles & Preprints\" AND year:2001)");
}

#[tokio::test]
async fn test_nested_state_survives_history_round_trip() {
    let mut h = Harness::start(InitialPage::default()).await;
    let books = find(&h.page, "collection", &["Books"]);
    let effects = h.page.expand_option("collection", books).unwrap();
    h.run(effects).await;
    let theses = find(&h.page, "collection", &["Books", "Theses"]);
    let effects = h.page.activate_option("collection", theses, Sign::Include).unwrap();
    h.run(effects).await;

    let saved = h.page.engine().get_state();
    assert_eq!(
        saved["collection"]["collection"],
        FilterState::new(vec!["Theses".into()], vec![]).with_path("Theses", vec!["Books".into()])
    );

    let (_, history) = h.host.history.last().cloned().unwrap();
    let restored = Harness::start(InitialPage { history: Some(history), ..Default::default() }).await;
    assert_eq!(restored.page.engine().get_state(), saved);
    assert_eq!(restored.options.calls_for("Books"), 1);
    assert_eq!(restored.host.facets_query, "collection:Theses");
    assert!(restored.host.history.is_empty());
    assert_eq!(restored.results.requests.borrow().len(), 1);
}

#[tokio::test]
async fn test_expand_twice_fetches_once() {
    let mut h = Harness::start(InitialPage::default()).await;
    let books = find(&h.page, "collection", &["Books"]);

    let first = h.page.expand_option("collection", books).unwrap();
    let second = h.page.expand_option("collection", books).unwrap();
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    h.run(first).await;
    let again = h.page.expand_option("collection", books).unwrap();
    assert!(again.is_empty());

    let node = h.page.engine().filter("collection").unwrap().option(books).unwrap();
    assert_eq!(node.children().len(), 2);
    assert_eq!(h.options.calls_for("Books"), 1);

    let effects = h.page.collapse_option("collection", books, true).unwrap();
    h.run(effects).await;
    let effects = h.page.expand_option("collection", books).unwrap();
    h.run(effects).await;
    assert_eq!(h.options.calls_for("Books"), 2);
}

#[tokio::test]
async fn test_expanding_active_option_keeps_the_selection() {
    let mut h = Harness::start(InitialPage::default()).await;
    let books = find(&h.page, "collection", &["Books"]);
    let effects = h.page.activate_option("collection", books, Sign::Include).unwrap();
    h.run(effects).await;
    assert_eq!(h.host.facets_query, "collection:Books");

    let effects = h.page.expand_option("collection", books).unwrap();
    h.run(effects).await;
    assert_eq!(h.host.facets_query, "collection:Books");
    assert_eq!(h.host.history.len(), 1);
    assert_eq!(h.results.requests.borrow().len(), 1);
    let theses = find(&h.page, "collection", &["Books", "Theses"]);
    assert!(h.page.engine().filter("collection").unwrap().option(theses).unwrap().is_active());

    let effects = h.page.deactivate_option("collection", theses).unwrap();
    h.run(effects).await;
    assert_eq!(h.host.facets_query, "collection:Reports");
    let record = h.page.facets_filter().get("collection").unwrap();
    assert_eq!(record.inc, vec!["Reports".to_string()]);
}

fn option_fetches(effects: Vec<PageEffect>) -> Vec<FetchRequest> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            PageEffect::FetchOptions(request) => Some(request),
            _ => None,
        })
        .collect()
}

#[test]
fn test_user_action_during_nested_restore_keeps_record_in_sync() {
    let saved = FilterState::new(vec!["Theses".into()], vec![]).with_path("Theses", vec!["Books".into()]);
    let mut record = FacetsFilter::new();
    record.include_facet_value("collection", "Theses");
    let history = HistoryState {
        path: "/search".into(),
        facets_filter: record,
        user_query: String::new(),
        engine_state: Some(BTreeMap::from([(
            "collection".to_string(),
            BTreeMap::from([("collection".to_string(), saved)]),
        )])),
    };
    let (mut page, effects) = page(InitialPage { history: Some(history), ..Default::default() });
    let options = fixtures();

    let mut child_requests = Vec::new();
    for request in option_fetches(effects) {
        let values = options.lists[&(request.url.clone(), None)].clone();
        child_requests.extend(option_fetches(page.on_options_loaded(&request, Ok(values))));
    }
    assert_eq!(child_requests.len(), 1);
    assert_eq!(child_requests[0].parent_value.as_deref(), Some("Books"));

    // the user includes the parent while its children are still on the way
    let books = find(&page, "collection", &["Books"]);
    let effects = page.activate_option("collection", books, Sign::Include).unwrap();
    assert!(effects.iter().any(|e| matches!(e, PageEffect::PushHistory { .. })));
    let children = options.lists[&(COLLECTION_URL.to_string(), Some("Books".to_string()))].clone();
    page.on_options_loaded(&child_requests[0], Ok(children));

    assert_eq!(page.facets_filter().get("collection").unwrap().inc, vec!["Books".to_string()]);
    assert_eq!(page.engine().get_query_structure()["collection"].include, vec!["Books".to_string()]);
    assert_eq!(page.facets_query(), "collection:Books");
}

#[tokio::test]
async fn test_failed_facet_does_not_block_others() {
    let (mut page, effects) = page(InitialPage::default());
    let mut host = MemoryHost::default();
    let options = FixtureOptions::default().with(YEAR_URL, None, vec![FacetValue::new("2002", "2002", 1)]);
    let results = EchoResults::default();
    run_effects(&mut page, &mut host, &options, &results, effects).await;

    assert_eq!(page.engine().filter("collection").unwrap().status(), LoadStatus::Failed);
    assert!(page.engine().filter("collection").unwrap().tree().is_empty());

    let y2002 = find(&page, "year", &["2002"]);
    let effects = page.toggle_option("year", y2002, false).unwrap();
    run_effects(&mut page, &mut host, &options, &results, effects).await;
    assert_eq!(host.facets_query, "year:2002");
}

#[tokio::test]
async fn test_failed_child_load_keeps_option_collapsed() {
    let mut h = Harness::start(InitialPage::default()).await;
    h.options.lists.remove(&(COLLECTION_URL.to_string(), Some("Books".to_string())));
    let books = find(&h.page, "collection", &["Books"]);
    let effects = h.page.expand_option("collection", books).unwrap();
    h.run(effects).await;

    let node = h.page.engine().filter("collection").unwrap().option(books).unwrap();
    assert!(!node.is_expanded());
    assert!(!node.children_loaded());
}

#[tokio::test]
async fn test_stale_option_response_is_dropped() {
    let mut h = Harness::start(InitialPage::default()).await;
    let books = find(&h.page, "collection", &["Books"]);

    let first = h.page.expand_option("collection", books).unwrap();
    h.page.collapse_option("collection", books, true).unwrap();
    let second = h.page.expand_option("collection", books).unwrap();
    let (PageEffect::FetchOptions(old), PageEffect::FetchOptions(new)) = (&first[0], &second[0]) else {
        panic!("expected option fetches");
    };
    assert!(old.generation < new.generation);

    let children = vec![FacetValue::new("Theses", "Theses", 10)];
    assert!(h.page.on_options_loaded(old, Ok(children.clone())).is_empty());
    assert!(!h.page.engine().filter("collection").unwrap().option(books).unwrap().children_loaded());

    h.page.on_options_loaded(new, Ok(children));
    assert_eq!(h.page.engine().filter("collection").unwrap().option(books).unwrap().children().len(), 1);
}

#[tokio::test]
async fn test_pop_state_replays_and_fetches_results() {
    let mut h = Harness::start(InitialPage::default()).await;
    let y2002 = find(&h.page, "year", &["2002"]);
    let effects = h.page.toggle_option("year", y2002, false).unwrap();
    h.run(effects).await;
    let effects = h.page.toggle_option("year", y2002, false).unwrap();
    h.run(effects).await;
    assert_eq!(h.host.facets_query, "");

    let (url, state) = h.host.history[0].clone();
    let effects = h.page.pop_state(PopState { url, state: Some(state), visible_user_query: String::new(), has_results_container: true });
    h.run(effects).await;

    assert_eq!(h.host.facets_query, "year:2002");
    assert_eq!(h.host.history.len(), 2);
    assert_eq!(h.page.engine().get_query_structure()["year"].include, vec!["2002".to_string()]);
    assert_eq!(h.results.requests.borrow().len(), 3);
}

#[tokio::test]
async fn test_pop_state_without_state_reloads() {
    let mut h = Harness::start(InitialPage::default()).await;
    let effects = h.page.pop_state(PopState { url: "/search?p=higgs".into(), has_results_container: true, ..Default::default() });
    h.run(effects).await;
    assert_eq!(h.host.reloads, vec!["/search?p=higgs".to_string()]);
}

#[tokio::test]
async fn test_edit_facets_reloads_with_merged_query() {
    let mut h = Harness::start(InitialPage::default()).await;
    let y2002 = find(&h.page, "year", &["2002"]);
    let effects = h.page.toggle_option("year", y2002, false).unwrap();
    h.run(effects).await;
    h.page.set_user_query("ellis");

    let effects = h.page.edit_facets();
    h.run(effects).await;
    assert_eq!(h.host.user_query, "ellis AND year:2002");
    assert_eq!(h.host.reloads, vec!["/search?p=ellis+AND+year%3A2002&post_filter=".to_string()]);
    assert!(h.page.facets_filter().is_empty());
}

#[tokio::test]
async fn test_restore_from_server_rendered_filter() {
    let mut filter = FacetsFilter::new();
    filter.exclude_facet_value("year", "2001");
    let h = Harness::start(InitialPage { facets_filter: filter, ..Default::default() }).await;

    let y2001 = find(&h.page, "year", &["2001"]);
    assert_eq!(h.page.engine().filter("year").unwrap().option(y2001).unwrap().registered(), Some(Sign::Exclude));
    assert!(h.host.history.is_empty());
    assert!(h.results.requests.borrow().is_empty());
    assert_eq!(h.host.results, ResultsView::Initial);
}
