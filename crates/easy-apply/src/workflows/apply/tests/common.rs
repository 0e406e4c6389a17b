use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use crate::browser::{Browser, BrowserError, ElementHandle, Locator};
use crate::workflows::apply::answers::{
    AnswerError, QuestionAnswer, QuestionAnswerStore, QuestionAnswerer,
};
use crate::workflows::apply::applier::{ApplierSettings, EasyApplier};
use crate::workflows::apply::domain::{Job, OutcomeClass, OutcomeRecord};
use crate::workflows::apply::eligibility::{EligibilityConfig, EligibilityFilter};
use crate::workflows::apply::operator::{OperatorConsole, OperatorSignal};
use crate::workflows::apply::outcomes::{OutcomeLog, OutcomeLogError};
use crate::workflows::apply::pacing::Timings;
use crate::workflows::apply::selectors::{
    DESCRIPTION_TEXT, EASY_APPLY_BUTTONS, FORM_CONTAINER, PRIMARY_ACTION, RESULTS_LIST,
    RESULTS_LIST_READY, RESULT_TILE, TILE_APPLY_METHOD, TILE_COMPANY, TILE_LOCATION, TILE_TITLE,
};
use crate::workflows::apply::session::SessionOrchestrator;

pub(super) const PREMIUM_URL: &str = "https://www.linkedin.com/premium/products/";
pub(super) const PAGE_ZERO: &str = "start=0";
pub(super) const PAGE_ONE: &str = "start=25";

const ANY_STEP: usize = usize::MAX;
const SCROLL_HEIGHT: u64 = 2_400;

pub(super) fn el(id: &str) -> ElementHandle {
    ElementHandle(id.to_string())
}

fn handles(ids: &[&str]) -> Vec<ElementHandle> {
    ids.iter().map(|id| el(id)).collect()
}

/// What a native click does besides being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ClickEffect {
    AdvanceStep,
    Navigate(&'static str),
    SessionLost,
}

struct Page {
    fragment: String,
    step: usize,
    elements: HashMap<(usize, Locator), Vec<ElementHandle>>,
}

/// The page changes by itself after `reads_left` URL reads, like a
/// checkpoint the operator completes in the browser.
struct Handoff {
    from: String,
    to: String,
    reads_left: u32,
}

struct Redirect {
    from: String,
    to: String,
    remaining: Option<u32>,
}

#[derive(Default)]
struct Dom {
    current_url: String,
    pages: Vec<Page>,
    redirects: Vec<Redirect>,
    handoffs: Vec<Handoff>,
    children: HashMap<(usize, ElementHandle, Locator), Vec<ElementHandle>>,
    texts: HashMap<ElementHandle, String>,
    attributes: HashMap<(ElementHandle, String), String>,
    hidden: HashSet<ElementHandle>,
    intercepted: HashSet<ElementHandle>,
    effects: HashMap<ElementHandle, ClickEffect>,
    click_failures: HashMap<ElementHandle, u32>,
    visited: Vec<String>,
    clicks: Vec<ElementHandle>,
    keys: Vec<(ElementHandle, String)>,
    refreshes: u32,
}

impl Dom {
    /// The registered page whose fragment is the longest match for the current URL.
    fn page_index(&self) -> Option<usize> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, page)| self.current_url.contains(&page.fragment))
            .max_by_key(|(_, page)| page.fragment.len())
            .map(|(index, _)| index)
    }

    fn step(&self) -> usize {
        self.page_index()
            .map(|index| self.pages[index].step)
            .unwrap_or(0)
    }

    fn page_mut(&mut self, fragment: &str) -> &mut Page {
        if let Some(index) = self.pages.iter().position(|page| page.fragment == fragment) {
            return &mut self.pages[index];
        }
        self.pages.push(Page {
            fragment: fragment.to_string(),
            step: 0,
            elements: HashMap::new(),
        });
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn lookup(&self, locator: &Locator) -> Vec<ElementHandle> {
        let Some(index) = self.page_index() else {
            return Vec::new();
        };
        let page = &self.pages[index];
        page.elements
            .get(&(page.step, locator.clone()))
            .or_else(|| page.elements.get(&(ANY_STEP, locator.clone())))
            .cloned()
            .unwrap_or_default()
    }

    fn lookup_in(&self, parent: &ElementHandle, locator: &Locator) -> Vec<ElementHandle> {
        let step = self.step();
        self.children
            .get(&(step, parent.clone(), locator.clone()))
            .or_else(|| self.children.get(&(ANY_STEP, parent.clone(), locator.clone())))
            .cloned()
            .unwrap_or_default()
    }

    fn land(&mut self, url: &str) -> String {
        for redirect in &mut self.redirects {
            if !url.contains(&redirect.from) {
                continue;
            }
            match &mut redirect.remaining {
                Some(0) => continue,
                Some(remaining) => *remaining -= 1,
                None => {}
            }
            return redirect.to.clone();
        }
        url.to_string()
    }

    fn read_url(&mut self) -> String {
        let current = &self.current_url;
        if let Some(index) = self
            .handoffs
            .iter()
            .position(|handoff| current.contains(&handoff.from))
        {
            if self.handoffs[index].reads_left == 0 {
                let handoff = self.handoffs.remove(index);
                self.current_url = handoff.to;
            } else {
                self.handoffs[index].reads_left -= 1;
            }
        }
        self.current_url.clone()
    }

    fn navigate(&mut self, url: &str) {
        let landing = self.land(url);
        self.visited.push(url.to_string());
        self.current_url = landing;
        if let Some(index) = self.page_index() {
            self.pages[index].step = 0;
        }
    }

    fn activate(&mut self, element: &ElementHandle) {
        self.clicks.push(element.clone());
        match self.effects.get(element).copied() {
            Some(ClickEffect::AdvanceStep) => {
                if let Some(index) = self.page_index() {
                    self.pages[index].step += 1;
                }
            }
            Some(ClickEffect::Navigate(url)) => self.navigate(url),
            _ => {}
        }
    }
}

/// In-memory page model keyed by URL fragment and wizard step.
#[derive(Clone, Default)]
pub(super) struct ScriptedBrowser {
    dom: Arc<Mutex<Dom>>,
}

impl ScriptedBrowser {
    pub(super) fn new() -> Self {
        Self::default()
    }

    fn dom(&self) -> MutexGuard<'_, Dom> {
        self.dom.lock().expect("browser mutex poisoned")
    }

    pub(super) fn element(&self, fragment: &str, locator: Locator, ids: &[&str]) {
        self.element_at(fragment, ANY_STEP, locator, ids);
    }

    pub(super) fn element_at(&self, fragment: &str, step: usize, locator: Locator, ids: &[&str]) {
        self.dom()
            .page_mut(fragment)
            .elements
            .insert((step, locator), handles(ids));
    }

    pub(super) fn child(&self, parent: &str, locator: Locator, ids: &[&str]) {
        self.child_at(ANY_STEP, parent, locator, ids);
    }

    pub(super) fn child_at(&self, step: usize, parent: &str, locator: Locator, ids: &[&str]) {
        self.dom()
            .children
            .insert((step, el(parent), locator), handles(ids));
    }

    pub(super) fn set_text(&self, id: &str, text: &str) {
        self.dom().texts.insert(el(id), text.to_string());
    }

    pub(super) fn set_attribute(&self, id: &str, name: &str, value: &str) {
        self.dom()
            .attributes
            .insert((el(id), name.to_string()), value.to_string());
    }

    pub(super) fn hide(&self, id: &str) {
        self.dom().hidden.insert(el(id));
    }

    pub(super) fn intercept(&self, id: &str) {
        self.dom().intercepted.insert(el(id));
    }

    pub(super) fn on_click(&self, id: &str, effect: ClickEffect) {
        self.dom().effects.insert(el(id), effect);
    }

    pub(super) fn fail_clicks(&self, id: &str, times: u32) {
        self.dom().click_failures.insert(el(id), times);
    }

    pub(super) fn redirect(&self, from: &str, to: &str) {
        self.dom().redirects.push(Redirect {
            from: from.to_string(),
            to: to.to_string(),
            remaining: None,
        });
    }

    pub(super) fn redirect_times(&self, from: &str, to: &str, times: u32) {
        self.dom().redirects.push(Redirect {
            from: from.to_string(),
            to: to.to_string(),
            remaining: Some(times),
        });
    }

    pub(super) fn hand_off_after(&self, from: &str, reads: u32, to: &str) {
        self.dom().handoffs.push(Handoff {
            from: from.to_string(),
            to: to.to_string(),
            reads_left: reads,
        });
    }

    pub(super) fn visits_to(&self, fragment: &str) -> usize {
        self.dom()
            .visited
            .iter()
            .filter(|url| url.contains(fragment))
            .count()
    }

    pub(super) fn clicked(&self, id: &str) -> bool {
        self.dom().clicks.contains(&el(id))
    }

    pub(super) fn clicks(&self) -> Vec<ElementHandle> {
        self.dom().clicks.clone()
    }

    pub(super) fn keys_sent_to(&self, id: &str) -> Vec<String> {
        self.dom()
            .keys
            .iter()
            .filter(|(element, _)| element.id() == id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub(super) fn refreshes(&self) -> u32 {
        self.dom().refreshes
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.dom().navigate(url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.dom().read_url())
    }

    async fn refresh(&self) -> Result<(), BrowserError> {
        self.dom().refreshes += 1;
        Ok(())
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        Ok("<html><body>scripted</body></html>".to_string())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, BrowserError> {
        Ok(self.dom().lookup(locator))
    }

    async fn find_all_in(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> Result<Vec<ElementHandle>, BrowserError> {
        Ok(self.dom().lookup_in(parent, locator))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        let mut dom = self.dom();
        if let Some(remaining) = dom.click_failures.get_mut(element) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BrowserError::Command {
                    code: "element not interactable".to_string(),
                    message: format!("{} is not clickable yet", element.id()),
                });
            }
        }
        if dom.intercepted.contains(element) {
            return Err(BrowserError::ClickIntercepted(format!(
                "overlay covers {}",
                element.id()
            )));
        }
        if dom.effects.get(element) == Some(&ClickEffect::SessionLost) {
            return Err(BrowserError::SessionLost("browser window closed".to_string()));
        }
        dom.activate(element);
        Ok(())
    }

    async fn clear(&self, _element: &ElementHandle) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), BrowserError> {
        self.dom().keys.push((element.clone(), text.to_string()));
        Ok(())
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, BrowserError> {
        Ok(self.dom().texts.get(element).cloned().unwrap_or_default())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        Ok(self
            .dom()
            .attributes
            .get(&(element.clone(), name.to_string()))
            .cloned())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, BrowserError> {
        Ok(!self.dom().hidden.contains(element))
    }

    async fn is_enabled(&self, _element: &ElementHandle) -> Result<bool, BrowserError> {
        Ok(true)
    }

    async fn execute(
        &self,
        script: &str,
        args: &[&ElementHandle],
    ) -> Result<Value, BrowserError> {
        let mut dom = self.dom();
        if script.contains("scrollHeight") {
            return Ok(json!(SCROLL_HEIGHT));
        }
        if script.contains(".click()") {
            if let Some(element) = args.first() {
                dom.activate(element);
            }
        }
        Ok(Value::Null)
    }

    async fn quit(&self) -> Result<(), BrowserError> {
        Ok(())
    }
}

/// Scripts a job page whose wizard shows `next_steps` Next buttons before Submit.
/// Element ids are prefixed with `key`; the form container is `{key}-form`.
pub(super) fn script_job_page(browser: &ScriptedBrowser, link: &str, key: &str, next_steps: usize) {
    let button = format!("{key}-easy-apply");
    browser.element(link, Locator::xpath(EASY_APPLY_BUTTONS), &[button.as_str()]);

    let description = format!("{key}-description");
    browser.element(link, Locator::class(DESCRIPTION_TEXT), &[description.as_str()]);
    browser.set_text(&description, "We build Rust services for logistics.");

    let form = format!("{key}-form");
    browser.element(link, Locator::class(FORM_CONTAINER), &[form.as_str()]);

    for step in 0..=next_steps {
        let action = format!("{key}-action-{step}");
        browser.element_at(link, step, Locator::class(PRIMARY_ACTION), &[action.as_str()]);
        if step == next_steps {
            browser.set_text(&action, "Submit application");
        } else {
            browser.set_text(&action, "Next");
            browser.on_click(&action, ClickEffect::AdvanceStep);
        }
    }
}

pub(super) struct Tile<'a> {
    pub(super) key: &'a str,
    pub(super) title: &'a str,
    pub(super) company: &'a str,
    pub(super) link: &'a str,
    pub(super) apply_method: &'a str,
}

impl<'a> Tile<'a> {
    pub(super) fn easy_apply(key: &'a str, title: &'a str, company: &'a str, link: &'a str) -> Self {
        Self {
            key,
            title,
            company,
            link,
            apply_method: "Easy Apply",
        }
    }
}

/// Scripts a results page reachable at any URL containing `fragment`.
pub(super) fn script_results_page(browser: &ScriptedBrowser, fragment: &str, tiles: &[Tile<'_>]) {
    let list = format!("{fragment}-list");
    browser.element(fragment, Locator::class(RESULTS_LIST_READY), &[list.as_str()]);
    browser.element(fragment, Locator::class(RESULTS_LIST), &[list.as_str()]);

    let ids: Vec<String> = tiles.iter().map(|tile| format!("{}-tile", tile.key)).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    browser.child(&list, Locator::class(RESULT_TILE), &id_refs);

    for (tile, id) in tiles.iter().zip(&ids) {
        let title = format!("{}-title", tile.key);
        browser.child(id, Locator::class(TILE_TITLE), &[title.as_str()]);
        browser.set_text(&title, tile.title);
        browser.set_attribute(&title, "href", tile.link);

        for (class, suffix, text) in [
            (TILE_COMPANY, "company", tile.company),
            (TILE_LOCATION, "location", "Berlin, Germany"),
            (TILE_APPLY_METHOD, "method", tile.apply_method),
        ] {
            let field = format!("{}-{suffix}", tile.key);
            browser.child(id, Locator::class(class), &[field.as_str()]);
            browser.set_text(&field, text);
        }
    }
}

#[derive(Clone, Default)]
pub(super) struct MemoryOutcomeLog {
    records: Arc<Mutex<HashMap<OutcomeClass, Vec<OutcomeRecord>>>>,
}

impl MemoryOutcomeLog {
    pub(super) fn with_success(company: &str) -> Self {
        let log = Self::default();
        let previous = job("Backend Engineer", company, "https://www.linkedin.com/jobs/view/1/");
        log.append(OutcomeClass::Success, &OutcomeRecord::from_job(&previous))
            .expect("memory append succeeds");
        log
    }

    pub(super) fn links(&self, class: OutcomeClass) -> Vec<String> {
        self.records
            .lock()
            .expect("outcome mutex poisoned")
            .get(&class)
            .map(|records| records.iter().map(|record| record.link.clone()).collect())
            .unwrap_or_default()
    }

    pub(super) fn total(&self) -> usize {
        self.records
            .lock()
            .expect("outcome mutex poisoned")
            .values()
            .map(Vec::len)
            .sum()
    }
}

impl OutcomeLog for MemoryOutcomeLog {
    fn append(&self, class: OutcomeClass, record: &OutcomeRecord) -> Result<(), OutcomeLogError> {
        self.records
            .lock()
            .expect("outcome mutex poisoned")
            .entry(class)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn read(&self, class: OutcomeClass) -> Result<Vec<OutcomeRecord>, OutcomeLogError> {
        Ok(self
            .records
            .lock()
            .expect("outcome mutex poisoned")
            .get(&class)
            .cloned()
            .unwrap_or_default())
    }
}

/// Answers every question with `answer` and remembers what it was asked.
#[derive(Clone)]
pub(super) struct RecordingAnswerer {
    answer: String,
    questions: Arc<Mutex<Vec<String>>>,
}

impl RecordingAnswerer {
    pub(super) fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            questions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(super) fn questions(&self) -> Vec<String> {
        self.questions
            .lock()
            .expect("answerer mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl QuestionAnswerer for RecordingAnswerer {
    async fn answer_question(&self, _job: &Job, question: &str) -> Result<String, AnswerError> {
        self.questions
            .lock()
            .expect("answerer mutex poisoned")
            .push(question.to_string());
        Ok(self.answer.clone())
    }
}

/// Replays queued signals; an empty queue behaves like a prompt that timed out.
#[derive(Clone, Default)]
pub(super) struct ScriptedOperator {
    signals: Arc<Mutex<VecDeque<OperatorSignal>>>,
    prompts: Arc<Mutex<Vec<(String, Option<Duration>)>>>,
}

impl ScriptedOperator {
    pub(super) fn replying(signals: impl IntoIterator<Item = OperatorSignal>) -> Self {
        Self {
            signals: Arc::new(Mutex::new(signals.into_iter().collect())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(super) fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .expect("operator mutex poisoned")
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    /// Timeout passed with each prompt, in order; `None` is an unbounded wait.
    pub(super) fn timeouts(&self) -> Vec<Option<Duration>> {
        self.prompts
            .lock()
            .expect("operator mutex poisoned")
            .iter()
            .map(|(_, timeout)| *timeout)
            .collect()
    }
}

#[async_trait]
impl OperatorConsole for ScriptedOperator {
    async fn await_signal(&self, prompt: &str, timeout: Option<Duration>) -> Option<OperatorSignal> {
        self.prompts
            .lock()
            .expect("operator mutex poisoned")
            .push((prompt.to_string(), timeout));
        self.signals
            .lock()
            .expect("operator mutex poisoned")
            .pop_front()
    }
}

pub(super) fn job(title: &str, company: &str, link: &str) -> Job {
    Job::new(
        title.to_string(),
        company.to_string(),
        "Berlin, Germany".to_string(),
        link.to_string(),
        "Easy Apply".to_string(),
    )
    .expect("fixture job is complete")
}

pub(super) fn stored_answers(pairs: &[(&str, &str)]) -> Arc<QuestionAnswerStore> {
    Arc::new(QuestionAnswerStore::new(
        pairs
            .iter()
            .map(|(question, answer)| QuestionAnswer {
                question: question.to_string(),
                answer: answer.to_string(),
            })
            .collect(),
    ))
}

pub(super) fn applier_settings() -> ApplierSettings {
    ApplierSettings {
        timings: Timings::instant(),
        ..ApplierSettings::default()
    }
}

pub(super) fn applier(
    browser: &ScriptedBrowser,
    answers: Arc<QuestionAnswerStore>,
    answerer: &RecordingAnswerer,
) -> EasyApplier<ScriptedBrowser> {
    EasyApplier::new(
        Arc::new(browser.clone()),
        answers,
        Arc::new(answerer.clone()),
        applier_settings(),
    )
    .with_rng(StdRng::seed_from_u64(42))
}

pub(super) fn orchestrator(
    browser: &ScriptedBrowser,
    log: &MemoryOutcomeLog,
    config: EligibilityConfig,
) -> SessionOrchestrator<ScriptedBrowser, MemoryOutcomeLog> {
    let answerer = RecordingAnswerer::new("Yes");
    SessionOrchestrator::new(
        Arc::new(browser.clone()),
        Arc::new(log.clone()),
        EligibilityFilter::new(config),
        applier(browser, stored_answers(&[]), &answerer),
        Arc::new(ScriptedOperator::default()),
        Timings::instant(),
    )
    .with_rng(StdRng::seed_from_u64(7))
}
