//! In-memory page for unit tests.
//!
//! Models just enough of a DOM for the lookup strategies: document order,
//! visibility, delayed rendering, stale reads, intercepted clicks and
//! radio groups. Queries are evaluated from [`LocatorQuery`] semantics,
//! not by parsing XPath.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::SessionConfig;
use crate::driver::{Connector, DriverResult, Element, Page};
use crate::errors::DriverError;
use crate::types::{FIELD_TAGS, LocatorQuery, QueryKind, normalize_space};

/// Declarative node used to build a [`FakePage`]
#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    tag: String,
    attrs: HashMap<String, String>,
    text: String,
    hidden: bool,
    appears_after: usize,
    stale_reads: usize,
    stale_parent: usize,
    intercepts_click: bool,
    ignores_click: bool,
    keeps_group_selection: bool,
    rejects_input: bool,
    panics_on_input: bool,
    children: Vec<FakeNode>,
}

pub fn el(tag: &str) -> FakeNode {
    FakeNode {
        tag: tag.to_string(),
        ..FakeNode::default()
    }
}

/// `<input type="radio">` with the given attributes
pub fn radio(id: &str, name: &str, value: &str) -> FakeNode {
    el("input")
        .attr("type", "radio")
        .attr("id", id)
        .attr("name", name)
        .attr("value", value)
}

impl FakeNode {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Invisible to queries until `find_all` has been called `calls` times
    pub fn appears_after(mut self, calls: usize) -> Self {
        self.appears_after = calls;
        self
    }

    /// The first `reads` visibility checks report a stale reference
    pub fn stale_reads(mut self, reads: usize) -> Self {
        self.stale_reads = reads;
        self
    }

    /// The first `reads` parent lookups report a stale reference
    pub fn stale_parent(mut self, reads: usize) -> Self {
        self.stale_parent = reads;
        self
    }

    pub fn intercepts_click(mut self) -> Self {
        self.intercepts_click = true;
        self
    }

    /// Clicks succeed but change nothing
    pub fn ignores_click(mut self) -> Self {
        self.ignores_click = true;
        self
    }

    /// Selecting this radio leaves the rest of its group checked
    pub fn keeps_group_selection(mut self) -> Self {
        self.keeps_group_selection = true;
        self
    }

    pub fn panics_on_input(mut self) -> Self {
        self.panics_on_input = true;
        self
    }

    /// Keystrokes are accepted but not stored
    pub fn rejects_input(mut self) -> Self {
        self.rejects_input = true;
        self
    }

    pub fn child(mut self, node: FakeNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = FakeNode>) -> Self {
        self.children.extend(nodes);
        self
    }
}

/// Flattened node; arena index is document order
#[derive(Debug)]
struct Slot {
    node: FakeNode,
    parent: Option<usize>,
    /// One past the last descendant
    end: usize,
}

#[derive(Debug, Default)]
struct State {
    find_calls: usize,
    find_errors: Vec<DriverError>,
    values: HashMap<usize, String>,
    selected: HashMap<usize, bool>,
    stale_left: HashMap<usize, usize>,
    stale_parent_left: HashMap<usize, usize>,
    clicks: Vec<usize>,
    navigations: Vec<String>,
    viewport: Option<(u32, u32)>,
    close_calls: usize,
    fail_close: bool,
}

#[derive(Debug)]
struct Inner {
    slots: Vec<Slot>,
    state: Mutex<State>,
}

/// In-memory [`Page`] implementation
#[derive(Debug, Clone)]
pub struct FakePage {
    inner: Arc<Inner>,
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    inner: Arc<Inner>,
    id: usize,
}

impl FakePage {
    pub fn new(body: impl IntoIterator<Item = FakeNode>) -> Self {
        let root = el("body").children(body);
        let mut slots = Vec::new();
        flatten(root, None, &mut slots);

        let mut state = State::default();
        for (id, slot) in slots.iter().enumerate() {
            if let Some(value) = slot.node.attrs.get("value") {
                state.values.insert(id, value.clone());
            }
            if slot.node.attrs.contains_key("checked") {
                state.selected.insert(id, true);
            }
            if slot.node.stale_reads > 0 {
                state.stale_left.insert(id, slot.node.stale_reads);
            }
            if slot.node.stale_parent > 0 {
                state.stale_parent_left.insert(id, slot.node.stale_parent);
            }
        }

        FakePage {
            inner: Arc::new(Inner {
                slots,
                state: Mutex::new(state),
            }),
        }
    }

    /// Queue errors returned by the next `find_all` calls, in order
    pub fn fail_finds_with(&self, errors: impl IntoIterator<Item = DriverError>) {
        self.inner.state().find_errors.extend(errors);
    }

    pub fn fail_close(&self) {
        self.inner.state().fail_close = true;
    }

    pub fn find_calls(&self) -> usize {
        self.inner.state().find_calls
    }

    pub fn close_calls(&self) -> usize {
        self.inner.state().close_calls
    }

    pub fn navigations(&self) -> Vec<String> {
        self.inner.state().navigations.clone()
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.inner.state().viewport
    }

    /// `id` attributes of clicked nodes, in click order
    pub fn clicked_ids(&self) -> Vec<String> {
        let clicks = self.inner.state().clicks.clone();
        clicks
            .into_iter()
            .map(|i| self.inner.attr(i, "id").unwrap_or_default())
            .collect()
    }

    /// `id` attributes of every selected radio
    pub fn selected_ids(&self) -> Vec<String> {
        let state = self.inner.state();
        let mut ids: Vec<usize> = state
            .selected
            .iter()
            .filter(|(_, on)| **on)
            .map(|(i, _)| *i)
            .collect();
        ids.sort_unstable();
        ids.into_iter()
            .map(|i| self.inner.attr(i, "id").unwrap_or_default())
            .collect()
    }
}

fn flatten(mut node: FakeNode, parent: Option<usize>, slots: &mut Vec<Slot>) {
    let id = slots.len();
    let children = std::mem::take(&mut node.children);
    slots.push(Slot {
        node,
        parent,
        end: id + 1,
    });
    for child in children {
        flatten(child, Some(id), slots);
    }
    slots[id].end = slots.len();
}

impl Inner {
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn element(self: &Arc<Self>, id: usize) -> FakeElement {
        FakeElement {
            inner: Arc::clone(self),
            id,
        }
    }

    fn attr(&self, id: usize, name: &str) -> Option<String> {
        self.slots[id].node.attrs.get(name).cloned()
    }

    fn ancestors_and_self(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(id), move |&i| self.slots[i].parent)
    }

    fn is_present(&self, id: usize, find_calls: usize) -> bool {
        self.ancestors_and_self(id)
            .all(|i| self.slots[i].node.appears_after <= find_calls)
    }

    fn is_visible(&self, id: usize) -> bool {
        self.ancestors_and_self(id).all(|i| !self.slots[i].node.hidden)
    }

    /// Normalized text of the node and all its descendants
    fn string_value(&self, id: usize) -> String {
        let joined = self.slots[id..self.slots[id].end]
            .iter()
            .map(|s| s.node.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        normalize_space(&joined)
    }

    fn tag_is(&self, id: usize, tag: &str) -> bool {
        self.slots[id].node.tag == tag
    }

    /// First present node with `tag` at or after index `from`
    fn next_with_tag(&self, from: usize, tag: &str, find_calls: usize) -> Option<usize> {
        (from..self.slots.len()).find(|&j| self.tag_is(j, tag) && self.is_present(j, find_calls))
    }

    fn nearest_fields_from(&self, from: usize, out: &mut Vec<usize>, find_calls: usize) {
        for tag in FIELD_TAGS {
            if let Some(j) = self.next_with_tag(from, tag, find_calls) {
                out.push(j);
            }
        }
    }

    fn evaluate(&self, query: &LocatorQuery, find_calls: usize) -> Vec<usize> {
        let needle = query.needle.as_str();
        let present = |i: &usize| self.is_present(*i, find_calls);
        let mut hits = Vec::new();

        match query.kind {
            QueryKind::LabelFollows => {
                for i in (0..self.slots.len()).filter(present) {
                    if self.tag_is(i, "label") && self.string_value(i).contains(needle) {
                        self.nearest_fields_from(self.slots[i].end, &mut hits, find_calls);
                    }
                }
            }
            QueryKind::AttributeContains => {
                let attr_contains = |i: usize, name: &str| {
                    self.attr(i, name).is_some_and(|v| v.contains(needle))
                };
                for i in (0..self.slots.len()).filter(present) {
                    let hit = match self.slots[i].node.tag.as_str() {
                        "input" | "textarea" => {
                            attr_contains(i, "placeholder") || attr_contains(i, "aria-label")
                        }
                        "select" => attr_contains(i, "aria-label"),
                        _ => false,
                    };
                    if hit {
                        hits.push(i);
                    }
                }
            }
            QueryKind::TextProximity => {
                for i in (0..self.slots.len()).filter(present) {
                    if self.string_value(i).contains(needle) {
                        // following:: skips descendants
                        self.nearest_fields_from(self.slots[i].end, &mut hits, find_calls);
                    }
                }
            }
            QueryKind::RadioInputs => {
                for i in (0..self.slots.len()).filter(present) {
                    if self.tag_is(i, "input")
                        && self.attr(i, "type").as_deref() == Some("radio")
                    {
                        hits.push(i);
                    }
                }
            }
        }

        hits.sort_unstable();
        hits.dedup();
        hits
    }

    fn is_radio(&self, id: usize) -> bool {
        self.tag_is(id, "input") && self.attr(id, "type").as_deref() == Some("radio")
    }

    fn select_radio(&self, state: &mut State, id: usize) {
        if self.slots[id].node.keeps_group_selection {
            state.selected.insert(id, true);
            return;
        }
        let group = self.attr(id, "name");
        for i in 0..self.slots.len() {
            if self.is_radio(i) && self.attr(i, "name") == group {
                state.selected.insert(i, false);
            }
        }
        state.selected.insert(id, true);
    }
}

#[async_trait]
impl Element for FakeElement {
    async fn is_displayed(&self) -> DriverResult<bool> {
        let mut state = self.inner.state();
        if let Some(left) = state.stale_left.get_mut(&self.id)
            && *left > 0
        {
            *left -= 1;
            return Err(DriverError::StaleElement(format!("node {}", self.id)));
        }
        Ok(self.inner.is_visible(self.id))
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        Ok(self.inner.attr(self.id, name))
    }

    async fn property(&self, name: &str) -> DriverResult<Option<String>> {
        let state = self.inner.state();
        Ok(match name {
            "value" => Some(state.values.get(&self.id).cloned().unwrap_or_default()),
            "checked" => Some(state.selected.get(&self.id).copied().unwrap_or(false).to_string()),
            _ => self.inner.attr(self.id, name),
        })
    }

    async fn text(&self) -> DriverResult<String> {
        if !self.inner.is_visible(self.id) {
            return Ok(String::new());
        }
        Ok(self.inner.string_value(self.id))
    }

    async fn clear(&self) -> DriverResult<()> {
        self.inner.state().values.insert(self.id, String::new());
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> DriverResult<()> {
        if self.inner.slots[self.id].node.panics_on_input {
            panic!("input handler crashed");
        }
        if self.inner.slots[self.id].node.rejects_input {
            return Ok(());
        }
        self.inner
            .state()
            .values
            .entry(self.id)
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn click(&self) -> DriverResult<()> {
        let node = &self.inner.slots[self.id].node;
        if node.intercepts_click {
            return Err(DriverError::ClickIntercepted(format!(
                "<{}> is covered by another element",
                node.tag
            )));
        }

        let mut state = self.inner.state();
        state.clicks.push(self.id);
        if node.ignores_click {
            return Ok(());
        }

        // A wrapper forwards its click to the first radio inside it
        let target = (self.id..self.inner.slots[self.id].end).find(|&i| self.inner.is_radio(i));
        if let Some(target) = target
            && !self.inner.slots[target].node.ignores_click
        {
            self.inner.select_radio(&mut state, target);
        }
        Ok(())
    }

    async fn is_selected(&self) -> DriverResult<bool> {
        Ok(self
            .inner
            .state()
            .selected
            .get(&self.id)
            .copied()
            .unwrap_or(false))
    }

    async fn parent(&self) -> DriverResult<Self> {
        {
            let mut state = self.inner.state();
            if let Some(left) = state.stale_parent_left.get_mut(&self.id)
                && *left > 0
            {
                *left -= 1;
                return Err(DriverError::StaleElement(format!("node {}", self.id)));
            }
        }
        match self.inner.slots[self.id].parent {
            Some(parent) => Ok(self.inner.element(parent)),
            None => Err(DriverError::NoSuchElement("parent of <body>".to_string())),
        }
    }
}

#[async_trait]
impl Page for FakePage {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.inner.state().navigations.push(url.to_string());
        Ok(())
    }

    async fn find_all(&self, query: &LocatorQuery) -> DriverResult<Vec<FakeElement>> {
        let find_calls = {
            let mut state = self.inner.state();
            state.find_calls += 1;
            if !state.find_errors.is_empty() {
                return Err(state.find_errors.remove(0));
            }
            state.find_calls
        };
        Ok(self
            .inner
            .evaluate(query, find_calls)
            .into_iter()
            .map(|i| self.inner.element(i))
            .collect())
    }

    async fn set_viewport(&self, width: u32, height: u32) -> DriverResult<()> {
        self.inner.state().viewport = Some((width, height));
        Ok(())
    }

    async fn close_session(&self) -> DriverResult<()> {
        let mut state = self.inner.state();
        state.close_calls += 1;
        if state.fail_close {
            return Err(DriverError::Connection("session already gone".to_string()));
        }
        Ok(())
    }
}

/// Hands out a fresh copy of the same page for every connection
pub struct FakeConnector {
    build: Box<dyn Fn() -> FakePage + Send + Sync>,
    opened: Mutex<Vec<FakePage>>,
    refuse: bool,
}

impl FakeConnector {
    pub fn new(build: impl Fn() -> FakePage + Send + Sync + 'static) -> Self {
        FakeConnector {
            build: Box::new(build),
            opened: Mutex::new(Vec::new()),
            refuse: false,
        }
    }

    pub fn refusing() -> Self {
        FakeConnector {
            refuse: true,
            ..FakeConnector::new(|| FakePage::new(Vec::<FakeNode>::new()))
        }
    }

    pub fn opened(&self) -> Vec<FakePage> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Page = FakePage;

    async fn connect(&self, _config: &SessionConfig) -> DriverResult<FakePage> {
        if self.refuse {
            return Err(DriverError::Connection("connection refused".to_string()));
        }
        let page = (self.build)();
        self.opened.lock().unwrap().push(page.clone());
        Ok(page)
    }
}

/// The practice form the default scenarios target
pub fn practice_form() -> FakePage {
    FakePage::new([el("form").children([
        el("div").children([
            el("label").attr("for", "fname").text("First Name"),
            el("input").attr("id", "fname").attr("type", "text"),
        ]),
        el("div").children([
            el("label").attr("for", "lname").text("Last Name"),
            el("input").attr("id", "lname").attr("type", "text"),
        ]),
        el("div").children([
            el("label").text("Gender"),
            el("div").children([
                radio("male", "gender", "Male").intercepts_click(),
                el("label").attr("for", "male").text("Male"),
            ]),
            el("div").children([
                radio("female", "gender", "Female"),
                el("label").attr("for", "female").text("Female"),
            ]),
        ]),
        el("div").children([
            el("label").attr("for", "email").text("Email"),
            el("input")
                .attr("id", "email")
                .attr("type", "email")
                .attr("placeholder", "name@example.com"),
        ]),
    ])])
}
