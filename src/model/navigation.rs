//! Navigation stack: the path of open menus and hook-gated transitions

use super::catalogue_client::{FetchResult, Query};
use super::menu::{Hook, HookContext, HookStage, MenuNode};
use crate::error::RemoteError;

/// An open menu and its cursor
pub struct Frame {
    pub node: Box<dyn MenuNode>,
    pub selected: usize,
}

impl Frame {
    fn new(node: Box<dyn MenuNode>) -> Self {
        Self { node, selected: 0 }
    }

    pub fn page(&self, page_size: usize) -> usize {
        self.selected / page_size.max(1)
    }
}

/// Identifies one in-flight hook fetch. A completion whose ticket no longer
/// matches the pending one is stale and gets dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub stage: HookStage,
    pub menu_key: String,
    pub generation: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Advance {
    Step,
    Page,
}

enum Pending {
    Enter { child: Box<dyn MenuNode>, ticket: Ticket },
    Edge { ticket: Ticket, then: Advance },
}

impl Pending {
    fn ticket(&self) -> &Ticket {
        match self {
            Pending::Enter { ticket, .. } | Pending::Edge { ticket, .. } => ticket,
        }
    }
}

/// Immediate outcome of a navigation request
#[derive(Debug, PartialEq, Eq)]
pub enum Transition {
    Committed,
    /// A hook refused; nothing changed
    Rejected,
    /// Nothing to do, or a fetch is already in flight
    Ignored,
    /// A pending fetch was abandoned
    Cancelled,
    /// The hook needs `Query` run off the event loop
    Fetching(Ticket, Query),
}

/// Outcome of applying a fetch result
#[derive(Debug, PartialEq, Eq)]
pub enum Completion {
    Committed { stage: HookStage, added: usize },
    Failed(RemoteError),
    /// Pagination fetch succeeded but brought nothing new
    Exhausted,
    Stale,
}

pub struct NavigationStack {
    frames: Vec<Frame>,
    page_size: usize,
    generation: u64,
    pending: Option<Pending>,
}

impl NavigationStack {
    pub fn new(root: Box<dyn MenuNode>, page_size: usize) -> Self {
        Self {
            frames: vec![Frame::new(root)],
            page_size: page_size.max(1),
            generation: 0,
            pending: None,
        }
    }

    pub fn top(&self) -> &Frame {
        // never empty: the root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Title of the menu being loaded, if the pending fetch is an entry
    pub fn loading_title(&self) -> Option<String> {
        match &self.pending {
            Some(Pending::Enter { child, .. }) => Some(child.title()),
            Some(Pending::Edge { .. }) => Some(self.top().node.title()),
            None => None,
        }
    }

    pub fn select(&mut self, index: usize) {
        let len = self.top().node.items().len();
        self.top_mut().selected = index.min(len.saturating_sub(1));
    }

    fn begin(&mut self, stage: HookStage, menu_key: String) -> Ticket {
        self.generation += 1;
        Ticket {
            stage,
            menu_key,
            generation: self.generation,
        }
    }

    /// Enter the child under the cursor
    pub fn enter_selected(&mut self, ctx: &HookContext) -> Transition {
        if self.pending.is_some() {
            return Transition::Ignored;
        }
        let top = self.top();
        match top.node.sub_menu(top.selected, ctx) {
            Some(child) => self.enter(child, ctx),
            None => Transition::Ignored,
        }
    }

    pub fn enter(&mut self, mut child: Box<dyn MenuNode>, ctx: &HookContext) -> Transition {
        if self.pending.is_some() {
            return Transition::Ignored;
        }
        match child.before_enter(ctx) {
            Hook::Continue => {
                tracing::debug!(menu_key = %child.menu_key(), "Entered menu");
                self.frames.push(Frame::new(child));
                Transition::Committed
            }
            Hook::Abort => {
                tracing::debug!(menu_key = %child.menu_key(), "Menu entry refused");
                Transition::Rejected
            }
            Hook::Fetch(query) => {
                let ticket = self.begin(HookStage::Enter, child.menu_key());
                self.pending = Some(Pending::Enter { child, ticket: ticket.clone() });
                Transition::Fetching(ticket, query)
            }
        }
    }

    pub fn back(&mut self, ctx: &HookContext) -> Transition {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(menu_key = %pending.ticket().menu_key, "Pending load cancelled");
            // anything still in flight now carries an outdated generation
            self.generation += 1;
            return Transition::Cancelled;
        }
        if self.frames.len() <= 1 {
            return Transition::Ignored;
        }
        if !self.top_mut().node.before_back(ctx) {
            return Transition::Rejected;
        }
        self.frames.pop();
        Transition::Committed
    }

    pub fn move_down(&mut self, ctx: &HookContext) -> Transition {
        if self.pending.is_some() {
            return Transition::Ignored;
        }
        let page_size = self.page_size;
        let len = self.top().node.items().len();
        let frame = self.top_mut();
        if frame.selected + 1 < len {
            let crosses = (frame.selected + 1) / page_size != frame.selected / page_size;
            if crosses && !frame.node.before_next_page(ctx) {
                return Transition::Rejected;
            }
            frame.selected += 1;
            return Transition::Committed;
        }
        self.edge(HookStage::BottomOut, Advance::Step, ctx)
    }

    pub fn move_up(&mut self, ctx: &HookContext) -> Transition {
        if self.pending.is_some() {
            return Transition::Ignored;
        }
        let page_size = self.page_size;
        let frame = self.top_mut();
        if frame.selected > 0 {
            let crosses = (frame.selected - 1) / page_size != frame.selected / page_size;
            if crosses && !frame.node.before_prev_page(ctx) {
                return Transition::Rejected;
            }
            frame.selected -= 1;
            return Transition::Committed;
        }
        self.edge(HookStage::TopOut, Advance::Step, ctx)
    }

    pub fn next_page(&mut self, ctx: &HookContext) -> Transition {
        if self.pending.is_some() {
            return Transition::Ignored;
        }
        let page_size = self.page_size;
        let len = self.top().node.items().len();
        let frame = self.top_mut();
        if !frame.node.before_next_page(ctx) {
            return Transition::Rejected;
        }
        let page = frame.page(page_size);
        if (page + 1) * page_size < len {
            frame.selected = (page + 1) * page_size;
            return Transition::Committed;
        }
        self.edge(HookStage::BottomOut, Advance::Page, ctx)
    }

    pub fn prev_page(&mut self, ctx: &HookContext) -> Transition {
        if self.pending.is_some() {
            return Transition::Ignored;
        }
        let page_size = self.page_size;
        let frame = self.top_mut();
        if !frame.node.before_prev_page(ctx) {
            return Transition::Rejected;
        }
        let page = frame.page(page_size);
        if page > 0 {
            frame.selected = (page - 1) * page_size;
            return Transition::Committed;
        }
        self.edge(HookStage::TopOut, Advance::Page, ctx)
    }

    fn edge(&mut self, stage: HookStage, then: Advance, ctx: &HookContext) -> Transition {
        let node = &mut self.top_mut().node;
        let hook = match stage {
            HookStage::TopOut => node.top_out(ctx),
            _ => node.bottom_out(ctx),
        };
        match hook {
            // nothing cached past this edge and nothing to load
            Hook::Continue => Transition::Ignored,
            Hook::Abort => Transition::Rejected,
            Hook::Fetch(query) => {
                let key = self.top().node.menu_key();
                let ticket = self.begin(stage, key);
                self.pending = Some(Pending::Edge { ticket: ticket.clone(), then });
                Transition::Fetching(ticket, query)
            }
        }
    }

    /// Apply a finished hook fetch. Only the event loop calls this, so the
    /// commit is all-or-nothing with respect to rendering.
    pub fn complete(&mut self, ticket: &Ticket, result: FetchResult, ctx: &HookContext) -> Completion {
        match &self.pending {
            Some(pending) if pending.ticket() == ticket => {}
            _ => {
                tracing::debug!(menu_key = %ticket.menu_key, generation = ticket.generation, "Discarding stale fetch");
                return Completion::Stale;
            }
        }
        let Some(pending) = self.pending.take() else {
            return Completion::Stale;
        };

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => return Completion::Failed(e),
        };

        match pending {
            Pending::Enter { mut child, .. } => match child.absorb(HookStage::Enter, &payload, ctx) {
                Ok(added) => {
                    tracing::debug!(menu_key = %child.menu_key(), added, "Entered menu after load");
                    self.frames.push(Frame::new(child));
                    Completion::Committed { stage: HookStage::Enter, added }
                }
                Err(e) => Completion::Failed(e),
            },
            Pending::Edge { ticket, then } => {
                let page_size = self.page_size;
                let frame = self.top_mut();
                let added = match frame.node.absorb(ticket.stage, &payload, ctx) {
                    Ok(0) => return Completion::Exhausted,
                    Ok(added) => added,
                    Err(e) => return Completion::Failed(e),
                };
                let len = frame.node.items().len();
                match ticket.stage {
                    HookStage::TopOut => {
                        // keep the cursor on the same entry, then take the step
                        frame.selected += added;
                        frame.selected = match then {
                            Advance::Step => frame.selected.saturating_sub(1),
                            Advance::Page => {
                                let page = frame.page(page_size);
                                page.saturating_sub(1) * page_size
                            }
                        };
                    }
                    _ => {
                        frame.selected = match then {
                            Advance::Step => frame.selected + 1,
                            Advance::Page => (frame.page(page_size) + 1) * page_size,
                        }
                        .min(len.saturating_sub(1));
                    }
                }
                Completion::Committed { stage: ticket.stage, added }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::menu::MenuData;
    use crate::model::types::Track;
    use serde_json::{json, Value};

    /// Menu whose list is the `ids` array of each payload
    struct Numbers {
        key: &'static str,
        data: MenuData,
        enter: Hook,
        bottom: Hook,
        top: Hook,
        allow_back: bool,
    }

    impl Numbers {
        fn new(key: &'static str) -> Self {
            Self {
                key,
                data: MenuData::Empty,
                enter: Hook::Fetch(Query::PersonalFm),
                bottom: Hook::Fetch(Query::PersonalFm),
                top: Hook::Continue,
                allow_back: true,
            }
        }
    }

    fn track(id: u64) -> Track {
        Track {
            id,
            title: id.to_string(),
            artists: vec![],
            album: String::new(),
            duration_ms: 0,
            locator: String::new(),
        }
    }

    fn ids(from: u64, to: u64) -> Value {
        json!({ "ids": (from..to).collect::<Vec<_>>() })
    }

    impl MenuNode for Numbers {
        fn menu_key(&self) -> String {
            self.key.to_string()
        }
        fn title(&self) -> String {
            self.key.to_string()
        }
        fn data(&self) -> &MenuData {
            &self.data
        }
        fn sub_menu(&self, _index: usize, _ctx: &HookContext) -> Option<Box<dyn MenuNode>> {
            Some(Box::new(Numbers::new("child")))
        }
        fn before_enter(&mut self, _ctx: &HookContext) -> Hook {
            if !self.data.is_empty() {
                return Hook::Continue;
            }
            self.enter.clone()
        }
        fn bottom_out(&mut self, _ctx: &HookContext) -> Hook {
            self.bottom.clone()
        }
        fn top_out(&mut self, _ctx: &HookContext) -> Hook {
            self.top.clone()
        }
        fn before_back(&mut self, _ctx: &HookContext) -> bool {
            self.allow_back
        }
        fn absorb(&mut self, stage: HookStage, payload: &Value, _ctx: &HookContext) -> Result<usize, RemoteError> {
            let list = payload["ids"]
                .as_array()
                .ok_or_else(|| RemoteError::Malformed("ids".into()))?
                .iter()
                .filter_map(Value::as_u64)
                .map(track)
                .collect();
            let edge = if stage == HookStage::TopOut {
                crate::model::menu::Edge::Front
            } else {
                crate::model::menu::Edge::Back
            };
            Ok(self.data.extend(MenuData::Tracks(list), edge))
        }
    }

    fn ctx() -> HookContext {
        HookContext { page_size: 3, ..Default::default() }
    }

    fn loaded(key: &'static str, n: u64) -> Box<dyn MenuNode> {
        let mut node = Numbers::new(key);
        node.absorb(HookStage::Enter, &ids(0, n), &ctx()).unwrap();
        Box::new(node)
    }

    fn fetching(t: Transition) -> Ticket {
        match t {
            Transition::Fetching(ticket, _) => ticket,
            other => panic!("expected fetch, got {:?}", other),
        }
    }

    #[test]
    fn failed_enter_leaves_top_unchanged() {
        let mut nav = NavigationStack::new(loaded("root", 2), 3);
        let ticket = fetching(nav.enter_selected(&ctx()));
        assert!(nav.is_loading());

        let outcome = nav.complete(&ticket, Err(RemoteError::Status(500)), &ctx());

        assert_eq!(outcome, Completion::Failed(RemoteError::Status(500)));
        assert_eq!(nav.depth(), 1);
        assert_eq!(nav.top().node.menu_key(), "root");
        assert!(!nav.is_loading());
    }

    #[test]
    fn aborting_enter_is_rejected_synchronously() {
        let mut nav = NavigationStack::new(loaded("root", 1), 3);
        let mut child = Numbers::new("locked");
        child.enter = Hook::Abort;
        assert_eq!(nav.enter(Box::new(child), &ctx()), Transition::Rejected);
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn successful_enter_pushes_and_cached_reentry_needs_no_fetch() {
        let mut nav = NavigationStack::new(loaded("root", 1), 3);
        let ticket = fetching(nav.enter_selected(&ctx()));
        let outcome = nav.complete(&ticket, Ok(ids(0, 4)), &ctx());
        assert_eq!(outcome, Completion::Committed { stage: HookStage::Enter, added: 4 });
        assert_eq!(nav.top().node.menu_key(), "child");

        assert_eq!(nav.enter(loaded("cached", 2), &ctx()), Transition::Committed);
        assert_eq!(nav.depth(), 3);
    }

    #[test]
    fn bottom_out_appends_and_steps_onto_new_item() {
        let mut nav = NavigationStack::new(loaded("root", 3), 3);
        nav.select(2);
        let prefix = nav.top().node.data().tracks().to_vec();

        let ticket = fetching(nav.move_down(&ctx()));
        assert_eq!(ticket.stage, HookStage::BottomOut);
        let outcome = nav.complete(&ticket, Ok(ids(3, 5)), &ctx());

        assert_eq!(outcome, Completion::Committed { stage: HookStage::BottomOut, added: 2 });
        let data = nav.top().node.data();
        assert!(data.len() > prefix.len());
        assert_eq!(&data.tracks()[..3], &prefix[..]);
        assert_eq!(nav.top().selected, 3);
    }

    #[test]
    fn empty_bottom_out_does_not_advance() {
        let mut nav = NavigationStack::new(loaded("root", 3), 3);
        nav.select(2);
        let ticket = fetching(nav.next_page(&ctx()));
        assert_eq!(nav.complete(&ticket, Ok(ids(0, 0)), &ctx()), Completion::Exhausted);
        assert_eq!(nav.top().selected, 2);
    }

    #[test]
    fn top_out_prepend_keeps_cursor_on_same_entry() {
        let mut root = Numbers::new("root");
        root.top = Hook::Fetch(Query::PersonalFm);
        root.absorb(HookStage::Enter, &ids(10, 12), &ctx()).unwrap();
        let mut nav = NavigationStack::new(Box::new(root), 3);

        let ticket = fetching(nav.move_up(&ctx()));
        nav.complete(&ticket, Ok(ids(7, 10)), &ctx());

        let frame = nav.top();
        // cursor was on id 10 (index 0); three prepended, one step up lands on id 9
        assert_eq!(frame.node.data().tracks()[frame.selected].id, 9);
    }

    #[test]
    fn fetch_in_flight_blocks_further_fetches() {
        let mut nav = NavigationStack::new(loaded("root", 1), 3);
        let _ticket = fetching(nav.move_down(&ctx()));
        assert_eq!(nav.move_down(&ctx()), Transition::Ignored);
        assert_eq!(nav.next_page(&ctx()), Transition::Ignored);
        assert_eq!(nav.enter_selected(&ctx()), Transition::Ignored);
    }

    #[test]
    fn back_cancels_pending_and_late_result_is_stale() {
        let mut nav = NavigationStack::new(loaded("root", 1), 3);
        let ticket = fetching(nav.enter_selected(&ctx()));
        assert_eq!(nav.back(&ctx()), Transition::Cancelled);

        assert_eq!(nav.complete(&ticket, Ok(ids(0, 3)), &ctx()), Completion::Stale);
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn back_is_gated_and_never_pops_root() {
        let mut nav = NavigationStack::new(loaded("root", 1), 3);
        assert_eq!(nav.back(&ctx()), Transition::Ignored);

        let mut sticky = Numbers::new("sticky");
        sticky.allow_back = false;
        sticky.absorb(HookStage::Enter, &ids(0, 1), &ctx()).unwrap();
        assert_eq!(nav.enter(Box::new(sticky), &ctx()), Transition::Committed);
        assert_eq!(nav.back(&ctx()), Transition::Rejected);
        assert_eq!(nav.depth(), 2);
    }

    #[test]
    fn paging_moves_cursor_by_page() {
        let mut nav = NavigationStack::new(loaded("root", 7), 3);
        assert_eq!(nav.next_page(&ctx()), Transition::Committed);
        assert_eq!(nav.top().selected, 3);
        assert_eq!(nav.next_page(&ctx()), Transition::Committed);
        assert_eq!(nav.top().selected, 6);
        assert_eq!(nav.prev_page(&ctx()), Transition::Committed);
        assert_eq!(nav.top().selected, 3);
    }
}
