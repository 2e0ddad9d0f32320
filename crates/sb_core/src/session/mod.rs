//! Client-side application state for one page session.
//!
//! The page holds exactly one [`Session`]. Network calls happen outside: `begin_*` returns the
//! input to send, `finish_*` applies the response. Selection changes go through the pure
//! [`next_selection`] so they can be tested without a rendering surface.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::{Card, RefinementResult};
use crate::error::{AppError, AI_PARSE_FAILED, REQUEST_IN_FLIGHT};
use crate::render::selected_label;
use crate::validate::{require_draft, require_outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Requesting,
    /// Cards are on screen.
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum RefinePhase {
    Idle,
    Requesting,
    Preview {
        before: String,
        result: RefinementResult,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollTarget {
    Top,
    Cards,
}

/// Which element of a card received the click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Card,
    Checkbox,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    Click { card_id: String, target: ClickTarget },
    CheckboxChanged { card_id: String, checked: bool },
}

/// Compute the selection after one UI event.
///
/// - A click on the card body flips membership once.
/// - A click on the checkbox is a no-op here; the checkbox's own change event carries the new
///   state, so the card never double-toggles.
/// - Ids not present in `cards` are ignored, keeping the selection a subset of the card set.
pub fn next_selection(
    cards: &[Card],
    selection: &BTreeSet<String>,
    event: &SelectionEvent,
) -> BTreeSet<String> {
    let mut next = selection.clone();
    let known = |id: &str| cards.iter().any(|c| c.selection_key() == id);

    match event {
        SelectionEvent::Click { card_id, target } => {
            if *target == ClickTarget::Checkbox || !known(card_id) {
                return next;
            }
            if !next.remove(card_id) {
                next.insert(card_id.clone());
            }
        }
        SelectionEvent::CheckboxChanged { card_id, checked } => {
            if !known(card_id) {
                return next;
            }
            if *checked {
                next.insert(card_id.clone());
            } else {
                next.remove(card_id);
            }
        }
    }
    next
}

/// Selected cards in original sequence order.
pub fn selected_cards<'a>(cards: &'a [Card], selection: &BTreeSet<String>) -> Vec<&'a Card> {
    cards
        .iter()
        .filter(|c| selection.contains(&c.selection_key()))
        .collect()
}

/// Everything the page needs to draw the controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub generate_enabled: bool,
    pub loading_visible: bool,
    pub error: Option<String>,
    pub cards_visible: bool,
    pub selected_count: usize,
    pub selected_label: String,
    pub export_enabled: bool,
    pub refine_enabled: bool,
    pub refine_loading_visible: bool,
    pub refine_preview: Option<RefinementPreview>,
    pub scroll: Option<ScrollTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefinementPreview {
    pub before: String,
    pub after: String,
    pub changes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Current contents of the outcome input.
    pub outcome_input: String,
    cards: Vec<Card>,
    selection: BTreeSet<String>,
    phase: Phase,
    refine: RefinePhase,
    error: Option<String>,
    scroll: Option<ScrollTarget>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            outcome_input: String::new(),
            cards: Vec::new(),
            selection: BTreeSet::new(),
            phase: Phase::Idle,
            refine: RefinePhase::Idle,
            error: None,
            scroll: None,
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn refine_phase(&self) -> &RefinePhase {
        &self.refine
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.scroll = Some(ScrollTarget::Top);
    }

    /// Start a generation request. Returns the trimmed outcome to send.
    ///
    /// A blank input surfaces a validation error and leaves the phase untouched, so no request is
    /// made and the generate control stays enabled.
    pub fn begin_generate(&mut self) -> Result<String, AppError> {
        if self.phase == Phase::Requesting {
            return Err(AppError::new(
                REQUEST_IN_FLIGHT,
                "A generation request is already in progress",
            ));
        }
        let outcome = match require_outcome(Some(self.outcome_input.as_str())) {
            Ok(o) => o,
            Err(e) => {
                self.fail(e.message.clone());
                return Err(e);
            }
        };
        self.phase = Phase::Requesting;
        self.error = None;
        self.scroll = None;
        Ok(outcome)
    }

    /// Apply the result of a generation request. All-or-nothing: on failure the previous card set
    /// stays as it was.
    pub fn finish_generate(&mut self, result: Result<Vec<Card>, AppError>) {
        let had_cards = !self.cards.is_empty();
        let back = if had_cards { Phase::Ready } else { Phase::Idle };

        match result {
            Ok(cards) if cards.is_empty() => {
                self.phase = back;
                self.fail("No cards were generated");
            }
            Ok(cards) => {
                self.cards = cards;
                self.selection.clear();
                self.phase = Phase::Ready;
                self.error = None;
                self.scroll = Some(ScrollTarget::Cards);
            }
            Err(e) => {
                self.phase = back;
                self.fail(e.user_message());
            }
        }
    }

    pub fn apply_selection(&mut self, event: &SelectionEvent) {
        self.selection = next_selection(&self.cards, &self.selection, event);
    }

    pub fn selected_cards(&self) -> Vec<&Card> {
        selected_cards(&self.cards, &self.selection)
    }

    /// Start a refinement request. Returns the trimmed draft to send.
    pub fn begin_refine(&mut self) -> Result<String, AppError> {
        if self.refine == RefinePhase::Requesting {
            return Err(AppError::new(
                REQUEST_IN_FLIGHT,
                "A refinement request is already in progress",
            ));
        }
        let draft = match require_draft(Some(self.outcome_input.as_str())) {
            Ok(d) => d,
            Err(e) => {
                self.fail(e.message.clone());
                return Err(e);
            }
        };
        self.refine = RefinePhase::Requesting;
        self.error = None;
        self.scroll = None;
        Ok(draft)
    }

    pub fn finish_refine(&mut self, result: Result<RefinementResult, AppError>) {
        match result {
            Ok(r) if r.refined.trim().is_empty() => {
                self.refine = RefinePhase::Idle;
                self.fail(
                    AppError::new(AI_PARSE_FAILED, "Refinement returned no text").user_message(),
                );
            }
            Ok(r) => {
                self.refine = RefinePhase::Preview {
                    before: self.outcome_input.clone(),
                    result: r,
                };
            }
            Err(e) => {
                self.refine = RefinePhase::Idle;
                self.fail(e.user_message());
            }
        }
    }

    /// Overwrite the outcome input with the refined text and hide the preview.
    pub fn apply_refinement(&mut self) {
        if let RefinePhase::Preview { result, .. } = &self.refine {
            self.outcome_input = result.refined.clone();
        }
        self.refine = RefinePhase::Idle;
    }

    /// Hide the preview without touching the outcome input.
    pub fn dismiss_refinement(&mut self) {
        if matches!(self.refine, RefinePhase::Preview { .. }) {
            self.refine = RefinePhase::Idle;
        }
    }

    /// Project the state onto the page controls. Consumes the pending scroll request.
    pub fn view(&mut self) -> ViewState {
        let count = self.selection.len();
        let refine_preview = match &self.refine {
            RefinePhase::Preview { before, result } => Some(RefinementPreview {
                before: before.clone(),
                after: result.refined.clone(),
                changes: result.changes.clone(),
            }),
            _ => None,
        };
        ViewState {
            generate_enabled: self.phase != Phase::Requesting,
            loading_visible: self.phase == Phase::Requesting,
            error: self.error.clone(),
            cards_visible: self.phase == Phase::Ready
                || (self.phase == Phase::Requesting && !self.cards.is_empty()),
            selected_count: count,
            selected_label: selected_label(count),
            export_enabled: count > 0,
            refine_enabled: self.refine != RefinePhase::Requesting,
            refine_loading_visible: self.refine == RefinePhase::Requesting,
            refine_preview,
            scroll: self.scroll.take(),
        }
    }
}
