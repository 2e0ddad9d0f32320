use std::collections::HashSet;

use serde_json::Value;

use sb_core::domain::{Card, CardsPayload, RefinementResult, WireCard};
use sb_core::error::{AppError, AI_GENERATION_FAILED, AI_PARSE_FAILED};
use sb_core::validate::{require_draft, require_outcome};

use crate::extract::extract_json;
use crate::llm::Llm;

pub mod prompts;

const GENERATION_FAILED: &str = "Card generation failed";
const REFINEMENT_FAILED: &str = "Outcome refinement failed";

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}

fn call_provider(
    llm: &dyn Llm,
    model: &str,
    prompt: &str,
    failure: &str,
) -> Result<String, AppError> {
    let raw = llm.generate(model, prompt).map_err(|e| {
        AppError::new(AI_GENERATION_FAILED, failure)
            .with_details(e.user_message())
            .with_retryable(e.retryable)
    })?;
    log::info!("Raw response length: {} characters", raw.chars().count());
    Ok(raw)
}

fn extract_value(raw: &str, failure: &str) -> Result<Value, AppError> {
    match extract_json(raw) {
        Ok((value, source)) => {
            log::info!("Found JSON in {source}");
            Ok(value)
        }
        Err(e) => {
            log::warn!("Could not extract JSON from response: {:?}", preview(raw));
            Err(e.into_app_error(failure))
        }
    }
}

/// Normalize an extracted payload into cards.
///
/// Accepts `{ "cards": [...] }` or a bare array. An object without `cards` yields no cards; the
/// caller decides whether that is an error. Card counts and cue counts are passed through; ids
/// are made unique.
pub fn parse_cards_payload(value: Value) -> Result<Vec<Card>, AppError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("cards") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(AppError::new(AI_PARSE_FAILED, GENERATION_FAILED)
                    .with_details(format!("\"cards\" is not an array: {}", json_type(&other))))
            }
        },
        other => {
            return Err(AppError::new(AI_PARSE_FAILED, GENERATION_FAILED)
                .with_details(format!("unexpected JSON type: {}", json_type(&other))))
        }
    };

    let wires = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            if !item.is_object() {
                return Err(AppError::new(AI_PARSE_FAILED, GENERATION_FAILED)
                    .with_details(format!("card {} is not an object", idx + 1)));
            }
            serde_json::from_value::<WireCard>(item).map_err(|e| {
                AppError::new(AI_PARSE_FAILED, GENERATION_FAILED)
                    .with_details(format!("card {}: {e}", idx + 1))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(assign_unique_ids(wires))
}

/// Normalize cards so every id is unique within the set.
///
/// The first card claiming an explicit id keeps it. A card with no id, or repeating an earlier
/// id, gets its 1-based position when that is free, otherwise the next unused integer.
fn assign_unique_ids(wires: Vec<WireCard>) -> Vec<Card> {
    let mut taken: HashSet<i64> = wires.iter().filter_map(|w| w.id).collect();
    let mut seen = HashSet::new();

    wires
        .into_iter()
        .enumerate()
        .map(|(idx, mut wire)| {
            let position = idx as i64 + 1;
            let id = match wire.id {
                Some(id) if seen.insert(id) => id,
                original => {
                    let mut id = position;
                    while taken.contains(&id) || seen.contains(&id) {
                        id += 1;
                    }
                    if let Some(dup) = original {
                        log::warn!("Card {position} repeats id {dup}; renumbered to {id}");
                    }
                    taken.insert(id);
                    seen.insert(id);
                    id
                }
            };
            wire.id = Some(id);
            Card::from_wire(wire, idx + 1)
        })
        .collect()
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Generate study cards for a learning outcome with a single provider call.
pub fn generate_cards(llm: &dyn Llm, model: &str, outcome: &str) -> Result<CardsPayload, AppError> {
    let outcome = require_outcome(Some(outcome))?;
    log::info!("Generating cards for outcome: {}...", preview(&outcome));

    let prompt = prompts::generation_prompt(&outcome);
    let raw = call_provider(llm, model, &prompt, GENERATION_FAILED)?;
    let value = extract_value(&raw, GENERATION_FAILED)?;
    let cards = parse_cards_payload(value)?;

    log::info!("Found {} cards", cards.len());
    Ok(CardsPayload { cards })
}

/// Turn a draft outcome into a refined one plus a description of the changes.
pub fn refine_outcome(llm: &dyn Llm, model: &str, draft: &str) -> Result<RefinementResult, AppError> {
    let draft = require_draft(Some(draft))?;
    log::info!("Refining outcome draft: {}...", preview(&draft));

    let prompt = prompts::refinement_prompt(&draft);
    let raw = call_provider(llm, model, &prompt, REFINEMENT_FAILED)?;
    let value = extract_value(&raw, REFINEMENT_FAILED)?;

    let result: RefinementResult = serde_json::from_value(value).map_err(|e| {
        AppError::new(AI_PARSE_FAILED, REFINEMENT_FAILED).with_details(e.to_string())
    })?;
    if result.refined.trim().is_empty() {
        return Err(AppError::new(AI_PARSE_FAILED, REFINEMENT_FAILED)
            .with_details("\"refined\" is empty"));
    }
    Ok(result)
}
