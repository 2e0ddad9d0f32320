use serde::{Deserialize, Deserializer, Serialize};

/// Canonical study card.
///
/// Notes:
/// - Provider output comes in two legacy shapes (`coreImage` vs `primaryEvidence`). Both are
///   normalized once into [`CoreMaterial`] on ingestion; render and export sites never branch on
///   the raw JSON.
/// - On the wire the legacy shape is preserved so existing clients keep working.
/// - `search_cues` length is passed through unchanged (three is recommended, not enforced).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireCard", into = "WireCard")]
pub struct Card {
    pub id: i64,
    pub title: String,
    pub essential_question: String,
    pub search_cues: Vec<String>,
    pub core: CoreMaterial,
}

impl Card {
    /// Normalize a provider card. `position` is the 1-based index used when the provider omitted
    /// the id.
    pub fn from_wire(wire: WireCard, position: usize) -> Self {
        let id = wire.id.unwrap_or(position as i64);
        let core = match (wire.core_image, wire.primary_evidence) {
            (Some(img), _) => CoreMaterial::Image(CoreImage {
                url: img.url,
                caption: img.caption,
                source: img.source,
                search_keyword: img.image_search_keyword.filter(|k| !k.trim().is_empty()),
            }),
            (None, Some(text)) if !text.is_empty() => CoreMaterial::Text { content: text },
            _ => CoreMaterial::None,
        };
        Self {
            id,
            title: wire.title,
            essential_question: wire.essential_question,
            search_cues: wire.search_cues,
            core,
        }
    }

    /// Identifier as held in a selection set.
    pub fn selection_key(&self) -> String {
        self.id.to_string()
    }
}

/// The "core material" payload of a card.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CoreMaterial {
    #[default]
    None,
    Image(CoreImage),
    Text {
        content: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoreImage {
    /// Empty when no image could be resolved.
    pub url: String,
    pub caption: String,
    pub source: String,
    /// Provider hint for image lookup. Never sent to clients.
    pub search_keyword: Option<String>,
}

/// Card as it appears in provider output, HTTP payloads and JSON exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCard {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "string_or_null")]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub essential_question: String,
    #[serde(default, deserialize_with = "strings_or_null")]
    pub search_cues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_image: Option<WireImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_evidence: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireImage {
    #[serde(default, deserialize_with = "string_or_null")]
    pub url: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub caption: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_search_keyword: Option<String>,
}

impl TryFrom<WireCard> for Card {
    type Error = String;

    fn try_from(wire: WireCard) -> Result<Self, Self::Error> {
        if wire.id.is_none() {
            return Err("card is missing an id".to_string());
        }
        Ok(Card::from_wire(wire, 0))
    }
}

impl From<Card> for WireCard {
    fn from(card: Card) -> Self {
        let (core_image, primary_evidence) = match card.core {
            CoreMaterial::None => (None, None),
            CoreMaterial::Image(img) => (
                Some(WireImage {
                    url: img.url,
                    caption: img.caption,
                    source: img.source,
                    image_search_keyword: None,
                }),
                None,
            ),
            CoreMaterial::Text { content } => (None, Some(content)),
        };
        Self {
            id: Some(card.id),
            title: card.title,
            essential_question: card.essential_question,
            search_cues: card.search_cues,
            core_image,
            primary_evidence,
        }
    }
}

/// Successful generation payload: `{ "cards": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardsPayload {
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementResult {
    pub refined: String,
    #[serde(default)]
    pub changes: String,
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<IdRepr>::deserialize(deserializer)? {
        None => None,
        Some(IdRepr::Int(n)) => Some(n),
        Some(IdRepr::Float(f)) if f.fract() == 0.0 => Some(f as i64),
        Some(IdRepr::Float(_)) => None,
        Some(IdRepr::Text(s)) => s.trim().parse().ok(),
    })
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn strings_or_null<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_image_wins_over_primary_evidence() {
        let wire: WireCard = serde_json::from_str(
            r#"{"id":3,"title":"t","essentialQuestion":"q","searchCues":["a"],
                "coreImage":{"caption":"c","source":"Wikimedia Commons","imageSearchKeyword":"Bell telephone 1876"},
                "primaryEvidence":"ignored"}"#,
        )
        .expect("parse");
        let card = Card::from_wire(wire, 1);
        match card.core {
            CoreMaterial::Image(img) => {
                assert_eq!(img.url, "");
                assert_eq!(img.search_keyword.as_deref(), Some("Bell telephone 1876"));
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn empty_primary_evidence_is_no_material() {
        let wire: WireCard =
            serde_json::from_str(r#"{"id":1,"title":"t","primaryEvidence":""}"#).expect("parse");
        assert_eq!(Card::from_wire(wire, 1).core, CoreMaterial::None);
    }

    #[test]
    fn missing_id_falls_back_to_position_and_nulls_default() {
        let wire: WireCard =
            serde_json::from_str(r#"{"title":null,"essentialQuestion":"q","searchCues":null}"#)
                .expect("parse");
        let card = Card::from_wire(wire, 7);
        assert_eq!(card.id, 7);
        assert_eq!(card.title, "");
        assert!(card.search_cues.is_empty());
    }

    #[test]
    fn string_ids_are_accepted() {
        let wire: WireCard = serde_json::from_str(r#"{"id":"4"}"#).expect("parse");
        assert_eq!(wire.id, Some(4));
    }

    #[test]
    fn wire_output_keeps_legacy_shape_and_drops_keyword() {
        let card = Card {
            id: 2,
            title: "Bell".to_string(),
            essential_question: "Why?".to_string(),
            search_cues: vec!["cue".to_string()],
            core: CoreMaterial::Image(CoreImage {
                url: "https://example.org/a.jpg".to_string(),
                caption: "caption".to_string(),
                source: "Wikimedia Commons".to_string(),
                search_keyword: Some("kw".to_string()),
            }),
        };
        let v = serde_json::to_value(&card).expect("serialize");
        assert_eq!(v["id"], 2);
        assert_eq!(v["essentialQuestion"], "Why?");
        assert_eq!(v["coreImage"]["url"], "https://example.org/a.jpg");
        assert!(v["coreImage"].get("imageSearchKeyword").is_none());
        assert!(v.get("primaryEvidence").is_none());
    }

    #[test]
    fn client_cards_require_an_id() {
        let err = serde_json::from_str::<Card>(r#"{"title":"no id"}"#).expect_err("should fail");
        assert!(err.to_string().contains("missing an id"));
    }
}
