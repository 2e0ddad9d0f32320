//! HTML projection of cards for the on-screen card grid.
//!
//! Everything here is a pure function of the card list and the selection; the page only swaps the
//! returned fragments in.

use std::collections::BTreeSet;

use crate::domain::{Card, CoreMaterial};

pub(crate) const UNKNOWN_SOURCE: &str = "Unknown source";

/// Escape the five HTML-significant characters. Applied to every user- or model-supplied string,
/// including attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn render_cue_tags(cues: &[String]) -> String {
    cues.iter()
        .map(|cue| format!(r#"<span class="cue-tag">{}</span>"#, escape_html(cue)))
        .collect::<Vec<_>>()
        .join("")
}

fn render_core_material(core: &CoreMaterial) -> String {
    match core {
        CoreMaterial::None => String::new(),
        CoreMaterial::Image(img) => {
            let source = if img.source.is_empty() {
                UNKNOWN_SOURCE
            } else {
                img.source.as_str()
            };
            let media = if img.url.is_empty() {
                r#"<div class="card-image-placeholder">Image unavailable</div>"#.to_string()
            } else {
                format!(
                    r#"<img src="{}" alt="{}" class="card-image" loading="lazy" />"#,
                    escape_html(&img.url),
                    escape_html(&img.caption)
                )
            };
            let caption = if img.caption.is_empty() {
                String::new()
            } else {
                format!(r#"<div class="card-content">{}</div>"#, escape_html(&img.caption))
            };
            format!(
                r#"<div class="card-image-container">{media}<div class="card-section"><div class="card-label">Core Material</div>{caption}<div class="card-source">Source: {}</div></div></div>"#,
                escape_html(source)
            )
        }
        CoreMaterial::Text { content } => format!(
            r#"<div class="card-section"><div class="card-label">Core Material</div><div class="card-content">{}</div></div>"#,
            escape_html(content)
        ),
    }
}

/// Render one card. `number` is the 1-based display position, independent of the card id.
pub fn render_card(card: &Card, number: usize, selected: bool) -> String {
    let key = escape_html(&card.selection_key());
    let class = if selected { "card selected" } else { "card" };
    let checked = if selected { " checked" } else { "" };

    format!(
        concat!(
            r#"<div class="{class}" data-card-id="{key}">"#,
            r#"<input type="checkbox" class="card-checkbox" data-card-id="{key}"{checked} />"#,
            "{core}",
            r#"<div class="card-number">Card {number}</div>"#,
            r#"<div class="card-title">{title}</div>"#,
            r#"<div class="card-section"><div class="card-label">Essential Question</div><div class="card-content">{question}</div></div>"#,
            r#"<div class="card-section"><div class="card-label">Search Cues</div><div class="search-cues">{cues}</div></div>"#,
            "</div>"
        ),
        class = class,
        key = key,
        checked = checked,
        core = render_core_material(&card.core),
        number = number,
        title = escape_html(&card.title),
        question = escape_html(&card.essential_question),
        cues = render_cue_tags(&card.search_cues),
    )
}

/// Render the whole card grid in sequence order.
pub fn render_cards(cards: &[Card], selection: &BTreeSet<String>) -> String {
    cards
        .iter()
        .enumerate()
        .map(|(idx, card)| render_card(card, idx + 1, selection.contains(&card.selection_key())))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Counter text shown next to the export controls.
pub fn selected_label(count: usize) -> String {
    format!("{count} selected")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CoreImage;

    fn card(id: i64, title: &str, core: CoreMaterial) -> Card {
        Card {
            id,
            title: title.to_string(),
            essential_question: "Why?".to_string(),
            search_cues: vec!["a & b".to_string()],
            core,
        }
    }

    #[test]
    fn escapes_all_five_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn script_titles_render_as_text() {
        let html = render_card(&card(1, "<script>alert(1)</script>", CoreMaterial::None), 1, false);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains(r#"<span class="cue-tag">a &amp; b</span>"#));
    }

    #[test]
    fn image_without_url_shows_placeholder_and_unknown_source() {
        let html = render_card(
            &card(
                1,
                "t",
                CoreMaterial::Image(CoreImage {
                    caption: "cap".to_string(),
                    ..CoreImage::default()
                }),
            ),
            1,
            false,
        );
        assert!(html.contains("card-image-placeholder"));
        assert!(html.contains("Source: Unknown source"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn image_attributes_are_escaped() {
        let html = render_card(
            &card(
                1,
                "t",
                CoreMaterial::Image(CoreImage {
                    url: r#"https://x.org/a.jpg" onerror="alert(1)"#.to_string(),
                    caption: "cap".to_string(),
                    source: "Wikimedia Commons".to_string(),
                    search_keyword: None,
                }),
            ),
            1,
            false,
        );
        assert!(html.contains(r#"src="https://x.org/a.jpg&quot; onerror=&quot;alert(1)""#));
    }

    #[test]
    fn numbering_follows_sequence_and_marks_selection() {
        let cards = vec![
            card(10, "first", CoreMaterial::None),
            card(20, "second", CoreMaterial::Text { content: "evidence".to_string() }),
        ];
        let selection: BTreeSet<String> = ["20".to_string()].into_iter().collect();
        let html = render_cards(&cards, &selection);
        let first = html.find("Card 1").expect("card 1");
        let second = html.find("Card 2").expect("card 2");
        assert!(first < second);
        assert!(html.contains(r#"<div class="card selected" data-card-id="20">"#));
        assert!(html.contains(r#"<div class="card" data-card-id="10">"#));
        assert!(html.contains("evidence"));
    }
}
