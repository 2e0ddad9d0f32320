use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use time::{Duration, OffsetDateTime};

use sb_core::domain::{Card, CoreImage, CoreMaterial};
use sb_core::error::EXPORT_EMPTY_SELECTION;
use sb_core::export::{export_json, export_pdf, JsonExportDocument};
use sb_core::render::render_cards;

fn fixed_now() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_760_000_000).expect("ts") + Duration::milliseconds(123)
}

fn cards() -> Vec<Card> {
    (1..=10)
        .map(|id| Card {
            id,
            title: format!("Card {id}"),
            essential_question: format!("Why does {id} matter?"),
            search_cues: vec!["cue a".to_string(), "cue b".to_string()],
            core: if id % 2 == 0 {
                CoreMaterial::Image(CoreImage {
                    url: format!("https://upload.wikimedia.org/{id}.jpg"),
                    caption: format!("caption {id}"),
                    source: "Wikimedia Commons".to_string(),
                    search_keyword: None,
                })
            } else {
                CoreMaterial::Text {
                    content: format!("evidence {id}"),
                }
            },
        })
        .collect()
}

fn selection(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[test]
fn json_export_round_trips_selected_cards_in_order() {
    let all = cards();
    let out = export_json(
        "Explain supply and demand",
        &all,
        &selection(&["5", "2"]),
        fixed_now(),
    )
    .expect("export");

    assert_eq!(out.filename, "sourcebook_1760000000123.json");

    let doc: JsonExportDocument = serde_json::from_str(&out.contents).expect("parse back");
    assert_eq!(doc.outcome, "Explain supply and demand");
    assert_eq!(doc.total_cards, doc.cards.len());
    assert_eq!(doc.total_cards, 2);
    assert_eq!(doc.cards, vec![all[1].clone(), all[4].clone()]);

    let parsed = time::OffsetDateTime::parse(
        &doc.generated_at,
        &time::format_description::well_known::Rfc3339,
    )
    .expect("rfc3339");
    assert_eq!(parsed, fixed_now());
}

#[test]
fn json_export_uses_two_space_indent_and_wire_field_names() {
    let out = export_json("o", &cards(), &selection(&["2"]), fixed_now()).expect("export");
    assert!(out.contents.starts_with("{\n  \"outcome\": \"o\",\n  \"generatedAt\": "));
    assert!(out.contents.contains("\n  \"totalCards\": 1,"));
    assert!(out.contents.contains("\"essentialQuestion\""));
    assert!(out.contents.contains("\"coreImage\""));
}

#[test]
fn empty_selection_generates_nothing() {
    let all = cards();
    let err = export_json("o", &all, &BTreeSet::new(), fixed_now()).expect_err("json");
    assert_eq!(err.code, EXPORT_EMPTY_SELECTION);
    let err = export_pdf("o", &all, &BTreeSet::new(), fixed_now()).expect_err("pdf");
    assert_eq!(err.code, EXPORT_EMPTY_SELECTION);

    // Stale ids that are not in the card set count as nothing selected.
    let err = export_pdf("o", &all, &selection(&["42"]), fixed_now()).expect_err("stale");
    assert_eq!(err.code, EXPORT_EMPTY_SELECTION);
}

#[test]
fn pdf_export_layout_and_order() {
    let out = export_pdf(
        "Line one\nLine <two>",
        &cards(),
        &selection(&["5", "2"]),
        fixed_now(),
    )
    .expect("export");

    assert_eq!(out.filename, "sourcebook_1760000000123.pdf");
    assert_eq!(out.options.filename, out.filename);
    assert_eq!(out.options.margin, 10);
    assert_eq!(out.options.html2canvas.scale, 2);
    assert_eq!(out.options.js_pdf.format, "a4");
    assert_eq!(out.options.js_pdf.orientation, "portrait");
    assert_eq!(out.options.js_pdf.unit, "mm");

    let v = serde_json::to_value(&out.options).expect("options json");
    assert_eq!(v["jsPDF"]["format"], "a4");
    assert_eq!(v["image"]["type"], "jpeg");

    assert!(out.html.starts_with("<style>"));
    assert!(out.html.contains("Line one\nLine &lt;two&gt;"));
    let two = out.html.find(">Card 2<").expect("card 2");
    let five = out.html.find(">Card 5<").expect("card 5");
    assert!(two < five);
    // Display numbering restarts for the export.
    assert!(out.html.contains(r#"<div class="card-number">Card 1</div><div class="card-title">Card 2</div>"#));
    assert!(out.html.contains("https://upload.wikimedia.org/2.jpg"));
    assert!(out.html.contains("evidence 5"));
    assert!(!out.html.contains("evidence 3"));
}

#[test]
fn script_title_is_inert_on_screen_and_in_export() {
    let mut all = cards();
    all[0].title = "<script>alert('x')</script>".to_string();

    let screen = render_cards(&all, &BTreeSet::new());
    let pdf = export_pdf("o", &all, &selection(&["1"]), fixed_now()).expect("export");

    for html in [screen, pdf.html] {
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#039;x&#039;)&lt;/script&gt;"));
    }
}
