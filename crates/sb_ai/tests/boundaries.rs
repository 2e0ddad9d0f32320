use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(p) = stack.pop() {
        let entries = match fs::read_dir(&p) {
            Ok(e) => e,
            Err(_) => continue,
        };
        for ent in entries.flatten() {
            let path = ent.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

#[test]
fn sb_ai_does_not_depend_on_presentation_modules() {
    // Guardrail: the gateway returns data only. Rendering, selection state and export documents
    // live in sb_core and must never be produced from model-facing code.
    let src_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
    let files = collect_rs_files(&src_root);
    assert!(!files.is_empty());

    for f in files {
        let text = fs::read_to_string(&f).unwrap_or_default();
        for forbidden in ["sb_core::render", "sb_core::export", "sb_core::session"] {
            assert!(
                !text.contains(forbidden),
                "forbidden dependency {forbidden} found in {}",
                f.display()
            );
        }
    }
}

#[test]
fn provider_api_key_never_travels_in_the_url() {
    let src_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
    for f in collect_rs_files(&src_root) {
        let text = fs::read_to_string(&f).unwrap_or_default();
        assert!(
            !text.contains("?key="),
            "API key must be sent as a header, found query key in {}",
            f.display()
        );
    }
}
