use blocksift::{extract, extract_with_context, preprocess, ContentZones, Metadata, SelectorList};

fn metadata_with_main(css: &[&str]) -> Metadata {
    Metadata {
        content_zones: ContentZones {
            main: SelectorList::from_css(css.iter().copied()),
            ..ContentZones::default()
        },
        ..Metadata::default()
    }
}

#[test]
fn doubled_angle_brackets_sanitize_and_extract() {
    let html = "<<p>>Text<<</p>>";
    let pre = preprocess(html);

    assert_eq!(pre.sanitized_html, "<p>Text</p>");
    assert!(pre
        .warnings
        .iter()
        .any(|w| w.contains("double angle brackets")));
    assert!(pre
        .anomalies
        .contains(&"double_angle_brackets".to_string()));

    let result = extract(&pre.normalized_html, &Metadata::default());
    assert_eq!(result.blocks.len(), 1);
    assert_eq!(result.blocks[0].tag, "p");
    assert_eq!(result.blocks[0].text, "Text");
}

#[test]
fn null_bytes_are_removed_before_parsing() {
    let html = "<div id=\"m\"><p>be\0fore</p></div>";
    let pre = preprocess(html);

    assert!(!pre.sanitized_html.contains('\0'));
    assert!(pre.warnings.iter().any(|w| w.contains("NULL bytes")));

    let result = extract(&pre.normalized_html, &metadata_with_main(&["#m"]));
    assert_eq!(result.blocks[0].text, "before");
}

#[test]
fn stray_angle_bracket_in_text_is_escaped_not_parsed() {
    let html = r#"<div id="m"><p>5 < 10 is true</p></div>"#;
    let pre = preprocess(html);
    assert!(pre.sanitized_html.contains("&lt;"));

    let result = extract(&pre.normalized_html, &metadata_with_main(&["#m"]));
    assert_eq!(result.blocks.len(), 1);
    // Raw keeps the literal bracket; cleaning strips it as markup garbage.
    assert_eq!(result.blocks[0].raw, "5 < 10 is true");
}

#[test]
fn double_equals_attribute_is_repaired() {
    let html = r#"<div id="m"><p><a href=="/path">link</a></p></div>"#;
    let pre = preprocess(html);
    assert!(pre
        .warnings
        .iter()
        .any(|w| w.contains("double equals")));
    assert!(pre
        .anomalies
        .contains(&"malformed_href_attribute".to_string()));

    let result = extract(&pre.normalized_html, &metadata_with_main(&["#m"]));
    assert_eq!(result.blocks[0].links[0].href, "/path");
    assert_eq!(result.blocks[0].links[0].text, "link");
}

#[test]
fn control_characters_are_stripped() {
    let html = "<div id=\"m\"><p>a\u{1}b\u{8}c</p></div>";
    let pre = preprocess(html);
    assert!(pre.warnings.iter().any(|w| w.contains("control characters")));

    let result = extract(&pre.normalized_html, &metadata_with_main(&["#m"]));
    assert_eq!(result.blocks[0].text, "abc");
}

#[test]
fn empty_input_returns_warning_not_panic() {
    let result = extract("", &metadata_with_main(&["#m"]));
    assert!(result.blocks.is_empty());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("No content blocks extracted")));
}

#[test]
fn garbage_input_returns_result() {
    let result = extract(">>>???<<<&&&", &Metadata::default());
    assert!(result.blocks.is_empty());
    assert!(!result.warnings.is_empty());
}

#[test]
fn orphan_closing_tags_are_flagged_and_survivable() {
    let html = r#"<div id="m"><p>text</p></div></div></span>"#;
    let pre = preprocess(html);
    assert!(pre.anomalies.contains(&"orphan_closing_div".to_string()));
    assert!(pre.anomalies.contains(&"orphan_closing_span".to_string()));

    let result = extract(&pre.normalized_html, &metadata_with_main(&["#m"]));
    assert_eq!(result.blocks[0].text, "text");
}

#[test]
fn event_handler_attributes_are_flagged() {
    let pre = preprocess(r#"<div id="m" onclick="track()"><p>x</p></div>"#);
    assert!(pre.anomalies.contains(&"has_event_handlers".to_string()));
}

#[test]
fn external_script_sources_are_recorded_not_extracted() {
    let html = r#"
        <html><body>
            <div id="m"><p>content</p></div>
            <script src="https://cdn.example/track.js"></script>
        </body></html>
    "#;
    let pre = preprocess(html);
    assert_eq!(pre.script_sources, vec!["https://cdn.example/track.js"]);
    assert!(pre.recovered_scripts.is_empty());
}

#[test]
fn stripped_script_and_style_counts_are_reported() {
    let html = r#"
        <html><head><style>p { margin: 0 }</style></head><body>
            <div id="m"><p>content</p></div>
            <script>var a = 1;</script>
            <script>var b = 2;</script>
        </body></html>
    "#;
    let pre = preprocess(html);

    assert!(pre
        .warnings
        .iter()
        .any(|w| w == "Removed content from 2 script tags"));
    assert!(pre
        .warnings
        .iter()
        .any(|w| w == "Removed content from 1 style tags"));
}

#[test]
fn clean_documents_report_no_strip_warnings() {
    let pre = preprocess(r#"<div id="m"><p>plain</p></div>"#);
    assert!(!pre.warnings.iter().any(|w| w.contains("Removed content from")));
}

#[test]
fn style_payloads_do_not_leak_into_blocks() {
    let html = r#"
        <html><body>
            <div id="m"><p>real</p></div>
            <style>#m p { color: red }</style>
        </body></html>
    "#;
    let pre = preprocess(html);
    let result = extract(&pre.normalized_html, &metadata_with_main(&["#m"]));

    assert_eq!(result.blocks.len(), 1);
    assert_eq!(result.blocks[0].text, "real");
    assert!(!pre.normalized_html.contains("color: red"));
}

#[test]
fn single_quoted_document_write_recovers() {
    let html = r#"<html><body><script>document.write('<div>late content</div>');</script></body></html>"#;
    let pre = preprocess(html);
    assert_eq!(pre.recovered_scripts, vec!["<div>late content</div>"]);
}

#[test]
fn escaped_quotes_in_document_write_recover_links() {
    let html = r#"<html><body><script>document.write("<a href=\"/deep\">deep</a>");</script></body></html>"#;
    let pre = preprocess(html);

    let context = blocksift::ExtractionContext {
        declared_charset: None,
        script_content: pre.recovered_scripts.clone(),
    };
    let result = extract_with_context(&pre.normalized_html, &Metadata::default(), &context);

    let script_block = result
        .blocks
        .iter()
        .find(|b| b.tag.starts_with("script:"))
        .expect("recovered block");
    assert_eq!(script_block.tag, "script:a");
    assert_eq!(script_block.links[0].href, "/deep");
    assert_eq!(script_block.links[0].text, "deep");
}
