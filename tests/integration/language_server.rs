//! Language server features over parsed documents

use sand::lsp::analysis::{completions, definition, hover};
use sand::lsp::diagnostics::diagnostics;
use sand::lsp::position::{offset_to_position, position_to_offset};

const DOC: &str = "#(en, ja)\n#日本# 見出し\n";

#[test]
fn test_diagnostics_use_utf16_columns() {
    let text = "#(en, ja)\n#[あ][い]\n「#.nope.」\n";
    let diags = diagnostics(text);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].range.start.line, 2);
    assert_eq!(diags[0].range.start.character, 1);
    assert_eq!(diags[0].range.end.character, 8);
}

#[test]
fn test_stray_hash_is_reported() {
    let diags = diagnostics(DOC);
    assert!(!diags.is_empty());
    assert!(diags.iter().all(|d| d.source.as_deref() == Some("sand")));
}

#[test]
fn test_hover_and_definition_agree() {
    let text = "#(en, ja)\n#top# Top\n#s[One][一]\n見る: #.top.s.\n";
    let offset = text.find("#.top").unwrap() + 2;
    let position = offset_to_position(text, offset);
    let offset = position_to_offset(text, position).unwrap();

    let (value, _) = hover(text, offset).unwrap();
    assert_eq!(value, "- **en**: One\n- **ja**: 一");

    let span = definition(text, offset).unwrap();
    assert_eq!(&text[span.start..span.end], "#s[One][一]");
}

#[test]
fn test_completion_offers_names_and_children() {
    let text = "#(en, ja)\n#top# Top\n#s[One][一]\n#.top.";
    let labels: Vec<_> = completions(text, text.len())
        .into_iter()
        .map(|item| item.label)
        .collect();
    assert_eq!(labels, vec!["s", "0", "en", "ja"]);
}
