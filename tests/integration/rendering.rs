//! Integration tests for parse -> select -> render

use sand::render::{Format, RenderError, render};
use sand::{Parser, parse_selector, render_markdown, render_plain};

const ESSAY: &str = r"#(en, ja)

#intro# Introduction

#p1[
    Sand keeps every translation
    next to its source.
][
    Sandでは訳文を原文のすぐ隣に書く。
]
#{{\n}}
#p2[Nothing drifts apart.][ずれることがない。]

#usage# Usage

#how## Selecting

#q[Use selectors like \#.intro.p1.en][\#.intro.p1.ja のようにセレクターを使う]
";

fn texts(selector: &str, format: Format) -> Vec<String> {
    let doc = Parser::new(ESSAY).parse().unwrap();
    let selector = parse_selector(selector).unwrap();
    render(&doc, &selector, format)
        .unwrap()
        .into_iter()
        .map(|r| r.text)
        .collect()
}

#[test]
fn test_plain_document() {
    assert_eq!(
        texts(".", Format::Plain),
        vec![
            "Sand keeps every translation next to its source.\nNothing drifts apart. Use selectors like #.intro.p1.en",
            "Sandでは訳文を原文のすぐ隣に書く。\nずれることがない。 #.intro.p1.ja のようにセレクターを使う",
        ]
    );
}

#[test]
fn test_markdown_document() {
    assert_eq!(
        texts(".ja", Format::Markdown),
        vec![
            "# Introduction\n\nSandでは訳文を原文のすぐ隣に書く。\nずれることがない。\n\n# Usage\n\n## Selecting\n\n#.intro.p1.ja のようにセレクターを使う",
        ]
    );
}

#[test]
fn test_section_selection() {
    assert_eq!(
        texts(".usage.en", Format::Markdown),
        vec!["# Usage\n\n## Selecting\n\nUse selectors like #.intro.p1.en"]
    );
    assert_eq!(
        texts(".usage.how.q.", Format::Plain),
        vec![
            "Use selectors like #.intro.p1.en",
            "#.intro.p1.ja のようにセレクターを使う",
        ]
    );
}

#[test]
fn test_names_come_back_in_declaration_order() {
    let doc = Parser::new(ESSAY).parse().unwrap();
    let names: Vec<_> = render_plain(&doc, &parse_selector(".intro.").unwrap())
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["en", "ja"]);
}

#[test]
fn test_render_errors() {
    let doc = Parser::new(ESSAY).parse().unwrap();
    let err = render_markdown(&doc, &parse_selector("./p1.").unwrap()).unwrap_err();
    assert_eq!(err, RenderError::Local("./p1.".to_string()));
    assert_eq!(
        err.to_string(),
        "local selector `./p1.` can only be used inside a document"
    );

    let err = render_plain(&doc, &parse_selector(".intro.p9.").unwrap()).unwrap_err();
    assert_eq!(err.to_string(), "selector `.intro.p9.` does not point to anything");
}
