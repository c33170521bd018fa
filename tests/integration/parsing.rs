//! Integration tests for lexer + parser + validation
//! Tests component interactions at the parsing boundary

use sand::ast::{ApplyTarget, NodeKind, Segment};
use sand::lexer::{CommandKind, Lexer, Token};
use sand::{ParseError, Parser, Span, parse_selector};

const TOUR: &str = r"
#(en, ja)

名前はいくつでも宣言できる。ただし宣言は一度だけ。

#sentence## 文

#s1[
	Thank you!
][
	ありがとう！
]

### セレクター

\#\# これは見出しではない

#s2[
	I am sleepy.
][
	眠いです。
]

#.sentence.s1. は文全体、#.sentence.s1.ja は日本語だけ(情報表示)。

#.
#.en
#.ja

#./s2. は相対指定。

#[
	I got it.
][
	よし！
]

#./0.ja も使える。[]の中の改行には\nを使う。

#{{ \n }}
#{all, { \n }}
#{[ja], { \n }}
";

#[test]
fn test_tour_document_parses() {
    let parser = Parser::new_with_filename(TOUR, "tour.sand");
    let doc = parser.parse().unwrap();

    assert_eq!(doc.names, vec!["en", "ja"]);
    let root = doc.root_scope();
    assert_eq!(root.children().len(), 2);

    let selectors = &root.children()[1];
    match &selectors.kind {
        NodeKind::Section { level, heading, scope } => {
            assert_eq!(*level, 2);
            assert_eq!(heading, "セレクター");
            assert_eq!(scope.get("s2").map(|n| n.kind_label()), Some("sentences"));
        }
        _ => panic!("Expected section"),
    }
    assert_eq!(doc.selector_sites().len(), 7);
}

#[test]
fn test_lexer_tokens_feed_parser_spans() {
    let parser = Parser::new("#(en)\n#hi[Hello]\n");
    let heads: Vec<_> = parser
        .tokens()
        .iter()
        .filter(|t| matches!(t.token, Token::Command(_)))
        .map(|t| (t.token, t.span))
        .collect();
    assert_eq!(
        heads,
        vec![
            (Token::Command(CommandKind::Names), Span::new(0, 2)),
            (Token::Command(CommandKind::Sentences), Span::new(6, 10)),
        ]
    );

    let doc = parser.parse().unwrap();
    assert_eq!(doc.root_scope().children()[0].span, Span::new(6, 16));
    assert_eq!(Lexer::new("").tokenize().len(), 1);
}

#[test]
fn test_source_map_positions_for_errors() {
    let input = "#(en)\n\n#[a]\n#.x.\n";
    let parser = Parser::new(input);
    let errors = parser.parse().unwrap_err();
    assert_eq!(errors.len(), 1);

    let span = errors[0].span().unwrap();
    let (start, end) = parser.source_map().span_to_positions(span);
    assert_eq!((start.line, start.column), (4, 1));
    assert_eq!((end.line, end.column), (4, 5));
}

#[test]
fn test_every_error_is_collected() {
    let input = "#(en, ja, en)\n#(fr)\n#en[a][b]\n#x[a]\n#x{{c}}\n#{[de], {d}}\n#.nope.\n#.bad..\n";
    let errors = Parser::new(input).parse().unwrap_err();
    let messages: Vec<_> = errors.iter().map(ToString::to_string).collect();

    assert_eq!(
        messages,
        vec![
            "duplicate name: `en`",
            "names are defined more than once",
            "alias `en` conflicts with a name",
            "duplicate alias: `x`",
            "expected 2 sentences (one per name), found 1",
            "duplicate alias: `x`",
            "unknown name: `de`",
            "selector `.nope.` does not point to anything",
            "selector syntax is incorrect: .bad..",
        ]
    );
}

#[test]
fn test_apply_targets_survive_parsing() {
    let doc = Parser::new("#(en, ja)\n#note{[ja], {注}}\n").parse().unwrap();
    let node = doc.root_scope().get("note").unwrap();
    match &node.kind {
        NodeKind::Apply { target, content } => {
            assert_eq!(target, &ApplyTarget::Names(vec!["ja".to_string()]));
            assert!(!target.applies_to("en"));
            assert_eq!(content, "注");
        }
        _ => panic!("Expected apply"),
    }
}

#[test]
fn test_selector_resolution_matches_parsed_tree() {
    let doc = Parser::new(TOUR).parse().unwrap();
    let sel = parse_selector("#.1.1.ja").unwrap();
    assert_eq!(sel.path, vec![Segment::Index(1), Segment::Index(1)]);

    let target = doc.resolve(&sel, &doc.root).unwrap();
    assert_eq!(target.node.alias, None);
    assert_eq!(target.name, Some(1));
}

#[test]
fn test_recovering_parse_keeps_valid_parts() {
    let (doc, errors) = Parser::new("#(en)\n#a[ok]\n#b[unclosed\n#c[fine]\n").parse_recovering();
    assert!(matches!(errors[0], ParseError::Syntax { .. }));
    assert!(doc.root_scope().get("a").is_some());
    assert!(doc.root_scope().get("c").is_some());
}
