use rstest::{fixture, rstest};

use xmlquery::{Document, NodeRef, ParseOptions, ValueType, XPath, XPathError};

const LIBRARY: &str = r#"<library xmlns:b="urn:books">
  <!--catalog-->
  <shelf id="s1">
    <book id="1" lang="en"><title>Dune</title><price>9</price></book>
    <book id="2" lang="fr"><title>Candide</title><price>12</price></book>
    <b:book id="3"><b:title>Namespaced</b:title></b:book>
  </shelf>
  <shelf id="s2">
    <book id="4" lang="en"><title>Emma</title><price>7</price></book>
    <?render fast?>
  </shelf>
</library>"#;

#[fixture]
fn library() -> Document {
    let options = ParseOptions::default().strip_whitespace(true);
    Document::parse_with_options(LIBRARY.as_bytes(), &options).unwrap()
}

// elements by id, falling back to the tag name; other nodes by kind
fn label(node: NodeRef) -> String {
    match node.value_type() {
        ValueType::Element => node
            .get("id")
            .or(node.tag_name())
            .unwrap_or_default()
            .to_string(),
        ValueType::Text => node.text(),
        ValueType::Comment => "comment".to_string(),
        ValueType::ProcessingInstruction => "pi".to_string(),
        ValueType::Root => "/".to_string(),
    }
}

fn labels(doc: &Document, expression: &str) -> Vec<String> {
    doc.xpath(expression, &[]).unwrap().map(label).collect()
}

#[rstest]
#[case("//book", &["1", "2", "4"])]
#[case("//b:book", &["3"])]
#[case("/library/shelf", &["s1", "s2"])]
#[case("library/shelf/book", &["1", "2", "4"])]
#[case("//shelf/*", &["1", "2", "3", "4"])]
#[case("/", &["/"])]
#[case("self::node()", &["/"])]
#[case("descendant::title", &["title", "title", "title"])]
#[case("//nothing", &[])]
fn test_paths(library: Document, #[case] expression: &str, #[case] expected: &[&str]) {
    assert_eq!(labels(&library, expression), expected);
}

#[rstest]
#[case("//title[. = 'Emma']/..", &["4"])]
#[case("//title/parent::book", &["1", "2", "4"])]
#[case("//title[text() = 'Dune']/ancestor::shelf", &["s1"])]
#[case(
    "//price/ancestor-or-self::*",
    &["library", "s1", "1", "price", "2", "price", "s2", "4", "price"]
)]
#[case("//book[1]/following-sibling::*", &["2", "3"])]
#[case("//book[@id = '2']/preceding-sibling::book", &["1"])]
#[case("//b:book/preceding-sibling::*[1]", &["2"])]
#[case("/library/comment()", &["comment"])]
#[case("//processing-instruction('render')", &["pi"])]
#[case("//processing-instruction('other')", &[])]
#[case("//book/title/text()", &["Dune", "Candide", "Emma"])]
#[case("//shelf[@id = 's2']//node()", &["4", "title", "Emma", "price", "7", "pi"])]
fn test_axes(library: Document, #[case] expression: &str, #[case] expected: &[&str]) {
    assert_eq!(labels(&library, expression), expected);
}

#[rstest]
#[case("//shelf[@id = 's2']/book", &["4"])]
#[case("//book[2]", &["2"])]
#[case("//book[last()]", &["2", "4"])]
#[case("//book[position() = 1]", &["1", "4"])]
#[case("//book[@lang = 'en' and price < 8]", &["4"])]
#[case("//book[@lang = 'en' or @lang = 'fr']", &["1", "2", "4"])]
#[case("//book[not(@lang = 'en')]", &["2"])]
#[case("//book[title = 'Dune']", &["1"])]
#[case("//book[contains(title, 'and')]", &["2"])]
#[case("//book[starts-with(title, 'E')]", &["4"])]
#[case("//book[price > 8][@lang = 'fr']", &["2"])]
#[case("//book[price >= 9 and price <= 12]", &["1", "2"])]
#[case("//book[price != 9]", &["2", "4"])]
#[case("//book[@id = 4]", &["4"])]
#[case("//book[(@id = 1 or @id = 2) and @lang = 'fr']", &["2"])]
#[case("//book[@missing]", &[])]
#[case("//book[true()]", &["1", "2", "4"])]
#[case("//book[false()]", &[])]
#[case("//shelf[count(book) = 2]", &["s1"])]
#[case("//shelf[count(*) > 2]", &["s1"])]
#[case("//shelf[book/@lang = 'fr']", &["s1"])]
#[case("//book[../@id = 's2']", &["4"])]
#[case("//*[local-name() = 'book']", &["1", "2", "3", "4"])]
#[case("//*[name() = 'b:book']", &["3"])]
#[case("//book[normalize-space(string(title)) = 'Emma']", &["4"])]
#[case("//book[string() = 'Dune9']", &["1"])]
fn test_predicates(library: Document, #[case] expression: &str, #[case] expected: &[&str]) {
    assert_eq!(labels(&library, expression), expected);
}

#[rstest]
#[case("//book/@id", &["1", "2", "4"])]
#[case("//b:book/@id", &["3"])]
#[case("//book/@*", &["1", "en", "2", "fr", "4", "en"])]
#[case("//@lang", &["en", "fr", "en"])]
#[case("//shelf/@id[. = 's2']", &["s2"])]
#[case("//book[1]/title", &["Dune", "Emma"])]
fn test_values(library: Document, #[case] expression: &str, #[case] expected: &[&str]) {
    let values = library.xpath_values(expression, &[]).unwrap().collect::<Vec<_>>();
    assert_eq!(values, expected);
}

#[rstest]
#[case("//book/@lang/..", &["1", "2", "4"])]
#[case("//@id/..", &["s1", "1", "2", "3", "s2", "4"])]
#[case("//book/@lang[. = 'fr']/..", &["2"])]
#[case("//book/@lang/parent::book/title", &["title", "title", "title"])]
#[case("//b:book/@id/ancestor::shelf", &["s1"])]
#[case("//title/@lang/..", &[])]
#[case("//book[@lang/../title = 'Emma']", &["4"])]
fn test_steps_after_attribute(
    library: Document,
    #[case] expression: &str,
    #[case] expected: &[&str],
) {
    assert_eq!(labels(&library, expression), expected);
}

#[rstest]
#[case("//book/@id/self::node()", &["1", "2", "4"])]
#[case("//book/@lang/self::node()[. = 'en']", &["en", "en"])]
#[case("//@id[../@lang = 'fr']", &["2"])]
#[case("//@id[parent::shelf]", &["s1", "s2"])]
fn test_attribute_context(
    library: Document,
    #[case] expression: &str,
    #[case] expected: &[&str],
) {
    let values = library.xpath_values(expression, &[]).unwrap().collect::<Vec<_>>();
    assert_eq!(values, expected);
}

#[test]
fn test_deeply_nested_descendant_steps() {
    let xml = format!("{}{}", "<a>".repeat(200), "</a>".repeat(200));
    let doc = Document::parse_str(&xml).unwrap();
    assert_eq!(doc.xpath("//x//a//a//a//a", &[]).unwrap().count(), 0);
    assert_eq!(doc.xpath("//a//a//a//a", &[]).unwrap().count(), 197);
    assert_eq!(doc.xpath("//a[a//a]//a/a", &[]).unwrap().count(), 198);
}

#[test]
fn test_positional_predicate_on_wide_document() {
    let xml = format!("<r>{}</r>", r#"<row n="x"/>"#.repeat(20_000));
    let doc = Document::parse_str(&xml).unwrap();
    assert_eq!(doc.xpath("//row[1]", &[]).unwrap().count(), 1);
    assert_eq!(doc.xpath("//row[last()]", &[]).unwrap().count(), 1);
    assert_eq!(doc.xpath("/r/row[position() > 19998]", &[]).unwrap().count(), 2);
    assert_eq!(doc.xpath_values("//row[2]/@n", &[]).unwrap().count(), 1);
}

#[rstest]
fn test_unprefixed_step_ignores_namespaced_elements(library: Document) {
    assert_eq!(library.xpath("//title", &[]).unwrap().count(), 3);
    assert_eq!(
        library
            .xpath("//bk:title", &[("bk", "urn:books")])
            .unwrap()
            .map(|node| node.text())
            .collect::<Vec<_>>(),
        vec!["Namespaced"]
    );
}

#[rstest]
fn test_caller_binding_overrides_document(library: Document) {
    assert_eq!(
        library
            .xpath("//b:book", &[("b", "urn:somewhere-else")])
            .unwrap()
            .count(),
        0
    );
}

#[rstest]
fn test_unknown_prefix_is_an_error(library: Document) {
    assert_eq!(
        library.xpath("//zz:book", &[]).err(),
        Some(XPathError::UnknownPrefix("zz".to_string()))
    );
    assert_eq!(
        library.xpath("//book[zz:title]", &[]).err(),
        Some(XPathError::UnknownPrefix("zz".to_string()))
    );
    // a valid query that matches nothing is not an error
    assert_eq!(library.xpath("//zz", &[]).unwrap().count(), 0);
}

#[rstest]
fn test_at_xpath_returns_first_in_document_order(library: Document) {
    let first = library.at_xpath("//book", &[]).unwrap().unwrap();
    assert_eq!(first.get("id"), Some("1"));
    assert_eq!(library.xpath("//book", &[]).unwrap().next(), Some(first));
    assert_eq!(library.at_xpath("//nothing", &[]).unwrap(), None);
}

#[rstest]
fn test_results_are_ordered_and_unique(library: Document) {
    // each book is reachable from several ancestors
    let nodes = library
        .xpath("//*//book", &[])
        .unwrap()
        .map(|node| node.node())
        .collect::<Vec<_>>();
    let mut sorted = nodes.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(nodes, sorted);
    assert_eq!(nodes.len(), 3);
}

#[rstest]
fn test_compiled_expression_is_idempotent(library: Document) {
    let xpath = XPath::compile("//book[price < 10]/title").unwrap();
    let first = library
        .evaluate(&xpath, library.root(), &[])
        .unwrap()
        .collect::<Vec<_>>();
    let second = library
        .evaluate(&xpath, library.root(), &[])
        .unwrap()
        .collect::<Vec<_>>();
    assert_eq!(first, second);
    assert_eq!(
        first.iter().map(|node| node.text()).collect::<Vec<_>>(),
        vec!["Dune", "Emma"]
    );
}

#[rstest]
fn test_context_node_queries(library: Document) {
    let shelf = library.at_xpath("//shelf[@id = 's2']", &[]).unwrap().unwrap();
    let relative = shelf.xpath("book/title", &[]).unwrap().map(|n| n.text()).collect::<Vec<_>>();
    assert_eq!(relative, vec!["Emma"]);
    // absolute paths still start at the root
    assert_eq!(shelf.xpath("//book", &[]).unwrap().count(), 3);
    assert_eq!(shelf.at_xpath("..", &[]).unwrap().unwrap().tag_name(), Some("library"));
    assert_eq!(
        shelf.at_xpath("preceding-sibling::shelf", &[]).unwrap().unwrap().get("id"),
        Some("s1")
    );
}

#[rstest]
fn test_concurrent_queries(library: Document) {
    std::thread::scope(|scope| {
        let handles = (0..4)
            .map(|_| scope.spawn(|| library.xpath("//book", &[]).unwrap().count()))
            .collect::<Vec<_>>();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
    });
}

fn error(doc: &Document, expression: &str) -> String {
    match doc.xpath(expression, &[]) {
        Ok(_) => panic!("{} should fail", expression),
        Err(e) => e.to_string(),
    }
}

#[rstest]
fn test_error_messages(library: Document) {
    insta::assert_snapshot!(error(&library, "//book["), @"XPath syntax error at 7: unexpected end of expression");
    insta::assert_snapshot!(error(&library, "//book[@id='1'"), @"XPath syntax error at 14: expected ']'");
    insta::assert_snapshot!(error(&library, "//book[@id = 'x]"), @"XPath syntax error at 13: unterminated string literal");
    insta::assert_snapshot!(error(&library, "//book[$var]"), @"XPath syntax error at 7: unexpected character '$'");
    insta::assert_snapshot!(error(&library, "//book/@id/title"), @"XPath syntax error at 11: only parent, ancestor or self::node() steps may follow an attribute step");
    insta::assert_snapshot!(error(&library, "//book[frobnicate()]"), @"unknown function: frobnicate()");
    insta::assert_snapshot!(error(&library, "//book[contains(title)]"), @"contains() takes 2 argument(s)");
    insta::assert_snapshot!(error(&library, "//zz:book"), @"unknown namespace prefix: zz");
    insta::assert_snapshot!(error(&library, "//book/@id"), @"expression does not select nodes");
}
