use xmlquery::Document;

const NESTED: &str = r#"<root xmlns="urn:default" xmlns:a="urn:a">
  <a:one>
    <two xmlns:a="urn:a2" xmlns:b="urn:b">
      <a:three/>
      <four xmlns=""/>
    </two>
  </a:one>
</root>"#;

#[test]
fn test_namespaces_lists_every_declaration() {
    let doc = Document::parse_str(NESTED).unwrap();
    let declared = doc
        .namespaces()
        .iter()
        .map(|declaration| (declaration.prefix(), declaration.uri()))
        .collect::<Vec<_>>();
    assert_eq!(
        declared,
        vec![
            ("", "urn:default"),
            ("a", "urn:a"),
            ("a", "urn:a2"),
            ("b", "urn:b"),
            ("", ""),
        ]
    );
}

#[test]
fn test_repeated_uri_is_not_deduplicated() {
    let doc = Document::parse_str(
        r#"<r xmlns="urn:x" xmlns:x="urn:x"><c xmlns:y="urn:x"/></r>"#,
    )
    .unwrap();
    let mut uris = doc
        .namespaces()
        .iter()
        .map(|declaration| declaration.uri())
        .collect::<Vec<_>>();
    uris.sort();
    assert_eq!(uris, vec!["urn:x", "urn:x", "urn:x"]);
}

#[test]
fn test_root_namespaces() {
    let doc = Document::parse_str(NESTED).unwrap();
    let root = doc.document_element();
    let declared = doc.root_namespaces();
    assert_eq!(declared.len(), 2);
    assert!(declared.iter().all(|declaration| declaration.node() == root));
}

#[test]
fn test_element_namespaces_resolved_at_parse_time() {
    let doc = Document::parse_str(NESTED).unwrap();
    let names = doc
        .descendants(doc.root())
        .filter(|node| doc.is_element(*node))
        .map(|node| {
            let node = doc.node_ref(node);
            (node.tag_name(), node.namespace_uri())
        })
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            (Some("root"), Some("urn:default")),
            (Some("one"), Some("urn:a")),
            (Some("two"), Some("urn:default")),
            (Some("three"), Some("urn:a2")),
            (Some("four"), None),
        ]
    );
}

#[test]
fn test_resolve_prefix_walks_outward() {
    let doc = Document::parse_str(NESTED).unwrap();
    let three = doc.at_xpath("//a:three", &[("a", "urn:a2")]).unwrap().unwrap();
    let four = doc.at_xpath("//four", &[]).unwrap().unwrap();
    assert_eq!(doc.resolve_prefix(three.node(), "a"), Some("urn:a2"));
    assert_eq!(doc.resolve_prefix(three.node(), "b"), Some("urn:b"));
    assert_eq!(doc.resolve_prefix(three.node(), ""), Some("urn:default"));
    assert_eq!(doc.resolve_prefix(four.node(), ""), None);
    assert_eq!(doc.resolve_prefix(doc.document_element(), "b"), None);
    assert_eq!(doc.resolve_prefix(doc.document_element(), "nope"), None);
    assert_eq!(
        doc.resolve_prefix(doc.document_element(), "xml"),
        Some("http://www.w3.org/XML/1998/namespace")
    );
}

#[test]
fn test_attribute_namespaces() {
    let doc = Document::parse_str(
        r#"<r xmlns="urn:d" xmlns:p="urn:p" plain="1" p:qualified="2" xml:lang="en"/>"#,
    )
    .unwrap();
    let r = doc.node_ref(doc.document_element());
    // unprefixed attributes are never in the default namespace
    assert_eq!(r.attribute_ns("plain", None), Some("1"));
    assert_eq!(r.attribute_ns("plain", Some("urn:d")), None);
    assert_eq!(r.attribute_ns("qualified", Some("urn:p")), Some("2"));
    assert_eq!(
        r.attribute_ns("lang", Some("http://www.w3.org/XML/1998/namespace")),
        Some("en")
    );
    assert_eq!(r.get("xml:lang"), Some("en"));
}

#[test]
fn test_undeclared_prefix_parses() {
    let doc = Document::parse_str(r#"<x:r y:a="1"><x:c/></x:r>"#).unwrap();
    let r = doc.node_ref(doc.document_element());
    assert_eq!(r.qualified_name(), Some("x:r".to_string()));
    assert_eq!(r.namespace_uri(), None);
    assert_eq!(r.get("y:a"), Some("1"));
}
