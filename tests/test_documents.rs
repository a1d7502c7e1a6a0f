use std::path::PathBuf;

use url::Url;

use xmlquery::{Document, Error, Loader, ParseError, ParseOptions};

const OFFICE: &str = "urn:schemas-microsoft-com:office:office";
const SPREADSHEET: &str = "urn:schemas-microsoft-com:office:spreadsheet";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn workbook() -> Document {
    Document::parse_file(fixture("test_XML_ExcelWorkbook.xml"), Some("utf-8")).unwrap()
}

#[test]
fn test_workbook_properties() {
    let doc = workbook();
    let namespaces = [("o", OFFICE), ("ss", SPREADSHEET)];

    let author = doc.at_xpath("//o:Author", &namespaces).unwrap().unwrap();
    assert_eq!(author.text(), "_tid_");
    assert_eq!(author.tag_name(), Some("Author"));

    let created = doc.at_xpath("//o:Created", &namespaces).unwrap().unwrap();
    assert_eq!(created.text(), "2015-07-26T06:00:00Z");
}

#[test]
fn test_workbook_rows() {
    let doc = workbook();
    let namespaces = [("ss", SPREADSHEET)];
    // the default namespace and `ss` are the same URI
    let rows = doc.xpath("//ss:Row", &namespaces).unwrap().collect::<Vec<_>>();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        // absolute from a row still searches the whole document
        assert_eq!(row.xpath("//ss:Data", &namespaces).unwrap().count(), 9);
        assert_eq!(row.xpath("ss:Cell/ss:Data", &namespaces).unwrap().count(), 3);
    }
    let last_row = rows[2]
        .xpath("ss:Cell/ss:Data", &namespaces)
        .unwrap()
        .map(|data| data.text())
        .collect::<Vec<_>>();
    assert_eq!(last_row, vec!["xmlquery", "Rust", "7"]);
    assert_eq!(
        doc.xpath_values("//ss:Data[@ss:Type = 'Number']", &namespaces)
            .unwrap()
            .collect::<Vec<_>>(),
        vec!["2400", "7"]
    );
}

#[test]
fn test_workbook_namespaces() {
    let doc = workbook();
    let mut uris = doc
        .namespaces()
        .iter()
        .map(|declaration| declaration.uri())
        .collect::<Vec<_>>();
    uris.sort();
    let mut expected = vec![
        "http://www.w3.org/TR/REC-html40",
        SPREADSHEET,
        SPREADSHEET,
        "urn:schemas-microsoft-com:office:excel",
        OFFICE,
    ];
    expected.sort();
    assert_eq!(uris, expected);
}

#[test]
fn test_workbook_unprefixed_query_matches_nothing() {
    let doc = workbook();
    assert_eq!(doc.xpath("//Row", &[]).unwrap().count(), 0);
    assert_eq!(doc.xpath("//xmlns:Row", &[]).unwrap().count(), 3);
}

#[test]
fn test_presentation_prefix_from_document_element() {
    let url = Url::from_file_path(fixture("pptx-presentation.xml")).unwrap();
    let doc = Document::parse_url(url.as_str(), Some("utf-8")).unwrap();
    let nodes = doc.xpath("//p:sldId", &[]).unwrap().collect::<Vec<_>>();
    assert_eq!(nodes.len(), 1);
    let sld_id = nodes[0];
    assert_eq!(sld_id.tag_name(), Some("sldId"));
    assert_eq!(sld_id.get("id"), Some("256"));
    assert_eq!(sld_id.get("r:id"), Some("rId2"));
    assert_eq!(sld_id.get("nonexistent"), None);
}

#[test]
fn test_relationships_default_namespace() {
    let url = Url::from_file_path(fixture("pptx-presentation.xml.rels")).unwrap();
    let doc = Document::parse_url(url.as_str(), Some("utf-8")).unwrap();
    assert_eq!(doc.xpath("//Relationship", &[]).unwrap().count(), 0);
    let nodes = doc
        .xpath("//xmlns:Relationship", &[])
        .unwrap()
        .collect::<Vec<_>>();
    assert_eq!(nodes.len(), 6);
    assert_eq!(nodes[0].get("Id"), Some("rId3"));
    assert_eq!(nodes[1].get("Id"), Some("rId2"));
}

#[test]
fn test_parse_url_accepts_plain_path() {
    let path = fixture("pptx-presentation.xml.rels");
    let doc = Document::parse_url(path.to_str().unwrap(), None).unwrap();
    assert_eq!(doc.node_ref(doc.document_element()).tag_name(), Some("Relationships"));
}

#[test]
fn test_parse_url_missing_file() {
    let url = Url::from_file_path(fixture("does-not-exist.xml")).unwrap();
    let err = Document::parse_url(url.as_str(), None).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_parse_url_unsupported_scheme() {
    let err = Document::parse_url("http://example.com/doc.xml", None).unwrap_err();
    assert!(matches!(err, Error::UnsupportedScheme(ref scheme) if scheme == "http"));
}

#[test]
fn test_custom_loader() {
    let url = Url::parse("memory://docs/a.xml").unwrap();
    let loader = |url: &Url| -> Result<Vec<u8>, Error> {
        Ok(format!("<doc host=\"{}\"/>", url.host_str().unwrap_or_default()).into_bytes())
    };
    let doc = Document::parse_url_with(&url, &loader, &ParseOptions::default()).unwrap();
    assert_eq!(doc.attribute(doc.document_element(), "host"), Some("docs"));
}

struct Empty;

impl Loader for Empty {
    fn load(&self, _url: &Url) -> Result<Vec<u8>, Error> {
        Ok(b"  ".to_vec())
    }
}

#[test]
fn test_loader_parse_failure_is_forwarded() {
    let url = Url::parse("memory://empty").unwrap();
    let err = Document::parse_url_with(&url, &Empty, &ParseOptions::default()).unwrap_err();
    assert_eq!(err.parse_error(), Some(&ParseError::Empty));
}
