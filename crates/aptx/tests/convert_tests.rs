use aptx::convert::to_json;
use aptx::{
    convert, from_xml_str, xml_to_json, ConvertOptions, Converter, ErrorKind, Node, Record,
    XmlElement,
};

fn convert_str(input: &str) -> Result<Node, aptx::Error> {
    let doc = from_xml_str(input)?;
    Ok(convert(&doc.root))
}

fn record<const N: usize>(entries: [(&str, Node); N]) -> Node {
    Node::Record(entries.into_iter().collect::<Record>())
}

#[test]
fn test_empty_element_is_absent() -> Result<(), Box<dyn std::error::Error>> {
    assert_eq!(convert_str("<Notes/>")?, Node::Absent);
    assert_eq!(convert_str("<Notes>   \n  </Notes>")?, Node::Absent);
    Ok(())
}

#[test]
fn test_text_is_trimmed() -> Result<(), Box<dyn std::error::Error>> {
    assert_eq!(convert_str("<Label>  Orbit 1  </Label>")?, Node::from("Orbit 1"));
    Ok(())
}

#[test]
fn test_attributes_only() -> Result<(), Box<dyn std::error::Error>> {
    let expected = record([("x", Node::from("1")), ("y", Node::from("2"))]);
    assert_eq!(convert_str(r#"<p x="1" y="2"/>"#)?, expected);
    Ok(())
}

#[test]
fn test_same_tag_children_form_list() -> Result<(), Box<dyn std::error::Error>> {
    let node = convert_str("<r><item>a</item><item>b</item><item>c</item></r>")?;
    assert_eq!(
        node,
        Node::List(vec![Node::from("a"), Node::from("b"), Node::from("c")])
    );
    Ok(())
}

#[test]
fn test_distinct_children_form_record() -> Result<(), Box<dyn std::error::Error>> {
    let node = convert_str("<person><name>Joe</name><age>5</age></person>")?;
    assert_eq!(
        node,
        record([("name", Node::from("Joe")), ("age", Node::from("5"))])
    );
    Ok(())
}

#[test]
fn test_attribute_alongside_child() -> Result<(), Box<dyn std::error::Error>> {
    let node = convert_str(r#"<person id="7"><name>Joe</name></person>"#)?;
    assert_eq!(
        node,
        record([("name", Node::from("Joe")), ("id", Node::from("7"))])
    );
    Ok(())
}

#[test]
fn test_single_child_is_record() -> Result<(), Box<dyn std::error::Error>> {
    let node = convert_str("<r><item>a</item></r>")?;
    assert_eq!(node, record([("item", Node::from("a"))]));
    Ok(())
}

#[test]
fn test_first_two_decide_list() -> Result<(), Box<dyn std::error::Error>> {
    // the third, differently tagged child still becomes a list entry
    let node = convert_str("<r><a>1</a><a>2</a><b>3</b></r>")?;
    assert_eq!(
        node,
        Node::List(vec![Node::from("1"), Node::from("2"), Node::from("3")])
    );
    Ok(())
}

#[test]
fn test_non_adjacent_repeat_overwrites() -> Result<(), Box<dyn std::error::Error>> {
    let node = convert_str("<r><a>1</a><b>2</b><a>3</a></r>")?;
    assert_eq!(node, record([("a", Node::from("3")), ("b", Node::from("2"))]));
    Ok(())
}

#[test]
fn test_strict_mode_reports_ambiguity() -> Result<(), Box<dyn std::error::Error>> {
    let strict = Converter::with_options(ConvertOptions::strict());

    let repeated = from_xml_str("<r><a>1</a><b>2</b><a>3</a></r>")?;
    let err = strict.convert(&repeated.root).err();
    assert_eq!(
        err.as_ref().map(aptx::Error::kind),
        Some(&ErrorKind::KeyConflict {
            key: "a".to_string()
        })
    );

    let mixed = from_xml_str("<r><a>1</a><a>2</a><b>3</b></r>")?;
    let err = strict.convert(&mixed.root).err();
    assert_eq!(
        err.as_ref().map(aptx::Error::kind),
        Some(&ErrorKind::MixedList {
            expected: "a".to_string(),
            found: "b".to_string()
        })
    );
    Ok(())
}

#[test]
fn test_nested_run_collapses_to_one_key() -> Result<(), Box<dyn std::error::Error>> {
    let input = r#"
        <Proposal>
            <Title>Deep field</Title>
            <Targets>
                <Target Number="1"><Name>NGC 3132</Name></Target>
                <Target Number="2"><Name>M31</Name></Target>
            </Targets>
        </Proposal>"#;
    let node = convert_str(input)?;

    let targets = Node::List(vec![
        record([("Name", Node::from("NGC 3132")), ("Number", Node::from("1"))]),
        record([("Name", Node::from("M31")), ("Number", Node::from("2"))]),
    ]);
    let expected = record([
        ("Title", Node::from("Deep field")),
        ("Targets", record([("Target", targets)])),
    ]);
    assert_eq!(node, expected);
    Ok(())
}

#[test]
fn test_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let doc = from_xml_str(r#"<r k="v"><a>1</a><b><c/><c>x</c></b></r>"#)?;
    assert_eq!(convert(&doc.root), convert(&doc.root));
    Ok(())
}

#[test]
fn test_input_tree_untouched() {
    let element = XmlElement::new("r")
        .with_attribute("id", "1")
        .with_children([XmlElement::new("a").with_text(" x ")]);
    let before = element.clone();
    let _ = convert(&element);
    assert_eq!(element, before);
}

#[test]
fn test_json_shape() -> Result<(), Box<dyn std::error::Error>> {
    let doc = from_xml_str(r#"<r id="7"><name>Joe</name><empty/><l><i>1</i><i>2</i></l></r>"#)?;
    let json = to_json(&convert(&doc.root))?;
    assert_eq!(
        json,
        r#"{"name":"Joe","empty":null,"l":{"i":["1","2"]},"id":"7"}"#
    );
    Ok(())
}

#[test]
fn test_pretty_json_uses_four_spaces() -> Result<(), Box<dyn std::error::Error>> {
    let json = xml_to_json("<r><a>1</a></r>")?;
    assert_eq!(json, "{\n    \"a\": \"1\"\n}");
    Ok(())
}
