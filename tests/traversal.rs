//! Decode/validate traversal: attributes, simple content, wildcards,
//! xsi attributes, paths and validation modes

use pretty_assertions::assert_eq;
use serde_json::json;
use xmlschema_validator::validators::{
    AlternativeTest, ContentType, GroupMember, Occurs, ProcessContents, TypeId, XsdAnyAttribute,
    XsdAnyElement, XsdAttribute, XsdComplexType, NamespaceConstraint,
};
use xmlschema_validator::{
    BuiltinType, DecodeItem, DecodeOptions, DecodedElement, Document, Error, ErrorKind, QName,
    SchemaBuilder, ValidationError, ValidationMode, XsdElement, XsdGroup, XsdSchema,
};

const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XS: &str = "http://www.w3.org/2001/XMLSchema";

/// A `root` with a sequence of optional children of every content kind.
fn sample_schema() -> XsdSchema {
    let mut builder = SchemaBuilder::new();
    let string = builder.builtin(BuiltinType::String);
    let integer = builder.builtin(BuiltinType::Integer);
    let boolean = builder.builtin(BuiltinType::Boolean);
    builder.builtin(BuiltinType::Decimal);

    let mut children: Vec<GroupMember> = Vec::new();
    let mut child = |builder: &mut SchemaBuilder, element: XsdElement| {
        let id = builder.add_element(element.with_occurs(Occurs::optional()));
        children.push(id.into());
    };

    child(&mut builder, XsdElement::new(QName::local("count"), integer));
    child(&mut builder, XsdElement::new(QName::local("flag"), boolean).with_default("true"));
    child(&mut builder, XsdElement::new(QName::local("version"), string).with_fixed("1.0"));
    child(&mut builder, XsdElement::new(QName::local("note"), string).with_nillable(true));

    let tagged = builder.add_complex_type(
        XsdComplexType::new(None, ContentType::Simple(string))
            .with_attribute(XsdAttribute::new(QName::local("lang"), string).required())
            .with_attribute(XsdAttribute::new(QName::local("size"), integer).with_default("3"))
            .with_attribute(XsdAttribute::new(QName::local("kind"), string).with_fixed("plain")),
    );
    child(&mut builder, XsdElement::new(QName::local("tagged"), tagged));

    let open = builder.add_complex_type(XsdComplexType::empty().with_any_attribute(
        XsdAnyAttribute::new(NamespaceConstraint::Any, ProcessContents::Lax),
    ));
    child(&mut builder, XsdElement::new(QName::local("open"), open));

    let empty = builder.add_complex_type(XsdComplexType::empty());
    child(&mut builder, XsdElement::new(QName::local("empty"), empty));

    let word = builder.add_element(
        XsdElement::new(QName::local("b"), string).with_occurs(Occurs::zero_or_more()),
    );
    let words = builder.add_group(XsdGroup::sequence(), [word.into()]).unwrap();
    let mixed = builder.add_complex_type(XsdComplexType::mixed(words));
    child(&mut builder, XsdElement::new(QName::local("para"), mixed));

    let any = builder.add_wildcard(
        XsdAnyElement::new(ProcessContents::Lax).with_occurs(Occurs::zero_or_more()),
    );
    let anys = builder.add_group(XsdGroup::sequence(), [any.into()]).unwrap();
    let extension = builder.add_element_only_type(anys);
    child(&mut builder, XsdElement::new(QName::local("extension"), extension));

    let strict = builder.add_wildcard(
        XsdAnyElement::new(ProcessContents::Strict).with_occurs(Occurs::zero_or_more()),
    );
    let stricts = builder.add_group(XsdGroup::sequence(), [strict.into()]).unwrap();
    let strict_type = builder.add_element_only_type(stricts);
    child(&mut builder, XsdElement::new(QName::local("strict"), strict_type));

    let item = builder.add_element(
        XsdElement::new(QName::local("item"), string).with_occurs(Occurs::zero_or_more()),
    );
    children.push(item.into());

    let content = builder.add_group(XsdGroup::sequence(), children).unwrap();
    let root_type = builder.add_element_only_type(content);
    builder.add_global_element(XsdElement::new(QName::local("root"), root_type));
    builder.add_global_element(XsdElement::new(QName::local("amount"), integer));
    builder.build().unwrap()
}

fn decode(schema: &XsdSchema, xml: &str, options: DecodeOptions) -> (DecodedElement, Vec<ValidationError>) {
    let doc = Document::from_string(xml).unwrap();
    let (value, errors) = schema.decode(&doc, &options).unwrap();
    (value.unwrap(), errors)
}

fn lax(schema: &XsdSchema, xml: &str) -> (DecodedElement, Vec<ValidationError>) {
    decode(schema, xml, DecodeOptions::new().with_mode(ValidationMode::Lax))
}

fn reasons(errors: &[ValidationError]) -> Vec<&str> {
    errors.iter().map(|e| e.reason.as_str()).collect()
}

#[test]
fn test_unknown_root() {
    let schema = sample_schema();
    let doc = Document::from_string("<other/>").unwrap();
    let errors: Vec<_> = schema.iter_errors(&doc).unwrap().collect();
    assert_eq!(reasons(&errors), ["'other' is not an element of the schema"]);
    assert_eq!(errors[0].path, "/other");

    let (value, _) = schema
        .decode(&doc, &DecodeOptions::new().with_mode(ValidationMode::Lax))
        .unwrap();
    assert!(value.is_none());
}

#[test]
fn test_simple_content_decoding() {
    let schema = sample_schema();
    let (root, errors) = lax(&schema, "<root><count> 42 </count><flag/></root>");
    assert!(errors.is_empty());
    assert_eq!(root.find("count").unwrap().text, Some(json!(42)));
    assert_eq!(root.find("flag").unwrap().text, Some(json!(true)));

    let (root, _) = decode(
        &schema,
        "<root><flag/></root>",
        DecodeOptions::new().with_use_defaults(false),
    );
    assert_eq!(root.find("flag").unwrap().text, None);
}

#[test]
fn test_string_white_space_is_preserved() {
    let schema = sample_schema();
    let (root, errors) = lax(&schema, "<root><item>  two  spaces </item></root>");
    assert!(errors.is_empty());
    assert_eq!(root.find("item").unwrap().text, Some(json!("  two  spaces ")));

    let xml = "<root>\n  <count>\n    7\n  </count>\n  <version> 1.0</version>\n</root>";
    let (root, errors) = lax(&schema, xml);
    assert_eq!(root.find("count").unwrap().text, Some(json!(7)));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].reason.contains("fixed value '1.0'"));
}

#[test]
fn test_simple_content_errors() {
    let schema = sample_schema();
    let (root, errors) = lax(&schema, "<root><count>many</count><version>2.0</version></root>");

    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].kind, ErrorKind::Decode);
    assert_eq!(errors[0].path, "/root/count");
    assert!(errors[1].reason.contains("fixed value '1.0'"));
    assert_eq!(root.find("count").unwrap().text, Some(json!("many")));

    let (_, errors) = lax(&schema, "<root><count><item/></count></root>");
    assert!(errors
        .iter()
        .any(|e| e.reason == "a simple content element can't have child elements"));
}

#[test]
fn test_attributes() {
    let schema = sample_schema();
    let (root, errors) = lax(&schema, r#"<root><tagged lang="en">hi</tagged></root>"#);
    assert!(errors.is_empty());
    let tagged = root.find("tagged").unwrap();
    assert_eq!(tagged.text, Some(json!("hi")));
    assert_eq!(tagged.get_attribute("lang"), Some(&json!("en")));
    assert_eq!(tagged.get_attribute("size"), Some(&json!(3)));
    assert_eq!(tagged.get_attribute("kind"), Some(&json!("plain")));

    let (_, errors) = lax(
        &schema,
        r#"<root><tagged size="x" kind="fancy" color="red">hi</tagged></root>"#,
    );
    let reasons = reasons(&errors);
    assert!(reasons.contains(&"missing required attribute 'lang'"));
    assert!(reasons.contains(&"attribute 'color' not allowed for element 'tagged'"));
    assert!(reasons.iter().any(|r| r.contains("fixed value 'plain'")));
    assert!(errors.iter().any(|e| e.kind == ErrorKind::Decode));
    assert!(errors.iter().all(|e| e.path == "/root/tagged"));
}

#[test]
fn test_attribute_wildcard_and_empty_content() {
    let schema = sample_schema();
    let (root, errors) = lax(&schema, r#"<root><open any="thing"/><empty/></root>"#);
    assert!(errors.is_empty());
    assert_eq!(root.find("open").unwrap().get_attribute("any"), Some(&json!("thing")));

    let (_, errors) = lax(&schema, "<root><empty>text</empty></root>");
    assert_eq!(reasons(&errors), ["element 'empty' must have empty content"]);
}

#[test]
fn test_mixed_and_element_only_text() {
    let schema = sample_schema();
    let (root, errors) = lax(&schema, "<root><para>some <b>bold</b> text</para></root>");
    assert!(errors.is_empty());
    let para = root.find("para").unwrap();
    assert_eq!(para.children.len(), 1);
    assert!(para.text.is_some());

    let (root, _) = lax(&schema, "<root><para>Hello <b>big</b>  world\n</para></root>");
    assert_eq!(root.find("para").unwrap().text, Some(json!("Hello world")));

    let (_, errors) = lax(&schema, "<root><item/>loose</root>");
    assert_eq!(
        reasons(&errors),
        ["character data between child elements not allowed"]
    );

    let (_, errors) = lax(&schema, "<root>loose<item/></root>");
    assert_eq!(
        reasons(&errors),
        ["character data between child elements not allowed"]
    );
}

#[test]
fn test_wildcards() {
    let schema = sample_schema();
    let xml = "<root><extension><amount>7</amount><free a=\"1\">x</free></extension></root>";
    let (root, errors) = lax(&schema, xml);
    assert!(errors.is_empty());
    let extension = root.find("extension").unwrap();
    assert_eq!(extension.find("amount").unwrap().text, Some(json!(7)));
    assert_eq!(extension.find("free").unwrap().text, Some(json!("x")));

    let (_, errors) = lax(&schema, "<root><extension><amount>seven</amount></extension></root>");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "/root/extension/amount");

    let (_, errors) = lax(&schema, "<root><strict><free/></strict></root>");
    assert_eq!(
        reasons(&errors),
        ["no global declaration found for element 'free'"]
    );
}

#[test]
fn test_xsi_type_and_nil() {
    let schema = sample_schema();
    let xml = format!(
        r#"<root xmlns:xsi="{}" xmlns:xs="{}"><note xsi:nil="true"/><item xsi:type="xs:decimal">1.5</item></root>"#,
        XSI, XS
    );
    let (root, errors) = lax(&schema, &xml);
    assert!(errors.is_empty());
    assert!(root.find("note").unwrap().nil);
    assert_eq!(root.find("item").unwrap().text, Some(json!(1.5)));

    let xml = format!(
        r#"<root xmlns:xsi="{}"><count xsi:nil="true"/><note xsi:nil="true">x</note><item xsi:type="unknown">1</item></root>"#,
        XSI
    );
    let (_, errors) = lax(&schema, &xml);
    let reasons = reasons(&errors);
    assert!(reasons.contains(&"element 'count' is not nillable"));
    assert!(reasons.contains(&"xsi:nil='true' but the element is not empty"));
    assert!(reasons.contains(&"unknown type 'unknown' in xsi:type"));
}

#[test]
fn test_type_alternatives() {
    let mut builder = SchemaBuilder::new();
    let string = builder.builtin(BuiltinType::String);
    let integer = builder.builtin(BuiltinType::Integer);
    let typed = builder.add_complex_type(
        XsdComplexType::simple_content(integer)
            .with_attribute(XsdAttribute::new(QName::local("kind"), string)),
    );
    let plain = builder.add_complex_type(
        XsdComplexType::simple_content(string)
            .with_attribute(XsdAttribute::new(QName::local("kind"), string)),
    );
    builder.add_global_element(
        XsdElement::new(QName::local("value"), typed)
            .with_alternative(
                AlternativeTest::AttributeEquals(QName::local("kind"), "int".to_string()),
                typed,
            )
            .with_alternative(AlternativeTest::HasAttribute(QName::local("kind")), plain),
    );
    let schema = builder.build().unwrap();

    // both alternatives pass, the first one is used
    let (value, errors) = lax(&schema, r#"<value kind="int">12</value>"#);
    assert!(errors.is_empty());
    assert_eq!(value.text, Some(json!(12)));

    let (value, _) = lax(&schema, r#"<value kind="text">12</value>"#);
    assert_eq!(value.text, Some(json!("12")));

    let (value, _) = lax(&schema, "<value>12</value>");
    assert_eq!(value.text, Some(json!(12)));
}

#[test]
fn test_paths_index_repeated_names() {
    let schema = sample_schema();
    let doc = Document::from_string("<root><count>1</count><item/><item/></root>").unwrap();
    let (root, _) = schema.decode(&doc, &DecodeOptions::new()).unwrap();
    let paths: Vec<&str> = root.as_ref().unwrap().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["/root", "/root/count", "/root/item[1]", "/root/item[2]"]);
}

#[test]
fn test_validation_modes() {
    let schema = sample_schema();
    let doc = Document::from_string("<root><count>x</count><empty>y</empty></root>").unwrap();

    let lax: Vec<_> = schema.iter_errors(&doc).unwrap().collect();
    assert_eq!(lax.len(), 2);
    assert!(!schema.is_valid(&doc));

    match schema.validate(&doc) {
        Err(Error::Validation(err)) => assert_eq!(err.path, "/root/count"),
        other => panic!("unexpected result {:?}", other),
    }

    let skip = DecodeOptions::new().with_mode(ValidationMode::Skip);
    let (value, errors) = schema.decode(&doc, &skip).unwrap();
    assert!(errors.is_empty());
    assert_eq!(value.unwrap().find("count").unwrap().text, Some(json!("x")));
}

#[test]
fn test_iter_decode_and_serialization() {
    let schema = sample_schema();
    let doc = Document::from_string(r#"<root><count>5</count><item>a</item></root>"#).unwrap();
    let items: Vec<DecodeItem> = schema.iter_decode(&doc, &DecodeOptions::new()).unwrap().collect();
    assert_eq!(items.len(), 1);

    let DecodeItem::Value(root) = &items[0] else {
        panic!("expected a value");
    };
    let value = serde_json::to_value(root).unwrap();
    assert_eq!(value["tag"], "root");
    assert_eq!(value["children"][0]["text"], 5);
    assert_eq!(value["children"][1]["path"], "/root/item");
}

#[test]
fn test_options_from_json() {
    let options: DecodeOptions =
        serde_json::from_str(r#"{"mode": "skip", "use_defaults": false}"#).unwrap();
    assert_eq!(options.mode, ValidationMode::Skip);
    assert!(!options.use_defaults);
    assert_eq!(ValidationMode::from_str("lax").unwrap(), ValidationMode::Lax);
}

#[test]
fn test_unused_type_handle() {
    let mut builder = SchemaBuilder::new();
    let string: TypeId = builder.builtin(BuiltinType::String);
    builder.add_global_element(XsdElement::new(QName::local("a"), string));
    let schema = builder.build().unwrap();
    assert!(schema.is_valid_string("<a>text</a>"));
    assert!(!schema.is_valid_string("<a><b/></a>"));
}
