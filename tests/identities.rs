//! Identity constraints evaluated during document traversal

use pretty_assertions::assert_eq;
use xmlschema_validator::validators::{
    AbsentKeyField, ElementId, IdentityId, Occurs, XsdAttribute, XsdComplexType, XsdIdentity,
};
use xmlschema_validator::{
    BuiltinType, DecodeOptions, Document, Error, ErrorKind, IdentityOptions, QName,
    SchemaBuilder, Severity, ValidationError, ValidationMode, XsdElement, XsdGroup, XsdSchema,
};

/// `root` holds `item` elements keyed by `@id` and `ref` elements
/// referring to them by `@to`.
fn catalog_schema(id_type: BuiltinType, id_default: Option<&str>) -> XsdSchema {
    let mut builder = SchemaBuilder::new();
    let id_type = builder.builtin(id_type);

    let mut id = XsdAttribute::new(QName::local("id"), id_type);
    if let Some(default) = id_default {
        id = id.with_default(default);
    }
    let item_type = builder.add_complex_type(XsdComplexType::empty().with_attribute(id));
    let ref_type = builder.add_complex_type(
        XsdComplexType::empty().with_attribute(XsdAttribute::new(QName::local("to"), id_type)),
    );

    let item = builder.add_element(
        XsdElement::new(QName::local("item"), item_type).with_occurs(Occurs::zero_or_more()),
    );
    let reference = builder.add_element(
        XsdElement::new(QName::local("ref"), ref_type).with_occurs(Occurs::zero_or_more()),
    );
    let content = builder
        .add_group(XsdGroup::sequence(), [item.into(), reference.into()])
        .unwrap();
    let root_type = builder.add_element_only_type(content);

    let key = builder.add_identity(XsdIdentity::key(QName::local("itemKey"), "item", ["@id"]));
    let keyref = builder.add_identity(XsdIdentity::keyref(
        QName::local("itemRef"),
        QName::local("itemKey"),
        "ref",
        ["@to"],
    ));
    builder.add_global_element(
        XsdElement::new(QName::local("root"), root_type).with_identities([key, keyref]),
    );
    builder.build().unwrap()
}

fn lax_errors(schema: &XsdSchema, xml: &str, options: DecodeOptions) -> Vec<ValidationError> {
    let doc = Document::from_string(xml).unwrap();
    let (_, errors) = schema
        .decode(&doc, &options.with_mode(ValidationMode::Lax))
        .unwrap();
    errors
}

fn errors(schema: &XsdSchema, xml: &str) -> Vec<ValidationError> {
    lax_errors(schema, xml, DecodeOptions::new())
}

#[test]
fn test_valid_references() {
    let schema = catalog_schema(BuiltinType::String, None);
    let xml = r#"<root><item id="a"/><item id="b"/><ref to="a"/><ref to="b"/><ref to="a"/></root>"#;
    assert!(errors(&schema, xml).is_empty());
}

#[test]
fn test_keyref_not_found() {
    let schema = catalog_schema(BuiltinType::String, None);
    let xml = r#"<root><item id="a"/><ref to="c"/><ref to="a"/><ref to="c"/></root>"#;
    let errors = errors(&schema, xml);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Identity);
    assert_eq!(
        errors[0].reason,
        "value ('c',) not found for key 'itemKey' (2 times)"
    );
    assert_eq!(errors[0].path, "/root");
    assert!(errors[0].element_ref.is_some());
}

#[test]
fn test_duplicated_key() {
    let schema = catalog_schema(BuiltinType::String, None);
    let errors = errors(&schema, r#"<root><item id="a"/><item id="b"/><item id="a"/></root>"#);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].reason, "duplicated value ('a',) for key 'itemKey'");
    assert_eq!(errors[0].path, "/root/item[3]");
}

#[test]
fn test_values_compare_by_type() {
    let schema = catalog_schema(BuiltinType::Integer, None);
    let errors = errors(&schema, r#"<root><item id="1"/><item id="01"/><ref to="001"/></root>"#);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].reason, "duplicated value (1,) for key 'itemKey'");
}

#[test]
fn test_decimal_keys_keep_their_precision() {
    let schema = catalog_schema(BuiltinType::Decimal, None);
    let xml = r#"<root><item id="0.1"/><item id="0.10000000000000000001"/></root>"#;
    assert!(errors(&schema, xml).is_empty());

    let xml = r#"<root><item id="12345678901234567890.5"/><item id="12345678901234567890.25"/>
        <ref to="12345678901234567890.50"/></root>"#;
    assert!(errors(&schema, xml).is_empty());

    let errors = errors(&schema, r#"<root><item id="1.50"/><item id="01.5"/></root>"#);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].reason, "duplicated value (1.5,) for key 'itemKey'");
}

#[test]
fn test_integer_keys_beyond_64_bits() {
    let schema = catalog_schema(BuiltinType::Integer, None);
    let xml = r#"<root><item id="99999999999999999999"/><item id="99999999999999999998"/>
        <ref to="+099999999999999999999"/></root>"#;
    assert!(errors(&schema, xml).is_empty());

    let xml = r#"<root><item id="99999999999999999999"/><item id="99999999999999999999"/></root>"#;
    let errors = errors(&schema, xml);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].reason,
        "duplicated value (99999999999999999999,) for key 'itemKey'"
    );
}

#[test]
fn test_absent_key_field_policies() {
    let schema = catalog_schema(BuiltinType::String, None);
    let xml = r#"<root><item id="a"/><item/></root>"#;

    let errors = errors(&schema, xml);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].reason, "missing key field '@id' for key 'itemKey'");
    assert_eq!(errors[0].path, "/root/item[2]");

    let exclude = IdentityOptions {
        absent_key_field: AbsentKeyField::Exclude,
    };
    assert!(lax_errors(&schema, xml, DecodeOptions::new().with_identities(exclude)).is_empty());

    let warn = IdentityOptions {
        absent_key_field: AbsentKeyField::Warn,
    };
    let doc = Document::from_string(xml).unwrap();
    let (value, diagnostics) = schema
        .decode(&doc, &DecodeOptions::new().with_identities(warn))
        .unwrap();
    assert!(value.is_some());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_attribute_default_is_a_field_value() {
    let schema = catalog_schema(BuiltinType::String, Some("x"));
    let xml = r#"<root><item/><item id="x"/></root>"#;

    for use_defaults in [true, false] {
        let errors = lax_errors(&schema, xml, DecodeOptions::new().with_use_defaults(use_defaults));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].reason, "duplicated value ('x',) for key 'itemKey'");
    }
}

#[test]
fn test_max_depth_skips_keyref_resolution() {
    let schema = catalog_schema(BuiltinType::String, None);
    let options = DecodeOptions::new().with_max_depth(10);

    let xml = r#"<root><item id="a"/><ref to="z"/></root>"#;
    assert!(lax_errors(&schema, xml, options).is_empty());

    let xml = r#"<root><item id="a"/><item id="a"/></root>"#;
    assert_eq!(lax_errors(&schema, xml, options).len(), 1);
}

#[test]
fn test_strict_validation_fails_on_identity() {
    let schema = catalog_schema(BuiltinType::String, None);
    let doc = Document::from_string(r#"<root><item id="a"/><item id="a"/></root>"#).unwrap();

    match schema.validate(&doc) {
        Err(Error::Validation(err)) => assert_eq!(err.kind, ErrorKind::Identity),
        other => panic!("unexpected result {:?}", other),
    }
    assert!(!schema.is_valid(&doc));
}

/// The key is declared on `list`, the keyref on the root element: the
/// referenced values reach the root through the propagated tables.
fn nested_scope_schema() -> (XsdSchema, ElementId, IdentityId) {
    let mut builder = SchemaBuilder::new();
    let string = builder.builtin(BuiltinType::String);
    let code_type = builder.add_complex_type(
        XsdComplexType::empty().with_attribute(XsdAttribute::new(QName::local("code"), string)),
    );

    let item = builder.add_element(
        XsdElement::new(QName::local("item"), code_type).with_occurs(Occurs::zero_or_more()),
    );
    let items = builder.add_group(XsdGroup::sequence(), [item.into()]).unwrap();
    let list_type = builder.add_element_only_type(items);
    let key = builder.add_identity(XsdIdentity::key(QName::local("code"), "item", ["@code"]));
    let list = builder.add_element(
        XsdElement::new(QName::local("list"), list_type)
            .with_occurs(Occurs::zero_or_more())
            .with_identities([key]),
    );

    let usage = builder.add_element(
        XsdElement::new(QName::local("use"), code_type).with_occurs(Occurs::zero_or_more()),
    );
    let content = builder
        .add_group(XsdGroup::sequence(), [list.into(), usage.into()])
        .unwrap();
    let root_type = builder.add_element_only_type(content);
    let keyref = builder.add_identity(XsdIdentity::keyref(
        QName::local("codeRef"),
        QName::local("code"),
        "use",
        ["@code"],
    ));
    builder.add_global_element(
        XsdElement::new(QName::local("root"), root_type).with_identities([keyref]),
    );
    (builder.build().unwrap(), list, key)
}

#[test]
fn test_keyref_resolved_against_descendant_scopes() {
    let (schema, list, key) = nested_scope_schema();
    assert_eq!(schema.maps().element(list).identities, vec![key]);

    let xml = r#"<root>
        <list><item code="A"/><item code="B"/></list>
        <list><item code="C"/></list>
        <use code="C"/><use code="A"/>
    </root>"#;
    assert!(errors(&schema, xml).is_empty());

    let xml = r#"<root><list><item code="A"/></list><use code="Z"/></root>"#;
    let errors = errors(&schema, xml);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].reason, "value ('Z',) not found for key 'code'");
}

#[test]
fn test_key_scope_is_the_declaring_element() {
    let (schema, _, _) = nested_scope_schema();

    // the same code in two lists is not a duplicate
    let xml = r#"<root><list><item code="A"/></list><list><item code="A"/></list></root>"#;
    assert!(errors(&schema, xml).is_empty());

    let xml = r#"<root><list><item code="A"/><item code="A"/></list></root>"#;
    let errors = errors(&schema, xml);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "/root/list/item[2]");
}
