//! Document Validation
//!
//! This module implements the decode/validate traversal of an XML document.
//! Each element is checked against its declaration, the children of complex
//! content are driven through a [`ModelVisitor`] and the identity constraints
//! of an element are evaluated once its subtree has been decoded.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::documents::{Document, Element};
use crate::error::{Error, ErrorKind, Result, ValidationError};
use crate::namespaces::{QName, XSI_NAMESPACE};

use super::base::{ElementId, GroupId, TypeId, WildcardId};
use super::complex_types::{AttributeUse, ContentType, XsdAttribute, XsdType};
use super::elements::XsdElement;
use super::exceptions::ChildrenValidationError;
use super::globals::XsdGlobals;
use super::groups::{GroupMember, ModelType};
use super::identities::{self, IdentityTables};
use super::models::{ModelDiagnostic, ModelVisitor};
use super::simple_types::XsdSimpleType;
use super::validation::ValidationContext;
use super::wildcards::ProcessContents;

/// Decoded form of an instance element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedElement {
    /// Element name
    pub tag: QName,
    /// XPath-like instance path
    pub path: String,
    /// Decoded attributes, in document order followed by defaults
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<QName, Value>,
    /// Decoded text of simple or mixed content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    /// Decoded child elements
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DecodedElement>,
    /// The element is nilled with `xsi:nil`
    pub nil: bool,
    /// Declaration used to decode the element
    #[serde(skip)]
    pub element_ref: Option<ElementId>,
    #[serde(skip)]
    pub(crate) attribute_defaults: IndexMap<QName, Value>,
    #[serde(skip)]
    pub(crate) default_value: Option<Value>,
}

impl DecodedElement {
    /// Create an element with no content
    pub fn new(tag: QName, path: impl Into<String>) -> Self {
        Self {
            tag,
            path: path.into(),
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
            nil: false,
            element_ref: None,
            attribute_defaults: IndexMap::new(),
            default_value: None,
        }
    }

    /// Iterate over the element and its descendants in document order
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Attributes including the defaults left out of the output
    pub fn iter_attributes(&self) -> impl Iterator<Item = (&QName, &Value)> {
        self.attributes.iter().chain(
            self.attribute_defaults
                .iter()
                .filter(move |(name, _)| !self.attributes.contains_key(*name)),
        )
    }

    /// First child with a local name
    pub fn find(&self, local_name: &str) -> Option<&DecodedElement> {
        self.children.iter().find(|c| c.tag.local_name == local_name)
    }

    /// Get an attribute value by local name
    pub fn get_attribute(&self, local_name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(name, _)| name.local_name == local_name)
            .map(|(_, value)| value)
    }
}

/// Pre-order iterator over a decoded subtree
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a DecodedElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a DecodedElement;

    fn next(&mut self) -> Option<Self::Item> {
        let elem = self.stack.pop()?;
        self.stack.extend(elem.children.iter().rev());
        Some(elem)
    }
}

/// Instance paths of the children of an element
///
/// A `[n]` position is added only to names shared by more than one sibling.
fn child_paths(elem: &Element, path: &str) -> Vec<String> {
    let mut counts: HashMap<&QName, usize> = HashMap::new();
    for child in &elem.children {
        *counts.entry(&child.qname).or_insert(0) += 1;
    }

    let mut positions: HashMap<&QName, usize> = HashMap::new();
    elem.children
        .iter()
        .map(|child| {
            let position = positions.entry(&child.qname).or_insert(0);
            *position += 1;
            if counts[&child.qname] > 1 {
                format!("{}/{}[{}]", path, child.prefixed_name(), position)
            } else {
                format!("{}/{}", path, child.prefixed_name())
            }
        })
        .collect()
}

/// Character data of mixed content, each piece stripped and joined by a space
fn mixed_text(elem: &Element) -> Option<Value> {
    let pieces: Vec<&str> = elem
        .text_pieces()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    (!pieces.is_empty()).then(|| Value::from(pieces.join(" ")))
}

/// Decode the document root and its subtree
///
/// Returns `None` when the root can't be decoded because it has no
/// declaration.
pub fn decode_document(
    maps: &XsdGlobals,
    doc: &Document,
    context: &mut ValidationContext,
) -> Result<Option<DecodedElement>> {
    let Some(root) = doc.root() else {
        context.validation_error(ValidationError::new(
            ErrorKind::Content,
            "the document has no root element",
        ))?;
        return Ok(None);
    };

    let path = format!("/{}", root.prefixed_name());
    debug!("decoding document '{}' in {} mode", root.qname, context.mode());

    let Some(declaration) = maps.lookup_element(&root.qname) else {
        context.validation_error(
            ValidationError::new(
                ErrorKind::Type,
                format!("'{}' is not an element of the schema", root.prefixed_name()),
            )
            .with_path(path),
        )?;
        return Ok(None);
    };

    let mut decoder = DocumentDecoder { maps, context };
    let outcome = decoder.decode_element(root, declaration, path, 0)?;
    debug!(
        "document '{}' decoded with {} diagnostics",
        root.qname,
        decoder.context.error_count()
    );
    Ok(Some(outcome.element))
}

/// A decoded subtree with the identity tables it propagates upwards
struct DecodeOutcome {
    element: DecodedElement,
    tables: IdentityTables,
    /// Some content was left undecoded because of `max_depth`
    truncated: bool,
}

/// A children diagnostic waiting for the end of the content
struct ChildrenIssue {
    index: usize,
    particle: GroupMember,
    occurs: u32,
    expected: Option<Vec<GroupMember>>,
}

impl ChildrenIssue {
    fn from_diagnostic(index: usize, diagnostic: ModelDiagnostic) -> Self {
        Self {
            index,
            particle: diagnostic.particle,
            occurs: diagnostic.occurs,
            expected: Some(diagnostic.expected),
        }
    }
}

struct DocumentDecoder<'a> {
    maps: &'a XsdGlobals,
    context: &'a mut ValidationContext,
}

impl<'a> DocumentDecoder<'a> {
    fn error(&mut self, error: impl Into<ValidationError>, id: ElementId, path: &str) -> Result<()> {
        self.context
            .validation_error(error.into().with_path(path).with_element(id))
    }

    fn simple_type(&self, id: TypeId) -> Result<&'a XsdSimpleType> {
        self.maps
            .xsd_type(id)
            .as_simple()
            .ok_or_else(|| Error::Type(format!("{} is not a simple type", id)))
    }

    fn decode_element(
        &mut self,
        elem: &Element,
        id: ElementId,
        path: String,
        level: usize,
    ) -> Result<DecodeOutcome> {
        self.maps.limits().check_xml_depth(level + 1)?;

        let maps = self.maps;
        let decl = maps.element(id);
        let mut decoded = DecodedElement::new(elem.qname.clone(), path);
        decoded.element_ref = Some(id);

        let type_id = self.resolve_type(elem, decl, id, &decoded.path)?;
        let xsd_type = maps.xsd_type(type_id);
        self.check_nil(elem, decl, id, &mut decoded)?;
        self.decode_attributes(elem, xsd_type, id, &mut decoded)?;

        let mut tables = IdentityTables::new();
        let mut truncated = false;
        if !decoded.nil {
            match xsd_type {
                XsdType::Simple(simple) => {
                    self.decode_simple_content(elem, decl, simple, id, &mut decoded)?
                }
                XsdType::Complex(complex) => match complex.content {
                    ContentType::Empty => {
                        if elem.has_text() || !elem.children.is_empty() {
                            let reason =
                                format!("element '{}' must have empty content", elem.prefixed_name());
                            self.error(
                                ValidationError::new(ErrorKind::Content, reason),
                                id,
                                &decoded.path,
                            )?;
                        }
                    }
                    ContentType::Simple(simple_id) => {
                        let simple = self.simple_type(simple_id)?;
                        self.decode_simple_content(elem, decl, simple, id, &mut decoded)?;
                    }
                    ContentType::ElementOnly(group) => {
                        (tables, truncated) =
                            self.decode_children(elem, group, false, id, &mut decoded, level)?;
                    }
                    ContentType::Mixed(group) => {
                        (tables, truncated) =
                            self.decode_children(elem, group, true, id, &mut decoded, level)?;
                    }
                },
            }
        }

        if !self.context.is_skip() && !truncated {
            let mut errors = Vec::new();
            tables = identities::check_scope(
                maps,
                &decl.identities,
                &decoded,
                tables,
                &self.context.options.identities,
                self.context.options.max_depth.is_none(),
                &mut errors,
            );
            for error in errors {
                self.context.validation_error(error.with_element(id))?;
            }
        }

        Ok(DecodeOutcome {
            element: decoded,
            tables,
            truncated,
        })
    }

    /// Declared type, replaced by a type alternative or by `xsi:type`
    ///
    /// The first passing alternative wins. The type is settled before a
    /// `ModelVisitor` is created for the content, so no candidate is retried
    /// with `restart()`.
    fn resolve_type(
        &mut self,
        elem: &Element,
        decl: &XsdElement,
        id: ElementId,
        path: &str,
    ) -> Result<TypeId> {
        let type_id = decl.select_type(elem);
        let Some(name) = elem.get_attribute_qname(&QName::xsi("type")) else {
            return Ok(type_id);
        };

        let name = name.trim();
        match elem
            .namespaces
            .resolve(name)
            .ok()
            .and_then(|qname| self.maps.lookup_type(&qname))
        {
            Some(xsi_type) => Ok(xsi_type),
            None => {
                let reason = format!("unknown type '{}' in xsi:type", name);
                self.error(ValidationError::new(ErrorKind::Type, reason), id, path)?;
                Ok(type_id)
            }
        }
    }

    fn check_nil(
        &mut self,
        elem: &Element,
        decl: &XsdElement,
        id: ElementId,
        decoded: &mut DecodedElement,
    ) -> Result<()> {
        let Some(value) = elem.get_attribute_qname(&QName::xsi("nil")) else {
            return Ok(());
        };

        match value.trim() {
            "true" | "1" if decl.nillable => {
                decoded.nil = true;
                if elem.has_text() || !elem.children.is_empty() {
                    self.error(
                        ValidationError::new(
                            ErrorKind::Content,
                            "xsi:nil='true' but the element is not empty",
                        ),
                        id,
                        &decoded.path,
                    )?;
                }
            }
            "true" | "1" => {
                let reason = format!("element '{}' is not nillable", elem.prefixed_name());
                self.error(ValidationError::new(ErrorKind::Attribute, reason), id, &decoded.path)?;
            }
            "false" | "0" => {}
            other => {
                let reason = format!("invalid value '{}' for xsi:nil", other);
                self.error(ValidationError::new(ErrorKind::Attribute, reason), id, &decoded.path)?;
            }
        }
        Ok(())
    }

    fn decode_attributes(
        &mut self,
        elem: &Element,
        xsd_type: &XsdType,
        id: ElementId,
        decoded: &mut DecodedElement,
    ) -> Result<()> {
        let complex = xsd_type.as_complex();

        for (name, raw) in &elem.attributes {
            if name.namespace_uri() == XSI_NAMESPACE {
                continue;
            }
            match complex.and_then(|c| c.attributes.get(name)) {
                Some(attr) if attr.use_mode == AttributeUse::Prohibited => {
                    let reason = format!(
                        "use of attribute '{}' is prohibited",
                        name.prefixed(&elem.namespaces)
                    );
                    self.error(ValidationError::new(ErrorKind::Attribute, reason), id, &decoded.path)?;
                }
                Some(attr) => {
                    let value = self.decode_attribute_value(attr, raw, id, &decoded.path)?;
                    decoded.attributes.insert(name.clone(), value);
                }
                None => {
                    if !complex.is_some_and(|c| c.admits_attribute(name)) {
                        let reason = format!(
                            "attribute '{}' not allowed for element '{}'",
                            name.prefixed(&elem.namespaces),
                            elem.prefixed_name()
                        );
                        self.error(ValidationError::new(ErrorKind::Attribute, reason), id, &decoded.path)?;
                    }
                    decoded.attributes.insert(name.clone(), Value::String(raw.clone()));
                }
            }
        }

        let Some(complex) = complex else {
            return Ok(());
        };
        for attr in complex.attributes.values() {
            if elem.attributes.contains_key(&attr.name) || attr.use_mode == AttributeUse::Prohibited {
                continue;
            }
            if attr.is_required() {
                let reason = format!(
                    "missing required attribute '{}'",
                    attr.name.prefixed(&elem.namespaces)
                );
                self.error(ValidationError::new(ErrorKind::Attribute, reason), id, &decoded.path)?;
            } else if let Some(constraint) = attr.value_constraint() {
                if let Ok(value) = self.simple_type(attr.type_id)?.decode(constraint) {
                    if self.context.options.use_defaults {
                        decoded.attributes.insert(attr.name.clone(), value.clone());
                    }
                    decoded.attribute_defaults.insert(attr.name.clone(), value);
                }
            }
        }
        Ok(())
    }

    fn decode_attribute_value(
        &mut self,
        attr: &XsdAttribute,
        raw: &str,
        id: ElementId,
        path: &str,
    ) -> Result<Value> {
        let simple = self.simple_type(attr.type_id)?;
        match simple.decode(raw) {
            Ok(value) => {
                if let Some(fixed) = &attr.fixed {
                    if simple.decode(fixed).ok().as_ref() != Some(&value) {
                        let reason = format!(
                            "value '{}' doesn't match the fixed value '{}' of attribute '{}'",
                            raw, fixed, attr.name
                        );
                        self.error(ValidationError::new(ErrorKind::Attribute, reason), id, path)?;
                    }
                }
                Ok(value)
            }
            Err(err) => {
                self.error(err, id, path)?;
                Ok(Value::String(raw.to_string()))
            }
        }
    }

    fn decode_simple_content(
        &mut self,
        elem: &Element,
        decl: &XsdElement,
        simple: &XsdSimpleType,
        id: ElementId,
        decoded: &mut DecodedElement,
    ) -> Result<()> {
        if !elem.children.is_empty() {
            self.error(
                ValidationError::new(
                    ErrorKind::Content,
                    "a simple content element can't have child elements",
                ),
                id,
                &decoded.path,
            )?;
        }

        if let Some(constraint) = decl.value_constraint() {
            decoded.default_value = simple.decode(constraint).ok();
        }

        let text = elem.text.as_deref().unwrap_or("");
        if text.is_empty() && decoded.default_value.is_some() {
            if self.context.options.use_defaults {
                decoded.text = decoded.default_value.clone();
            }
            return Ok(());
        }

        match simple.decode(text) {
            Ok(value) => {
                if let Some(fixed) = &decl.fixed {
                    if decoded.default_value.as_ref() != Some(&value) {
                        let reason = format!(
                            "value '{}' doesn't match the fixed value '{}' of element '{}'",
                            text,
                            fixed,
                            elem.prefixed_name()
                        );
                        self.error(ValidationError::new(ErrorKind::Content, reason), id, &decoded.path)?;
                    }
                }
                decoded.text = Some(value);
            }
            Err(err) => {
                self.error(err, id, &decoded.path)?;
                decoded.text = Some(Value::String(text.to_string()));
            }
        }
        Ok(())
    }

    /// Decode the children of element-only or mixed content
    ///
    /// Structural diagnostics are reported after the children, once the
    /// model has been stopped.
    fn decode_children(
        &mut self,
        elem: &Element,
        group_id: GroupId,
        mixed: bool,
        id: ElementId,
        decoded: &mut DecodedElement,
        level: usize,
    ) -> Result<(IdentityTables, bool)> {
        let maps = self.maps;
        let group = maps.group(group_id);
        let mut tables = IdentityTables::new();
        let mut truncated = false;

        if group.is_empty() && group.model == ModelType::Choice && group.occurs.min > 0 {
            self.error(
                ValidationError::new(
                    ErrorKind::Children,
                    "an empty 'choice' group with minOccurs > 0 cannot validate any content",
                ),
                id,
                &decoded.path,
            )?;
            return Ok((tables, truncated));
        }

        if mixed {
            decoded.text = mixed_text(elem);
        } else if elem.has_text() && !matches!(group.members.as_slice(), [GroupMember::Wildcard(_)]) {
            self.error(
                ValidationError::new(
                    ErrorKind::Content,
                    "character data between child elements not allowed",
                ),
                id,
                &decoded.path,
            )?;
        }

        let mut model = ModelVisitor::new(maps, group_id)?;
        let check_model = !self.context.is_skip();
        let mut issues = Vec::new();
        let mut broken = false;

        let paths = child_paths(elem, &decoded.path);
        for ((index, child), child_path) in elem.children.iter().enumerate().zip(paths) {
            let matched = if check_model {
                match_child(maps, &mut model, child, index, &mut broken, &mut issues)?
            } else {
                model.match_element(&child.qname)
            };
            let Some(member) = matched else {
                continue;
            };

            if self.context.is_max_depth_exceeded(level + 1) {
                truncated = true;
                continue;
            }

            let outcome = match member {
                GroupMember::Element(child_id) => {
                    self.decode_element(child, child_id, child_path, level + 1)?
                }
                GroupMember::Wildcard(wildcard) => {
                    self.decode_wildcard(child, wildcard, child_path, level + 1)?
                }
                GroupMember::Group(_) => continue,
            };
            identities::merge_tables(&mut tables, outcome.tables);
            truncated |= outcome.truncated;
            decoded.children.push(outcome.element);
        }

        if check_model && !model.is_ended() {
            let index = elem.children.len();
            for diagnostic in model.stop()? {
                issues.push(ChildrenIssue::from_diagnostic(index, diagnostic));
            }
        }

        for issue in issues {
            let error = self
                .children_error(elem, issue)
                .with_path(&decoded.path)
                .with_element(id);
            self.context.validation_error(error)?;
        }
        Ok((tables, truncated))
    }

    fn children_error(&self, elem: &Element, issue: ChildrenIssue) -> ChildrenValidationError {
        let namespaces = &elem.namespaces;
        let tag = elem.prefixed_name();
        let error = match elem.children.get(issue.index) {
            Some(child) => {
                ChildrenValidationError::unexpected_child(tag, child.prefixed_name(), issue.index)
            }
            None => ChildrenValidationError::incomplete_content(tag, issue.index),
        }
        .with_particle(self.maps.particle_info(issue.particle, namespaces), issue.occurs);

        match issue.expected {
            Some(expected) => error.with_expected_tags(
                expected
                    .into_iter()
                    .filter_map(|member| self.maps.expected_tag(member, namespaces))
                    .collect(),
            ),
            None => error,
        }
    }

    fn decode_wildcard(
        &mut self,
        child: &Element,
        wildcard: WildcardId,
        path: String,
        level: usize,
    ) -> Result<DecodeOutcome> {
        let any = self.maps.wildcard(wildcard);
        let declaration = match any.process_contents {
            ProcessContents::Skip => None,
            ProcessContents::Lax | ProcessContents::Strict => self.maps.lookup_element(&child.qname),
        };

        if let Some(id) = declaration {
            return self.decode_element(child, id, path, level);
        }
        if any.process_contents == ProcessContents::Strict {
            let reason = format!(
                "no global declaration found for element '{}'",
                child.prefixed_name()
            );
            self.context
                .validation_error(ValidationError::new(ErrorKind::Type, reason).with_path(&path))?;
        }
        Ok(DecodeOutcome {
            element: self.raw_element(child, path, level)?,
            tables: IdentityTables::new(),
            truncated: false,
        })
    }

    /// Undecoded copy of a subtree accepted without a declaration
    fn raw_element(&self, elem: &Element, path: String, level: usize) -> Result<DecodedElement> {
        self.maps.limits().check_xml_depth(level + 1)?;

        let mut decoded = DecodedElement::new(elem.qname.clone(), path);
        decoded.attributes = elem
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        decoded.text = mixed_text(elem);

        if !self.context.is_max_depth_exceeded(level + 1) {
            let paths = child_paths(elem, &decoded.path);
            for (child, child_path) in elem.children.iter().zip(paths) {
                decoded
                    .children
                    .push(self.raw_element(child, child_path, level + 1)?);
            }
        }
        Ok(decoded)
    }
}

/// Drive the model with a child, returning the particle that decodes it
///
/// The model breaks on the first diagnostic: from then on children are only
/// matched by name against the leaf particles of the group.
fn match_child(
    maps: &XsdGlobals,
    model: &mut ModelVisitor<'_>,
    child: &Element,
    index: usize,
    broken: &mut bool,
    issues: &mut Vec<ChildrenIssue>,
) -> Result<Option<GroupMember>> {
    while let Some(current) = model.current_member() {
        if maps.is_matching(current, &child.qname) {
            for diagnostic in model.advance(true)? {
                issues.push(ChildrenIssue::from_diagnostic(index, diagnostic));
            }
            return Ok(Some(current));
        }
        if let Some(diagnostic) = model.advance(false)?.into_iter().next() {
            issues.push(ChildrenIssue::from_diagnostic(index, diagnostic));
            model.clear();
            *broken = true;
            return Ok(model.match_element(&child.qname));
        }
    }

    let matched = model.match_element(&child.qname);
    match matched {
        None => {
            issues.push(ChildrenIssue {
                index,
                particle: GroupMember::Group(model.root()),
                occurs: 0,
                expected: None,
            });
            *broken = true;
        }
        Some(member) if !*broken => {
            issues.push(ChildrenIssue {
                index,
                particle: member,
                occurs: 0,
                expected: Some(Vec::new()),
            });
            *broken = true;
        }
        Some(_) => {}
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, path: &str) -> DecodedElement {
        DecodedElement::new(QName::local(name), path)
    }

    #[test]
    fn test_iter_is_preorder() {
        let mut root = leaf("root", "/root");
        let mut a = leaf("a", "/root/a");
        a.children.push(leaf("b", "/root/a/b"));
        root.children.push(a);
        root.children.push(leaf("c", "/root/c"));

        let names: Vec<&str> = root.iter().map(|e| e.tag.local_name.as_str()).collect();
        assert_eq!(names, ["root", "a", "b", "c"]);
        assert_eq!(root.find("c").map(|e| e.path.as_str()), Some("/root/c"));
    }

    #[test]
    fn test_iter_attributes_merges_defaults() {
        let mut elem = leaf("a", "/a");
        elem.attributes.insert(QName::local("x"), Value::from(1));
        elem.attribute_defaults.insert(QName::local("x"), Value::from(1));
        elem.attribute_defaults.insert(QName::local("y"), Value::from("d"));

        let names: Vec<&str> = elem.iter_attributes().map(|(n, _)| n.local_name.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(elem.get_attribute("x"), Some(&Value::from(1)));
        assert_eq!(elem.get_attribute("y"), None);
    }

    #[test]
    fn test_child_paths() {
        let mut root = Element::new(QName::local("root"));
        root.add_child(Element::new(QName::local("a")));
        root.add_child(Element::new(QName::local("b")));
        root.add_child(Element::new(QName::local("a")));
        assert_eq!(
            child_paths(&root, "/root"),
            ["/root/a[1]", "/root/b", "/root/a[2]"]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let mut root = leaf("root", "/root");
        root.attributes.insert(QName::namespaced("urn:x", "id"), Value::from("k1"));
        root.attribute_defaults.insert(QName::local("hidden"), Value::from(0));
        let mut child = leaf("v", "/root/v");
        child.text = Some(Value::from(3));
        root.children.push(child);

        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["tag"], "root");
        assert_eq!(json["attributes"]["{urn:x}id"], "k1");
        assert!(json.get("text").is_none());
        assert!(json.get("attribute_defaults").is_none());
        assert_eq!(json["children"][0]["text"], 3);
        assert_eq!(json["children"][0]["nil"], false);
    }
}
