//! Dotted placeholders such as `{user.address.city}`.
//!
//! Each dotted field is resolved against the bound arguments by walking the
//! object's attributes alongside its class's field declarations, then aliased
//! to a synthetic keyword parameter with a flat name (`user_address_city`) so
//! the regular transform chain applies to it.

use indexmap::IndexMap;
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Annotation, Param, Value};

static ATTRIBUTE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}.]+(?:\.[^{}.]+)+)\}").unwrap());

/// The dotted fields a template uses, in order of first appearance.
pub fn attribute_fields(template: &str) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for caps in ATTRIBUTE_FIELD.captures_iter(template) {
        let field = &caps[1];
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_owned());
        }
    }
    fields
}

/// The name a dotted field is aliased to.
pub fn flatten(field: &str) -> String {
    field.replace('.', "_")
}

/// A dotted field resolved to a synthetic parameter and its current value.
#[derive(Clone, Debug)]
pub struct Resolved {
    pub field: String,
    pub param: Param,
    pub value: Value,
}

/// Resolve one dotted field against the named arguments.
///
/// Returns `None` when the root name is unbound or its value is falsy. A
/// missing attribute along the path resolves to [`Value::None`], and an
/// undeclared field to a type with no metadata.
pub fn resolve(field: &str, named: &IndexMap<String, Value>) -> Option<Resolved> {
    let mut parts = field.split('.');
    let root = named.get(parts.next()?).filter(|v| v.is_truthy())?;

    let mut value = Some(root);
    let mut annotation = root.as_object().map(|o| Annotation::of(o.class.clone()));
    for part in parts {
        value = value.and_then(|v| v.attr(part));
        annotation = annotation.and_then(|a| a.field(part).cloned());
    }

    let param = Param::keyword(flatten(field))
        .default(Value::None)
        .annotated(annotation.unwrap_or_default());

    Some(Resolved {
        field: field.to_owned(),
        param,
        value: value.cloned().unwrap_or_default(),
    })
}

/// Resolve every field, register the values under their flat names and
/// point the template's placeholders at them.
///
/// Returns the rewritten template and the synthetic parameters.
pub fn resolve_all(
    fields: &[String],
    named: &mut IndexMap<String, Value>,
    mut template: String,
) -> (String, Vec<Param>) {
    let mut params = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(Resolved { field, param, value }) = resolve(field, named) else {
            trace!("attribute field `{field}` has no bound root, left as-is");
            continue;
        };

        template = template.replace(&format!("{{{field}}}"), &format!("{{{}}}", param.name));
        named.insert(param.name.clone(), value);
        params.push(param);
    }

    (template, params)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::{tags::Code, Class, Meta, Object};

    fn user() -> Value {
        let address = Arc::new(Class::new("Address").field("city", Meta::tag::<Code>()));
        let user = Arc::new(
            Class::new("User")
                .field("email", Annotation::new())
                .field("address", address.clone()),
        );

        Object::new(user)
            .with("email", "a@b.com")
            .with(
                "address",
                Object::new(address).with("city", "Lagos"),
            )
            .into()
    }

    #[test]
    fn scans_each_dotted_field_once() {
        assert_eq!(
            attribute_fields("{a.b} and {c.d.e}, {a.b} but not {plain} or {}"),
            vec!["a.b".to_string(), "c.d.e".to_string()]
        );
    }

    #[test]
    fn resolves_nested_value_and_type() {
        let mut named = IndexMap::new();
        named.insert("user".to_string(), user());

        let resolved = resolve("user.address.city", &named).unwrap();
        assert_eq!(resolved.value, Value::from("Lagos"));
        assert_eq!(
            Some(&resolved.value),
            named["user"].attr("address").and_then(|a| a.attr("city"))
        );
        assert_eq!(resolved.param.name, "user_address_city");
        assert_eq!(resolved.param.kind, crate::ParamKind::KeywordOnly);
        assert!(matches!(
            resolved.param.annotation.metadata.as_slice(),
            [Meta::Tag(_)]
        ));
    }

    #[test]
    fn missing_attribute_is_none() {
        let mut named = IndexMap::new();
        named.insert("user".to_string(), user());

        let resolved = resolve("user.phone.number", &named).unwrap();
        assert_eq!(resolved.value, Value::None);
        assert!(resolved.param.annotation.metadata.is_empty());
    }

    #[test]
    fn unbound_or_falsy_root_is_skipped() {
        let mut named = IndexMap::new();
        named.insert("user".to_string(), Value::None);
        assert!(resolve("user.email", &named).is_none());
        assert!(resolve("nobody.email", &named).is_none());
    }

    #[test]
    fn rewrites_template_and_registers_values() {
        let mut named = IndexMap::new();
        named.insert("user".to_string(), user());
        let fields = attribute_fields("{user.email} / {user.email} / {ghost.x}");

        let (template, params) = resolve_all(
            &fields,
            &mut named,
            "{user.email} / {user.email} / {ghost.x}".to_string(),
        );
        assert_eq!(template, "{user_email} / {user_email} / {ghost.x}");
        assert_eq!(params.len(), 1);
        assert_eq!(named["user_email"], Value::from("a@b.com"));
    }
}
