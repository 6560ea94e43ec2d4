//! Template model construction.
//!
//! Turns a decoded descriptor set into the semantic [`Model`] the renderer
//! consumes: the single `Template` message, the resource messages reachable
//! from it, and a [`TypeInfo`] for every field. Field types map onto a closed
//! semantic space; anything outside it fails model construction rather than
//! leaking into generated source.

use std::collections::BTreeMap;

use prost_types::field_descriptor_proto::{Label, Type as FieldType};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::type_map::{self, TEMPLATE_MESSAGE_NAME};

/// Fully qualified name of the host framework's dynamic value-type enum.
const VALUE_TYPE_ENUM: &str = ".lattice.descriptor.ValueType";
const DURATION_TYPE: &str = ".google.protobuf.Duration";
const TIMESTAMP_TYPE: &str = ".google.protobuf.Timestamp";

/// Semantic type of one template field.
///
/// Recursive: map-valued fields nest the value's `TypeInfo` in `map_value`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Canonical type name. Resource-message names carry a leading `*`
    /// marker; strip it with [`crate::type_map::type_name`] before display.
    pub name: String,

    /// The field is typed as the framework's dynamic `ValueType`.
    #[serde(default)]
    pub is_value_type: bool,

    /// The field references another message in the same descriptor set.
    #[serde(default)]
    pub is_resource_message: bool,

    /// The field is a string-keyed map.
    #[serde(default)]
    pub is_map: bool,

    /// Value type of a map field; present iff `is_map`.
    #[serde(default)]
    pub map_value: Option<Box<TypeInfo>>,

    /// Use-path the generated source needs before it can spell `name`.
    #[serde(default)]
    pub import: Option<String>,
}

/// One field of a template or resource message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub ty: TypeInfo,
}

/// One message's generation-relevant shape. The scaffolding template
/// consumes this opaquely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub name: String,
    pub fields: Vec<FieldInfo>,
}

/// One descriptor set's result: the template message plus the resource
/// messages it references, directly or transitively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Module name for this template's generated scaffolding, taken from
    /// the last segment of the schema package declaring `Template`.
    pub pkg_name: String,
    pub template_message: MessageInfo,
    /// Ordered by fully qualified message name.
    pub resource_messages: Vec<MessageInfo>,
}

/// True iff the type carries expression-valued data anywhere: a value type,
/// a resource message, or a map whose value satisfies the same predicate, at
/// any nesting depth.
pub fn contains_value_type_or_res_msg(ti: &TypeInfo) -> bool {
    ti.is_value_type
        || ti.is_resource_message
        || ti.is_map
            && ti
                .map_value
                .as_deref()
                .is_some_and(contains_value_type_or_res_msg)
}

/// Build the model for one descriptor set.
///
/// `label` identifies the originating input in diagnostics only. Fails if
/// the set does not contain exactly one `Template` message or any field's
/// type cannot be mapped.
pub fn build_model(
    fds: &FileDescriptorSet,
    import_mapping: &BTreeMap<String, String>,
    label: &str,
) -> Result<Model> {
    ModelBuilder {
        index: MessageIndex::build(fds),
        import_mapping,
        label,
    }
    .build(fds)
}

// ── Message index ──────────────────────────────────────────────────────

/// Every message in the set (nested types included), keyed by fully
/// qualified name (`.pkg.Msg`, `.pkg.Msg.Nested`).
struct MessageIndex<'a> {
    by_full_name: BTreeMap<String, &'a DescriptorProto>,
}

impl<'a> MessageIndex<'a> {
    fn build(fds: &'a FileDescriptorSet) -> Self {
        let mut by_full_name = BTreeMap::new();
        for file in &fds.file {
            let prefix = if file.package().is_empty() {
                String::new()
            } else {
                format!(".{}", file.package())
            };
            for message in &file.message_type {
                Self::index_message(&prefix, message, &mut by_full_name);
            }
        }
        Self { by_full_name }
    }

    fn index_message(
        prefix: &str,
        message: &'a DescriptorProto,
        out: &mut BTreeMap<String, &'a DescriptorProto>,
    ) {
        let full_name = format!("{prefix}.{}", message.name());
        for nested in &message.nested_type {
            Self::index_message(&full_name, nested, out);
        }
        out.insert(full_name, message);
    }

    fn get(&self, full_name: &str) -> Option<&'a DescriptorProto> {
        self.by_full_name.get(full_name).copied()
    }
}

// ── Model builder ──────────────────────────────────────────────────────

struct ModelBuilder<'a> {
    index: MessageIndex<'a>,
    import_mapping: &'a BTreeMap<String, String>,
    label: &'a str,
}

impl<'a> ModelBuilder<'a> {
    fn build(&self, fds: &'a FileDescriptorSet) -> Result<Model> {
        let (file, template) = self.find_template(fds)?;

        let pkg_name = file
            .package()
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_string();
        if pkg_name.is_empty() {
            return Err(self.err("descriptor file declaring 'Template' has no package"));
        }

        let template_full_name = format!(".{}.{}", file.package(), template.name());
        let resources = self.resolve_resource_graph(template, &template_full_name);

        let template_message = self.message_info(template)?;
        let mut resource_messages = Vec::with_capacity(resources.len());
        for message in resources.values() {
            resource_messages.push(self.message_info(message)?);
        }

        Ok(Model {
            pkg_name,
            template_message,
            resource_messages,
        })
    }

    /// The set must define exactly one top-level `Template` message.
    fn find_template(
        &self,
        fds: &'a FileDescriptorSet,
    ) -> Result<(&'a FileDescriptorProto, &'a DescriptorProto)> {
        let mut found = Vec::new();
        for file in &fds.file {
            for message in &file.message_type {
                if message.name() == TEMPLATE_MESSAGE_NAME {
                    found.push((file, message));
                }
            }
        }
        match found.len() {
            0 => Err(self.err("descriptor set does not define a 'Template' message")),
            1 => Ok(found.remove(0)),
            n => Err(self.err(&format!(
                "descriptor set defines {n} 'Template' messages, expected exactly one"
            ))),
        }
    }

    /// Transitive closure of in-set messages reachable from the template's
    /// fields, keyed (and therefore ordered) by fully qualified name.
    fn resolve_resource_graph(
        &self,
        template: &'a DescriptorProto,
        template_full_name: &str,
    ) -> BTreeMap<String, &'a DescriptorProto> {
        let mut needed: BTreeMap<String, &'a DescriptorProto> = BTreeMap::new();
        let mut queue = vec![template];

        while let Some(message) = queue.pop() {
            for (full_name, desc) in self.referenced_messages(message) {
                if full_name == template_full_name {
                    continue;
                }
                if needed.insert(full_name, desc).is_none() {
                    queue.push(desc);
                }
            }
        }

        needed
    }

    /// In-set messages a message's fields reference. Map fields contribute
    /// their value side, not the synthetic entry message.
    fn referenced_messages(
        &self,
        message: &'a DescriptorProto,
    ) -> Vec<(String, &'a DescriptorProto)> {
        let mut refs = Vec::new();
        for field in &message.field {
            if field.r#type() != FieldType::Message {
                continue;
            }
            let mut target = field.type_name();
            if let Some(entry) = self.index.get(target).filter(|d| is_map_entry(d)) {
                let Some(value_field) = entry.field.iter().find(|f| f.number() == 2) else {
                    continue;
                };
                if value_field.r#type() != FieldType::Message {
                    continue;
                }
                target = value_field.type_name();
            }
            // Well-known types map to std primitives. A set produced with
            // `--include_imports` bundles their file descriptors, so they
            // show up in the index and must not be dragged in as resources.
            if target == DURATION_TYPE || target == TIMESTAMP_TYPE {
                continue;
            }
            if let Some(desc) = self.index.get(target) {
                if !is_map_entry(desc) {
                    refs.push((target.to_string(), desc));
                }
            }
        }
        refs
    }

    fn message_info(&self, message: &DescriptorProto) -> Result<MessageInfo> {
        let mut fields = Vec::with_capacity(message.field.len());
        for field in &message.field {
            fields.push(FieldInfo {
                name: field.name().to_string(),
                ty: self.type_info(field)?,
            });
        }
        Ok(MessageInfo {
            name: message.name().to_string(),
            fields,
        })
    }

    // ── Field type mapping ─────────────────────────────────────────────

    fn type_info(&self, field: &FieldDescriptorProto) -> Result<TypeInfo> {
        // Maps arrive as repeated synthetic `*Entry` messages; resolve them
        // before rejecting other repeated fields.
        if field.r#type() == FieldType::Message {
            if let Some(entry) = self.index.get(field.type_name()).filter(|d| is_map_entry(d)) {
                return self.map_type_info(field, entry);
            }
        }
        if field.label() == Label::Repeated {
            return Err(self.err(&format!(
                "field '{}': repeated fields are not supported, use a map",
                field.name()
            )));
        }

        match field.r#type() {
            FieldType::String => Ok(TypeInfo {
                name: "String".to_string(),
                ..Default::default()
            }),
            FieldType::Bool => Ok(TypeInfo {
                name: "bool".to_string(),
                ..Default::default()
            }),
            FieldType::Int64 => Ok(TypeInfo {
                name: "i64".to_string(),
                ..Default::default()
            }),
            FieldType::Double => Ok(TypeInfo {
                name: "f64".to_string(),
                ..Default::default()
            }),
            FieldType::Bytes => Ok(TypeInfo {
                name: "Vec<u8>".to_string(),
                ..Default::default()
            }),
            FieldType::Message => self.message_type_info(field),
            FieldType::Enum => self.enum_type_info(field),
            other => Err(self.err(&format!(
                "field '{}' has unsupported type {other:?}",
                field.name()
            ))),
        }
    }

    fn map_type_info(
        &self,
        field: &FieldDescriptorProto,
        entry: &DescriptorProto,
    ) -> Result<TypeInfo> {
        let key = entry.field.iter().find(|f| f.number() == 1);
        if key.map(|f| f.r#type()) != Some(FieldType::String) {
            return Err(self.err(&format!(
                "map field '{}' must have string keys",
                field.name()
            )));
        }
        let Some(value_field) = entry.field.iter().find(|f| f.number() == 2) else {
            return Err(self.err(&format!(
                "map field '{}' has no value field",
                field.name()
            )));
        };

        let value = self.type_info(value_field)?;
        // The scaffolding template handles value-type, resource-message, and
        // plain map values; a map nested inside a map has no rendering and
        // is rejected here instead of producing mistyped scaffolding.
        if value.is_map {
            return Err(self.err(&format!(
                "map field '{}' may not have map-typed values",
                field.name()
            )));
        }
        Ok(TypeInfo {
            name: format!("HashMap<String, {}>", type_map::type_name(&value.name)),
            is_map: true,
            import: Some("std::collections::HashMap".to_string()),
            map_value: Some(Box::new(value)),
            ..Default::default()
        })
    }

    fn message_type_info(&self, field: &FieldDescriptorProto) -> Result<TypeInfo> {
        let full_name = field.type_name();
        match full_name {
            DURATION_TYPE => Ok(TypeInfo {
                name: "Duration".to_string(),
                import: Some("std::time::Duration".to_string()),
                ..Default::default()
            }),
            TIMESTAMP_TYPE => Ok(TypeInfo {
                name: "SystemTime".to_string(),
                import: Some("std::time::SystemTime".to_string()),
                ..Default::default()
            }),
            _ => {
                if self.index.get(full_name).is_some() {
                    Ok(TypeInfo {
                        name: format!("*{}", simple_name(full_name)),
                        is_resource_message: true,
                        ..Default::default()
                    })
                } else {
                    self.mapped_external(field, full_name)
                }
            }
        }
    }

    fn enum_type_info(&self, field: &FieldDescriptorProto) -> Result<TypeInfo> {
        let full_name = field.type_name();
        if full_name == VALUE_TYPE_ENUM {
            // The template spells the value-type enum by its canonical
            // path, so no import is attached.
            return Ok(TypeInfo {
                name: "ValueType".to_string(),
                is_value_type: true,
                ..Default::default()
            });
        }
        self.mapped_external(field, full_name)
    }

    /// An externally defined type is usable only through an entry in the
    /// import mapping; it renders as `{module}::{Name}` where `module` is
    /// the last segment of the mapped path.
    fn mapped_external(&self, field: &FieldDescriptorProto, full_name: &str) -> Result<TypeInfo> {
        let package = package_of(full_name);
        let Some(path) = self.import_mapping.get(package) else {
            return Err(self.err(&format!(
                "field '{}': no import mapping for package '{package}' (type {full_name})",
                field.name()
            )));
        };
        let module = path.rsplit("::").next().unwrap_or(path.as_str());
        Ok(TypeInfo {
            name: format!("{module}::{}", simple_name(full_name)),
            import: Some(path.clone()),
            ..Default::default()
        })
    }

    fn err(&self, message: &str) -> Error {
        Error::Model {
            label: self.label.to_string(),
            message: message.to_string(),
        }
    }
}

// ── Shared helpers ─────────────────────────────────────────────────────

fn is_map_entry(message: &DescriptorProto) -> bool {
    message
        .options
        .as_ref()
        .and_then(|o| o.map_entry)
        .unwrap_or(false)
}

/// `.pkg.sub.Msg` → `Msg`
fn simple_name(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}

/// `.pkg.sub.Msg` → `pkg.sub`
fn package_of(full_name: &str) -> &str {
    let trimmed = full_name.trim_start_matches('.');
    match trimmed.rsplit_once('.') {
        Some((package, _)) => package,
        None => "",
    }
}
