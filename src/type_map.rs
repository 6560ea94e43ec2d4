//! Maps model type names to lattice value-type identifiers and generated
//! scaffolding names.
//!
//! # Value Type Table
//!
//! | model type | value type | Notes |
//! |------------|------------|-------|
//! | `String` | `ValueType::String` | |
//! | `bool` | `ValueType::Bool` | |
//! | `i64` | `ValueType::Int64` | |
//! | `f64` | `ValueType::Double` | |
//! | `Vec<u8>` | `ValueType::IpAddress` | byte fields are assumed to carry addresses |
//! | `Duration` | `ValueType::Duration` | |
//! | `SystemTime` | `ValueType::Timestamp` | |
//! | anything else | empty string | permissive fallback, see [`value_type_constant`] |

/// Reserved name of the root message in every template descriptor set.
///
/// The message named `Template` gets the bare `Type` / `Instance` /
/// `InstanceParam` names; every other message gets name-prefixed ones.
pub const TEMPLATE_MESSAGE_NAME: &str = "Template";

const TYPE_SUFFIX: &str = "Type";
const INSTANCE_SUFFIX: &str = "Instance";
const INSTANCE_PARAM_SUFFIX: &str = "InstanceParam";

/// Fully qualified path of the host framework's value-type enum, as the
/// generated source spells it.
const VALUE_TYPE_PATH: &str = "lattice::descriptor::ValueType";

/// Map a model type name to the lattice value-type identifier used in
/// generated source.
///
/// Names outside the closed table yield an empty string rather than an
/// error; the template decides what an absent kind means, and the
/// downstream format gate rejects any output a blank would corrupt.
pub fn value_type_constant(name: &str) -> String {
    // TODO: descriptors cannot express an address kind yet, so every raw
    // byte field is assumed to be IpAddress. Revisit once the schema
    // compiler grows a dedicated address type.
    let variant = match name {
        "String" => "String",
        "bool" => "Bool",
        "i64" => "Int64",
        "f64" => "Double",
        "Vec<u8>" => "IpAddress",
        "Duration" => "Duration",
        "SystemTime" => "Timestamp",
        _ => return String::new(),
    };
    format!("{VALUE_TYPE_PATH}::{variant}")
}

/// Name of the generated inferred-types struct for a message.
///
/// `"Template"` → `"Type"`, `"Connection"` → `"ConnectionType"`.
pub fn resource_message_type_name(name: &str) -> String {
    if name == TEMPLATE_MESSAGE_NAME {
        TYPE_SUFFIX.to_string()
    } else {
        format!("{name}{TYPE_SUFFIX}")
    }
}

/// Name of the generated runtime-instance struct for a message.
///
/// `"Template"` → `"Instance"`, `"Connection"` → `"Connection"`.
pub fn resource_message_instance_name(name: &str) -> String {
    if name == TEMPLATE_MESSAGE_NAME {
        INSTANCE_SUFFIX.to_string()
    } else {
        name.to_string()
    }
}

/// Name of the generated instance-parameter struct for a message.
///
/// `"Template"` → `"InstanceParam"`, `"Connection"` → `"ConnectionInstanceParam"`.
pub fn resource_message_instance_param_name(name: &str) -> String {
    if name == TEMPLATE_MESSAGE_NAME {
        INSTANCE_PARAM_SUFFIX.to_string()
    } else {
        format!("{name}{INSTANCE_PARAM_SUFFIX}")
    }
}

/// Display name for a model type: strips the leading `*` marker that
/// resource-message type names carry.
pub fn type_name(name: &str) -> &str {
    name.trim_start_matches('*')
}

/// Name of the generated builder function for a type name.
pub fn build_fn_name(name: &str) -> String {
    format!("Build{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_table() {
        assert_eq!(
            value_type_constant("String"),
            "lattice::descriptor::ValueType::String"
        );
        assert_eq!(
            value_type_constant("bool"),
            "lattice::descriptor::ValueType::Bool"
        );
        assert_eq!(
            value_type_constant("i64"),
            "lattice::descriptor::ValueType::Int64"
        );
        assert_eq!(
            value_type_constant("f64"),
            "lattice::descriptor::ValueType::Double"
        );
        assert_eq!(
            value_type_constant("Vec<u8>"),
            "lattice::descriptor::ValueType::IpAddress"
        );
        assert_eq!(
            value_type_constant("Duration"),
            "lattice::descriptor::ValueType::Duration"
        );
        assert_eq!(
            value_type_constant("SystemTime"),
            "lattice::descriptor::ValueType::Timestamp"
        );
    }

    #[test]
    fn unknown_value_type_is_empty() {
        assert_eq!(value_type_constant("u32"), "");
        assert_eq!(value_type_constant(""), "");
        assert_eq!(value_type_constant("*Connection"), "");
    }

    #[test]
    fn type_name_suffixing() {
        assert_eq!(resource_message_type_name("Template"), "Type");
        assert_eq!(resource_message_type_name("Foo"), "FooType");
    }

    #[test]
    fn instance_name_suffixing() {
        assert_eq!(resource_message_instance_name("Template"), "Instance");
        assert_eq!(resource_message_instance_name("Foo"), "Foo");
    }

    #[test]
    fn instance_param_name_suffixing() {
        assert_eq!(
            resource_message_instance_param_name("Template"),
            "InstanceParam"
        );
        assert_eq!(
            resource_message_instance_param_name("Foo"),
            "FooInstanceParam"
        );
    }

    #[test]
    fn type_name_strips_pointer_marker() {
        assert_eq!(type_name("*FooType"), "FooType");
        assert_eq!(type_name("FooType"), "FooType");
    }

    #[test]
    fn build_fn_name_prefixes() {
        assert_eq!(build_fn_name("FooType"), "BuildFooType");
    }
}
