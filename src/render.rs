//! Scaffolding template rendering.
//!
//! One sequential tera pass over a [`BootstrapModel`] produces the raw
//! generated source plus the list of imports the executed template branches
//! actually touched. The template body is an external artifact; the helper
//! functions registered here are the fixed contract it is written against.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tera::{Context, Tera, Value};

use crate::error::{Error, Result};
use crate::model::{self, Model, TypeInfo};
use crate::type_map;

/// Placeholder line the template leaves where imports get injected.
///
/// Deliberately not valid Rust: if substitution is ever skipped, the
/// formatting gate fails instead of a broken file being written.
pub const IMPORT_PLACEHOLDER: &str = "$$additional_imports$$";

/// The default scaffolding grammar, compiled into the binary.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/scaffold.rs.tera");

/// Render context: one [`Model`] per descriptor set, in input order.
#[derive(Debug, Serialize)]
pub struct BootstrapModel {
    /// Package the generated file belongs to, named after the output
    /// file's parent directory.
    pub pkg_name: String,
    pub template_models: Vec<Model>,
}

/// Render-scoped collector for the imports the template reports.
///
/// Clones share the underlying list, so a handle can be registered with
/// tera while the caller keeps another to read the result. Each render
/// pass creates a fresh accumulator; nothing survives the pass.
#[derive(Clone, Debug, Default)]
pub struct ImportAccumulator {
    seen: Arc<Mutex<Vec<String>>>,
}

impl ImportAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a use-path unless an identical one was already recorded this
    /// pass. First-seen order is preserved.
    pub fn record(&self, path: &str) {
        let decl = format!("use {path};");
        let mut seen = self.seen.lock().unwrap();
        if !seen.contains(&decl) {
            seen.push(decl);
        }
    }

    /// Snapshot of the recorded use declarations, in first-seen order.
    pub fn imports(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

/// Execute one render pass over `model` with the given template source.
///
/// Returns the rendered source (still containing [`IMPORT_PLACEHOLDER`])
/// and the ordered, deduplicated import list observed during rendering.
pub fn render(template_src: &str, model: &BootstrapModel) -> Result<(String, Vec<String>)> {
    let accumulator = ImportAccumulator::new();

    let mut tera = Tera::default();
    tera.add_raw_template("scaffold", template_src)
        .map_err(|e| Error::Render { source: e })?;
    register_helpers(&mut tera, &accumulator);

    let context = Context::from_serialize(model).map_err(|e| Error::Render { source: e })?;
    let source = tera
        .render("scaffold", &context)
        .map_err(|e| Error::Render { source: e })?;

    Ok((source, accumulator.imports()))
}

/// Wire the fixed helper contract into a tera instance.
///
/// All helpers are pure functions over [`crate::type_map`] and
/// [`crate::model`] except `report_type_used`, whose only effect is to
/// record into `accumulator`.
pub fn register_helpers(tera: &mut Tera, accumulator: &ImportAccumulator) {
    let acc = accumulator.clone();
    tera.register_function(
        "report_type_used",
        move |args: &HashMap<String, Value>| -> tera::Result<Value> {
            let ti = type_info_arg(args)?;
            if let Some(import) = ti.import.as_deref() {
                if !import.is_empty() {
                    acc.record(import);
                }
            }
            // Renders as nothing; the call exists for its side effect.
            Ok(Value::String(String::new()))
        },
    );

    tera.register_function("value_type", value_type);
    tera.register_function(
        "contains_value_type_or_res_msg",
        contains_value_type_or_res_msg,
    );
    tera.register_function("type_name", type_name);
    tera.register_function("resource_message_type_name", resource_message_type_name);
    tera.register_function(
        "resource_message_instance_name",
        resource_message_instance_name,
    );
    tera.register_function(
        "resource_message_instance_param_name",
        resource_message_instance_param_name,
    );
    tera.register_function("build_fn_name", build_fn_name);
    tera.register_function("all_messages", all_messages);
}

fn value_type(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let ti = type_info_arg(args)?;
    Ok(Value::String(type_map::value_type_constant(&ti.name)))
}

fn contains_value_type_or_res_msg(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let ti = type_info_arg(args)?;
    Ok(Value::Bool(model::contains_value_type_or_res_msg(&ti)))
}

fn type_name(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let ti = type_info_arg(args)?;
    Ok(Value::String(type_map::type_name(&ti.name).to_string()))
}

fn resource_message_type_name(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let name = name_arg(args)?;
    Ok(Value::String(type_map::resource_message_type_name(&name)))
}

fn resource_message_instance_name(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let name = name_arg(args)?;
    Ok(Value::String(type_map::resource_message_instance_name(
        &name,
    )))
}

fn resource_message_instance_param_name(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let name = name_arg(args)?;
    Ok(Value::String(
        type_map::resource_message_instance_param_name(&name),
    ))
}

fn build_fn_name(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let name = name_arg(args)?;
    Ok(Value::String(type_map::build_fn_name(&name)))
}

/// Template message first, then resource messages in their original order.
fn all_messages(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let value = args
        .get("model")
        .ok_or_else(|| tera::Error::msg("all_messages: missing 'model' argument"))?;
    let model: Model = serde_json::from_value(value.clone())
        .map_err(|e| tera::Error::msg(format!("all_messages: not a Model: {e}")))?;

    let mut messages = vec![model.template_message];
    messages.extend(model.resource_messages);
    serde_json::to_value(messages).map_err(|e| tera::Error::msg(e.to_string()))
}

fn type_info_arg(args: &HashMap<String, Value>) -> tera::Result<TypeInfo> {
    let value = args
        .get("ti")
        .ok_or_else(|| tera::Error::msg("missing 'ti' argument"))?;
    serde_json::from_value(value.clone())
        .map_err(|e| tera::Error::msg(format!("'ti' is not a TypeInfo: {e}")))
}

fn name_arg(args: &HashMap<String, Value>) -> tera::Result<String> {
    args.get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| tera::Error::msg("missing 'name' argument"))
}
