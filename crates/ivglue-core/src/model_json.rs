use std::path::Path;

use anyhow::{Context, Result};
use ivglue_contracts::IVGLUE_MODEL_SCHEMA_VERSIONS_SUPPORTED;
use serde::Deserialize;

use crate::model::{FunctionalNode, Interface, Parameter, System};

#[derive(Debug, Clone, Deserialize)]
pub struct ModelDocument {
    pub schema_version: String,
    #[serde(default)]
    pub functions: Vec<FunctionalNode>,
}

pub fn load_model(path: &Path) -> Result<System> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("[IVGMODEL_READ] read model: {}", path.display()))?;
    parse_model_bytes(&bytes, path)
}

pub fn parse_model_bytes(bytes: &[u8], path: &Path) -> Result<System> {
    let mut doc: ModelDocument = serde_json::from_slice(bytes)
        .with_context(|| format!("[IVGMODEL_PARSE] parse model JSON: {}", path.display()))?;

    normalize_string_in_place(&mut doc.schema_version);
    if !IVGLUE_MODEL_SCHEMA_VERSIONS_SUPPORTED
        .iter()
        .any(|v| *v == doc.schema_version)
    {
        anyhow::bail!(
            "model schema_version mismatch: expected one of {:?} got {:?}",
            IVGLUE_MODEL_SCHEMA_VERSIONS_SUPPORTED,
            doc.schema_version
        );
    }

    for f in &mut doc.functions {
        normalize_function(f);
    }

    System::new(doc.functions)
        .with_context(|| format!("[IVGMODEL_INVALID] invalid model: {}", path.display()))
}

fn normalize_function(f: &mut FunctionalNode) {
    normalize_string_in_place(&mut f.name);
    normalize_vec_in_place(&mut f.calling_threads);
    normalize_vec_in_place(&mut f.timers);
    normalize_opt_in_place(&mut f.process);
    normalize_opt_in_place(&mut f.instance_of);
    for cp in &mut f.context_parameters {
        normalize_string_in_place(&mut cp.name);
        normalize_string_in_place(&mut cp.type_name);
        normalize_string_in_place(&mut cp.type_module);
    }
    for i in &mut f.interfaces {
        normalize_interface(i);
    }
}

fn normalize_interface(i: &mut Interface) {
    normalize_string_in_place(&mut i.name);
    normalize_opt_in_place(&mut i.remote_function);
    normalize_opt_in_place(&mut i.remote_entry);
    normalize_opt_in_place(&mut i.remote_binding.init);
    normalize_vec_in_place(&mut i.calling_provided_interfaces);
    normalize_vec_in_place(&mut i.calling_threads);
    for p in i.inputs.iter_mut().chain(i.outputs.iter_mut()) {
        normalize_param(p);
    }
}

fn normalize_param(p: &mut Parameter) {
    normalize_string_in_place(&mut p.name);
    normalize_string_in_place(&mut p.ty);
    normalize_string_in_place(&mut p.module);
}

fn normalize_string_in_place(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}

fn normalize_vec_in_place(v: &mut Vec<String>) {
    for s in v.iter_mut() {
        normalize_string_in_place(s);
    }
    v.retain(|s| !s.is_empty());
}

fn normalize_opt_in_place(v: &mut Option<String>) {
    if let Some(s) = v.as_mut() {
        normalize_string_in_place(s);
    }
    if v.as_deref() == Some("") {
        *v = None;
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::parse_model_bytes;
    use crate::model::{Language, Protection, RuntimeNature, Synchronism};

    fn bytes(v: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&v).expect("encode model JSON")
    }

    #[test]
    fn decodes_defaults_and_trims_names() {
        let doc = json!({
            "schema_version": "ivglue.model@0.1.0",
            "functions": [{
                "name": " Sensor ",
                "runtime": "thread",
                "process": "",
                "interfaces": [{
                    "name": "Tick",
                    "direction": "provided",
                }],
            }],
        });
        let system = parse_model_bytes(&bytes(doc), Path::new("model.json")).expect("model");
        let f = system.function("Sensor").expect("trimmed name");
        assert_eq!(f.runtime, RuntimeNature::Thread);
        assert_eq!(f.language, Language::Other);
        assert_eq!(f.process, None);
        let tick = f.interface("Tick").expect("Tick");
        assert_eq!(tick.synchronism, Synchronism::Asynchronous);
        assert_eq!(tick.protection, Protection::Protected);
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let doc = json!({"schema_version": "ivglue.model@9.9.9", "functions": []});
        let err = parse_model_bytes(&bytes(doc), Path::new("model.json")).unwrap_err();
        assert!(format!("{err:#}").contains("schema_version mismatch"));
    }

    #[test]
    fn rejects_required_interface_without_remote() {
        let doc = json!({
            "schema_version": "ivglue.model@0.1.0",
            "functions": [{
                "name": "A",
                "runtime": "passive",
                "interfaces": [{"name": "Out", "direction": "required"}],
            }],
        });
        let err = parse_model_bytes(&bytes(doc), Path::new("model.json")).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("IVGMODEL_INVALID"), "{msg}");
        assert!(msg.contains("has no remote function"), "{msg}");
    }
}
