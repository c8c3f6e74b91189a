use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Context parameter types that configure the toolchain instead of carrying data.
pub const DIRECTIVE_CONTEXT_TYPES: &[&str] =
    &["Taste-directive", "Simulink-Tunable-Parameter", "Timer"];

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ada,
    C,
    #[serde(rename = "qgenada")]
    QGenAda,
    #[serde(rename = "qgenc")]
    QGenC,
    #[default]
    Other,
}

impl Language {
    /// Code produced by an alternate generator rather than the native toolchain.
    pub fn is_foreign(self) -> bool {
        matches!(self, Language::QGenAda | Language::QGenC)
    }

    /// Languages whose user code lives in an Ada package.
    pub fn is_ada_family(self) -> bool {
        matches!(self, Language::Ada | Language::QGenAda)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeNature {
    Thread,
    Passive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Provided,
    Required,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Synchronism {
    Synchronous,
    #[default]
    Asynchronous,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Protection {
    #[default]
    Protected,
    Unprotected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// ASN.1 module defining `ty`.
    #[serde(default)]
    pub module: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBinding {
    #[serde(default)]
    pub language: Language,
    /// Initialisation entry exported by the alternate generator, if any.
    #[serde(default)]
    pub init: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextParameter {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub type_module: String,
}

impl ContextParameter {
    pub fn is_directive(&self) -> bool {
        DIRECTIVE_CONTEXT_TYPES.contains(&self.type_name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub direction: Direction,
    #[serde(default)]
    pub synchronism: Synchronism,
    /// Accessor for a required interface; aggregate membership for a synchronous
    /// provided one.
    #[serde(default)]
    pub protection: Protection,
    #[serde(default)]
    pub remote_function: Option<String>,
    #[serde(default)]
    pub remote_entry: Option<String>,
    #[serde(default)]
    pub remote_binding: RemoteBinding,
    /// Provided interfaces of the same function from which this required interface is
    /// reachable. Empty means "any of them".
    #[serde(default)]
    pub calling_provided_interfaces: Vec<String>,
    /// Threads known to invoke this (provided) interface.
    #[serde(default)]
    pub calling_threads: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<Parameter>,
    #[serde(default)]
    pub outputs: Vec<Parameter>,
}

impl Interface {
    pub fn is_provided(&self) -> bool {
        self.direction == Direction::Provided
    }

    pub fn is_required(&self) -> bool {
        self.direction == Direction::Required
    }

    pub fn is_synchronous(&self) -> bool {
        self.synchronism == Synchronism::Synchronous
    }

    pub fn is_asynchronous(&self) -> bool {
        self.synchronism == Synchronism::Asynchronous
    }

    pub fn has_parameters(&self) -> bool {
        !self.inputs.is_empty() || !self.outputs.is_empty()
    }

    /// Name of the entry point called on the remote side.
    pub fn entry_point(&self) -> &str {
        self.remote_entry.as_deref().unwrap_or(&self.name)
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.inputs.iter().chain(self.outputs.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionalNode {
    pub name: String,
    #[serde(default)]
    pub language: Language,
    pub runtime: RuntimeNature,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    /// Threads statically known to invoke this function when it is passive.
    #[serde(default)]
    pub calling_threads: Vec<String>,
    /// Deployment process identifier.
    #[serde(default)]
    pub process: Option<String>,
    /// Synthesised by the toolchain rather than written by a user.
    #[serde(default)]
    pub artificial: bool,
    /// Generic package this function instantiates.
    #[serde(default)]
    pub instance_of: Option<String>,
    #[serde(default)]
    pub context_parameters: Vec<ContextParameter>,
    #[serde(default)]
    pub timers: Vec<String>,
}

impl FunctionalNode {
    pub fn is_passive(&self) -> bool {
        self.runtime == RuntimeNature::Passive
    }

    pub fn is_thread(&self) -> bool {
        self.runtime == RuntimeNature::Thread
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn provided(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter().filter(|i| i.is_provided())
    }

    pub fn required(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter().filter(|i| i.is_required())
    }

    pub fn has_async_required(&self) -> bool {
        self.required().any(|i| i.is_asynchronous())
    }

    /// Context parameters that carry data (directives filtered out).
    pub fn data_context_parameters(&self) -> impl Iterator<Item = &ContextParameter> {
        self.context_parameters.iter().filter(|cp| !cp.is_directive())
    }

    /// Runtime identity constant of this function's thread (`<process>_<name>_K`).
    pub fn entity_constant(&self) -> String {
        match &self.process {
            Some(process) => format!("{process}_{}_K", self.name),
            None => format!("{}_K", self.name),
        }
    }
}

/// Every function of one generation run, indexed by name.
#[derive(Debug, Clone)]
pub struct System {
    functions: Vec<FunctionalNode>,
    index: BTreeMap<String, usize>,
}

impl System {
    pub fn new(functions: Vec<FunctionalNode>) -> Result<Self, ModelError> {
        let mut index = BTreeMap::new();
        for (idx, f) in functions.iter().enumerate() {
            if f.name.is_empty() {
                return Err(ModelError::EmptyFunctionName);
            }
            if index.insert(f.name.clone(), idx).is_some() {
                return Err(ModelError::DuplicateFunction {
                    name: f.name.clone(),
                });
            }
        }
        let system = System { functions, index };
        for f in &system.functions {
            system.validate_function(f)?;
        }
        Ok(system)
    }

    fn validate_function(&self, f: &FunctionalNode) -> Result<(), ModelError> {
        for thread in &f.calling_threads {
            if !self.index.contains_key(thread) {
                return Err(ModelError::UnknownCallingThread {
                    function: f.name.clone(),
                    thread: thread.clone(),
                });
            }
        }

        let mut names = BTreeSet::new();
        for i in &f.interfaces {
            if i.name.is_empty() {
                return Err(ModelError::EmptyInterfaceName {
                    function: f.name.clone(),
                });
            }
            if !names.insert(i.name.as_str()) {
                return Err(ModelError::DuplicateInterface {
                    function: f.name.clone(),
                    interface: i.name.clone(),
                });
            }
        }

        for i in &f.interfaces {
            for thread in &i.calling_threads {
                if !self.index.contains_key(thread) {
                    return Err(ModelError::UnknownInterfaceCallingThread {
                        function: f.name.clone(),
                        interface: i.name.clone(),
                        thread: thread.clone(),
                    });
                }
            }
            for calling in &i.calling_provided_interfaces {
                let provided = f.interface(calling).is_some_and(|p| p.is_provided());
                if !provided {
                    return Err(ModelError::UnknownCallingInterface {
                        function: f.name.clone(),
                        interface: i.name.clone(),
                        calling: calling.clone(),
                    });
                }
            }
            if i.is_required() && i.remote_function.is_none() {
                return Err(ModelError::MissingRemoteFunction {
                    function: f.name.clone(),
                    interface: i.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn functions(&self) -> &[FunctionalNode] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&FunctionalNode> {
        self.index.get(name).map(|idx| &self.functions[*idx])
    }
}
