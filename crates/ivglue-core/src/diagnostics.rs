use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GlueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Model,
    Resolve,
    Route,
    Emit,
    Commit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCode {
    #[serde(rename = "IVG0001")]
    IVG0001DeadCode,
    #[serde(rename = "IVG0010")]
    IVG0010InvalidModel,
    #[serde(rename = "IVG0100")]
    IVG0100MissingDestination,
    #[serde(rename = "IVG0110")]
    IVG0110UnsupportedBinding,
    #[serde(rename = "IVG0120")]
    IVG0120MissingSibling,
    #[serde(rename = "IVG0130")]
    IVG0130ThreadWithoutProcess,
    #[serde(rename = "IVG0200")]
    IVG0200SkeletonPreserved,
}

impl DiagnosticCode {
    pub fn code_str(self) -> &'static str {
        match self {
            DiagnosticCode::IVG0001DeadCode => "IVG0001",
            DiagnosticCode::IVG0010InvalidModel => "IVG0010",
            DiagnosticCode::IVG0100MissingDestination => "IVG0100",
            DiagnosticCode::IVG0110UnsupportedBinding => "IVG0110",
            DiagnosticCode::IVG0120MissingSibling => "IVG0120",
            DiagnosticCode::IVG0130ThreadWithoutProcess => "IVG0130",
            DiagnosticCode::IVG0200SkeletonPreserved => "IVG0200",
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            DiagnosticCode::IVG0001DeadCode => {
                "passive function makes a synchronous call but has no calling thread"
            }
            DiagnosticCode::IVG0010InvalidModel => "inconsistent interface model",
            DiagnosticCode::IVG0100MissingDestination => "output destination is not open",
            DiagnosticCode::IVG0110UnsupportedBinding => {
                "unsupported cross-language combination"
            }
            DiagnosticCode::IVG0120MissingSibling => {
                "artificial function has no matching synchronous required interface"
            }
            DiagnosticCode::IVG0130ThreadWithoutProcess => {
                "thread is not deployed on any process"
            }
            DiagnosticCode::IVG0200SkeletonPreserved => "user code not overwritten",
        }
    }

    pub fn default_help(self) -> Option<&'static str> {
        match self {
            DiagnosticCode::IVG0001DeadCode => Some(
                "Connect a thread to the function, or deploy it on a runtime that supports uncalled passive functions.",
            ),
            DiagnosticCode::IVG0110UnsupportedBinding => Some(
                "Wrappers are produced by the alternate generator for this binding; nothing is emitted here.",
            ),
            DiagnosticCode::IVG0130ThreadWithoutProcess => Some(
                "Bind the function to a partition in the deployment view so its output port can be flushed.",
            ),
            _ => None,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagnosticCode::IVG0001DeadCode | DiagnosticCode::IVG0010InvalidModel => {
                Severity::Error
            }
            DiagnosticCode::IVG0200SkeletonPreserved => Severity::Info,
            _ => Severity::Warning,
        }
    }

    pub fn stage(self) -> Stage {
        match self {
            DiagnosticCode::IVG0001DeadCode => Stage::Resolve,
            DiagnosticCode::IVG0010InvalidModel => Stage::Model,
            DiagnosticCode::IVG0110UnsupportedBinding
            | DiagnosticCode::IVG0120MissingSibling
            | DiagnosticCode::IVG0130ThreadWithoutProcess => Stage::Route,
            DiagnosticCode::IVG0100MissingDestination => Stage::Emit,
            DiagnosticCode::IVG0200SkeletonPreserved => Stage::Commit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub stage: Stage,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            stage: code.stage(),
            severity: code.severity(),
            function: None,
            interface: None,
            message: message.into(),
            help: code.default_help().map(|s| s.to_string()),
        }
    }

    pub fn at_function(mut self, function: &str) -> Self {
        self.function = Some(function.to_string());
        self
    }

    pub fn at_interface(mut self, function: &str, interface: &str) -> Self {
        self.function = Some(function.to_string());
        self.interface = Some(interface.to_string());
        self
    }
}

impl From<&GlueError> for Diagnostic {
    fn from(err: &GlueError) -> Self {
        let code = match err {
            GlueError::DeadCode { .. } => DiagnosticCode::IVG0001DeadCode,
            GlueError::Model(_) => DiagnosticCode::IVG0010InvalidModel,
        };
        let mut d = Diagnostic::new(code, err.to_string());
        d.function = err.function().map(str::to_string);
        d.interface = err.interface().map(str::to_string);
        d
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} {:?}: {}",
            self.code.code_str(),
            self.stage,
            self.severity,
            self.message
        )?;
        match (&self.function, &self.interface) {
            (Some(func), Some(iface)) => write!(f, " (at {func}.{iface})")?,
            (Some(func), None) => write!(f, " (at {func})")?,
            _ => {}
        }
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

pub fn render_diagnostics_md() -> String {
    let mut out = String::new();
    out.push_str("# ivglue diagnostics catalog\n\n");
    out.push_str("| Code | Stage | Severity | Message | Help |\n");
    out.push_str("| ---- | ----- | -------- | ------- | ---- |\n");
    for code in all_codes() {
        out.push_str(&format!(
            "| {} | {:?} | {:?} | {} | {} |\n",
            code.code_str(),
            code.stage(),
            code.severity(),
            code.default_message(),
            code.default_help().unwrap_or("")
        ));
    }
    out
}

pub fn all_codes() -> &'static [DiagnosticCode] {
    &[
        DiagnosticCode::IVG0001DeadCode,
        DiagnosticCode::IVG0010InvalidModel,
        DiagnosticCode::IVG0100MissingDestination,
        DiagnosticCode::IVG0110UnsupportedBinding,
        DiagnosticCode::IVG0120MissingSibling,
        DiagnosticCode::IVG0130ThreadWithoutProcess,
        DiagnosticCode::IVG0200SkeletonPreserved,
    ]
}
