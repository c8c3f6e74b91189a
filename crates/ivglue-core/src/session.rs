//! Per-function emission sessions.
//!
//! A session owns the in-memory destinations of one function for one backend. Nothing
//! reaches the file system from here: [`EmissionSession::close`] hands the finished
//! sources back to the caller, and a session dropped on an error path simply discards
//! whatever it had buffered.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::BackendKind;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Severity};
use crate::emit::CodeBuffer;
use crate::model::FunctionalNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DestinationKind {
    WrappersDecl,
    WrappersBody,
    AsyncRiDecl,
    AsyncRiBody,
    SkeletonDecl,
    SkeletonBody,
}

impl DestinationKind {
    pub fn file_name(self, function: &str) -> String {
        match self {
            DestinationKind::WrappersDecl => format!("{function}_wrappers.ads"),
            DestinationKind::WrappersBody => format!("{function}_wrappers.adb"),
            DestinationKind::AsyncRiDecl => format!("{function}_async_ri_wrappers.ads"),
            DestinationKind::AsyncRiBody => format!("{function}_async_ri_wrappers.adb"),
            DestinationKind::SkeletonDecl => format!("{function}.ads"),
            DestinationKind::SkeletonBody => format!("{function}.adb"),
        }
    }

    /// Path relative to the output root: `<function>/<file>`.
    pub fn rel_path(self, function: &str) -> PathBuf {
        PathBuf::from(function).join(self.file_name(function))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub function: String,
    pub kind: DestinationKind,
    pub rel_path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Default)]
pub struct SessionOutput {
    pub files: Vec<GeneratedFile>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct EmissionSession<'a> {
    function: &'a FunctionalNode,
    backend: BackendKind,
    destinations: BTreeMap<DestinationKind, CodeBuffer>,
    has_synchronous_interface: bool,
    diagnostics: Vec<Diagnostic>,
    closed: bool,
}

impl<'a> EmissionSession<'a> {
    pub fn open(function: &'a FunctionalNode, backend: BackendKind) -> Self {
        debug!(
            function = function.name.as_str(),
            backend = backend.as_str(),
            "open emission session"
        );
        Self {
            function,
            backend,
            destinations: BTreeMap::new(),
            has_synchronous_interface: false,
            diagnostics: Vec::new(),
            closed: false,
        }
    }

    pub fn function(&self) -> &'a FunctionalNode {
        self.function
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn open_destination(&mut self, kind: DestinationKind) {
        self.destinations.entry(kind).or_default();
    }

    pub fn is_open(&self, kind: DestinationKind) -> bool {
        self.destinations.contains_key(&kind)
    }

    /// Checks that every destination an interface needs is open; records a skip otherwise.
    pub fn require(&mut self, kinds: &[DestinationKind], interface: &str) -> bool {
        let missing: Vec<String> = kinds
            .iter()
            .filter(|k| !self.is_open(**k))
            .map(|k| k.file_name(&self.function.name))
            .collect();
        if missing.is_empty() {
            return true;
        }
        let d = Diagnostic::new(
            DiagnosticCode::IVG0100MissingDestination,
            format!(
                "{} not open; interface {interface:?} skipped",
                missing.join(", ")
            ),
        )
        .at_interface(&self.function.name, interface);
        self.report(d);
        false
    }

    /// Appends to `kind` when it is open; a closed destination swallows the text.
    pub fn write(&mut self, kind: DestinationKind, buf: CodeBuffer) {
        if let Some(dest) = self.destinations.get_mut(&kind) {
            dest.append(buf);
        }
    }

    pub fn record_synchronous_interface(&mut self) {
        self.has_synchronous_interface = true;
    }

    pub fn has_synchronous_interface(&self) -> bool {
        self.has_synchronous_interface
    }

    pub fn report(&mut self, d: Diagnostic) {
        match d.severity {
            Severity::Info => info!("{d}"),
            _ => warn!("{d}"),
        }
        self.diagnostics.push(d);
    }

    pub fn close(mut self) -> SessionOutput {
        self.closed = true;
        let destinations = std::mem::take(&mut self.destinations);
        let function = self.function.name.clone();
        let files = destinations
            .into_iter()
            .map(|(kind, buf)| GeneratedFile {
                function: function.clone(),
                kind,
                rel_path: kind.rel_path(&function),
                contents: buf.into_string(),
            })
            .collect::<Vec<_>>();
        debug!(
            function = function.as_str(),
            backend = self.backend.as_str(),
            files = files.len(),
            "close emission session"
        );
        SessionOutput {
            files,
            diagnostics: std::mem::take(&mut self.diagnostics),
        }
    }
}

impl Drop for EmissionSession<'_> {
    fn drop(&mut self) {
        if !self.closed && !self.destinations.is_empty() {
            debug!(
                function = self.function.name.as_str(),
                backend = self.backend.as_str(),
                discarded = self.destinations.len(),
                "emission session aborted; buffered output discarded"
            );
        }
    }
}
