use crate::config::{BackendKind, GenerateOptions};
use crate::error::GlueError;
use crate::model::{FunctionalNode, Interface, System};
use crate::output::OutputRoot;
use crate::session::{EmissionSession, SessionOutput};

pub mod skeletons;
pub mod wrappers;

pub const GENERATED_BANNER: &str =
    "--  This file was generated automatically: DO NOT MODIFY IT !";

/// Read-only inputs shared by every session of a run.
pub struct GenContext<'a> {
    pub system: &'a System,
    pub options: &'a GenerateOptions,
    pub outputs: &'a OutputRoot,
}

pub trait GlueBackend {
    fn kind(&self) -> BackendKind;

    fn applies_to(&self, ctx: &GenContext<'_>, function: &FunctionalNode) -> bool;

    /// Opens the destinations and writes the preamble.
    fn begin<'a>(&self, ctx: &GenContext<'a>, function: &'a FunctionalNode)
        -> EmissionSession<'a>;

    fn emit_interface<'a>(
        &self,
        ctx: &GenContext<'a>,
        session: &mut EmissionSession<'a>,
        interface: &'a Interface,
    ) -> Result<(), GlueError>;

    /// Writes the postamble and closes the session.
    fn end(&self, ctx: &GenContext<'_>, session: EmissionSession<'_>) -> SessionOutput;
}

pub fn backend_for(kind: BackendKind) -> Box<dyn GlueBackend> {
    match kind {
        BackendKind::AdaWrappers => Box::new(wrappers::AdaWrappers),
        BackendKind::AdaSkeletons => Box::new(skeletons::AdaSkeletons),
    }
}
