use tracing::debug;

use crate::backend::{backend_for, GenContext, GlueBackend};
use crate::config::{BackendKind, GenerateOptions};
use crate::diagnostics::Diagnostic;
use crate::error::GlueError;
use crate::model::{FunctionalNode, System};
use crate::output::OutputRoot;
use crate::session::{GeneratedFile, SessionOutput};

/// Everything one run produced, still in memory.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub files: Vec<GeneratedFile>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs one backend over one function: preamble, every interface in declaration order,
/// postamble. On error the session is dropped with everything it buffered.
pub fn generate_function<'a>(
    ctx: &GenContext<'a>,
    backend: &dyn GlueBackend,
    function: &'a FunctionalNode,
) -> Result<SessionOutput, GlueError> {
    let mut session = backend.begin(ctx, function);
    for interface in &function.interfaces {
        backend.emit_interface(ctx, &mut session, interface)?;
    }
    Ok(backend.end(ctx, session))
}

/// Renders every applicable (function, backend) pair. The first fatal error aborts the run
/// and nothing is returned for any function.
pub fn generate_system(
    system: &System,
    options: &GenerateOptions,
    outputs: &OutputRoot,
) -> Result<GenerationReport, GlueError> {
    let ctx = GenContext {
        system,
        options,
        outputs,
    };
    let backends: Vec<Box<dyn GlueBackend>> = BackendKind::ALL
        .into_iter()
        .filter(|k| options.enabled(*k))
        .map(backend_for)
        .collect();

    let mut report = GenerationReport::default();
    for function in system.functions() {
        for backend in &backends {
            if !backend.applies_to(&ctx, function) {
                debug!(
                    function = function.name.as_str(),
                    backend = backend.kind().as_str(),
                    "backend not applicable"
                );
                continue;
            }
            let out = generate_function(&ctx, backend.as_ref(), function)?;
            report.files.extend(out.files);
            report.diagnostics.extend(out.diagnostics);
        }
    }
    debug!(
        functions = system.functions().len(),
        files = report.files.len(),
        diagnostics = report.diagnostics.len(),
        "generation complete"
    );
    Ok(report)
}
