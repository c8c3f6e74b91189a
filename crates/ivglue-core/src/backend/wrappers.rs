use crate::aggregator;
use crate::backend::{GenContext, GlueBackend, GENERATED_BANNER};
use crate::config::BackendKind;
use crate::decision::{Accessor, Convention, Decision, DecisionEngine, Dispatch, Placement, Route};
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::emit::CodeBuffer;
use crate::error::GlueError;
use crate::model::{FunctionalNode, Interface, Language, Parameter, Protection};
use crate::naming;
use crate::ordered_set::OrderedSet;
use crate::session::{DestinationKind, EmissionSession, SessionOutput};

const RULE: &str = "------------------------------------------------------";

pub struct AdaWrappers;

impl GlueBackend for AdaWrappers {
    fn kind(&self) -> BackendKind {
        BackendKind::AdaWrappers
    }

    fn applies_to(&self, ctx: &GenContext<'_>, function: &FunctionalNode) -> bool {
        if ctx.options.only_cv || ctx.options.polyorb_hi_c {
            return false;
        }
        !(function.language == Language::QGenC && function.provided().next().is_some())
    }

    fn begin<'a>(
        &self,
        ctx: &GenContext<'a>,
        function: &'a FunctionalNode,
    ) -> EmissionSession<'a> {
        let mut session = EmissionSession::open(function, self.kind());
        session.open_destination(DestinationKind::WrappersDecl);
        session.open_destination(DestinationKind::WrappersBody);
        if has_async_ri_package(function) {
            session.open_destination(DestinationKind::AsyncRiDecl);
            session.open_destination(DestinationKind::AsyncRiBody);
        }
        if function.language.is_foreign() {
            session.report(
                Diagnostic::new(
                    DiagnosticCode::IVG0110UnsupportedBinding,
                    format!(
                        "function {:?} is implemented by the alternate generator; its interfaces get no Ada wrapper",
                        function.name
                    ),
                )
                .at_function(&function.name),
            );
        }
        preamble(ctx, &mut session);
        session
    }

    fn emit_interface<'a>(
        &self,
        ctx: &GenContext<'a>,
        session: &mut EmissionSession<'a>,
        interface: &'a Interface,
    ) -> Result<(), GlueError> {
        let function = session.function();
        if function.language.is_foreign() {
            return Ok(());
        }

        let decision = DecisionEngine::new(ctx.system).decide(function, interface)?;
        for d in &decision.diagnostics {
            session.report(d.clone());
        }

        match &decision.route {
            Route::Skip => {}
            Route::DeferToAggregate => aggregator::record(session, interface),
            Route::ForwardToVm { .. } | Route::ForwardToSibling { .. } => {
                if session.require(
                    &[DestinationKind::WrappersDecl, DestinationKind::WrappersBody],
                    &interface.name,
                ) {
                    let (ads, adb) = async_provided(interface, &decision.route);
                    session.write(DestinationKind::WrappersDecl, ads);
                    session.write(DestinationKind::WrappersBody, adb);
                }
            }
            _ => {
                let (decl, body) = match decision.placement {
                    Placement::Wrappers => {
                        (DestinationKind::WrappersDecl, DestinationKind::WrappersBody)
                    }
                    Placement::AsyncRiWrappers => {
                        (DestinationKind::AsyncRiDecl, DestinationKind::AsyncRiBody)
                    }
                };
                if session.require(&[decl, body], &interface.name) {
                    let (ads, adb) = required(function, interface, &decision);
                    session.write(decl, ads);
                    session.write(body, adb);
                }
            }
        }
        Ok(())
    }

    fn end(&self, _ctx: &GenContext<'_>, mut session: EmissionSession<'_>) -> SessionOutput {
        aggregator::synthesize(&mut session);

        let function = session.function();
        let package = naming::wrappers_package(&function.name);

        let mut adb = CodeBuffer::new();
        if session.has_synchronous_interface() && !function.artificial {
            adb.line("begin");
            adb.indent();
            adb.line(&format!("C_Init_{};", function.name));
            adb.dedent();
            adb.blank();
        }
        adb.line(&format!("end {package};"));
        session.write(DestinationKind::WrappersBody, adb);

        let mut ads = CodeBuffer::new();
        ads.line(&format!("end {package};"));
        session.write(DestinationKind::WrappersDecl, ads);

        let async_package = naming::async_ri_package(&function.name);
        for kind in [DestinationKind::AsyncRiDecl, DestinationKind::AsyncRiBody] {
            let mut buf = CodeBuffer::new();
            buf.line(&format!("end {async_package};"));
            session.write(kind, buf);
        }

        session.close()
    }
}

fn has_async_ri_package(function: &FunctionalNode) -> bool {
    function.is_thread() && function.has_async_required()
}

fn binds_qgenada(interface: &Interface) -> bool {
    interface.remote_binding.language == Language::QGenAda
}

fn preamble(ctx: &GenContext<'_>, session: &mut EmissionSession<'_>) {
    let function = session.function();
    let name = function.name.as_str();
    let async_params = function
        .interfaces
        .iter()
        .any(|i| i.is_asynchronous() && i.has_parameters());

    let mut withs: OrderedSet<String> = OrderedSet::new();
    withs.insert("with Interfaces.C;".to_string());
    if async_params {
        withs.insert("with PolyORB_HI_Generated.Types;".to_string());
    }
    if function.language.is_ada_family() {
        withs.insert(format!("with {name};"));
    }
    withs.insert("with PolyORB_HI_Generated.Deployment;".to_string());
    withs.insert("use  PolyORB_HI_Generated.Deployment;".to_string());
    if has_async_ri_package(function) {
        withs.insert(format!("with {};", naming::async_ri_package(name)));
    }
    if function.interfaces.iter().any(binds_qgenada) {
        withs.insert("with taste_dataview;".to_string());
        withs.insert("use taste_dataview;".to_string());
    }

    // Passive functions, and threads exposing unprotected entries, relay asynchronous
    // calls through the wrappers of their calling threads.
    let mixed = function.is_thread()
        && function
            .provided()
            .any(|i| i.protection == Protection::Unprotected);
    if function.is_passive() || mixed {
        for caller in &function.calling_threads {
            let Some(thread) = ctx.system.function(caller) else {
                continue;
            };
            if thread.process == function.process && has_async_ri_package(thread) {
                withs.insert(format!("with {};", naming::async_ri_package(&thread.name)));
            }
        }
    }

    let mut ads = CodeBuffer::new();
    ads.line(GENERATED_BANNER);
    ads.blank();
    ads.line("pragma Style_Checks (Off);");
    ads.line("pragma Warnings (Off);");
    ads.blank();
    for w in &withs {
        ads.line(w);
    }
    ads.blank();
    ads.line(&format!("package {} is", naming::wrappers_package(name)));
    ads.blank();

    let mut adb = CodeBuffer::new();
    adb.line(GENERATED_BANNER);
    adb.blank();
    adb.line("--  pragma Style_Checks (Off);");
    adb.line("--  pragma Warnings (Off);");
    adb.blank();
    adb.line("with PolyORB_HI_Generated.Activity,");
    adb.line("     PolyORB_HI.Utils;");
    adb.line("use  PolyORB_HI_Generated.Activity,");
    adb.line("     PolyORB_HI.Utils;");
    adb.blank();

    // Callee wrappers are withed from the body only; withing them from the declaration
    // can create circular dependencies.
    let callees: OrderedSet<&str> = function
        .required()
        .filter(|i| i.is_synchronous() && !i.remote_binding.language.is_foreign())
        .filter_map(|i| i.remote_function.as_deref())
        .collect();
    let qgen_entries: OrderedSet<&str> = function
        .required()
        .filter(|i| binds_qgenada(i))
        .map(|i| i.entry_point())
        .collect();
    for callee in &callees {
        adb.line(&format!("with {};", naming::wrappers_package(callee)));
    }
    for entry in &qgen_entries {
        let package = naming::qgen_wrapper_package(entry);
        adb.line(&format!("with {package};"));
        adb.line(&format!("use {package};"));
    }
    if !callees.is_empty() || !qgen_entries.is_empty() {
        adb.blank();
    }
    adb.line(&format!("package body {} is", naming::wrappers_package(name)));
    adb.blank();

    if !function.artificial {
        ads.indent();
        ads.line(&format!("procedure C_Init_{name};"));
        ads.blank();
        ads.dedent();

        adb.indent();
        adb.line(&format!("procedure C_Init_{name} is"));
        adb.indent();
        adb.line(&format!("procedure Init_{name};"));
        adb.line(&format!("pragma Import (C, Init_{name}, \"init_{name}\");"));
        adb.blank();
        adb.dedent();
        adb.line("begin");
        adb.indent();
        adb.line(&format!("Init_{name};"));
        adb.dedent();
        adb.line(&format!("end C_Init_{name};"));
        adb.blank();
        adb.dedent();
    }

    let mut inits: OrderedSet<(&str, &str)> = OrderedSet::new();
    for i in function.required().filter(|i| binds_qgenada(i)) {
        if let Some(init) = i.remote_binding.init.as_deref() {
            inits.insert((i.entry_point(), init));
        }
    }
    for (entry, init) in &inits {
        ads.indent();
        ads.line(&format!("procedure QGen_Init_{entry};"));
        ads.line(&format!(
            "pragma Export (C, QGen_Init_{entry}, \"vm_QGen_Init_{entry}\");"
        ));
        ads.blank();
        ads.dedent();

        adb.indent();
        adb.line(&format!("procedure QGen_Init_{entry} is"));
        adb.line("begin");
        adb.indent();
        adb.line(&format!("{entry}.{init};"));
        adb.dedent();
        adb.line(&format!("end QGen_Init_{entry};"));
        adb.blank();
        adb.dedent();
    }

    session.write(DestinationKind::WrappersDecl, ads);
    session.write(DestinationKind::WrappersBody, adb);

    if session.is_open(DestinationKind::AsyncRiDecl) {
        let (ads, adb) = async_ri_preamble(name, async_params);
        session.write(DestinationKind::AsyncRiDecl, ads);
        session.write(DestinationKind::AsyncRiBody, adb);
    }
}

fn async_ri_preamble(name: &str, async_params: bool) -> (CodeBuffer, CodeBuffer) {
    let package = naming::async_ri_package(name);

    let mut ads = CodeBuffer::new();
    ads.line(GENERATED_BANNER);
    ads.blank();
    ads.line("pragma Style_Checks (Off);");
    ads.line("pragma Warnings (Off);");
    ads.blank();
    ads.line("with Interfaces.C;");
    if async_params {
        ads.line("with PolyORB_HI_Generated.Types;");
    }
    ads.line("with PolyORB_HI_Generated.Deployment;");
    ads.line("use  PolyORB_HI_Generated.Deployment;");
    ads.blank();
    ads.line(&format!("package {package} is"));
    ads.blank();

    let mut adb = CodeBuffer::new();
    adb.line(GENERATED_BANNER);
    adb.blank();
    adb.line("--  pragma Style_Checks (Off);");
    adb.line("--  pragma Warnings (Off);");
    adb.blank();
    adb.line("with PolyORB_HI_Generated.Activity;");
    adb.line("use  PolyORB_HI_Generated.Activity;");
    adb.line("with PolyORB_HI.Errors;");
    adb.blank();
    adb.line(&format!("package body {package} is"));
    adb.blank();

    (ads, adb)
}

/// Signature of an asynchronous provided entry: the runtime entity, then at most one
/// marshalled input buffer.
fn async_signature(interface: &Interface) -> Vec<String> {
    let head = format!(
        "procedure {} (dummy_Entity : PolyORB_HI_Generated.Deployment.Entity_Type",
        interface.name
    );
    match interface.inputs.first() {
        None => vec![head],
        Some(p) => vec![
            format!("{head};"),
            format!(
                "   {}Buffer : PolyORB_HI_Generated.Types.{}_Buffer_Impl",
                p.name,
                naming::asn_to_ada(&p.ty)
            ),
        ],
    }
}

fn async_provided(interface: &Interface, route: &Route<'_>) -> (CodeBuffer, CodeBuffer) {
    let signature = async_signature(interface);
    let input: Option<&Parameter> = interface.inputs.first();

    let mut ads = CodeBuffer::new();
    ads.indent();
    ads.line(RULE);
    ads.line(&format!("--  Provided Interface \"{}\"", interface.name));
    ads.line(RULE);
    write_signature(&mut ads, &signature, ");");
    ads.blank();

    let mut adb = CodeBuffer::new();
    adb.indent();
    adb.line(RULE);
    adb.line(&format!(
        "--  Asynchronous Provided Interface \"{}\"",
        interface.name
    ));
    adb.line(RULE);
    write_signature(&mut adb, &signature, ")");
    adb.line("is");
    adb.indent();
    if let Some(p) = input {
        let n = &p.name;
        adb.line(&format!(
            "{n}_AdaBuffer : Interfaces.C.char_array (1 .. Interfaces.C.size_t ({n}Buffer.Length));"
        ));
        adb.line(&format!("pragma Import (Ada, {n}_AdaBuffer);"));
        adb.line(&format!("for {n}_AdaBuffer'Address use {n}Buffer.Buffer'Address;"));
        adb.blank();
    }
    let args = input
        .map(|p| format!(" ({0}_AdaBuffer, {0}_AdaBuffer'Length)", p.name))
        .unwrap_or_default();

    match route {
        Route::ForwardToSibling {
            callee,
            entry,
            accessor,
        } => {
            adb.dedent();
            adb.line("begin");
            adb.indent();
            adb.line(&format!("{}{args};", callee_path(callee, entry, *accessor)));
        }
        Route::ForwardToVm { symbol } => {
            let import = format!("C_{symbol}");
            match input {
                None => adb.line(&format!("procedure {import};")),
                Some(p) => {
                    adb.line(&format!("procedure {import}"));
                    adb.line(&format!("  (C_{}Buffer  : Interfaces.C.char_array;", p.name));
                    adb.line(&format!("   C_{}MaxSize : Integer);", p.name));
                }
            }
            adb.line(&format!("pragma Import (C, {import}, \"{symbol}\");"));
            adb.blank();
            adb.dedent();
            adb.line("begin");
            adb.indent();
            adb.line(&format!("{import}{args};"));
        }
        _ => {
            adb.dedent();
            adb.line("begin");
            adb.indent();
            adb.line("null;");
        }
    }
    adb.dedent();
    adb.line(&format!("end {};", interface.name));
    adb.blank();

    (ads, adb)
}

fn write_signature(buf: &mut CodeBuffer, lines: &[String], close: &str) {
    let last = lines.len().saturating_sub(1);
    for (idx, line) in lines.iter().enumerate() {
        if idx == last {
            buf.line(&format!("{line}{close}"));
        } else {
            buf.line(line);
        }
    }
}

fn callee_path(callee: &str, entry: &str, accessor: Accessor) -> String {
    let package = naming::wrappers_package(callee);
    match accessor {
        Accessor::Protected => {
            format!("{package}.{}.{entry}", naming::protected_object(callee))
        }
        Accessor::Plain => format!("{package}.{entry}"),
    }
}

fn required(
    function: &FunctionalNode,
    interface: &Interface,
    decision: &Decision<'_>,
) -> (CodeBuffer, CodeBuffer) {
    let kind = if interface.is_synchronous() {
        "Synchronous"
    } else {
        "Asynchronous"
    };
    let vm = naming::vm_procedure(&interface.name);
    let params = match decision.convention {
        Convention::QGenAda => naming::qgen_params(interface),
        Convention::Native => naming::native_params(interface),
    };
    let signature = format!("procedure {vm}{}", naming::parenthesize(&params));

    let mut ads = CodeBuffer::new();
    ads.indent();
    ads.line(RULE);
    ads.line(&format!("--  {kind} Required Interface \"{}\"", interface.name));
    ads.line(RULE);
    ads.line(&format!("{signature};"));
    ads.line(&format!(
        "pragma Export (C, {vm}, \"{}\");",
        naming::vm_export_symbol(&function.name, &interface.name, interface.is_asynchronous())
    ));
    ads.blank();

    let mut adb = CodeBuffer::new();
    adb.indent();
    adb.line(RULE);
    adb.line(&format!("--  {kind} Required Interface \"{}\"", interface.name));
    adb.line(RULE);
    adb.line(&format!("{signature} is"));
    required_body(&mut adb, function, interface, &decision.route);
    adb.line(&format!("end {vm};"));
    adb.blank();

    (ads, adb)
}

/// Declarative part (if any), `begin` and statements of a required-interface wrapper.
fn required_body(
    adb: &mut CodeBuffer,
    function: &FunctionalNode,
    interface: &Interface,
    route: &Route<'_>,
) {
    let in_args = naming::parenthesize(&naming::native_args(&interface.inputs, &[]));
    match route {
        Route::CallForeign { target } => {
            adb.line("begin");
            adb.indent();
            adb.line(&format!(
                "{target}{};",
                naming::parenthesize(&naming::qgen_args(interface))
            ));
        }
        Route::CallCallee {
            callee,
            entry,
            accessor,
        } => {
            let args = naming::native_args(&interface.inputs, &interface.outputs);
            adb.line("begin");
            adb.indent();
            adb.line(&format!(
                "{}{};",
                callee_path(callee, entry, *accessor),
                if args.is_empty() {
                    String::new()
                } else {
                    format!(" ({args})")
                }
            ));
        }
        Route::FlushOutport { entity: None } => {
            adb.line("begin");
            adb.indent();
            adb.line("null;");
        }
        Route::FlushOutport {
            entity: Some(entity),
        } => flush_outport(adb, function, interface, entity),
        Route::Dispatch(dispatch) => {
            adb.line("begin");
            adb.indent();
            adb.line("--  Passive function: the call is relayed by the calling thread");
            match dispatch {
                Dispatch::Inert => adb.line("null;"),
                Dispatch::Direct(caller) => adb.line(&format!(
                    "{}.{}{in_args};",
                    naming::async_ri_package(&caller.name),
                    naming::relay_procedure(&interface.name)
                )),
                Dispatch::ByTaskId(callers) => {
                    adb.line("case Get_Task_Id is");
                    adb.indent();
                    for caller in callers {
                        adb.line(&format!("when {} =>", caller.entity_constant()));
                        adb.indent();
                        adb.line(&format!(
                            "{}.{}{in_args};",
                            naming::async_ri_package(&caller.name),
                            naming::relay_procedure(&interface.name)
                        ));
                        adb.dedent();
                    }
                    adb.line("when others => null;");
                    adb.dedent();
                    adb.line("end case;");
                }
            }
        }
        _ => {
            adb.line("begin");
            adb.indent();
            adb.line("null;");
        }
    }
    adb.dedent();
}

fn flush_outport(
    adb: &mut CodeBuffer,
    function: &FunctionalNode,
    interface: &Interface,
    entity: &str,
) {
    let port = format!("OUTPORT_{}", interface.name);
    let port_type = naming::outport_port_type(&function.name);

    adb.indent();
    adb.line(&format!("Value : {}", naming::outport_interface_type(&function.name)));
    adb.line(&format!("  ({port_type}'({port}));"));
    adb.line("Err : PolyORB_HI.Errors.Error_Kind;");
    adb.line("use type PolyORB_HI.Errors.Error_Kind;");
    adb.dedent();
    adb.line("begin");
    adb.indent();
    for p in &interface.inputs {
        let n = &p.name;
        adb.line(&format!("for J in 1 .. IN_{n}_size loop"));
        adb.indent();
        adb.line(&format!(
            "Value.{port}_DATA.Buffer (J) := PolyORB_HI_Generated.Types.Stream_Element_Buffer"
        ));
        adb.line(&format!("   (IN_{n} (Interfaces.C.size_t (J - 1)));"));
        adb.dedent();
        adb.line("end loop;");
        adb.line(&format!(
            "Value.{port}_DATA.Length := PolyORB_HI_Generated.Types.Unsigned_32 (IN_{n}_size);"
        ));
    }
    adb.line(&format!("Put_Value ({entity}, Value);"));
    adb.line(&format!("Err := Send_Output ({entity}, {port_type}'({port}));"));
}

#[cfg(test)]
mod tests {
    use super::callee_path;
    use crate::decision::Accessor;

    #[test]
    fn accessor_selects_protected_object_path() {
        assert_eq!(
            callee_path("Calc", "Add", Accessor::Protected),
            "Calc_Wrappers.Protected_Calc.Add"
        );
        assert_eq!(callee_path("Calc", "Add", Accessor::Plain), "Calc_Wrappers.Add");
    }
}
