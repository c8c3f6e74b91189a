//! User-facing package skeleton `<fn>.ads` / `<fn>.adb`.
//!
//! The declaration is regenerated on every run. The body is created once and then left to
//! the user: when it already exists under the output root the session never opens it.

use crate::backend::{GenContext, GlueBackend};
use crate::config::BackendKind;
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::emit::CodeBuffer;
use crate::error::GlueError;
use crate::model::{FunctionalNode, Interface, Language};
use crate::naming;
use crate::ordered_set::OrderedSet;
use crate::session::{DestinationKind, EmissionSession, SessionOutput};

const ADS_RULE: &str = "--  ----------------------------------------------------  --";
const ADB_RULE: &str = "--  ------------------------------------------------  --";
const RI_RULE: &str = "--  --------------------------------------------------- --";

pub struct AdaSkeletons;

impl GlueBackend for AdaSkeletons {
    fn kind(&self) -> BackendKind {
        BackendKind::AdaSkeletons
    }

    fn applies_to(&self, ctx: &GenContext<'_>, function: &FunctionalNode) -> bool {
        !ctx.options.only_cv && function.language.is_ada_family()
    }

    fn begin<'a>(
        &self,
        ctx: &GenContext<'a>,
        function: &'a FunctionalNode,
    ) -> EmissionSession<'a> {
        let mut session = EmissionSession::open(function, self.kind());
        session.open_destination(DestinationKind::SkeletonDecl);

        let body = DestinationKind::SkeletonBody.rel_path(&function.name);
        if ctx.outputs.exists(&body) {
            session.report(
                Diagnostic::new(
                    DiagnosticCode::IVG0200SkeletonPreserved,
                    format!("user code not overwritten for function {:?}", function.name),
                )
                .at_function(&function.name),
            );
        } else {
            session.open_destination(DestinationKind::SkeletonBody);
        }

        preamble(ctx, &mut session);
        session
    }

    fn emit_interface<'a>(
        &self,
        _ctx: &GenContext<'a>,
        session: &mut EmissionSession<'a>,
        interface: &'a Interface,
    ) -> Result<(), GlueError> {
        let function = session.function();
        let params = naming::parenthesize(&naming::skeleton_params(interface));

        if interface.is_provided() {
            let mut ads = CodeBuffer::new();
            ads.indent();
            ads.line(ADS_RULE);
            ads.line(&format!("--  Provided interface \"{}\"", interface.name));
            ads.line(ADS_RULE);
            ads.line(&format!("procedure {}{params};", interface.name));
            ads.line(&format!(
                "pragma Export(C, {}, \"{}\");",
                interface.name,
                naming::pi_export_symbol(&function.name, &interface.name)
            ));
            ads.blank();
            session.write(DestinationKind::SkeletonDecl, ads);

            let mut adb = CodeBuffer::new();
            adb.indent();
            adb.line(ADB_RULE);
            adb.line(&format!("--  Provided interface \"{}\"", interface.name));
            adb.line(ADB_RULE);
            adb.line(&format!("procedure {}{params} is", interface.name));
            adb.line("pragma Suppress (All_Checks);");
            adb.line("begin");
            adb.blank();
            adb.indent();
            adb.line("null; --  Replace \"null\" with your own code!");
            adb.dedent();
            adb.blank();
            adb.line(&format!("end {};", interface.name));
            adb.blank();
            session.write(DestinationKind::SkeletonBody, adb);
        } else {
            let mut ads = CodeBuffer::new();
            ads.indent();
            ads.line(RI_RULE);
            ads.line(&format!("--  Required interface \"{}\"", interface.name));
            ads.line(RI_RULE);
            ads.line(&format!("procedure {}{params};", interface.name));
            ads.line(&format!(
                "pragma Import(C, {}, \"{}\");",
                interface.name,
                naming::ri_import_symbol(&function.name, &interface.name)
            ));
            ads.line(&format!(
                "procedure {}{params} renames {};",
                naming::ri_relay(&interface.name),
                interface.name
            ));
            ads.blank();
            session.write(DestinationKind::SkeletonDecl, ads);
        }
        Ok(())
    }

    fn end(&self, ctx: &GenContext<'_>, mut session: EmissionSession<'_>) -> SessionOutput {
        let function = session.function();
        let name = function.name.as_str();

        let mut ads = CodeBuffer::new();
        ads.indent();
        if ctx.options.polyorb_hi_c {
            ads.line("--  TASTE API to check if the input queue is empty");
            ads.line("procedure Check_Queue(res: access asn1SccT_Boolean);");
            ads.line(&format!(
                "pragma Import(C, Check_Queue, \"{name}_RI_check_queue\");"
            ));
        }

        let mut adb = CodeBuffer::new();
        adb.indent();
        if !function.timers.is_empty() {
            ads.line(ADB_RULE);
            ads.line("--                  Timers management                 --");
            ads.line(ADB_RULE);
            ads.blank();
            ads.blank();
        }
        for timer in &function.timers {
            timer_declarations(&mut ads, name, timer);

            adb.line(&format!(
                "--  This function is called when the timer \"{timer}\" expires"
            ));
            adb.line(&format!("procedure {timer} is"));
            adb.line("begin");
            adb.indent();
            adb.line("null;  --  Replace \"null\" with your own code!");
            adb.dedent();
            adb.line(&format!("end {timer};"));
            adb.blank();
        }

        if let Some(generic) = &function.instance_of {
            ads.line(&instantiation(function, generic));
        }

        ads.dedent();
        ads.blank();
        ads.line(&format!("end {name};"));
        adb.dedent();
        adb.blank();
        adb.line(&format!("end {name};"));

        session.write(DestinationKind::SkeletonDecl, ads);
        session.write(DestinationKind::SkeletonBody, adb);
        session.close()
    }
}

fn preamble(ctx: &GenContext<'_>, session: &mut EmissionSession<'_>) {
    let function = session.function();
    let name = function.name.as_str();
    let has_params = function.interfaces.iter().any(Interface::has_parameters);

    let mut modules: OrderedSet<String> = OrderedSet::new();
    for i in &function.interfaces {
        modules.extend(
            i.parameters()
                .filter(|p| !p.module.is_empty())
                .map(|p| naming::asn_to_ada(&p.module)),
        );
    }
    modules.extend(
        function
            .data_context_parameters()
            .filter(|cp| !cp.type_module.is_empty())
            .map(|cp| naming::asn_to_ada(&cp.type_module)),
    );

    let mut ads = CodeBuffer::new();
    ads.line("-- This file was generated automatically: DO NOT MODIFY IT !");
    ads.blank();
    ads.line("-- Declaration of the provided and required interfaces");
    ads.blank();
    ads.line("--  pragma style_checks (off);");
    ads.line("--  pragma warnings (off);");
    if !function.timers.is_empty() || ctx.options.polyorb_hi_c {
        ads.line("with TASTE_Basictypes;");
        ads.line("use  TASTE_Basictypes;");
        ads.blank();
    }
    if has_params {
        asn1_clauses(&mut ads, &modules);
    }
    if let Some(generic) = &function.instance_of {
        ads.line(&format!("with {generic};"));
        ads.blank();
    }
    let context: Vec<_> = function.data_context_parameters().collect();
    if !context.is_empty() {
        ads.line("--  Context Parameters defined in interface view");
        ads.line(&format!("with Context_{name};"));
        ads.blank();
    }
    ads.line(&format!("package {name} is"));
    ads.indent();
    for cp in &context {
        ads.line(&format!(
            "{0} : asn1Scc{1} := Context_{name}.{name}_Ctxt.{0};",
            cp.name,
            naming::asn_to_ada(&cp.type_name)
        ));
        ads.line(&format!("pragma Export(C, {0}, \"{name}_{0}\");", cp.name));
    }
    ads.dedent();
    ads.blank();
    session.write(DestinationKind::SkeletonDecl, ads);

    if !session.is_open(DestinationKind::SkeletonBody) {
        return;
    }
    let mut adb = CodeBuffer::new();
    adb.line(&format!("--  User implementation of the {name} function"));
    adb.line("--  This file will never be overwritten once edited and modified");
    adb.line("--  Only the interface of functions is regenerated (in the .ads file)");
    adb.blank();
    adb.line("--  pragma style_checks (off);");
    adb.line("--  pragma warnings (off);");
    if has_params {
        asn1_clauses(&mut adb, &modules);
    }
    if function.language == Language::QGenAda {
        for pi in function.provided() {
            adb.line(&format!("with {0};", pi.name));
            adb.line(&format!("use {0};", pi.name));
            adb.blank();
        }
    }
    adb.line(&format!("package body {name} is"));
    adb.blank();
    session.write(DestinationKind::SkeletonBody, adb);
}

fn asn1_clauses(buf: &mut CodeBuffer, modules: &OrderedSet<String>) {
    buf.line("with AdaASN1RTL;");
    buf.line("use AdaASN1RTL;");
    buf.blank();
    for m in modules {
        buf.line(&format!("with {m};"));
        buf.line(&format!("use {m};"));
        buf.blank();
    }
}

fn timer_declarations(ads: &mut CodeBuffer, function: &str, timer: &str) {
    ads.line(&format!(
        "--  This function is called when the timer \"{timer}\" expires"
    ));
    ads.line(&format!("procedure {timer};"));
    ads.line(&format!(
        "pragma Export(C, {timer}, \"{}\");",
        naming::pi_export_symbol(function, timer)
    ));
    ads.blank();
    ads.line("--  Call this function to set (enable) the timer");
    ads.line("--  Value is in milliseconds, and must be a multiple of 100");
    ads.line(&format!("procedure Set_{timer}(val: access asn1SccT_UInt32);"));
    ads.line(&format!(
        "pragma Import(C, Set_{timer}, \"{function}_RI_SET_{timer}\");"
    ));
    ads.blank();
    ads.line("--  Call this function to reset (disable) the timer");
    ads.line(&format!("procedure Reset_{timer};"));
    ads.line(&format!(
        "pragma Import(C, Reset_{timer}, \"{function}_RI_RESET_{timer}\");"
    ));
    ads.blank();
}

/// `package <fn>_Instance is new <generic>(...)`, binding every required-interface relay and
/// timer control of the function.
fn instantiation(function: &FunctionalNode, generic: &str) -> String {
    let mut actuals: Vec<String> = function
        .required()
        .map(|ri| format!("{} => {}", naming::ri_relay(&ri.name), ri.name))
        .collect();
    for timer in &function.timers {
        actuals.push(format!(
            "Set_{timer} => Set_{timer}, Reset_{timer} => Reset_{timer}"
        ));
    }
    format!(
        "package {}_Instance is new {generic}{};",
        function.name,
        naming::parenthesize(&actuals.join(", "))
    )
}

#[cfg(test)]
mod tests {
    use super::instantiation;
    use crate::model::{
        Direction, FunctionalNode, Interface, RemoteBinding, RuntimeNature, Synchronism,
    };

    #[test]
    fn instantiation_binds_relays_then_timers() {
        let ri = Interface {
            name: "Send".to_string(),
            direction: Direction::Required,
            synchronism: Synchronism::Asynchronous,
            protection: Default::default(),
            remote_function: Some("Peer".to_string()),
            remote_entry: None,
            remote_binding: RemoteBinding::default(),
            calling_provided_interfaces: Vec::new(),
            calling_threads: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        };
        let mut f = FunctionalNode {
            name: "Ctrl".to_string(),
            language: Default::default(),
            runtime: RuntimeNature::Thread,
            interfaces: vec![ri],
            calling_threads: Vec::new(),
            process: None,
            artificial: false,
            instance_of: Some("Generic_Ctrl".to_string()),
            context_parameters: Vec::new(),
            timers: vec!["Tick".to_string()],
        };
        assert_eq!(
            instantiation(&f, "Generic_Ctrl"),
            "package Ctrl_Instance is new Generic_Ctrl(RI_Send => Send, \
             Set_Tick => Set_Tick, Reset_Tick => Reset_Tick);"
        );
        f.interfaces.clear();
        f.timers.clear();
        assert_eq!(
            instantiation(&f, "Generic_Ctrl"),
            "package Ctrl_Instance is new Generic_Ctrl;"
        );
    }
}
