use crate::emit::CodeBuffer;
use crate::model::{FunctionalNode, Interface, Language, Protection};
use crate::naming;
use crate::session::{DestinationKind, EmissionSession};

const RULE: &str = "------------------------------------------------------";

pub fn record(session: &mut EmissionSession<'_>, interface: &Interface) {
    if interface.is_provided() && interface.is_synchronous() {
        session.record_synchronous_interface();
    }
}

/// Postamble: the protected object of a passive function plus plain procedures for
/// unprotected entries. Does nothing unless [`record`] saw a synchronous provided interface.
pub fn synthesize(session: &mut EmissionSession<'_>) {
    if !session.has_synchronous_interface() {
        return;
    }
    let function = session.function();
    let entries: Vec<&Interface> = function
        .provided()
        .filter(|i| i.is_synchronous() && i.remote_binding.language != Language::QGenC)
        .collect();
    let (protected, plain): (Vec<&Interface>, Vec<&Interface>) = entries
        .into_iter()
        .partition(|i| i.protection == Protection::Protected);

    // A thread already serialises its entries through its own dispatch.
    if function.is_passive() && !protected.is_empty() {
        let (ads, adb) = protected_object(function, &protected);
        session.write(DestinationKind::WrappersDecl, ads);
        session.write(DestinationKind::WrappersBody, adb);
    }

    for entry in plain {
        let (ads, adb) = plain_procedure(function, entry);
        session.write(DestinationKind::WrappersDecl, ads);
        session.write(DestinationKind::WrappersBody, adb);
    }
}

fn protected_object(function: &FunctionalNode, entries: &[&Interface]) -> (CodeBuffer, CodeBuffer) {
    let object = naming::protected_object(&function.name);

    let mut ads = CodeBuffer::new();
    ads.indent();
    ads.line(RULE);
    ads.line(&format!("--  Protected access to \"{}\"", function.name));
    ads.line(RULE);
    ads.line(&format!("protected {object} is"));
    ads.indent();
    for entry in entries {
        ads.line(&format!("{};", signature(entry)));
    }
    ads.dedent();
    ads.line(&format!("end {object};"));
    ads.blank();

    let mut adb = CodeBuffer::new();
    adb.indent();
    adb.line(&format!("protected body {object} is"));
    adb.indent();
    for entry in entries {
        forwarding_body(&mut adb, function, entry);
    }
    adb.dedent();
    adb.line(&format!("end {object};"));
    adb.blank();

    (ads, adb)
}

fn plain_procedure(function: &FunctionalNode, entry: &Interface) -> (CodeBuffer, CodeBuffer) {
    let mut ads = CodeBuffer::new();
    ads.indent();
    ads.line(RULE);
    ads.line(&format!("--  Unprotected Provided Interface \"{}\"", entry.name));
    ads.line(RULE);
    ads.line(&format!("{};", signature(entry)));
    ads.blank();

    let mut adb = CodeBuffer::new();
    adb.indent();
    forwarding_body(&mut adb, function, entry);
    (ads, adb)
}

fn signature(entry: &Interface) -> String {
    format!(
        "procedure {}{}",
        entry.name,
        naming::parenthesize(&naming::native_params(entry))
    )
}

/// Procedure body importing the user symbol `<function>_<entry>` and calling it.
fn forwarding_body(buf: &mut CodeBuffer, function: &FunctionalNode, entry: &Interface) {
    let import = format!("C_{}", entry.name);
    let params = naming::parenthesize(&naming::native_params(entry));
    let args = naming::parenthesize(&naming::native_args(&entry.inputs, &entry.outputs));

    buf.line(&format!("{} is", signature(entry)));
    buf.indent();
    buf.line(&format!("procedure {import}{params};"));
    buf.line(&format!(
        "pragma Import (C, {import}, \"{}\");",
        naming::user_symbol(&function.name, &entry.name)
    ));
    buf.dedent();
    buf.line("begin");
    buf.indent();
    buf.line(&format!("{import}{args};"));
    buf.dedent();
    buf.line(&format!("end {};", entry.name));
    buf.blank();
}
