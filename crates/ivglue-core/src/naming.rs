use crate::model::{Interface, Parameter};

pub fn asn_to_ada(name: &str) -> String {
    name.replace('-', "_")
}

pub fn wrappers_package(function: &str) -> String {
    format!("{function}_Wrappers")
}

pub fn async_ri_package(function: &str) -> String {
    format!("{function}_Async_RI_Wrappers")
}

pub fn protected_object(function: &str) -> String {
    format!("Protected_{function}")
}

pub fn vm_procedure(interface: &str) -> String {
    format!("vm_{interface}")
}

/// C symbol under which a required-interface wrapper is exported to the glue.
pub fn vm_export_symbol(function: &str, interface: &str, asynchronous: bool) -> String {
    let prefix = if asynchronous { "async_" } else { "" };
    format!("vm_{prefix}{function}_{interface}")
}

/// Procedure of a calling thread that relays a passive function's asynchronous call.
pub fn relay_procedure(interface: &str) -> String {
    format!("vm_{interface}_VT")
}

/// User-code symbol implementing a provided interface.
pub fn user_symbol(function: &str, interface: &str) -> String {
    format!("{function}_{interface}")
}

pub fn pi_export_symbol(function: &str, interface: &str) -> String {
    format!("{function}_PI_{interface}")
}

pub fn ri_import_symbol(function: &str, interface: &str) -> String {
    format!("{function}_RI_{interface}")
}

pub fn ri_relay(interface: &str) -> String {
    format!("RI_{interface}")
}

pub fn outport_interface_type(function: &str) -> String {
    format!("{function}_CV_Thread_{function}_{function}_Others_Interface")
}

pub fn outport_port_type(function: &str) -> String {
    format!("{function}_CV_Thread_{function}_{function}_Others_Port_Type")
}

pub fn qgen_execute(entry: &str) -> String {
    format!("Execute_{entry}_QGenAda")
}

pub fn qgen_wrapper_package(entry: &str) -> String {
    format!("{entry}_QGenAda_wrapper")
}

/// `"(list)"`, or nothing for an empty list.
pub fn parenthesize(list: &str) -> String {
    if list.is_empty() {
        String::new()
    } else {
        format!("({list})")
    }
}

/// Formal parameters of a native wrapper: each parameter travels as a byte buffer
/// and its size.
pub fn native_params(interface: &Interface) -> String {
    let mut parts: Vec<String> = Vec::new();
    for p in &interface.inputs {
        parts.push(format!(
            "IN_{0} : Interfaces.C.char_array; IN_{0}_size : Integer",
            p.name
        ));
    }
    for p in &interface.outputs {
        parts.push(format!(
            "OUT_{0} : in out Interfaces.C.char_array; OUT_{0}_size : access Integer",
            p.name
        ));
    }
    parts.join("; ")
}

pub fn native_args(inputs: &[Parameter], outputs: &[Parameter]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for p in inputs {
        parts.push(format!("IN_{0}, IN_{0}_size", p.name));
    }
    for p in outputs {
        parts.push(format!("OUT_{0}, OUT_{0}_size", p.name));
    }
    parts.join(", ")
}

/// Formal parameters in the alternate generator's convention (typed data-view access).
pub fn qgen_params(interface: &Interface) -> String {
    interface
        .parameters()
        .map(|p| format!("{} : access {}", p.name, asn_to_ada(&p.ty)))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn qgen_args(interface: &Interface) -> String {
    interface
        .parameters()
        .map(|p| p.name.clone())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formal parameters of a user-code procedure in the skeleton package.
pub fn skeleton_params(interface: &Interface) -> String {
    interface
        .parameters()
        .map(|p| format!("{}: access Asn1Scc{}", p.name, asn_to_ada(&p.ty)))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Direction, Interface, Parameter, RemoteBinding, Synchronism};

    fn param(name: &str, ty: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            ty: ty.to_string(),
            module: "Data-View".to_string(),
        }
    }

    fn iface(inputs: Vec<Parameter>, outputs: Vec<Parameter>) -> Interface {
        Interface {
            name: "Compute".to_string(),
            direction: Direction::Required,
            synchronism: Synchronism::Synchronous,
            protection: Default::default(),
            remote_function: Some("Calc".to_string()),
            remote_entry: None,
            remote_binding: RemoteBinding::default(),
            calling_provided_interfaces: Vec::new(),
            calling_threads: Vec::new(),
            inputs,
            outputs,
        }
    }

    #[test]
    fn native_params_put_inputs_before_outputs() {
        let i = iface(vec![param("x", "T-Int")], vec![param("y", "T-Int")]);
        assert_eq!(
            native_params(&i),
            "IN_x : Interfaces.C.char_array; IN_x_size : Integer; \
             OUT_y : in out Interfaces.C.char_array; OUT_y_size : access Integer"
        );
        assert_eq!(native_args(&i.inputs, &i.outputs), "IN_x, IN_x_size, OUT_y, OUT_y_size");
    }

    #[test]
    fn asn1_names_become_ada_identifiers() {
        let i = iface(vec![param("x", "T-Int")], Vec::new());
        assert_eq!(skeleton_params(&i), "x: access Asn1SccT_Int");
        assert_eq!(qgen_params(&i), "x : access T_Int");
        assert_eq!(asn_to_ada("My-Module"), "My_Module");
    }

    #[test]
    fn empty_lists_are_not_parenthesized() {
        assert_eq!(parenthesize(""), "");
        assert_eq!(parenthesize("a"), "(a)");
    }

    #[test]
    fn symbols_follow_link_conventions() {
        assert_eq!(pi_export_symbol("Foo", "Bar"), "Foo_PI_Bar");
        assert_eq!(vm_export_symbol("Foo", "Out", true), "vm_async_Foo_Out");
        assert_eq!(vm_export_symbol("Foo", "Out", false), "vm_Foo_Out");
        assert_eq!(
            outport_port_type("T"),
            "T_CV_Thread_T_T_Others_Port_Type"
        );
    }
}
