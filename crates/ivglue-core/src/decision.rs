use tracing::{debug, error};

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::error::GlueError;
use crate::model::{
    Direction, FunctionalNode, Interface, Language, Protection, RuntimeNature, Synchronism,
    System,
};
use crate::naming;
use crate::resolver::{CallerCount, CallingThreadResolver};

/// Parameter marshalling and call-target naming applied to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    Native,
    QGenAda,
}

impl Convention {
    pub fn of(interface: &Interface) -> Self {
        match interface.remote_binding.language {
            Language::QGenAda => Convention::QGenAda,
            _ => Convention::Native,
        }
    }
}

/// How a synchronous callee is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// Through the callee's protected object.
    Protected,
    Plain,
}

impl Accessor {
    pub fn of(protection: Protection) -> Self {
        match protection {
            Protection::Protected => Accessor::Protected,
            Protection::Unprotected => Accessor::Plain,
        }
    }
}

/// Which pair of wrapper files receives the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Wrappers,
    AsyncRiWrappers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<'a> {
    /// No thread can reach the call: the wrapper does nothing.
    Inert,
    /// Exactly one thread: unconditional relay.
    Direct(&'a FunctionalNode),
    /// Select the relay on the identity of the running thread.
    ByTaskId(Vec<&'a FunctionalNode>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    /// Synchronous provided interface; emitted by the protected-object aggregator.
    DeferToAggregate,
    /// Asynchronous provided interface calling the imported user symbol.
    ForwardToVm { symbol: String },
    /// Asynchronous provided interface of an artificial function, short-circuited to the
    /// synchronous call it stands for.
    ForwardToSibling {
        callee: &'a str,
        entry: &'a str,
        accessor: Accessor,
    },
    CallCallee {
        callee: &'a str,
        entry: &'a str,
        accessor: Accessor,
    },
    /// Required interface bound to code from the alternate generator.
    CallForeign { target: String },
    /// Marshal into the thread's outbound port and send at once. `entity` is `None` when
    /// the thread is not deployed on a process.
    FlushOutport { entity: Option<String> },
    Dispatch(Dispatch<'a>),
    /// Nothing can be emitted for this combination.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision<'a> {
    pub route: Route<'a>,
    pub convention: Convention,
    pub placement: Placement,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct DecisionEngine<'a> {
    resolver: CallingThreadResolver<'a>,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(system: &'a System) -> Self {
        Self {
            resolver: CallingThreadResolver::new(system),
        }
    }

    pub fn decide(
        &self,
        function: &'a FunctionalNode,
        interface: &'a Interface,
    ) -> Result<Decision<'a>, GlueError> {
        let convention = Convention::of(interface);
        let placement =
            if function.is_thread() && interface.is_required() && interface.is_asynchronous() {
                Placement::AsyncRiWrappers
            } else {
                Placement::Wrappers
            };
        let mut diagnostics = Vec::new();

        let route = if interface.remote_binding.language == Language::QGenC {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::IVG0110UnsupportedBinding,
                    format!(
                        "interface {:?} is bound to QGenC code; no Ada wrapper emitted",
                        interface.name
                    ),
                )
                .at_interface(&function.name, &interface.name),
            );
            Route::Skip
        } else {
            match (interface.direction, interface.synchronism, function.runtime) {
                (Direction::Provided, Synchronism::Synchronous, _) => Route::DeferToAggregate,
                (Direction::Provided, Synchronism::Asynchronous, _) => {
                    self.route_async_provided(function, interface, &mut diagnostics)
                }
                (Direction::Required, Synchronism::Synchronous, runtime) => {
                    if runtime == RuntimeNature::Passive {
                        self.check_reachable(function, interface)?;
                    }
                    foreign_or(interface, convention, || Route::CallCallee {
                        callee: remote_function(interface),
                        entry: interface.entry_point(),
                        accessor: Accessor::of(interface.protection),
                    })
                }
                (Direction::Required, Synchronism::Asynchronous, RuntimeNature::Thread) => {
                    foreign_or(interface, convention, || {
                        if function.process.is_none() {
                            diagnostics.push(
                                Diagnostic::new(
                                    DiagnosticCode::IVG0130ThreadWithoutProcess,
                                    format!(
                                        "thread {:?} has no deployment process; {:?} is not flushed",
                                        function.name, interface.name
                                    ),
                                )
                                .at_interface(&function.name, &interface.name),
                            );
                            return Route::FlushOutport { entity: None };
                        }
                        Route::FlushOutport {
                            entity: Some(function.entity_constant()),
                        }
                    })
                }
                (Direction::Required, Synchronism::Asynchronous, RuntimeNature::Passive) => {
                    foreign_or(interface, convention, || {
                        Route::Dispatch(self.dispatch_for(function, interface))
                    })
                }
            }
        };

        debug!(
            function = function.name.as_str(),
            interface = interface.name.as_str(),
            route = ?route,
            "routed interface"
        );

        Ok(Decision {
            route,
            convention,
            placement,
            diagnostics,
        })
    }

    /// Calling threads of a required interface, as the dispatch policy sees them.
    pub fn dispatch_for(
        &self,
        function: &'a FunctionalNode,
        interface: &'a Interface,
    ) -> Dispatch<'a> {
        let callers = self.resolver.resolve(function, interface);
        match CallerCount::of(callers.len()) {
            CallerCount::None => Dispatch::Inert,
            CallerCount::One => Dispatch::Direct(callers[0]),
            CallerCount::Many => Dispatch::ByTaskId(callers),
        }
    }

    fn check_reachable(
        &self,
        function: &'a FunctionalNode,
        interface: &'a Interface,
    ) -> Result<(), GlueError> {
        if self.resolver.resolve_names(function, interface).is_empty() {
            error!(
                function = function.name.as_str(),
                interface = interface.name.as_str(),
                "passive function is not called by anyone (dead code)"
            );
            return Err(GlueError::DeadCode {
                function: function.name.clone(),
                interface: interface.name.clone(),
            });
        }
        Ok(())
    }

    fn route_async_provided(
        &self,
        function: &'a FunctionalNode,
        interface: &'a Interface,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Route<'a> {
        let vm = Route::ForwardToVm {
            symbol: naming::user_symbol(&function.name, &interface.name),
        };
        if !function.artificial {
            return vm;
        }

        let entry = interface.entry_point();
        let sibling = function
            .required()
            .filter(|ri| ri.is_synchronous() && ri.entry_point() == entry)
            .last();
        match sibling {
            Some(ri) => Route::ForwardToSibling {
                callee: remote_function(ri),
                entry,
                accessor: Accessor::of(ri.protection),
            },
            None => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::IVG0120MissingSibling,
                        format!(
                            "no synchronous required interface calls {entry:?}; {:?} forwarded to the user symbol",
                            interface.name
                        ),
                    )
                    .at_interface(&function.name, &interface.name),
                );
                vm
            }
        }
    }
}

fn foreign_or<'a>(
    interface: &'a Interface,
    convention: Convention,
    native: impl FnOnce() -> Route<'a>,
) -> Route<'a> {
    match convention {
        Convention::QGenAda => Route::CallForeign {
            target: naming::qgen_execute(interface.entry_point()),
        },
        Convention::Native => native(),
    }
}

fn remote_function(interface: &Interface) -> &str {
    // Required interfaces always carry a remote function once the System is built.
    interface.remote_function.as_deref().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{Accessor, Convention, DecisionEngine, Dispatch, Placement, Route};
    use crate::diagnostics::DiagnosticCode;
    use crate::error::GlueError;
    use crate::model::{
        Direction, FunctionalNode, Interface, Language, Protection, RemoteBinding, RuntimeNature,
        Synchronism, System,
    };

    fn node(name: &str, runtime: RuntimeNature) -> FunctionalNode {
        FunctionalNode {
            name: name.to_string(),
            language: Language::Ada,
            runtime,
            interfaces: Vec::new(),
            calling_threads: Vec::new(),
            process: Some("part1".to_string()),
            artificial: false,
            instance_of: None,
            context_parameters: Vec::new(),
            timers: Vec::new(),
        }
    }

    fn pi(name: &str, synchronism: Synchronism) -> Interface {
        Interface {
            name: name.to_string(),
            direction: Direction::Provided,
            synchronism,
            protection: Protection::Protected,
            remote_function: None,
            remote_entry: None,
            remote_binding: RemoteBinding::default(),
            calling_provided_interfaces: Vec::new(),
            calling_threads: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    fn ri(name: &str, synchronism: Synchronism, callee: &str) -> Interface {
        Interface {
            direction: Direction::Required,
            remote_function: Some(callee.to_string()),
            ..pi(name, synchronism)
        }
    }

    fn system(nodes: Vec<FunctionalNode>) -> System {
        System::new(nodes).expect("valid system")
    }

    #[test]
    fn sync_provided_is_deferred() {
        let mut foo = node("Foo", RuntimeNature::Thread);
        foo.interfaces.push(pi("Bar", Synchronism::Synchronous));
        let sys = system(vec![foo]);
        let f = sys.function("Foo").expect("Foo");
        let d = DecisionEngine::new(&sys)
            .decide(f, &f.interfaces[0])
            .expect("decide");
        assert_eq!(d.route, Route::DeferToAggregate);
        assert_eq!(d.placement, Placement::Wrappers);
    }

    #[test]
    fn async_provided_forwards_to_user_symbol() {
        let mut foo = node("Foo", RuntimeNature::Thread);
        foo.interfaces.push(pi("Tick", Synchronism::Asynchronous));
        let sys = system(vec![foo]);
        let f = sys.function("Foo").expect("Foo");
        let d = DecisionEngine::new(&sys)
            .decide(f, &f.interfaces[0])
            .expect("decide");
        assert_eq!(
            d.route,
            Route::ForwardToVm {
                symbol: "Foo_Tick".to_string()
            }
        );
    }

    #[test]
    fn artificial_async_provided_short_circuits_to_sibling() {
        let mut vt = node("vt_Calc", RuntimeNature::Thread);
        vt.artificial = true;
        let mut entry = pi("Run", Synchronism::Asynchronous);
        entry.remote_entry = Some("Compute".to_string());
        let mut call = ri("Call", Synchronism::Synchronous, "Calc");
        call.remote_entry = Some("Compute".to_string());
        call.protection = Protection::Unprotected;
        vt.interfaces = vec![entry, call];
        let sys = system(vec![vt, node("Calc", RuntimeNature::Passive)]);
        let f = sys.function("vt_Calc").expect("vt");
        let d = DecisionEngine::new(&sys)
            .decide(f, &f.interfaces[0])
            .expect("decide");
        assert_eq!(
            d.route,
            Route::ForwardToSibling {
                callee: "Calc",
                entry: "Compute",
                accessor: Accessor::Plain,
            }
        );
        assert!(d.diagnostics.is_empty());
    }

    #[test]
    fn artificial_sibling_lookup_takes_the_last_matching_call() {
        let mut vt = node("vt_Calc", RuntimeNature::Thread);
        vt.artificial = true;
        let mut entry = pi("Run", Synchronism::Asynchronous);
        entry.remote_entry = Some("Compute".to_string());
        let mut first = ri("First", Synchronism::Synchronous, "Calc");
        first.remote_entry = Some("Compute".to_string());
        let mut last = ri("Last", Synchronism::Synchronous, "Backup");
        last.remote_entry = Some("Compute".to_string());
        vt.interfaces = vec![entry, first, last];
        let sys = system(vec![
            vt,
            node("Calc", RuntimeNature::Passive),
            node("Backup", RuntimeNature::Passive),
        ]);
        let f = sys.function("vt_Calc").expect("vt");
        let d = DecisionEngine::new(&sys)
            .decide(f, &f.interfaces[0])
            .expect("decide");
        assert_eq!(
            d.route,
            Route::ForwardToSibling {
                callee: "Backup",
                entry: "Compute",
                accessor: Accessor::Protected,
            }
        );
    }

    #[test]
    fn artificial_without_sibling_falls_back_with_warning() {
        let mut vt = node("vt_X", RuntimeNature::Thread);
        vt.artificial = true;
        vt.interfaces.push(pi("Run", Synchronism::Asynchronous));
        let sys = system(vec![vt]);
        let f = sys.function("vt_X").expect("vt");
        let d = DecisionEngine::new(&sys)
            .decide(f, &f.interfaces[0])
            .expect("decide");
        assert!(matches!(d.route, Route::ForwardToVm { .. }));
        assert_eq!(d.diagnostics[0].code, DiagnosticCode::IVG0120MissingSibling);
    }

    #[test]
    fn sync_required_selects_accessor_from_protection() {
        let mut t = node("T", RuntimeNature::Thread);
        let mut plain = ri("Plain", Synchronism::Synchronous, "Calc");
        plain.protection = Protection::Unprotected;
        plain.remote_entry = Some("Go".to_string());
        t.interfaces = vec![ri("Locked", Synchronism::Synchronous, "Calc"), plain];
        let sys = system(vec![t, node("Calc", RuntimeNature::Passive)]);
        let f = sys.function("T").expect("T");
        let engine = DecisionEngine::new(&sys);
        assert_eq!(
            engine.decide(f, &f.interfaces[0]).expect("decide").route,
            Route::CallCallee {
                callee: "Calc",
                entry: "Locked",
                accessor: Accessor::Protected,
            }
        );
        assert_eq!(
            engine.decide(f, &f.interfaces[1]).expect("decide").route,
            Route::CallCallee {
                callee: "Calc",
                entry: "Go",
                accessor: Accessor::Plain,
            }
        );
    }

    #[test]
    fn sync_required_on_uncalled_passive_is_dead_code() {
        let mut d = node("D", RuntimeNature::Passive);
        d.interfaces.push(ri("Call", Synchronism::Synchronous, "E"));
        let sys = system(vec![d, node("E", RuntimeNature::Passive)]);
        let f = sys.function("D").expect("D");
        let err = DecisionEngine::new(&sys)
            .decide(f, &f.interfaces[0])
            .unwrap_err();
        assert_eq!(
            err,
            GlueError::DeadCode {
                function: "D".to_string(),
                interface: "Call".to_string(),
            }
        );
    }

    #[test]
    fn restricted_calling_interfaces_can_leave_no_caller() {
        let mut a = node("A", RuntimeNature::Passive);
        a.calling_threads = vec!["B".to_string()];
        let mut lonely = pi("Lonely", Synchronism::Synchronous);
        lonely.calling_threads = Vec::new();
        let mut call = ri("Call", Synchronism::Synchronous, "E");
        call.calling_provided_interfaces = vec!["Lonely".to_string()];
        a.interfaces = vec![lonely, call];
        let sys = system(vec![
            a,
            node("B", RuntimeNature::Thread),
            node("E", RuntimeNature::Passive),
        ]);
        let f = sys.function("A").expect("A");
        let err = DecisionEngine::new(&sys)
            .decide(f, &f.interfaces[1])
            .unwrap_err();
        assert_eq!(
            err,
            GlueError::DeadCode {
                function: "A".to_string(),
                interface: "Call".to_string(),
            }
        );
    }

    #[test]
    fn foreign_binding_still_checks_reachability() {
        let mut d = node("D", RuntimeNature::Passive);
        let mut call = ri("Call", Synchronism::Synchronous, "Model");
        call.remote_binding.language = Language::QGenAda;
        d.interfaces.push(call);
        let sys = system(vec![d, node("Model", RuntimeNature::Passive)]);
        let f = sys.function("D").expect("D");
        assert!(DecisionEngine::new(&sys).decide(f, &f.interfaces[0]).is_err());
    }

    #[test]
    fn foreign_binding_overrides_call_target() {
        let mut t = node("T", RuntimeNature::Thread);
        let mut call = ri("Step", Synchronism::Synchronous, "Model");
        call.remote_binding.language = Language::QGenAda;
        call.remote_entry = Some("Ctrl".to_string());
        t.interfaces.push(call);
        let sys = system(vec![t, node("Model", RuntimeNature::Passive)]);
        let f = sys.function("T").expect("T");
        let d = DecisionEngine::new(&sys)
            .decide(f, &f.interfaces[0])
            .expect("decide");
        assert_eq!(d.convention, Convention::QGenAda);
        assert_eq!(
            d.route,
            Route::CallForeign {
                target: "Execute_Ctrl_QGenAda".to_string()
            }
        );
    }

    #[test]
    fn qgenc_binding_is_skipped_with_warning() {
        let mut t = node("T", RuntimeNature::Thread);
        let mut call = ri("Step", Synchronism::Synchronous, "Model");
        call.remote_binding.language = Language::QGenC;
        t.interfaces.push(call);
        let sys = system(vec![t, node("Model", RuntimeNature::Passive)]);
        let f = sys.function("T").expect("T");
        let d = DecisionEngine::new(&sys)
            .decide(f, &f.interfaces[0])
            .expect("decide");
        assert_eq!(d.route, Route::Skip);
        assert_eq!(
            d.diagnostics[0].code,
            DiagnosticCode::IVG0110UnsupportedBinding
        );
    }

    #[test]
    fn async_required_on_thread_flushes_outport() {
        let mut t = node("T", RuntimeNature::Thread);
        t.interfaces.push(ri("Out", Synchronism::Asynchronous, "U"));
        let mut u = node("U", RuntimeNature::Thread);
        u.process = None;
        u.interfaces.push(ri("Back", Synchronism::Asynchronous, "T"));
        let sys = system(vec![t, u]);
        let engine = DecisionEngine::new(&sys);

        let t = sys.function("T").expect("T");
        let d = engine.decide(t, &t.interfaces[0]).expect("decide");
        assert_eq!(d.placement, Placement::AsyncRiWrappers);
        assert_eq!(
            d.route,
            Route::FlushOutport {
                entity: Some("part1_T_K".to_string())
            }
        );

        let u = sys.function("U").expect("U");
        let d = engine.decide(u, &u.interfaces[0]).expect("decide");
        assert_eq!(d.route, Route::FlushOutport { entity: None });
        assert_eq!(
            d.diagnostics[0].code,
            DiagnosticCode::IVG0130ThreadWithoutProcess
        );
    }

    #[test]
    fn async_required_on_passive_follows_caller_count() {
        let mut a = node("A", RuntimeNature::Passive);
        a.interfaces.push(ri("Req", Synchronism::Asynchronous, "Z"));
        let mut one = a.clone();
        one.name = "One".to_string();
        one.calling_threads = vec!["B".to_string()];
        let mut many = a.clone();
        many.name = "Many".to_string();
        many.calling_threads = vec!["C".to_string(), "B".to_string()];
        let sys = system(vec![
            a,
            one,
            many,
            node("B", RuntimeNature::Thread),
            node("C", RuntimeNature::Thread),
            node("Z", RuntimeNature::Thread),
        ]);
        let engine = DecisionEngine::new(&sys);

        let route_of = |name: &str| {
            let f = sys.function(name).expect("function");
            engine.decide(f, &f.interfaces[0]).expect("decide").route
        };
        assert_eq!(route_of("A"), Route::Dispatch(Dispatch::Inert));
        match route_of("One") {
            Route::Dispatch(Dispatch::Direct(caller)) => assert_eq!(caller.name, "B"),
            other => panic!("unexpected route {other:?}"),
        }
        match route_of("Many") {
            Route::Dispatch(Dispatch::ByTaskId(callers)) => {
                let names: Vec<&str> = callers.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["C", "B"]);
            }
            other => panic!("unexpected route {other:?}"),
        }
    }
}
