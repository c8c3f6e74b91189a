use crate::model::{FunctionalNode, Interface, System};
use crate::ordered_set::OrderedSet;

/// How many threads may reach a required interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerCount {
    None,
    One,
    Many,
}

impl CallerCount {
    pub fn of(n: usize) -> Self {
        match n {
            0 => CallerCount::None,
            1 => CallerCount::One,
            _ => CallerCount::Many,
        }
    }
}

pub struct CallingThreadResolver<'a> {
    system: &'a System,
}

impl<'a> CallingThreadResolver<'a> {
    pub fn new(system: &'a System) -> Self {
        Self { system }
    }

    /// Names of the threads allowed to invoke `interface`, unique and in first-seen order.
    ///
    /// Without a restricted set of calling provided interfaces this is the owner's full
    /// calling-thread list; otherwise it is the union of the calling threads of each
    /// listed provided interface.
    pub fn resolve_names(
        &self,
        owner: &'a FunctionalNode,
        interface: &'a Interface,
    ) -> OrderedSet<&'a str> {
        if interface.calling_provided_interfaces.is_empty() {
            return owner.calling_threads.iter().map(String::as_str).collect();
        }

        let mut out = OrderedSet::new();
        for calling in &interface.calling_provided_interfaces {
            let Some(pi) = owner.interface(calling) else {
                continue;
            };
            out.extend(pi.calling_threads.iter().map(String::as_str));
        }
        out
    }

    /// Same as [`Self::resolve_names`], mapped onto the model's functions.
    pub fn resolve(
        &self,
        owner: &'a FunctionalNode,
        interface: &'a Interface,
    ) -> Vec<&'a FunctionalNode> {
        self.resolve_names(owner, interface)
            .into_iter()
            .filter_map(|name| self.system.function(name))
            .collect()
    }
}
