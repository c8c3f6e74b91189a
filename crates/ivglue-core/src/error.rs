use thiserror::Error;

/// Structural inconsistencies detected while building a [`crate::model::System`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("function name must be non-empty")]
    EmptyFunctionName,

    #[error("function {function:?} has an interface with an empty name")]
    EmptyInterfaceName { function: String },

    #[error("duplicate function {name:?}")]
    DuplicateFunction { name: String },

    #[error("function {function:?} declares interface {interface:?} twice")]
    DuplicateInterface { function: String, interface: String },

    #[error("function {function:?} lists unknown calling thread {thread:?}")]
    UnknownCallingThread { function: String, thread: String },

    #[error(
        "interface {function:?}.{interface:?} lists unknown calling thread {thread:?}"
    )]
    UnknownInterfaceCallingThread {
        function: String,
        interface: String,
        thread: String,
    },

    #[error(
        "required interface {function:?}.{interface:?} is reachable from {calling:?}, which is not a provided interface of {function:?}"
    )]
    UnknownCallingInterface {
        function: String,
        interface: String,
        calling: String,
    },

    #[error("required interface {function:?}.{interface:?} has no remote function")]
    MissingRemoteFunction { function: String, interface: String },
}

/// Errors that abort generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlueError {
    /// A passive function makes a synchronous call but no thread can ever run it.
    #[error(
        "function {function:?} is not called by anyone (dead code): synchronous required interface {interface:?} has no calling thread"
    )]
    DeadCode { function: String, interface: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl GlueError {
    /// Function the error is attributed to, when there is one.
    pub fn function(&self) -> Option<&str> {
        match self {
            GlueError::DeadCode { function, .. } => Some(function),
            GlueError::Model(ModelError::EmptyFunctionName) => None,
            GlueError::Model(ModelError::DuplicateFunction { name }) => Some(name),
            GlueError::Model(ModelError::EmptyInterfaceName { function })
            | GlueError::Model(ModelError::DuplicateInterface { function, .. })
            | GlueError::Model(ModelError::UnknownCallingThread { function, .. })
            | GlueError::Model(ModelError::UnknownInterfaceCallingThread { function, .. })
            | GlueError::Model(ModelError::UnknownCallingInterface { function, .. })
            | GlueError::Model(ModelError::MissingRemoteFunction { function, .. }) => {
                Some(function)
            }
        }
    }

    pub fn interface(&self) -> Option<&str> {
        match self {
            GlueError::DeadCode { interface, .. } => Some(interface),
            GlueError::Model(ModelError::DuplicateInterface { interface, .. })
            | GlueError::Model(ModelError::UnknownInterfaceCallingThread { interface, .. })
            | GlueError::Model(ModelError::UnknownCallingInterface { interface, .. })
            | GlueError::Model(ModelError::MissingRemoteFunction { interface, .. }) => {
                Some(interface)
            }
            GlueError::Model(_) => None,
        }
    }
}
