pub mod aggregator;
pub mod backend;
pub mod config;
pub mod decision;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod generate;
pub mod model;
pub mod model_json;
pub mod naming;
pub mod ordered_set;
pub mod output;
pub mod resolver;
pub mod session;

mod util;

pub use config::{BackendKind, GenerateOptions};
pub use error::{GlueError, ModelError};
pub use generate::{generate_system, GenerationReport};
pub use model::System;
