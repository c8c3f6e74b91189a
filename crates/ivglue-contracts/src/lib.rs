//! Shared, version-pinned protocol identifiers.
//!
//! These constants are the single source of truth for schema/version strings that
//! appear in machine-readable I/O (model documents, tool config, reports).

pub const IVGLUE_MODEL_SCHEMA_VERSION: &str = "ivglue.model@0.1.0";
pub const IVGLUE_MODEL_SCHEMA_VERSIONS_SUPPORTED: &[&str] = &[IVGLUE_MODEL_SCHEMA_VERSION];

pub const IVGLUE_CONFIG_SCHEMA_VERSION: &str = "ivglue.config@0.1.0";

pub const IVGLUE_REPORT_SCHEMA_VERSION: &str = "ivglue.report@0.1.0";
pub const IVGLUE_DIAG_SCHEMA_VERSION: &str = "ivglue.diag@0.1.0";

/// Middleware runtime the generated Ada glue links against.
pub const MIDDLEWARE_ID: &str = "polyorb-hi-ada";
