//! Configuration validation
//!
//! Rules:
//! - field constraints declared on the config types (`validator` derive)
//! - log_level must be a known level
//!
//! Softer checks that do not reject a file are reported by [`warnings`].

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};
use contracts::{ContractError, ScrollSyncConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate a parsed configuration.
///
/// Returns the first error found, ordered by field path.
pub fn validate(config: &ScrollSyncConfig) -> Result<(), ContractError> {
    if let Err(errors) = config.validate() {
        let mut flat = Vec::new();
        flatten("", &errors, &mut flat);
        flat.sort();
        if let Some((field, message)) = flat.into_iter().next() {
            return Err(ContractError::config_validation(field, message));
        }
    }
    validate_log_level(config)?;
    Ok(())
}

/// Non-fatal findings about a configuration that passed validation
pub fn warnings(config: &ScrollSyncConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let engine = &config.engine;

    if engine.settle_grace_ms < engine.frame_interval_ms {
        warnings.push(format!(
            "settle_grace_ms ({}) is shorter than one frame ({} ms); \
             the gate may reopen before followers have painted",
            engine.settle_grace_ms, engine.frame_interval_ms
        ));
    }

    if engine.command_queue_capacity < 16 {
        warnings.push(format!(
            "command_queue_capacity ({}) is small; scroll events may be dropped under load",
            engine.command_queue_capacity
        ));
    }

    if let Some(port) = config.telemetry.metrics_port {
        if port < 1024 {
            warnings.push(format!(
                "metrics_port {port} is privileged and may require elevated permissions"
            ));
        }
    }

    warnings
}

fn validate_log_level(config: &ScrollSyncConfig) -> Result<(), ContractError> {
    // RUST_LOG-style directives like "sync_engine=debug" are passed through
    let level = config.telemetry.log_level.trim();
    if level.contains('=') || LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        return Ok(());
    }
    Err(ContractError::config_validation(
        "telemetry.log_level",
        format!("unknown log level '{level}'"),
    ))
}

fn flatten(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}
