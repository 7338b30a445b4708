// ============================================================================
// crftune-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// This module provides error handling utilities for the CLI that integrate
// with the crftune-core error types while adding CLI-specific error contexts.
//
// KEY COMPONENTS:
// - CliResult: Type alias for CLI operations
// - CliErrorContext: context messages on core errors
// - exit_code: process exit status for a failed command
//
// AI-ASSISTANT-INFO: CLI error handling utilities

// ---- Internal crate imports ----
use crftune_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

// ============================================================================
// ERROR CONVERSION UTILITIES
// ============================================================================

/// Extension trait for adding context to errors in the CLI.
pub trait CliErrorContext<T> {
    /// Add context to an error.
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display;

    /// Add context using a closure (for lazy evaluation).
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", context, core_error))
        })
    }

    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", f(), core_error))
        })
    }
}

/// Exit status for a failed command.
///
/// Invalid arguments exit with 2, missing tools with 3, tool failures and
/// timeouts with 4, everything else with 1.
pub fn exit_code(error: &CoreError) -> i32 {
    match error {
        CoreError::Config(_) | CoreError::PathError(_) | CoreError::InvalidDuration { .. } => 2,
        CoreError::DependencyNotFound(_) | CoreError::CommandStart { .. } => 3,
        CoreError::ToolInvocation { .. }
        | CoreError::ToolTimeout { .. }
        | CoreError::ProbeParse(_)
        | CoreError::VmafParse(_) => 4,
        _ => 1,
    }
}
