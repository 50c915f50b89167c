//! # Built-in Functions Module
//!
//! Native functions for the cozy interpreter, organized by domain.
//!
//! ## Categories
//!
//! - **[types]**: int, float, string, len, type, eval - Core conversion/reflection
//! - **[console]**: print, printf, sprintf - Output operations
//! - **[filesystem]**: fs.read, fs.write, fs.exists, fs.size, fs.stat, fs.list - File I/O
//! - **[network]**: http.get, http.post - Network requests
//! - **[errors]**: error, panic - Error handling
//! - **[strings]**: string.* - String methods
//! - **[sys]**: sys.getenv, sys.setenv, sys.environment, sys.args, sys.exit - Process/OS
//! - **[time]**: time.now, time.sleep - Time
//! - **[help_builtins]**: help, methods - Documentation and reflection
//!
//! Each category is a sub-module with its own register function that sets up both the
//! function bindings and their help documentation entries in the help system registry.

use crate::env::Environment;
use crate::sandbox::Sandbox;
use std::cell::RefCell;
use std::rc::Rc;

// ============================================================================
// Sandbox Storage for I/O Built-in Functions
// ============================================================================

thread_local! {
    static SANDBOX: RefCell<Option<Sandbox>> = const { RefCell::new(None) };
}

/// Initialize the sandbox for I/O built-in functions
pub fn set_sandbox_storage(sandbox: Sandbox) {
    SANDBOX.with(|s| {
        *s.borrow_mut() = Some(sandbox);
    });
}

// ============================================================================
// Sub-modules
// ============================================================================

pub mod console;
pub mod errors;
pub mod filesystem;
#[path = "help.rs"]
pub mod help_builtins;
pub mod network;
pub mod strings;
pub mod sys;
pub mod time;
pub mod types;

// Re-export for convenience
pub use console::register as register_console;
pub use errors::register as register_errors;
pub use filesystem::register as register_filesystem;
pub use help_builtins::register as register_help;
pub use network::register as register_network;
pub use strings::register as register_strings;
pub use sys::register as register_sys;
pub use time::register as register_time;
pub use types::register as register_types;

// ============================================================================
// Main Registration Function
// ============================================================================

/// Register all built-in functions in the environment
pub fn register_builtins(env: Rc<Environment>) {
    register_types(&env);
    register_strings(&env);
    register_console(&env);
    register_filesystem(&env);
    register_network(&env);
    register_errors(&env);
    register_sys(&env);
    register_time(&env);
    register_help(&env);
    crate::stdlib::register_stdlib(env.clone());
}
