// ABOUTME: Configuration and constants for the cozy interpreter
// This module contains version info, welcome messages, and I/O sandbox configuration

use std::path::PathBuf;

#[allow(dead_code)]
pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "cozy v1.0";
pub const WELCOME_SUBTITLE: &str = "a small, dynamically-typed, strongly-typed scripting language";
pub const WELCOME_FOOTER: &str = "Type an expression, or `import(\"name\")` to load a module. Ctrl-D to exit.";

// ============================================================================
// I/O Sandboxing Configuration
// ============================================================================

/// Filesystem sandbox configuration
#[derive(Debug, Clone)]
pub struct FsConfig {
    pub allowed_paths: Vec<PathBuf>,
    pub max_file_size: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            allowed_paths: vec![PathBuf::from(".")],
            // Default max file size: 10MB
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Network sandbox configuration
#[derive(Debug, Clone, Default)]
pub struct NetConfig {
    /// Whether network I/O is enabled
    pub enabled: bool,
    /// Allowed network addresses (substring match against the request URL)
    /// Empty = no restrictions (if enabled=true)
    pub allowed_addresses: Vec<String>,
}

/// Combined I/O sandbox configuration
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct IoConfig {
    pub filesystem: FsConfig,
    pub network: NetConfig,
}

#[allow(dead_code)]
pub const HELP_TEXT: &str = r#"
Available REPL commands:
  quit() or exit()    - Exit the REPL
  help()              - Show this help message
  methods(x)          - List the methods available on a value

Type any cozy expression to evaluate it. Statements end with `;`.
"#;

#[allow(dead_code)]
pub const BUILTINS_SUMMARY: &str = r#"
Built-in functions:

Core:        eval int float string type len match print printf sprintf
Errors:      error panic
Filesystem:  fs.read fs.write fs.exists fs.size fs.stat fs.list
Network:     http.get http.post
JSON:        json.serialize json.deserialize
Time:        time.now time.sleep
System:      sys.getenv sys.setenv sys.environment sys.args sys.exit

Type help() for more information.
"#;
