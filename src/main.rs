use clap::Parser as ClapParser;
use cozy::builtins::{self, register_builtins, set_sandbox_storage};
use cozy::config::{FsConfig, NetConfig, WELCOME_FOOTER, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use cozy::env::Environment;
use cozy::eval::{eval_program, EvalContext};
use cozy::highlighter::LispHelper;
use cozy::object::Object;
use cozy::parser::Parser;
use cozy::sandbox::Sandbox;
use cozy::{config, help};
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use std::rc::Rc;

/// cozy: a small, dynamically-typed, strongly-typed scripting language
#[derive(ClapParser, Debug)]
#[command(name = "cozy")]
#[command(version = config::VERSION)]
#[command(about = "A tree-walking interpreter for cozy")]
#[command(long_about = "An interpreter for cozy with capability-based I/O sandboxing")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Evaluate a snippet of source directly and exit
    #[arg(short = 'e', long = "eval", value_name = "SOURCE")]
    eval_source: Option<String>,

    /// Arguments passed through to the script, available via sys.args()
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    script_args: Vec<String>,

    /// Add allowed filesystem path (can be repeated)
    #[arg(long = "fs-sandbox", value_name = "PATH", action = clap::ArgAction::Append)]
    fs_paths: Vec<PathBuf>,

    /// Maximum file size in bytes
    #[arg(
        long = "max-file-size",
        value_name = "BYTES",
        default_value = "10485760"
    )]
    max_file_size: usize,

    /// Enable network I/O
    #[arg(long = "allow-network")]
    allow_network: bool,

    /// Add allowed network address (can be repeated)
    #[arg(long = "net-allow", value_name = "ADDR", action = clap::ArgAction::Append)]
    net_addresses: Vec<String>,

    /// Skip loading standard library modules
    #[arg(long = "no-stdlib")]
    no_stdlib: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let fs_config = build_fs_config(&args);
    let net_config = build_net_config(&args);

    let sandbox = Sandbox::new(fs_config, net_config)?;
    set_sandbox_storage(sandbox);

    let is_script_mode = args.script.is_some() || args.eval_source.is_some();
    let env = if is_script_mode { Environment::new() } else { Environment::new_repl() };
    register_builtins(env.clone());
    help::populate_builtin_help();

    builtins::sys::set_script_args(args.script_args.clone());

    if !args.no_stdlib {
        for (module_name, module_code) in stdlib_sources() {
            if let Err(e) = load_source(module_code, &env) {
                eprintln!("Warning: failed to load stdlib module {module_name}: {e}");
            }
        }
    }

    if let Some(source) = &args.eval_source {
        return run_source(source, &env).map(|_| ());
    }

    if let Some(script_path) = &args.script {
        run_script(script_path, &env)?;
        return Ok(());
    }

    run_repl(&env)
}

/// Source of each bundled `.cz` stdlib module, loaded at startup unless `--no-stdlib` is given.
fn stdlib_sources() -> [(&'static str, &'static str); 1] {
    [("collections", include_str!("stdlib/cozy/collections.cz"))]
}

/// Build filesystem configuration from CLI arguments
fn build_fs_config(args: &CliArgs) -> FsConfig {
    let allowed_paths = if args.fs_paths.is_empty() {
        vec![
            PathBuf::from("./data"),
            PathBuf::from("./examples"),
            PathBuf::from("./scripts"),
        ]
    } else {
        args.fs_paths.clone()
    };

    FsConfig {
        allowed_paths,
        max_file_size: args.max_file_size,
    }
}

/// Build network configuration from CLI arguments
fn build_net_config(args: &CliArgs) -> NetConfig {
    NetConfig {
        enabled: args.allow_network,
        allowed_addresses: args.net_addresses.clone(),
    }
}

/// Parse and evaluate a single source string, printing evaluation errors to stderr.
/// Returns the final value on success, or exits the process with a non-zero code on failure.
fn run_source(source: &str, env: &Rc<Environment>) -> Result<Object, Box<dyn std::error::Error>> {
    let mut parser = Parser::from_str(source);
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        for err in parser.errors() {
            eprintln!("Parse error: {err}");
        }
        std::process::exit(1);
    }

    let ctx = EvalContext::new();
    match eval_program(&program, env, &ctx) {
        Ok(result) => Ok(result),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Same as `run_source` but for internal stdlib bootstrapping: failures are reported
/// to the caller instead of exiting the process.
fn load_source(source: &str, env: &Rc<Environment>) -> Result<(), String> {
    let mut parser = Parser::from_str(source);
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        return Err(parser.errors().join("; "));
    }

    let ctx = EvalContext::new();
    eval_program(&program, env, &ctx).map(|_| ()).map_err(|e| e.to_string())
}

/// Execute a cozy script file
fn run_script(path: &PathBuf, env: &Rc<Environment>) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read script file {}: {}", path.display(), e))?;
    run_source(&contents, env).map(|_| ())
}

fn run_repl(env: &Rc<Environment>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::with_config(config).map_err(|e| format!("Failed to initialize REPL: {e}"))?;

    let helper = LispHelper::new();
    rl.set_helper(Some(helper));

    let history_file = ".cozy_history";
    let _ = rl.load_history(history_file);

    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");
    println!("{WELCOME_FOOTER}");

    let ctx = EvalContext::new();

    loop {
        let readline = rl.readline("cozy> ");

        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                match line.trim() {
                    "quit()" | "exit()" => {
                        println!("Goodbye!");
                        break;
                    }
                    "clear()" => {
                        print!("\x1B[2J\x1B[H");
                        continue;
                    }
                    _ => {}
                }

                let mut parser = Parser::from_str(&line);
                let program = parser.parse_program();

                if !parser.errors().is_empty() {
                    for err in parser.errors() {
                        eprintln!("Parse error: {err}");
                    }
                    continue;
                }

                match eval_program(&program, env, &ctx) {
                    Ok(result) => println!("=> {}", result.inspect()),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fs_config_with_defaults() {
        let args = CliArgs {
            script: None,
            eval_source: None,
            script_args: vec![],
            fs_paths: vec![],
            max_file_size: 10485760,
            allow_network: false,
            net_addresses: vec![],
            no_stdlib: false,
        };
        let config = build_fs_config(&args);
        assert_eq!(config.allowed_paths.len(), 3);
        assert_eq!(config.max_file_size, 10485760);
        assert_eq!(config.allowed_paths[0], PathBuf::from("./data"));
        assert_eq!(config.allowed_paths[1], PathBuf::from("./examples"));
        assert_eq!(config.allowed_paths[2], PathBuf::from("./scripts"));
    }

    #[test]
    fn test_build_fs_config_with_custom_paths() {
        let args = CliArgs {
            script: None,
            eval_source: None,
            script_args: vec![],
            fs_paths: vec![PathBuf::from("/tmp/safe")],
            max_file_size: 5242880,
            allow_network: false,
            net_addresses: vec![],
            no_stdlib: false,
        };
        let config = build_fs_config(&args);
        assert_eq!(config.allowed_paths.len(), 1);
        assert_eq!(config.allowed_paths[0], PathBuf::from("/tmp/safe"));
        assert_eq!(config.max_file_size, 5242880);
    }

    #[test]
    fn test_build_fs_config_with_multiple_paths() {
        let args = CliArgs {
            script: None,
            eval_source: None,
            script_args: vec![],
            fs_paths: vec![
                PathBuf::from("./data"),
                PathBuf::from("./uploads"),
                PathBuf::from("/tmp"),
            ],
            max_file_size: 1048576,
            allow_network: false,
            net_addresses: vec![],
            no_stdlib: false,
        };
        let config = build_fs_config(&args);
        assert_eq!(config.allowed_paths.len(), 3);
        assert_eq!(config.max_file_size, 1048576);
    }

    #[test]
    fn test_build_net_config_disabled_by_default() {
        let args = CliArgs {
            script: None,
            eval_source: None,
            script_args: vec![],
            fs_paths: vec![],
            max_file_size: 10485760,
            allow_network: false,
            net_addresses: vec![],
            no_stdlib: false,
        };
        let config = build_net_config(&args);
        assert!(!config.enabled);
        assert_eq!(config.allowed_addresses.len(), 0);
    }

    #[test]
    fn test_build_net_config_enabled() {
        let args = CliArgs {
            script: None,
            eval_source: None,
            script_args: vec![],
            fs_paths: vec![],
            max_file_size: 10485760,
            allow_network: true,
            net_addresses: vec![],
            no_stdlib: false,
        };
        let config = build_net_config(&args);
        assert!(config.enabled);
        assert_eq!(config.allowed_addresses.len(), 0);
    }

    #[test]
    fn test_build_net_config_with_allowlist() {
        let args = CliArgs {
            script: None,
            eval_source: None,
            script_args: vec![],
            fs_paths: vec![],
            max_file_size: 10485760,
            allow_network: true,
            net_addresses: vec!["example.com".to_string(), "api.local:8080".to_string()],
            no_stdlib: false,
        };
        let config = build_net_config(&args);
        assert!(config.enabled);
        assert_eq!(config.allowed_addresses.len(), 2);
        assert_eq!(config.allowed_addresses[0], "example.com");
        assert_eq!(config.allowed_addresses[1], "api.local:8080");
    }

    #[test]
    fn test_cli_args_script_argument() {
        let args = CliArgs {
            script: Some(PathBuf::from("test.cz")),
            eval_source: None,
            script_args: vec![],
            fs_paths: vec![],
            max_file_size: 10485760,
            allow_network: false,
            net_addresses: vec![],
            no_stdlib: false,
        };
        assert!(args.script.is_some());
        assert_eq!(args.script.as_ref().unwrap(), &PathBuf::from("test.cz"));
    }

    #[test]
    fn test_cli_args_no_stdlib_flag() {
        let args = CliArgs {
            script: None,
            eval_source: None,
            script_args: vec![],
            fs_paths: vec![],
            max_file_size: 10485760,
            allow_network: false,
            net_addresses: vec![],
            no_stdlib: true,
        };
        assert!(args.no_stdlib);
    }
}
