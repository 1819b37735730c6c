use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use slight::config::{FsConfig, BUILTINS_SUMMARY, DEBUG_HELP_TEXT, VERSION, WELCOME_FOOTER, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use slight::env::Environment;
use slight::highlighter::LispHelper;
use slight::interpreter::{Channel, Interpreter};
use slight::macro_expander::MacroExpander;
use slight::sink::Sink;
use std::path::PathBuf;
use std::sync::Arc;

/// A streaming Lisp with macros, try/catch, and a message-passing
/// process runtime.
#[derive(Parser, Debug)]
#[command(name = "slight")]
#[command(version = VERSION)]
#[command(about = "A streaming Lisp interpreter with a sandboxed runtime")]
struct CliArgs {
    /// Script file to execute (if omitted, starts the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Evaluate SOURCE and exit instead of running a file or the REPL
    #[arg(short = 'e', long = "eval", value_name = "SOURCE")]
    eval: Option<String>,

    /// Add an allowed filesystem/include directory (repeatable)
    #[arg(short = 'i', long = "include-path", value_name = "DIR", action = clap::ArgAction::Append)]
    include_paths: Vec<PathBuf>,

    /// Maximum file size in bytes for read-file/write-file
    #[arg(long = "max-file-size", value_name = "BYTES", default_value = "10485760")]
    max_file_size: usize,

    /// Print the token stream and AST for every top-level form
    #[arg(long = "debug")]
    debug: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    slight::process::init_main_process();

    let fs_config = FsConfig {
        allowed_paths: args.include_paths.clone(),
        max_file_size: args.max_file_size,
    };
    slight::builtins::init_sandbox(fs_config)
        .map_err(|e| format!("cannot initialize filesystem sandbox: {}", e))?;

    let interp = Interpreter::new(slight::builtins::build_builtins(), args.include_paths.clone());

    if let Some(source) = args.eval {
        run_and_print(&interp, &source, args.debug);
        return Ok(());
    }

    if let Some(script_path) = args.script {
        return run_script(&interp, &script_path, args.debug);
    }

    run_repl(&interp, args.debug)
}

/// Runs one chunk of source, printing every top-level form's output
/// token through the active `Sink`'s channel-tagged formatting. Used by
/// both `-e` and script mode.
fn run_and_print(interp: &Interpreter, source: &str, debug: bool) {
    let global_env = Environment::new();
    let mut expander = MacroExpander::new();

    if debug {
        print_debug_trace(source, interp, &global_env, &mut MacroExpander::new());
    }

    let tokens = slight::token::tokenize(source);
    let forms = slight::parser::parse_all(tokens);
    let sink = slight::builtins::current_sink();

    for form in forms {
        let ast = match form {
            Ok(ast) => ast,
            Err(e) => {
                sink.emit(Channel::Error, &e.to_string());
                continue;
            }
        };
        let expanded = match expander.expand_top_level(&ast, interp, &global_env) {
            Ok(ast) => ast,
            Err(e) => {
                sink.emit(Channel::Error, &e.to_string());
                continue;
            }
        };
        let token = interp.run_form(&expanded, &global_env);
        sink.emit(token.channel, &token.value.to_string());
    }
}

fn run_script(interp: &Interpreter, path: &PathBuf, debug: bool) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read script file {}: {}", path.display(), e))?;
    run_and_print(interp, &source, debug);
    Ok(())
}

/// Prints the token stream and parsed AST for each top-level form in
/// `source`, ahead of evaluation — the same view the REPL's `:tokens`/
/// `:ast` commands give for one form at a time.
fn print_debug_trace(source: &str, _interp: &Interpreter, _global_env: &Arc<Environment>, _expander: &mut MacroExpander) {
    let tokens = slight::token::tokenize(source);
    println!("-- tokens --");
    for token in &tokens {
        match token {
            Ok(t) => println!("  {:?} {:?} @ {}", t.kind, t.source, t.loc),
            Err(e) => println!("  error: {}", e),
        }
    }
    println!("-- ast --");
    for form in slight::parser::parse_all(slight::token::tokenize(source)) {
        match form {
            Ok(ast) => println!("  {}", ast),
            Err(e) => println!("  error: {}", e),
        }
    }
}

fn run_repl(interp: &Interpreter, debug: bool) -> Result<(), Box<dyn std::error::Error>> {
    let global_env = Environment::new();
    let mut expander = MacroExpander::new();

    let config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::with_config(config).map_err(|e| format!("failed to initialize REPL: {}", e))?;
    rl.set_helper(Some(LispHelper::new()));

    let history_file = ".slight_history";
    let _ = rl.load_history(history_file);

    println!("{}", WELCOME_MESSAGE);
    println!("{}", WELCOME_SUBTITLE);
    println!("{}", WELCOME_FOOTER);

    let mut pending = String::new();

    loop {
        let prompt = if pending.is_empty() { "slight> " } else { "...> " };
        let readline = rl.readline(prompt);

        match readline {
            Ok(line) => {
                if line.trim().is_empty() && pending.is_empty() {
                    continue;
                }

                if pending.is_empty() {
                    if let Some(output) = handle_debug_command(line.trim(), interp, &global_env, &mut expander) {
                        println!("{}", output);
                        continue;
                    }
                    if line.trim() == ":q" {
                        println!("Goodbye!");
                        break;
                    }
                }

                pending.push_str(&line);
                pending.push('\n');

                if !is_balanced(&pending) {
                    continue;
                }

                let source = std::mem::take(&mut pending);
                if debug {
                    print_debug_trace(&source, interp, &global_env, &mut expander);
                }
                run_and_print(interp, &source, false);
            }
            Err(ReadlineError::Interrupted) => {
                pending.clear();
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}

/// True once every paren in `source` is closed — the REPL buffers input
/// across lines until a complete top-level form is available.
fn is_balanced(source: &str) -> bool {
    let mut depth = 0i64;
    let mut in_string = false;
    let mut escaped = false;
    for c in source.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}

/// Handles one of the REPL's `:`-prefixed debug commands, returning the
/// text to print, or `None` if `line` isn't a debug
/// command at all (in which case the caller treats it as source).
fn handle_debug_command(
    line: &str,
    interp: &Interpreter,
    global_env: &Arc<Environment>,
    expander: &mut MacroExpander,
) -> Option<String> {
    if !line.starts_with(':') {
        return None;
    }

    let (command, rest) = match line.split_once(' ') {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    Some(match command {
        ":help" => format!("{}\n{}", DEBUG_HELP_TEXT, BUILTINS_SUMMARY),
        ":tokens" => slight::token::tokenize(rest)
            .iter()
            .map(|t| match t {
                Ok(tok) => format!("{:?} {:?} @ {}", tok.kind, tok.source, tok.loc),
                Err(e) => format!("error: {}", e),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ":ast" => slight::parser::parse_all(slight::token::tokenize(rest))
            .into_iter()
            .map(|form| match form {
                Ok(ast) => ast.to_string(),
                Err(e) => format!("error: {}", e),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ":expand" => slight::parser::parse_all(slight::token::tokenize(rest))
            .into_iter()
            .map(|form| match form.and_then(|ast| expander.expand_top_level(&ast, interp, global_env)) {
                Ok(ast) => ast.to_string(),
                Err(e) => format!("error: {}", e),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ":env" => format_table(global_env.take_bindings().into_iter()),
        ":bindings" => format_table(interp.bindings.read().unwrap().clone().into_iter()),
        ":functions" => format_table(interp.functions.read().unwrap().clone().into_iter()),
        ":macros" => format_table(interp.macros.read().unwrap().clone().into_iter()),
        ":history" => "history is kept by the line editor; press the up arrow".to_string(),
        ":clear" => {
            print!("\x1B[2J\x1B[H");
            return Some(String::new());
        }
        _ => format!("unknown debug command: {}", command),
    })
}

fn format_table(entries: impl Iterator<Item = (String, slight::value::Value)>) -> String {
    let mut names: Vec<_> = entries.collect();
    if names.is_empty() {
        return "(none)".to_string();
    }
    names.sort_by(|a, b| a.0.cmp(&b.0));
    names
        .into_iter()
        .map(|(name, value)| format!("{} = {}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_single_form() {
        assert!(is_balanced("(+ 1 2)"));
    }

    #[test]
    fn unbalanced_open_paren() {
        assert!(!is_balanced("(+ 1 (* 2"));
    }

    #[test]
    fn parens_inside_strings_do_not_count() {
        assert!(is_balanced("(print \"(\")"));
    }

    #[test]
    fn negative_depth_from_stray_close_paren_is_still_balanced() {
        assert!(is_balanced(")"));
    }
}
