//! Version, welcome banner, REPL debug help text, and the filesystem
//! sandbox configuration (see `crate::sandbox::Sandbox`).

use std::path::PathBuf;

pub const VERSION: &str = "0.1.0";
pub const WELCOME_MESSAGE: &str = "slight 0.1.0";
pub const WELCOME_SUBTITLE: &str = "A streaming Lisp with macros, try/catch, and a message-passing process runtime";
pub const WELCOME_FOOTER: &str = "Type :help for debug commands, :q or Ctrl-D to exit.";

/// Filesystem sandbox configuration backing `read-file`/`write-file`/
/// `file-exists?`. No default allowed paths: a script that wants file
/// access must request directories explicitly via `-i`.
#[derive(Debug, Clone)]
pub struct FsConfig {
    pub allowed_paths: Vec<PathBuf>,
    pub max_file_size: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            allowed_paths: Vec::new(),
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

pub const DEBUG_HELP_TEXT: &str = r#"
Debug commands:
  :ast <expr>       show the parsed AST before macro expansion
  :tokens <expr>    show the token stream
  :expand <expr>    show the AST after macro expansion
  :env              list local bindings in scope
  :bindings         list top-level (def name value) bindings
  :functions        list top-level (def name (params) body) functions
  :macros           list defmacro definitions
  :history          show REPL input history
  :clear            clear the screen
  :help             show this message
  :q                exit the REPL
"#;

pub const BUILTINS_SUMMARY: &str = r#"
Arithmetic:     + - * / mod
Comparison:     == != < > <= >=
Logic:          and or not
Lists:          list head tail cons empty?
Maps:           make-map map-get map-set! map-has? map-delete! map-keys map-values map-size
Type:           type/of number? string? list? nil? symbol? bool? map? function? error?
Console:        print say log/info log/warn log/error log/debug
JSON:           json/parse json/stringify
Filesystem:     read-file write-file file-exists?
Environment:    env/get env/set!
Process:        spawn spawn-link send recv self is-alive? kill processes
Special forms:  def defmacro set! let cond quote fun try throw catch begin include
"#;
