//! Integration tests for the process runtime: `spawn`/`spawn-link` run a
//! named function on its own OS thread (see `slight::process`), so these
//! exercise real thread scheduling rather than a simulated scheduler.

use slight::builtins::build_builtins;
use slight::env::Environment;
use slight::interpreter::Interpreter;
use slight::macro_expander::MacroExpander;
use slight::parser::parse_all;
use slight::token::tokenize;
use slight::value::Value;

fn fresh() -> Interpreter {
    Interpreter::new(build_builtins(), Vec::new())
}

fn run(interp: &Interpreter, source: &str) -> Value {
    let global_env = Environment::new();
    let mut expander = MacroExpander::new();
    let mut result = Value::Nil;
    for form in parse_all(tokenize(source)) {
        let ast = form.unwrap();
        let expanded = expander.expand_top_level(&ast, interp, &global_env).unwrap();
        result = interp.eval(&expanded, &global_env).unwrap();
    }
    result
}

#[test]
fn spawn_link_runs_a_named_function_to_completion() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (def double (n) (* n 2))
        (spawn-link double 21)
        "#,
    );
    match result {
        Value::Map(m) => {
            assert_eq!(m.get(&Value::String("ok".to_string())), Some(&Value::Boolean(true)));
            assert_eq!(m.get(&Value::String("value".to_string())), Some(&Value::Number(42.0)));
        }
        other => panic!("expected a {{:ok :value}} map, got {:?}", other),
    }
}

#[test]
fn spawn_link_reports_a_child_error_instead_of_crashing_the_caller() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (def boom (n) (throw "child failed"))
        (spawn-link boom 1)
        "#,
    );
    match result {
        Value::Map(m) => {
            assert_eq!(m.get(&Value::String("ok".to_string())), Some(&Value::Boolean(false)));
            assert_eq!(
                m.get(&Value::String("error".to_string())),
                Some(&Value::String("child failed".to_string()))
            );
        }
        other => panic!("expected a {{:ok :error}} map, got {:?}", other),
    }
}

#[test]
fn spawn_returns_a_pid_and_send_recv_round_trips_a_message() {
    slight::process::init_main_process();
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (def echo-back (to) (send to (head (tail (recv)))))
        (def parent-pid (self))
        (def child (spawn echo-back parent-pid))
        (send child "ping")
        (head (tail (recv)))
        "#,
    );
    assert_eq!(result, Value::String("ping".to_string()));
}

#[test]
fn spawn_rejects_an_anonymous_closure_as_the_callee() {
    let interp = fresh();
    let global_env = Environment::new();
    let mut expander = MacroExpander::new();
    let ast = parse_all(tokenize("(spawn (fun (x) x) 1)"))
        .into_iter()
        .next()
        .unwrap()
        .unwrap();
    let expanded = expander.expand_top_level(&ast, &interp, &global_env).unwrap();
    assert!(interp.eval(&expanded, &global_env).is_err());
}

#[test]
fn processes_lists_the_main_pid_and_any_spawned_pid() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (def noop (n) n)
        (spawn-link noop 1)
        (processes)
        "#,
    );
    match result {
        Value::List(pids) => assert!(!pids.is_empty()),
        other => panic!("expected a list of pids, got {:?}", other),
    }
}
