//! End-to-end tests driving the full pipeline (tokenizer, parser, macro
//! expander, interpreter) the way `main.rs` does, using the real builtin
//! table instead of the bare interpreter `interpreter.rs`'s own unit
//! tests use.

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
fn arithmetic_and_def_chain_through_builtins() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (def x 10)
        (def y 20)
        (+ x y (* 2 3))
        "#,
    );
    assert_eq!(result, Value::Number(36.0));
}

#[test]
fn functions_close_over_definitions_made_before_they_run() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (def square (n) (* n n))
        (def sum-of-squares (a b) (+ (square a) (square b)))
        (sum-of-squares 3 4)
        "#,
    );
    assert_eq!(result, Value::Number(25.0));
}

#[test]
fn let_bindings_shadow_but_do_not_leak() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (def x 1)
        (let ((x 2) (y (+ x 1))) (+ x y))
        "#,
    );
    // `y` sees the `let*`-style earlier binding of `x` (2), so y = 3,
    // and the body sees x = 2: 2 + 3 = 5.
    assert_eq!(result, Value::Number(5.0));
}

#[test]
fn cond_dispatches_on_comparison_builtins() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (def classify (n)
          (cond ((< n 0) "negative")
                ((== n 0) "zero")
                (else "positive")))
        (classify -5)
        "#,
    );
    assert_eq!(result, Value::String("negative".to_string()));
}

#[test]
fn defmacro_expands_before_evaluation() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (defmacro unless (test body) (list "cond" (list (list "not" test) body)))
        (unless false 42)
        "#,
    );
    assert_eq!(result, Value::Number(42.0));
}

#[test]
fn try_catch_recovers_from_a_thrown_string() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (try
          (throw "boom")
          (catch e (list "recovered" e.message)))
        "#,
    );
    assert_eq!(
        result,
        Value::List(vec![
            Value::String("recovered".to_string()),
            Value::String("boom".to_string()),
        ])
    );
}

#[test]
fn try_catch_recovers_from_an_undefined_symbol_error() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (try
          missing-symbol
          (catch e "caught it"))
        "#,
    );
    assert_eq!(result, Value::String("caught it".to_string()));
}

#[test]
fn maps_survive_a_round_trip_through_user_functions() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"
        (def with-count (m) (map-set! m "count" (map-size m)))
        (with-count (make-map))
        "#,
    );
    match result {
        Value::Map(m) => assert_eq!(m.get(&Value::String("count".to_string())), Some(&Value::Number(0.0))),
        other => panic!("expected a map, got {:?}", other),
    }
}

#[test]
fn json_round_trips_a_nested_structure() {
    let interp = fresh();
    let result = run(
        &interp,
        r#"(json/parse (json/stringify (list 1 2 3)))"#,
    );
    assert_eq!(
        result,
        Value::List(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)])
    );
}

#[test]
fn undefined_symbol_surfaces_as_an_error_token() {
    let interp = fresh();
    let global_env = Environment::new();
    let mut expander = MacroExpander::new();
    let ast = parse_all(tokenize("(+ 1 nope)")).into_iter().next().unwrap().unwrap();
    let expanded = expander.expand_top_level(&ast, &interp, &global_env).unwrap();
    let token = interp.run_form(&expanded, &global_env);
    assert_eq!(token.channel, slight::interpreter::Channel::Error);
}

#[test]
fn defmacro_reports_on_info_channel_like_def() {
    // Spec scenario 4: `(defmacro when ...) (when (> 5 3) 42)` yields
    // `INFO, STDOUT 42` — the defmacro form itself must land on INFO,
    // not STDOUT, same as `def`/`set!`.
    let interp = fresh();
    let global_env = Environment::new();
    let mut expander = MacroExpander::new();

    let forms: Vec<_> = parse_all(tokenize(
        r#"
        (defmacro when (t b) (list "cond" (list t b)))
        (when (> 5 3) 42)
        "#,
    ))
    .into_iter()
    .map(|f| f.unwrap())
    .collect();
    assert_eq!(forms.len(), 2);

    let expanded_defmacro = expander.expand_top_level(&forms[0], &interp, &global_env).unwrap();
    let defmacro_token = interp.run_form(&expanded_defmacro, &global_env);
    assert_eq!(defmacro_token.channel, slight::interpreter::Channel::Info);

    let expanded_call = expander.expand_top_level(&forms[1], &interp, &global_env).unwrap();
    let call_token = interp.run_form(&expanded_call, &global_env);
    assert_eq!(call_token.channel, slight::interpreter::Channel::Stdout);
    assert_eq!(call_token.value, Value::Number(42.0));
}
