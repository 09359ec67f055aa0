mod common;

#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;

    use rox::error::RuntimeError;
    use rox::session::RunError;

    use rox::interpreter::MAX_CALL_DEPTH;

    use super::common::{run, run_ok, session};

    fn runtime_error(source: &str) -> (Vec<String>, String) {
        match run(source) {
            (lines, Err(RunError::Runtime(e))) => (lines, e.to_string()),
            (_, Err(e)) => panic!("expected runtime error, got static errors:\n{}", e),
            (_, Ok(())) => panic!("expected runtime error, program finished"),
        }
    }

    #[test]
    fn test_arithmetic_and_printing() {
        assert_eq!(run_ok("var a = 1; var b = 2; print a + b;"), vec!["3"]);
        assert_eq!(
            run_ok("print 10 / 4; print -3 * 2; print 1 / 0; print \"con\" + \"cat\";"),
            vec!["2.5", "-6", "Infinity", "concat"]
        );
        assert_eq!(
            run_ok("print 2 >= 2; print 1 < 0; print !nil; print 7 - 10;"),
            vec!["true", "false", "true", "-3"]
        );
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            run_ok(
                "print nil == false; print 1 == 1; print \"a\" == \"a\"; \
                 print nil == nil; print 1 != \"1\";"
            ),
            vec!["false", "true", "true", "true", "true"]
        );
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(
            run_ok(
                "if (0) print \"zero\"; if (\"\") print \"empty\"; \
                 if (nil) print \"nil\"; else print \"no nil\"; \
                 if (false) print \"false\"; else print \"no false\";"
            ),
            vec!["zero", "empty", "no nil", "no false"]
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(
            run_ok("print nil or \"default\"; print \"a\" and \"b\"; print false and 1; print 0 or 2;"),
            vec!["default", "b", "false", "0"]
        );
    }

    #[test]
    fn test_short_circuit_skips_right_operand() {
        assert_eq!(
            run_ok("var hit = false; fun f() { hit = true; return true; } false and f(); true or f(); print hit;"),
            vec!["false"]
        );
    }

    #[test]
    fn test_falsy_values_survive_lookup_and_assignment() {
        assert_eq!(
            run_ok(
                "var n = nil; var f = false; var z = 0; print n; print f; print z; \
                 { var inner = false; inner = nil; print inner; }"
            ),
            vec!["nil", "false", "0", "nil"]
        );
    }

    #[test]
    fn test_shadowing_and_scope() {
        assert_eq!(
            run_ok("var a = \"outer\"; { var a = \"inner\"; print a; } print a;"),
            vec!["inner", "outer"]
        );
        assert_eq!(
            run_ok("var a = 1; { a = 2; var b = a; print b; } print a;"),
            vec!["2", "2"]
        );
    }

    #[test]
    fn test_closure_binds_at_declaration() {
        let source = r#"
            var a = "global";
            {
                fun showA() { print a; }
                showA();
                var a = "block";
                showA();
            }
        "#;

        assert_eq!(run_ok(source), vec!["global", "global"]);
    }

    #[test]
    fn test_counter_closures() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    return i;
                }
                return count;
            }

            var counter = makeCounter();
            print counter();
            print counter();

            var other = makeCounter();
            print other();
            print counter();
        "#;

        assert_eq!(run_ok(source), vec!["1", "2", "1", "3"]);
    }

    #[test]
    fn test_closures_from_one_call_share_state() {
        let source = r#"
            var inc;
            var get;
            fun make() {
                var n = 0;
                fun i() { n = n + 1; }
                fun g() { return n; }
                inc = i;
                get = g;
            }
            make();
            inc();
            inc();
            print get();
        "#;

        assert_eq!(run_ok(source), vec!["2"]);
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(15);
        "#;

        assert_eq!(run_ok(source), vec!["610"]);
    }

    #[test]
    fn test_loops() {
        assert_eq!(
            run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["0", "1", "2"]
        );
        assert_eq!(
            run_ok("var i = 3; while (i > 0) { print i; i = i - 1; }"),
            vec!["3", "2", "1"]
        );
    }

    #[test]
    fn test_return_unwinds_nested_blocks_and_loops() {
        let source = r#"
            var depth = "global";
            fun find() {
                var i = 0;
                while (true) {
                    var depth = "loop";
                    {
                        if (i == 3) { return i; }
                    }
                    i = i + 1;
                }
            }
            print find();
            print depth;
        "#;

        assert_eq!(run_ok(source), vec!["3", "global"]);
    }

    #[test]
    fn test_function_values() {
        assert_eq!(
            run_ok("fun f() {} print f; print f(); print clock; print clock() > 0;"),
            vec!["<fn f>", "nil", "<native fn>", "true"]
        );
    }

    #[test]
    fn test_arity_error_stops_execution() {
        let source = "fun f(a, b) { return a + b; }\nprint \"before\";\nf(1);\nprint \"after\";";

        let (lines, message) = runtime_error(source);

        assert_eq!(lines, vec!["before"]);
        assert_eq!(message, "Expected 2 arguments but got 1.\n[line 3]");
    }

    #[test]
    fn test_arity_error_variant() {
        let (_, result) = run("fun f() {}\nf(1, 2);");

        assert!(matches!(
            result,
            Err(RunError::Runtime(RuntimeError::Arity {
                expected: 0,
                actual: 2,
                line: 2
            }))
        ));
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(runtime_error("print -\"a\";").1, "Operand must be a number.\n[line 1]");
        assert_eq!(
            runtime_error("print 1 + \"a\";").1,
            "Operands must be two numbers or two strings.\n[line 1]"
        );
        assert_eq!(runtime_error("print 1 < nil;").1, "Operands must be numbers.\n[line 1]");
        assert_eq!(
            runtime_error("\"str\"();").1,
            "Can only call functions and classes.\n[line 1]"
        );
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(runtime_error("print nope;").1, "Undefined variable 'nope'.\n[line 1]");
        assert_eq!(runtime_error("\nnope = 1;").1, "Undefined variable 'nope'.\n[line 2]");
    }

    #[test]
    fn test_deep_recursion_within_limit() {
        let source = format!(
            "fun down(n) {{ if (n == 0) return 0; return down(n - 1) + 1; }}\nprint down({});",
            MAX_CALL_DEPTH - 1
        );

        assert_eq!(run_ok(&source), vec![(MAX_CALL_DEPTH - 1).to_string()]);
    }

    #[test]
    fn test_unbounded_recursion_is_a_runtime_error() {
        let (mut session, output) = session();

        let result = session.run(
            "print \"before\";\nfun f(n) { return f(n + 1); }\nf(0);\nprint \"after\";",
        );

        match result {
            Err(RunError::Runtime(e)) => {
                assert!(matches!(e, RuntimeError::StackOverflow { line: 2 }));
                assert_eq!(e.to_string(), "Stack overflow.\n[line 2]");
            }
            other => panic!("expected stack overflow, got {:?}", other),
        }

        session.run("print \"still running\";").expect("session survives");
        session.run("print f;").expect("globals survive");

        assert_eq!(output.lines(), vec!["before", "still running", "<fn f>"]);
    }

    #[test]
    fn test_runtime_error_exit_code() {
        let (_, result) = run("print -nil;");
        assert_eq!(result.map_err(|e| e.exit_code()), Err(70));

        let (_, result) = run("print ;");
        assert_eq!(result.map_err(|e| e.exit_code()), Err(65));
    }
}
