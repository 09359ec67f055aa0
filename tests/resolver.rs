mod common;

#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use rox::error::Diagnostics;
    use rox::expr::{Expr, ExprKind};
    use rox::parser::Parser;
    use rox::resolver::{Bindings, Resolver};
    use rox::session::scan;
    use rox::stmt::Stmt;

    use super::common::{run_ok, static_errors};

    fn resolve(source: &str) -> (Vec<Stmt>, Bindings) {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan(source, &mut diagnostics);
        let statements = Parser::new(tokens).parse(&mut diagnostics);
        let bindings = Resolver::new(&mut diagnostics).resolve(&statements);

        assert!(!diagnostics.had_error(), "{:?}", diagnostics.errors());
        (statements, bindings)
    }

    fn printed(stmt: &Stmt) -> &Expr {
        match stmt {
            Stmt::Print(expr) => expr,
            other => panic!("expected print, got {:?}", other),
        }
    }

    #[test]
    fn test_block_locals_and_globals() {
        let (statements, bindings) = resolve("var g = 1; { var a = 1; { print a; print g; } }");

        let Stmt::Block(outer) = &statements[1] else {
            panic!("expected block");
        };
        let Stmt::Block(inner) = &outer[1] else {
            panic!("expected nested block");
        };

        assert_eq!(bindings.depth(printed(&inner[0]).id), Some(1));
        assert_eq!(bindings.depth(printed(&inner[1]).id), None);
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_parameter_seen_from_nested_block() {
        let (statements, bindings) = resolve("fun f(x) { { print x; } }");

        let Stmt::Function(decl) = &statements[0] else {
            panic!("expected function");
        };
        let Stmt::Block(block) = &decl.body[0] else {
            panic!("expected block");
        };

        assert_eq!(bindings.depth(printed(&block[0]).id), Some(1));
    }

    #[test]
    fn test_this_and_super_depths() {
        let (statements, bindings) =
            resolve("class A { f() {} } class B < A { f() { print this; print super.f; } }");

        let Stmt::Class { methods, .. } = &statements[1] else {
            panic!("expected class");
        };
        let body = &methods[0].body;

        let this = printed(&body[0]);
        let sup = printed(&body[1]);
        assert!(matches!(this.kind, ExprKind::This(_)));
        assert!(matches!(sup.kind, ExprKind::Super { .. }));

        // method frame → `this` frame → `super` frame
        assert_eq!(bindings.depth(this.id), Some(1));
        assert_eq!(bindings.depth(sup.id), Some(2));
    }

    #[test]
    fn test_duplicate_local() {
        assert_eq!(
            static_errors("{ var a = 1; var a = 2; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
        assert_eq!(
            static_errors("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_global_redeclaration_is_allowed() {
        assert_eq!(run_ok("var a = 1; var a = 2; print a;"), vec!["2"]);
    }

    #[test]
    fn test_own_initializer() {
        assert_eq!(
            static_errors("var a = 1; { var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_return_rules() {
        assert_eq!(
            static_errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
        assert_eq!(
            static_errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
        assert_eq!(run_ok("class A { init() { return; } } print A();"), vec!["A instance"]);
    }

    #[test]
    fn test_this_and_super_outside_class() {
        assert_eq!(
            static_errors("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            static_errors("fun f() { return super.g(); }"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
        assert_eq!(
            static_errors("class A { f() { super.f(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_eq!(
            static_errors("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_reports_every_error() {
        let errors = static_errors("print \"never\";\n{ var a = 1; var a = 2; }\nreturn 3;");

        assert_eq!(
            errors,
            vec![
                "[line 2] Error at 'a': Already a variable with this name in this scope.",
                "[line 3] Error at 'return': Can't return from top-level code.",
            ]
        );
    }
}
