mod common;

#[cfg(test)]
mod class_tests {
    use pretty_assertions::assert_eq;

    use rox::session::RunError;

    use super::common::{run, run_ok};

    fn runtime_message(source: &str) -> String {
        match run(source).1 {
            Err(RunError::Runtime(e)) => e.to_string(),
            other => panic!("expected runtime error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_initializer_and_method() {
        let source = r#"
            class Person {
                init(name) {
                    this.name = name;
                }

                sayHello() {
                    return "Hello, " + this.name + "!";
                }
            }

            var bob = Person("Bob");
            print bob.sayHello();
        "#;

        assert_eq!(run_ok(source), vec!["Hello, Bob!"]);
    }

    #[test]
    fn test_inheritance_and_override() {
        let source = r#"
            class Animal {
                init(name) {
                    this.name = name;
                }

                speak() {
                    return "I'm an animal.";
                }

                describe() {
                    return this.name + " says " + this.speak();
                }
            }

            class Dog < Animal {
                speak() {
                    return "Woof!";
                }
            }

            var dog = Dog("Buddy");
            print dog.speak();
            print dog.describe();
        "#;

        assert_eq!(run_ok(source), vec!["Woof!", "Buddy says Woof!"]);
    }

    #[test]
    fn test_bound_method_keeps_receiver() {
        let source = r#"
            class Person {
                init(name) { this.name = name; }
                sayHello() { return "Hello, " + this.name + "!"; }
            }

            var fn = Person("Bob").sayHello;
            print fn();
            print fn;
        "#;

        assert_eq!(run_ok(source), vec!["Hello, Bob!", "<fn sayHello>"]);
    }

    #[test]
    fn test_super_calls_superclass_method() {
        let source = r#"
            class A {
                method() { return "A method"; }
            }

            class B < A {
                method() { return "B method"; }
                test() { return super.method(); }
            }

            class C < B {}

            print C().test();
        "#;

        assert_eq!(run_ok(source), vec!["A method"]);
    }

    #[test]
    fn test_super_init_chain() {
        let source = r#"
            class Base {
                init(x) { this.x = x; }
            }

            class Derived < Base {
                init(x, y) {
                    super.init(x);
                    this.y = y;
                }
            }

            var d = Derived(1, 2);
            print d.x + d.y;
        "#;

        assert_eq!(run_ok(source), vec!["3"]);
    }

    #[test]
    fn test_init_returns_instance() {
        let source = r#"
            class Box {
                init(v) {
                    this.v = v;
                    if (v > 0) return;
                    this.v = 0;
                }
            }

            var b = Box(5);
            print b.init(-1) == b;
            print b.v;
        "#;

        assert_eq!(run_ok(source), vec!["true", "0"]);
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class Thing {
                name() { return "method"; }
            }

            fun field() { return "field"; }

            var t = Thing();
            print t.name();
            t.name = field;
            print t.name();
        "#;

        assert_eq!(run_ok(source), vec!["method", "field"]);
    }

    #[test]
    fn test_instances_are_shared_references() {
        let source = r#"
            class Cell {}
            var a = Cell();
            var b = a;
            b.value = "set through b";
            print a.value;
            print a == b;
            print Cell() == Cell();
        "#;

        assert_eq!(run_ok(source), vec!["set through b", "true", "false"]);
    }

    #[test]
    fn test_class_and_instance_rendering() {
        assert_eq!(
            run_ok("class Point {} print Point; print Point();"),
            vec!["Point", "Point instance"]
        );
    }

    #[test]
    fn test_class_arity_follows_init() {
        assert_eq!(
            runtime_message("class P { init(a, b) {} }\nP(1);"),
            "Expected 2 arguments but got 1.\n[line 2]"
        );
        assert_eq!(
            runtime_message("class Q {}\nQ(1);"),
            "Expected 0 arguments but got 1.\n[line 2]"
        );
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            runtime_message("class A {}\nprint A().missing;"),
            "Undefined property 'missing'.\n[line 2]"
        );
        assert_eq!(
            runtime_message("var s = \"text\";\nprint s.length;"),
            "Only instances have properties.\n[line 2]"
        );
        assert_eq!(
            runtime_message("var n = 1;\nn.x = 2;"),
            "Only instances have fields.\n[line 2]"
        );
        assert_eq!(
            runtime_message("class A {}\nclass B < A { f() { return super.nope(); } }\nB().f();"),
            "Undefined property 'nope'.\n[line 2]"
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        assert_eq!(
            runtime_message("var NotAClass = \"nope\";\nclass Sub < NotAClass {}"),
            "Superclass must be a class.\n[line 2]"
        );
    }
}
