use expect_test::expect;
use integration_tests::{
    BodySource, Fixture, MAIN, ScriptBuilder, func, library, main_script, named, plain, primitive,
    signature, snapshot,
};
use qss_ast::{Body, HookTime, Signature};
use qss_driver::validate_items;
use qss_index::DEFAULT_BUNDLE;
use qss_name::ScriptPath;
use qss_resolve::Resolver;
use qss_types::{Primitive, Purity};

fn empty(first: u32, last: u32) -> Body {
    let mut body = BodySource::new();
    let root = body.block(Vec::new(), first, last);
    body.finish(root)
}

/// `main` importing the library, with a hook on line 3
fn hooked(time: HookTime, hook_signature: Signature, hook_body: Body) -> ScriptBuilder {
    main_script(empty(0, 1))
        .import("lib")
        .hook(time, "shout", hook_signature, hook_body, 3)
}

#[test]
fn test_hook_signature_must_match_target() {
    let hook_signature = signature(
        Purity::Impure,
        vec![("x", primitive(Primitive::Int, 3))],
        None,
        3,
    );
    let mut fixture = Fixture::new()
        .with(library())
        .with(hooked(HookTime::After, hook_signature, empty(3, 4)).build());

    expect![[r#"
        error 4:5-4:13: Hook signature Func(Int) did not match target function signature Func()
          note src/lib/lib.qss:1:5: Original function was defined here
    "#]]
    .assert_eq(&fixture.diagnostics(MAIN));
}

#[test]
fn test_matching_hook_is_accepted() {
    let mut fixture = Fixture::new()
        .with(library())
        .with(hooked(HookTime::Before, plain(), empty(3, 4)).build());

    expect![""].assert_eq(&fixture.diagnostics(MAIN));
}

#[test]
fn test_hook_on_unknown_function() {
    let script = main_script(empty(0, 1))
        .hook(HookTime::After, "missing", plain(), empty(3, 4), 3)
        .build();
    let mut fixture = Fixture::new().with(script);

    expect![[r#"
        error 4:5-4:13: Could not resolve func missing
    "#]]
    .assert_eq(&fixture.diagnostics(MAIN));
}

#[test]
fn test_before_hook_cannot_return() {
    let mut body = BodySource::new();
    let ret = body.ret(None, 4);
    let root = body.block(vec![ret], 3, 5);
    let mut fixture = Fixture::new()
        .with(library())
        .with(hooked(HookTime::Before, plain(), body.finish(root)).build());

    expect![[r#"
        error 5:5-5:13: 'return' statements are forbidden in 'before' hooks
    "#]]
    .assert_eq(&fixture.diagnostics(MAIN));
}

#[test]
fn test_only_first_parameter_may_be_this() {
    let params = vec![
        ("a", primitive(Primitive::Int, 2)),
        ("this", primitive(Primitive::Int, 2)),
    ];
    let script = main_script(empty(0, 1))
        .func(func("f", signature(Purity::Impure, params, None, 2), empty(2, 3), 2))
        .build();
    let mut fixture = Fixture::new().with(script);

    expect![[r#"
        error 3:5-3:13: Only the first function parameter may be named 'this'
    "#]]
    .assert_eq(&fixture.diagnostics(MAIN));
}

#[test]
fn test_trait_impl_must_match_trait() {
    let greet_signature = signature(
        Purity::Impure,
        vec![("x", primitive(Primitive::Int, 7))],
        None,
        7,
    );
    let script = main_script(empty(0, 0))
        .trait_def("Greeter", vec![("greet", plain()), ("wave", plain())], 1)
        .structure("Person", Vec::new(), 4)
        .trait_impl(
            "Greeter",
            named("Person", 6),
            vec![
                func("greet", greet_signature, empty(7, 7), 7),
                func("dance", plain(), empty(8, 8), 8),
            ],
            6,
        )
        .build();
    let mut fixture = Fixture::new().with(script);

    expect![[r#"
        error 7:5-7:13: Trait implementation did not implement function wave
          note src/main/main.qss:4:5: Original function was defined here
        error 8:5-8:13: Trait function implementation was of incorrect type; expected Func(), got Func(Int)
          note src/main/main.qss:3:5: Original function was defined here
        error 9:5-9:13: Unknown trait function dance
          note src/main/main.qss:2:5: Trait was defined here
    "#]]
    .assert_eq(&fixture.diagnostics(MAIN));
}

#[test]
fn test_complete_trait_impl_is_accepted() {
    let script = main_script(empty(0, 0))
        .trait_def("Greeter", vec![("greet", plain())], 1)
        .structure("Person", Vec::new(), 4)
        .trait_impl(
            "Greeter",
            named("Person", 6),
            vec![func("greet", plain(), empty(7, 7), 7)],
            6,
        )
        .build();
    let mut fixture = Fixture::new().with(script);

    expect![""].assert_eq(&fixture.diagnostics(MAIN));
}

#[test]
fn test_duplicate_struct_across_scripts() {
    let first = ScriptBuilder::new("src/main/one.qss", "main")
        .structure("Point", Vec::new(), 0)
        .build();
    let second = ScriptBuilder::new("src/main/two.qss", "main")
        .structure("Point", Vec::new(), 2)
        .build();
    let mut fixture = Fixture::new().with(first).with(second);

    expect![""].assert_eq(&fixture.diagnostics("src/main/one.qss"));
    expect![[r#"
        error 3:5-3:13: Struct Point was already defined
          note src/main/one.qss:1:5: Previously defined here
    "#]]
    .assert_eq(&fixture.diagnostics("src/main/two.qss"));
}

#[test]
fn test_unresolved_field_type() {
    let script = ScriptBuilder::new(MAIN, "main")
        .structure("Point", vec![("origin", named("Vector", 1))], 0)
        .build();
    let mut fixture = Fixture::new().with(script);

    expect![[r#"
        error 2:5-2:13: Could not resolve type of origin
    "#]]
    .assert_eq(&fixture.diagnostics(MAIN));
}

#[test]
fn test_validation_runs_against_shared_indices() {
    let mut fixture = Fixture::new()
        .with(library())
        .with(hooked(HookTime::After, plain(), empty(3, 4)).build());
    let session = fixture.session();
    session.index();

    let indices = session.indices();
    let resolver = Resolver::new(&indices);
    let script = session
        .script(DEFAULT_BUNDLE, &ScriptPath::parse(MAIN))
        .expect("main was not added");
    assert_eq!(snapshot(&validate_items(&resolver, script)), "");
    assert_eq!(resolver.into_symbols().len(), 1);
}
