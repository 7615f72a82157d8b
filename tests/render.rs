use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use templatify::{
    args,
    tags::{Bold, Code, Opt},
    Annotation, BindingError, Class, Escape, Meta, Object, Param, Renderer, Tag, Templatify,
    TemplatifyError, TransformError, Value,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn declare(escape: &str, template: &str, params: impl IntoIterator<Item = Param>) -> Renderer {
    Templatify::new()
        .escape(escape)
        .declare(Some(template), params)
        .unwrap()
}

#[test]
fn hello_world() {
    init();

    let r = declare("!", "Hello, {name}!", [Param::new("name")]);
    assert_eq!(r.render(args!(name = "World")).unwrap(), r"Hello, World\!");
}

#[test]
fn plain_substitution() {
    let r = declare(
        "",
        "{x} + {y} = {z}",
        [Param::new("x"), Param::new("y"), Param::new("z")],
    );
    assert_eq!(r.render(args!(x = 1, y = 2, z = 3)).unwrap(), "1 + 2 = 3");
    assert_eq!(r.render(args![1, 2, 3]).unwrap(), "1 + 2 = 3");
}

#[test]
fn attribute_placeholder() {
    init();

    let user = Arc::new(Class::new("User").field("email", Annotation::new()));
    let r = declare(".", "Contact: {user.email}.", [Param::new("user")]);

    let out = r
        .render(args![Object::new(user).with("email", "a@b.com")])
        .unwrap();
    assert_eq!(out, r"Contact: a@b\.com\.");
    assert_eq!(r.template(), "Contact: {user.email}.");
}

#[test]
fn nested_attributes_and_missing_intermediate() {
    let c = Object::anonymous().with("c", "deep");
    let a = Object::anonymous().with("b", c);
    let r = declare("", "{a.b.c}|{a.x.c}", [Param::new("a")]);

    assert_eq!(r.render(args![a]).unwrap(), "deep|None");
}

#[test]
fn field_metadata_applies_to_attribute() {
    let address = Arc::new(Class::new("Address").field("city", Meta::tag::<Code>()));
    let user = Arc::new(Class::new("User").field("address", address.clone()));
    let r = declare("_", "{user.address.city}_", [Param::new("user")]);

    let u = Object::new(user).with("address", Object::new(address).with("city", "san_jose"));
    assert_eq!(r.render(args![u]).unwrap(), r"`san\_jose`\_");
}

#[test]
fn digit_escape_set_keeps_placeholders() {
    let r = declare("0", "{a} and {b}", [Param::new("a"), Param::new("b")]);
    assert_eq!(r.render(args!["x", "y"]).unwrap(), "x and y");

    let r = declare("0123456789", "{a}: {b} of 10", [Param::new("a"), Param::new("b")]);
    assert_eq!(r.render(args!["n", 3]).unwrap(), r"n: \3 of \1\0");
}

#[test]
fn values_stringify_like_python() {
    let r = declare("", "{a} {b} {c}", [Param::new("a"), Param::new("b"), Param::new("c")]);
    assert_eq!(r.render(args![true, 1.0, Value::None]).unwrap(), "True 1.0 None");
}

#[test]
fn missing_parameter_is_a_binding_error() {
    let r = declare("", "{a} {b}", [Param::new("a"), Param::new("b")]);
    let err = r.render(args![1]).unwrap_err();
    assert!(matches!(
        err,
        TemplatifyError::Binding(BindingError::Missing(ref name)) if name == "b"
    ));
}

#[test]
fn defaults_fill_unpassed_parameters() {
    let r = declare(
        "",
        "{greeting}, {name}",
        [Param::new("name"), Param::new("greeting").default("Hi")],
    );
    assert_eq!(r.render(args!["Ann"]).unwrap(), "Hi, Ann");
    assert_eq!(
        r.render(args!["Ann"; greeting = "Yo"]).unwrap(),
        "Yo, Ann"
    );
}

#[test]
fn option_short_circuits_the_chain() {
    let r = declare(
        "",
        "phone: {phone}",
        [Param::new("phone")
            .default(Value::None)
            .meta(Meta::option_instance(Opt::new("n/a")))
            .meta(Meta::tag::<Code>())],
    );
    assert_eq!(r.render(args![]).unwrap(), "phone: n/a");
    assert_eq!(r.render(args!["555"]).unwrap(), "phone: `555`");
}

#[test]
fn tagged_values_are_not_escaped_twice() {
    let r = declare(
        "*",
        "{name} * {plain}",
        [
            Param::new("name").meta(Meta::tag::<Bold>()),
            Param::new("plain"),
        ],
    );
    assert_eq!(
        r.render(args!["a*b", "c*d"]).unwrap(),
        r"*a\*b* \* c\*d"
    );
}

#[test]
fn positional_overflow_is_escaped_only() {
    let r = declare(
        ".",
        "{} {1} {head}",
        [
            Param::new("head").meta(Meta::tag::<Code>()),
            Param::var_positional("rest"),
        ],
    );
    // mixing `{}` and `{1}` is rejected at substitution
    assert!(matches!(
        r.render(args!["h", "a.", "b."]),
        Err(TemplatifyError::Template(_))
    ));

    let r = declare(
        ".",
        "{0} {1} {head}",
        [
            Param::new("head").meta(Meta::tag::<Code>()),
            Param::var_positional("rest"),
        ],
    );
    assert_eq!(
        r.render(args!["h", "a.", "b."]).unwrap(),
        r"a\. b\. `h`"
    );
}

#[test]
fn transform_errors_pass_through() {
    #[derive(Debug, thiserror::Error)]
    #[error("not a number: {0}")]
    struct NotANumber(String);

    let r = declare(
        "",
        "{n}",
        [Param::new("n").meta(Meta::func(|v| match v {
            Value::Int(_) => Ok(v),
            other => Err(TransformError::new(NotANumber(other.into_string()))),
        }))],
    );

    assert_eq!(r.render(args![7]).unwrap(), "7");
    match r.render(args!["seven"]).unwrap_err() {
        TemplatifyError::Transform(err) => {
            assert_eq!(err.to_string(), "not a number: seven");
            assert!(err.downcast_ref::<NotANumber>().is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn concurrent_renders_are_independent() {
    #[derive(Default)]
    struct Counted;

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    impl Tag for Counted {
        fn render(&mut self, value: Value, escape: Escape<'_>) -> Result<Value, TransformError> {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(escape.apply(&value.into_string()).into())
        }
    }

    let r = declare(
        "!",
        "{user.name}! #{n}",
        [
            Param::new("user"),
            Param::new("n").meta(Meta::tag::<Counted>()),
        ],
    );

    thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let r = &r;
                s.spawn(move || {
                    let user = Object::anonymous().with("name", format!("u{i}!"));
                    r.render(args![user, i]).unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), format!(r"u{i}\!\! #{i}"));
        }
    });

    assert_eq!(CALLS.load(Ordering::SeqCst), 8);
    assert_eq!(r.template(), "{user.name}! #{n}");
}
