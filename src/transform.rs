use std::{
    any::Any,
    fmt,
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::trace;

use crate::{Annotation, Escape, Escaper, TransformError, Value};

/// A transform that renders a value into its final, escaped textual form,
/// typically wrapping it in markup.
pub trait Tag: Send {
    fn render(&mut self, value: Value, escape: Escape<'_>) -> Result<Value, TransformError>;
}

/// A transform for values that may be absent.
///
/// After [`Tag::render`] the instance reports whether the value was empty and
/// whether the rest of the chain should still run in that case.
pub trait OptionTag: Tag {
    fn is_empty(&self) -> bool;

    fn resume(&self) -> bool;
}

pub type TransformFn = Arc<dyn Fn(Value) -> Result<Value, TransformError> + Send + Sync>;

/// Either a constructor producing a fresh instance per evaluation, or an
/// instance built up front and shared by every evaluation.
pub enum Factory<T: ?Sized> {
    Type(Arc<dyn Fn() -> Box<T> + Send + Sync>),
    Instance(Arc<Mutex<T>>),
}

impl<T: ?Sized> Factory<T> {
    /// Turn the declared item into a usable instance.
    pub fn instantiate(&self) -> Instance<'_, T> {
        match self {
            Self::Type(new) => Instance::Fresh(new()),
            Self::Instance(shared) => {
                Instance::Shared(shared.lock().unwrap_or_else(PoisonError::into_inner))
            }
        }
    }
}

impl<T: ?Sized> Clone for Factory<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Type(new) => Self::Type(new.clone()),
            Self::Instance(shared) => Self::Instance(shared.clone()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Factory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type(_) => "Type",
            Self::Instance(_) => "Instance",
        })
    }
}

pub enum Instance<'a, T: ?Sized> {
    Fresh(Box<T>),
    Shared(MutexGuard<'a, T>),
}

impl<T: ?Sized> Deref for Instance<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Self::Fresh(t) => t,
            Self::Shared(t) => t,
        }
    }
}

impl<T: ?Sized> DerefMut for Instance<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self {
            Self::Fresh(t) => t,
            Self::Shared(t) => t,
        }
    }
}

/// One item of a declared type's metadata list.
#[derive(Clone)]
pub enum Meta {
    /// A plain `value -> value` function.
    Func(TransformFn),
    Tag(Factory<dyn Tag>),
    Option(Factory<dyn OptionTag>),
    /// Anything else; carried along but never executed.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Meta {
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self::Func(Arc::new(f))
    }

    /// A tag type, instantiated with its defaults on every evaluation.
    pub fn tag<T: Tag + Default + 'static>() -> Self {
        Self::Tag(Factory::Type(Arc::new(|| Box::new(T::default()) as Box<dyn Tag>)))
    }

    /// A pre-built tag shared across evaluations.
    pub fn tag_instance<T: Tag + 'static>(tag: T) -> Self {
        Self::Tag(Factory::Instance(Arc::new(Mutex::new(tag))))
    }

    /// An option type, instantiated with its defaults on every evaluation.
    pub fn option<T: OptionTag + Default + 'static>() -> Self {
        Self::Option(Factory::Type(Arc::new(|| {
            Box::new(T::default()) as Box<dyn OptionTag>
        })))
    }

    /// A pre-built option shared across evaluations.
    pub fn option_instance<T: OptionTag + 'static>(option: T) -> Self {
        Self::Option(Factory::Instance(Arc::new(Mutex::new(option))))
    }

    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }
}

impl fmt::Debug for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Func(_) => f.write_str("Func"),
            Self::Tag(factory) => f.debug_tuple("Tag").field(factory).finish(),
            Self::Option(factory) => f.debug_tuple("Option").field(factory).finish(),
            Self::Opaque(_) => f.write_str("Opaque"),
        }
    }
}

/// A value after its transform chain has run.
#[derive(Clone, Debug, PartialEq)]
pub struct Transformed {
    pub value: Value,
    /// Whether a tag or option already produced the final escaped text.
    pub escaped: bool,
}

/// Run `metadata` over `value` in declared order.
///
/// Plain functions map the value. Tags and options receive the escape
/// function until something has escaped the value, then a no-op. An option
/// that reports an empty value and does not ask to resume ends the chain.
pub fn apply_chain(
    value: Value,
    metadata: &[Meta],
    escaper: &Escaper,
) -> Result<Transformed, TransformError> {
    let mut value = value;
    let mut escaped = false;

    for meta in metadata {
        let escape = if escaped {
            Escape::noop()
        } else {
            Escape::new(escaper)
        };

        match meta {
            Meta::Func(f) => value = f(value)?,
            Meta::Tag(factory) => {
                value = factory.instantiate().render(value, escape)?;
                escaped = true;
            }
            Meta::Option(factory) => {
                let mut option = factory.instantiate();
                value = option.render(value, escape)?;
                escaped = true;

                if option.is_empty() && !option.resume() {
                    trace!("empty option ends the transform chain");
                    break;
                }
            }
            Meta::Opaque(_) => {}
        }
    }

    Ok(Transformed { value, escaped })
}

/// Transform a bound value into the string that is substituted into the
/// template, escaping it by default when no tag or option did.
pub fn render_value(
    value: Value,
    annotation: Option<&Annotation>,
    escaper: &Escaper,
) -> Result<String, TransformError> {
    let metadata = annotation.map_or(&[][..], |a| a.metadata.as_slice());
    let Transformed { value, escaped } = apply_chain(value, metadata, escaper)?;

    Ok(if escaped {
        value.into_string()
    } else {
        escaper.escape(&value.into_string())
    })
}
