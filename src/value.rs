use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::Meta;

/// A dynamically typed value bound to a parameter.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Object(Object),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Falsy values are `None`, `false`, zero, and empty strings or lists.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Object(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Fetch an attribute, or `None` if this is not an object or lacks it.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|o| o.get(name))
    }

    /// Stringify, moving the string out when the value already is one.
    pub fn into_string(self) -> String {
        match self {
            Self::Str(s) => s,
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) if x.is_nan() => f.write_str("nan"),
            // Whole floats keep their fractional part: `1.0`, not `1`.
            Self::Float(x) if x.fract() == 0.0 && x.abs() < 1e16 => write!(f, "{x:.1}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(o) => write!(f, "{o}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                a.class.name == b.class.name && a.attrs == b.attrs
            }
            _ => false,
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::Int(v.into())
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Self::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// A record type: a name plus the declared type of each of its fields.
#[derive(Clone, Debug, Default)]
pub struct Class {
    pub name: String,
    pub fields: IndexMap<String, Annotation>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Declare a field and its type.
    pub fn field(mut self, name: impl Into<String>, annotation: impl Into<Annotation>) -> Self {
        self.fields.insert(name.into(), annotation.into());
        self
    }

    pub fn field_type(&self, name: &str) -> Option<&Annotation> {
        self.fields.get(name)
    }
}

/// An instance of a [`Class`].
#[derive(Clone, Debug)]
pub struct Object {
    pub class: Arc<Class>,
    pub attrs: IndexMap<String, Value>,
}

impl Object {
    pub fn new(class: Arc<Class>) -> Self {
        Self {
            class,
            attrs: IndexMap::new(),
        }
    }

    /// An object of an anonymous class with no field declarations.
    pub fn anonymous() -> Self {
        Self::new(Arc::new(Class::new("object")))
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.class.name)?;
        for (i, (name, value)) in self.attrs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

/// The declared type of a parameter or a field.
///
/// `class` is the underlying record type, if any, used to walk attribute
/// paths. `metadata` is the ordered transform chain applied to a value of
/// this type before it is substituted.
#[derive(Clone, Debug, Default)]
pub struct Annotation {
    pub class: Option<Arc<Class>>,
    pub metadata: Vec<Meta>,
}

impl Annotation {
    /// A type with no class and no metadata.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(class: Arc<Class>) -> Self {
        Self {
            class: Some(class),
            metadata: Vec::new(),
        }
    }

    /// Append a metadata item to the chain.
    pub fn meta(mut self, meta: impl Into<Meta>) -> Self {
        self.metadata.push(meta.into());
        self
    }

    /// The declared type of `field` on this type's class.
    pub fn field(&self, field: &str) -> Option<&Annotation> {
        self.class.as_deref().and_then(|c| c.field_type(field))
    }
}

impl From<Arc<Class>> for Annotation {
    fn from(class: Arc<Class>) -> Self {
        Self::of(class)
    }
}

impl From<Meta> for Annotation {
    fn from(meta: Meta) -> Self {
        Self::new().meta(meta)
    }
}
