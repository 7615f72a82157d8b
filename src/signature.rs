use std::fmt;

use indexmap::IndexMap;

use crate::{Annotation, BindingError, DeclarationError, Meta, Value};

/// How a parameter receives its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

impl ParamKind {
    pub fn is_variadic(self) -> bool {
        matches!(self, Self::VarPositional | Self::VarKeyword)
    }

    fn takes_positional(self) -> bool {
        matches!(self, Self::PositionalOnly | Self::PositionalOrKeyword)
    }

    fn takes_keyword(self) -> bool {
        matches!(self, Self::PositionalOrKeyword | Self::KeywordOnly)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PositionalOnly => "positional-only",
            Self::PositionalOrKeyword => "positional-or-keyword",
            Self::VarPositional => "variadic positional",
            Self::KeywordOnly => "keyword-only",
            Self::VarKeyword => "variadic keyword",
        })
    }
}

/// A declared parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
    pub annotation: Annotation,
}

impl Param {
    /// A positional-or-keyword parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::PositionalOrKeyword)
    }

    pub fn positional_only(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::PositionalOnly)
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::KeywordOnly)
    }

    pub fn var_positional(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::VarPositional)
    }

    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::VarKeyword)
    }

    pub fn with_kind(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            annotation: Annotation::default(),
        }
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn annotated(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotation = annotation.into();
        self
    }

    /// Append one metadata item to this parameter's declared type.
    pub fn meta(mut self, meta: impl Into<Meta>) -> Self {
        self.annotation.metadata.push(meta.into());
        self
    }
}

/// Call-site arguments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    pub positional: Vec<Value>,
    pub named: IndexMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }
}

/// Arguments resolved against a [`Signature`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bound {
    /// Overflow positional values collected by the variadic positional parameter.
    pub positional: Vec<Value>,
    /// Every named parameter, defaults included, with keyword overflow merged in.
    pub named: IndexMap<String, Value>,
}

/// An ordered, validated parameter list.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new(params: impl IntoIterator<Item = Param>) -> Result<Self, DeclarationError> {
        let params: Vec<Param> = params.into_iter().collect();

        let mut last_kind = ParamKind::PositionalOnly;
        let mut seen_default: Option<&str> = None;
        for (i, param) in params.iter().enumerate() {
            if params[..i].iter().any(|p| p.name == param.name) {
                return Err(DeclarationError::DuplicateParameter(param.name.clone()));
            }

            if param.kind.is_variadic() && param.kind == last_kind && i > 0 {
                return Err(DeclarationError::DuplicateVariadic {
                    kind: param.kind,
                    name: param.name.clone(),
                });
            }

            if param.kind < last_kind {
                return Err(DeclarationError::ParameterOrder {
                    name: param.name.clone(),
                    kind: param.kind,
                    after: format!("{last_kind} parameters"),
                });
            }
            last_kind = param.kind;

            if param.kind.takes_positional() {
                match (&param.default, seen_default) {
                    (Some(_), _) => seen_default = Some(param.name.as_str()),
                    (None, Some(after)) => {
                        return Err(DeclarationError::ParameterOrder {
                            name: param.name.clone(),
                            kind: param.kind,
                            after: format!("defaulted parameter '{after}'"),
                        })
                    }
                    (None, None) => {}
                }
            }
        }

        Ok(Self { params })
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn var_keyword(&self) -> Option<&Param> {
        self.params.iter().find(|p| p.kind == ParamKind::VarKeyword)
    }

    /// Bind call-site arguments to the parameters.
    ///
    /// Defaults are filled in for anything not given; overflow keywords are
    /// placed first in `named`, followed by the declared parameters in order.
    pub fn bind(&self, args: Args) -> Result<Bound, BindingError> {
        let Args {
            positional,
            mut named,
        } = args;

        let positional_params: Vec<&Param> = self
            .params
            .iter()
            .filter(|p| p.kind.takes_positional())
            .collect();
        let var_positional = self
            .params
            .iter()
            .any(|p| p.kind == ParamKind::VarPositional);
        let var_keyword = self.var_keyword().is_some();

        let given = positional.len();
        let mut positional = positional.into_iter();
        let mut values: IndexMap<&str, Value> = IndexMap::new();

        for param in &positional_params {
            match positional.next() {
                Some(value) => {
                    values.insert(&param.name, value);
                }
                None => break,
            }
        }

        let overflow: Vec<Value> = positional.collect();
        if !overflow.is_empty() && !var_positional {
            return Err(BindingError::TooManyPositional {
                expected: positional_params.len(),
                got: given,
            });
        }

        for param in &self.params {
            if !param.kind.takes_keyword() {
                continue;
            }
            if let Some(value) = named.shift_remove(&param.name) {
                if values.contains_key(param.name.as_str()) {
                    return Err(BindingError::MultipleValues(param.name.clone()));
                }
                values.insert(&param.name, value);
            }
        }

        if let Some((key, _)) = named.first() {
            if !var_keyword {
                return Err(
                    match self
                        .params
                        .iter()
                        .find(|p| &p.name == key && p.kind == ParamKind::PositionalOnly)
                    {
                        Some(p) => BindingError::PositionalOnlyAsKeyword(p.name.clone()),
                        None => BindingError::UnexpectedKeyword(key.clone()),
                    },
                );
            }
        }

        let mut bound = Bound {
            positional: overflow,
            named,
        };
        for param in &self.params {
            if param.kind.is_variadic() {
                continue;
            }
            let value = match values.shift_remove(param.name.as_str()) {
                Some(value) => value,
                None => param
                    .default
                    .clone()
                    .ok_or_else(|| BindingError::Missing(param.name.clone()))?,
            };
            bound.named.insert(param.name.clone(), value);
        }

        Ok(bound)
    }
}
