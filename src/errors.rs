use std::{error::Error as StdError, fmt};

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::ParamKind;

/// Any error that can surface from declaring or rendering a template.
#[derive(Debug, Diagnostic, Error)]
pub enum TemplatifyError {
    /// The renderer could not be declared.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Declaration(#[from] DeclarationError),

    /// The call-site arguments do not fit the declared parameters.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Binding(#[from] BindingError),

    /// A metadata transform failed.
    ///
    /// The transform's own error is carried unmodified.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Transform(#[from] TransformError),

    /// The final substitution pass failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),
}

/// Raised while building a renderer; no renderer is produced.
#[derive(Debug, Diagnostic, Error)]
pub enum DeclarationError {
    /// No template string was supplied.
    #[error("template string is missing")]
    #[diagnostic(code(templatify::declaration::missing_template))]
    MissingTemplate,

    /// Two parameters share a name.
    #[error("duplicate parameter name '{0}'")]
    #[diagnostic(code(templatify::declaration::duplicate_parameter))]
    DuplicateParameter(String),

    /// More than one variadic parameter of the same kind.
    #[error("more than one {kind} parameter: '{name}'")]
    #[diagnostic(code(templatify::declaration::duplicate_variadic))]
    DuplicateVariadic { kind: ParamKind, name: String },

    /// Parameters are declared in an order that cannot be bound.
    #[error("parameter '{name}' of kind {kind} cannot follow {after}")]
    #[diagnostic(code(templatify::declaration::parameter_order))]
    ParameterOrder {
        name: String,
        kind: ParamKind,
        after: String,
    },

    /// The escape set could not be compiled into a pattern.
    #[error("invalid escape set {symbols:?}: {err}")]
    #[diagnostic(code(templatify::declaration::invalid_escape))]
    InvalidEscape {
        symbols: String,
        #[source]
        err: regex::Error,
    },
}

/// Raised when call-site arguments cannot satisfy the declared parameters.
#[derive(Debug, Diagnostic, Error, PartialEq, Eq)]
pub enum BindingError {
    /// A required parameter received no value.
    #[error("missing a required argument: '{0}'")]
    #[diagnostic(code(templatify::binding::missing))]
    Missing(String),

    /// More positional values than positional parameters, and no variadic sink.
    #[error("too many positional arguments: expected at most {expected}, got {got}")]
    #[diagnostic(code(templatify::binding::too_many_positional))]
    TooManyPositional { expected: usize, got: usize },

    /// A keyword that matches no parameter, and no variadic keyword sink.
    #[error("got an unexpected keyword argument '{0}'")]
    #[diagnostic(code(templatify::binding::unexpected_keyword))]
    UnexpectedKeyword(String),

    /// A parameter was given both positionally and by keyword.
    #[error("multiple values for argument '{0}'")]
    #[diagnostic(code(templatify::binding::multiple_values))]
    MultipleValues(String),

    /// A positional-only parameter was passed by keyword.
    #[error("positional-only argument '{0}' passed as keyword argument")]
    #[diagnostic(code(templatify::binding::positional_only))]
    PositionalOnlyAsKeyword(String),
}

/// The error a metadata transform raised, carried as-is.
///
/// `Display` and `source()` are those of the wrapped error, and the original
/// value can be recovered with [`TransformError::downcast_ref`] or
/// [`TransformError::into_inner`].
pub struct TransformError(Box<dyn StdError + Send + Sync + 'static>);

impl TransformError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self(err.into())
    }

    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref()
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Debug for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for TransformError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl Diagnostic for TransformError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("templatify::transform"))
    }
}

/// Raised by the final substitution pass.
#[derive(Debug, Diagnostic, Error)]
pub enum TemplateError {
    /// A named placeholder has no value.
    #[error("missing key `{0}`")]
    #[diagnostic(code(templatify::template::missing_key))]
    MissingKey(String),

    /// A positional placeholder points past the end of the positional values.
    #[error("replacement index {0} out of range for positional args")]
    #[diagnostic(code(templatify::template::missing_index))]
    MissingIndex(usize),

    /// `{}` and `{0}` used in the same template.
    #[error("cannot switch between automatic and manual field numbering")]
    #[diagnostic(code(templatify::template::mixed_numbering))]
    MixedNumbering,

    /// A brace with no partner.
    #[error("unbalanced braces in template")]
    #[diagnostic(code(templatify::template::unbalanced))]
    Unbalanced {
        #[source_code]
        src: String,

        #[label = "unbalanced brace"]
        at: SourceSpan,
    },
}
