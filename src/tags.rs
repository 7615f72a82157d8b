//! Built-in tags and options.
//!
//! The markup tags produce Markdown-style output. Each one escapes the value
//! with the escape function it is handed before wrapping it, so the wrapping
//! markup itself is never escaped.

use crate::{Escape, OptionTag, Tag, TransformError, Value};

/// Wrap the escaped value between two fixed strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Wrap {
    pub before: String,
    pub after: String,
}

impl Wrap {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }
}

impl Tag for Wrap {
    fn render(&mut self, value: Value, escape: Escape<'_>) -> Result<Value, TransformError> {
        let inner = escape.apply(&value.into_string());
        Ok(format!("{}{inner}{}", self.before, self.after).into())
    }
}

macro_rules! markup {
    ($($(#[$doc:meta])* $name:ident => ($before:expr, $after:expr);)*) => {
        $(
            $(#[$doc])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
            pub struct $name;

            impl Tag for $name {
                fn render(&mut self, value: Value, escape: Escape<'_>) -> Result<Value, TransformError> {
                    Wrap::new($before, $after).render(value, escape)
                }
            }
        )*
    };
}

markup! {
    /// `*value*`
    Bold => ("*", "*");
    /// `_value_`
    Italic => ("_", "_");
    /// `` `value` ``
    Code => ("`", "`");
    /// A fenced code block.
    Pre => ("```\n", "\n```");
}

/// An optional value.
///
/// A `None` value renders as `if_none` (unescaped) and marks the option empty;
/// the rest of the chain is skipped unless `resume` is set. Any other value is
/// escaped and passed on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Opt {
    pub if_none: String,
    pub resume: bool,
    empty: bool,
}

impl Opt {
    pub fn new(if_none: impl Into<String>) -> Self {
        Self {
            if_none: if_none.into(),
            ..Self::default()
        }
    }

    pub fn resuming(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }
}

impl Tag for Opt {
    fn render(&mut self, value: Value, escape: Escape<'_>) -> Result<Value, TransformError> {
        self.empty = value.is_none();
        Ok(if self.empty {
            self.if_none.clone().into()
        } else {
            escape.apply(&value.into_string()).into()
        })
    }
}

impl OptionTag for Opt {
    fn is_empty(&self) -> bool {
        self.empty
    }

    fn resume(&self) -> bool {
        self.resume
    }
}
