//! Typed string templates, rendered from function-style arguments.
//!
//! A renderer is declared once from a parameter list and a template. Each
//! parameter carries a declared type whose metadata says how a value is turned
//! into text: plain functions, [`Tag`]s that render markup, and [`OptionTag`]s
//! for values that may be absent. Values that no tag or option handled are
//! escaped by default, so raw input never reaches the output unescaped.
//!
//! # Syntax
//!
//! ```plain
//! Hello, {name}! You have {count} new messages from {sender.display_name}.
//! ```
//!
//! `{name}` is a named placeholder, `{}` and `{0}` refer to overflow positional
//! values, and `{sender.display_name}` walks the attributes of a bound
//! [`Object`]. `{{` and `}}` are literal braces. There are no loops,
//! conditionals or includes.
//!
//! # Usage
//!
//! ```
//! use templatify::{args, tags::Bold, Meta, Param, Renderer, Templatify};
//!
//! let greet: Renderer = Templatify::new()
//!     .escape("!.")
//!     .declare(
//!         Some("Hello, {name}! Score: {score}."),
//!         [Param::new("name").meta(Meta::tag::<Bold>()), Param::new("score")],
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     greet.render(args!["World.", 9.5]).unwrap(),
//!     r"Hello, *World\.*\! Score: 9\.5\.",
//! );
//! ```
//!
//! Attribute paths resolve against an object's class declarations, so a
//! field's own metadata applies:
//!
//! ```
//! use std::sync::Arc;
//! use templatify::{args, tags::Code, Class, Meta, Object, Param, Renderer, Templatify};
//!
//! let user = Arc::new(Class::new("User").field("email", Meta::tag::<Code>()));
//! let mail: Renderer = Templatify::new()
//!     .declare(Some("Write to {user.email}"), [Param::new("user")])
//!     .unwrap();
//!
//! let ann = Object::new(user).with("email", "ann@example.com");
//! assert_eq!(mail.render(args![ann]).unwrap(), "Write to `ann@example.com`");
//! ```
//!
//! # Errors
//!
//! Declaring fails with a [`DeclarationError`] when the template is missing
//! or the parameters are inconsistent. Rendering fails with a
//! [`BindingError`] when the arguments do not fit the parameters, passes a
//! transform's own error through as a [`TransformError`], and fails with a
//! [`TemplateError`] when the final template references something unbound.
//! All of them convert into [`TemplatifyError`].

#[doc(inline)]
pub use errors::*;

#[doc(inline)]
pub use escape::*;

#[doc(inline)]
pub use format::*;

#[doc(inline)]
pub use renderer::*;

#[doc(inline)]
pub use signature::*;

#[doc(inline)]
pub use transform::*;

#[doc(inline)]
pub use value::*;

pub mod attributes;
pub mod tags;

mod errors;
mod escape;
mod format;
mod macros;
mod renderer;
mod signature;
mod transform;
mod value;
