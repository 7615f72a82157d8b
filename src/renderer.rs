use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use log::{debug, trace};

use crate::{
    attributes::{attribute_fields, resolve_all},
    render_value, Annotation, Args, DeclarationError, Escaper, Format, Param, Signature,
    TemplatifyError,
};

/// Receives the resolved positional and named arguments of each render,
/// right before substitution.
pub type TraceHook = Arc<dyn Fn(&[String], &IndexMap<String, String>) + Send + Sync>;

/// Declaration-time options, producing a [`Renderer`] from a parameter list
/// and a template.
#[derive(Clone, Debug, Default)]
pub struct Templatify {
    escape: Option<String>,
    description: Option<String>,
}

impl Templatify {
    pub fn new() -> Self {
        Self::default()
    }

    /// Characters to escape in the template's literal text and in values.
    pub fn escape(mut self, symbols: impl Into<String>) -> Self {
        self.escape = Some(symbols.into());
        self
    }

    /// A human readable description attached to every declared renderer.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a renderer.
    ///
    /// Fails with [`DeclarationError::MissingTemplate`] if `template` is
    /// `None`, or if the parameters or escape set are invalid.
    pub fn declare<C>(
        &self,
        template: Option<&str>,
        params: impl IntoIterator<Item = Param>,
    ) -> Result<Renderer<C>, DeclarationError> {
        let template = template.ok_or(DeclarationError::MissingTemplate)?;
        let signature = Signature::new(params)?;
        let escaper = Escaper::new(self.escape.as_deref().unwrap_or_default())?;
        let attribute_fields = attribute_fields(template);

        trace!("declared template with attribute fields {attribute_fields:?}");

        Ok(Renderer {
            template: template.to_owned(),
            signature,
            escaper,
            attribute_fields,
            description: self.description.clone(),
            context: None,
            on_resolved: None,
        })
    }
}

/// A declared template, rendered from call-site arguments.
///
/// The template, the parameters and the attribute fields are fixed at
/// declaration; each [`Renderer::render`] works on its own copy. `C` is the
/// type of the optional context object.
pub struct Renderer<C = ()> {
    template: String,
    signature: Signature,
    escaper: Escaper,
    attribute_fields: Vec<String>,
    description: Option<String>,
    context: Option<C>,
    on_resolved: Option<TraceHook>,
}

impl<C> Renderer<C> {
    /// Attach a context object, replacing any previous one.
    pub fn ctx(&mut self, context: C) -> &mut Self {
        self.context = Some(context);
        self
    }

    pub fn with_ctx(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    /// Install a hook receiving the resolved arguments of every render.
    pub fn on_resolved<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&[String], &IndexMap<String, String>) + Send + Sync + 'static,
    {
        self.on_resolved = Some(Arc::new(hook));
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn attribute_fields(&self) -> &[String] {
        &self.attribute_fields
    }

    /// Escape a string the same way values are escaped.
    pub fn escape(&self, s: &str) -> String {
        self.escaper.escape(s)
    }

    /// Render the template from call-site arguments.
    ///
    /// Values of declared and attribute parameters run through their type's
    /// metadata chain. Overflow values, positional or keyword, only get the
    /// default escaping.
    pub fn render(&self, args: Args) -> Result<String, TemplatifyError> {
        let mut bound = self.signature.bind(args)?;

        let template = self.escaper.escape_template(&self.template);
        let (template, synthetic) = if self.attribute_fields.is_empty() {
            (template, Vec::new())
        } else {
            resolve_all(&self.attribute_fields, &mut bound.named, template)
        };

        let mut named = IndexMap::with_capacity(bound.named.len());
        for (name, value) in bound.named {
            let annotation = self.annotation_for(&name, &synthetic);
            let rendered = render_value(value, annotation, &self.escaper)?;
            named.insert(name, rendered);
        }

        // Overflow positional values only ever get the default escaping.
        let positional: Vec<String> = bound
            .positional
            .into_iter()
            .map(|v| self.escaper.escape(&v.into_string()))
            .collect();

        debug!("resolved arguments: positional={positional:?}, named={named:?}");
        if let Some(hook) = &self.on_resolved {
            hook(&positional, &named);
        }

        Ok(Format::parse(&template)?.render(&positional, &named)?)
    }

    fn annotation_for<'a>(&'a self, name: &str, synthetic: &'a [Param]) -> Option<&'a Annotation> {
        synthetic
            .iter()
            .chain(
                self.signature
                    .params()
                    .iter()
                    .filter(|p| !p.kind.is_variadic()),
            )
            .find(|p| p.name == name)
            .map(|p| &p.annotation)
    }
}

impl<C: fmt::Debug> fmt::Debug for Renderer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("template", &self.template)
            .field("signature", &self.signature)
            .field("escaper", &self.escaper)
            .field("attribute_fields", &self.attribute_fields)
            .field("description", &self.description)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;
    use crate::{args, BindingError, Meta, TemplateError};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn missing_template() {
        assert!(matches!(
            Templatify::new().declare::<()>(None, []),
            Err(DeclarationError::MissingTemplate)
        ));
    }

    #[test]
    fn hello_world() {
        init();

        let r: Renderer = Templatify::new()
            .escape("!")
            .declare(Some("Hello, {name}!"), [Param::new("name")])
            .unwrap();
        assert_eq!(r.render(args!["World"]).unwrap(), r"Hello, World\!");
        assert_eq!(r.render(args!(; name = "Bob!")).unwrap(), r"Hello, Bob\!\!");
        assert_eq!(r.template(), "Hello, {name}!");
    }

    #[test]
    fn context_is_last_writer_wins() {
        let mut r: Renderer<&str> = Templatify::new()
            .declare(Some("{x}"), [Param::new("x")])
            .unwrap();
        assert_eq!(r.context(), None);
        r.ctx("first").ctx("second");
        assert_eq!(r.context(), Some(&"second"));
        assert_eq!(r.render(args![1]).unwrap(), "1");
    }

    #[test]
    fn trace_hook_sees_transformed_arguments() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut r: Renderer = Templatify::new()
            .escape(".")
            .declare(
                Some("{} {a}"),
                [Param::new("a"), Param::var_positional("rest")],
            )
            .unwrap();
        r.on_resolved(move |positional, named| {
            sink.lock()
                .unwrap()
                .push((positional.to_vec(), named.clone()));
        });

        assert_eq!(r.render(args!["x.", "y."]).unwrap(), r"y\. x\.");
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, vec![r"y\.".to_string()]);
        assert_eq!(seen[0].1["a"], r"x\.");
    }

    #[test]
    fn keyword_overflow_is_only_escaped() {
        let r: Renderer = Templatify::new()
            .escape(".")
            .declare(
                Some("{a} {b} {c}"),
                [
                    Param::new("c").meta(Meta::func(|v| Ok(format!("<{v}>").into()))),
                    Param::var_keyword("kw").meta(Meta::func(|v| Ok(format!("<{v}>").into()))),
                ],
            )
            .unwrap();
        assert_eq!(
            r.render(args!(; a = 1.5, b = "x.", c = 3)).unwrap(),
            r"1\.5 x\. <3>"
        );
    }

    #[test]
    fn errors_surface_by_category() {
        let r: Renderer = Templatify::new()
            .declare(Some("{name} {other}"), [Param::new("name")])
            .unwrap();
        assert!(matches!(
            r.render(args![]),
            Err(TemplatifyError::Binding(BindingError::Missing(_)))
        ));
        assert!(matches!(
            r.render(args!["x"]),
            Err(TemplatifyError::Template(TemplateError::MissingKey(k))) if k == "other"
        ));
    }

    #[test]
    fn renders_leave_declaration_untouched() {
        let r: Renderer = Templatify::new()
            .escape(".")
            .declare(Some("{u.name}."), [Param::new("u")])
            .unwrap();
        let u = crate::Object::anonymous().with("name", "ann");
        assert_eq!(r.render(args![u.clone()]).unwrap(), r"ann\.");
        assert_eq!(r.render(args![u.with("name", "bo")]).unwrap(), r"bo\.");
        assert_eq!(r.template(), "{u.name}.");
        assert_eq!(r.signature().params().len(), 1);
    }
}
