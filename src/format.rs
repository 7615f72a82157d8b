use indexmap::IndexMap;

use crate::TemplateError;

/// A parsed piece of a template, ready for substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item<'s> {
    Text(String),
    /// `{}`, the next positional value.
    Auto,
    /// `{N}`
    Index(usize),
    /// `{name}`
    Key(&'s str),
}

/// The final substitution pass over a (rewritten) template.
///
/// `{{` and `}}` stand for literal braces. The whole content between braces
/// is the key; there are no format specs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Format<'s> {
    pub items: Vec<Item<'s>>,
}

impl<'s> Format<'s> {
    pub fn parse(source: &'s str) -> Result<Self, TemplateError> {
        let unbalanced = |pos: usize| TemplateError::Unbalanced {
            src: source.to_owned(),
            at: (pos, 1).into(),
        };

        let mut items = Vec::new();
        let mut text = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, chara)) = chars.next() {
            match chara {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    text.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    text.push('}');
                }
                '}' => return Err(unbalanced(pos)),
                '{' => {
                    let close = source[pos + 1..]
                        .find(|c: char| c == '{' || c == '}')
                        .map(|off| pos + 1 + off)
                        .filter(|&end| source[end..].starts_with('}'))
                        .ok_or_else(|| unbalanced(pos))?;

                    if !text.is_empty() {
                        items.push(Item::Text(std::mem::take(&mut text)));
                    }

                    let key = &source[pos + 1..close];
                    items.push(if key.is_empty() {
                        Item::Auto
                    } else if key.bytes().all(|b| b.is_ascii_digit()) {
                        key.parse().map(Item::Index).map_err(|_| unbalanced(pos))?
                    } else {
                        Item::Key(key)
                    });

                    while matches!(chars.peek(), Some((i, _)) if *i <= close) {
                        chars.next();
                    }
                }
                other => text.push(other),
            }
        }

        if !text.is_empty() {
            items.push(Item::Text(text));
        }

        let auto = items.iter().any(|i| matches!(i, Item::Auto));
        let manual = items.iter().any(|i| matches!(i, Item::Index(_)));
        if auto && manual {
            return Err(TemplateError::MixedNumbering);
        }

        Ok(Self { items })
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys().any(|k| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            Item::Key(k) => Some(*k),
            _ => None,
        })
    }

    pub fn render(
        &self,
        positional: &[String],
        named: &IndexMap<String, String>,
    ) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(
            self.items
                .iter()
                .map(|item| match item {
                    Item::Text(t) => t.len(),
                    _ => 0,
                })
                .sum(),
        );

        let mut next = 0;
        for item in &self.items {
            match item {
                Item::Text(text) => out.push_str(text),
                Item::Auto => {
                    let value = positional
                        .get(next)
                        .ok_or(TemplateError::MissingIndex(next))?;
                    out.push_str(value);
                    next += 1;
                }
                Item::Index(i) => {
                    out.push_str(positional.get(*i).ok_or(TemplateError::MissingIndex(*i))?)
                }
                Item::Key(key) => out.push_str(
                    named
                        .get(*key)
                        .ok_or_else(|| TemplateError::MissingKey((*key).to_owned()))?,
                ),
            }
        }

        Ok(out)
    }
}
