//! `${name}` placeholder expansion for shell script templates.
//!
//! Only the braced form is a placeholder. Plain `$var` and `$(...)` belong
//! to the shell and pass through untouched.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("template `{template}` uses unknown placeholder `{name}`")]
    UnknownPlaceholder { template: String, name: String },
}

#[derive(Debug, Clone)]
enum Value {
    /// Inserted as a single shell word.
    Quoted(String),
    /// Inserted verbatim. Reserved for operator-supplied commands.
    Raw(String),
}

/// Values available to a template.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: BTreeMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quoted(mut self, name: &str, value: impl ToString) -> Self {
        self.values
            .insert(name.to_string(), Value::Quoted(value.to_string()));
        self
    }

    pub fn raw(mut self, name: &str, value: impl ToString) -> Self {
        self.values.insert(name.to_string(), Value::Raw(value.to_string()));
        self
    }

    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.values.get(name).map(|value| match value {
            Value::Quoted(s) => shell_escape::unix::escape(Cow::Borrowed(s.as_str())),
            Value::Raw(s) => Cow::Borrowed(s.as_str()),
        })
    }
}

/// Expands every placeholder in `template`. `template_name` only feeds
/// error messages.
pub fn render(template_name: &str, template: &str, params: &Params) -> Result<String, RenderError> {
    if let Some(name) = PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .find(|name| params.lookup(name).is_none())
    {
        return Err(RenderError::UnknownPlaceholder {
            template: template_name.to_string(),
            name,
        });
    }

    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
        params
            .lookup(&caps[1])
            .map(Cow::into_owned)
            .unwrap_or_default()
    });

    Ok(rendered.into_owned())
}
