//! Subject and body templates.
//!
//! Templates use Handlebars syntax (`{{ name }}`). Rendering never escapes
//! HTML: bodies are HTML already. Missing variables render as empty text.

use std::env;
use std::path::Path;

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Variables available to a template.
pub type TemplateVars = Map<String, Value>;

/// A subject/body pair rendered together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    /// Subject template.
    pub subject: String,
    /// HTML body template.
    pub body: String,
}

impl MessageTemplate {
    /// Creates a template.
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Renders subject and body against the same variables.
    ///
    /// # Errors
    ///
    /// Returns an error if either template fails to parse or render.
    pub fn render(&self, vars: &TemplateVars) -> Result<(String, String)> {
        Ok((render_str(&self.subject, vars)?, render_str(&self.body, vars)?))
    }
}

/// Renders a template string.
///
/// # Errors
///
/// Returns an error if the template does not parse.
pub fn render_str(template: &str, vars: &TemplateVars) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    Ok(handlebars.render_template(template, vars)?)
}

/// Renders a template file against the process environment.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to render.
pub fn render_file(path: impl AsRef<Path>) -> Result<String> {
    let template = std::fs::read_to_string(path)?;
    render_str(&template, &environment_vars())
}

/// The process environment as template variables.
///
/// Entries that are not valid UTF-8 are skipped.
#[must_use]
pub fn environment_vars() -> TemplateVars {
    env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, Value::String(v.into_string().ok()?))))
        .collect()
}

/// Overlays `explicit` on `defaults`; explicit entries win.
#[must_use]
pub fn merge_scope(defaults: TemplateVars, explicit: &TemplateVars) -> TemplateVars {
    let mut scope = defaults;
    for (key, value) in explicit {
        scope.insert(key.clone(), value.clone());
    }
    scope
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn vars(value: Value) -> TemplateVars {
        match value {
            Value::Object(map) => map,
            _ => panic!("Expected an object"),
        }
    }

    #[test]
    fn test_render_variables() {
        let rendered = render_str("Hello {{ name }}!", &vars(json!({"name": "John"}))).unwrap();
        assert_eq!(rendered, "Hello John!");
    }

    #[test]
    fn test_render_does_not_escape_html() {
        let rendered =
            render_str("{{ link }}", &vars(json!({"link": "<a href=\"/x\">x</a>"}))).unwrap();
        assert_eq!(rendered, "<a href=\"/x\">x</a>");
    }

    #[test]
    fn test_provider_placeholders_pass_through() {
        let rendered = render_str(
            "Hi %recipient.name%, {{ app }}",
            &vars(json!({"app": "News"})),
        )
        .unwrap();
        assert_eq!(rendered, "Hi %recipient.name%, News");
    }

    #[test]
    fn test_undefined_variable_renders_empty() {
        let rendered = render_str("Hello {{ name }}!", &TemplateVars::new()).unwrap();
        assert_eq!(rendered, "Hello !");
    }

    #[test]
    fn test_message_template_missing_variable() {
        let template = MessageTemplate::new("Hello {{ name }}", "<p>{{ greeting }}</p>");
        let (subject, body) = template.render(&TemplateVars::new()).unwrap();
        assert_eq!(subject, "Hello ");
        assert_eq!(body, "<p></p>");
    }

    #[test]
    fn test_syntax_error_is_an_error() {
        let result = render_str("{{#if name}}unclosed", &TemplateVars::new());
        assert!(matches!(result, Err(crate::Error::Template(_))));
    }

    #[test]
    fn test_message_template_render() {
        let template = MessageTemplate::new("Welcome {{ name }}", "<p>{{ name }}, {{ count }} new</p>");
        let (subject, body) = template
            .render(&vars(json!({"name": "Ann", "count": 3})))
            .unwrap();
        assert_eq!(subject, "Welcome Ann");
        assert_eq!(body, "<p>Ann, 3 new</p>");
    }

    #[test]
    fn test_merge_scope_explicit_wins() {
        let defaults = vars(json!({"APP_TITLE": "from env", "HOME": "/root"}));
        let explicit = vars(json!({"APP_TITLE": "explicit"}));
        let scope = merge_scope(defaults, &explicit);
        assert_eq!(scope["APP_TITLE"], "explicit");
        assert_eq!(scope["HOME"], "/root");
    }

    #[test]
    fn test_environment_vars_include_path() {
        let env_vars = environment_vars();
        if let Ok(path) = env::var("PATH") {
            assert_eq!(env_vars["PATH"], Value::String(path));
        }
    }

    #[test]
    fn test_render_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<header>static</header>").unwrap();
        assert_eq!(render_file(file.path()).unwrap(), "<header>static</header>");
    }

    #[test]
    fn test_render_file_with_unset_variable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<footer>{{ GUNMAIL_UNSET_FOOTER_VARIABLE }}</footer>").unwrap();
        assert_eq!(render_file(file.path()).unwrap(), "<footer></footer>");
    }

    #[test]
    fn test_render_missing_file() {
        let result = render_file("/definitely/not/here/header.html");
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
