//! Prompt templates with `{name}` placeholder substitution.

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while rendering templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A required variable was not provided.
    #[error("missing required variable: {name}")]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
    },
}

/// A prompt template with `{name}` placeholders.
///
/// Rendering is a single left-to-right pass: substituted values are copied
/// verbatim and never scanned for further placeholders. Braces that do not
/// enclose a known variable name are left untouched, so French text or JSON
/// fragments in a template survive rendering.
///
/// # Examples
///
/// ```
/// use tutor_prompts::template::PromptTemplate;
///
/// let template = PromptTemplate::builder("Question: {original}\nAnswer: {answer}")
///     .with_required_variable("original")
///     .with_required_variable("answer")
///     .build();
///
/// let rendered = template
///     .render_with(&[("original", "Comment dit-on 'apple' ?"), ("answer", "pomme")])
///     .unwrap();
/// assert_eq!(rendered, "Question: Comment dit-on 'apple' ?\nAnswer: pomme");
/// ```
#[derive(Clone, Debug)]
pub struct PromptTemplate {
    template: String,
    required_variables: Vec<String>,
}

impl PromptTemplate {
    /// Creates a template with no required variables.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            required_variables: Vec::new(),
        }
    }

    /// Returns a builder for constructing templates.
    #[must_use]
    pub fn builder(template: impl Into<String>) -> TemplateBuilder {
        TemplateBuilder::new(template)
    }

    /// Renders the template with `runtime_vars`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingVariable`] if a required variable is
    /// absent from `runtime_vars`.
    pub fn render_with(&self, runtime_vars: &[(&str, &str)]) -> TemplateResult<String> {
        let lookup = |name: &str| {
            runtime_vars
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
        };

        for name in &self.required_variables {
            if lookup(name).is_none() {
                return Err(TemplateError::MissingVariable { name: name.clone() });
            }
        }

        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            result.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match placeholder_name(after).and_then(|name| lookup(name).map(|v| (name, v))) {
                Some((name, value)) => {
                    result.push_str(value);
                    rest = &after[name.len() + 1..];
                }
                None => {
                    result.push('{');
                    rest = after;
                }
            }
        }
        result.push_str(rest);

        Ok(result)
    }
}

/// Builder for constructing prompt templates.
#[derive(Debug)]
pub struct TemplateBuilder {
    template: String,
    required_variables: Vec<String>,
}

impl TemplateBuilder {
    /// Creates a new builder with the supplied template text.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            required_variables: Vec::new(),
        }
    }

    /// Declares a variable that must be supplied at render time.
    #[must_use]
    pub fn with_required_variable(mut self, name: impl Into<String>) -> Self {
        self.required_variables.push(name.into());
        self
    }

    /// Builds the template.
    #[must_use]
    pub fn build(self) -> PromptTemplate {
        PromptTemplate {
            template: self.template,
            required_variables: self.required_variables,
        }
    }
}

/// Returns the identifier between an opening brace (already consumed) and
/// the next `}`, if it is a plain `[A-Za-z0-9_]+` name.
fn placeholder_name(after_brace: &str) -> Option<&str> {
    let close = after_brace.find('}')?;
    let name = &after_brace[..close];
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    valid.then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_simple_template() {
        let template = PromptTemplate::builder("Bonjour {name} !")
            .with_required_variable("name")
            .build();

        let rendered = template.render_with(&[("name", "Marie")]).unwrap();
        assert_eq!(rendered, "Bonjour Marie !");
    }

    #[test]
    fn required_variables_error_when_missing() {
        let template = PromptTemplate::builder("Hello {name}!")
            .with_required_variable("name")
            .build();

        let err = template
            .render_with(&[("other", "x")])
            .expect_err("should error");
        assert!(matches!(err, TemplateError::MissingVariable { ref name } if name == "name"));
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let template = PromptTemplate::new("A: {original} B: {answer}");
        let rendered = template
            .render_with(&[("original", "literally {answer}"), ("answer", "suis")])
            .unwrap();
        assert_eq!(rendered, "A: literally {answer} B: suis");
    }

    #[test]
    fn unknown_and_malformed_braces_are_kept() {
        let template = PromptTemplate::new("{json: 1} {unknown} {known} { } {");
        let rendered = template.render_with(&[("known", "ok")]).unwrap();
        assert_eq!(rendered, "{json: 1} {unknown} ok { } {");
    }

    #[test]
    fn values_are_copied_verbatim() {
        let template = PromptTemplate::new("[{answer}]");
        let answer = "  chat, chien\nmaison  \u{e9}t\u{e9} ";
        let rendered = template.render_with(&[("answer", answer)]).unwrap();
        assert_eq!(rendered, format!("[{answer}]"));
    }
}
