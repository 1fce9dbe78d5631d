//! Built-in mail templates and message translation.

use std::collections::HashMap;

use super::ports::{TemplateError, TemplateRenderer, TemplateVars, Translator};

/// Name of the invitation mail template.
pub const INVITE_EMAIL_TEMPLATE: &str = "invite.email";

const INVITE_EMAIL_BODY: &str = "Hello {invitee},

{inviter} invited you to join {product}.

Your username is: {invitee}

Follow the link below to choose your password and get started:

{link}

If you were not expecting this invitation, you can ignore this email.

--
{product}
";

/// Renders templates with `{name}` placeholders.
///
/// Every placeholder in the template must be present in the variables.
#[derive(Debug, Clone)]
pub struct BuiltinTemplates {
    templates: HashMap<String, String>,
}

impl BuiltinTemplates {
    pub fn new() -> Self {
        let mut templates = HashMap::new();
        templates.insert(INVITE_EMAIL_TEMPLATE.to_string(), INVITE_EMAIL_BODY.to_string());
        Self { templates }
    }

    /// Adds or replaces a template.
    pub fn with_template(mut self, name: &str, body: &str) -> Self {
        self.templates.insert(name.to_string(), body.to_string());
        self
    }
}

impl Default for BuiltinTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for BuiltinTemplates {
    fn render(&self, template: &str, vars: &TemplateVars) -> Result<String, TemplateError> {
        let body = self
            .templates
            .get(template)
            .ok_or_else(|| TemplateError::NotFound(template.to_string()))?;

        let mut output = String::with_capacity(body.len());
        let mut rest = body.as_str();

        while let Some(start) = rest.find('{') {
            output.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    let value = vars
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingVariable(name.to_string()))?;
                    output.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    output.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        output.push_str(rest);

        Ok(output)
    }
}

/// Translator that returns the source message with `%s` placeholders filled in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderTranslator;

impl Translator for PlaceholderTranslator {
    fn t(&self, message: &str, args: &[&str]) -> String {
        let mut args = args.iter();
        let mut parts = message.split("%s");
        let mut output = parts.next().unwrap_or_default().to_string();
        for part in parts {
            output.push_str(args.next().copied().unwrap_or("%s"));
            output.push_str(part);
        }
        output
    }
}
