//! Page rendering
//!
//! Tera templates embedded in the binary. Every page extends `base.html`,
//! which expects a `current_user` variable (username or null) for the
//! navigation bar.

use anyhow::{Context as AnyhowContext, Result};
use axum::response::Html;
use rust_embed::RustEmbed;
use tera::{Context, Tera};

use crate::web::middleware::{Identity, PageError};

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct Templates;

/// Template renderer backed by embedded Tera templates
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Load all embedded templates.
    pub fn new() -> Result<Self> {
        let mut templates = Vec::new();
        for name in Templates::iter() {
            let file = Templates::get(&name)
                .with_context(|| format!("Missing embedded template: {}", name))?;
            let content = std::str::from_utf8(file.data.as_ref())
                .with_context(|| format!("Template is not valid UTF-8: {}", name))?
                .to_string();
            templates.push((name.to_string(), content));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .context("Failed to parse templates")?;
        Ok(Self { tera })
    }

    /// Render a template to an HTML response body.
    pub fn page(&self, template: &str, context: &Context) -> Result<Html<String>, PageError> {
        let body = self
            .tera
            .render(template, context)
            .map_err(|e| anyhow::anyhow!("Failed to render '{}': {}", template, e))?;
        Ok(Html(body))
    }
}

/// Context pre-populated with the current identity.
pub fn base_context(identity: &Identity) -> Context {
    let mut context = Context::new();
    context.insert("current_user", &identity.user().map(|u| &u.username));
    context
}
