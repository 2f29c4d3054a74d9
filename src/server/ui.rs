//! Web page served at `/`.

use super::api::ApiError;
use super::AppState;
use crate::analysis::SummaryType;
use crate::error::{AssistError, Result};
use axum::{extract::State, response::Html};
use serde::Serialize;
use std::sync::OnceLock;
use tera::{Context, Tera};

static TEMPLATES: OnceLock<Tera> = OnceLock::new();

fn templates() -> Result<&'static Tera> {
    if let Some(tera) = TEMPLATES.get() {
        return Ok(tera);
    }
    let mut tera = Tera::default();
    tera.add_raw_template("index.html", include_str!("templates/index.html"))?;
    Ok(TEMPLATES.get_or_init(|| tera))
}

#[derive(Serialize)]
struct SummaryOption {
    value: &'static str,
    label: String,
}

fn summary_options() -> Vec<SummaryOption> {
    SummaryType::ALL
        .iter()
        .map(|t| SummaryOption {
            value: t.as_str(),
            label: t.as_str().replace('_', " "),
        })
        .collect()
}

pub async fn index(State(state): State<AppState>) -> std::result::Result<Html<String>, ApiError> {
    let mut context = Context::new();
    context.insert("version", env!("CARGO_PKG_VERSION"));
    context.insert("model", &state.settings().llm.model);
    context.insert("summary_types", &summary_options());
    context.insert("default_summary", SummaryType::default().as_str());

    let rendered = templates()?
        .render("index.html", &context)
        .map_err(AssistError::from)?;
    Ok(Html(rendered))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_renders() {
        let mut context = Context::new();
        context.insert("version", "0.0.0");
        context.insert("model", "test-model");
        context.insert("summary_types", &summary_options());
        context.insert("default_summary", "comprehensive");

        let html = templates().unwrap().render("index.html", &context).unwrap();
        assert!(html.contains("test-model"));
        assert!(html.contains("value=\"bullet_points\""));
        assert!(html.contains("/api/v1/analyze"));
    }
}
