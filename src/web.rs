use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::i18n::LanguageRegistry;
use crate::pipeline::TranslationPipeline;

const INDEX_HTML: &str = include_str!("../resources/frontend/index.html");

/// Form posted when a language select needs its options
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LanguagesForm {
    /// Id of the select being filled ("sourceLang" or "targetLang")
    pub element: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranslateForm {
    pub source_lang: String,
    pub target_lang: String,
    pub source_text: String,
}

pub fn router(pipeline: Arc<TranslationPipeline>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/languages", post(languages))
        .route("/translate", post(translate))
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Render the `<option>` list for one of the two language selects.
///
/// Malformed form data yields an empty list.
async fn languages(
    State(pipeline): State<Arc<TranslationPipeline>>,
    form: Result<Form<LanguagesForm>, FormRejection>,
) -> Html<String> {
    match form {
        Ok(Form(form)) => Html(render_options(pipeline.registry(), &form)),
        Err(rejection) => {
            debug!("Rejected languages form: {}", rejection);
            Html(String::new())
        }
    }
}

async fn translate(
    State(pipeline): State<Arc<TranslationPipeline>>,
    form: Result<Form<TranslateForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!("Rejected translate form, treating as empty: {}", rejection);
            TranslateForm::default()
        }
    };

    match pipeline
        .translate(&form.source_lang, &form.target_lang, &form.source_text)
        .await
    {
        Ok(translated) => (StatusCode::OK, translated).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Build the options for the select named by `form.element`.
///
/// The select's current value comes first unless it equals the value chosen
/// in the other select; every other registry name follows in order, minus
/// both selections.
pub fn render_options(registry: &LanguageRegistry, form: &LanguagesForm) -> String {
    let (current, excluded) = if form.element == "targetLang" {
        (form.target_lang.as_str(), form.source_lang.as_str())
    } else {
        (form.source_lang.as_str(), form.target_lang.as_str())
    };

    let mut options = Vec::new();
    if current != excluded {
        options.push(option_tag(current));
    }

    let current = current.to_lowercase();
    let excluded = excluded.to_lowercase();
    options.extend(
        registry
            .display_names()
            .into_iter()
            .filter(|name| {
                let name = name.to_lowercase();
                name != current && name != excluded
            })
            .map(option_tag),
    );

    options.join("\n")
}

fn option_tag(name: &str) -> String {
    format!("<option>{}</option>", escape_html(name))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
