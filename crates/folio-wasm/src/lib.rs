use folio_core::{
    Diagnostic, EmitOptions, ImageEntry, LinkClassifier, RenderOptions, SiteDescriptor,
    emit_html, render_with_options,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// `RenderOptions` fields plus extra classifier sites, all optional.
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct JsOptions {
    #[serde(flatten)]
    render: RenderOptions,
    sites: Vec<SiteDescriptor>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HtmlResult {
    html: String,
    title: Option<String>,
    images: Vec<ImageEntry>,
    diagnostics: Vec<Diagnostic>,
    mixed_html: bool,
}

/// The full render tree, for front ends that draw nodes themselves.
#[wasm_bindgen]
pub fn render_tree(source: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let options = options_from_js(options)?;
    let document = render_with_options(source, &options.render);
    to_js(&document)
}

#[wasm_bindgen]
pub fn render_html(source: &str) -> Result<JsValue, JsValue> {
    render_html_with_options(source, JsValue::UNDEFINED)
}

#[wasm_bindgen]
pub fn render_html_with_options(source: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let options = options_from_js(options)?;
    let origin = options.render.origin_url().map_err(to_js_error)?;
    let document = render_with_options(source, &options.render);

    let emit_options = EmitOptions::new()
        .with_origin(origin)
        .with_classifier(LinkClassifier::with_sites(options.sites));
    let result = HtmlResult {
        html: emit_html(&document.tree, &emit_options),
        title: document
            .front_matter
            .as_ref()
            .and_then(|front| front.get_str("title"))
            .map(str::to_string),
        images: document.tree.images(),
        diagnostics: document.diagnostics,
        mixed_html: document.mixed_html,
    };
    to_js(&result)
}

#[wasm_bindgen]
pub fn classify_link(url: &str) -> Result<JsValue, JsValue> {
    to_js(&folio_core::classify(url))
}

fn options_from_js(value: JsValue) -> Result<JsOptions, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(JsOptions::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(to_js_error)
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
