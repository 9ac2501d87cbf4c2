//! Posting-form scraping
//!
//! The forum exposes no API, so everything a submission needs is read out of
//! the HTML of the posting page: the two anti-forgery tokens and the default
//! state of the option checkboxes. Lookups are always "first element whose
//! `name` attribute equals X", so element order and surrounding markup do
//! not matter.

use crate::error::ParseError;
use crate::types::FormTokens;
use scraper::{ElementRef, Html, Selector};

/// `name` of the hidden form key input
pub const FORM_KEY: &str = "formkey";
/// `name` of the hidden form cookie input
pub const FORM_COOKIE: &str = "form_cookie";
/// `name` of the bookmark checkbox
pub const BOOKMARK: &str = "bookmark";
/// `name` of the disable-smilies checkbox
pub const DISABLE_SMILIES: &str = "disablesmilies";
/// `name` of the (optional) signature checkbox
pub const SIGNATURE: &str = "signature";

const PREVIEW_BODY: &str = ".postbody";
const ERROR_BANNER: &str = ".standarderror";

/// Parse a raw posting page and extract its tokens
pub fn parse_form(html: &str) -> Result<FormTokens, ParseError> {
    let doc = Html::parse_document(html);
    extract_tokens(&doc)
}

/// Extract anti-forgery tokens and checkbox state from a posting form
///
/// Fails if either token is missing or empty, or if the bookmark or
/// disable-smilies checkbox is absent. A missing signature checkbox means
/// "unchecked"; some forum configurations leave it out.
pub fn extract_tokens(doc: &Html) -> Result<FormTokens, ParseError> {
    let form_key = token_value(doc, FORM_KEY)?;
    let form_cookie = token_value(doc, FORM_COOKIE)?;

    let bookmark_checked = required_checkbox(doc, BOOKMARK)?;
    let disable_smilies_checked = required_checkbox(doc, DISABLE_SMILIES)?;
    let signature_checked = first_named(doc, SIGNATURE)?
        .map(is_checked)
        .unwrap_or(false);

    Ok(FormTokens {
        form_key,
        form_cookie,
        bookmark_checked,
        signature_checked,
        disable_smilies_checked,
    })
}

/// Inner HTML of the rendered post in a preview response
pub fn extract_preview(html: &str) -> Result<String, ParseError> {
    let doc = Html::parse_document(html);
    let selector = compile(PREVIEW_BODY)?;
    doc.select(&selector)
        .next()
        .map(|el| el.inner_html().trim().to_string())
        .ok_or(ParseError::MissingPreview)
}

/// Text of the forum's error banner, if the page is an error page
///
/// The forum answers a rejected post (flood control, expired form, ...) with
/// a normal 200 page carrying this banner.
pub fn extract_error_banner(html: &str) -> Result<Option<String>, ParseError> {
    let doc = Html::parse_document(html);
    let selector = compile(ERROR_BANNER)?;
    Ok(doc.select(&selector).next().map(|el| {
        el.text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }))
}

fn token_value(doc: &Html, name: &str) -> Result<String, ParseError> {
    let missing = || ParseError::MissingToken {
        name: name.to_string(),
    };
    let element = first_named(doc, name)?.ok_or_else(missing)?;
    match element.value().attr("value") {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(missing()),
    }
}

fn required_checkbox(doc: &Html, name: &str) -> Result<bool, ParseError> {
    first_named(doc, name)?
        .map(is_checked)
        .ok_or_else(|| ParseError::MissingOption {
            name: name.to_string(),
        })
}

fn first_named<'a>(doc: &'a Html, name: &str) -> Result<Option<ElementRef<'a>>, ParseError> {
    let selector = compile(&format!(r#"[name="{}"]"#, name))?;
    Ok(doc.select(&selector).next())
}

fn is_checked(element: ElementRef<'_>) -> bool {
    element.value().attr("checked").is_some()
}

fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
