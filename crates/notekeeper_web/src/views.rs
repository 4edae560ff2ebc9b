//! Server-rendered HTML pages.
//!
//! # Responsibility
//! - Render embedded Tera templates into responses.
//!
//! # Invariants
//! - Templates are compiled into the binary; no filesystem access at runtime.
//! - Every template is registered under an `.html` name, so Tera autoescapes
//!   all interpolated values.
//! - Form templates receive an entry for every field, empty when valid.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use log::error;
use notekeeper_core::Note;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;
use tera::{Context, Tera};

const TPL_MACROS: &str = include_str!("templates/macros.html");
const TPL_BASE: &str = include_str!("templates/base.html");
const TPL_HOME: &str = include_str!("templates/home.html");
const TPL_NOTE_LIST: &str = include_str!("templates/note_list.html");
const TPL_NOTE_DETAIL: &str = include_str!("templates/note_detail.html");
const TPL_NOTE_FORM: &str = include_str!("templates/note_form.html");
const TPL_NOTE_DELETE: &str = include_str!("templates/note_delete.html");
const TPL_DONE: &str = include_str!("templates/done.html");
const TPL_LOGIN: &str = include_str!("templates/login.html");
const TPL_SIGNUP: &str = include_str!("templates/signup.html");
const TPL_LOGGED_OUT: &str = include_str!("templates/logged_out.html");
const TPL_ERROR: &str = include_str!("templates/error.html");

const NOTE_FIELDS: [&str; 3] = ["title", "text", "slug"];
const SIGNUP_FIELDS: [&str; 3] = ["username", "password1", "password2"];

static TEMPLATES: Lazy<Tera> =
    Lazy::new(|| build_templates().expect("embedded templates are valid Tera"));

/// Messages attached to named form fields.
pub type FormErrors = [(&'static str, String)];

/// Values echoed back into the note form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoteFormValues {
    pub title: String,
    pub text: String,
    pub slug: String,
}

impl From<&Note> for NoteFormValues {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            text: note.text.clone(),
            slug: note.slug.clone(),
        }
    }
}

fn build_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("macros.html", TPL_MACROS),
        ("base.html", TPL_BASE),
        ("home.html", TPL_HOME),
        ("note_list.html", TPL_NOTE_LIST),
        ("note_detail.html", TPL_NOTE_DETAIL),
        ("note_form.html", TPL_NOTE_FORM),
        ("note_delete.html", TPL_NOTE_DELETE),
        ("done.html", TPL_DONE),
        ("login.html", TPL_LOGIN),
        ("signup.html", TPL_SIGNUP),
        ("logged_out.html", TPL_LOGGED_OUT),
        ("error.html", TPL_ERROR),
    ])?;
    Ok(tera)
}

fn render(name: &str, context: &Context) -> Response {
    match TEMPLATES.render(name, context) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!("event=template_render module=web status=error template={name} error={err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

fn page_context(authenticated: bool) -> Context {
    let mut context = Context::new();
    context.insert("authenticated", &authenticated);
    context
}

/// Groups `errors` by field, with an entry for each of `fields`.
fn errors_by_field(fields: &[&'static str], errors: &FormErrors) -> BTreeMap<&'static str, Vec<String>> {
    let mut grouped: BTreeMap<&'static str, Vec<String>> =
        fields.iter().map(|field| (*field, Vec::new())).collect();
    for (field, message) in errors {
        grouped.entry(*field).or_default().push(message.clone());
    }
    grouped
}

pub fn home(authenticated: bool) -> Response {
    render("home.html", &page_context(authenticated))
}

pub fn note_list(notes: &[Note]) -> Response {
    let mut context = page_context(true);
    context.insert("notes", notes);
    render("note_list.html", &context)
}

pub fn note_detail(note: &Note) -> Response {
    let mut context = page_context(true);
    context.insert("note", note);
    render("note_detail.html", &context)
}

fn note_form_context(editing: Option<&str>, values: &NoteFormValues, errors: &FormErrors) -> Context {
    let mut context = page_context(true);
    context.insert("editing", &editing);
    context.insert("values", values);
    context.insert("errors", &errors_by_field(&NOTE_FIELDS, errors));
    context
}

/// Create form when `editing` is `None`, edit form for that slug otherwise.
pub fn note_form(editing: Option<&str>, values: &NoteFormValues, errors: &FormErrors) -> Response {
    render("note_form.html", &note_form_context(editing, values, errors))
}

pub fn delete_confirm(note: &Note) -> Response {
    let mut context = page_context(true);
    context.insert("note", note);
    render("note_delete.html", &context)
}

pub fn done() -> Response {
    render("done.html", &page_context(true))
}

pub fn login_form(next: Option<&str>, username: &str, error: Option<&str>) -> Response {
    let mut context = page_context(false);
    context.insert("next", &next);
    context.insert("username", username);
    context.insert("error", &error);
    render("login.html", &context)
}

pub fn signup_form(username: &str, errors: &FormErrors) -> Response {
    let mut context = page_context(false);
    context.insert("username", username);
    context.insert("errors", &errors_by_field(&SIGNUP_FIELDS, errors));
    render("signup.html", &context)
}

pub fn logged_out() -> Response {
    render("logged_out.html", &page_context(false))
}

fn error_page(status: StatusCode, heading: &str) -> Response {
    let mut context = page_context(false);
    context.insert("heading", heading);
    (status, render("error.html", &context)).into_response()
}

pub fn not_found() -> Response {
    error_page(StatusCode::NOT_FOUND, "Not found")
}

pub fn server_error() -> Response {
    error_page(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
}
