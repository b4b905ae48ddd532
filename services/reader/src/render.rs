//! services/reader/src/render.rs
//!
//! Plain-text rendering of the mounted screen for the terminal.

use std::fmt::Write;

use crate::screens::typography::{self, FontFamily};
use crate::screens::{DashboardScreen, DocumentScreen, DocumentView};
use crate::shell::{Screen, Shell};

const RULE: &str = "----------------------------------------";

/// Renders the shell: route, screen, then any shell notice.
pub fn render_shell(shell: &Shell) -> String {
    let mut out = format!("[{}]\n", shell.route());
    out.push_str(&render(shell.screen()));
    if let Some(notice) = shell.notice() {
        out.push('\n');
        out.push_str(notice);
        out.push('\n');
    }
    out
}

pub fn render(screen: &Screen) -> String {
    match screen {
        Screen::Loading => "Loading...\n".to_string(),
        Screen::Home => home(),
        Screen::Login(login) => form(
            "Sign in",
            "login <email> <password>",
            login.error.as_deref(),
            login.success.as_deref(),
        ),
        Screen::Register(register) => form(
            "Create an account",
            "register <name> <email> <password>",
            register.error.as_deref(),
            register.success.as_deref(),
        ),
        Screen::Dashboard(dashboard) => render_dashboard(dashboard),
        Screen::Document(document) => render_document(document),
    }
}

fn home() -> String {
    "Clearread Converter\n\
     Make any text easier to read.\n\n\
     Sign in:      go /login\n\
     Get started:  go /register\n"
        .to_string()
}

fn form(title: &str, usage: &str, error: Option<&str>, success: Option<&str>) -> String {
    let mut out = format!("{}\n{}\n  {}\n", title, RULE, usage);
    if let Some(error) = error {
        let _ = writeln!(out, "Error: {}", error);
    }
    if let Some(success) = success {
        let _ = writeln!(out, "{}", success);
    }
    out
}

pub fn render_dashboard(dashboard: &DashboardScreen) -> String {
    let name = dashboard.display_name.as_deref().unwrap_or("Loading...");
    let mut out = format!("Welcome, {}!\nThis is your dashboard.\n{}\n", name, RULE);
    out.push_str("Your Documents\n");
    if let Some(error) = &dashboard.error {
        let _ = writeln!(out, "Error: {}", error);
    }
    if dashboard.documents.is_empty() {
        out.push_str("No documents yet. Type 'new' to create one.\n");
    }
    for card in &dashboard.documents {
        let _ = writeln!(out, "\n* {}  (open {})", card.title, card.id);
        let _ = writeln!(out, "  Created: {}", card.created);
        let _ = writeln!(out, "  {}", card.preview);
    }
    out
}

/// Renders the document screen. Anything but a loaded document shows only the
/// message, never a field of the record.
pub fn render_document(document: &DocumentScreen) -> String {
    match &document.view {
        DocumentView::Loaded => {}
        DocumentView::Unavailable(_) | DocumentView::Detached => {
            let message = document.error.as_deref().unwrap_or("Loading document...");
            return format!("{}\n", message);
        }
    }

    let mut out = String::new();
    if document.is_editing_name {
        let _ = writeln!(out, "Name: {} (editing)", document.name);
    } else {
        let _ = writeln!(out, "{}", document.name);
    }
    out.push_str(RULE);
    out.push('\n');
    if let Some(error) = &document.error {
        let _ = writeln!(out, "Error: {}", error);
    }

    out.push_str("Original Text\n");
    if document.original_text.is_empty() {
        out.push_str("  (empty) Enter your text with 'edit <text>'.\n");
    } else {
        for line in document.original_text.lines() {
            let _ = writeln!(out, "  {}", line);
        }
    }

    let t = &document.typography;
    let _ = writeln!(out, "\nConverted Text  [{}]", t.css());
    for paragraph in typography::paragraphs(&document.converted_text) {
        let _ = writeln!(out, "  {}\n", paragraph);
    }

    let fonts: Vec<&str> = FontFamily::ALL.iter().map(FontFamily::label).collect();
    let _ = writeln!(
        out,
        "Fonts: {} | size {}px | spacing {:.2}em | line height {:.1}",
        fonts.join(", "),
        t.font_size,
        t.letter_spacing,
        t.line_height
    );
    out
}
