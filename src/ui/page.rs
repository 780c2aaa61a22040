use std::fmt::Write;

use crate::languages;
use crate::session::HistoryEntry;

pub const TITLE: &str = "LCEL Translation Application";
pub const SUBTITLE: &str = "Convert your text to the selected language using the Gemma model";

const STYLE: &str = r#"
body { background-color: #f4f4f4; color: #333; font-family: sans-serif; }
.app { max-width: 800px; margin: auto; padding: 2rem; background-color: #ffffff;
       border-radius: 10px; box-shadow: 0 4px 8px rgba(0, 0, 0, 0.1); }
textarea, select { width: 100%; border: 2px solid #007bff; border-radius: 10px;
                   padding: 15px; font-size: 18px; box-sizing: border-box; }
button { background-color: #007bff; color: #fff; border: none; border-radius: 10px;
         padding: 10px 20px; font-size: 18px; margin-top: 10px; width: 100%; cursor: pointer; }
button:hover { background-color: #0056b3; }
.response-box { margin-top: 20px; padding: 20px; background-color: #f1f1f1; border-radius: 10px;
                box-shadow: 0 4px 8px rgba(0, 0, 0, 0.1); font-size: 18px; }
.error { color: #a94442; background: #f2dede; padding: 10px; border-radius: 10px; margin-top: 10px; }
.success { color: #3c763d; background: #dff0d8; padding: 10px; border-radius: 10px; margin-top: 10px; }
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Everything one render of the page needs.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub selected_language: &'a str,
    pub input_text: &'a str,
    pub translation: Option<&'a str>,
    /// Bumped per translation so the browser does not replay a cached clip.
    pub audio_version: usize,
    pub notices: Vec<Notice>,
    pub history: &'a [HistoryEntry],
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n<div class=\"app\">\n\
         <h1>&#127760; {title}</h1>\n<h3>{subtitle}</h3>\n",
        title = TITLE,
        style = STYLE,
        subtitle = SUBTITLE,
    );

    html.push_str("<form method=\"post\" action=\"/translate\">\n");
    html.push_str("<label for=\"language\">Select the language</label>\n");
    html.push_str("<select id=\"language\" name=\"language\">\n");
    for label in languages::labels() {
        let selected = if label == view.selected_language { " selected" } else { "" };
        let _ = writeln!(html, "<option value=\"{0}\"{1}>{0}</option>", label, selected);
    }
    html.push_str("</select>\n");
    let _ = write!(
        html,
        "<label for=\"text\">Enter the text you want to translate</label>\n\
         <textarea id=\"text\" name=\"text\" rows=\"6\">{}</textarea>\n\
         <button type=\"submit\">Translate</button>\n</form>\n",
        escape_html(view.input_text)
    );

    for notice in &view.notices {
        let class = match notice.kind {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        };
        let _ = writeln!(
            html,
            "<div class=\"{}\">{}</div>",
            class,
            escape_html(&notice.message)
        );
    }

    if let Some(translation) = view.translation {
        let _ = write!(
            html,
            "<div class=\"response-box\"><strong>Translation:</strong> {}</div>\n\
             <form method=\"post\" action=\"/copy\"><button type=\"submit\">Copy to Clipboard</button></form>\n\
             <audio controls preload=\"none\" src=\"/audio?v={}\"></audio>\n",
            escape_html(translation),
            view.audio_version
        );
    }

    if !view.history.is_empty() {
        html.push_str("<h3>Translation History</h3>\n");
        for entry in view.history {
            let _ = write!(
                html,
                "<p><strong>Original:</strong> {}</p>\n<p><strong>Translated:</strong> {}</p>\n<hr>\n",
                escape_html(&entry.original),
                escape_html(&entry.translated)
            );
        }
        html.push_str(
            "<form method=\"post\" action=\"/session/end\"><button type=\"submit\">End session</button></form>\n",
        );
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}
