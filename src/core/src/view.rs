//! # Rendering
//!
//! The view model is a pure function of the session state. The HTML
//! renderers turn it into markup for the browser component; controls carry
//! `data-option` and `data-action` attributes so a single delegated
//! listener on the host element can route events back to the session.

use std::fmt::Write;

use crate::options::{OptionKey, SketchOptions};
use crate::status::StatusGlyph;

#[derive(Debug, Clone, PartialEq)]
pub struct FileRow {
    pub name: String,
    pub glyph: Option<StatusGlyph>,
    pub progress: f64,
    pub download_enabled: bool,
    pub error: Option<String>,
    /// Only filled when the component is configured to show signatures.
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub options: SketchOptions,
    pub accept: String,
    pub rows: Vec<FileRow>,
    pub show_download_all: bool,
}

pub const FILES_REGION: &str = "files";
pub const ACTIONS_REGION: &str = "actions";

pub(crate) fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn number_input(out: &mut String, key: OptionKey, label: &str, value: u64) {
    let _ = write!(
        out,
        r#"<div class="col-md-3"><label for="{key}" class="form-label">{label}:</label><input type="number" min="0" id="{key}" class="form-control" data-option="{key}" value="{value}" /></div>"#,
    );
}

fn checkbox(out: &mut String, key: OptionKey, label: &str, checked: bool) {
    let _ = write!(
        out,
        r#"<div class="col-md-3"><div class="form-check mt-4"><input class="form-check-input" type="checkbox" id="{key}" data-option="{key}"{checked} /><label class="form-check-label" for="{key}">{label}</label></div></div>"#,
        checked = if checked { " checked" } else { "" },
    );
}

impl SessionView {
    /// Static part of the component: pickers, option controls and buttons,
    /// followed by the empty regions the dynamic parts are rendered into.
    pub fn render_form(&self) -> String {
        let opts = &self.options;
        let accept = escape(&self.accept);
        let mut out = String::new();

        out.push_str(r#"<div class="container snipe-sourmash-component py-5" style="max-width: 800px;">"#);
        out.push_str(r#"<h1 class="text-center mb-4">Snipe Sketching Dashboard</h1>"#);
        out.push_str(r#"<div class="card"><div class="card-body">"#);
        let _ = write!(
            out,
            r#"<div class="mb-3"><label for="file-input" class="form-label">Select Files:</label><input class="form-control" type="file" id="file-input" data-action="select" multiple accept="{accept}" /></div>"#,
        );
        out.push_str(r#"<div class="mb-3"><label for="folder-input" class="form-label">Select Folder:</label><input class="form-control" type="file" id="folder-input" data-action="select" webkitdirectory /></div>"#);

        out.push_str(r#"<div class="row mb-3">"#);
        number_input(&mut out, OptionKey::Ksize, "K-size", opts.ksize.into());
        number_input(&mut out, OptionKey::Scaled, "Scaled", opts.scaled);
        number_input(&mut out, OptionKey::Num, "Num", opts.num.into());
        number_input(&mut out, OptionKey::Seed, "Seed", opts.seed);
        out.push_str("</div>");

        out.push_str(r#"<div class="row mb-3">"#);
        checkbox(&mut out, OptionKey::TrackAbundance, "Track Abundance", opts.track_abundance);
        checkbox(&mut out, OptionKey::IsProtein, "Protein", opts.is_protein);
        checkbox(&mut out, OptionKey::Dayhoff, "Dayhoff", opts.dayhoff);
        checkbox(&mut out, OptionKey::Hp, "HP", opts.hp);
        out.push_str("</div><hr />");

        out.push_str(r#"<div class="d-flex justify-content-between mt-4">"#);
        out.push_str(r#"<button class="btn btn-primary" data-action="start">Start Sketching</button>"#);
        out.push_str(r#"<button class="btn btn-secondary ms-2" data-action="clear">Clear</button>"#);
        let _ = write!(out, r#"<div data-region="{ACTIONS_REGION}">"#);
        out.push_str(&self.render_actions());
        out.push_str("</div></div><hr />");

        let _ = write!(out, r#"<div data-region="{FILES_REGION}">"#);
        out.push_str(&self.render_files());
        out.push_str("</div></div></div></div>");
        out
    }

    /// Bulk download button, present once at least one signature exists.
    pub fn render_actions(&self) -> String {
        if self.show_download_all {
            r#"<button class="btn btn-success ms-2" data-action="download-all">Download All as Zip</button>"#.into()
        } else {
            String::new()
        }
    }

    pub fn render_files(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        let mut out = String::from(r#"<div><h2>Selected Files:</h2><ul class="list-group">"#);
        for row in &self.rows {
            let name = escape(&row.name);
            let glyph = row.glyph.map(|g| g.as_str()).unwrap_or("");
            let progress = row.progress;

            out.push_str(r#"<li class="list-group-item"><div class="row align-items-center">"#);
            let _ = write!(
                out,
                r#"<div class="col-md-3"><h6 class="mb-0">{name} {glyph}</h6></div>"#,
            );
            let _ = write!(
                out,
                r#"<div class="col-md-6"><div class="progress"><div class="progress-bar" role="progressbar" style="width: {progress}%;" aria-valuenow="{progress}" aria-valuemin="0" aria-valuemax="100"></div></div></div>"#,
            );
            let _ = write!(
                out,
                r#"<div class="col-md-3 text-end"><button class="btn btn-outline-primary btn-sm" data-action="download" data-filename="{name}"{disabled}>Download</button></div>"#,
                disabled = if row.download_enabled { "" } else { " disabled" },
            );
            out.push_str("</div>");

            if let Some(error) = &row.error {
                let _ = write!(
                    out,
                    r#"<div class="alert alert-danger mt-2" role="alert">{}</div>"#,
                    escape(error)
                );
            }
            if let Some(signature) = &row.signature {
                let _ = write!(
                    out,
                    "<details><summary>See signature</summary><pre>{}</pre></details>",
                    escape(signature)
                );
            }
            out.push_str("</li>");
        }
        out.push_str("</ul></div>");
        out
    }
}
