//! HTML rendering of a budget.
//!
//! The document is self-contained: the stylesheet, logo and any configured
//! fonts are inlined so the rendering engine never fetches anything.
//!
//! Markup is assembled through [`Markup`], which escapes every dynamic value.
//! Unescaped output is limited to `&'static str` fragments compiled into the
//! binary and to [`TrustedFragment`]s, which only this module can build.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Datelike, FixedOffset, Weekday};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::currency::format_usd;
use super::models::{BudgetRequest, ClientInfo};

const STYLESHEET: &str = include_str!("../../static/budget.css");
const LOGO_SVG: &str = include_str!("../../static/logo.svg");
const BRAND_NAME: &str = "evanthos";
const FONT_EXTENSIONS: [&str; 4] = ["woff2", "woff", "ttf", "otf"];
const UNDEFINED_DELIVERY_DATE: &str = "Por confirmar";

const TERMS: [&str; 6] = [
    "Validez: Esta cotización tiene una vigencia de 30 días calendario",
    "Condiciones de pago: 50% de anticipo para iniciar, 50% restante al finalizar",
    "Se incluyen 5 revisiones sin costo adicional",
    "Garantía: 30 días de soporte técnico gratuito posterior a la entrega",
    "El cliente debe proporcionar todo el contenido en formato digital",
    "Hosting y dominio no incluidos en el precio base",
];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read fonts directory {}: {source}", .path.display())]
    FontsDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read font file {}: {source}", .path.display())]
    FontFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Escape text for use in HTML element content and quoted attribute values.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    push_escaped(&mut escaped, value);
    escaped
}

fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Markup produced by this module from data it controls (base64 font data,
/// bundled CSS). Inserted without escaping.
#[derive(Debug, Clone, Default)]
pub struct TrustedFragment(String);

impl TrustedFragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// HTML writer that escapes by default.
struct Markup {
    buf: String,
}

impl Markup {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
        }
    }

    /// Static markup compiled into the binary.
    fn raw(&mut self, fragment: &'static str) {
        self.buf.push_str(fragment);
    }

    /// Untrusted text, escaped.
    fn text(&mut self, value: &str) {
        push_escaped(&mut self.buf, value);
    }

    fn trusted(&mut self, fragment: &TrustedFragment) {
        self.buf.push_str(&fragment.0);
    }

    fn into_string(self) -> String {
        self.buf
    }
}

/// A font file inlined as a data URI.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedFont {
    pub family: String,
    pub weight: u16,
    pub format: &'static str,
    pub mime: String,
    pub data_base64: String,
}

impl EmbeddedFont {
    /// Build from a file named `{Family}-{weight}.{ext}` (weight optional, defaults to 400).
    pub fn from_file(path: &Path) -> Result<Option<Self>, AssetError> {
        let Some(format) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(font_format)
        else {
            return Ok(None);
        };
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let (family, weight) = split_family_weight(stem);
        if family.is_empty() {
            return Ok(None);
        }

        let bytes = fs::read(path).map_err(|source| AssetError::FontFile {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Some(Self {
            family,
            weight,
            format,
            mime: mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            data_base64: BASE64.encode(bytes),
        }))
    }

    fn font_face_css(&self) -> String {
        format!(
            "@font-face {{\n    font-family: \"{}\";\n    src: url(\"data:{};base64,{}\") format(\"{}\");\n    font-weight: {};\n    font-style: normal;\n    font-display: swap;\n}}\n",
            self.family, self.mime, self.data_base64, self.format, self.weight
        )
    }
}

fn font_format(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "woff2" => Some("woff2"),
        "woff" => Some("woff"),
        "ttf" => Some("truetype"),
        "otf" => Some("opentype"),
        _ => None,
    }
}

fn split_family_weight(stem: &str) -> (String, u16) {
    let (family, weight) = match stem.rsplit_once('-') {
        Some((family, suffix)) => match suffix.parse::<u16>() {
            Ok(weight) if (100..=900).contains(&weight) => (family, weight),
            _ => (stem, 400),
        },
        None => (stem, 400),
    };

    let family = family
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string();

    (family, weight)
}

/// Static assets inlined into every document.
#[derive(Debug, Clone)]
pub struct TemplateAssets {
    stylesheet: TrustedFragment,
    font_faces: TrustedFragment,
    fonts: Vec<EmbeddedFont>,
}

impl TemplateAssets {
    /// Bundled stylesheet, no custom fonts.
    pub fn builtin() -> Self {
        Self {
            stylesheet: TrustedFragment(STYLESHEET.to_string()),
            font_faces: TrustedFragment::default(),
            fonts: Vec::new(),
        }
    }

    /// Bundled stylesheet plus every font file found in `dir`.
    ///
    /// A missing directory yields the builtin assets.
    pub fn with_fonts_dir(dir: &Path) -> Result<Self, AssetError> {
        if !dir.is_dir() {
            return Ok(Self::builtin());
        }

        let read_dir_error = |source| AssetError::FontsDir {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_dir_error)? {
            let path = entry.map_err(read_dir_error)?.path();
            let is_font = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if path.is_file() && is_font {
                paths.push(path);
            }
        }
        paths.sort();

        let mut fonts = Vec::with_capacity(paths.len());
        for path in &paths {
            if let Some(font) = EmbeddedFont::from_file(path)? {
                log::debug!(
                    "Embedding font {} (family \"{}\", weight {})",
                    path.display(),
                    font.family,
                    font.weight
                );
                fonts.push(font);
            }
        }

        Ok(Self::with_fonts(fonts))
    }

    /// Inline `fonts`. The first family becomes the display font; without
    /// fonts the stylesheet's system stack is used everywhere.
    pub fn with_fonts(fonts: Vec<EmbeddedFont>) -> Self {
        let mut css: String = fonts.iter().map(EmbeddedFont::font_face_css).collect();
        if let Some(display) = fonts.first() {
            css.push_str(&format!(
                ":root {{ --display-font: \"{}\", var(--body-font); }}\n",
                display.family
            ));
        }
        Self {
            stylesheet: TrustedFragment(STYLESHEET.to_string()),
            font_faces: TrustedFragment(css),
            fonts,
        }
    }

    pub fn fonts(&self) -> &[EmbeddedFont] {
        &self.fonts
    }
}

impl Default for TemplateAssets {
    fn default() -> Self {
        Self::builtin()
    }
}

const WEEKDAYS_ES: [&str; 7] = [
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado",
    "domingo",
];

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Long Spanish date, e.g. "viernes, 16 de octubre de 2026".
pub fn format_spanish_long_date(date: &DateTime<FixedOffset>) -> String {
    let weekday = WEEKDAYS_ES[weekday_index(date.weekday())];
    let month = MONTHS_ES[(date.month0() as usize).min(MONTHS_ES.len() - 1)];
    format!("{weekday}, {} de {month} de {}", date.day(), date.year())
}

fn weekday_index(weekday: Weekday) -> usize {
    weekday.num_days_from_monday() as usize
}

/// Renders the budget document.
#[derive(Debug, Clone, Default)]
pub struct BudgetTemplate {
    assets: TemplateAssets,
}

impl BudgetTemplate {
    pub fn new(assets: TemplateAssets) -> Self {
        Self { assets }
    }

    pub fn assets(&self) -> &TemplateAssets {
        &self.assets
    }

    /// Render `request` as a complete HTML document.
    ///
    /// Output depends only on the arguments, so a fixed `generated_at`
    /// gives byte-identical documents.
    pub fn render(
        &self,
        request: &BudgetRequest,
        budget_number: &str,
        generated_at: &DateTime<FixedOffset>,
    ) -> String {
        let mut doc = Markup::with_capacity(
            STYLESHEET.len() + self.assets.font_faces.as_str().len() + 8 * 1024,
        );

        self.write_head(&mut doc, &request.client_info);
        doc.raw("<body>\n");
        write_generated_banner(&mut doc, budget_number, generated_at);
        write_letterhead(&mut doc);
        write_client_info(&mut doc, &request.client_info);
        write_project_details(&mut doc, request);
        write_delivery(&mut doc, request);
        write_summary(&mut doc, request);
        write_terms(&mut doc);
        write_footer(&mut doc);
        doc.raw("</body>\n</html>\n");

        doc.into_string()
    }

    fn write_head(&self, doc: &mut Markup, client: &ClientInfo) {
        doc.raw("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"UTF-8\">\n");
        doc.raw("<title>Presupuesto Web - ");
        doc.text(&client.name);
        doc.raw("</title>\n<style>\n");
        doc.trusted(&self.assets.stylesheet);
        doc.trusted(&self.assets.font_faces);
        doc.raw("</style>\n</head>\n");
    }
}

fn write_generated_banner(doc: &mut Markup, budget_number: &str, generated_at: &DateTime<FixedOffset>) {
    doc.raw("<div class=\"date-generated\">Presupuesto N° ");
    doc.text(budget_number);
    doc.raw(" - Generado el: ");
    doc.text(&format_spanish_long_date(generated_at));
    doc.raw("</div>\n");
}

fn write_letterhead(doc: &mut Markup) {
    doc.raw("<div class=\"header\">\n<div class=\"logo\">");
    doc.raw(LOGO_SVG.trim_end());
    doc.raw("<span>");
    doc.raw(BRAND_NAME);
    doc.raw("</span></div>\n<h1>PRESUPUESTO WEB</h1>\n");
    doc.raw("<p>Propuesta personalizada para su proyecto digital</p>\n</div>\n");
}

fn write_client_info(doc: &mut Markup, client: &ClientInfo) {
    doc.raw("<div class=\"client-info\">\n<h2>Información del Cliente</h2>\n<div class=\"info-grid\">\n");

    doc.raw("<div class=\"info-item\"><strong>Nombre:</strong> ");
    doc.text(&client.name);
    doc.raw("</div>\n");

    doc.raw("<div class=\"info-item\"><strong>Email:</strong> ");
    doc.text(&client.email);
    doc.raw("</div>\n");

    if let Some(company) = &client.company {
        doc.raw("<div class=\"info-item company\"><strong>Empresa:</strong> ");
        doc.text(company);
        doc.raw("</div>\n");
    }
    doc.raw("</div>\n");

    if let Some(description) = &client.description {
        doc.raw("<div class=\"project-description\"><strong>Descripción del proyecto:</strong>\n<p>");
        doc.text(description);
        doc.raw("</p>\n</div>\n");
    }
    doc.raw("</div>\n");
}

fn write_project_details(doc: &mut Markup, request: &BudgetRequest) {
    let page = &request.page_type;

    doc.raw("<div class=\"project-details\">\n<h2>Detalles del Proyecto</h2>\n<div class=\"page-type\">\n<h3>");
    doc.text(&page.name);
    doc.raw("</h3>\n<p>");
    doc.text(&page.description);
    doc.raw("</p>\n<div class=\"features-grid\">\n");
    for feature in &page.features {
        doc.raw("<div class=\"feature-badge\">");
        doc.text(&feature.name);
        doc.raw("</div>\n");
    }
    doc.raw("</div>\n</div>\n");

    if !request.additional_features.is_empty() {
        doc.raw("<div class=\"additional-features\">\n<h3>Características Adicionales Seleccionadas</h3>\n");
        for feature in &request.additional_features {
            doc.raw("<div class=\"feature-item\">\n<div>\n<div class=\"name\">");
            doc.text(&feature.name);
            doc.raw("</div>\n");
            if !feature.description.trim().is_empty() {
                doc.raw("<div class=\"detail\">");
                doc.text(&feature.description);
                doc.raw("</div>\n");
            }
            doc.raw("</div>\n<div class=\"price\">+");
            doc.text(&format_usd(feature.price));
            doc.raw("</div>\n</div>\n");
        }
        doc.raw("</div>\n");
    }
    doc.raw("</div>\n");
}

fn write_delivery(doc: &mut Markup, request: &BudgetRequest) {
    doc.raw("<div class=\"timeline-info\">\n<h3>Información de Entrega</h3>\n");
    doc.raw("<p><strong>Modalidad:</strong> ");
    doc.text(request.timeline.label());
    doc.raw("</p>\n<p><strong>Tiempo estimado:</strong> ");
    doc.text(&request.estimated_days.to_string());
    doc.raw(" días hábiles</p>\n<p class=\"delivery-date\">Fecha estimada de entrega: ");
    doc.text(
        request
            .delivery_date
            .as_deref()
            .unwrap_or(UNDEFINED_DELIVERY_DATE),
    );
    doc.raw("</p>\n</div>\n");
}

fn write_summary(doc: &mut Markup, request: &BudgetRequest) {
    doc.raw("<div class=\"budget-summary\">\n<h2>Resumen del Presupuesto</h2>\n");

    doc.raw("<div class=\"budget-line\"><span class=\"label\">");
    doc.text(&request.page_type.name);
    doc.raw("</span><span class=\"amount\">");
    doc.text(&format_usd(request.page_type.base_price));
    doc.raw("</span></div>\n");

    for feature in &request.additional_features {
        doc.raw("<div class=\"budget-line\"><span class=\"label\">");
        doc.text(&feature.name);
        doc.raw("</span><span class=\"amount\">+");
        doc.text(&format_usd(feature.price));
        doc.raw("</span></div>\n");
    }

    doc.raw("<div class=\"budget-line total\"><span class=\"label\">TOTAL DE LA INVERSIÓN</span><span class=\"amount\">");
    doc.text(&format_usd(request.total_price));
    doc.raw("</span></div>\n</div>\n");
}

fn write_terms(doc: &mut Markup) {
    doc.raw("<div class=\"terms\">\n<h3>Términos y Condiciones</h3>\n<ul>\n");
    for term in TERMS {
        doc.raw("<li>");
        doc.raw(term);
        doc.raw("</li>\n");
    }
    doc.raw("</ul>\n</div>\n");
}

fn write_footer(doc: &mut Markup) {
    doc.raw("<div class=\"footer\">\n<p><strong>¡Gracias por confiar en nosotros para su proyecto digital!</strong></p>\n");
    doc.raw("<p>Para dudas o aclaraciones, no dude en contactarnos</p>\n</div>\n");
}
