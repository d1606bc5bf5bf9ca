//! HTML extraction: forms, their controls, and meta refresh.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::form::{Field, FieldKind, Form, Method, SelectOption};

/// A `<meta http-equiv="refresh">` directive that names a target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaRefresh {
    pub delay_secs: u64,
    pub url: Url,
}

/// The parts of an HTML document the session and the flow look at.
pub(crate) struct Document {
    pub forms: Vec<Form>,
    pub refresh: Option<MetaRefresh>,
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("built-in selector is valid")
}

impl Document {
    pub fn parse(body: &str, base: &Url) -> Self {
        let html = Html::parse_document(body);
        let base = document_base(&html, base);
        let forms = html
            .select(&selector("form"))
            .map(|el| parse_form(el, &base))
            .collect();
        let refresh = html
            .select(&selector("meta[http-equiv]"))
            .filter(|el| {
                el.value()
                    .attr("http-equiv")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
            })
            .find_map(|el| parse_refresh(el.value().attr("content")?, &base));
        Document { forms, refresh }
    }
}

/// `<base href>` overrides the response URL for relative links.
fn document_base(html: &Html, url: &Url) -> Url {
    html.select(&selector("base[href]"))
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| url.join(href.trim()).ok())
        .unwrap_or_else(|| url.clone())
}

fn parse_form(el: ElementRef<'_>, base: &Url) -> Form {
    let attrs = el.value();
    let method = match attrs.attr("method") {
        Some(m) if m.trim().eq_ignore_ascii_case("post") => Method::Post,
        _ => Method::Get,
    };
    let action = attrs
        .attr("action")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .and_then(|a| base.join(a).ok())
        .unwrap_or_else(|| base.clone());

    let fields = el
        .select(&selector("input, select, textarea, button"))
        .filter_map(parse_field)
        .collect();

    Form {
        id: attrs.attr("id").map(str::to_string),
        name: attrs.attr("name").map(str::to_string),
        method,
        action,
        fields,
    }
}

fn parse_field(el: ElementRef<'_>) -> Option<Field> {
    let attrs = el.value();
    let name = attrs.attr("name").unwrap_or("").to_string();
    let value = attrs.attr("value").unwrap_or("").to_string();

    let mut field = match attrs.name() {
        "input" => {
            let kind = FieldKind::from_input_type(attrs.attr("type"));
            let mut f = Field::new(name, kind, value);
            f.checked = attrs.attr("checked").is_some();
            f
        }
        "button" => Field::new(name, FieldKind::from_button_type(attrs.attr("type")), value),
        "textarea" => Field::new(name, FieldKind::TextArea, el.text().collect()),
        "select" => {
            let mut f = Field::new(name, FieldKind::Select, String::new());
            f.multiple = attrs.attr("multiple").is_some();
            f.options = parse_options(el, f.multiple);
            f
        }
        _ => return None,
    };
    field.disabled = attrs.attr("disabled").is_some();
    Some(field)
}

/// Options with the selectedness a browser would display.
///
/// A single select shows at most one selected option (the last marked one)
/// and falls back to its first option when none is marked.
fn parse_options(select: ElementRef<'_>, multiple: bool) -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = select
        .select(&selector("option"))
        .map(|o| {
            let label = collapse_whitespace(&o.text().collect::<String>());
            let value = o
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| label.clone());
            SelectOption {
                value,
                label,
                selected: o.value().attr("selected").is_some(),
            }
        })
        .collect();

    if !multiple {
        match options.iter().rposition(|o| o.selected) {
            Some(last) => {
                for (i, o) in options.iter_mut().enumerate() {
                    o.selected = i == last;
                }
            }
            None => {
                if let Some(first) = options.first_mut() {
                    first.selected = true;
                }
            }
        }
    }
    options
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses `content="N; url=target"`. Directives without a target are ignored.
fn parse_refresh(content: &str, base: &Url) -> Option<MetaRefresh> {
    let content = content.trim();
    let digits_end = content
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(content.len());
    let delay_secs = content[..digits_end].parse::<u64>().unwrap_or(0);

    // Skip any fractional part, then the separator.
    let rest = content[digits_end..].trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
    let rest = rest.trim_start().strip_prefix([';', ','])?.trim_start();

    let target = match rest.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("url") => {
            rest[3..].trim_start().strip_prefix('=')?.trim()
        }
        _ => rest,
    };
    let target = target.trim_matches(|c| c == '\'' || c == '"').trim();
    if target.is_empty() {
        return None;
    }
    let url = base.join(target).ok()?;
    Some(MetaRefresh { delay_secs, url })
}
