//! Form descriptors and the name/value list a submit sends.

use url::form_urlencoded;
use url::Url;

/// HTTP method a form submits with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Kind of a form control, as far as the dump flow cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// `<input type="text">` (and inputs with a missing or unknown type).
    Text,
    Password,
    Hidden,
    Checkbox,
    Radio,
    /// `<input type="submit">` or a `<button>` of type submit.
    Submit,
    /// `<input type="image">`; submits `name.x`/`name.y`.
    Image,
    /// `<button type="button">` or `<input type="button">`.
    Button,
    Reset,
    File,
    TextArea,
    Select,
    /// Other HTML5 input types (email, number, date, ...).
    Other(String),
}

impl FieldKind {
    /// Maps the `type` attribute of an `<input>`.
    pub(crate) fn from_input_type(ty: Option<&str>) -> Self {
        let ty = ty.map(|t| t.trim().to_ascii_lowercase()).unwrap_or_default();
        match ty.as_str() {
            "password" => FieldKind::Password,
            "hidden" => FieldKind::Hidden,
            "checkbox" => FieldKind::Checkbox,
            "radio" => FieldKind::Radio,
            "submit" => FieldKind::Submit,
            "image" => FieldKind::Image,
            "button" => FieldKind::Button,
            "reset" => FieldKind::Reset,
            "file" => FieldKind::File,
            "email" | "search" | "tel" | "url" | "number" | "range" | "date"
            | "datetime-local" | "month" | "week" | "time" | "color" => FieldKind::Other(ty),
            _ => FieldKind::Text,
        }
    }

    /// Maps the `type` attribute of a `<button>` (default submit).
    pub(crate) fn from_button_type(ty: Option<&str>) -> Self {
        match ty.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("button") => FieldKind::Button,
            Some("reset") => FieldKind::Reset,
            _ => FieldKind::Submit,
        }
    }

    /// True for controls that can activate a submission.
    pub fn is_submit(&self) -> bool {
        matches!(self, FieldKind::Submit | FieldKind::Image)
    }
}

/// One `<option>` of a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A named control inside a form.
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) value: String,
    pub(crate) checked: bool,
    pub(crate) disabled: bool,
    pub(crate) multiple: bool,
    pub(crate) options: Vec<SelectOption>,
}

impl Field {
    pub(crate) fn new(name: String, kind: FieldKind, value: String) -> Self {
        Field {
            name,
            kind,
            value,
            checked: false,
            disabled: false,
            multiple: false,
            options: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Options of a select, in document order. Empty for other kinds.
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    /// Values of the currently selected options.
    pub fn selected_values(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.as_str())
            .collect()
    }

    /// Sets the value of a text-like control.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    /// Selects the option whose value is `value`.
    ///
    /// On a single select every other option is deselected. Returns false (and
    /// leaves the selection unchanged) when no option has that value.
    pub fn select(&mut self, value: &str) -> bool {
        if !self.options.iter().any(|o| o.value == value) {
            return false;
        }
        let multiple = self.multiple;
        for o in &mut self.options {
            if o.value == value {
                o.selected = true;
            } else if !multiple {
                o.selected = false;
            }
        }
        true
    }
}

/// A form located on a page: where it submits to and its controls in document order.
#[derive(Debug, Clone)]
pub struct Form {
    pub(crate) id: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) method: Method,
    pub(crate) action: Url,
    pub(crate) fields: Vec<Field>,
}

impl Form {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Absolute URL the form submits to.
    pub fn action(&self) -> &Url {
        &self.action
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// First control named `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// First submit-capable control named `name`.
    pub fn submit_control(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name && f.kind.is_submit())
    }

    /// Builds the submission sent when the submit control `submitter` is activated.
    ///
    /// Follows the HTML entry-list rules: disabled and unnamed controls are
    /// skipped, checkboxes and radios only when checked, selects contribute
    /// their selected options, and only the activating submit control is
    /// included.
    pub fn submission(&self, submitter: Option<&str>) -> FormSubmission {
        let mut fields = Vec::new();
        let mut submitter_used = false;

        for f in &self.fields {
            if f.disabled || f.name.is_empty() {
                continue;
            }
            match &f.kind {
                FieldKind::Text
                | FieldKind::Password
                | FieldKind::Hidden
                | FieldKind::TextArea
                | FieldKind::Other(_) => fields.push((f.name.clone(), f.value.clone())),
                FieldKind::Checkbox | FieldKind::Radio => {
                    if f.checked {
                        let v = if f.value.is_empty() { "on" } else { f.value.as_str() };
                        fields.push((f.name.clone(), v.to_string()));
                    }
                }
                FieldKind::Select => {
                    for o in f.options.iter().filter(|o| o.selected) {
                        fields.push((f.name.clone(), o.value.clone()));
                    }
                }
                FieldKind::Submit => {
                    if !submitter_used && submitter == Some(f.name.as_str()) {
                        fields.push((f.name.clone(), f.value.clone()));
                        submitter_used = true;
                    }
                }
                FieldKind::Image => {
                    if !submitter_used && submitter == Some(f.name.as_str()) {
                        fields.push((format!("{}.x", f.name), "0".to_string()));
                        fields.push((format!("{}.y", f.name), "0".to_string()));
                        submitter_used = true;
                    }
                }
                FieldKind::Button | FieldKind::Reset | FieldKind::File => {}
            }
        }

        FormSubmission {
            method: self.method,
            action: self.action.clone(),
            fields,
        }
    }
}

/// What a browser sends when a form is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub method: Method,
    pub action: Url,
    pub fields: Vec<(String, String)>,
}

impl FormSubmission {
    /// `application/x-www-form-urlencoded` body of the entry list.
    pub fn encoded(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }

    /// URL to request: the action for POST, the action with its query replaced for GET.
    pub fn target_url(&self) -> Url {
        match self.method {
            Method::Post => self.action.clone(),
            Method::Get => {
                let mut url = self.action.clone();
                url.set_fragment(None);
                url.set_query(Some(&self.encoded()));
                url
            }
        }
    }

    /// Value sent for `name`, if any.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
