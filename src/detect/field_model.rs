use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

// ============================================================================
// Field classification
// ============================================================================

/// Closed classification of a field's data shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Password,
    Tel,
    Url,
    Number,
    Date,
    Time,
    Datetime,
    Color,
    Range,
    Checkbox,
    Radio,
    Select,
    Textarea,
    File,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Tel => "tel",
            FieldType::Url => "url",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Datetime => "datetime",
            FieldType::Color => "color",
            FieldType::Range => "range",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Select => "select",
            FieldType::Textarea => "textarea",
            FieldType::File => "file",
        }
    }

    /// Map a native `<input type>` onto the supported vocabulary.
    pub fn from_input_type(input_type: &str) -> Option<FieldType> {
        match input_type.to_lowercase().as_str() {
            "text" => Some(FieldType::Text),
            "email" => Some(FieldType::Email),
            "password" => Some(FieldType::Password),
            "tel" => Some(FieldType::Tel),
            "url" => Some(FieldType::Url),
            "number" => Some(FieldType::Number),
            "date" => Some(FieldType::Date),
            "time" => Some(FieldType::Time),
            "datetime" | "datetime-local" => Some(FieldType::Datetime),
            "color" => Some(FieldType::Color),
            "range" => Some(FieldType::Range),
            "checkbox" => Some(FieldType::Checkbox),
            "radio" => Some(FieldType::Radio),
            "file" => Some(FieldType::File),
            _ => None,
        }
    }

    /// Types written by assigning a string value.
    pub fn is_text_like(&self) -> bool {
        !matches!(
            self,
            FieldType::Checkbox | FieldType::Radio | FieldType::Select | FieldType::File
        )
    }

    /// Types whose controls form same-name groups.
    pub fn is_grouped(&self) -> bool {
        matches!(self, FieldType::Checkbox | FieldType::Radio)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Detection output
// ============================================================================

/// One semantically addressable fillable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub current_value: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub required: bool,
    /// Closed value set for choice fields, in page order.
    pub options: Vec<String>,
    /// Weak handle; re-validate before use.
    pub element: NodeId,
}

/// Fields found under one scanning scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedForm {
    /// The `<form>` element, or `None` for a synthetic container.
    pub element: Option<NodeId>,
    pub fields: Vec<FormField>,
    pub field_count: usize,
}

impl DetectedForm {
    pub fn new(element: Option<NodeId>, fields: Vec<FormField>) -> Self {
        let field_count = fields.len();
        Self {
            element,
            fields,
            field_count,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.element.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub success: bool,
    pub form_count: usize,
    pub forms: Vec<DetectedForm>,
}

impl ScanResult {
    /// Containers without fields are dropped.
    pub fn from_forms(forms: Vec<DetectedForm>) -> Self {
        let forms: Vec<DetectedForm> = forms.into_iter().filter(|f| f.field_count > 0).collect();
        Self {
            success: true,
            form_count: forms.len(),
            forms,
        }
    }

    pub fn empty() -> Self {
        Self::from_forms(vec![])
    }

    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.forms.iter().flat_map(|f| f.fields.iter())
    }

    pub fn field_count(&self) -> usize {
        self.forms.iter().map(|f| f.field_count).sum()
    }
}
