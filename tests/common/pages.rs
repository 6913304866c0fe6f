use form_autofill::config::{DetectionConfig, EngineConfig, FillConfig};
use form_autofill::dom::{Document, NodeId};
use serde_json::{Value, json};

/// Build a page whose body holds `children` (snapshot JSON nodes).
pub fn page(children: Value) -> Document {
    Document::from_value(json!({ "body": { "tag": "body", "children": children } }))
        .expect("valid page snapshot")
}

pub fn by_id(doc: &Document, id: &str) -> NodeId {
    doc.get_element_by_id(id)
        .unwrap_or_else(|| panic!("no element with id {}", id))
}

pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Value {
    json!({ "x": x, "y": y, "width": width, "height": height })
}

pub fn text(t: &str) -> Value {
    json!({ "text": t })
}

pub fn detection_config() -> DetectionConfig {
    DetectionConfig::default()
}

/// Engine config with real-looking delays; tests pair it with a virtual clock.
pub fn engine_config() -> EngineConfig {
    EngineConfig::default()
}

pub fn fill_config(retry_budget: u32) -> FillConfig {
    FillConfig {
        retry_budget,
        ..FillConfig::default()
    }
}

/// A signup form touching most native control kinds.
pub fn signup_form() -> Value {
    json!([
        { "tag": "form", "attrs": { "id": "signup" }, "children": [
            { "tag": "label", "attrs": { "for": "email" }, "children": [{ "text": "Email Address:" }] },
            { "tag": "input", "attrs": { "type": "email", "id": "email", "name": "email", "required": "" } },
            { "tag": "label", "attrs": { "for": "country" }, "children": [{ "text": "Country" }] },
            { "tag": "select", "attrs": { "id": "country", "name": "country" }, "children": [
                { "tag": "option", "attrs": { "value": "" }, "children": [{ "text": "Select a country" }] },
                { "tag": "option", "attrs": { "value": "US" }, "children": [{ "text": "United States" }] },
                { "tag": "option", "attrs": { "value": "CA" }, "children": [{ "text": "Canada" }] },
                { "tag": "option", "attrs": { "value": "FR" }, "children": [{ "text": "France" }] }
            ]},
            { "tag": "label", "children": [
                { "tag": "input", "attrs": { "type": "checkbox", "name": "topics", "value": "A" } },
                { "text": "Alpha" }
            ]},
            { "tag": "label", "children": [
                { "tag": "input", "attrs": { "type": "checkbox", "name": "topics", "value": "B" } },
                { "text": "Beta" }
            ]},
            { "tag": "label", "children": [
                { "tag": "input", "attrs": { "type": "checkbox", "name": "topics", "value": "C" } },
                { "text": "Gamma" }
            ]},
            { "tag": "label", "children": [
                { "tag": "input", "attrs": { "type": "radio", "name": "plan", "value": "free", "id": "plan-free" } },
                { "text": "Free" }
            ]},
            { "tag": "label", "children": [
                { "tag": "input", "attrs": { "type": "radio", "name": "plan", "value": "pro", "id": "plan-pro" } },
                { "text": "Pro" }
            ]},
            { "tag": "label", "attrs": { "for": "resume" }, "children": [{ "text": "Resume" }] },
            { "tag": "input", "attrs": { "type": "file", "id": "resume", "name": "resume" } },
            { "tag": "input", "attrs": { "type": "hidden", "name": "csrf", "value": "x" } },
            { "tag": "input", "attrs": { "type": "submit", "value": "Sign up" } }
        ]}
    ])
}
