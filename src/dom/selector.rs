use crate::dom::document::{Document, NodeId};

/// Element predicate standing in for a CSS selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// `tag`
    Tag(&'static str),
    /// `input[type=t]`
    InputType(&'static str),
    /// `input:not([type])`
    UntypedInput,
    /// `[role=r]`
    Role(&'static str),
    /// `[attr]`
    HasAttr(&'static str),
    /// `[attr=value]`
    AttrEquals(&'static str, &'static str),
    /// `[class*=fragment]`, case-insensitive
    ClassContains(&'static str),
}

impl Selector {
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(tag) = doc.tag(node) else {
            return false;
        };

        match self {
            Selector::Tag(t) => tag == *t,
            Selector::InputType(t) => {
                tag == "input"
                    && doc
                        .attr(node, "type")
                        .is_some_and(|ty| ty.eq_ignore_ascii_case(t))
            }
            Selector::UntypedInput => tag == "input" && !doc.has_attr(node, "type"),
            Selector::Role(r) => doc.attr(node, "role") == Some(*r),
            Selector::HasAttr(a) => doc.has_attr(node, a),
            Selector::AttrEquals(a, v) => doc.attr(node, a) == Some(*v),
            Selector::ClassContains(fragment) => doc
                .class_name(node)
                .to_lowercase()
                .contains(&fragment.to_lowercase()),
        }
    }
}

pub fn matches_any(doc: &Document, node: NodeId, selectors: &[Selector]) -> bool {
    selectors.iter().any(|s| s.matches(doc, node))
}

// ============================================================================
// Vocabularies
// ============================================================================

/// Native form controls.
pub const NATIVE_SELECTORS: &[Selector] = &[
    Selector::UntypedInput,
    Selector::InputType("text"),
    Selector::InputType("email"),
    Selector::InputType("password"),
    Selector::InputType("tel"),
    Selector::InputType("url"),
    Selector::InputType("number"),
    Selector::InputType("search"),
    Selector::InputType("date"),
    Selector::InputType("time"),
    Selector::InputType("datetime-local"),
    Selector::InputType("datetime"),
    Selector::InputType("month"),
    Selector::InputType("week"),
    Selector::InputType("color"),
    Selector::InputType("range"),
    Selector::InputType("checkbox"),
    Selector::InputType("radio"),
    Selector::InputType("file"),
    Selector::Tag("select"),
    Selector::Tag("textarea"),
];

/// ARIA widgets and class-name patterns of custom controls.
pub const WIDGET_SELECTORS: &[Selector] = &[
    Selector::Role("textbox"),
    Selector::Role("searchbox"),
    Selector::Role("combobox"),
    Selector::Role("listbox"),
    Selector::Role("spinbutton"),
    Selector::Role("slider"),
    Selector::HasAttr("contenteditable"),
    Selector::AttrEquals("aria-haspopup", "listbox"),
    Selector::AttrEquals("aria-haspopup", "true"),
    Selector::ClassContains("dropdown"),
    Selector::ClassContains("select"),
    Selector::ClassContains("picker"),
    Selector::ClassContains("combobox"),
    Selector::ClassContains("upload"),
    Selector::ClassContains("dropzone"),
    Selector::HasAttr("data-field"),
];

/// Extra patterns emitted by component libraries and framework bindings.
pub const FRAMEWORK_PATTERNS: &[Selector] = &[
    Selector::ClassContains("MuiInput"),
    Selector::ClassContains("MuiSelect"),
    Selector::ClassContains("ant-input"),
    Selector::ClassContains("ant-select"),
    Selector::ClassContains("ant-picker"),
    Selector::ClassContains("chakra-input"),
    Selector::ClassContains("chakra-select"),
    Selector::ClassContains("el-input"),
    Selector::ClassContains("el-select"),
    Selector::ClassContains("mat-input"),
    Selector::ClassContains("mat-select"),
    Selector::ClassContains("v-select"),
    Selector::ClassContains("react-select"),
    Selector::HasAttr("formcontrolname"),
    Selector::HasAttr("ng-model"),
    Selector::HasAttr("v-model"),
    Selector::HasAttr("data-testid"),
];

/// Native controls plus custom widgets; the default per-form vocabulary.
pub fn form_vocabulary() -> Vec<Selector> {
    NATIVE_SELECTORS
        .iter()
        .chain(WIDGET_SELECTORS)
        .copied()
        .collect()
}

/// Widgets plus framework patterns; used by the whole-document pass.
pub fn framework_vocabulary() -> Vec<Selector> {
    WIDGET_SELECTORS
        .iter()
        .chain(FRAMEWORK_PATTERNS)
        .copied()
        .collect()
}

/// Whether a node looks like something a user could type into or pick from.
pub fn is_form_control_shaped(doc: &Document, node: NodeId) -> bool {
    matches_any(doc, node, NATIVE_SELECTORS) || matches_any(doc, node, WIDGET_SELECTORS)
}
