//! Fixed keyword lists and value dictionaries used by the heuristics.

/// Native `<input type>` values that never carry user data.
pub const NON_DATA_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];

/// Roles that mark a custom element as a data control.
pub const INTERACTIVE_ROLES: &[&str] = &[
    "textbox",
    "searchbox",
    "combobox",
    "listbox",
    "spinbutton",
    "slider",
];

/// Class fragments of elements that look clickable or editable.
pub const CLICKABLE_CLASS_HINTS: &[&str] = &[
    "clickable",
    "selectable",
    "trigger",
    "toggle",
    "control",
    "input",
    "select",
    "dropdown",
    "picker",
    "combobox",
];

/// Words that tie an element to data entry.
pub const FORM_KEYWORDS: &[&str] = &[
    "select", "choose", "pick", "dropdown", "option", "date", "calendar", "upload", "browse",
    "attach", "enter", "field", "search",
];

// Category keywords for generic widgets, checked in this order.
pub const DATE_KEYWORDS: &[&str] = &["date", "calendar", "birthday", "dob", "yyyy"];
pub const UPLOAD_KEYWORDS: &[&str] = &["upload", "file", "dropzone", "attach", "browse"];
pub const SELECT_KEYWORDS: &[&str] = &[
    "select", "dropdown", "combo", "choose", "picker", "option", "menu",
];

/// Leading words of option texts that are prompts rather than values.
pub const PLACEHOLDER_PREFIXES: &[&str] = &["select", "choose", "pick", "click", "tap", "--"];

pub const MAX_OPTION_LEN: usize = 50;

// ============================================================================
// Value dictionaries
// ============================================================================

pub const GENDER_KEYWORDS: &[&str] = &["gender", "sex"];
pub const GENDERS: &[&str] = &["Male", "Female", "Non-binary", "Prefer not to say"];

pub const COUNTRY_KEYWORDS: &[&str] = &["country", "nation"];
pub const COUNTRIES: &[&str] = &[
    "United States",
    "Canada",
    "United Kingdom",
    "Australia",
    "Germany",
    "France",
    "Spain",
    "Italy",
    "Netherlands",
    "Sweden",
    "Japan",
    "China",
    "India",
    "Brazil",
    "Mexico",
];

pub const US_STATE_KEYWORDS: &[&str] = &["state", "province", "region"];
pub const US_STATES: &[&str] = &[
    "Alabama",
    "Alaska",
    "Arizona",
    "Arkansas",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "Florida",
    "Georgia",
    "Hawaii",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Maryland",
    "Massachusetts",
    "Michigan",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Jersey",
    "New Mexico",
    "New York",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Oregon",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "Washington",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

pub const BRAND_KEYWORDS: &[&str] = &["brand", "manufacturer", "make"];
pub const BRANDS: &[&str] = &[
    "Apple", "Samsung", "Google", "Microsoft", "Sony", "Dell", "HP", "Lenovo", "LG", "Nike",
    "Adidas", "Toyota", "Honda", "Ford",
];

/// Dictionary whose keywords appear in `haystack` (already lower-cased),
/// checked gender, country, US state, brand.
pub fn dictionary_for(haystack: &str) -> Option<&'static [&'static str]> {
    let tables: [(&[&str], &'static [&'static str]); 4] = [
        (GENDER_KEYWORDS, GENDERS),
        (COUNTRY_KEYWORDS, COUNTRIES),
        (US_STATE_KEYWORDS, US_STATES),
        (BRAND_KEYWORDS, BRANDS),
    ];

    tables
        .iter()
        .find(|(keywords, _)| contains_any(haystack, keywords))
        .map(|(_, values)| *values)
}

pub fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

/// Option text that is a prompt ("Select one", "-- choose --") or too long
/// to be a value.
pub fn is_placeholder_option(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_OPTION_LEN {
        return true;
    }
    let lower = trimmed.to_lowercase();
    PLACEHOLDER_PREFIXES.iter().any(|p| lower.starts_with(p))
}
