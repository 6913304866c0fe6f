use crate::fill::fill_model::{FieldValue, ValueBag};

/// Find the value for a field name: exact key, then case-insensitive key,
/// then a case-insensitive substring match in either direction. Never
/// invents a value.
pub fn resolve_value<'a>(bag: &'a ValueBag, name: &str) -> Option<&'a FieldValue> {
    if let Some(value) = bag.get(name) {
        return Some(value);
    }

    let wanted = name.to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    if let Some((_, value)) = bag.iter().find(|(key, _)| key.to_lowercase() == wanted) {
        return Some(value);
    }

    bag.iter()
        .find(|(key, _)| {
            let key = key.to_lowercase();
            !key.is_empty() && (key.contains(&wanted) || wanted.contains(&key))
        })
        .map(|(_, value)| value)
}
