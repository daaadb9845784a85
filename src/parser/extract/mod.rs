pub mod ambulance;
pub mod benefits;
pub mod excess;
pub mod general;
pub mod hospital;
pub mod providers;
pub mod waiting;

use crate::xml::Element;

pub const NOT_FOUND: &str = "Not found";
pub const DASH: &str = "-";
pub const NO_EXCESS: &str = "No excess.";
pub const NO_WAITING_PERIOD: &str = "No waiting period found.";
pub const CANNOT_FIND_WAIT: &str = "Cannot find wait.";
pub const NO_COPAYMENT: &str = "No copayment.";
pub const NO_BENEFITS: &str = "No benefits found.";
pub const NO_FEE: &str = "No fee";
pub const NO_PROVIDER_ARRANGEMENTS: &str = "No provider arrangements found.";
pub const NO_AMBULANCE_INFO: &str = "No ambulance information found.";
pub const AMBULANCE_NOT_FOUND: &str = "Not found.";
pub const CANNOT_FIND_AMBULANCE: &str = "Cant find ambulance info.";
pub const NO_RESTRICTIONS: &str = "No restrictions";
pub const NO_CORPORATE: &str = "No corporate information found.";
pub const NO_YOUTH_DISCOUNT: &str = "Cannot find information on youth discount.";
pub const NO_ACCIDENT_COVER: &str = "No accident cover.";
pub const NO_TRAVEL_BENEFIT: &str = "No travel and accommodation benefits.";
pub const UNKNOWN_POLICY_TYPE: &str = "Can't find policy type.";

/// Trimmed text of the first descendant named `tag`.
pub fn first_text(el: &Element, tag: &str) -> Option<String> {
    el.find(tag).map(|e| e.text().trim().to_string())
}

/// Trimmed text of the first descendant named `tag`, or `sentinel` when absent.
pub fn text_or(el: &Element, tag: &str, sentinel: &str) -> String {
    first_text(el, tag).unwrap_or_else(|| sentinel.to_string())
}

/// Trimmed text of the first `tag`, with an empty string when absent.
pub fn text_or_empty(el: &Element, tag: &str) -> String {
    text_or(el, tag, "")
}

/// Trimmed attribute of the first descendant named `tag`, or `sentinel`.
pub fn attr_or(el: &Element, tag: &str, attr: &str, sentinel: &str) -> String {
    el.find(tag)
        .and_then(|e| e.attr(attr))
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| sentinel.to_string())
}

/// Trimmed attribute on `el` itself.
pub fn own_attr(el: &Element, attr: &str) -> Option<String> {
    el.attr(attr).map(|v| v.trim().to_string())
}

/// Policy type from the name of the file a product came from.
pub fn policy_type_from_source(source_name: &str) -> String {
    ["Hospital", "General", "Combined"]
        .iter()
        .find(|kind| source_name.contains(*kind))
        .map(|kind| kind.to_string())
        .unwrap_or_else(|| UNKNOWN_POLICY_TYPE.to_string())
}

/// State-keyed lookup shared by the provider and ambulance fallbacks. First match wins.
pub fn lookup_state<'a>(entries: &'a [(String, String)], state: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|(s, _)| s == state)
        .map(|(_, text)| text.as_str())
}
