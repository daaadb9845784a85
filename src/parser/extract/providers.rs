use super::{lookup_state, NO_PROVIDER_ARRANGEMENTS};
use crate::models::{Fund, SchemaVersion};
use crate::xml::Element;

/// Provider arrangements text. Schema 3.0 products may defer to the fund's
/// per-state list via `usefund="true"`; schema 2.0 text is always the product's own.
pub fn extract(
    product: &Element,
    state: &str,
    fund: Option<&Fund>,
    schema: SchemaVersion,
) -> String {
    match schema {
        SchemaVersion::V3 => {
            let Some(el) = product.find("productpreferredproviderservices") else {
                return NO_PROVIDER_ARRANGEMENTS.to_string();
            };
            if el.attr("usefund").map(str::trim) == Some("false") {
                return el.text().trim().to_string();
            }
            fund.and_then(|f| lookup_state(&f.preferred_provider_services, state))
                .map(str::to_string)
                .unwrap_or_else(|| NO_PROVIDER_ARRANGEMENTS.to_string())
        }
        SchemaVersion::V2 => product
            .find("preferredproviderservices")
            .map(|el| el.text().trim().to_string())
            .unwrap_or_else(|| NO_PROVIDER_ARRANGEMENTS.to_string()),
    }
}
