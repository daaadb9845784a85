use super::{text_or_empty, waiting, NO_COPAYMENT, NO_WAITING_PERIOD};
use crate::models::HospitalService;
use crate::xml::Element;

pub fn extract(product: &Element) -> HospitalService {
    let Some(cover) = product.find("hospitalcover") else {
        return HospitalService::placeholder();
    };

    // Everything ahead of the medical services block reads as "<tag>: <text>".
    let mut covered: Vec<String> = cover
        .descendants()
        .take_while(|el| !el.contains("medicalservices"))
        .map(|el| format!("{}: {}", el.name, el.text().trim()))
        .collect();
    let mut not_covered = Vec::new();
    let mut limited_cover = Vec::new();

    for service in product.find_all("medicalservice") {
        let Some(title) = service.attr("title") else {
            continue;
        };
        match service.attr("cover") {
            Some("Covered") => covered.push(title.to_string()),
            Some("NotCovered") => not_covered.push(title.to_string()),
            Some("Restricted") => limited_cover.push(title.to_string()),
            _ => {}
        }
    }

    let waiting_periods = product
        .find("waitingperiods")
        .map(waiting::extract)
        .unwrap_or_else(|| NO_WAITING_PERIOD.to_string());

    let co_payment = match text_or_empty(product, "copayments") {
        c if c.is_empty() => NO_COPAYMENT.to_string(),
        c => c,
    };

    HospitalService {
        covered,
        not_covered,
        limited_cover,
        waiting_periods,
        other_features: text_or_empty(product, "otherproductfeatures"),
        co_payment,
    }
}
