use tracing::debug;

use super::general::AMBULANCE;
use super::{
    lookup_state, text_or_empty, AMBULANCE_NOT_FOUND, CANNOT_FIND_AMBULANCE, NO_AMBULANCE_INFO,
};
use crate::models::{AmbulanceCover, FundRegistry, ServiceMap};
use crate::xml::Element;

/// Schema 3.0 ambulance columns, taken from `<productambulance>` or, when it
/// defers with `usefund="true"`, from the fund entry filtered by state.
pub fn extract_new(
    product: &Element,
    fund_code: &str,
    state: &str,
    registry: &FundRegistry,
) -> AmbulanceCover {
    let Some(el) = product.find("productambulance") else {
        return AmbulanceCover::uniform(NO_AMBULANCE_INFO);
    };
    if el.attr("usefund").map(str::trim) == Some("false") {
        return AmbulanceCover::uniform(el.text().trim());
    }

    let Some(fund) = registry.get(fund_code) else {
        debug!(fund_code, "ambulance defers to unknown fund");
        return AmbulanceCover::uniform(AMBULANCE_NOT_FOUND);
    };
    AmbulanceCover {
        emergency: fund.ambulance_emergency.clone(),
        call_out_fees: fund.ambulance_call_out_fees.clone(),
        other: lookup_state(&fund.ambulance_other, state)
            .unwrap_or(AMBULANCE_NOT_FOUND)
            .to_string(),
    }
}

/// Schema 2.0: fill the "Ambulance" slot of an already-built service map.
pub fn apply_old(product: &Element, services: &mut ServiceMap) {
    let Some(slot) = services.get_mut(AMBULANCE) else {
        return;
    };
    let Some(ambulance) = product.find("generalhealthambulance") else {
        slot.limits = CANNOT_FIND_AMBULANCE.to_string();
        return;
    };

    if !matches!(ambulance.attr("cover").map(str::trim), Some("Full") | Some("Part")) {
        return;
    }

    if let Some(wait) = ambulance.find("waitingperiod") {
        let unit = wait.attr("unit").unwrap_or_default().trim();
        slot.waiting_period = format!("{} {}", wait.text().trim(), unit);
    }
    slot.limits = product
        .find_all("benefitlimit")
        .into_iter()
        .rev()
        .find(|l| l.attr("title").map(str::trim) == Some(AMBULANCE))
        .map(|l| text_or_empty(l, "annuallimit"))
        .unwrap_or_default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fund, GeneralService};
    use crate::xml::parse;

    fn registry() -> FundRegistry {
        let mut reg = FundRegistry::default();
        reg.insert(Fund {
            code: "F1".into(),
            name: "Fund One".into(),
            preferred_provider_services: vec![],
            ambulance_emergency: "Wait: 0Day\nLimit: $Unlimited\n".into(),
            ambulance_call_out_fees: "Covered".into(),
            ambulance_other: vec![("VIC".into(), "text-A".into()), ("NSW".into(), "text-B".into())],
            restrictions: "No restrictions".into(),
        });
        reg
    }

    #[test]
    fn fund_fallback_filters_by_state() {
        let doc = parse(r#"<product><ProductAmbulance UseFund="true"/></product>"#).unwrap();
        let product = doc.find("product").unwrap();
        let reg = registry();

        let nsw = extract_new(product, "F1", "NSW", &reg);
        assert_eq!(nsw.other, "text-B");
        assert_eq!(nsw.call_out_fees, "Covered");
        assert_eq!(nsw.emergency, "Wait: 0Day\nLimit: $Unlimited\n");

        let qld = extract_new(product, "F1", "QLD", &reg);
        assert_eq!(qld.other, "Not found.");
    }

    #[test]
    fn product_text_used_for_all_fields() {
        let doc = parse(
            r#"<product><ProductAmbulance UseFund="false"> Full cover </ProductAmbulance></product>"#,
        )
        .unwrap();
        let amb = extract_new(doc.find("product").unwrap(), "F1", "NSW", &registry());
        assert_eq!(amb, AmbulanceCover::uniform("Full cover"));
    }

    #[test]
    fn missing_section_and_unknown_fund() {
        let reg = registry();
        let doc = parse("<product/>").unwrap();
        assert_eq!(
            extract_new(doc.find("product").unwrap(), "F1", "NSW", &reg),
            AmbulanceCover::uniform("No ambulance information found.")
        );
        let doc = parse(r#"<product><productambulance usefund="true"/></product>"#).unwrap();
        assert_eq!(
            extract_new(doc.find("product").unwrap(), "ZZZ", "NSW", &reg).other,
            "Not found."
        );
    }

    fn slot_map() -> ServiceMap {
        let mut map = ServiceMap::default();
        map.insert(GeneralService::dashed(AMBULANCE, "-"));
        map
    }

    #[test]
    fn old_schema_fills_slot() {
        let doc = parse(
            r#"<product>
                <GeneralHealthAmbulance Cover="Full"><WaitingPeriod Unit="Day">1</WaitingPeriod></GeneralHealthAmbulance>
                <BenefitLimit Title="Ambulance"><AnnualLimit> $5000 </AnnualLimit></BenefitLimit>
            </product>"#,
        )
        .unwrap();
        let mut map = slot_map();
        apply_old(doc.find("product").unwrap(), &mut map);
        let amb = map.get(AMBULANCE).unwrap();
        assert_eq!(amb.waiting_period, "1 Day");
        assert_eq!(amb.limits, "$5000");
        assert_eq!(amb.max_benefit, "-");
    }

    #[test]
    fn old_schema_missing_ambulance_marks_limits() {
        let doc = parse("<product/>").unwrap();
        let mut map = slot_map();
        apply_old(doc.find("product").unwrap(), &mut map);
        assert_eq!(map.get(AMBULANCE).unwrap().limits, "Cant find ambulance info.");
    }

    #[test]
    fn old_schema_no_cover_leaves_dashes() {
        let doc = parse(r#"<product><generalhealthambulance cover="None"/></product>"#).unwrap();
        let mut map = slot_map();
        apply_old(doc.find("product").unwrap(), &mut map);
        assert_eq!(map.get(AMBULANCE).unwrap(), &GeneralService::dashed(AMBULANCE, "-"));
    }
}
