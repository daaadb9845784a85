use tracing::debug;

use super::{benefits, waiting, DASH, NO_FEE, NO_WAITING_PERIOD};
use crate::models::{GeneralService, SchemaVersion, ServiceMap};
use crate::xml::Element;

pub const AMBULANCE: &str = "Ambulance";

/// Two-phase build: every service entry first, then the shared limit groups
/// are written into the entries they name.
pub fn extract(product: &Element, schema: SchemaVersion) -> ServiceMap {
    let mut services = build_services(product, schema);
    apply_benefit_limits(product, &mut services);
    services
}

fn build_services(product: &Element, schema: SchemaVersion) -> ServiceMap {
    let mut services = ServiceMap::default();
    let elements = product.find_all("generalhealthservice");
    if elements.is_empty() {
        return services;
    }

    for el in elements {
        let Some(name) = el.attr("title").map(str::trim) else {
            debug!("general health service without title");
            continue;
        };
        let covered = el.attr("covered").map(str::trim).unwrap_or(DASH);
        if covered == "false" || covered == DASH {
            services.insert(GeneralService::dashed(name, covered));
            continue;
        }

        let waiting_period = el
            .find("waitingperiod")
            .map(waiting::single)
            .unwrap_or_else(|| NO_WAITING_PERIOD.to_string());
        services.insert(GeneralService {
            name: name.to_string(),
            covered: covered.to_string(),
            waiting_period,
            limits: String::new(),
            max_benefit: benefits::extract(el),
        });
    }

    // Old products always carry an ambulance slot, filled later by the
    // ambulance extractor.
    if schema == SchemaVersion::V2 {
        services.insert(GeneralService::dashed(AMBULANCE, DASH));
    }
    services
}

/// Overwrite `limits` on every service named by a `<benefitlimit>` group.
/// The "Ambulance" group is left to the schema 2.0 ambulance extractor.
pub fn apply_benefit_limits(product: &Element, services: &mut ServiceMap) {
    for group in product.find_all("benefitlimit") {
        if group.attr("title").map(str::trim) == Some(AMBULANCE) {
            continue;
        }

        let fee = group
            .descendants()
            .filter(|el| el.name.contains("limitper"))
            .last()
            .map(|el| el.text().trim().to_string())
            .unwrap_or_else(|| NO_FEE.to_string());

        for member in group.find_all("service") {
            let name = member.text();
            let name = name.trim();
            let Some(service) = services.get_mut(name) else {
                debug!(service = name, "benefit limit names an unknown service");
                continue;
            };
            service.limits = fee.clone();
            if member.attr("sublimitsapply").map(str::trim) == Some("true") {
                service.limits.push_str(" sublimits apply");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;

    const PRODUCT: &str = r#"<product>
        <GeneralHealthServices>
            <GeneralHealthService Title="Optical" Covered="true">
                <WaitingPeriod Unit="Month">6</WaitingPeriod>
                <Benefit Item="Frames" Type="Dollar">200</Benefit>
            </GeneralHealthService>
            <GeneralHealthService Title="Physio" Covered="true">
                <WaitingPeriod Unit="Month">2</WaitingPeriod>
            </GeneralHealthService>
            <GeneralHealthService Title="HearingAids" Covered="false"/>
        </GeneralHealthServices>
        <BenefitLimits>
            <BenefitLimit Title="Combined">
                <LimitPerPerson>$500</LimitPerPerson>
                <Services>
                    <Service SublimitsApply="true">Optical</Service>
                    <Service SublimitsApply="false">Physio</Service>
                    <Service SublimitsApply="false">Massage</Service>
                </Services>
            </BenefitLimit>
            <BenefitLimit Title="Ambulance">
                <AnnualLimit>Unlimited</AnnualLimit>
            </BenefitLimit>
        </BenefitLimits>
    </product>"#;

    fn services(schema: SchemaVersion) -> ServiceMap {
        let doc = parse(PRODUCT).unwrap();
        extract(doc.find("product").unwrap(), schema)
    }

    #[test]
    fn shared_limit_with_sublimit_flag() {
        let s = services(SchemaVersion::V3);
        assert_eq!(s.get("Optical").unwrap().limits, "$500 sublimits apply");
        assert_eq!(s.get("Physio").unwrap().limits, "$500");
    }

    #[test]
    fn covered_service_fields() {
        let s = services(SchemaVersion::V3);
        let optical = s.get("Optical").unwrap();
        assert_eq!(optical.waiting_period, "6 Months");
        assert_eq!(optical.max_benefit, "Frames 200 Dollar\n");
        assert_eq!(s.get("Physio").unwrap().max_benefit, "No benefits found.");
    }

    #[test]
    fn uncovered_service_is_dashed() {
        let s = services(SchemaVersion::V3);
        let hearing = s.get("HearingAids").unwrap();
        assert_eq!(hearing.covered, "false");
        assert_eq!(hearing.waiting_period, "-");
        assert_eq!(hearing.limits, "-");
        assert_eq!(hearing.max_benefit, "-");
    }

    #[test]
    fn old_schema_gets_ambulance_slot() {
        assert!(services(SchemaVersion::V3).get(AMBULANCE).is_none());
        let amb = services(SchemaVersion::V2).get(AMBULANCE).cloned().unwrap();
        assert_eq!(amb, GeneralService::dashed(AMBULANCE, "-"));
    }

    #[test]
    fn group_without_fee() {
        let doc = parse(
            r#"<product>
                <generalhealthservice title="Dental" covered="true"/>
                <benefitlimit title="Dental">
                    <service sublimitsapply="false">Dental</service>
                </benefitlimit>
            </product>"#,
        )
        .unwrap();
        let s = extract(doc.find("product").unwrap(), SchemaVersion::V3);
        assert_eq!(s.get("Dental").unwrap().limits, "No fee");
    }

    #[test]
    fn no_general_services() {
        let doc = parse("<product><hospitalcover/></product>").unwrap();
        assert!(extract(doc.find("product").unwrap(), SchemaVersion::V2).iter().next().is_none());
    }
}
