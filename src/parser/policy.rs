use thiserror::Error;

use super::extract::{
    ambulance, attr_or, excess, general, hospital, own_attr, policy_type_from_source, providers,
    text_or_empty, DASH, NOT_FOUND, NO_ACCIDENT_COVER, NO_CORPORATE, NO_TRAVEL_BENEFIT,
    NO_YOUTH_DISCOUNT,
};
use crate::models::{
    Fund, FundRegistry, NewPolicyFields, Policy, PolicyVariant, SchemaVersion, ServiceMap,
};
use crate::xml::Element;

#[derive(Debug, Error, PartialEq)]
#[error("unrecognised schema version {0:?}")]
pub struct UnknownSchema(pub String);

/// Inputs shared by every product of one source file.
#[derive(Debug, Clone, Copy)]
pub struct SourceContext<'a> {
    pub source_name: &'a str,
    pub registry: &'a FundRegistry,
    pub download_base: &'a str,
}

/// Build one policy from a `<product>`, dispatching on its `schemaversion` attribute.
pub fn assemble(product: &Element, ctx: &SourceContext<'_>) -> Result<Policy, UnknownSchema> {
    let raw = product.attr("schemaversion").unwrap_or_default();
    match SchemaVersion::parse(raw) {
        Some(SchemaVersion::V2) => Ok(schema_2(product, ctx)),
        Some(SchemaVersion::V3) => Ok(schema_3(product, ctx)),
        None => Err(UnknownSchema(raw.to_string())),
    }
}

/// Fields read the same way in both schemas.
struct Common<'a> {
    name: String,
    fund_code: String,
    policy_id: String,
    pdf_link: String,
    status: String,
    excess: String,
    monthly_premium: String,
    state: String,
    adults: String,
    medicare_exempt: String,
    issue_date: String,
    other_services: String,
    available_for: String,
    fund: Option<&'a Fund>,
}

fn common<'a>(product: &Element, ctx: &SourceContext<'a>) -> Common<'a> {
    let fund_code = text_or_empty(product, "fundcode");
    let product_code = own_attr(product, "productcode");
    let policy_id = format!(
        "{}/{}",
        fund_code,
        product_code.as_deref().unwrap_or(NOT_FOUND)
    );
    let fund = ctx.registry.get(&fund_code);

    Common {
        name: text_or_empty(product, "name"),
        pdf_link: format!("{}{}", ctx.download_base, policy_id),
        status: text_or_empty(product, "productstatus"),
        excess: excess::extract(product),
        monthly_premium: text_or_empty(product, "premiumnorebate"),
        state: text_or_empty(product, "state"),
        adults: product_code
            .as_deref()
            .and_then(adults_from_code)
            .unwrap_or_else(|| DASH.to_string()),
        medicare_exempt: text_or_empty(product, "medicarelevysurchargeexempt"),
        issue_date: text_or_empty(product, "dateissued"),
        other_services: text_or_empty(product, "otherservices"),
        available_for: fund
            .map(|f| f.restrictions.clone())
            .unwrap_or_else(|| NOT_FOUND.to_string()),
        fund_code,
        policy_id,
        fund,
    }
}

/// Adult count is encoded as the second-to-last character of the product code.
fn adults_from_code(code: &str) -> Option<String> {
    code.chars().rev().nth(1).map(String::from)
}

fn schema_3(product: &Element, ctx: &SourceContext<'_>) -> Policy {
    let c = common(product, ctx);
    let provider_arrangements = providers::extract(product, &c.state, c.fund, SchemaVersion::V3);
    let ambulance = ambulance::extract_new(product, &c.fund_code, &c.state, ctx.registry);

    let fields = NewPolicyFields {
        youth_discount: attr_or(product, "agebaseddiscount", "available", NO_YOUTH_DISCOUNT),
        travel_accommodation_benefit: attr_or(
            product,
            "hospitalcover",
            "traveloraccommodationsbenefit",
            NO_TRAVEL_BENEFIT,
        ),
        policy_id: c.policy_id,
        accident_cover: attr_or(product, "hospitalcover", "accidentcover", NO_ACCIDENT_COVER),
        ambulance,
    };

    Policy {
        name: c.name,
        fund_code: c.fund_code,
        pdf_link: c.pdf_link,
        status: c.status,
        excess: c.excess,
        monthly_premium: c.monthly_premium,
        state: c.state,
        adults: c.adults,
        dependants: text_or_empty(product, "scale"),
        availability: "None avail".to_string(),
        policy_type: policy_type_from_source(ctx.source_name),
        corporate: attr_or(product, "corporate", "atomic", NO_CORPORATE),
        medicare_exempt: c.medicare_exempt,
        issue_date: c.issue_date,
        available_for: c.available_for,
        provider_arrangements,
        hospital: hospital::extract(product),
        general: general::extract(product, SchemaVersion::V3),
        other_services: c.other_services,
        variant: PolicyVariant::New(fields),
    }
}

fn schema_2(product: &Element, ctx: &SourceContext<'_>) -> Policy {
    let c = common(product, ctx);
    let policy_type = text_or_empty(product, "producttype");
    let provider_arrangements = providers::extract(product, &c.state, c.fund, SchemaVersion::V2);

    // Hospital-only products carry no general services at all.
    let general = if policy_type == "Hospital" {
        ServiceMap::default()
    } else {
        let mut services = general::extract(product, SchemaVersion::V2);
        ambulance::apply_old(product, &mut services);
        services
    };

    Policy {
        name: c.name,
        fund_code: c.fund_code,
        pdf_link: c.pdf_link,
        status: c.status,
        excess: c.excess,
        monthly_premium: c.monthly_premium,
        state: c.state,
        adults: c.adults,
        dependants: text_or_empty(product, "category"),
        availability: "No avail".to_string(),
        policy_type,
        corporate: attr_or(product, "corporate", "atomic", NO_CORPORATE),
        medicare_exempt: c.medicare_exempt,
        issue_date: c.issue_date,
        available_for: c.available_for,
        provider_arrangements,
        hospital: hospital::extract(product),
        general,
        other_services: c.other_services,
        variant: PolicyVariant::Old,
    }
}
