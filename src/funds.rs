use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::models::{Fund, FundRegistry};
use crate::parser::extract::{first_text, text_or, NOT_FOUND, NO_RESTRICTIONS};
use crate::xml::{self, Document, Element};

/// Read and parse the funds reference file.
pub fn load_registry(path: &Path) -> Result<FundRegistry> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read funds file {:?}", path))?;
    let doc = xml::parse(&raw).with_context(|| format!("Failed to parse funds file {:?}", path))?;
    let registry = build_registry(&doc);
    if registry.is_empty() {
        warn!(path = %path.display(), "funds file holds no fund entries");
    }
    info!(funds = registry.len(), "Fund registry built");
    Ok(registry)
}

/// Map fund code to fund entry. A later fund with the same code replaces an earlier one.
pub fn build_registry(doc: &Document) -> FundRegistry {
    let mut registry = FundRegistry::default();
    for el in doc.find_all("fund") {
        registry.insert(parse_fund(el));
    }
    registry
}

fn parse_fund(fund: &Element) -> Fund {
    let code = text_or(fund, "fundcode", NOT_FOUND);
    let name = text_or(fund, "fundname", NOT_FOUND);

    let preferred_provider_services = fund
        .find_all("preferredprovider")
        .into_iter()
        .filter(|p| p.attr("covered").map(str::trim) == Some("Covered"))
        .map(|p| {
            let state = p.attr("state").unwrap_or_default().trim().to_string();
            (state, text_or(p, "freetext", NOT_FOUND))
        })
        .collect();

    let (ambulance_emergency, ambulance_call_out_fees, ambulance_other) =
        match fund.find("ambulance") {
            Some(amb) => parse_ambulance(amb),
            None => {
                debug!(code = %code, "fund has no ambulance block");
                (NOT_FOUND.to_string(), NOT_FOUND.to_string(), Vec::new())
            }
        };

    let restrictions = match first_text(fund, "restrictionparagraph") {
        Some(r) if !r.is_empty() => r,
        _ => NO_RESTRICTIONS.to_string(),
    };

    Fund {
        code,
        name,
        preferred_provider_services,
        ambulance_emergency,
        ambulance_call_out_fees,
        ambulance_other,
        restrictions,
    }
}

fn parse_ambulance(amb: &Element) -> (String, String, Vec<(String, String)>) {
    let call_out = amb
        .attr("calloutfees")
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| NOT_FOUND.to_string());

    let wait = amb
        .find("waitingperiodemergency")
        .and_then(|w| {
            let unit = w.attr("unit")?;
            Some(format!("{}{}", w.text().trim(), unit.trim()))
        })
        .unwrap_or_else(|| NOT_FOUND.to_string());
    let limit = text_or(amb, "ambulanceservicelimitemergency", NOT_FOUND);
    let emergency = format!("Wait: {}\nLimit: ${}\n", wait, limit);

    let other = amb
        .find_all("detail")
        .into_iter()
        .map(|d| {
            let state = d.attr("state").unwrap_or_default().trim().to_string();
            (state, d.text().trim().to_string())
        })
        .collect();

    (emergency, call_out, other)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Document {
        let raw = std::fs::read_to_string("tests/fixtures/funds.xml").unwrap();
        xml::parse(&raw).unwrap()
    }

    #[test]
    fn parses_fixture_funds() {
        let reg = build_registry(&fixture());
        assert_eq!(reg.len(), 2);
        let f1 = reg.get("F1").unwrap();
        assert_eq!(f1.name, "Fund One");
        assert_eq!(f1.ambulance_call_out_fees, "Covered in full");
        assert_eq!(f1.ambulance_emergency, "Wait: 1Day\nLimit: $Unlimited\n");
        assert_eq!(
            f1.ambulance_other,
            vec![
                ("VIC".to_string(), "text-A".to_string()),
                ("NSW".to_string(), "text-B".to_string()),
            ]
        );
        assert_eq!(f1.restrictions, "Members of the armed forces only.");
    }

    #[test]
    fn only_covered_providers_in_order() {
        let reg = build_registry(&fixture());
        let f1 = reg.get("F1").unwrap();
        assert_eq!(
            f1.preferred_provider_services,
            vec![
                ("NSW".to_string(), "Members First hospitals".to_string()),
                ("QLD".to_string(), "Queensland network".to_string()),
            ]
        );
    }

    #[test]
    fn missing_pieces_degrade_to_sentinels() {
        let reg = build_registry(&fixture());
        let f2 = reg.get("F2").unwrap();
        assert_eq!(f2.restrictions, "No restrictions");
        assert_eq!(f2.ambulance_call_out_fees, "Not found");
        assert_eq!(f2.ambulance_emergency, "Wait: Not found\nLimit: $Not found\n");
        assert!(f2.preferred_provider_services.is_empty());
    }

    #[test]
    fn rebuilding_is_identical() {
        let doc = fixture();
        assert_eq!(build_registry(&doc), build_registry(&doc));
    }
}
