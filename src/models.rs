use std::collections::HashMap;

use serde::Serialize;

/// Insurer entry from the funds reference file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fund {
    pub code: String,
    pub name: String,
    /// (state, text) pairs, document order. A state may repeat.
    pub preferred_provider_services: Vec<(String, String)>,
    pub ambulance_emergency: String,
    pub ambulance_call_out_fees: String,
    pub ambulance_other: Vec<(String, String)>,
    pub restrictions: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FundRegistry {
    funds: HashMap<String, Fund>,
}

impl FundRegistry {
    pub fn insert(&mut self, fund: Fund) {
        self.funds.insert(fund.code.clone(), fund);
    }

    pub fn get(&self, code: &str) -> Option<&Fund> {
        self.funds.get(code)
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    /// Funds ordered by code.
    pub fn sorted(&self) -> Vec<&Fund> {
        let mut funds: Vec<&Fund> = self.funds.values().collect();
        funds.sort_by(|a, b| a.code.cmp(&b.code));
        funds
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HospitalService {
    pub covered: Vec<String>,
    pub not_covered: Vec<String>,
    pub limited_cover: Vec<String>,
    pub waiting_periods: String,
    pub other_features: String,
    pub co_payment: String,
}

impl HospitalService {
    /// Stand-in for products without a hospital cover section.
    pub fn placeholder() -> Self {
        HospitalService {
            covered: vec!["-".into()],
            not_covered: vec!["-".into()],
            limited_cover: vec!["-".into()],
            waiting_periods: "-".into(),
            other_features: "-".into(),
            co_payment: "-".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralService {
    pub name: String,
    pub covered: String,
    pub waiting_period: String,
    pub limits: String,
    pub max_benefit: String,
}

impl GeneralService {
    /// All-dash entry: uncovered services and the schema 2.0 ambulance slot.
    pub fn dashed(name: &str, covered: &str) -> Self {
        GeneralService {
            name: name.to_string(),
            covered: covered.to_string(),
            waiting_period: "-".into(),
            limits: "-".into(),
            max_benefit: "-".into(),
        }
    }
}

/// General services keyed by name, kept in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ServiceMap {
    entries: Vec<GeneralService>,
}

impl ServiceMap {
    /// Insert or replace by name. A replaced entry keeps its original position.
    pub fn insert(&mut self, service: GeneralService) {
        match self.entries.iter_mut().find(|s| s.name == service.name) {
            Some(slot) => *slot = service,
            None => self.entries.push(service),
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&GeneralService> {
        self.entries.iter().find(|s| s.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut GeneralService> {
        self.entries.iter_mut().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneralService> {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchemaVersion {
    #[serde(rename = "2.0")]
    V2,
    #[serde(rename = "3.0")]
    V3,
}

impl SchemaVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "2.0" => Some(SchemaVersion::V2),
            "3.0" => Some(SchemaVersion::V3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbulanceCover {
    pub emergency: String,
    pub call_out_fees: String,
    pub other: String,
}

impl AmbulanceCover {
    pub fn uniform(text: &str) -> Self {
        AmbulanceCover {
            emergency: text.to_string(),
            call_out_fees: text.to_string(),
            other: text.to_string(),
        }
    }
}

/// Fields only schema 3.0 products carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPolicyFields {
    pub youth_discount: String,
    pub travel_accommodation_benefit: String,
    pub policy_id: String,
    pub accident_cover: String,
    pub ambulance: AmbulanceCover,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "fields")]
pub enum PolicyVariant {
    Old,
    New(NewPolicyFields),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Policy {
    pub name: String,
    pub fund_code: String,
    pub pdf_link: String,
    pub status: String,
    pub excess: String,
    pub monthly_premium: String,
    pub state: String,
    pub adults: String,
    pub dependants: String,
    pub availability: String,
    pub policy_type: String,
    pub corporate: String,
    pub medicare_exempt: String,
    pub issue_date: String,
    pub available_for: String,
    pub provider_arrangements: String,
    pub hospital: HospitalService,
    pub general: ServiceMap,
    pub other_services: String,
    pub variant: PolicyVariant,
}

impl Policy {
    pub fn schema(&self) -> SchemaVersion {
        match self.variant {
            PolicyVariant::Old => SchemaVersion::V2,
            PolicyVariant::New(_) => SchemaVersion::V3,
        }
    }
}
