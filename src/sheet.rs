use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::models::{Policy, PolicyVariant, SchemaVersion};
use crate::parser::extract::general::AMBULANCE;

#[rustfmt::skip]
pub const HEADER: [&str; 76] = [
    "PDF Type", "Name", "Fund", "PDFLink", "Status", "Excess",
    "Monthly Premium", "State", "Adults", "Scale (Adults + Dependants)",
    "Availability", "Policy Type", "Corporate Product",
    "Hospital Cover During Visit", "Hospital Services not Covered",
    "Hospital Services Limited Cover", "Waiting periods", "Copayment",
    "Other Hospital Cover Features",
    "General Dental - WP", "General Dental - Limits", "General Dental - Max Benefits",
    "Major Dental - WP", "Major Dental - Limits", "Major Dental - Max Benefits",
    "Endodontic - WP", "Endodontic - Limits", "Endodontic - Max Benefits",
    "Orthodontic - WP", "Orthodontic - Limits", "Orthodontic - Max Benefits",
    "Optical - WP", "Optical - Limits", "Optical - Max Benefits",
    "NonPBSPharmaceuticals - WP", "NonPBSPharmaceuticals - Limits", "NonPBSPharmaceuticals - Max Benefits",
    "Physio - WP", "Physio - Limits", "Physio - Max Benefits",
    "Chiropractic - WP", "Chiropractic - Limits", "Chiropractic - Max Benefits",
    "Podiatry - WP", "Podiatry - Limits", "Podiatry - Max Benefits",
    "Psychology - WP", "Psychology - Limits", "Psychology - Max Benefits",
    "Acupuncture - WP", "Acupuncture - Limits", "Acupuncture - Max Benefits",
    "Naturopathy - WP", "Naturopathy - Limits", "Naturopathy - Max Benefits",
    "Massage - WP", "Massage - Limits", "Massage - Max Benefits",
    "HearingAids - WP", "HearingAids - Limits", "HearingAids - Max Benefits",
    "BloodGlucose Monitoring - WP", "BloodGlucose Monitoring - Limits", "BloodGlucose Monitoring - Max Benefits",
    "Ambulance - Emergency", "Ambulance - Call out fees", "Ambulance - other information",
    "Other Treatment Cover Features", "Medicare Surcharge Levy", "Issue Date",
    "Available for", "Provider Arrangements", "Youth discount",
    "Travel and accommodation beneft", "Policy ID", "Accident cover",
];

pub const OLD_PDF: &str = "OLD PDF. Does not contain this.";

// Zero-based column positions.
const COL_PDF_TYPE: usize = 0;
const COL_POL_NAME: usize = 1;
const COL_FUND_NAME: usize = 2;
const COL_PDF_LINK: usize = 3;
const COL_STATUS: usize = 4;
const COL_EXCESS: usize = 5;
const COL_MOPREM: usize = 6;
const COL_STATE: usize = 7;
const COL_ADULTS: usize = 8;
const COL_DPNDNTS: usize = 9;
const COL_AVAIL: usize = 10;
const COL_POL_TYPE: usize = 11;
const COL_CORP: usize = 12;
const COL_HOSP_COVERED: usize = 13;
const COL_HOSP_NOT_COVERED: usize = 14;
const COL_HOSP_LIMITED: usize = 15;
const COL_WAIT_PERIODS: usize = 16;
const COL_COPAYMENT: usize = 17;
const COL_OTHER_HOSP: usize = 18;
const COL_AMBULANCE_EMER: usize = 64;
const COL_AMBULANCE_FEE: usize = 65;
const COL_AMBULANCE_OTHER: usize = 66;
const COL_OTHER: usize = 67;
const COL_MEDICARE: usize = 68;
const COL_ISSUE_DATE: usize = 69;
const COL_AVAIL_FOR: usize = 70;
const COL_PROV_ARR: usize = 71;
const COL_AGE_DISC: usize = 72;
const COL_TRAV_ACCOM_BEN: usize = 73;
const COL_POL_ID: usize = 74;
const COL_ACCIDENT_COV: usize = 75;

/// First matching name fragment wins. Each group spans wait, limits and max benefit.
const SERVICE_COLUMNS: &[(&str, usize)] = &[
    ("DentalGeneral", 19),
    ("DentalMajor", 22),
    ("Endodontic", 25),
    ("Orthodontic", 28),
    ("Optical", 31),
    ("NonPBS", 34),
    ("Physio", 37),
    ("Chiro", 40),
    ("Podiatry", 43),
    ("Psychology", 46),
    ("Acupuncture", 49),
    ("Naturopathy", 52),
    ("Massage", 55),
    ("HearingAids", 58),
    ("Glucose", 61),
];

/// Output sink for one sheet.
pub trait Sheet {
    fn set_header(&mut self, header: &[&str]) -> Result<()>;
    fn append_row(&mut self, row: &[String]) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

pub struct CsvSheet<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSheet<File> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> CsvSheet<W> {
    pub fn from_writer(w: W) -> Self {
        CsvSheet {
            writer: csv::Writer::from_writer(w),
        }
    }
}

impl<W: Write> Sheet for CsvSheet<W> {
    fn set_header(&mut self, header: &[&str]) -> Result<()> {
        self.writer.write_record(header)?;
        Ok(())
    }

    fn append_row(&mut self, row: &[String]) -> Result<()> {
        self.writer.write_record(row)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Header plus one row per policy, in order.
pub fn write_policies<S: Sheet>(sheet: &mut S, policies: &[Policy]) -> Result<()> {
    sheet.set_header(&HEADER)?;
    for policy in policies {
        sheet.append_row(&policy_row(policy))?;
    }
    sheet.finish()
}

/// `<results_dir>/<source stem> <dd Month YYYY at HH.MM>.csv`
pub fn output_path(results_dir: &Path, source_name: &str, now: NaiveDateTime) -> PathBuf {
    let stem = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_name.to_string());
    results_dir.join(format!("{} {}.csv", stem, now.format("%d %B %Y at %H.%M")))
}

pub fn policy_row(policy: &Policy) -> Vec<String> {
    let mut row = vec![String::new(); HEADER.len()];

    row[COL_POL_NAME] = policy.name.clone();
    row[COL_FUND_NAME] = policy.fund_code.clone();
    row[COL_PDF_LINK] = policy.pdf_link.clone();
    row[COL_STATUS] = policy.status.clone();
    row[COL_EXCESS] = policy.excess.clone();
    row[COL_MOPREM] = policy.monthly_premium.clone();
    row[COL_STATE] = policy.state.clone();
    row[COL_ADULTS] = policy.adults.clone();
    row[COL_DPNDNTS] = policy.dependants.clone();
    row[COL_AVAIL] = policy.availability.clone();
    row[COL_POL_TYPE] = policy.policy_type.clone();
    row[COL_CORP] = policy.corporate.clone();
    row[COL_ISSUE_DATE] = policy.issue_date.clone();
    row[COL_AVAIL_FOR] = policy.available_for.clone();
    row[COL_PROV_ARR] = policy.provider_arrangements.clone();
    row[COL_OTHER] = policy.other_services.clone();
    row[COL_MEDICARE] = if policy.medicare_exempt == "true" {
        "Exempted".to_string()
    } else {
        "Not exempted".to_string()
    };

    match &policy.variant {
        PolicyVariant::Old => {
            row[COL_PDF_TYPE] = "OLD".to_string();
            for col in [
                COL_AGE_DISC,
                COL_TRAV_ACCOM_BEN,
                COL_POL_ID,
                COL_ACCIDENT_COV,
                COL_AMBULANCE_EMER,
                COL_AMBULANCE_FEE,
                COL_AMBULANCE_OTHER,
            ] {
                row[col] = OLD_PDF.to_string();
            }
        }
        PolicyVariant::New(f) => {
            row[COL_PDF_TYPE] = "NEW".to_string();
            row[COL_AGE_DISC] = f.youth_discount.clone();
            row[COL_TRAV_ACCOM_BEN] = f.travel_accommodation_benefit.clone();
            row[COL_POL_ID] = f.policy_id.clone();
            row[COL_ACCIDENT_COV] = f.accident_cover.clone();
            row[COL_AMBULANCE_EMER] = f.ambulance.emergency.clone();
            row[COL_AMBULANCE_FEE] = f.ambulance.call_out_fees.clone();
            row[COL_AMBULANCE_OTHER] = f.ambulance.other.clone();
        }
    }

    let hosp = &policy.hospital;
    row[COL_HOSP_COVERED] = hosp.covered.join(", ");
    row[COL_HOSP_NOT_COVERED] = hosp.not_covered.join(", ");
    row[COL_HOSP_LIMITED] = hosp.limited_cover.join(", ");
    row[COL_WAIT_PERIODS] = hosp.waiting_periods.clone();
    row[COL_COPAYMENT] = hosp.co_payment.clone();
    row[COL_OTHER_HOSP] = hosp.other_features.clone();

    // Written last: the old ambulance slot overwrites the ambulance sentinels.
    let old = policy.schema() == SchemaVersion::V2;
    for service in policy.general.iter() {
        let Some(col) = service_column(&service.name, old) else {
            continue;
        };
        row[col] = service.waiting_period.clone();
        row[col + 1] = service.limits.clone();
        row[col + 2] = service.max_benefit.clone();
    }

    row
}

fn service_column(name: &str, old: bool) -> Option<usize> {
    SERVICE_COLUMNS
        .iter()
        .find(|(fragment, _)| name.contains(fragment))
        .map(|(_, col)| *col)
        .or_else(|| (old && name.contains(AMBULANCE)).then_some(COL_AMBULANCE_EMER))
}
