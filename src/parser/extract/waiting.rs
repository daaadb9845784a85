use tracing::debug;

use super::{CANNOT_FIND_WAIT, NO_WAITING_PERIOD};
use crate::xml::Element;

/// Format every `<waitingperiod>` under `scope` as "<title> wait is <text> <unit>s".
///
/// An entry missing its `title` or `unit` becomes a "Cannot find wait." line;
/// the entries before and after it are kept.
pub fn extract(scope: &Element) -> String {
    let periods = scope.find_all("waitingperiod");
    if periods.is_empty() {
        return NO_WAITING_PERIOD.to_string();
    }

    let mut out = String::new();
    for period in periods {
        match (period.attr("title"), period.attr("unit")) {
            (Some(title), Some(unit)) => {
                let text = period.text();
                out.push_str(&format!(
                    "{} wait is {} {}s\n",
                    title.trim(),
                    text.trim(),
                    unit.trim()
                ));
            }
            _ => {
                debug!(attrs = ?period.attrs(), "waiting period without title/unit");
                out.push_str(CANNOT_FIND_WAIT);
                out.push('\n');
            }
        }
    }
    out
}

/// Single-entry form used by general services: "<text> <unit>s".
pub fn single(period: &Element) -> String {
    let text = period.text();
    match period.attr("unit") {
        Some(unit) => format!("{} {}s", text.trim(), unit.trim()),
        None => CANNOT_FIND_WAIT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;

    #[test]
    fn hospital_two_days() {
        let doc = parse(
            r#"<waitingperiods><waitingperiod title="Hospital" unit="Day">2</waitingperiod></waitingperiods>"#,
        )
        .unwrap();
        assert_eq!(extract(doc.find("waitingperiods").unwrap()), "Hospital wait is 2 Days\n");
    }

    #[test]
    fn none_found() {
        let doc = parse("<waitingperiods/>").unwrap();
        assert_eq!(extract(doc.find("waitingperiods").unwrap()), "No waiting period found.");
    }

    #[test]
    fn bad_entry_keeps_neighbours() {
        let doc = parse(
            r#"<w>
                <waitingperiod title="Psychiatric" unit="Month">2</waitingperiod>
                <waitingperiod unit="Month">12</waitingperiod>
                <waitingperiod title="Obstetric" unit="Month">12</waitingperiod>
            </w>"#,
        )
        .unwrap();
        assert_eq!(
            extract(doc.find("w").unwrap()),
            "Psychiatric wait is 2 Months\nCannot find wait.\nObstetric wait is 12 Months\n"
        );
    }

    #[test]
    fn single_entry() {
        let doc = parse(r#"<waitingperiod unit="Month"> 6 </waitingperiod>"#).unwrap();
        assert_eq!(single(doc.find("waitingperiod").unwrap()), "6 Months");
    }
}
