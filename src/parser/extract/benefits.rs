use super::NO_BENEFITS;
use crate::xml::Element;

/// "<item> <fee> <type>" per `<benefit>` inside a service.
pub fn extract(service: &Element) -> String {
    let benefits = service.find_all("benefit");
    if benefits.is_empty() {
        return NO_BENEFITS.to_string();
    }

    benefits
        .iter()
        .map(|b| {
            let item = b.attr("item").unwrap_or_default().trim();
            let kind = b.attr("type").unwrap_or_default().trim();
            format!("{} {} {}\n", item, b.text().trim(), kind)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;

    #[test]
    fn formats_each_benefit() {
        let doc = parse(
            r#"<service>
                <Benefit Item="012" Type="Dollar">40</Benefit>
                <Benefit Item="114" Type="Percent">60</Benefit>
            </service>"#,
        )
        .unwrap();
        assert_eq!(
            extract(doc.find("service").unwrap()),
            "012 40 Dollar\n114 60 Percent\n"
        );
    }

    #[test]
    fn no_benefits() {
        let doc = parse("<service/>").unwrap();
        assert_eq!(extract(doc.find("service").unwrap()), "No benefits found.");
    }
}
