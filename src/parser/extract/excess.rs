use super::NO_EXCESS;
use crate::xml::Element;

/// One line per element under `<excesses>`: waivers read "<tag> for <text>",
/// amounts read "<tag> is $<text>".
pub fn extract(product: &Element) -> String {
    let Some(section) = product.find("excesses") else {
        return NO_EXCESS.to_string();
    };

    let mut out = String::new();
    for excess in section.descendants() {
        let text = excess.text();
        let text = text.trim();
        if excess.name.contains("waiver") {
            out.push_str(&format!("{} for {}\n", excess.name, text));
        } else {
            out.push_str(&format!("{} is ${}\n", excess.name, text));
        }
    }

    if out.is_empty() {
        NO_EXCESS.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;

    fn product(xml: &str) -> crate::xml::Document {
        parse(xml).unwrap()
    }

    #[test]
    fn empty_section() {
        let doc = product("<product><excesses></excesses></product>");
        assert_eq!(extract(doc.find("product").unwrap()), "No excess.");
    }

    #[test]
    fn missing_section() {
        let doc = product("<product><name>x</name></product>");
        assert_eq!(extract(doc.find("product").unwrap()), "No excess.");
    }

    #[test]
    fn amounts_and_waivers() {
        let doc = product(
            "<product><Excesses><ExcessPerAdmission> 500 </ExcessPerAdmission>\
             <ExcessWaivers>Children</ExcessWaivers></Excesses></product>",
        );
        assert_eq!(
            extract(doc.find("product").unwrap()),
            "excessperadmission is $500\nexcesswaivers for Children\n"
        );
    }
}
