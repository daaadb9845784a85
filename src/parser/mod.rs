pub mod extract;
pub mod policy;

use tracing::warn;

use crate::models::Policy;
use crate::xml::Document;
pub use policy::SourceContext;

pub struct DocumentPolicies {
    pub policies: Vec<Policy>,
    /// `count` declared on `<products>`, when present and numeric.
    pub declared: Option<usize>,
    pub dropped: usize,
}

/// Assemble every `<product>` of a policy document in encounter order.
/// Products with an unrecognised schema version are skipped with a warning.
pub fn process_document(
    doc: &Document,
    ctx: &SourceContext<'_>,
    mut on_product: impl FnMut(),
) -> DocumentPolicies {
    let declared = doc
        .find("products")
        .and_then(|p| p.attr("count"))
        .and_then(|c| c.trim().parse().ok());

    let mut policies = Vec::new();
    let mut dropped = 0;
    for (i, product) in doc.find_all("product").into_iter().enumerate() {
        match policy::assemble(product, ctx) {
            Ok(p) => policies.push(p),
            Err(e) => {
                dropped += 1;
                warn!(
                    source = ctx.source_name,
                    product = i + 1,
                    code = product.attr("productcode").unwrap_or_default(),
                    "skipping product: {}",
                    e
                );
            }
        }
        on_product();
    }

    DocumentPolicies {
        policies,
        declared,
        dropped,
    }
}
