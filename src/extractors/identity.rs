// src/extractors/identity.rs
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::extractors::text::document_text;

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Cég neve:\s*([^\n\t]+)").expect("Failed to compile NAME_RE")
});
static REGISTRATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:Cégjegyzékszáma|Nyilvántartási szám):\s*(\d{2}-\d{2}-\d{6})")
        .expect("Failed to compile REGISTRATION_RE")
});
static TAX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Adószám:\s*([\d-]+)").expect("Failed to compile TAX_RE")
});
static HEADQUARTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Székhely:\s*([^\n]+)").expect("Failed to compile HEADQUARTER_RE")
});

/// Identity fields as printed on the company detail page. Missing labels leave fields empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyIdentity {
    pub company_name: String,
    pub registration_number: String,
    pub tax_number: String,
    pub headquarter: String,
}

pub(crate) fn capture(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

pub fn extract_company_identity(document: &Html) -> CompanyIdentity {
    let text = document_text(document);
    let identity = CompanyIdentity {
        company_name: capture(&NAME_RE, &text),
        registration_number: capture(&REGISTRATION_RE, &text),
        tax_number: capture(&TAX_RE, &text),
        headquarter: capture(&HEADQUARTER_RE, &text),
    };
    if identity.company_name.is_empty() {
        tracing::warn!("Company page has no 'Cég neve' label; falling back to the report page");
    }
    identity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_labelled_fields() {
        let doc = Html::parse_document(
            r#"<body>
            <div><span>Cég neve:</span> <b>MINTA GYÁRTÓ KFT.</b></div>
            <div>Cégjegyzékszáma: 01-09-123456</div>
            <div>Adószám: 12345678-2-41</div>
            <div>Székhely: 1111 Budapest, Fő utca 1.</div>
            </body>"#,
        );
        let identity = extract_company_identity(&doc);
        assert_eq!(identity.company_name, "MINTA GYÁRTÓ KFT.");
        assert_eq!(identity.registration_number, "01-09-123456");
        assert_eq!(identity.tax_number, "12345678-2-41");
        assert_eq!(identity.headquarter, "1111 Budapest, Fő utca 1.");
    }

    #[test]
    fn accepts_alternate_registration_label() {
        let doc = Html::parse_document("<p>Nyilvántartási szám: 13-02-000123</p>");
        assert_eq!(extract_company_identity(&doc).registration_number, "13-02-000123");
    }

    #[test]
    fn missing_labels_degrade_to_empty() {
        let doc = Html::parse_document("<p>Nincs adat</p>");
        assert_eq!(extract_company_identity(&doc), CompanyIdentity::default());
    }
}
