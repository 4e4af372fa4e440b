//! Placeholder key normalization and synonym resolution.

/// Common alternative names mapped to their canonical placeholder keys.
///
/// Entries are matched after [`normalize_key`], so they are lowercase and
/// underscored.
pub const KEY_SYNONYMS: &[(&str, &str)] = &[
    ("company", "company_name"),
    ("business", "company_name"),
    ("business_name", "company_name"),
    ("organization", "company_name"),
    ("organisation", "company_name"),
    ("firm", "company_name"),
    ("email_address", "email"),
    ("e-mail", "email"),
    ("e_mail", "email"),
    ("phone_number", "phone"),
    ("telephone", "phone"),
    ("mobile", "phone"),
    ("street_address", "address"),
    ("mailing_address", "address"),
    ("price", "amount"),
    ("cost", "amount"),
    ("fee", "amount"),
    ("date_signed", "signing_date"),
    ("signature_date", "signing_date"),
    ("date_of_signing", "signing_date"),
    ("start_date", "effective_date"),
    ("commencement_date", "effective_date"),
    ("full_name", "name"),
    ("your_name", "name"),
];

/// Lowercases, trims, and collapses internal whitespace into underscores.
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Returns the canonical key for an already-normalized key, if one is known.
pub fn synonym_for(normalized: &str) -> Option<&'static str> {
    KEY_SYNONYMS
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| *canonical)
}

/// Keys worth trying for a raw key, canonical form first.
///
/// A template may itself use an alias (say `email_address`) as its key, so the
/// plain normalized form is kept as a second candidate.
pub fn key_candidates(raw: &str) -> Vec<String> {
    let normalized = normalize_key(raw);
    match synonym_for(&normalized) {
        Some(canonical) if canonical != normalized => vec![canonical.to_string(), normalized],
        _ => vec![normalized],
    }
}
