//! Reference lookups for country and political-group normalization
//!
//! Sources spell countries and groups as free text. Country names map to
//! ISO-2 codes through a fixed table with a truncated-uppercase fallback for
//! unknowns; EU group names map to abbreviations by substring match since the
//! exports use several long-form variants of each group name.

/// ISO-2 code for a source country name. Unknown names fall back to the
/// first two letters uppercased, which is best-effort rather than correct.
pub fn country_code(country: &str) -> String {
    let code = match country {
        "Austria" => "AT",
        "Belgium" => "BE",
        "Bulgaria" => "BG",
        "Croatia" => "HR",
        "Cyprus" => "CY",
        "Czechia" | "Czech Republic" => "CZ",
        "Denmark" | "Kingdom of Denmark" => "DK",
        "Estonia" => "EE",
        "Finland" => "FI",
        "France" => "FR",
        "Germany" | "German Democratic Republic" => "DE",
        "Greece" => "GR",
        "Hungary" => "HU",
        "Ireland" => "IE",
        "Italy" => "IT",
        "Latvia" => "LV",
        "Lithuania" => "LT",
        "Luxembourg" => "LU",
        "Malta" => "MT",
        "Netherlands" | "Kingdom of the Netherlands" => "NL",
        "Poland" => "PL",
        "Portugal" => "PT",
        "Romania" => "RO",
        "Slovakia" => "SK",
        "Slovenia" => "SI",
        "Spain" => "ES",
        "Sweden" => "SE",
        _ => "",
    };
    if code.is_empty() {
        country
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .take(2)
            .collect::<String>()
            .to_uppercase()
    } else {
        code.to_string()
    }
}

/// Display name for a source country, normalizing the long-form state names
/// some exports use.
pub fn country_display_name(country: &str) -> &str {
    match country {
        "Kingdom of the Netherlands" => "Netherlands",
        "Kingdom of Denmark" => "Denmark",
        "German Democratic Republic" => "Germany",
        other => other,
    }
}

/// Abbreviation for an EU political group name.
///
/// Substring matching: the exports carry several variants per group
/// ("Renew Europe Group", "Renew Europe (RE)", ...). Unmatched names pass
/// through unchanged.
pub fn eu_group_abbreviation(group: &str) -> String {
    if group.is_empty() {
        return String::new();
    }
    let known: &[(&str, &str)] = &[
        ("European People's Party", "EPP"),
        ("EPP", "EPP"),
        ("Progressive Alliance of Socialists", "S&D"),
        ("S&D", "S&D"),
        ("Renew Europe", "RE"),
        ("Greens/European Free Alliance", "Greens/EFA"),
        ("Greens/EFA", "Greens/EFA"),
        ("European Conservatives and Reformists", "ECR"),
        ("ECR", "ECR"),
        ("Identity and Democracy", "ID"),
        ("The Left", "Left"),
        ("GUE/NGL", "Left"),
        ("Patriots for Europe", "Patriots"),
        ("PfE", "Patriots"),
        ("Europe of Sovereign Nations", "ESN"),
        ("Non-attached", "NI"),
        ("NI", "NI"),
    ];
    for (needle, abbr) in known {
        if group.contains(needle) {
            return (*abbr).to_string();
        }
    }
    group.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_known() {
        assert_eq!(country_code("Germany"), "DE");
        assert_eq!(country_code("Czech Republic"), "CZ");
        assert_eq!(country_code("Kingdom of the Netherlands"), "NL");
    }

    #[test]
    fn test_country_code_fallback_truncates() {
        assert_eq!(country_code("Atlantis"), "AT");
        assert_eq!(country_code("x"), "X");
    }

    #[test]
    fn test_country_display_name_drift() {
        assert_eq!(country_display_name("Kingdom of Denmark"), "Denmark");
        assert_eq!(country_display_name("France"), "France");
    }

    #[test]
    fn test_group_abbreviation_variants() {
        assert_eq!(
            eu_group_abbreviation("European People's Party (Christian Democrats)"),
            "EPP"
        );
        assert_eq!(eu_group_abbreviation("Renew Europe Group"), "RE");
        assert_eq!(
            eu_group_abbreviation("The Left group in the European Parliament - GUE/NGL"),
            "Left"
        );
        assert_eq!(eu_group_abbreviation("Non-attached Members"), "NI");
    }

    #[test]
    fn test_group_abbreviation_unknown_passes_through() {
        assert_eq!(eu_group_abbreviation("Some New Group"), "Some New Group");
        assert_eq!(eu_group_abbreviation(""), "");
    }
}
