//! Field normalizers applied to call-center data before it is merged.

/// `(XXX) XXX-XXXX` for 10-digit numbers (or 11 with a leading 1); anything
/// else is returned unchanged.
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let local = match digits.len() {
        10 => digits.as_str(),
        11 if digits.starts_with('1') => &digits[1..],
        _ => return raw.trim().to_string(),
    };
    format!("({}) {}-{}", &local[..3], &local[3..6], &local[6..])
}

/// Strip the dialer's "Unknown Rep" suffix from company names.
pub fn clean_display_name(raw: &str) -> String {
    raw.replace("Unknown Rep", "").trim().to_string()
}

/// Title-cased name from an email local part: `john.doe@x.com` -> `John Doe`.
pub fn contact_from_email(email: &str) -> Option<String> {
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    let name = local
        .split(|c| c == '.' || c == '_' || c == '-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

/// Pick a usable contact name. Dialer user ids (four digits) and blanks are
/// replaced by a name derived from the email, when there is one.
pub fn derive_contact(contact: Option<&str>, email: Option<&str>) -> Option<String> {
    let contact = contact.map(str::trim).filter(|c| !c.is_empty());
    match contact {
        Some(c) if !is_dialer_user_id(c) => Some(c.to_string()),
        _ => email.and_then(contact_from_email),
    }
}

fn is_dialer_user_id(s: &str) -> bool {
    s.len() == 4 && s.chars().all(|c| c.is_ascii_digit())
}

/// `YYYY-MM-DD` -> `M/D/YYYY`. `M/D/YYYY` input passes through; other
/// shapes are kept as given so nothing is lost.
pub fn format_renewal_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() == 3 && parts[0].len() == 4 {
        if let (Ok(y), Ok(m), Ok(d)) = (
            parts[0].parse::<u32>(),
            parts[1].parse::<u32>(),
            parts[2].parse::<u32>(),
        ) {
            if (1..=12).contains(&m) && (1..=31).contains(&d) {
                return Some(format!("{}/{}/{}", m, d, y));
            }
        }
    }
    Some(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_formats() {
        assert_eq!(format_phone("330-555-0199"), "(330) 555-0199");
        assert_eq!(format_phone("1 (330) 555 0199"), "(330) 555-0199");
        assert_eq!(format_phone("555-0199"), "555-0199");
    }

    #[test]
    fn display_name_loses_dialer_suffix() {
        assert_eq!(clean_display_name("ACME TRUCKING Unknown Rep"), "ACME TRUCKING");
    }

    #[test]
    fn contact_falls_back_to_email() {
        assert_eq!(
            derive_contact(Some("1001"), Some("mary_jane.doe@fleet.com")).as_deref(),
            Some("Mary Jane Doe")
        );
        assert_eq!(derive_contact(Some("Bob"), Some("x@y.com")).as_deref(), Some("Bob"));
        assert_eq!(derive_contact(None, None), None);
        assert_eq!(derive_contact(Some(""), Some("not-an-email")), None);
    }

    #[test]
    fn renewal_dates() {
        assert_eq!(format_renewal_date("2025-03-07").as_deref(), Some("3/7/2025"));
        assert_eq!(format_renewal_date("3/7/2025").as_deref(), Some("3/7/2025"));
        assert_eq!(format_renewal_date("  "), None);
    }
}
