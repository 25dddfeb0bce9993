//! Email address syntax checks

/// Maximum total address length accepted
const MAX_EMAIL_LEN: usize = 254;
/// Maximum local-part length accepted
const MAX_LOCAL_LEN: usize = 64;

/// Syntactic check of an email address
///
/// Accepts `local@domain.tld` where the local part uses the usual unquoted
/// characters and the domain has at least two non-empty labels of letters,
/// digits and hyphens. Quoted local parts and IP-literal domains are rejected.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    is_valid_local_part(local) && is_valid_domain(domain)
}

/// Trim and lowercase an address for use as a lookup key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn is_valid_local_part(local: &str) -> bool {
    if local.is_empty() || local.len() > MAX_LOCAL_LEN {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~.".contains(c))
}

fn is_valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
