//! DNS-1035 sanitization for names used as Kubernetes object names or labels.
//!
//! Applied at every boundary where a user-chosen name becomes a DNS label:
//! derived Service names, the `app` selector label, and any user-facing text
//! that echoes that name back.

const MAX_LABEL_LEN: usize = 63;

/// Normalize `input` into a valid DNS-1035 label: `[a-z]([-a-z0-9]*[a-z0-9])?`,
/// at most 63 characters. Idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            'a'..='z' | '0'..='9' | '-' => out.push(c),
            'A'..='Z' => out.push(c.to_ascii_lowercase()),
            '.' | '_' => out.push('-'),
            _ => out.push('-'),
        }
    }

    // Collapse runs of '-' introduced by substitution.
    let mut collapsed = String::with_capacity(out.len());
    let mut last_dash = false;
    for c in out.chars() {
        if c == '-' {
            if !last_dash {
                collapsed.push(c);
            }
            last_dash = true;
        } else {
            collapsed.push(c);
            last_dash = false;
        }
    }

    let trimmed = collapsed.trim_matches('-');
    let mut result: String = trimmed.chars().take(MAX_LABEL_LEN).collect();
    result = result.trim_end_matches('-').to_string();

    // Must start with an alphabetic character.
    while result.starts_with(|c: char| !c.is_ascii_lowercase()) {
        result.remove(0);
    }

    if result.is_empty() {
        result.push('x');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dots_become_dashes() {
        assert_eq!(sanitize("llama-3.1-8b"), "llama-3-1-8b");
    }

    #[test]
    fn already_valid_name_is_unchanged() {
        assert_eq!(sanitize("tinyllama"), "tinyllama");
    }

    #[test]
    fn uppercase_is_lowercased() {
        assert_eq!(sanitize("MyModel"), "mymodel");
    }

    #[test]
    fn truncates_to_63_chars() {
        let long = "a".repeat(100);
        let result = sanitize(&long);
        assert!(result.len() <= 63);
    }

    #[test]
    fn idempotent() {
        for input in ["llama-3.1-8b", "MyModel_Name", "123-leading-digit", "---"] {
            let once = sanitize(input);
            let twice = sanitize(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn matches_dns1035_shape() {
        let re_like = |s: &str| -> bool {
            let mut chars = s.chars();
            match chars.next() {
                Some(c) if c.is_ascii_lowercase() => {}
                _ => return false,
            }
            let rest: Vec<char> = chars.collect();
            if rest.is_empty() {
                return true;
            }
            if let Some(last) = rest.last() {
                if !(last.is_ascii_lowercase() || last.is_ascii_digit()) {
                    return false;
                }
            }
            rest.iter().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        };

        for input in ["llama-3.1-8b", "123start", "___", "", "A.B.C", "trailing-"] {
            let result = sanitize(input);
            assert!(result.len() <= 63);
            assert!(re_like(&result), "{input:?} -> {result:?} is not DNS-1035 shaped");
        }
    }
}
