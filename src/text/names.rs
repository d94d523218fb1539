use deunicode::deunicode;

/// Canonicalizes an author name for comparison: diacritics folded, hyphens
/// spaced, dots dropped, lowercased, and `Last, First` flipped to
/// `first last` when the comma form is unambiguous.
pub fn normalize_name(name: &str) -> String {
    let folded = deunicode(name.trim())
        .to_lowercase()
        .replace('-', " ")
        .replace('.', "");
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.matches(',').count() == 1 {
        if let Some((last, first)) = collapsed.split_once(',') {
            let (last, first) = (last.trim(), first.trim());
            if !last.is_empty() && !first.is_empty() {
                return format!("{} {}", first, last);
            }
        }
    }
    collapsed
}

/// Reduces a normalized name to `<first initial> <last name>`, the form used
/// when matching against researcher lists that only carry initials.
pub fn initial_form(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.len() >= 2 {
        let initial: String = parts[0].chars().take(1).collect();
        format!("{} {}", initial, parts[parts.len() - 1])
    } else {
        name.to_string()
    }
}
