const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 512;
const NAME_PADDING: &str = "collection";

/// Derives the vector-collection name for an uploaded file. Lowercases,
/// drops a trailing `.pdf`, maps anything outside `[a-z0-9._-]` to `-`,
/// collapses dash runs, trims `-._` from both ends, then enforces the
/// 3..=512 length bounds. Deterministic: the same filename always yields
/// the same collection.
pub fn derive_collection_name(file_name: &str) -> String {
    let lowered = file_name.to_lowercase();
    let stem = lowered.strip_suffix(".pdf").unwrap_or(&lowered);

    let mut name = String::with_capacity(stem.len());
    let mut previous_dash = false;
    for ch in stem.chars() {
        let mapped = if ch.is_ascii_lowercase()
            || ch.is_ascii_digit()
            || matches!(ch, '.' | '_' | '-')
        {
            ch
        } else {
            '-'
        };

        if mapped == '-' {
            if previous_dash {
                continue;
            }
            previous_dash = true;
        } else {
            previous_dash = false;
        }
        name.push(mapped);
    }

    // Everything left is ASCII, so byte-indexed truncation is safe.
    let mut name = name
        .trim_matches(|c| matches!(c, '-' | '.' | '_'))
        .to_string();

    if name.len() < MIN_NAME_LEN {
        name.push_str(NAME_PADDING);
        name.truncate(MIN_NAME_LEN);
    } else if name.len() > MAX_NAME_LEN {
        name.truncate(MAX_NAME_LEN);
    }

    name
}

#[cfg(test)]
mod tests {
    use super::derive_collection_name;

    #[test]
    fn sanitizes_spaces_and_punctuation() {
        assert_eq!(derive_collection_name("Invoice #1.pdf"), "invoice-1");
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(
            derive_collection_name("Q3 Order (final).PDF"),
            derive_collection_name("Q3 Order (final).PDF")
        );
    }

    #[test]
    fn keeps_allowed_characters() {
        assert_eq!(derive_collection_name("po_2023.v2.pdf"), "po_2023.v2");
    }

    #[test]
    fn collapses_dash_runs_and_trims_edges() {
        assert_eq!(derive_collection_name("--my   order--.pdf"), "my-order");
    }

    #[test]
    fn pads_short_names_to_three_characters() {
        assert_eq!(derive_collection_name("a.pdf"), "aco");
        assert_eq!(derive_collection_name(".pdf"), "col");
    }

    #[test]
    fn truncates_very_long_names() {
        let long = format!("{}.pdf", "x".repeat(600));
        let name = derive_collection_name(&long);
        assert_eq!(name.len(), 512);
    }

    #[test]
    fn output_matches_the_allowed_character_set() {
        let name = derive_collection_name("Fancy Übersicht (v2)!.pdf");
        assert!((3..=512).contains(&name.len()));
        assert!(name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-".contains(c)));
    }
}
