//! Name normalization shared by the loader and the query engine.

/// Normalize a Digimon name for lookup.
///
/// Leading/trailing whitespace is dropped (Unicode-aware, so full-width
/// U+3000 spaces count), interior whitespace runs collapse to one ASCII space,
/// and the result is lower-cased.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_name("  Agumon "), "agumon");
        assert_eq!(normalize_name("AGUMON"), "agumon");
    }

    #[test]
    fn normalize_collapses_interior_whitespace() {
        assert_eq!(normalize_name("Geo   Greymon"), "geo greymon");
        assert_eq!(normalize_name("Geo\tGreymon"), "geo greymon");
    }

    #[test]
    fn normalize_handles_full_width_space() {
        assert_eq!(normalize_name("\u{3000}Patamon\u{3000}"), "patamon");
    }

    #[test]
    fn normalize_blank_is_empty() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
    }
}
