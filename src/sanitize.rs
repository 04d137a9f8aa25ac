//! Filename sanitisation for untrusted upload names.
//!
//! Browsers send whatever the user's filesystem holds: decomposed Unicode
//! from macOS, full-width punctuation from Japanese IMEs, path separators from
//! drag-and-drop. [`sanitize`] maps all of that onto one safe path component
//! that is also a valid ZIP entry name.

use unicode_normalization::UnicodeNormalization;

/// Maximum sanitized name length in characters, extension included.
pub const MAX_FILENAME_CHARS: usize = 200;

/// Characters that are unsafe on at least one common filesystem.
pub const HOSTILE_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const FALLBACK_NAME: &str = "unnamed";

/// Turn an arbitrary filename into a safe single path component.
///
/// NFKC-normalises, replaces hostile and control characters with `_`, and
/// caps the length at [`MAX_FILENAME_CHARS`] by shortening the stem. Total and
/// idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(name: &str) -> String {
    let replaced: String = name
        .nfkc()
        .map(|c| {
            if HOSTILE_CHARS.contains(&c) || c.is_ascii_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if replaced.is_empty() || replaced.chars().all(|c| c == '.') {
        return FALLBACK_NAME.to_string();
    }

    truncate(&replaced, MAX_FILENAME_CHARS)
}

/// Split `name` into `(stem, extension)`, the extension keeping its dot.
///
/// A leading dot does not start an extension (`.pdf` has stem `.pdf`).
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}

/// Name for the `n`th occurrence of an already-used sanitized name:
/// `report.pdf` → `report-2.pdf`, still within the length cap.
pub fn disambiguate(name: &str, n: usize) -> String {
    let (stem, ext) = split_extension(name);
    let suffix = format!("-{n}");
    let budget = MAX_FILENAME_CHARS.saturating_sub(ext.chars().count() + suffix.chars().count());
    let stem: String = stem.chars().take(budget).collect();
    format!("{stem}{suffix}{ext}")
}

fn truncate(name: &str, max: usize) -> String {
    let total = name.chars().count();
    if total <= max {
        return name.to_string();
    }

    let (stem, ext) = split_extension(name);
    let ext_len = ext.chars().count();
    if ext_len >= max {
        return name.chars().take(max).collect();
    }

    let mut out: String = stem.chars().take(max - ext_len).collect();
    out.push_str(ext);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_hostile_characters() {
        assert_eq!(sanitize(r#"a<b>c:d"e/f\g|h?i*j.pdf"#), "a_b_c_d_e_f_g_h_i_j.pdf");
    }

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(sanitize("report.pdf"), "report.pdf");
        assert_eq!(sanitize("報告書 2024.pdf"), "報告書 2024.pdf");
    }

    #[test]
    fn nfkc_collapses_equivalent_forms() {
        // Decomposed "が" (か + combining dakuten) vs precomposed.
        let decomposed = "\u{304B}\u{3099}.png";
        let composed = "\u{304C}.png";
        assert_eq!(sanitize(decomposed), sanitize(composed));
        // Full-width letters and solidus fold to ASCII, then the slash is replaced.
        assert_eq!(sanitize("ＡＢ／Ｃ.pdf"), "AB_C.pdf");
    }

    #[test]
    fn control_characters_are_replaced() {
        assert_eq!(sanitize("a\0b\nc.pdf"), "a_b_c.pdf");
    }

    #[test]
    fn long_names_keep_extension() {
        let long = format!("{}.pdf", "x".repeat(500));
        let out = sanitize(&long);
        assert_eq!(out.chars().count(), MAX_FILENAME_CHARS);
        assert!(out.ends_with(".pdf"));
        assert!(out.starts_with("xxx"));
    }

    #[test]
    fn long_multibyte_names_count_characters() {
        let long = format!("{}.png", "日".repeat(300));
        let out = sanitize(&long);
        assert_eq!(out.chars().count(), 200);
        assert!(out.ends_with(".png"));
    }

    #[test]
    fn oversized_extension_is_treated_as_stem() {
        let long = format!("a.{}", "b".repeat(300));
        let out = sanitize(&long);
        assert_eq!(out.chars().count(), 200);
        assert!(out.starts_with("a."));
    }

    #[test]
    fn degenerate_names_get_fallback() {
        assert_eq!(sanitize(""), "unnamed");
        assert_eq!(sanitize("."), "unnamed");
        assert_eq!(sanitize(".."), "unnamed");
        assert_eq!(sanitize("/"), "_");
    }

    #[test]
    fn properties_hold_for_mixed_inputs() {
        let inputs = [
            "",
            "..",
            "normal.pdf",
            "../../etc/passwd",
            r"C:\Users\me\doc.PDF",
            "ｆｕｌｌ：ｗｉｄｔｈ.png",
            "e\u{301}te\u{301}.jpg",
            "tab\there.jpeg",
            &"z".repeat(1000),
            &format!("{}.jpeg", "ü".repeat(250)),
            &format!(".{}", "h".repeat(250)),
        ];
        for input in inputs {
            let once = sanitize(input);
            assert!(once.chars().count() <= MAX_FILENAME_CHARS, "too long for {input:?}");
            assert!(
                !once.chars().any(|c| HOSTILE_CHARS.contains(&c)),
                "hostile char left in {once:?}"
            );
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn split_extension_semantics() {
        assert_eq!(split_extension("report.pdf"), ("report", ".pdf"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension(".pdf"), (".pdf", ""));
        assert_eq!(split_extension("README"), ("README", ""));
    }

    #[test]
    fn disambiguate_appends_counter_within_cap() {
        assert_eq!(disambiguate("report.pdf", 2), "report-2.pdf");
        assert_eq!(disambiguate("README", 3), "README-3");

        let full = sanitize(&format!("{}.pdf", "x".repeat(400)));
        let out = disambiguate(&full, 12);
        assert_eq!(out.chars().count(), MAX_FILENAME_CHARS);
        assert!(out.ends_with("-12.pdf"));
    }
}
