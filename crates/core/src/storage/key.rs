//! Object key construction and case-recovery candidates.

/// Extensions eligible for case reconstruction in the serve fallback.
pub const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".png", ".gif"];

/// Join key segments with `/`, dropping empty segments and stray slashes.
///
/// The result never starts or ends with a slash.
#[must_use]
pub fn join_key(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Ordered candidate keys for a lookup that missed on the exact key.
///
/// The first candidate is always `key` itself. When the final segment ends in
/// one of [`IMAGE_EXTENSIONS`], the title-cased name follows, then the same
/// with an upper-cased extension. Directory segments are never altered.
#[must_use]
pub fn case_variants(key: &str) -> Vec<String> {
    let mut variants = vec![key.to_string()];

    let (dir, name) = key.rsplit_once('/').unwrap_or(("", key));
    let lower = name.to_ascii_lowercase();
    let Some(ext) = IMAGE_EXTENSIONS.iter().find(|ext| lower.ends_with(*ext)) else {
        return variants;
    };

    let stem = title_case(&name[..name.len() - ext.len()]);
    for candidate in [
        format!("{stem}{ext}"),
        format!("{stem}{}", ext.to_ascii_uppercase()),
    ] {
        let candidate = join_key(&[dir, candidate.as_str()]);
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

/// Upper-case the first letter of every word, words split on `-`, `_` and `/`.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_boundary = true;
    for c in s.chars() {
        if at_boundary {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_boundary = matches!(c, '-' | '_' | '/');
    }
    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&["", "photo.jpg"], "photo.jpg")]
    #[case(&["content/images/", "/2024/05", "photo.jpg"], "content/images/2024/05/photo.jpg")]
    #[case(&["/prefix", "", "a.png"], "prefix/a.png")]
    #[case(&["", ""], "")]
    fn test_join_key(#[case] parts: &[&str], #[case] expected: &str) {
        assert_eq!(join_key(parts), expected);
    }

    #[test]
    fn test_case_variants_for_image() {
        assert_eq!(
            case_variants("content/images/my-holiday_photo.jpg"),
            vec![
                "content/images/my-holiday_photo.jpg",
                "content/images/My-Holiday_Photo.jpg",
                "content/images/My-Holiday_Photo.JPG",
            ]
        );
    }

    #[test]
    fn test_case_variants_ignore_non_images() {
        assert_eq!(case_variants("docs/report.pdf"), vec!["docs/report.pdf"]);
    }

    #[test]
    fn test_case_variants_dedup_already_titled() {
        assert_eq!(case_variants("Photo.JPG"), vec!["Photo.JPG", "Photo.jpg"]);
    }

    #[test]
    fn test_case_variants_without_directory() {
        assert_eq!(
            case_variants("a-b.gif"),
            vec!["a-b.gif", "A-B.gif", "A-B.GIF"]
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // Property: Joined keys never carry a leading or trailing slash
    proptest! {
        #[test]
        fn prop_join_key_has_no_edge_slashes(
            parts in proptest::collection::vec("[a-z/]{0,8}", 0..5),
        ) {
            let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
            let key = join_key(&refs);
            prop_assert!(!key.starts_with('/'));
            prop_assert!(!key.ends_with('/'));
        }
    }

    // Property: Variants start with the key itself and only differ by case
    proptest! {
        #[test]
        fn prop_case_variants_preserve_key_modulo_case(
            dir in "[a-z0-9]{1,8}",
            stem in "[a-z0-9_-]{1,12}",
            ext in prop::sample::select(vec![".jpg", ".png", ".gif", ".webp"]),
        ) {
            let key = format!("{dir}/{stem}{ext}");
            let variants = case_variants(&key);

            prop_assert_eq!(&variants[0], &key);
            for variant in &variants {
                prop_assert!(variant.eq_ignore_ascii_case(&key));
                let expected_prefix = format!("{}/", dir);
                prop_assert!(variant.starts_with(&expected_prefix));
            }
        }
    }
}
