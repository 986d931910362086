/*!
 * Tests for ISO language code utilities
 */

use srtlingo::language_utils::{get_language_name, language_codes_match, normalize_to_part1_or_part2t, normalize_to_part2t};

/// Test that every code form of a language matches every other
#[test]
fn test_language_codes_match_withAllForms_shouldMatch() {
    for (a, b) in [("fr", "fra"), ("fr", "fre"), ("fra", "fre"), ("de", "ger"), ("zh", "chi")] {
        assert!(language_codes_match(a, b), "{} should match {}", a, b);
    }
}

/// Test that invalid codes never match
#[test]
fn test_language_codes_match_withInvalidCode_shouldReturnFalse() {
    assert!(!language_codes_match("xx", "xx"));
    assert!(!language_codes_match("", "en"));
}

/// Test that codes are case and whitespace insensitive
#[test]
fn test_get_language_name_withPaddedUppercase_shouldResolve() {
    assert_eq!(get_language_name(" EN ").unwrap(), "English");
    assert_eq!(get_language_name("Ja").unwrap(), "Japanese");
}

/// Test normalization to three letters
#[test]
fn test_normalize_to_part2t_shouldConvertBibliographicCodes() {
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert!(normalize_to_part2t("english").is_err());
}

/// Test that languages without a two-letter code keep three letters
#[test]
fn test_normalize_to_part1_or_part2t_withoutPart1_shouldKeepThreeLetters() {
    assert_eq!(normalize_to_part1_or_part2t("spa").unwrap(), "es");
    assert_eq!(normalize_to_part1_or_part2t("yue").unwrap(), "yue");
}
