/*!
 * Tests for the markup codec
 */

use srtlingo::translation::formatting::{self, FormatMap, Token};

/// Test that tokens always concatenate back to the input
#[test]
fn test_tokenize_withVariedMarkup_shouldConcatenateToInput() {
    for text in [
        "<i>Hello</i>",
        "<font face=\"Arial\" size=\"20\">Big</font> and small",
        "{\\an8}{\\pos(10,20)}Positioned",
        "Less <than> more",
        "<>not a tag",
        "",
    ] {
        let joined: String = formatting::tokenize(text).iter().map(Token::as_str).collect();
        assert_eq!(joined, text);
    }
}

/// Test that `<>` and bare angle brackets stay text
#[test]
fn test_tokenize_withEmptyBrackets_shouldNotProduceTag() {
    let tokens = formatting::tokenize("<>x");
    assert!(!formatting::has_markup(&tokens));
}

/// Test that closing tags are recognized
#[test]
fn test_token_isClosingTag_shouldOnlyMatchClosingTags() {
    assert!(Token::Tag("</i>".to_string()).is_closing_tag());
    assert!(!Token::Tag("<i>".to_string()).is_closing_tag());
    assert!(!Token::Text("</i>".to_string()).is_closing_tag());
}

/// Test that several tags on one line split a translation by word count
#[test]
fn test_applyTranslation_withThreeSegments_shouldSplitProportionally() {
    let tokens = formatting::tokenize("<b>one two</b> three <i>four</i>");
    let rebuilt = formatting::apply_translation(&tokens, "un deux trois quatre");
    assert_eq!(rebuilt, "<b>un deux</b> trois <i>quatre</i>");
}

/// Test that an unchanged line keeps its original split
#[test]
fn test_applyTranslation_withUnchangedLine_shouldKeepSplit() {
    let tokens = formatting::tokenize("<b>Dr.</b> Who\n<i>Hello</i> there");
    let rebuilt = formatting::apply_translation(&tokens, "Dr. Who\nBonjour toi");
    assert_eq!(rebuilt, "<b>Dr.</b> Who\n<i>Bonjour</i> toi");
}

/// Test that a positioning tag stays in front of the translation
#[test]
fn test_applyTranslation_withPositionTag_shouldKeepPrefix() {
    let tokens = formatting::tokenize("{\\an8}Look up");
    assert_eq!(formatting::apply_translation(&tokens, "Regarde en haut"), "{\\an8}Regarde en haut");
}

/// Test that an empty translation of a markup-only cue leaves it untouched
#[test]
fn test_applyTranslation_withMarkupOnlyAndEmptyTranslation_shouldKeepTags() {
    let tokens = formatting::tokenize("<i></i>");
    assert_eq!(formatting::apply_translation(&tokens, ""), "<i></i>");
}

/// Test that untranslated text restores to the input, for both forms of clean text
#[test]
fn test_applyTranslation_withUntranslatedText_shouldReproduceInput() {
    for text in [
        "<i>Hello</i>",
        "Hello\n<i></i>\nWorld",
        "{\\an8}\nTop line",
        "<b>Top</b>\n{\\an8}\n<i>Bottom</i>",
        "<i>Hello</i>\n<i>  </i>\n<i>World</i>",
        "<i>\nHello</i>",
        "<i>Hello\n</i>",
        "<i>\nOne</i> two\n<b>three\n</b>",
        "<font color=\"red\"> padded </font> <b>text</b>",
        "<b></b>\n<i></i>",
    ] {
        let tokens = formatting::tokenize(text);
        assert_eq!(formatting::apply_translation(&tokens, &formatting::extract_clean_text(&tokens)), text);
        assert_eq!(formatting::apply_translation(&tokens, &formatting::translatable_text(&tokens)), text);
    }
}

/// Test that the text sent for translation never holds a blank line
#[test]
fn test_translatableText_withBlankLines_shouldDropThem() {
    let tokens = formatting::tokenize("<b>Top</b>\n{\\an8}\n<i>  </i>\n<i>Bottom</i>");
    assert_eq!(formatting::translatable_text(&tokens), "Top\nBottom");
}

/// Test that translated lines skip source lines holding only markup
#[test]
fn test_applyTranslation_withMarkupOnlyLine_shouldFillTextLines() {
    let tokens = formatting::tokenize("<b>Top</b>\n{\\an8}\n<i>Bottom</i>");
    assert_eq!(
        formatting::apply_translation(&tokens, "Haut\nBas"),
        "<b>Haut</b>\n{\\an8}\n<i>Bas</i>"
    );
}

/// Test that a single slot keeps the newline separating it from a tag line
#[test]
fn test_applyTranslation_withTagOnFirstLine_shouldKeepLineBreak() {
    let tokens = formatting::tokenize("{\\an8}\nTop line");
    assert_eq!(formatting::apply_translation(&tokens, "Ligne du haut"), "{\\an8}\nLigne du haut");
}

/// Test the serialized shape of a format map
#[test]
fn test_formatMap_toJson_shouldUseKindValuePairs() {
    let mut map = FormatMap::new();
    map.insert(2, formatting::tokenize("<i>x</i>"));

    let json: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
    assert_eq!(json["2"][0]["kind"], "tag");
    assert_eq!(json["2"][0]["value"], "<i>");
    assert_eq!(json["2"][1]["kind"], "text");
}

/// Test that a malformed format map is rejected
#[test]
fn test_formatMap_fromJson_withGarbage_shouldFail() {
    assert!(FormatMap::from_json("{\"1\": 5}").is_err());
    assert!(FormatMap::from_json("not json").is_err());
}
