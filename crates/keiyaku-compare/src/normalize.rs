// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text normalization: turns raw extracted text into comparable lines.
//
// Layout differences between a scan and a typeset original (line wrapping,
// spacing, full-width digits) are erased, then the text is re-cut into one
// sentence or article heading per line.

use std::sync::LazyLock;

use regex::Regex;

/// Page headers left by extraction, e.g. `--- Page 3 ---` or `--- ページ 3 ---`.
static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-+\s*(?:Page|ページ)\s*\d+\s*-+").expect("page marker pattern is valid")
});

/// Article headings such as `第12条(秘密保持)`, after width folding.
static ARTICLE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"第\d+条[（(][^）)]*[）)]").expect("article heading pattern is valid")
});

const SENTENCE_END: char = '。';

/// Normalize raw text into lines, running every step in order.
///
/// No characters are introduced except by [`fold_width`].
pub fn normalize(text: &str) -> Vec<String> {
    let text = strip_page_markers(text);
    let text = remove_whitespace(&text);
    let text = fold_width(&text);
    split_sentences(&text)
        .iter()
        .flat_map(|sentence| split_headings(sentence))
        .collect()
}

/// Remove page header artifacts.
pub fn strip_page_markers(text: &str) -> String {
    PAGE_MARKER.replace_all(text, "").into_owned()
}

/// Drop ideographic spaces, tabs, ASCII spaces and line breaks.
pub fn remove_whitespace(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{3000}' | '\t' | ' ' | '\n' | '\r'))
        .collect()
}

/// Fold full-width digits and Latin letters to ASCII, and `．，：；（）` to
/// `.,:;()`. Everything else is left alone.
pub fn fold_width(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        '０'..='９' | 'Ａ'..='Ｚ' | 'ａ'..='ｚ' => {
            char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
        }
        '．' => '.',
        '，' => ',',
        '：' => ':',
        '；' => ';',
        '（' => '(',
        '）' => ')',
        _ => c,
    }
}

/// Split after every `。`, keeping it on the sentence it ends. Fragments are
/// trimmed; a trailing fragment without `。` is kept only if non-blank.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split_inclusive(SENTENCE_END)
        .filter_map(|piece| {
            let trimmed = piece.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

/// Cut article headings out onto their own lines. Fragments are trimmed and
/// empty ones dropped.
pub fn split_headings(sentence: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut push = |fragment: &str| {
        let trimmed = fragment.trim();
        if !trimmed.is_empty() {
            fragments.push(trimmed.to_string());
        }
    };

    let mut last = 0;
    for heading in ARTICLE_HEADING.find_iter(sentence) {
        push(&sentence[last..heading.start()]);
        push(heading.as_str());
        last = heading.end();
    }
    push(&sentence[last..]);
    fragments
}
