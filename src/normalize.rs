//! Text normalization for recognized strings.
//!
//! The OCR engine emits text with spurious word-breaks and half-width
//! characters; downstream consumers expect compact full-width text. This
//! module is a pure, total function over strings: no I/O, no failure mode.
//!
//! Steps, applied in order over the whole string:
//! 1. Remove all whitespace (the script has no word-space semantics here).
//! 2. Convert half-width ASCII and half-width katakana to their full-width
//!    forms, composing trailing voiced/semi-voiced sound marks.
//! 3. Strip cosmetic punctuation the engine over-produces: ellipsis,
//!    colon (either width), ideographic full stop, ideographic interpunct.

/// Punctuation stripped from the final output. The colon is listed in both
/// widths because step 2 widens a half-width `:` before stripping runs.
const STRIPPED: &[char] = &['…', ':', '：', '。', '・'];

/// Normalize a raw recognized string into its delivered form.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`. The output
/// contains no whitespace and none of the stripped punctuation marks, and
/// never has more characters than the input.
pub fn normalize(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let widened = to_fullwidth(&compact);
    widened.chars().filter(|c| !STRIPPED.contains(c)).collect()
}

/// Convert half-width ASCII and half-width katakana to full-width,
/// merging trailing U+FF9E/U+FF9F sound marks into composed kana.
fn to_fullwidth(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        // Printable ASCII maps by a fixed offset into the Fullwidth Forms block.
        if ('!'..='~').contains(&c) {
            // Offset arithmetic stays inside the BMP, so the unwrap is total.
            out.push(char::from_u32(c as u32 + 0xFEE0).unwrap_or(c));
            continue;
        }

        let base = match halfwidth_kana_base(c) {
            Some(b) => b,
            None => {
                out.push(c);
                continue;
            }
        };

        match chars.peek() {
            Some('ﾞ') => {
                if let Some(voiced) = voiced_form(base) {
                    chars.next();
                    out.push(voiced);
                    continue;
                }
            }
            Some('ﾟ') => {
                if let Some(semi) = semi_voiced_form(base) {
                    chars.next();
                    out.push(semi);
                    continue;
                }
            }
            _ => {}
        }
        out.push(base);
    }

    out
}

/// Full-width form of a half-width katakana or Japanese punctuation
/// character (U+FF61..=U+FF9F), without sound-mark composition.
fn halfwidth_kana_base(c: char) -> Option<char> {
    let mapped = match c {
        '｡' => '。',
        '｢' => '「',
        '｣' => '」',
        '､' => '、',
        '･' => '・',
        'ｦ' => 'ヲ',
        'ｧ' => 'ァ',
        'ｨ' => 'ィ',
        'ｩ' => 'ゥ',
        'ｪ' => 'ェ',
        'ｫ' => 'ォ',
        'ｬ' => 'ャ',
        'ｭ' => 'ュ',
        'ｮ' => 'ョ',
        'ｯ' => 'ッ',
        'ｰ' => 'ー',
        'ｱ' => 'ア',
        'ｲ' => 'イ',
        'ｳ' => 'ウ',
        'ｴ' => 'エ',
        'ｵ' => 'オ',
        'ｶ' => 'カ',
        'ｷ' => 'キ',
        'ｸ' => 'ク',
        'ｹ' => 'ケ',
        'ｺ' => 'コ',
        'ｻ' => 'サ',
        'ｼ' => 'シ',
        'ｽ' => 'ス',
        'ｾ' => 'セ',
        'ｿ' => 'ソ',
        'ﾀ' => 'タ',
        'ﾁ' => 'チ',
        'ﾂ' => 'ツ',
        'ﾃ' => 'テ',
        'ﾄ' => 'ト',
        'ﾅ' => 'ナ',
        'ﾆ' => 'ニ',
        'ﾇ' => 'ヌ',
        'ﾈ' => 'ネ',
        'ﾉ' => 'ノ',
        'ﾊ' => 'ハ',
        'ﾋ' => 'ヒ',
        'ﾌ' => 'フ',
        'ﾍ' => 'ヘ',
        'ﾎ' => 'ホ',
        'ﾏ' => 'マ',
        'ﾐ' => 'ミ',
        'ﾑ' => 'ム',
        'ﾒ' => 'メ',
        'ﾓ' => 'モ',
        'ﾔ' => 'ヤ',
        'ﾕ' => 'ユ',
        'ﾖ' => 'ヨ',
        'ﾗ' => 'ラ',
        'ﾘ' => 'リ',
        'ﾙ' => 'ル',
        'ﾚ' => 'レ',
        'ﾛ' => 'ロ',
        'ﾜ' => 'ワ',
        'ﾝ' => 'ン',
        'ﾞ' => '゛',
        'ﾟ' => '゜',
        _ => return None,
    };
    Some(mapped)
}

/// Composed form with a dakuten, if one exists for this kana.
fn voiced_form(base: char) -> Option<char> {
    match base {
        // カ行..ト行 and ハ行: the voiced codepoint directly follows the base.
        'カ' | 'キ' | 'ク' | 'ケ' | 'コ' | 'サ' | 'シ' | 'ス' | 'セ' | 'ソ' | 'タ' | 'チ'
        | 'ツ' | 'テ' | 'ト' | 'ハ' | 'ヒ' | 'フ' | 'ヘ' | 'ホ' => {
            char::from_u32(base as u32 + 1)
        }
        'ウ' => Some('ヴ'),
        _ => None,
    }
}

/// Composed form with a handakuten, if one exists for this kana.
fn semi_voiced_form(base: char) -> Option<char> {
    match base {
        'ハ' | 'ヒ' | 'フ' | 'ヘ' | 'ホ' => char::from_u32(base as u32 + 2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_whitespace() {
        assert_eq!(normalize("こん に\tちは\n世 界"), "こんにちは世界");
        // Ideographic space too
        assert_eq!(normalize("あ\u{3000}い"), "あい");
    }

    #[test]
    fn test_strips_cosmetic_punctuation() {
        let out = normalize("こんにちは…:。・世界");
        for c in ['…', ':', '。', '・', '：'] {
            assert!(!out.contains(c), "output still contains {:?}", c);
        }
        assert_eq!(out, "こんにちは世界");
    }

    #[test]
    fn test_ascii_to_fullwidth() {
        assert_eq!(normalize("ABC123"), "ＡＢＣ１２３");
        let out = normalize("ABC 123 xyz!?");
        assert!(out.chars().all(|c| !c.is_ascii()));
        assert_eq!(out, "ＡＢＣ１２３ｘｙｚ！？");
    }

    #[test]
    fn test_halfwidth_kana() {
        assert_eq!(normalize("ﾃｽﾄ"), "テスト");
        // Voiced and semi-voiced composition
        assert_eq!(normalize("ｶﾞｷﾞｳﾞ"), "ガギヴ");
        assert_eq!(normalize("ﾊﾟﾝ"), "パン");
        // Sound mark with nothing to compose stays standalone
        assert_eq!(normalize("ｱﾞ"), "ア゛");
    }

    #[test]
    fn test_idempotent() {
        for input in ["  A ｶﾞ…:。・ z9 ", "こんにちは…:。・世界", "", "ＡＢＣ"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_never_grows() {
        for input in ["a b c", "ｶﾞｷﾞ", "…………", "plain"] {
            assert!(normalize(input).chars().count() <= input.chars().count());
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n"), "");
    }
}
