//! Text helpers shared by the sheet readers, report writer and prompt builders.

const FOLD_TABLE: &[(&str, char)] = &[
    ("àáảãạăằắẳẵặâầấẩẫậ", 'a'),
    ("ÀÁẢÃẠĂẰẮẲẴẶÂẦẤẨẪẬ", 'A'),
    ("èéẻẽẹêềếểễệ", 'e'),
    ("ÈÉẺẼẸÊỀẾỂỄỆ", 'E'),
    ("ìíỉĩị", 'i'),
    ("ÌÍỈĨỊ", 'I'),
    ("òóỏõọôồốổỗộơờớởỡợ", 'o'),
    ("ÒÓỎÕỌÔỒỐỔỖỘƠỜỚỞỠỢ", 'O'),
    ("ùúủũụưừứửữự", 'u'),
    ("ÙÚỦŨỤƯỪỨỬỮỰ", 'U'),
    ("ỳýỷỹỵ", 'y'),
    ("ỲÝỶỸỴ", 'Y'),
    ("đ", 'd'),
    ("Đ", 'D'),
];

fn fold_char(ch: char) -> Option<char> {
    if ch.is_ascii() {
        return Some(ch);
    }
    // Combining diacritics left over from decomposed input
    if ('\u{0300}'..='\u{036F}').contains(&ch) {
        return None;
    }
    FOLD_TABLE
        .iter()
        .find(|(accented, _)| accented.contains(ch))
        .map(|(_, base)| *base)
        .or(Some(ch))
}

/// Strip Vietnamese diacritics, keeping base letters
pub fn remove_accents(text: &str) -> String {
    text.chars().filter_map(fold_char).collect()
}

/// Comparison key for names that may differ in accents, case or padding
pub fn normalize_key(text: &str) -> String {
    remove_accents(text.trim()).to_lowercase()
}

/// ASCII rendition for output that cannot carry Vietnamese glyphs
pub fn to_ascii(text: &str) -> String {
    remove_accents(text)
        .chars()
        .map(|ch| if ch.is_ascii() { ch } else { '?' })
        .collect()
}

/// Lenient numeric parse: trims, drops thousands-separator commas, rejects non-finite values
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|ch| *ch != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parse a number written with a decimal comma (`"12,5"`)
pub fn parse_decimal_comma(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Integer with thousands separators, e.g. `12,346`
pub fn format_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && rounded != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Remove markdown emphasis markers from generated text
pub fn strip_markdown(text: &str) -> String {
    text.replace('*', "").trim().to_string()
}

/// Clean HTML text by removing tags, decoding common entities and normalizing whitespace
pub fn clean_html_text(text: &str) -> String {
    let mut result = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&nbsp;", " ");

    while let Some(start) = result.find('<') {
        if let Some(end) = result[start..].find('>') {
            result.replace_range(start..(start + end + 1), "");
        } else {
            break;
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap by character count; existing line breaks are kept
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_accents() {
        assert_eq!(remove_accents("Bất động sản"), "Bat dong san");
        assert_eq!(remove_accents("ĐIỆN"), "DIEN");
        assert_eq!(remove_accents("Xây dựng và Vật liệu"), "Xay dung va Vat lieu");
        // decomposed "ế"
        assert_eq!(remove_accents("e\u{0302}\u{0301}"), "e");
    }

    #[test]
    fn test_normalize_key_ignores_case_and_padding() {
        assert_eq!(normalize_key("  Ngân hàng "), normalize_key("NGAN HANG"));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1,500,000"), Some(1_500_000.0));
        assert_eq!(parse_number(" -2.5 "), Some(-2.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_decimal_comma("12,5"), Some(12.5));
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1234567.4), "1,234,567");
        assert_eq!(format_thousands(-2500.0), "-2,500");
        assert_eq!(format_thousands(999.6), "1,000");
    }

    #[test]
    fn test_wrap_and_clean() {
        assert_eq!(wrap_text("một hai ba bốn", 7), vec!["một hai", "ba bốn"]);
        assert_eq!(clean_html_text("<p>Hello&nbsp; <b>world</b></p>"), "Hello world");
        assert_eq!(strip_markdown("**Chủ đề**: nội dung"), "Chủ đề: nội dung");
    }
}
