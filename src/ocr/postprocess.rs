//! Mode-specific cleanup of recognized text
//!
//! Fixes the substitutions Tesseract typically makes on shift tables,
//! dates and circled digits. Line breaks and tabs produced by region fusion
//! are kept; only runs of spaces are collapsed.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::OcrMode;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {:?}: {}", pattern, e))
}

static HORIZONTAL_SPACE: Lazy<Regex> =
    Lazy::new(|| re(r"[ \u{00A0}\u{200B}\u{FEFF}\r\x0B\x0C]+"));
static CLOCK_TIME: Lazy<Regex> = Lazy::new(|| re(r"(\d{1,2}) *[：:] *(\d{2})"));
static MERIDIEM_TIME: Lazy<Regex> =
    Lazy::new(|| re(r"(上午|下午) *(\d{1,2}) *[：:] *(\d{2})"));
static FORM_WEEKDAY: Lazy<Regex> =
    Lazy::new(|| re(r"(星期|週) *(一|二|三|四|五|六|日)"));
static DATE_WEEKDAY: Lazy<Regex> =
    Lazy::new(|| re(r"(星期|週) *(一|二|三|四|五|六|七|日|天)"));
static SHIFT: Lazy<Regex> = Lazy::new(|| re(r"(早|中|晚|夜) *班"));
static SURNAME_WANG: Lazy<Regex> = Lazy::new(|| re(r"小 *王"));
static SURNAME_LI: Lazy<Regex> = Lazy::new(|| re(r"李 *(先生|小姐)"));
static FORM_NOISE: Lazy<Regex> =
    Lazy::new(|| re(r#"[`~!@#$%^&*()+=\[\]{}\\|;'"<>?]"#));
static DATE_NOISE: Lazy<Regex> = Lazy::new(|| re(r#"[`~!#$%^&*+=\[\]{}\\|;'"<>?]"#));
static BRACKETS: Lazy<Regex> = Lazy::new(|| re(r"[()（）\[\]【】]"));
static SPACED_DIGITS: Lazy<Regex> = Lazy::new(|| re(r"(\d) +(\d)"));
static CJK_DATE: Lazy<Regex> =
    Lazy::new(|| re(r"(\d{1,2}) *年 *(\d{1,2}) *月 *(\d{1,2}) *日"));
static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| re(r"(\d{1,2}) */ *(\d{1,2}) */ *(\d{2,4})"));

/// Clean up recognized text for the given mode
pub fn refine_text(text: &str, mode: OcrMode) -> String {
    let mut out = normalize_layout(text);
    out = common_fixes(&out);

    out = match mode {
        OcrMode::Form => form_fixes(&out),
        OcrMode::DateTime => datetime_fixes(&out),
        OcrMode::Text => out,
    };

    tidy_lines(&out)
}

/// Unify separators and collapse horizontal whitespace, dropping blank lines
fn normalize_layout(text: &str) -> String {
    let text = text.replace('｜', "|");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    tidy_lines(&text)
}

fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_matches(|c| c == ' ' || c == '\t'))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn map_chars(text: &str, f: impl Fn(char) -> Option<char>) -> String {
    text.chars().map(|c| f(c).unwrap_or(c)).collect()
}

/// Corrections applied in every mode
fn common_fixes(text: &str) -> String {
    let text = map_chars(text, |c| match c {
        '０'..='９' => char::from_u32(c as u32 - 0xFEE0),
        '〇' | '○' => Some('0'),
        _ => None,
    });
    CLOCK_TIME.replace_all(&text, "${1}:${2}").into_owned()
}

fn form_fixes(text: &str) -> String {
    let text = map_chars(text, |c| match c {
        'l' | 'I' => Some('1'),
        'o' | 'O' => Some('0'),
        _ => None,
    });
    let text = FORM_WEEKDAY.replace_all(&text, "星期${2}");
    let text = MERIDIEM_TIME.replace_all(&text, "${1}${2}:${3}");
    let text = SHIFT.replace_all(&text, "${1}班");
    let text = SURNAME_WANG.replace_all(&text, "小王");
    let text = SURNAME_LI.replace_all(&text, "李${1}");
    let text = FORM_NOISE.replace_all(&text, "");
    collapse_spaces(&text)
}

fn datetime_fixes(text: &str) -> String {
    let text = map_chars(text, |c| match c {
        'l' | 'I' => Some('1'),
        'o' | 'O' | '@' => Some('0'),
        'S' => Some('5'),
        'G' => Some('6'),
        'B' => Some('8'),
        'g' => Some('9'),
        _ => None,
    });
    let text = BRACKETS.replace_all(&text, "").into_owned();

    let mut text = text;
    loop {
        let joined = SPACED_DIGITS.replace_all(&text, "${1}${2}").into_owned();
        if joined == text {
            break;
        }
        text = joined;
    }

    let text = CLOCK_TIME.replace_all(&text, "${1}:${2}");
    let text = MERIDIEM_TIME.replace_all(&text, "${1}${2}:${3}");
    let text = CJK_DATE.replace_all(&text, "${1}年${2}月${3}日");
    let text = SLASH_DATE.replace_all(&text, "${1}/${2}/${3}");
    let text = DATE_WEEKDAY.replace_all(&text, "星期${2}");
    let text = DATE_NOISE.replace_all(&text, "");
    collapse_spaces(&text)
}

fn collapse_spaces(text: &str) -> String {
    HORIZONTAL_SPACE.replace_all(text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_mode_common_fixes() {
        let refined = refine_text("  Meeting at １０ : 30  \n\n\tRoom ○1 Hall  ", OcrMode::Text);
        assert_eq!(refined, "Meeting at 10:30\nRoom 01 Hall");
    }

    #[test]
    fn test_layout_keeps_region_structure() {
        let refined = refine_text("A\tB\n\n C \u{00A0} D", OcrMode::Text);
        assert_eq!(refined, "A\tB\nC D");
    }

    #[test]
    fn test_form_mode() {
        let refined = refine_text("週 一 早 班 小 王 (上午 9 : 00)", OcrMode::Form);
        assert_eq!(refined, "星期一 早班 小王 上午9:00");
    }

    #[test]
    fn test_form_mode_fixes_letter_digits() {
        assert_eq!(refine_text("2O1O｜", OcrMode::Form), "2010");
    }

    #[test]
    fn test_datetime_mode() {
        let refined = refine_text("(1 2) / O5 / 2O2S", OcrMode::DateTime);
        assert_eq!(refined, "12/05/2025");
    }

    #[test]
    fn test_datetime_cjk_date_and_weekday() {
        let refined = refine_text("1 年 2 月 3 日 週 天", OcrMode::DateTime);
        assert_eq!(refined, "1年2月3日 星期天");
    }

    #[test]
    fn test_datetime_joins_digit_runs() {
        assert_eq!(refine_text("1 2 3 4", OcrMode::DateTime), "1234");
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(refine_text(" \n \t\n", OcrMode::Text), "");
    }
}
