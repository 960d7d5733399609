//! Static engine option table keyed by language family and processing mode

use std::collections::BTreeMap;

use crate::config::OcrMode;

/// LSTM-only engine
const ENGINE_MODE_LSTM: u8 = 1;
const DEFAULT_DPI: u32 = 300;

/// Single uniform block of text
const PSM_SINGLE_BLOCK: u8 = 6;
/// Single column of variable-size text
const PSM_SINGLE_COLUMN: u8 = 4;
/// Fully automatic segmentation
const PSM_AUTO: u8 = 3;

const WHITELIST_VAR: &str = "tessedit_char_whitelist";

const DIGITS: &str = "0123456789";

/// Characters expected on Traditional Chinese shift tables and forms
const FORM_WHITELIST: &str = concat!(
    "0123456789",
    "一二三四五六七八九十零百千萬億日月火水木金土年",
    "店經理助主任部課長專員星期週上下午早中晚班休息值假請",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz",
    "小大老少新舊東西南北中前後左右內外高低好壞",
    "王李張陳劉黃周吳徐孫朱胡林何郭高馬羅鄭梁謝韓唐馮董許蕭程曾彭呂蘇盧袁丁魏薛葉閻余潘杜戴夏鍾汪",
    "田任姜范方石姚譚廖鄒熊金陸郝孔白崔康毛邱秦江史顧侯邵孟龍萬段雷錢湯尹黎易常武喬賀賴龔文",
    "：:-－—_()（）[]【】/\\.,，。！？!?@#$%^&*+=<>",
);

/// Options handed to the recognition engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    /// Page segmentation mode
    pub page_seg_mode: u8,
    /// OCR engine mode
    pub engine_mode: u8,
    /// Resolution hint
    pub dpi: u32,
    /// Remaining engine variables, by name
    pub variables: BTreeMap<String, String>,
}

impl RecognitionOptions {
    fn base(page_seg_mode: u8) -> Self {
        let mut variables = BTreeMap::new();
        variables.insert("preserve_interword_spaces".to_string(), "1".to_string());
        Self {
            page_seg_mode,
            engine_mode: ENGINE_MODE_LSTM,
            dpi: DEFAULT_DPI,
            variables,
        }
    }

    fn set(mut self, name: &str, value: &str) -> Self {
        self.variables.insert(name.to_string(), value.to_string());
        self
    }

    /// Characters the engine is restricted to, if any
    pub fn whitelist(&self) -> Option<&str> {
        self.variables.get(WHITELIST_VAR).map(String::as_str)
    }

    /// Merge user-supplied variables over the table entries
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (name, value) in overrides {
            self.variables.insert(name.clone(), value.clone());
        }
        self
    }
}

fn is_chinese(language: &str) -> bool {
    language.contains("chi_")
}

/// Look up the engine options for a language and mode
pub fn engine_options(language: &str, mode: OcrMode) -> RecognitionOptions {
    match mode {
        OcrMode::Form => RecognitionOptions::base(PSM_SINGLE_BLOCK)
            .set("textord_min_linesize", "1.25")
            .set("textord_space_size_is_horizontal", "0")
            .set("textord_tabfind_find_tables", "1")
            .set("textord_tablefind_good_margins", "1")
            .set("edges_max_children_per_outline", "40")
            .set("tessedit_reject_mode", "0")
            .set("tessedit_zero_rejection", "1")
            .set(WHITELIST_VAR, FORM_WHITELIST),
        OcrMode::DateTime => RecognitionOptions::base(PSM_SINGLE_BLOCK)
            .set(WHITELIST_VAR, DIGITS)
            .set("tessedit_reject_mode", "0")
            .set("tessedit_zero_rejection", "1"),
        OcrMode::Text => {
            let chinese = is_chinese(language);
            RecognitionOptions::base(if chinese { PSM_SINGLE_COLUMN } else { PSM_AUTO })
                .set("textord_min_linesize", if chinese { "1.25" } else { "2.5" })
                .set(
                    "textord_space_size_is_horizontal",
                    if chinese { "0" } else { "1" },
                )
        }
    }
}
