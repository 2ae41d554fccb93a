// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! UI strings keyed by stable lookup keys.

use std::fmt;
use std::str::FromStr;

pub const GENERATING_DIAGRAM: &str = "md.generating-diagram";
pub const PROBLEM_LABEL: &str = "solution.problem";
pub const EXPLANATION_LABEL: &str = "solution.explanation";
pub const STEP_LABEL: &str = "solution.step";
pub const ANSWER_LABEL: &str = "solution.answer";
pub const AWAITING_ANSWER: &str = "solution.awaiting-answer";
pub const SOURCE_LABEL: &str = "diagram.source";

const EN: &[(&str, &str)] = &[
    (GENERATING_DIAGRAM, "Generating diagram…"),
    (PROBLEM_LABEL, "Problem"),
    (EXPLANATION_LABEL, "Explanation"),
    (STEP_LABEL, "Step"),
    (ANSWER_LABEL, "Answer"),
    (AWAITING_ANSWER, "Working on the answer…"),
    (SOURCE_LABEL, "source"),
];

const ZH: &[(&str, &str)] = &[
    (GENERATING_DIAGRAM, "正在生成图表…"),
    (PROBLEM_LABEL, "题目"),
    (EXPLANATION_LABEL, "解析"),
    (STEP_LABEL, "步骤"),
    (ANSWER_LABEL, "答案"),
    (AWAITING_ANSWER, "正在解答…"),
    (SOURCE_LABEL, "源码"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    Zh,
}

impl Lang {
    /// Picks a language from POSIX locale variables (`LC_ALL` wins over `LANG`).
    pub fn detect(lc_all: Option<&str>, lang: Option<&str>) -> Self {
        let raw = lc_all.filter(|value| !value.is_empty()).or(lang).unwrap_or_default();
        if raw.to_ascii_lowercase().starts_with("zh") {
            Self::Zh
        } else {
            Self::En
        }
    }

    pub fn from_env() -> Self {
        let lc_all = std::env::var("LC_ALL").ok();
        let lang = std::env::var("LANG").ok();
        Self::detect(lc_all.as_deref(), lang.as_deref())
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::En => "en",
            Self::Zh => "zh",
        })
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "zh" => Ok(Self::Zh),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Looks up UI strings. Unknown keys come back as the key itself.
pub trait Localizer {
    fn lookup(&self, key: &str) -> Option<&str>;

    fn text<'a>(&'a self, key: &'a str) -> &'a str {
        self.lookup(key).unwrap_or(key)
    }
}

/// Built-in string tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Catalog {
    lang: Lang,
}

impl Catalog {
    pub fn new(lang: Lang) -> Self {
        Self { lang }
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self.lang {
            Lang::En => EN,
            Lang::Zh => ZH,
        }
    }
}

impl Localizer for Catalog {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.table().iter().find(|(candidate, _)| *candidate == key).map(|(_, text)| *text)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Catalog, Lang, Localizer, EN, GENERATING_DIAGRAM, ZH};

    #[test]
    fn placeholder_text_is_localized() {
        assert_eq!(Catalog::new(Lang::En).text(GENERATING_DIAGRAM), "Generating diagram…");
        assert_eq!(Catalog::new(Lang::Zh).text(GENERATING_DIAGRAM), "正在生成图表…");
    }

    #[test]
    fn unknown_keys_fall_back_to_the_key() {
        assert_eq!(Catalog::default().text("md.unknown"), "md.unknown");
    }

    #[test]
    fn tables_cover_the_same_keys() {
        let en: Vec<&str> = EN.iter().map(|(key, _)| *key).collect();
        let zh: Vec<&str> = ZH.iter().map(|(key, _)| *key).collect();
        assert_eq!(en, zh);
    }

    #[rstest]
    #[case(Some("zh_CN.UTF-8"), Some("en_US.UTF-8"), Lang::Zh)]
    #[case(Some(""), Some("zh_TW"), Lang::Zh)]
    #[case(None, Some("de_DE.UTF-8"), Lang::En)]
    #[case(None, None, Lang::En)]
    fn detects_language_from_locale_variables(
        #[case] lc_all: Option<&str>,
        #[case] lang: Option<&str>,
        #[case] expected: Lang,
    ) {
        assert_eq!(Lang::detect(lc_all, lang), expected);
    }

    #[test]
    fn lang_round_trips_through_its_code() {
        assert_eq!("zh".parse::<Lang>(), Ok(Lang::Zh));
        assert!("fr".parse::<Lang>().is_err());
        assert_eq!(Lang::Zh.to_string(), "zh");
    }
}
