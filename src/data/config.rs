//! Typed settings stored in the config file.
//!
//! Every recognized key is listed in [SettingKey]. Keys missing from the file fall back to
//! [SettingKey::default_value].

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::CodeTimeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    TitleColor,
    TotalTimeColor,
    ProgressBackgroundColor,
    ProgressForegroundColor,
    ActivityTitleColor,
    ActivityTimeColor,
    WatermarkColor,
    Image,
    UserImage,
    Activities,
    Fonts,
    Username,
}

impl SettingKey {
    pub const ALL: [SettingKey; 12] = [
        SettingKey::TitleColor,
        SettingKey::TotalTimeColor,
        SettingKey::ProgressBackgroundColor,
        SettingKey::ProgressForegroundColor,
        SettingKey::ActivityTitleColor,
        SettingKey::ActivityTimeColor,
        SettingKey::WatermarkColor,
        SettingKey::Image,
        SettingKey::UserImage,
        SettingKey::Activities,
        SettingKey::Fonts,
        SettingKey::Username,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::TitleColor => "title_color",
            SettingKey::TotalTimeColor => "total_time_color",
            SettingKey::ProgressBackgroundColor => "progress_background_color",
            SettingKey::ProgressForegroundColor => "progress_foreground_color",
            SettingKey::ActivityTitleColor => "activity_title_color",
            SettingKey::ActivityTimeColor => "activity_time_color",
            SettingKey::WatermarkColor => "watermark_color",
            SettingKey::Image => "image",
            SettingKey::UserImage => "user_image",
            SettingKey::Activities => "activities",
            SettingKey::Fonts => "fonts",
            SettingKey::Username => "username",
        }
    }

    /// Value used whenever the config doesn't specify the key.
    pub fn default_value(&self) -> SettingValue {
        let text = |v: &str| SettingValue::Text(v.into());
        match self {
            SettingKey::TitleColor => text("#FFFFFF"),
            SettingKey::TotalTimeColor => text("#FFFFFF"),
            SettingKey::ProgressBackgroundColor => text("#3C3F41"),
            SettingKey::ProgressForegroundColor => text("#4A88C7"),
            SettingKey::ActivityTitleColor => text("#FFFFFF"),
            SettingKey::ActivityTimeColor => text("#A9B7C6"),
            SettingKey::WatermarkColor => text("#808080"),
            SettingKey::Image => text("assets/background.png"),
            SettingKey::UserImage => text("assets/user.png"),
            SettingKey::Activities => SettingValue::List(vec![]),
            SettingKey::Fonts => SettingValue::Map(BTreeMap::from([
                ("bold".into(), "assets/fonts/OpenSans-Bold.ttf".into()),
                (
                    "extra_bold".into(),
                    "assets/fonts/OpenSans-ExtraBold.ttf".into(),
                ),
                (
                    "semi_bold".into(),
                    "assets/fonts/OpenSans-SemiBold.ttf".into(),
                ),
            ])),
            SettingKey::Username => text(""),
        }
    }

    fn accepts(&self, value: &SettingValue) -> bool {
        matches!(
            (self, value),
            (SettingKey::Activities, SettingValue::List(_))
                | (SettingKey::Fonts, SettingValue::Map(_))
                | (
                    SettingKey::TitleColor
                        | SettingKey::TotalTimeColor
                        | SettingKey::ProgressBackgroundColor
                        | SettingKey::ProgressForegroundColor
                        | SettingKey::ActivityTitleColor
                        | SettingKey::ActivityTimeColor
                        | SettingKey::WatermarkColor
                        | SettingKey::Image
                        | SettingKey::UserImage
                        | SettingKey::Username,
                    SettingValue::Text(_)
                )
        )
    }
}

impl Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = CodeTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| CodeTimeError::DefaultSettingNotFound { name: s.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl SettingValue {
    /// Json arrays and objects are parsed as such. Everything else is taken as plain text.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            if let Ok(v) = serde_json::from_str(value) {
                return v;
            }
        }
        SettingValue::Text(value.into())
    }
}

impl Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValue::Text(v) => write!(f, "{v}"),
            SettingValue::List(v) => write!(f, "{}", v.join(", ")),
            SettingValue::Map(v) => {
                let entries = v
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect::<Vec<_>>();
                write!(f, "{}", entries.join(", "))
            }
        }
    }
}

/// Contents of the config file. Absent keys aren't written back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_foreground_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_title_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_time_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonts: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Config {
    /// Config with every key set to its default.
    pub fn defaults() -> Self {
        let mut config = Config::default();
        for key in SettingKey::ALL {
            config
                .set(key, key.default_value())
                .expect("Defaults always match their keys");
        }
        config
    }

    pub fn is_empty(&self) -> bool {
        SettingKey::ALL.iter().all(|key| self.get(*key).is_none())
    }

    pub fn get(&self, key: SettingKey) -> Option<SettingValue> {
        let text = |v: &Option<String>| v.clone().map(SettingValue::Text);
        match key {
            SettingKey::TitleColor => text(&self.title_color),
            SettingKey::TotalTimeColor => text(&self.total_time_color),
            SettingKey::ProgressBackgroundColor => text(&self.progress_background_color),
            SettingKey::ProgressForegroundColor => text(&self.progress_foreground_color),
            SettingKey::ActivityTitleColor => text(&self.activity_title_color),
            SettingKey::ActivityTimeColor => text(&self.activity_time_color),
            SettingKey::WatermarkColor => text(&self.watermark_color),
            SettingKey::Image => text(&self.image),
            SettingKey::UserImage => text(&self.user_image),
            SettingKey::Activities => self.activities.clone().map(SettingValue::List),
            SettingKey::Fonts => self.fonts.clone().map(SettingValue::Map),
            SettingKey::Username => text(&self.username),
        }
    }

    /// Stores `value` under `key`, rejecting values of the wrong shape.
    pub fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<(), CodeTimeError> {
        if !key.accepts(&value) {
            return Err(CodeTimeError::InvalidSettingValue { key: key.as_str() });
        }
        match value {
            SettingValue::List(v) => self.activities = Some(v),
            SettingValue::Map(v) => self.fonts = Some(v),
            SettingValue::Text(v) => *self.text_field(key) = Some(v),
        }
        Ok(())
    }

    fn text_field(&mut self, key: SettingKey) -> &mut Option<String> {
        match key {
            SettingKey::TitleColor => &mut self.title_color,
            SettingKey::TotalTimeColor => &mut self.total_time_color,
            SettingKey::ProgressBackgroundColor => &mut self.progress_background_color,
            SettingKey::ProgressForegroundColor => &mut self.progress_foreground_color,
            SettingKey::ActivityTitleColor => &mut self.activity_title_color,
            SettingKey::ActivityTimeColor => &mut self.activity_time_color,
            SettingKey::WatermarkColor => &mut self.watermark_color,
            SettingKey::Image => &mut self.image,
            SettingKey::UserImage => &mut self.user_image,
            SettingKey::Username => &mut self.username,
            SettingKey::Activities | SettingKey::Fonts => {
                unreachable!("{key} isn't a text setting")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn key_names_round_trip() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().unwrap(), key);
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = "background_music".parse::<SettingKey>();
        assert!(matches!(
            result,
            Err(CodeTimeError::DefaultSettingNotFound { name }) if name == "background_music"
        ));
    }

    #[test]
    fn defaults_fill_every_key() {
        let config = Config::defaults();
        assert!(!config.is_empty());
        for key in SettingKey::ALL {
            assert_eq!(config.get(key), Some(key.default_value()));
        }
    }

    #[test]
    fn set_checks_value_shape() {
        let mut config = Config::default();
        let result = config.set(SettingKey::Activities, SettingValue::Text("Vim".into()));
        assert!(matches!(
            result,
            Err(CodeTimeError::InvalidSettingValue { key: "activities" })
        ));
        assert!(config.is_empty());

        config
            .set(SettingKey::Username, SettingValue::Text("sam".into()))
            .unwrap();
        assert_eq!(config.username.as_deref(), Some("sam"));
    }

    #[test]
    fn absent_keys_are_not_serialized() -> Result<()> {
        let config = Config {
            activities: Some(vec!["PyCharm".into()]),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&config)?, r#"{"activities":["PyCharm"]}"#);
        Ok(())
    }

    #[test]
    fn parses_setting_values() {
        assert_eq!(
            SettingValue::parse(r#"["Vim", "Code"]"#),
            SettingValue::List(vec!["Vim".into(), "Code".into()])
        );
        assert_eq!(
            SettingValue::parse(r#"{"bold": "a.ttf"}"#),
            SettingValue::Map(BTreeMap::from([("bold".into(), "a.ttf".into())]))
        );
        assert_eq!(
            SettingValue::parse("#123456"),
            SettingValue::Text("#123456".into())
        );
        assert_eq!(SettingValue::parse("[oops"), SettingValue::Text("[oops".into()));
    }
}
