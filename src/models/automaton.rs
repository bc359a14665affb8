use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Result};

/// JFLAP 自动机类型（`--type`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AutomatonKind {
    #[default]
    Fa,
    Mealy,
    Moore,
    Dfa,
}

impl AutomatonKind {
    /// JFLAP `<type>` 元素的内容
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomatonKind::Fa => "fa",
            AutomatonKind::Mealy => "mealy",
            AutomatonKind::Moore => "moore",
            AutomatonKind::Dfa => "dfa",
        }
    }

    /// moore / dfa 尚未实现
    pub fn ensure_supported(&self) -> Result<()> {
        match self {
            AutomatonKind::Fa | AutomatonKind::Mealy => Ok(()),
            other => Err(AppError::unimplemented(format!(
                "自动机类型 '{}' 的 JFLAP 输出",
                other.as_str()
            ))),
        }
    }
}

impl fmt::Display for AutomatonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 有限自动机描述（LLM 返回的 `fa` 字段）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FiniteAutomaton {
    #[serde(default)]
    pub alphabet: BTreeSet<String>,
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl FiniteAutomaton {
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// 初始状态（约定恰好一个）
    pub fn initial_state(&self) -> Option<&State> {
        self.states.iter().find(|s| s.initial)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(deserialize_with = "deserialize_int")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub initial: bool,
    #[serde(rename = "final", default)]
    pub is_final: bool,
}

impl State {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            initial: false,
            is_final: false,
        }
    }

    /// 显示名称，缺省为 `q<id>`
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("q{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(deserialize_with = "deserialize_int")]
    pub from: i64,
    #[serde(deserialize_with = "deserialize_int")]
    pub to: i64,
    /// None 或空串都表示 epsilon
    #[serde(default)]
    pub read: Option<String>,
}

impl Transition {
    pub fn new(from: i64, to: i64, read: Option<&str>) -> Self {
        Self {
            from,
            to,
            read: read.map(str::to_string),
        }
    }

    pub fn is_epsilon(&self) -> bool {
        self.read.as_deref().map_or(true, str::is_empty)
    }
}

// LLM 有时把状态编号写成字符串，这里同时接受整数和字符串
fn deserialize_int<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;

    struct IntVisitor;

    impl<'de> Visitor<'de> for IntVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            i64::try_from(value).map_err(E::custom)
        }

        fn visit_f64<E>(self, value: f64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value as i64)
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            let trimmed = value.trim().trim_start_matches(['q', 'Q']);
            trimmed.parse::<i64>().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(IntVisitor)
}
