//! Verdict codes carried in the `result` claim.

use serde::{Deserialize, Serialize};

/// Verdict assigned by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Judgement {
    /// Clean traffic
    Ok,
    /// Potentially unwanted traffic
    Junk,
    /// Traffic through a proxy
    Proxy,
    /// Bot traffic
    Bot,
}

impl Judgement {
    /// All verdicts, in code order.
    pub const ALL: [Judgement; 4] = [
        Judgement::Ok,
        Judgement::Junk,
        Judgement::Proxy,
        Judgement::Bot,
    ];

    /// Look up a verdict by its `result` code.
    pub fn from_result(code: i64) -> Option<Self> {
        match code {
            0 => Some(Judgement::Ok),
            3 => Some(Judgement::Junk),
            6 => Some(Judgement::Proxy),
            9 => Some(Judgement::Bot),
            _ => None,
        }
    }

    /// Numeric `result` code.
    pub fn code(&self) -> i64 {
        match self {
            Judgement::Ok => 0,
            Judgement::Junk => 3,
            Judgement::Proxy => 6,
            Judgement::Bot => 9,
        }
    }

    /// Short verdict slug.
    pub fn verdict(&self) -> &'static str {
        match self {
            Judgement::Ok => "ok",
            Judgement::Junk => "junk",
            Judgement::Proxy => "proxy",
            Judgement::Bot => "bot",
        }
    }

    /// Human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Judgement::Ok => "Clean",
            Judgement::Junk => "Potentially unwanted",
            Judgement::Proxy => "Proxy",
            Judgement::Bot => "Bot",
        }
    }

    /// Returns true for anything other than clean traffic.
    pub fn is_suspicious(&self) -> bool {
        !matches!(self, Judgement::Ok)
    }
}
