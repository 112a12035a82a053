use core::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::SCORE_HISTORY_CAP;

/// The six skill dimensions every user is scored on.
///
/// Serialized in the wire spelling (`camelCase`) everywhere: analytics
/// documents, hash fields, prompt output keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Competency {
    QuestionQuality,
    ThinkingDepth,
    Creativity,
    CommunicationClarity,
    ExecutionOrientation,
    Collaboration,
}

impl Competency {
    pub const ALL: [Competency; 6] = [
        Competency::QuestionQuality,
        Competency::ThinkingDepth,
        Competency::Creativity,
        Competency::CommunicationClarity,
        Competency::ExecutionOrientation,
        Competency::Collaboration,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Competency::QuestionQuality => "questionQuality",
            Competency::ThinkingDepth => "thinkingDepth",
            Competency::Creativity => "creativity",
            Competency::CommunicationClarity => "communicationClarity",
            Competency::ExecutionOrientation => "executionOrientation",
            Competency::Collaboration => "collaboration",
        }
    }
}

impl fmt::Display for Competency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Competency {
    type Err = UnknownCompetency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Competency::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCompetency(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("unknown competency '{0}'")]
pub struct UnknownCompetency(pub String);

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScorePoint {
    pub score: i64,
    pub recorded_at: NaiveDateTime,
}

/// Stored per (user, competency): current score, a bounded history of
/// aggregator outputs, and the analyzed-message count backing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetencyState {
    pub score: i64,
    #[serde(default)]
    pub history: Vec<ScorePoint>,
    pub message_count: i64,
    pub updated_at: NaiveDateTime,
}

impl CompetencyState {
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            score: 0,
            history: Vec::new(),
            message_count: 0,
            updated_at: at,
        }
    }

    /// Overwrites the score with a fresh aggregate and records it in the
    /// rolling history.
    pub fn apply_aggregate(&mut self, score: i64, message_count: i64, at: NaiveDateTime) {
        self.score = score.clamp(0, 100);
        self.message_count = message_count;
        self.updated_at = at;

        self.history.push(ScorePoint {
            score: self.score,
            recorded_at: at,
        });
        if self.history.len() > SCORE_HISTORY_CAP {
            let overflow = self.history.len() - SCORE_HISTORY_CAP;
            self.history.drain(..overflow);
        }
    }

    /// One-time quest reward. Clamped so a boost never pushes past 100.
    pub fn boost(&mut self, points: i64, at: NaiveDateTime) {
        self.score = (self.score + points).clamp(0, 100);
        self.updated_at = at;
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_competency_round_trip() {
        for c in Competency::ALL {
            assert_eq!(c.as_str().parse::<Competency>().unwrap(), c);
        }
        assert!("questionquality".parse::<Competency>().is_err());
    }

    #[test]
    fn test_history_cap() {
        let now = Utc::now().naive_utc();
        let mut state = CompetencyState::new(now);

        for i in 0..(SCORE_HISTORY_CAP as i64 + 10) {
            state.apply_aggregate(i % 100, i, now);
        }

        assert_eq!(state.history.len(), SCORE_HISTORY_CAP);
    }

    #[test]
    fn test_boost_clamps() {
        let now = Utc::now().naive_utc();
        let mut state = CompetencyState::new(now);
        state.apply_aggregate(97, 5, now);

        state.boost(10, now);
        assert_eq!(state.score, 100);
    }
}
