use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BotId(pub String);

/// A configurable coaching persona. Seeded from `constants::DEFAULT_BOTS` at
/// startup; the persona text becomes the system prompt for chat replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotProfile {
    pub id: BotId,
    pub name: String,
    pub persona: String,
    pub temperature: f32,
}

/// Compile-time seed entry for the default personas.
#[derive(Debug, Clone, Copy)]
pub struct BotSeed {
    pub id: &'static str,
    pub name: &'static str,
    pub persona: &'static str,
    pub temperature: f32,
}

impl From<&BotSeed> for BotProfile {
    fn from(seed: &BotSeed) -> Self {
        Self {
            id: BotId(seed.id.to_string()),
            name: seed.name.to_string(),
            persona: seed.persona.to_string(),
            temperature: seed.temperature,
        }
    }
}

impl From<String> for BotId {
    fn from(value: String) -> Self {
        BotId(value)
    }
}

impl From<&str> for BotId {
    fn from(value: &str) -> Self {
        BotId(value.to_string())
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
