//! Prompt builders for the two call sites: batch message scoring and coach
//! replies.

use std::fmt::Write;

use crate::db::models::bot::BotProfile;
use crate::db::models::message::{Author, ChatMessage};
use crate::llm::client::CompletionRequest;

/// Scoring wants determinism far more than flair.
const SCORING_TEMPERATURE: f32 = 0.2;

const SCORING_SYSTEM: &str = "\
You assess chat messages written by a learner to an AI coach. For every \
numbered message, assign six integer scores from 0 to 100: questionQuality, \
thinkingDepth, creativity, communicationClarity, executionOrientation and \
collaboration. Also classify the message as one of: question, reflection, \
task, social, other. Respond with a JSON array only, one object per message, \
each shaped as {\"index\": <number from the list>, \"questionQuality\": 0-100, \
\"thinkingDepth\": 0-100, \"creativity\": 0-100, \"communicationClarity\": \
0-100, \"executionOrientation\": 0-100, \"collaboration\": 0-100, \
\"classification\": \"...\"}. No prose outside the array.";

pub fn batch_scoring(messages: &[ChatMessage]) -> CompletionRequest {
    let mut listing = String::new();
    for (i, message) in messages.iter().enumerate() {
        // flatten newlines so the numbering stays unambiguous
        let _ = writeln!(listing, "{i}. {}", message.text.replace('\n', " "));
    }

    CompletionRequest {
        system: Some(SCORING_SYSTEM.to_string()),
        prompt: format!("Score these learner messages:\n\n{listing}"),
        temperature: Some(SCORING_TEMPERATURE),
    }
}

pub fn coach_reply(bot: &BotProfile, history: &[ChatMessage], text: &str) -> CompletionRequest {
    let mut transcript = String::new();
    for message in history {
        let speaker = match message.author {
            Author::User => "Learner",
            Author::Bot => "Coach",
        };
        let _ = writeln!(transcript, "{speaker}: {}", message.text);
    }

    CompletionRequest {
        system: Some(bot.persona.clone()),
        prompt: format!(
            "Conversation so far:\n{transcript}\nLearner: {text}\n\nReply as the coach."
        ),
        temperature: Some(bot.temperature),
    }
}

#[cfg(test)]
mod test {
    use crate::db::models::user::UserId;

    use super::*;

    #[test]
    fn test_batch_scoring_numbers_messages() {
        let user = UserId::from("u-1");
        let messages = vec![
            ChatMessage::from_user(user.clone(), "why does this fail?".into()),
            ChatMessage::from_user(user, "line one\nline two".into()),
        ];

        let request = batch_scoring(&messages);

        assert!(request.prompt.contains("0. why does this fail?"));
        assert!(request.prompt.contains("1. line one line two"));
        assert!(request.system.as_deref().unwrap().contains("questionQuality"));
    }
}
