use crate::db::models::achievement::{BadgeCriteria, BadgeSpec};
use crate::db::models::bot::BotSeed;
use crate::db::models::competency::Competency;
use crate::db::models::quest::{QuestCategory, QuestTemplate};

// MESSAGE ANALYSIS
//
// Unanalyzed messages older than the lookback window are left alone; the
// aggregation window below decides what still counts toward scores.
pub const ANALYZER_LOOKBACK_HOURS: i64 = 24;
pub const ANALYZER_BATCH_SIZE: usize = 10;
pub const ANALYZER_INTERVAL_SECS: u64 = 600;

// COMPLETION ENDPOINT RETRIES
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;
pub const RETRY_MULTIPLIER: u64 = 2;
pub const RETRY_MAX_DELAY_MS: u64 = 10_000;
pub const RETRY_MAX_ATTEMPTS: u32 = 5;
pub const RETRY_JITTER_MS: u64 = 250;

// COMPLETION ENDPOINT PACING
pub const LLM_BUCKET_MAX: usize = 10;
pub const LLM_REFILL_AMOUNT: usize = 1;
pub const LLM_REFILL_INTERVAL_MS: u64 = 500;
pub const LLM_MAX_OUTPUT_TOKENS: u32 = 2048;

// SCORE AGGREGATION
//
// Bucket weights are renormalized over non-empty buckets, so a user whose
// records all fall in one bucket keeps that bucket's plain mean.
pub const AGGREGATION_WINDOW_DAYS: i64 = 30;
pub const RECENT_BUCKET_MAX_AGE_DAYS: i64 = 7;
pub const MID_BUCKET_MAX_AGE_DAYS: i64 = 14;
pub const RECENT_BUCKET_WEIGHT: f64 = 0.5;
pub const MID_BUCKET_WEIGHT: f64 = 0.3;
pub const OLD_BUCKET_WEIGHT: f64 = 0.2;
pub const SCORE_HISTORY_CAP: usize = 30;
pub const AGGREGATOR_INTERVAL_SECS: u64 = 1800;

// QUESTS
pub const QUEST_SET_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const QUEST_GEN_INTERVAL_SECS: u64 = 600;
pub const QUEST_EVAL_INTERVAL_SECS: u64 = 900;
pub const QUEST_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_TARGET_COMPETENCY: Competency = Competency::QuestionQuality;

// ACHIEVEMENTS
pub const ACHIEVEMENTS_INTERVAL_SECS: u64 = 1800;
pub const STREAK_SCAN_CAP_DAYS: i64 = 60;

// CHAT
pub const CHAT_CONTEXT_MESSAGES: usize = 12;
pub const DEFAULT_BOT_ID: &str = "socratic-coach";

pub const QUEST_TEMPLATES: &[QuestTemplate] = &[
    // conversation
    QuestTemplate {
        id: "conv-ask-better",
        category: QuestCategory::Conversation,
        title: "Ask sharper questions",
        description: "Hold a conversation built around probing questions rather than statements.",
        target: Competency::QuestionQuality,
        required_messages: 5,
        min_avg_score: 60,
        reward_points: 3,
    },
    QuestTemplate {
        id: "conv-say-it-plain",
        category: QuestCategory::Conversation,
        title: "Say it plainly",
        description: "Explain one idea so clearly the coach never has to ask what you meant.",
        target: Competency::CommunicationClarity,
        required_messages: 5,
        min_avg_score: 65,
        reward_points: 3,
    },
    QuestTemplate {
        id: "conv-build-together",
        category: QuestCategory::Conversation,
        title: "Build on the coach's ideas",
        description: "Pick up the coach's suggestions and extend them instead of starting over.",
        target: Competency::Collaboration,
        required_messages: 6,
        min_avg_score: 60,
        reward_points: 3,
    },
    QuestTemplate {
        id: "conv-new-angles",
        category: QuestCategory::Conversation,
        title: "Find a new angle",
        description: "Bring at least one idea the coach has not heard from you before.",
        target: Competency::Creativity,
        required_messages: 5,
        min_avg_score: 60,
        reward_points: 3,
    },
    // challenge
    QuestTemplate {
        id: "chal-go-deeper",
        category: QuestCategory::Challenge,
        title: "Go three levels deep",
        description: "Take one problem and keep asking why until the root cause holds up.",
        target: Competency::ThinkingDepth,
        required_messages: 5,
        min_avg_score: 70,
        reward_points: 4,
    },
    QuestTemplate {
        id: "chal-ship-something",
        category: QuestCategory::Challenge,
        title: "Commit to a next step",
        description: "Turn today's discussion into a concrete action with an owner and a deadline.",
        target: Competency::ExecutionOrientation,
        required_messages: 4,
        min_avg_score: 70,
        reward_points: 4,
    },
    QuestTemplate {
        id: "chal-stress-test",
        category: QuestCategory::Challenge,
        title: "Stress-test your plan",
        description: "Invite the coach to attack your plan, then answer every objection.",
        target: Competency::QuestionQuality,
        required_messages: 6,
        min_avg_score: 65,
        reward_points: 4,
    },
    QuestTemplate {
        id: "chal-remix",
        category: QuestCategory::Challenge,
        title: "Remix a known solution",
        description: "Adapt a solution from a different domain to today's problem.",
        target: Competency::Creativity,
        required_messages: 5,
        min_avg_score: 70,
        reward_points: 4,
    },
    // reflection
    QuestTemplate {
        id: "refl-look-back",
        category: QuestCategory::Reflection,
        title: "Look back honestly",
        description: "Walk through a recent decision and name what you would do differently.",
        target: Competency::ThinkingDepth,
        required_messages: 3,
        min_avg_score: 60,
        reward_points: 3,
    },
    QuestTemplate {
        id: "refl-tight-summary",
        category: QuestCategory::Reflection,
        title: "Write the tight summary",
        description: "Summarize today's session in three sentences a stranger could follow.",
        target: Competency::CommunicationClarity,
        required_messages: 3,
        min_avg_score: 65,
        reward_points: 3,
    },
    QuestTemplate {
        id: "refl-credit-others",
        category: QuestCategory::Reflection,
        title: "Credit the people around you",
        description: "Reflect on who helped you this week and what you gave back.",
        target: Competency::Collaboration,
        required_messages: 3,
        min_avg_score: 60,
        reward_points: 3,
    },
    QuestTemplate {
        id: "refl-next-move",
        category: QuestCategory::Reflection,
        title: "Name your next move",
        description: "Close the loop: what gets done before tomorrow's session?",
        target: Competency::ExecutionOrientation,
        required_messages: 3,
        min_avg_score: 60,
        reward_points: 3,
    },
];

pub const BADGES: &[BadgeSpec] = &[
    BadgeSpec {
        id: "first-steps",
        title: "First Steps",
        description: "Had a first message analyzed.",
        criteria: BadgeCriteria::MessagesAnalyzed(1),
    },
    BadgeSpec {
        id: "regular",
        title: "Regular",
        description: "Fifty analyzed messages.",
        criteria: BadgeCriteria::MessagesAnalyzed(50),
    },
    BadgeSpec {
        id: "conversationalist",
        title: "Conversationalist",
        description: "Two hundred fifty analyzed messages.",
        criteria: BadgeCriteria::MessagesAnalyzed(250),
    },
    BadgeSpec {
        id: "quest-rookie",
        title: "Quest Rookie",
        description: "Completed a first daily quest.",
        criteria: BadgeCriteria::QuestsCompleted(1),
    },
    BadgeSpec {
        id: "quest-streaker",
        title: "Quest Streaker",
        description: "Ten quests completed inside one week.",
        criteria: BadgeCriteria::QuestsCompleted(10),
    },
    BadgeSpec {
        id: "solid-footing",
        title: "Solid Footing",
        description: "Any competency at 50 or above.",
        criteria: BadgeCriteria::AnyCompetencyAtLeast(50),
    },
    BadgeSpec {
        id: "sharp-edge",
        title: "Sharp Edge",
        description: "Any competency at 80 or above.",
        criteria: BadgeCriteria::AnyCompetencyAtLeast(80),
    },
    BadgeSpec {
        id: "three-day-streak",
        title: "Warming Up",
        description: "Active three days in a row.",
        criteria: BadgeCriteria::StreakDays(3),
    },
    BadgeSpec {
        id: "seven-day-streak",
        title: "Committed",
        description: "Active seven days in a row.",
        criteria: BadgeCriteria::StreakDays(7),
    },
];

pub const DEFAULT_BOTS: &[BotSeed] = &[
    BotSeed {
        id: "socratic-coach",
        name: "Sol",
        persona: "You are Sol, a Socratic learning coach. You rarely give answers outright; \
                  you ask short, pointed questions that push the learner one level deeper. \
                  Keep replies under four sentences and always end with a question.",
        temperature: 0.7,
    },
    BotSeed {
        id: "pragmatist",
        name: "Pria",
        persona: "You are Pria, a pragmatic execution coach. You steer every discussion \
                  toward a concrete next action: who does what, by when. Be warm but brief, \
                  and never let vague plans slide.",
        temperature: 0.5,
    },
    BotSeed {
        id: "devils-advocate",
        name: "Vex",
        persona: "You are Vex, a friendly devil's advocate. You find the weakest assumption \
                  in what the learner says and challenge it directly, then offer one way \
                  they could shore it up.",
        temperature: 0.8,
    },
];
