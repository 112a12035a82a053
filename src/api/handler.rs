use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::server::{AppState, JsonResult, RouteError};
use crate::constants::{BADGES, CHAT_CONTEXT_MESSAGES, DEFAULT_BOT_ID};
use crate::db::models::user::UpsertUser;
use crate::db::prelude::*;
use crate::llm::client::Llm;
use crate::llm::prompt;
use crate::pipeline::{
    BatchSummary, PipelineErr, achievements, aggregator, analyzer, quest_eval, quest_gen,
};

/// Trigger parameters: a user id scopes the run to one user, a date pins
/// quest generation/evaluation to a day other than today.
#[derive(Debug, Deserialize)]
pub struct RunParams {
    pub user_id: Option<String>,
    pub date: Option<NaiveDate>,
}

impl RunParams {
    fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

fn single_summary(processed: bool) -> BatchSummary {
    BatchSummary {
        processed: processed as usize,
        skipped: !processed as usize,
        failed: 0,
    }
}

//
// batch triggers

#[instrument]
pub async fn run_analyzer(Query(params): Query<RunParams>) -> JsonResult<BatchSummary> {
    let summary = match &params.user_id {
        Some(user_id) => {
            let analyzed = analyzer::run_for_user(&UserId::from(user_id.as_str())).await?;
            single_summary(analyzed > 0)
        }
        None => analyzer::run_all().await?,
    };

    Ok(Json(summary))
}

#[instrument]
pub async fn run_aggregator(Query(params): Query<RunParams>) -> JsonResult<BatchSummary> {
    let summary = match &params.user_id {
        Some(user_id) => {
            let updated = aggregator::run_for_user(&UserId::from(user_id.as_str())).await?;
            single_summary(updated)
        }
        None => aggregator::run_all().await?,
    };

    Ok(Json(summary))
}

#[instrument]
pub async fn run_quest_generation(Query(params): Query<RunParams>) -> JsonResult<BatchSummary> {
    let date = params.date_or_today();
    let summary = match &params.user_id {
        Some(user_id) => {
            let created = quest_gen::run_for_user(&UserId::from(user_id.as_str()), date).await?;
            single_summary(created)
        }
        None => quest_gen::run_all(date).await?,
    };

    Ok(Json(summary))
}

#[instrument]
pub async fn run_quest_evaluation(Query(params): Query<RunParams>) -> JsonResult<BatchSummary> {
    let date = params.date_or_today();
    let summary = match &params.user_id {
        Some(user_id) => {
            // a missing set propagates as an explicit 404 for single-user runs
            quest_eval::run_for_user(&UserId::from(user_id.as_str()), date).await?;
            single_summary(true)
        }
        None => quest_eval::run_all(date).await?,
    };

    Ok(Json(summary))
}

#[instrument]
pub async fn run_achievements(Query(params): Query<RunParams>) -> JsonResult<BatchSummary> {
    let summary = match &params.user_id {
        Some(user_id) => {
            let granted = achievements::run_for_user(&UserId::from(user_id.as_str())).await?;
            single_summary(granted > 0)
        }
        None => achievements::run_all().await?,
    };

    Ok(Json(summary))
}

//
// users + bots

#[instrument(skip(state, request))]
pub async fn upsert_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpsertUser>,
) -> JsonResult<User> {
    let users = UserRepository::new(state.manager.clone());
    Ok(Json(users.upsert(request).await?))
}

#[instrument(skip(state))]
pub async fn user_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> JsonResult<User> {
    let users = UserRepository::new(state.manager.clone());

    match users.get(&UserId::from(id.as_str())).await? {
        Some(user) => Ok(Json(user)),
        None => Err(RouteError::UnknownUser(id)),
    }
}

#[instrument(skip(state))]
pub async fn list_users(
    Query(param): Query<Pagination>,
    State(state): State<Arc<AppState>>,
) -> JsonResult<PaginatedResponse<User>> {
    let users = UserRepository::new(state.manager.clone());
    let (items, total) = users.page(param.limit, param.page).await?;

    Ok(Json(PaginatedResponse::new(
        items,
        total,
        param.limit,
        param.page,
    )))
}

#[instrument(skip(state))]
pub async fn list_bots(State(state): State<Arc<AppState>>) -> JsonResult<Vec<BotProfile>> {
    let bots = BotRepository::new(state.manager.clone());
    Ok(Json(bots.all().await?))
}

//
// chat

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub bot_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub message: ChatMessage,
    pub reply: ChatMessage,
}

#[instrument(skip(state, body))]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(body): Json<ChatRequestBody>,
) -> JsonResult<ChatReply> {
    let user_id = UserId(user_id);

    let users = UserRepository::new(state.manager.clone());
    if users.get(&user_id).await?.is_none() {
        return Err(RouteError::UnknownUser(user_id.0));
    }

    let bots = BotRepository::new(state.manager.clone());
    let bot_id = BotId(body.bot_id.unwrap_or_else(|| DEFAULT_BOT_ID.to_string()));
    let Some(bot) = bots.get(&bot_id).await? else {
        return Err(RouteError::UnknownBot(bot_id.0));
    };

    let messages = MessageRepository::new(state.manager.clone());

    // context is captured before the new message lands so the prompt doesn't
    // repeat it
    let history = messages.recent(&user_id, CHAT_CONTEXT_MESSAGES).await?;

    let message = ChatMessage::from_user(user_id.clone(), body.text.clone());
    messages.append(&message).await?;

    let request = prompt::coach_reply(&bot, &history, &body.text);
    let completion = Llm::complete_with_retry(&request).await?;

    UsageRepository::new(state.manager.clone())
        .record(&completion.usage)
        .await;

    let reply = ChatMessage::from_bot(user_id, bot.id.clone(), completion.text);
    messages.append(&reply).await?;

    Ok(Json(ChatReply { message, reply }))
}

//
// progression

#[derive(Debug, Serialize)]
pub struct CompetencyReport {
    pub user_id: UserId,
    pub competencies: BTreeMap<Competency, CompetencyState>,
}

#[instrument(skip(state))]
pub async fn competencies_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> JsonResult<CompetencyReport> {
    let user_id = UserId(user_id);
    let competencies = CompetencyRepository::new(state.manager.clone())
        .get_all(&user_id)
        .await?;

    Ok(Json(CompetencyReport {
        user_id,
        competencies,
    }))
}

#[derive(Debug, Deserialize)]
pub struct QuestQuery {
    pub date: Option<NaiveDate>,
}

#[instrument(skip(state))]
pub async fn quests_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<QuestQuery>,
) -> JsonResult<DailyQuestSet> {
    let user_id = UserId(user_id);
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    match QuestRepository::new(state.manager.clone())
        .get_for(&user_id, date)
        .await?
    {
        Some(set) => Ok(Json(set)),
        None => Err(RouteError::PipelineError(PipelineErr::QuestSetMissing {
            user_id,
            date,
        })),
    }
}

#[instrument(skip(state))]
pub async fn achievements_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> JsonResult<Vec<UnlockedBadge>> {
    let user_id = UserId(user_id);
    let unlocked = AchievementRepository::new(state.manager.clone())
        .unlocked(&user_id)
        .await?;

    let mut badges: Vec<UnlockedBadge> = unlocked
        .into_iter()
        .map(|(id, unlocked_at)| {
            let spec = BADGES.iter().find(|b| b.id == id);
            UnlockedBadge {
                title: spec.map(|b| b.title.to_string()).unwrap_or_default(),
                description: spec.map(|b| b.description.to_string()).unwrap_or_default(),
                id,
                unlocked_at,
            }
        })
        .collect();
    badges.sort_by(|a, b| a.unlocked_at.cmp(&b.unlocked_at));

    Ok(Json(badges))
}
