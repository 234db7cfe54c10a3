// Activity response service
//
// Audience submissions (one per respondent per activity, upserted) and the
// presenter's view of them.

use crowdpulse_core::{
    ActivityResponse, ActivityResults, DomainError, Notification, Respondent, ResponseAnswer,
    Result,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::realtime::ConnectionRegistry;
use crate::storage::{ActivityResponseRow, StorageBackend, UpsertResponseRow};

pub struct ActivityResponseService {
    db: Arc<StorageBackend>,
    registry: Arc<ConnectionRegistry>,
}

impl ActivityResponseService {
    pub fn new(db: Arc<StorageBackend>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { db, registry }
    }

    /// Record the respondent's answer, replacing any earlier one
    pub async fn submit(
        &self,
        respondent: &Respondent,
        activity_id: Uuid,
        answer: ResponseAnswer,
    ) -> Result<ActivityResponse> {
        let (activity, event) = super::activity_with_event(&self.db, activity_id).await?;
        answer.validate_for(&activity.kind)?;

        let input = UpsertResponseRow {
            activity_id,
            respondent_key: respondent.key(),
            answer: serde_json::to_value(&answer)?,
        };
        let response = Self::row_to_response(self.db.upsert_response(input).await?)?;

        self.registry.publish(
            &event.short_code,
            &Notification::ResponseSubmitted {
                event_id: event.id,
                activity_id,
                response_id: response.id,
            },
        );
        Ok(response)
    }

    /// The respondent's own answer, if any
    pub async fn get_mine(&self, respondent: &Respondent, activity_id: Uuid) -> Result<ActivityResponse> {
        super::activity_with_event(&self.db, activity_id).await?;
        let row = self
            .db
            .get_response(activity_id, &respondent.key())
            .await?
            .ok_or_else(|| DomainError::not_found("Response"))?;
        Self::row_to_response(row)
    }

    /// All responses, for the event owner
    pub async fn list(&self, user_id: Uuid, activity_id: Uuid) -> Result<Vec<ActivityResponse>> {
        self.owned_activity_event(user_id, activity_id).await?;
        let rows = self.db.list_responses(activity_id).await?;
        rows.into_iter().map(Self::row_to_response).collect()
    }

    /// Aggregated results, visible to presenter and audience
    pub async fn results(&self, activity_id: Uuid) -> Result<ActivityResults> {
        let (activity, _) = super::activity_with_event(&self.db, activity_id).await?;
        let responses = self
            .db
            .list_responses(activity_id)
            .await?
            .into_iter()
            .map(Self::row_to_response)
            .collect::<Result<Vec<_>>>()?;
        Ok(ActivityResults::aggregate(&activity.kind, &responses))
    }

    /// Remove every response to an activity. Returns how many were removed.
    pub async fn clear(&self, user_id: Uuid, activity_id: Uuid) -> Result<u64> {
        let event = self.owned_activity_event(user_id, activity_id).await?;
        let deleted = self.db.delete_responses(activity_id).await?;
        tracing::info!(activity_id = %activity_id, deleted, "Responses cleared");

        self.registry.publish(
            &event.short_code,
            &Notification::ResponsesCleared {
                event_id: event.id,
                activity_id,
            },
        );
        Ok(deleted)
    }

    async fn owned_activity_event(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
    ) -> Result<crowdpulse_core::Event> {
        let (_, event) = super::activity_with_event(&self.db, activity_id).await?;
        if !event.is_owned_by(user_id) {
            return Err(DomainError::forbidden("activity belongs to another user's event"));
        }
        Ok(event)
    }

    fn row_to_response(row: ActivityResponseRow) -> Result<ActivityResponse> {
        let respondent = Respondent::from_key(&row.respondent_key).ok_or_else(|| {
            DomainError::internal(format!("stored response {} has a malformed respondent", row.id))
        })?;
        Ok(ActivityResponse {
            id: row.id,
            activity_id: row.activity_id,
            respondent,
            answer: serde_json::from_value(row.answer)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::events::CreateEventRequest;
    use crate::services::{ActivityService, EventService};
    use crowdpulse_core::{ActivityKind, ErrorKind};

    struct Fixture {
        responses: ActivityResponseService,
        owner: Uuid,
        poll_id: Uuid,
        slide_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let registry = Arc::new(ConnectionRegistry::new());
        let db = Arc::new(StorageBackend::in_memory());
        let events = EventService::new(db.clone(), registry.clone(), 16);
        let activities = ActivityService::new(db.clone(), registry.clone());
        let owner = Uuid::now_v7();
        let event = events
            .create(
                owner,
                CreateEventRequest {
                    title: "All hands".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        let poll = activities
            .create(
                owner,
                event.id,
                ActivityKind::MultipleChoice {
                    question: "Lunch?".to_string(),
                    options: vec!["Pizza".to_string(), "Salad".to_string()],
                    allow_multiple: false,
                },
            )
            .await
            .unwrap();
        let slide = activities
            .create(owner, event.id, ActivityKind::Welcome { title: None })
            .await
            .unwrap();
        Fixture {
            responses: ActivityResponseService::new(db, registry),
            owner,
            poll_id: poll.id,
            slide_id: slide.id,
        }
    }

    fn choice(i: u32) -> ResponseAnswer {
        ResponseAnswer::Choice { selected: vec![i] }
    }

    #[tokio::test]
    async fn test_one_response_per_respondent() {
        let f = fixture().await;
        let user = Respondent::User(Uuid::now_v7());

        let first = f.responses.submit(&user, f.poll_id, choice(0)).await.unwrap();
        let second = f.responses.submit(&user, f.poll_id, choice(1)).await.unwrap();
        assert_eq!(first.id, second.id);

        let all = f.responses.list(f.owner, f.poll_id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].answer, choice(1));

        let mine = f.responses.get_mine(&user, f.poll_id).await.unwrap();
        assert_eq!(mine.answer, choice(1));
    }

    #[tokio::test]
    async fn test_results_count_each_respondent() {
        let f = fixture().await;
        let alice = Respondent::anonymous("alice-token-000000").unwrap();
        let bob = Respondent::anonymous("bob-token-00000000").unwrap();
        f.responses.submit(&alice, f.poll_id, choice(0)).await.unwrap();
        f.responses.submit(&bob, f.poll_id, choice(0)).await.unwrap();
        f.responses.submit(&bob, f.poll_id, choice(1)).await.unwrap();

        let results = f.responses.results(f.poll_id).await.unwrap();
        assert_eq!(
            results,
            ActivityResults::Choice {
                counts: vec![1, 1],
                total: 2
            }
        );
    }

    #[tokio::test]
    async fn test_non_interactive_activity_rejects_answers() {
        let f = fixture().await;
        let user = Respondent::User(Uuid::now_v7());
        let err = f
            .responses
            .submit(&user, f.slide_id, choice(0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_clear_requires_owner() {
        let f = fixture().await;
        let user = Respondent::User(Uuid::now_v7());
        f.responses.submit(&user, f.poll_id, choice(0)).await.unwrap();

        let err = f.responses.clear(Uuid::now_v7(), f.poll_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        assert_eq!(f.responses.clear(f.owner, f.poll_id).await.unwrap(), 1);
        let err = f.responses.get_mine(&user, f.poll_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
