use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::gateway::{
    Capability, ChannelId, ChannelOps, ChannelVisibility, Directory, GatewayError, Member,
    MessageId, Notifier, OutboundMessage, ReplyOutcome, RoleId, ScannedMessage, UserId,
};
use crate::workflows::membership::domain::{Application, ApplicationStatus, FormResponses};
use crate::workflows::membership::interview::InterviewConfig;
use crate::workflows::membership::service::{MembershipConfig, MembershipService};
use crate::workflows::membership::store::{ApplicationStore, Decision, StoreError};

pub(super) const STAFF_CHANNEL: ChannelId = ChannelId(40);
pub(super) const ANNOUNCEMENTS_CHANNEL: ChannelId = ChannelId(50);
pub(super) const MEMBER_ROLE: RoleId = RoleId(100);

pub(super) fn form() -> FormResponses {
    FormResponses {
        nickname: "Steve".to_string(),
        age: "19".to_string(),
        prior_server_experience: "two survival servers".to_string(),
        self_rated_adequacy: "8".to_string(),
        plans: "base building and trading".to_string(),
    }
}

/// Scripted in-memory stand-in for the platform. Replies are dequeued in
/// order; everything outbound is recorded for assertions.
#[derive(Default)]
pub(super) struct FakeGateway {
    pub(super) replies: Mutex<VecDeque<Result<ReplyOutcome, GatewayError>>>,
    /// Fail `send_private` once this many sends have succeeded.
    pub(super) fail_private_after: Mutex<Option<usize>>,
    /// Fail every channel `post`.
    pub(super) fail_posts: Mutex<bool>,
    /// Fail every `grant_role`.
    pub(super) fail_grant: Mutex<bool>,
    pub(super) privates: Mutex<Vec<(UserId, String)>>,
    pub(super) ephemerals: Mutex<Vec<(UserId, String)>>,
    pub(super) posts: Mutex<Vec<(ChannelId, OutboundMessage)>>,
    pub(super) edits: Mutex<Vec<(ChannelId, MessageId, OutboundMessage)>>,
    pub(super) granted: Mutex<Vec<(UserId, RoleId)>>,
    pub(super) moderators: Mutex<HashSet<UserId>>,
    pub(super) members: Mutex<HashSet<UserId>>,
    pub(super) role_holders: Mutex<HashSet<UserId>>,
}

impl FakeGateway {
    pub(super) fn queue_reply(&self, outcome: ReplyOutcome) {
        self.replies.lock().unwrap().push_back(Ok(outcome));
    }

    pub(super) fn add_moderator(&self, user: UserId) {
        self.moderators.lock().unwrap().insert(user);
        self.members.lock().unwrap().insert(user);
    }

    pub(super) fn add_member(&self, user: UserId) {
        self.members.lock().unwrap().insert(user);
    }

    pub(super) fn privates_to(&self, user: UserId) -> Vec<String> {
        self.privates
            .lock()
            .unwrap()
            .iter()
            .filter(|(recipient, _)| *recipient == user)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub(super) fn posts_in(&self, channel: ChannelId) -> Vec<OutboundMessage> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|(posted, _)| *posted == channel)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for FakeGateway {
    async fn send_private(
        &self,
        user: UserId,
        message: OutboundMessage,
    ) -> Result<(), GatewayError> {
        let sent = self.privates.lock().unwrap().len();
        if let Some(limit) = *self.fail_private_after.lock().unwrap() {
            if sent >= limit {
                return Err(GatewayError::RecipientUnreachable);
            }
        }
        self.privates.lock().unwrap().push((user, message.text));
        Ok(())
    }

    async fn await_private_reply(
        &self,
        _user: UserId,
        _deadline: Duration,
    ) -> Result<ReplyOutcome, GatewayError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ReplyOutcome::TimedOut))
    }

    async fn send_ephemeral(&self, user: UserId, text: &str) -> Result<(), GatewayError> {
        self.ephemerals
            .lock()
            .unwrap()
            .push((user, text.to_string()));
        Ok(())
    }
}

#[async_trait]
impl ChannelOps for FakeGateway {
    async fn post(
        &self,
        channel: ChannelId,
        message: OutboundMessage,
    ) -> Result<MessageId, GatewayError> {
        if *self.fail_posts.lock().unwrap() {
            return Err(GatewayError::Transport("channel write refused".to_string()));
        }
        let mut posts = self.posts.lock().unwrap();
        posts.push((channel, message));
        Ok(MessageId(posts.len() as u64))
    }

    async fn edit(
        &self,
        channel: ChannelId,
        message: MessageId,
        replacement: OutboundMessage,
    ) -> Result<(), GatewayError> {
        self.edits
            .lock()
            .unwrap()
            .push((channel, message, replacement));
        Ok(())
    }

    async fn scan_recent(
        &self,
        _channel: ChannelId,
        _limit: usize,
    ) -> Result<Vec<ScannedMessage>, GatewayError> {
        Ok(Vec::new())
    }

    async fn find_or_create_category(&self, _name: &str) -> Result<ChannelId, GatewayError> {
        Ok(ChannelId(900))
    }

    async fn create_private_channel(
        &self,
        _category: ChannelId,
        _name: &str,
        _visibility: ChannelVisibility,
    ) -> Result<ChannelId, GatewayError> {
        Ok(ChannelId(901))
    }

    async fn delete_channel(&self, _channel: ChannelId) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[async_trait]
impl Directory for FakeGateway {
    async fn fetch_member(&self, user: UserId) -> Result<Option<Member>, GatewayError> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .contains(&user)
            .then(|| Member {
                id: user,
                display_name: format!("user-{user}"),
            }))
    }

    async fn member_has_role(&self, user: UserId, role: RoleId) -> Result<bool, GatewayError> {
        Ok(role == MEMBER_ROLE && self.role_holders.lock().unwrap().contains(&user))
    }

    async fn grant_role(
        &self,
        user: UserId,
        role: RoleId,
        _reason: &str,
    ) -> Result<(), GatewayError> {
        if *self.fail_grant.lock().unwrap() {
            return Err(GatewayError::NotFound("role"));
        }
        self.granted.lock().unwrap().push((user, role));
        self.role_holders.lock().unwrap().insert(user);
        Ok(())
    }

    async fn has_capability(
        &self,
        user: UserId,
        capability: Capability,
    ) -> Result<bool, GatewayError> {
        match capability {
            Capability::Moderator => Ok(self.moderators.lock().unwrap().contains(&user)),
            Capability::Administrator => Ok(false),
        }
    }
}

/// Mutex-backed session store mirroring the production one in the service
/// crate.
#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<HashMap<UserId, Application>>,
}

impl ApplicationStore for MemoryStore {
    fn insert(&self, application: Application) -> Result<Application, StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        if records.contains_key(&application.applicant) {
            return Err(StoreError::Conflict);
        }
        records.insert(application.applicant, application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        if !records.contains_key(&application.applicant) {
            return Err(StoreError::NotFound);
        }
        records.insert(application.applicant, application);
        Ok(())
    }

    fn fetch(&self, applicant: &UserId) -> Result<Option<Application>, StoreError> {
        let records = self.records.lock().expect("store mutex poisoned");
        Ok(records.get(applicant).cloned())
    }

    fn resolve(
        &self,
        applicant: &UserId,
        decision: Decision,
        moderator: UserId,
    ) -> Result<Application, StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        let application = records.get_mut(applicant).ok_or(StoreError::NotFound)?;
        if application.status != ApplicationStatus::PendingReview {
            return Err(StoreError::AlreadyDecided);
        }
        application
            .advance(decision.terminal_status())
            .map_err(|_| StoreError::AlreadyDecided)?;
        application.decided_by = Some(moderator);
        Ok(application.clone())
    }

    fn discard(&self, applicant: &UserId) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        records.remove(applicant).ok_or(StoreError::NotFound)?;
        Ok(())
    }
}

pub(super) fn build_service() -> (MembershipService, Arc<FakeGateway>, Arc<MemoryStore>) {
    let gateway = Arc::new(FakeGateway::default());
    let store = Arc::new(MemoryStore::default());
    let service = MembershipService::new(
        store.clone(),
        gateway.clone(),
        gateway.clone(),
        gateway.clone(),
        MembershipConfig {
            staff_channel: STAFF_CHANNEL,
            announcements_channel: ANNOUNCEMENTS_CHANNEL,
            member_role: MEMBER_ROLE,
            server_address: "play.example.net".to_string(),
            interview: InterviewConfig {
                reply_deadline: Duration::from_secs(600),
                question_grace: Duration::ZERO,
            },
        },
    );
    (service, gateway, store)
}

/// Drive an application all the way to `PendingReview`.
pub(super) async fn pending_application(
    service: &MembershipService,
    gateway: &FakeGateway,
    applicant: UserId,
) {
    gateway.queue_reply(ReplyOutcome::Answered("I report griefers".to_string()));
    gateway.queue_reply(ReplyOutcome::Answered("a friend invited me".to_string()));
    service
        .submit(applicant, form())
        .await
        .expect("submission accepted");
    let outcome = service
        .run_interview(applicant)
        .await
        .expect("interview runs");
    assert_eq!(
        outcome,
        crate::workflows::membership::InterviewOutcome::Completed
    );
}
