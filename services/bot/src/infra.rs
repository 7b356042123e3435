//! In-memory infrastructure behind the gateway and storage seams.
//!
//! The stores are the production implementations for a single-process
//! deployment; the scripted gateway stands in for the platform SDK in the
//! serve loop, the demo command, and the dispatcher tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use gatehouse::config::AppConfig;
use gatehouse::gateway::{
    Capability, ChannelId, ChannelOps, ChannelVisibility, Directory, GatewayError, Member,
    MessageId, Notifier, OutboundMessage, ReplyOutcome, RoleId, ScannedMessage, UserId,
};
use gatehouse::workflows::announce::{content, AnnouncementPublisher, EntryPoint};
use gatehouse::workflows::membership::{
    Application, ApplicationStatus, ApplicationStore, Decision, InterviewConfig, MembershipConfig,
    MembershipService, StoreError,
};
use gatehouse::workflows::support::{
    LedgerError, Ticket, TicketChannelManager, TicketConfig, TicketLedger,
};

/// Mutex-backed application store. One process, one community: a `HashMap`
/// keyed by applicant id is the whole persistence story.
#[derive(Default)]
pub(crate) struct InMemoryApplicationStore {
    records: Mutex<HashMap<UserId, Application>>,
}

impl InMemoryApplicationStore {
    fn records(&self) -> Result<MutexGuard<'_, HashMap<UserId, Application>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl ApplicationStore for InMemoryApplicationStore {
    fn insert(&self, application: Application) -> Result<Application, StoreError> {
        let mut records = self.records()?;
        if records.contains_key(&application.applicant) {
            return Err(StoreError::Conflict);
        }
        records.insert(application.applicant, application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), StoreError> {
        let mut records = self.records()?;
        if !records.contains_key(&application.applicant) {
            return Err(StoreError::NotFound);
        }
        records.insert(application.applicant, application);
        Ok(())
    }

    fn fetch(&self, applicant: &UserId) -> Result<Option<Application>, StoreError> {
        let records = self.records()?;
        Ok(records.get(applicant).cloned())
    }

    fn resolve(
        &self,
        applicant: &UserId,
        decision: Decision,
        moderator: UserId,
    ) -> Result<Application, StoreError> {
        let mut records = self.records()?;
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
        let mut records = self.records()?;
        records.remove(applicant).ok_or(StoreError::NotFound)?;
        Ok(())
    }
}

/// Mutex-backed ticket ledger keyed by the backing channel.
#[derive(Default)]
pub(crate) struct InMemoryTicketLedger {
    tickets: Mutex<HashMap<ChannelId, Ticket>>,
}

impl InMemoryTicketLedger {
    fn tickets(&self) -> Result<MutexGuard<'_, HashMap<ChannelId, Ticket>>, LedgerError> {
        self.tickets
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger mutex poisoned".to_string()))
    }
}

impl TicketLedger for InMemoryTicketLedger {
    fn record(&self, ticket: Ticket) -> Result<Ticket, LedgerError> {
        let mut tickets = self.tickets()?;
        tickets.insert(ticket.channel, ticket.clone());
        Ok(ticket)
    }

    fn find_by_channel(&self, channel: ChannelId) -> Result<Option<Ticket>, LedgerError> {
        let tickets = self.tickets()?;
        Ok(tickets.get(&channel).cloned())
    }

    fn mark_closed(&self, channel: ChannelId) -> Result<Ticket, LedgerError> {
        let mut tickets = self.tickets()?;
        let ticket = tickets.get_mut(&channel).ok_or(LedgerError::NotFound)?;
        ticket.open = false;
        Ok(ticket.clone())
    }
}

/// Scripted stand-in for the platform gateway: private replies are dequeued
/// in order, channel history is kept per channel so the entry-point
/// publisher sees its own earlier output, and everything outbound is
/// recorded for inspection.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    next_id: AtomicU64,
    replies: Mutex<VecDeque<ReplyOutcome>>,
    history: Mutex<HashMap<ChannelId, Vec<ScannedMessage>>>,
    categories: Mutex<HashMap<String, ChannelId>>,
    pub(crate) privates: Mutex<Vec<(UserId, String)>>,
    pub(crate) ephemerals: Mutex<Vec<(UserId, String)>>,
    pub(crate) posts: Mutex<Vec<(ChannelId, OutboundMessage)>>,
    pub(crate) edits: Mutex<Vec<(ChannelId, MessageId, OutboundMessage)>>,
    pub(crate) created: Mutex<Vec<(ChannelId, String, ChannelVisibility)>>,
    pub(crate) deleted: Mutex<Vec<ChannelId>>,
    pub(crate) granted: Mutex<Vec<(UserId, RoleId)>>,
    moderators: Mutex<HashSet<UserId>>,
    admins: Mutex<HashSet<UserId>>,
    members: Mutex<HashSet<UserId>>,
    role_holders: Mutex<HashSet<UserId>>,
}

impl ScriptedGateway {
    pub(crate) fn queue_reply(&self, outcome: ReplyOutcome) {
        self.replies.lock().expect("gateway poisoned").push_back(outcome);
    }

    pub(crate) fn add_member(&self, user: UserId) {
        self.members.lock().expect("gateway poisoned").insert(user);
    }

    pub(crate) fn add_moderator(&self, user: UserId) {
        self.add_member(user);
        self.moderators.lock().expect("gateway poisoned").insert(user);
    }

    pub(crate) fn add_admin(&self, user: UserId) {
        self.add_member(user);
        self.admins.lock().expect("gateway poisoned").insert(user);
    }

    pub(crate) fn posts_in(&self, channel: ChannelId) -> Vec<OutboundMessage> {
        self.posts
            .lock()
            .expect("gateway poisoned")
            .iter()
            .filter(|(posted, _)| *posted == channel)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub(crate) fn privates_to(&self, user: UserId) -> Vec<String> {
        self.privates
            .lock()
            .expect("gateway poisoned")
            .iter()
            .filter(|(recipient, _)| *recipient == user)
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl Notifier for ScriptedGateway {
    async fn send_private(
        &self,
        user: UserId,
        message: OutboundMessage,
    ) -> Result<(), GatewayError> {
        self.privates
            .lock()
            .expect("gateway poisoned")
            .push((user, message.text));
        Ok(())
    }

    async fn await_private_reply(
        &self,
        _user: UserId,
        _deadline: Duration,
    ) -> Result<ReplyOutcome, GatewayError> {
        Ok(self
            .replies
            .lock()
            .expect("gateway poisoned")
            .pop_front()
            .unwrap_or(ReplyOutcome::TimedOut))
    }

    async fn send_ephemeral(&self, user: UserId, text: &str) -> Result<(), GatewayError> {
        self.ephemerals
            .lock()
            .expect("gateway poisoned")
            .push((user, text.to_string()));
        Ok(())
    }
}

#[async_trait]
impl ChannelOps for ScriptedGateway {
    async fn post(
        &self,
        channel: ChannelId,
        message: OutboundMessage,
    ) -> Result<MessageId, GatewayError> {
        let id = MessageId(self.next());
        self.history
            .lock()
            .expect("gateway poisoned")
            .entry(channel)
            .or_default()
            .insert(
                0,
                ScannedMessage {
                    id,
                    authored_by_self: true,
                    has_controls: message.has_controls(),
                },
            );
        self.posts
            .lock()
            .expect("gateway poisoned")
            .push((channel, message));
        Ok(id)
    }

    async fn edit(
        &self,
        channel: ChannelId,
        message: MessageId,
        replacement: OutboundMessage,
    ) -> Result<(), GatewayError> {
        self.edits
            .lock()
            .expect("gateway poisoned")
            .push((channel, message, replacement));
        Ok(())
    }

    async fn scan_recent(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<ScannedMessage>, GatewayError> {
        let history = self.history.lock().expect("gateway poisoned");
        Ok(history
            .get(&channel)
            .map(|messages| messages.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_or_create_category(&self, name: &str) -> Result<ChannelId, GatewayError> {
        let mut categories = self.categories.lock().expect("gateway poisoned");
        if let Some(existing) = categories.get(name) {
            return Ok(*existing);
        }
        let id = ChannelId(1000 + self.next());
        categories.insert(name.to_string(), id);
        Ok(id)
    }

    async fn create_private_channel(
        &self,
        _category: ChannelId,
        name: &str,
        visibility: ChannelVisibility,
    ) -> Result<ChannelId, GatewayError> {
        let id = ChannelId(2000 + self.next());
        self.created
            .lock()
            .expect("gateway poisoned")
            .push((id, name.to_string(), visibility));
        Ok(id)
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), GatewayError> {
        self.deleted.lock().expect("gateway poisoned").push(channel);
        Ok(())
    }
}

#[async_trait]
impl Directory for ScriptedGateway {
    async fn fetch_member(&self, user: UserId) -> Result<Option<Member>, GatewayError> {
        Ok(self
            .members
            .lock()
            .expect("gateway poisoned")
            .contains(&user)
            .then(|| Member {
                id: user,
                display_name: format!("user-{user}"),
            }))
    }

    async fn member_has_role(&self, user: UserId, _role: RoleId) -> Result<bool, GatewayError> {
        Ok(self
            .role_holders
            .lock()
            .expect("gateway poisoned")
            .contains(&user))
    }

    async fn grant_role(
        &self,
        user: UserId,
        role: RoleId,
        _reason: &str,
    ) -> Result<(), GatewayError> {
        self.granted.lock().expect("gateway poisoned").push((user, role));
        self.role_holders
            .lock()
            .expect("gateway poisoned")
            .insert(user);
        Ok(())
    }

    async fn has_capability(
        &self,
        user: UserId,
        capability: Capability,
    ) -> Result<bool, GatewayError> {
        let holders = match capability {
            Capability::Moderator => self.moderators.lock().expect("gateway poisoned"),
            Capability::Administrator => self.admins.lock().expect("gateway poisoned"),
        };
        Ok(holders.contains(&user))
    }
}

/// The full workflow stack wired over one scripted gateway. The serve loop
/// and the demo build from here so their wiring cannot drift apart.
pub(crate) struct Services {
    pub(crate) gateway: Arc<ScriptedGateway>,
    pub(crate) membership: Arc<MembershipService>,
    pub(crate) tickets: Arc<TicketChannelManager>,
    pub(crate) publisher: Arc<AnnouncementPublisher>,
    pub(crate) entry_points: Vec<EntryPoint>,
}

pub(crate) fn build_services(config: &AppConfig, fast: bool) -> Services {
    let gateway = Arc::new(ScriptedGateway::default());
    let store = Arc::new(InMemoryApplicationStore::default());
    let ledger = Arc::new(InMemoryTicketLedger::default());

    let question_grace = if fast {
        Duration::ZERO
    } else {
        config.membership.question_grace
    };
    let close_delay = if fast {
        Duration::ZERO
    } else {
        config.tickets.close_delay
    };

    let membership = Arc::new(MembershipService::new(
        store,
        gateway.clone(),
        gateway.clone(),
        gateway.clone(),
        MembershipConfig {
            staff_channel: config.channels.staff,
            announcements_channel: config.channels.announcements,
            member_role: config.membership.member_role,
            server_address: config.membership.server_address.clone(),
            interview: InterviewConfig {
                reply_deadline: config.membership.reply_deadline,
                question_grace,
            },
        },
    ));
    let tickets = Arc::new(TicketChannelManager::new(
        gateway.clone(),
        gateway.clone(),
        gateway.clone(),
        ledger,
        TicketConfig {
            category_name: config.tickets.category_name.clone(),
            close_delay,
        },
    ));
    let publisher = Arc::new(AnnouncementPublisher::new(
        gateway.clone(),
        config.publisher.scan_window,
    ));

    let entry_points = vec![
        EntryPoint {
            channel: config.channels.applications,
            message: content::application_call_to_action(),
        },
        EntryPoint {
            channel: config.channels.reports,
            message: content::report_call_to_action(),
        },
        EntryPoint {
            channel: config.channels.info,
            message: content::informational(),
        },
    ];

    Services {
        gateway,
        membership,
        tickets,
        publisher,
        entry_points,
    }
}
