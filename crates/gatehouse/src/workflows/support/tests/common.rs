use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::gateway::{
    Capability, ChannelId, ChannelOps, ChannelVisibility, Directory, GatewayError, Member,
    MessageId, Notifier, OutboundMessage, ReplyOutcome, RoleId, ScannedMessage, UserId,
};
use crate::workflows::support::domain::Ticket;
use crate::workflows::support::ledger::{LedgerError, TicketLedger};
use crate::workflows::support::tickets::{TicketChannelManager, TicketConfig};

/// In-memory platform stand-in for the ticket workflow.
#[derive(Default)]
pub(super) struct FakeSupportGateway {
    next_channel: AtomicU64,
    pub(super) categories: Mutex<HashMap<String, ChannelId>>,
    pub(super) created: Mutex<Vec<(ChannelId, String, ChannelVisibility)>>,
    pub(super) posts: Mutex<Vec<(ChannelId, OutboundMessage)>>,
    pub(super) deleted: Mutex<Vec<ChannelId>>,
    pub(super) ephemerals: Mutex<Vec<(UserId, String)>>,
    pub(super) admins: Mutex<HashSet<UserId>>,
    pub(super) fail_create: AtomicBool,
    pub(super) fail_delete: AtomicBool,
}

impl FakeSupportGateway {
    pub(super) fn add_admin(&self, user: UserId) {
        self.admins.lock().unwrap().insert(user);
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
impl Notifier for FakeSupportGateway {
    async fn send_private(
        &self,
        _user: UserId,
        _message: OutboundMessage,
    ) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn await_private_reply(
        &self,
        _user: UserId,
        _deadline: Duration,
    ) -> Result<ReplyOutcome, GatewayError> {
        Ok(ReplyOutcome::TimedOut)
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
impl ChannelOps for FakeSupportGateway {
    async fn post(
        &self,
        channel: ChannelId,
        message: OutboundMessage,
    ) -> Result<MessageId, GatewayError> {
        let mut posts = self.posts.lock().unwrap();
        posts.push((channel, message));
        Ok(MessageId(posts.len() as u64))
    }

    async fn edit(
        &self,
        _channel: ChannelId,
        _message: MessageId,
        _replacement: OutboundMessage,
    ) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn scan_recent(
        &self,
        _channel: ChannelId,
        _limit: usize,
    ) -> Result<Vec<ScannedMessage>, GatewayError> {
        Ok(Vec::new())
    }

    async fn find_or_create_category(&self, name: &str) -> Result<ChannelId, GatewayError> {
        let mut categories = self.categories.lock().unwrap();
        if let Some(existing) = categories.get(name) {
            return Ok(*existing);
        }
        let id = ChannelId(1000 + self.next_channel.fetch_add(1, Ordering::Relaxed));
        categories.insert(name.to_string(), id);
        Ok(id)
    }

    async fn create_private_channel(
        &self,
        _category: ChannelId,
        name: &str,
        visibility: ChannelVisibility,
    ) -> Result<ChannelId, GatewayError> {
        if self.fail_create.load(Ordering::Relaxed) {
            return Err(GatewayError::Transport("channel quota exceeded".to_string()));
        }
        let id = ChannelId(2000 + self.next_channel.fetch_add(1, Ordering::Relaxed));
        self.created
            .lock()
            .unwrap()
            .push((id, name.to_string(), visibility));
        Ok(id)
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), GatewayError> {
        if self.fail_delete.load(Ordering::Relaxed) {
            return Err(GatewayError::Transport("deletion rejected".to_string()));
        }
        self.deleted.lock().unwrap().push(channel);
        Ok(())
    }
}

#[async_trait]
impl Directory for FakeSupportGateway {
    async fn fetch_member(&self, user: UserId) -> Result<Option<Member>, GatewayError> {
        Ok(Some(Member {
            id: user,
            display_name: format!("user-{user}"),
        }))
    }

    async fn member_has_role(&self, _user: UserId, _role: RoleId) -> Result<bool, GatewayError> {
        Ok(false)
    }

    async fn grant_role(
        &self,
        _user: UserId,
        _role: RoleId,
        _reason: &str,
    ) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn has_capability(
        &self,
        user: UserId,
        capability: Capability,
    ) -> Result<bool, GatewayError> {
        match capability {
            Capability::Administrator => Ok(self.admins.lock().unwrap().contains(&user)),
            Capability::Moderator => Ok(false),
        }
    }
}

#[derive(Default)]
pub(super) struct MemoryLedger {
    tickets: Mutex<HashMap<ChannelId, Ticket>>,
}

impl TicketLedger for MemoryLedger {
    fn record(&self, ticket: Ticket) -> Result<Ticket, LedgerError> {
        self.tickets
            .lock()
            .expect("ledger mutex poisoned")
            .insert(ticket.channel, ticket.clone());
        Ok(ticket)
    }

    fn find_by_channel(&self, channel: ChannelId) -> Result<Option<Ticket>, LedgerError> {
        Ok(self
            .tickets
            .lock()
            .expect("ledger mutex poisoned")
            .get(&channel)
            .cloned())
    }

    fn mark_closed(&self, channel: ChannelId) -> Result<Ticket, LedgerError> {
        let mut tickets = self.tickets.lock().expect("ledger mutex poisoned");
        let ticket = tickets.get_mut(&channel).ok_or(LedgerError::NotFound)?;
        ticket.open = false;
        Ok(ticket.clone())
    }
}

pub(super) fn build_manager() -> (
    TicketChannelManager,
    Arc<FakeSupportGateway>,
    Arc<MemoryLedger>,
) {
    let gateway = Arc::new(FakeSupportGateway::default());
    let ledger = Arc::new(MemoryLedger::default());
    let manager = TicketChannelManager::new(
        gateway.clone(),
        gateway.clone(),
        gateway.clone(),
        ledger.clone(),
        TicketConfig::default(),
    );
    (manager, gateway, ledger)
}
