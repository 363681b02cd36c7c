// Channel store - explicit owner of the nine channel records
use crate::domain::channel::{Channel, ChannelId, Status};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store shared between the ingest worker (sole writer) and read-only handlers.
pub type SharedStore = Arc<RwLock<ChannelStore>>;

#[derive(Debug, Clone)]
pub struct ChannelStore {
    channels: [Channel; 9],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemStats {
    pub critical: usize,
    pub warning: usize,
    pub normal: usize,
    pub active_alerts: usize,
    pub online: usize,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self {
            channels: ChannelId::ALL.map(Channel::new),
        }
    }

    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::new()))
    }

    fn index_of(id: ChannelId) -> usize {
        // ALL is the declaration order of the enum.
        id as usize
    }

    pub fn get(&self, id: ChannelId) -> &Channel {
        &self.channels[Self::index_of(id)]
    }

    pub fn get_mut(&mut self, id: ChannelId) -> &mut Channel {
        &mut self.channels[Self::index_of(id)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn snapshot(&self) -> Vec<Channel> {
        self.channels.to_vec()
    }

    pub fn stats(&self) -> SystemStats {
        let mut stats = SystemStats {
            online: self.channels.len(),
            ..Default::default()
        };

        for channel in &self.channels {
            match channel.status {
                Status::Critical => stats.critical += 1,
                Status::Warning => stats.warning += 1,
                Status::Normal => stats.normal += 1,
            }
        }
        stats.active_alerts = stats.critical + stats.warning;

        stats
    }
}

impl Default for ChannelStore {
    fn default() -> Self {
        Self::new()
    }
}
