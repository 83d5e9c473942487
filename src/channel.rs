// CLASSIFICATION: COMMUNITY
// Filename: channel.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Bridge channel identity.
//!
//! A channel is the routing key the bridge uses to pair one client's request
//! queue with the browser that answers it. Minting a new channel orphans any
//! relayed call still waiting on the old one.

use std::fmt;
use std::sync::Mutex;

use log::info;
use uuid::Uuid;

use crate::error::{CyError, CyResult};

/// Opaque correlation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel(Uuid);

impl Channel {
    /// Fresh random (v4) channel.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Holder of the most recently minted channel.
#[derive(Debug, Default)]
pub struct ChannelSlot {
    current: Mutex<Option<Channel>>,
}

impl ChannelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a channel and make it current.
    pub fn new_channel(&self) -> CyResult<Channel> {
        let channel = Channel::generate();
        *self
            .current
            .lock()
            .map_err(|_| CyError::LockPoisoned("channel"))? = Some(channel);
        info!("minted bridge channel {channel}");
        Ok(channel)
    }

    /// Last minted channel, if any.
    pub fn current_channel(&self) -> CyResult<Option<Channel>> {
        Ok(*self
            .current
            .lock()
            .map_err(|_| CyError::LockPoisoned("channel"))?)
    }

    /// Current channel, minting one on first use.
    pub fn current_or_new(&self) -> CyResult<Channel> {
        let mut slot = self
            .current
            .lock()
            .map_err(|_| CyError::LockPoisoned("channel"))?;
        Ok(*slot.get_or_insert_with(|| {
            let channel = Channel::generate();
            info!("minted bridge channel {channel}");
            channel
        }))
    }
}
