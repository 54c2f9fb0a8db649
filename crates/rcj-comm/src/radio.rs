use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use bytes::Bytes;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rcj_core::{RadioSettings, TeamColor};

use crate::codec::Packet;

/// A broadcast channel of the simulated radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Referee to all robots.
    Supervisor,
    /// Robots of one team to each other.
    Team(TeamColor),
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Supervisor => write!(f, "supervisor"),
            Channel::Team(team) => write!(f, "team {}", team.code()),
        }
    }
}

struct Inbox {
    channel: Channel,
    packets: VecDeque<Bytes>,
    /// Cleared when the receiver is dropped.
    open: bool,
}

struct RadioState {
    rng: StdRng,
    drop_probability: f64,
    inboxes: Vec<Inbox>,
}

/// An in-process lossy broadcast medium.
///
/// Every packet sent on a channel is copied into the queue of every receiver
/// listening on that channel, including a receiver owned by the sender itself.
/// Each copy is lost independently with the configured probability.
#[derive(Clone)]
pub struct Radio {
    state: Arc<Mutex<RadioState>>,
}

impl Radio {
    pub fn new(settings: &RadioSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: Arc::new(Mutex::new(RadioState {
                rng,
                drop_probability: settings.drop_probability.clamp(0.0, 1.0),
                inboxes: Vec::new(),
            })),
        }
    }

    /// A radio that never loses packets.
    pub fn lossless() -> Self {
        Self::new(&RadioSettings::default())
    }

    pub fn emitter(&self, channel: Channel) -> Emitter {
        Emitter {
            radio: self.clone(),
            channel,
        }
    }

    /// Start listening on `channel`. Only packets sent afterwards are received.
    pub fn receiver(&self, channel: Channel, name: impl Into<String>) -> Receiver {
        let mut state = self.lock();
        // Slots of dropped receivers are reused so the table stays bounded
        let index = match state.inboxes.iter().position(|inbox| !inbox.open) {
            Some(index) => {
                let inbox = &mut state.inboxes[index];
                inbox.channel = channel;
                inbox.packets.clear();
                inbox.open = true;
                index
            }
            None => {
                state.inboxes.push(Inbox {
                    channel,
                    packets: VecDeque::new(),
                    open: true,
                });
                state.inboxes.len() - 1
            }
        };
        Receiver {
            radio: self.clone(),
            index,
            name: name.into(),
        }
    }

    pub fn set_drop_probability(&self, probability: f64) {
        self.lock().drop_probability = probability.clamp(0.0, 1.0);
    }

    fn lock(&self) -> MutexGuard<'_, RadioState> {
        // A panic while holding the lock leaves the queues in a usable state
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Sending end of a channel.
#[derive(Clone)]
pub struct Emitter {
    radio: Radio,
    channel: Channel,
}

impl Emitter {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn send_raw(&self, packet: Bytes) {
        let mut guard = self.radio.lock();
        let state = &mut *guard;
        for inbox in state
            .inboxes
            .iter_mut()
            .filter(|i| i.open && i.channel == self.channel)
        {
            if state.drop_probability > 0.0 && state.rng.gen_bool(state.drop_probability) {
                continue;
            }
            inbox.packets.push_back(packet.clone());
        }
    }

    pub fn send<P: Packet>(&self, packet: &P) {
        self.send_raw(packet.encode());
    }
}

/// Receiving end of a channel with its own packet queue.
pub struct Receiver {
    radio: Radio,
    index: usize,
    name: String,
}

impl Receiver {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queue_length(&self) -> usize {
        self.radio.lock().inboxes[self.index].packets.len()
    }

    pub fn next_packet(&self) -> Option<Bytes> {
        self.radio.lock().inboxes[self.index].packets.pop_front()
    }

    /// Take every queued packet, oldest first.
    pub fn drain_raw(&self) -> Vec<Bytes> {
        self.radio.lock().inboxes[self.index].packets.drain(..).collect()
    }

    /// Decode every queued packet in arrival order. Malformed packets are
    /// logged and dropped.
    pub fn drain<P: Packet>(&self) -> Vec<P> {
        self.drain_raw()
            .into_iter()
            .filter_map(|raw| match P::decode(&raw) {
                Ok(packet) => Some(packet),
                Err(err) => {
                    log::warn!("{}: dropping malformed packet: {}", self.name, err);
                    None
                }
            })
            .collect()
    }

    /// Decode the queue and keep only the newest valid packet.
    ///
    /// More than one queued packet means earlier ones were never acted upon;
    /// that is logged as lost packets.
    pub fn latest<P: Packet>(&self) -> Option<P> {
        let packets = self.drain::<P>();
        if packets.len() > 1 {
            log::debug!(
                "{} - {} receiver - Packets lost: {}",
                self.name,
                P::KIND,
                packets.len() - 1
            );
        }
        packets.into_iter().last()
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        let mut state = self.radio.lock();
        let inbox = &mut state.inboxes[self.index];
        inbox.open = false;
        inbox.packets = VecDeque::new();
    }
}
