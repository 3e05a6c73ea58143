use log::trace;
use tokio::sync::broadcast;
use transport::SensorReading;

const CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub enum Broadcast {
    Sensors(SensorReading),
    /// Raw status payload, exactly as the device sent it.
    Status(Vec<u8>),
}

impl Broadcast {
    pub const fn channel(&self) -> &'static str {
        match self {
            Broadcast::Sensors(_) => "/topic/sensors",
            Broadcast::Status(_) => "/topic/status",
        }
    }
}

pub trait BroadcastSink: Send + Sync {
    fn publish(&self, broadcast: Broadcast);
}

/// Fans every broadcast out to all live subscribers.
#[derive(Clone)]
pub struct Hub {
    sender: broadcast::Sender<Broadcast>,
}

impl Hub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.sender.subscribe()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastSink for Hub {
    fn publish(&self, broadcast: Broadcast) {
        let channel = broadcast.channel();

        match self.sender.send(broadcast) {
            Ok(receivers) => trace!("sent to {receivers} subscribers of {channel}"),
            Err(_) => trace!("no subscribers of {channel}"),
        }
    }
}
