use rcj_referee::{ConsoleMessage, ConsoleSink, LogConsole};
use tokio::sync::broadcast;

/// Serializes console messages and hands them to every connected browser.
///
/// Event lines, alerts and logs are also written to the log, so a headless
/// run keeps the same record.
pub struct BroadcastConsole {
    tx: broadcast::Sender<String>,
    log: LogConsole,
}

impl BroadcastConsole {
    pub(crate) fn new(tx: broadcast::Sender<String>) -> Self {
        Self { tx, log: LogConsole }
    }
}

impl ConsoleSink for BroadcastConsole {
    fn send(&mut self, message: ConsoleMessage) {
        match message.to_json() {
            Ok(json) => {
                // No receiver just means nobody has the console open
                let _ = self.tx.send(json);
            }
            Err(err) => log::error!("Failed to serialize {} message: {}", message.msg(), err),
        }
        self.log.send(message);
    }
}
