use rtrb::Consumer;

use crate::config::KeyMode;

/// Settings changes sent from the control side to the render path.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ControlMessage {
    SetKeyMode(KeyMode),
    SetUnison(usize),
    SetPolyCount(usize),
    AllNotesOff,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ControlMessage>;
}

impl MessageReceiver for Consumer<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        Consumer::pop(self).ok()
    }
}
