// Purpose: voice allocation and triggering above the key table
// This layer decides which pooled voice plays which held key

pub mod controller;
pub mod engine;
pub mod factory;
pub mod message;
pub mod on_list;
pub mod pool;
pub mod snapshot;
pub mod voice;

#[cfg(test)]
mod test_voice;

pub use controller::VoiceController;
pub use engine::{Synth, SynthHandle};
pub use factory::VoiceFactory;
pub use message::{ControlMessage, MessageReceiver};
pub use on_list::OnList;
pub use pool::VoicePool;
pub use snapshot::{VoiceSnapshot, VoiceView, SNAPSHOT_INTERVAL, SNAPSHOT_VOICES};
pub use voice::{UnisonInfo, Voice, VoiceState};
