// Purpose - external collaborators: audio output, display, MIDI decoding

pub mod audio;
pub mod display;
pub mod midi;

pub use audio::{AudioSink, CpalSink, ManualSink, SignalSlot, SignalSource};
pub use display::{DisplaySink, NullDisplay};
pub use midi::MidiEvent;
