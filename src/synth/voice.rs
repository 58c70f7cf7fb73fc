/// Lifecycle of a pooled voice, derived from its key-on and playing flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    /// Key off, silent. Available for allocation
    #[default]
    Idle,
    /// Key on, sounding
    Triggered,
    /// Key off, still sounding its release tail. Also available for allocation
    Releasing,
}

/// Position of a voice inside a unison stack.
///
/// The master is referred to by pool index and resolved through the pool at
/// use time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnisonInfo {
    /// Pool index of the first voice allocated for the note
    pub master: usize,
    /// Number of voices stacked on the note
    pub size: usize,
    /// This voice's position in the stack, 0 for the master
    pub role: usize,
}

impl UnisonInfo {
    pub fn new(master: usize, size: usize, role: usize) -> Self {
        Self { master, size, role }
    }

    pub fn is_master(&self) -> bool {
        self.role == 0
    }
}

/// One sound generator in the pool.
///
/// The controller only drives the state machine; the synthesis behind
/// `next_sample` is up to the implementation. Every method is called from the
/// render path and must not block or allocate.
pub trait Voice: Send {
    /// Stable pool index, assigned at construction.
    fn index(&self) -> usize;

    /// Note number currently assigned to the voice.
    fn note(&self) -> u8;

    fn velocity(&self) -> u8;

    fn is_key_on(&self) -> bool;

    /// True while the voice produces sound, including its release tail.
    fn is_playing(&self) -> bool;

    /// Change note and velocity without restarting the sound.
    fn set_note(&mut self, note: u8, velocity: u8);

    /// Start or restart sounding `note`. Sets key-on.
    fn trigger(&mut self, note: u8, velocity: u8);

    /// Begin the release tail. Clears key-on; playing may stay true.
    fn release(&mut self);

    fn set_unison(&mut self, unison: UnisonInfo);

    fn unison(&self) -> UnisonInfo;

    /// Produce the next output sample.
    fn next_sample(&mut self) -> f32;

    fn state(&self) -> VoiceState {
        match (self.is_key_on(), self.is_playing()) {
            (true, _) => VoiceState::Triggered,
            (false, true) => VoiceState::Releasing,
            (false, false) => VoiceState::Idle,
        }
    }
}
