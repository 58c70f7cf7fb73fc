use super::voice::Voice;

/// Builds the voices of a pool.
///
/// Called once per pool slot at start-up, with the slot's index, so every
/// voice in a pool is configured identically apart from its index.
pub trait VoiceFactory {
    type Voice: Voice;

    fn create_voice(&self, index: usize) -> Self::Voice;
}

impl<F, V> VoiceFactory for F
where
    F: Fn(usize) -> V,
    V: Voice,
{
    type Voice = V;

    fn create_voice(&self, index: usize) -> Self::Voice {
        self(index)
    }
}
