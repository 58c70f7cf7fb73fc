use super::{factory::VoiceFactory, voice::Voice};

/// Fixed set of voices, built once and indexed by slot.
///
/// The pool owns every voice for the lifetime of the synth; everything else
/// refers to voices by index. All lookups are bounds-checked and return
/// `None` for a bad index instead of panicking.
pub struct VoicePool<V> {
    voices: Box<[V]>,
}

impl<V: Voice> VoicePool<V> {
    pub fn new<F>(size: usize, factory: &F) -> Self
    where
        F: VoiceFactory<Voice = V>,
    {
        let voices = (0..size).map(|index| factory.create_voice(index)).collect();
        Self { voices }
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&V> {
        self.voices.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut V> {
        self.voices.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.voices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.voices.iter_mut()
    }

    /// Resolve the unison master of the voice at `index`.
    pub fn unison_master(&self, index: usize) -> Option<&V> {
        let master = self.get(index)?.unison().master;
        self.get(master)
    }

    /// Number of voices currently producing sound.
    pub fn playing_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_playing()).count()
    }
}
