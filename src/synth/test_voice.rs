use super::voice::{UnisonInfo, Voice};

/// Voice that records how it was driven and outputs a constant.
#[derive(Debug, Default)]
pub struct TestVoice {
    pub index: usize,
    pub note: u8,
    pub velocity: u8,
    pub key_on: bool,
    pub playing: bool,
    pub unison: UnisonInfo,
    pub triggers: usize,
    pub releases: usize,
    pub output: f32,
}

impl TestVoice {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            output: (index + 1) as f32,
            ..Default::default()
        }
    }
}

impl Voice for TestVoice {
    fn index(&self) -> usize {
        self.index
    }

    fn note(&self) -> u8 {
        self.note
    }

    fn velocity(&self) -> u8 {
        self.velocity
    }

    fn is_key_on(&self) -> bool {
        self.key_on
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_note(&mut self, note: u8, velocity: u8) {
        self.note = note;
        self.velocity = velocity;
    }

    fn trigger(&mut self, note: u8, velocity: u8) {
        self.set_note(note, velocity);
        self.key_on = true;
        self.playing = true;
        self.triggers += 1;
    }

    fn release(&mut self) {
        self.key_on = false;
        self.releases += 1;
    }

    fn set_unison(&mut self, unison: UnisonInfo) {
        self.unison = unison;
    }

    fn unison(&self) -> UnisonInfo {
        self.unison
    }

    fn next_sample(&mut self) -> f32 {
        self.output
    }
}
