use rtrb::Producer;

/// Receives every rendered sample for visualization.
///
/// Called on the render path: implementations must never block. When the
/// consumer falls behind, samples are dropped.
pub trait DisplaySink: Send {
    fn push_sample(&mut self, value: f32);
}

/// Ring buffer to a display thread. A full ring drops the new sample.
impl DisplaySink for Producer<f32> {
    #[inline]
    fn push_sample(&mut self, value: f32) {
        let _ = self.push(value);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    #[inline]
    fn push_sample(&mut self, _value: f32) {}
}
