/// Receiver of numeric readings, `NaN` marks the reading unavailable
pub trait NumericSink {
    fn publish(&mut self, value: f32);

    fn publish_unavailable(&mut self) {
        self.publish(f32::NAN);
    }
}

/// Receiver of discrete on/off states
pub trait BinarySink {
    fn publish(&mut self, state: bool);

    fn publish_unavailable(&mut self);
}

impl<F: FnMut(f32)> NumericSink for F {
    fn publish(&mut self, value: f32) {
        self(value)
    }
}

/// `None` is delivered when the state is unavailable
impl<F: FnMut(Option<bool>)> BinarySink for F {
    fn publish(&mut self, state: bool) {
        self(Some(state))
    }

    fn publish_unavailable(&mut self) {
        self(None)
    }
}
