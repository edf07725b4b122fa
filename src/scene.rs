//! Forwarding of named scene parameters to the host's settings store.
//!
//! The viewer does not interpret these values; it only passes them on.

/// Receives `update_scene_parameter` calls.
pub trait SceneParameterSink {
    fn update(&mut self, id: &str, value: f32);
}

impl<F> SceneParameterSink for F
where
    F: FnMut(&str, f32),
{
    fn update(&mut self, id: &str, value: f32) {
        self(id, value)
    }
}

/// Sink used until the host installs one. Drops everything with a debug log.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreParameters;

impl SceneParameterSink for IgnoreParameters {
    fn update(&mut self, id: &str, value: f32) {
        log::debug!("No scene parameter store; dropping {id} = {value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_sinks() {
        let mut received = Vec::new();
        {
            let mut sink = |id: &str, value: f32| received.push((id.to_string(), value));
            sink.update("speed", 2.0);
            sink.update("hue", 0.5);
        }
        assert_eq!(received, vec![("speed".to_string(), 2.0), ("hue".to_string(), 0.5)]);
    }
}
