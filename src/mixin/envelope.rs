//! The message sent to a mixin for one step.

use crate::manifest::Step;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// `{<action>: [<step>]}`: the current action and exactly one step.
///
/// Built fresh for every step so a mixin never sees other steps.
#[derive(Debug, Clone, Copy)]
pub struct ActionEnvelope<'a> {
    action: &'a str,
    step: &'a Step,
}

impl<'a> ActionEnvelope<'a> {
    pub fn new(action: &'a str, step: &'a Step) -> Self {
        Self { action, step }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

impl Serialize for ActionEnvelope<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.action, &[self.step])?;
        map.end()
    }
}
