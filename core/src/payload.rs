//! `PayloadBuilder` — the client-side configuration of matched boxes.

use crate::{Animation, BoxId, MatchedBox, Position, TriggerKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Wire projection of one box, as the front-end script reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxPayload {
    /// Box id.
    pub id: BoxId,
    /// Trigger kind.
    pub trigger: TriggerKind,
    /// Scroll percentage.
    pub trigger_percentage: u32,
    /// Element selector.
    pub trigger_element_selector: String,
    /// Entrance animation.
    pub animation: Animation,
    /// Days to stay hidden after dismissal.
    pub cookie_time: u32,
    /// Ignore the dismissal cookie.
    pub test_mode: bool,
    /// Hide again when scrolling back up.
    pub auto_hide: bool,
    /// Anchor position.
    pub position: Position,
    /// Hide threshold in pixels, 0 = never.
    pub minimum_screen_width: u32,
}

impl From<&MatchedBox> for BoxPayload {
    fn from(matched: &MatchedBox) -> Self {
        let opts = &matched.options;
        Self {
            id: matched.post.id,
            trigger: opts.trigger,
            trigger_percentage: opts.trigger_percentage,
            trigger_element_selector: opts.trigger_element.clone(),
            animation: opts.animation,
            cookie_time: opts.cookie_days,
            test_mode: opts.test_mode,
            auto_hide: opts.auto_hide,
            position: opts.css.position,
            minimum_screen_width: opts.minimum_screen_width,
        }
    }
}

/// Payload of a request, keyed by box id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<BoxId, BoxPayload>);

impl Payload {
    /// The entry of a box.
    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&BoxPayload> {
        self.0.get(&id)
    }

    /// Entries by ascending id.
    pub fn iter(&self) -> impl Iterator<Item = &BoxPayload> {
        self.0.values()
    }

    /// Number of boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no boxes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize to a JSON object keyed by box id.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; the payload types themselves always
    /// serialize.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Render the inline script assignment, e.g.
    /// `var STB_Options = {"12":{...}};`.
    ///
    /// `</` is escaped so the JSON cannot close the surrounding `<script>`.
    ///
    /// # Errors
    ///
    /// See [`Payload::to_json`].
    pub fn to_script(&self, var_name: &str) -> Result<String, serde_json::Error> {
        let json = self.to_json()?.replace("</", "<\\/");
        Ok(format!("var {var_name} = {json};"))
    }
}

/// Builds the [`Payload`] from loaded boxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadBuilder;

impl PayloadBuilder {
    /// Project every published box. Unpublished boxes are skipped.
    #[must_use]
    pub fn build(matched: &[MatchedBox]) -> Payload {
        Payload(
            matched
                .iter()
                .filter(|m| m.post.is_published())
                .map(|m| (m.post.id, BoxPayload::from(m)))
                .collect(),
        )
    }
}
