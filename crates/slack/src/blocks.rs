//! Typed Block Kit fragments.
//!
//! Only the pieces roombot renders are modelled: text objects, select
//! options, four interactive elements, five block kinds, modal views and the
//! `response_action` bodies Slack accepts after a view submission.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::payloads::{MenuAction, ModalCallback};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    #[serde(rename = "mrkdwn")]
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text } | Self::Mrkdwn { text } => text,
        }
    }
}

/// Option object used by select menus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub text: TextObject,
    pub value: String,
}

impl SelectOption {
    /// Label and value are the same string.
    pub fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self { text: TextObject::plain(value.clone()), value }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action: MenuAction, label: impl Into<String>) -> Self {
        Self {
            action_id: action.as_str().to_owned(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatepickerElement {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StaticSelectElement {
    pub action_id: String,
    pub placeholder: TextObject,
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_option: Option<SelectOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlainTextInputElement {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Button(ButtonElement),
    Datepicker(DatepickerElement),
    StaticSelect(StaticSelectElement),
    PlainTextInput(PlainTextInputElement),
}

impl Element {
    pub fn datepicker(action_id: impl Into<String>, initial_date: Option<String>) -> Self {
        Self::Datepicker(DatepickerElement {
            action_id: action_id.into(),
            initial_date,
            placeholder: Some(TextObject::plain("Select a date")),
        })
    }

    /// `initial` must be the value of one of `options`; anything else is dropped.
    pub fn static_select(
        action_id: impl Into<String>,
        placeholder: impl Into<String>,
        options: Vec<SelectOption>,
        initial: Option<&str>,
    ) -> Self {
        let initial_option =
            initial.and_then(|value| options.iter().find(|option| option.value == value).cloned());
        Self::StaticSelect(StaticSelectElement {
            action_id: action_id.into(),
            placeholder: TextObject::plain(placeholder),
            options,
            initial_option,
        })
    }

    pub fn plain_text_input(
        action_id: impl Into<String>,
        placeholder: impl Into<String>,
        initial_value: Option<String>,
    ) -> Self {
        Self::PlainTextInput(PlainTextInputElement {
            action_id: action_id.into(),
            placeholder: Some(TextObject::plain(placeholder)),
            initial_value: initial_value.filter(|value| !value.trim().is_empty()),
            max_length: Some(100),
        })
    }

    pub fn action_id(&self) -> &str {
        match self {
            Self::Button(element) => &element.action_id,
            Self::Datepicker(element) => &element.action_id,
            Self::StaticSelect(element) => &element.action_id,
            Self::PlainTextInput(element) => &element.action_id,
        }
    }
}

impl From<ButtonElement> for Element {
    fn from(value: ButtonElement) -> Self {
        Self::Button(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        block_id: String,
        text: TextObject,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<Element>,
    },
    Divider,
    Input {
        block_id: String,
        label: TextObject,
        element: Element,
    },
    Actions {
        block_id: String,
        elements: Vec<Element>,
    },
    Context {
        block_id: String,
        elements: Vec<TextObject>,
    },
}

impl Block {
    pub fn section(block_id: impl Into<String>, text: TextObject) -> Self {
        Self::Section { block_id: block_id.into(), text, fields: Vec::new(), accessory: None }
    }

    pub fn input(block_id: impl Into<String>, label: impl Into<String>, element: Element) -> Self {
        Self::Input { block_id: block_id.into(), label: TextObject::plain(label), element }
    }

    pub fn block_id(&self) -> Option<&str> {
        match self {
            Self::Section { block_id, .. }
            | Self::Input { block_id, .. }
            | Self::Actions { block_id, .. }
            | Self::Context { block_id, .. } => Some(block_id),
            Self::Divider => None,
        }
    }
}

/// Channel message body. `fallback_text` is sent as the top-level `text`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    #[serde(rename = "text")]
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(builder.build(block_id.into()));
        self
    }

    pub fn divider(mut self) -> Self {
        self.blocks.push(Block::Divider);
        self
    }

    pub fn input(
        mut self,
        block_id: impl Into<String>,
        label: impl Into<String>,
        element: Element,
    ) -> Self {
        self.blocks.push(Block::input(block_id, label, element));
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
    accessory: Option<Element>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    pub fn accessory(&mut self, element: impl Into<Element>) -> &mut Self {
        self.accessory = Some(element.into());
        self
    }

    fn build(self, block_id: String) -> Block {
        Block::Section {
            block_id,
            text: self.text.unwrap_or_else(|| TextObject::plain(" ")),
            fields: Vec::new(),
            accessory: self.accessory,
        }
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<Element>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(Element::Button(button));
        self
    }

    fn build(self) -> Vec<Element> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModalView {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<ModalCallback>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub private_metadata: String,
    pub title: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<TextObject>,
    pub close: TextObject,
    pub blocks: Vec<Block>,
}

impl ModalView {
    /// A read-only modal with a single close button.
    pub fn new(title: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            kind: "modal",
            callback_id: None,
            private_metadata: String::new(),
            title: TextObject::plain(title),
            submit: None,
            close: TextObject::plain("Close"),
            blocks,
        }
    }

    /// A modal whose submission comes back as `callback`.
    pub fn form(
        callback: ModalCallback,
        title: impl Into<String>,
        submit: impl Into<String>,
        blocks: Vec<Block>,
    ) -> Self {
        Self {
            callback_id: Some(callback),
            submit: Some(TextObject::plain(submit)),
            close: TextObject::plain("Cancel"),
            ..Self::new(title, blocks)
        }
    }

    pub fn private_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.private_metadata = metadata.into();
        self
    }

    pub fn close_label(mut self, label: impl Into<String>) -> Self {
        self.close = TextObject::plain(label);
        self
    }

    pub fn find_block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.block_id() == Some(block_id))
    }
}

/// Body for `views.open` and `views.push`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewRequest<'a> {
    pub trigger_id: &'a str,
    pub view: &'a ModalView,
}

/// Body for `chat.postMessage`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostMessageRequest<'a> {
    pub channel: &'a str,
    #[serde(flatten)]
    pub message: &'a MessageTemplate,
}

/// Synchronous reply to a `view_submission`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "response_action", rename_all = "snake_case")]
pub enum ViewResponse {
    Update { view: ModalView },
    Errors { errors: BTreeMap<String, String> },
    Clear,
}

impl ViewResponse {
    pub fn update(view: ModalView) -> Self {
        Self::Update { view }
    }

    pub fn error(block_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Errors { errors: BTreeMap::from([(block_id.into(), message.into())]) }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        Block, ButtonElement, ButtonStyle, Element, MessageBuilder, ModalView, PostMessageRequest,
        SelectOption, TextObject, ViewResponse,
    };
    use crate::payloads::{MenuAction, ModalCallback};

    #[test]
    fn message_builder_creates_typed_block_structure() {
        let message = MessageBuilder::new("fallback")
            .section("menu.header.v1", |section| {
                section.mrkdwn("*Meeting rooms*");
            })
            .divider()
            .actions("menu.actions.v1", |actions| {
                actions.button(ButtonElement::new(MenuAction::Reserve, "Reserve"));
            })
            .build();

        assert_eq!(message.blocks.len(), 3);
        assert!(matches!(
            &message.blocks[0],
            Block::Section { block_id, text: TextObject::Mrkdwn { .. }, .. }
                if block_id == "menu.header.v1"
        ));
        assert_eq!(message.blocks[1], Block::Divider);
        assert!(matches!(
            &message.blocks[2],
            Block::Actions { elements, .. } if elements[0].action_id() == "reserve"
        ));
    }

    #[test]
    fn blocks_serialize_with_slack_type_tags() {
        let section = MessageBuilder::new("rooms")
            .section("rooms.fuji.v1", |section| {
                section.mrkdwn("*Fuji*").accessory(
                    ButtonElement::new(MenuAction::SelectRoom, "Select")
                        .style(ButtonStyle::Primary)
                        .value("2026-10-16_09:00_10:00_Fuji"),
                );
            })
            .into_blocks();

        let value = serde_json::to_value(&section[0]).expect("serializes");

        assert_eq!(
            value,
            json!({
                "type": "section",
                "block_id": "rooms.fuji.v1",
                "text": {"type": "mrkdwn", "text": "*Fuji*"},
                "accessory": {
                    "type": "button",
                    "action_id": "select_room",
                    "text": {"type": "plain_text", "text": "Select"},
                    "style": "primary",
                    "value": "2026-10-16_09:00_10:00_Fuji"
                }
            })
        );
        assert_eq!(
            serde_json::to_value(Block::Divider).expect("serializes"),
            json!({"type": "divider"})
        );
    }

    #[test]
    fn static_select_drops_unknown_initial_option() {
        let options = vec![SelectOption::same("00"), SelectOption::same("10")];

        let known = Element::static_select("start_minute", "Minute", options.clone(), Some("10"));
        let unknown = Element::static_select("start_minute", "Minute", options, Some("05"));

        assert!(matches!(known, Element::StaticSelect(ref s) if s.initial_option.is_some()));
        assert!(matches!(unknown, Element::StaticSelect(ref s) if s.initial_option.is_none()));
    }

    #[test]
    fn form_modal_carries_callback_and_metadata() {
        let view =
            ModalView::form(ModalCallback::CancelConfirm, "Cancel reservation", "Yes", vec![])
                .private_metadata("evt-1")
                .close_label("No");

        let value = serde_json::to_value(&view).expect("serializes");

        assert_eq!(value["type"], "modal");
        assert_eq!(value["callback_id"], "cancel_confirm");
        assert_eq!(value["private_metadata"], "evt-1");
        assert_eq!(value["submit"]["text"], "Yes");
        assert_eq!(value["close"]["text"], "No");
    }

    #[test]
    fn read_only_modal_omits_submit_and_callback() {
        let value =
            serde_json::to_value(ModalView::new("Reservations", vec![])).expect("serializes");

        assert!(value.get("submit").is_none());
        assert!(value.get("callback_id").is_none());
        assert!(value.get("private_metadata").is_none());
    }

    #[test]
    fn view_responses_use_response_action_tag() {
        assert_eq!(
            serde_json::to_value(ViewResponse::error("name_block", "Enter your name."))
                .expect("serializes"),
            json!({"response_action": "errors", "errors": {"name_block": "Enter your name."}})
        );
        assert_eq!(
            serde_json::to_value(ViewResponse::Clear).expect("serializes"),
            json!({"response_action": "clear"})
        );
        let update = serde_json::to_value(ViewResponse::update(ModalView::new("Done", vec![])))
            .expect("serializes");
        assert_eq!(update["response_action"], "update");
        assert_eq!(update["view"]["title"]["text"], "Done");
    }

    #[test]
    fn post_message_request_flattens_the_template() {
        let message = MessageBuilder::new("menu").build();
        let value = serde_json::to_value(PostMessageRequest { channel: "C1", message: &message })
            .expect("serializes");

        assert_eq!(value, json!({"channel": "C1", "text": "menu", "blocks": []}));
    }
}
