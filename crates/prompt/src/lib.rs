//! # Prompt
//!
//! Builds the message lists sent to the language model.
//!
//! - [`ChatMessage`] / [`MessageRole`]: one element of an OpenAI `messages` array.
//! - [`EXPERT_ROLES`]: personas; one is picked at random for every summary and expert answer.
//! - Builders for each generation task: [`summary_messages`], [`expert_messages`],
//!   [`translation_messages`], [`random_fact_messages`], [`history_fact_messages`].
//!
//! Chat history lines are rendered as `username: text`; the bot's own messages become
//! assistant turns so the model sees its earlier answers as its own.

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

pub const UNKNOWN_USER: &str = "Unknown user";

pub const EXPERT_ROLES: [&str; 10] = [
    "You are a respected research historian who travels through the ages to uncover the truth.",
    "My thoughts live in tomorrow. I am a futurist who sees the possible paths of the future.",
    "From the summit of the mountain of knowledge I contemplate the depths of being. I am a hermit philosopher.",
    "The case is tangled, but no riddle withstands a sharp mind. I am a detective of pure logic.",
    "My words are colourful threads that weave a tapestry of imagination. I am a dreaming poet.",
    "Years of experience have given me wisdom. I am here to share it and help you find your way. I am a wise mentor.",
    "Life is short, so let's smile! I am an optimistic humorist.",
    "The whole world is my laboratory and knowledge is my toolkit. I am an experimental scientist.",
    "The world is a blank canvas and I paint it with imagination. I am a fantasy artist.",
    "I listen with my heart and understand the depths of the soul. I am an empathetic psychologist.",
];

/// Renders one chat line as `username: text`.
pub fn chat_line(username: Option<&str>, text: &str) -> String {
    format!("{}: {}", username.unwrap_or(UNKNOWN_USER), text)
}

/// One history turn: the bot's own messages are assistant turns, everyone else's are user turns.
pub fn history_turn(from_bot: bool, username: Option<&str>, text: &str) -> ChatMessage {
    if from_bot {
        ChatMessage::assistant(text)
    } else {
        ChatMessage::user(chat_line(username, text))
    }
}

pub fn summary_system_prompt(role: &str) -> String {
    format!(
        "{role}\n\n\
         Your task is to write concise, informative and objective digests of group chats.\n\
         The digest must:\n\
         - Highlight the 3-6 MOST important topics or events discussed.\n\
         - For each topic, briefly describe the discussion and any decisions or conclusions.\n\
         - Ignore greetings, flood, memes and insignificant messages.\n\
         - Use short, clear bullets or a numbered list.\n\
         - Stay under 300 tokens in total.\n\
         - Focus on facts. Always mention the usernames or names of the people who took part in the key topics.\n\
         - Write in the voice of your role with a light tone, while staying professional and objective.\n\
         - Answer in the language most of the chat is written in."
    )
}

pub fn expert_system_prompt(role: &str) -> String {
    format!(
        "{role}\n\n\
         Keep your answer short and to the point, never more than 180 tokens.\n\
         Always give factually correct information, in a tone that fits your role.\n\
         Do NOT open with phrases like \"Here is my expert opinion:\", \"My take:\" or \"Answer:\". Go straight to the point.\n\
         Answer in the language of the question."
    )
}

pub fn translator_system_prompt(target_language: &str) -> String {
    format!(
        "You are a high-quality translator. Translate the given text into {target_language}.\n\n\
         If the text is a joke or contains humour, the main goal is for the translation to be funny and clear to \
         {target_language} speakers: adapt wordplay, cultural references and context so the humour survives.\n\n\
         If the text is not humorous (a fact, a news item, general text), translate it accurately and naturally, \
         keeping the original meaning and style. Do not add humour where there is none.\n\n\
         Output only the translation."
    )
}

pub const RANDOM_FACT_SYSTEM: &str =
    "You share one interesting random fact (1-2 sentences) from any field: life, sport, science, history, art and so on.";
pub const RANDOM_FACT_REQUEST: &str =
    "Give me one interesting random fact (1-2 sentences) from any field: life, sport, science, history, art and so on.";

pub const HISTORY_FACT_SYSTEM: &str =
    "You share one short (2-3 sentences) interesting historical fact from the history of any country in the world. Double-check that it is accurate and true.";
pub const HISTORY_FACT_REQUEST: &str =
    "Give me one short (2-3 sentences) interesting historical fact from the history of any country. Make sure it is accurate.";

/// System prompt for `role`, then one user turn per chat line.
pub fn summary_messages<'a, I>(role: &str, lines: I) -> Vec<ChatMessage>
where
    I: IntoIterator<Item = (Option<&'a str>, &'a str)>,
{
    let mut messages = vec![ChatMessage::system(summary_system_prompt(role))];
    messages.extend(
        lines
            .into_iter()
            .map(|(username, text)| ChatMessage::user(chat_line(username, text))),
    );
    messages
}

/// System prompt for `role`, the recent history in order, then the question.
pub fn expert_messages(role: &str, history: Vec<ChatMessage>, question: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(expert_system_prompt(role)));
    messages.extend(history);
    messages.push(ChatMessage::user(question));
    messages
}

pub fn translation_messages(text: &str, target_language: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(translator_system_prompt(target_language)),
        ChatMessage::user(text),
    ]
}

pub fn random_fact_messages() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(RANDOM_FACT_SYSTEM),
        ChatMessage::user(RANDOM_FACT_REQUEST),
    ]
}

pub fn history_fact_messages() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(HISTORY_FACT_SYSTEM),
        ChatMessage::user(HISTORY_FACT_REQUEST),
    ]
}
