#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Narrator,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    User(String),
    Narration {
        speaker: Speaker,
        text: String,
        /// The underlying action failed.
        failed: bool,
    },
    System(String),
}
