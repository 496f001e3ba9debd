use crate::chat_completions::{ChatCompletionMessage, Role};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Ordered conversation history sent as context on every completion call.
///
/// The first entry is always the system message; [`Transcript::reset`] and
/// [`Transcript::rollback_last`] never remove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    system_prompt: String,
    messages: Vec<ChatCompletionMessage>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        let messages = vec![ChatCompletionMessage::system(system_prompt.clone())];
        Self {
            system_prompt,
            messages,
        }
    }

    /// Drops everything but the system message.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages
            .push(ChatCompletionMessage::system(self.system_prompt.clone()));
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatCompletionMessage::new(role, content));
    }

    /// Removes the most recently appended message. Returns `None` when only
    /// the system message is left.
    pub fn rollback_last(&mut self) -> Option<ChatCompletionMessage> {
        if self.messages.len() > 1 {
            self.messages.pop()
        } else {
            None
        }
    }

    pub fn messages(&self) -> &[ChatCompletionMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatCompletionMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Transcript {
        let mut transcript = Transcript::default();
        transcript.append(Role::User, "hello");
        transcript.append(Role::Assistant, "hi there");
        transcript.append(Role::User, "how are you?");
        transcript.append(Role::Assistant, "fine");
        transcript
    }

    #[test]
    fn test_new_starts_with_system_message() {
        let transcript = Transcript::new("Be brief.");
        assert_eq!(1, transcript.len());
        assert_eq!(&ChatCompletionMessage::system("Be brief."), &transcript.messages()[0]);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut transcript = conversation();
        assert_eq!(5, transcript.len());

        transcript.reset();
        assert_eq!(Transcript::default(), transcript);

        transcript.reset();
        assert_eq!(1, transcript.len());
        assert_eq!(Role::System, transcript.messages()[0].role());
        assert_eq!(DEFAULT_SYSTEM_PROMPT, transcript.messages()[0].content());
    }

    #[test]
    fn test_reset_keeps_custom_system_prompt() {
        let mut transcript = Transcript::new("Answer in French.");
        transcript.append(Role::User, "hello");
        transcript.reset();
        assert_eq!(Transcript::new("Answer in French."), transcript);
    }

    #[test]
    fn test_append_preserves_order() {
        let transcript = conversation();
        let roles: Vec<Role> = transcript.messages().iter().map(|m| m.role()).collect();
        assert_eq!(
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant
            ],
            roles
        );
        assert_eq!(Some("fine"), transcript.last().map(|m| m.content()));
    }

    #[test]
    fn test_rollback_restores_previous_state() {
        for mut transcript in [Transcript::default(), conversation()] {
            let before = transcript.clone();
            transcript.append(Role::User, "pending");

            let removed = transcript.rollback_last();
            assert_eq!(Some(ChatCompletionMessage::user("pending")), removed);
            assert_eq!(before, transcript);
        }
    }

    #[test]
    fn test_rollback_never_removes_system_message() {
        let mut transcript = Transcript::default();
        assert_eq!(None, transcript.rollback_last());
        assert_eq!(None, transcript.rollback_last());
        assert_eq!(1, transcript.len());
        assert!(!transcript.is_empty());
    }
}
