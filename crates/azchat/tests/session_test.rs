use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use azchat::chat_completions::{
    ChatCompletion, ChatCompletionRequest, ChatCompletionResponse, Role,
};
use azchat::session::{BANNER, LineReader, PROMPT, Session};
use azchat::transcript::Transcript;
use azchat::{Error, Result};

/// Answers each call with the next queued outcome and records the requests.
#[derive(Clone, Default)]
struct StubClient {
    outcomes: Arc<Mutex<VecDeque<Result<ChatCompletionResponse>>>>,
    requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
}

impl StubClient {
    fn reply(self, content: &str) -> Self {
        let body = serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        });
        self.push(Ok(serde_json::from_value(body).unwrap()))
    }

    fn fail(self, error: Error) -> Self {
        self.push(Err(error))
    }

    fn push(self, outcome: Result<ChatCompletionResponse>) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatCompletion for StubClient {
    async fn chat_completions(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Protocol("no stubbed response".to_string())))
    }
}

/// Feeds fixed lines and then reports end-of-input.
struct Script {
    lines: VecDeque<String>,
    prompts: Vec<String>,
}

impl Script {
    fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            prompts: Vec::new(),
        }
    }
}

impl LineReader for Script {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front())
    }
}

async fn run(session: &mut Session<StubClient>, script: &mut Script) -> (String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    session.run(script, &mut out, &mut err).await.unwrap();
    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[tokio::test]
async fn test_successful_turn_appends_user_and_reply() {
    let client = StubClient::default().reply("hi there");
    let mut session = Session::new(client.clone(), Transcript::default());

    let reply = session.turn("hello").await.unwrap();
    assert_eq!("hi there", reply);

    let messages = session.transcript().messages();
    assert_eq!(3, messages.len());
    assert_eq!(Role::System, messages[0].role());
    assert_eq!((Role::User, "hello"), (messages[1].role(), messages[1].content()));
    assert_eq!(
        (Role::Assistant, "hi there"),
        (messages[2].role(), messages[2].content())
    );

    let requests = client.requests.lock().unwrap();
    assert_eq!(2, requests[0].messages.len());
    assert_eq!(Some(0.2), requests[0].temperature);
    assert_eq!(Some(false), requests[0].stream);
}

#[tokio::test]
async fn test_failed_turn_leaves_transcript_untouched() {
    let client = StubClient::default()
        .reply("first")
        .fail(Error::Http {
            status: 500,
            body: "boom".to_string(),
        })
        .fail(Error::Protocol("No choices in response".to_string()));
    let mut session = Session::new(client, Transcript::default());
    session.turn("one").await.unwrap();
    let before = session.transcript().clone();

    assert!(session.turn("two").await.is_err());
    assert_eq!(&before, session.transcript());

    assert!(session.turn("three").await.is_err());
    assert_eq!(&before, session.transcript());
}

#[tokio::test]
async fn test_hello_reset_exit() {
    let client = StubClient::default().reply("hi there");
    let mut session = Session::new(client.clone(), Transcript::default());
    let mut script = Script::new(&["hello", "reset", "exit", "never read"]);

    let (out, err) = run(&mut session, &mut script).await;

    assert_eq!(
        format!("{BANNER}\nAssistant> hi there\n(history cleared)\n"),
        out
    );
    assert_eq!("", err);
    assert_eq!(1, session.transcript().len());
    assert_eq!(1, client.calls());
    assert_eq!(vec![PROMPT; 3], script.prompts);
    assert_eq!(1, script.lines.len());
}

#[tokio::test]
async fn test_http_error_is_reported_and_rolled_back() {
    let client = StubClient::default()
        .fail(Error::Http {
            status: 401,
            body: r#"{"error":{"code":"401","message":"Access denied"}}"#.to_string(),
        })
        .reply("recovered");
    let mut session = Session::new(client, Transcript::default());
    let mut script = Script::new(&["hello", "hello again", "quit"]);

    let (out, err) = run(&mut session, &mut script).await;

    assert!(err.starts_with("Error: HTTP 401"), "{err}");
    assert!(err.contains("Access denied"));
    assert_eq!(format!("{BANNER}\nAssistant> recovered\n"), out);

    let contents: Vec<&str> = session
        .transcript()
        .messages()
        .iter()
        .map(|m| m.content())
        .collect();
    assert_eq!(
        vec!["You are a helpful assistant.", "hello again", "recovered"],
        contents
    );
    assert_eq!(3, script.prompts.len());
}

#[tokio::test]
async fn test_blank_lines_and_commands_are_not_sent() {
    let client = StubClient::default();
    let mut session = Session::new(client.clone(), Transcript::new("Be brief."));
    let mut script = Script::new(&["", "   ", "RESET", "Exit"]);

    let (out, err) = run(&mut session, &mut script).await;

    assert_eq!(format!("{BANNER}\n(history cleared)\n"), out);
    assert_eq!("", err);
    assert_eq!(0, client.calls());
    assert_eq!(&Transcript::new("Be brief."), session.transcript());
}

#[tokio::test]
async fn test_end_of_input_prints_newline() {
    let client = StubClient::default().reply("sure");
    let mut session = Session::new(client, Transcript::default());
    let mut script = Script::new(&["  tell me a joke  "]);

    let (out, _) = run(&mut session, &mut script).await;

    assert_eq!(format!("{BANNER}\nAssistant> sure\n\n"), out);
    assert_eq!(
        Some("tell me a joke"),
        session.transcript().messages().get(1).map(|m| m.content())
    );
}
