//! Message dispatcher - Routes incoming events to commands

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::matcher::find_command;
use super::parser::{parse_card_action, strip_bot_name};
use super::pipeline::{self, Invocation};
use super::router::{Delivery, ReplyRouter, ReplyTarget};
use crate::application::commands::{EchoCommand, HelpCommand};
use crate::application::errors::{BotError, ConfigError};
use crate::application::services::ApprovalPolicy;
use crate::domain::entities::{Command, CommandContext, CommandRegistry, IncomingEvent, Person, Response};
use crate::domain::traits::MessagingApi;

/// Default device registration endpoint of the realtime transport
pub const DEFAULT_DEVICE_URL: &str = "https://wdm-a.wbx2.com/wdm/api/v1/devices";

/// Handler for events no command matched
#[async_trait]
pub trait DefaultHandler: Send + Sync {
    async fn handle(&self, event: &IncomingEvent) -> Result<(), BotError>;
}

#[async_trait]
impl<F> DefaultHandler for F
where
    F: Fn(&IncomingEvent) -> Result<(), BotError> + Send + Sync,
{
    async fn handle(&self, event: &IncomingEvent) -> Result<(), BotError> {
        self(event)
    }
}

/// Backoff for the startup identity lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Give up after this many attempts; `None` retries until the backend answers
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_attempts: None,
        }
    }
}

/// Proxies used by the HTTP client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
}

/// Everything a bot is constructed from
///
/// `token`, `proxy` and `log_level` are consumed by the host when it builds
/// the send-adapter and installs logging; the dispatcher reads the rest.
#[derive(Clone)]
pub struct BotSettings {
    pub token: String,
    pub approved_users: Vec<String>,
    pub approved_domains: Vec<String>,
    pub approved_rooms: Vec<String>,
    pub device_url: String,
    pub include_demo_commands: bool,
    pub bot_name: String,
    pub help_subtitle: String,
    pub threads: bool,
    /// Replaces the built-in help command
    pub help_command: Option<Arc<dyn Command>>,
    pub log_level: String,
    pub proxy: Option<ProxySettings>,
    pub retry: RetryPolicy,
}

impl BotSettings {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            approved_users: Vec::new(),
            approved_domains: Vec::new(),
            approved_rooms: Vec::new(),
            device_url: DEFAULT_DEVICE_URL.to_string(),
            include_demo_commands: false,
            bot_name: "Webex Bot".to_string(),
            help_subtitle: "Here are my available commands. Click one to begin.".to_string(),
            threads: true,
            help_command: None,
            log_level: "INFO".to_string(),
            proxy: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Look up the bot's own identity, backing off while the backend is unreachable
pub async fn fetch_identity(api: &dyn MessagingApi, policy: RetryPolicy) -> Result<Person, BotError> {
    let mut attempt: u32 = 0;
    let mut delay = policy.initial_delay;
    loop {
        attempt += 1;
        match api.me().await {
            Ok(me) => {
                tracing::info!(
                    "Running as {} '{}' with email {:?}",
                    me.person_type.as_deref().unwrap_or("bot"),
                    me.display_name,
                    me.emails
                );
                tracing::debug!("Running as bot '{:?}'", me);
                return Ok(me);
            }
            Err(e) if e.is_connection_error() && policy.max_attempts.map_or(true, |max| attempt < max) => {
                tracing::warn!(error = %e, attempt, "Identity lookup failed, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Owns the registered commands and approval policy, and drives each event
/// through matching, execution and reply delivery
pub struct MessageDispatcher {
    api: Arc<dyn MessagingApi>,
    registry: CommandRegistry,
    approval: ApprovalPolicy,
    help_command: Arc<dyn Command>,
    default_handler: Option<Arc<dyn DefaultHandler>>,
    router: ReplyRouter,
    identity: Person,
    bot_name: String,
}

impl MessageDispatcher {
    /// Build the bot: register the built-in commands and fetch the bot's identity
    pub async fn start(settings: BotSettings, api: Arc<dyn MessagingApi>) -> Result<Self, BotError> {
        tracing::info!("Registering bot with Webex cloud");
        tracing::debug!("Device endpoint: {}", settings.device_url);

        let help_command = settings
            .help_command
            .clone()
            .unwrap_or_else(|| Arc::new(HelpCommand::new(settings.help_subtitle.clone())) as Arc<dyn Command>);

        let mut registry = CommandRegistry::new();
        registry.register(help_command.clone())?;
        if settings.include_demo_commands {
            registry.register(Arc::new(EchoCommand))?;
        }

        let approval = ApprovalPolicy::new(
            settings.approved_users,
            settings.approved_domains,
            settings.approved_rooms,
        );
        approval.is_open();

        let identity = fetch_identity(api.as_ref(), settings.retry).await?;

        Ok(Self {
            router: ReplyRouter::new(api.clone(), settings.threads),
            api,
            registry,
            approval,
            help_command,
            default_handler: None,
            identity,
            bot_name: settings.bot_name,
        })
    }

    /// Register a command and its chained commands
    pub fn add_command(&mut self, command: Arc<dyn Command>) -> Result<(), ConfigError> {
        self.registry.register(command)
    }

    /// Set the handler for messages no command matches
    pub fn set_default_handler<H: DefaultHandler + 'static>(&mut self, handler: H) {
        self.default_handler = Some(Arc::new(handler));
    }

    pub fn commands(&self) -> &[Arc<dyn Command>] {
        self.registry.list()
    }

    pub fn identity(&self) -> &Person {
        &self.identity
    }

    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    /// Send a plain text message to a room, outside of any command
    pub async fn send_message(&self, text: &str, room_id: &str) -> Result<String, BotError> {
        let message = Response::new().with_room(room_id).with_text(text);
        self.api.create_message(&message).await
    }

    /// Handle a text message delivered by the transport
    pub async fn process_incoming_message(&self, event: &IncomingEvent) -> Result<Delivery, BotError> {
        if !event.activity.is_from_person() {
            tracing::debug!("message is from a bot, ignoring");
            return Ok(Delivery::NoReply);
        }

        tracing::info!("Message from {}: {}", event.person_email, event.text);

        if !self.approval.check(self.api.as_ref(), &event.person_email, self.approval.rooms()).await {
            return Ok(Delivery::NoReply);
        }

        let raw_message = if event.is_one_on_one() {
            event.text.clone()
        } else {
            strip_bot_name(&event.text, &self.identity.display_name)
        };

        self.process_raw_command(&raw_message, event, false).await
    }

    /// Handle a card submission delivered by the transport
    pub async fn process_incoming_card_action(&self, event: &IncomingEvent) -> Result<Delivery, BotError> {
        let invocation = parse_card_action(event);
        tracing::debug!(
            "raw_message (callback) ='{}' is_card_callback_command={}",
            invocation.raw_message,
            invocation.is_card_callback
        );

        if !self.approval.check(self.api.as_ref(), &event.person_email, self.approval.rooms()).await {
            return Ok(Delivery::NoReply);
        }

        self.process_raw_command(&invocation.raw_message, event, invocation.is_card_callback)
            .await
    }

    async fn process_raw_command(
        &self,
        raw_message: &str,
        event: &IncomingEvent,
        is_card_callback: bool,
    ) -> Result<Delivery, BotError> {
        let command = match find_command(self.registry.list(), raw_message, is_card_callback) {
            Some(command) => {
                tracing::info!("Found command: {}", command.keyword());
                let rooms = command.approved_rooms();
                if !rooms.is_empty() && !self.approval.check(self.api.as_ref(), &event.person_email, rooms).await {
                    tracing::info!(
                        "{} is not allowed to run command: '{}'",
                        event.person_email,
                        command.keyword()
                    );
                    return Ok(Delivery::NoReply);
                }
                command
            }
            None => {
                tracing::warn!("Did not find command for {}.", raw_message.to_lowercase());
                if let Some(handler) = &self.default_handler {
                    tracing::info!("Using fallback handler for unmatched message.");
                    handler.handle(event).await?;
                    return Ok(Delivery::NoReply);
                }
                self.help_command.clone()
            }
        };

        let ctx = CommandContext {
            event,
            commands: self.registry.list(),
        };
        let target = ReplyTarget {
            room_id: &event.room_id,
            user_email: &event.person_email,
            is_one_on_one: event.is_one_on_one(),
            thread_root_id: Some(event.activity.thread_root_id()),
        };
        let invocation = Invocation {
            command: command.as_ref(),
            raw_message,
            is_card_callback,
        };

        pipeline::execute(invocation, &ctx, self.api.as_ref(), &self.router, &target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde_json::{json, Map, Value};

    use crate::application::commands::KeywordCommand;
    use crate::application::errors::CommandError;
    use crate::domain::entities::{Activity, ActorType, Reply};
    use crate::testing::RecordingApi;

    const ROOM: &str = "room-1";
    const USER: &str = "a@example.com";

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            max_attempts: Some(5),
        }
    }

    fn settings() -> BotSettings {
        let mut settings = BotSettings::new("token");
        settings.retry = fast_retry();
        settings
    }

    async fn dispatcher(settings: BotSettings, api: Arc<RecordingApi>) -> MessageDispatcher {
        MessageDispatcher::start(settings, api).await.unwrap()
    }

    fn shared_text(text: &str) -> IncomingEvent {
        IncomingEvent::text(ROOM, USER, text, Activity::from_person("act-1", USER))
    }

    fn card(inputs: Value) -> IncomingEvent {
        let Value::Object(map) = inputs else { panic!("inputs must be an object") };
        IncomingEvent::card_action(ROOM, map, Activity::from_person("act-2", USER)).with_message_id("card-msg")
    }

    #[tokio::test]
    async fn test_start_registers_help_and_demo_commands() {
        let api = Arc::new(RecordingApi::new());
        let mut with_demo = settings();
        with_demo.include_demo_commands = true;

        let bot = dispatcher(with_demo, api.clone()).await;
        let keywords: Vec<_> = bot.commands().iter().map(|c| c.keyword()).collect();
        assert_eq!(keywords, vec!["help", "echo"]);
        assert_eq!(bot.identity().display_name, "Relay Bot");

        let plain = dispatcher(settings(), api).await;
        assert_eq!(plain.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_identity_lookup_retries_connection_errors() {
        let api = Arc::new(RecordingApi::new().with_me_failures(2));
        let bot = dispatcher(settings(), api.clone()).await;
        assert_eq!(api.me_calls(), 3);
        assert_eq!(bot.identity().id, "bot-id");
    }

    #[tokio::test]
    async fn test_identity_lookup_gives_up_after_max_attempts() {
        let api = Arc::new(RecordingApi::new().with_me_failures(10));
        let result = MessageDispatcher::start(settings(), api.clone()).await;
        assert!(matches!(result, Err(BotError::Network(_))));
        assert_eq!(api.me_calls(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_callback_keyword_fails_add_command() {
        let api = Arc::new(RecordingApi::new());
        let mut bot = dispatcher(settings(), api).await;
        bot.add_command(Arc::new(KeywordCommand::new("a").with_callback_keyword("cb"))).unwrap();
        let err = bot
            .add_command(Arc::new(KeywordCommand::new("b").with_callback_keyword("cb")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCallbackKeyword { .. }));
    }

    #[tokio::test]
    async fn test_bot_authored_messages_are_ignored() {
        let api = Arc::new(RecordingApi::new());
        let bot = dispatcher(settings(), api.clone()).await;
        let event = IncomingEvent::text(ROOM, USER, "help", Activity::new("act", ActorType::Bot, USER));

        let delivery = bot.process_incoming_message(&event).await.unwrap();
        assert_eq!(delivery, Delivery::NoReply);
        assert!(api.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unapproved_user_gets_silence() {
        let api = Arc::new(RecordingApi::new());
        let mut restricted = settings();
        restricted.approved_domains = vec!["corp.com".to_string()];
        let bot = dispatcher(restricted, api.clone()).await;

        let delivery = bot.process_incoming_message(&shared_text("help")).await.unwrap();
        assert_eq!(delivery, Delivery::NoReply);
        assert!(api.sent().is_empty());

        let card_delivery = bot.process_incoming_card_action(&card(json!({ "command_keyword": "help" }))).await.unwrap();
        assert_eq!(card_delivery, Delivery::NoReply);
        assert!(api.sent().is_empty());
    }

    #[tokio::test]
    async fn test_bot_name_is_stripped_in_shared_rooms() {
        let api = Arc::new(RecordingApi::new());
        let mut bot = dispatcher(settings(), api.clone()).await;
        bot.add_command(Arc::new(
            KeywordCommand::new("ping")
                .exact()
                .with_handler(|msg, _| Ok(Some(Reply::text(format!("pong{msg}"))))),
        ))
        .unwrap();

        bot.process_incoming_message(&shared_text("Relay Bot ping")).await.unwrap();
        assert_eq!(api.sent()[0].markdown.as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn test_bot_name_is_kept_in_one_on_one() {
        let api = Arc::new(RecordingApi::new());
        let mut bot = dispatcher(settings(), api.clone()).await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bot.set_default_handler(move |event: &IncomingEvent| -> Result<(), BotError> {
            sink.lock().unwrap().push(event.text.clone());
            Ok(())
        });
        bot.add_command(Arc::new(KeywordCommand::new("ping").exact())).unwrap();

        let event = IncomingEvent::text(ROOM, USER, "Relay Bot ping", Activity::from_person("act", USER).one_on_one());
        let delivery = bot.process_incoming_message(&event).await.unwrap();

        assert_eq!(delivery, Delivery::NoReply);
        assert_eq!(*seen.lock().unwrap(), vec!["Relay Bot ping".to_string()]);
        assert!(api.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_text_falls_back_to_help() {
        let api = Arc::new(RecordingApi::new());
        let mut with_demo = settings();
        with_demo.include_demo_commands = true;
        let mut bot = dispatcher(with_demo, api.clone()).await;
        bot.add_command(Arc::new(KeywordCommand::new("weather").with_help("Current weather.")))
            .unwrap();

        let delivery = bot.process_incoming_message(&shared_text("what can you do?")).await.unwrap();

        assert_eq!(delivery, Delivery::Sent);
        let sent = api.sent();
        assert_eq!(sent.len(), 1);
        let help = sent[0].markdown.as_deref().unwrap();
        assert!(help.contains("\\echo - Echo back what you said."));
        assert!(help.contains("\\weather - Current weather."));
        assert!(!help.contains("\\help"));
        assert_eq!(sent[0].parent_id.as_deref(), Some("act-1"));
    }

    #[tokio::test]
    async fn test_custom_help_command_replaces_built_in() {
        let api = Arc::new(RecordingApi::new());
        let mut custom = settings();
        custom.help_command = Some(Arc::new(
            KeywordCommand::new("menu").with_handler(|_, _| Ok(Some(Reply::text("custom menu")))),
        ));
        let bot = dispatcher(custom, api.clone()).await;

        let keywords: Vec<_> = bot.commands().iter().map(|c| c.keyword()).collect();
        assert_eq!(keywords, vec!["menu"]);

        bot.process_incoming_message(&shared_text("help")).await.unwrap();
        bot.process_incoming_message(&shared_text("menu")).await.unwrap();

        let bodies: Vec<_> = api.sent().into_iter().filter_map(|m| m.markdown).collect();
        assert_eq!(bodies, vec!["custom menu", "custom menu"]);
    }

    #[tokio::test]
    async fn test_domain_error_reply_goes_to_room_and_dispatch_succeeds() {
        let api = Arc::new(RecordingApi::new());
        let mut bot = dispatcher(settings(), api.clone()).await;
        bot.add_command(Arc::new(
            KeywordCommand::new("fail").with_handler(|_, _| Err(CommandError::reply("sorry", "backend 503"))),
        ))
        .unwrap();

        let delivery = bot.process_incoming_message(&shared_text("fail now")).await.unwrap();

        assert_eq!(delivery, Delivery::Sent);
        let sent = api.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].room_id.as_deref(), Some(ROOM));
        assert_eq!(sent[0].to_person_email, None);
        assert_eq!(sent[0].markdown.as_deref(), Some("sorry"));
    }

    #[tokio::test]
    async fn test_unhandled_failure_escapes_dispatch() {
        let api = Arc::new(RecordingApi::new());
        let mut bot = dispatcher(settings(), api.clone()).await;
        bot.add_command(Arc::new(
            KeywordCommand::new("crash").with_handler(|_, _| Err(CommandError::ExecutionFailed("boom".to_string()))),
        ))
        .unwrap();

        let result = bot.process_incoming_message(&shared_text("crash")).await;
        assert!(matches!(result, Err(BotError::Command(CommandError::ExecutionFailed(_)))));
    }

    #[tokio::test]
    async fn test_room_restricted_command_checks_command_rooms() {
        let api = Arc::new(RecordingApi::new().with_member("admins", "boss@example.com"));
        let mut bot = dispatcher(settings(), api.clone()).await;
        bot.add_command(Arc::new(
            KeywordCommand::new("deploy")
                .with_approved_rooms(vec!["admins".to_string()])
                .with_handler(|_, _| Ok(Some(Reply::text("deploying")))),
        ))
        .unwrap();

        bot.process_incoming_message(&shared_text("deploy")).await.unwrap();
        assert!(api.sent().is_empty());

        let boss = IncomingEvent::text(ROOM, "boss@example.com", "deploy", Activity::from_person("act", "boss@example.com"));
        bot.process_incoming_message(&boss).await.unwrap();
        assert_eq!(api.sent().len(), 1);
        assert_eq!(api.membership_lookups(), vec!["admins", "admins"]);
    }

    #[tokio::test]
    async fn test_card_callback_runs_callback_and_deletes_card() {
        let api = Arc::new(RecordingApi::new());
        let mut bot = dispatcher(settings(), api.clone()).await;
        bot.add_command(Arc::new(
            KeywordCommand::new("")
                .with_callback_keyword("survey_submit")
                .deleting_previous_message()
                .with_handler(|_, ctx| {
                    let answer = ctx.event.input("answer").unwrap_or("nothing");
                    Ok(Some(Reply::text(format!("Thanks, you picked {answer}"))))
                }),
        ))
        .unwrap();

        let event = card(json!({ "callback_keyword": "Survey_Submit", "answer": "blue" }));
        bot.process_incoming_card_action(&event).await.unwrap();

        assert_eq!(api.deleted(), vec!["card-msg"]);
        assert_eq!(api.sent()[0].markdown.as_deref(), Some("Thanks, you picked blue"));
    }

    #[tokio::test]
    async fn test_card_command_keyword_opens_card() {
        let api = Arc::new(RecordingApi::new());
        let mut bot = dispatcher(settings(), api.clone()).await;
        bot.add_command(Arc::new(
            KeywordCommand::new("survey")
                .with_card(json!({ "type": "AdaptiveCard", "body": [] }))
                .with_callback_keyword("survey_submit"),
        ))
        .unwrap();

        bot.process_incoming_card_action(&card(json!({ "command_keyword": "survey" }))).await.unwrap();

        let sent = api.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].attachments.len(), 1);
        assert_eq!(sent[0].room_id.as_deref(), Some(ROOM));
    }

    #[tokio::test]
    async fn test_threads_disabled_replies_are_flat() {
        let api = Arc::new(RecordingApi::new());
        let mut flat = settings();
        flat.threads = false;
        flat.include_demo_commands = true;
        let bot = dispatcher(flat, api.clone()).await;

        let event = IncomingEvent::text(ROOM, USER, "echo hi", Activity::from_person("act", USER).with_parent("root"));
        bot.process_incoming_message(&event).await.unwrap();

        let sent = api.sent();
        assert_eq!(sent[0].markdown.as_deref(), Some("You said: hi"));
        assert_eq!(sent[0].parent_id, None);
    }

    #[tokio::test]
    async fn test_send_message_posts_text_to_room() {
        let api = Arc::new(RecordingApi::new());
        let bot = dispatcher(settings(), api.clone()).await;
        let id = bot.send_message("Deploy finished", "ops-room").await.unwrap();
        assert_eq!(id, "msg-1");
        assert_eq!(api.sent(), vec![Response::new().with_room("ops-room").with_text("Deploy finished")]);
    }

    #[tokio::test]
    async fn test_concurrent_events_are_dispatched_independently() {
        let api = Arc::new(RecordingApi::new());
        let mut with_demo = settings();
        with_demo.include_demo_commands = true;
        let bot = Arc::new(dispatcher(with_demo, api.clone()).await);

        let mut tasks = Vec::new();
        for i in 0..8 {
            let bot = bot.clone();
            tasks.push(tokio::spawn(async move {
                let email = format!("user{i}@example.com");
                let event = IncomingEvent::text(format!("room-{i}"), email.clone(), format!("echo {i}"), Activity::from_person(format!("act-{i}"), email));
                bot.process_incoming_message(&event).await
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), Delivery::Sent);
        }

        let sent = api.sent();
        assert_eq!(sent.len(), 8);
        for i in 0..8 {
            let room = format!("room-{i}");
            let reply = sent.iter().find(|m| m.room_id.as_deref() == Some(room.as_str())).unwrap();
            assert_eq!(reply.markdown.as_deref(), Some(format!("You said: {i}").as_str()));
        }
    }

    #[test]
    fn test_card_inputs_helper_builds_objects() {
        let event = card(Value::Object(Map::new()));
        assert!(event.inputs().unwrap().is_empty());
    }
}
