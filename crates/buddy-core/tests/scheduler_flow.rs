//! End-to-end decision cycles against a scenario world.
//!
//! A scripted inference client hands out canned replies in order and keeps
//! every prompt it was sent, so each test can check both what the model saw
//! and what the world did in response.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use buddy_core::{
    AgentMemoryStore, AgentScheduler, BuddyConfig, ChatMessage, CycleObserver, InferenceClient,
    InferenceError, PromptEngine, SandboxWorld, WorldQuery,
};
use buddy_types::{AgentId, DecisionOutcome, DecisionRecord, QuestId, QuestStatus};

const BOT: AgentId = AgentId(1);

const SCENARIO: &str = r"
agents:
  - id: 1
    name: Ollamatest
    level: 5
    class: Warrior
    race: Human
    position: { x: 0, y: 0, z: 0 }
    combat: { style: Melee }
    health: { current: 120, max: 120 }
creatures:
  - guid: 2241
    name: Kobold Vermin
    level: 3
    disposition: Hostile
    position: { x: 8, y: 0, z: 0 }
  - guid: 17
    name: Marshal McBride
    disposition: Friendly
    position: { x: 1, y: 1, z: 0 }
    quest_menu: [7]
quests:
  - id: 7
    enders: [17]
";

#[derive(Default)]
struct Scripted {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| (*r).to_owned()).collect()),
            prompts: Mutex::default(),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl InferenceClient for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| InferenceError::Transport("script exhausted".to_owned()))
    }
}

#[derive(Default)]
struct Records(Mutex<Vec<DecisionRecord>>);

impl CycleObserver for Records {
    fn on_decision(&self, record: &DecisionRecord) {
        self.0.lock().unwrap().push(record.clone());
    }
}

struct Harness {
    scheduler: AgentScheduler<SandboxWorld, Scripted>,
    world: Arc<SandboxWorld>,
    client: Arc<Scripted>,
    records: Arc<Records>,
}

impl Harness {
    fn new(replies: &[&str]) -> Self {
        let config = BuddyConfig::default();
        let world = Arc::new(SandboxWorld::parse(SCENARIO).unwrap());
        let client = Arc::new(Scripted::with_replies(replies));
        let records = Arc::new(Records::default());
        let scheduler = AgentScheduler::new(
            Arc::clone(&world),
            Arc::clone(&client),
            Arc::new(AgentMemoryStore::new(config.history.capacity)),
            PromptEngine::new(config.combat.clone()).unwrap(),
            &config,
        )
        .with_observer(Arc::clone(&records) as Arc<dyn CycleObserver>);
        Self {
            scheduler,
            world,
            client,
            records,
        }
    }

    async fn cycle(&mut self) {
        let report = self.scheduler.tick();
        assert_eq!(report.launched, 1);
        self.scheduler.drain().await;
    }

    fn outcomes(&self) -> Vec<DecisionOutcome> {
        self.records
            .0
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.outcome)
            .collect()
    }
}

#[tokio::test]
async fn chat_reaches_the_prompt_and_the_attack_is_dispatched() {
    let mut harness = Harness::new(&[
        r#"Alice wants the kobold gone.
{"command":{"type":"attack","params":{"guid":2241}},"reasoning":"Alice asked me to attack","say":"On it!"}"#,
    ]);

    let chat = ChatMessage {
        sender: "Alice".to_owned(),
        text: "ollamatest, kill that kobold".to_owned(),
        from_bot: false,
    };
    let routed = harness
        .scheduler
        .store()
        .deliver_chat(&chat, [(BOT, "Ollamatest")]);
    assert_eq!(routed, vec![BOT]);

    harness.cycle().await;

    let prompts = harness.client.prompts();
    let prompt = prompts.first().unwrap();
    assert!(prompt.contains("***CRITICAL INSTRUCTION:***"));
    assert!(prompt.contains("From Alice: ollamatest, kill that kobold"));
    assert!(prompt.contains("Kobold Vermin"));
    assert_eq!(harness.scheduler.store().pending_messages(BOT), 0);

    assert_eq!(
        harness.world.action_names(BOT),
        vec!["set selection", "reach melee", "dps assist", "say"]
    );
    assert_eq!(harness.outcomes(), vec![DecisionOutcome::Executed]);

    let records = harness.records.0.lock().unwrap();
    let record = records.first().unwrap();
    assert_eq!(record.agent_name, "Ollamatest");
    assert_eq!(record.reasoning.as_deref(), Some("Alice asked me to attack"));
    assert_eq!(record.say.as_deref(), Some("On it!"));
    assert_eq!(
        record.command,
        Some(serde_json::json!({"type": "attack", "params": {"guid": 2241}}))
    );
}

#[tokio::test]
async fn history_from_one_cycle_shows_in_the_next_prompt() {
    let mut harness = Harness::new(&[
        r#"{"command":{"type":"interact","params":{"guid":17}},"reasoning":"Talk to the marshal"}"#,
        r#"{"command":{"type":"stop","params":{}},"reasoning":"Wait here"}"#,
    ]);

    harness.cycle().await;
    assert_eq!(
        harness.world.quest_status(BOT, QuestId(7)),
        QuestStatus::Incomplete
    );

    harness.cycle().await;
    let prompts = harness.client.prompts();
    let second = prompts.get(1).unwrap();
    assert!(second.contains(r#"Command: {"params":{"guid":17},"type":"interact"}"#));
    assert!(second.contains("Reasoning: Talk to the marshal"));
    assert!(!prompts.first().unwrap().contains("Reasoning:"));

    assert_eq!(
        harness.outcomes(),
        vec![DecisionOutcome::Executed, DecisionOutcome::Executed]
    );
}

#[tokio::test]
async fn unusable_reply_then_recovery() {
    let mut harness = Harness::new(&[
        "I am not sure what to do.",
        r#"{"command":{"type":"loot","params":{}}}"#,
    ]);

    harness.cycle().await;
    assert!(harness.world.actions().is_empty());
    assert!(harness.scheduler.store().commands(BOT).is_empty());

    harness.cycle().await;
    assert_eq!(harness.world.action_names(BOT), vec!["loot"]);
    assert_eq!(
        harness.outcomes(),
        vec![DecisionOutcome::ProtocolError, DecisionOutcome::Executed]
    );
}

#[tokio::test]
async fn manual_commands_share_the_dispatcher() {
    let harness = Harness::new(&[]);
    let store = harness.scheduler.store();
    let dispatcher = harness.scheduler.dispatcher();

    assert!(dispatcher.execute_text(BOT, "interact 17", store));
    assert!(!dispatcher.execute_text(BOT, "turninquest 7", store));
    assert_eq!(store.commands(BOT), vec!["interact 17"]);
    assert_eq!(
        harness.world.quest_status(BOT, QuestId(7)),
        QuestStatus::Incomplete
    );
}

#[test]
fn bundled_demo_files_load() {
    let world = SandboxWorld::parse(include_str!("../../../demos/scenario.yaml")).unwrap();
    assert_eq!(world.managed_agents(), vec![AgentId(1), AgentId(2)]);
    assert_eq!(world.agent_name(AgentId(2)).as_deref(), Some("Buddy"));

    let config = BuddyConfig::parse(include_str!("../../../demos/botbuddy.yaml")).unwrap();
    assert_eq!(config.history.capacity, 5);
    assert!(config.quest.gossip_keywords.matches("A QUEST for you"));
}
