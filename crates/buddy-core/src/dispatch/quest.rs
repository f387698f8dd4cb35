//! Interaction, quest menus and turn-ins.

use buddy_types::{AgentId, EntityGuid, ItemId, QuestId, QuestStatus};
use tracing::debug;

use super::Dispatcher;
use crate::capability::{Capability, GameWorld, Interactable, InteractableKind};

impl<W: GameWorld> Dispatcher<W> {
    /// Interact with a creature or game object by low GUID.
    pub(super) fn interact(&self, agent: AgentId, target: EntityGuid) -> bool {
        let Some(entity) = self.world.resolve_interactable(agent, target) else {
            debug!(agent_id = %agent, target = %target, "interact target not found");
            return false;
        };

        if entity.quest_giver {
            return self.quest_flow(agent, &entity);
        }
        match entity.kind {
            InteractableKind::Creature => {
                self.act(agent, Capability::GossipHello, &entity.guid.to_string())
            }
            InteractableKind::Object => self.act(agent, Capability::Use, &entity.name),
        }
    }

    /// Work through a quest giver's menu: turn-ins first, then accepts.
    /// Falls back to gossip (creatures) or `use` (objects) when nothing on
    /// the menu went through.
    fn quest_flow(&self, agent: AgentId, giver: &Interactable) -> bool {
        let in_range = self.world.agent_position(agent).is_some_and(|me| {
            me.distance_to(&giver.position) <= self.quest.interaction_distance
        });
        if !in_range {
            debug!(agent_id = %agent, giver = %giver.guid, "quest giver out of range");
            return false;
        }
        self.world.face(agent, giver.guid);

        let menu = self.world.quest_menu(agent, giver.guid);
        let mut handled = false;
        for entry in &menu {
            let quest = entry.quest;
            if self.world.quest_status(agent, quest) == QuestStatus::Complete
                && self.world.can_reward_quest(agent, quest)
            {
                handled |= self.turn_in_quest(agent, quest);
            }
        }
        for entry in &menu {
            let quest = entry.quest;
            if self.world.quest_status(agent, quest) == QuestStatus::None
                && self.world.can_take_quest(agent, quest)
            {
                handled |= self.act(agent, Capability::AcceptQuest, &quest.to_string());
            }
        }
        if handled {
            return true;
        }

        debug!(agent_id = %agent, giver = %giver.guid, "quest menu empty, trying gossip");
        match giver.kind {
            InteractableKind::Creature => {
                self.gossip_for_quest(agent, giver.guid)
                    || self.act(agent, Capability::GossipHello, &giver.guid.to_string())
            }
            InteractableKind::Object => self.act(agent, Capability::Use, &giver.name),
        }
    }

    fn gossip_for_quest(&self, agent: AgentId, giver: EntityGuid) -> bool {
        if !self.world.open_gossip(agent, giver) {
            return false;
        }
        let keywords = &self.quest.gossip_keywords;
        self.world
            .gossip_options(agent, giver)
            .into_iter()
            .find(|option| keywords.matches(&option.text))
            .is_some_and(|option| self.world.select_gossip_option(agent, giver, option.index))
    }

    /// Turn in a completed quest at an ender within interaction distance.
    pub(super) fn turn_in_quest(&self, agent: AgentId, quest: QuestId) -> bool {
        let world = &self.world;
        let ready = world.quest_exists(quest)
            && world.quest_status(agent, quest) == QuestStatus::Complete
            && world.can_reward_quest(agent, quest)
            && !world.quest_rewarded(agent, quest);
        if !ready {
            debug!(agent_id = %agent, quest = %quest, "quest not ready for turn-in");
            return false;
        }

        let enders = world.quest_enders_in_range(agent, quest, self.quest.interaction_distance);
        if enders.is_empty() {
            debug!(agent_id = %agent, quest = %quest, "no quest ender in range");
            return false;
        }

        if let Some(item) = self.pick_reward(agent, quest) {
            world.choose_reward(agent, quest, item);
        }
        self.act(agent, Capability::TurnInQueryQuest, &quest.to_string())
    }

    /// The first reward the agent can use, or the first offered.
    fn pick_reward(&self, agent: AgentId, quest: QuestId) -> Option<ItemId> {
        let choices = self.world.reward_choices(quest);
        choices
            .iter()
            .copied()
            .find(|&item| self.world.can_use_item(agent, item))
            .or_else(|| choices.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use buddy_types::{Command, ObjectView, Position};

    use super::*;
    use crate::capability::WorldQuery;
    use crate::dispatch::tests::{BOT, dispatcher, world_with_bot};
    use crate::sandbox::{
        SandboxWorld, ScenarioAgent, ScenarioCreature, ScenarioObject, ScenarioQuest,
    };

    const MARSHAL: EntityGuid = EntityGuid(17);
    const DONE: QuestId = QuestId(7);
    const NEW: QuestId = QuestId(8);

    fn quest_hub(marshal_at: f32) -> SandboxWorld {
        let mut world = world_with_bot();
        let mut marshal =
            ScenarioCreature::new(MARSHAL, "Marshal McBride", Position::new(marshal_at, 0.0, 0.0));
        marshal.quest_menu = vec![DONE, NEW];
        marshal.gossip_options = vec!["Goodbye".to_owned(), "I have a quest for you".to_owned()];
        world.add_creature(marshal);

        let mut done = ScenarioQuest::new(DONE);
        done.enders = vec![MARSHAL];
        done.reward_choices = vec![ItemId(99), ItemId(100)];
        world.add_quest(done);
        world.add_quest(ScenarioQuest::new(NEW));
        world
    }

    #[test]
    fn quest_giver_turns_in_before_accepting() {
        let world = quest_hub(3.0);
        world.set_quest_status(BOT, DONE, QuestStatus::Complete);
        let (dispatcher, world) = dispatcher(world);

        assert!(dispatcher.execute(BOT, &Command::Interact { target: MARSHAL }));
        assert_eq!(
            world.action_names(BOT),
            vec!["face", "choose reward", "turn in query quest", "accept quest"]
        );
        assert_eq!(world.quest_status(BOT, DONE), QuestStatus::Rewarded);
        assert_eq!(world.quest_status(BOT, NEW), QuestStatus::Incomplete);
    }

    #[test]
    fn quest_giver_out_of_range_fails() {
        let world = quest_hub(30.0);
        world.set_quest_status(BOT, DONE, QuestStatus::Complete);
        let (dispatcher, world) = dispatcher(world);

        assert!(!dispatcher.execute(BOT, &Command::Interact { target: MARSHAL }));
        assert!(world.actions().is_empty());
    }

    #[test]
    fn nothing_on_menu_falls_back_to_gossip_keyword() {
        let mut world = quest_hub(3.0);
        world.refuse_action("accept quest");
        let (dispatcher, world) = dispatcher(world);

        assert!(dispatcher.execute(BOT, &Command::Interact { target: MARSHAL }));
        let log = world.actions();
        let names: Vec<&str> = log.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "face",
                "accept quest",
                "accept quest",
                "open gossip",
                "select gossip option"
            ]
        );
        assert_eq!(log.last().map(|a| a.payload.as_str()), Some("1"));
    }

    #[test]
    fn plain_creature_gets_gossip_hello() {
        let mut world = world_with_bot();
        world.add_creature(ScenarioCreature::new(
            EntityGuid(40),
            "Innkeeper Farley",
            Position::new(2.0, 0.0, 0.0),
        ));
        let (dispatcher, world) = dispatcher(world);

        assert!(dispatcher.execute(BOT, &Command::Interact { target: EntityGuid(40) }));
        let last = world.actions().pop();
        assert_eq!(
            last.map(|a| (a.action, a.payload)),
            Some(("gossip hello".to_owned(), "40".to_owned()))
        );
    }

    #[test]
    fn plain_object_is_used_by_name() {
        let mut world = world_with_bot();
        world.add_object(ScenarioObject {
            view: ObjectView {
                guid: EntityGuid(50),
                name: "Mailbox".to_owned(),
                ..ObjectView::default()
            },
            ..ScenarioObject::default()
        });
        let (dispatcher, world) = dispatcher(world);

        assert!(dispatcher.execute(BOT, &Command::Interact { target: EntityGuid(50) }));
        assert_eq!(
            world.actions().pop().map(|a| a.payload),
            Some("Mailbox".to_owned())
        );
        assert!(!dispatcher.execute(BOT, &Command::Interact { target: EntityGuid(404) }));
    }

    #[test]
    fn turn_in_picks_usable_reward() {
        let mut world = SandboxWorld::with_agents(vec![{
            let mut agent = ScenarioAgent::named(BOT, "Ollamatest");
            agent.usable_items = vec![ItemId(100)];
            agent
        }]);
        let mut marshal = ScenarioCreature::new(MARSHAL, "Marshal McBride", Position::default());
        marshal.quest_menu = vec![DONE];
        world.add_creature(marshal);
        let mut done = ScenarioQuest::new(DONE);
        done.enders = vec![MARSHAL];
        done.reward_choices = vec![ItemId(99), ItemId(100)];
        world.add_quest(done);
        world.set_quest_status(BOT, DONE, QuestStatus::Complete);
        let (dispatcher, world) = dispatcher(world);

        assert!(dispatcher.execute(BOT, &Command::TurnInQuest { quest: DONE }));
        let reward = world
            .actions()
            .into_iter()
            .find(|a| a.action == "choose reward")
            .map(|a| a.payload);
        assert_eq!(reward, Some("7 100".to_owned()));
    }

    #[test]
    fn turn_in_requires_complete_and_nearby_ender() {
        let world = quest_hub(30.0);
        let (dispatcher, world) = dispatcher(world);

        assert!(!dispatcher.execute(BOT, &Command::TurnInQuest { quest: DONE }));
        world.set_quest_status(BOT, DONE, QuestStatus::Complete);
        assert!(!dispatcher.execute(BOT, &Command::TurnInQuest { quest: DONE }));
        assert!(!dispatcher.execute(BOT, &Command::TurnInQuest { quest: QuestId(404) }));
        assert!(world.actions().is_empty());
    }
}
