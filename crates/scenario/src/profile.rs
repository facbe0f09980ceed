//! Persona tables for the two traffic mixes.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Traffic mix to simulate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// Idle pollers, active chatters and occasional newcomers.
    #[default]
    Baseline,
    /// Chat-heavy mix with experts working the help-desk queue.
    HelpDesk,
}

/// Where personas record and look up conversations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversationScope {
    /// One list shared by every persona through the registry.
    Global,
    /// Each persona only sees the conversations it created itself.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonaKind {
    Idle,
    Active,
    New,
    Expert,
}

impl PersonaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PersonaKind::Idle => "idle",
            PersonaKind::Active => "active",
            PersonaKind::New => "new",
            PersonaKind::Expert => "expert",
        }
    }
}

impl fmt::Display for PersonaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Conversation, message and (where the persona polls it) queue updates.
    Poll,
    SendMessage,
    CreateConversation,
    /// Fetch the expert queue and maybe claim a waiting conversation.
    PollQueue,
    /// Reply in one of the persona's claimed conversations.
    Respond,
}

/// Pause between two actions of one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitTime {
    Constant(Duration),
    /// Uniform between the two bounds, inclusive.
    Between(Duration, Duration),
}

impl WaitTime {
    pub fn between_secs(min: u64, max: u64) -> Self {
        WaitTime::Between(Duration::from_secs(min), Duration::from_secs(max))
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            WaitTime::Constant(d) => d,
            WaitTime::Between(min, max) if max > min => {
                Duration::from_secs_f64(rng.gen_range(min.as_secs_f64()..=max.as_secs_f64()))
            }
            WaitTime::Between(min, _) => min,
        }
    }
}

/// Everything the runner needs to know about one persona.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaSpec {
    pub kind: PersonaKind,
    /// Relative share of spawned sessions.
    pub weight: u32,
    pub wait: WaitTime,
    /// Recurring actions with their relative weights.
    pub actions: Vec<(Action, u32)>,
    /// Whether this persona's poll includes the expert queue.
    pub polls_queue: bool,
}

impl Profile {
    pub fn personas(self) -> Vec<PersonaSpec> {
        let idle = PersonaSpec {
            kind: PersonaKind::Idle,
            weight: 10,
            wait: WaitTime::Constant(Duration::from_secs(5)),
            actions: vec![(Action::Poll, 1)],
            polls_queue: true,
        };
        let new = PersonaSpec {
            kind: PersonaKind::New,
            weight: 1,
            wait: WaitTime::between_secs(10, 20),
            actions: vec![(Action::Poll, 1)],
            polls_queue: false,
        };

        match self {
            Profile::Baseline => vec![
                idle,
                PersonaSpec {
                    kind: PersonaKind::Active,
                    weight: 5,
                    wait: WaitTime::between_secs(1, 3),
                    actions: vec![
                        (Action::SendMessage, 3),
                        (Action::CreateConversation, 1),
                        (Action::Poll, 2),
                    ],
                    polls_queue: true,
                },
                new,
            ],
            Profile::HelpDesk => vec![
                idle,
                PersonaSpec {
                    kind: PersonaKind::Active,
                    weight: 30,
                    wait: WaitTime::between_secs(2, 5),
                    actions: vec![
                        (Action::SendMessage, 5),
                        (Action::CreateConversation, 2),
                        (Action::Poll, 1),
                    ],
                    polls_queue: true,
                },
                new,
                PersonaSpec {
                    kind: PersonaKind::Expert,
                    weight: 10,
                    wait: WaitTime::between_secs(3, 7),
                    actions: vec![
                        (Action::PollQueue, 3),
                        (Action::Respond, 5),
                        (Action::Poll, 1),
                    ],
                    polls_queue: true,
                },
            ],
        }
    }

    pub fn persona(self, kind: PersonaKind) -> Option<PersonaSpec> {
        self.personas().into_iter().find(|spec| spec.kind == kind)
    }

    pub fn default_scope(self) -> ConversationScope {
        match self {
            Profile::Baseline => ConversationScope::Global,
            Profile::HelpDesk => ConversationScope::Local,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Profile::Baseline => "baseline",
            Profile::HelpDesk => "help-desk",
        })
    }
}
