//! Step Sequencer: the six ordered wizard steps and the rule set each one gates on.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::wizard::models::{FileSlot, PersonalField, SectionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Personal = 1,
    Professional = 2,
    Education = 3,
    Experience = 4,
    Skills = 5,
    Terms = 6,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Personal,
        Step::Professional,
        Step::Education,
        Step::Experience,
        Step::Skills,
        Step::Terms,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Option<Step> {
        Step::ALL.get(self.number() as usize).copied()
    }

    pub fn previous(self) -> Option<Step> {
        match self.number() {
            1 => None,
            n => Step::ALL.get(n as usize - 2).copied(),
        }
    }

    /// The checks this step's "next" gate evaluates.
    pub fn rules(self) -> &'static [Rule] {
        match self {
            Step::Personal => PERSONAL_RULES,
            Step::Professional => PROFESSIONAL_RULES,
            Step::Education => &[Rule::Records(SectionKind::Education)],
            Step::Experience => &[Rule::Records(SectionKind::Experience)],
            Step::Skills => &[Rule::Records(SectionKind::Skills)],
            Step::Terms => &[Rule::Terms],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

/// One entry of a step's rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Personal(PersonalField),
    File(FileSlot),
    /// Every field of every row of a section. An empty section passes.
    Records(SectionKind),
    Terms,
}

const PERSONAL_RULES: &[Rule] = &[
    Rule::Personal(PersonalField::FirstName),
    Rule::Personal(PersonalField::LastName),
    Rule::Personal(PersonalField::Email),
    Rule::Personal(PersonalField::Password),
    Rule::Personal(PersonalField::ConfirmPassword),
    Rule::Personal(PersonalField::PhoneNumber),
    Rule::Personal(PersonalField::Address),
];

const PROFESSIONAL_RULES: &[Rule] = &[
    Rule::File(FileSlot::Cv),
    Rule::File(FileSlot::ProfileImage),
    Rule::Records(SectionKind::SocialLinks),
];

/// Presentation hint for transition animation; no state-machine meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Next,
    Prev,
}

#[derive(Debug, Clone)]
pub struct StepSequencer {
    current: Step,
    direction: Direction,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self {
            current: Step::Personal,
            direction: Direction::Next,
        }
    }
}

impl StepSequencer {
    pub fn current(&self) -> Step {
        self.current
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Moves forward one step. Returns `None` on the last step, where the
    /// forward action is submission instead.
    pub fn advance(&mut self) -> Option<Step> {
        let next = self.current.next()?;
        self.current = next;
        self.direction = Direction::Next;
        Some(next)
    }

    /// Moves back one step. Returns `None` on the first step.
    pub fn retreat(&mut self) -> Option<Step> {
        let previous = self.current.previous()?;
        self.current = previous;
        self.direction = Direction::Prev;
        Some(previous)
    }

    /// Jumps to `step`, e.g. the first step that blocks a submission.
    pub fn jump_to(&mut self, step: Step) {
        self.direction = if step < self.current {
            Direction::Prev
        } else {
            Direction::Next
        };
        self.current = step;
    }
}
