use crate::state::TriggerId;

/// Parameters per trigger condition.
pub const CONDITION_PARAMS: usize = 2;
/// Parameters per trigger action.
pub const ACTION_PARAMS: usize = 7;
/// Action kind that enables another trigger by id.
pub const ACTION_ENABLE_TRIGGER: i32 = 53;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub kind: i32,
    pub params: [String; CONDITION_PARAMS],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: i32,
    pub params: [String; ACTION_PARAMS],
}

/// Scripted event: fires its actions when its conditions hold
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub id: String,
    pub name: String,
    /// Owning house or country name, kept verbatim
    pub house: String,
    /// Trigger evaluated together with this one
    pub linked: Option<TriggerId>,
    pub disabled: bool,
    pub easy: bool,
    pub medium: bool,
    pub hard: bool,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

impl Trigger {
    pub fn new(id: impl Into<String>, name: impl Into<String>, house: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            house: house.into(),
            linked: None,
            disabled: false,
            easy: true,
            medium: true,
            hard: true,
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TagRepeat {
    #[default]
    OnceAny = 0,
    OnceAll = 1,
    Repeating = 2,
}

impl TagRepeat {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::OnceAny),
            1 => Some(Self::OnceAll),
            2 => Some(Self::Repeating),
            _ => None,
        }
    }
}

/// Attachment point that lets objects and cells fire a trigger
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub repeat: TagRepeat,
    pub trigger: Option<TriggerId>,
}
