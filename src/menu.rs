//! Operator menu
//!
//! A pure transition table from `(state, input)` to `(state, effect)`. The
//! coordinator applies effects; nothing here touches hardware.

/// Top-level menu entries, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Start,
    FileSelect,
    Brightness,
    Speed,
    Delay,
    SaveConfig,
}

impl MenuItem {
    pub const ALL: [Self; 6] = [
        Self::Start,
        Self::FileSelect,
        Self::Brightness,
        Self::Speed,
        Self::Delay,
        Self::SaveConfig,
    ];

    const fn position(self) -> usize {
        match self {
            Self::Start => 0,
            Self::FileSelect => 1,
            Self::Brightness => 2,
            Self::Speed => 3,
            Self::Delay => 4,
            Self::SaveConfig => 5,
        }
    }

    pub const fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub const fn previous(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => " Start     Menu ",
            Self::FileSelect => " File select    ",
            Self::Brightness => " Brightness     ",
            Self::Speed => " Speed          ",
            Self::Delay => " Delay (s)      ",
            Self::SaveConfig => " Save config    ",
        }
    }
}

/// Physical buttons. On prompts `Previous` answers no and `Next` yes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Next,
    Previous,
    Select,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Browse(MenuItem),
    Edit(MenuItem),
    /// Save settings?
    ConfirmSave,
    /// Brightness changed, regenerate frames?
    ConfirmRescan,
    /// Settings were saved
    Saved,
    Playing,
}

/// Work the coordinator performs after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEffect {
    None,
    Play,
    Stop,
    /// Step the value behind an item up or down
    Adjust(MenuItem, i8),
    /// Start editing brightness from the current setting
    BeginBrightness,
    /// Apply the edited brightness
    CommitBrightness,
    Rescan,
    SaveConfig,
}

const PROMPT: &str = " : NO     : YES ";

impl MenuState {
    pub const INITIAL: Self = Self::Browse(MenuItem::Start);

    /// The two display lines
    pub const fn label(self) -> [&'static str; 2] {
        match self {
            Self::Browse(item) | Self::Edit(item) => [item.label(), ""],
            Self::ConfirmSave => [MenuItem::SaveConfig.label(), PROMPT],
            Self::ConfirmRescan => [" Brightness set ", " rescan needed.."],
            Self::Saved => ["  Config saved! ", ""],
            Self::Playing => [MenuItem::Start.label(), ""],
        }
    }
}

impl Default for MenuState {
    fn default() -> Self {
        Self::INITIAL
    }
}

pub const fn transition(state: MenuState, input: Input) -> (MenuState, MenuEffect) {
    use Input::{Back, Next, Previous, Select};
    use MenuEffect as E;
    use MenuItem::{Brightness, SaveConfig, Start};
    use MenuState::{Browse, ConfirmRescan, ConfirmSave, Edit, Playing, Saved};

    match (state, input) {
        (Browse(item), Next) => (Browse(item.next()), E::None),
        (Browse(item), Previous) => (Browse(item.previous()), E::None),
        (Browse(Start), Select) => (Playing, E::Play),
        (Browse(SaveConfig), Select) => (ConfirmSave, E::None),
        (Browse(Brightness), Select) => (Edit(Brightness), E::BeginBrightness),
        (Browse(item), Select) => (Edit(item), E::None),
        (Browse(_), Back) => (Browse(Start), E::None),

        (Edit(item), Next) => (Edit(item), E::Adjust(item, 1)),
        (Edit(item), Previous) => (Edit(item), E::Adjust(item, -1)),
        (Edit(Brightness), Select) => (ConfirmRescan, E::CommitBrightness),
        (Edit(item), Select | Back) => (Browse(item), E::None),

        (ConfirmSave, Next) => (Saved, E::SaveConfig),
        (ConfirmSave, Previous | Back) => (Browse(SaveConfig), E::None),
        (ConfirmSave, Select) => (ConfirmSave, E::None),

        (ConfirmRescan, Next) => (Browse(Brightness), E::Rescan),
        (ConfirmRescan, Previous | Back) => (Browse(Brightness), E::None),
        (ConfirmRescan, Select) => (ConfirmRescan, E::None),

        (Saved, _) => (Browse(SaveConfig), E::None),

        (Playing, Select | Back) => (Browse(Start), E::Stop),
        (Playing, Next | Previous) => (Playing, E::None),
    }
}
