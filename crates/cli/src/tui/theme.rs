//! Centralized TUI theme built on ratatui's Tailwind CSS palette.

use games::lucky_box::Rarity;
use ratatui::style::Color;
use ratatui::style::palette::tailwind;

/// The application theme: every visual token in one place.
pub struct Theme {
    // ── Base ──
    pub bg: Color,
    pub fg: Color,
    pub fg_dim: Color,
    pub fg_muted: Color,
    pub border: Color,
    /// Border of the focused card, panel, or input.
    pub border_active: Color,

    // ── Accent ──
    pub accent: Color,
    pub accent_bright: Color,

    // ── Semantic ──
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // ── Header ──
    /// "Chance Champions" title.
    pub title: Color,
    pub points_fg: Color,
    pub points_bg: Color,

    // ── Home cards ──
    pub card_title: Color,
    /// Concept tag under each card.
    pub card_concept: Color,

    // ── Coach chat ──
    pub user_label: Color,
    pub assistant_label: Color,
    /// Blinking block shown while a reply streams.
    pub stream_cursor: Color,
    /// Banner for the key-needed prompt.
    pub action_required: Color,

    // ── Lucky box rarities ──
    pub rarity_common: Color,
    pub rarity_uncommon: Color,
    pub rarity_rare: Color,
    pub rarity_legendary: Color,

    // ── Status line ──
    pub spinner: Color,
    pub hint_key: Color,
    pub hint_desc: Color,
}

impl Theme {
    /// The default dark theme using Tailwind palette.
    pub const fn default_dark() -> Self {
        Self {
            // Base
            bg: tailwind::SLATE.c950,
            fg: tailwind::SLATE.c100,
            fg_dim: tailwind::SLATE.c400,
            fg_muted: tailwind::SLATE.c500,
            border: tailwind::SLATE.c700,
            border_active: tailwind::INDIGO.c400,

            // Accent
            accent: tailwind::INDIGO.c500,
            accent_bright: tailwind::INDIGO.c300,

            // Semantic
            success: tailwind::EMERALD.c500,
            warning: tailwind::AMBER.c500,
            error: tailwind::RED.c500,
            info: tailwind::SKY.c500,

            // Header
            title: tailwind::INDIGO.c400,
            points_fg: tailwind::INDIGO.c100,
            points_bg: tailwind::INDIGO.c800,

            // Home
            card_title: tailwind::SLATE.c100,
            card_concept: tailwind::PURPLE.c400,

            // Coach
            user_label: tailwind::CYAN.c400,
            assistant_label: tailwind::PURPLE.c400,
            stream_cursor: tailwind::SLATE.c300,
            action_required: tailwind::ORANGE.c400,

            // Rarity
            rarity_common: tailwind::SLATE.c400,
            rarity_uncommon: tailwind::GREEN.c400,
            rarity_rare: tailwind::BLUE.c400,
            rarity_legendary: tailwind::AMBER.c400,

            // Status
            spinner: tailwind::AMBER.c400,
            hint_key: tailwind::SLATE.c100,
            hint_desc: tailwind::INDIGO.c300,
        }
    }

    pub const fn rarity(&self, rarity: Rarity) -> Color {
        match rarity {
            Rarity::Common => self.rarity_common,
            Rarity::Uncommon => self.rarity_uncommon,
            Rarity::Rare => self.rarity_rare,
            Rarity::Legendary => self.rarity_legendary,
        }
    }
}

/// Global theme instance.
pub const THEME: Theme = Theme::default_dark();
