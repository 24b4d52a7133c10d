//! Chat text → parsed command.
//!
//! Matching only: the router never checks roles and never touches state.
//! Prefixed input is tested against an ordered table — exact literals first,
//! then prefix matchers with argument extraction, then a direct-emote
//! fallback. Unprefixed input only responds to the two bare triggers
//! (`here [...]` and an exact waypoint label). Anything else is silently
//! ignored.

use crate::catalog::EmoteCatalog;

pub const COMMAND_PREFIX: char = '/';

/// A fully parsed chat command, ready for a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    ListWaypoints,
    SetWaypoint { label: String },
    GotoWaypoint { label: String },
    ListEmotes,
    Emote { name: String },
    GroupEmote { name: String },
    OutfitHelp,
    OutfitCategories,
    RandomOutfit,
    Equip { query: String },
    Color { category: String, palette: String },
    RemoveItem { category: String },
    FreeItems,
    FreeItem { category: String, index: Option<String> },
    SetApiKey { key: String },
    Summon { username: String },
    AddAdmin { username: String },
    RemoveAdmin { username: String },
    ListAdmins,
    AddOverlord { username: String },
    RemoveOverlord { username: String },
    ListOverlords,
    Announce { message: String },
    Kick { username: String },
    ClearRoom,
    Shutdown,
    BotInfo,
    /// A matched command with malformed arguments; the handler echoes usage.
    Invalid { usage: &'static str },
}

/// How a route pattern is compared against the stripped, lowercased input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The whole input equals the pattern.
    Exact,
    /// The input is `pattern` followed by a space and arguments.
    Prefix,
}

pub struct Route {
    pub kind: MatchKind,
    pub pattern: &'static str,
    build: fn(&str) -> Command,
}

/// Ordered dispatch table; first match wins. Exact literals are listed ahead
/// of the prefix matchers that share their spelling.
pub const ROUTES: &[Route] = &[
    Route { kind: MatchKind::Exact, pattern: "help", build: build_help },
    Route { kind: MatchKind::Exact, pattern: "teleports", build: build_list_waypoints },
    Route { kind: MatchKind::Exact, pattern: "emotes", build: build_list_emotes },
    Route { kind: MatchKind::Exact, pattern: "outfit", build: build_outfit_help },
    Route { kind: MatchKind::Exact, pattern: "outfit_categories", build: build_outfit_categories },
    Route { kind: MatchKind::Exact, pattern: "randomoutfit", build: build_random_outfit },
    Route { kind: MatchKind::Exact, pattern: "freeitems", build: build_free_items },
    Route { kind: MatchKind::Exact, pattern: "admins", build: build_list_admins },
    Route { kind: MatchKind::Exact, pattern: "overlords", build: build_list_overlords },
    Route { kind: MatchKind::Exact, pattern: "botinfo", build: build_bot_info },
    Route { kind: MatchKind::Exact, pattern: "clearroom", build: build_clear_room },
    Route { kind: MatchKind::Exact, pattern: "shutdown", build: build_shutdown },
    Route { kind: MatchKind::Prefix, pattern: "emotes", build: build_emote },
    Route { kind: MatchKind::Prefix, pattern: "all", build: build_group_emote },
    Route { kind: MatchKind::Prefix, pattern: "equip", build: build_equip },
    Route { kind: MatchKind::Prefix, pattern: "color", build: build_color },
    Route { kind: MatchKind::Prefix, pattern: "remove", build: build_remove },
    Route { kind: MatchKind::Prefix, pattern: "freeitem", build: build_free_item },
    Route { kind: MatchKind::Prefix, pattern: "setapikey", build: build_set_api_key },
    Route { kind: MatchKind::Prefix, pattern: "summon", build: build_summon },
    Route { kind: MatchKind::Prefix, pattern: "addadmin", build: build_add_admin },
    Route { kind: MatchKind::Prefix, pattern: "removeadmin", build: build_remove_admin },
    Route { kind: MatchKind::Prefix, pattern: "addoverlord", build: build_add_overlord },
    Route { kind: MatchKind::Prefix, pattern: "removeoverlord", build: build_remove_overlord },
    Route { kind: MatchKind::Prefix, pattern: "announce", build: build_announce },
    Route { kind: MatchKind::Prefix, pattern: "kick", build: build_kick },
];

/// Resolve a raw chat line to a command.
///
/// `is_waypoint` answers whether a bare message matches a stored label;
/// labels are compared case-sensitively against the raw message.
pub fn route<F>(message: &str, emotes: &EmoteCatalog, is_waypoint: F) -> Option<Command>
where
    F: Fn(&str) -> bool,
{
    if let Some(stripped) = message.strip_prefix(COMMAND_PREFIX) {
        let lowered = stripped.to_lowercase();

        for entry in ROUTES {
            match entry.kind {
                MatchKind::Exact => {
                    if lowered == entry.pattern {
                        return Some((entry.build)(""));
                    }
                }
                MatchKind::Prefix => {
                    if lowered.starts_with(entry.pattern)
                        && lowered[entry.pattern.len()..].starts_with(' ')
                    {
                        // Arguments keep the sender's casing.
                        let rest = stripped.get(entry.pattern.len() + 1..).unwrap_or("");
                        return Some((entry.build)(rest));
                    }
                }
            }
        }

        // Fallback: `/hearteyes`, `/Heart Eyes` etc. act as a direct emote.
        let key = EmoteCatalog::normalize(stripped);
        if !key.is_empty() && emotes.contains(&key) {
            return Some(Command::Emote { name: key });
        }
        return None;
    }

    let lowered = message.to_lowercase();
    if lowered == "here" {
        return Some(Command::SetWaypoint {
            label: "default".to_string(),
        });
    }
    if lowered.starts_with("here ") {
        let label = message.get(5..).unwrap_or("").trim();
        return Some(Command::SetWaypoint {
            label: label.to_string(),
        });
    }
    if is_waypoint(message) {
        return Some(Command::GotoWaypoint {
            label: message.to_string(),
        });
    }
    None
}

fn build_help(_rest: &str) -> Command {
    Command::Help
}

fn build_list_waypoints(_rest: &str) -> Command {
    Command::ListWaypoints
}

fn build_list_emotes(_rest: &str) -> Command {
    Command::ListEmotes
}

fn build_outfit_help(_rest: &str) -> Command {
    Command::OutfitHelp
}

fn build_outfit_categories(_rest: &str) -> Command {
    Command::OutfitCategories
}

fn build_random_outfit(_rest: &str) -> Command {
    Command::RandomOutfit
}

fn build_free_items(_rest: &str) -> Command {
    Command::FreeItems
}

fn build_list_admins(_rest: &str) -> Command {
    Command::ListAdmins
}

fn build_list_overlords(_rest: &str) -> Command {
    Command::ListOverlords
}

fn build_bot_info(_rest: &str) -> Command {
    Command::BotInfo
}

fn build_clear_room(_rest: &str) -> Command {
    Command::ClearRoom
}

fn build_shutdown(_rest: &str) -> Command {
    Command::Shutdown
}

fn build_emote(rest: &str) -> Command {
    Command::Emote {
        name: rest.trim().to_string(),
    }
}

fn build_group_emote(rest: &str) -> Command {
    Command::GroupEmote {
        name: rest.trim().to_string(),
    }
}

fn build_equip(rest: &str) -> Command {
    let query = rest.trim();
    if query.is_empty() {
        return Command::Invalid {
            usage: "Usage: /equip <item name> [index]",
        };
    }
    Command::Equip {
        query: query.to_string(),
    }
}

fn build_color(rest: &str) -> Command {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(category), Some(palette), None) => Command::Color {
            category: category.to_string(),
            palette: palette.to_string(),
        },
        _ => Command::Invalid {
            usage: "Usage: /color <category> <palette_number>",
        },
    }
}

fn build_remove(rest: &str) -> Command {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(category), None) => Command::RemoveItem {
            category: category.to_lowercase(),
        },
        _ => Command::Invalid {
            usage: "Usage: /remove <category>",
        },
    }
}

fn build_free_item(rest: &str) -> Command {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(category), index, None) => Command::FreeItem {
            category: category.to_lowercase(),
            index: index.map(str::to_string),
        },
        _ => Command::Invalid {
            usage: "Usage: /freeitem <category> [item_number]",
        },
    }
}

fn build_set_api_key(rest: &str) -> Command {
    let key = rest.trim();
    if key.is_empty() {
        return Command::Invalid {
            usage: "Usage: /setapikey <your_api_key>",
        };
    }
    Command::SetApiKey {
        key: key.to_string(),
    }
}

fn single_username(rest: &str, usage: &'static str, build: fn(String) -> Command) -> Command {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(name), None) => build(name.trim_start_matches('@').to_string()),
        _ => Command::Invalid { usage },
    }
}

fn build_summon(rest: &str) -> Command {
    single_username(rest, "Usage: /summon @username", |username| Command::Summon {
        username,
    })
}

fn build_add_admin(rest: &str) -> Command {
    single_username(rest, "Usage: /addadmin @username", |username| {
        Command::AddAdmin { username }
    })
}

fn build_remove_admin(rest: &str) -> Command {
    single_username(rest, "Usage: /removeadmin @username", |username| {
        Command::RemoveAdmin { username }
    })
}

fn build_add_overlord(rest: &str) -> Command {
    single_username(rest, "Usage: /addoverlord @username", |username| {
        Command::AddOverlord { username }
    })
}

fn build_remove_overlord(rest: &str) -> Command {
    single_username(rest, "Usage: /removeoverlord @username", |username| {
        Command::RemoveOverlord { username }
    })
}

fn build_kick(rest: &str) -> Command {
    single_username(rest, "Usage: /kick @username", |username| Command::Kick {
        username,
    })
}

fn build_announce(rest: &str) -> Command {
    // The remainder stays unsplit; announcements keep their spacing.
    let message = rest.trim();
    if message.is_empty() {
        return Command::Invalid {
            usage: "Usage: /announce <message>",
        };
    }
    Command::Announce {
        message: message.to_string(),
    }
}
