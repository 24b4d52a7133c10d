//! Command handlers.
//!
//! The router turns chat text into `Command` values; every handler here
//! enforces its own role checks before touching state or the session. Failed
//! handlers surface a user-visible message and never take the dispatch loop
//! down with them.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::bot::Bot;
use crate::catalog::{self, EmoteCatalog};
use crate::roles::RoleError;
use crate::router::{self, Command};
use crate::session::{BuyOutcome, OutfitItem, Placement, RoomSession, SessionError, User};
use crate::waypoints::WaypointError;

/// Per-command failure. The display text is the user-visible chat message,
/// except for `Session` failures which get a generic line plus an error log.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyMember(String),
    #[error("{0}")]
    NotMember(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("session call failed: {0}")]
    Session(#[from] SessionError),
}

type CommandResult = Result<(), CommandError>;

const CHAT_ERROR_FALLBACK: &str = "Something went wrong talking to the room, please try again.";

impl Bot {
    /// Route a chat line and run its handler. Unrecognized input is ignored
    /// by contract; the router only yields commands worth answering.
    pub async fn handle_chat(&mut self, session: &dyn RoomSession, user: &User, message: &str) {
        let Some(command) = router::route(message, &self.emotes, |label| {
            self.waypoints.contains(label)
        }) else {
            return;
        };

        info!(user = %user.username, command = ?command, "handling command");
        self.commands_handled += 1;

        if let Err(e) = self.dispatch(session, user, command).await {
            self.commands_failed += 1;
            match &e {
                CommandError::Session(inner) => {
                    error!(user = %user.username, error = %inner, "command failed against the room api");
                    let _ = session.send_chat(CHAT_ERROR_FALLBACK).await;
                }
                user_facing => {
                    let _ = session.send_chat(&user_facing.to_string()).await;
                }
            }
        }
    }

    async fn dispatch(
        &mut self,
        session: &dyn RoomSession,
        user: &User,
        command: Command,
    ) -> CommandResult {
        match command {
            Command::Help => self.cmd_help(session, user).await,
            Command::ListWaypoints => self.cmd_list_waypoints(session, user).await,
            Command::SetWaypoint { label } => self.cmd_set_waypoint(session, user, &label).await,
            Command::GotoWaypoint { label } => self.cmd_goto_waypoint(session, user, &label).await,
            Command::ListEmotes => self.cmd_list_emotes(session, user).await,
            Command::Emote { name } => self.cmd_emote(session, &name).await,
            Command::GroupEmote { name } => self.cmd_group_emote(session, &name).await,
            Command::OutfitHelp => self.cmd_outfit_help(session, user).await,
            Command::OutfitCategories => self.cmd_outfit_categories(session, user).await,
            Command::RandomOutfit => self.cmd_random_outfit(session).await,
            Command::Equip { query } => self.cmd_equip(session, &query).await,
            Command::Color { category, palette } => {
                self.cmd_color(session, &category, &palette).await
            }
            Command::RemoveItem { category } => self.cmd_remove_item(session, &category).await,
            Command::FreeItems => self.cmd_free_items(session, user).await,
            Command::FreeItem { category, index } => {
                self.cmd_free_item(session, user, &category, index.as_deref()).await
            }
            Command::SetApiKey { key } => self.cmd_set_api_key(session, user, key).await,
            Command::Summon { username } => self.cmd_summon(session, user, &username).await,
            Command::AddAdmin { username } => self.cmd_add_admin(session, user, &username).await,
            Command::RemoveAdmin { username } => {
                self.cmd_remove_admin(session, user, &username).await
            }
            Command::ListAdmins => self.cmd_list_admins(session, user).await,
            Command::AddOverlord { username } => {
                self.cmd_add_overlord(session, user, &username).await
            }
            Command::RemoveOverlord { username } => {
                self.cmd_remove_overlord(session, user, &username).await
            }
            Command::ListOverlords => self.cmd_list_overlords(session, user).await,
            Command::Announce { message } => self.cmd_announce(session, user, &message).await,
            Command::Kick { username } => self.cmd_kick(session, user, &username).await,
            Command::ClearRoom => self.cmd_clear_room(session, user).await,
            Command::Shutdown => self.cmd_shutdown(session, user).await,
            Command::BotInfo => self.cmd_bot_info(session, user).await,
            Command::Invalid { usage } => Err(CommandError::InvalidInput(usage.to_string())),
        }
    }

    /// Find a room user by display name, `@` prefix tolerated.
    async fn resolve_room_user(
        &self,
        session: &dyn RoomSession,
        username: &str,
    ) -> Result<User, CommandError> {
        let name = username.trim().trim_start_matches('@');
        let users = session.room_users().await?;
        users
            .into_iter()
            .map(|(u, _)| u)
            .find(|u| u.username.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                CommandError::NotFound(format!("User '{}' not found in the room.", name))
            })
    }

    async fn find_user_placement(
        &self,
        session: &dyn RoomSession,
        user_id: &str,
    ) -> Result<Placement, CommandError> {
        let users = session.room_users().await?;
        users
            .into_iter()
            .find(|(u, _)| u.id == user_id)
            .map(|(_, placement)| placement)
            .ok_or_else(|| CommandError::NotFound("Could not determine your position.".to_string()))
    }

    /// Replace whatever occupies the item's category and apply the outfit.
    async fn wear_item(&self, session: &dyn RoomSession, item: OutfitItem) -> CommandResult {
        let mut outfit = session.outfit().await?;
        outfit.retain(|worn| worn.category() != item.category());
        outfit.push(item);
        session.set_outfit(outfit).await?;
        Ok(())
    }

    fn require_web_api(&self, session: &dyn RoomSession) -> CommandResult {
        if session.web_api_ready() {
            Ok(())
        } else {
            Err(CommandError::InvalidInput(
                "⚠️ Web API is not initialized. Use /setapikey to enable outfit features."
                    .to_string(),
            ))
        }
    }

    async fn cmd_help(&self, session: &dyn RoomSession, user: &User) -> CommandResult {
        // Short chunks; the platform truncates long whispers.
        let mut sections = vec![
            "🤖 Room Bot Commands".to_string(),
            "Teleport:\n- /teleports: list points\n- here: save default point\n- here <name>: save named point\n- <point_name>: teleport there"
                .to_string(),
            "Emotes:\n- /emotes: list emotes\n- /emotes <name>: perform\n- /<emote_name>: direct emote\n- /all <name>: everyone emotes"
                .to_string(),
            "Outfit (1/2):\n- /outfit: outfit help\n- /randomoutfit\n- /equip <item> [index]\n- /color <category> <palette>"
                .to_string(),
            "Outfit (2/2):\n- /remove <category>\n- /outfit_categories\n- /freeitems\n- /freeitem <category> [number]\n- /setapikey <key>"
                .to_string(),
            "Summon:\n- /summon @username: teleport a user to you".to_string(),
        ];
        if self.roles.is_admin(&user.id) {
            sections.push(
                "Admin:\n- /addadmin @username\n- /removeadmin @username\n- /admins".to_string(),
            );
        }
        if self.roles.is_overlord(&user.id) {
            sections.push(
                "⚡ Overlord (1/2):\n- /addoverlord @username\n- /removeoverlord @username\n- /overlords\n- /botinfo"
                    .to_string(),
            );
            sections.push(
                "⚡ Overlord (2/2):\n- /announce <message>\n- /kick @username\n- /clearroom\n- /shutdown"
                    .to_string(),
            );
        }
        sections.push(if session.web_api_ready() {
            "✅ Web API is initialized. Outfit features are enabled.".to_string()
        } else {
            "⚠️ Web API is not initialized. Use /setapikey to enable outfit features.".to_string()
        });

        for section in sections {
            session.send_whisper(&user.id, &section).await?;
        }
        Ok(())
    }

    async fn cmd_list_waypoints(&self, session: &dyn RoomSession, user: &User) -> CommandResult {
        if self.waypoints.is_empty() {
            session
                .send_chat("No teleport points have been set.")
                .await?;
            return Ok(());
        }
        let mut labels = self.waypoints.labels();
        labels.sort_unstable();
        let listing = labels
            .iter()
            .map(|label| format!("- {}", label))
            .collect::<Vec<_>>()
            .join("\n");
        session
            .send_whisper(&user.id, &format!("📍 Teleport points:\n{}", listing))
            .await?;
        Ok(())
    }

    async fn cmd_set_waypoint(
        &mut self,
        session: &dyn RoomSession,
        user: &User,
        label: &str,
    ) -> CommandResult {
        let placement = self.find_user_placement(session, &user.id).await?;
        match self.waypoints.set(label, &placement) {
            Ok(position) => {
                session
                    .send_chat(&format!(
                        "Teleport point '{}' set at {}, {}, {}",
                        label, position.x, position.y, position.z
                    ))
                    .await?;
                Ok(())
            }
            Err(WaypointError::AnchorPosition) => Err(CommandError::InvalidInput(
                "Cannot set a teleport point at an anchor position.".to_string(),
            )),
        }
    }

    async fn cmd_goto_waypoint(
        &self,
        session: &dyn RoomSession,
        user: &User,
        label: &str,
    ) -> CommandResult {
        let Some(position) = self.waypoints.get(label).cloned() else {
            return Err(CommandError::NotFound(format!(
                "Teleport point '{}' not found.",
                label
            )));
        };
        session.teleport(&user.id, &position).await?;
        session
            .send_chat(&format!("Teleported {} to '{}'", user.username, label))
            .await?;
        Ok(())
    }

    async fn cmd_list_emotes(&self, session: &dyn RoomSession, user: &User) -> CommandResult {
        session
            .send_whisper(&user.id, "📋 Available emotes (use /<name> to perform):")
            .await?;
        let names: Vec<String> = EmoteCatalog::display_names()
            .map(|name| format!("/{}", EmoteCatalog::normalize(name)))
            .collect();
        for chunk in names.chunks(6) {
            session.send_whisper(&user.id, &chunk.join(", ")).await?;
        }
        Ok(())
    }

    async fn cmd_emote(&self, session: &dyn RoomSession, name: &str) -> CommandResult {
        let Some(emote_id) = self.emotes.get(name) else {
            return Err(CommandError::NotFound(format!(
                "Unknown emote: {}. Use /emotes to see available emotes.",
                name
            )));
        };
        session.send_emote(emote_id, None).await?;
        Ok(())
    }

    async fn cmd_group_emote(&self, session: &dyn RoomSession, name: &str) -> CommandResult {
        let Some(emote_id) = self.emotes.get(name) else {
            return Err(CommandError::NotFound(format!(
                "Unknown emote: {}. Use /emotes to see available emotes.",
                name
            )));
        };
        let users = session.room_users().await?;
        for (room_user, _) in &users {
            // One refusal shouldn't break the sweep.
            if let Err(e) = session.send_emote(emote_id, Some(&room_user.id)).await {
                warn!(user = %room_user.username, error = %e, "group emote skipped");
            }
        }
        session
            .send_chat(&format!(
                "Everyone is doing the {} emote!",
                EmoteCatalog::normalize(name)
            ))
            .await?;
        Ok(())
    }

    async fn cmd_outfit_help(&self, session: &dyn RoomSession, user: &User) -> CommandResult {
        let mut text = String::from(
            "📋 Outfit commands:\n\
             /randomoutfit - generate a random outfit\n\
             /equip <item name> [index] - equip a specific item\n\
             /color <category> <palette> - change an item's palette\n\
             /remove <category> - remove an item\n\
             /outfit_categories - list clothing categories\n\
             /freeitems - list free items\n\
             /freeitem <category> [number] - equip a free item\n\
             /setapikey <key> - enable outfit features",
        );
        if session.web_api_ready() {
            text.push_str("\n✅ Web API is initialized.");
        } else {
            text.push_str("\n⚠️ Web API is not initialized.");
        }
        session.send_whisper(&user.id, &text).await?;
        Ok(())
    }

    async fn cmd_outfit_categories(&self, session: &dyn RoomSession, user: &User) -> CommandResult {
        let listing = catalog::OUTFIT_CATEGORIES
            .iter()
            .map(|category| format!("- {}", category))
            .collect::<Vec<_>>()
            .join("\n");
        session
            .send_whisper(&user.id, &format!("👗 Clothing categories:\n{}", listing))
            .await?;
        Ok(())
    }

    async fn cmd_free_items(&self, session: &dyn RoomSession, user: &User) -> CommandResult {
        let listing = catalog::free_item_categories()
            .map(|category| format!("- {}", category))
            .collect::<Vec<_>>()
            .join("\n");
        session
            .send_whisper(
                &user.id,
                &format!(
                    "👕 Free item categories:\n{}\nUse /freeitem <category> to list items.",
                    listing
                ),
            )
            .await?;
        Ok(())
    }

    async fn cmd_free_item(
        &self,
        session: &dyn RoomSession,
        user: &User,
        category: &str,
        index: Option<&str>,
    ) -> CommandResult {
        let Some(items) = catalog::free_items_in(category) else {
            let categories = catalog::free_item_categories().collect::<Vec<_>>().join(", ");
            return Err(CommandError::NotFound(format!(
                "Category '{}' not found. Available categories: {}",
                category, categories
            )));
        };

        let Some(index) = index else {
            let listing = items
                .iter()
                .enumerate()
                .map(|(i, (_, name))| format!("{}: {}", i, name))
                .collect::<Vec<_>>()
                .join("\n");
            session
                .send_whisper(
                    &user.id,
                    &format!(
                        "👕 Free items in '{}':\n{}\nUse /freeitem {} <number> to equip one.",
                        category, listing, category
                    ),
                )
                .await?;
            return Ok(());
        };

        let index: usize = index.parse().map_err(|_| {
            CommandError::InvalidInput("Item number must be a whole number.".to_string())
        })?;
        let Some((item_id, item_name)) = items.get(index) else {
            return Err(CommandError::NotFound(format!(
                "Item number {} is out of range. Use /freeitem {} to see available items.",
                index, category
            )));
        };

        self.wear_item(session, OutfitItem::new(*item_id)).await?;
        session
            .send_whisper(&user.id, &format!("✅ Equipped {}!", item_name))
            .await?;
        Ok(())
    }

    async fn cmd_equip(&self, session: &dyn RoomSession, query: &str) -> CommandResult {
        self.require_web_api(session)?;

        // A trailing number selects among multiple search results.
        let mut index = 0usize;
        let mut name = query.trim();
        if let Some((head, tail)) = name.rsplit_once(' ') {
            if let Ok(i) = tail.parse::<usize>() {
                index = i;
                name = head.trim();
            }
        }

        let items = session.search_items(name).await?;
        if items.is_empty() {
            return Err(CommandError::NotFound(format!(
                "Item '{}' not found.",
                name
            )));
        }
        if index >= items.len() {
            return Err(CommandError::InvalidInput(format!(
                "Found {} items but index {} is out of range.",
                items.len(),
                index
            )));
        }
        if items.len() > 1 {
            session
                .send_chat(&format!(
                    "Multiple items found for '{}', using item #{}: {}.",
                    name, index, items[index].item_name
                ))
                .await?;
        }
        let listed = &items[index];

        let owned = session
            .inventory()
            .await?
            .iter()
            .any(|item| item.id == listed.item_id);
        if !owned {
            if listed.rarity.eq_ignore_ascii_case("none") {
                // Free items can be worn without a purchase.
            } else if listed.is_purchasable {
                match session.buy_item(&listed.item_id).await? {
                    BuyOutcome::Success => {
                        session
                            .send_chat(&format!("Purchased '{}'.", listed.item_name))
                            .await?;
                    }
                    BuyOutcome::Rejected(reason) => {
                        return Err(CommandError::NotFound(format!(
                            "Could not purchase '{}': {}.",
                            listed.item_name, reason
                        )));
                    }
                }
            } else {
                return Err(CommandError::NotFound(format!(
                    "Item '{}' is not in inventory and cannot be purchased.",
                    listed.item_name
                )));
            }
        }

        self.wear_item(session, OutfitItem::new(listed.item_id.clone()))
            .await?;
        session
            .send_chat(&format!("Equipped '{}'!", listed.item_name))
            .await?;
        Ok(())
    }

    async fn cmd_color(
        &self,
        session: &dyn RoomSession,
        category: &str,
        palette: &str,
    ) -> CommandResult {
        let palette: u32 = palette.parse().map_err(|_| {
            CommandError::InvalidInput("Palette number must be an integer.".to_string())
        })?;

        let mut outfit = session.outfit().await?;
        let mut found = false;
        for item in outfit.iter_mut() {
            if item.category() == category {
                item.active_palette = palette;
                found = true;
            }
        }
        if !found {
            return Err(CommandError::NotFound(format!(
                "No item of category '{}' is currently equipped.",
                category
            )));
        }
        session.set_outfit(outfit).await?;
        session
            .send_chat(&format!("Changed {} to color palette {}.", category, palette))
            .await?;
        Ok(())
    }

    async fn cmd_remove_item(&self, session: &dyn RoomSession, category: &str) -> CommandResult {
        if !catalog::OUTFIT_CATEGORIES.contains(&category) {
            return Err(CommandError::InvalidInput(format!(
                "Invalid category '{}'. Use /outfit_categories to see available categories.",
                category
            )));
        }
        let mut outfit = session.outfit().await?;
        let before = outfit.len();
        outfit.retain(|item| item.category() != category);
        if outfit.len() == before {
            return Err(CommandError::NotFound(format!(
                "No item of category '{}' is currently equipped.",
                category
            )));
        }
        session.set_outfit(outfit).await?;
        session
            .send_chat(&format!("Removed {} from outfit.", category))
            .await?;
        Ok(())
    }

    async fn cmd_random_outfit(&self, session: &dyn RoomSession) -> CommandResult {
        self.require_web_api(session)?;

        let current = session.outfit().await?;
        // Body parts stay; everything else is rerolled.
        let mut new_outfit: Vec<OutfitItem> = current
            .into_iter()
            .filter(|item| item.category() == "body")
            .collect();
        let mut taken: HashSet<String> = new_outfit
            .iter()
            .map(|item| item.category().to_string())
            .collect();

        let inventory = session.inventory().await?;
        let mut rng = rand::thread_rng();

        for (_, items) in catalog::FREE_ITEMS {
            if rng.gen_bool(0.7) {
                if let Some((item_id, _)) = items.choose(&mut rng) {
                    let item = OutfitItem::new(*item_id);
                    if taken.insert(item.category().to_string()) {
                        new_outfit.push(item);
                    }
                }
            }
        }
        for item in inventory {
            if rng.gen_bool(0.3) && taken.insert(item.category().to_string()) {
                new_outfit.push(item);
            }
        }

        session.set_outfit(new_outfit).await?;
        session.send_chat("🔄 Generated a random outfit!").await?;
        Ok(())
    }

    async fn cmd_set_api_key(
        &self,
        session: &dyn RoomSession,
        user: &User,
        key: String,
    ) -> CommandResult {
        session.set_web_api_key(key);
        session
            .send_whisper(
                &user.id,
                "👕 API key set successfully! Outfit customization features are now enabled.",
            )
            .await?;
        Ok(())
    }

    async fn cmd_summon(
        &self,
        session: &dyn RoomSession,
        user: &User,
        username: &str,
    ) -> CommandResult {
        let name = username.trim().trim_start_matches('@');
        let users = session.room_users().await?;
        let target = users
            .iter()
            .map(|(u, _)| u)
            .find(|u| u.username.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                CommandError::NotFound(format!("User '{}' not found in the room.", name))
            })?;
        let issuer_placement = users
            .into_iter()
            .find(|(u, _)| u.id == user.id)
            .map(|(_, placement)| placement)
            .ok_or_else(|| {
                CommandError::NotFound("Could not determine your position.".to_string())
            })?;
        let position = match issuer_placement {
            Placement::Point(position) => position,
            Placement::Anchor { .. } => {
                return Err(CommandError::InvalidInput(
                    "Cannot summon to an anchor position.".to_string(),
                ))
            }
        };

        session.teleport(&target.id, &position).await?;
        session
            .send_chat(&format!(
                "✨ {} has been summoned by {}!",
                target.username, user.username
            ))
            .await?;
        Ok(())
    }

    async fn cmd_add_admin(
        &mut self,
        session: &dyn RoomSession,
        user: &User,
        username: &str,
    ) -> CommandResult {
        if !self.roles.is_admin(&user.id) {
            return Err(CommandError::Unauthorized(
                "❌ Only admins or overlords can add other admins.".to_string(),
            ));
        }
        let target = self.resolve_room_user(session, username).await?;
        match self.roles.add_admin(&user.id, &target.id) {
            Ok(()) => {
                session
                    .send_chat(&format!(
                        "👑 {} has been added as an admin by {}!",
                        target.username, user.username
                    ))
                    .await?;
                Ok(())
            }
            Err(RoleError::AlreadyMember) => Err(CommandError::AlreadyMember(format!(
                "{} is already an admin.",
                target.username
            ))),
            Err(_) => Err(CommandError::Unauthorized(
                "❌ Only admins or overlords can add other admins.".to_string(),
            )),
        }
    }

    async fn cmd_remove_admin(
        &mut self,
        session: &dyn RoomSession,
        user: &User,
        username: &str,
    ) -> CommandResult {
        if !self.roles.is_admin(&user.id) {
            return Err(CommandError::Unauthorized(
                "❌ Only admins or overlords can remove other admins.".to_string(),
            ));
        }
        let target = self.resolve_room_user(session, username).await?;
        match self.roles.remove_admin(&user.id, &target.id) {
            Ok(()) => {
                session
                    .send_chat(&format!(
                        "👑 {} has been removed as an admin by {}.",
                        target.username, user.username
                    ))
                    .await?;
                Ok(())
            }
            Err(RoleError::Forbidden) => Err(CommandError::Unauthorized(
                "❌ Only overlords can remove other overlords from admin status.".to_string(),
            )),
            Err(RoleError::NotMember) => Err(CommandError::NotMember(format!(
                "{} is not an admin.",
                target.username
            ))),
            Err(_) => Err(CommandError::Unauthorized(
                "❌ Only admins or overlords can remove other admins.".to_string(),
            )),
        }
    }

    async fn cmd_list_admins(&self, session: &dyn RoomSession, user: &User) -> CommandResult {
        if self.roles.admins().is_empty() {
            session.send_chat("No admins are currently set.").await?;
            return Ok(());
        }
        let admin_ids: HashSet<&str> = self.roles.admins().into_iter().collect();
        let users = session.room_users().await?;
        let names: Vec<String> = users
            .iter()
            .filter(|(u, _)| admin_ids.contains(u.id.as_str()))
            .map(|(u, _)| format!("👑 {}", u.username))
            .collect();
        if names.is_empty() {
            session
                .send_chat("No admins are currently in the room.")
                .await?;
        } else {
            session
                .send_whisper(&user.id, &format!("Current admins:\n{}", names.join("\n")))
                .await?;
        }
        Ok(())
    }

    async fn cmd_add_overlord(
        &mut self,
        session: &dyn RoomSession,
        user: &User,
        username: &str,
    ) -> CommandResult {
        if !self.roles.is_overlord(&user.id) {
            return Err(CommandError::Unauthorized(
                "⚡ Only overlords can add other overlords.".to_string(),
            ));
        }
        let target = self.resolve_room_user(session, username).await?;
        match self.roles.add_overlord(&user.id, &target.id) {
            Ok(()) => {
                session
                    .send_chat(&format!(
                        "⚡ {} has been granted OVERLORD status by {}!",
                        target.username, user.username
                    ))
                    .await?;
                Ok(())
            }
            Err(RoleError::AlreadyMember) => Err(CommandError::AlreadyMember(format!(
                "{} is already an overlord.",
                target.username
            ))),
            Err(_) => Err(CommandError::Unauthorized(
                "⚡ Only overlords can add other overlords.".to_string(),
            )),
        }
    }

    async fn cmd_remove_overlord(
        &mut self,
        session: &dyn RoomSession,
        user: &User,
        username: &str,
    ) -> CommandResult {
        if !self.roles.is_overlord(&user.id) {
            return Err(CommandError::Unauthorized(
                "⚡ Only overlords can remove other overlords.".to_string(),
            ));
        }
        let target = self.resolve_room_user(session, username).await?;
        match self.roles.remove_overlord(&user.id, &target.id) {
            Ok(()) => {
                session
                    .send_chat(&format!(
                        "⚡ {} has been removed from OVERLORD status by {}.",
                        target.username, user.username
                    ))
                    .await?;
                Ok(())
            }
            Err(RoleError::NotMember) => Err(CommandError::NotMember(format!(
                "{} is not an overlord.",
                target.username
            ))),
            Err(_) => Err(CommandError::Unauthorized(
                "⚡ Only overlords can remove other overlords.".to_string(),
            )),
        }
    }

    async fn cmd_list_overlords(&self, session: &dyn RoomSession, user: &User) -> CommandResult {
        if self.roles.overlords().is_empty() {
            session.send_chat("No overlords are currently set.").await?;
            return Ok(());
        }
        let overlord_ids: HashSet<&str> = self.roles.overlords().into_iter().collect();
        let users = session.room_users().await?;
        let names: Vec<String> = users
            .iter()
            .filter(|(u, _)| overlord_ids.contains(u.id.as_str()))
            .map(|(u, _)| format!("⚡ {}", u.username))
            .collect();
        if names.is_empty() {
            session
                .send_chat("No overlords are currently in the room.")
                .await?;
        } else {
            session
                .send_whisper(
                    &user.id,
                    &format!("Current overlords:\n{}", names.join("\n")),
                )
                .await?;
        }
        Ok(())
    }

    async fn cmd_announce(
        &self,
        session: &dyn RoomSession,
        user: &User,
        message: &str,
    ) -> CommandResult {
        if !self.roles.is_overlord(&user.id) {
            return Err(CommandError::Unauthorized(
                "⚡ Only overlords can make announcements.".to_string(),
            ));
        }
        session
            .send_chat(&format!(
                "📢 ANNOUNCEMENT FROM {}: {}",
                user.username.to_uppercase(),
                message
            ))
            .await?;
        Ok(())
    }

    async fn cmd_kick(
        &self,
        session: &dyn RoomSession,
        user: &User,
        username: &str,
    ) -> CommandResult {
        if !self.roles.is_overlord(&user.id) {
            return Err(CommandError::Unauthorized(
                "⚡ Only overlords can kick users.".to_string(),
            ));
        }
        let target = self.resolve_room_user(session, username).await?;
        if self.roles.is_overlord(&target.id) {
            return Err(CommandError::Unauthorized(
                "⚡ Cannot kick another overlord.".to_string(),
            ));
        }
        session.kick(&target.id).await?;
        session
            .send_chat(&format!(
                "🚪 {} has been kicked by overlord {}!",
                target.username, user.username
            ))
            .await?;
        Ok(())
    }

    async fn cmd_clear_room(&self, session: &dyn RoomSession, user: &User) -> CommandResult {
        if !self.roles.is_overlord(&user.id) {
            return Err(CommandError::Unauthorized(
                "⚡ Only overlords can clear the room.".to_string(),
            ));
        }
        let users = session.room_users().await?;
        let mut cleared = 0u32;
        for (room_user, _) in users {
            if room_user.id == user.id || self.roles.is_overlord(&room_user.id) {
                continue;
            }
            match session.kick(&room_user.id).await {
                Ok(()) => cleared += 1,
                Err(e) => warn!(user = %room_user.username, error = %e, "could not clear user"),
            }
        }
        session
            .send_chat(&format!(
                "🧹 Room clear initiated by {}. {} users removed.",
                user.username, cleared
            ))
            .await?;
        Ok(())
    }

    async fn cmd_shutdown(&mut self, session: &dyn RoomSession, user: &User) -> CommandResult {
        if !self.roles.is_overlord(&user.id) {
            return Err(CommandError::Unauthorized(
                "⚡ Only overlords can shut down the bot.".to_string(),
            ));
        }
        session
            .send_chat(&format!(
                "🔴 Bot shutdown initiated by overlord {}. Goodbye!",
                user.username
            ))
            .await?;
        self.flush();
        info!(user = %user.username, "shutdown requested, stores flushed");
        std::process::exit(0);
    }

    async fn cmd_bot_info(&self, session: &dyn RoomSession, user: &User) -> CommandResult {
        if !self.roles.is_overlord(&user.id) {
            return Err(CommandError::Unauthorized(
                "⚡ Only overlords can view bot information.".to_string(),
            ));
        }
        let users = session.room_users().await?;
        let info = format!(
            "🤖 Bot information:\nUsers in room: {}\nTotal admins: {}\nTotal overlords: {}\nTeleport points: {}\nCommands handled: {}\nStarted: {}\nWeb API: {}",
            users.len(),
            self.roles.admins().len(),
            self.roles.overlords().len(),
            self.waypoints.len(),
            self.commands_handled,
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            if session.web_api_ready() {
                "✅ active"
            } else {
                "❌ inactive"
            },
        );
        session.send_whisper(&user.id, &info).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pending::PendingPromotion;
    use crate::roles::{ADMINS_FILE, OVERLORDS_FILE};
    use crate::session::{ListedItem, RoomEvent};
    use crate::waypoints::Position;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    /// In-memory session double that records every outbound call.
    #[derive(Default)]
    struct FakeSession {
        chats: Mutex<Vec<String>>,
        whispers: Mutex<Vec<(String, String)>>,
        emotes: Mutex<Vec<(String, Option<String>)>>,
        teleports: Mutex<Vec<(String, Position)>>,
        kicks: Mutex<Vec<String>>,
        set_outfits: Mutex<Vec<Vec<OutfitItem>>>,
        users: Mutex<Vec<(User, Placement)>>,
        inventory: Mutex<Vec<OutfitItem>>,
        outfit: Mutex<Vec<OutfitItem>>,
        search_results: Mutex<Vec<ListedItem>>,
        web_api_key: Mutex<Option<String>>,
        fail_room_users: Mutex<bool>,
    }

    impl FakeSession {
        fn new() -> Self {
            Self::default()
        }

        fn with_users(self, users: Vec<(User, Placement)>) -> Self {
            *self.users.lock().unwrap() = users;
            self
        }

        fn with_web_api(self) -> Self {
            *self.web_api_key.lock().unwrap() = Some("test-key".to_string());
            self
        }

        fn chats(&self) -> Vec<String> {
            self.chats.lock().unwrap().clone()
        }

        fn whispers(&self) -> Vec<(String, String)> {
            self.whispers.lock().unwrap().clone()
        }

        fn emotes(&self) -> Vec<(String, Option<String>)> {
            self.emotes.lock().unwrap().clone()
        }

        fn teleports(&self) -> Vec<(String, Position)> {
            self.teleports.lock().unwrap().clone()
        }

        fn kicks(&self) -> Vec<String> {
            self.kicks.lock().unwrap().clone()
        }

        fn set_outfits(&self) -> Vec<Vec<OutfitItem>> {
            self.set_outfits.lock().unwrap().clone()
        }

        fn last_chat(&self) -> String {
            self.chats().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl RoomSession for FakeSession {
        async fn send_chat(&self, text: &str) -> Result<(), SessionError> {
            self.chats.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn send_whisper(&self, user_id: &str, text: &str) -> Result<(), SessionError> {
            self.whispers
                .lock()
                .unwrap()
                .push((user_id.to_string(), text.to_string()));
            Ok(())
        }

        async fn send_emote(
            &self,
            emote_id: &str,
            target: Option<&str>,
        ) -> Result<(), SessionError> {
            self.emotes
                .lock()
                .unwrap()
                .push((emote_id.to_string(), target.map(str::to_string)));
            Ok(())
        }

        async fn teleport(&self, user_id: &str, position: &Position) -> Result<(), SessionError> {
            self.teleports
                .lock()
                .unwrap()
                .push((user_id.to_string(), position.clone()));
            Ok(())
        }

        async fn room_users(&self) -> Result<Vec<(User, Placement)>, SessionError> {
            if *self.fail_room_users.lock().unwrap() {
                return Err(SessionError::Transport("connection reset".to_string()));
            }
            Ok(self.users.lock().unwrap().clone())
        }

        async fn inventory(&self) -> Result<Vec<OutfitItem>, SessionError> {
            Ok(self.inventory.lock().unwrap().clone())
        }

        async fn outfit(&self) -> Result<Vec<OutfitItem>, SessionError> {
            Ok(self.outfit.lock().unwrap().clone())
        }

        async fn set_outfit(&self, items: Vec<OutfitItem>) -> Result<(), SessionError> {
            *self.outfit.lock().unwrap() = items.clone();
            self.set_outfits.lock().unwrap().push(items);
            Ok(())
        }

        async fn search_items(&self, _name: &str) -> Result<Vec<ListedItem>, SessionError> {
            if self.web_api_key.lock().unwrap().is_none() {
                return Err(SessionError::WebApiDisabled);
            }
            Ok(self.search_results.lock().unwrap().clone())
        }

        async fn buy_item(&self, _item_id: &str) -> Result<BuyOutcome, SessionError> {
            Ok(BuyOutcome::Success)
        }

        async fn kick(&self, user_id: &str) -> Result<(), SessionError> {
            self.kicks.lock().unwrap().push(user_id.to_string());
            Ok(())
        }

        fn web_api_ready(&self) -> bool {
            self.web_api_key.lock().unwrap().is_some()
        }

        fn set_web_api_key(&self, key: String) {
            *self.web_api_key.lock().unwrap() = Some(key);
        }
    }

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            username: name.to_string(),
        }
    }

    fn at(x: f64, y: f64, z: f64) -> Placement {
        Placement::Point(Position::new(x, y, z))
    }

    struct TestRig {
        _dir: TempDir,
        bot: Bot,
    }

    fn rig() -> TestRig {
        let dir = tempdir().unwrap();
        let mut config = Config::default_for_room("room_test".to_string());
        config.data_dir = dir.path().to_path_buf();
        TestRig {
            bot: Bot::new(config),
            _dir: dir,
        }
    }

    fn data_path(rig: &TestRig, file: &str) -> std::path::PathBuf {
        rig.bot.config.data_dir.join(file)
    }

    #[tokio::test]
    async fn test_addadmin_denied_for_regular_user() {
        let mut rig = rig();
        let session = FakeSession::new()
            .with_users(vec![(user("u2", "alice"), at(0.0, 0.0, 0.0))]);

        rig.bot
            .handle_chat(&session, &user("u1", "bob"), "/addadmin @alice")
            .await;

        assert!(session.last_chat().contains("Only admins or overlords"));
        assert!(!rig.bot.roles.is_admin("u2"));
        assert!(!data_path(&rig, ADMINS_FILE).exists());
    }

    #[tokio::test]
    async fn test_addadmin_by_overlord() {
        let mut rig = rig();
        rig.bot.roles.promote("boss");
        let session = FakeSession::new()
            .with_users(vec![(user("u2", "Alice"), at(0.0, 0.0, 0.0))]);

        rig.bot
            .handle_chat(&session, &user("boss", "root"), "/addadmin @alice")
            .await;

        assert!(rig.bot.roles.is_admin("u2"));
        assert!(session.last_chat().contains("added as an admin"));
        assert!(data_path(&rig, ADMINS_FILE).exists());
    }

    #[tokio::test]
    async fn test_addoverlord_grants_both_tiers() {
        let mut rig = rig();
        rig.bot.roles.promote("boss");
        let session = FakeSession::new()
            .with_users(vec![(user("u2", "alice"), at(0.0, 0.0, 0.0))]);

        rig.bot
            .handle_chat(&session, &user("boss", "root"), "/addoverlord alice")
            .await;

        assert!(rig.bot.roles.is_overlord("u2"));
        assert!(rig.bot.roles.is_admin("u2"));
        assert!(session.last_chat().contains("OVERLORD"));
    }

    #[tokio::test]
    async fn test_removeoverlord_on_non_member_writes_nothing() {
        let mut rig = rig();
        rig.bot.roles.promote("boss");
        let before = std::fs::read_to_string(data_path(&rig, OVERLORDS_FILE)).unwrap();
        let session = FakeSession::new()
            .with_users(vec![(user("u2", "bob"), at(0.0, 0.0, 0.0))]);

        rig.bot
            .handle_chat(&session, &user("boss", "root"), "/removeoverlord @bob")
            .await;

        assert!(session.last_chat().contains("not an overlord"));
        let after = std::fs::read_to_string(data_path(&rig, OVERLORDS_FILE)).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_target_not_in_room() {
        let mut rig = rig();
        rig.bot.roles.promote("boss");
        let session = FakeSession::new();

        rig.bot
            .handle_chat(&session, &user("boss", "root"), "/addadmin @ghost")
            .await;

        assert!(session.last_chat().contains("not found in the room"));
    }

    #[tokio::test]
    async fn test_here_then_bare_label_teleports() {
        let mut rig = rig();
        let alice = user("u1", "alice");
        let bob = user("u2", "bob");
        let session = FakeSession::new().with_users(vec![
            (alice.clone(), at(10.0, 0.0, -5.0)),
            (bob.clone(), at(1.0, 0.0, 1.0)),
        ]);

        rig.bot.handle_chat(&session, &alice, "here stage").await;
        assert!(rig.bot.waypoints.contains("stage"));
        assert!(session.last_chat().contains("'stage' set at 10, 0, -5"));

        rig.bot.handle_chat(&session, &bob, "stage").await;
        let teleports = session.teleports();
        assert_eq!(teleports.len(), 1);
        assert_eq!(teleports[0].0, "u2");
        assert_eq!(teleports[0].1, Position::new(10.0, 0.0, -5.0));
    }

    #[tokio::test]
    async fn test_here_on_anchor_is_rejected() {
        let mut rig = rig();
        let alice = user("u1", "alice");
        let session = FakeSession::new().with_users(vec![(
            alice.clone(),
            Placement::Anchor {
                anchor_id: "seat-1".to_string(),
            },
        )]);

        rig.bot.handle_chat(&session, &alice, "here seatspot").await;

        assert!(session.last_chat().contains("anchor position"));
        assert!(rig.bot.waypoints.is_empty());
    }

    #[tokio::test]
    async fn test_direct_emote_fallback() {
        let mut rig = rig();
        let session = FakeSession::new();

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/bow")
            .await;

        assert_eq!(session.emotes(), vec![("emote-bow".to_string(), None)]);
    }

    #[tokio::test]
    async fn test_group_emote_targets_everyone() {
        let mut rig = rig();
        let session = FakeSession::new().with_users(vec![
            (user("u1", "alice"), at(0.0, 0.0, 0.0)),
            (user("u2", "bob"), at(1.0, 0.0, 1.0)),
        ]);

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/all bow")
            .await;

        let emotes = session.emotes();
        assert_eq!(emotes.len(), 2);
        assert!(emotes.iter().all(|(id, _)| id == "emote-bow"));
        assert!(session.last_chat().contains("Everyone is doing the bow emote"));
    }

    #[tokio::test]
    async fn test_unknown_emote_message() {
        let mut rig = rig();
        let session = FakeSession::new();

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/emotes juggling")
            .await;

        assert!(session.last_chat().contains("Unknown emote: juggling"));
    }

    #[tokio::test]
    async fn test_unknown_slash_input_is_silent() {
        let mut rig = rig();
        let session = FakeSession::new();

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/xyzzy")
            .await;

        assert!(session.chats().is_empty());
        assert!(session.whispers().is_empty());
        assert_eq!(rig.bot.commands_handled, 0);
    }

    #[tokio::test]
    async fn test_help_sections_grow_with_role() {
        let mut rig = rig();
        rig.bot.roles.promote("boss");

        let session = FakeSession::new();
        rig.bot
            .handle_chat(&session, &user("u1", "pleb"), "/help")
            .await;
        let plain_count = session.whispers().len();

        let session = FakeSession::new();
        rig.bot
            .handle_chat(&session, &user("boss", "root"), "/help")
            .await;
        let overlord_count = session.whispers().len();

        // Admin section plus two overlord sections
        assert_eq!(overlord_count, plain_count + 3);
    }

    #[tokio::test]
    async fn test_teleports_listing() {
        let mut rig = rig();
        let alice = user("u1", "alice");
        let session = FakeSession::new().with_users(vec![(alice.clone(), at(2.0, 0.0, 2.0))]);

        rig.bot.handle_chat(&session, &alice, "/teleports").await;
        assert!(session.last_chat().contains("No teleport points"));

        rig.bot.handle_chat(&session, &alice, "here spot").await;
        rig.bot.handle_chat(&session, &alice, "/teleports").await;
        let whispers = session.whispers();
        let (_, listing) = whispers.last().unwrap();
        assert!(listing.contains("- spot"));
    }

    #[tokio::test]
    async fn test_freeitem_listing_and_equip() {
        let mut rig = rig();
        let alice = user("u1", "alice");
        let session = FakeSession::new();

        rig.bot.handle_chat(&session, &alice, "/freeitem top").await;
        let whispers = session.whispers();
        assert!(whispers.last().unwrap().1.contains("0: Tank - White"));

        rig.bot
            .handle_chat(&session, &alice, "/freeitem top 0")
            .await;
        let outfits = session.set_outfits();
        assert_eq!(outfits.len(), 1);
        assert!(outfits[0].iter().any(|i| i.category() == "shirt"));
        assert!(session
            .whispers()
            .last()
            .unwrap()
            .1
            .contains("Equipped Tank - White"));
    }

    #[tokio::test]
    async fn test_freeitem_bad_index() {
        let mut rig = rig();
        let session = FakeSession::new();

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/freeitem top 999")
            .await;
        assert!(session.last_chat().contains("out of range"));

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/freeitem top x")
            .await;
        assert!(session.last_chat().contains("whole number"));
    }

    #[tokio::test]
    async fn test_color_requires_equipped_category() {
        let mut rig = rig();
        let session = FakeSession::new();

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/color shirt 3")
            .await;
        assert!(session.last_chat().contains("No item of category 'shirt'"));

        *session.outfit.lock().unwrap() = vec![OutfitItem::new("shirt-n_basic")];
        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/color shirt 3")
            .await;
        assert!(session.last_chat().contains("color palette 3"));
        let outfits = session.set_outfits();
        assert_eq!(outfits.last().unwrap()[0].active_palette, 3);
    }

    #[tokio::test]
    async fn test_color_usage_message() {
        let mut rig = rig();
        let session = FakeSession::new();

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/color shirt")
            .await;
        assert!(session.last_chat().contains("Usage: /color"));
    }

    #[tokio::test]
    async fn test_remove_item() {
        let mut rig = rig();
        let session = FakeSession::new();
        *session.outfit.lock().unwrap() = vec![
            OutfitItem::new("shirt-n_basic"),
            OutfitItem::new("pants-n_basic"),
        ];

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/remove shirt")
            .await;
        assert!(session.last_chat().contains("Removed shirt"));
        let outfits = session.set_outfits();
        assert_eq!(outfits.last().unwrap().len(), 1);

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/remove spaceship")
            .await;
        assert!(session.last_chat().contains("Invalid category"));
    }

    #[tokio::test]
    async fn test_equip_without_web_api() {
        let mut rig = rig();
        let session = FakeSession::new();

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/equip Vintage Jersey")
            .await;
        assert!(session.last_chat().contains("Web API is not initialized"));
    }

    #[tokio::test]
    async fn test_equip_free_search_result() {
        let mut rig = rig();
        let session = FakeSession::new().with_web_api();
        *session.search_results.lock().unwrap() = vec![ListedItem {
            item_id: "shirt-n_jerseywhite".to_string(),
            item_name: "White Vintage Jersey".to_string(),
            category: "shirt".to_string(),
            rarity: "NONE".to_string(),
            is_purchasable: false,
        }];

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/equip Vintage Jersey")
            .await;

        assert!(session.last_chat().contains("Equipped 'White Vintage Jersey'"));
        let outfits = session.set_outfits();
        assert!(outfits.last().unwrap().iter().any(|i| i.id == "shirt-n_jerseywhite"));
    }

    #[tokio::test]
    async fn test_equip_not_found() {
        let mut rig = rig();
        let session = FakeSession::new().with_web_api();

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/equip Crown of Ages")
            .await;
        assert!(session.last_chat().contains("not found"));
    }

    #[tokio::test]
    async fn test_setapikey_enables_outfits() {
        let mut rig = rig();
        let session = FakeSession::new();
        assert!(!session.web_api_ready());

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/setapikey secret-key-1")
            .await;

        assert!(session.web_api_ready());
        assert!(session.whispers().last().unwrap().1.contains("API key set"));
    }

    #[tokio::test]
    async fn test_randomoutfit_keeps_body() {
        let mut rig = rig();
        let session = FakeSession::new().with_web_api();
        *session.outfit.lock().unwrap() = vec![
            OutfitItem::new("body-n_base"),
            OutfitItem::new("shirt-n_old"),
        ];

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/randomoutfit")
            .await;

        let outfits = session.set_outfits();
        let applied = outfits.last().unwrap();
        assert!(applied.iter().any(|i| i.id == "body-n_base"));
        // At most one item per category
        let mut seen = HashSet::new();
        assert!(applied.iter().all(|i| seen.insert(i.category().to_string())));
        assert!(session.last_chat().contains("random outfit"));
    }

    #[tokio::test]
    async fn test_summon_moves_target_to_issuer() {
        let mut rig = rig();
        let alice = user("u1", "alice");
        let bob = user("u2", "bob");
        let session = FakeSession::new().with_users(vec![
            (alice.clone(), at(3.0, 0.0, 4.0)),
            (bob.clone(), at(9.0, 0.0, 9.0)),
        ]);

        rig.bot.handle_chat(&session, &alice, "/summon @bob").await;

        let teleports = session.teleports();
        assert_eq!(teleports.len(), 1);
        assert_eq!(teleports[0].0, "u2");
        assert_eq!(teleports[0].1, Position::new(3.0, 0.0, 4.0));
        assert!(session.last_chat().contains("summoned by alice"));
    }

    #[tokio::test]
    async fn test_kick_protects_overlords() {
        let mut rig = rig();
        rig.bot.roles.promote("boss");
        rig.bot.roles.promote("boss2");
        let session = FakeSession::new()
            .with_users(vec![(user("boss2", "other"), at(0.0, 0.0, 0.0))]);

        rig.bot
            .handle_chat(&session, &user("boss", "root"), "/kick @other")
            .await;

        assert!(session.kicks().is_empty());
        assert!(session.last_chat().contains("Cannot kick another overlord"));
    }

    #[tokio::test]
    async fn test_kick_denied_for_admin() {
        let mut rig = rig();
        rig.bot.roles.promote("boss");
        rig.bot.roles.add_admin("boss", "a1").unwrap();
        let session = FakeSession::new()
            .with_users(vec![(user("u2", "bob"), at(0.0, 0.0, 0.0))]);

        rig.bot
            .handle_chat(&session, &user("a1", "admin"), "/kick @bob")
            .await;

        assert!(session.kicks().is_empty());
        assert!(session.last_chat().contains("Only overlords can kick"));
    }

    #[tokio::test]
    async fn test_clearroom_spares_overlords_and_issuer() {
        let mut rig = rig();
        rig.bot.roles.promote("boss");
        rig.bot.roles.promote("boss2");
        let session = FakeSession::new().with_users(vec![
            (user("boss", "root"), at(0.0, 0.0, 0.0)),
            (user("boss2", "other"), at(1.0, 0.0, 1.0)),
            (user("u3", "guest1"), at(2.0, 0.0, 2.0)),
            (user("u4", "guest2"), at(3.0, 0.0, 3.0)),
        ]);

        rig.bot
            .handle_chat(&session, &user("boss", "root"), "/clearroom")
            .await;

        let mut kicked = session.kicks();
        kicked.sort();
        assert_eq!(kicked, vec!["u3".to_string(), "u4".to_string()]);
        assert!(session.last_chat().contains("2 users removed"));
    }

    #[tokio::test]
    async fn test_announce_is_overlord_only() {
        let mut rig = rig();
        rig.bot.roles.promote("boss");
        let session = FakeSession::new();

        rig.bot
            .handle_chat(&session, &user("u1", "pleb"), "/announce party time")
            .await;
        assert!(session.last_chat().contains("Only overlords can make announcements"));

        rig.bot
            .handle_chat(&session, &user("boss", "Root"), "/announce party  time")
            .await;
        assert_eq!(
            session.last_chat(),
            "📢 ANNOUNCEMENT FROM ROOT: party  time"
        );
    }

    #[tokio::test]
    async fn test_botinfo_overlord_only() {
        let mut rig = rig();
        rig.bot.roles.promote("boss");
        let session = FakeSession::new()
            .with_users(vec![(user("boss", "root"), at(0.0, 0.0, 0.0))]);

        rig.bot
            .handle_chat(&session, &user("u1", "pleb"), "/botinfo")
            .await;
        assert!(session.last_chat().contains("Only overlords"));

        rig.bot
            .handle_chat(&session, &user("boss", "root"), "/botinfo")
            .await;
        let whispers = session.whispers();
        let (_, info) = whispers.last().unwrap();
        assert!(info.contains("Users in room: 1"));
        assert!(info.contains("Total overlords: 1"));
    }

    #[tokio::test]
    async fn test_shutdown_denied_for_regular_user() {
        let mut rig = rig();
        let session = FakeSession::new();

        rig.bot
            .handle_chat(&session, &user("u1", "pleb"), "/shutdown")
            .await;

        assert!(session.last_chat().contains("Only overlords can shut down"));
    }

    #[tokio::test]
    async fn test_list_admins_resolves_names() {
        let mut rig = rig();
        rig.bot.roles.promote("boss");
        rig.bot.roles.add_admin("boss", "u2").unwrap();
        let session = FakeSession::new().with_users(vec![
            (user("u2", "alice"), at(0.0, 0.0, 0.0)),
            (user("u3", "bob"), at(1.0, 0.0, 1.0)),
        ]);

        rig.bot
            .handle_chat(&session, &user("boss", "root"), "/admins")
            .await;

        let whispers = session.whispers();
        let (_, listing) = whispers.last().unwrap();
        assert!(listing.contains("alice"));
        assert!(!listing.contains("bob"));
    }

    #[tokio::test]
    async fn test_session_failure_is_contained() {
        let mut rig = rig();
        let session = FakeSession::new();
        *session.fail_room_users.lock().unwrap() = true;

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/summon @bob")
            .await;
        assert_eq!(rig.bot.commands_failed, 1);
        assert!(session.last_chat().contains("Something went wrong"));

        // The dispatcher keeps working afterwards.
        *session.fail_room_users.lock().unwrap() = false;
        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "/bow")
            .await;
        assert_eq!(session.emotes().len(), 1);
    }

    #[tokio::test]
    async fn test_pending_promotion_consumed_once_via_events() {
        let dir = tempdir().unwrap();
        PendingPromotion::arm(dir.path(), "Alice", "first sighting");
        let mut config = Config::default_for_room("room_test".to_string());
        config.data_dir = dir.path().to_path_buf();
        config.greet_on_join = false;
        let mut bot = Bot::new(config);
        let session = FakeSession::new();

        let join = |u: User| RoomEvent::Join {
            user: u,
            position: at(0.0, 0.0, 0.0),
        };
        bot.handle_event(&session, join(user("u1", "alice"))).await;
        bot.handle_event(&session, join(user("u2", "Alice"))).await;

        assert!(bot.roles.is_overlord("u1"));
        assert!(!bot.roles.is_overlord("u2"));
        let promotions = session
            .chats()
            .iter()
            .filter(|c| c.contains("promoted to overlord"))
            .count();
        assert_eq!(promotions, 1);
    }

    #[tokio::test]
    async fn test_join_greeting() {
        let mut rig = rig();
        let session = FakeSession::new();

        rig.bot
            .handle_event(
                &session,
                RoomEvent::Join {
                    user: user("u1", "alice"),
                    position: at(0.0, 0.0, 0.0),
                },
            )
            .await;

        assert!(session.last_chat().contains("Welcome, alice"));
        assert_eq!(session.emotes(), vec![("emote-hello".to_string(), None)]);
    }

    #[tokio::test]
    async fn test_leave_farewell() {
        let mut rig = rig();
        let session = FakeSession::new();

        rig.bot
            .handle_event(
                &session,
                RoomEvent::Leave {
                    user: user("u1", "alice"),
                },
            )
            .await;

        assert!(session.last_chat().contains("alice has left the room"));
    }

    #[tokio::test]
    async fn test_plain_chatter_ignored() {
        let mut rig = rig();
        let session = FakeSession::new();

        rig.bot
            .handle_chat(&session, &user("u1", "alice"), "good morning everyone")
            .await;

        assert!(session.chats().is_empty());
        assert_eq!(rig.bot.commands_handled, 0);
    }
}
