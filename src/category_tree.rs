//! Two-level navigation menu: catalog → categories → items.
//!
//! Categories are listed in the order they first appear in the flat item
//! list. A category's id is taken from the first item carrying that display
//! name; with no such item the name itself is used as the id.

use crate::models::{CatalogItem, CatalogKind};
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};

pub const MENU_CLOSE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MenuEntry {
    pub name: String,
    pub id: String,
    pub items: Vec<CatalogItem>,
}

impl MenuEntry {
    /// Entries without items still show in the top level, just not expandable.
    pub fn has_submenu(&self) -> bool {
        !self.items.is_empty()
    }
}

/**
 * resolve_category_id
 * Id of the first item whose display category equals `name`, else `name` itself.
 */
pub fn resolve_category_id(items: &[CatalogItem], name: &str) -> String {
    items
        .iter()
        .find(|item| item.category == name)
        .map(|item| item.category_id.clone())
        .unwrap_or_else(|| name.to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTree {
    pub kind: CatalogKind,
    entries: Vec<MenuEntry>,
    #[serde(skip)]
    items: Vec<CatalogItem>,
}

impl CategoryTree {
    pub fn build(kind: CatalogKind, items: Vec<CatalogItem>) -> Self {
        let names: Vec<String> = {
            let mut seen = HashSet::new();
            let names = items
                .iter()
                .filter(|item| seen.insert(item.category.as_str()))
                .map(|item| item.category.clone())
                .collect();
            names
        };

        let entries = names
            .into_iter()
            .map(|name| {
                let id = resolve_category_id(&items, &name);
                let members = items
                    .iter()
                    .filter(|item| item.category_id == id)
                    .cloned()
                    .collect();
                MenuEntry {
                    name,
                    id,
                    items: members,
                }
            })
            .collect();

        Self {
            kind,
            entries,
            items,
        }
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn items_in_category(&self, category_id: &str) -> Vec<&CatalogItem> {
        self.items
            .iter()
            .filter(|item| item.category_id == category_id)
            .collect()
    }

    pub fn entry(&self, category_id: &str) -> Option<&MenuEntry> {
        self.entries.iter().find(|entry| entry.id == category_id)
    }
}

/// Which part of the header menu is open. A nested submenu cannot be open
/// without its top-level menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuState {
    Closed,
    OpenTop(CatalogKind),
    OpenNested(CatalogKind, String),
}

impl MenuState {
    pub fn top(&self) -> Option<CatalogKind> {
        match self {
            MenuState::Closed => None,
            MenuState::OpenTop(kind) | MenuState::OpenNested(kind, _) => Some(*kind),
        }
    }
}

/// Hover/focus driven menu with a debounced close, so pointer travel
/// between a trigger and its panel does not flicker the menu shut.
#[derive(Debug)]
pub struct MenuController {
    state: MenuState,
    close_at: Option<Instant>,
    close_delay: Duration,
}

impl Default for MenuController {
    fn default() -> Self {
        Self::new(MENU_CLOSE_DELAY)
    }
}

impl MenuController {
    pub fn new(close_delay: Duration) -> Self {
        Self {
            state: MenuState::Closed,
            close_at: None,
            close_delay,
        }
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn hover_top(&mut self, kind: CatalogKind) {
        self.close_at = None;
        if self.state.top() != Some(kind) {
            self.state = MenuState::OpenTop(kind);
        }
    }

    /// Opens the nested submenu of `category_id`, or collapses to the top
    /// level when that category has no items.
    pub fn hover_category(&mut self, tree: &CategoryTree, category_id: &str) {
        self.close_at = None;
        let expandable = tree
            .entry(category_id)
            .map(MenuEntry::has_submenu)
            .unwrap_or(false);
        self.state = if expandable {
            MenuState::OpenNested(tree.kind, category_id.to_string())
        } else {
            MenuState::OpenTop(tree.kind)
        };
    }

    pub fn leave(&mut self, now: Instant) {
        if self.state != MenuState::Closed {
            self.close_at = Some(now + self.close_delay);
        }
    }

    /// Applies a pending close once its deadline has passed. Returns whether the menu closed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.close_at {
            Some(deadline) if now >= deadline => {
                self.close();
                true
            }
            _ => false,
        }
    }

    pub fn close(&mut self) {
        self.state = MenuState::Closed;
        self.close_at = None;
    }
}
