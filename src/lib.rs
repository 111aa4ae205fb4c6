pub mod api;
pub mod cache;
pub mod categories;
pub mod category_tree;
pub mod config;
pub mod contact;
pub mod fetcher;
pub mod handlers;
pub mod i18n;
pub mod layout;
pub mod models;
pub mod pages;
pub mod query_state;

#[cfg(test)]
mod testing;
