//! # Vortex Telegram Bot
//!
//! A Telegram bot that lets each conversation create token-launch projects,
//! edit their metadata through inline menus, attach wallets and mark them as
//! deployed once the required fields are filled in.

pub mod bot;
pub mod callback;
pub mod config;
pub mod dialogue;
pub mod edit_controller;
pub mod errors;
pub mod localization;
pub mod project;
pub mod repository;
pub mod storage;
