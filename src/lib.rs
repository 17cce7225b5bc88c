//! Membership Bot Library
//!
//! A Telegram bot that rewards users with premium access for adding it to
//! groups, and shares content to every tracked group.
//!
//! This crate provides the core functionality for:
//! - Loading, merging and persisting the bot's data snapshot
//! - Resolving account tiers and gating privileged actions
//! - Granting and revoking premium from group membership changes
//! - Expiring premium grants on a timer
//! - Paced, failure-isolated content dispatch and recurring auto-share
//! - Handling user commands via chat messages

pub mod access;
pub mod commands;
pub mod config;
pub mod cooldown;
pub mod dispatch;
pub mod reward;
pub mod scheduler;
pub mod state;
pub mod telegram;
