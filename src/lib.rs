//! Back up and restore a Linux machine's package profile.
//!
//! `tuxsync backup` lists the packages the user installed explicitly,
//! records the distribution and the shell config, and stores the result as
//! a secret GitHub gist or on a user-operated server. `tuxsync restore`
//! fetches a backup by identifier, installs its packages through the
//! distro-agnostic `tuxmate` executor and restores the shell config,
//! keeping a timestamped copy of whatever it replaces.
//!
//! The crate is organised in layers:
//!
//! - **[`scanner`]** and **[`profile`]** describe the machine
//! - **[`storage`]** moves profiles to and from a backend
//! - **[`resources`]** and **[`tasks`]** apply a profile step by step
//! - **[`commands`]** orchestrate the `backup`, `restore` and `list` subcommands
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod dotfiles;
pub mod error;
pub mod exec;
pub mod installer;
pub mod logging;
pub mod platform;
pub mod profile;
pub mod prompt;
pub mod resources;
pub mod scanner;
pub mod storage;
pub mod tasks;
