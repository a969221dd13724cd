//! Worksite and task planning backend.
//!
//! JSON over HTTP for worksites (chantiers), tasks, sub-tasks, teams,
//! resources, users, tags, the planning board and its configuration, stored
//! in Postgres through diesel or in memory.

pub mod core;
pub mod dashboard;
pub mod main_module;
pub mod planning;
pub mod resources;
pub mod settings;
pub mod subtasks;
pub mod tags;
pub mod tasks;
pub mod teams;
pub mod users;
pub mod worksites;
