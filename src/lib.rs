//! # teamtasks
//!
//! Client core for a small-team task tracker backed by a remote list API.
//!
//! ## Key Features
//!
//! - **Remote sync**: tasks, modules, teams and employees are loaded from the list
//!   API; create/update/delete/complete go to the API first and only touch local
//!   state once the backend confirms.
//! - **Snapshot cache**: the task list is mirrored to a local JSON slot after every
//!   change and shown on startup before the remote fetch completes.
//! - **KPI rollups**: completion percentages, hours spent, average time per task,
//!   estimated vs actual hours and urgent-task groups per module; per-team
//!   summaries; employee drill-downs.
//! - **Priority from story points**: `>= 7` high, `4..=6` medium, below 4 low.
//!
//! ## Layout
//!
//! - [`gateway`]: JSON over HTTP against `{base_url}/{endpoint}`
//! - [`normalize`]: raw API records into the canonical [`task`] shapes
//! - [`store`] and [`cache`]: in-memory collections and their durable mirror
//! - [`kpi`]: pure aggregation over a store snapshot
//! - [`reconcile`]: confirmed-write mutations and degrading reads

pub mod cache;
pub mod config;
pub mod error;
pub mod fields;
pub mod gateway;
pub mod kpi;
pub mod launch;
pub mod normalize;
pub mod reconcile;
pub mod store;
pub mod task;

pub use config::Config;
pub use error::{GatewayError, ReconcileError, ValidationGap};
pub use gateway::{Gateway, HttpGateway};
pub use kpi::{Dashboard, Dataset, TaskFilter};
pub use reconcile::Reconciler;
pub use store::LocalStore;
pub use task::{Employee, Module, NewTask, Recommendation, Task, TaskUpdate, Team};
