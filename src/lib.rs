//! TrailProbe - simulate AWS control-plane API calls to generate CloudTrail telemetry
//!
//! TrailProbe issues realistic, low-risk calls against AWS service APIs so the
//! resulting audit-log entries can exercise detection pipelines. It never asks
//! for elevated privileges and leaves no persistent side effects: every call
//! either reads, carries `DryRun`, or targets deliberately non-existent
//! resources so the provider rejects it server-side after logging it.
//!
//! # Pipeline
//!
//! For each target service, the [`orchestrator::Orchestrator`] acquires an
//! authenticated client, asks the [`selector`] for a policy-driven subset of
//! the service's operation catalog ([`catalog`]), synthesizes minimally valid
//! arguments from each operation's input schema ([`synth`]), invokes the
//! operation through a real client ([`client`]), and appends one structured
//! JSON record per attempt to stdout ([`recorder`]) - all under a per-service
//! token bucket ([`limiter`]) with bounded worker pools at both the
//! per-service and cross-service level.
//!
//! The core is deliberately decoupled from AWS specifics: the catalog
//! provider and the client dispatch live behind traits, so the selection,
//! synthesis, and orchestration logic is exercised in tests with in-memory
//! fakes.

#![warn(clippy::all, rust_2018_idioms)]

pub mod catalog;
pub mod client;
pub mod config;
pub mod executor;
pub mod limiter;
pub mod orchestrator;
pub mod recorder;
pub mod schema;
pub mod selector;
pub mod session;
pub mod synth;
