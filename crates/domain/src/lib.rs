//! # soundboard-domain
//!
//! Pure domain model for the soundboard routine engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, local time
//! - Define **Routines** (trigger → condition → action rules, owned by a guild)
//! - Define **Conditions** and the condition expression engine
//!   (tokenizer, precedence parser, evaluator, `C1`…`Cn` atom labels)
//! - Define **Facts** (the snapshot a condition is evaluated against)
//! - Define **Voice events** and voice presence tracking
//! - Define **Effects** (what a routine asks the outside world to do)
//! - Parse the routine **command** language (`on join if … do … then …`)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod effect;
pub mod facts;
pub mod presence;
pub mod routine;
pub mod voice;
