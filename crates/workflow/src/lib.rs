//! Conversation workflow for collecting and republishing episode videos.
//!
//! The crate is transport-agnostic: the Telegram adapter classifies inbound
//! updates into [`Inbound`], feeds them to the [`Machine`] together with the
//! conversation's [`SessionData`], and delivers the resulting [`Reaction`]
//! through a [`Transport`].

pub mod caption;
pub mod deliver;
pub mod dispatch;
pub mod error;
pub mod inbound;
pub mod machine;
pub mod media;
pub mod outbound;
pub mod plan;
pub mod state;

pub use {
    caption::{CaptionFields, FormatError, PLACEHOLDERS},
    deliver::{Transport, deliver},
    dispatch::{Details, DispatchFault, DispatchOutcome, FaultKind},
    error::{Error, Result},
    inbound::{Command, Content, Inbound},
    machine::Machine,
    media::MediaRef,
    outbound::{Outbound, Publication, Reaction},
    plan::{EpisodeBatch, PlanError},
    state::{ChatSettings, ConversationState, Mode, ModeSession, PendingCount, SessionData, Tier},
};
