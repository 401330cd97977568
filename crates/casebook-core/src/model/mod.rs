//! Entity types persisted by the repository.
//!
//! Every entity derives `Default` so callers can build inputs with struct
//! update syntax; server-managed fields (IDs, timestamps) are overwritten by
//! the store on create.

pub mod action;
pub mod assist_log;
pub mod case;
pub mod case_message;
pub mod knowledge;
pub mod memory;
pub mod risk;
pub mod slack_user;
pub mod source;
pub mod token;

pub use action::{Action, ActionStatus};
pub use assist_log::AssistLog;
pub use case::{Case, CaseFilter, CaseStatus};
pub use case_message::CaseMessage;
pub use knowledge::Knowledge;
pub use memory::Memory;
pub use risk::{Response, ResponseStatus, Risk, RiskResponseLink};
pub use slack_user::{SlackUser, SlackUserMetadata};
pub use source::{
  NotionDbConfig, NotionPageConfig, SlackChannel, SlackConfig, Source, SourceConfig,
  SourceType,
};
pub use token::{Token, TokenId, TokenSecret};
