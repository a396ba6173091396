//! Newsletter tools and the workflow steps that drive them.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`SocialPostTool`] | `createSocialMediaPost`, writes `SOCIAL#<platform>` drafts |
//! | [`InsightsTool`] | `recordInsights`, upserts the `analytics` record |
//! | [`SocialPostStep`] / [`InsightsStep`] | One conversation plus read-back |

pub mod insights;
pub mod pipeline;
pub mod social;

pub use insights::{InsightsArgs, InsightsTool, INSIGHTS_TOOL};
pub use pipeline::{InsightsStep, SocialPostStep, StepOutcome};
pub use social::{Platform, SocialPostArgs, SocialPostTool, ISSUE_ID_PATTERN, SOCIAL_POST_TOOL};

use crate::config::SocialConfig;
use crate::store::PersistenceSink;
use crate::tools::ToolDescriptor;
use std::sync::Arc;

/// Descriptors for every newsletter tool, bound to one sink.
pub fn all_tools(sink: Arc<dyn PersistenceSink>, social: SocialConfig) -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::from_tool(SocialPostTool::new(sink.clone(), social)),
        ToolDescriptor::from_tool(InsightsTool::new(sink)),
    ]
}
