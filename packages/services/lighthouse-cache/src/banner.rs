use async_graphql::{Enum, SimpleObject};
use serde::{Deserialize, Serialize};

/// What the dashboard banner should show for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BannerState {
    /// Lighthouse is not configured for the tenant.
    Enable,
    Recommendation(String),
    /// The recommendations lease is held.
    Reviewing,
    Hidden,
}

impl BannerState {
    /// Precedence: not configured, then a cached non-blank recommendation, then
    /// generation in progress.
    pub fn resolve(configured: bool, recommendation: Option<&str>, processing: bool) -> Self {
        if !configured {
            return BannerState::Enable;
        }
        match recommendation.map(str::trim) {
            Some(text) if !text.is_empty() => BannerState::Recommendation(text.to_string()),
            _ if processing => BannerState::Reviewing,
            _ => BannerState::Hidden,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum BannerKind {
    Enable,
    Recommendation,
    Reviewing,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, SimpleObject)]
pub struct BannerView {
    pub kind: BannerKind,
    pub message: Option<String>,
    pub href: Option<String>,
    pub animate: bool,
}

impl From<BannerState> for BannerView {
    fn from(state: BannerState) -> Self {
        match state {
            BannerState::Enable => BannerView {
                kind: BannerKind::Enable,
                message: Some("Enable Lighthouse to Secure Your Cloud With AI Insights".to_string()),
                href: Some("/lighthouse/config".to_string()),
                animate: false,
            },
            BannerState::Recommendation(text) => BannerView {
                kind: BannerKind::Recommendation,
                message: Some(text),
                href: Some("/lighthouse".to_string()),
                animate: false,
            },
            BannerState::Reviewing => BannerView {
                kind: BannerKind::Reviewing,
                message: Some("Lighthouse Is Reviewing Your Findings for Insights".to_string()),
                href: Some("/lighthouse".to_string()),
                animate: true,
            },
            BannerState::Hidden => BannerView {
                kind: BannerKind::Hidden,
                message: None,
                href: None,
                animate: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence() {
        assert_eq!(BannerState::resolve(false, Some("x"), true), BannerState::Enable);
        assert_eq!(
            BannerState::resolve(true, Some(" Patch it "), true),
            BannerState::Recommendation("Patch it".to_string())
        );
        assert_eq!(BannerState::resolve(true, Some("   "), true), BannerState::Reviewing);
        assert_eq!(BannerState::resolve(true, None, false), BannerState::Hidden);
    }
}
