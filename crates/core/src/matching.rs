//! Consumption of server-computed match results.
//!
//! Scores and levels come from the matching service; nothing here computes
//! them. This module only buckets, orders and labels what the server sent.

use serde::{Deserialize, Serialize};
use crate::project::Project;
use crate::user::UserSummary;

/// Match quality reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    /// A level this client does not know
    Unknown(String),
}

impl MatchLevel {
    /// Whether the level counts as a recommendation.
    pub fn is_strong(&self) -> bool {
        matches!(self, MatchLevel::Excellent | MatchLevel::Good)
    }

    /// Get string representation.
    pub fn as_str(&self) -> &str {
        match self {
            MatchLevel::Excellent => "excellent",
            MatchLevel::Good => "good",
            MatchLevel::Fair => "fair",
            MatchLevel::Poor => "poor",
            MatchLevel::Unknown(other) => other,
        }
    }
}

impl From<String> for MatchLevel {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "excellent" => MatchLevel::Excellent,
            "good" => MatchLevel::Good,
            "fair" => MatchLevel::Fair,
            "poor" => MatchLevel::Poor,
            _ => MatchLevel::Unknown(s),
        }
    }
}

impl From<MatchLevel> for String {
    fn from(level: MatchLevel) -> Self {
        level.as_str().to_string()
    }
}

/// Badge color classes for a match level.
pub fn badge_class(level: &MatchLevel) -> &'static str {
    match level {
        MatchLevel::Excellent => "bg-green-100 text-green-800",
        MatchLevel::Good => "bg-blue-100 text-blue-800",
        MatchLevel::Fair => "bg-yellow-100 text-yellow-800",
        MatchLevel::Poor => "bg-red-100 text-red-800",
        MatchLevel::Unknown(_) => "bg-gray-100 text-gray-800",
    }
}

/// Level plus the server's display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    /// Match level
    pub level: MatchLevel,

    /// Display label, e.g. "Excellent Match"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A project annotated with its match against the current freelancer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredProject {
    /// The project
    #[serde(flatten)]
    pub project: Project,

    /// Server score, 0-100
    #[serde(default)]
    pub match_score: f64,

    /// Server level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_level: Option<MatchInfo>,

    /// Explicit recommendation flag, when the server sends one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recommended: Option<bool>,
}

impl ScoredProject {
    /// Explicit flag first, otherwise a strong match level.
    pub fn is_recommended(&self) -> bool {
        self.is_recommended
            .unwrap_or_else(|| self.match_level.as_ref().is_some_and(|m| m.level.is_strong()))
    }
}

/// Recommended projects split for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationBuckets {
    /// Shown under "Recommended for you"
    pub recommended: Vec<ScoredProject>,
    /// Everything else
    pub others: Vec<ScoredProject>,
}

impl RecommendationBuckets {
    /// Split scored projects, keeping server order within each bucket.
    pub fn from_scored(projects: Vec<ScoredProject>) -> Self {
        let (recommended, others) = projects.into_iter().partition(|p| p.is_recommended());
        Self { recommended, others }
    }

    /// Total number of projects.
    pub fn len(&self) -> usize {
        self.recommended.len() + self.others.len()
    }

    /// Whether both buckets are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A freelancer suggested for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedFreelancer {
    /// The freelancer
    pub freelancer: UserSummary,

    /// Server score, 0-100
    #[serde(default)]
    pub match_score: f64,

    /// Server level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_level: Option<MatchInfo>,

    /// Project skills the freelancer has
    #[serde(default)]
    pub matched_skills: Vec<String>,
}

/// Order suggestions by score, highest first; ties keep server order.
pub fn rank_suggestions(mut suggestions: Vec<SuggestedFreelancer>) -> Vec<SuggestedFreelancer> {
    suggestions.sort_by(|a, b| {
        b.match_score
            .partial_cmp(&a.match_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::tests::project;

    fn scored(score: f64, level: Option<&str>, flag: Option<bool>) -> ScoredProject {
        ScoredProject {
            project: project(vec![]),
            match_score: score,
            match_level: level.map(|l| MatchInfo {
                level: MatchLevel::from(l.to_string()),
                label: None,
            }),
            is_recommended: flag,
        }
    }

    #[test]
    fn test_badge_lookup() {
        assert_eq!(badge_class(&MatchLevel::Excellent), "bg-green-100 text-green-800");
        assert_eq!(badge_class(&MatchLevel::Fair), "bg-yellow-100 text-yellow-800");
        assert_eq!(
            badge_class(&MatchLevel::from("stellar".to_string())),
            "bg-gray-100 text-gray-800"
        );
    }

    #[test]
    fn test_level_parsing_is_lenient() {
        let level: MatchLevel = serde_json::from_str("\"Excellent\"").unwrap();
        assert_eq!(level, MatchLevel::Excellent);
        let level: MatchLevel = serde_json::from_str("\"partial\"").unwrap();
        assert_eq!(level, MatchLevel::Unknown("partial".to_string()));
        assert_eq!(serde_json::to_string(&level).unwrap(), "\"partial\"");
    }

    #[test]
    fn test_buckets() {
        let buckets = RecommendationBuckets::from_scored(vec![
            scored(92.0, Some("excellent"), None),
            scored(40.0, Some("fair"), None),
            scored(70.0, Some("good"), Some(false)),
            scored(10.0, None, Some(true)),
            scored(0.0, None, None),
        ]);
        assert_eq!(buckets.recommended.len(), 2);
        assert_eq!(buckets.others.len(), 3);
        assert_eq!(buckets.recommended[0].match_score, 92.0);
        assert_eq!(buckets.recommended[1].match_score, 10.0);
    }

    #[test]
    fn test_rank_is_stable() {
        let mk = |id: &str, score: f64| SuggestedFreelancer {
            freelancer: UserSummary {
                id: crate::UserId::new(id),
                fullname: None,
                email: None,
                profile_photo: None,
            },
            match_score: score,
            match_level: None,
            matched_skills: vec![],
        };
        let ranked = rank_suggestions(vec![mk("a", 50.0), mk("b", 80.0), mk("c", 50.0)]);
        let ids: Vec<_> = ranked.iter().map(|s| s.freelancer.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_scored_project_flattens() {
        let p: ScoredProject = serde_json::from_str(
            r#"{"_id":"p1","title":"t","status":"open","clientId":"c1","matchScore":88,"matchLevel":{"level":"good","label":"Good Match"}}"#,
        )
        .unwrap();
        assert!(p.is_recommended());
        assert_eq!(p.project.title, "t");
    }
}
