use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_LEVEL: &str = "Beginner";

/// One yoga pose with its precomputed, unit-normalized embeddings.
///
/// Field names on the wire follow the corpus columns (`AName`, `Benefits_emb`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseRecord {
    #[serde(rename = "AName")]
    pub name: String,
    #[serde(rename = "Benefits", default, deserialize_with = "null_as_empty")]
    pub benefits: String,
    #[serde(
        rename = "Contraindications",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub contraindications: String,
    #[serde(
        rename = "Targeted Physical Problems",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub targeted_physical_problems: String,
    #[serde(
        rename = "Targeted Mental Problems",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub targeted_mental_problems: String,
    #[serde(rename = "Level", default = "default_level", deserialize_with = "null_as_level")]
    pub level: String,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Benefits_emb", default)]
    pub benefits_embedding: Vec<f32>,
    #[serde(rename = "Contraindications_emb", default)]
    pub contraindications_embedding: Vec<f32>,
    #[serde(rename = "Targeted Physical Problems_emb", default)]
    pub physical_problems_embedding: Vec<f32>,
    #[serde(rename = "Targeted Mental Problems_emb", default)]
    pub mental_problems_embedding: Vec<f32>,
}

impl PoseRecord {
    /// The four embedding fields with their corpus column names
    pub fn embeddings(&self) -> [(&'static str, &[f32]); 4] {
        [
            ("Benefits_emb", self.benefits_embedding.as_slice()),
            (
                "Contraindications_emb",
                self.contraindications_embedding.as_slice(),
            ),
            (
                "Targeted Physical Problems_emb",
                self.physical_problems_embedding.as_slice(),
            ),
            (
                "Targeted Mental Problems_emb",
                self.mental_problems_embedding.as_slice(),
            ),
        ]
    }
}

fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_level<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(default_level))
}

/// Query input. Demographic fields are accepted but do not affect scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default, alias = "physicalIssues")]
    pub physical_issues: Vec<String>,
    #[serde(default, alias = "mentalIssues")]
    pub mental_issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default)]
    pub pregnant: bool,
}

impl UserProfile {
    pub fn goals_text(&self) -> String {
        self.goals.join(" ")
    }

    pub fn physical_text(&self) -> String {
        self.physical_issues.join(" ")
    }

    pub fn mental_text(&self) -> String {
        self.mental_issues.join(" ")
    }

    /// Physical issues followed by mental issues, lower-cased, blanks dropped
    pub fn issues(&self) -> impl Iterator<Item = String> + '_ {
        self.physical_issues
            .iter()
            .chain(self.mental_issues.iter())
            .filter(|issue| !issue.trim().is_empty())
            .map(|issue| issue.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub score: f64,
    pub benefits: String,
    pub contraindications: String,
    pub level: String,
    pub description: String,
}

impl Recommendation {
    /// Builds the output row; `score` is rounded to three decimals here only.
    pub fn from_pose(pose: &PoseRecord, score: f32) -> Self {
        Self {
            name: pose.name.clone(),
            score: round_score(score),
            benefits: pose.benefits.clone(),
            contraindications: pose.contraindications.clone(),
            level: pose.level.clone(),
            description: pose.description.clone().unwrap_or_default(),
        }
    }
}

pub fn round_score(score: f32) -> f64 {
    (f64::from(score) * 1000.0).round() / 1000.0
}
