//! Typed content records.
//!
//! Documents are deserialized straight into these shapes. Optional fields
//! default to empty so downstream code never inspects untyped maps.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CurriculumError;

/// The four addressable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Domain,
    Cluster,
    Concept,
    Exercise,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Domain,
        EntityKind::Cluster,
        EntityKind::Concept,
        EntityKind::Exercise,
    ];

    /// Singular name, as used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Domain => "domain",
            EntityKind::Cluster => "cluster",
            EntityKind::Concept => "concept",
            EntityKind::Exercise => "exercise",
        }
    }

    /// Top-level document key holding records of this kind.
    pub fn document_key(&self) -> &'static str {
        match self {
            EntityKind::Domain => "domains",
            EntityKind::Cluster => "clusters",
            EntityKind::Concept => "concepts",
            EntityKind::Exercise => "exercises",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CurriculumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "domain" | "domains" => Ok(EntityKind::Domain),
            "cluster" | "clusters" => Ok(EntityKind::Cluster),
            "concept" | "concepts" => Ok(EntityKind::Concept),
            "exercise" | "exercises" => Ok(EntityKind::Exercise),
            other => Err(CurriculumError::invalid_input(format!(
                "unknown entity kind '{}'",
                other
            ))),
        }
    }
}

/// A reference from one record to another entity.
#[derive(Debug, Clone, Copy)]
pub struct Reference<'a> {
    /// Field holding the reference (document spelling).
    pub field: &'static str,
    /// Kind the target is expected to have.
    pub target_kind: EntityKind,
    /// Referenced id.
    pub target: &'a str,
}

/// Behavior shared by every addressable record.
pub trait Record {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Check invariants serde cannot express.
    fn validate(&self) -> Result<(), String> {
        if self.id().trim().is_empty() {
            return Err("id must not be empty".to_string());
        }
        Ok(())
    }

    /// Outgoing references to other entities in the graph.
    fn references(&self) -> Vec<Reference<'_>>;
}

fn refs<'a>(
    out: &mut Vec<Reference<'a>>,
    field: &'static str,
    target_kind: EntityKind,
    ids: &'a [String],
) {
    out.extend(ids.iter().map(|id| Reference {
        field,
        target_kind,
        target: id.as_str(),
    }));
}

/// Top-level subject-matter grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    pub name: String,
    pub inquiry: String,
    #[serde(default)]
    pub cluster_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_order: Option<u32>,
}

impl Record for Domain {
    const KIND: EntityKind = EntityKind::Domain;

    fn id(&self) -> &str {
        &self.id
    }

    fn references(&self) -> Vec<Reference<'_>> {
        let mut out = Vec::new();
        refs(&mut out, "clusterIds", EntityKind::Cluster, &self.cluster_ids);
        out
    }
}

/// Mid-level grouping of concepts within a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    pub name: String,
    /// Legacy curriculum files omit the inquiry for clusters.
    #[serde(default)]
    pub inquiry: String,
    pub domain_id: String,
    #[serde(default)]
    pub concept_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_order: Option<u32>,
}

impl Record for Cluster {
    const KIND: EntityKind = EntityKind::Cluster;

    fn id(&self) -> &str {
        &self.id
    }

    fn references(&self) -> Vec<Reference<'_>> {
        let mut out = vec![Reference {
            field: "domainId",
            target_kind: EntityKind::Domain,
            target: self.domain_id.as_str(),
        }];
        refs(&mut out, "conceptIds", EntityKind::Concept, &self.concept_ids);
        out
    }
}

/// A teachable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub id: String,
    pub name: String,
    pub inquiry: String,
    pub objective: String,
    pub reflection_prompts: Vec<String>,
    pub reflection_targets: Vec<String>,
    #[serde(default)]
    pub general_hints: Vec<Hint>,
    #[serde(default)]
    pub optional_hints: Vec<Hint>,
    #[serde(default)]
    pub foundation_ids: Vec<String>,
    #[serde(default)]
    pub extension_ids: Vec<String>,
    #[serde(default)]
    pub exercise_ids: Vec<String>,
    /// External resources; not resolved against the graph.
    #[serde(default)]
    pub resource_ids: Vec<String>,
}

impl Record for Concept {
    const KIND: EntityKind = EntityKind::Concept;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must not be empty".to_string());
        }
        if self.reflection_prompts.is_empty() {
            return Err(format!("concept '{}' has no reflectionPrompts", self.id));
        }
        if self.reflection_targets.is_empty() {
            return Err(format!("concept '{}' has no reflectionTargets", self.id));
        }
        Ok(())
    }

    fn references(&self) -> Vec<Reference<'_>> {
        let mut out = Vec::new();
        refs(&mut out, "foundationIds", EntityKind::Concept, &self.foundation_ids);
        refs(&mut out, "extensionIds", EntityKind::Concept, &self.extension_ids);
        refs(&mut out, "exerciseIds", EntityKind::Exercise, &self.exercise_ids);
        out
    }
}

/// A practice item tied to one or more concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub inquiry: String,
    pub objective: String,
    /// Numeric level. Legacy documents write it as a string.
    #[serde(deserialize_with = "difficulty_level")]
    pub difficulty: f64,
    /// Accepted solutions. Legacy documents carry a single `solution` string.
    #[serde(alias = "solution", deserialize_with = "one_or_many")]
    pub solutions: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate: Option<u32>,
    #[serde(default)]
    pub hints: Vec<Hint>,
    #[serde(default)]
    pub next_exercise_ids: Vec<String>,
    #[serde(default)]
    pub previous_exercise_ids: Vec<String>,
    #[serde(default)]
    pub concept_ids: Vec<String>,
}

impl Exercise {
    /// Hints whose trigger matches a submitted answer, in declaration order.
    pub fn triggered_hints<'a>(&'a self, answer: &'a str) -> impl Iterator<Item = &'a Hint> + 'a {
        self.hints.iter().filter(move |h| h.is_triggered_by(answer))
    }
}

impl Record for Exercise {
    const KIND: EntityKind = EntityKind::Exercise;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must not be empty".to_string());
        }
        if self.solutions.is_empty() {
            return Err(format!("exercise '{}' has no solutions", self.id));
        }
        if !self.difficulty.is_finite() {
            return Err(format!("exercise '{}' has a non-finite difficulty", self.id));
        }
        Ok(())
    }

    fn references(&self) -> Vec<Reference<'_>> {
        let mut out = Vec::new();
        refs(&mut out, "conceptIds", EntityKind::Concept, &self.concept_ids);
        refs(&mut out, "nextExerciseIds", EntityKind::Exercise, &self.next_exercise_ids);
        refs(
            &mut out,
            "previousExerciseIds",
            EntityKind::Exercise,
            &self.previous_exercise_ids,
        );
        out
    }
}

/// Guidance text embedded in a concept or exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HintRepr")]
pub struct Hint {
    pub text: String,
    #[serde(rename = "type")]
    pub hint_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// Default hint type tag.
pub const GENERAL_HINT: &str = "general";

impl Hint {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hint_type: GENERAL_HINT.to_string(),
            trigger: None,
            topic: None,
        }
    }

    /// Whether this hint's trigger pattern matches `answer`.
    ///
    /// Triggers are regular expressions; one that fails to compile is matched
    /// as a plain substring instead.
    pub fn is_triggered_by(&self, answer: &str) -> bool {
        let Some(trigger) = self.trigger.as_deref() else {
            return false;
        };
        match Regex::new(trigger) {
            Ok(re) => re.is_match(answer),
            Err(_) => answer.contains(trigger),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HintRepr {
    Text(String),
    Full {
        text: String,
        #[serde(rename = "type", default)]
        hint_type: Option<String>,
        #[serde(default)]
        trigger: Option<String>,
        #[serde(default)]
        topic: Option<String>,
    },
}

impl From<HintRepr> for Hint {
    fn from(repr: HintRepr) -> Self {
        match repr {
            HintRepr::Text(text) => Hint::new(text),
            HintRepr::Full {
                text,
                hint_type,
                trigger,
                topic,
            } => Hint {
                text,
                hint_type: hint_type.unwrap_or_else(|| GENERAL_HINT.to_string()),
                trigger,
                topic,
            },
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Named difficulty levels accepted in place of a number.
const DIFFICULTY_LEVELS: &[(&str, f64)] = &[
    ("beginner", 1.0),
    ("easy", 1.0),
    ("intermediate", 2.0),
    ("medium", 2.0),
    ("advanced", 3.0),
    ("hard", 3.0),
];

fn difficulty_level<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(text) => {
            let text = text.trim();
            if let Ok(n) = text.parse::<f64>() {
                return Ok(n);
            }
            DIFFICULTY_LEVELS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(text))
                .map(|(_, level)| *level)
                .ok_or_else(|| {
                    serde::de::Error::custom(format!("unknown difficulty '{}'", text))
                })
        }
    }
}

/// A borrowed entity of any kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityRef<'a> {
    Domain(&'a Domain),
    Cluster(&'a Cluster),
    Concept(&'a Concept),
    Exercise(&'a Exercise),
}

impl<'a> EntityRef<'a> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Domain(_) => EntityKind::Domain,
            EntityRef::Cluster(_) => EntityKind::Cluster,
            EntityRef::Concept(_) => EntityKind::Concept,
            EntityRef::Exercise(_) => EntityKind::Exercise,
        }
    }

    /// The id, borrowed from the graph rather than from this handle.
    pub fn id(&self) -> &'a str {
        match *self {
            EntityRef::Domain(d) => &d.id,
            EntityRef::Cluster(c) => &c.id,
            EntityRef::Concept(c) => &c.id,
            EntityRef::Exercise(e) => &e.id,
        }
    }
}

impl EntityRef<'_> {
    /// Clone the borrowed record into an owned [`Entity`].
    pub fn to_entity(&self) -> Entity {
        match *self {
            EntityRef::Domain(d) => Entity::Domain(d.clone()),
            EntityRef::Cluster(c) => Entity::Cluster(c.clone()),
            EntityRef::Concept(c) => Entity::Concept(c.clone()),
            EntityRef::Exercise(e) => Entity::Exercise(e.clone()),
        }
    }
}

/// An owned entity of any kind. Serializes as the bare record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Domain(Domain),
    Cluster(Cluster),
    Concept(Concept),
    Exercise(Exercise),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Domain(_) => EntityKind::Domain,
            Entity::Cluster(_) => EntityKind::Cluster,
            Entity::Concept(_) => EntityKind::Concept,
            Entity::Exercise(_) => EntityKind::Exercise,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Domain(d) => &d.id,
            Entity::Cluster(c) => &c.id,
            Entity::Concept(c) => &c.id,
            Entity::Exercise(e) => &e.id,
        }
    }
}
