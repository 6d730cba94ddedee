//! Document pipeline
//!
//! Every stage follows the same two steps:
//!
//! 1. **Draft**: read the latest required artifact, render the stage prompt,
//!    call the generator and parse the reply. Nothing is persisted.
//! 2. **Commit**: validate the (possibly edited) content, compose the stored
//!    document and append it as a new artifact version.
//!
//! The governance review follows the same shape on top of the rule evaluator.
//! No state is kept between calls; every step reads the store fresh.

pub mod documents;
pub mod stages;

pub use documents::{Metric, TrustFindings};
pub use stages::{DraftParse, StageDescriptor, StageKey};

use crate::db::ArtifactStore;
use crate::error::{validation_error, AppError};
use crate::extract::{
    extract_json_block, extract_sections, extract_table, MarkdownTable, SectionExtraction,
};
use crate::generation::{generate_with_timeout, prompts, TextGenerator};
use crate::governance::{self, GovernanceEvaluation, GovernanceEvaluator, ModelContext, Rule};
use crate::models::{Artifact, ArtifactType, Project, Stage};
use crate::projects::ProjectRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Free-form stage inputs plus metrics for the performance stage
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

/// Final content of a stage as confirmed by the user
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub content: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

/// The artifact version a draft was built from
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub id: i64,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Artifact> for SourceRef {
    fn from(artifact: &Artifact) -> Self {
        Self {
            id: artifact.id,
            artifact_type: artifact.artifact_type.clone(),
            created_at: artifact.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDraft {
    pub stage: StageKey,
    pub project_id: i64,
    pub content: String,
    pub source: Option<SourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<SectionExtraction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<MarkdownTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedArtifact {
    pub id: i64,
    pub project_id: i64,
    pub stage: Stage,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceDraft {
    pub evaluation: GovernanceEvaluation,
    pub narrative: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceCommitted {
    pub artifact: CommittedArtifact,
    pub evaluation: GovernanceEvaluation,
}

/// Runs stage drafts, commits and governance reviews
pub struct DocumentPipeline {
    store: ArtifactStore,
    generator: Arc<dyn TextGenerator>,
    deadline: Duration,
    evaluator: GovernanceEvaluator,
}

impl DocumentPipeline {
    pub fn new(
        store: ArtifactStore,
        generator: Arc<dyn TextGenerator>,
        deadline: Duration,
        evaluator: GovernanceEvaluator,
    ) -> Self {
        Self {
            store,
            generator,
            deadline,
            evaluator,
        }
    }

    pub fn stages(&self) -> Vec<StageDescriptor> {
        StageKey::ALL.iter().map(StageKey::descriptor).collect()
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.evaluator.rules()
    }

    /// Generate a draft for `stage` without persisting it
    pub async fn draft(
        &self,
        project_id: i64,
        stage: StageKey,
        request: DraftRequest,
    ) -> Result<StageDraft, AppError> {
        let project = self.require_project(project_id).await?;
        let source = match stage.required_input() {
            Some(artifact_type) => Some(self.require_latest(project_id, artifact_type).await?),
            None => None,
        };
        let source_text = source.as_ref().map(|a| a.content.as_str()).unwrap_or("");
        let inputs = &request.inputs;

        let mut draft = StageDraft {
            stage,
            project_id,
            content: String::new(),
            source: source.as_ref().map(SourceRef::from),
            sections: None,
            table: None,
            fields: None,
            metrics: None,
        };

        let prompt = match stage {
            StageKey::ProblemDefinition => match inputs.get("conversation") {
                Some(conversation) if !conversation.trim().is_empty() => {
                    let reply = self
                        .generate(&prompts::problem_definition_summary(conversation))
                        .await?;
                    draft.fields = Some(extract_json_block(&reply)?);
                    draft.content = reply;
                    return Ok(draft);
                }
                _ => prompts::problem_definition(
                    input(inputs, "use_case"),
                    input(inputs, "background"),
                    input(inputs, "expected_effect"),
                ),
            },
            StageKey::DataSpec => prompts::data_spec(source_text, input(inputs, "data_description")),
            StageKey::ModelDesign => {
                let data_spec = self
                    .latest(project_id, ArtifactType::DataSpec)
                    .await?
                    .map(|a| a.content);
                prompts::model_design(source_text, data_spec.as_deref())
            }
            StageKey::TestCases => prompts::test_cases(source_text, input(inputs, "scenario")),
            StageKey::PerformanceReport => {
                documents::validate_metrics(&request.metrics)?;
                draft.metrics = Some(documents::metrics_mapping(&request.metrics));
                let pairs: Vec<(String, f64)> = request
                    .metrics
                    .iter()
                    .map(|m| (m.name.trim().to_string(), m.value))
                    .collect();
                prompts::performance_report(source_text, input(inputs, "model_type"), &pairs)
            }
            StageKey::TrustReport => {
                let findings = TrustFindings::from_inputs(inputs)?;
                prompts::trust_report(
                    source_text,
                    &findings.fairness,
                    &findings.explainability,
                    &findings.robustness,
                )
            }
            StageKey::ModelContext => {
                // The model context is edited by hand from a template
                draft.content = ModelContext::template(project.id, &project.name)?;
                return Ok(draft);
            }
        };

        let text = self.generate(&prompt).await?;

        match stage.parse() {
            DraftParse::Headings(headings) => {
                let sections = extract_sections(&text, headings);
                if !sections.complete {
                    warn!(
                        "Draft for {} is missing sections: {}",
                        stage,
                        sections.missing.join(", ")
                    );
                }
                draft.sections = Some(sections);
            }
            DraftParse::Table => draft.table = Some(extract_table(&text)),
            DraftParse::Yaml | DraftParse::Plain => {}
        }

        info!("Draft generated for project {} stage {}", project_id, stage);
        draft.content = text;
        Ok(draft)
    }

    /// Validate, compose and append the stage document
    pub async fn commit(
        &self,
        project_id: i64,
        stage: StageKey,
        request: CommitRequest,
    ) -> Result<CommittedArtifact, AppError> {
        if request.content.trim().is_empty() {
            return Err(validation_error("Content must not be empty"));
        }

        let stored = match stage {
            StageKey::ModelContext => {
                ModelContext::from_document(&request.content)?;
                request.content
            }
            StageKey::TestCases => {
                let table = extract_table(&request.content);
                if table.is_empty() {
                    return Err(AppError::InvalidFormat(
                        "no markdown table with test cases found".to_string(),
                    ));
                }
                debug!("Committing {} test cases", table.rows.len());
                request.content
            }
            StageKey::PerformanceReport => {
                documents::validate_metrics(&request.metrics)?;
                documents::compose_performance_report(&request.metrics, &request.content)
            }
            StageKey::TrustReport => {
                let findings = TrustFindings::from_inputs(&request.inputs)?;
                documents::compose_trust_report(&findings, &request.content)
            }
            StageKey::ProblemDefinition | StageKey::DataSpec | StageKey::ModelDesign => {
                request.content
            }
        };

        self.save(project_id, stage.stage(), stage.output(), stored).await
    }

    /// Evaluate the governance checklist on the latest artifacts
    pub async fn evaluate(&self, project_id: i64) -> Result<GovernanceEvaluation, AppError> {
        self.require_project(project_id).await?;
        let evaluator = self.evaluator.clone();
        self.store
            .run(move |store| governance::evaluate_project(&store, &evaluator, project_id))
            .await
    }

    /// Evaluate, then ask the generator for a risk narrative
    pub async fn governance_draft(&self, project_id: i64) -> Result<GovernanceDraft, AppError> {
        let evaluation = self.evaluate(project_id).await?;
        let prompt = prompts::governance_report(
            &evaluation.outcome.summary,
            &evaluation.inputs.model_context.content,
            evaluation.inputs.model_design.as_ref().map(|a| a.content.as_str()),
        );
        let narrative = self.generate(&prompt).await?;

        Ok(GovernanceDraft {
            evaluation,
            narrative,
        })
    }

    /// Re-evaluate and store the check summary with the confirmed narrative
    pub async fn governance_commit(
        &self,
        project_id: i64,
        narrative: &str,
    ) -> Result<GovernanceCommitted, AppError> {
        if narrative.trim().is_empty() {
            return Err(validation_error("Narrative must not be empty"));
        }

        let evaluation = self.evaluate(project_id).await?;
        let content = documents::compose_governance_report(&evaluation.outcome.summary, narrative);
        let artifact = self
            .save(
                project_id,
                Stage::Governance,
                ArtifactType::GovReport,
                content,
            )
            .await?;

        Ok(GovernanceCommitted {
            artifact,
            evaluation,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        generate_with_timeout(self.generator.as_ref(), prompt, self.deadline).await
    }

    async fn require_project(&self, project_id: i64) -> Result<Project, AppError> {
        self.store
            .run(move |store| ProjectRegistry::new(store).require_project(project_id))
            .await
    }

    async fn require_latest(
        &self,
        project_id: i64,
        artifact_type: ArtifactType,
    ) -> Result<Artifact, AppError> {
        self.store
            .run(move |store| governance::require_latest(&store, project_id, artifact_type))
            .await
    }

    async fn latest(
        &self,
        project_id: i64,
        artifact_type: ArtifactType,
    ) -> Result<Option<Artifact>, AppError> {
        self.store
            .run(move |store| store.get_latest_artifact(project_id, artifact_type.as_str()))
            .await
    }

    async fn save(
        &self,
        project_id: i64,
        stage: Stage,
        artifact_type: ArtifactType,
        content: String,
    ) -> Result<CommittedArtifact, AppError> {
        let id = self
            .store
            .run(move |store| {
                store.save_artifact(project_id, stage.as_str(), artifact_type.as_str(), &content)
            })
            .await?;

        Ok(CommittedArtifact {
            id,
            project_id,
            stage,
            artifact_type,
        })
    }
}

fn input<'a>(inputs: &'a BTreeMap<String, String>, key: &str) -> &'a str {
    inputs.get(key).map(String::as_str).unwrap_or("")
}
