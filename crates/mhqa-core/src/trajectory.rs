//! Trajectory record and its in-progress builder.
//!
//! A `TrajectoryBuilder` is created at PLAN and appends exactly one step per
//! phase in `Phase::ALL` order. `finish` consumes it and yields an immutable
//! `Trajectory`, so a finalized record can never be revisited.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Phase, Question, Step};

pub const DOMAIN: &str = "mhqa";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    run_id: Uuid,
    domain: String,
    task_id: String,
    question_id: String,
    model_name: String,
    success: bool,
    answer: String,
    steps: Vec<Step>,
    timing_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    created_at: DateTime<Utc>,
}

impl Trajectory {
    pub fn run_id(&self) -> Uuid { self.run_id }
    pub fn domain(&self) -> &str { &self.domain }
    /// The question text.
    pub fn task_id(&self) -> &str { &self.task_id }
    pub fn question_id(&self) -> &str { &self.question_id }
    pub fn model_name(&self) -> &str { &self.model_name }
    pub fn success(&self) -> bool { self.success }
    pub fn answer(&self) -> &str { &self.answer }
    pub fn steps(&self) -> &[Step] { &self.steps }
    pub fn warnings(&self) -> &[String] { &self.warnings }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn timing(&self) -> Duration {
        Duration::from_millis(self.timing_ms)
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.steps.iter().map(|s| s.phase).collect()
    }

    pub fn step(&self, phase: Phase) -> Option<&Step> {
        self.steps.iter().find(|s| s.phase == phase)
    }
}

pub struct TrajectoryBuilder {
    run_id: Uuid,
    task_id: String,
    question_id: String,
    model_name: String,
    steps: Vec<Step>,
    warnings: Vec<String>,
    next: Option<Phase>,
    started: Instant,
    created_at: DateTime<Utc>,
}

impl TrajectoryBuilder {
    pub fn start(question: &Question, model_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            task_id: question.text.clone(),
            question_id: question.id.clone(),
            model_name: model_name.into(),
            steps: Vec::with_capacity(Phase::ALL.len()),
            warnings: Vec::new(),
            next: Some(Phase::Plan),
            started: Instant::now(),
            created_at: Utc::now(),
        }
    }

    /// Phase the next recorded step will belong to.
    pub fn current_phase(&self) -> Option<Phase> {
        self.next
    }

    /// Append the step for the current phase and advance. Returns the phase
    /// recorded, or `None` once every phase already has its step.
    pub fn record(&mut self, content: impl Into<String>) -> Option<Phase> {
        let phase = self.next?;
        self.steps.push(Step { role: phase.role(), phase, content: content.into() });
        self.next = phase.next();
        Some(phase)
    }

    /// Overrides the model recorded for READ, e.g. after a reader fallback.
    pub fn set_model_name(&mut self, model_name: impl Into<String>) {
        self.model_name = model_name.into();
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn finish(self, answer: impl Into<String>) -> Result<Trajectory> {
        if let Some(missing) = self.next {
            return Err(Error::IncompleteTrajectory(missing));
        }
        let answer = answer.into();
        let timing_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(Trajectory {
            run_id: self.run_id,
            domain: DOMAIN.to_string(),
            task_id: self.task_id,
            question_id: self.question_id,
            model_name: self.model_name,
            success: !answer.trim().is_empty(),
            answer,
            steps: self.steps,
            timing_ms,
            warnings: self.warnings,
            created_at: self.created_at,
        })
    }
}
