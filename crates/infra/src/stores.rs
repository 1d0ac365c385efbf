//! Read-side store ports and in-memory implementations.
//!
//! These model the collaborators the core consumes: the job corpus, the
//! candidate directory, recruiter preferences, and each user's single
//! active preference. All are read-only from a running pipeline's point of
//! view; nothing here is mutated by run execution.

use std::collections::HashMap;
use std::sync::RwLock;

use talentmatch_core::{RequisitionId, UserId};
use talentmatch_matching::{JobPosting, Preference};
use talentmatch_ranking::{CandidateProfile, RecruiterPreference, Requisition};

/// Read access to the job corpus.
pub trait JobCatalog: Send + Sync {
    fn all_jobs(&self) -> Vec<JobPosting>;
}

/// Read access to requisitions and their imported candidates.
pub trait CandidateDirectory: Send + Sync {
    fn requisition(&self, id: RequisitionId) -> Option<Requisition>;
    /// Candidates in import order (created_at, then id).
    fn candidates_for(&self, id: RequisitionId) -> Vec<CandidateProfile>;
}

/// Recruiter eligibility preference per requisition (hard-filter precondition).
pub trait RecruiterPreferenceStore: Send + Sync {
    fn preference_for(&self, id: RequisitionId) -> Option<RecruiterPreference>;
    fn upsert(&self, preference: RecruiterPreference);
}

/// A user's single active matching preference (upserted, at most one).
pub trait ActivePreferenceStore: Send + Sync {
    fn upsert_active(&self, user_id: UserId, preference: Preference);
    fn active_preference(&self, user_id: UserId) -> Option<Preference>;
}

#[derive(Debug, Default)]
pub struct InMemoryJobCatalog {
    jobs: RwLock<Vec<JobPosting>>,
}

impl InMemoryJobCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: JobPosting) {
        self.jobs.write().unwrap().push(job);
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobCatalog for InMemoryJobCatalog {
    fn all_jobs(&self) -> Vec<JobPosting> {
        self.jobs.read().unwrap().clone()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCandidateDirectory {
    requisitions: RwLock<HashMap<RequisitionId, Requisition>>,
    candidates: RwLock<Vec<CandidateProfile>>,
}

impl InMemoryCandidateDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_requisition(&self, requisition: Requisition) {
        self.requisitions
            .write()
            .unwrap()
            .insert(requisition.id, requisition);
    }

    pub fn insert_candidate(&self, candidate: CandidateProfile) {
        self.candidates.write().unwrap().push(candidate);
    }
}

impl CandidateDirectory for InMemoryCandidateDirectory {
    fn requisition(&self, id: RequisitionId) -> Option<Requisition> {
        self.requisitions.read().unwrap().get(&id).cloned()
    }

    fn candidates_for(&self, id: RequisitionId) -> Vec<CandidateProfile> {
        let mut matching: Vec<CandidateProfile> = self
            .candidates
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.requisition_id == id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
        });
        matching
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRecruiterPreferenceStore {
    preferences: RwLock<HashMap<RequisitionId, RecruiterPreference>>,
}

impl InMemoryRecruiterPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecruiterPreferenceStore for InMemoryRecruiterPreferenceStore {
    fn preference_for(&self, id: RequisitionId) -> Option<RecruiterPreference> {
        self.preferences.read().unwrap().get(&id).cloned()
    }

    fn upsert(&self, preference: RecruiterPreference) {
        self.preferences
            .write()
            .unwrap()
            .insert(preference.requisition_id, preference);
    }
}

#[derive(Debug, Default)]
pub struct InMemoryActivePreferenceStore {
    active: RwLock<HashMap<UserId, Preference>>,
}

impl InMemoryActivePreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivePreferenceStore for InMemoryActivePreferenceStore {
    fn upsert_active(&self, user_id: UserId, preference: Preference) {
        self.active.write().unwrap().insert(user_id, preference);
    }

    fn active_preference(&self, user_id: UserId) -> Option<Preference> {
        self.active.read().unwrap().get(&user_id).cloned()
    }
}
