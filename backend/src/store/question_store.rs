// src/store/question_store.rs

use std::{
    collections::{BTreeSet, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::question::{ActiveSet, Question, QuestionType},
};

#[derive(Debug, Default)]
struct BankState {
    questions: Vec<Question>,
    active: ActiveSet,
}

/// The question bank and its active-set overlay.
///
/// Both live in JSON files and are cached in memory; every mutation is
/// written to disk before the in-memory copy changes.
#[derive(Clone)]
pub struct QuestionStore {
    state: Arc<RwLock<BankState>>,
    bank_path: Arc<PathBuf>,
    active_path: Arc<PathBuf>,
}

impl QuestionStore {
    /// Loads both files. Never fails: an unreadable or corrupt file is
    /// logged and replaced by an empty value so the service can still start.
    pub async fn open(bank_path: impl Into<PathBuf>, active_path: impl Into<PathBuf>) -> Self {
        let bank_path = bank_path.into();
        let active_path = active_path.into();

        let loaded = read_json::<Vec<Question>>(&bank_path)
            .await
            .and_then(|questions| validate_bank(&questions).map(|_| questions));
        let questions = match loaded {
            Ok(questions) => questions,
            Err(e) => {
                tracing::warn!(
                    "Question bank {} could not be loaded ({}); no questions are available until an admin adds some",
                    bank_path.display(),
                    e
                );
                Vec::new()
            }
        };

        let active: ActiveSet = match read_json(&active_path).await {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!(
                    "Active set {} could not be loaded ({}); the whole bank is eligible",
                    active_path.display(),
                    e
                );
                ActiveSet::default()
            }
        };

        tracing::info!("Loaded {} questions ({} active ids)", questions.len(), active.active_ids.len());

        Self {
            state: Arc::new(RwLock::new(BankState { questions, active })),
            bank_path: Arc::new(bank_path),
            active_path: Arc::new(active_path),
        }
    }

    /// Returns the bank, optionally restricted to the active-set overlay.
    pub async fn list(&self, active_only: bool) -> Vec<Question> {
        let state = self.state.read().await;
        if active_only {
            state.active.filter(&state.questions).into_iter().cloned().collect()
        } else {
            state.questions.clone()
        }
    }

    /// Questions eligible for sampling.
    pub async fn effective_pool(&self) -> Vec<Question> {
        self.list(true).await
    }

    pub async fn active_set(&self) -> ActiveSet {
        self.state.read().await.active.clone()
    }

    /// Validates and appends a question, assigning `max(id) + 1`.
    pub async fn add(
        &self,
        text: &str,
        question_type: QuestionType,
        options: Option<Vec<String>>,
        category: Option<String>,
    ) -> Result<Question, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Question text cannot be empty".to_string()));
        }

        let options = match question_type {
            QuestionType::Mcq => {
                let options: Vec<String> = options
                    .unwrap_or_default()
                    .into_iter()
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect();
                if options.is_empty() {
                    return Err(AppError::Validation(
                        "Multiple choice questions need at least one option".to_string(),
                    ));
                }
                Some(options)
            }
            _ => None,
        };

        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let mut state = self.state.write().await;
        let id = state.questions.iter().map(|q| q.id).max().unwrap_or(0) + 1;
        let question = Question {
            id,
            text: text.to_string(),
            question_type,
            options,
            category,
        };

        let mut questions = state.questions.clone();
        questions.push(question.clone());
        write_json(&self.bank_path, &questions).await?;
        state.questions = questions;

        tracing::info!("Added question {} ({:?})", id, question_type);
        Ok(question)
    }

    /// Replaces the active-set overlay. Ids are not checked against the bank.
    pub async fn set_active(&self, ids: BTreeSet<i64>) -> Result<ActiveSet, AppError> {
        let active = ActiveSet { active_ids: ids };

        let mut state = self.state.write().await;
        write_json(&self.active_path, &active).await?;
        state.active = active.clone();

        tracing::info!("Active set replaced ({} ids)", active.active_ids.len());
        Ok(active)
    }
}

/// Checks what `add` guarantees for questions written by hand: unique ids,
/// non-empty text, and options on every `mcq`.
fn validate_bank(questions: &[Question]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(questions.len());
    for q in questions {
        if !seen.insert(q.id) {
            return Err(AppError::Validation(format!("Duplicate question id {}", q.id)));
        }
        if q.text.trim().is_empty() {
            return Err(AppError::Validation(format!("Question {} has no text", q.id)));
        }
        if q.question_type == QuestionType::Mcq
            && q.options.as_ref().is_none_or(|options| options.is_empty())
        {
            return Err(AppError::Validation(format!(
                "Multiple choice question {} has no options",
                q.id
            )));
        }
    }
    Ok(())
}

/// Reads a JSON file; a missing file reads as the type's default.
async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, AppError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Writes through a sibling temp file and a rename so readers never see a
/// half-written file.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("question-store-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    async fn empty_store() -> (QuestionStore, PathBuf) {
        let dir = scratch_dir();
        let store = QuestionStore::open(dir.join("questions.json"), dir.join("active.json")).await;
        (store, dir)
    }

    #[tokio::test]
    async fn missing_files_give_empty_bank() {
        let (store, _dir) = empty_store().await;
        assert!(store.list(false).await.is_empty());
        assert!(store.effective_pool().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_bank_degrades_to_empty() {
        let dir = scratch_dir();
        std::fs::write(dir.join("questions.json"), b"[{\"id\": 1, \"text\": ").unwrap();
        let store = QuestionStore::open(dir.join("questions.json"), dir.join("active.json")).await;
        assert!(store.list(false).await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_in_bank_degrade_to_empty() {
        let dir = scratch_dir();
        std::fs::write(
            dir.join("questions.json"),
            br#"[{"id": 1, "text": "A", "type": "text"}, {"id": 1, "text": "B", "type": "text"}]"#,
        )
        .unwrap();
        let store = QuestionStore::open(dir.join("questions.json"), dir.join("active.json")).await;
        assert!(store.list(false).await.is_empty());
        assert!(store.effective_pool().await.is_empty());
    }

    #[tokio::test]
    async fn blank_text_or_bare_mcq_in_bank_degrade_to_empty() {
        for bank in [
            br#"[{"id": 1, "text": "A", "type": "text"}, {"id": 2, "text": "  ", "type": "text"}]"#.as_slice(),
            br#"[{"id": 1, "text": "Pick", "type": "mcq"}]"#.as_slice(),
            br#"[{"id": 1, "text": "Pick", "type": "mcq", "options": []}]"#.as_slice(),
        ] {
            let dir = scratch_dir();
            std::fs::write(dir.join("questions.json"), bank).unwrap();
            let store = QuestionStore::open(dir.join("questions.json"), dir.join("active.json")).await;
            assert!(store.list(false).await.is_empty());
        }
    }

    #[tokio::test]
    async fn add_assigns_monotonic_ids_and_persists() {
        let (store, dir) = empty_store().await;
        let first = store.add("What is ADF?", QuestionType::Text, None, None).await.unwrap();
        let second = store
            .add("Explain partitioning", QuestionType::Longtext, None, Some("Spark".to_string()))
            .await
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let reopened = QuestionStore::open(dir.join("questions.json"), dir.join("active.json")).await;
        let ids: Vec<i64> = reopened.list(false).await.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn add_continues_after_highest_existing_id() {
        let dir = scratch_dir();
        std::fs::write(
            dir.join("questions.json"),
            br#"[{"id": 7, "text": "Old", "type": "text"}, {"id": 3, "text": "Older", "type": "code"}]"#,
        )
        .unwrap();
        let store = QuestionStore::open(dir.join("questions.json"), dir.join("active.json")).await;
        let added = store.add("New", QuestionType::Text, None, None).await.unwrap();
        assert_eq!(added.id, 8);
    }

    #[tokio::test]
    async fn add_validates_text_and_options() {
        let (store, _dir) = empty_store().await;
        assert!(matches!(
            store.add("   ", QuestionType::Text, None, None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            store.add("Pick one", QuestionType::Mcq, None, None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            store.add("Pick one", QuestionType::Mcq, Some(vec![" ".to_string()]), None).await,
            Err(AppError::Validation(_))
        ));
        assert!(store.list(false).await.is_empty());
    }

    #[tokio::test]
    async fn options_are_dropped_for_non_mcq() {
        let (store, _dir) = empty_store().await;
        let q = store
            .add("Free text", QuestionType::Text, Some(vec!["a".to_string()]), None)
            .await
            .unwrap();
        assert_eq!(q.options, None);
    }

    #[tokio::test]
    async fn active_set_filters_pool_and_tolerates_stale_ids() {
        let (store, dir) = empty_store().await;
        for text in ["one", "two", "three"] {
            store.add(text, QuestionType::Text, None, None).await.unwrap();
        }
        store.set_active([1, 3, 42].into_iter().collect()).await.unwrap();

        let ids: Vec<i64> = store.effective_pool().await.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.list(false).await.len(), 3);

        let reopened = QuestionStore::open(dir.join("questions.json"), dir.join("active.json")).await;
        assert_eq!(reopened.active_set().await.active_ids.len(), 3);

        store.set_active(BTreeSet::new()).await.unwrap();
        assert_eq!(store.effective_pool().await.len(), 3);
    }

    #[tokio::test]
    async fn failed_write_leaves_bank_unchanged() {
        let dir = scratch_dir();
        let store = QuestionStore::open(
            dir.join("missing-subdir").join("questions.json"),
            dir.join("active.json"),
        )
        .await;
        let err = store.add("Lost", QuestionType::Text, None, None).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(store.list(false).await.is_empty());
    }
}
