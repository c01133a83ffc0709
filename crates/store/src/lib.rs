//! Content Store — durable record of generated notes and curricula.
//!
//! One JSON file per record under the data dir: `notes/<id>.json` and
//! `curricula/<id>.json`. Append-mostly; no update or delete. Corrupt
//! files are skipped with a warning rather than failing the listing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use lernwerk_core::{Curriculum, Note, NoteType};

/// Lightweight note listing entry (no body).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: Uuid,
    pub title: String,
    pub note_type: NoteType,
    pub source_type: String,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            note_type: note.note_type,
            source_type: note.source.source_type().to_string(),
            word_count: note.word_count,
            created_at: note.created_at,
            tags: note.tags.clone(),
        }
    }
}

pub struct ContentStore {
    notes_dir: PathBuf,
    curricula_dir: PathBuf,
}

impl ContentStore {
    /// Open (and create if needed) the store under `data_dir`.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let notes_dir = data_dir.join("notes");
        let curricula_dir = data_dir.join("curricula");
        std::fs::create_dir_all(&notes_dir)
            .with_context(|| format!("failed to create notes dir: {}", notes_dir.display()))?;
        std::fs::create_dir_all(&curricula_dir).with_context(|| {
            format!("failed to create curricula dir: {}", curricula_dir.display())
        })?;
        info!(path = %data_dir.display(), "content store initialized");
        Ok(Self {
            notes_dir,
            curricula_dir,
        })
    }

    fn note_path(&self, id: Uuid) -> PathBuf {
        self.notes_dir.join(format!("{id}.json"))
    }

    fn curriculum_path(&self, id: Uuid) -> PathBuf {
        self.curricula_dir.join(format!("{id}.json"))
    }

    /// Persist a note. Write-once: called only by the orchestrator on
    /// successful synthesis.
    pub fn put_note(&self, note: &Note) -> Result<Uuid> {
        let data = serde_json::to_string_pretty(note)?;
        std::fs::write(self.note_path(note.id), data)
            .with_context(|| format!("failed to write note {}", note.id))?;
        Ok(note.id)
    }

    pub fn get_note(&self, id: Uuid) -> Result<Option<Note>> {
        let path = self.note_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read note {}", path.display()))?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// List notes newest-first, optionally filtered by source type
    /// ("youtube", "course", "paper").
    pub fn list_notes(&self, source_type: Option<&str>) -> Result<Vec<NoteSummary>> {
        let mut summaries = Vec::new();
        for entry in std::fs::read_dir(&self.notes_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(data) => match serde_json::from_str::<Note>(&data) {
                    Ok(note) => {
                        let summary = NoteSummary::from(&note);
                        if source_type.map_or(true, |t| summary.source_type == t) {
                            summaries.push(summary);
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping corrupt note");
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read note");
                }
            }
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    pub fn put_curriculum(&self, curriculum: &Curriculum) -> Result<Uuid> {
        let data = serde_json::to_string_pretty(curriculum)?;
        std::fs::write(self.curriculum_path(curriculum.content_id), data)
            .with_context(|| format!("failed to write curriculum {}", curriculum.content_id))?;
        Ok(curriculum.content_id)
    }

    pub fn get_curriculum(&self, id: Uuid) -> Result<Option<Curriculum>> {
        let path = self.curriculum_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read curriculum {}", path.display()))?;
        Ok(Some(serde_json::from_str(&data)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lernwerk_core::{Module, NoteDraft, SourceDescriptor};

    fn make_note(title: &str, note_type: NoteType, source: SourceDescriptor) -> Note {
        Note::from_draft(
            NoteDraft {
                title: title.into(),
                body: "one two three four".into(),
                tags: vec!["t".into()],
            },
            note_type,
            source,
        )
    }

    #[test]
    fn put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path()).unwrap();

        let note = make_note(
            "Lecture",
            NoteType::Stanford,
            SourceDescriptor::YoutubeUrl("https://youtu.be/abc123xyz".into()),
        );
        let id = store.put_note(&note).unwrap();

        let loaded = store.get_note(id).unwrap().unwrap();
        assert_eq!(loaded.title, "Lecture");
        assert_eq!(loaded.word_count, 4);
        assert!(store.get_note(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn listing_is_newest_first_and_filterable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path()).unwrap();

        let mut older = make_note(
            "older",
            NoteType::Research,
            SourceDescriptor::PaperUrl("https://arxiv.org/pdf/1.pdf".into()),
        );
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        store.put_note(&older).unwrap();

        let newer = make_note(
            "newer",
            NoteType::Dsa,
            SourceDescriptor::YoutubeUrl("https://youtu.be/abc123xyz".into()),
        );
        store.put_note(&newer).unwrap();

        let all = store.list_notes(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "newer");

        let papers = store.list_notes(Some("paper")).unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "older");
    }

    #[test]
    fn corrupt_note_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("notes").join("junk.json"), "{not json").unwrap();

        let note = make_note(
            "good",
            NoteType::Podcast,
            SourceDescriptor::YoutubeUrl("https://youtu.be/abc123xyz".into()),
        );
        store.put_note(&note).unwrap();

        let all = store.list_notes(None).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn curriculum_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path()).unwrap();

        let curriculum = Curriculum {
            content_id: Uuid::new_v4(),
            title: "ML Course".into(),
            source_url: "https://example.com/ml".into(),
            created_at: Utc::now(),
            modules: vec![Module {
                module_number: 1,
                title: "Intro".into(),
                description: "Basics".into(),
                key_concepts: vec![],
            }],
        };
        let id = store.put_curriculum(&curriculum).unwrap();
        let loaded = store.get_curriculum(id).unwrap().unwrap();
        assert_eq!(loaded.modules.len(), 1);
        assert_eq!(loaded.module(1).unwrap().title, "Intro");
    }
}
