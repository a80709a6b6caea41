//! The running session: active quarter, its forest, and the dirty flag.
//!
//! All reads and writes from a front end go through [`Session`]. Structural
//! changes (create, delete, status change, import) are applied and written to
//! the local cache immediately. Free-text edits go through a debounced commit
//! so that a burst of keystrokes produces one write.

use std::time::{Duration, Instant};

use log::{debug, info};

use crate::core::debounce::Debouncer;
use crate::core::export;
use crate::core::resolver::ResolutionTier;
use crate::core::tree::{self, ForestStats, ParentLookup};
use crate::{
    ImportedDocument, PersistenceResolver, Quarter, Result, SnapshotDocument, Topic, TopicStatus,
};

/// Quiet period before a text edit is committed.
pub const EDIT_DEBOUNCE: Duration = Duration::from_millis(300);

/// A partial update of a topic's editable fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub status: Option<TopicStatus>,
}

impl FieldPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.notes.is_none()
            && self.status.is_none()
    }

    /// Combines two patches; fields set in `later` win.
    #[must_use]
    pub fn merge(self, later: FieldPatch) -> FieldPatch {
        FieldPatch {
            title: later.title.or(self.title),
            description: later.description.or(self.description),
            notes: later.notes.or(self.notes),
            status: later.status.or(self.status),
        }
    }

    /// Writes the patch into `topic`. A title that trims to nothing is ignored.
    fn apply_to(self, topic: &mut Topic) {
        if let Some(title) = self.title {
            let title = title.trim();
            if !title.is_empty() {
                topic.title = title.to_string();
            }
        }
        if let Some(description) = self.description {
            topic.description = description;
        }
        if let Some(notes) = self.notes {
            topic.notes = notes;
        }
        if let Some(status) = self.status {
            topic.status = status;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PendingEdit {
    topic_id: String,
    patch: FieldPatch,
}

/// Result of applying an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    /// The quarter now active.
    pub quarter: Quarter,
    /// Whether the import moved the session to another quarter.
    pub switched_quarter: bool,
    pub stats: ForestStats,
}

/// Mutable state of one running front end.
pub struct Session {
    resolver: PersistenceResolver,
    quarter: Quarter,
    topics: Vec<Topic>,
    dirty: bool,
    /// Set by any mutation of the active forest since it was loaded.
    modified: bool,
    available_quarters: Vec<Quarter>,
    edits: Debouncer<PendingEdit>,
}

impl Session {
    /// Loads the quarter index and the initial quarter (with legacy migration).
    pub async fn open(resolver: PersistenceResolver) -> Self {
        let quarter = resolver.initial_quarter();
        Self::open_at(resolver, quarter).await
    }

    /// Loads the quarter index and `quarter` directly.
    ///
    /// Legacy migration only applies when `quarter` is the resolver's initial
    /// quarter; any other quarter resolves as a quarter switch would.
    pub async fn open_at(resolver: PersistenceResolver, quarter: Quarter) -> Self {
        let index = resolver.load_index().await;
        let (topics, tier) = if quarter == resolver.initial_quarter() {
            resolver.load_initial().await
        } else {
            resolver.load_with_tier(quarter).await
        };
        info!(
            "opened quarter {quarter} with {} topic(s) from {tier:?}",
            topics.len()
        );
        Self {
            resolver,
            quarter,
            topics,
            dirty: false,
            modified: false,
            available_quarters: index.quarters,
            edits: Debouncer::new(EDIT_DEBOUNCE),
        }
    }

    /// Replaces the quiet period used for text edits.
    #[must_use]
    pub fn with_edit_delay(mut self, delay: Duration) -> Self {
        self.edits = Debouncer::new(delay);
        self
    }

    pub fn quarter(&self) -> Quarter {
        self.quarter
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Quarters listed by the published index at startup, plus any imported into.
    pub fn available_quarters(&self) -> &[Quarter] {
        &self.available_quarters
    }

    pub fn resolver(&self) -> &PersistenceResolver {
        &self.resolver
    }

    /// Whether edits were made since the last export or quarter switch.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub fn can_advance(&self) -> bool {
        self.quarter.can_advance()
    }

    /// Makes `quarter` active, discarding the current forest after committing
    /// any pending edit.
    pub async fn switch_quarter(&mut self, quarter: Quarter) -> Result<ResolutionTier> {
        self.flush_pending_edit()?;
        let (topics, tier) = self.resolver.load_with_tier(quarter).await;
        info!(
            "switched from {} to {quarter} ({} topic(s) from {tier:?})",
            self.quarter,
            topics.len()
        );
        self.quarter = quarter;
        self.topics = topics;
        self.dirty = false;
        self.modified = false;
        Ok(tier)
    }

    /// Appends a new root topic and returns its id.
    pub fn create_topic(&mut self, title: &str, description: &str) -> Result<String> {
        let topic = Topic::new(title, description);
        let id = topic.id.clone();
        self.topics.push(topic);
        debug!("created root topic {id}");
        self.persist()?;
        Ok(id)
    }

    /// Appends a new child under `parent_id`; `None` when the parent is gone.
    pub fn create_child(
        &mut self,
        parent_id: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<String>> {
        let Some(parent) = tree::find_mut(parent_id, &mut self.topics) else {
            return Ok(None);
        };
        let child = Topic::new(title, description);
        let id = child.id.clone();
        parent.children.push(child);
        debug!("created topic {id} under {parent_id}");
        self.persist()?;
        Ok(Some(id))
    }

    /// Removes `id` and its subtree. The caller is expected to have confirmed.
    ///
    /// Returns `false` without writing anything when `id` is absent.
    pub fn delete_subtree(&mut self, id: &str) -> Result<bool> {
        self.flush_pending_edit()?;
        let Some(removed) = tree::take_subtree(id, &mut self.topics) else {
            return Ok(false);
        };
        info!(
            "deleted topic {id} with {} sub-topic(s)",
            tree::count_descendants(&removed)
        );
        self.persist()?;
        Ok(true)
    }

    /// Applies `patch` to `id` immediately. Returns `false` when `id` is absent.
    pub fn update_fields(&mut self, id: &str, patch: FieldPatch) -> Result<bool> {
        let Some(topic) = tree::find_mut(id, &mut self.topics) else {
            return Ok(false);
        };
        patch.apply_to(topic);
        self.persist()?;
        Ok(true)
    }

    /// Queues a text edit; it is committed once no further edit arrives within
    /// the quiet period.
    ///
    /// Edits to the same topic merge. An edit to a different topic commits the
    /// pending one first.
    pub fn queue_edit(&mut self, id: &str, patch: FieldPatch, now: Instant) -> Result<()> {
        let patch = match self.edits.flush() {
            Some(pending) if pending.topic_id == id => pending.patch.merge(patch),
            Some(pending) => {
                self.commit(pending)?;
                patch
            }
            None => patch,
        };
        self.edits.schedule(
            now,
            PendingEdit {
                topic_id: id.to_string(),
                patch,
            },
        );
        Ok(())
    }

    /// Commits the pending edit if its quiet period has elapsed by `now`.
    pub fn commit_due_edit(&mut self, now: Instant) -> Result<bool> {
        match self.edits.take_due(now) {
            Some(pending) => self.commit(pending),
            None => Ok(false),
        }
    }

    /// Waits out the quiet period of the pending edit, then commits it.
    pub async fn wait_and_commit_edit(&mut self) -> Result<bool> {
        match self.edits.wait_due().await {
            Some(pending) => self.commit(pending),
            None => Ok(false),
        }
    }

    /// Commits the pending edit now, if there is one.
    pub fn flush_pending_edit(&mut self) -> Result<bool> {
        match self.edits.flush() {
            Some(pending) => self.commit(pending),
            None => Ok(false),
        }
    }

    pub fn pending_edit_deadline(&self) -> Option<Instant> {
        self.edits.deadline()
    }

    fn commit(&mut self, pending: PendingEdit) -> Result<bool> {
        debug!("committing edit to {}", pending.topic_id);
        self.update_fields(&pending.topic_id, pending.patch)
    }

    /// Snapshot of the active quarter for export; clears the dirty flag.
    pub fn export_snapshot(&mut self) -> Result<SnapshotDocument> {
        self.flush_pending_edit()?;
        let doc = export::to_snapshot(self.quarter, &self.topics);
        self.dirty = false;
        Ok(doc)
    }

    /// Interprets `raw` against the active quarter without applying it, so the
    /// caller can ask for confirmation.
    pub fn preview_import(&self, raw: &str) -> Result<ImportedDocument> {
        Ok(export::from_imported(raw, self.quarter)?)
    }

    /// Replaces the forest with `raw`'s topics, switching quarter if the
    /// document names another one. The caller is expected to have confirmed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ResearchQueueError::Export`] wrapping
    /// [`crate::ExportError::InvalidFormat`] for an unrecognised document; the
    /// session is left untouched in that case.
    pub fn import_document(&mut self, raw: &str) -> Result<ImportOutcome> {
        let doc = self.preview_import(raw)?;
        self.apply_import(doc)
    }

    /// Applies an already-parsed import document.
    pub fn apply_import(&mut self, doc: ImportedDocument) -> Result<ImportOutcome> {
        self.flush_pending_edit()?;
        let stats = doc.stats();
        let switched_quarter = doc.quarter != self.quarter;
        if switched_quarter {
            info!("import switches quarter {} -> {}", self.quarter, doc.quarter);
            self.quarter = doc.quarter;
            if !self.available_quarters.contains(&doc.quarter) {
                self.available_quarters.push(doc.quarter);
                self.available_quarters.sort();
            }
        }
        self.topics = doc.topics;
        info!(
            "imported {} topic(s) into {}",
            stats.total(),
            self.quarter
        );
        self.persist()?;
        Ok(ImportOutcome {
            quarter: self.quarter,
            switched_quarter,
            stats,
        })
    }

    pub fn find(&self, id: &str) -> Option<&Topic> {
        tree::find(id, &self.topics)
    }

    pub fn find_parent(&self, id: &str) -> ParentLookup<'_> {
        tree::find_parent(id, &self.topics)
    }

    /// Breadcrumb ancestors of `id`, root first.
    pub fn resolve_ancestors(&self, id: &str) -> Vec<&Topic> {
        tree::ancestors(id, &self.topics)
    }

    pub fn path(&self, id: &str) -> Option<String> {
        tree::path(id, &self.topics)
    }

    /// Every topic in preorder, optionally restricted to one status.
    pub fn flatten_filtered(&self, status: Option<&TopicStatus>) -> Vec<&Topic> {
        tree::filter_by_status(&self.topics, status)
    }

    pub fn count_descendants(&self, id: &str) -> Option<usize> {
        self.find(id).map(tree::count_descendants)
    }

    /// Confirmation question for deleting `id`, or `None` if it is absent.
    pub fn delete_prompt(&self, id: &str) -> Option<String> {
        let topic = self.find(id)?;
        let descendants = tree::count_descendants(topic);
        Some(if descendants > 0 {
            format!(
                "Delete \"{}\" and its {descendants} sub-topic(s)?",
                topic.title
            )
        } else {
            format!("Delete \"{}\"?", topic.title)
        })
    }

    /// Commits any pending edit and writes the forest one last time.
    ///
    /// A forest that was only read is not written, so a quarter nothing was
    /// found for stays absent from the cache.
    pub fn close(mut self) -> Result<()> {
        self.flush_pending_edit()?;
        if !self.modified {
            debug!("closing {} without changes", self.quarter);
            return Ok(());
        }
        self.resolver.save(self.quarter, &self.topics)
    }

    fn persist(&mut self) -> Result<()> {
        self.dirty = true;
        self.modified = true;
        self.resolver.save(self.quarter, &self.topics)
    }
}
