//! The in-memory record set shared by the CLI and the TUI.
//!
//! `StudyState` owns the loaded records and the currently displayed subset.
//! Every write goes through the ledger first and then to the sink, so the
//! in-memory copy and storage stay in step.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AuraError, Result};
use crate::focus::select_focus_set;
use crate::heatmap::{activity_grid, DayCell};
use crate::ledger::{self, Upsert};
use crate::models::{Submission, TopicRecord};
use crate::parse::normalize_key;
use crate::ports::{RecordSink, RecordSource};
use crate::stats::{daily_question_volume, summarize, Summary};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub focus: Vec<TopicRecord>,
    pub grid: Vec<DayCell>,
}

#[derive(Debug, Default)]
pub struct StudyState {
    pub owner: String,
    pub records: Vec<TopicRecord>,
    // Indices into `records`
    displayed: Vec<usize>,
    tag_filter: Option<String>,
    search: Option<String>,
}

impl StudyState {
    pub fn load(source: &dyn RecordSource, owner: &str) -> Result<Self> {
        let mut state = Self {
            owner: owner.to_string(),
            records: source.load_records(owner)?,
            ..Default::default()
        };
        state.refilter();
        Ok(state)
    }

    pub fn reload(&mut self, source: &dyn RecordSource) -> Result<()> {
        self.records = source.load_records(&self.owner)?;
        self.refilter();
        Ok(())
    }

    pub fn displayed(&self) -> Vec<&TopicRecord> {
        self.displayed.iter().map(|&i| &self.records[i]).collect()
    }

    pub fn tag_filter(&self) -> Option<&str> {
        self.tag_filter.as_deref()
    }

    pub fn find(&self, id: i64) -> Option<&TopicRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Narrows the displayed records to those carrying `tag` and whose
    /// normalized name contains `search`. `None` clears a filter.
    pub fn filter(&mut self, tag: Option<String>, search: Option<String>) {
        self.tag_filter = tag.filter(|t| !t.trim().is_empty());
        self.search = search
            .map(|s| normalize_key(&s))
            .filter(|s| !s.is_empty());
        self.refilter();
    }

    fn refilter(&mut self) {
        let tag = self.tag_filter.as_deref();
        let search = self.search.as_deref();
        self.displayed = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| tag.map_or(true, |t| r.tags.iter().any(|rt| rt == t)))
            .filter(|(_, r)| search.map_or(true, |s| normalize_key(&r.name).contains(s)))
            .map(|(i, _)| i)
            .collect();
    }

    /// Records a study cycle and persists it: a new topic is created, a known
    /// one gets its previous state pushed onto history.
    pub fn submit(
        &mut self,
        submission: Submission,
        now: DateTime<Utc>,
        sink: &dyn RecordSink,
    ) -> Result<&TopicRecord> {
        if submission.name.trim().is_empty() {
            return Err(AuraError::InvalidInput("topic name is empty".to_string()));
        }

        let previous = ledger::find_match(&self.records, &submission.name)
            .map(|i| self.records[i].clone());
        let upsert = ledger::upsert(&mut self.records, submission, now);
        let idx = upsert.index();
        let persisted = match upsert {
            Upsert::Created(_) => match sink.create_record(&self.owner, &self.records[idx]) {
                Ok(id) => {
                    self.records[idx].id = id;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Upsert::Updated(_) => sink.update_record_with_history_push(&self.records[idx]),
        };

        // Storage refused the write: put memory back the way it was
        if let Err(e) = persisted {
            match previous {
                Some(record) => self.records[idx] = record,
                None => {
                    self.records.remove(idx);
                }
            }
            return Err(e);
        }

        self.refilter();
        Ok(&self.records[idx])
    }

    pub fn delete_topic(&mut self, id: i64, sink: &dyn RecordSink) -> Result<()> {
        let idx = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(AuraError::TopicNotFound(id))?;
        sink.delete_record(id)?;
        self.records.remove(idx);
        self.refilter();
        Ok(())
    }

    /// Removes the cycle at `index` from memory and storage. An index past
    /// the end deletes nothing and returns `Ok(false)`.
    pub fn delete_cycle(&mut self, id: i64, index: usize, sink: &dyn RecordSink) -> Result<bool> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AuraError::TopicNotFound(id))?;
        if index >= record.history.len() {
            log::debug!("topic {} has no cycle {}, nothing deleted", id, index);
            return Ok(false);
        }
        sink.delete_cycle(id, index)?;
        Ok(ledger::delete_cycle_at(record, index))
    }

    /// Everything the dashboard shows, computed fresh for `now`.
    pub fn dashboard(&self, now: DateTime<Utc>, focus_limit: usize, days: usize) -> Dashboard {
        let volume = daily_question_volume(&self.records);
        Dashboard {
            summary: summarize(&self.records, now),
            focus: select_focus_set(&self.records, now, focus_limit)
                .into_iter()
                .cloned()
                .collect(),
            grid: activity_grid(&volume, now.date_naive(), days),
        }
    }
}
