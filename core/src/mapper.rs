//! Flattens one [`BugRecord`] into one import row.

use crate::{
    date::{normalize, CompactTimestamp},
    error::ExportError,
    record::BugRecord,
    resolver::NameResolver,
    schema::{Column, Schema},
};

/// Leading characters of the description compared against the first
/// comment to detect the description repeated as a comment.
const DESCRIPTION_PREFIX_CHARS: usize = 10;

/// Project-wide values every row carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperSettings {
    /// `Project name` column value.
    pub project_name: String,
    /// `Project key` column value.
    pub project_key: String,
    attachments_url: String,
}

impl MapperSettings {
    /// `attachments_url` is where the attachment files and the export
    /// documents themselves are served from while the import runs.
    pub fn new(
        project_name: impl Into<String>,
        project_key: impl Into<String>,
        attachments_url: &str,
    ) -> Self {
        let mut attachments_url = attachments_url.trim().to_string();
        if !attachments_url.ends_with('/') {
            attachments_url.push('/');
        }
        Self {
            project_name: project_name.into(),
            project_key: project_key.into(),
            attachments_url,
        }
    }

    /// Base URL, always ending with `/`.
    pub fn attachments_url(&self) -> &str {
        &self.attachments_url
    }
}

/// One flat output row, aligned with the [`Schema`] it was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    cells: Vec<Option<String>>,
}

impl OutputRow {
    /// Cells in schema column order; `None` for unset cells.
    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    /// Value of `column`, looked up through the row's schema.
    pub fn get(&self, schema: &Schema, column: Column) -> Option<&str> {
        schema
            .index_of(column)
            .and_then(|index| self.cells.get(index))
            .and_then(Option::as_deref)
    }
}

/// Jira status and resolution for a Launchpad status.
pub fn map_status(status: &str) -> (&str, Option<&'static str>) {
    match status {
        "Fix Committed" | "Fix Released" => ("Closed", Some("Fixed")),
        "Won't Fix" => ("Closed", Some("Won't Fix")),
        "Invalid" => ("Closed", Some("Not a Bug")),
        "Incomplete" => ("Closed", Some("Incomplete")),
        other => (other, None),
    }
}

/// Jira issue type and priority for a Launchpad importance.
pub fn map_importance(importance: &str) -> (&'static str, &str) {
    match importance {
        "Wishlist" => ("Task", "Minor"),
        other => ("Bug", other),
    }
}

/// File name the export document is attached under.
pub fn export_document_name(bug_id: &str) -> String {
    format!("LPexportBug{bug_id}.xml")
}

/// Normalizes a timestamp of bug `record`; a malformed value is reported
/// against the record and field it came from.
fn record_timestamp(
    record: &str,
    field: &str,
    value: &str,
) -> Result<CompactTimestamp, ExportError> {
    normalize(value).map_err(|err| match err {
        ExportError::MalformedTimestamp {
            value,
        } => ExportError::malformed(record, format!("{field}: malformed timestamp `{value}`")),
        other => other,
    })
}

struct RowBuilder<'a> {
    schema: &'a Schema,
    record: &'a str,
    cells: Vec<Option<String>>,
}

impl<'a> RowBuilder<'a> {
    fn new(schema: &'a Schema, record: &'a str) -> Self {
        Self {
            schema,
            record,
            cells: vec![None; schema.columns().len()],
        }
    }

    fn set(&mut self, column: Column, value: impl Into<String>) -> Result<(), ExportError> {
        let index = self
            .schema
            .index_of(column)
            .ok_or_else(|| self.overflow(column))?;
        self.cells[index] = Some(value.into());
        Ok(())
    }

    fn overflow(&self, column: Column) -> ExportError {
        let (group, needed, available) = match column {
            Column::Attachment(slot) => ("attachment", slot, self.schema.attachment_slots()),
            Column::Comment(slot) => ("comment", slot, self.schema.comment_slots()),
            _ => ("fixed", 0, 0),
        };
        ExportError::SchemaOverflow {
            record: self.record.to_string(),
            group,
            needed,
            available,
        }
    }

    fn finish(self) -> OutputRow {
        OutputRow {
            cells: self.cells,
        }
    }
}

/// Builds rows for one run. Only side effect: the resolver's caches.
pub struct RecordMapper<'a> {
    resolver: &'a mut NameResolver,
    settings: &'a MapperSettings,
    processed_at: CompactTimestamp,
}

impl<'a> RecordMapper<'a> {
    /// `processed_at` stamps the synthetic export-document attachment.
    pub fn new(
        resolver: &'a mut NameResolver,
        settings: &'a MapperSettings,
        processed_at: CompactTimestamp,
    ) -> Self {
        Self {
            resolver,
            settings,
            processed_at,
        }
    }

    /// Maps `record` onto `schema`.
    pub async fn map(
        &mut self,
        record: &BugRecord,
        schema: &Schema,
    ) -> Result<OutputRow, ExportError> {
        let id = record.id.as_str();
        let mut row = RowBuilder::new(schema, id);

        row.set(Column::ProjectName, self.settings.project_name.as_str())?;
        row.set(Column::ProjectKey, self.settings.project_key.as_str())?;
        row.set(Column::Title, format!("LP:{id} - {}", record.title))?;
        row.set(Column::Comment(1), format!("Launchpad bug id: {id}"))?;

        let mut slot = 2;
        let description_prefix: String = record
            .description
            .chars()
            .take(DESCRIPTION_PREFIX_CHARS)
            .collect();

        for (index, comment) in record.comments.iter().enumerate() {
            let timestamp = record_timestamp(id, "comment datecreated", &comment.created)?;
            let (author, body) = match self.resolver.resolve(&comment.author).await {
                Some(account) => (account, comment.body.clone()),
                None => (
                    comment.author.clone(),
                    format!("Submitted by {}\n{}", comment.author, comment.body),
                ),
            };
            // Launchpad repeats the description as the first comment.
            if index == 0 && body.starts_with(&description_prefix) {
                continue;
            }
            row.set(
                Column::Comment(slot),
                format!("{timestamp};{author};{}\n{body}", comment.subject),
            )?;
            slot += 1;
        }

        for message in &record.messages {
            let timestamp = record_timestamp(id, "message created", &message.created)?;
            let (author, title) = match self.resolver.resolve(&message.owner).await {
                Some(account) => (account, message.title.clone()),
                None => (
                    message.owner.clone(),
                    format!("Submitted by {}\n{}", message.owner, message.title),
                ),
            };
            row.set(
                Column::Comment(slot),
                format!("{timestamp};{author};{}\n{title}\n{}", message.label, message.file),
            )?;
            slot += 1;
        }

        let created = record_timestamp(id, "<created>", &record.created)?;
        let last_updated = record_timestamp(id, "<date_last_updated>", &record.last_updated)?;
        row.set(Column::DateCreated, created.to_string())?;
        row.set(Column::DateUpdated, last_updated.to_string())?;

        let mut description = record.description.clone();
        match self.resolver.resolve(&record.assignee).await {
            Some(account) => row.set(Column::Assignee, account)?,
            None if !record.assignee.trim().is_empty() => {
                description = format!("Assigned to {}\n{description}", record.assignee);
                row.set(Column::Assignee, record.assignee.as_str())?;
            },
            None => {},
        }
        row.set(Column::Description, description)?;

        let owner = self
            .resolver
            .resolve(&record.owner)
            .await
            .unwrap_or_else(|| record.owner.clone());
        row.set(Column::Owner, owner.as_str())?;

        let (status, resolution) = map_status(&record.status);
        row.set(Column::Status, status)?;
        if let Some(resolution) = resolution {
            row.set(Column::Resolution, resolution)?;
        }

        let (issue_type, importance) = map_importance(&record.importance);
        row.set(Column::IssueType, issue_type)?;
        row.set(Column::Importance, importance)?;
        row.set(Column::MilestoneTitle, record.milestone_title.as_str())?;

        let base = self.settings.attachments_url();
        for (index, attachment) in record.attachments.iter().enumerate() {
            let timestamp = record_timestamp(id, "attachment created", &attachment.created)?;
            let author = self
                .resolver
                .resolve(&attachment.owner)
                .await
                .unwrap_or_else(|| attachment.owner.clone());
            // Jira accepts timestamp;author;filename;URL
            row.set(
                Column::Attachment(index + 1),
                format!(
                    "{timestamp};{author};{};{base}attachment/{}",
                    attachment.filename,
                    urlencoding::encode(&attachment.filename)
                ),
            )?;
        }

        let export_name = export_document_name(id);
        row.set(
            Column::Attachment(record.attachments.len() + 1),
            format!("{};{owner};{export_name};{base}{export_name}", self.processed_at),
        )?;

        Ok(row.finish())
    }
}
