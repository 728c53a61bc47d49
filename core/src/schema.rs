//! Column layout of the Jira import file.
//!
//! The number of comment and attachment columns depends on the busiest bug
//! in the whole export, so the layout is fixed by a full scan before any row
//! is built and never grows afterwards.

use crate::record::BugRecord;

const COMMENT_PREFIX: &str = "comment";
const ATTACHMENT_PREFIX: &str = "attachment";

/// One output column. Slot numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// `Project name`
    ProjectName,
    /// `Project key`
    ProjectKey,
    /// `IssueType`
    IssueType,
    /// `Resolution`
    Resolution,
    /// `title`
    Title,
    /// `description`
    Description,
    /// `commentN`
    Comment(usize),
    /// `dateCreated`
    DateCreated,
    /// `dateUpdated`
    DateUpdated,
    /// `owner`
    Owner,
    /// `assignee`
    Assignee,
    /// `status`
    Status,
    /// `importance`
    Importance,
    /// `milestone_title`
    MilestoneTitle,
    /// `attachmentN`
    Attachment(usize),
}

impl Column {
    /// Unique column identifier, e.g. `comment3`.
    pub fn name(&self) -> String {
        match self {
            Self::Comment(slot) => format!("{COMMENT_PREFIX}{slot}"),
            Self::Attachment(slot) => format!("{ATTACHMENT_PREFIX}{slot}"),
            other => other.header().to_string(),
        }
    }

    /// Header cell text. Jira maps repeated `comment`/`attachment` headers
    /// onto one multi-valued field, so slot numbers are dropped.
    pub fn header(&self) -> &'static str {
        match self {
            Self::ProjectName => "Project name",
            Self::ProjectKey => "Project key",
            Self::IssueType => "IssueType",
            Self::Resolution => "Resolution",
            Self::Title => "title",
            Self::Description => "description",
            Self::Comment(_) => COMMENT_PREFIX,
            Self::DateCreated => "dateCreated",
            Self::DateUpdated => "dateUpdated",
            Self::Owner => "owner",
            Self::Assignee => "assignee",
            Self::Status => "status",
            Self::Importance => "importance",
            Self::MilestoneTitle => "milestone_title",
            Self::Attachment(_) => ATTACHMENT_PREFIX,
        }
    }
}

/// Fixed, ordered column layout shared by every row of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    comment_slots: usize,
    attachment_slots: usize,
    columns: Vec<Column>,
}

impl Schema {
    /// Builds the layout for the given slot counts.
    pub fn new(comment_slots: usize, attachment_slots: usize) -> Self {
        let mut columns = vec![
            Column::ProjectName,
            Column::ProjectKey,
            Column::IssueType,
            Column::Resolution,
            Column::Title,
            Column::Description,
        ];
        columns.extend((1..=comment_slots).map(Column::Comment));
        columns.extend([
            Column::DateCreated,
            Column::DateUpdated,
            Column::Owner,
            Column::Assignee,
            Column::Status,
            Column::Importance,
            Column::MilestoneTitle,
        ]);
        columns.extend((1..=attachment_slots).map(Column::Attachment));

        Self {
            comment_slots,
            attachment_slots,
            columns,
        }
    }

    /// Number of `commentN` columns, the reserved id note included.
    pub fn comment_slots(&self) -> usize {
        self.comment_slots
    }

    /// Number of `attachmentN` columns, the self-reference included.
    pub fn attachment_slots(&self) -> usize {
        self.attachment_slots
    }

    /// Columns in output order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Position of `column`, if the layout has it.
    pub fn index_of(&self, column: Column) -> Option<usize> {
        const FIXED_HEAD: usize = 6;
        const FIXED_MIDDLE: usize = 7;
        match column {
            Column::Comment(slot) if (1..=self.comment_slots).contains(&slot) => {
                Some(FIXED_HEAD + slot - 1)
            },
            Column::Attachment(slot) if (1..=self.attachment_slots).contains(&slot) => {
                Some(FIXED_HEAD + self.comment_slots + FIXED_MIDDLE + slot - 1)
            },
            Column::Comment(_) | Column::Attachment(_) => None,
            fixed => self.columns.iter().position(|candidate| *candidate == fixed),
        }
    }
}

/// Scans every record and sizes the slot groups.
///
/// Comment slots: one reserved for the Launchpad id note plus the largest
/// combined thread length. Attachment slots: the largest attachment count
/// plus one for the export document itself.
pub fn discover<'a, I>(records: I) -> Schema
where
    I: IntoIterator<Item = &'a BugRecord>,
{
    let (max_thread, max_attachments) = records
        .into_iter()
        .fold((0, 0), |(thread, attachments), record| {
            (thread.max(record.thread_len()), attachments.max(record.attachments.len()))
        });
    Schema::new(1 + max_thread, 1 + max_attachments)
}
