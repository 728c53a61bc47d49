//! Typed view of one Launchpad bug export document.
//!
//! Documents look like this (only the parts the conversion reads):
//!
//! ```xml
//! <bug id="42">
//!   <title>..</title>
//!   <description>..</description>
//!   <comments>
//!     <comment datecreated="2014-03-21T10:15:30.123+00:00">
//!       <author>..</author><subject>..</subject><body>..</body>
//!     </comment>
//!   </comments>
//!   <messages>
//!     <message created="..." owner="...">
//!       <content>..</content>
//!       <attachment link="..."><title>..</title><filename>..</filename></attachment>
//!     </message>
//!   </messages>
//!   <created>..</created>
//!   <date_last_updated>..</date_last_updated>
//!   <assignee>..</assignee>
//!   <owner>..</owner>
//!   <status>..</status>
//!   <importance>..</importance>
//!   <milestone_title>..</milestone_title>
//! </bug>
//! ```
//!
//! Comment and message parts are addressed by position, not by tag name.

use std::path::Path;

use crate::{date::strip_iso_separator, error::ExportError, xml};

/// One parsed bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugRecord {
    /// Launchpad bug id (root `id` attribute).
    pub id: String,
    /// Bug title.
    pub title: String,
    /// Bug description.
    pub description: String,
    /// Creation timestamp, `T` separator already replaced.
    pub created: String,
    /// Last-update timestamp, `T` separator already replaced.
    pub last_updated: String,
    /// Reporter display name.
    pub owner: String,
    /// Assignee display name, possibly empty.
    pub assignee: String,
    /// Launchpad status text.
    pub status: String,
    /// Launchpad importance text.
    pub importance: String,
    /// Milestone title, possibly empty.
    pub milestone_title: String,
    /// Entries of the `comments` thread, in document order.
    pub comments: Vec<CommentEntry>,
    /// Entries of the `messages` thread, in document order.
    pub messages: Vec<MessageEntry>,
    /// Every `attachment` element, in document order.
    pub attachments: Vec<AttachmentEntry>,
}

/// Entry of the primary (`comments`) thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEntry {
    /// Creation timestamp.
    pub created: String,
    /// Author display name.
    pub author: String,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
}

/// Entry of the secondary (`messages`) thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    /// Creation timestamp.
    pub created: String,
    /// Author display name.
    pub owner: String,
    /// Text of the first child, used as the kind label.
    pub label: String,
    /// First line of the second child.
    pub title: String,
    /// Second line of the second child.
    pub file: String,
}

/// A file attached to the bug. Timestamp and owner come from the parent node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentEntry {
    /// Remote link of the file.
    pub link: String,
    /// File name.
    pub filename: String,
    /// Timestamp of the parent node.
    pub created: String,
    /// Owner of the parent node.
    pub owner: String,
}

impl BugRecord {
    /// Parses one export document. `origin` names the record in errors
    /// until the bug id is known.
    pub fn parse(text: &str, origin: &str) -> Result<Self, ExportError> {
        let root = xml::parse(text)
            .map_err(|err| ExportError::malformed(origin, format!("invalid XML: {err}")))?;

        let id = root
            .attribute("id")
            .map(str::to_string)
            .ok_or_else(|| ExportError::malformed(origin, "missing `id` attribute on root"))?;

        let fields = Fields {
            root: &root,
            id: &id,
        };

        let comments = match root.find("comments") {
            Some(node) => node
                .elements()
                .enumerate()
                .map(|(index, node)| fields.comment(index, node))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let messages = match root.find("messages") {
            Some(node) => node
                .elements()
                .enumerate()
                .map(|(index, node)| fields.message(index, node))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let attachments = root
            .find_all_with_parent("attachment")
            .into_iter()
            .enumerate()
            .map(|(index, (parent, node))| fields.attachment(index, parent, node))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            title: fields.text("title")?,
            description: fields.text("description")?,
            created: strip_iso_separator(&fields.text("created")?),
            last_updated: strip_iso_separator(&fields.text("date_last_updated")?),
            owner: fields.text("owner")?,
            assignee: fields.text("assignee")?,
            status: fields.text("status")?,
            importance: fields.text("importance")?,
            milestone_title: fields.text("milestone_title")?,
            id,
            comments,
            messages,
            attachments,
        })
    }

    /// Reads and parses a document from disk.
    ///
    /// Only a failed read is an I/O error. Undecodable content is a
    /// malformed record, like any other broken document.
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let bytes = std::fs::read(path).map_err(|err| ExportError::io(path, err))?;
        let origin = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let text = decode(bytes, &origin)?;
        Self::parse(&text, &origin)
    }

    /// Comment-like entries across both threads.
    pub fn thread_len(&self) -> usize {
        self.comments.len() + self.messages.len()
    }
}

/// Encoding labels decoded byte-for-byte as ISO-8859-1.
const LATIN1_LABELS: &[&str] =
    &["iso-8859-1", "iso8859-1", "iso_8859-1", "latin1", "latin-1", "l1"];

/// Document text honouring a Latin-1 declaration; UTF-8 otherwise.
fn decode(bytes: Vec<u8>, origin: &str) -> Result<String, ExportError> {
    let latin1 = xml::declared_encoding(&bytes).is_some_and(|label| {
        LATIN1_LABELS
            .iter()
            .any(|known| label.trim().eq_ignore_ascii_case(known))
    });
    if latin1 {
        return Ok(bytes.into_iter().map(char::from).collect());
    }
    String::from_utf8(bytes).map_err(|err| {
        let offset = err.utf8_error().valid_up_to();
        ExportError::malformed(origin, format!("invalid UTF-8 at byte {offset}"))
    })
}

struct Fields<'a> {
    root: &'a xml::Element,
    id: &'a str,
}

impl Fields<'_> {
    fn missing(&self, field: String) -> ExportError {
        ExportError::malformed(self.id, format!("missing {field}"))
    }

    fn text(&self, name: &str) -> Result<String, ExportError> {
        self.root
            .find(name)
            .map(xml::Element::inner_text)
            .ok_or_else(|| self.missing(format!("<{name}>")))
    }

    fn attr(&self, node: &xml::Element, key: &str, what: &str) -> Result<String, ExportError> {
        node.attribute(key)
            .map(str::to_string)
            .ok_or_else(|| self.missing(format!("`{key}` attribute on {what}")))
    }

    fn part(&self, node: &xml::Element, index: usize, what: &str) -> Result<String, ExportError> {
        node.child(index)
            .map(xml::Element::inner_text)
            .ok_or_else(|| self.missing(format!("child {index} of {what}")))
    }

    fn comment(&self, index: usize, node: &xml::Element) -> Result<CommentEntry, ExportError> {
        let what = format!("comment {index}");
        Ok(CommentEntry {
            created: strip_iso_separator(&self.attr(node, "datecreated", &what)?),
            author: self.part(node, 0, &what)?,
            subject: self.part(node, 1, &what)?,
            body: self.part(node, 2, &what)?,
        })
    }

    fn message(&self, index: usize, node: &xml::Element) -> Result<MessageEntry, ExportError> {
        let what = format!("message {index}");
        let detail = node
            .child(1)
            .ok_or_else(|| self.missing(format!("child 1 of {what}")))?;
        let detail_what = format!("{what} detail");
        Ok(MessageEntry {
            created: strip_iso_separator(&self.attr(node, "created", &what)?),
            owner: self.attr(node, "owner", &what)?,
            label: self.part(node, 0, &what)?,
            title: self.part(detail, 0, &detail_what)?,
            file: self.part(detail, 1, &detail_what)?,
        })
    }

    fn attachment(
        &self,
        index: usize,
        parent: &xml::Element,
        node: &xml::Element,
    ) -> Result<AttachmentEntry, ExportError> {
        let what = format!("attachment {index}");
        let parent_what = format!("parent of {what}");
        Ok(AttachmentEntry {
            link: self.attr(node, "link", &what)?,
            filename: self.part(node, 1, &what)?,
            created: strip_iso_separator(&self.attr(parent, "created", &parent_what)?),
            owner: self.attr(parent, "owner", &parent_what)?,
        })
    }
}
