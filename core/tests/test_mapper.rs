//! Integration tests for `test_mapper`.
#[cfg(test)]
mod tests {
    use lp2jira_core::{
        date::normalize,
        mapper::{MapperSettings, RecordMapper},
        record::{AttachmentEntry, BugRecord, CommentEntry, MessageEntry},
        resolver::{NameResolver, OfflineDirectory},
        schema::{discover, Column, Schema},
        ExportError,
    };

    fn bug(id: &str) -> BugRecord {
        BugRecord {
            id: id.to_string(),
            title: "Crash on startup".to_string(),
            description: "The server crashes when started with --foo.".to_string(),
            created: "2011-05-01 10:00:00.000001+00:00".to_string(),
            last_updated: "2011-06-01 12:30:45+00:00".to_string(),
            owner: "Ada Lovelace".to_string(),
            assignee: String::new(),
            status: "New".to_string(),
            importance: "High".to_string(),
            milestone_title: "5.2".to_string(),
            comments: Vec::new(),
            messages: Vec::new(),
            attachments: Vec::new(),
        }
    }

    fn comment(author: &str, body: &str) -> CommentEntry {
        CommentEntry {
            created: "2011-05-02 08:00:00.5+00:00".to_string(),
            author: author.to_string(),
            subject: "Re: Crash on startup".to_string(),
            body: body.to_string(),
        }
    }

    fn resolver() -> NameResolver {
        let mut resolver = NameResolver::new(OfflineDirectory);
        resolver.preload([
            ("Ada Lovelace".to_string(), "ada".to_string()),
            ("Alan Turing".to_string(), "alan".to_string()),
        ]);
        resolver
    }

    fn settings() -> MapperSettings {
        MapperSettings::new("MariaDB Server", "MDEV", "http://tmp.example.org")
    }

    async fn map_one(
        record: &BugRecord,
        resolver: &mut NameResolver,
    ) -> (Schema, Vec<Option<String>>) {
        let schema = discover([record]);
        let settings = settings();
        let processed_at = normalize("2024-01-02 03:04:05").expect("valid timestamp");
        let mut mapper = RecordMapper::new(resolver, &settings, processed_at);
        let row = mapper.map(record, &schema).await.expect("record maps");
        assert_eq!(row.cells().len(), schema.columns().len());
        let cells = row.cells().to_vec();
        (schema, cells)
    }

    fn cell<'a>(schema: &Schema, cells: &'a [Option<String>], column: Column) -> Option<&'a str> {
        schema
            .index_of(column)
            .and_then(|index| cells[index].as_deref())
    }

    #[tokio::test]
    async fn closed_wishlist_bug_without_threads() {
        let mut record = bug("42");
        record.status = "Invalid".to_string();
        record.importance = "Wishlist".to_string();
        let mut resolver = resolver();

        let (schema, cells) = map_one(&record, &mut resolver).await;

        assert_eq!(schema.comment_slots(), 1);
        assert_eq!(schema.attachment_slots(), 1);
        assert_eq!(cell(&schema, &cells, Column::Comment(1)), Some("Launchpad bug id: 42"));
        assert_eq!(cell(&schema, &cells, Column::Status), Some("Closed"));
        assert_eq!(cell(&schema, &cells, Column::Resolution), Some("Not a Bug"));
        assert_eq!(cell(&schema, &cells, Column::IssueType), Some("Task"));
        assert_eq!(cell(&schema, &cells, Column::Importance), Some("Minor"));
        assert_eq!(cell(&schema, &cells, Column::Title), Some("LP:42 - Crash on startup"));
        assert_eq!(cell(&schema, &cells, Column::DateCreated), Some("20110501100000"));
        assert_eq!(cell(&schema, &cells, Column::DateUpdated), Some("20110601123045"));
        assert_eq!(cell(&schema, &cells, Column::Owner), Some("ada"));
        assert_eq!(cell(&schema, &cells, Column::Assignee), None);
        assert_eq!(cell(&schema, &cells, Column::ProjectKey), Some("MDEV"));
        assert_eq!(
            cell(&schema, &cells, Column::Attachment(1)),
            Some(
                "20240102030405;ada;LPexportBug42.xml;http://tmp.example.org/LPexportBug42.xml"
            )
        );
    }

    #[tokio::test]
    async fn open_status_passes_through_without_resolution() {
        let mut resolver = resolver();
        let (schema, cells) = map_one(&bug("7"), &mut resolver).await;
        assert_eq!(cell(&schema, &cells, Column::Status), Some("New"));
        assert_eq!(cell(&schema, &cells, Column::Resolution), None);
        assert_eq!(cell(&schema, &cells, Column::IssueType), Some("Bug"));
        assert_eq!(cell(&schema, &cells, Column::Importance), Some("High"));
    }

    #[tokio::test]
    async fn description_echo_consumes_no_slot() {
        let mut record = bug("100");
        record.comments = vec![
            comment("Ada Lovelace", "The server crashes when started with --foo.\nmore"),
            comment("Alan Turing", "Confirmed here."),
        ];
        record.messages = vec![MessageEntry {
            created: "2011-05-03 09:00:00+00:00".to_string(),
            owner: "Alan Turing".to_string(),
            label: "Attachment added".to_string(),
            title: "backtrace".to_string(),
            file: "bt.txt".to_string(),
        }];
        let mut resolver = resolver();

        let (schema, cells) = map_one(&record, &mut resolver).await;

        assert_eq!(schema.comment_slots(), 4);
        assert_eq!(
            cell(&schema, &cells, Column::Comment(2)),
            Some("20110502080000;alan;Re: Crash on startup\nConfirmed here.")
        );
        assert_eq!(
            cell(&schema, &cells, Column::Comment(3)),
            Some("20110503090000;alan;Attachment added\nbacktrace\nbt.txt")
        );
        assert_eq!(cell(&schema, &cells, Column::Comment(4)), None);
    }

    #[tokio::test]
    async fn messages_without_comments_start_at_second_slot() {
        let mut record = bug("107");
        record.messages = vec![MessageEntry {
            created: "2012-01-02 10:00:00+00:00".to_string(),
            owner: "Linus".to_string(),
            label: "lbl".to_string(),
            title: "T".to_string(),
            file: "F".to_string(),
        }];
        let mut resolver = resolver();

        let (schema, cells) = map_one(&record, &mut resolver).await;

        assert_eq!(schema.comment_slots(), 2);
        assert_eq!(cell(&schema, &cells, Column::Comment(1)), Some("Launchpad bug id: 107"));
        assert_eq!(
            cell(&schema, &cells, Column::Comment(2)),
            Some("20120102100000;Linus;lbl\nSubmitted by Linus\nT\nF")
        );
    }

    #[tokio::test]
    async fn unresolved_echo_author_keeps_first_comment() {
        let mut record = bug("108");
        let echo = "The server crashes when started with --foo.";
        record.comments = vec![comment("Grace Hopper", echo)];
        let mut resolver = resolver();

        let (schema, cells) = map_one(&record, &mut resolver).await;

        // The `Submitted by` line in front of the body hides the echo.
        assert_eq!(
            cell(&schema, &cells, Column::Comment(2)),
            Some(
                "20110502080000;Grace Hopper;Re: Crash on startup\nSubmitted by Grace \
                 Hopper\nThe server crashes when started with --foo."
            )
        );
    }

    #[tokio::test]
    async fn unresolved_authors_are_embedded_in_text() {
        let mut record = bug("101");
        record.comments = vec![comment("Grace Hopper", "Seen on 5.1 too.")];
        record.messages = vec![MessageEntry {
            created: "2011-05-03 09:00:00+00:00".to_string(),
            owner: "Linus".to_string(),
            label: "Attachment added".to_string(),
            title: "patch".to_string(),
            file: "fix.diff".to_string(),
        }];
        let mut resolver = resolver();

        let (schema, cells) = map_one(&record, &mut resolver).await;

        assert_eq!(
            cell(&schema, &cells, Column::Comment(2)),
            Some(
                "20110502080000;Grace Hopper;Re: Crash on startup\nSubmitted by Grace \
                 Hopper\nSeen on 5.1 too."
            )
        );
        assert_eq!(
            cell(&schema, &cells, Column::Comment(3)),
            Some("20110503090000;Linus;Attachment added\nSubmitted by Linus\npatch\nfix.diff")
        );
        assert_eq!(
            resolver.unmatched_names(),
            vec!["Grace Hopper".to_string(), "Linus".to_string()]
        );
    }

    #[tokio::test]
    async fn unresolved_assignee_is_noted_in_description() {
        let mut record = bug("102");
        record.assignee = "Grace Hopper".to_string();
        record.owner = "Linus".to_string();
        let mut resolver = resolver();

        let (schema, cells) = map_one(&record, &mut resolver).await;

        assert_eq!(cell(&schema, &cells, Column::Assignee), Some("Grace Hopper"));
        assert_eq!(
            cell(&schema, &cells, Column::Description),
            Some("Assigned to Grace Hopper\nThe server crashes when started with --foo.")
        );
        // Owner falls back to the raw name without touching the description.
        assert_eq!(cell(&schema, &cells, Column::Owner), Some("Linus"));
    }

    #[tokio::test]
    async fn resolved_assignee_leaves_description_alone() {
        let mut record = bug("103");
        record.assignee = "Alan Turing".to_string();
        let mut resolver = resolver();

        let (schema, cells) = map_one(&record, &mut resolver).await;

        assert_eq!(cell(&schema, &cells, Column::Assignee), Some("alan"));
        assert_eq!(
            cell(&schema, &cells, Column::Description),
            Some("The server crashes when started with --foo.")
        );
    }

    #[tokio::test]
    async fn attachments_fill_slots_then_self_reference() {
        let mut record = bug("104");
        record.attachments = vec![
            AttachmentEntry {
                link: "https://launchpadlibrarian.net/1/core dump.txt".to_string(),
                filename: "core dump.txt".to_string(),
                created: "2011-05-04 10:00:00+00:00".to_string(),
                owner: "Alan Turing".to_string(),
            },
            AttachmentEntry {
                link: "https://launchpadlibrarian.net/2/my.cnf".to_string(),
                filename: "my.cnf".to_string(),
                created: "2011-05-05 10:00:00+00:00".to_string(),
                owner: "Grace Hopper".to_string(),
            },
        ];
        let mut resolver = resolver();

        let (schema, cells) = map_one(&record, &mut resolver).await;

        assert_eq!(schema.attachment_slots(), 3);
        assert_eq!(
            cell(&schema, &cells, Column::Attachment(1)),
            Some(
                "20110504100000;alan;core dump.txt;http://tmp.example.org/attachment/core%20dump.txt"
            )
        );
        assert_eq!(
            cell(&schema, &cells, Column::Attachment(2)),
            Some("20110505100000;Grace Hopper;my.cnf;http://tmp.example.org/attachment/my.cnf")
        );
        assert_eq!(
            cell(&schema, &cells, Column::Attachment(3)),
            Some(
                "20240102030405;ada;LPexportBug104.xml;http://tmp.example.org/LPexportBug104.xml"
            )
        );
    }

    #[tokio::test]
    async fn rows_share_the_widest_schema() {
        let small = bug("1");
        let mut large = bug("2");
        large.comments = vec![
            comment("Alan Turing", "one"),
            comment("Alan Turing", "two"),
            comment("Alan Turing", "three"),
        ];
        let schema = discover([&small, &large]);
        let settings = settings();
        let mut resolver = resolver();
        let processed_at = normalize("2024-01-02 03:04:05").expect("valid timestamp");
        let mut mapper = RecordMapper::new(&mut resolver, &settings, processed_at);

        let small_row = mapper.map(&small, &schema).await.expect("small maps");
        let large_row = mapper.map(&large, &schema).await.expect("large maps");

        assert_eq!(small_row.cells().len(), large_row.cells().len());
        assert_eq!(small_row.get(&schema, Column::Comment(2)), None);
        assert!(large_row
            .get(&schema, Column::Comment(4))
            .is_some_and(|value| value.ends_with("three")));
    }

    #[tokio::test]
    async fn record_wider_than_schema_is_rejected() {
        let mut record = bug("105");
        record.comments = vec![comment("Alan Turing", "one"), comment("Alan Turing", "two")];
        let schema = Schema::new(2, 1);
        let settings = settings();
        let mut resolver = resolver();
        let processed_at = normalize("2024-01-02 03:04:05").expect("valid timestamp");
        let mut mapper = RecordMapper::new(&mut resolver, &settings, processed_at);

        match mapper.map(&record, &schema).await {
            Err(ExportError::SchemaOverflow {
                group,
                needed,
                available,
                ..
            }) => {
                assert_eq!(group, "comment");
                assert_eq!(needed, 3);
                assert_eq!(available, 2);
            },
            other => panic!("expected SchemaOverflow, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_timestamp_fails_the_record() {
        let mut record = bug("106");
        record.last_updated = "yesterday".to_string();
        let schema = discover([&record]);
        let settings = settings();
        let mut resolver = resolver();
        let processed_at = normalize("2024-01-02 03:04:05").expect("valid timestamp");
        let mut mapper = RecordMapper::new(&mut resolver, &settings, processed_at);

        let err = mapper
            .map(&record, &schema)
            .await
            .expect_err("timestamp is malformed");
        match err {
            ExportError::MalformedRecord {
                record,
                field,
            } => {
                assert_eq!(record, "106");
                assert!(field.contains("<date_last_updated>"), "{field}");
                assert!(field.contains("`yesterday`"), "{field}");
            },
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }
}
