//! Integration tests for graph construction, indexing, and search.

use mailgraph::config::Config;
use mailgraph::model::node::EdgeKind;
use mailgraph::model::record::{AttachmentMeta, EmailRecord};
use mailgraph::search::query::{MessageType, QueryType, SearchFilters, SearchQuery};
use mailgraph::{EmailEngine, EngineError};

fn record(id: &str, from: &str, to: &str, date: &str) -> EmailRecord {
    EmailRecord {
        message_id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        date: date.to_string(),
        ..Default::default()
    }
}

fn engine_with(records: &[EmailRecord], central: &str) -> EmailEngine {
    let mut engine = EmailEngine::new(Config::default());
    engine.build(records, central).expect("build");
    engine
}

// ─── Test 1: Three emails in one thread ─────────────────────────────

fn thread_records() -> Vec<EmailRecord> {
    (1..=3)
        .map(|i| EmailRecord {
            thread_id: "t1".to_string(),
            subject: format!("Msg {i}"),
            body: format!("body of message {i}"),
            ..record(
                &format!("m{i}"),
                "a@x.com",
                "b@x.com",
                &format!("2024-01-0{i}T10:00:00"),
            )
        })
        .collect()
}

#[test]
fn test_thread_of_three_accumulates_contact_weight() {
    let engine = engine_with(&thread_records(), "a@x.com");
    let store = engine.store();

    let a = store.find_user_by_email("a@x.com").unwrap().to_string();
    let b = store.find_user_by_email("b@x.com").unwrap().to_string();

    // One aggregate edge, not three: 3 × 3.0 (central sender).
    assert_eq!(store.edge_weight(&a, &b, EdgeKind::Emailed), Some(9.0));

    // Strength lands on the non-central side only.
    assert_eq!(store.user(&b).unwrap().connection_strength, 9.0);
    assert_eq!(store.user(&a).unwrap().connection_strength, 0.0);
}

#[test]
fn test_thread_of_three_builds_chains() {
    let engine = engine_with(&thread_records(), "a@x.com");
    let store = engine.store();

    let thread = store.thread("t1").unwrap();
    assert_eq!(thread.message_count, 3);
    assert_eq!(thread.last_message_date, "2024-01-03T10:00:00");

    for i in 1..=3 {
        let id = format!("m{i}");
        assert_eq!(store.edge_weight(&id, "t1", EdgeKind::PartOfThread), Some(1.0));
    }
    // Reply chain follows date order.
    assert_eq!(store.edge_weight("m2", "m1", EdgeKind::RepliedTo), Some(1.0));
    assert_eq!(store.edge_weight("m3", "m2", EdgeKind::RepliedTo), Some(1.0));
    assert_eq!(store.edge_weight("m3", "m1", EdgeKind::RepliedTo), None);
}

// ─── Test 2: Duplicate and degenerate records ───────────────────────

#[test]
fn test_duplicate_message_id_keeps_first_record() {
    let mut records = vec![EmailRecord {
        thread_id: "t1".to_string(),
        ..record("m1", "a@x.com", "b@x.com", "2024-01-01T00:00:00")
    }];
    records.push(EmailRecord {
        thread_id: "t1".to_string(),
        subject: "Imposter".to_string(),
        ..record("m1", "c@x.com", "d@x.com", "2024-06-01T00:00:00")
    });

    let engine = engine_with(&records, "a@x.com");
    let store = engine.store();
    assert_eq!(store.message_ids().len(), 1);
    assert_eq!(store.message("m1").unwrap().sender, "a@x.com");
    assert_eq!(store.message("m1").unwrap().subject, "");
    // The thread sees the message once, matching its single membership edge.
    assert_eq!(store.thread("t1").unwrap().message_count, 1);
    assert_eq!(
        store.edge_weight("m1", "t1", EdgeKind::PartOfThread),
        Some(1.0)
    );
}

#[test]
fn test_self_addressed_mail_creates_no_self_loop() {
    let engine = engine_with(
        &[record("m1", "a@x.com", "a@x.com", "2024-01-01T00:00:00")],
        "a@x.com",
    );
    let store = engine.store();
    let a = store.find_user_by_email("a@x.com").unwrap().to_string();
    assert_eq!(store.edge_weight(&a, &a, EdgeKind::Emailed), None);
    assert_eq!(store.user(&a).unwrap().connection_strength, 0.0);
}

#[test]
fn test_record_without_id_counts_as_failure() {
    let records = vec![
        record("", "a@x.com", "b@x.com", "2024-01-01T00:00:00"),
        record("m1", "a@x.com", "b@x.com", "2024-01-02T00:00:00"),
    ];
    let mut engine = EmailEngine::new(Config::default());
    let stats = engine.build(&records, "a@x.com").unwrap();
    assert_eq!(stats.emails_processed, 2);
    assert_eq!(stats.emails_successful, 1);
    assert_eq!(stats.emails_failed, 1);
    assert!((stats.success_rate() - 0.5).abs() < 1e-9);
}

#[test]
fn test_invalid_central_user_is_an_error() {
    let mut engine = EmailEngine::new(Config::default());
    let err = engine.build(&[], "not-an-address");
    assert!(matches!(err, Err(EngineError::InvalidCentralUser(_))));
}

// ─── Test 3: Recipient tiers ────────────────────────────────────────

#[test]
fn test_cc_and_bcc_edge_weights() {
    let records = vec![EmailRecord {
        cc: "c@x.com".to_string(),
        bcc: "d@x.com".to_string(),
        ..record("m1", "a@x.com", "b@x.com", "2024-01-01T00:00:00")
    }];
    let engine = engine_with(&records, "a@x.com");
    let store = engine.store();

    let user = |email: &str| store.find_user_by_email(email).unwrap().to_string();
    let (a, b, c, d) = (user("a@x.com"), user("b@x.com"), user("c@x.com"), user("d@x.com"));

    assert_eq!(store.edge_weight("m1", &b, EdgeKind::Received), Some(1.0));
    assert_eq!(store.edge_weight("m1", &c, EdgeKind::Cc), Some(0.8));
    assert_eq!(store.edge_weight("m1", &d, EdgeKind::Bcc), Some(0.6));

    // Central sender: contact tiers at full strength.
    assert_eq!(store.edge_weight(&a, &b, EdgeKind::Emailed), Some(3.0));
    assert_eq!(store.edge_weight(&a, &c, EdgeKind::EmailedCc), Some(1.5));
    assert_eq!(store.edge_weight(&a, &d, EdgeKind::EmailedBcc), Some(1.0));
}

#[test]
fn test_non_central_sender_uses_low_weights() {
    let engine = engine_with(
        &[record("m1", "b@x.com", "c@x.com", "2024-01-01T00:00:00")],
        "a@x.com",
    );
    let store = engine.store();
    let b = store.find_user_by_email("b@x.com").unwrap().to_string();
    let c = store.find_user_by_email("c@x.com").unwrap().to_string();

    assert_eq!(store.edge_weight(&b, "m1", EdgeKind::Sent), Some(1.0));
    assert_eq!(store.edge_weight(&b, &c, EdgeKind::Emailed), Some(1.0));
    // Neither side is central: no strength recorded.
    assert_eq!(store.user(&b).unwrap().connection_strength, 0.0);
    assert_eq!(store.user(&c).unwrap().connection_strength, 0.0);
}

// ─── Test 4: Content search ─────────────────────────────────────────

#[test]
fn test_content_search_top_score_is_one() {
    let records = vec![
        EmailRecord {
            subject: "Migration plan".to_string(),
            body: "the database migration plan is attached".to_string(),
            ..record("m1", "a@x.com", "b@x.com", "2024-01-01T00:00:00")
        },
        EmailRecord {
            subject: "Standup".to_string(),
            body: "notes from the standup".to_string(),
            ..record("m2", "b@x.com", "a@x.com", "2024-01-02T00:00:00")
        },
        EmailRecord {
            subject: "Retro".to_string(),
            body: "notes from the retro".to_string(),
            ..record("m3", "b@x.com", "a@x.com", "2024-01-03T00:00:00")
        },
    ];
    let engine = engine_with(&records, "a@x.com");

    let results = engine
        .search(&SearchQuery {
            text: "migration".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].message_id, "m1");
    assert_eq!(results[0].scores.content, 1.0);
    assert!(results[0].snippet.contains("[migration]"));
}

#[test]
fn test_tokens_shorter_than_three_chars_are_ignored() {
    let records = vec![EmailRecord {
        body: "go to it".to_string(),
        ..record("m1", "a@x.com", "b@x.com", "2024-01-01T00:00:00")
    }];
    let engine = engine_with(&records, "a@x.com");
    let results = engine
        .search(&SearchQuery {
            text: "go".to_string(),
            ..Default::default()
        })
        .unwrap();
    // No usable token and no filters: the whole corpus comes back.
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].scores.content, 0.0);
}

// ─── Test 5: Temporal search on an exact day ────────────────────────

#[test]
fn test_temporal_exact_day_scores_one() {
    let records = vec![
        record("m1", "a@x.com", "b@x.com", "2024-04-10T09:00:00"),
        record("m2", "a@x.com", "b@x.com", "2024-04-15T09:00:00"),
    ];
    let engine = engine_with(&records, "a@x.com");

    let results = engine
        .search(&SearchQuery {
            query_type: QueryType::Temporal,
            filters: SearchFilters {
                date_from: Some("2024-04-10".to_string()),
                date_to: Some("2024-04-10".to_string()),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].message_id, "m1");
    assert_eq!(results[0].scores.temporal, 1.0);
}

#[test]
fn test_temporal_range_includes_both_ends() {
    let records = vec![
        record("m1", "a@x.com", "b@x.com", "2024-04-10T09:00:00"),
        record("m2", "a@x.com", "b@x.com", "2024-04-15T09:00:00"),
        record("m3", "a@x.com", "b@x.com", "2024-04-20T09:00:00"),
    ];
    let engine = engine_with(&records, "a@x.com");

    let results = engine
        .search(&SearchQuery {
            query_type: QueryType::Temporal,
            filters: SearchFilters {
                date_from: Some("2024-04-10".to_string()),
                date_to: Some("2024-04-15".to_string()),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.message_id.as_str()).collect();
    assert!(ids.contains(&"m1"));
    assert!(ids.contains(&"m2"));
    assert!(!ids.contains(&"m3"));
}

// ─── Test 6: Attachment negation filter ─────────────────────────────

#[test]
fn test_attachment_negation_scans_whole_corpus() {
    let records = vec![
        EmailRecord {
            attachments: vec![AttachmentMeta {
                filename: "deck.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
            }],
            ..record("m1", "a@x.com", "b@x.com", "2024-01-01T00:00:00")
        },
        record("m2", "a@x.com", "b@x.com", "2024-01-02T00:00:00"),
        record("m3", "b@x.com", "a@x.com", "2024-01-03T00:00:00"),
    ];
    let engine = engine_with(&records, "a@x.com");

    let results = engine
        .search(&SearchQuery {
            filters: SearchFilters {
                has_attachments: Some(false),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.message_id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"m2"));
    assert!(ids.contains(&"m3"));
}

// ─── Test 7: Combined mode intersects signals ───────────────────────

#[test]
fn test_combined_mode_intersection() {
    let records = vec![
        EmailRecord {
            body: "budget review for q2".to_string(),
            ..record("m1", "Alice <alice@x.com>", "me@x.com", "2024-01-01T00:00:00")
        },
        EmailRecord {
            body: "budget leftovers".to_string(),
            ..record("m2", "Bob <bob@y.com>", "me@x.com", "2024-01-02T00:00:00")
        },
        record("m3", "Alice <alice@x.com>", "me@x.com", "2024-01-03T00:00:00"),
    ];
    let engine = engine_with(&records, "me@x.com");

    let results = engine
        .search(&SearchQuery {
            text: "budget".to_string(),
            filters: SearchFilters {
                contact_name: Some("alice".to_string()),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
    // "budget" ∩ alice's mail = m1 only.
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].message_id, "m1");
}

// ─── Test 8: User search framing and enrichment ─────────────────────

#[test]
fn test_user_search_received_framing() {
    let records = vec![
        record("m1", "Alice <alice@x.com>", "me@x.com", "2024-01-01T00:00:00"),
        record("m2", "me@x.com", "alice@x.com", "2024-01-02T00:00:00"),
    ];
    let engine = engine_with(&records, "me@x.com");

    let results = engine
        .search(&SearchQuery {
            filters: SearchFilters {
                contact_name: Some("alice".to_string()),
                message_type: Some(MessageType::Received),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].message_id, "m1");
    assert_eq!(results[0].sender.name, "Alice");
}

// ─── Test 9: Empty query is rejected ────────────────────────────────

#[test]
fn test_empty_query_error() {
    let engine = engine_with(
        &[record("m1", "a@x.com", "b@x.com", "2024-01-01T00:00:00")],
        "a@x.com",
    );
    let err = engine.search(&SearchQuery::default());
    assert!(matches!(err, Err(EngineError::EmptyQuery)));
}

// ─── Test 10: Snapshot round trip through JSON ──────────────────────

#[test]
fn test_snapshot_file_round_trip() {
    let engine = engine_with(&thread_records(), "a@x.com");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");

    let json = serde_json::to_string(&engine.snapshot()).unwrap();
    std::fs::write(&path, &json).unwrap();

    let restored_snapshot = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let mut restored = EmailEngine::new(Config::default());
    restored.load_snapshot(&restored_snapshot).unwrap();

    assert_eq!(restored.stats().messages, engine.stats().messages);
    assert_eq!(restored.stats().edges, engine.stats().edges);
    assert_eq!(restored.central_email(), Some("a@x.com"));

    let store = restored.store();
    let a = store.find_user_by_email("a@x.com").unwrap().to_string();
    let b = store.find_user_by_email("b@x.com").unwrap().to_string();
    assert_eq!(store.edge_weight(&a, &b, EdgeKind::Emailed), Some(9.0));
}
