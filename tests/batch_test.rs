mod common;

use std::fs;

use archive_splicer::error::RowErrorKind;
use archive_splicer::infrastructure::{DocumentStore, LabelPlacement, PageContainer};
use archive_splicer::models::{parse_range_expr, Rotation};
use archive_splicer::orchestrator::plan_rows;
use archive_splicer::services::{
    output_prefix, ArchiveLayout, AssemblyRequest, DocumentAssembler,
};
use archive_splicer::BatchProcessor;
use common::{row, test_config, FakePage, FakeStore, StoreEvent, A4};

fn source_pages(source_id: &str, pages: &[u32]) -> Vec<FakePage> {
    pages
        .iter()
        .map(|&page| FakePage::source(source_id, page))
        .collect()
}

#[test]
fn test_range_with_descending_part() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArchiveLayout::from_config(&config);
    let store = FakeStore::new().with_source(&layout, "SRC1", 10);

    let mut processor = BatchProcessor::new(store, &config);
    let stats = processor.run(&[row("SRC1", "AB-0001", "1-3,9-7", false, false)]);

    assert!(stats.is_clean());
    assert_eq!(stats.succeeded, 1);
    let output = layout.output_path("AB-0001");
    assert_eq!(output, dir.path().join("AB").join("AB-0001.pdf"));
    assert_eq!(stats.outputs, vec![output.clone()]);
    assert!(dir.path().join("AB").is_dir());

    let store = processor.into_store();
    assert_eq!(
        store.saved[&output],
        source_pages("SRC1", &[1, 2, 3, 9, 8, 7])
    );
}

#[test]
fn test_front_label_and_end_blank() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArchiveLayout::from_config(&config);
    let store = FakeStore::new().with_source(&layout, "SRC1", 10);

    let mut processor = BatchProcessor::new(store, &config);
    let stats = processor.run(&[row("SRC1", "CD-0002", "5", true, true)]);
    assert!(stats.is_clean());

    let store = processor.into_store();
    let pages = &store.saved[&layout.output_path("CD-0002")];
    assert_eq!(pages.len(), 3);
    assert_eq!(
        pages[0],
        FakePage::Label {
            text: "CD-0002".to_string(),
            placement: LabelPlacement::LowerHalf,
            size: A4,
        }
    );
    assert_eq!(pages[1], FakePage::source("SRC1", 5));
    assert_eq!(
        pages[2],
        FakePage::Label {
            text: config.blank_marker_text.clone(),
            placement: LabelPlacement::Top,
            size: A4,
        }
    );
}

#[test]
fn test_consecutive_rows_share_one_open() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArchiveLayout::from_config(&config);
    let store = FakeStore::new().with_source(&layout, "SRC1", 10);

    let rows = vec![
        row("SRC1", "EF-0001", "1", false, false),
        row("SRC1", "EF-0002", "2", false, false),
    ];
    let mut processor = BatchProcessor::new(store, &config);
    let stats = processor.run(&rows);
    assert_eq!(stats.succeeded, 2);

    let store = processor.into_store();
    assert_eq!(store.opens(), vec![&layout.source_path("SRC1")]);
    assert_eq!(store.close_count(), 1);
    assert_eq!(
        store.saved[&layout.output_path("EF-0001")],
        source_pages("SRC1", &[1])
    );
    assert_eq!(
        store.saved[&layout.output_path("EF-0002")],
        source_pages("SRC1", &[2])
    );
}

#[test]
fn test_source_switch_releases_previous_source() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArchiveLayout::from_config(&config);
    let store = FakeStore::new()
        .with_source(&layout, "SRC1", 4)
        .with_source(&layout, "SRC2", 4);

    let rows = vec![
        row("SRC1", "GH-1", "1", false, false),
        row("SRC2", "GH-2", "1", false, false),
        row("SRC1", "GH-3", "2", false, false),
    ];
    let mut processor = BatchProcessor::new(store, &config);
    let stats = processor.run(&rows);
    assert_eq!(stats.succeeded, 3);

    let store = processor.into_store();
    // 只缓存连续行的源文档：SRC1 被重新打开
    assert_eq!(store.opens().len(), 3);
    assert_eq!(store.close_count(), 3);

    // 打开新源文档之前已关闭旧的
    let opens_and_closes: Vec<&StoreEvent> = store
        .events
        .iter()
        .filter(|event| !matches!(event, StoreEvent::Save(_)))
        .collect();
    assert!(matches!(opens_and_closes[0], StoreEvent::Open(_)));
    assert_eq!(opens_and_closes[1], &StoreEvent::Close);
    assert!(matches!(opens_and_closes[2], StoreEvent::Open(_)));
    assert_eq!(opens_and_closes[3], &StoreEvent::Close);
}

#[test]
fn test_inactive_rows_do_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArchiveLayout::from_config(&config);
    let store = FakeStore::new().with_source(&layout, "SRC1", 10);

    let mut inactive = row("SRC1", "IJ-0001", "1-3", true, true);
    inactive.active = false;

    let mut processor = BatchProcessor::new(store, &config);
    let stats = processor.run(&[inactive]);
    assert_eq!(stats.total, 0);

    let store = processor.into_store();
    assert!(store.events.is_empty());
    assert!(!dir.path().join("IJ").exists());
}

#[test]
fn test_out_of_range_row_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArchiveLayout::from_config(&config);
    let store = FakeStore::new().with_source(&layout, "SRC1", 10);

    let mut processor = BatchProcessor::new(store, &config);
    let stats = processor.run(&[row("SRC1", "KL-0001", "8-12", false, false)]);

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.failures, vec![(1, RowErrorKind::RangeBounds)]);
    let store = processor.into_store();
    assert!(store.saved.is_empty());
    assert!(!dir.path().join("KL").exists());
}

#[test]
fn test_malformed_range_touches_no_document() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArchiveLayout::from_config(&config);
    let store = FakeStore::new().with_source(&layout, "SRC1", 10);

    let mut processor = BatchProcessor::new(store, &config);
    let stats = processor.run(&[row("SRC1", "MN-0001", "a-b-c", false, false)]);

    assert_eq!(stats.failures, vec![(1, RowErrorKind::Parse)]);
    let store = processor.into_store();
    assert!(store.events.is_empty());
}

#[test]
fn test_failure_aborts_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArchiveLayout::from_config(&config);
    let store = FakeStore::new().with_source(&layout, "SRC1", 5);

    let rows = vec![
        row("SRC1", "OP-1", "1", false, false),
        row("SRC1", "OP-2", "9", false, false),
        row("SRC1", "OP-3", "2", false, false),
    ];
    let mut processor = BatchProcessor::new(store, &config);
    let stats = processor.run(&rows);

    assert!(stats.aborted);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.not_attempted(), 1);
    assert!(!stats.is_clean());

    let store = processor.into_store();
    assert_eq!(store.saved.len(), 1);
    assert_eq!(store.close_count(), 1);
}

#[test]
fn test_failure_on_last_row_is_not_an_abort() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArchiveLayout::from_config(&config);
    let store = FakeStore::new().with_source(&layout, "SRC1", 5);

    let rows = vec![
        row("SRC1", "OP-1", "1", false, false),
        row("SRC1", "OP-2", "9", false, false),
    ];
    let mut processor = BatchProcessor::new(store, &config);
    let stats = processor.run(&rows);

    assert!(!stats.aborted);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.not_attempted(), 0);
}

#[test]
fn test_continue_on_error_processes_remaining_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.continue_on_error = true;
    let layout = ArchiveLayout::from_config(&config);
    let store = FakeStore::new().with_source(&layout, "SRC1", 5);

    let rows = vec![
        row("SRC1", "QR-1", "1", false, false),
        row("SRC1", "QR-2", "x", false, false),
        row("SRC1", "QR-3", "6", false, false),
        row("SRC1", "QR-4", "5-4", false, false),
    ];
    let mut processor = BatchProcessor::new(store, &config);
    let stats = processor.run(&rows);

    assert!(!stats.aborted);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(
        stats.failures,
        vec![(2, RowErrorKind::Parse), (3, RowErrorKind::RangeBounds)]
    );

    let store = processor.into_store();
    assert_eq!(
        store.saved[&layout.output_path("QR-4")],
        source_pages("SRC1", &[5, 4])
    );

    let log = fs::read_to_string(&config.failure_log_file).unwrap();
    assert!(log.contains("QR-2"));
    assert!(log.contains("QR-3"));
    assert!(!log.contains("QR-4"));
}

#[test]
fn test_failed_source_is_not_reopened() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.continue_on_error = true;
    let layout = ArchiveLayout::from_config(&config);
    let store = FakeStore::new().with_source(&layout, "SRC1", 5);

    let rows = vec![
        row("MISSING", "ST-1", "1", false, false),
        row("MISSING", "ST-2", "1", false, false),
        row("SRC1", "ST-3", "1", false, false),
        row("MISSING", "ST-4", "1", false, false),
    ];
    let mut processor = BatchProcessor::new(store, &config);
    let stats = processor.run(&rows);

    assert_eq!(stats.succeeded, 1);
    assert_eq!(
        stats.failures,
        vec![
            (1, RowErrorKind::SourceAccess),
            (2, RowErrorKind::SourceAccess),
            (4, RowErrorKind::SourceAccess),
        ]
    );

    let store = processor.into_store();
    let missing = layout.source_path("MISSING");
    let missing_opens = store
        .opens()
        .into_iter()
        .filter(|path| **path == missing)
        .count();
    assert_eq!(missing_opens, 1);
}

#[test]
fn test_rotation_is_ignored_unless_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArchiveLayout::from_config(&config);
    let mut rotated = row("SRC1", "UV-1", "1", false, false);
    rotated.rotation = "90".to_string();

    let store = FakeStore::new().with_source(&layout, "SRC1", 3);
    let mut processor = BatchProcessor::new(store, &config);
    processor.run(std::slice::from_ref(&rotated));
    let store = processor.into_store();
    assert_eq!(
        store.saved[&layout.output_path("UV-1")],
        source_pages("SRC1", &[1])
    );

    let mut config = config;
    config.apply_rotation = true;
    let store = FakeStore::new().with_source(&layout, "SRC1", 3);
    let mut processor = BatchProcessor::new(store, &config);
    processor.run(&[rotated]);
    let store = processor.into_store();
    assert_eq!(
        store.saved[&layout.output_path("UV-1")],
        vec![FakePage::Source {
            source_id: "SRC1".to_string(),
            page: 1,
            rotation: Some(Rotation::Deg90),
        }]
    );
}

#[test]
fn test_assembler_bounds_checks_every_span_first() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let layout = ArchiveLayout::from_config(&config);
    let mut store = FakeStore::new().with_source(&layout, "SRC1", 4);
    let source = store.open(&layout.source_path("SRC1")).unwrap();

    let assembler = DocumentAssembler::from_config(&config);
    let request = AssemblyRequest {
        output_id: "WX-1",
        insert_front_label: true,
        insert_end_blank: true,
        rotation: None,
    };

    let spans = parse_range_expr("1-2,4-5").unwrap();
    assert!(assembler
        .assemble(&mut store, &source, &spans, &request)
        .is_err());

    let spans = parse_range_expr("4-1").unwrap();
    let document = assembler
        .assemble(&mut store, &source, &spans, &request)
        .unwrap();
    assert_eq!(document.page_count(), 6);
}

#[test]
fn test_output_prefix() {
    assert_eq!(output_prefix("AB-0001"), "AB");
    assert_eq!(output_prefix("AB-01-02"), "AB");
    assert_eq!(output_prefix("PLAIN"), "PLAIN");
    assert_eq!(output_prefix("-X"), "");
}

#[test]
fn test_plan_rows_reports_invalid_ranges() {
    let rows = vec![
        row("SRC1", "YZ-1", "1-3", false, false),
        row("SRC1", "YZ-2", "1--3", false, false),
        row("SRC1", "YZ-3", "", false, false),
    ];
    let report = plan_rows(&rows);
    assert_eq!(report.total, 3);
    assert_eq!(report.invalid_rows, vec![2, 3]);
}
