//! Persistence and batch tests against an on-disk database.

mod common;

use std::fs;
use std::ops::ControlFlow;
use std::path::Path;

use common::certificate;
use takbis::{
    load_layouts, BankDirectory, DocumentStatus, EncumbranceKind, Error, JsonLayoutSource,
    Pipeline, PipelineOptions, Store,
};
use tempfile::TempDir;

fn pipeline() -> Pipeline {
    Pipeline::with_directory(PipelineOptions::default(), BankDirectory::with_defaults())
}

fn write_layout(dir: &Path, name: &str, identity: &str) {
    let json = serde_json::to_string(&certificate(identity)).unwrap();
    fs::write(dir.join(name), json).unwrap();
}

// ==================== Persistence ====================

#[test]
fn test_persisted_document_loads_back() {
    let dir = TempDir::new().unwrap();
    let mut store = Store::open(dir.path().join("db/takbis.db")).unwrap();
    let mut pipeline = pipeline();

    let doc = pipeline.process(&certificate("123456789")).unwrap();
    pipeline.persist(&mut store, &doc, false).unwrap();

    assert!(store.parcel_exists("123456789").unwrap());
    assert_eq!(store.load_rows("123456789").unwrap(), doc.rows);
    assert_eq!(
        store.load_headers("123456789").unwrap().records(),
        doc.headers.records()
    );

    let parcel = store.load_parcel("123456789").unwrap().unwrap();
    assert_eq!(parcel.block_no.as_deref(), Some("101"));
    assert_eq!(parcel.main_nature.as_deref(), Some("Betonarme Apartman"));
    assert_eq!(
        store.load_certificate("123456789").unwrap().issued_at,
        doc.parcel.certificate.issued_at
    );

    let mortgages = store.load_mortgages("123456789").unwrap();
    assert_eq!(mortgages.len(), 1);
    assert_eq!(mortgages[0].lender, "Türkiye İş Bankası A.Ş.");
    assert_eq!(mortgages[0].serial_tag.as_deref(), Some("12"));
}

#[test]
fn test_reopened_store_keeps_parcels() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("takbis.db");
    {
        let mut store = Store::open(&db).unwrap();
        let mut pipeline = pipeline();
        let doc = pipeline.process(&certificate("42")).unwrap();
        pipeline.persist(&mut store, &doc, false).unwrap();
    }
    let store = Store::open(&db).unwrap();
    assert_eq!(store.list_parcels().unwrap(), vec!["42".to_string()]);
}

#[test]
fn test_duplicate_parcel_rejected_unless_overwrite() {
    let dir = TempDir::new().unwrap();
    let mut store = Store::open(dir.path().join("takbis.db")).unwrap();
    let mut pipeline = pipeline();
    let doc = pipeline.process(&certificate("123456789")).unwrap();

    pipeline.persist(&mut store, &doc, false).unwrap();
    let err = pipeline.persist(&mut store, &doc, false).unwrap_err();
    assert!(matches!(err, Error::DuplicateParcel(ref id) if id == "123456789"));

    pipeline.persist(&mut store, &doc, true).unwrap();
    assert_eq!(store.load_rows("123456789").unwrap().len(), doc.rows.len());
}

#[test]
fn test_profile_from_store() {
    let dir = TempDir::new().unwrap();
    let mut store = Store::open(dir.path().join("takbis.db")).unwrap();
    let mut pipeline = pipeline();
    let doc = pipeline.process(&certificate("123456789")).unwrap();
    pipeline.persist(&mut store, &doc, false).unwrap();

    let profile = store.profile("123456789").unwrap().unwrap();
    assert_eq!(profile.owners.len(), 2);
    assert_eq!(profile.encumbrances.len(), 5);
    assert_eq!(profile.count(EncumbranceKind::Attachment), 1);
    assert_eq!(profile.count(EncumbranceKind::Annotation), 2);
    assert_eq!(profile.count(EncumbranceKind::Declaration), 1);
    assert_eq!(profile.mortgages.len(), 1);
    // 25 + 0.6 + 0.6 + 0.5 + 2 = 28.7
    assert_eq!(profile.risk_score, 29);

    assert!(store.profile("999").unwrap().is_none());
}

// ==================== Batches ====================

#[test]
fn test_batch_over_directory() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    fs::create_dir(&input).unwrap();
    write_layout(&input, "a.json", "1001");
    write_layout(&input, "b.json", "1002");
    write_layout(&input, "c.json", "1001");
    fs::write(input.join("d.json"), "{ not json").unwrap();
    fs::write(input.join("notes.txt"), "ignored").unwrap();

    let layouts = load_layouts(&JsonLayoutSource::new(), &input).unwrap();
    assert_eq!(layouts.len(), 4);

    let mut store = Store::open(dir.path().join("takbis.db")).unwrap();
    let mut seen = Vec::new();
    let report = pipeline()
        .run_batch(layouts, &mut store, false, |outcome| {
            seen.push(outcome.source.clone());
            ControlFlow::Continue(())
        })
        .unwrap();

    assert_eq!(seen, vec!["a.json", "b.json", "c.json", "d.json"]);
    assert_eq!(report.processed(), 2);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 1);
    assert!(!report.cancelled);
    assert!(report.discarded_observations > 0);
    assert!(matches!(
        report.outcomes[2].status,
        DocumentStatus::SkippedDuplicate { ref parcel } if parcel == "1001"
    ));

    assert_eq!(store.list_parcels().unwrap(), vec!["1001", "1002"]);
    let consumed = store.load_observations("1001").unwrap();
    assert!(consumed.observations().iter().all(|o| o.is_consumed()));
    assert_eq!(consumed.len(), 2);
}

#[test]
fn test_batch_stops_on_break() {
    let dir = TempDir::new().unwrap();
    write_layout(dir.path(), "a.json", "1001");
    write_layout(dir.path(), "b.json", "1002");

    let layouts = load_layouts(&JsonLayoutSource::new(), dir.path()).unwrap();
    let mut store = Store::open(dir.path().join("takbis.db")).unwrap();
    let report = pipeline()
        .run_batch(layouts, &mut store, false, |_| ControlFlow::Break(()))
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(store.list_parcels().unwrap(), vec!["1001"]);
}

#[test]
fn test_batch_overwrite_reprocesses() {
    let dir = TempDir::new().unwrap();
    let mut store = Store::open(dir.path().join("takbis.db")).unwrap();
    let layouts = || vec![("a.json".to_string(), Ok(certificate("7")))];

    let mut pipeline = pipeline();
    pipeline.run_batch(layouts(), &mut store, false, |_| ControlFlow::Continue(())).unwrap();
    let report = pipeline
        .run_batch(layouts(), &mut store, true, |_| ControlFlow::Continue(()))
        .unwrap();
    assert_eq!(report.processed(), 1);
    assert_eq!(report.skipped(), 0);
}

// ==================== Bank directory ====================

#[test]
fn test_bank_directory_seeded_and_grown() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("banks.json");

    let mut layout = certificate("123456789");
    let page = &mut layout.pages[3];
    for word in page.words.iter_mut() {
        if word.text.contains("4810058590") {
            word.text = word.text.replace("4810058590", "9990001112");
        }
        if word.text.contains("İş") {
            word.text = word.text.replace("İş Bankası", "Yeni Katılım");
        }
    }

    let options = PipelineOptions::default().with_bank_directory(&path);
    let mut pipeline = Pipeline::new(options).unwrap();
    assert!(path.exists());

    let doc = pipeline.process(&layout).unwrap();
    assert!(pipeline.directory().contains("9990001112"));
    assert_eq!(doc.mortgages[0].lender, pipeline.directory().get("9990001112").unwrap());

    let reopened = BankDirectory::open(&path).unwrap();
    assert!(reopened.contains("9990001112"));
}
