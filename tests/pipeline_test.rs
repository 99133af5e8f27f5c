//! End-to-end tests for certificate processing.

mod common;

use common::{certificate, certificate_without_observations, EASEMENT, LEARNED, PLEDGE};
use takbis::model::HeaderSource;
use takbis::parser::{IDENTITY_SECTION, OWNERSHIP_SECTION};
use takbis::{
    BankDirectory, Diagnostic, Error, LandType, Pipeline, PipelineOptions, RowRecord, RowState,
};

fn pipeline() -> Pipeline {
    Pipeline::with_directory(PipelineOptions::default(), BankDirectory::with_defaults())
}

fn row<'a>(rows: &'a [RowRecord], first: &str, second: &str) -> &'a RowRecord {
    rows.iter()
        .find(|r| r.first_cell() == first && r.cell(1) == second)
        .unwrap_or_else(|| panic!("no row {:?} / {:?}", first, second))
}

// ==================== Summary ====================

#[test]
fn test_parcel_summary() {
    let doc = pipeline().process(&certificate("123456789")).unwrap();
    let parcel = &doc.parcel;

    assert_eq!(doc.identity(), "123456789");
    assert_eq!(parcel.land_type, LandType::FloorOwnership);
    assert_eq!(parcel.province_district.as_deref(), Some("İSTANBUL/KADIKÖY"));
    assert_eq!(parcel.block_no.as_deref(), Some("101"));
    assert_eq!(parcel.parcel_no.as_deref(), Some("7"));
    assert_eq!(parcel.unit.floor.as_deref(), Some("3"));
    assert_eq!(parcel.land_share.as_deref(), Some("24/1200"));
    assert_eq!(parcel.main_nature.as_deref(), Some("Betonarme Apartman"));

    let issued = parcel.certificate.issued_at.unwrap();
    assert_eq!(issued.format("%Y-%m-%d %H:%M").to_string(), "2024-01-17 14:35");
}

#[test]
fn test_identity_rows_labelled() {
    let doc = pipeline().process(&certificate("123456789")).unwrap();
    let zemin = row(&doc.rows, "Zemin Tipi:", "Kat Mülkiyeti");
    assert_eq!(zemin.state, RowState::Header);
    assert_eq!(zemin.section.as_deref(), Some(IDENTITY_SECTION));
}

// ==================== Headers ====================

#[test]
fn test_lexicon_and_learned_headers() {
    let doc = pipeline().process(&certificate("123456789")).unwrap();
    let names: Vec<&str> = doc.headers.records().iter().map(|h| h.name.as_str()).collect();
    assert_eq!(
        names,
        vec![IDENTITY_SECTION, OWNERSHIP_SECTION, LEARNED, EASEMENT, PLEDGE]
    );

    let learned = &doc.headers.records()[2];
    assert_eq!(learned.source, HeaderSource::Learned);
    assert_eq!(learned.key, 2300);
    let signature = doc.headers.signature.as_ref().unwrap();
    assert_eq!(signature.font, common::HEADER_FONT);
}

// ==================== Rows ====================

#[test]
fn test_rows_sections_and_merges() {
    let doc = pipeline().process(&certificate("123456789")).unwrap();
    assert_eq!(doc.rows.len(), 27);
    assert!(doc.rows.iter().all(|r| r.finalized));
    assert!(doc.rows.iter().all(|r| r.state != RowState::MergedAway));
    assert_eq!(doc.unassigned_rows().count(), 0);

    let owner = row(&doc.rows, "1001", "AHMET YILMAZ (Kızlık soyadı: DEMİR)");
    assert_eq!(owner.section.as_deref(), Some(OWNERSHIP_SECTION));
    assert_eq!(owner.key, Some(2120));

    let declaration = row(&doc.rows, "Beyan", "Yönetim Planı: 01/01/2010");
    assert_eq!(declaration.section.as_deref(), Some(LEARNED));

    // Spillover caption dropped
    assert!(!doc.rows.iter().any(|r| r.cell(3) == "Yevmiye" && r.is_data()));

    // Unkeyed row placed from its neighbour
    let tail = row(&doc.rows, "", "Devam eden açıklama");
    assert_eq!(tail.section.as_deref(), Some(EASEMENT));
    assert_eq!(tail.key, None);
}

#[test]
fn test_row_ids_increase() {
    let doc = pipeline().process(&certificate("123456789")).unwrap();
    let seqs: Vec<u32> = doc.rows.iter().map(|r| r.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    assert!(doc.rows.iter().all(|r| r.row_number == r.seq + 1));
}

#[test]
fn test_journal_references() {
    let doc = pipeline().process(&certificate("123456789")).unwrap();

    let owner = row(&doc.rows, "1001", "AHMET YILMAZ (Kızlık soyadı: DEMİR)");
    let journal = owner.journal.as_ref().unwrap();
    assert_eq!(journal.number, "4521");
    assert_eq!(journal.date, "12.03.2020 10:15");
    assert_eq!(journal.office, "Kadıköy Tapu Müdürlüğü");

    let declaration = row(&doc.rows, "Beyan", "Yönetim Planı: 01/01/2010");
    assert_eq!(declaration.journal.as_ref().unwrap().number, "777");
    assert!(row(&doc.rows, "1002", "AYŞE YILMAZ").journal.is_none());
}

// ==================== Collisions ====================

#[test]
fn test_collision_resolved_from_observations() {
    let doc = pipeline().process(&certificate("123456789")).unwrap();
    assert!(doc.diagnostics.is_empty(), "{:?}", doc.diagnostics);

    let lease = row(&doc.rows, "Şerh", "Kira şerhi");
    let seizure = row(&doc.rows, "Şerh", "Kamu Haczi");
    assert_eq!(lease.key, Some(3100));
    assert_eq!(seizure.key, Some(3140));
    assert_eq!(seizure.section.as_deref(), Some(EASEMENT));

    let consumed: Vec<u32> = doc
        .observations
        .observations()
        .iter()
        .filter_map(|o| o.consumed_by)
        .collect();
    assert_eq!(consumed, vec![lease.seq, seizure.seq]);
}

#[test]
fn test_collision_unresolved_is_reported() {
    let doc = pipeline()
        .process(&certificate_without_observations("123456789"))
        .unwrap();

    let unresolved: Vec<&Diagnostic> = doc
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::CollisionUnresolved { .. }))
        .collect();
    assert_eq!(unresolved.len(), 2);
    match unresolved[0] {
        Diagnostic::CollisionUnresolved { page, key, text, .. } => {
            assert_eq!(*page, 3);
            assert_eq!(*key, 3100);
            assert_eq!(text, "Şerh");
        }
        other => panic!("unexpected diagnostic {:?}", other),
    }

    // Rows are kept with their original key
    assert_eq!(row(&doc.rows, "Şerh", "Kamu Haczi").key, Some(3100));
}

// ==================== Mortgages ====================

#[test]
fn test_mortgage_from_zones() {
    let doc = pipeline().process(&certificate("123456789")).unwrap();
    assert_eq!(doc.mortgages.len(), 1);

    let mortgage = &doc.mortgages[0];
    assert_eq!(mortgage.page, 4);
    assert_eq!(mortgage.parcel, "123456789");
    assert_eq!(mortgage.lender, "Türkiye İş Bankası A.Ş.");
    assert_eq!(mortgage.amount, "250.000,00 TL");
    assert_eq!(mortgage.serial_tag.as_deref(), Some("12"));
    assert_eq!(mortgage.debtor, "AYŞE YILMAZ");
    assert_eq!(mortgage.share, "1/2");
    assert!(mortgage.complete);
}

#[test]
fn test_partial_mortgage_page_kept() {
    let mut layout = certificate("123456789");
    let keep = ["Hayır", "%45", "1/1", "1/2"];
    layout.pages[3].words.retain(|w| keep.contains(&w.text.as_str()));

    let doc = pipeline().process(&layout).unwrap();
    assert_eq!(doc.mortgages.len(), 1);

    let mortgage = &doc.mortgages[0];
    assert_eq!(mortgage.page, 4);
    assert!(mortgage.lender.is_empty());
    assert_eq!(mortgage.co_debtor, "Hayır");
    assert_eq!(mortgage.rank, "1/1");
    assert!(!mortgage.complete);
    assert!(doc
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::ZoneExtractionIncomplete { page: 4, .. })));
}

// ==================== Failures ====================

#[test]
fn test_missing_identity_section_is_fatal() {
    let mut layout = certificate("123456789");
    layout.pages[0].spans.retain(|s| s.text != "TAPU KAYIT BİLGİSİ");
    let err = pipeline().process(&layout).unwrap_err();
    assert!(matches!(err, Error::MalformedDocument(_)));
}

#[test]
fn test_identity_from_region_fallback() {
    let mut layout = certificate("555");
    layout.pages[0].spans.retain(|s| s.text != "555");
    layout.pages[0]
        .words
        .push(takbis::model::Word::new("Taşınmaz Kimlik No: 555", 30.0, 85.0));
    let doc = pipeline().process(&layout).unwrap();
    assert_eq!(doc.identity(), "555");
}

#[test]
fn test_strict_thresholds_leave_fields_empty() {
    let options = PipelineOptions::default().with_threshold(takbis::ThresholdKey::Area, 1.0);
    let mut layout = certificate("123456789");
    let grid = &mut layout.pages[0].tables[0].rows[9];
    grid.cells[0].text = Some("AT Yüzölçüm (m2)".to_string());

    let mut pipeline = Pipeline::with_directory(options, BankDirectory::with_defaults());
    let doc = pipeline.process(&layout).unwrap();
    assert_eq!(doc.parcel.area, None);
    assert_eq!(doc.parcel.block_no.as_deref(), Some("101"));
}
