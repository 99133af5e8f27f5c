//! Synthetic certificate layouts shared by the integration tests.

#![allow(dead_code)]

use takbis::model::{PageLayout, Span, TableGeometry, TableRowGeometry, Word};
use takbis::DocumentLayout;

pub const HEADER_FONT: &str = "Arial-BoldMT";
pub const BODY_FONT: &str = "ArialMT";

pub const EASEMENT: &str = "TAŞINMAZA AİT ŞERH BEYAN İRTİFAK BİLGİLERİ";
pub const PLEDGE: &str = "MÜLKİYETE AİT REHİN BİLGİLERİ";
pub const LEARNED: &str = "YÖNETİM PLANI BEYAN BİLGİLERİ";

pub fn header(text: &str, y: f64) -> Span {
    Span::new(text, HEADER_FONT, 9.0, 30.0, y)
}

pub fn body(text: &str, x: f64, y: f64) -> Span {
    Span::new(text, BODY_FONT, 8.0, x, y)
}

pub fn table(rows: &[&[&str]]) -> TableGeometry {
    TableGeometry {
        bbox: None,
        rows: rows.iter().map(|r| TableRowGeometry::from_texts(r)).collect(),
    }
}

/// Page one: identity grid and certificate stamp.
pub fn identity_page(identity: &str) -> PageLayout {
    let grid: Vec<[&str; 2]> = vec![
        ["Zemin Tipi:", "Kat Mülkiyeti"],
        ["Taşınmaz Kimlik No:", identity],
        ["İl/İlçe:", "İSTANBUL/KADIKÖY"],
        ["Kurum Adı:", "Kadıköy Tapu Müdürlüğü"],
        ["Mahalle/Köy Adı:", "CAFERAĞA"],
        ["Mevkii:", "-"],
        ["Cilt/Sayfa No:", "12/1180"],
        ["Kayıt Durum:", "Aktif"],
        ["Ada/Parsel:", "101/7"],
        ["AT Yüzölçüm(m2):", "1.250,00"],
        ["Bağımsız Bölüm Nitelik:", "Mesken"],
        ["Bağımsız Bölüm Brüt YüzÖlçümü:", "120"],
        ["Bağımsız Bölüm Net YüzÖlçümü:", "98"],
        ["Blok/Kat/Giriş/BBNo:", "A/3/1/12"],
        ["Arsa Pay/Payda:", "24/1200"],
        ["Ana Taşınmaz Nitelik:", "Betonarme Apartman"],
    ];
    let rows: Vec<&[&str]> = grid.iter().map(|r| &r[..]).collect();

    PageLayout::a4_landscape(1)
        .with_span(header("TAPU KAYIT BİLGİSİ", 50.0))
        .with_span(body("Zemin Tipi:", 30.0, 70.0))
        .with_span(body("Kat Mülkiyeti", 150.0, 70.0))
        .with_span(body("Taşınmaz Kimlik No:", 30.0, 85.0))
        .with_span(body(identity, 150.0, 85.0))
        .with_span(body("İl/İlçe:", 30.0, 100.0))
        .with_span(body("Ada/Parsel:", 30.0, 115.0))
        .with_word(Word::new("Tarih: 17-1-2024-14:35", 620.0, 20.0))
        .with_table(table(&rows))
}

/// Page two: ownership rows, a continuation and a learned section.
pub fn ownership_page() -> PageLayout {
    PageLayout::a4_landscape(2)
        .with_span(header("MÜLKİYET BİLGİLERİ", 60.0))
        .with_span(header(LEARNED, 300.0))
        .with_span(body("1001", 40.0, 120.0))
        .with_span(body("1002", 40.0, 160.0))
        .with_span(body("Beyan", 40.0, 340.0))
        .with_word(Word::new("1001", 40.0, 120.0))
        .with_word(Word::new("1002", 40.0, 160.0))
        .with_word(Word::new("Beyan", 40.0, 340.0))
        .with_table(table(&[
            &[
                "Sistem No",
                "Malik",
                "El Birliği No",
                "Hisse Pay/Payda",
                "Metrekare",
                "Toplam Metrekare",
                "Edinme Sebebi-Tarih-Yevmiye",
                "Terkin Sebebi-Tarih-Yevmiye",
            ],
            &[
                "1001",
                "AHMET YILMAZ",
                "",
                "1/2",
                "",
                "",
                "Kadıköy Tapu Müdürlüğü - 12-03-2020 10:15 - 4521",
            ],
            &["", "(Kızlık soyadı: DEMİR)"],
            &["1002", "AYŞE YILMAZ", "", "1/2"],
        ]))
        .with_table(table(&[
            &[
                "Ş/B/İ",
                "Açıklama",
                "Malik/Lehtar",
                "Tesis Kurum Tarih-Yevmiye",
                "Terkin Sebebi-Tarih-Yevmiye",
            ],
            &["", "", "", "Yevmiye"],
            &[
                "Beyan",
                "Yönetim Planı: 01/01/2010",
                "",
                "Kadıköy - 05.06.2010 14:00 - 777",
            ],
        ]))
}

/// Page three: two annotation rows sharing one position.
///
/// Both first cells match the same word, so they collide; the raw spans
/// carry their real positions unless `observed` is false.
pub fn easement_page(observed: bool) -> PageLayout {
    let mut page = PageLayout::a4_landscape(3)
        .with_span(header(EASEMENT, 60.0))
        .with_word(Word::new("Şerh", 40.0, 100.0))
        .with_table(table(&[
            &[
                "Ş/B/İ",
                "Açıklama",
                "Malik/Lehtar",
                "Tesis Kurum Tarih-Yevmiye",
                "Terkin Sebebi-Tarih-Yevmiye",
            ],
            &["", "Devam eden açıklama"],
            &["Şerh", "Kira şerhi"],
            &["Şerh", "Kamu Haczi", "", "Kadıköy - 01-02-2021 09:30 - 1234"],
        ]));
    if observed {
        page = page
            .with_span(body("Şerh", 40.0, 100.0))
            .with_span(body("Şerh", 40.0, 140.0));
    }
    page
}

/// Page four: the mortgage tables read by zone.
pub fn mortgage_page() -> PageLayout {
    PageLayout::a4_landscape(4)
        .with_span(header(PLEDGE, 40.0))
        .with_span(body("Alacaklı", 45.0, 60.0))
        .with_span(body("Müşterek Mi?", 265.0, 60.0))
        .with_span(body("Borç", 335.0, 60.0))
        .with_span(body("Faiz", 445.0, 60.0))
        .with_span(body("Derece", 515.0, 60.0))
        .with_span(body("Tesis Tarih - Yev", 615.0, 60.0))
        .with_word(Word::new("VKN : 4810058590 (SN:12) İş Bankası", 45.0, 90.0))
        .with_word(Word::new("Hayır", 265.0, 90.0))
        .with_word(Word::new("250.000,00 TL", 335.0, 90.0))
        .with_word(Word::new("%45", 445.0, 90.0))
        .with_word(Word::new("1/1", 515.0, 90.0))
        .with_word(Word::new("Bakırköy - 12-03-2020 10:15 - 4567", 615.0, 90.0))
        .with_word(Word::new("Daire 12", 45.0, 210.0))
        .with_word(Word::new("1/2", 245.0, 210.0))
        .with_word(Word::new("AYŞE YILMAZ (SN:12)", 325.0, 210.0))
        .with_table(table(&[
            &[
                "Taşınmaz",
                "Hisse Pay/Payda",
                "Borçlu Malik",
                "Malik Borç",
                "Tescil Tarih - Yev",
                "Terkin Sebebi Tarih Yev",
            ],
            &["Daire 12", "AYŞE YILMAZ (SN:12)", "", "1/2"],
        ]))
}

/// A complete four-page certificate.
pub fn certificate(identity: &str) -> DocumentLayout {
    DocumentLayout::new(vec![
        identity_page(identity),
        ownership_page(),
        easement_page(true),
        mortgage_page(),
    ])
    .with_source(format!("{}.json", identity))
}

/// The same certificate without the spans that resolve the collision.
pub fn certificate_without_observations(identity: &str) -> DocumentLayout {
    DocumentLayout::new(vec![
        identity_page(identity),
        ownership_page(),
        easement_page(false),
        mortgage_page(),
    ])
}
