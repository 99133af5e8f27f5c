//! SQLite store for processed certificates.
//!
//! Tables:
//! - tasinmaz: one row per parcel
//! - tapu_verileri: extracted table rows with 11 generic cell columns
//! - ipotek_verileri: mortgage entries
//! - takbis_tarih: certificate issue stamp per parcel
//! - baslik_bilgileri: section headers
//! - koordinat_gozlemleri: raw observations used for collision repair

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::model::{
    CertificateInfo, CoordinateObservation, Establishment, HeaderRecord, HeaderSet,
    HeaderSource, JournalEntry, LandType, MortgageRecord, ObservationPool, ParcelEntity,
    RowRecord, RowState, UnitDescriptor, CELL_COUNT,
};
use crate::pipeline::ProcessedDocument;
use crate::reconcile::ParcelProfile;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS tasinmaz (
    tasinmaz_no TEXT PRIMARY KEY,
    kaynak TEXT,
    zemin_tipi TEXT,
    zemin_turu TEXT NOT NULL,
    il_ilce TEXT,
    kurum_adi TEXT,
    mahalle TEXT,
    mevkii TEXT,
    cilt_sayfa TEXT,
    kayit_durum TEXT,
    ada_parsel TEXT,
    ada_no TEXT,
    parsel_no TEXT,
    yuzolcum TEXT,
    bb_nitelik TEXT,
    bb_brut TEXT,
    bb_net TEXT,
    blok_kat TEXT,
    blok TEXT,
    kat TEXT,
    giris TEXT,
    bb_no TEXT,
    arsa_pay TEXT,
    ana_nitelik TEXT
);

CREATE TABLE IF NOT EXISTS tapu_verileri (
    id INTEGER PRIMARY KEY,
    tasinmaz_no TEXT NOT NULL,
    sira INTEGER NOT NULL,
    sayfa INTEGER NOT NULL,
    satir INTEGER NOT NULL,
    satir_no INTEGER NOT NULL,
    hucreno_1 TEXT,
    hucreno_2 TEXT,
    hucreno_3 TEXT,
    hucreno_4 TEXT,
    hucreno_5 TEXT,
    hucreno_6 TEXT,
    hucreno_7 TEXT,
    hucreno_8 TEXT,
    hucreno_9 TEXT,
    hucreno_10 TEXT,
    hucreno_11 TEXT,
    durum TEXT NOT NULL,
    baslik TEXT,
    y REAL,
    sira_anahtari INTEGER,
    tamamlandi INTEGER NOT NULL DEFAULT 0,
    yevmiye_no TEXT,
    yevmiye_tarih TEXT,
    yevmiye_kurum TEXT
);

CREATE TABLE IF NOT EXISTS ipotek_verileri (
    id INTEGER PRIMARY KEY,
    tasinmaz_no TEXT NOT NULL,
    sayfa INTEGER NOT NULL,
    alacakli TEXT NOT NULL,
    musterek TEXT NOT NULL,
    borc TEXT NOT NULL,
    faiz TEXT NOT NULL,
    derece TEXT NOT NULL,
    sure TEXT NOT NULL,
    tesis TEXT NOT NULL,
    tesis_kurum TEXT,
    tesis_tarih TEXT,
    tesis_yevmiye TEXT,
    tasinmaz TEXT NOT NULL,
    hisse TEXT NOT NULL,
    borclu TEXT NOT NULL,
    malik_borc TEXT NOT NULL,
    tescil TEXT NOT NULL,
    terkin TEXT NOT NULL,
    sn TEXT,
    tamam INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS takbis_tarih (
    tasinmaz_no TEXT PRIMARY KEY,
    ham TEXT,
    tarih TEXT
);

CREATE TABLE IF NOT EXISTS baslik_bilgileri (
    id INTEGER PRIMARY KEY,
    tasinmaz_no TEXT NOT NULL,
    baslik TEXT NOT NULL,
    sayfa INTEGER NOT NULL,
    x REAL NOT NULL,
    y REAL NOT NULL,
    sira_anahtari INTEGER NOT NULL,
    font TEXT NOT NULL,
    boyut REAL NOT NULL,
    kaynak TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS koordinat_gozlemleri (
    id INTEGER PRIMARY KEY,
    tasinmaz_no TEXT NOT NULL,
    sira INTEGER NOT NULL,
    sayfa INTEGER NOT NULL,
    metin TEXT NOT NULL,
    y REAL NOT NULL,
    sira_anahtari INTEGER NOT NULL,
    tuketen_satir INTEGER
);

CREATE INDEX IF NOT EXISTS idx_tapu_tasinmaz ON tapu_verileri(tasinmaz_no, sira);
CREATE INDEX IF NOT EXISTS idx_ipotek_tasinmaz ON ipotek_verileri(tasinmaz_no);
CREATE INDEX IF NOT EXISTS idx_baslik_tasinmaz ON baslik_bilgileri(tasinmaz_no);
CREATE INDEX IF NOT EXISTS idx_gozlem_tasinmaz ON koordinat_gozlemleri(tasinmaz_no, sayfa);
";

const PARCEL_TABLES: &[&str] = &[
    "tasinmaz",
    "tapu_verileri",
    "ipotek_verileri",
    "takbis_tarih",
    "baslik_bilgileri",
    "koordinat_gozlemleri",
];

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

fn cell_columns() -> String {
    (1..=CELL_COUNT)
        .map(|i| format!("hucreno_{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn land_type_code(land_type: LandType) -> &'static str {
    match land_type {
        LandType::Parcel => "parcel",
        LandType::FloorEasement => "floor_easement",
        LandType::FloorOwnership => "floor_ownership",
    }
}

fn land_type_from_code(code: &str) -> LandType {
    match code {
        "floor_easement" => LandType::FloorEasement,
        "floor_ownership" => LandType::FloorOwnership,
        _ => LandType::Parcel,
    }
}

/// Database connection wrapper.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("Store: opened {}", path.display());
        Ok(Self { conn })
    }

    /// Open an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Whether a parcel has been stored.
    pub fn parcel_exists(&self, identity: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM tasinmaz WHERE tasinmaz_no = ?",
                params![identity],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Delete every record of a parcel.
    pub fn delete_parcel(&mut self, identity: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        delete_parcel_in(&tx, identity)?;
        tx.commit()?;
        Ok(())
    }

    /// Save a processed document in one transaction.
    ///
    /// An existing parcel is rejected with [`Error::DuplicateParcel`] unless
    /// `overwrite` is set, in which case its prior records are deleted first.
    pub fn save(&mut self, doc: &ProcessedDocument, overwrite: bool) -> Result<()> {
        let identity = doc.parcel.identity.as_str();
        let tx = self.conn.transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM tasinmaz WHERE tasinmaz_no = ?",
                params![identity],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            if !overwrite {
                return Err(Error::DuplicateParcel(identity.to_string()));
            }
            log::debug!("Store: overwriting parcel {}", identity);
            delete_parcel_in(&tx, identity)?;
        }

        insert_parcel(&tx, &doc.parcel, doc.source.as_deref())?;
        insert_certificate(&tx, identity, &doc.parcel.certificate)?;
        insert_rows(&tx, identity, &doc.rows)?;
        insert_mortgages(&tx, &doc.mortgages)?;
        insert_headers(&tx, identity, &doc.headers)?;
        insert_observations(&tx, &doc.observations)?;

        tx.commit()?;
        log::debug!(
            "Store: saved parcel {} ({} rows, {} mortgages)",
            identity,
            doc.rows.len(),
            doc.mortgages.len()
        );
        Ok(())
    }

    /// Load a parcel's summary.
    pub fn load_parcel(&self, identity: &str) -> Result<Option<ParcelEntity>> {
        let parcel = self
            .conn
            .query_row(
                "SELECT tasinmaz_no, zemin_tipi, zemin_turu, il_ilce, kurum_adi, mahalle, mevkii, \
                 cilt_sayfa, kayit_durum, ada_parsel, ada_no, parsel_no, yuzolcum, bb_nitelik, \
                 bb_brut, bb_net, blok_kat, blok, kat, giris, bb_no, arsa_pay, ana_nitelik \
                 FROM tasinmaz WHERE tasinmaz_no = ?",
                params![identity],
                |row| {
                    Ok(ParcelEntity {
                        identity: row.get(0)?,
                        land_type_text: row.get(1)?,
                        land_type: land_type_from_code(&row.get::<_, String>(2)?),
                        province_district: row.get(3)?,
                        institution: row.get(4)?,
                        neighbourhood: row.get(5)?,
                        locality: row.get(6)?,
                        volume_page: row.get(7)?,
                        record_status: row.get(8)?,
                        block_parcel: row.get(9)?,
                        block_no: row.get(10)?,
                        parcel_no: row.get(11)?,
                        area: row.get(12)?,
                        unit_nature: row.get(13)?,
                        unit_gross_area: row.get(14)?,
                        unit_net_area: row.get(15)?,
                        unit_text: row.get(16)?,
                        unit: UnitDescriptor {
                            block: row.get(17)?,
                            floor: row.get(18)?,
                            entrance: row.get(19)?,
                            unit_number: row.get(20)?,
                        },
                        land_share: row.get(21)?,
                        main_nature: row.get(22)?,
                        certificate: CertificateInfo::default(),
                    })
                },
            )
            .optional()?;

        let Some(mut parcel) = parcel else {
            return Ok(None);
        };
        parcel.certificate = self.load_certificate(identity)?;
        Ok(Some(parcel))
    }

    /// Load the certificate stamp of a parcel.
    pub fn load_certificate(&self, identity: &str) -> Result<CertificateInfo> {
        let stamp: Option<(Option<String>, Option<String>)> = self
            .conn
            .query_row(
                "SELECT ham, tarih FROM takbis_tarih WHERE tasinmaz_no = ?",
                params![identity],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(match stamp {
            Some((raw, issued)) => CertificateInfo {
                raw,
                issued_at: issued
                    .and_then(|s| NaiveDateTime::parse_from_str(&s, STAMP_FORMAT).ok()),
            },
            None => CertificateInfo::default(),
        })
    }

    /// Load a parcel's rows in extraction order.
    pub fn load_rows(&self, identity: &str) -> Result<Vec<RowRecord>> {
        let sql = format!(
            "SELECT sira, sayfa, satir, satir_no, {}, durum, baslik, y, sira_anahtari, \
             tamamlandi, yevmiye_no, yevmiye_tarih, yevmiye_kurum, tasinmaz_no \
             FROM tapu_verileri WHERE tasinmaz_no = ? ORDER BY sira",
            cell_columns()
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![identity], |row| {
            let mut cells: [Option<String>; CELL_COUNT] = Default::default();
            for (i, cell) in cells.iter_mut().enumerate() {
                *cell = row.get(4 + i)?;
            }
            let base = 4 + CELL_COUNT;
            let number: Option<String> = row.get(base + 5)?;
            let journal = match number {
                Some(number) => Some(JournalEntry {
                    number,
                    date: row.get::<_, Option<String>>(base + 6)?.unwrap_or_default(),
                    office: row.get::<_, Option<String>>(base + 7)?.unwrap_or_default(),
                }),
                None => None,
            };
            Ok(RowRecord {
                seq: row.get::<_, i64>(0)? as u32,
                page: row.get::<_, i64>(1)? as u32,
                row_index: row.get::<_, i64>(2)? as u32,
                row_number: row.get::<_, i64>(3)? as u32,
                cells,
                state: RowState::from_code(&row.get::<_, String>(base)?).unwrap_or_default(),
                section: row.get(base + 1)?,
                y: row.get(base + 2)?,
                key: row.get(base + 3)?,
                finalized: row.get::<_, i64>(base + 4)? != 0,
                journal,
                parcel: row.get(base + 8)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Load a parcel's mortgage entries.
    pub fn load_mortgages(&self, identity: &str) -> Result<Vec<MortgageRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT tasinmaz_no, sayfa, alacakli, musterek, borc, faiz, derece, sure, tesis, \
             tesis_kurum, tesis_tarih, tesis_yevmiye, tasinmaz, hisse, borclu, malik_borc, \
             tescil, terkin, sn, tamam \
             FROM ipotek_verileri WHERE tasinmaz_no = ? ORDER BY id",
        )?;
        let rows = stmt.query_map(params![identity], |row| {
            Ok(MortgageRecord {
                parcel: row.get(0)?,
                page: row.get::<_, i64>(1)? as u32,
                lender: row.get(2)?,
                co_debtor: row.get(3)?,
                amount: row.get(4)?,
                interest: row.get(5)?,
                rank: row.get(6)?,
                tenor: row.get(7)?,
                establishment_text: row.get(8)?,
                establishment: Establishment {
                    office: row.get(9)?,
                    date: row.get(10)?,
                    journal_no: row.get(11)?,
                },
                property: row.get(12)?,
                share: row.get(13)?,
                debtor: row.get(14)?,
                owner_debt: row.get(15)?,
                registration: row.get(16)?,
                cancellation: row.get(17)?,
                serial_tag: row.get(18)?,
                complete: row.get::<_, i64>(19)? != 0,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Load a parcel's headers.
    pub fn load_headers(&self, identity: &str) -> Result<HeaderSet> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT baslik, sayfa, x, y, font, boyut, kaynak \
             FROM baslik_bilgileri WHERE tasinmaz_no = ? ORDER BY sira_anahtari, id",
        )?;
        let rows = stmt.query_map(params![identity], |row| {
            Ok(
                HeaderRecord::new(row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u32, row.get(3)?)
                    .with_x(row.get(2)?)
                    .with_font(row.get::<_, String>(4)?, row.get(5)?)
                    .with_source(HeaderSource::from_code(&row.get::<_, String>(6)?)),
            )
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(HeaderSet::from_records(records))
    }

    /// Load a parcel's observations in capture order.
    pub fn load_observations(&self, identity: &str) -> Result<ObservationPool> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT sira, tasinmaz_no, sayfa, metin, y, sira_anahtari, tuketen_satir \
             FROM koordinat_gozlemleri WHERE tasinmaz_no = ? ORDER BY sira",
        )?;
        let rows = stmt.query_map(params![identity], |row| {
            Ok(CoordinateObservation {
                seq: row.get::<_, i64>(0)? as u32,
                parcel: row.get(1)?,
                page: row.get::<_, i64>(2)? as u32,
                text: row.get(3)?,
                y: row.get(4)?,
                key: row.get(5)?,
                consumed_by: row.get::<_, Option<i64>>(6)?.map(|s| s as u32),
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(ObservationPool::from_observations(records))
    }

    /// Build the profile of a stored parcel.
    pub fn profile(&self, identity: &str) -> Result<Option<ParcelProfile>> {
        let Some(parcel) = self.load_parcel(identity)? else {
            return Ok(None);
        };
        let rows = self.load_rows(identity)?;
        let mortgages = self.load_mortgages(identity)?;
        Ok(Some(ParcelProfile::build(parcel, &rows, mortgages)))
    }

    /// Delete every observation no row consumed.
    pub fn discard_unconsumed_observations(&self) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM koordinat_gozlemleri WHERE tuketen_satir IS NULL",
            [],
        )?;
        log::debug!("Store: discarded {} unconsumed observations", deleted);
        Ok(deleted)
    }

    /// All stored parcel identities.
    pub fn list_parcels(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT tasinmaz_no FROM tasinmaz ORDER BY tasinmaz_no")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut parcels = Vec::new();
        for row in rows {
            parcels.push(row?);
        }
        Ok(parcels)
    }
}

fn delete_parcel_in(conn: &Connection, identity: &str) -> Result<()> {
    for table in PARCEL_TABLES {
        conn.execute(
            &format!("DELETE FROM {} WHERE tasinmaz_no = ?", table),
            params![identity],
        )?;
    }
    Ok(())
}

fn insert_parcel(conn: &Connection, parcel: &ParcelEntity, source: Option<&str>) -> Result<()> {
    conn.execute(
        "INSERT INTO tasinmaz (tasinmaz_no, kaynak, zemin_tipi, zemin_turu, il_ilce, kurum_adi, \
         mahalle, mevkii, cilt_sayfa, kayit_durum, ada_parsel, ada_no, parsel_no, yuzolcum, \
         bb_nitelik, bb_brut, bb_net, blok_kat, blok, kat, giris, bb_no, arsa_pay, ana_nitelik) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            parcel.identity,
            source,
            parcel.land_type_text,
            land_type_code(parcel.land_type),
            parcel.province_district,
            parcel.institution,
            parcel.neighbourhood,
            parcel.locality,
            parcel.volume_page,
            parcel.record_status,
            parcel.block_parcel,
            parcel.block_no,
            parcel.parcel_no,
            parcel.area,
            parcel.unit_nature,
            parcel.unit_gross_area,
            parcel.unit_net_area,
            parcel.unit_text,
            parcel.unit.block,
            parcel.unit.floor,
            parcel.unit.entrance,
            parcel.unit.unit_number,
            parcel.land_share,
            parcel.main_nature,
        ],
    )?;
    Ok(())
}

fn insert_certificate(conn: &Connection, identity: &str, certificate: &CertificateInfo) -> Result<()> {
    let issued = certificate
        .issued_at
        .map(|d| d.format(STAMP_FORMAT).to_string());
    conn.execute(
        "INSERT INTO takbis_tarih (tasinmaz_no, ham, tarih) VALUES (?, ?, ?) \
         ON CONFLICT(tasinmaz_no) DO UPDATE SET ham = excluded.ham, tarih = excluded.tarih",
        params![identity, certificate.raw, issued],
    )?;
    Ok(())
}

fn insert_rows(conn: &Connection, identity: &str, rows: &[RowRecord]) -> Result<()> {
    let placeholders = vec!["?"; CELL_COUNT].join(", ");
    let sql = format!(
        "INSERT INTO tapu_verileri (tasinmaz_no, sira, sayfa, satir, satir_no, {}, durum, baslik, \
         y, sira_anahtari, tamamlandi, yevmiye_no, yevmiye_tarih, yevmiye_kurum) \
         VALUES (?, ?, ?, ?, ?, {}, ?, ?, ?, ?, ?, ?, ?, ?)",
        cell_columns(),
        placeholders
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    for row in rows {
        let journal = row.journal.as_ref();
        let c = &row.cells;
        stmt.execute(params![
            row.parcel.as_deref().unwrap_or(identity),
            row.seq,
            row.page,
            row.row_index,
            row.row_number,
            c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7], c[8], c[9], c[10],
            row.state.code(),
            row.section,
            row.y,
            row.key,
            row.finalized,
            journal.map(|j| j.number.as_str()),
            journal.map(|j| j.date.as_str()),
            journal.map(|j| j.office.as_str()),
        ])?;
    }
    Ok(())
}

fn insert_mortgages(conn: &Connection, records: &[MortgageRecord]) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO ipotek_verileri (tasinmaz_no, sayfa, alacakli, musterek, borc, faiz, derece, \
         sure, tesis, tesis_kurum, tesis_tarih, tesis_yevmiye, tasinmaz, hisse, borclu, \
         malik_borc, tescil, terkin, sn, tamam) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )?;
    for r in records {
        stmt.execute(params![
            r.parcel,
            r.page,
            r.lender,
            r.co_debtor,
            r.amount,
            r.interest,
            r.rank,
            r.tenor,
            r.establishment_text,
            r.establishment.office,
            r.establishment.date,
            r.establishment.journal_no,
            r.property,
            r.share,
            r.debtor,
            r.owner_debt,
            r.registration,
            r.cancellation,
            r.serial_tag,
            r.complete,
        ])?;
    }
    Ok(())
}

fn insert_headers(conn: &Connection, identity: &str, headers: &HeaderSet) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO baslik_bilgileri (tasinmaz_no, baslik, sayfa, x, y, sira_anahtari, font, boyut, kaynak) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )?;
    for h in headers.records() {
        stmt.execute(params![
            identity,
            h.name,
            h.page,
            h.x,
            h.y,
            h.key,
            h.font,
            h.size,
            h.source.code(),
        ])?;
    }
    Ok(())
}

fn insert_observations(conn: &Connection, pool: &ObservationPool) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO koordinat_gozlemleri (tasinmaz_no, sira, sayfa, metin, y, sira_anahtari, tuketen_satir) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )?;
    for o in pool.observations() {
        stmt.execute(params![o.parcel, o.seq, o.page, o.text, o.y, o.key, o.consumed_by])?;
    }
    Ok(())
}
