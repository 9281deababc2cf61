//! # Interchange Commands
//!
//! Sheet files on disk. Reading happens before anything in the store is
//! touched, so a missing or unreadable file changes nothing.
//!
//! ```text
//! importProducts { path } ──► tokio::fs::read ──► InterchangeService::import_products
//!                                                        │
//!                                                        ▼
//!                                         ImportReport { created, updated,
//!                                                        skipped, warnings }
//!
//! exportProducts { path } ──► InterchangeService::export_products
//!                                   │
//!                                   ▼
//!                             write_sheet ──► tokio::fs::write
//! ```

use std::path::{Path, PathBuf};

use billbook_core::interchange::{write_sheet, ImportReport, Sheet};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub path: PathBuf,
    pub rows: usize,
}

pub async fn export_products(db: &DbState, path: &Path) -> Result<ExportResponse, ApiError> {
    let sheet = db.inner().interchange().export_products().await?;
    write_to(path, &sheet).await
}

pub async fn export_customers(db: &DbState, path: &Path) -> Result<ExportResponse, ApiError> {
    let sheet = db.inner().interchange().export_customers().await?;
    write_to(path, &sheet).await
}

/// Ledger layout: one header row per bill, its item rows, then a blank row.
pub async fn export_bills(db: &DbState, path: &Path) -> Result<ExportResponse, ApiError> {
    let sheet = db.inner().interchange().export_bills().await?;
    write_to(path, &sheet).await
}

pub async fn import_products(db: &DbState, path: &Path) -> Result<ImportReport, ApiError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(db.inner().interchange().import_products(&bytes).await?)
}

pub async fn import_customers(db: &DbState, path: &Path) -> Result<ImportReport, ApiError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(db.inner().interchange().import_customers(&bytes).await?)
}

async fn write_to(path: &Path, sheet: &Sheet) -> Result<ExportResponse, ApiError> {
    let bytes = write_sheet(sheet)?;
    tokio::fs::write(path, bytes).await?;

    info!(path = %path.display(), rows = sheet.len(), "Sheet exported");
    Ok(ExportResponse {
        path: path.to_path_buf(),
        rows: sheet.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use billbook_core::{CustomerDraft, Money, ProductDraft};
    use billbook_db::{Database, DbConfig};

    async fn db() -> DbState {
        DbState::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("billbook-{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_products_round_trip_through_file() {
        let source = db().await;
        source
            .inner()
            .products()
            .add(ProductDraft {
                name: "Curd 400g".into(),
                price: Money::from_cents(4500),
                stock: 7,
                unit: "pcs".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let path = scratch("products");
        let exported = export_products(&source, &path).await.unwrap();
        assert_eq!(exported.rows, 1);

        let target = db().await;
        let report = import_products(&target, &path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(report.created, 1);
        let imported = target.inner().products().list().await.unwrap();
        assert_eq!(imported[0].name, "Curd 400g");
        assert_eq!(imported[0].stock(), 7);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let db = db().await;
        let err = import_customers(&db, &scratch("absent")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let db = db().await;
        db.inner()
            .customers()
            .add(CustomerDraft {
                name: "Ravi".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let path = scratch("broken");
        tokio::fs::write(&path, b"not a sheet").await.unwrap();
        let err = import_customers(&db, &path).await.unwrap_err();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(err.code, ErrorCode::MalformedFile);
        assert_eq!(db.inner().customers().list().await.unwrap().len(), 1);
    }
}
