//! # Interchange (Sheet) Codec
//!
//! Maps catalog, directory and ledger records to and from a *sheet*: an
//! ordered list of rows, each row an ordered map from column label to cell.
//! Sheets travel as a JSON array of objects.
//!
//! ## Import Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  bytes ──► parse_sheet ──► rows                                        │
//! │                              │                                          │
//! │            Pass 1            ▼                                          │
//! │   ┌───────────────────────────────────────────────────────┐            │
//! │   │ per row: match by ID ─► else by name ─► else new      │            │
//! │   │          apply cells, remember parent NAME            │            │
//! │   │          ──► PendingProduct { product, pending_parent }│            │
//! │   └───────────────────────────────────────────────────────┘            │
//! │                              │                                          │
//! │            Pass 2            ▼                                          │
//! │   ┌───────────────────────────────────────────────────────┐            │
//! │   │ resolve parent names (imported names first)           │            │
//! │   │ unresolved / not top-level ──► top level + warning    │            │
//! │   └───────────────────────────────────────────────────────┘            │
//! │                              │                                          │
//! │                              ▼                                          │
//! │   merge by id with untouched existing records ──► ImportOutcome        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row numbers in warnings are spreadsheet row numbers: the first data row
//! is row 2, under the header.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Bill, Customer, CustomerDraft, Product, ProductDraft};
use crate::validation::{validate_name, validate_phone};
use crate::TOP_LEVEL_LABEL;

/// One sheet row: column label to cell.
pub type Row = Map<String, Value>;

/// An ordered list of rows.
pub type Sheet = Vec<Row>;

// =============================================================================
// Column Labels
// =============================================================================

pub const COL_ID: &str = "ID";
pub const COL_NAME: &str = "Name";
pub const COL_PARENT: &str = "Parent Category";
pub const COL_PRICE: &str = "Price";
pub const COL_STOCK: &str = "Stock";
pub const COL_MIN_STOCK: &str = "Min Stock";
pub const COL_UNIT: &str = "Unit";
pub const COL_CREATED_AT: &str = "Created At";
pub const COL_PHONE: &str = "Phone";
pub const COL_ADDRESS: &str = "Address";

pub const COL_INVOICE_NO: &str = "Invoice No";
pub const COL_DATE: &str = "Date";
pub const COL_CUSTOMER: &str = "Customer";
pub const COL_SUBTOTAL: &str = "Subtotal";
pub const COL_DISCOUNT_PCT: &str = "Discount %";
pub const COL_GST_PCT: &str = "GST %";
pub const COL_TOTAL: &str = "Total";
pub const COL_PRODUCT: &str = "Product";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_ITEM_TOTAL: &str = "Item Total";

// =============================================================================
// Sheet Encoding
// =============================================================================

/// Parses sheet bytes.
///
/// ## Errors
/// `MalformedInterchangeFile` when the bytes are not a JSON array of
/// objects, or the array is empty.
pub fn parse_sheet(bytes: &[u8]) -> CoreResult<Sheet> {
    let sheet: Sheet = serde_json::from_slice(bytes)
        .map_err(|e| CoreError::MalformedInterchangeFile(e.to_string()))?;

    if sheet.is_empty() {
        return Err(CoreError::MalformedInterchangeFile(
            "sheet has no rows".to_string(),
        ));
    }

    Ok(sheet)
}

/// Serializes a sheet for writing to disk.
pub fn write_sheet(sheet: &[Row]) -> CoreResult<Vec<u8>> {
    serde_json::to_vec_pretty(sheet).map_err(|e| CoreError::MalformedInterchangeFile(e.to_string()))
}

// =============================================================================
// Export
// =============================================================================

/// Catalog export, parent resolved to its name or `Top Level`.
pub fn products_to_sheet(products: &[Product]) -> Sheet {
    let names: HashMap<&str, &str> = products
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();

    products
        .iter()
        .map(|p| {
            let parent = p
                .parent_id
                .as_deref()
                .and_then(|id| names.get(id).copied())
                .unwrap_or(TOP_LEVEL_LABEL);

            let mut row = Row::new();
            row.insert(COL_ID.into(), json!(p.id));
            row.insert(COL_NAME.into(), json!(p.name));
            row.insert(COL_PARENT.into(), json!(parent));
            row.insert(COL_PRICE.into(), json!(p.price.to_major_f64()));
            row.insert(COL_STOCK.into(), json!(p.stock()));
            row.insert(COL_MIN_STOCK.into(), json!(p.min_stock));
            row.insert(COL_UNIT.into(), json!(p.unit));
            row.insert(COL_CREATED_AT.into(), json!(p.created_at.to_rfc3339()));
            row
        })
        .collect()
}

/// Directory export.
pub fn customers_to_sheet(customers: &[Customer]) -> Sheet {
    customers
        .iter()
        .map(|c| {
            let mut row = Row::new();
            row.insert(COL_ID.into(), json!(c.id));
            row.insert(COL_NAME.into(), json!(c.name));
            row.insert(COL_PHONE.into(), json!(c.phone));
            row.insert(COL_ADDRESS.into(), json!(c.address));
            row.insert(COL_CREATED_AT.into(), json!(c.created_at.to_rfc3339()));
            row
        })
        .collect()
}

/// Ledger export: a header row per bill, one row per item, a blank spacer.
///
/// There is no import path for this layout.
pub fn bills_to_sheet(bills: &[Bill]) -> Sheet {
    let mut sheet = Sheet::with_capacity(bills.len() * 4);

    for bill in bills {
        let mut header = Row::new();
        header.insert(COL_INVOICE_NO.into(), json!(bill.invoice_number));
        header.insert(
            COL_DATE.into(),
            json!(bill.created_at.format("%Y-%m-%d %H:%M").to_string()),
        );
        header.insert(COL_CUSTOMER.into(), json!(bill.customer_name));
        header.insert(COL_SUBTOTAL.into(), json!(bill.subtotal.to_major_f64()));
        header.insert(COL_DISCOUNT_PCT.into(), json!(bill.discount_percent.percentage()));
        header.insert(COL_GST_PCT.into(), json!(bill.tax_percent.percentage()));
        header.insert(COL_TOTAL.into(), json!(bill.total.to_major_f64()));
        sheet.push(header);

        for item in &bill.items {
            let mut row = Row::new();
            row.insert(COL_PRODUCT.into(), json!(item.product_name));
            row.insert(COL_QUANTITY.into(), json!(item.quantity));
            row.insert(COL_PRICE.into(), json!(item.price.to_major_f64()));
            row.insert(COL_ITEM_TOTAL.into(), json!(item.total.to_major_f64()));
            sheet.push(row);
        }

        sheet.push(Row::new());
    }

    sheet
}

// =============================================================================
// Import Report
// =============================================================================

/// A problem with a single row. The rest of the import still applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ImportWarning {
    pub row: usize,
    pub message: String,
}

/// Counts and warnings of one import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub warnings: Vec<ImportWarning>,
}

impl ImportReport {
    fn warn(&mut self, row: usize, message: impl Into<String>) {
        self.warnings.push(ImportWarning {
            row,
            message: message.into(),
        });
    }

    fn skip(&mut self, row: usize, message: impl Into<String>) {
        self.skipped += 1;
        self.warn(row, format!("{}, row skipped", message.into()));
    }
}

/// The merged collection to persist, plus the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome<T> {
    pub records: Vec<T>,
    pub report: ImportReport,
}

// =============================================================================
// Cell Reading
// =============================================================================

fn cell<'a>(row: &'a Row, column: &str) -> Option<&'a Value> {
    row.get(column).or_else(|| {
        row.iter()
            .find(|(label, _)| label.trim().eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    })
}

/// Non-blank cell text. Numbers are rendered as written.
fn text_cell(row: &Row, column: &str) -> Option<String> {
    let text = match cell(row, column)? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

enum Cell<T> {
    Blank,
    Value(T),
    Invalid(String),
}

fn money_cell(row: &Row, column: &str) -> Cell<Money> {
    match cell(row, column) {
        None | Some(Value::Null) => Cell::Blank,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => Cell::Value(Money::from_cents((v * 100.0).round() as i64)),
            _ => Cell::Invalid(n.to_string()),
        },
        Some(Value::String(s)) if s.trim().is_empty() => Cell::Blank,
        Some(Value::String(s)) => match Money::parse_major(s) {
            Some(m) => Cell::Value(m),
            None => Cell::Invalid(s.clone()),
        },
        Some(other) => Cell::Invalid(other.to_string()),
    }
}

fn count_cell(row: &Row, column: &str) -> Cell<i64> {
    let parse = |text: &str| -> Option<i64> {
        let text = text.trim();
        text.parse::<i64>().ok().or_else(|| {
            let v: f64 = text.parse().ok()?;
            (v.is_finite() && v.fract() == 0.0).then_some(v as i64)
        })
    };

    match cell(row, column) {
        None | Some(Value::Null) => Cell::Blank,
        Some(Value::String(s)) if s.trim().is_empty() => Cell::Blank,
        Some(Value::String(s)) => parse(s).map_or_else(|| Cell::Invalid(s.clone()), Cell::Value),
        Some(Value::Number(n)) => parse(&n.to_string()).map_or_else(|| Cell::Invalid(n.to_string()), Cell::Value),
        Some(other) => Cell::Invalid(other.to_string()),
    }
}

fn date_cell(row: &Row, column: &str) -> Option<DateTime<Utc>> {
    let text = text_cell(row, column)?;
    DateTime::parse_from_rfc3339(&text)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Reads a non-negative numeric cell. Unparseable or negative values
/// become zero with a warning; blank cells yield `None`.
fn read_non_negative<T>(
    parsed: Cell<T>,
    column: &str,
    row: usize,
    report: &mut ImportReport,
    is_negative: impl Fn(&T) -> bool,
    zero: T,
) -> Option<T> {
    match parsed {
        Cell::Blank => None,
        Cell::Value(v) if is_negative(&v) => {
            report.warn(row, format!("{} must not be negative, using 0", column));
            Some(zero)
        }
        Cell::Value(v) => Some(v),
        Cell::Invalid(raw) => {
            report.warn(row, format!("{} '{}' is not a number, using 0", column, raw));
            Some(zero)
        }
    }
}

fn natural_key(text: &str) -> String {
    text.trim().to_lowercase()
}

// =============================================================================
// Product Import
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Created,
    Updated,
}

/// A product read from the sheet whose parent is still a name.
///
/// `pending_parent` is `None` when the row needs no lookup: the parent was
/// left blank (kept) or set to `Top Level` (already cleared).
#[derive(Debug, Clone)]
struct PendingProduct {
    product: Product,
    pending_parent: Option<String>,
    origin: Origin,
    row: usize,
}

enum Target {
    Pending(usize),
    Existing(usize),
    New,
}

fn locate_product(
    supplied_id: Option<&str>,
    key: &str,
    pending: &[PendingProduct],
    existing: &[Product],
) -> Target {
    let pending_by_id = |id: &str| pending.iter().position(|p| p.product.id == id);

    if let Some(id) = supplied_id {
        if let Some(i) = pending_by_id(id) {
            return Target::Pending(i);
        }
        if let Some(i) = existing.iter().position(|p| p.id == id) {
            return Target::Existing(i);
        }
    }

    if let Some(i) = pending.iter().position(|p| natural_key(&p.product.name) == key) {
        return Target::Pending(i);
    }
    match existing.iter().position(|p| natural_key(&p.name) == key) {
        Some(i) => match pending_by_id(&existing[i].id) {
            Some(j) => Target::Pending(j),
            None => Target::Existing(i),
        },
        None => Target::New,
    }
}

/// Reconciles a product sheet against the current catalog.
///
/// Blank cells on a matched row keep the stored value. `new_id` supplies
/// identifiers for rows that match nothing and carry no `ID`.
pub fn import_products(
    existing: &[Product],
    sheet: &[Row],
    now: DateTime<Utc>,
    mut new_id: impl FnMut() -> String,
) -> ImportOutcome<Product> {
    let mut report = ImportReport::default();
    let mut pending: Vec<PendingProduct> = Vec::new();

    // Pass 1: match rows and apply cells
    for (idx, row) in sheet.iter().enumerate() {
        let row_no = idx + 2;

        let name = match text_cell(row, COL_NAME) {
            Some(name) => name,
            None => {
                report.skip(row_no, "missing Name");
                continue;
            }
        };
        if let Err(e) = validate_name(&name) {
            report.skip(row_no, e.to_string());
            continue;
        }

        let supplied_id = text_cell(row, COL_ID);
        let target = locate_product(supplied_id.as_deref(), &natural_key(&name), &pending, existing);

        let (mut product, origin) = match target {
            Target::Pending(i) => (pending[i].product.clone(), pending[i].origin),
            Target::Existing(i) => (existing[i].clone(), Origin::Updated),
            Target::New => {
                let id = supplied_id.clone().unwrap_or_else(&mut new_id);
                let created_at = date_cell(row, COL_CREATED_AT).unwrap_or(now);
                let draft = ProductDraft {
                    name: name.clone(),
                    ..Default::default()
                };
                (Product::from_draft(id, draft, created_at), Origin::Created)
            }
        };

        product.name = name;
        if let Some(price) = read_non_negative(
            money_cell(row, COL_PRICE),
            COL_PRICE,
            row_no,
            &mut report,
            Money::is_negative,
            Money::zero(),
        ) {
            product.price = price;
        }
        if let Some(stock) = read_non_negative(
            count_cell(row, COL_STOCK),
            COL_STOCK,
            row_no,
            &mut report,
            |v| *v < 0,
            0,
        ) {
            product.set_stock(stock);
        }
        if let Some(min_stock) = read_non_negative(
            count_cell(row, COL_MIN_STOCK),
            COL_MIN_STOCK,
            row_no,
            &mut report,
            |v| *v < 0,
            0,
        ) {
            product.min_stock = min_stock;
        }
        if let Some(unit) = text_cell(row, COL_UNIT) {
            product.unit = unit;
        }

        let pending_parent = match text_cell(row, COL_PARENT) {
            None => None,
            Some(label) if label.eq_ignore_ascii_case(TOP_LEVEL_LABEL) => {
                product.parent_id = None;
                None
            }
            Some(label) => {
                product.parent_id = None;
                Some(label)
            }
        };

        let entry = PendingProduct {
            product,
            pending_parent,
            origin,
            row: row_no,
        };
        match target {
            Target::Pending(i) => {
                pending[i] = entry;
                report.updated += 1;
            }
            Target::Existing(_) => {
                pending.push(entry);
                report.updated += 1;
            }
            Target::New => {
                pending.push(entry);
                report.created += 1;
            }
        }
    }

    // Pass 2: resolve parent names
    let imported: HashSet<String> = pending.iter().map(|p| p.product.id.clone()).collect();
    let untouched: Vec<&Product> = existing
        .iter()
        .filter(|p| !imported.contains(&p.id))
        .collect();

    let mut top_level: HashSet<String> = untouched
        .iter()
        .filter(|p| p.is_category())
        .map(|p| p.id.clone())
        .collect();
    top_level.extend(
        pending
            .iter()
            .filter(|p| p.pending_parent.is_none() && p.product.is_category())
            .map(|p| p.product.id.clone()),
    );

    // Imported names shadow stored names
    let mut by_name: HashMap<String, String> = untouched
        .iter()
        .map(|p| (natural_key(&p.name), p.id.clone()))
        .collect();
    for p in &pending {
        by_name.insert(natural_key(&p.product.name), p.product.id.clone());
    }

    let has_stored_children: HashSet<&str> = untouched
        .iter()
        .filter_map(|p| p.parent_id.as_deref())
        .collect();

    for entry in &mut pending {
        let row_no = entry.row;

        if let Some(label) = entry.pending_parent.take() {
            let resolved = by_name.get(&natural_key(&label));
            let problem = match resolved {
                None => Some(format!("parent category '{}' not found", label)),
                Some(id) if *id == entry.product.id => {
                    Some("a product cannot be its own parent".to_string())
                }
                Some(id) if !top_level.contains(id) => {
                    Some(format!("'{}' is not a top-level category", label))
                }
                Some(_) if has_stored_children.contains(entry.product.id.as_str()) => {
                    Some(format!("'{}' has products of its own", entry.product.name))
                }
                Some(_) => None,
            };

            match problem {
                Some(message) => report.warn(row_no, format!("{}, imported as top level", message)),
                None => entry.product.parent_id = resolved.cloned(),
            }
        } else if let Some(kept) = entry.product.parent_id.clone() {
            if !top_level.contains(&kept) {
                report.warn(row_no, "stored parent is no longer a top-level category, imported as top level");
                entry.product.parent_id = None;
            }
        }
    }

    // Merge by id
    let mut updated: HashMap<String, Product> = HashMap::new();
    let mut created = Vec::new();
    for entry in pending {
        match entry.origin {
            Origin::Updated => {
                updated.insert(entry.product.id.clone(), entry.product);
            }
            Origin::Created => created.push(entry.product),
        }
    }

    let mut records: Vec<Product> = existing
        .iter()
        .map(|p| updated.remove(&p.id).unwrap_or_else(|| p.clone()))
        .collect();
    records.extend(created);

    ImportOutcome { records, report }
}

// =============================================================================
// Customer Import
// =============================================================================

/// Reconciles a customer sheet against the directory.
///
/// Rows match by `ID`, then by phone (trimmed, case-insensitive). Rows
/// with a blank phone never match by phone.
pub fn import_customers(
    existing: &[Customer],
    sheet: &[Row],
    now: DateTime<Utc>,
    mut new_id: impl FnMut() -> String,
) -> ImportOutcome<Customer> {
    let mut report = ImportReport::default();
    let mut records: Vec<Customer> = existing.to_vec();

    for (idx, row) in sheet.iter().enumerate() {
        let row_no = idx + 2;

        let name = match text_cell(row, COL_NAME) {
            Some(name) => name,
            None => {
                report.skip(row_no, "missing Name");
                continue;
            }
        };
        let phone = text_cell(row, COL_PHONE);
        if let Err(e) = validate_name(&name).and_then(|_| validate_phone(phone.as_deref().unwrap_or(""))) {
            report.skip(row_no, e.to_string());
            continue;
        }

        let supplied_id = text_cell(row, COL_ID);
        let position = supplied_id
            .as_deref()
            .and_then(|id| records.iter().position(|c| c.id == id))
            .or_else(|| {
                let key = natural_key(phone.as_deref()?);
                records
                    .iter()
                    .position(|c| !c.phone.trim().is_empty() && natural_key(&c.phone) == key)
            });

        match position {
            Some(i) => {
                let customer = &mut records[i];
                customer.name = name;
                if let Some(phone) = phone {
                    customer.phone = phone;
                }
                if let Some(address) = text_cell(row, COL_ADDRESS) {
                    customer.address = address;
                }
                report.updated += 1;
            }
            None => {
                let id = supplied_id.unwrap_or_else(&mut new_id);
                let created_at = date_cell(row, COL_CREATED_AT).unwrap_or(now);
                let draft = CustomerDraft {
                    name,
                    phone: phone.unwrap_or_default(),
                    address: text_cell(row, COL_ADDRESS).unwrap_or_default(),
                };
                records.push(Customer::from_draft(id, draft, created_at));
                report.created += 1;
            }
        }
    }

    ImportOutcome { records, report }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, parent: Option<&str>, stock: i64) -> Product {
        let draft = ProductDraft {
            name: name.into(),
            parent_id: parent.map(str::to_string),
            price: Money::from_cents(9000),
            stock,
            min_stock: 2,
            unit: "kg".into(),
        };
        Product::from_draft(id.into(), draft, Utc::now())
    }

    fn ids() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("gen-{}", n)
        }
    }

    fn rows(value: Value) -> Sheet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_sheet_rejects_garbage() {
        assert!(matches!(
            parse_sheet(b"not json"),
            Err(CoreError::MalformedInterchangeFile(_))
        ));
        assert!(matches!(
            parse_sheet(b"[]"),
            Err(CoreError::MalformedInterchangeFile(_))
        ));
        assert!(matches!(
            parse_sheet(b"[1, 2]"),
            Err(CoreError::MalformedInterchangeFile(_))
        ));
        assert_eq!(parse_sheet(br#"[{"Name":"Rice"}]"#).unwrap().len(), 1);
    }

    #[test]
    fn test_products_sheet_columns_and_parent_label() {
        let catalog = vec![
            product("cat", "Grains", None, 0),
            product("p1", "Rice", Some("cat"), 7),
        ];
        let sheet = products_to_sheet(&catalog);

        let labels: Vec<&str> = sheet[1].keys().map(String::as_str).collect();
        assert_eq!(
            labels,
            vec!["ID", "Name", "Parent Category", "Price", "Stock", "Min Stock", "Unit", "Created At"]
        );
        assert_eq!(sheet[0][COL_PARENT], TOP_LEVEL_LABEL);
        assert_eq!(sheet[1][COL_PARENT], "Grains");
        assert_eq!(sheet[1][COL_PRICE], 90.0);
    }

    #[test]
    fn test_round_trip_into_empty_catalog() {
        let catalog = vec![
            product("cat", "Grains", None, 0),
            product("p1", "Rice", Some("cat"), 7),
        ];
        let bytes = write_sheet(&products_to_sheet(&catalog)).unwrap();
        let sheet = parse_sheet(&bytes).unwrap();

        let outcome = import_products(&[], &sheet, Utc::now(), ids());
        assert_eq!(outcome.report.created, 2);
        assert!(outcome.report.warnings.is_empty());

        let rice = outcome.records.iter().find(|p| p.name == "Rice").unwrap();
        assert_eq!(rice.id, "p1");
        assert_eq!(rice.parent_id.as_deref(), Some("cat"));
        assert_eq!(rice.price.cents(), 9000);
        assert_eq!(rice.stock(), 7);
        assert_eq!(rice.min_stock, 2);
        assert_eq!(rice.created_at.timestamp(), catalog[1].created_at.timestamp());
    }

    #[test]
    fn test_unresolved_parent_is_demoted_with_warning() {
        let sheet = rows(json!([
            { "Name": "Widget", "Parent Category": "Nonexistent", "Price": 5 }
        ]));
        let outcome = import_products(&[], &sheet, Utc::now(), ids());

        assert_eq!(outcome.report.created, 1);
        assert_eq!(outcome.report.warnings.len(), 1);
        assert_eq!(outcome.report.warnings[0].row, 2);
        assert!(outcome.report.warnings[0].message.contains("Nonexistent"));
        assert!(outcome.records[0].is_category());
        assert_eq!(outcome.records[0].id, "gen-1");
    }

    #[test]
    fn test_parent_resolves_to_imported_name_first() {
        let existing = vec![product("old", "Snacks", None, 0)];
        let sheet = rows(json!([
            { "Name": "Chips", "Parent Category": "snacks" },
            { "Name": "Dairy" },
            { "Name": "Milk", "Parent Category": "Dairy" }
        ]));
        let outcome = import_products(&existing, &sheet, Utc::now(), ids());

        let find = |n: &str| outcome.records.iter().find(|p| p.name == n).unwrap().clone();
        assert_eq!(find("Chips").parent_id.as_deref(), Some("old"));
        assert_eq!(find("Milk").parent_id, Some(find("Dairy").id));
        assert_eq!(outcome.records.len(), 4);
    }

    #[test]
    fn test_parent_that_is_not_top_level_is_rejected() {
        let sheet = rows(json!([
            { "Name": "Grains" },
            { "Name": "Rice", "Parent Category": "Grains" },
            { "Name": "Brown Rice", "Parent Category": "Rice" }
        ]));
        let outcome = import_products(&[], &sheet, Utc::now(), ids());

        let brown = outcome.records.iter().find(|p| p.name == "Brown Rice").unwrap();
        assert!(brown.is_category());
        assert_eq!(outcome.report.warnings.len(), 1);
        assert_eq!(outcome.report.warnings[0].row, 4);
    }

    #[test]
    fn test_match_by_name_keeps_blank_fields() {
        let existing = vec![product("p1", "Rice", None, 7)];
        let sheet = rows(json!([{ "Name": " rice ", "Price": "95.50", "Stock": "" }]));
        let outcome = import_products(&existing, &sheet, Utc::now(), ids());

        assert_eq!(outcome.report.updated, 1);
        assert_eq!(outcome.records.len(), 1);
        let rice = &outcome.records[0];
        assert_eq!(rice.id, "p1");
        assert_eq!(rice.name, "rice");
        assert_eq!(rice.price.cents(), 9550);
        assert_eq!(rice.stock(), 7);
        assert_eq!(rice.unit, "kg");
    }

    #[test]
    fn test_bad_numbers_and_missing_names() {
        let sheet = rows(json!([
            { "Name": "", "Price": 3 },
            { "Name": "Salt", "Price": "cheap", "Stock": -4 }
        ]));
        let outcome = import_products(&[], &sheet, Utc::now(), ids());

        assert_eq!(outcome.report.skipped, 1);
        assert_eq!(outcome.report.created, 1);
        assert_eq!(outcome.report.warnings.len(), 3);
        let salt = &outcome.records[0];
        assert_eq!(salt.price, Money::zero());
        assert_eq!(salt.stock(), 0);
    }

    #[test]
    fn test_customer_import_matches_by_phone() {
        let existing = vec![Customer::from_draft(
            "c-1".into(),
            CustomerDraft {
                name: "Asha".into(),
                phone: "98765".into(),
                address: "Old Street".into(),
            },
            Utc::now(),
        )];
        let sheet = rows(json!([
            { "Name": "Asha Verma", "Phone": " 98765 " },
            { "Name": "Ravi", "Phone": 12345 },
            { "Phone": "555" }
        ]));
        let outcome = import_customers(&existing, &sheet, Utc::now(), ids());

        assert_eq!(outcome.report.updated, 1);
        assert_eq!(outcome.report.created, 1);
        assert_eq!(outcome.report.skipped, 1);
        assert_eq!(outcome.records[0].name, "Asha Verma");
        assert_eq!(outcome.records[0].address, "Old Street");
        assert_eq!(outcome.records[1].phone, "12345");
    }

    #[test]
    fn test_bills_ledger_layout() {
        use crate::billing::stage_bill;
        use crate::types::{BillDraft, BillLine, InvoiceNumber, Percent};

        let mut catalog = vec![product("p1", "Rice", Some("cat"), 7)];
        let customer = Customer::from_draft(
            "c-1".into(),
            CustomerDraft {
                name: "Asha".into(),
                ..Default::default()
            },
            Utc::now(),
        );
        let draft = BillDraft {
            customer_id: "c-1".into(),
            lines: vec![BillLine {
                product_id: "p1".into(),
                quantity: 2,
                price: None,
            }],
            discount_percent: Percent::zero(),
            tax_percent: Percent::from_bps(1800),
        };
        let bill = stage_bill(&mut catalog, &draft)
            .unwrap()
            .into_bill("b-1".into(), InvoiceNumber::new(1001), &customer, Utc::now());

        let sheet = bills_to_sheet(&[bill]);
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet[0][COL_INVOICE_NO], "INV-1001");
        assert_eq!(sheet[0][COL_GST_PCT], 18.0);
        assert_eq!(sheet[1][COL_PRODUCT], "Rice");
        assert_eq!(sheet[1][COL_ITEM_TOTAL], 180.0);
        assert!(sheet[2].is_empty());
    }
}
