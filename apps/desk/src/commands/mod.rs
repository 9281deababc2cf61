//! # Commands Module
//!
//! Every operation the front end can ask for, as one named [`Command`].
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (Command enum, bus, worker)
//! ├── product.rs      ◄─── Catalog CRUD, stock, low-stock
//! ├── customer.rs     ◄─── Directory CRUD and search
//! ├── bill.rs         ◄─── Billing engine and invoice numbers
//! ├── cart.rs         ◄─── Cart manipulation and checkout
//! ├── interchange.rs  ◄─── Sheet import/export files
//! └── config.rs       ◄─── Configuration retrieval
//! ```
//!
//! ## How Commands Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Bus                                          │
//! │                                                                         │
//! │  Caller (stdio line, key binding, test)                                 │
//! │  {"command":"adjustStock","id":"...","delta":-5}                        │
//! │         │                                                               │
//! │         │ serde (tag = "command")                                       │
//! │         ▼                                                               │
//! │  CommandBus::send(Command::AdjustStock { .. })                          │
//! │         │                                                               │
//! │         │ mpsc (bounded)                                                │
//! │         ▼                                                               │
//! │  Worker: one command at a time                                          │
//! │    execute() ──► product::adjust_stock(&db, id, delta)                  │
//! │         │                                                               │
//! │         │ oneshot                                                       │
//! │         ▼                                                               │
//! │  Result<serde_json::Value, ApiError>                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The worker is the only place commands run, so two bills can never
//! validate against the same stock level.

pub mod bill;
pub mod cart;
pub mod config;
pub mod customer;
pub mod interchange;
pub mod product;

use std::path::PathBuf;

use billbook_core::{
    BillDraft, BillUpdate, CustomerDraft, CustomerUpdate, ProductDraft, ProductUpdate,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{CartState, ConfigState, DbState};

/// Pending requests before `send` waits.
const BUS_CAPACITY: usize = 64;

/// A named operation.
///
/// ## Wire Format
/// ```json
/// {"command": "listProducts"}
/// {"command": "addProduct", "name": "Rice", "price": 9000, "stock": 10}
/// {"command": "adjustStock", "id": "6f1c...", "delta": -5}
/// {"command": "addToCart", "productId": "6f1c...", "quantity": 2}
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    // Catalog
    ListProducts,
    GetProduct { id: String },
    SearchProducts { query: String },
    AddProduct(ProductDraft),
    UpdateProduct { id: String, update: ProductUpdate },
    DeleteProduct { id: String },
    AdjustStock { id: String, delta: i64 },
    LowStock,
    ListCategories,
    ListChildren { parent_id: String },

    // Directory
    ListCustomers,
    AddCustomer(CustomerDraft),
    UpdateCustomer { id: String, update: CustomerUpdate },
    DeleteCustomer { id: String },
    SearchCustomers { query: String },
    FindCustomerByPhone { phone: String },

    // Billing
    CreateBill(BillDraft),
    DeleteBill { id: String },
    ListBills,
    GetBill { id: String },
    GetBillsByCustomer { customer_id: String },
    UpdateBill { id: String, update: BillUpdate },
    NextInvoiceNumber,
    PeekInvoiceNumber,

    // Interchange
    ExportProducts { path: PathBuf },
    ImportProducts { path: PathBuf },
    ExportCustomers { path: PathBuf },
    ImportCustomers { path: PathBuf },
    ExportBills { path: PathBuf },

    // Cart
    GetCart,
    AddToCart {
        product_id: String,
        #[serde(default)]
        quantity: Option<i64>,
    },
    UpdateCartItem { product_id: String, quantity: i64 },
    RemoveFromCart { product_id: String },
    ClearCart,
    SetCartCustomer {
        #[serde(default)]
        customer_id: Option<String>,
    },
    SetCartDiscount { percent: f64 },
    SetCartTax { percent: f64 },
    CheckoutCart,

    GetConfig,
}

impl Command {
    /// Wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ListProducts => "listProducts",
            Command::GetProduct { .. } => "getProduct",
            Command::SearchProducts { .. } => "searchProducts",
            Command::AddProduct(_) => "addProduct",
            Command::UpdateProduct { .. } => "updateProduct",
            Command::DeleteProduct { .. } => "deleteProduct",
            Command::AdjustStock { .. } => "adjustStock",
            Command::LowStock => "lowStock",
            Command::ListCategories => "listCategories",
            Command::ListChildren { .. } => "listChildren",
            Command::ListCustomers => "listCustomers",
            Command::AddCustomer(_) => "addCustomer",
            Command::UpdateCustomer { .. } => "updateCustomer",
            Command::DeleteCustomer { .. } => "deleteCustomer",
            Command::SearchCustomers { .. } => "searchCustomers",
            Command::FindCustomerByPhone { .. } => "findCustomerByPhone",
            Command::CreateBill(_) => "createBill",
            Command::DeleteBill { .. } => "deleteBill",
            Command::ListBills => "listBills",
            Command::GetBill { .. } => "getBill",
            Command::GetBillsByCustomer { .. } => "getBillsByCustomer",
            Command::UpdateBill { .. } => "updateBill",
            Command::NextInvoiceNumber => "nextInvoiceNumber",
            Command::PeekInvoiceNumber => "peekInvoiceNumber",
            Command::ExportProducts { .. } => "exportProducts",
            Command::ImportProducts { .. } => "importProducts",
            Command::ExportCustomers { .. } => "exportCustomers",
            Command::ImportCustomers { .. } => "importCustomers",
            Command::ExportBills { .. } => "exportBills",
            Command::GetCart => "getCart",
            Command::AddToCart { .. } => "addToCart",
            Command::UpdateCartItem { .. } => "updateCartItem",
            Command::RemoveFromCart { .. } => "removeFromCart",
            Command::ClearCart => "clearCart",
            Command::SetCartCustomer { .. } => "setCartCustomer",
            Command::SetCartDiscount { .. } => "setCartDiscount",
            Command::SetCartTax { .. } => "setCartTax",
            Command::CheckoutCart => "checkoutCart",
            Command::GetConfig => "getConfig",
        }
    }
}

/// State the worker hands to command functions.
#[derive(Debug, Clone)]
pub struct WorkerState {
    pub db: DbState,
    pub cart: CartState,
    pub config: ConfigState,
}

/// Runs one command.
pub async fn execute(state: &WorkerState, command: Command) -> Result<Value, ApiError> {
    let WorkerState { db, cart, config } = state;

    match command {
        Command::ListProducts => reply(product::list_products(db).await?),
        Command::GetProduct { id } => reply(product::get_product(db, &id).await?),
        Command::SearchProducts { query } => reply(product::search_products(db, &query).await?),
        Command::AddProduct(draft) => reply(product::add_product(db, draft).await?),
        Command::UpdateProduct { id, update } => {
            reply(product::update_product(db, &id, update).await?)
        }
        Command::DeleteProduct { id } => reply(product::delete_product(db, &id).await?),
        Command::AdjustStock { id, delta } => reply(product::adjust_stock(db, &id, delta).await?),
        Command::LowStock => reply(product::low_stock(db).await?),
        Command::ListCategories => reply(product::list_categories(db).await?),
        Command::ListChildren { parent_id } => {
            reply(product::list_children(db, &parent_id).await?)
        }

        Command::ListCustomers => reply(customer::list_customers(db).await?),
        Command::AddCustomer(draft) => reply(customer::add_customer(db, draft).await?),
        Command::UpdateCustomer { id, update } => {
            reply(customer::update_customer(db, &id, update).await?)
        }
        Command::DeleteCustomer { id } => reply(customer::delete_customer(db, &id).await?),
        Command::SearchCustomers { query } => {
            reply(customer::search_customers(db, &query).await?)
        }
        Command::FindCustomerByPhone { phone } => {
            reply(customer::find_customer_by_phone(db, &phone).await?)
        }

        Command::CreateBill(draft) => reply(bill::create_bill(db, draft).await?),
        Command::DeleteBill { id } => reply(bill::delete_bill(db, &id).await?),
        Command::ListBills => reply(bill::list_bills(db).await?),
        Command::GetBill { id } => reply(bill::get_bill(db, &id).await?),
        Command::GetBillsByCustomer { customer_id } => {
            reply(bill::get_bills_by_customer(db, &customer_id).await?)
        }
        Command::UpdateBill { id, update } => reply(bill::update_bill(db, &id, update).await?),
        Command::NextInvoiceNumber => reply(bill::next_invoice_number(db).await?),
        Command::PeekInvoiceNumber => reply(bill::peek_invoice_number(db).await?),

        Command::ExportProducts { path } => reply(interchange::export_products(db, &path).await?),
        Command::ImportProducts { path } => reply(interchange::import_products(db, &path).await?),
        Command::ExportCustomers { path } => {
            reply(interchange::export_customers(db, &path).await?)
        }
        Command::ImportCustomers { path } => {
            reply(interchange::import_customers(db, &path).await?)
        }
        Command::ExportBills { path } => reply(interchange::export_bills(db, &path).await?),

        Command::GetCart => reply(cart::get_cart(cart)?),
        Command::AddToCart {
            product_id,
            quantity,
        } => reply(cart::add_to_cart(db, cart, &product_id, quantity).await?),
        Command::UpdateCartItem {
            product_id,
            quantity,
        } => reply(cart::update_cart_item(cart, &product_id, quantity)?),
        Command::RemoveFromCart { product_id } => reply(cart::remove_from_cart(cart, &product_id)?),
        Command::ClearCart => reply(cart::clear_cart(cart)?),
        Command::SetCartCustomer { customer_id } => {
            reply(cart::set_cart_customer(db, cart, customer_id).await?)
        }
        Command::SetCartDiscount { percent } => reply(cart::set_cart_discount(cart, percent)?),
        Command::SetCartTax { percent } => reply(cart::set_cart_tax(cart, percent)?),
        Command::CheckoutCart => reply(cart::checkout_cart(db, cart).await?),

        Command::GetConfig => reply(config::get_config(config)),
    }
}

fn reply<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("Failed to encode reply: {}", e)))
}

// =============================================================================
// Bus
// =============================================================================

struct Request {
    command: Command,
    reply_tx: oneshot::Sender<Result<Value, ApiError>>,
}

/// Sending side of the command bus. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CommandBus {
    tx: mpsc::Sender<Request>,
}

impl CommandBus {
    /// Spawns the worker. It stops once every `CommandBus` clone is dropped.
    pub fn spawn(state: WorkerState) -> (CommandBus, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(BUS_CAPACITY);
        let worker = tokio::spawn(run_worker(state, rx));
        (CommandBus { tx }, worker)
    }

    /// Sends a command and waits for its result.
    pub async fn send(&self, command: Command) -> Result<Value, ApiError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(Request { command, reply_tx })
            .await
            .map_err(|_| ApiError::internal("Command worker has stopped"))?;

        reply_rx
            .await
            .map_err(|_| ApiError::internal("Command worker dropped the request"))?
    }
}

async fn run_worker(state: WorkerState, mut rx: mpsc::Receiver<Request>) {
    info!("Command worker starting");

    while let Some(Request { command, reply_tx }) = rx.recv().await {
        let name = command.name();
        debug!(command = name, "Executing command");

        let result = execute(&state, command).await;
        if let Err(e) = &result {
            debug!(command = name, code = ?e.code, "Command failed");
        }

        // The caller may have given up waiting.
        let _ = reply_tx.send(result);
    }

    info!("Command worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use billbook_db::{Database, DbConfig};
    use serde_json::json;

    async fn state() -> WorkerState {
        WorkerState {
            db: DbState::new(Database::new(DbConfig::in_memory()).await.unwrap()),
            cart: CartState::default(),
            config: ConfigState::default(),
        }
    }

    fn command(value: Value) -> Command {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_wire_format() {
        assert!(matches!(
            command(json!({"command": "listProducts"})),
            Command::ListProducts
        ));
        assert!(matches!(
            command(json!({"command": "adjustStock", "id": "p-1", "delta": -5})),
            Command::AdjustStock { delta: -5, .. }
        ));
        assert!(matches!(
            command(json!({"command": "addToCart", "productId": "p-1"})),
            Command::AddToCart { quantity: None, .. }
        ));
        assert!(matches!(
            command(json!({"command": "listChildren", "parentId": "c-1"})),
            Command::ListChildren { parent_id } if parent_id == "c-1"
        ));
        assert!(matches!(
            command(json!({"command": "findCustomerByPhone", "phone": "98765"})),
            Command::FindCustomerByPhone { .. }
        ));
        match command(json!({"command": "addProduct", "name": "Rice", "price": 9000})) {
            Command::AddProduct(draft) => {
                assert_eq!(draft.name, "Rice");
                assert_eq!(draft.price.cents(), 9000);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(serde_json::from_value::<Command>(json!({"command": "launchRocket"})).is_err());
    }

    #[tokio::test]
    async fn test_bus_dispatches_in_order() {
        let (bus, worker) = CommandBus::spawn(state().await);

        let added = bus
            .send(command(json!({
                "command": "addProduct",
                "name": "Soap",
                "price": 4000,
                "stock": 10
            })))
            .await
            .unwrap();
        let id = added["id"].as_str().unwrap().to_string();

        let adjusted = bus
            .send(command(json!({"command": "adjustStock", "id": id, "delta": -5})))
            .await
            .unwrap();
        assert_eq!(adjusted["stock"], 5);

        let err = bus
            .send(command(json!({"command": "adjustStock", "id": id, "delta": -10})))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let peek = bus.send(Command::PeekInvoiceNumber).await.unwrap();
        assert_eq!(peek["invoiceNumber"], "INV-1001");

        drop(bus);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_cart_quantity_keeps_worker_alive() {
        let (bus, worker) = CommandBus::spawn(state().await);

        let added = bus
            .send(command(json!({"command": "addProduct", "name": "Tea", "price": 100})))
            .await
            .unwrap();
        let id = added["id"].as_str().unwrap().to_string();

        let err = bus
            .send(Command::AddToCart {
                product_id: id.clone(),
                quantity: Some(i64::MAX / 2),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        let listed = bus.send(Command::ListProducts).await.unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);
        let cart = bus.send(Command::GetCart).await.unwrap();
        assert_eq!(cart["items"], json!([]));

        drop(bus);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_senders_are_serialized() {
        let h = state().await;
        let product = h
            .db
            .inner()
            .products()
            .add(ProductDraft {
                name: "Salt".into(),
                stock: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        let (bus, _worker) = CommandBus::spawn(h);

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let bus = bus.clone();
            let id = product.id.clone();
            tasks.push(tokio::spawn(async move {
                bus.send(Command::AdjustStock { id, delta: -3 }).await
            }));
        }

        let mut ok = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 3);

        let stored = bus.send(Command::GetProduct { id: product.id }).await.unwrap();
        assert_eq!(stored["stock"], 1);
    }
}
