//! # Transaction Coordinator
//!
//! Drives one register through "load product → add to cart → purchase".
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       TransactionCoordinator                            │
//! │                                                                         │
//! │  load_by_code(code) ──┐                                                 │
//! │                       ├──► PosBackend::lookup ──► ProductLoaded         │
//! │  load_by_scan() ──────┘    (decoded text)     └─► ProductNotFound       │
//! │     │                                                                   │
//! │     └─ ScanSession open → one decode → close (every exit path)          │
//! │                                                                         │
//! │  add_loaded_product_to_cart() ──► Cart::add_product, slot cleared       │
//! │                                                                         │
//! │  submit_purchase() ──► PurchaseRequest ──► PosBackend::submit_purchase  │
//! │     success:true  ──► cart cleared, Purchased{backend totals}           │
//! │     otherwise     ──► cart untouched, Error{message}                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Operation At A Time
//! Lookups, scans and submissions hold a busy flag for their whole
//! duration. A second trigger while one is pending is ignored: it returns
//! `RegisterError::Busy` and changes nothing. Adds and resets are refused
//! the same way so the cart can never change under a pending submission.
//!
//! The internal lock is never held across an `.await`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use regi_client::{ApiClient, LookupOutcome, PosBackend, PurchaseRequest};
use regi_core::validation::{validate_product_code, validate_purchasable};
use regi_core::{Cart, CartTotals, TaxRate, DEFAULT_TAX_RATE_BPS};
use regi_scan::{Camera, DecodeOptions, ScanError, ScanSession, ScanState};
use tracing::{debug, error, info, warn};

use crate::config::RegisterConfig;
use crate::error::{RegisterError, RegisterResult};
use crate::state::{PurchaseReceipt, TransactionState};

// =============================================================================
// Options
// =============================================================================

/// Per-register settings the coordinator needs at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorOptions {
    /// Sent as `emp_cd` with every purchase.
    pub employee_code: Option<String>,

    /// Rate for the advisory client-side totals.
    pub tax_rate: TaxRate,

    pub decode_options: DecodeOptions,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        CoordinatorOptions {
            employee_code: None,
            tax_rate: TaxRate::from_bps(DEFAULT_TAX_RATE_BPS),
            decode_options: DecodeOptions::default(),
        }
    }
}

// =============================================================================
// Coordinator
// =============================================================================

#[derive(Debug, Default)]
struct Inner {
    cart: Cart,
    state: TransactionState,
    code_input: String,
}

/// Releases the busy flag when dropped, on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates lookup, cart and purchase for one register.
///
/// Share it behind an `Arc`: every operation takes `&self`, so a UI can
/// call `cancel_scan` while `load_by_scan` is pending.
pub struct TransactionCoordinator {
    backend: Arc<dyn PosBackend>,
    camera: Arc<dyn Camera>,
    options: CoordinatorOptions,
    inner: Mutex<Inner>,
    busy: AtomicBool,
    active_scan: Mutex<Option<Arc<ScanSession>>>,
}

impl TransactionCoordinator {
    pub fn new(
        backend: Arc<dyn PosBackend>,
        camera: Arc<dyn Camera>,
        options: CoordinatorOptions,
    ) -> Self {
        TransactionCoordinator {
            backend,
            camera,
            options,
            inner: Mutex::new(Inner::default()),
            busy: AtomicBool::new(false),
            active_scan: Mutex::new(None),
        }
    }

    /// Builds a coordinator backed by the HTTP client.
    ///
    /// ## Errors
    /// `InvalidConfig` if the backend URL or timeouts are unusable.
    pub fn from_config(config: &RegisterConfig, camera: Arc<dyn Camera>) -> RegisterResult<Self> {
        let client = ApiClient::new(&config.client_config())?;
        info!(base_url = %client.base_url(), "Register backend configured");

        Ok(Self::new(
            Arc::new(client),
            camera,
            config.coordinator_options(),
        ))
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Looks a product up by code.
    ///
    /// `NotFound` is returned as `Ok`: it is an expected answer with its own
    /// display state. On success the code field is set to the catalog's
    /// canonical code.
    pub async fn load_by_code(&self, code: &str) -> RegisterResult<LookupOutcome> {
        let _busy = self.begin("load_by_code")?;
        self.lookup_and_apply(code).await
    }

    /// Scans one code with the camera and looks it up.
    ///
    /// Returns `Ok(None)` when the scan was cancelled before anything was
    /// decoded. The scan session is closed before returning, whatever the
    /// outcome.
    pub async fn load_by_scan(&self) -> RegisterResult<Option<LookupOutcome>> {
        let session = Arc::new(ScanSession::new(
            self.camera.clone(),
            self.options.decode_options.clone(),
        ));

        // Claimed and published under one lock: once busy, a cancel_scan
        // always finds the session.
        let _busy = {
            let mut slot = self.scan_slot();
            let busy = self.begin("load_by_scan")?;
            *slot = Some(session.clone());
            busy
        };

        let result = match session.open() {
            Some(pending) => self.apply_scan(pending.await).await,
            None => {
                debug!(session_id = %session.id(), "Scan cancelled before the camera opened");
                Ok(None)
            }
        };

        session.close().await;
        *self.scan_slot() = None;
        debug!(session_id = %session.id(), "Scan session finished");

        result
    }

    /// Closes the scanner mid-scan. No-op when no scan is running.
    pub async fn cancel_scan(&self) {
        let session = self.scan_slot().clone();
        match session {
            Some(session) => {
                info!(session_id = %session.id(), "Cancelling scan");
                session.close().await;
            }
            None => debug!("No scan to cancel"),
        }
    }

    async fn apply_scan(
        &self,
        scanned: Result<String, ScanError>,
    ) -> RegisterResult<Option<LookupOutcome>> {
        match scanned {
            Ok(text) => self.lookup_and_apply(&text).await.map(Some),
            Err(ScanError::Cancelled) => {
                debug!("Scan cancelled before a code was decoded");
                Ok(None)
            }
            Err(e) => {
                let err = RegisterError::Camera(e);
                self.fail(&err);
                Err(err)
            }
        }
    }

    async fn lookup_and_apply(&self, code: &str) -> RegisterResult<LookupOutcome> {
        let code = match validate_product_code(code) {
            Ok(code) => code,
            Err(e) => {
                let err = RegisterError::from(e);
                self.fail(&err);
                return Err(err);
            }
        };

        self.with_inner(|inner| {
            inner.code_input = code.to_string();
            inner.state = TransactionState::Loading {
                code: code.to_string(),
            };
        });
        debug!(code = %code, "Product lookup started");

        let outcome = match self.backend.lookup(code).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let err = RegisterError::from(e);
                self.fail(&err);
                return Err(err);
            }
        };

        self.with_inner(|inner| match &outcome {
            LookupOutcome::Found(product) => {
                info!(code = %product.code, product_id = product.id, "Product loaded");
                inner.code_input = product.code.clone();
                inner.state = TransactionState::ProductLoaded {
                    product: product.clone(),
                };
            }
            LookupOutcome::NotFound { code } => {
                info!(code = %code, "Product master data missing");
                inner.state = TransactionState::ProductNotFound { code: code.clone() };
            }
        });

        Ok(outcome)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds the loaded product to the cart and empties the loaded slot.
    ///
    /// Returns `Ok(None)` without touching anything when no product is
    /// loaded.
    pub fn add_loaded_product_to_cart(&self) -> RegisterResult<Option<Cart>> {
        let _busy = self.begin("add_loaded_product_to_cart")?;

        let added = self.with_inner(|inner| -> RegisterResult<Option<Cart>> {
            let Some(product) = inner.state.loaded_product().cloned() else {
                debug!("Add ignored: no product loaded");
                return Ok(None);
            };

            let cart = inner.cart.add_product(&product)?;
            inner.cart = cart.clone();
            inner.state = TransactionState::Idle;
            inner.code_input.clear();

            info!(
                code = %product.code,
                items = cart.item_count(),
                total = %cart.total(),
                "Product added to cart"
            );
            Ok(Some(cart))
        });

        added.inspect_err(|e| self.fail(e))
    }

    // =========================================================================
    // Purchase
    // =========================================================================

    /// Submits the cart.
    ///
    /// An empty cart fails with `EmptyCart` before any network call. The
    /// cart is cleared only when the backend answers `success: true`;
    /// rejections and transport failures leave it exactly as it was.
    pub async fn submit_purchase(&self) -> RegisterResult<PurchaseReceipt> {
        let _busy = self.begin("submit_purchase")?;

        let cart = self.cart();
        if let Err(e) = validate_purchasable(&cart) {
            let err = RegisterError::from(e);
            self.fail(&err);
            return Err(err);
        }

        let request = PurchaseRequest::from_cart(&cart, self.options.employee_code.clone());
        self.with_inner(|inner| inner.state = TransactionState::Submitting);
        debug!(items = request.items.len(), "Submitting purchase");

        let response = match self.backend.submit_purchase(&request).await {
            Ok(response) => response,
            Err(e) => {
                let err = RegisterError::from(e);
                self.fail(&err);
                return Err(err);
            }
        };

        if !response.success {
            warn!(trade_id = ?response.trd_id, "Purchase rejected, cart kept");
            let err = RegisterError::PurchaseRejected {
                trade_id: response.trd_id,
            };
            self.fail(&err);
            return Err(err);
        }

        if response.total_amt.is_none() || response.total_amt_ex_tax.is_none() {
            warn!(trade_id = ?response.trd_id, "Purchase accepted without totals");
        }

        let receipt = PurchaseReceipt {
            trade_id: response.trd_id,
            total_with_tax: response.total_amt,
            total_ex_tax: response.total_amt_ex_tax,
            items: cart.items().to_vec(),
            completed_at: Utc::now(),
        };

        self.with_inner(|inner| {
            inner.cart = inner.cart.clear();
            inner.code_input.clear();
            inner.state = TransactionState::Purchased {
                receipt: receipt.clone(),
            };
        });

        info!(
            trade_id = ?receipt.trade_id,
            total = ?receipt.total_with_tax.map(|m| m.minor()),
            items = receipt.items.len(),
            "Purchase completed"
        );

        Ok(receipt)
    }

    /// Starts a fresh transaction: empty cart, nothing loaded.
    pub fn reset(&self) -> RegisterResult<()> {
        let _busy = self.begin("reset")?;

        self.with_inner(|inner| {
            inner.cart = inner.cart.clear();
            inner.code_input.clear();
            inner.state = TransactionState::Idle;
        });
        info!("Transaction reset");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Snapshot of the cart.
    pub fn cart(&self) -> Cart {
        self.with_inner(|inner| inner.cart.clone())
    }

    pub fn state(&self) -> TransactionState {
        self.with_inner(|inner| inner.state.clone())
    }

    /// The code field as the operator sees it.
    pub fn code_input(&self) -> String {
        self.with_inner(|inner| inner.code_input.clone())
    }

    pub fn set_code_input(&self, code: impl Into<String>) {
        let code = code.into();
        self.with_inner(|inner| inner.code_input = code);
    }

    /// Advisory totals at the configured tax rate. The receipt uses the
    /// backend's totals instead.
    pub fn totals(&self) -> CartTotals {
        let rate = self.options.tax_rate;
        self.with_inner(|inner| inner.cart.totals(rate))
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.options.tax_rate
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// State of the running scan session, if any.
    pub fn scan_state(&self) -> Option<ScanState> {
        self.scan_slot().as_ref().map(|session| session.state())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn begin(&self, operation: &'static str) -> RegisterResult<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(operation, "Ignoring trigger while another operation is in flight");
            return Err(RegisterError::Busy);
        }
        debug!(operation, "Operation started");
        Ok(BusyGuard(&self.busy))
    }

    /// Surfaces an error in the transaction state. The cart is not touched.
    ///
    /// Validation errors are returned to the caller only: a loaded product
    /// or a receipt on screen survives a blank code or an empty-cart submit.
    fn fail(&self, err: &RegisterError) {
        match err {
            RegisterError::Validation(_) => {
                debug!(error = %err, "Input rejected, state kept");
                return;
            }
            RegisterError::Transport { .. } => error!(error = %err, "Backend request failed"),
            _ => warn!(error = %err, "Operation failed"),
        }

        self.with_inner(|inner| {
            inner.state = TransactionState::Error {
                message: err.user_message(),
                retryable: err.is_retryable(),
            };
        });
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut inner)
    }

    fn scan_slot(&self) -> MutexGuard<'_, Option<Arc<ScanSession>>> {
        self.active_scan
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for TransactionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCoordinator")
            .field("options", &self.options)
            .field("state", &self.state())
            .field("busy", &self.is_busy())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
