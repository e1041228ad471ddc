//! API client for communicating with the Fakturo backend REST API.
//!
//! This module provides the `ApiClient` struct, the single choke point for
//! all HTTP traffic: credential attachment, response parsing, error
//! classification, and unauthorized-response escalation all live here.
//! Domain operations are thin typed wrappers with no business logic.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{header, multipart, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::auth::{SessionStore, StoreKey};
use crate::config::Config;
use crate::models::{
    AuthSession, BetaFeedback, BillingPortal, CheckoutSession, Expense, Invoice, InvoiceAnalysis,
    MonthlySummary, NewExpense, NewInvoice, PdfGenerated, PdfTemplate, PlanConfirmation,
    ReceiptAnalysis, ReceiptFile, SummaryQuery,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// PDF rendering and OCR analysis are the slowest endpoints at several
/// seconds each; 30s covers them while still failing fast.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Header carrying the static API key on every request.
const API_KEY_HEADER: &str = "X-Api-Key";

/// Default page size for invoice and expense listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Callback invoked when the backend rejects a request as unauthorized.
/// At most one is registered; the session manager owns it.
pub(crate) type UnauthorizedHandler = Box<dyn Fn(&str) + Send + Sync>;

/// Per-call control over unauthorized escalation. Refresh and logout calls
/// suppress it so a 401 from those endpoints cannot re-trigger the forced
/// logout that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escalation {
    Notify,
    Suppress,
}

/// Request body variants. Multipart bodies omit the JSON content type so the
/// runtime can set the multipart boundary.
enum Payload {
    None,
    Json(serde_json::Value),
    Multipart(multipart::Form),
}

/// API client for the Fakturo backend.
///
/// Holds the in-memory access token (mirrored to the durable store) and the
/// registered unauthorized handler; share it behind an `Arc`.
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    store: Arc<dyn SessionStore>,
    access_token: Mutex<Option<String>>,
    unauthorized_handler: Mutex<Option<UnauthorizedHandler>>,
}

impl ApiClient {
    /// Create a new API client backed by the given durable store.
    pub fn new(config: &Config, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            store,
            access_token: Mutex::new(None),
            unauthorized_handler: Mutex::new(None),
        })
    }

    // =========================================================================
    // Token storage
    // =========================================================================

    /// Replace the in-memory access token and synchronously mirror it to the
    /// durable store. `None` clears both. Store failures are logged; the
    /// in-memory token is authoritative once set.
    pub(crate) fn set_access_token(&self, token: Option<&str>) {
        let mut current = self.access_token.lock().unwrap();
        match token {
            Some(value) => {
                if let Err(e) = self.store.put(StoreKey::AccessToken, value) {
                    warn!(error = %e, "Failed to persist access token");
                }
                *current = Some(value.to_string());
            }
            None => {
                if let Err(e) = self.store.remove(StoreKey::AccessToken) {
                    warn!(error = %e, "Failed to clear persisted access token");
                }
                *current = None;
            }
        }
    }

    /// Current access token, hydrating from the durable store on first
    /// access. Crate-private: the token never leaves the gateway.
    pub(crate) fn access_token(&self) -> Option<String> {
        let mut current = self.access_token.lock().unwrap();
        if current.is_none() {
            match self.store.get(StoreKey::AccessToken) {
                Ok(stored) => *current = stored,
                Err(e) => warn!(error = %e, "Failed to read persisted access token"),
            }
        }
        current.clone()
    }

    // =========================================================================
    // Unauthorized escalation
    // =========================================================================

    /// Register the unauthorized-response handler, replacing any previous
    /// one. `None` unregisters; with no handler escalation is a no-op.
    pub(crate) fn set_unauthorized_handler(&self, handler: Option<UnauthorizedHandler>) {
        *self.unauthorized_handler.lock().unwrap() = handler;
    }

    fn escalate_unauthorized(&self, message: &str) {
        if let Some(handler) = self.unauthorized_handler.lock().unwrap().as_ref() {
            handler(message);
        }
    }

    // =========================================================================
    // Request core
    // =========================================================================

    /// Send a request with credentials attached and classify any failure.
    /// 401/403 responses invoke the registered handler before the error is
    /// returned, unless the call suppresses escalation.
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
        escalation: Escalation,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.client.request(method, &url).header(API_KEY_HEADER, &self.api_key);

        if let Some(token) = self.access_token() {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        request = match payload {
            Payload::None => request.header(header::CONTENT_TYPE, "application/json"),
            Payload::Json(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .json(&body),
            Payload::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status, &body);

        if escalation == Escalation::Notify {
            if let ApiError::Status { status: 401 | 403, ref message } = error {
                self.escalate_unauthorized(message);
            }
        }

        Err(error)
    }

    /// Execute and parse the JSON body. 204/205 and empty bodies resolve to
    /// the type's default value rather than a parse error.
    async fn request<T>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
        escalation: Escalation,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        let response = self.execute(method, endpoint, payload, escalation).await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return Ok(T::default());
        }

        let raw = response.text().await?;
        if raw.is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Execute and discard the body.
    async fn request_empty(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
        escalation: Escalation,
    ) -> Result<(), ApiError> {
        self.execute(method, endpoint, payload, escalation).await?;
        Ok(())
    }

    /// Execute and return the raw body bytes. Used for PDF and receipt
    /// downloads; credential attachment and error classification apply as
    /// for JSON calls, only the body parsing differs.
    async fn request_bytes(&self, endpoint: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .execute(Method::GET, endpoint, Payload::None, Escalation::Notify)
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Register a new account.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        company_name: Option<&str>,
    ) -> Result<AuthSession, ApiError> {
        let mut body = serde_json::json!({ "email": email, "password": password });
        if let Some(name) = company_name {
            body["companyName"] = serde_json::Value::String(name.to_string());
        }
        self.request(Method::POST, "/api/auth/register", Payload::Json(body), Escalation::Notify)
            .await
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.request(Method::POST, "/api/auth/login", Payload::Json(body), Escalation::Notify)
            .await
    }

    /// Exchange a refresh token for a new session. Escalation is suppressed:
    /// a rejected refresh is handled by the session manager itself.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, ApiError> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        self.request(Method::POST, "/api/auth/refresh", Payload::Json(body), Escalation::Suppress)
            .await
    }

    /// Invalidate the session on the backend. Escalation is suppressed so a
    /// logout racing a dead token cannot trigger another forced logout.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.request_empty(Method::POST, "/api/auth/logout", Payload::None, Escalation::Suppress)
            .await
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    /// Create an invoice.
    pub async fn create_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, ApiError> {
        let body = serde_json::to_value(invoice)?;
        self.request(Method::POST, "/api/invoices", Payload::Json(body), Escalation::Notify)
            .await
    }

    /// Fetch a page of invoices.
    pub async fn get_invoices(&self, page: u32, page_size: u32) -> Result<Vec<Invoice>, ApiError> {
        let endpoint = format!("/api/invoices?page={}&pageSize={}", page, page_size);
        self.request(Method::GET, &endpoint, Payload::None, Escalation::Notify)
            .await
    }

    /// Ask the backend to render an invoice PDF, optionally with a specific
    /// template.
    pub async fn generate_invoice_pdf(
        &self,
        id: &str,
        template: Option<PdfTemplate>,
    ) -> Result<PdfGenerated, ApiError> {
        let body = match template {
            Some(template) => serde_json::json!({ "template": template }),
            None => serde_json::json!({}),
        };
        let endpoint = format!("/api/invoices/{}/generate-pdf", id);
        self.request(Method::POST, &endpoint, Payload::Json(body), Escalation::Notify)
            .await
    }

    /// Delete an invoice.
    pub async fn delete_invoice(&self, id: &str) -> Result<(), ApiError> {
        let endpoint = format!("/api/invoices/{}", id);
        self.request_empty(Method::DELETE, &endpoint, Payload::None, Escalation::Notify)
            .await
    }

    /// URL of the rendered PDF for an invoice.
    pub fn invoice_pdf_url(&self, id: &str) -> String {
        format!("{}/api/invoices/{}/pdf", self.base_url, id)
    }

    /// Download the rendered PDF for an invoice.
    pub async fn download_invoice_pdf(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        let endpoint = format!("/api/invoices/{}/pdf", id);
        self.request_bytes(&endpoint).await
    }

    /// Submit an invoice document for OCR analysis.
    pub async fn analyze_invoice(&self, file: &ReceiptFile) -> Result<InvoiceAnalysis, ApiError> {
        let part = multipart::Part::bytes(file.contents.clone()).file_name(file.file_name.clone());
        let form = multipart::Form::new().part("invoice", part);
        self.request(
            Method::POST,
            "/api/invoices/analyze",
            Payload::Multipart(form),
            Escalation::Notify,
        )
        .await
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Record an expense, uploading the receipt image when present.
    pub async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, ApiError> {
        let mut form = multipart::Form::new()
            .text("amount", expense.amount.to_string())
            .text("expenseDate", expense.expense_date.clone());
        if let Some(ref note) = expense.note {
            form = form.text("note", note.clone());
        }
        if let Some(ref receipt) = expense.receipt {
            let part = multipart::Part::bytes(receipt.contents.clone())
                .file_name(receipt.file_name.clone());
            form = form.part("receipt", part);
        }
        self.request(Method::POST, "/api/expenses", Payload::Multipart(form), Escalation::Notify)
            .await
    }

    /// Fetch a page of expenses.
    pub async fn get_expenses(&self, page: u32, page_size: u32) -> Result<Vec<Expense>, ApiError> {
        let endpoint = format!("/api/expenses?page={}&pageSize={}", page, page_size);
        self.request(Method::GET, &endpoint, Payload::None, Escalation::Notify)
            .await
    }

    /// Delete an expense.
    pub async fn delete_expense(&self, id: &str) -> Result<(), ApiError> {
        let endpoint = format!("/api/expenses/{}", id);
        self.request_empty(Method::DELETE, &endpoint, Payload::None, Escalation::Notify)
            .await
    }

    /// URL of the stored receipt image for an expense.
    pub fn expense_receipt_url(&self, id: &str) -> String {
        format!("{}/api/expenses/{}/receipt", self.base_url, id)
    }

    /// Download the stored receipt image for an expense.
    pub async fn fetch_expense_receipt(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        let endpoint = format!("/api/expenses/{}/receipt", id);
        self.request_bytes(&endpoint).await
    }

    /// Submit a receipt image for OCR analysis.
    pub async fn analyze_receipt(&self, file: &ReceiptFile) -> Result<ReceiptAnalysis, ApiError> {
        let part = multipart::Part::bytes(file.contents.clone()).file_name(file.file_name.clone());
        let form = multipart::Form::new().part("file", part);
        self.request(
            Method::POST,
            "/api/receipts/upload",
            Payload::Multipart(form),
            Escalation::Notify,
        )
        .await
    }

    // =========================================================================
    // Summary
    // =========================================================================

    /// Fetch the income/expense summary for a month or for all time.
    pub async fn monthly_summary(&self, query: SummaryQuery) -> Result<MonthlySummary, ApiError> {
        let endpoint = format!("/api/summary/monthly{}", query.to_query_string());
        self.request(Method::GET, &endpoint, Payload::None, Escalation::Notify)
            .await
    }

    // =========================================================================
    // Billing
    // =========================================================================

    /// Start a Pro checkout session.
    pub async fn create_checkout(&self) -> Result<CheckoutSession, ApiError> {
        self.request(Method::POST, "/api/payments/checkout", Payload::None, Escalation::Notify)
            .await
    }

    /// Start an Elite checkout session.
    pub async fn create_elite_checkout(&self) -> Result<CheckoutSession, ApiError> {
        self.request(
            Method::POST,
            "/api/payments/checkout/elite",
            Payload::None,
            Escalation::Notify,
        )
        .await
    }

    /// Fetch a billing portal session for managing the subscription.
    pub async fn billing_portal(&self) -> Result<BillingPortal, ApiError> {
        self.request(Method::GET, "/api/payments/portal", Payload::None, Escalation::Notify)
            .await
    }

    /// Confirm a completed checkout session and learn the resulting plan.
    pub async fn confirm_checkout(&self, session_id: &str) -> Result<PlanConfirmation, ApiError> {
        let body = serde_json::json!({ "sessionId": session_id });
        self.request(Method::POST, "/api/payments/confirm", Payload::Json(body), Escalation::Notify)
            .await
    }

    // =========================================================================
    // Beta program
    // =========================================================================

    /// Submit feedback from the beta banner.
    pub async fn submit_beta_feedback(&self, feedback: &BetaFeedback) -> Result<(), ApiError> {
        let body = serde_json::to_value(feedback)?;
        self.request_empty(Method::POST, "/api/beta/feedback", Payload::Json(body), Escalation::Notify)
            .await
    }

    /// Unlock the Pro plan for beta participants.
    pub async fn unlock_pro_beta(&self) -> Result<PlanConfirmation, ApiError> {
        self.request(Method::POST, "/api/beta/unlock", Payload::None, Escalation::Notify)
            .await
    }
}
