//! Flow tests against an in-memory store and a capturing notifier.
//!
//! `postgres` repeats the store-sensitive flows against a real database.


use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use kernel::id::{AdminId, OtpSessionId, RefreshTokenId};
use platform::password::{ClearTextPassword, SecretHash};
use tower::ServiceExt;

use crate::application::authorize::{AccessCredentials, AuthorizeUseCase};
use crate::application::config::AdminAuthConfig;
use crate::application::manage_admins::{
    AdminListQuery, CreateAdminInput, ManageAdminsUseCase, ProfileChanges,
};
use crate::application::sign_in::{LoginOutcome, SignInInput, SignInUseCase};
use crate::application::sign_out::{SignOutOutcome, SignOutUseCase};
use crate::application::token::{BEARER_PREFIX, TokenService};
use crate::application::verify_otp::{
    IssuedSession, VerifyOtpInput, VerifyOtpOutcome, VerifyOtpUseCase,
};
use crate::domain::entity::{
    admin::{Admin, AdminCredentials, NewAdmin},
    otp_session::OtpSession,
    refresh_token::RefreshToken,
};
use crate::domain::notifier::OtpNotifier;
use crate::domain::repository::{
    AdminFilter, AdminRepository, OtpSessionRepository, RefreshTokenRepository,
    SessionGrantRepository,
};
use crate::domain::value_object::{admin_role::AdminRole, email::Email, otp_code::OtpCode};
use crate::error::{AdminError, AdminResult};
use crate::presentation::handlers::AdminAppState;
use crate::presentation::router::admin_router;

const PASSWORD: &str = "Falcon-Ridge-2024";
const SECRET: &str = "test-signing-secret";

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Default)]
struct MemoryState {
    admins: HashMap<AdminId, (Admin, SecretHash)>,
    sessions: HashMap<OtpSessionId, OtpSession>,
    tokens: HashMap<RefreshTokenId, RefreshToken>,
}

#[derive(Clone, Default)]
struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    fn insert_admin(&self, email: &str, role: AdminRole) -> Admin {
        let admin = Admin::new(NewAdmin {
            email: Email::new(email).unwrap(),
            first_name: "Rania".to_string(),
            last_name: "Saleh".to_string(),
            phone: None,
            country: "UAE".to_string(),
            city: "Dubai".to_string(),
            role,
        });
        let hash = ClearTextPassword::new(PASSWORD.to_string())
            .unwrap()
            .hash(None)
            .unwrap();

        self.state
            .lock()
            .unwrap()
            .admins
            .insert(admin.id, (admin.clone(), hash));
        admin
    }

    fn session_count(&self, admin_id: AdminId) -> usize {
        let state = self.state.lock().unwrap();
        state.sessions.values().filter(|s| s.admin_id == admin_id).count()
    }

    fn token_ids(&self, admin_id: AdminId) -> Vec<RefreshTokenId> {
        let state = self.state.lock().unwrap();
        state
            .tokens
            .values()
            .filter(|t| t.admin_id == admin_id)
            .map(|t| t.id)
            .collect()
    }

    fn expire_session(&self, id: OtpSessionId) {
        let mut state = self.state.lock().unwrap();
        let session = state.sessions.get_mut(&id).unwrap();
        session.expires_at = Utc::now() - chrono::Duration::seconds(1);
    }

    fn expire_token(&self, id: RefreshTokenId) {
        let mut state = self.state.lock().unwrap();
        let token = state.tokens.get_mut(&id).unwrap();
        token.expires_at = Utc::now() - chrono::Duration::seconds(1);
    }
}

impl AdminRepository for MemoryStore {
    async fn find_credentials_by_email(
        &self,
        email: &Email,
    ) -> AdminResult<Option<AdminCredentials>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .admins
            .values()
            .find(|(admin, _)| &admin.email == email)
            .map(|(admin, hash)| AdminCredentials {
                id: admin.id,
                email: admin.email.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn find_admin(&self, id: AdminId) -> AdminResult<Option<Admin>> {
        let state = self.state.lock().unwrap();
        Ok(state.admins.get(&id).map(|(admin, _)| admin.clone()))
    }

    async fn admin_exists(
        &self,
        email: Option<&Email>,
        phone: Option<&str>,
        exclude: Option<AdminId>,
    ) -> AdminResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.admins.values().any(|(admin, _)| {
            Some(admin.id) != exclude
                && (email.is_some_and(|e| &admin.email == e)
                    || phone.is_some_and(|p| admin.phone.as_deref() == Some(p)))
        }))
    }

    async fn create_admin(&self, admin: &Admin, password_hash: &SecretHash) -> AdminResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.admins.values().any(|(a, _)| a.email == admin.email) {
            return Err(AdminError::AdminAlreadyExists);
        }
        state
            .admins
            .insert(admin.id, (admin.clone(), password_hash.clone()));
        Ok(())
    }

    async fn update_admin(&self, admin: &Admin) -> AdminResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state.admins.get_mut(&admin.id) {
            Some(entry) => {
                entry.0 = admin.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_admin(&self, id: AdminId) -> AdminResult<bool> {
        let mut state = self.state.lock().unwrap();
        let removed = state.admins.remove(&id).is_some();
        state.sessions.retain(|_, s| s.admin_id != id);
        state.tokens.retain(|_, t| t.admin_id != id);
        Ok(removed)
    }

    async fn list_admins(&self, filter: &AdminFilter) -> AdminResult<(Vec<Admin>, i64)> {
        let state = self.state.lock().unwrap();
        let mut admins: Vec<Admin> = state
            .admins
            .values()
            .map(|(admin, _)| admin.clone())
            .filter(|admin| {
                filter.search.as_ref().is_none_or(|s| {
                    admin.first_name.to_lowercase().contains(&s.to_lowercase())
                })
            })
            .filter(|admin| filter.role.is_none_or(|r| admin.role == r))
            .collect();
        admins.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = admins.len() as i64;
        let page = admins
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }
}

impl OtpSessionRepository for MemoryStore {
    async fn find_otp_session_by_admin(
        &self,
        admin_id: AdminId,
    ) -> AdminResult<Option<OtpSession>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .values()
            .find(|s| s.admin_id == admin_id)
            .cloned())
    }

    async fn find_otp_session(&self, id: OtpSessionId) -> AdminResult<Option<OtpSession>> {
        Ok(self.state.lock().unwrap().sessions.get(&id).cloned())
    }

    async fn create_otp_session<D>(&self, session: &OtpSession, delivery: D) -> AdminResult<()>
    where
        D: Future<Output = AdminResult<()>> + Send,
    {
        {
            let mut state = self.state.lock().unwrap();
            let now = session.created_at;
            state
                .sessions
                .retain(|_, s| s.admin_id != session.admin_id || !s.is_expired_at(now));
            if state.sessions.values().any(|s| s.admin_id == session.admin_id) {
                return Err(AdminError::SessionAlreadyPending);
            }
            // Held while delivery runs, like an uncommitted row holding the unique index
            state.sessions.insert(session.id, session.clone());
        }

        if let Err(e) = delivery.await {
            self.state.lock().unwrap().sessions.remove(&session.id);
            return Err(e);
        }
        Ok(())
    }

    async fn record_failed_attempt(&self, id: OtpSessionId) -> AdminResult<Option<i32>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.sessions.get_mut(&id).map(|s| {
            s.attempts += 1;
            s.updated_at = Utc::now();
            s.attempts
        }))
    }

    async fn delete_otp_session(&self, id: OtpSessionId) -> AdminResult<()> {
        self.state.lock().unwrap().sessions.remove(&id);
        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> AdminResult<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.sessions.len();
        let now = Utc::now();
        state.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - state.sessions.len()) as u64)
    }
}

impl RefreshTokenRepository for MemoryStore {
    async fn find_refresh_token(&self, id: RefreshTokenId) -> AdminResult<Option<RefreshToken>> {
        Ok(self.state.lock().unwrap().tokens.get(&id).cloned())
    }

    async fn delete_refresh_token(&self, id: RefreshTokenId) -> AdminResult<bool> {
        Ok(self.state.lock().unwrap().tokens.remove(&id).is_some())
    }

    async fn cleanup_expired_refresh_tokens(&self) -> AdminResult<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.tokens.len();
        let now = Utc::now();
        state.tokens.retain(|_, t| !t.is_expired_at(now));
        Ok((before - state.tokens.len()) as u64)
    }
}

impl SessionGrantRepository for MemoryStore {
    async fn consume_otp_and_grant<F, T>(
        &self,
        session: &OtpSession,
        max_refresh_tokens: i64,
        grant: F,
    ) -> AdminResult<T>
    where
        F: FnOnce(&Admin) -> AdminResult<(RefreshToken, T)> + Send,
        T: Send,
    {
        let mut state = self.state.lock().unwrap();

        let Some(consumed) = state.sessions.remove(&session.id) else {
            return Err(AdminError::SessionNotFound);
        };
        let Some(admin) = state
            .admins
            .get(&session.admin_id)
            .map(|(admin, _)| admin.clone())
        else {
            state.sessions.insert(consumed.id, consumed);
            return Err(AdminError::AdminNotFound);
        };

        let previous = state.tokens.clone();
        let existing = state
            .tokens
            .values()
            .filter(|t| t.admin_id == admin.id)
            .count() as i64;
        if existing >= max_refresh_tokens {
            state.tokens.retain(|_, t| t.admin_id != admin.id);
        }

        match grant(&admin) {
            Ok((token, output)) => {
                state.tokens.insert(token.id, token);
                Ok(output)
            }
            Err(e) => {
                state.tokens = previous;
                state.sessions.insert(consumed.id, consumed);
                Err(e)
            }
        }
    }
}

// ============================================================================
// Capturing notifier
// ============================================================================

#[derive(Clone, Default)]
struct CapturingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: Arc<AtomicBool>,
}

impl CapturingNotifier {
    fn last_code(&self) -> String {
        self.sent.lock().unwrap().last().unwrap().1.clone()
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl OtpNotifier for CapturingNotifier {
    async fn send_otp(&self, email: &Email, code: &OtpCode) -> AdminResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AdminError::Delivery("relay unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.as_str().to_string(), code.as_str().to_string()));
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    store: MemoryStore,
    notifier: CapturingNotifier,
    tokens: Arc<TokenService>,
    config: Arc<AdminAuthConfig>,
}

impl Harness {
    fn new() -> Self {
        let config = AdminAuthConfig::development();
        let tokens = TokenService::new(SECRET, config.access_token_ttl).unwrap();

        Self {
            store: MemoryStore::default(),
            notifier: CapturingNotifier::default(),
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        }
    }

    fn sign_in(&self) -> SignInUseCase<MemoryStore, CapturingNotifier> {
        SignInUseCase::new(
            Arc::new(self.store.clone()),
            Arc::new(self.notifier.clone()),
            self.config.clone(),
        )
    }

    fn verify(&self) -> VerifyOtpUseCase<MemoryStore> {
        VerifyOtpUseCase::new(
            Arc::new(self.store.clone()),
            self.tokens.clone(),
            self.config.clone(),
        )
    }

    fn authorize(&self) -> AuthorizeUseCase<MemoryStore> {
        AuthorizeUseCase::new(Arc::new(self.store.clone()), self.tokens.clone())
    }

    fn manage(&self) -> ManageAdminsUseCase<MemoryStore> {
        ManageAdminsUseCase::new(Arc::new(self.store.clone()), self.config.clone())
    }

    fn router(&self) -> Router {
        admin_router(AdminAppState {
            repo: Arc::new(self.store.clone()),
            notifier: Arc::new(self.notifier.clone()),
            tokens: self.tokens.clone(),
            config: self.config.clone(),
        })
    }

    async fn login(&self, email: &str) -> AdminResult<OtpSessionId> {
        self.sign_in()
            .execute(SignInInput {
                email: email.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .map(|challenge| challenge.session_id)
    }

    async fn submit(&self, session_id: OtpSessionId, otp: &str) -> AdminResult<VerifyOtpOutcome> {
        self.verify()
            .attempt(VerifyOtpInput {
                session_id: session_id.to_string(),
                otp: otp.to_string(),
            })
            .await
    }

    /// Full login + verify cycle
    async fn sign_in_fully(&self, email: &str) -> IssuedSession {
        let session_id = self.login(email).await.unwrap();
        let code = self.notifier.last_code();
        self.submit(session_id, &code)
            .await
            .unwrap()
            .into_result()
            .unwrap()
    }
}

fn wrong_code(actual: &str) -> &'static str {
    if actual == "000000" { "111111" } else { "000000" }
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_second_login_rejected_while_session_live() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);

    assert!(h.login("ops@example.com").await.is_ok());
    assert_eq!(h.notifier.sent_count(), 1);

    let second = h.login("OPS@example.com").await;
    assert!(matches!(second, Err(AdminError::SessionAlreadyPending)));
    assert_eq!(h.store.session_count(admin.id), 1);
    assert_eq!(h.notifier.sent_count(), 1);
}

#[tokio::test]
async fn test_bad_email_and_bad_password_look_the_same() {
    let h = Harness::new();
    h.store.insert_admin("ops@example.com", AdminRole::Admin);

    let unknown = h
        .sign_in()
        .attempt(SignInInput {
            email: "nobody@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();
    let wrong_password = h
        .sign_in()
        .attempt(SignInInput {
            email: "ops@example.com".to_string(),
            password: "Wrong-Guess-99".to_string(),
        })
        .await
        .unwrap();

    assert!(matches!(unknown, LoginOutcome::InvalidCredentials));
    assert!(matches!(wrong_password, LoginOutcome::InvalidCredentials));
    assert_eq!(h.notifier.sent_count(), 0);
}

#[tokio::test]
async fn test_login_replaces_expired_session() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);

    let first = h.login("ops@example.com").await.unwrap();
    h.store.expire_session(first);

    let second = h.login("ops@example.com").await.unwrap();
    assert_ne!(first, second);
    assert_eq!(h.store.session_count(admin.id), 1);
}

#[tokio::test]
async fn test_delivery_failure_persists_nothing() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);
    h.notifier.fail.store(true, Ordering::SeqCst);

    let result = h.login("ops@example.com").await;
    assert!(matches!(result, Err(AdminError::Delivery(_))));
    assert_eq!(h.store.session_count(admin.id), 0);

    h.notifier.fail.store(false, Ordering::SeqCst);
    assert!(h.login("ops@example.com").await.is_ok());
}

// ============================================================================
// Verify OTP
// ============================================================================

#[tokio::test]
async fn test_otp_is_single_use() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);

    let session_id = h.login("ops@example.com").await.unwrap();
    let code = h.notifier.last_code();

    let issued = h.submit(session_id, &code).await.unwrap().into_result().unwrap();
    assert_eq!(issued.admin.id, admin.id);
    assert!(issued.access_token.starts_with(BEARER_PREFIX));
    assert_eq!(h.store.session_count(admin.id), 0);
    assert_eq!(h.store.token_ids(admin.id), vec![issued.refresh_token.id]);

    let replay = h.submit(session_id, &code).await.unwrap();
    assert!(matches!(replay, VerifyOtpOutcome::SessionNotFound));
}

#[tokio::test]
async fn test_attempts_exhausted_after_five_failures() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);

    let session_id = h.login("ops@example.com").await.unwrap();
    let code = h.notifier.last_code();
    let wrong = wrong_code(&code);

    for expected_left in (1..=4).rev() {
        let outcome = h.submit(session_id, wrong).await.unwrap();
        assert!(
            matches!(outcome, VerifyOtpOutcome::InvalidOtp { attempts_left } if attempts_left == expected_left)
        );
    }

    let fifth = h.submit(session_id, wrong).await.unwrap().into_result();
    assert_eq!(fifth.unwrap_err().to_string(), "Max attempts reached");
    assert_eq!(h.store.session_count(admin.id), 0);

    let sixth = h.submit(session_id, &code).await.unwrap();
    assert!(matches!(sixth, VerifyOtpOutcome::SessionNotFound));
}

#[tokio::test]
async fn test_expired_session_rejected_even_with_correct_code() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);

    let session_id = h.login("ops@example.com").await.unwrap();
    let code = h.notifier.last_code();
    h.store.expire_session(session_id);

    let outcome = h.submit(session_id, &code).await.unwrap().into_result();
    assert_eq!(outcome.unwrap_err().to_string(), "Session expired");
    assert_eq!(h.store.session_count(admin.id), 0);
}

#[tokio::test]
async fn test_malformed_verify_input() {
    let h = Harness::new();

    let bad_id = h
        .verify()
        .attempt(VerifyOtpInput {
            session_id: "not-a-uuid".to_string(),
            otp: "123456".to_string(),
        })
        .await;
    assert!(matches!(bad_id, Err(AdminError::Validation(_))));

    let bad_otp = h.submit(OtpSessionId::new(), "12ab56").await;
    assert!(matches!(bad_otp, Err(AdminError::Validation(_))));

    let missing = h.submit(OtpSessionId::new(), "123456").await.unwrap();
    assert!(matches!(missing, VerifyOtpOutcome::SessionNotFound));
}

#[tokio::test]
async fn test_sixth_grant_resets_refresh_tokens() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);

    for _ in 0..5 {
        h.sign_in_fully("ops@example.com").await;
    }
    assert_eq!(h.store.token_ids(admin.id).len(), 5);

    let sixth = h.sign_in_fully("ops@example.com").await;
    assert_eq!(h.store.token_ids(admin.id), vec![sixth.refresh_token.id]);
}

// ============================================================================
// Access guard
// ============================================================================

#[tokio::test]
async fn test_valid_access_token_passes_without_refresh() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);
    let issued = h.sign_in_fully("ops@example.com").await;

    let authorized = h
        .authorize()
        .execute(AccessCredentials {
            access_token: Some(&issued.access_token),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(authorized.principal.id, admin.id);
    assert!(authorized.refreshed_access_token.is_none());
}

#[tokio::test]
async fn test_silent_refresh_with_valid_refresh_token() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::SuperAdmin);
    let issued = h.sign_in_fully("ops@example.com").await;
    let refresh_id = issued.refresh_token.id.to_string();

    let authorized = h
        .authorize()
        .execute(AccessCredentials {
            access_token: Some("Bearer expired.or.forged"),
            refresh_token: Some(&issued.refresh_token.token),
            refresh_token_id: Some(&refresh_id),
        })
        .await
        .unwrap();

    assert_eq!(authorized.principal.id, admin.id);
    assert_eq!(authorized.principal.role, AdminRole::SuperAdmin);

    let refreshed = authorized.refreshed_access_token.unwrap();
    let claims = h
        .tokens
        .verify_access_token(refreshed.trim_start_matches(BEARER_PREFIX))
        .unwrap();
    assert_eq!(claims.id, admin.id);
}

#[tokio::test]
async fn test_silent_refresh_rejects_mismatched_token() {
    let h = Harness::new();
    h.store.insert_admin("ops@example.com", AdminRole::Admin);
    let issued = h.sign_in_fully("ops@example.com").await;
    let refresh_id = issued.refresh_token.id.to_string();

    let result = h
        .authorize()
        .execute(AccessCredentials {
            access_token: Some("garbage"),
            refresh_token: Some("someone-else.deadbeef"),
            refresh_token_id: Some(&refresh_id),
        })
        .await;

    assert!(matches!(result, Err(AdminError::AccessDenied)));
}

#[tokio::test]
async fn test_silent_refresh_rejects_expired_record() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);
    let issued = h.sign_in_fully("ops@example.com").await;
    h.store.expire_token(issued.refresh_token.id);
    let refresh_id = issued.refresh_token.id.to_string();

    let result = h
        .authorize()
        .execute(AccessCredentials {
            access_token: Some("garbage"),
            refresh_token: Some(&issued.refresh_token.token),
            refresh_token_id: Some(&refresh_id),
        })
        .await;

    assert!(matches!(result, Err(AdminError::AccessDenied)));
    assert!(h.store.token_ids(admin.id).is_empty());
}

#[tokio::test]
async fn test_missing_access_token_denied() {
    let h = Harness::new();
    let result = h.authorize().execute(AccessCredentials::default()).await;
    assert!(matches!(result, Err(AdminError::AccessDenied)));
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_is_idempotent() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);
    let issued = h.sign_in_fully("ops@example.com").await;
    let refresh_id = issued.refresh_token.id.to_string();
    let sign_out = SignOutUseCase::new(Arc::new(h.store.clone()));

    let first = sign_out
        .execute(Some(&refresh_id), Some(&issued.refresh_token.token))
        .await
        .unwrap();
    assert_eq!(first, SignOutOutcome::Revoked);
    assert!(h.store.token_ids(admin.id).is_empty());

    let second = sign_out
        .execute(Some(&refresh_id), Some(&issued.refresh_token.token))
        .await
        .unwrap();
    assert_eq!(second, SignOutOutcome::AlreadySignedOut);

    let no_cookies = sign_out.execute(None, None).await.unwrap();
    assert_eq!(no_cookies, SignOutOutcome::AlreadySignedOut);
}

#[tokio::test]
async fn test_logout_keeps_token_on_mismatch() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);
    let issued = h.sign_in_fully("ops@example.com").await;
    let refresh_id = issued.refresh_token.id.to_string();

    let outcome = SignOutUseCase::new(Arc::new(h.store.clone()))
        .execute(Some(&refresh_id), Some("forged.value"))
        .await
        .unwrap();

    assert_eq!(outcome, SignOutOutcome::AlreadySignedOut);
    assert_eq!(h.store.token_ids(admin.id).len(), 1);
}

// ============================================================================
// Admin management
// ============================================================================

fn create_input(email: &str, phone: Option<&str>) -> CreateAdminInput {
    CreateAdminInput {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
        first_name: "Yousef".to_string(),
        last_name: "Haddad".to_string(),
        phone: phone.map(str::to_string),
        country: "Jordan".to_string(),
        city: "Amman".to_string(),
        role: AdminRole::Admin,
    }
}

#[tokio::test]
async fn test_create_admin_rules() {
    let h = Harness::new();
    let manage = h.manage();

    let created = manage
        .create(create_input("new@example.com", Some("+962700000001")))
        .await
        .unwrap();
    assert_eq!(created.email.as_str(), "new@example.com");

    let duplicate_email = manage.create(create_input("NEW@example.com", None)).await;
    assert!(matches!(duplicate_email, Err(AdminError::AdminAlreadyExists)));

    let duplicate_phone = manage
        .create(create_input("other@example.com", Some("+962700000001")))
        .await;
    assert!(matches!(duplicate_phone, Err(AdminError::AdminAlreadyExists)));

    let mut mismatch = create_input("third@example.com", None);
    mismatch.confirm_password = "Something-Else-1".to_string();
    let err = manage.create(mismatch).await.unwrap_err();
    assert_eq!(err.to_string(), "Password and confirm password do not match");

    let mut weak = create_input("fourth@example.com", None);
    weak.password = "short".to_string();
    weak.confirm_password = "short".to_string();
    assert!(matches!(
        manage.create(weak).await,
        Err(AdminError::Validation(_))
    ));
}

#[tokio::test]
async fn test_created_admin_can_sign_in() {
    let h = Harness::new();
    let created = h
        .manage()
        .create(create_input("new@example.com", None))
        .await
        .unwrap();

    let issued = h.sign_in_fully("new@example.com").await;
    assert_eq!(issued.admin.id, created.id);
}

#[tokio::test]
async fn test_list_admins_filters_and_paginates() {
    let h = Harness::new();
    let manage = h.manage();

    for i in 0..3 {
        manage
            .create(create_input(&format!("a{i}@example.com"), None))
            .await
            .unwrap();
    }
    h.store.insert_admin("root@example.com", AdminRole::SuperAdmin);

    let page = manage
        .list(AdminListQuery {
            page: Some(1),
            limit: Some(2),
            search: Some("yOu".to_string()),
            role: Some(AdminRole::Admin),
        })
        .await
        .unwrap();

    assert_eq!(page.admins.len(), 2);
    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.pagination.total_pages, 2);
    assert!(page.pagination.has_next_page);
    assert!(!page.pagination.has_previous_page);

    let bad_limit = manage
        .list(AdminListQuery {
            limit: Some(101),
            ..Default::default()
        })
        .await;
    assert!(matches!(bad_limit, Err(AdminError::Validation(_))));
}

#[tokio::test]
async fn test_list_admins_rejects_page_past_offset_range() {
    let h = Harness::new();

    let result = h
        .manage()
        .list(AdminListQuery {
            page: Some(i64::MAX / 10),
            limit: Some(100),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(AdminError::Validation(ref m)) if m == "page is out of range"));
}

#[tokio::test]
async fn test_update_checks_uniqueness_and_existence() {
    let h = Harness::new();
    let manage = h.manage();
    let first = h.store.insert_admin("first@example.com", AdminRole::Admin);
    h.store.insert_admin("second@example.com", AdminRole::Admin);

    let clash = manage
        .update(
            first.id,
            ProfileChanges {
                email: Some("second@example.com".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(clash, Err(AdminError::AdminAlreadyExists)));

    let own_email = manage
        .update_me(
            first.id,
            ProfileChanges {
                email: Some("first@example.com".to_string()),
                city: Some("Sharjah".to_string()),
                role: Some(AdminRole::SuperAdmin),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(own_email.city, "Sharjah");
    assert_eq!(own_email.role, AdminRole::Admin);

    let missing = manage
        .update(
            AdminId::new(),
            ProfileChanges {
                city: Some("Muscat".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(missing, Err(AdminError::AdminNotFound)));
}

#[tokio::test]
async fn test_delete_admin() {
    let h = Harness::new();
    let manage = h.manage();
    let root = h.store.insert_admin("root@example.com", AdminRole::SuperAdmin);
    let target = h.store.insert_admin("ops@example.com", AdminRole::Admin);
    h.sign_in_fully("ops@example.com").await;

    assert!(matches!(
        manage.delete(root.id, root.id).await,
        Err(AdminError::Validation(_))
    ));

    manage.delete(root.id, target.id).await.unwrap();
    assert!(h.store.token_ids(target.id).is_empty());
    assert!(matches!(
        manage.delete(root.id, target.id).await,
        Err(AdminError::AdminNotFound)
    ));
}

#[tokio::test]
async fn test_seed_super_admin_is_idempotent() {
    let h = Harness::new();
    let manage = h.manage();

    assert!(manage.seed_super_admin("root@example.com", PASSWORD).await.unwrap());
    assert!(!manage.seed_super_admin("root@example.com", PASSWORD).await.unwrap());

    let issued = h.sign_in_fully("root@example.com").await;
    assert_eq!(issued.admin.role, AdminRole::SuperAdmin);
    assert_eq!(issued.admin.first_name, "Super");
}

#[tokio::test]
async fn test_cleanup_removes_only_expired_rows() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);
    let other = h.store.insert_admin("other@example.com", AdminRole::Admin);

    let expired = h.sign_in_fully("ops@example.com").await;
    h.sign_in_fully("other@example.com").await;
    h.store.expire_token(expired.refresh_token.id);

    let session_id = h.login("ops@example.com").await.unwrap();
    h.store.expire_session(session_id);

    assert_eq!(h.store.cleanup_expired_sessions().await.unwrap(), 1);
    assert_eq!(h.store.cleanup_expired_refresh_tokens().await.unwrap(), 1);
    assert!(h.store.token_ids(admin.id).is_empty());
    assert_eq!(h.store.token_ids(other.id).len(), 1);
}

// ============================================================================
// HTTP
// ============================================================================

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn cookie_request(method: &str, uri: &str, cookies: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookies)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Login + verify over HTTP, returning the `Cookie` header to send back
async fn http_sign_in(h: &Harness, email: &str) -> String {
    let response = h
        .router()
        .oneshot(json_request(
            "POST",
            "/login",
            serde_json::json!({ "email": email, "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session_id = body_json(response).await["data"]["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = h
        .router()
        .oneshot(json_request(
            "POST",
            "/verify-otp",
            serde_json::json!({ "session_id": session_id, "otp": h.notifier.last_code() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    set_cookies(&response)
        .iter()
        .filter_map(|c| c.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

#[tokio::test]
async fn test_http_login_envelope() {
    let h = Harness::new();
    h.store.insert_admin("ops@example.com", AdminRole::Admin);

    let response = h
        .router()
        .oneshot(json_request(
            "POST",
            "/login",
            serde_json::json!({ "email": "ops@example.com", "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "OTP sent to email");
    assert_eq!(body["data"]["email"], "ops@example.com");
    assert!(body["timestamp"].is_string());

    let again = h
        .router()
        .oneshot(json_request(
            "POST",
            "/login",
            serde_json::json!({ "email": "ops@example.com", "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(again).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Session already exists and not expired");
}

#[tokio::test]
async fn test_http_wrong_password() {
    let h = Harness::new();
    h.store.insert_admin("ops@example.com", AdminRole::Admin);

    let response = h
        .router()
        .oneshot(json_request(
            "POST",
            "/login",
            serde_json::json!({ "email": "ops@example.com", "password": "Not-The-One-7" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_http_malformed_body_uses_envelope() {
    let h = Harness::new();
    h.store.insert_admin("ops@example.com", AdminRole::Admin);

    let response = h
        .router()
        .oneshot(json_request(
            "POST",
            "/login",
            serde_json::json!({ "email": "ops@example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("missing field `password`"));
    assert!(body["timestamp"].is_string());
    assert_eq!(h.notifier.sent_count(), 0);
}

#[tokio::test]
async fn test_http_bad_query_uses_envelope() {
    let h = Harness::new();
    h.store.insert_admin("root@example.com", AdminRole::SuperAdmin);
    let cookies = http_sign_in(&h, "root@example.com").await;

    for uri in ["/?page=abc", "/?page=922337203685477580&limit=100"] {
        let response = h
            .router()
            .oneshot(cookie_request("GET", uri, &cookies))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["timestamp"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_http_verify_sets_cookies() {
    let h = Harness::new();
    h.store.insert_admin("ops@example.com", AdminRole::Admin);
    let session_id = h.login("ops@example.com").await.unwrap();

    let response = h
        .router()
        .oneshot(json_request(
            "POST",
            "/verify-otp",
            serde_json::json!({
                "session_id": session_id.to_string(),
                "otp": h.notifier.last_code(),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 3);
    for cookie in &cookies {
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(!cookie.contains("Secure"));
    }
    assert!(cookies.iter().any(|c| c.starts_with("access_token=Bearer%20") && c.contains("Max-Age=3600")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=") && c.contains("Max-Age=604800")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token_id=")));

    let body = body_json(response).await;
    assert_eq!(body["message"], "OTP verified");
    assert_eq!(body["data"]["email"], "ops@example.com");
    assert_eq!(body["data"]["role"], "ADMIN");
    assert!(body["data"]["access_token"].as_str().unwrap().starts_with("Bearer "));
    assert!(body["data"]["refresh_token"]["token"].is_string());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_http_verify_unknown_session_is_not_found() {
    let h = Harness::new();

    let response = h
        .router()
        .oneshot(json_request(
            "POST",
            "/verify-otp",
            serde_json::json!({ "session_id": OtpSessionId::new().to_string(), "otp": "123456" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Session not found");
}

#[tokio::test]
async fn test_http_protected_route_requires_cookie() {
    let h = Harness::new();

    let response = h
        .router()
        .oneshot(cookie_request("GET", "/me", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Access denied");
}

#[tokio::test]
async fn test_http_me_with_session_cookies() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);
    let cookies = http_sign_in(&h, "ops@example.com").await;

    let response = h
        .router()
        .oneshot(cookie_request("GET", "/me", &cookies))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await["data"]["id"], admin.id.to_string());
}

#[tokio::test]
async fn test_http_silent_refresh_reissues_access_cookie() {
    let h = Harness::new();
    h.store.insert_admin("ops@example.com", AdminRole::Admin);
    let cookies = http_sign_in(&h, "ops@example.com").await;

    let refresh_only = cookies
        .split("; ")
        .filter(|c| !c.starts_with("access_token="))
        .collect::<Vec<_>>()
        .join("; ");
    let stale = format!("access_token=Bearer%20stale.jwt.value; {refresh_only}");

    let response = h
        .router()
        .oneshot(cookie_request("GET", "/me", &stale))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let reissued = set_cookies(&response);
    assert_eq!(reissued.len(), 1);
    assert!(reissued[0].starts_with("access_token=Bearer%20"));
}

#[tokio::test]
async fn test_http_role_gate() {
    let h = Harness::new();
    h.store.insert_admin("ops@example.com", AdminRole::Admin);
    h.store.insert_admin("root@example.com", AdminRole::SuperAdmin);

    let admin_cookies = http_sign_in(&h, "ops@example.com").await;
    let response = h
        .router()
        .oneshot(cookie_request("GET", "/", &admin_cookies))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["message"], "Access denied");

    let root_cookies = http_sign_in(&h, "root@example.com").await;
    let response = h
        .router()
        .oneshot(cookie_request("GET", "/?page=1&limit=10", &root_cookies))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Admins fetched successfully");
    assert_eq!(body["data"]["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_http_create_admin() {
    let h = Harness::new();
    h.store.insert_admin("root@example.com", AdminRole::SuperAdmin);
    let cookies = http_sign_in(&h, "root@example.com").await;

    let mut request = json_request(
        "POST",
        "/create-admin",
        serde_json::json!({
            "email": "fresh@example.com",
            "password": PASSWORD,
            "confirm_password": PASSWORD,
            "first_name": "Nadia",
            "last_name": "Aziz",
            "country": "Qatar",
            "city": "Doha",
            "role": "ADMIN",
        }),
    );
    request
        .headers_mut()
        .insert(header::COOKIE, cookies.parse().unwrap());

    let response = h.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Admin created successfully");
    assert_eq!(body["data"]["email"], "fresh@example.com");
}

#[tokio::test]
async fn test_http_logout_clears_cookies() {
    let h = Harness::new();
    let admin = h.store.insert_admin("ops@example.com", AdminRole::Admin);
    let cookies = http_sign_in(&h, "ops@example.com").await;

    for _ in 0..2 {
        let response = h
            .router()
            .oneshot(cookie_request("GET", "/logout", &cookies))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cleared = set_cookies(&response);
        assert_eq!(cleared.len(), 3);
        assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));
        assert_eq!(body_json(response).await["message"], "Logout successful");
    }

    assert!(h.store.token_ids(admin.id).is_empty());
}

#[test]
fn test_token_service_ttl_follows_config() {
    let service = TokenService::new(SECRET, Duration::from_secs(60)).unwrap();
    let admin = Admin::new(NewAdmin {
        email: Email::new("ttl@example.com").unwrap(),
        first_name: "Tala".to_string(),
        last_name: "Karim".to_string(),
        phone: None,
        country: "UAE".to_string(),
        city: "Dubai".to_string(),
        role: AdminRole::Admin,
    });

    let (_, claims) = service.issue_access_token(&admin).unwrap();
    assert_eq!(claims.exp - claims.iat, 60);
}
