//! Use-case and router tests against an in-memory store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use http_body_util::BodyExt;
use kernel::id::UsuarioId;
use platform::password::{ClearTextPassword, HashFormat, HashedPassword, PasswordHasher};
use tower::ServiceExt;

use crate::application::{
    AccountsConfig, AuthenticationService, ChangePasswordInput, ChangePasswordUseCase,
    CurrentUsuarioUseCase, DeleteUsuarioUseCase, RegisterUsuarioInput, RegisterUsuarioUseCase,
    SignInInput, SignInUseCase, UpdateUsuarioInput, UpdateUsuarioUseCase,
};
use crate::domain::entity::usuario::fixtures;
use crate::domain::entity::{Credential, LockoutState, Usuario, UsuarioProfile};
use crate::domain::repository::{CredentialRepository, UsuarioRepository};
use crate::domain::services::{LockStatus, LockoutPolicy};
use crate::domain::value_object::{Email, Role, Username};
use crate::error::{AccountsError, AccountsResult};
use crate::presentation::handlers::AccountsAppState;
use crate::presentation::router::usuarios_router_generic;

const PASSWORD: &str = "Corredor-Seguro-2025";

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Default)]
struct MemoryStore {
    rows: Mutex<BTreeMap<i64, (Usuario, Credential)>>,
    /// When set, any lockout write that changes state fails.
    fail_lockout_writes: AtomicBool,
    /// Lockout state written by a competing request just before the next
    /// `finish_login` takes the row.
    interleaved_lockout: Mutex<Option<LockoutState>>,
}

impl MemoryStore {
    fn seed(&self, profile: UsuarioProfile, hash: HashedPassword) -> Usuario {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
        let now = Utc::now();
        let usuario = Usuario {
            id: UsuarioId::new(id),
            profile,
            fecha_creacion: now,
            fecha_modificacion: now,
        };
        let credential = Credential::new(usuario.id, hash);
        rows.insert(id, (usuario.clone(), credential));
        usuario
    }

    fn lockout(&self, id: UsuarioId) -> LockoutState {
        self.rows.lock().unwrap()[&id.get()].1.lockout
    }

    fn hash(&self, id: UsuarioId) -> HashedPassword {
        self.rows.lock().unwrap()[&id.get()].1.password_hash.clone()
    }

    fn set_lockout(&self, id: UsuarioId, state: LockoutState) {
        self.rows.lock().unwrap().get_mut(&id.get()).unwrap().1.lockout = state;
    }

    fn conflict(&self, profile: &UsuarioProfile, except: Option<UsuarioId>) -> Option<AccountsError> {
        let rows = self.rows.lock().unwrap();
        for (usuario, _) in rows.values() {
            if Some(usuario.id) == except {
                continue;
            }
            if usuario.profile.username.canonical() == profile.username.canonical() {
                return Some(AccountsError::UsernameTaken);
            }
            if usuario.profile.email == profile.email {
                return Some(AccountsError::EmailTaken);
            }
        }
        None
    }
}

impl UsuarioRepository for MemoryStore {
    async fn create(
        &self,
        profile: &UsuarioProfile,
        password_hash: &HashedPassword,
        _now: DateTime<Utc>,
    ) -> AccountsResult<Usuario> {
        if let Some(err) = self.conflict(profile, None) {
            return Err(err);
        }
        Ok(self.seed(profile.clone(), password_hash.clone()))
    }

    async fn find_by_id(&self, id: UsuarioId) -> AccountsResult<Option<Usuario>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&id.get()).map(|(u, _)| u.clone()))
    }

    async fn find_by_username(&self, username: &Username) -> AccountsResult<Option<Usuario>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .find(|(u, _)| u.profile.username.canonical() == username.canonical())
            .map(|(u, _)| u.clone()))
    }

    async fn find_by_email(&self, email: &Email) -> AccountsResult<Option<Usuario>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .find(|(u, _)| &u.profile.email == email)
            .map(|(u, _)| u.clone()))
    }

    async fn list(&self, skip: i64, limit: i64) -> AccountsResult<Vec<Usuario>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .skip(skip as usize)
            .take(limit as usize)
            .map(|(u, _)| u.clone())
            .collect())
    }

    async fn list_by_corredor(&self, corredor_numero: i64) -> AccountsResult<Vec<Usuario>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|(u, _)| u.profile.corredor_numero() == Some(corredor_numero))
            .map(|(u, _)| u.clone())
            .collect())
    }

    async fn update(&self, usuario: &Usuario, now: DateTime<Utc>) -> AccountsResult<Usuario> {
        if let Some(err) = self.conflict(&usuario.profile, Some(usuario.id)) {
            return Err(err);
        }
        let mut rows = self.rows.lock().unwrap();
        let (stored, _) = rows
            .get_mut(&usuario.id.get())
            .ok_or(AccountsError::UsuarioNotFound)?;
        *stored = Usuario {
            fecha_modificacion: now,
            ..usuario.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: UsuarioId) -> AccountsResult<bool> {
        Ok(self.rows.lock().unwrap().remove(&id.get()).is_some())
    }

    async fn count(&self) -> AccountsResult<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }
}

impl CredentialRepository for MemoryStore {
    async fn find_credential(&self, id: UsuarioId) -> AccountsResult<Option<Credential>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&id.get()).map(|(_, c)| c.clone()))
    }

    async fn update_lockout<F, T>(&self, id: UsuarioId, apply: F) -> AccountsResult<Option<T>>
    where
        F: FnOnce(&mut LockoutState) -> T + Send,
        T: Send,
    {
        let mut rows = self.rows.lock().unwrap();
        let Some((_, credential)) = rows.get_mut(&id.get()) else {
            return Ok(None);
        };
        let mut state = credential.lockout;
        let out = apply(&mut state);
        if state != credential.lockout {
            if self.fail_lockout_writes.load(Ordering::SeqCst) {
                return Err(AccountsError::Database(sqlx::Error::PoolTimedOut));
            }
            credential.lockout = state;
        }
        Ok(Some(out))
    }

    async fn finish_login<F>(
        &self,
        id: UsuarioId,
        upgraded_hash: Option<&HashedPassword>,
        apply: F,
    ) -> AccountsResult<Option<LockStatus>>
    where
        F: FnOnce(&mut LockoutState) -> LockStatus + Send,
    {
        let interleaved = self.interleaved_lockout.lock().unwrap().take();
        let mut rows = self.rows.lock().unwrap();
        let Some((_, credential)) = rows.get_mut(&id.get()) else {
            return Ok(None);
        };
        if let Some(state) = interleaved {
            credential.lockout = state;
        }
        let status = apply(&mut credential.lockout);
        if !status.is_locked() {
            if let Some(hash) = upgraded_hash {
                credential.password_hash = hash.clone();
            }
        }
        Ok(Some(status))
    }

    async fn update_password_hash(
        &self,
        id: UsuarioId,
        password_hash: &HashedPassword,
    ) -> AccountsResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let (_, credential) = rows.get_mut(&id.get()).ok_or(AccountsError::UsuarioNotFound)?;
        credential.password_hash = password_hash.clone();
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

fn argon2(password: &str) -> HashedPassword {
    PasswordHasher::default()
        .hash(&ClearTextPassword::new(password).unwrap())
        .unwrap()
}

fn profile(username: &str, role: Role, numero: Option<i64>) -> UsuarioProfile {
    UsuarioProfile::new(fixtures::fields(username, role, numero)).unwrap()
}

fn seed(store: &MemoryStore, username: &str, role: Role) -> Usuario {
    let numero = role.requires_corredor_numero().then_some(7);
    store.seed(profile(username, role, numero), argon2(PASSWORD))
}

fn auth(store: &Arc<MemoryStore>) -> AuthenticationService<MemoryStore> {
    AuthenticationService::new(
        store.clone(),
        PasswordHasher::default(),
        LockoutPolicy::default(),
    )
}

fn register_input(username: &str, role: Role, corredor_numero: Option<i64>) -> RegisterUsuarioInput {
    RegisterUsuarioInput {
        nombre: "Ana".into(),
        apellido: "Rojas".into(),
        email: format!("{username}@seguros.cl"),
        username: username.into(),
        password: PASSWORD.into(),
        is_enabled: true,
        is_superuser: false,
        role,
        corredor_numero,
        comision_porcentaje: 12.5,
        telefono: None,
    }
}

fn empty_update() -> UpdateUsuarioInput {
    UpdateUsuarioInput {
        nombre: None,
        apellido: None,
        email: None,
        username: None,
        is_enabled: None,
        is_superuser: None,
        role: None,
        corredor_numero: None,
        comision_porcentaje: None,
        telefono: None,
    }
}

// ============================================================================
// Authentication and lockout
// ============================================================================

#[tokio::test]
async fn test_lockout_after_five_failures_then_lazy_expiry() {
    let store = Arc::new(MemoryStore::default());
    let jdoe = seed(&store, "jdoe", Role::Corredor);
    let service = auth(&store);
    let minute = TimeDelta::minutes(1);

    for i in 0..4 {
        let result = service.authenticate("jdoe", "wrong-password".into(), t0() + minute * i).await;
        assert!(matches!(result, Err(AccountsError::InvalidCredentials)));
        assert_eq!(store.lockout(jdoe.id).failed_attempts, (i + 1) as u32);
        assert_eq!(store.lockout(jdoe.id).locked_until, None);
    }

    let t4 = t0() + minute * 4;
    let result = service.authenticate("jdoe", "wrong-password".into(), t4).await;
    assert!(matches!(result, Err(AccountsError::InvalidCredentials)));
    assert_eq!(store.lockout(jdoe.id).failed_attempts, 5);
    assert_eq!(
        store.lockout(jdoe.id).locked_until,
        Some(t4 + TimeDelta::minutes(30))
    );

    // Correct password while locked is still refused.
    let result = service
        .authenticate("jdoe", PASSWORD.into(), t4 + TimeDelta::minutes(10))
        .await;
    assert!(matches!(result, Err(AccountsError::AccountLocked { minutes: 20 })));

    let usuario = service
        .authenticate("jdoe", PASSWORD.into(), t4 + TimeDelta::minutes(31))
        .await
        .unwrap();
    assert_eq!(usuario.id, jdoe.id);
    assert_eq!(store.lockout(jdoe.id), LockoutState::cleared());
}

#[tokio::test]
async fn test_stale_failures_are_forgotten() {
    let store = Arc::new(MemoryStore::default());
    let jdoe = seed(&store, "jdoe", Role::Corredor);
    let service = auth(&store);

    for i in 0..4 {
        let _ = service
            .authenticate("jdoe", "nope-nope".into(), t0() + TimeDelta::minutes(i))
            .await;
    }
    assert_eq!(store.lockout(jdoe.id).failed_attempts, 4);

    let later = t0() + TimeDelta::minutes(3) + TimeDelta::hours(2);
    let _ = service.authenticate("jdoe", "nope-nope".into(), later).await;
    let state = store.lockout(jdoe.id);
    assert_eq!(state.failed_attempts, 1);
    assert_eq!(state.locked_until, None);
    assert_eq!(state.last_failed_attempt, Some(later));
}

#[tokio::test]
async fn test_unknown_username_and_wrong_password_are_indistinguishable() {
    let store = Arc::new(MemoryStore::default());
    seed(&store, "jdoe", Role::Asistente);
    let service = auth(&store);

    let unknown = service
        .authenticate("ghost", PASSWORD.into(), t0())
        .await
        .unwrap_err();
    let wrong = service
        .authenticate("jdoe", "incorrect-pass".into(), t0())
        .await
        .unwrap_err();

    assert_eq!(unknown.to_string(), wrong.to_string());
    assert_eq!(unknown.status_code(), wrong.status_code());
}

#[tokio::test]
async fn test_empty_input_is_rejected_without_touching_counters() {
    let store = Arc::new(MemoryStore::default());
    let jdoe = seed(&store, "jdoe", Role::Asistente);
    let service = auth(&store);

    let result = service.authenticate("jdoe", String::new(), t0()).await;
    assert!(matches!(result, Err(AccountsError::InvalidCredentials)));
    let result = service.authenticate("   ", PASSWORD.into(), t0()).await;
    assert!(matches!(result, Err(AccountsError::InvalidCredentials)));

    assert_eq!(store.lockout(jdoe.id), LockoutState::cleared());
}

#[tokio::test]
async fn test_username_lookup_ignores_case() {
    let store = Arc::new(MemoryStore::default());
    let jdoe = seed(&store, "jdoe", Role::Asistente);

    let usuario = auth(&store)
        .authenticate("JDoe", PASSWORD.into(), t0())
        .await
        .unwrap();
    assert_eq!(usuario.id, jdoe.id);
}

#[tokio::test]
async fn test_failed_attempt_is_rejected_when_counter_cannot_be_written() {
    let store = Arc::new(MemoryStore::default());
    let jdoe = seed(&store, "jdoe", Role::Asistente);
    store.fail_lockout_writes.store(true, Ordering::SeqCst);

    let result = auth(&store)
        .authenticate("jdoe", "wrong-password".into(), t0())
        .await;
    assert!(matches!(result, Err(AccountsError::Database(_))));
    assert_eq!(store.lockout(jdoe.id).failed_attempts, 0);
}

#[tokio::test]
async fn test_disabled_account_is_reported_only_after_password_check() {
    let store = Arc::new(MemoryStore::default());
    let mut fields = fixtures::fields("inactivo", Role::Asistente, None);
    fields.is_enabled = false;
    let usuario = store.seed(UsuarioProfile::new(fields).unwrap(), argon2(PASSWORD));
    let service = auth(&store);

    let result = service.authenticate("inactivo", "wrong-password".into(), t0()).await;
    assert!(matches!(result, Err(AccountsError::InvalidCredentials)));
    assert_eq!(store.lockout(usuario.id).failed_attempts, 1);

    let result = service.authenticate("inactivo", PASSWORD.into(), t0()).await;
    assert!(matches!(result, Err(AccountsError::AccountDisabled)));
    // The password was right, so the counters still reset.
    assert_eq!(store.lockout(usuario.id), LockoutState::cleared());
}

#[tokio::test]
async fn test_legacy_bcrypt_hash_is_migrated_on_login() {
    let store = Arc::new(MemoryStore::default());
    let legacy = HashedPassword::from_stored(bcrypt::hash("Legacy-Pass-77", 4).unwrap());
    assert!(legacy.is_legacy());
    let usuario = store.seed(profile("legado", Role::Corredor, Some(3)), legacy.clone());
    let service = auth(&store);

    // A wrong password leaves the legacy hash in place.
    let _ = service.authenticate("legado", "Other-Pass-77".into(), t0()).await;
    assert_eq!(store.hash(usuario.id), legacy);

    service
        .authenticate("legado", "Legacy-Pass-77".into(), t0())
        .await
        .unwrap();
    let migrated = store.hash(usuario.id);
    assert_eq!(migrated.format(), Some(HashFormat::Argon2id));
    assert_eq!(store.lockout(usuario.id), LockoutState::cleared());

    service
        .authenticate("legado", "Legacy-Pass-77".into(), t0())
        .await
        .unwrap();
    assert_eq!(store.hash(usuario.id), migrated);
}

#[tokio::test]
async fn test_legacy_password_typed_in_decomposed_form_still_logs_in() {
    let store = Arc::new(MemoryStore::default());
    let typed = "Cafe\u{301}-Seguro-99";
    let legacy = HashedPassword::from_stored(bcrypt::hash(typed, 4).unwrap());
    let usuario = store.seed(profile("barista", Role::Asistente, None), legacy);
    let service = auth(&store);

    service.authenticate("barista", typed.into(), t0()).await.unwrap();
    assert_eq!(store.hash(usuario.id).format(), Some(HashFormat::Argon2id));

    // After migration either form of the accent is accepted.
    service.authenticate("barista", typed.into(), t0()).await.unwrap();
    service
        .authenticate("barista", "Caf\u{e9}-Seguro-99".into(), t0())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_stored_username_outside_registration_charset_can_log_in() {
    let store = Arc::new(MemoryStore::default());
    let mut fields = fixtures::fields("jperez", Role::Asistente, None);
    fields.username = Username::from_db("jos\u{e9}.p\u{e9}rez");
    let usuario = store.seed(UsuarioProfile::new(fields).unwrap(), argon2(PASSWORD));
    let service = auth(&store);

    let found = service
        .authenticate("Jos\u{e9}.P\u{e9}rez", PASSWORD.into(), t0())
        .await
        .unwrap();
    assert_eq!(found.id, usuario.id);

    let result = service.authenticate("jos\u{e9}.p\u{e9}rez", "wrong-password".into(), t0()).await;
    assert!(matches!(result, Err(AccountsError::InvalidCredentials)));
    assert_eq!(store.lockout(usuario.id).failed_attempts, 1);
}

#[tokio::test]
async fn test_lock_set_while_password_is_verified_is_kept() {
    let store = Arc::new(MemoryStore::default());
    let legacy = HashedPassword::from_stored(bcrypt::hash("Legacy-Pass-77", 4).unwrap());
    let usuario = store.seed(profile("legado", Role::Corredor, Some(3)), legacy.clone());
    store.set_lockout(
        usuario.id,
        LockoutState {
            failed_attempts: 4,
            locked_until: None,
            last_failed_attempt: Some(t0()),
        },
    );

    // A parallel wrong guess reaches the threshold after this request passed
    // its lock check.
    let locked = LockoutState {
        failed_attempts: 5,
        locked_until: Some(t0() + TimeDelta::minutes(30)),
        last_failed_attempt: Some(t0()),
    };
    *store.interleaved_lockout.lock().unwrap() = Some(locked);

    let result = auth(&store)
        .authenticate("legado", "Legacy-Pass-77".into(), t0())
        .await;
    assert!(matches!(result, Err(AccountsError::AccountLocked { minutes: 30 })));
    assert_eq!(store.lockout(usuario.id), locked);
    assert_eq!(store.hash(usuario.id), legacy);
}

// ============================================================================
// Tokens
// ============================================================================

#[tokio::test]
async fn test_sign_in_token_resolves_to_current_usuario() {
    let store = Arc::new(MemoryStore::default());
    let jdoe = seed(&store, "jdoe", Role::Corredor);
    let config = AccountsConfig::development();
    let tokens = config.token_codec();

    let output = SignInUseCase::new(auth(&store), tokens.clone())
        .execute(
            SignInInput {
                username: "jdoe".into(),
                password: PASSWORD.into(),
            },
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(output.expires_in, 3600);

    let current = CurrentUsuarioUseCase::new(store.clone(), tokens.clone());
    let usuario = current.execute(&output.access_token).await.unwrap();
    assert_eq!(usuario.id, jdoe.id);

    // Deactivation takes effect before the token expires.
    let admin = seed(&store, "admin", Role::Admin);
    UpdateUsuarioUseCase::new(store.clone())
        .execute(
            &admin,
            jdoe.id,
            UpdateUsuarioInput {
                is_enabled: Some(false),
                ..empty_update()
            },
            Utc::now(),
        )
        .await
        .unwrap();
    let result = current.execute(&output.access_token).await;
    assert!(matches!(result, Err(AccountsError::AccountDisabled)));

    let result = current.execute("not-a-token").await;
    assert!(matches!(result, Err(AccountsError::NotAuthenticated)));
}

#[tokio::test]
async fn test_token_for_deleted_usuario_is_rejected() {
    let store = Arc::new(MemoryStore::default());
    let jdoe = seed(&store, "jdoe", Role::Asistente);
    let tokens = AccountsConfig::development().token_codec();
    let issued = tokens.issue(jdoe.id, Utc::now()).unwrap();

    store.delete(jdoe.id).await.unwrap();
    let result = CurrentUsuarioUseCase::new(store.clone(), tokens)
        .execute(&issued.token)
        .await;
    assert!(matches!(result, Err(AccountsError::NotAuthenticated)));
}

// ============================================================================
// Usuario management
// ============================================================================

#[tokio::test]
async fn test_register_requires_permission_and_unique_identity() {
    let store = Arc::new(MemoryStore::default());
    let admin = seed(&store, "admin", Role::Admin);
    let corredor = seed(&store, "corredor", Role::Corredor);
    let use_case = RegisterUsuarioUseCase::new(store.clone(), PasswordHasher::default());

    let result = use_case
        .execute(Some(&corredor), register_input("nuevo", Role::Asistente, None), t0())
        .await;
    assert!(matches!(result, Err(AccountsError::Forbidden)));

    let created = use_case
        .execute(Some(&admin), register_input("nuevo", Role::Corredor, Some(12)), t0())
        .await
        .unwrap();
    assert_eq!(created.role(), Role::Corredor);
    assert_eq!(created.profile.corredor_numero(), Some(12));
    assert_eq!(store.hash(created.id).format(), Some(HashFormat::Argon2id));

    let mut dup = register_input("NUEVO", Role::Asistente, None);
    dup.email = "otro@seguros.cl".into();
    let result = use_case.execute(Some(&admin), dup, t0()).await;
    assert!(matches!(result, Err(AccountsError::UsernameTaken)));

    let mut dup = register_input("otro", Role::Asistente, None);
    dup.email = "nuevo@seguros.cl".into();
    let result = use_case.execute(Some(&admin), dup, t0()).await;
    assert!(matches!(result, Err(AccountsError::EmailTaken)));

    let result = use_case
        .execute(Some(&admin), register_input("sin_numero", Role::Corredor, None), t0())
        .await;
    assert!(matches!(result, Err(AccountsError::Validation { .. })));

    let mut weak = register_input("debil", Role::Asistente, None);
    weak.password = "short".into();
    let result = use_case.execute(Some(&admin), weak, t0()).await;
    assert!(matches!(result, Err(AccountsError::PasswordPolicy(_))));
}

#[tokio::test]
async fn test_deactivation_clears_lockout_counters() {
    let store = Arc::new(MemoryStore::default());
    let admin = seed(&store, "admin", Role::Admin);
    let jdoe = seed(&store, "jdoe", Role::Asistente);
    store.set_lockout(
        jdoe.id,
        LockoutState {
            failed_attempts: 5,
            locked_until: Some(t0() + TimeDelta::minutes(30)),
            last_failed_attempt: Some(t0()),
        },
    );

    let updated = UpdateUsuarioUseCase::new(store.clone())
        .execute(
            &admin,
            jdoe.id,
            UpdateUsuarioInput {
                is_enabled: Some(false),
                ..empty_update()
            },
            t0(),
        )
        .await
        .unwrap();
    assert!(!updated.can_authenticate());
    assert_eq!(store.lockout(jdoe.id), LockoutState::cleared());
}

#[tokio::test]
async fn test_role_change_needs_manage_roles() {
    let store = Arc::new(MemoryStore::default());
    let admin = seed(&store, "admin", Role::Admin);
    let asistente = seed(&store, "asistente", Role::Asistente);
    let use_case = UpdateUsuarioUseCase::new(store.clone());

    let updated = use_case
        .execute(
            &admin,
            asistente.id,
            UpdateUsuarioInput {
                role: Some(Role::Corredor),
                corredor_numero: Some(Some(44)),
                ..empty_update()
            },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(updated.role(), Role::Corredor);
    assert_eq!(updated.profile.corredor_numero(), Some(44));

    let result = use_case
        .execute(
            &asistente,
            admin.id,
            UpdateUsuarioInput {
                role: Some(Role::Asistente),
                ..empty_update()
            },
            t0(),
        )
        .await;
    assert!(matches!(result, Err(AccountsError::Forbidden)));
}

#[tokio::test]
async fn test_delete_rules() {
    let store = Arc::new(MemoryStore::default());
    let admin = seed(&store, "admin", Role::Admin);
    let jdoe = seed(&store, "jdoe", Role::Asistente);
    let use_case = DeleteUsuarioUseCase::new(store.clone());

    assert!(matches!(
        use_case.execute(&jdoe, admin.id).await,
        Err(AccountsError::Forbidden)
    ));
    assert!(matches!(
        use_case.execute(&admin, admin.id).await,
        Err(AccountsError::Validation { .. })
    ));
    use_case.execute(&admin, jdoe.id).await.unwrap();
    assert!(matches!(
        use_case.execute(&admin, jdoe.id).await,
        Err(AccountsError::UsuarioNotFound)
    ));
}

// ============================================================================
// Password change
// ============================================================================

#[tokio::test]
async fn test_change_own_password_requires_current() {
    let store = Arc::new(MemoryStore::default());
    let jdoe = seed(&store, "jdoe", Role::Corredor);
    let use_case = ChangePasswordUseCase::new(store.clone(), PasswordHasher::default());

    let result = use_case
        .execute(
            &jdoe,
            ChangePasswordInput {
                usuario_id: jdoe.id,
                current_password: None,
                new_password: "Nueva-Clave-2025".into(),
            },
        )
        .await;
    assert!(matches!(result, Err(AccountsError::Validation { .. })));

    let result = use_case
        .execute(
            &jdoe,
            ChangePasswordInput {
                usuario_id: jdoe.id,
                current_password: Some("not-my-password".into()),
                new_password: "Nueva-Clave-2025".into(),
            },
        )
        .await;
    assert!(matches!(result, Err(AccountsError::InvalidCredentials)));

    use_case
        .execute(
            &jdoe,
            ChangePasswordInput {
                usuario_id: jdoe.id,
                current_password: Some(PASSWORD.into()),
                new_password: "Nueva-Clave-2025".into(),
            },
        )
        .await
        .unwrap();

    let service = auth(&store);
    assert!(service.authenticate("jdoe", PASSWORD.into(), t0()).await.is_err());
    service
        .authenticate("jdoe", "Nueva-Clave-2025".into(), t0())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_change_other_password_needs_superuser() {
    let store = Arc::new(MemoryStore::default());
    let admin = seed(&store, "admin", Role::Admin);
    let jdoe = seed(&store, "jdoe", Role::Asistente);
    let mut root_fields = fixtures::fields("root", Role::Admin, None);
    root_fields.is_superuser = true;
    let root = store.seed(UsuarioProfile::new(root_fields).unwrap(), argon2(PASSWORD));
    let use_case = ChangePasswordUseCase::new(store.clone(), PasswordHasher::default());

    let input = || ChangePasswordInput {
        usuario_id: jdoe.id,
        current_password: None,
        new_password: "Reset-Por-Root-1".into(),
    };

    // ADMIN role alone is not enough to reset someone else's password.
    let result = use_case.execute(&admin, input()).await;
    assert!(matches!(result, Err(AccountsError::Forbidden)));

    use_case.execute(&root, input()).await.unwrap();
    auth(&store)
        .authenticate("jdoe", "Reset-Por-Root-1".into(), t0())
        .await
        .unwrap();

    let result = use_case
        .execute(
            &root,
            ChangePasswordInput {
                usuario_id: UsuarioId::new(999),
                current_password: None,
                new_password: "Reset-Por-Root-1".into(),
            },
        )
        .await;
    assert!(matches!(result, Err(AccountsError::UsuarioNotFound)));
}

// ============================================================================
// HTTP
// ============================================================================

fn app(store: MemoryStore) -> (axum::Router, AccountsAppState<MemoryStore>) {
    let state = AccountsAppState::new(store, AccountsConfig::development());
    (usuarios_router_generic(state.clone()), state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .unwrap()
}

#[tokio::test]
async fn test_http_login_and_me() {
    let store = MemoryStore::default();
    seed(&store, "jdoe", Role::Corredor);
    let (router, _) = app(store);

    let response = router
        .clone()
        .oneshot(login_request("jdoe", PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["usuario"]["username"], "jdoe");
    assert_eq!(body["usuario"]["role"], "corredor");
    assert!(body["usuario"].get("hashed_password").is_none());
    let token = body["access_token"].as_str().unwrap().to_string();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "jdoe");
}

#[tokio::test]
async fn test_http_rejections() {
    let store = MemoryStore::default();
    seed(&store, "jdoe", Role::Corredor);
    let (router, _) = app(store);

    let response = router
        .clone()
        .oneshot(login_request("jdoe", "wrong-password"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    let response = router
        .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_http_get_usuario_by_username() {
    let store = MemoryStore::default();
    let admin = seed(&store, "admin", Role::Admin);
    let asistente = seed(&store, "asistente", Role::Asistente);
    seed(&store, "jdoe", Role::Corredor);
    let (router, state) = app(store);

    let get = |token: &str, uri: &str| {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };
    let admin_token = state.tokens.issue(admin.id, Utc::now()).unwrap().token;

    let response = router
        .clone()
        .oneshot(get(&admin_token, "/username/JDOE"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "jdoe");

    let response = router
        .clone()
        .oneshot(get(&admin_token, "/username/nadie"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let asistente_token = state.tokens.issue(asistente.id, Utc::now()).unwrap().token;
    let response = router
        .oneshot(get(&asistente_token, "/username/jdoe"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_http_change_password_returns_message() {
    let store = MemoryStore::default();
    let jdoe = seed(&store, "jdoe", Role::Corredor);
    let (router, state) = app(store);
    let token = state.tokens.issue(jdoe.id, Utc::now()).unwrap().token;

    let payload = serde_json::json!({
        "usuario_id": jdoe.id,
        "contrasena_actual": PASSWORD,
        "nueva_contrasena": "Otra-Clave-Segura-9",
    });
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cambiar-contrasena")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["message"].is_string());

    let stored = state.repo.find_credential(jdoe.id).await.unwrap().unwrap();
    assert!(
        PasswordHasher::default().verify(
            &ClearTextPassword::submitted("Otra-Clave-Segura-9"),
            &stored.password_hash
        )
    );
}
